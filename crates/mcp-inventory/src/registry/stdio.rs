//! Live registry backed by config-file discovery and stdio enumeration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

use super::discovery::discover_stdio_servers;
use super::enumerator::enumerate_stdio;
use super::types::{ServerRecord, ToolRecord, ToolRegistry};

/// Knobs for the live registry.
#[derive(Debug, Clone)]
pub struct RegistrySettings {
    /// Workspace directory used for relative discovery (e.g., `.mcp.json`).
    pub workspace_dir: PathBuf,
    /// Optional VSCode user `mcp.json` path.
    pub vscode_user_mcp: Option<PathBuf>,
    /// Enumeration timeout per phase, per server.
    pub enum_timeout_ms: u64,
    /// Cap on number of servers considered.
    pub max_servers: usize,
}

/// Registry over stdio MCP servers found in host config files.
///
/// `list_tools` launches every discovered server one at a time, in server
/// order, so the flat tool listing is ordered by owning server first and
/// wire order second.
pub struct StdioRegistry {
    settings: RegistrySettings,
}

impl StdioRegistry {
    pub fn new(settings: RegistrySettings) -> Self {
        Self { settings }
    }

    fn discover(&self) -> Vec<ServerRecord> {
        let discovered = discover_stdio_servers(
            &self.settings.workspace_dir,
            self.settings.vscode_user_mcp.as_deref(),
        );
        let total = discovered.len();
        let mut servers = discovered.into_ordered();
        if servers.len() > self.settings.max_servers {
            tracing::warn!(
                "capping discovered servers: {} → {}",
                total,
                self.settings.max_servers
            );
            servers.truncate(self.settings.max_servers);
        }
        for srv in &servers {
            let note = srv.origin.note.as_deref().unwrap_or("");
            let path = srv
                .origin
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string());
            tracing::info!(
                "discovered server '{}' via {:?} @ {} {}",
                srv.name,
                srv.origin.provider,
                path,
                note
            );
        }
        servers
    }
}

#[async_trait]
impl ToolRegistry for StdioRegistry {
    async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>> {
        Ok(self.discover())
    }

    async fn list_tools(&self) -> anyhow::Result<Vec<ToolRecord>> {
        let servers = self.discover();
        let timeout = Duration::from_millis(self.settings.enum_timeout_ms);
        let mut out: Vec<ToolRecord> = Vec::new();
        for srv in &servers {
            let tools = enumerate_stdio(srv, timeout)
                .await
                .with_context(|| format!("enumerating tools of server '{}'", srv.name))?;
            tracing::info!("enumerated server '{}': {} tool(s)", srv.name, tools.len());
            out.extend(tools);
        }
        Ok(out)
    }
}
