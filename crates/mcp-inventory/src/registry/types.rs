//! Shared types for the registry layer: server and tool records plus the
//! read-only registry interface the reporter consumes.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

/// Host application whose config files a server definition was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Claude,
    Vscode,
    Cursor,
}

impl Provider {
    /// Stable lowercase label used in the report projection.
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Claude => "claude",
            Provider::Vscode => "vscode",
            Provider::Cursor => "cursor",
        }
    }
}

/// Where a server definition came from (provider, path, human note).
#[derive(Debug, Clone)]
pub struct ServerOrigin {
    pub provider: Provider,
    pub path: Option<PathBuf>,
    pub note: Option<String>,
}

/// A configured stdio MCP server. Connection metadata beyond `name` is
/// opaque to the reporter; it is only projected into the report.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub origin: ServerOrigin,
}

/// A tool advertised by one server. `server_name` is the join key back to
/// [`ServerRecord::name`]; `input_schema` is carried through verbatim.
#[derive(Debug, Clone)]
pub struct ToolRecord {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: JsonValue,
    pub server_name: String,
}

/// Read-only registry interface: two independent listing operations, both
/// returning ordered snapshots. The reporter joins them by server name and
/// never calls anything else.
#[async_trait]
pub trait ToolRegistry {
    async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>>;
    async fn list_tools(&self) -> anyhow::Result<Vec<ToolRecord>>;
}
