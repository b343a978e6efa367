//! Load stdio MCP server definitions from common host config files.
//!
//! Scanned sources, in order:
//! - Claude project `.mcp.json` and user `~/.claude.json` (project + global).
//! - VSCode project `.vscode/mcp.json` or an explicit user file.
//! - Cursor user `~/.cursor/mcp.json`.
//!
//! Later project-level sources override earlier definitions of the same
//! name; user-global sources never override. Unreadable or malformed files
//! are treated as absent sources, not as registry failures.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value as JsonValue;

use super::types::{Provider, ServerOrigin, ServerRecord};
use crate::config::expand_home;

/// Ordered set of discovered servers. The scan order fixes the report
/// order, so records keep their first-seen position even when a later
/// source overrides the definition.
#[derive(Debug, Default)]
pub struct DiscoveredServers {
    records: Vec<ServerRecord>,
    index: HashMap<String, usize>,
}

impl DiscoveredServers {
    /// Insert or overwrite; an overridden name keeps its original slot.
    fn upsert(&mut self, srv: ServerRecord) {
        match self.index.get(&srv.name) {
            Some(&i) => self.records[i] = srv,
            None => {
                self.index.insert(srv.name.clone(), self.records.len());
                self.records.push(srv);
            }
        }
    }

    /// Insert only when the name has not been seen yet.
    fn insert_if_absent(&mut self, srv: ServerRecord) {
        if !self.index.contains_key(&srv.name) {
            self.upsert(srv);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Consume into the ordered server listing.
    pub fn into_ordered(self) -> Vec<ServerRecord> {
        self.records
    }
}

/// Discover stdio-capable MCP servers from known config paths.
pub fn discover_stdio_servers(
    workspace_dir: &Path,
    vscode_user_mcp: Option<&Path>,
) -> DiscoveredServers {
    let mut out = DiscoveredServers::default();

    // Claude: project .mcp.json
    let claude_project = workspace_dir.join(".mcp.json");
    merge_claude_project(&claude_project, &mut out);

    // Claude: user ~/.claude.json
    let claude_user = expand_home("~/.claude.json");
    merge_claude_user(&claude_user, workspace_dir, &mut out);

    // VSCode: project .vscode/mcp.json
    let vscode_project = workspace_dir.join(".vscode/mcp.json");
    merge_vscode_mcp(&vscode_project, &mut out);

    // VSCode: user config if provided via env/config
    if let Some(p) = vscode_user_mcp {
        merge_vscode_mcp(p, &mut out);
    }

    // Cursor: user ~/.cursor/mcp.json
    let cursor_user = expand_home("~/.cursor/mcp.json");
    merge_cursor_mcp(&cursor_user, &mut out);

    out
}

fn read_json(path: &Path) -> Option<JsonValue> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str::<JsonValue>(&content).ok()
}

/// Merge Claude project `.mcp.json` entries.
fn merge_claude_project(path: &Path, out: &mut DiscoveredServers) {
    let Some(v) = read_json(path) else {
        return;
    };
    let Some(map) = v.get("mcpServers").and_then(|m| m.as_object()) else {
        return;
    };
    for (name, def) in map.iter() {
        let origin = ServerOrigin {
            provider: Provider::Claude,
            path: Some(path.to_path_buf()),
            note: Some(".mcp.json".to_string()),
        };
        if let Some(srv) = parse_stdio_entry(name, def, origin) {
            out.upsert(srv);
        }
    }
}

/// Merge Claude user `~/.claude.json` project-scoped and global entries.
fn merge_claude_user(path: &Path, workspace_dir: &Path, out: &mut DiscoveredServers) {
    let Some(v) = read_json(path) else {
        return;
    };

    let mut merged: Vec<ServerRecord> = Vec::new();

    // project-scoped servers, keyed by the absolute workspace path
    if let Some(projects) = v.get("projects").and_then(|p| p.as_object()) {
        let ws_key = workspace_dir
            .canonicalize()
            .unwrap_or_else(|_| workspace_dir.to_path_buf());
        if let Some(proj) = projects
            .get(ws_key.to_string_lossy().as_ref())
            .and_then(|v| v.as_object())
        {
            if let Some(m) = proj.get("mcpServers").and_then(|m| m.as_object()) {
                for (name, def) in m {
                    let origin = ServerOrigin {
                        provider: Provider::Claude,
                        path: Some(path.to_path_buf()),
                        note: Some(format!("~/.claude.json project: {}", ws_key.display())),
                    };
                    if let Some(srv) = parse_claude_entry(name, def, origin) {
                        merged.push(srv);
                    }
                }
            }
            // Apply enabled/disabled lists to the project-scoped set
            let enabled: Option<Vec<String>> = str_array(proj.get("enabledMcpjsonServers"));
            let disabled: Vec<String> =
                str_array(proj.get("disabledMcpjsonServers")).unwrap_or_default();
            if let Some(allow) = enabled {
                merged.retain(|s| allow.iter().any(|a| a.eq_ignore_ascii_case(&s.name)));
            }
            if !disabled.is_empty() {
                merged.retain(|s| !disabled.iter().any(|d| d == &s.name));
            }
        }
    }

    // user-global servers never shadow project-scoped ones
    if let Some(m) = v.get("mcpServers").and_then(|m| m.as_object()) {
        for (name, def) in m {
            if merged.iter().any(|s| s.name == *name) {
                continue;
            }
            let origin = ServerOrigin {
                provider: Provider::Claude,
                path: Some(path.to_path_buf()),
                note: Some("~/.claude.json global".to_string()),
            };
            if let Some(srv) = parse_claude_entry(name, def, origin) {
                merged.push(srv);
            }
        }
    }

    for srv in merged {
        out.upsert(srv);
    }
}

/// Merge VSCode `mcp.json` entries (project or user-provided path).
///
/// VS Code project files typically use a top-level `servers` table, while
/// some examples reuse the Claude/Cursor-style `mcpServers`. Accept either,
/// preferring `servers` when both are present.
fn merge_vscode_mcp(path: &Path, out: &mut DiscoveredServers) {
    let Some(v) = read_json(path) else {
        return;
    };
    let map = v
        .get("servers")
        .and_then(|m| m.as_object())
        .or_else(|| v.get("mcpServers").and_then(|m| m.as_object()));
    let Some(map) = map else {
        return;
    };
    for (name, def) in map.iter() {
        let origin = ServerOrigin {
            provider: Provider::Vscode,
            path: Some(path.to_path_buf()),
            note: Some("vscode mcp.json".to_string()),
        };
        // VS Code entries take precedence over previously merged defaults.
        if let Some(srv) = parse_stdio_entry(name, def, origin) {
            out.upsert(srv);
        }
    }
}

/// Merge Cursor `~/.cursor/mcp.json` entries.
fn merge_cursor_mcp(path: &Path, out: &mut DiscoveredServers) {
    let Some(v) = read_json(path) else {
        return;
    };
    let Some(map) = v.get("mcpServers").and_then(|m| m.as_object()) else {
        return;
    };
    for (name, def) in map.iter() {
        let origin = ServerOrigin {
            provider: Provider::Cursor,
            path: Some(path.to_path_buf()),
            note: Some("~/.cursor/mcp.json".to_string()),
        };
        if let Some(srv) = parse_claude_entry(name, def, origin) {
            out.insert_if_absent(srv);
        }
    }
}

fn str_array(v: Option<&JsonValue>) -> Option<Vec<String>> {
    v.and_then(|x| x.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect()
    })
}

/// Parse a stdio-style server entry: `{ command, args?, env? }`.
fn parse_stdio_entry(name: &str, def: &JsonValue, origin: ServerOrigin) -> Option<ServerRecord> {
    let command = def.get("command").and_then(|v| v.as_str())?.to_string();
    let args: Vec<String> = def
        .get("args")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|x| x.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    let env: HashMap<String, String> = def
        .get("env")
        .and_then(|v| v.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Some(ServerRecord {
        name: name.to_string(),
        command,
        args,
        env,
        origin,
    })
}

/// Parse a Claude-style entry, ignoring HTTP or URL-only definitions.
///
/// Accepts either `{ command, args, env }` or `{ type: "stdio", ... }`.
fn parse_claude_entry(name: &str, def: &JsonValue, origin: ServerOrigin) -> Option<ServerRecord> {
    if def
        .get("type")
        .and_then(|v| v.as_str())
        .map(|t| t.eq_ignore_ascii_case("http"))
        .unwrap_or(false)
    {
        return None;
    }
    if def.get("url").is_some() {
        return None;
    }
    parse_stdio_entry(name, def, origin)
}
