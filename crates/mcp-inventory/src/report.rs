//! Build the JSON inventory report from registry snapshots.
//!
//! Tools are joined to servers by `server_name`; a tool whose owner is not
//! in the server snapshot is dropped. Server order and per-server tool
//! order are preserved exactly as the registry returned them.

use std::collections::HashMap;

use anyhow::Context as _;
use chrono::Local;
use serde::Serialize;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::registry::{ServerRecord, ToolRecord, ToolRegistry};

/// Fixed caveat attached to every report.
pub const REPORT_NOTE: &str =
    "Inventory is a point-in-time snapshot; each server was launched only long enough to enumerate its tools.";

/// Advisory guidance printed to stderr when no servers were found.
pub const EMPTY_GUIDANCE: [&str; 2] = [
    "No MCP servers were found in the scanned configuration files.",
    "Add entries to .mcp.json, ~/.claude.json, .vscode/mcp.json, or ~/.cursor/mcp.json and run again.",
];

/// The output aggregate. Constructed fresh each run, never persisted.
#[derive(Debug, Serialize)]
pub struct Report {
    pub timestamp: String,
    pub count: usize,
    pub servers: Vec<JsonValue>,
    pub note: &'static str,
}

/// Fetch both snapshots and assemble the report.
pub async fn run(registry: &dyn ToolRegistry) -> anyhow::Result<Report> {
    let servers = registry.list_servers().await?;
    let tools = registry.list_tools().await?;
    Ok(build(&servers, tools, now_timestamp()))
}

/// Assemble a report from in-memory snapshots. Pure except for nothing:
/// the timestamp is passed in.
pub fn build(servers: &[ServerRecord], tools: Vec<ToolRecord>, timestamp: String) -> Report {
    let mut by_server = group_by_server(tools);
    let entries: Vec<JsonValue> = servers
        .iter()
        .map(|srv| {
            let tools = by_server.remove(srv.name.as_str()).unwrap_or_default();
            server_entry(srv, &tools)
        })
        .collect();
    Report {
        timestamp,
        count: servers.len(),
        servers: entries,
        note: REPORT_NOTE,
    }
}

/// Serialize as indented JSON; non-ASCII passes through unescaped.
pub fn render(report: &Report) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).context("serializing report")
}

fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fold the flat tool listing into per-server groups, preserving the
/// relative order of tools within each group.
fn group_by_server(tools: Vec<ToolRecord>) -> HashMap<String, Vec<ToolRecord>> {
    let mut by_server: HashMap<String, Vec<ToolRecord>> = HashMap::new();
    for tool in tools {
        by_server.entry(tool.server_name.clone()).or_default().push(tool);
    }
    by_server
}

/// Explicit projection of one server plus its joined tools.
fn server_entry(srv: &ServerRecord, tools: &[ToolRecord]) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".into(), JsonValue::String(srv.name.clone()));
    m.insert("command".into(), JsonValue::String(srv.command.clone()));
    m.insert(
        "args".into(),
        JsonValue::Array(
            srv.args
                .iter()
                .map(|a| JsonValue::String(a.clone()))
                .collect(),
        ),
    );
    m.insert(
        "provider".into(),
        JsonValue::String(srv.origin.provider.label().to_string()),
    );
    // env is omitted on purpose: values may carry credentials.
    m.insert(
        "source".into(),
        srv.origin
            .path
            .as_ref()
            .map(|p| JsonValue::String(p.display().to_string()))
            .unwrap_or(JsonValue::Null),
    );
    m.insert(
        "tools".into(),
        JsonValue::Array(tools.iter().map(tool_entry).collect()),
    );
    m.insert("tools_count".into(), JsonValue::from(tools.len()));
    JsonValue::Object(m)
}

/// Explicit projection of one tool record.
fn tool_entry(tool: &ToolRecord) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".into(), JsonValue::String(tool.name.clone()));
    m.insert(
        "description".into(),
        tool.description
            .as_ref()
            .map(|d| JsonValue::String(d.clone()))
            .unwrap_or(JsonValue::Null),
    );
    m.insert("input_schema".into(), tool.input_schema.clone());
    m.insert(
        "server_name".into(),
        JsonValue::String(tool.server_name.clone()),
    );
    JsonValue::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Provider, ServerOrigin};
    use async_trait::async_trait;
    use serde_json::json;

    fn srv(name: &str) -> ServerRecord {
        ServerRecord {
            name: name.to_string(),
            command: format!("{name}-mcp"),
            args: vec!["--stdio".to_string()],
            env: Default::default(),
            origin: ServerOrigin {
                provider: Provider::Claude,
                path: None,
                note: None,
            },
        }
    }

    fn tool(name: &str, server: &str) -> ToolRecord {
        ToolRecord {
            name: name.to_string(),
            description: Some(format!("does {name}")),
            input_schema: json!({"type": "object"}),
            server_name: server.to_string(),
        }
    }

    struct FixtureRegistry {
        servers: Vec<ServerRecord>,
        tools: Vec<ToolRecord>,
    }

    #[async_trait]
    impl ToolRegistry for FixtureRegistry {
        async fn list_servers(&self) -> anyhow::Result<Vec<ServerRecord>> {
            Ok(self.servers.clone())
        }

        async fn list_tools(&self) -> anyhow::Result<Vec<ToolRecord>> {
            Ok(self.tools.clone())
        }
    }

    #[test]
    fn empty_snapshot_yields_empty_report() {
        let report = build(&[], Vec::new(), "2026-01-01 00:00:00".to_string());
        assert_eq!(report.count, 0);
        assert!(report.servers.is_empty());
        assert_eq!(report.note, REPORT_NOTE);
    }

    #[test]
    fn count_matches_server_listing() {
        let servers = vec![srv("a"), srv("b"), srv("c")];
        let report = build(&servers, Vec::new(), "t".to_string());
        assert_eq!(report.count, 3);
        assert_eq!(report.servers.len(), 3);
        // Registry order is preserved.
        let names: Vec<&str> = report
            .servers
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn tools_are_joined_in_listing_order_and_orphans_dropped() {
        let servers = vec![srv("a")];
        let tools = vec![tool("t1", "a"), tool("t2", "b"), tool("t3", "a")];
        let report = build(&servers, tools, "t".to_string());

        let entry = &report.servers[0];
        assert_eq!(entry["tools_count"], json!(2));
        let names: Vec<&str> = entry["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["t1", "t3"]);

        // t2's owner is unknown: it must not appear anywhere in the output.
        let rendered = render(&report).unwrap();
        assert!(!rendered.contains("t2"));
    }

    #[test]
    fn server_without_tools_gets_empty_array() {
        let servers = vec![srv("a"), srv("b")];
        let tools = vec![tool("t1", "b")];
        let report = build(&servers, tools, "t".to_string());
        assert_eq!(report.servers[0]["tools"], json!([]));
        assert_eq!(report.servers[0]["tools_count"], json!(0));
        assert_eq!(report.servers[1]["tools_count"], json!(1));
    }

    #[test]
    fn tools_are_fully_expanded() {
        let servers = vec![srv("a")];
        let report = build(&servers, vec![tool("t1", "a")], "t".to_string());
        let t = &report.servers[0]["tools"][0];
        assert_eq!(t["name"], json!("t1"));
        assert_eq!(t["description"], json!("does t1"));
        assert_eq!(t["input_schema"], json!({"type": "object"}));
        assert_eq!(t["server_name"], json!("a"));
    }

    #[test]
    fn shape_is_stable_modulo_timestamp() {
        let servers = vec![srv("a"), srv("b")];
        let tools = vec![tool("t1", "a"), tool("t2", "b")];
        let first = build(&servers, tools.clone(), "2026-01-01 00:00:00".to_string());
        let second = build(&servers, tools, "2026-01-01 00:00:01".to_string());
        let mut v1 = serde_json::to_value(&first).unwrap();
        let mut v2 = serde_json::to_value(&second).unwrap();
        assert_ne!(v1["timestamp"], v2["timestamp"]);
        v1["timestamp"] = json!(null);
        v2["timestamp"] = json!(null);
        assert_eq!(v1, v2);
    }

    #[test]
    fn rendered_json_is_indented_and_keeps_non_ascii() {
        let mut t = tool("t1", "a");
        t.description = Some("durchsucht Dateien über SSH".to_string());
        let report = build(&[srv("a")], vec![t], "t".to_string());
        let rendered = render(&report).unwrap();
        assert!(rendered.contains('\n'));
        assert!(rendered.contains("durchsucht Dateien über SSH"));
        assert!(!rendered.contains("\\u"));
    }

    #[tokio::test]
    async fn run_uses_the_injected_registry() {
        let registry = FixtureRegistry {
            servers: vec![srv("a")],
            tools: vec![tool("t1", "a"), tool("t2", "b")],
        };
        let report = run(&registry).await.unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.servers[0]["tools_count"], json!(1));
    }
}
