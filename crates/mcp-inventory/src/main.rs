mod config;
mod registry;
mod report;

use std::path::PathBuf;

use env_flags::env_flags;
use once_cell::sync::OnceCell;

use crate::registry::{RegistrySettings, StdioRegistry};

fn init_tracing() {
    env_flags! {
        /// Tracing filter, e.g. "info", "debug", or targets format.
        RUST_LOG: &str = "info";
        /// Preferred filter env (alias). If set, overrides RUST_LOG.
        TRACING_FILTER: &str = "";
        /// Pretty formatting for logs (ignored if TRACING_JSON=true).
        TRACING_PRETTY: bool = false;
        /// Compact single-line formatting for logs (ignored if TRACING_JSON=true)
        TRACING_COMPACT: bool = true;
        /// JSON formatting for logs
        TRACING_JSON: bool = false;
        /// If true, also log to file under <INVENTORY_HOME>/logs or LOG_DIR
        LOG_TO_FILE: bool = false;
        /// Optional explicit log directory (absolute). Defaults to <INVENTORY_HOME>/logs
        LOG_DIR: &str = "";
    }

    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, prelude::*};

    let home = config::resolve_home();

    // Load user config (optional) and let it fill tracing defaults when the
    // corresponding env var is not set.
    let user_cfg = config::load_user_config(&home).ok().flatten();
    let env_set = |k: &str| std::env::var_os(k).is_some();

    // Support TRACING_FILTER as primary; fall back to RUST_LOG; then user config.
    let mut rust_log = if !(*TRACING_FILTER).is_empty() {
        (*TRACING_FILTER).to_string()
    } else {
        (*RUST_LOG).to_string()
    };
    let mut tracing_json = *TRACING_JSON;
    let mut tracing_compact = *TRACING_COMPACT;
    let mut tracing_pretty = *TRACING_PRETTY;
    let mut log_to_file = *LOG_TO_FILE;
    let mut log_dir: Option<PathBuf> = if !(*LOG_DIR).is_empty() {
        Some(PathBuf::from((*LOG_DIR).to_string()))
    } else {
        None
    };

    if let Some(cfg) = user_cfg.as_ref().and_then(|c| c.logging.as_ref()) {
        if !(env_set("TRACING_FILTER") || env_set("RUST_LOG"))
            && let Some(level) = cfg.level.as_ref()
        {
            rust_log = level.clone();
        }
        if !env_set("TRACING_JSON")
            && let Some(v) = cfg.json
        {
            tracing_json = v;
        }
        if !env_set("TRACING_COMPACT")
            && let Some(v) = cfg.compact
        {
            tracing_compact = v;
        }
        if !env_set("TRACING_PRETTY")
            && let Some(v) = cfg.pretty
        {
            tracing_pretty = v;
        }
        if !env_set("LOG_TO_FILE")
            && let Some(v) = cfg.to_file
        {
            log_to_file = v;
        }
        if !env_set("LOG_DIR")
            && let Some(dir) = cfg.dir.as_ref()
        {
            log_dir = Some(PathBuf::from(dir));
        }
    }

    let filter = EnvFilter::try_new(rust_log).unwrap_or_else(|_| EnvFilter::new("info"));

    // Always write logs to stderr; stdout is reserved for the JSON report.
    let stderr_base = tracing_subscriber::fmt::layer()
        .with_file(false)
        .with_line_number(false)
        .with_target(true)
        .with_ansi(true)
        .with_writer(std::io::stderr);

    // Optional file logging layer
    static FILE_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();
    let file_writer = if log_to_file {
        let dir = log_dir.unwrap_or_else(|| home.join("logs"));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, "mcp-inventory.log");
                let (nb, guard) = tracing_appender::non_blocking(appender);
                let _ = FILE_GUARD.set(guard);
                Some(nb)
            }
            Err(e) => {
                tracing::warn!("failed to create log dir {}: {}", dir.display(), e);
                None
            }
        }
    } else {
        None
    };
    let file_base = file_writer.map(|nb| {
        tracing_subscriber::fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_target(true)
            .with_ansi(false)
            .with_writer(nb)
    });

    // Box the layers per selected format so a single init path serves all
    // of them; the concrete layer types differ per format.
    let (stderr_layer, file_layer) = if tracing_json {
        (
            stderr_base.json().boxed(),
            file_base.map(|l| l.json().boxed()),
        )
    } else if tracing_compact {
        (
            stderr_base.compact().boxed(),
            file_base.map(|l| l.compact().boxed()),
        )
    } else if tracing_pretty {
        (
            stderr_base.pretty().boxed(),
            file_base.map(|l| l.pretty().boxed()),
        )
    } else {
        (stderr_base.boxed(), file_base.map(|l| l.boxed()))
    };

    let init_result = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if let Err(e) = init_result {
        tracing::debug!("tracing already set: {:?}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Authorization gate: presence only, the value is never inspected or
    // forwarded. Nothing else runs without it.
    let authorized = std::env::var("MCP_AUTH")
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    if !authorized {
        eprintln!("[Error] MCP_AUTH environment variable is not set.");
        std::process::exit(1);
    }

    init_tracing();

    env_flags! {
        /// Workspace directory for relative discovery. If empty, defaults to the current execution directory.
        WORKSPACE_DIR: &str = "";
        /// VSCode user mcp.json path (optional)
        VSCODE_USER_MCP: &str = "";
        /// Enumeration timeout per phase in milliseconds
        MCP_ENUM_TIMEOUT_MS: u64 = 4000;
        /// Max servers to include in the report
        MCP_MAX_SERVERS: usize = 128;
    }

    let home = config::resolve_home();
    tracing::info!("inventory_home={}", home.display());

    // Env wins, else user config, else defaults.
    let user_cfg = config::load_user_config(&home).ok().flatten();
    let env_set = |k: &str| std::env::var_os(k).is_some();

    let workspace_dir = if !(*WORKSPACE_DIR).is_empty() {
        PathBuf::from((*WORKSPACE_DIR).to_string())
    } else if let Some(dir) = user_cfg
        .as_ref()
        .and_then(|c| c.registry.as_ref())
        .and_then(|r| r.workspace_dir.as_ref())
    {
        config::expand_home(dir)
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    };
    tracing::info!("workspace_dir={}", workspace_dir.display());

    let vscode_user_mcp = if env_set("VSCODE_USER_MCP") && !(*VSCODE_USER_MCP).is_empty() {
        Some(PathBuf::from((*VSCODE_USER_MCP).to_string()))
    } else {
        user_cfg
            .as_ref()
            .and_then(|c| c.registry.as_ref())
            .and_then(|r| r.vscode_user_mcp.as_ref())
            .map(|s| config::expand_home(s))
    };
    let enum_timeout_ms = if env_set("MCP_ENUM_TIMEOUT_MS") {
        *MCP_ENUM_TIMEOUT_MS
    } else {
        user_cfg
            .as_ref()
            .and_then(|c| c.registry.as_ref())
            .and_then(|r| r.enum_timeout_ms)
            .unwrap_or(*MCP_ENUM_TIMEOUT_MS)
    };
    let max_servers = if env_set("MCP_MAX_SERVERS") {
        *MCP_MAX_SERVERS
    } else {
        user_cfg
            .as_ref()
            .and_then(|c| c.registry.as_ref())
            .and_then(|r| r.max_servers)
            .unwrap_or(*MCP_MAX_SERVERS)
    };

    let registry = StdioRegistry::new(RegistrySettings {
        workspace_dir,
        vscode_user_mcp,
        enum_timeout_ms,
        max_servers,
    });

    // Registry failures are not caught here: they propagate and terminate
    // the process with a non-zero status. No retry, no partial report.
    let rep = report::run(&registry).await?;
    println!("{}", report::render(&rep)?);

    if rep.count == 0 {
        for line in report::EMPTY_GUIDANCE {
            eprintln!("{line}");
        }
    }
    Ok(())
}
