use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub registry: Option<RegistryCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegistryCfg {
    pub workspace_dir: Option<String>,    // absolute path preferred
    pub vscode_user_mcp: Option<String>,  // absolute path preferred
    pub enum_timeout_ms: Option<u64>,
    pub max_servers: Option<usize>,
}

pub fn load_user_config(home: &Path) -> anyhow::Result<Option<UserConfig>> {
    let path = home.join("config.toml");
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path)?;
    let cfg: UserConfig = toml::from_str(&s)?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Inventory home directory: `INVENTORY_HOME`, else `$HOME/.mcp-inventory`,
/// else `.mcp-inventory` under the current directory.
pub fn resolve_home() -> PathBuf {
    if let Ok(h) = std::env::var("INVENTORY_HOME") {
        if !h.is_empty() {
            return PathBuf::from(h);
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".mcp-inventory");
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".mcp-inventory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn config_toml_parses_both_tables() {
        let s = r#"
            [logging]
            level = "debug"
            json = true

            [registry]
            enum_timeout_ms = 2500
            max_servers = 8
            vscode_user_mcp = "~/Library/mcp.json"
        "#;
        let cfg: UserConfig = toml::from_str(s).unwrap();
        let logging = cfg.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.json, Some(true));
        assert_eq!(logging.to_file, None);
        let registry = cfg.registry.unwrap();
        assert_eq!(registry.enum_timeout_ms, Some(2500));
        assert_eq!(registry.max_servers, Some(8));
        assert!(registry.vscode_user_mcp.unwrap().starts_with("~/"));
    }

    #[test]
    fn missing_config_file_is_none() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("inv_cfg_missing_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        assert!(load_user_config(&dir).unwrap().is_none());
    }

    #[test]
    fn config_file_is_loaded_from_home() {
        let mut dir = std::env::temp_dir();
        dir.push(format!("inv_cfg_present_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let mut f = std::fs::File::create(dir.join("config.toml")).unwrap();
        f.write_all(b"[registry]\nmax_servers = 3\n").unwrap();
        f.sync_all().ok();
        let cfg = load_user_config(&dir).unwrap().expect("config present");
        assert_eq!(cfg.registry.unwrap().max_servers, Some(3));
    }

    #[test]
    fn expand_home_keeps_absolute_paths() {
        assert_eq!(expand_home("/etc/mcp.json"), PathBuf::from("/etc/mcp.json"));
    }
}
