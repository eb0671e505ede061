use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Account configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    pub password: String,

    /// Bootstrap URL serving the current "host:port" text file.
    #[serde(default = "default_bootstrap_url")]
    pub bootstrap_url: String,

    /// Optional SOCKS5 proxy, e.g. "127.0.0.1:1080".
    pub proxy: Option<String>,
}

fn default_bootstrap_url() -> String {
    "http://www.paltalk.com/include/login_server_ips.php".to_string()
}

impl AccountConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("invalid config: {e}")))
    }
}

/// The account's UID and nickname, cached across logins so a known UID
/// skips the `GET_UIN` round-trip. No on-disk binary format; plain TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountCache {
    pub uid: u32,
    pub nickname: String,
}

impl AccountCache {
    pub fn cache_path(username: &str) -> Option<PathBuf> {
        let mut dir = dirs::cache_dir()?;
        dir.push("pt-client");
        dir.push(format!("{username}.toml"));
        Some(dir)
    }

    pub fn load_for(username: &str) -> Option<Self> {
        let path = Self::cache_path(username)?;
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    pub fn save_for(&self, username: &str) -> Result<()> {
        let path = Self::cache_path(username)
            .ok_or_else(|| Error::Config("no cache directory available".to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("failed to create cache dir: {e}")))?;
        }
        let content = toml::to_string(self)
            .map_err(|e| Error::Config(format!("failed to serialize cache: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("failed to write cache: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_config_parses_minimal_toml() {
        let toml = r#"
            username = "alice"
            password = "secret"
        "#;
        let config: AccountConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.username, "alice");
        assert!(config.bootstrap_url.contains("paltalk"));
        assert!(config.proxy.is_none());
    }

    #[test]
    fn account_config_parses_proxy() {
        let toml = r#"
            username = "alice"
            password = "secret"
            proxy = "127.0.0.1:1080"
        "#;
        let config: AccountConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.proxy.as_deref(), Some("127.0.0.1:1080"));
    }

    #[test]
    fn account_cache_round_trips_through_toml() {
        let cache = AccountCache { uid: 42, nickname: "bob".to_string() };
        let s = toml::to_string(&cache).unwrap();
        let parsed: AccountCache = toml::from_str(&s).unwrap();
        assert_eq!(cache, parsed);
    }
}
