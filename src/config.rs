use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub dispatch: DispatchConfig,

    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// SQLite file path or `sqlite:` URL
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        let database_path = dirs::data_dir()
            .map(|dir| dir.join("chatlist").join("chatlist.db"))
            .unwrap_or_else(|| PathBuf::from("data").join("chatlist.db"));

        Self {
            database_path: database_path.to_string_lossy().into_owned(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn database_url(&self) -> String {
        if self.database_path.starts_with("sqlite:") {
            self.database_path.clone()
        } else {
            format!("sqlite:{}", self.database_path)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Budget for a single model, retries included
    pub request_timeout_seconds: u64,

    /// Budget for the whole fan-out
    pub overall_deadline_seconds: u64,

    /// Extra attempts on connection errors and 5xx responses
    pub max_retries: usize,

    pub user_agent: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 30,
            overall_deadline_seconds: 120,
            max_retries: 3,
            user_agent: format!("ChatList/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Explicit `.env` file; the working directory is searched when unset
    pub env_file: Option<PathBuf>,

    pub load_dotenv: bool,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            env_file: None,
            load_dotenv: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("chatlist").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".chatlist").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` unless a file is already there.
    pub fn create_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }

        Self::default().save_to_path(path)?;
        info!("Created default config file: {}", path.display());
        Ok(true)
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.trim().is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.dispatch.request_timeout_seconds == 0 {
            anyhow::bail!("Request timeout must be > 0");
        }

        if self.dispatch.overall_deadline_seconds == 0 {
            anyhow::bail!("Overall deadline must be > 0");
        }

        if self.dispatch.overall_deadline_seconds < self.dispatch.request_timeout_seconds {
            anyhow::bail!(
                "Overall deadline ({}s) cannot be shorter than the request timeout ({}s)",
                self.dispatch.overall_deadline_seconds,
                self.dispatch.request_timeout_seconds
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dispatch.request_timeout_seconds, 30);
        assert_eq!(config.dispatch.overall_deadline_seconds, 120);
        assert_eq!(config.dispatch.max_retries, 3);
        assert!(config.credentials.load_dotenv);
        assert!(config.general.database_path.ends_with("chatlist.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[dispatch]"));
        assert!(toml_str.contains("[credentials]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"
            database_path = "/tmp/chat.db"

            [dispatch]
            request_timeout_seconds = 10
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.database_url(), "sqlite:/tmp/chat.db");
        assert_eq!(config.dispatch.request_timeout_seconds, 10);

        assert_eq!(config.dispatch.overall_deadline_seconds, 120);
    }

    #[test]
    fn test_validate_rejects_bad_timeouts() {
        let mut config = Config::default();
        config.dispatch.request_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.request_timeout_seconds = 60;
        config.dispatch.overall_deadline_seconds = 30;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.database_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let path =
            std::env::temp_dir().join(format!("chatlist-config-{}.toml", uuid::Uuid::new_v4()));

        let mut config = Config::default();
        config.dispatch.max_retries = 7;
        assert!(Config::create_default_if_missing(&path).unwrap());
        assert!(!Config::create_default_if_missing(&path).unwrap());

        config.save_to_path(&path).unwrap();
        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.dispatch.max_retries, 7);

        let _ = std::fs::remove_file(&path);
    }
}
