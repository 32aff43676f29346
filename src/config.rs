use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub auth: AuthConfig,

    pub storage: StorageConfig,

    pub ai: AiConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

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
        Self {
            database_url: "sqlite:data/filedepot.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7070,
            cors_allowed_origins: vec![
                "http://localhost:7070".to_string(),
                "http://127.0.0.1:7070".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing key. Sourced from FILEDEPOT_JWT_SECRET; startup fails
    /// when unset.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Bearer token lifetime in minutes (default: 120)
    pub token_lifetime_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub bucket: String,

    pub region: String,

    pub endpoint: String,

    /// HMAC interoperability access key id for the service account.
    pub hmac_access_key: String,

    /// HMAC secret. Sourced from FILEDEPOT_GCS_SECRET.
    #[serde(skip_serializing)]
    pub hmac_secret: String,

    /// Signed GET URL lifetime in minutes (default: 120)
    pub signed_url_lifetime_minutes: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-central1".to_string(),
            endpoint: "https://storage.googleapis.com".to_string(),
            hmac_access_key: String::new(),
            hmac_secret: String::new(),
            signed_url_lifetime_minutes: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,

    /// API key. Sourced from FILEDEPOT_GEMINI_API_KEY.
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Request timeout in seconds (default: 60)
    pub request_timeout_seconds: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "filedepot".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            ai: AiConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_config_path();
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Secrets never live in the TOML file; they are read from the
    /// environment (a `.env` file is honored via dotenvy at startup).
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FILEDEPOT_DATABASE_URL") {
            self.general.database_url = url;
        }
        if let Ok(secret) = std::env::var("FILEDEPOT_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(bucket) = std::env::var("FILEDEPOT_GCS_BUCKET") {
            self.storage.bucket = bucket;
        }
        if let Ok(key) = std::env::var("FILEDEPOT_GCS_ACCESS_KEY") {
            self.storage.hmac_access_key = key;
        }
        if let Ok(secret) = std::env::var("FILEDEPOT_GCS_SECRET") {
            self.storage.hmac_secret = secret;
        }
        if let Ok(key) = std::env::var("FILEDEPOT_GEMINI_API_KEY") {
            self.ai.api_key = key;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("filedepot").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".filedepot").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT signing secret is not set (FILEDEPOT_JWT_SECRET)");
        }

        if self.auth.token_lifetime_minutes <= 0 {
            anyhow::bail!("Token lifetime must be > 0 minutes");
        }

        if self.storage.signed_url_lifetime_minutes <= 0 {
            anyhow::bail!("Signed URL lifetime must be > 0 minutes");
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("max_db_connections must be > 0");
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
        assert_eq!(config.auth.token_lifetime_minutes, 120);
        assert_eq!(config.storage.endpoint, "https://storage.googleapis.com");
        assert_eq!(config.security.argon2_parallelism, 1);
        assert_eq!(config.server.port, 7070);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("[ai]"));
        assert!(!toml_str.contains("jwt_secret"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            token_lifetime_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.token_lifetime_minutes, 30);

        assert_eq!(config.storage.region, "us-central1");
    }

    #[test]
    fn test_validate_requires_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.auth.jwt_secret = "test-secret".to_string();
        assert!(config.validate().is_ok());
    }
}
