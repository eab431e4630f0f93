//! Configuration loading and management
//!
//! Configuration comes from an optional YAML file (path in `FEASTHUB_CONFIG`)
//! and is then overridden by environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `FEASTHUB_HOST` | `server.host` |
//! | `PORT` | `server.port` |
//! | `MONGO_URI` | `storage.uri` (also selects the `mongodb` backend) |
//! | `FEASTHUB_DB` | `storage.database` |
//! | `RAZORPAY_KEY_ID` | `payment.key_id` |
//! | `RAZORPAY_KEY_SECRET` | `payment.key_secret` |
//! | `RUST_LOG` | `log.filter` |

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_VAR: &str = "FEASTHUB_CONFIG";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub payment: PaymentConfig,
    pub orders: OrdersConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    InMemory,
    Mongodb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub uri: String,
    pub database: String,
    /// Use multi-document transactions (requires a replica set)
    pub transactions: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemory,
            uri: "mongodb://localhost:27017".to_string(),
            database: "feasthub".to_string(),
            transactions: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub currency: String,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            base_url: "https://api.razorpay.com".to_string(),
            timeout_secs: 10,
            currency: "INR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// Attempts at finding a free order code before giving up
    pub code_attempts: usize,
    /// Run stats reconciliation periodically when set
    pub reconcile_interval_secs: Option<u64>,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            code_attempts: 5,
            reconcile_interval_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "feasthub=info,tower_http=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// File named by `FEASTHUB_CONFIG` (or defaults), then environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("FEASTHUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        if let Some(uri) = lookup("MONGO_URI") {
            self.storage.uri = uri;
            self.storage.backend = StorageBackend::Mongodb;
        }
        if let Some(database) = lookup("FEASTHUB_DB") {
            self.storage.database = database;
        }
        if let Some(key_id) = lookup("RAZORPAY_KEY_ID") {
            self.payment.key_id = Some(key_id);
        }
        if let Some(secret) = lookup("RAZORPAY_KEY_SECRET") {
            self.payment.key_secret = Some(secret);
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.log.filter = filter;
        }
        Ok(())
    }
}
