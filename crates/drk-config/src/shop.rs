//! Typed service configuration.
//!
//! Every field has a default so an empty document is a valid config:
//!
//! ```yaml
//! server:
//!   bind_addr: "127.0.0.1:4000"
//!   static_dir: "static"
//! database:
//!   url_env: "DRK_DATABASE_URL"
//!   max_connections: 10
//! ordering:
//!   phone_rule: ten_digits        # ten_digits | mobile_prefix
//!   status_match: prefix          # exact | prefix
//!   default_store_id: 1           # optional
//! staff:
//!   pass_key_env: "DRK_STAFF_KEY" # NAME of the env var keying staff passes
//!   login:
//!     mode: database              # database | fixed
//! ```

use anyhow::{Context, Result};
use drk_order::{PhoneRule, StatusMatchRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ordering: OrderingConfig,
    pub staff: StaffConfig,
}

impl ShopConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone()).context("invalid shop config")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Directory served under `/static` (product photos).
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// NAME of the env var carrying the connection URL (never the URL).
    pub url_env: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url_env: "DRK_DATABASE_URL".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    pub phone_rule: PhoneRule,
    pub status_match: StatusMatchRule,
    /// Store assigned to new orders before the customer picks one.
    pub default_store_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffConfig {
    pub login: StaffLoginMode,
    /// NAME of the env var holding the staff pass signing key.
    pub pass_key_env: String,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            login: StaffLoginMode::Database,
            pass_key_env: "DRK_STAFF_KEY".to_string(),
        }
    }
}

/// How the staff login form is checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StaffLoginMode {
    /// The submitted identifier must equal `id`; the staff member then acts
    /// for `store_id`.
    Fixed { id: String, store_id: i32 },
    /// The submitted identifier must be a numeric `store.store_id` that exists.
    #[default]
    Database,
}
