//! Runtime secret resolution.
//!
//! Config YAML stores only env var NAMES. The database URL and the staff pass
//! key are resolved once at startup; error messages name the variable, never
//! its value, and `Debug` redacts both.

use anyhow::{bail, Result};

use crate::ShopConfig;

#[derive(Clone)]
pub struct DatabaseSecret {
    /// Name of the env var the URL came from.
    pub env_name: String,
    pub url: String,
}

impl std::fmt::Debug for DatabaseSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSecret")
            .field("env_name", &self.env_name)
            .field("url", &"<REDACTED>")
            .finish()
    }
}

/// Resolve the database URL from the env var named by `database.url_env`.
pub fn resolve_database_url(cfg: &ShopConfig) -> Result<DatabaseSecret> {
    let name = cfg.database.url_env.trim();
    if name.is_empty() {
        bail!("SECRETS_MISCONFIGURED: database.url_env is empty");
    }

    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(DatabaseSecret {
            env_name: name.to_string(),
            url: v,
        }),
        _ => bail!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            name
        ),
    }
}

#[derive(Clone)]
pub struct StaffKeySecret {
    pub env_name: String,
    pub key: String,
}

impl std::fmt::Debug for StaffKeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffKeySecret")
            .field("env_name", &self.env_name)
            .field("key", &"<REDACTED>")
            .finish()
    }
}

/// Staff pass key from the env var named by `staff.pass_key_env`. `None` when
/// the name is blank or the variable is unset or empty; the caller then signs
/// with a per-process key.
pub fn resolve_staff_key(cfg: &ShopConfig) -> Option<StaffKeySecret> {
    let name = cfg.staff.pass_key_env.trim();
    if name.is_empty() {
        return None;
    }
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Some(StaffKeySecret {
            env_name: name.to_string(),
            key: v,
        }),
        _ => None,
    }
}
