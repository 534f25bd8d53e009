//! Configuration file loading and CouchDB credential resolution.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// `data/config.json`. Field names match the on-disk casing exactly; unknown
/// keys are ignored (no `deny_unknown_fields`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "UpdateIntervalSeconds", default = "default_update_interval")]
    pub update_interval_seconds: u64,
    #[serde(rename = "IdPs", default)]
    pub idps: Vec<String>,
    #[serde(rename = "CouchDBservers", default)]
    pub couchdb_servers: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_interval_seconds: default_update_interval(),
            idps: Vec::new(),
            couchdb_servers: Vec::new(),
        }
    }
}

fn default_update_interval() -> u64 {
    21_600
}

/// Read and parse `path`. Missing file or invalid JSON is fatal at startup.
pub fn load_config(path: &Path) -> Result<Config, AppError> {
    let bytes = std::fs::read(path)
        .map_err(|e| AppError::ConfigUnreadable(format!("{}: {e}", path.display())))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AppError::ConfigUnreadable(format!("{}: {e}", path.display())))
}

/// HTTP Basic credentials for every CouchDB endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    /// Reads `COUCHDB_USER` and `COUCHDB_PWD` (falling back to the
    /// `COUCHDB_PASSWORD` alias some deployments use; `COUCHDB_PWD` wins if
    /// both are set).
    pub fn from_env() -> Result<Self, AppError> {
        let user = std::env::var("COUCHDB_USER").map_err(|_| AppError::Unauthorized)?;
        let password = std::env::var("COUCHDB_PWD")
            .or_else(|_| std::env::var("COUCHDB_PASSWORD"))
            .map_err(|_| AppError::Unauthorized)?;
        Ok(Self { user, password })
    }
}
