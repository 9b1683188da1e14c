// ============================
// meetlink-backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Data directory path (meeting directory file lives here)
    pub data_dir: PathBuf,
    /// Log level
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".parse().expect("static addr"),
            data_dir: PathBuf::from("data"),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and `MEETLINK_`-prefixed env vars,
    /// falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load settings from an explicit config file path
    pub fn load_from(path: &str) -> Result<Self> {
        let settings = Figment::from(figment::providers::Serialized::defaults(
            SettingsDefaults::default(),
        ))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MEETLINK_"))
        .extract()?;

        Ok(settings)
    }
}

/// Serializable mirror of [`Settings`] defaults for the figment base layer
#[derive(Debug, serde::Serialize)]
struct SettingsDefaults {
    bind_addr: String,
    data_dir: String,
    log_level: String,
}

impl Default for SettingsDefaults {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            data_dir: "data".to_string(),
            log_level: "info".to_string(),
        }
    }
}
