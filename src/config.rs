use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EngineConfig {
    /// Component cache storage settings (see `cache` table in gatehouse.toml).
    #[serde(default)]
    pub cache: CacheConfig,

    /// Privileged broker bind settings (see `broker` table in gatehouse.toml).
    #[serde(default)]
    pub broker: BrokerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Database URL for the persisted component cache.
    /// TOML: `cache.database_url`. Default: `sqlite://gatehouse.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Time-to-live for memoized per-package summaries, in seconds.
    /// TOML: `cache.summary_ttl_secs`. Default: `300`.
    #[serde(default = "default_summary_ttl_secs")]
    pub summary_ttl_secs: u64,

    /// Maximum number of memoized per-package summaries.
    /// TOML: `cache.summary_capacity`. Default: `1024`.
    #[serde(default = "default_summary_capacity")]
    pub summary_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            summary_ttl_secs: default_summary_ttl_secs(),
            summary_capacity: default_summary_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    /// Service descriptor for the root-elevated broker channel.
    /// TOML: `broker.root_descriptor`.
    #[serde(default = "default_root_descriptor")]
    pub root_descriptor: String,

    /// Service descriptor for the delegated lower-privilege channel.
    /// TOML: `broker.proxy_descriptor`.
    #[serde(default = "default_proxy_descriptor")]
    pub proxy_descriptor: String,

    /// Upper bound for a call-triggered bind before waiters are failed
    /// with `BrokerUnavailable`, in seconds.
    /// TOML: `broker.bind_timeout_secs`. Default: `10`.
    #[serde(default = "default_bind_timeout_secs")]
    pub bind_timeout_secs: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            root_descriptor: default_root_descriptor(),
            proxy_descriptor: default_proxy_descriptor(),
            bind_timeout_secs: default_bind_timeout_secs(),
        }
    }
}

const DEFAULT_CONFIG_FILE: &str = "gatehouse.toml";

impl EngineConfig {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(EngineConfig::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `gatehouse.toml` if present.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional gatehouse.toml): {err}")
        })
    }
}

fn default_database_url() -> String {
    "sqlite://gatehouse.db".to_string()
}

fn default_summary_ttl_secs() -> u64 {
    300
}

fn default_summary_capacity() -> u64 {
    1024
}

fn default_root_descriptor() -> String {
    "gatehouse.broker.root".to_string()
}

fn default_proxy_descriptor() -> String {
    "gatehouse.broker.proxy".to_string()
}

fn default_bind_timeout_secs() -> u64 {
    10
}
