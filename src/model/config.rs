use serde::{Deserialize, Serialize};

/// Configuration from `.checktree/config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Task store file, relative to the `.checktree/` directory
    #[serde(default = "default_store_file")]
    pub file: String,
    /// How long a writer waits for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            file: default_store_file(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive used when neither `CHECKTREE_LOG` nor `-v` is given
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            filter: default_log_filter(),
        }
    }
}

fn default_store_file() -> String {
    "tasks.json".to_string()
}

fn default_lock_timeout_ms() -> u64 {
    5000
}

fn default_log_filter() -> String {
    "warn".to_string()
}
