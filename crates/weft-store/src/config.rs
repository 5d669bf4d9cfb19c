//! Store configuration with environment overrides.

/// Connection and pool settings for [`EventStore`](crate::EventStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Maximum number of pooled connections.
    pub pool_max_size: u32,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_max_size: default_pool_max_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_path() -> String {
    "bank.db".to_string()
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_busy_timeout_ms() -> u32 {
    5000
}

impl StoreConfig {
    /// Creates a configuration for the given database path with default
    /// pool settings.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Loads defaults, then applies environment overrides:
    ///
    /// - `WEFT_DB_PATH` overrides `path`
    /// - `WEFT_POOL_MAX_SIZE` overrides `pool_max_size`
    /// - `WEFT_BUSY_TIMEOUT_MS` overrides `busy_timeout_ms`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("WEFT_DB_PATH") {
            config.path = path;
        }
        if let Ok(size) = std::env::var("WEFT_POOL_MAX_SIZE") {
            if let Ok(parsed) = size.parse() {
                config.pool_max_size = parsed;
            }
        }
        if let Ok(timeout) = std::env::var("WEFT_BUSY_TIMEOUT_MS") {
            if let Ok(parsed) = timeout.parse() {
                config.busy_timeout_ms = parsed;
            }
        }
        config
    }
}
