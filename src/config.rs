//! Process configuration.
//!
//! Environment variables with hard-coded defaults. No config files, no CLI
//! flags — four knobs is not enough surface to justify either.

use std::env;

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP listener binds to. `TUDU_LISTEN`.
    pub listen_addr: String,
    /// MongoDB connection string. `TUDU_MONGO_URI`.
    pub mongo_uri: String,
    /// Database name. `TUDU_MONGO_DB`.
    pub database: String,
    /// Collection name. `TUDU_MONGO_COLLECTION`.
    pub collection: String,
}

impl Config {
    /// Reads configuration from the environment, falling back to defaults
    /// suitable for local development.
    pub fn from_env() -> Self {
        Self {
            listen_addr: var_or("TUDU_LISTEN", "0.0.0.0:9000"),
            mongo_uri: var_or("TUDU_MONGO_URI", "mongodb://127.0.0.1:27017"),
            database: var_or("TUDU_MONGO_DB", "project_todo"),
            collection: var_or("TUDU_MONGO_COLLECTION", "todo"),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_development() {
        // Only assert keys this test does not set; the suite runs in one
        // process and env vars are global.
        let config = Config::from_env();
        assert_eq!(config.database, "project_todo");
        assert_eq!(config.collection, "todo");
    }
}
