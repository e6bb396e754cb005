use std::env;
use std::path::PathBuf;

/// Runtime configuration, read from the environment once at process start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store endpoint; a local instance stands in for the hosted one.
    pub redis_url: String,
    /// Key namespace the task documents live under.
    pub collection: String,
    pub bind_addr: String,
    pub static_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            collection: "tasks".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            static_dir: PathBuf::from("backend/static"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            collection: env::var("TASKS_COLLECTION").unwrap_or(defaults.collection),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }
}
