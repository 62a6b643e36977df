use actions_timing::config::{
    Config, DEFAULT_BIND, DEFAULT_DATABASE_PATH, DEFAULT_MAX_RETRIES, DEFAULT_SCHEMA,
};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "actions_server")]
#[command(about = "HTTP service recording action timings and reporting per-action averages")]
#[command(version)]
pub struct Args {
    /// SQLite database file, created if missing
    #[arg(long, env = "ACTIONS_TIMING_DB", default_value = DEFAULT_DATABASE_PATH)]
    pub db: PathBuf,

    /// Address to listen on
    #[arg(long, short = 'b', env = "ACTIONS_TIMING_BIND", default_value = DEFAULT_BIND)]
    pub bind: SocketAddr,

    /// Database alias qualifying the tables; anything but `main` is attached
    #[arg(long, env = "ACTIONS_TIMING_SCHEMA", default_value = DEFAULT_SCHEMA)]
    pub schema: String,

    /// File attached under `--schema` (default: `<schema>.db` next to `--db`)
    #[arg(long, env = "ACTIONS_TIMING_SCHEMA_DB")]
    pub schema_db: Option<PathBuf>,

    /// How long a statement waits on a locked database
    #[arg(long, env = "ACTIONS_TIMING_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Idle store connections kept open (default: number of CPUs)
    #[arg(long, env = "ACTIONS_TIMING_POOL_MAX_IDLE")]
    pub pool_max_idle: Option<usize>,

    /// Extra attempts after a transient store failure
    #[arg(long, env = "ACTIONS_TIMING_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    #[arg(long, env = "ACTIONS_TIMING_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Args {
    pub fn to_config(&self) -> Config {
        let defaults = Config::default();
        Config {
            database_path: self.db.clone(),
            schema: self.schema.clone(),
            schema_database: self.schema_db.clone(),
            bind: self.bind,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            pool_max_idle: self.pool_max_idle.unwrap_or(defaults.pool_max_idle),
            max_retries: self.max_retries,
        }
    }
}
