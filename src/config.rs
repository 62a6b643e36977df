use crate::error::Error;
use crate::table::validate_identifier;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "actions_timing.db";
pub const DEFAULT_SCHEMA: &str = "main";
pub const DEFAULT_BIND: &str = "127.0.0.1:5080";
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Everything the store-facing components need, passed in at construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Database alias that qualifies every table name. Anything other than
    /// `main` is attached from `schema_database` on every connection.
    pub schema: String,
    /// File attached under `schema`. Defaults to `<schema>.db` next to
    /// `database_path`.
    pub schema_database: Option<PathBuf>,
    pub bind: SocketAddr,
    /// How long a statement waits on a locked database before failing as transient.
    pub busy_timeout: Duration,
    /// Idle connections kept for reuse.
    pub pool_max_idle: usize,
    /// Extra attempts for a unit of work that failed transiently.
    pub max_retries: u32,
}

impl Config {
    pub fn with_database<P: Into<PathBuf>>(database_path: P) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// The `(alias, file)` every store connection attaches, or `None` when the
    /// tables live in `main`.
    ///
    /// `temp` is refused: it is private to one connection, so pooled
    /// connections would each see different tables.
    pub fn attachment(&self) -> Result<Option<(String, PathBuf)>, Error> {
        if self.schema.eq_ignore_ascii_case(DEFAULT_SCHEMA) {
            return Ok(None);
        }
        if self.schema.eq_ignore_ascii_case("temp") {
            return Err(Error::validation(
                "schema \"temp\" is per-connection and cannot hold shared tables",
            ));
        }
        validate_identifier(&self.schema)?;

        let path = match &self.schema_database {
            Some(path) => path.clone(),
            None => self.database_path.with_file_name(format!("{}.db", self.schema)),
        };
        Ok(Some((self.schema.clone(), path)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            schema: DEFAULT_SCHEMA.to_string(),
            schema_database: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 5080)),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            pool_max_idle: num_cpus::get().max(1),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}
