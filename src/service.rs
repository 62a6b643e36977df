use crate::config::Config;
use crate::error::Error;
use crate::pool::{ConnectionPool, PoolStats};
use crate::recorder::ActionsTimingRecorder;
use crate::retriever::ActionsTimingRetriever;
use crate::schema::ensure_schema;
use crate::sql::SqliteQuery;
use crate::table::{SchemaTableProvider, TableProvider};
use crate::types::{ActionId, ActionStatistic, ActionTiming};
use std::sync::Arc;
use std::time::Duration;

const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// Recorder and retriever sharing one store, with retries for transient failures.
pub struct ActionsTiming {
    recorder: ActionsTimingRecorder<SqliteQuery>,
    retriever: ActionsTimingRetriever<SqliteQuery>,
    pool: Arc<ConnectionPool>,
    max_retries: u32,
}

impl ActionsTiming {
    /// Open the configured database and create the tables if needed.
    pub fn open(config: &Config) -> Result<Self, Error> {
        let tables = SchemaTableProvider::new(config.schema.as_str());
        Self::open_with_tables(config, &tables)
    }

    pub fn open_with_tables(config: &Config, tables: &dyn TableProvider) -> Result<Self, Error> {
        let pool = Arc::new(ConnectionPool::from_config(config)?);
        let query = Arc::new(SqliteQuery::new(Arc::clone(&pool)));

        ensure_schema(query.as_ref(), tables)?;

        Ok(Self {
            recorder: ActionsTimingRecorder::new(Arc::clone(&query), tables)?,
            retriever: ActionsTimingRetriever::new(query, tables)?,
            pool,
            max_retries: config.max_retries,
        })
    }

    pub fn record(&self, timing: &ActionTiming) -> Result<ActionId, Error> {
        with_retries("record", self.max_retries, || self.recorder.record(timing))
    }

    pub fn resolve_or_create(&self, name: &str) -> Result<ActionId, Error> {
        with_retries("resolve", self.max_retries, || self.recorder.resolve_or_create(name))
    }

    pub fn statistics(&self) -> Result<Vec<ActionStatistic>, Error> {
        with_retries("statistics", self.max_retries, || self.retriever.retrieve())
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

/// Re-run `op` from scratch while it fails transiently, up to `max_retries` extra times.
fn with_retries<T>(
    operation: &str,
    max_retries: u32,
    mut op: impl FnMut() -> Result<T, Error>,
) -> Result<T, Error> {
    let mut attempt = 0;
    loop {
        match op() {
            Err(err) if err.is_retryable() && attempt < max_retries => {
                attempt += 1;
                tracing::warn!(
                    operation,
                    attempt,
                    error = %err,
                    "transient store failure, retrying"
                );
                std::thread::sleep(RETRY_BACKOFF * attempt);
            }
            result => return result,
        }
    }
}
