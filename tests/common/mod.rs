#![allow(dead_code)]

use actions_timing::pool::ConnectionPool;
use actions_timing::schema::ensure_schema;
use actions_timing::table::{ACTIONS, ACTION_TIMES};
use actions_timing::{
    ActionStatistic, ActionTiming, ActionsTimingRecorder, ActionsTimingRetriever, FromRow,
    ScratchTableProvider, SqlQuery, SqliteQuery, TableProvider,
};
use rusqlite::Row;
use std::sync::Arc;
use std::time::Duration;

/// A database file with its own pair of scratch tables.
pub struct ScratchStore {
    pub dir: tempfile::TempDir,
    pub query: Arc<SqliteQuery>,
    pub tables: ScratchTableProvider,
}

impl ScratchStore {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::new(
            dir.path().join("actions.db"),
            Duration::from_secs(10),
            8,
        );
        let query = Arc::new(SqliteQuery::new(Arc::new(pool)));
        let tables = ScratchTableProvider::new("main");
        ensure_schema(query.as_ref(), &tables).unwrap();
        Self { dir, query, tables }
    }

    pub fn recorder(&self) -> ActionsTimingRecorder<SqliteQuery> {
        ActionsTimingRecorder::new(Arc::clone(&self.query), &self.tables).unwrap()
    }

    pub fn retriever(&self) -> ActionsTimingRetriever<SqliteQuery> {
        ActionsTimingRetriever::new(Arc::clone(&self.query), &self.tables).unwrap()
    }

    pub fn dictionary_size(&self) -> i64 {
        let actions = self.tables.table(ACTIONS).unwrap();
        let rows: Vec<Count> = self
            .query
            .read(&format!("SELECT COUNT(*) AS total FROM {actions}"), &[])
            .unwrap();
        rows[0].total
    }

    /// Every stored sample, joined back to its action name.
    pub fn stored_timings(&self) -> Vec<ActionTiming> {
        let actions = self.tables.table(ACTIONS).unwrap();
        let action_times = self.tables.table(ACTION_TIMES).unwrap();
        let rows: Vec<StoredTiming> = self
            .query
            .read(
                &format!(
                    "SELECT a.actionName AS action, t.actionTime AS time
                    FROM {action_times} t
                    JOIN {actions} a ON a.actionId = t.actionId"
                ),
                &[],
            )
            .unwrap();
        rows.into_iter().map(|r| r.0).collect()
    }
}

pub struct Count {
    pub total: i64,
}

impl FromRow for Count {
    const COLUMNS: &'static [&'static str] = &["total"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            total: row.get("total")?,
        })
    }
}

struct StoredTiming(ActionTiming);

impl FromRow for StoredTiming {
    const COLUMNS: &'static [&'static str] = &["action", "time"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self(ActionTiming {
            action: row.get("action")?,
            time: row.get("time")?,
        }))
    }
}

pub fn timings(pairs: &[(&str, f64)]) -> Vec<ActionTiming> {
    pairs
        .iter()
        .map(|(action, time)| ActionTiming::new(*action, *time))
        .collect()
}

pub fn sorted_timings(mut timings: Vec<ActionTiming>) -> Vec<ActionTiming> {
    timings.sort_by(|a, b| a.action.cmp(&b.action).then(a.time.total_cmp(&b.time)));
    timings
}

pub fn sorted_stats(mut stats: Vec<ActionStatistic>) -> Vec<ActionStatistic> {
    stats.sort_by(|a, b| a.name.cmp(&b.name));
    stats
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

pub const INJECTION_NAME: &str = "Robert'; DROP TABLE dbo.actionTimes; --";

/// The sample sets shared by the recorder and retriever suites.
pub fn cases() -> Vec<(&'static str, Vec<ActionTiming>)> {
    vec![
        ("no entries in times table", vec![]),
        ("one action with one recorded time", timings(&[("Run", 100.0)])),
        ("one action with multiple recorded times", timings(&[("Run", 100.0), ("Run", 200.0)])),
        ("one action with duplicate times", timings(&[("Run", 100.0), ("Run", 100.0)])),
        ("one action with fractional time", timings(&[("Run", 99.9), ("Run", 107.5)])),
        ("multiple actions with single times", timings(&[("Run", 100.0), ("Walk", 1000.0)])),
        (
            "multiple actions with multiple times",
            timings(&[("Run", 100.0), ("Run", 200.0), ("Walk", 1000.0), ("Walk", 2000.0)]),
        ),
        ("sql injection", timings(&[(INJECTION_NAME, 100.0)])),
    ]
}
