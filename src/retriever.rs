use crate::error::Error;
use crate::sql::{FromRow, SqlQuery};
use crate::table::{TableName, TableProvider, ACTIONS, ACTION_TIMES};
use crate::types::ActionStatistic;
use rusqlite::Row;
use std::sync::Arc;

impl FromRow for ActionStatistic {
    const COLUMNS: &'static [&'static str] = &["name", "avg"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get("name")?,
            avg: row.get("avg")?,
        })
    }
}

/// Computes the average sample time of every action that has samples.
pub struct ActionsTimingRetriever<Q: SqlQuery> {
    query: Arc<Q>,
    actions: TableName,
    action_times: TableName,
}

impl<Q: SqlQuery> ActionsTimingRetriever<Q> {
    pub fn new(query: Arc<Q>, tables: &dyn TableProvider) -> Result<Self, Error> {
        Ok(Self {
            query,
            actions: tables.table(ACTIONS)?,
            action_times: tables.table(ACTION_TIMES)?,
        })
    }

    /// One row per action id with at least one sample, in no particular order.
    ///
    /// Runs outside any write transaction and sees whatever samples were
    /// committed when the read started.
    ///
    /// When the running sum overflows, the mean is taken as the sum of
    /// `value / count` instead, which stays within the range of the samples.
    pub fn retrieve(&self) -> Result<Vec<ActionStatistic>, Error> {
        let stats = self.query.read(
            &format!(
                "SELECT a.actionName AS name,
                    CASE WHEN ABS(AVG(t.actionTime)) <= {max:e}
                        THEN AVG(t.actionTime)
                        ELSE SUM(t.actionTime / c.n)
                    END AS avg
                FROM {times} t
                JOIN (SELECT actionId, COUNT(*) AS n FROM {times} GROUP BY actionId) c
                    ON c.actionId = t.actionId
                JOIN {actions} a ON a.actionId = t.actionId
                GROUP BY t.actionId, a.actionName",
                max = f64::MAX,
                times = self.action_times,
                actions = self.actions,
            ),
            &[],
        )?;
        tracing::trace!(actions = stats.len(), "computed statistics");
        Ok(stats)
    }
}
