use crate::error::Error;
use crate::name_lock::NameLocks;
use crate::sql::{FromRow, SqlQuery};
use crate::table::{TableName, TableProvider, ACTIONS, ACTION_TIMES};
use crate::types::{ActionId, ActionTiming};
use rusqlite::{named_params, Row, TransactionBehavior};
use std::sync::Arc;

struct ActionIdRow {
    action_id: i64,
}

impl FromRow for ActionIdRow {
    const COLUMNS: &'static [&'static str] = &["actionId"];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            action_id: row.get("actionId")?,
        })
    }
}

/// Records timing samples, creating dictionary entries for new action names.
pub struct ActionsTimingRecorder<Q: SqlQuery> {
    query: Arc<Q>,
    actions: TableName,
    action_times: TableName,
    locks: NameLocks,
}

impl<Q: SqlQuery> ActionsTimingRecorder<Q> {
    pub fn new(query: Arc<Q>, tables: &dyn TableProvider) -> Result<Self, Error> {
        Ok(Self {
            query,
            actions: tables.table(ACTIONS)?,
            action_times: tables.table(ACTION_TIMES)?,
            locks: NameLocks::new(),
        })
    }

    /// Store one sample and return the identifier of its action.
    pub fn record(&self, timing: &ActionTiming) -> Result<ActionId, Error> {
        timing.validate()?;

        let action_id = self.resolve_or_create(&timing.action)?;

        // The dictionary transaction is already committed here. If this insert
        // fails the entry stays behind with no samples; that is accepted, a
        // duplicate name is not.
        self.query.write(
            &format!(
                "INSERT INTO {} (actionId, actionTime) VALUES (:actionId, :actionTime)",
                self.action_times
            ),
            named_params! { ":actionId": action_id.0, ":actionTime": timing.time },
        )?;

        tracing::debug!(action = %timing.action, %action_id, time = timing.time, "recorded sample");
        Ok(action_id)
    }

    /// Return the dictionary id for `name`, inserting it if it is not there yet.
    ///
    /// Same-name callers are serialized twice: by the in-process name lock and
    /// by the store's write lock taken when the transaction begins. The
    /// transaction is committed before returning so neither lock is held
    /// while the caller inserts its sample.
    pub fn resolve_or_create(&self, name: &str) -> Result<ActionId, Error> {
        self.locks.with_lock(name, || {
            self.query.in_transaction(TransactionBehavior::Immediate, |uow| {
                let existing: Vec<ActionIdRow> = uow.read(
                    &format!(
                        "SELECT actionId FROM {} WHERE actionName = :actionName",
                        self.actions
                    ),
                    named_params! { ":actionName": name },
                )?;

                if let Some(row) = existing.first() {
                    return Ok(ActionId(row.action_id));
                }

                // A uniqueness failure here means the locking above is broken;
                // it propagates as a constraint violation.
                let id = uow.insert(
                    &format!("INSERT INTO {} (actionName) VALUES (:actionName)", self.actions),
                    named_params! { ":actionName": name },
                )?;
                tracing::debug!(action = %name, action_id = id, "created dictionary entry");
                Ok(ActionId(id))
            })
        })
    }
}
