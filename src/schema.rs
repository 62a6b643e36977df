use crate::error::Error;
use crate::sql::SqlQuery;
use crate::table::{TableProvider, ACTIONS, ACTION_TIMES};

/// Create the dictionary and sample tables, plus the sample lookup index, if
/// they do not exist yet.
pub fn ensure_schema<Q: SqlQuery>(query: &Q, tables: &dyn TableProvider) -> Result<(), Error> {
    let actions = tables.table(ACTIONS)?;
    let action_times = tables.table(ACTION_TIMES)?;

    query.write(
        &format!(
            "CREATE TABLE IF NOT EXISTS {actions} (
                actionId INTEGER PRIMARY KEY AUTOINCREMENT,
                actionName TEXT NOT NULL UNIQUE
            )"
        ),
        &[],
    )?;

    // SQLite only resolves foreign keys within the same schema, so the
    // target is named without qualification.
    query.write(
        &format!(
            "CREATE TABLE IF NOT EXISTS {action_times} (
                actionTimeId INTEGER PRIMARY KEY AUTOINCREMENT,
                actionId INTEGER NOT NULL REFERENCES {actions_bare} (actionId),
                actionTime REAL NOT NULL
            )",
            actions_bare = actions.bare(),
        ),
        &[],
    )?;

    query.write(
        &format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {action_times_bare} (actionId)",
            index = action_times.sibling("ix")?,
            action_times_bare = action_times.bare(),
        ),
        &[],
    )?;

    tracing::debug!(%actions, %action_times, "schema ready");
    Ok(())
}
