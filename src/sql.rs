//! Parameterized reads and writes against the store.
//!
//! Caller-supplied values only ever travel as bound parameters; the query text
//! is fixed by the code that issues it.

use crate::error::Error;
use crate::pool::ConnectionPool;
use rusqlite::{Connection, Row, ToSql, Transaction, TransactionBehavior};
use std::sync::Arc;

/// Named parameters, usually built with [`rusqlite::named_params!`].
pub type Params<'a> = &'a [(&'a str, &'a dyn ToSql)];

/// A result shape with a statically declared column set.
pub trait FromRow: Sized {
    /// Column names the query must return, matched case-insensitively.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

pub trait SqlQuery: Send + Sync {
    fn read<R: FromRow>(&self, query: &str, params: Params<'_>) -> Result<Vec<R>, Error>;

    /// Execute a statement, returning the number of rows changed.
    fn write(&self, query: &str, params: Params<'_>) -> Result<usize, Error>;

    /// Run `work` inside one transaction. Commits when it returns `Ok`,
    /// rolls back otherwise.
    fn in_transaction<T, F>(&self, behavior: TransactionBehavior, work: F) -> Result<T, Error>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, Error>;
}

/// Handle to an open transaction.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl UnitOfWork<'_> {
    pub fn read<R: FromRow>(&self, query: &str, params: Params<'_>) -> Result<Vec<R>, Error> {
        read_rows(&self.tx, query, params)
    }

    pub fn write(&self, query: &str, params: Params<'_>) -> Result<usize, Error> {
        Ok(self.tx.execute(query, params)?)
    }

    /// Execute an insert and return the generated row id.
    pub fn insert(&self, query: &str, params: Params<'_>) -> Result<i64, Error> {
        self.tx.execute(query, params)?;
        Ok(self.tx.last_insert_rowid())
    }
}

/// [`SqlQuery`] over pooled SQLite connections.
#[derive(Clone)]
pub struct SqliteQuery {
    pool: Arc<ConnectionPool>,
}

impl SqliteQuery {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }
}

impl SqlQuery for SqliteQuery {
    fn read<R: FromRow>(&self, query: &str, params: Params<'_>) -> Result<Vec<R>, Error> {
        let conn = self.pool.acquire()?;
        read_rows(&conn, query, params)
    }

    fn write(&self, query: &str, params: Params<'_>) -> Result<usize, Error> {
        let conn = self.pool.acquire()?;
        Ok(conn.execute(query, params)?)
    }

    fn in_transaction<T, F>(&self, behavior: TransactionBehavior, work: F) -> Result<T, Error>
    where
        F: FnOnce(&UnitOfWork<'_>) -> Result<T, Error>,
    {
        let mut conn = self.pool.acquire()?;
        let uow = UnitOfWork {
            tx: conn.transaction_with_behavior(behavior)?,
        };
        let out = work(&uow)?;
        uow.tx.commit()?;
        Ok(out)
    }
}

fn read_rows<R: FromRow>(
    conn: &Connection,
    query: &str,
    params: Params<'_>,
) -> Result<Vec<R>, Error> {
    let mut stmt = conn.prepare(query)?;
    check_columns(R::COLUMNS, &stmt.column_names())?;

    let mut rows = stmt.query(params)?;
    let mut results = Vec::new();
    while let Some(row) = rows.next()? {
        results.push(R::from_row(row)?);
    }
    Ok(results)
}

fn check_columns(expected: &[&str], returned: &[&str]) -> Result<(), Error> {
    if expected.len() != returned.len() {
        return Err(Error::Mapping(format!(
            "query returns {} columns, row shape expects {}",
            returned.len(),
            expected.len()
        )));
    }

    for column in expected {
        if !returned.iter().any(|r| r.eq_ignore_ascii_case(column)) {
            return Err(Error::Mapping(format!(
                "column {:?} missing from result set {:?}",
                column, returned
            )));
        }
    }

    Ok(())
}
