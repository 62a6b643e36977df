use crate::config::Config;
use crate::error::Error;
use rusqlite::{params, Connection, DatabaseName};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Pool of SQLite connections to one database file, optionally with a second
/// file attached under an alias.
///
/// Connections are opened on demand, so callers never wait on the pool itself;
/// at most `max_idle` of them are kept around once released.
pub struct ConnectionPool {
    path: PathBuf,
    attach: Option<(String, PathBuf)>,
    busy_timeout: Duration,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
    created_count: AtomicUsize,
    reused_count: AtomicUsize,
}

impl ConnectionPool {
    pub fn new<P: Into<PathBuf>>(path: P, busy_timeout: Duration, max_idle: usize) -> Self {
        Self {
            path: path.into(),
            attach: None,
            busy_timeout,
            idle: Mutex::new(Vec::with_capacity(max_idle)),
            max_idle,
            created_count: AtomicUsize::new(0),
            reused_count: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let pool = Self::new(&config.database_path, config.busy_timeout, config.pool_max_idle);
        Ok(match config.attachment()? {
            Some((alias, path)) => pool.with_attachment(alias, path),
            None => pool,
        })
    }

    /// Attach `path` as `alias` on every connection this pool opens.
    pub fn with_attachment<A: Into<String>, P: Into<PathBuf>>(mut self, alias: A, path: P) -> Self {
        self.attach = Some((alias.into(), path.into()));
        self
    }

    /// Take an idle connection, or open a new one
    pub fn acquire(self: &Arc<Self>) -> Result<PooledConnection, Error> {
        let reused = self.idle.lock().ok().and_then(|mut idle| idle.pop());

        let conn = match reused {
            Some(conn) => {
                self.reused_count.fetch_add(1, Ordering::Relaxed);
                conn
            }
            None => {
                let conn = self.open()?;
                self.created_count.fetch_add(1, Ordering::Relaxed);
                conn
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
        })
    }

    fn open(&self) -> Result<Connection, Error> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        // WAL keeps statistics reads from waiting on in-flight inserts
        enable_wal(&conn, DatabaseName::Main)?;

        if let Some((alias, path)) = &self.attach {
            let file = path.to_string_lossy().into_owned();
            conn.execute("ATTACH DATABASE ?1 AS ?2", params![file, alias])?;
            enable_wal(&conn, DatabaseName::Attached(alias.as_str()))?;
        }

        conn.pragma_update(None, "foreign_keys", true)?;
        tracing::trace!(path = %self.path.display(), "opened store connection");
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(conn);
            }
            // Pool is full, the connection closes on drop
        }
    }

    pub fn stats(&self) -> PoolStats {
        let idle = self.idle.lock().map(|p| p.len()).unwrap_or(0);
        let created = self.created_count.load(Ordering::Relaxed);
        let reused = self.reused_count.load(Ordering::Relaxed);

        PoolStats {
            idle,
            total_created: created,
            total_reused: reused,
            reuse_rate: if created + reused > 0 {
                reused as f64 / (created + reused) as f64 * 100.0
            } else {
                0.0
            },
        }
    }
}

fn enable_wal(conn: &Connection, db: DatabaseName<'_>) -> Result<(), Error> {
    let _mode: String =
        conn.pragma_update_and_check(Some(db), "journal_mode", "WAL", |row| row.get(0))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PoolStats {
    pub idle: usize,
    pub total_created: usize,
    pub total_reused: usize,
    pub reuse_rate: f64,
}

/// RAII wrapper that hands the connection back to its pool on drop
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection is present until drop")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection is present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
