pub mod config;
pub mod error;
pub mod name_lock;
pub mod pool;
pub mod recorder;
pub mod retriever;
pub mod schema;
pub mod server;
pub mod service;
pub mod sql;
pub mod stats;
pub mod table;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use recorder::ActionsTimingRecorder;
pub use retriever::ActionsTimingRetriever;
pub use service::ActionsTiming;
pub use sql::{FromRow, SqlQuery, SqliteQuery, UnitOfWork};
pub use table::{ScratchTableProvider, SchemaTableProvider, TableName, TableProvider};
pub use types::{ActionId, ActionStatistic, ActionTiming};
