//! remysql - Resilient MySQL client layer
//!
//! A client layer over a MySQL-compatible server that owns connection
//! lifecycle, transaction discipline, retry/backoff policy on transient
//! failures, safe SQL text construction, and a typed error taxonomy callers
//! can act on programmatically. The wire protocol is delegated to an
//! underlying driver behind the [`Driver`] capability trait;
//! [`MySqlDriver`] binds it to `mysql_async`.
//!
//! # Features
//!
//! - **Connection state machine**: idempotent connect, timed-out attempts
//!   retried against a budget with backoff, post-connect session setup
//! - **Retrying executor**: transient statement failures retried, fatal
//!   classes (syntax, duplicate key) surfaced immediately
//! - **Query builder**: structured intents to SQL text with a strict
//!   escaping policy; [`Expression`] for verbatim fragments
//! - **Typed errors**: one closed error enum per subsystem
//!
//! # Example
//!
//! ```ignore
//! use remysql::{Connection, Credentials, MySqlDriver, Options, WhereClause};
//!
//! async fn demote(conn: &mut Connection<MySqlDriver>) -> remysql::Result<u64> {
//!     conn.update_where(
//!         "users",
//!         &[("status", "inactive".into())],
//!         &WhereClause::new().is_in("id", [1i64, 2, 3]),
//!     )
//!     .await
//! }
//!
//! # async fn open() -> remysql::Result<()> {
//! let credentials = Credentials::new("db.internal", 3306, "app", "secret", "main");
//! let mut conn = Connection::new(MySqlDriver::new(), credentials, Options::default());
//! conn.connect().await?;
//! let demoted = demote(&mut conn).await?;
//! conn.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod driver;
pub mod error;
pub mod executor;
pub mod mysql;
pub mod observer;
pub mod options;
pub mod query;
pub mod registry;
pub mod row;
pub mod signals;
pub mod value;

mod ops;
mod retry;
mod transaction;

// Re-export main types
pub use connection::{Connection, ConnectionState, MIN_SERVER_VERSION};
pub use driver::{
    AccessMode, DefaultEscaper, Driver, DriverError, DriverResult, Escaper, ReleaseMode,
    ServerResponse, Transport,
};
pub use error::{
    BuilderError, CommandCause, CommandError, ConnectError, Error, RegistryError, Result,
    TransactionError,
};
pub use executor::CommandResult;
pub use mysql::MySqlDriver;
pub use observer::{ConnectionEvent, ConnectionObserver};
pub use options::{Credentials, IsolationLevel, Options};
pub use query::{
    build_delete, build_insert, build_insert_many, build_replace_many, build_select,
    build_update, build_update_many_case, build_upsert_many, CaseWhen, Expression, SqlArg,
    WhereClause,
};
pub use registry::{ConnectionRegistry, RejectedRegistration};
pub use row::Row;
pub use signals::TerminationTrap;
pub use value::Value;
