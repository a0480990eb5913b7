//! Error types for remysql
//!
//! Each subsystem surfaces its own closed error enum; [`Error`] aggregates
//! them for callers that work against the whole layer. Retryable conditions
//! are never represented here — by the time an error reaches a caller, its
//! retry budget is spent.

use thiserror::Error;

use crate::driver::DriverError;

/// Result type alias for remysql operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for operations that cross subsystems
/// (e.g. executing a statement may fail while reconnecting).
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Builder(#[from] BuilderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Connect-phase failures and configuration failures with no retry semantics
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Connect failed and the retry budget is spent
    #[error("connect failed after exhausting retries (errno {code}): {message}")]
    Exhausted { code: u16, message: String },

    /// A connect error class that is never retried
    #[error("connect failed (errno {code}): {message}")]
    Fatal { code: u16, message: String },

    /// An option value was rejected at set time
    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: &'static str, reason: String },

    /// Server version below the supported baseline
    #[error("server version {version} is below the supported minimum {minimum}")]
    ServerTooOld { version: String, minimum: String },

    /// Post-connect session configuration failed; never retried
    #[error("connection configuration failed: {0}")]
    Configuration(String),
}

/// Transaction control failures; distinct per operation, never retried
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("failed to begin transaction: {source}")]
    Begin { source: DriverError },

    #[error("failed to commit transaction: {source}")]
    Commit { source: DriverError },

    #[error("failed to roll back transaction: {source}")]
    Rollback { source: DriverError },

    #[error("failed to change autocommit mode: {source}")]
    Autocommit { source: DriverError },

    #[error("no live connection for transaction control")]
    NotConnected,
}

/// Classified cause of a statement failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCause {
    /// SQL syntax violation; retrying can never succeed
    Syntax,
    /// Duplicate-key violation; retrying can never succeed
    DuplicateKey,
    /// Session severed while autocommit was off; uncommitted work is lost
    ServerGoneNoAutocommit,
    /// Query interruption / deadlock class of transient fault
    Interrupted,
    /// Any other failure, treated as a generic transient condition
    Generic,
}

impl std::fmt::Display for CommandCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommandCause::Syntax => "syntax error",
            CommandCause::DuplicateKey => "duplicate key",
            CommandCause::ServerGoneNoAutocommit => "server gone without autocommit",
            CommandCause::Interrupted => "query interrupted",
            CommandCause::Generic => "generic failure",
        };
        f.write_str(name)
    }
}

/// Statement execution failures after the retry budget is spent
#[derive(Error, Debug)]
pub enum CommandError {
    /// The last observed driver error, with its classified cause
    #[error("statement failed ({cause}): {message}")]
    Exhausted { cause: CommandCause, message: String },

    /// A termination-class OS signal arrived during execution
    #[error("termination signal {signal} observed during statement execution")]
    Terminated { signal: &'static str },

    /// Fire-and-forget dispatch precondition violated
    #[error("detached execution precondition violated: {0}")]
    DetachedPrecondition(&'static str),
}

/// Malformed structured input to the query builder
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// A case/when pair is missing its match value or its replacement value
    #[error("case/when pair {index} is missing its {missing}")]
    IncompleteCasePair { index: usize, missing: &'static str },

    #[error("bulk statement requires at least one row")]
    EmptyRows,

    #[error("bulk statement requires at least one column")]
    EmptyColumns,

    /// An `IN` condition without alternatives cannot be emitted
    #[error("IN condition on {column} requires at least one value")]
    EmptyInSet { column: String },

    /// A row in a bulk statement does not match the column list width
    #[error("row {index} has {got} values, expected {expected}")]
    RowWidthMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },

    /// The driver escape routine produced unusable output
    #[error("value escaping failed: {0}")]
    EscapeFailure(String),
}

/// Keyed connection registry failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a connection is already registered under key {0:?}")]
    DuplicateKey(String),

    #[error("no connection registered under key {0:?}")]
    UnknownKey(String),
}
