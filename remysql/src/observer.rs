//! Connection event observers
//!
//! A small explicit observer capability: observers are invoked synchronously
//! in registration order, and any observer can stop propagation to the ones
//! registered after it. Observers never influence the operation that emitted
//! the event.

use std::ops::ControlFlow;

/// Payload describing something that happened on a connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The connection reached `Ready`.
    Connected {
        host: String,
        /// Connect attempts it took, including the successful one.
        attempts: u32,
    },
    /// A retry was scheduled for a connect or execute failure.
    RetryScheduled {
        operation: &'static str,
        remaining: u32,
    },
    /// A statement completed successfully.
    StatementExecuted { sql: String, affected_rows: u64 },
    /// The server attached a warning to an otherwise successful statement.
    ServerWarning { message: String },
    /// A transaction was opened.
    TransactionStarted { read_only: bool },
    /// The connection was closed.
    Closed,
}

/// Synchronous observer of connection events.
pub trait ConnectionObserver: Send {
    /// Handle one event. Returning `ControlFlow::Break(())` stops
    /// propagation to later-registered observers for this event only.
    fn on_event(&mut self, event: &ConnectionEvent) -> ControlFlow<()>;
}
