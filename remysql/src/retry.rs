//! Retry budget and failure classification
//!
//! Connect and execute paths share the same budget discipline: the budget is
//! initialized from the configured retry count (or an explicit override) on
//! the first failure, decrements on every retryable failure, and surfaces
//! the final classified error once it reaches zero. Classification returns
//! explicit retry-vs-fatal enums; no exception-based control flow.

use crate::driver::{
    DriverError, ERR_CONNECTION_TIMED_OUT, ERR_DUP_ENTRY, ERR_LOCK_DEADLOCK,
    ERR_LOCK_WAIT_TIMEOUT, ERR_PARSE, ERR_QUERY_INTERRUPTED,
};
use crate::error::CommandCause;

/// Remaining permitted retries for one operation.
#[derive(Debug)]
pub(crate) struct RetryBudget {
    remaining: u32,
    touched: bool,
}

impl RetryBudget {
    pub(crate) fn new(limit: u32) -> Self {
        Self {
            remaining: limit,
            touched: false,
        }
    }

    /// Consume one retry. Returns `false` when the budget is spent.
    pub(crate) fn try_consume(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.touched = true;
        true
    }

    /// Whether any retry has been consumed yet. Until then, unknown connect
    /// failures propagate immediately instead of entering the backoff cycle.
    pub(crate) fn touched(&self) -> bool {
        self.touched
    }

    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }
}

/// Connect-phase classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectClass {
    /// Timed-out connect (vendor 2002): retryable immediately, no backoff.
    TimedOut,
    /// Everything else. Fatal on the first attempt; backoff-retried once a
    /// budget has been established.
    Other,
}

pub(crate) fn classify_connect(err: &DriverError) -> ConnectClass {
    if err.code == ERR_CONNECTION_TIMED_OUT {
        ConnectClass::TimedOut
    } else {
        ConnectClass::Other
    }
}

/// Execute-phase classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CommandClass {
    /// Interruption / "try restarting" class: retry after a short
    /// randomized sleep.
    RetryInterrupted,
    /// Session severed with autocommit on: only the in-flight statement is
    /// lost, so disconnect and retry through a reconnect.
    RetryReconnect,
    /// Generic transient condition: retry after the configured wait.
    RetryGeneric,
    /// Never retried; exhausts the budget immediately.
    Fatal(CommandCause),
}

pub(crate) fn classify_command(err: &DriverError, autocommit: bool) -> CommandClass {
    if is_interrupted(err) {
        return CommandClass::RetryInterrupted;
    }
    if err.code == ERR_DUP_ENTRY || err.message.contains("Duplicate entry") {
        return CommandClass::Fatal(CommandCause::DuplicateKey);
    }
    if err.code == ERR_PARSE || err.message.contains("error in your SQL syntax") {
        return CommandClass::Fatal(CommandCause::Syntax);
    }
    if err.server_gone {
        return if autocommit {
            CommandClass::RetryReconnect
        } else {
            // All uncommitted work is lost; retrying is pointless.
            CommandClass::Fatal(CommandCause::ServerGoneNoAutocommit)
        };
    }
    CommandClass::RetryGeneric
}

fn is_interrupted(err: &DriverError) -> bool {
    matches!(
        err.code,
        ERR_QUERY_INTERRUPTED | ERR_LOCK_WAIT_TIMEOUT | ERR_LOCK_DEADLOCK
    ) || err.message.contains("Query execution was interrupted")
        || err.message.contains("try restarting transaction")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ERR_SERVER_GONE, ERR_UNKNOWN};

    #[test]
    fn test_budget_decrements_to_exhaustion() {
        let mut budget = RetryBudget::new(2);
        assert!(!budget.touched());
        assert!(budget.try_consume());
        assert!(budget.touched());
        assert!(budget.try_consume());
        assert!(!budget.try_consume());
        assert_eq!(budget.remaining(), 0);
    }

    #[test]
    fn test_zero_budget_never_touched() {
        let mut budget = RetryBudget::new(0);
        assert!(!budget.try_consume());
        assert!(!budget.touched());
    }

    #[test]
    fn test_connect_classification() {
        let timed_out = DriverError::timed_out();
        assert_eq!(classify_connect(&timed_out), ConnectClass::TimedOut);

        let refused = DriverError::new(1045, "Access denied");
        assert_eq!(classify_connect(&refused), ConnectClass::Other);
    }

    #[test]
    fn test_duplicate_and_syntax_are_fatal() {
        let dup = DriverError::new(ERR_DUP_ENTRY, "Duplicate entry '1' for key 'PRIMARY'");
        assert_eq!(
            classify_command(&dup, true),
            CommandClass::Fatal(CommandCause::DuplicateKey)
        );

        let syntax = DriverError::new(ERR_PARSE, "You have an error in your SQL syntax");
        assert_eq!(
            classify_command(&syntax, true),
            CommandClass::Fatal(CommandCause::Syntax)
        );
    }

    #[test]
    fn test_try_restarting_is_retryable() {
        let deadlock = DriverError::new(
            ERR_LOCK_DEADLOCK,
            "Deadlock found when trying to get lock; try restarting transaction",
        );
        assert_eq!(
            classify_command(&deadlock, false),
            CommandClass::RetryInterrupted
        );
    }

    #[test]
    fn test_server_gone_depends_on_autocommit() {
        let gone = DriverError::new(ERR_SERVER_GONE, "MySQL server has gone away");
        assert_eq!(classify_command(&gone, true), CommandClass::RetryReconnect);
        assert_eq!(
            classify_command(&gone, false),
            CommandClass::Fatal(CommandCause::ServerGoneNoAutocommit)
        );
    }

    #[test]
    fn test_unknown_failure_is_generic() {
        let other = DriverError::new(ERR_UNKNOWN, "something odd");
        assert_eq!(classify_command(&other, true), CommandClass::RetryGeneric);
    }
}
