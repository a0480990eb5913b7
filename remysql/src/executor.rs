//! Statement execution with retry policy
//!
//! The executor guarantees a `Ready` connection before every attempt,
//! classifies driver failures into retryable and fatal classes, and keeps
//! all retrying internal: callers see either one [`CommandResult`] or one
//! typed error per statement.

use tokio::time::sleep;
use tracing::warn;

use crate::connection::{Connection, ConnectionState};
use crate::driver::{Driver, DriverError};
use crate::error::{CommandCause, CommandError, Error, Result};
use crate::observer::ConnectionEvent;
use crate::retry::{classify_command, CommandClass, RetryBudget};
use crate::row::Row;
use crate::signals::TerminationTrap;

/// Outcome of one statement execution.
///
/// Ephemeral: not retained beyond the call that produced it.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// Result rows, in server order. Empty for statements that report no
    /// result-set columns.
    pub rows: Vec<Row>,
    pub affected_rows: u64,
    pub last_insert_id: Option<u64>,
    /// Server warnings attached to the successful statement. Already logged;
    /// surfaced here for callers that want to inspect them.
    pub warnings: Vec<String>,
}

impl<D: Driver> Connection<D> {
    /// Execute a statement using the configured retry count.
    pub async fn execute(&mut self, sql: &str) -> Result<CommandResult> {
        self.execute_with_budget(sql, None).await
    }

    /// Execute a statement with an explicit retry budget.
    ///
    /// Reconnects transparently if the connection is not `Ready`; a connect
    /// failure surfaces without the statement ever being attempted.
    pub async fn execute_with_budget(
        &mut self,
        sql: &str,
        budget: Option<u32>,
    ) -> Result<CommandResult> {
        let retry_wait = self.options.retry_wait();
        let mut budget = RetryBudget::new(budget.unwrap_or(self.options.retry_count()));

        loop {
            self.connect().await?;

            let mut trap = TerminationTrap::arm();
            let outcome = self.driver.execute(sql).await;
            if let Some(signal) = trap.observed() {
                // The process is about to go away; a "successful" statement
                // must not be reported as such.
                return Err(CommandError::Terminated { signal }.into());
            }

            let err = match outcome {
                Ok(response) => {
                    for warning in &response.warnings {
                        warn!(warning = %warning, "server warning");
                        self.notify(ConnectionEvent::ServerWarning {
                            message: warning.clone(),
                        });
                    }
                    let rows = if response.field_count > 0 {
                        response.rows
                    } else {
                        Vec::new()
                    };
                    self.notify(ConnectionEvent::StatementExecuted {
                        sql: sql.to_string(),
                        affected_rows: response.affected_rows,
                    });
                    return Ok(CommandResult {
                        rows,
                        affected_rows: response.affected_rows,
                        last_insert_id: response.last_insert_id,
                        warnings: response.warnings,
                    });
                }
                Err(err) => err,
            };

            match classify_command(&err, self.autocommit_enabled) {
                CommandClass::Fatal(cause) => {
                    return Err(CommandError::Exhausted {
                        cause,
                        message: err.message,
                    }
                    .into());
                }
                CommandClass::RetryReconnect => {
                    warn!(errno = err.code, "server gone, reconnecting for retry");
                    let _ = self.driver.close().await;
                    self.state = ConnectionState::Disconnected;
                    self.transaction_open = false;
                    self.consume_retry(&mut budget, CommandCause::Generic, &err)?;
                }
                CommandClass::RetryInterrupted => {
                    warn!(errno = err.code, error = %err.message, "query interrupted, retrying");
                    self.consume_retry(&mut budget, CommandCause::Interrupted, &err)?;
                    sleep(Self::interrupted_retry_pause()).await;
                }
                CommandClass::RetryGeneric => {
                    warn!(errno = err.code, error = %err.message, "statement failed, retrying");
                    self.consume_retry(&mut budget, CommandCause::Generic, &err)?;
                    sleep(retry_wait).await;
                }
            }
        }
    }

    /// Consume one retry from the budget; surfaces the exhausted error,
    /// carrying the last observed driver error text, when none remain.
    fn consume_retry(
        &mut self,
        budget: &mut RetryBudget,
        cause: CommandCause,
        err: &DriverError,
    ) -> Result<()> {
        if !budget.try_consume() {
            return Err(CommandError::Exhausted {
                cause,
                message: err.message.clone(),
            }
            .into());
        }
        self.notify(ConnectionEvent::RetryScheduled {
            operation: "execute",
            remaining: budget.remaining(),
        });
        Ok(())
    }

    /// Fire-and-forget statement: best-effort send with no result handling.
    ///
    /// Only valid when autocommit is on, the connection is non-persistent,
    /// and no transaction is open; violating any of these is a precondition
    /// failure, never a retryable condition.
    pub async fn execute_detached(&mut self, sql: &str) -> Result<()> {
        if !self.autocommit_enabled {
            return Err(Error::Command(CommandError::DetachedPrecondition(
                "autocommit must be enabled",
            )));
        }
        if self.options.persistent() {
            return Err(Error::Command(CommandError::DetachedPrecondition(
                "connection must not be persistent",
            )));
        }
        if self.transaction_open {
            return Err(Error::Command(CommandError::DetachedPrecondition(
                "no transaction may be open",
            )));
        }

        self.connect().await?;
        if let Err(err) = self.driver.dispatch(sql).await {
            // Best effort by contract; the send is not replayed and the
            // failure is not surfaced.
            warn!(errno = err.code, error = %err.message, "detached statement failed");
        }
        Ok(())
    }
}
