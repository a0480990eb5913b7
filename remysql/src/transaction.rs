//! Transaction control
//!
//! Begin picks the read-only or read-write primitive from the connection's
//! readonly flag. Begin, commit, and rollback failures are fatal and typed
//! per operation — recovery strategy differs between a commit that did not
//! land and a rollback that did not land, so the kinds stay distinct.

use tracing::debug;

use crate::connection::Connection;
use crate::driver::{AccessMode, Driver, ReleaseMode};
use crate::error::TransactionError;
use crate::observer::ConnectionEvent;

impl<D: Driver> Connection<D> {
    /// Open an explicit transaction.
    ///
    /// A transaction that fails to start must not silently continue in an
    /// ambiguous state: the failure is always surfaced, never retried.
    pub async fn begin_transaction(&mut self) -> Result<(), TransactionError> {
        if !self.is_connected() {
            return Err(TransactionError::NotConnected);
        }
        let mode = if self.options.readonly() {
            AccessMode::ReadOnly
        } else {
            AccessMode::ReadWrite
        };
        self.driver
            .begin(mode)
            .await
            .map_err(|source| TransactionError::Begin { source })?;
        self.transaction_open = true;
        self.notify(ConnectionEvent::TransactionStarted {
            read_only: mode == AccessMode::ReadOnly,
        });
        Ok(())
    }

    /// Commit the open transaction.
    pub async fn commit_transaction(&mut self) -> Result<(), TransactionError> {
        if !self.is_connected() {
            return Err(TransactionError::NotConnected);
        }
        self.driver
            .commit(ReleaseMode::NoRelease)
            .await
            .map_err(|source| TransactionError::Commit { source })?;
        self.transaction_open = false;
        Ok(())
    }

    /// Roll back the open transaction.
    pub async fn rollback_transaction(&mut self) -> Result<(), TransactionError> {
        if !self.is_connected() {
            return Err(TransactionError::NotConnected);
        }
        self.driver
            .rollback()
            .await
            .map_err(|source| TransactionError::Rollback { source })?;
        self.transaction_open = false;
        Ok(())
    }

    /// Toggle autocommit at runtime.
    ///
    /// Re-enabling autocommit while a transaction is open implicitly ends
    /// that transaction on the server, so the open flag is reset here to
    /// keep this side from believing a transaction survives.
    pub async fn set_autocommit(&mut self, enabled: bool) -> Result<(), TransactionError> {
        if !self.is_connected() {
            return Err(TransactionError::NotConnected);
        }
        self.driver
            .autocommit(enabled)
            .await
            .map_err(|source| TransactionError::Autocommit { source })?;
        self.autocommit_enabled = enabled;
        self.options.set_autocommit(enabled);
        if enabled && self.transaction_open {
            debug!("autocommit re-enabled; server ended the open transaction");
            self.transaction_open = false;
        }
        Ok(())
    }
}
