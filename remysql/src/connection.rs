//! Connection lifecycle management
//!
//! A [`Connection`] owns one driver instance and walks it through
//! `Disconnected → Connecting → Configuring → Ready`. Connecting retries
//! timed-out attempts against a budget; configuration failures are fatal and
//! never retried. Teardown settles any implicit transaction state before the
//! network session goes away.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::driver::{AccessMode, Driver, ReleaseMode, Transport};
use crate::error::ConnectError;
use crate::observer::{ConnectionEvent, ConnectionObserver};
use crate::options::{Credentials, Options};
use crate::retry::{classify_connect, ConnectClass, RetryBudget};

/// Minimum supported server version. Session-scoped execution-time limits
/// need the post-5.7.8 feature set.
pub const MIN_SERVER_VERSION: (u16, u16, u16) = (5, 7, 8);

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Configuring,
    Ready,
}

/// One logical database handle.
///
/// Owned exclusively by the caller that created it; not internally
/// synchronized. Use one connection per worker or serialize access
/// externally.
pub struct Connection<D: Driver> {
    pub(crate) driver: D,
    credentials: Credentials,
    pub(crate) options: Options,
    pub(crate) state: ConnectionState,
    pub(crate) transaction_open: bool,
    /// Effective autocommit state, tracked because runtime toggles and
    /// read-only configuration can diverge from the configured default.
    pub(crate) autocommit_enabled: bool,
    observers: Vec<Box<dyn ConnectionObserver>>,
}

impl<D: Driver> Connection<D> {
    /// Create a disconnected handle. No network activity happens until
    /// [`Connection::connect`].
    pub fn new(driver: D, credentials: Credentials, options: Options) -> Self {
        let autocommit_enabled = options.autocommit();
        Self {
            driver,
            credentials,
            options,
            state: ConnectionState::Disconnected,
            transaction_open: false,
            autocommit_enabled,
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Whether an explicit transaction is currently open.
    pub fn transaction_open(&self) -> bool {
        self.transaction_open
    }

    /// The escaping capability of the underlying driver, usable by the
    /// query builder without touching connection state.
    pub fn escaper(&self) -> &D {
        &self.driver
    }

    /// Register an observer. Observers run synchronously, in registration
    /// order.
    pub fn add_observer(&mut self, observer: Box<dyn ConnectionObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn notify(&mut self, event: ConnectionEvent) {
        for observer in &mut self.observers {
            if let ControlFlow::Break(()) = observer.on_event(&event) {
                break;
            }
        }
    }

    /// Establish the connection using the configured retry count.
    ///
    /// Idempotent: calling this on a `Ready` connection performs no network
    /// activity and returns success.
    pub async fn connect(&mut self) -> Result<(), ConnectError> {
        self.connect_with_retries(None).await
    }

    /// Establish the connection with an explicit retry budget.
    pub async fn connect_with_retries(
        &mut self,
        retries: Option<u32>,
    ) -> Result<(), ConnectError> {
        if self.state == ConnectionState::Ready {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let transport = self.transport();
        let retry_wait = self.options.retry_wait();
        let mut budget = RetryBudget::new(retries.unwrap_or(self.options.retry_count()));
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.driver.connect(&self.credentials, &transport).await {
                Ok(()) => break,
                Err(err) => {
                    if classify_connect(&err) == ConnectClass::TimedOut && budget.try_consume() {
                        // Cold-start case: retry right away, nothing surfaces.
                        debug!(attempt = attempts, "connect timed out, retrying");
                        self.notify(ConnectionEvent::RetryScheduled {
                            operation: "connect",
                            remaining: budget.remaining(),
                        });
                        continue;
                    }
                    if !budget.touched() {
                        // Unknown failure with no retry cycle established.
                        self.state = ConnectionState::Disconnected;
                        return Err(ConnectError::Fatal {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    let scale = budget.remaining();
                    if !budget.try_consume() {
                        self.state = ConnectionState::Disconnected;
                        return Err(ConnectError::Exhausted {
                            code: err.code,
                            message: err.message,
                        });
                    }
                    warn!(
                        attempt = attempts,
                        errno = err.code,
                        error = %err.message,
                        "connect failed, backing off"
                    );
                    self.notify(ConnectionEvent::RetryScheduled {
                        operation: "connect",
                        remaining: budget.remaining(),
                    });
                    sleep(retry_wait * scale).await;
                }
            }
        }

        if let Err(err) = self.configure().await {
            // Leave no half-configured session behind.
            let _ = self.driver.close().await;
            self.state = ConnectionState::Disconnected;
            return Err(err);
        }

        self.state = ConnectionState::Ready;
        let host = self.credentials.host().to_string();
        self.notify(ConnectionEvent::Connected { host, attempts });
        Ok(())
    }

    /// Post-connect session setup. Any failure here is a fatal
    /// configuration error with no retry semantics.
    async fn configure(&mut self) -> Result<(), ConnectError> {
        self.state = ConnectionState::Configuring;
        debug!(
            report_level = self.options.report_level(),
            "applying error-reporting verbosity"
        );

        if !self.options.autocommit() {
            self.driver
                .autocommit(false)
                .await
                .map_err(|e| ConnectError::Configuration(e.to_string()))?;
            self.autocommit_enabled = false;
        } else {
            self.autocommit_enabled = true;
        }

        self.check_server_version()?;

        for statement in self.session_statements() {
            self.driver
                .execute(&statement)
                .await
                .map_err(|e| ConnectError::Configuration(format!("{statement}: {e}")))?;
        }

        if self.options.readonly() {
            self.configure_readonly().await?;
        }
        Ok(())
    }

    fn check_server_version(&self) -> Result<(), ConnectError> {
        let Some(version) = self.driver.server_version() else {
            return Ok(());
        };
        if version < MIN_SERVER_VERSION {
            let (m1, m2, m3) = MIN_SERVER_VERSION;
            let (v1, v2, v3) = version;
            return Err(ConnectError::ServerTooOld {
                version: format!("{v1}.{v2}.{v3}"),
                minimum: format!("{m1}.{m2}.{m3}"),
            });
        }
        Ok(())
    }

    fn session_statements(&self) -> Vec<String> {
        vec![
            format!("SET time_zone = '{}'", self.options.time_zone()),
            format!(
                "SET SESSION wait_timeout = {}",
                self.options.wait_timeout().as_secs()
            ),
            format!("SET NAMES {}", self.options.charset()),
        ]
    }

    /// A read-only connection never accepts writes for its lifetime: force
    /// autocommit on for non-persistent sessions, pin the read-only
    /// isolation level, and open a read-only transaction immediately.
    async fn configure_readonly(&mut self) -> Result<(), ConnectError> {
        if !self.options.persistent() {
            self.driver
                .autocommit(true)
                .await
                .map_err(|e| ConnectError::Configuration(e.to_string()))?;
            self.autocommit_enabled = true;
        }
        let isolation = format!(
            "SET SESSION TRANSACTION ISOLATION LEVEL {}, READ ONLY",
            self.options.isolation_readonly().as_sql()
        );
        self.driver
            .execute(&isolation)
            .await
            .map_err(|e| ConnectError::Configuration(e.to_string()))?;
        self.driver
            .begin(AccessMode::ReadOnly)
            .await
            .map_err(|e| ConnectError::Configuration(e.to_string()))?;
        self.transaction_open = true;
        self.notify(ConnectionEvent::TransactionStarted { read_only: true });
        Ok(())
    }

    fn transport(&self) -> Transport {
        Transport {
            connect_timeout: self.options.connect_timeout(),
            read_timeout: self.options.read_timeout(),
            net_buffer_size: self.options.net_buffer_size(),
            init_command: Some(self.init_command()),
        }
    }

    /// Session init statement: SQL mode plus the execution-time guard. The
    /// guard is a best-effort ceiling and is skipped under
    /// `ignore_user_abort`.
    fn init_command(&self) -> String {
        let mut command = format!("SET SESSION sql_mode = '{}'", self.options.sql_mode());
        if !self.options.ignore_user_abort() {
            command.push_str(&format!(
                ", SESSION max_execution_time = {}",
                self.options.max_execution_time().as_millis()
            ));
        }
        command
    }

    /// Close the connection, settling transaction state first.
    ///
    /// No-op when already disconnected. With autocommit disabled and no
    /// explicit transaction open, a final commit runs before the network
    /// close so no implicit dangling transaction survives handle disposal;
    /// the release variant tells the server to drop non-persistent sessions.
    /// Persistent connections skip the network close. Teardown failures are
    /// logged and returned as non-fatal errors the caller may ignore.
    pub async fn close(&mut self) -> Result<(), ConnectError> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        let mut teardown_failure = None;

        if !self.autocommit_enabled && !self.transaction_open {
            let release = if self.options.persistent() {
                ReleaseMode::NoRelease
            } else {
                ReleaseMode::Release
            };
            if let Err(err) = self.driver.commit(release).await {
                warn!(error = %err, "final commit failed during teardown");
                teardown_failure = Some(err.to_string());
            }
        }

        if !self.options.persistent() {
            if let Err(err) = self.driver.close().await {
                warn!(error = %err, "network close failed during teardown");
                teardown_failure.get_or_insert(err.to_string());
            }
        }

        self.state = ConnectionState::Disconnected;
        self.transaction_open = false;
        self.notify(ConnectionEvent::Closed);

        match teardown_failure {
            None => Ok(()),
            Some(message) => Err(ConnectError::Configuration(format!(
                "teardown completed with errors: {message}"
            ))),
        }
    }

    /// Short randomized pause used between execute retries for the
    /// interruption class of failures.
    pub(crate) fn interrupted_retry_pause() -> Duration {
        Duration::from_millis(fastrand::u64(20..250))
    }
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        // Async teardown cannot run here. Surface the leak loudly instead
        // of silently abandoning a session with unsettled state.
        if self.state != ConnectionState::Disconnected {
            warn!(
                host = self.credentials.host(),
                "connection dropped while open; call close() for clean teardown"
            );
        }
    }
}
