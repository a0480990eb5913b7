//! Connection credentials and tunables
//!
//! [`Credentials`] is an immutable value object created once by the caller.
//! [`Options`] is a flat table of independent tunables; range-checked setters
//! reject out-of-range values at set time rather than deferring the failure
//! to connect time.

use std::time::Duration;

use crate::error::ConnectError;

/// Where and as whom to connect. Created once, never mutated.
#[derive(Debug, Clone)]
pub struct Credentials {
    host: String,
    port: u16,
    username: String,
    password: String,
    database: String,
    socket: Option<String>,
    flags: Option<u32>,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            socket: None,
            flags: None,
        }
    }

    /// Prefer a unix socket over TCP.
    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    /// Protocol flags passed through to the driver.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn socket(&self) -> Option<&str> {
        self.socket.as_deref()
    }

    pub fn flags(&self) -> Option<u32> {
        self.flags
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    /// MySQL's default level.
    #[default]
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// SQL spelling used in `SET SESSION TRANSACTION ISOLATION LEVEL ...`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Bounds for the range-checked tunables.
const NET_BUFFER_MIN: u32 = 1024;
const NET_BUFFER_MAX: u32 = 1 << 20;
const REPORT_LEVEL_MAX: u8 = 3;

/// Flat set of independent connection tunables.
///
/// Every field has a usable default; only the range-checked setters can fail.
#[derive(Debug, Clone)]
pub struct Options {
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    net_buffer_size: u32,
    max_execution_time: Duration,
    report_level: u8,
    autocommit: bool,
    persistent: bool,
    readonly: bool,
    charset: String,
    time_zone: String,
    sql_mode: String,
    wait_timeout: Duration,
    isolation_readonly: IsolationLevel,
    isolation_readwrite: IsolationLevel,
    retry_count: u32,
    retry_wait: Duration,
    ignore_user_abort: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            net_buffer_size: 16 * 1024,
            max_execution_time: Duration::from_secs(300),
            report_level: 1,
            autocommit: true,
            persistent: false,
            readonly: false,
            charset: "utf8mb4".to_string(),
            time_zone: "+00:00".to_string(),
            sql_mode: "TRADITIONAL".to_string(),
            wait_timeout: Duration::from_secs(600),
            isolation_readonly: IsolationLevel::RepeatableRead,
            isolation_readwrite: IsolationLevel::RepeatableRead,
            retry_count: 3,
            retry_wait: Duration::from_millis(500),
            ignore_user_abort: false,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Network buffer size in bytes. Rejects values outside
    /// `1 KiB ..= 1 MiB` immediately.
    pub fn set_net_buffer_size(&mut self, bytes: u32) -> Result<(), ConnectError> {
        if !(NET_BUFFER_MIN..=NET_BUFFER_MAX).contains(&bytes) {
            return Err(ConnectError::InvalidOption {
                name: "net_buffer_size",
                reason: format!(
                    "{bytes} is outside the allowed range {NET_BUFFER_MIN}..={NET_BUFFER_MAX}"
                ),
            });
        }
        self.net_buffer_size = bytes;
        Ok(())
    }

    /// Error-reporting verbosity, `0` (silent) to `3` (everything).
    pub fn set_report_level(&mut self, level: u8) -> Result<(), ConnectError> {
        if level > REPORT_LEVEL_MAX {
            return Err(ConnectError::InvalidOption {
                name: "report_level",
                reason: format!("{level} exceeds the maximum level {REPORT_LEVEL_MAX}"),
            });
        }
        self.report_level = level;
        Ok(())
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Session ceiling for statement execution. Best effort: the server
    /// enforces it for reads only, and it is skipped entirely when
    /// [`Options::set_ignore_user_abort`] is enabled.
    pub fn set_max_execution_time(&mut self, ceiling: Duration) {
        self.max_execution_time = ceiling;
    }

    pub fn set_autocommit(&mut self, enabled: bool) {
        self.autocommit = enabled;
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Mark the connection read-only. A read-only connection never accepts
    /// writes for its lifetime.
    pub fn set_readonly(&mut self, readonly: bool) {
        self.readonly = readonly;
    }

    pub fn set_charset(&mut self, charset: impl Into<String>) {
        self.charset = charset.into();
    }

    pub fn set_time_zone(&mut self, time_zone: impl Into<String>) {
        self.time_zone = time_zone.into();
    }

    pub fn set_sql_mode(&mut self, sql_mode: impl Into<String>) {
        self.sql_mode = sql_mode.into();
    }

    pub fn set_wait_timeout(&mut self, timeout: Duration) {
        self.wait_timeout = timeout;
    }

    pub fn set_isolation_readonly(&mut self, level: IsolationLevel) {
        self.isolation_readonly = level;
    }

    pub fn set_isolation_readwrite(&mut self, level: IsolationLevel) {
        self.isolation_readwrite = level;
    }

    pub fn set_retry_count(&mut self, count: u32) {
        self.retry_count = count;
    }

    pub fn set_retry_wait(&mut self, wait: Duration) {
        self.retry_wait = wait;
    }

    pub fn set_ignore_user_abort(&mut self, ignore: bool) {
        self.ignore_user_abort = ignore;
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn net_buffer_size(&self) -> u32 {
        self.net_buffer_size
    }

    pub fn max_execution_time(&self) -> Duration {
        self.max_execution_time
    }

    pub fn report_level(&self) -> u8 {
        self.report_level
    }

    pub fn autocommit(&self) -> bool {
        self.autocommit
    }

    pub fn persistent(&self) -> bool {
        self.persistent
    }

    pub fn readonly(&self) -> bool {
        self.readonly
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn time_zone(&self) -> &str {
        &self.time_zone
    }

    pub fn sql_mode(&self) -> &str {
        &self.sql_mode
    }

    pub fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    pub fn isolation_readonly(&self) -> IsolationLevel {
        self.isolation_readonly
    }

    pub fn isolation_readwrite(&self) -> IsolationLevel {
        self.isolation_readwrite
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn retry_wait(&self) -> Duration {
        self.retry_wait
    }

    pub fn ignore_user_abort(&self) -> bool {
        self.ignore_user_abort
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::default();
        assert!(opts.autocommit());
        assert!(!opts.persistent());
        assert!(!opts.readonly());
        assert_eq!(opts.retry_count(), 3);
        assert_eq!(opts.charset(), "utf8mb4");
    }

    #[test]
    fn test_net_buffer_size_range_checked() {
        let mut opts = Options::default();
        assert!(opts.set_net_buffer_size(512).is_err());
        assert!(opts.set_net_buffer_size(2 << 20).is_err());
        assert!(opts.set_net_buffer_size(32 * 1024).is_ok());
        assert_eq!(opts.net_buffer_size(), 32 * 1024);
    }

    #[test]
    fn test_report_level_range_checked() {
        let mut opts = Options::default();
        assert!(opts.set_report_level(4).is_err());
        // Failed set leaves the previous value in place
        assert_eq!(opts.report_level(), 1);
        assert!(opts.set_report_level(0).is_ok());
        assert_eq!(opts.report_level(), 0);
    }

    #[test]
    fn test_invalid_option_is_typed() {
        let mut opts = Options::default();
        let err = opts.set_net_buffer_size(1).unwrap_err();
        match err {
            ConnectError::InvalidOption { name, .. } => assert_eq!(name, "net_buffer_size"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_credentials_accessors() {
        let creds = Credentials::new("db.internal", 3306, "app", "secret", "main")
            .with_socket("/run/mysqld/mysqld.sock");
        assert_eq!(creds.host(), "db.internal");
        assert_eq!(creds.port(), 3306);
        assert_eq!(creds.socket(), Some("/run/mysqld/mysqld.sock"));
        assert_eq!(creds.flags(), None);
    }
}
