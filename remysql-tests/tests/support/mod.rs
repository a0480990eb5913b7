#![allow(dead_code)] // each test binary uses a different slice of the helpers

//! Scripted stub driver shared by the integration tests.
//!
//! The stub implements the full `Driver` capability surface, records every
//! call in a journal, and plays back scripted connect failures and
//! statement outcomes. Session-setup statements (`SET ...`) succeed by
//! default so scripts only cover the statements a test actually issues.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use remysql::{
    AccessMode, Credentials, DefaultEscaper, Driver, DriverError, DriverResult, Escaper,
    Options, ReleaseMode, Row, ServerResponse, Transport, Value,
};

#[derive(Debug)]
pub struct StubState {
    /// Errors returned by successive connect attempts before connecting.
    pub connect_failures: VecDeque<DriverError>,
    /// Scripted outcomes for non-setup statements, in order.
    pub responses: VecDeque<DriverResult<ServerResponse>>,
    /// Makes the next session-setup statement fail.
    pub setup_failure: Option<DriverError>,
    pub begin_failure: Option<DriverError>,
    pub commit_failure: Option<DriverError>,
    pub rollback_failure: Option<DriverError>,
    pub connected: bool,
    /// Every driver call, in order: `connect`, `execute:<sql>`,
    /// `dispatch:<sql>`, `begin:<mode>`, `commit:<release>`, `rollback`,
    /// `autocommit:<0|1>`, `close`.
    pub journal: Vec<String>,
    pub last_init: Option<String>,
    pub version: (u16, u16, u16),
}

impl Default for StubState {
    fn default() -> Self {
        Self {
            connect_failures: VecDeque::new(),
            responses: VecDeque::new(),
            setup_failure: None,
            begin_failure: None,
            commit_failure: None,
            rollback_failure: None,
            connected: false,
            journal: Vec::new(),
            last_init: None,
            version: (8, 0, 34),
        }
    }
}

impl StubState {
    pub fn count(&self, prefix: &str) -> usize {
        self.journal.iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Statements issued by the caller, excluding session setup.
    pub fn statements(&self) -> Vec<String> {
        self.journal
            .iter()
            .filter_map(|e| e.strip_prefix("execute:"))
            .filter(|sql| !sql.starts_with("SET "))
            .map(str::to_string)
            .collect()
    }

    /// Position of the first journal entry with the given prefix.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.journal.iter().position(|e| e.starts_with(prefix))
    }
}

pub struct StubDriver {
    state: Arc<Mutex<StubState>>,
}

impl StubDriver {
    pub fn new() -> (Self, Arc<Mutex<StubState>>) {
        let state = Arc::new(Mutex::new(StubState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            state,
        )
    }
}

impl Escaper for StubDriver {
    fn escape_bytes(&self, input: &[u8]) -> Vec<u8> {
        DefaultEscaper.escape_bytes(input)
    }
}

#[async_trait]
impl Driver for StubDriver {
    async fn connect(
        &mut self,
        _credentials: &Credentials,
        transport: &Transport,
    ) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.journal.push("connect".to_string());
        state.last_init = transport.init_command.clone();
        if let Some(err) = state.connect_failures.pop_front() {
            return Err(err);
        }
        state.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    async fn execute(&mut self, sql: &str) -> DriverResult<ServerResponse> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(format!("execute:{sql}"));
        if sql.starts_with("SET ") {
            if let Some(err) = state.setup_failure.take() {
                return Err(err);
            }
            return Ok(ServerResponse::default());
        }
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(ServerResponse::default()))
    }

    async fn dispatch(&mut self, sql: &str) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.journal.push(format!("dispatch:{sql}"));
        Ok(())
    }

    async fn autocommit(&mut self, enabled: bool) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state
            .journal
            .push(format!("autocommit:{}", if enabled { 1 } else { 0 }));
        Ok(())
    }

    async fn begin(&mut self, mode: AccessMode) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        let label = match mode {
            AccessMode::ReadOnly => "read_only",
            AccessMode::ReadWrite => "read_write",
        };
        state.journal.push(format!("begin:{label}"));
        if let Some(err) = state.begin_failure.take() {
            return Err(err);
        }
        Ok(())
    }

    async fn commit(&mut self, release: ReleaseMode) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        let label = match release {
            ReleaseMode::Release => "release",
            ReleaseMode::NoRelease => "no_release",
        };
        state.journal.push(format!("commit:{label}"));
        if let Some(err) = state.commit_failure.take() {
            return Err(err);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.journal.push("rollback".to_string());
        if let Some(err) = state.rollback_failure.take() {
            return Err(err);
        }
        Ok(())
    }

    async fn close(&mut self) -> DriverResult<()> {
        let mut state = self.state.lock().unwrap();
        state.journal.push("close".to_string());
        state.connected = false;
        Ok(())
    }

    fn server_version(&self) -> Option<(u16, u16, u16)> {
        Some(self.state.lock().unwrap().version)
    }
}

/// Options tuned for tests: no real backoff sleeps.
pub fn fast_options() -> Options {
    let mut options = Options::default();
    options.set_retry_wait(std::time::Duration::ZERO);
    options
}

pub fn response_with_affected(affected_rows: u64) -> DriverResult<ServerResponse> {
    Ok(ServerResponse {
        affected_rows,
        ..ServerResponse::default()
    })
}

pub fn response_with_insert_id(id: u64) -> DriverResult<ServerResponse> {
    Ok(ServerResponse {
        affected_rows: 1,
        last_insert_id: Some(id),
        ..ServerResponse::default()
    })
}

pub fn response_with_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> DriverResult<ServerResponse> {
    let field_count = columns.len();
    let rows: Vec<Row> = rows
        .into_iter()
        .map(|values| Row::new(columns.iter().map(|c| c.to_string()).collect(), values))
        .collect();
    Ok(ServerResponse {
        rows,
        field_count,
        ..ServerResponse::default()
    })
}

pub fn response_with_warning(message: &str) -> DriverResult<ServerResponse> {
    Ok(ServerResponse {
        warnings: vec![message.to_string()],
        ..ServerResponse::default()
    })
}

pub fn credentials() -> Credentials {
    Credentials::new("db.test", 3306, "tester", "secret", "testdb")
}
