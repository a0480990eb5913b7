//! `Driver` implementation over `mysql_async::Conn`

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::Conn;
use tracing::debug;

use crate::driver::{
    AccessMode, DefaultEscaper, Driver, DriverError, DriverResult, Escaper, ReleaseMode,
    ServerResponse, Transport, ERR_CONNECTION_TIMED_OUT, ERR_SERVER_LOST, ERR_UNKNOWN,
};
use crate::options::Credentials;

use super::types::materialize_row;

/// Production driver: one `mysql_async` session per instance.
#[derive(Default)]
pub struct MySqlDriver {
    conn: Option<Conn>,
    read_timeout: Option<Duration>,
    version: Option<(u16, u16, u16)>,
}

impl MySqlDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

fn map_mysql_error(err: mysql_async::Error) -> DriverError {
    match err {
        mysql_async::Error::Server(ref server) => {
            DriverError::new(server.code, server.message.clone())
        }
        mysql_async::Error::Io(_) => DriverError {
            code: ERR_SERVER_LOST,
            message: err.to_string(),
            server_gone: true,
        },
        other => DriverError::new(ERR_UNKNOWN, other.to_string()),
    }
}

/// Connect-phase transport failures map to the retryable timed-out class;
/// server-reported handshake failures keep their code.
fn map_connect_error(err: mysql_async::Error) -> DriverError {
    match err {
        mysql_async::Error::Server(ref server) => {
            DriverError::new(server.code, server.message.clone())
        }
        mysql_async::Error::Io(_) => DriverError::new(ERR_CONNECTION_TIMED_OUT, err.to_string()),
        other => DriverError::new(ERR_UNKNOWN, other.to_string()),
    }
}

async fn with_read_timeout<F, T>(limit: Option<Duration>, fut: F) -> DriverResult<T>
where
    F: Future<Output = std::result::Result<T, mysql_async::Error>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(map_mysql_error),
            Err(_) => Err(DriverError {
                code: ERR_SERVER_LOST,
                message: format!("no server response within {limit:?}"),
                server_gone: true,
            }),
        },
        None => fut.await.map_err(map_mysql_error),
    }
}

impl Escaper for MySqlDriver {
    fn escape_bytes(&self, input: &[u8]) -> Vec<u8> {
        DefaultEscaper.escape_bytes(input)
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    async fn connect(
        &mut self,
        credentials: &Credentials,
        transport: &Transport,
    ) -> DriverResult<()> {
        if self.conn.is_some() {
            return Ok(());
        }

        let mut builder = mysql_async::OptsBuilder::default()
            .ip_or_hostname(credentials.host())
            .tcp_port(credentials.port())
            .user(Some(credentials.username()))
            .pass(Some(credentials.password()))
            .db_name(Some(credentials.database()));
        if let Some(socket) = credentials.socket() {
            builder = builder.socket(Some(socket));
        }

        let conn = match tokio::time::timeout(transport.connect_timeout, Conn::new(builder)).await
        {
            Ok(Ok(conn)) => conn,
            Ok(Err(err)) => return Err(map_connect_error(err)),
            Err(_) => return Err(DriverError::timed_out()),
        };

        self.version = Some(conn.server_version());
        self.read_timeout = transport.read_timeout;
        self.conn = Some(conn);

        if let Some(init) = &transport.init_command {
            if let Err(err) = self.run_simple(init).await {
                // A session that failed its init command is unusable.
                let _ = self.close().await;
                return Err(err);
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn execute(&mut self, sql: &str) -> DriverResult<ServerResponse> {
        let read_timeout = self.read_timeout;
        let conn = self.conn.as_mut().ok_or_else(DriverError::not_connected)?;

        let raw_rows: Vec<mysql_async::Row> =
            match with_read_timeout(read_timeout, conn.query(sql)).await {
                Ok(rows) => rows,
                Err(err) => {
                    if err.server_gone {
                        self.conn = None;
                    }
                    return Err(err);
                }
            };

        let affected_rows = conn.affected_rows();
        let last_insert_id = conn.last_insert_id();
        let field_count = raw_rows
            .first()
            .map(|row| row.columns_ref().len())
            .unwrap_or(0);

        let mut rows = Vec::with_capacity(raw_rows.len());
        for raw in raw_rows {
            rows.push(materialize_row(raw)?);
        }

        // Warnings are a side channel; failing to drain them must not fail
        // the statement that succeeded.
        let warnings = match conn.query::<mysql_async::Row, _>("SHOW WARNINGS").await {
            Ok(warning_rows) => warning_rows
                .into_iter()
                .map(|row| {
                    let level: String =
                        row.get_opt(0).and_then(Result::ok).unwrap_or_default();
                    let code: u32 = row.get_opt(1).and_then(Result::ok).unwrap_or_default();
                    let message: String =
                        row.get_opt(2).and_then(Result::ok).unwrap_or_default();
                    format!("{level} ({code}): {message}")
                })
                .collect(),
            Err(err) => {
                debug!(error = %err, "failed to drain server warnings");
                Vec::new()
            }
        };

        Ok(ServerResponse {
            rows,
            field_count,
            affected_rows,
            last_insert_id,
            warnings,
        })
    }

    async fn dispatch(&mut self, sql: &str) -> DriverResult<()> {
        // Best-effort send: no warning drain, no row materialization.
        self.run_simple(sql).await
    }

    async fn autocommit(&mut self, enabled: bool) -> DriverResult<()> {
        let statement = if enabled {
            "SET autocommit = 1"
        } else {
            "SET autocommit = 0"
        };
        self.run_simple(statement).await
    }

    async fn begin(&mut self, mode: AccessMode) -> DriverResult<()> {
        let statement = match mode {
            AccessMode::ReadOnly => "START TRANSACTION READ ONLY",
            AccessMode::ReadWrite => "START TRANSACTION READ WRITE",
        };
        self.run_simple(statement).await
    }

    async fn commit(&mut self, release: ReleaseMode) -> DriverResult<()> {
        let statement = match release {
            ReleaseMode::Release => "COMMIT RELEASE",
            ReleaseMode::NoRelease => "COMMIT",
        };
        self.run_simple(statement).await?;
        if release == ReleaseMode::Release {
            // The server drops the session after COMMIT RELEASE.
            self.conn = None;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> DriverResult<()> {
        self.run_simple("ROLLBACK").await
    }

    async fn close(&mut self) -> DriverResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.disconnect().await.map_err(map_mysql_error)?;
        }
        Ok(())
    }

    fn server_version(&self) -> Option<(u16, u16, u16)> {
        self.version
    }
}

impl MySqlDriver {
    async fn run_simple(&mut self, sql: &str) -> DriverResult<()> {
        let read_timeout = self.read_timeout;
        let conn = self.conn.as_mut().ok_or_else(DriverError::not_connected)?;
        match with_read_timeout(read_timeout, conn.query_drop(sql)).await {
            Ok(()) => Ok(()),
            Err(err) => {
                if err.server_gone {
                    self.conn = None;
                }
                Err(err)
            }
        }
    }
}
