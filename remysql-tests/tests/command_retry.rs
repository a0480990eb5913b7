//! Execute-phase classification and retry budget semantics.

mod support;

use remysql::{CommandCause, CommandError, Connection, DriverError, Error, Options};
use support::{credentials, fast_options, response_with_affected, StubDriver};

fn new_connection(options: Options) -> (Connection<StubDriver>, std::sync::Arc<std::sync::Mutex<support::StubState>>) {
    let (driver, state) = StubDriver::new();
    (Connection::new(driver, credentials(), options), state)
}

fn deadlock() -> DriverError {
    DriverError::new(
        1213,
        "Deadlock found when trying to get lock; try restarting transaction",
    )
}

fn server_gone() -> DriverError {
    DriverError::new(2006, "MySQL server has gone away")
}

#[tokio::test]
async fn test_duplicate_entry_exhausts_immediately() {
    let (mut conn, state) = new_connection(fast_options());
    state
        .lock()
        .unwrap()
        .responses
        .push_back(Err(DriverError::new(
            1062,
            "Duplicate entry '1' for key 'PRIMARY'",
        )));

    let err = conn.execute("INSERT INTO t (id) VALUES (1)").await.unwrap_err();
    match err {
        Error::Command(CommandError::Exhausted { cause, .. }) => {
            assert_eq!(cause, CommandCause::DuplicateKey);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Exactly one invocation of the underlying query primitive.
    assert_eq!(state.lock().unwrap().statements().len(), 1);
}

#[tokio::test]
async fn test_syntax_error_exhausts_immediately() {
    let (mut conn, state) = new_connection(fast_options());
    state
        .lock()
        .unwrap()
        .responses
        .push_back(Err(DriverError::new(
            1064,
            "You have an error in your SQL syntax",
        )));

    let err = conn.execute("SELEKT 1").await.unwrap_err();
    match err {
        Error::Command(CommandError::Exhausted { cause, .. }) => {
            assert_eq!(cause, CommandCause::Syntax);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.lock().unwrap().statements().len(), 1);
}

#[tokio::test]
async fn test_try_restarting_retries_up_to_limit() {
    let (mut conn, state) = new_connection(fast_options());
    {
        let mut s = state.lock().unwrap();
        for _ in 0..4 {
            s.responses.push_back(Err(deadlock()));
        }
    }

    let err = conn
        .execute_with_budget("UPDATE t SET n = n + 1", Some(3))
        .await
        .unwrap_err();
    match err {
        Error::Command(CommandError::Exhausted { cause, message }) => {
            assert_eq!(cause, CommandCause::Interrupted);
            assert!(message.contains("try restarting"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // Initial attempt plus the full retry budget.
    assert_eq!(state.lock().unwrap().statements().len(), 4);
}

#[tokio::test]
async fn test_try_restarting_succeeds_within_budget() {
    let (mut conn, state) = new_connection(fast_options());
    {
        let mut s = state.lock().unwrap();
        s.responses.push_back(Err(deadlock()));
        s.responses.push_back(response_with_affected(1));
    }

    let result = conn.execute("UPDATE t SET n = n + 1").await.unwrap();
    assert_eq!(result.affected_rows, 1);
    assert_eq!(state.lock().unwrap().statements().len(), 2);
}

#[tokio::test]
async fn test_server_gone_with_autocommit_reconnects_and_retries() {
    let (mut conn, state) = new_connection(fast_options());
    {
        let mut s = state.lock().unwrap();
        s.responses.push_back(Err(server_gone()));
        s.responses.push_back(response_with_affected(1));
    }

    let result = conn.execute("DELETE FROM t WHERE id = 1").await.unwrap();
    assert_eq!(result.affected_rows, 1);

    let s = state.lock().unwrap();
    // Original connect, then a reconnect after the session was severed.
    assert_eq!(s.count("connect"), 2);
    assert!(s.count("close") >= 1);
}

#[tokio::test]
async fn test_server_gone_without_autocommit_exhausts_immediately() {
    let mut options = fast_options();
    options.set_autocommit(false);
    let (mut conn, state) = new_connection(options);
    state.lock().unwrap().responses.push_back(Err(server_gone()));

    let err = conn.execute("DELETE FROM t WHERE id = 1").await.unwrap_err();
    match err {
        Error::Command(CommandError::Exhausted { cause, .. }) => {
            assert_eq!(cause, CommandCause::ServerGoneNoAutocommit);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.lock().unwrap().statements().len(), 1);
}

#[tokio::test]
async fn test_generic_failure_respects_zero_budget() {
    let (mut conn, state) = new_connection(fast_options());
    state
        .lock()
        .unwrap()
        .responses
        .push_back(Err(DriverError::new(1105, "Unknown error")));

    let err = conn.execute_with_budget("SELECT 1", Some(0)).await.unwrap_err();
    match err {
        Error::Command(CommandError::Exhausted { cause, .. }) => {
            assert_eq!(cause, CommandCause::Generic);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.lock().unwrap().statements().len(), 1);
}

#[tokio::test]
async fn test_connect_failure_surfaces_without_statement() {
    let (mut conn, state) = new_connection(fast_options());
    state
        .lock()
        .unwrap()
        .connect_failures
        .push_back(DriverError::new(1045, "Access denied for user"));

    let err = conn.execute("SELECT 1").await.unwrap_err();
    assert!(matches!(err, Error::Connect(_)));
    assert!(state.lock().unwrap().statements().is_empty());
}

#[tokio::test]
async fn test_detached_requires_autocommit() {
    let mut options = fast_options();
    options.set_autocommit(false);
    let (mut conn, _state) = new_connection(options);

    let err = conn.execute_detached("INSERT INTO audit VALUES (1)").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Command(CommandError::DetachedPrecondition(_))
    ));
}

#[tokio::test]
async fn test_detached_rejects_persistent_and_transactional() {
    let mut options = fast_options();
    options.set_persistent(true);
    let (mut conn, _state) = new_connection(options);
    let err = conn.execute_detached("SELECT 1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Command(CommandError::DetachedPrecondition(_))
    ));

    let (mut conn, _state) = new_connection(fast_options());
    conn.connect().await.unwrap();
    conn.begin_transaction().await.unwrap();
    let err = conn.execute_detached("SELECT 1").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Command(CommandError::DetachedPrecondition(_))
    ));
}

#[tokio::test]
async fn test_detached_sends_without_result_handling() {
    let (mut conn, state) = new_connection(fast_options());
    conn.execute_detached("INSERT INTO audit VALUES (1)").await.unwrap();
    let s = state.lock().unwrap();
    assert_eq!(s.count("dispatch"), 1);
    assert!(s.statements().is_empty());
}
