use pg_savepoint_adapter::prelude::*;
use pg_savepoint_adapter::test_utils::MockDriver;

fn sequential(driver: MockDriver) -> ConnectionAdapter<MockDriver> {
    ConnectionAdapter::with_namer(
        driver,
        AdapterOptions::default(),
        Box::new(SequentialNamer::default()),
    )
}

#[tokio::test]
async fn first_open_begins_and_later_opens_push_savepoints() -> Result<(), TransactionError> {
    let mut adapter = sequential(MockDriver::new());

    adapter.open_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(adapter.transaction_status(), TransactionStatus::InTransaction);

    adapter.open_transaction().await?;
    adapter.open_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 2);
    assert_eq!(adapter.open_savepoints(), ["sp_1", "sp_2"]);
    assert_eq!(adapter.driver().server_savepoints(), ["sp_1", "sp_2"]);

    assert_eq!(
        adapter.driver().sql_log(),
        ["BEGIN", "SAVEPOINT \"sp_1\"", "SAVEPOINT \"sp_2\""]
    );
    Ok(())
}

#[tokio::test]
async fn each_close_pops_one_level_then_commits() -> Result<(), TransactionError> {
    let mut adapter = sequential(MockDriver::new());
    for _ in 0..3 {
        adapter.open_transaction().await?;
    }

    adapter.commit_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 1);
    adapter.rollback_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(adapter.transaction_status(), TransactionStatus::InTransaction);
    adapter.commit_transaction().await?;
    assert_eq!(adapter.transaction_status(), TransactionStatus::Idle);

    assert_eq!(
        adapter.driver().sql_log(),
        [
            "BEGIN",
            "SAVEPOINT \"sp_1\"",
            "SAVEPOINT \"sp_2\"",
            "RELEASE SAVEPOINT \"sp_2\"",
            "ROLLBACK TO \"sp_1\"",
            "RELEASE SAVEPOINT \"sp_1\"",
            "COMMIT",
        ]
    );
    assert!(!adapter.is_savepoint_registered("sp_1"));
    assert!(!adapter.is_savepoint_registered("sp_2"));
    Ok(())
}

#[tokio::test]
async fn caller_opened_transaction_is_nested_not_restarted() -> Result<(), TransactionError> {
    let mut adapter = sequential(MockDriver::in_transaction());

    adapter.open_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 1);
    adapter.commit_transaction().await?;

    assert_eq!(
        adapter.driver().sql_log(),
        ["SAVEPOINT \"sp_1\"", "RELEASE SAVEPOINT \"sp_1\""]
    );
    assert_eq!(adapter.transaction_status(), TransactionStatus::InTransaction);
    Ok(())
}

#[tokio::test]
async fn rollback_to_savepoint_recovers_an_aborted_level() -> Result<(), TransactionError> {
    let driver = MockDriver::new().fail_once(
        "INSERT",
        DriverError::new("relation \"missing\" does not exist").with_code("42P01"),
    );
    let mut adapter = sequential(driver);
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;

    let err = adapter
        .execute_sql_command("INSERT INTO missing VALUES (1)")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("42P01"));
    assert_eq!(adapter.transaction_status(), TransactionStatus::InError);

    adapter.rollback_transaction().await?;
    assert_eq!(adapter.transaction_status(), TransactionStatus::InTransaction);
    adapter.commit_transaction().await?;
    assert_eq!(adapter.transaction_status(), TransactionStatus::Idle);
    Ok(())
}

#[tokio::test]
async fn savepoint_failure_names_the_savepoint() {
    let mut driver = MockDriver::new();
    driver.set_status(TransactionStatus::InError);
    let mut adapter = sequential(driver);

    let err = adapter.open_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::SavepointCreate);
    assert_eq!(err.savepoint.as_deref(), Some("sp_1"));
    assert_eq!(err.to_string(), "cannot create savepoint sp_1");
    assert_eq!(err.source.code(), Some("25P02"));
    assert_eq!(adapter.transaction_depth(), 0);
}

#[tokio::test]
async fn rollback_forgets_the_name_even_when_release_fails() -> Result<(), TransactionError> {
    let driver = MockDriver::new().fail_once("RELEASE", DriverError::new("connection reset"));
    let mut adapter = sequential(driver);
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;

    let err = adapter.rollback_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::SavepointRelease);
    assert_eq!(err.savepoint.as_deref(), Some("sp_1"));
    assert!(!adapter.is_savepoint_registered("sp_1"));
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(
        adapter.driver().sql_log()[2..],
        ["ROLLBACK TO \"sp_1\"", "RELEASE SAVEPOINT \"sp_1\""]
    );
    Ok(())
}

#[tokio::test]
async fn failed_release_keeps_the_name_reserved() -> Result<(), TransactionError> {
    let driver = MockDriver::new().fail_once("RELEASE", DriverError::new("connection reset"));
    let mut adapter = sequential(driver);
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;

    let err = adapter.commit_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::SavepointRelease);
    assert_eq!(adapter.transaction_depth(), 0);
    assert!(adapter.is_savepoint_registered("sp_1"));
    Ok(())
}

#[tokio::test]
async fn random_names_are_pairwise_distinct() -> Result<(), TransactionError> {
    let mut adapter = ConnectionAdapter::new(MockDriver::new());
    adapter.open_transaction().await?;
    for _ in 0..32 {
        adapter.open_transaction().await?;
    }
    let mut names = adapter.open_savepoints().to_vec();
    assert_eq!(names.len(), 32);
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 32);
    Ok(())
}

struct ConstantNamer;

impl SavepointNamer for ConstantNamer {
    fn next_name(&mut self) -> String {
        "same".to_string()
    }
}

#[tokio::test]
async fn name_generation_gives_up_after_bounded_attempts() -> Result<(), TransactionError> {
    let options = AdapterOptions::default().with_max_name_attempts(3);
    let mut adapter =
        ConnectionAdapter::with_namer(MockDriver::new(), options, Box::new(ConstantNamer));
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;

    let err = adapter.open_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::SavepointCreate);
    assert!(matches!(err.source, QueryError::Exhausted(_)));
    assert_eq!(adapter.driver().sql_log().len(), 2);
    Ok(())
}

#[tokio::test]
async fn commit_without_open_transaction_surfaces_the_server_warning() {
    let mut adapter = sequential(MockDriver::new());
    let err = adapter.commit_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::Commit);
    assert!(err.source.is_warning());
    assert_eq!(err.source.code(), Some("25P01"));
}

#[tokio::test]
async fn in_transaction_commits_on_ok_and_rolls_back_on_err() {
    let mut adapter = sequential(MockDriver::new());

    let value = adapter
        .in_transaction(|tx| {
            Box::pin(async move {
                tx.execute_sql_command("SELECT 1").await?;
                Ok::<_, AdapterError>(7)
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 7);
    assert_eq!(adapter.transaction_status(), TransactionStatus::Idle);

    adapter.open_transaction().await.unwrap();
    let result: Result<(), AdapterError> = adapter
        .in_transaction(|tx| {
            Box::pin(async move {
                tx.execute_sql_command("SELECT 2").await?;
                Err::<(), _>(AdapterError::Config("abandon".into()))
            })
        })
        .await;
    assert!(result.is_err());
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(adapter.transaction_status(), TransactionStatus::InTransaction);

    assert_eq!(
        adapter.driver().sql_log()[3..],
        [
            "BEGIN",
            "SAVEPOINT \"sp_1\"",
            "SELECT 2",
            "ROLLBACK TO \"sp_1\"",
            "RELEASE SAVEPOINT \"sp_1\"",
        ]
    );
}

#[tokio::test]
async fn failed_rollback_to_skips_release_and_forgets_the_name() -> Result<(), TransactionError> {
    let driver = MockDriver::new().fail_once("ROLLBACK TO", DriverError::new("connection reset"));
    let mut adapter = sequential(driver);
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;

    let err = adapter.rollback_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::SavepointRollback);
    assert_eq!(err.savepoint.as_deref(), Some("sp_1"));
    assert_eq!(err.to_string(), "cannot rollback to savepoint sp_1");
    assert!(!adapter.is_savepoint_registered("sp_1"));
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(
        adapter.driver().sql_log(),
        ["BEGIN", "SAVEPOINT \"sp_1\"", "ROLLBACK TO \"sp_1\""]
    );
    Ok(())
}

#[tokio::test]
async fn failed_commit_ends_the_block_so_the_next_open_begins() -> Result<(), TransactionError> {
    let driver = MockDriver::new().fail_once(
        "COMMIT",
        DriverError::new("insert or update on table \"t\" violates foreign key constraint")
            .with_code("23503"),
    );
    let mut adapter = sequential(driver);
    adapter.open_transaction().await?;

    let err = adapter.commit_transaction().await.unwrap_err();
    assert_eq!(err.step, TransactionStep::Commit);
    assert_eq!(err.source.code(), Some("23503"));
    assert_eq!(adapter.transaction_status(), TransactionStatus::Idle);

    adapter.open_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 0);
    assert_eq!(adapter.driver().sql_log(), ["BEGIN", "COMMIT", "BEGIN"]);
    Ok(())
}

#[tokio::test]
async fn deserialized_zero_name_attempts_still_opens_savepoints() -> Result<(), TransactionError> {
    let options: AdapterOptions =
        serde_json::from_str(r#"{"max_name_attempts":0}"#).expect("valid options");
    let mut adapter = ConnectionAdapter::with_namer(
        MockDriver::new(),
        options,
        Box::new(SequentialNamer::default()),
    );
    adapter.open_transaction().await?;
    adapter.open_transaction().await?;
    assert_eq!(adapter.open_savepoints(), ["sp_1"]);
    Ok(())
}
