#![cfg(feature = "test-utils-postgres")]

use pg_savepoint_adapter::prelude::*;
use pg_savepoint_adapter::test_utils::postgres::{setup_postgres_embedded, stop_postgres_embedded};

#[tokio::test]
async fn round_trip_against_a_real_server() -> Result<(), Box<dyn std::error::Error>> {
    let embedded = setup_postgres_embedded("adapter_test").await?;
    let mut adapter = ConnectionAdapter::connect(&embedded.options).await?;

    adapter
        .execute_sql_command(
            "CREATE TABLE migrations \
             (version int PRIMARY KEY, name text NOT NULL, applied boolean)",
        )
        .await?;
    assert!(adapter.table_exists("migrations", Some("public")).await?);
    assert!(!adapter.table_exists("migrations", Some("elsewhere")).await?);

    adapter.open_transaction().await?;
    adapter
        .insert_record(
            &FieldMap::new().with("version", 1).with("name", "init").with("applied", false),
            &"migrations".into(),
        )
        .await?;

    adapter.open_transaction().await?;
    assert_eq!(adapter.transaction_depth(), 1);
    adapter
        .insert_record(
            &FieldMap::new().with("version", 2).with("name", "second"),
            &"migrations".into(),
        )
        .await?;
    let duplicate = adapter
        .insert_record(
            &FieldMap::new().with("version", 2).with("name", "again"),
            &"migrations".into(),
        )
        .await
        .unwrap_err();
    assert_eq!(duplicate.code(), Some("23505"));
    assert_eq!(adapter.transaction_status(), TransactionStatus::InError);
    adapter.rollback_transaction().await?;

    adapter
        .update_record(
            &FieldMap::new().with("applied", true),
            &Criteria::new().with("version", 1),
            &"migrations".into(),
        )
        .await?;
    adapter.commit_transaction().await?;
    assert_eq!(adapter.transaction_status(), TransactionStatus::Idle);

    let criteria = Criteria::new().with("version", 1);
    assert!(adapter.record_exists(&criteria, &"migrations".into()).await?);
    let values = adapter
        .get_record_values(&["name", "applied"], &criteria, &"migrations".into())
        .await?;
    assert_eq!(
        values,
        Some(vec![RowValues::Text("init".into()), RowValues::Bool(true)])
    );
    let missing = adapter
        .get_record_values(&["name"], &Criteria::new().with("version", 2), &"migrations".into())
        .await?;
    assert_eq!(missing, None);

    let err = adapter.commit_transaction().await.unwrap_err();
    assert!(err.source.is_warning());

    drop(adapter);
    stop_postgres_embedded(embedded).await;
    Ok(())
}
