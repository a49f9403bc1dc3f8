use crate::user::create_users;
use spool::{Connection, ExecutorExt, SqlCommand, Transaction};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

async fn count<E: ExecutorExt>(executor: &mut E) -> i64 {
    executor
        .execute_value(&"SELECT COUNT(*) FROM TransactionUsers")
        .await
        .expect("Failed to count the users")
}

fn insert(name: &'static str) -> SqlCommand {
    SqlCommand::text("INSERT INTO TransactionUsers (Name) VALUES (@Name)").parameter("Name", name)
}

pub async fn transaction1<C: Connection>(connection: &mut C) {
    let _lock = MUTEX.lock().await;

    create_users(connection, "TransactionUsers", &["a"]).await;

    // Rollback
    let mut transaction = connection
        .begin_transaction()
        .await
        .expect("Failed to begin a transaction");
    transaction
        .execute(&insert("b"))
        .await
        .expect("Failed to insert inside the transaction");
    assert_eq!(count(&mut transaction).await, 2);
    transaction
        .rollback()
        .await
        .expect("Failed to roll back the transaction");
    assert_eq!(count(connection).await, 1);

    // Commit
    let mut transaction = connection
        .begin_transaction()
        .await
        .expect("Failed to begin a transaction");
    transaction
        .execute(&insert("c"))
        .await
        .expect("Failed to insert inside the transaction");
    transaction
        .commit()
        .await
        .expect("Failed to commit the transaction");
    assert_eq!(count(connection).await, 2);
}
