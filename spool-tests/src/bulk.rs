use crate::{UserDto, silent_logs, user::create_users};
use spool::{BulkCopyBuilder, ExecutorExt, Failure, SqlCommand};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn bulk<E: ExecutorExt>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    create_users(executor, "BulkUsers", &["a", "b", "c"]).await;

    // The ignored identity is generated by the database
    let result = executor
        .bulk(
            &BulkCopyBuilder::new("BulkUsers"),
            &[UserDto {
                id: 100,
                name: "d".into(),
            }],
            &["Id"],
        )
        .await
        .expect("Failed to bulk load the users");
    assert_eq!(result.rows_affected, 1);
    let loaded: UserDto = executor
        .execute_scalar(&SqlCommand::text("SELECT Id, Name FROM BulkUsers"))
        .await
        .expect("Failed to read the users");
    assert_eq!(loaded.name, "a");
    let users: Vec<UserDto> = executor
        .enumerate(&SqlCommand::table("BulkUsers"))
        .await
        .expect("Failed to read the users");
    assert_eq!(users.len(), 4);
    assert_eq!(users[3].name, "d");
    assert_ne!(users[3].id, 100);

    // Many rows in several batches
    let many = (0..25)
        .map(|i| UserDto {
            id: 0,
            name: format!("user{}", i),
        })
        .collect::<Vec<_>>();
    let result = executor
        .bulk(
            &BulkCopyBuilder::new("BulkUsers").batch_size(10),
            &many,
            &["Id"],
        )
        .await
        .expect("Failed to bulk load the users");
    assert_eq!(result.rows_affected, 25);
    let count: i64 = executor
        .execute_value(&"SELECT COUNT(*) FROM BulkUsers")
        .await
        .expect("Failed to count the users");
    assert_eq!(count, 29);

    // Nothing left to copy
    silent_logs! {
        let result = executor
            .bulk(&BulkCopyBuilder::new("BulkUsers"), &many, &["Id", "Name"])
            .await;
        let error = result.expect_err("No column is mapped");
        assert_eq!(Failure::of(&error), Some(Failure::BulkLoad));
    }

    // Unknown destination
    silent_logs! {
        let result = executor
            .bulk(&BulkCopyBuilder::new("MissingUsers"), &many, &[])
            .await;
        let error = result.expect_err("The destination table does not exist");
        assert_eq!(Failure::of(&error), Some(Failure::BulkLoad));
    }
}
