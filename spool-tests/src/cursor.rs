use crate::{UserDto, user::create_users};
use spool::{
    ExecutorExt, Value,
    stream::{StreamExt, TryStreamExt},
};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn cursor<E: ExecutorExt>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    create_users(executor, "CursorUsers", &["x", "y", "z", "w"]).await;

    // Row by row
    {
        let mut cursor = executor
            .reader(&"SELECT Id, Name FROM CursorUsers")
            .await
            .expect("Failed to open the cursor");
        assert_eq!(cursor.names(), ["Id", "Name"]);
        assert_eq!(cursor.field_count(), 2);
        assert_eq!(cursor.ordinal("Name"), Some(1));
        assert!(cursor.row().is_none());
        let mut names = Vec::new();
        while cursor.next().await.expect("Failed to advance the cursor") {
            let id: i64 = cursor.get_as("Id").expect("Id is an integer");
            assert!(id > 0);
            assert!(!cursor.is_null(1));
            names.push(cursor.get_as::<String>("Name").expect("Name is a string"));
        }
        assert_eq!(names, ["x", "y", "z", "w"]);
        // Exhausted cursors stay exhausted
        assert!(!cursor.next().await.expect("Failed to advance the cursor"));
        assert!(cursor.get_by_name("Name").is_none());
    }

    // Lazily mapped, consumed only in part
    {
        let cursor = executor
            .reader(&"SELECT Id, Name FROM CursorUsers")
            .await
            .expect("Failed to open the cursor");
        let first_two = cursor
            .enumerate::<UserDto>()
            .take(2)
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to map the rows");
        assert_eq!(first_two.len(), 2);
        assert_eq!(first_two[0].name, "x");
        assert_eq!(first_two[1].name, "y");
    }

    // Resuming after a row was read
    {
        let mut cursor = executor
            .reader(&"SELECT Name FROM CursorUsers")
            .await
            .expect("Failed to open the cursor");
        assert!(cursor.next().await.expect("Failed to advance the cursor"));
        assert_eq!(cursor.get(0), Some(&Value::Varchar(Some("x".into()))));
        let rest = cursor
            .into_rows()
            .map_ok(|v| v.values[0].clone())
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to read the remaining rows");
        assert_eq!(rest, ["y", "z", "w"].map(|v| Value::Varchar(Some(v.into()))));
    }

    // The connection is usable again once the cursor is gone
    let count: i64 = executor
        .execute_value(&"SELECT COUNT(*) FROM CursorUsers")
        .await
        .expect("Failed to count the users");
    assert_eq!(count, 4);
}
