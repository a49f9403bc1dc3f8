use spool::{Entity, ExecutorExt, SqlCommand};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

#[derive(Entity, Default, Debug, Clone, PartialEq)]
pub struct UserDto {
    #[spool(name = "Id")]
    pub id: i32,
    #[spool(name = "Name")]
    pub name: String,
}

pub(crate) async fn create_users<E: ExecutorExt>(executor: &mut E, table: &str, names: &[&str]) {
    executor
        .execute(&format!("DROP TABLE IF EXISTS {}", table))
        .await
        .expect("Failed to drop the users table");
    executor
        .execute(&format!(
            "CREATE TABLE {} (Id INTEGER IDENTITY, Name VARCHAR)",
            table
        ))
        .await
        .expect("Failed to create the users table");
    for name in names {
        let result = executor
            .execute(
                &SqlCommand::text(format!("INSERT INTO {} (Name) VALUES (@Name)", table))
                    .parameter("Name", *name),
            )
            .await
            .expect("Failed to insert a user");
        assert_eq!(result.rows_affected, 1);
    }
}

pub async fn users<E: ExecutorExt>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    create_users(executor, "Users", &["a", "b", "c"]).await;

    // Every row is mapped, in cursor order
    let users: Vec<UserDto> = executor
        .enumerate(&"SELECT Id, Name FROM Users")
        .await
        .expect("Failed to enumerate the users");
    assert_eq!(
        users,
        [
            UserDto {
                id: 1,
                name: "a".into()
            },
            UserDto {
                id: 2,
                name: "b".into()
            },
            UserDto {
                id: 3,
                name: "c".into()
            },
        ]
    );

    // Columns without a member are ignored, members without a column keep the default
    let names: Vec<UserDto> = executor
        .enumerate(&"SELECT Name FROM Users")
        .await
        .expect("Failed to enumerate the user names");
    assert_eq!(names.len(), 3);
    assert!(names.iter().all(|v| v.id == 0));
    assert_eq!(names[1].name, "b");

    // Reading the table directly
    let table: Vec<UserDto> = executor
        .enumerate(&SqlCommand::table("Users"))
        .await
        .expect("Failed to read the users table");
    assert_eq!(table, users);

    // Empty result
    let affected = executor
        .execute(&"DELETE FROM Users")
        .await
        .expect("Failed to delete the users");
    assert_eq!(affected.rows_affected, 3);
    let users: Vec<UserDto> = executor
        .enumerate(&"SELECT Id, Name FROM Users")
        .await
        .expect("Failed to enumerate the users");
    assert!(users.is_empty());
}
