use crate::UserDto;
#[cfg(not(feature = "disable-bulk"))]
use spool::BulkCopyBuilder;
#[cfg(not(feature = "disable-transactions"))]
use spool::{BlockingConnectionExt, BlockingTransactionExt};
use spool::{BlockingExecutorExt, Connection, SqlCommand};

/// Same operations as the asynchronous suite, through the blocking surface.
/// Call it from a plain `#[test]`, outside of any async runtime.
pub fn blocking<C: Connection>(mut connection: C) {
    let connection = &mut connection;
    connection
        .ensure_open_blocking()
        .expect("Failed to open the connection");
    connection
        .ensure_open_blocking()
        .expect("Opening twice is a no-op");
    connection
        .execute_blocking(&"DROP TABLE IF EXISTS BlockingUsers")
        .expect("Failed to drop the table");
    connection
        .execute_blocking(&"CREATE TABLE BlockingUsers (Id INTEGER IDENTITY, Name VARCHAR)")
        .expect("Failed to create the table");
    for name in ["a", "b"] {
        connection
            .execute_blocking(
                &SqlCommand::text("INSERT INTO BlockingUsers (Name) VALUES (@Name)")
                    .parameter("Name", name),
            )
            .expect("Failed to insert a user");
    }

    let users: Vec<UserDto> = connection
        .enumerate_blocking(&"SELECT Id, Name FROM BlockingUsers")
        .expect("Failed to enumerate the users");
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "a");

    let first: UserDto = connection
        .execute_scalar_blocking(&"SELECT Id, Name FROM BlockingUsers")
        .expect("Failed to read the first user");
    assert_eq!(first, users[0]);

    let count: i64 = connection
        .execute_value_blocking(&"SELECT COUNT(*) FROM BlockingUsers")
        .expect("Failed to count the users");
    assert_eq!(count, 2);

    let mut cursor = connection
        .reader_blocking(&"SELECT Name FROM BlockingUsers")
        .expect("Failed to open the cursor");
    assert!(cursor.next_blocking().expect("Failed to advance the cursor"));
    assert_eq!(cursor.get_as::<String>("Name").expect("Name is a string"), "a");
    let rest = cursor
        .enumerate_blocking::<UserDto>()
        .collect::<Result<Vec<_>, _>>()
        .expect("Failed to map the remaining rows");
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].name, "b");

    let mut calls = 0;
    let result = connection
        .execute_with_blocking(
            &SqlCommand::text("INSERT INTO BlockingUsers (Name) VALUES (@Name)")
                .parameter("Name", "c"),
            |state| {
                calls += 1;
                assert_eq!(state.rows_affected().map(|v| v.rows_affected), Some(1));
            },
        )
        .expect("Failed to insert a user");
    assert_eq!(result.rows_affected, 1);
    assert_eq!(calls, 1);

    let mut calls = 0;
    let first: UserDto = connection
        .execute_scalar_with_blocking(&"SELECT Id, Name FROM BlockingUsers", |_| calls += 1)
        .expect("Failed to read the first user");
    assert_eq!(first.name, "a");
    assert_eq!(calls, 1);

    #[cfg(not(feature = "disable-bulk"))]
    {
        let result = connection
            .bulk_blocking(
                &BulkCopyBuilder::new("BlockingUsers"),
                &[UserDto {
                    id: 100,
                    name: "d".into(),
                }],
                &["Id"],
            )
            .expect("Failed to bulk load the users");
        assert_eq!(result.rows_affected, 1);
        let users: Vec<UserDto> = connection
            .enumerate_blocking(&"SELECT Id, Name FROM BlockingUsers")
            .expect("Failed to enumerate the users");
        assert_eq!(users.len(), 4);
        assert_eq!(users[3].name, "d");
        assert_ne!(users[3].id, 100);
    }

    #[cfg(not(feature = "disable-transactions"))]
    {
        fn count<E: BlockingExecutorExt>(executor: &mut E) -> i64 {
            executor
                .execute_value_blocking(&"SELECT COUNT(*) FROM BlockingUsers")
                .expect("Failed to count the users")
        }
        let before = count(connection);

        let mut transaction = connection
            .begin_transaction_blocking()
            .expect("Failed to begin a transaction");
        transaction
            .execute_blocking(
                &SqlCommand::text("INSERT INTO BlockingUsers (Name) VALUES (@Name)")
                    .parameter("Name", "e"),
            )
            .expect("Failed to insert inside the transaction");
        transaction
            .rollback_blocking()
            .expect("Failed to roll back the transaction");
        assert_eq!(count(connection), before);

        let mut transaction = connection
            .begin_transaction_blocking()
            .expect("Failed to begin a transaction");
        transaction
            .execute_blocking(
                &SqlCommand::text("INSERT INTO BlockingUsers (Name) VALUES (@Name)")
                    .parameter("Name", "f"),
            )
            .expect("Failed to insert inside the transaction");
        transaction
            .commit_blocking()
            .expect("Failed to commit the transaction");
        assert_eq!(count(connection), before + 1);
    }
}
