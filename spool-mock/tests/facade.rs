#[cfg(test)]
mod tests {
    use spool::{
        BulkCopyBuilder, ColumnMap, CommandBuilder, Connection, ConnectionState, Entity, Executor,
        ExecutorExt, Failure, ObjectReader, SqlCommand, Value,
        stream::{self, TryStreamExt},
    };
    use spool_mock::{Event, MockDatabase, MockResponse};
    use spool_tests::{UserDto, init_logs, silent_logs};
    use std::sync::Arc;

    fn released(journal: &[Event]) -> (usize, usize) {
        (
            journal.iter().filter(|v| **v == Event::CursorClosed).count(),
            journal
                .iter()
                .filter(|v| **v == Event::StatementReleased)
                .count(),
        )
    }

    fn users(rows: &[(Value, Value)]) -> MockResponse {
        MockResponse::rows(
            &["Id", "Name"],
            rows.iter().map(|(id, name)| [id.clone(), name.clone()]),
        )
    }

    #[tokio::test]
    async fn execute_opens_once() {
        init_logs();
        let database = MockDatabase::new();
        database.script("UPDATE Users SET Name = Name", MockResponse::affected(3));
        let mut connection = database.connection();
        assert_eq!(connection.state(), ConnectionState::Closed);
        let result = connection
            .execute(&"UPDATE Users SET Name = Name")
            .await
            .expect("Failed to execute");
        assert_eq!(result.rows_affected, 3);
        assert_eq!(connection.state(), ConnectionState::Open);
        assert_eq!(
            database.journal(),
            [
                Event::Opened,
                Event::Executed("UPDATE Users SET Name = Name".into()),
                Event::CursorClosed,
                Event::StatementReleased,
            ]
        );
        database.clear_journal();
        connection
            .execute(&"UPDATE Users SET Name = Name")
            .await
            .expect("Failed to execute");
        assert!(!database.journal().contains(&Event::Opened));
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn execute_without_affected_count() {
        let database = MockDatabase::new();
        database.script("SET NOCOUNT ON", MockResponse::default());
        let result = database
            .connection()
            .execute(&"SET NOCOUNT ON")
            .await
            .expect("Failed to execute");
        assert_eq!(result.rows_affected, 0);
    }

    #[tokio::test]
    async fn execute_reports_last_id() {
        let database = MockDatabase::new();
        database.script("insert_user", MockResponse::affected(1).last_id(12));
        let result = database
            .connection()
            .execute(&"insert_user")
            .await
            .expect("Failed to execute");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_affected_id, Some(12));
    }

    #[tokio::test]
    async fn fetch_keeps_only_rows() {
        let database = MockDatabase::new();
        database.script(
            "get_users",
            users(&[(Value::Int32(Some(1)), "a".into())]).last_id(1),
        );
        let mut connection = database.connection();
        connection.ensure_open().await.expect("Failed to open");
        let definition = "get_users".definition().expect("Valid command");
        let rows = connection
            .fetch(Arc::new(definition))
            .try_collect::<Vec<_>>()
            .await
            .expect("Failed to fetch");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_column("Name"), Some(&Value::Varchar(Some("a".into()))));
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn execute_failure_releases_once() {
        init_logs();
        let database = MockDatabase::new();
        database.script(
            "DELETE FROM Users",
            MockResponse::affected(0).fail_after(0, "Connection reset"),
        );
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .execute(&"DELETE FROM Users")
                .await
                .expect_err("The command fails");
            assert_eq!(Failure::of(&error), Some(Failure::Execute));
            assert!(format!("{:#}", error).contains("Connection reset"));
        }
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn prepare_failure_acquires_nothing() {
        init_logs();
        let database = MockDatabase::new();
        database.script("SELEC 1", MockResponse::error("Syntax error"));
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .execute(&"SELEC 1")
                .await
                .expect_err("The command fails");
            assert_eq!(Failure::of(&error), Some(Failure::Execute));
        }
        assert_eq!(database.journal(), [Event::Opened]);
    }

    #[tokio::test]
    async fn enumerate_maps_in_order() {
        let database = MockDatabase::new();
        database.script(
            "SELECT Id, Name FROM Users",
            users(&[
                (1.into(), "a".into()),
                (2.into(), "b".into()),
                (3.into(), "c".into()),
            ]),
        );
        let users: Vec<UserDto> = database
            .connection()
            .enumerate(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to enumerate");
        assert_eq!(
            users
                .iter()
                .map(|v| (v.id, v.name.as_str()))
                .collect::<Vec<_>>(),
            [(1, "a"), (2, "b"), (3, "c")]
        );
        let journal = database.journal();
        assert_eq!(released(&journal), (1, 1));
        assert_eq!(
            journal[journal.len() - 2..],
            [Event::CursorClosed, Event::StatementReleased]
        );
    }

    #[tokio::test]
    async fn enumerate_mapping_failure_releases_once() {
        init_logs();
        let database = MockDatabase::new();
        database.script(
            "SELECT Id, Name FROM Users",
            users(&[
                (1.into(), "a".into()),
                ("two".into(), "b".into()),
                (3.into(), "c".into()),
            ]),
        );
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .enumerate::<UserDto, _>(&"SELECT Id, Name FROM Users")
                .await
                .expect_err("The second row does not fit");
            assert_eq!(Failure::of(&error), Some(Failure::Mapping));
            assert!(format!("{:#}", error).contains("Column `Id`"));
        }
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn enumerate_driver_failure_mid_stream() {
        init_logs();
        let database = MockDatabase::new();
        database.script(
            "SELECT Id, Name FROM Users",
            users(&[(1.into(), "a".into()), (2.into(), "b".into())])
                .fail_after(1, "Network error"),
        );
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .enumerate::<UserDto, _>(&"SELECT Id, Name FROM Users")
                .await
                .expect_err("The stream breaks after one row");
            assert_eq!(Failure::of(&error), Some(Failure::Execute));
        }
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn scalar_of_empty_result() {
        let database = MockDatabase::new();
        database.script("SELECT Id, Name FROM Users", users(&[]));
        let mut connection = database.connection();
        let user: UserDto = connection
            .execute_scalar(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to read");
        assert_eq!(user, UserDto::default());
        let users: Vec<UserDto> = connection
            .enumerate(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to read");
        assert!(users.is_empty());
        assert_eq!(released(&database.journal()), (2, 2));
    }

    #[tokio::test]
    async fn scalar_discards_remaining_rows() {
        let database = MockDatabase::new();
        database.script(
            "SELECT Id, Name FROM Users",
            users(&[(7.into(), "x".into()), (8.into(), "y".into())]),
        );
        let user: UserDto = database
            .connection()
            .execute_scalar(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to read");
        assert_eq!(user.id, 7);
        assert_eq!(released(&database.journal()), (1, 1));
    }

    #[tokio::test]
    async fn output_parameters_reach_the_hook() {
        let database = MockDatabase::new();
        database.script(
            "create_user",
            MockResponse::affected(1).output("id", Value::Int64(Some(42))),
        );
        let mut connection = database.connection();
        let command = SqlCommand::procedure("create_user")
            .parameter("name", "alice")
            .output("id", Value::Int64(None));
        let mut id = None;
        let mut calls = 0;
        let result = connection
            .execute_with(&command, |state| {
                calls += 1;
                id = state.output_as::<i64>("id").ok();
            })
            .await
            .expect("Failed to execute the procedure");
        assert_eq!(result.rows_affected, 1);
        assert_eq!(calls, 1);
        assert_eq!(id, Some(42));

        let user: UserDto = connection
            .execute_scalar_with(&command, |state| {
                assert_eq!(state.output("id"), Some(&Value::Int64(Some(42))));
            })
            .await
            .expect("Failed to execute the procedure");
        assert_eq!(user, UserDto::default());
    }

    #[tokio::test]
    async fn hook_not_called_on_failure() {
        init_logs();
        let database = MockDatabase::new();
        database.script("broken", MockResponse::error("Procedure failed"));
        let mut connection = database.connection();
        let mut called = false;
        silent_logs! {
            let result = connection
                .execute_with(&SqlCommand::procedure("broken"), |_| called = true)
                .await;
            assert!(result.is_err());
        }
        assert!(!called);
    }

    #[tokio::test]
    async fn build_failure_executes_nothing() {
        init_logs();
        let database = MockDatabase::new();
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .execute(&SqlCommand::table("Users").parameter("id", 1))
                .await
                .expect_err("Table commands have no parameters");
            assert_eq!(Failure::of(&error), Some(Failure::Build));
        }
        assert!(
            !database
                .journal()
                .iter()
                .any(|v| matches!(v, Event::Executed(..)))
        );
    }

    #[tokio::test]
    async fn open_failure() {
        init_logs();
        let database = MockDatabase::new();
        database.fail_open("Connection refused");
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .execute(&"SELECT 1")
                .await
                .expect_err("The connection cannot be opened");
            assert_eq!(Failure::of(&error), Some(Failure::Open));
        }
        assert_eq!(connection.state(), ConnectionState::Closed);
        assert!(database.journal().is_empty());
    }

    #[tokio::test]
    async fn cursor_releases_on_drop() {
        let database = MockDatabase::new();
        database.script(
            "SELECT Id, Name FROM Users",
            users(&[(1.into(), "a".into()), (2.into(), "b".into())]),
        );
        let mut connection = database.connection();
        let mut cursor = connection
            .reader(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to open the cursor");
        assert!(cursor.next().await.expect("Failed to advance"));
        assert_eq!(released(&database.journal()), (0, 0));
        drop(cursor);
        let journal = database.journal();
        assert_eq!(
            journal[journal.len() - 2..],
            [Event::CursorClosed, Event::StatementReleased]
        );
    }

    #[tokio::test]
    async fn cursor_names_come_with_the_rows() {
        let database = MockDatabase::new();
        database.script("SELECT Id, Name FROM Users", users(&[(1.into(), "a".into())]));
        database.script("SELECT Id, Name FROM Empty", users(&[]));
        let mut connection = database.connection();
        let cursor = connection
            .reader(&"SELECT Id, Name FROM Users")
            .await
            .expect("Failed to open the cursor");
        assert_eq!(cursor.names(), ["Id", "Name"]);
        assert_eq!(cursor.ordinal("Name"), Some(1));
        drop(cursor);
        let mut cursor = connection
            .reader(&"SELECT Id, Name FROM Empty")
            .await
            .expect("Failed to open the cursor");
        assert!(!cursor.next().await.expect("Failed to advance"));
        assert_eq!(cursor.field_count(), 0);
    }

    #[tokio::test]
    async fn bulk_writes_only_mapped_columns() {
        let database = MockDatabase::new();
        database.with_table("Users", &["Id", "Name"]);
        let mut connection = database.connection();
        let result = connection
            .bulk(
                &BulkCopyBuilder::new("Users"),
                &[UserDto {
                    id: 4,
                    name: "d".into(),
                }],
                &["Id"],
            )
            .await
            .expect("Failed to bulk load");
        assert_eq!(result.rows_affected, 1);
        let rows = database.table_rows("Users").expect("The table exists");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values(), [Value::Null, Value::Varchar(Some("d".into()))]);
        assert_eq!(
            database.journal()[1..],
            [
                Event::BulkStarted("Users".into()),
                Event::BatchFlushed(1),
                Event::BulkFinished(1),
            ]
        );
    }

    #[tokio::test]
    async fn bulk_with_custom_destination() {
        let database = MockDatabase::new();
        database.with_table("People", &["FullName"]);
        let mut connection = database.connection();
        connection.ensure_open().await.expect("Failed to open");
        let users = [UserDto {
            id: 1,
            name: "alice".into(),
        }];
        let mut bulk = BulkCopyBuilder::new("People")
            .set_connection(&mut connection)
            .build()
            .expect("Failed to build the bulk copy");
        assert!(bulk.column_mapping().is_empty());
        bulk.column_mapping_mut().push(ColumnMap {
            source: "Name",
            source_index: UserDto::column_index("Name").expect("Name is a member"),
            destination: "FullName".into(),
        });
        let reader = ObjectReader::new(&users, bulk.column_mapping());
        assert_eq!(reader.names(), ["Name"]);
        let result = bulk
            .write_to_server(stream::iter(reader))
            .await
            .expect("Failed to bulk load");
        assert_eq!(result.rows_affected, 1);
        let rows = database.table_rows("People").expect("The table exists");
        assert_eq!(
            rows[0].get_column("FullName"),
            Some(&Value::Varchar(Some("alice".into())))
        );
    }

    #[tokio::test]
    async fn bulk_keeps_identity_when_asked() {
        let database = MockDatabase::new();
        database
            .with_table("Users", &["Id", "Name"])
            .with_identity("Users", "Id");
        let mut connection = database.connection();
        let options = spool::BulkCopyOptions {
            keep_identity: true,
            ..Default::default()
        };
        connection
            .bulk(
                &BulkCopyBuilder::new("Users").options(options),
                &[UserDto {
                    id: 40,
                    name: "d".into(),
                }],
                &[],
            )
            .await
            .expect("Failed to bulk load");
        let rows = database.table_rows("Users").expect("The table exists");
        assert_eq!(rows[0].get_column("Id"), Some(&Value::Int64(Some(40))));
    }

    #[tokio::test]
    async fn bulk_partial_failure_keeps_flushed_batches() {
        init_logs();
        let database = MockDatabase::new();
        database
            .with_table("Users", &["Id", "Name"])
            .with_identity("Users", "Id")
            .fail_bulk_after(5);
        let mut connection = database.connection();
        let users = (0..7)
            .map(|i| UserDto {
                id: 0,
                name: format!("user{}", i),
            })
            .collect::<Vec<_>>();
        silent_logs! {
            let error = connection
                .bulk(&BulkCopyBuilder::new("Users").batch_size(2), &users, &["Id"])
                .await
                .expect_err("The copy stops after five rows");
            assert_eq!(Failure::of(&error), Some(Failure::BulkLoad));
        }
        let rows = database.table_rows("Users").expect("The table exists");
        assert_eq!(rows.len(), 4);
        let journal = database.journal();
        assert_eq!(
            journal
                .iter()
                .filter(|v| **v == Event::BatchFlushed(2))
                .count(),
            2
        );
        assert!(!journal.iter().any(|v| matches!(v, Event::BulkFinished(..))));
    }

    #[tokio::test]
    async fn bulk_missing_destination_column() {
        init_logs();
        let database = MockDatabase::new();
        database.with_table("Users", &["Name"]);
        let mut connection = database.connection();
        silent_logs! {
            let error = connection
                .bulk(
                    &BulkCopyBuilder::new("Users"),
                    &[UserDto::default()],
                    &[],
                )
                .await
                .expect_err("The Id column does not exist");
            assert_eq!(Failure::of(&error), Some(Failure::BulkLoad));
            assert!(format!("{:#}", error).contains("Id"));
        }
        assert!(database.table_rows("Users").unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_build_failure() {
        init_logs();
        let mut connection = MockDatabase::new().connection();
        silent_logs! {
            let error = connection
                .bulk(&BulkCopyBuilder::new(""), &[UserDto::default()], &[])
                .await
                .expect_err("The destination is empty");
            assert_eq!(Failure::of(&error), Some(Failure::Build));
        }
    }

    #[tokio::test]
    async fn transaction_dropped_rolls_back() {
        let database = MockDatabase::new();
        database.with_table("Users", &["Id", "Name"]);
        let mut connection = database.connection();
        {
            let mut transaction = connection
                .begin_transaction()
                .await
                .expect("Failed to begin");
            transaction
                .execute(
                    &SqlCommand::text("INSERT INTO Users (Name) VALUES (@Name)")
                        .parameter("Name", "x"),
                )
                .await
                .expect("Failed to insert");
            assert_eq!(database.table_rows("Users").unwrap().len(), 1);
        }
        assert_eq!(database.table_rows("Users").unwrap().len(), 0);
        assert_eq!(database.journal().last(), Some(&Event::RolledBack));
    }
}
