use crate::{UserDto, silent_logs, user::create_users};
use spool::{ExecutorExt, Failure, SqlCommand};
use std::sync::LazyLock;
use tokio::sync::Mutex;

static MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

pub async fn scalar<E: ExecutorExt>(executor: &mut E) {
    let _lock = MUTEX.lock().await;

    create_users(executor, "ScalarUsers", &["first", "second"]).await;

    // First row only
    let user: UserDto = executor
        .execute_scalar(&"SELECT Id, Name FROM ScalarUsers")
        .await
        .expect("Failed to read the first user");
    assert_eq!(
        user,
        UserDto {
            id: 1,
            name: "first".into()
        }
    );

    // Single values
    let count: i64 = executor
        .execute_value(&"SELECT COUNT(*) FROM ScalarUsers")
        .await
        .expect("Failed to count the users");
    assert_eq!(count, 2);
    let name: String = executor
        .execute_value(&"SELECT Name FROM ScalarUsers")
        .await
        .expect("Failed to read the first name");
    assert_eq!(name, "first");

    // Wrong type for the member
    silent_logs! {
        let result = executor
            .execute_value::<i32, _>(&"SELECT Name FROM ScalarUsers")
            .await;
        let error = result.expect_err("A name is not an integer");
        assert_eq!(Failure::of(&error), Some(Failure::Mapping));
    }

    // Empty results give the default
    executor
        .execute(&"DELETE FROM ScalarUsers")
        .await
        .expect("Failed to delete the users");
    let user: UserDto = executor
        .execute_scalar(&"SELECT Id, Name FROM ScalarUsers")
        .await
        .expect("Failed to read an empty result");
    assert_eq!(user, UserDto::default());
    let name: Option<String> = executor
        .execute_value(&"SELECT Name FROM ScalarUsers")
        .await
        .expect("Failed to read an empty result");
    assert_eq!(name, None);

    // Nothing runs when the command cannot be built
    silent_logs! {
        let result = executor.execute(&SqlCommand::text("")).await;
        let error = result.expect_err("An empty command cannot be built");
        assert_eq!(Failure::of(&error), Some(Failure::Build));
    }
}
