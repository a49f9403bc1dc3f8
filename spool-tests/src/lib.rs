mod blocking;
#[cfg(not(feature = "disable-bulk"))]
mod bulk;
mod cursor;
mod scalar;
#[cfg(not(feature = "disable-transactions"))]
mod transaction1;
mod user;

pub use blocking::blocking;
#[cfg(not(feature = "disable-bulk"))]
use bulk::bulk;
use cursor::cursor;
use log::LevelFilter;
use scalar::scalar;
use spool::Connection;
use std::env;
#[cfg(not(feature = "disable-transactions"))]
use transaction1::transaction1;
pub use user::UserDto;
use user::users;

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

pub async fn execute_tests<C: Connection>(mut connection: C) {
    users(&mut connection).await;
    cursor(&mut connection).await;
    scalar(&mut connection).await;
    #[cfg(not(feature = "disable-bulk"))]
    bulk(&mut connection).await;
    #[cfg(not(feature = "disable-transactions"))]
    transaction1(&mut connection).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
