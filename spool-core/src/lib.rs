mod as_value;
mod blocking;
mod bulk;
mod command;
mod connection;
mod cursor;
mod driver;
mod entity;
mod error;
mod execution;
mod executor;
mod mapper;
mod object_reader;
mod query;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use blocking::*;
pub use bulk::*;
pub use command::*;
pub use connection::*;
pub use cursor::*;
pub use driver::*;
pub use entity::*;
pub use error::*;
pub use execution::*;
pub use executor::*;
pub use mapper::*;
pub use object_reader::*;
pub use query::*;
pub use transaction::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
