mod connection;
mod database;
mod driver;
mod interpreter;
mod response;
mod transaction;

pub use connection::*;
pub use database::*;
pub use driver::*;
pub use response::*;
pub use transaction::*;
