//! Spool runs commands against any database driver and maps what comes back
//! to plain structs.
//!
//! ```rust,ignore
//! use spool::{Entity, ExecutorExt, SqlCommand};
//!
//! #[derive(Entity, Default, Debug)]
//! struct UserDto {
//!     #[spool(name = "Id")]
//!     id: i32,
//!     #[spool(name = "Name")]
//!     name: String,
//! }
//!
//! let users: Vec<UserDto> = connection
//!     .enumerate(&SqlCommand::text("SELECT Id, Name FROM Users"))
//!     .await?;
//! ```
pub use spool_core::*;
pub use spool_macros::*;
