use crate::{Executor, Result};
use std::future::Future;

/// A transaction scope. Commands run inside it by passing the transaction
/// wherever an [`Executor`] is expected.
pub trait Transaction<'c>: Executor {
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}
