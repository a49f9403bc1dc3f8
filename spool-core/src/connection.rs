use crate::{Driver, ExecutorExt, Result, Transaction};
use std::{borrow::Cow, future::Future};

pub trait Connection: ExecutorExt {
    type Transaction<'c>: Transaction<'c, Driver = Self::Driver>
    where
        Self: 'c;

    /// Create a connection to the given URL. The returned connection may still
    /// be closed, it gets opened by the first operation that needs it.
    fn connect(
        url: Cow<'static, str>,
    ) -> impl Future<Output = Result<<Self::Driver as Driver>::Connection>>;

    /// Begin a transaction on an already open connection.
    fn begin(&mut self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send;

    /// Open the connection if needed, then begin a transaction.
    fn begin_transaction(&mut self) -> impl Future<Output = Result<Self::Transaction<'_>>> + Send {
        async move {
            self.ensure_open().await?;
            self.begin().await
        }
    }
}
