use crate::{
    BulkCopyDef, ColumnMapping, CommandDef, Driver, Error, QueryResult, Result, RowLabeled,
    RowsAffected,
    stream::{Stream, StreamExt},
};
use std::{future::Future, sync::Arc};

/// Whether the channel to the database is usable.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
}

/// Something commands can run on: a connection or a transaction.
///
/// This is the interface a driver implements. Opening is split from state so
/// that callers open idempotently through
/// [`ExecutorExt::ensure_open`](crate::ExecutorExt::ensure_open): the driver
/// `open` is called only when `state()` reports the channel closed.
pub trait Executor: Send + Sized {
    type Driver: Driver;

    /// Current state of the underlying channel.
    fn state(&self) -> ConnectionState;

    /// Open the underlying channel.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Execute the command and stream back every result it produces (rows,
    /// output parameter values, affected counts).
    ///
    /// Dropping the stream must release whatever the driver acquired for the
    /// command (native cursor first, then the statement), even when the
    /// stream was not polled to the end.
    fn run<'s>(
        &'s mut self,
        command: Arc<CommandDef>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute the command and return only the rows.
    fn fetch<'s>(
        &'s mut self,
        command: Arc<CommandDef>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(command).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Copy the rows into `target` through the driver bulk-copy channel,
    /// returning the number of rows written.
    ///
    /// `mapping` associates the labels of the incoming rows with destination
    /// columns. Drivers that have no bulk-copy path keep the default, which
    /// fails without consuming the rows.
    fn write_bulk<'s, S>(
        &'s mut self,
        target: &'s BulkCopyDef,
        mapping: &'s ColumnMapping,
        rows: S,
    ) -> impl Future<Output = Result<RowsAffected>> + Send + 's
    where
        S: Stream<Item = Result<RowLabeled>> + Send + 's,
    {
        let _ = (mapping, rows);
        let name = <Self::Driver as Driver>::NAME;
        async move {
            Err(Error::msg(format!(
                "Bulk copy into `{}` is not supported by the {} driver",
                target.table, name
            )))
        }
    }
}
