use crate::{
    AsValue, BulkCopyBuilder, CommandBuilder, CommandState, Connection, Cursor, Entity,
    ExecutorExt, Result, RowsAffected, Transaction,
};
use futures::executor::{block_on, block_on_stream};

/// Blocking counterparts of the [`ExecutorExt`] operations.
///
/// Each call drives the asynchronous operation to completion on the current
/// thread, with the same results, errors and release guarantees. Do not call
/// these from inside an async runtime worker.
pub trait BlockingExecutorExt: ExecutorExt {
    fn ensure_open_blocking(&mut self) -> Result<()> {
        block_on(self.ensure_open())
    }

    fn execute_blocking<B>(&mut self, builder: &B) -> Result<RowsAffected>
    where
        B: CommandBuilder + ?Sized,
    {
        block_on(self.execute(builder))
    }

    fn execute_with_blocking<B, F>(
        &mut self,
        builder: &B,
        after_execution: F,
    ) -> Result<RowsAffected>
    where
        B: CommandBuilder + ?Sized,
        F: FnOnce(&CommandState) + Send,
    {
        block_on(self.execute_with(builder, after_execution))
    }

    fn execute_scalar_blocking<T, B>(&mut self, builder: &B) -> Result<T>
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        block_on(self.execute_scalar(builder))
    }

    fn execute_scalar_with_blocking<T, B, F>(
        &mut self,
        builder: &B,
        after_execution: F,
    ) -> Result<T>
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
        F: FnOnce(&CommandState) + Send,
    {
        block_on(self.execute_scalar_with(builder, after_execution))
    }

    fn execute_value_blocking<V, B>(&mut self, builder: &B) -> Result<V>
    where
        V: AsValue + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        block_on(self.execute_value(builder))
    }

    fn enumerate_blocking<T, B>(&mut self, builder: &B) -> Result<Vec<T>>
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        block_on(self.enumerate(builder))
    }

    fn reader_blocking<B>(&mut self, builder: &B) -> Result<Cursor<'_>>
    where
        B: CommandBuilder + ?Sized,
    {
        block_on(self.reader(builder))
    }

    fn bulk_blocking<'a, T, I>(
        &mut self,
        builder: &BulkCopyBuilder,
        items: I,
        ignore_columns: &[&str],
    ) -> Result<RowsAffected>
    where
        T: Entity + Sync + 'a,
        I: IntoIterator<Item = &'a T> + Send,
        I::IntoIter: Send,
    {
        block_on(self.bulk(builder, items, ignore_columns))
    }
}

impl<E: ExecutorExt> BlockingExecutorExt for E {}

pub trait BlockingConnectionExt: Connection {
    fn begin_transaction_blocking(&mut self) -> Result<Self::Transaction<'_>> {
        block_on(self.begin_transaction())
    }
}

impl<C: Connection> BlockingConnectionExt for C {}

pub trait BlockingTransactionExt<'c>: Transaction<'c> {
    fn commit_blocking(self) -> Result<()> {
        block_on(self.commit())
    }
    fn rollback_blocking(self) -> Result<()> {
        block_on(self.rollback())
    }
}

impl<'c, T: Transaction<'c>> BlockingTransactionExt<'c> for T {}

impl<'c> Cursor<'c> {
    pub fn next_blocking(&mut self) -> Result<bool> {
        block_on(self.next())
    }

    /// Iterate the remaining rows mapped to `T`, one row per `next`.
    pub fn enumerate_blocking<T>(self) -> impl Iterator<Item = Result<T>> + 'c
    where
        T: Entity + Default + Send + 'c,
    {
        block_on_stream(Box::pin(self.enumerate::<T>()))
    }
}
