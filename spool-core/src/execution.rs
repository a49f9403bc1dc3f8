use crate::{
    AsValue, BulkCopyBuilder, CommandBuilder, CommandState, ConnectionState, Cursor, Driver,
    Entity, Executor, Failure, ObjectReader, Result, RowsAffected, error::fail, stream,
};
use std::future::Future;

/// The execution façade, available on every [`Executor`].
///
/// Every operation opens the connection if it is closed, builds the command
/// right before running it, and releases the driver resources it acquired
/// (statement and cursor) before its result is returned, on success and on
/// failure. Errors are labeled with a [`Failure`].
///
/// ```rust,ignore
/// let users: Vec<UserDto> = connection.enumerate(&"SELECT Id, Name FROM Users").await?;
/// let count: i64 = connection.execute_value(&"SELECT COUNT(*) FROM Users").await?;
/// ```
pub trait ExecutorExt: Executor {
    /// Open the connection unless it is already open.
    fn ensure_open(&mut self) -> impl Future<Output = Result<()>> + Send {
        async move {
            if self.state() == ConnectionState::Open {
                return Ok(());
            }
            log::debug!("Opening a {} connection", <Self::Driver as Driver>::NAME);
            self.open().await.map_err(|e| fail(e, Failure::Open))
        }
    }

    /// Run a command that returns no rows, returns the affected count.
    fn execute<B>(&mut self, builder: &B) -> impl Future<Output = Result<RowsAffected>> + Send
    where
        B: CommandBuilder + ?Sized,
    {
        self.execute_with(builder, |_| {})
    }

    /// Like [`ExecutorExt::execute`], `after_execution` receives the command
    /// state (output parameters, affected count) once it completed.
    fn execute_with<B, F>(
        &mut self,
        builder: &B,
        after_execution: F,
    ) -> impl Future<Output = Result<RowsAffected>> + Send
    where
        B: CommandBuilder + ?Sized,
        F: FnOnce(&CommandState) + Send,
    {
        async move {
            self.ensure_open().await?;
            let mut command = builder.set_connection(self).build()?;
            let result = command.execute_non_query().await?;
            after_execution(command.state());
            Ok(result)
        }
    }

    /// Map the first row to `T`, `T::default()` when there are no rows.
    /// Remaining rows are discarded.
    fn execute_scalar<T, B>(&mut self, builder: &B) -> impl Future<Output = Result<T>> + Send
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        self.execute_scalar_with(builder, |_| {})
    }

    fn execute_scalar_with<T, B, F>(
        &mut self,
        builder: &B,
        after_execution: F,
    ) -> impl Future<Output = Result<T>> + Send
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
        F: FnOnce(&CommandState) + Send,
    {
        async move {
            let mut cursor = self.reader(builder).await?;
            cursor.next().await?;
            after_execution(cursor.command());
            match cursor.take_row() {
                Some(row) => T::from_row(row),
                None => Ok(T::default()),
            }
        }
    }

    /// First column of the first row converted to `V`, `V::default()` when
    /// there are no rows.
    fn execute_value<V, B>(&mut self, builder: &B) -> impl Future<Output = Result<V>> + Send
    where
        V: AsValue + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        async move {
            let mut cursor = self.reader(builder).await?;
            cursor.next().await?;
            let Some(value) = cursor
                .take_row()
                .and_then(|row| row.values.into_vec().into_iter().next())
            else {
                return Ok(V::default());
            };
            V::try_from_value(value).map_err(|e| fail(e, Failure::Mapping))
        }
    }

    /// Every row mapped to `T`, fully materialized before returning.
    fn enumerate<T, B>(&mut self, builder: &B) -> impl Future<Output = Result<Vec<T>>> + Send
    where
        T: Entity + Default + Send,
        B: CommandBuilder + ?Sized,
    {
        async move { self.reader(builder).await?.enumerate_all().await }
    }

    /// Run the command and return a cursor over its results. The connection
    /// stays borrowed until the cursor is dropped.
    fn reader<B>(&mut self, builder: &B) -> impl Future<Output = Result<Cursor<'_>>> + Send
    where
        B: CommandBuilder + ?Sized,
    {
        async move {
            self.ensure_open().await?;
            builder.set_connection(self).build()?.execute_reader().await
        }
    }

    /// Bulk copy `items` through the driver channel. Every member of `T`
    /// maps to the column with the same name except the ones listed in
    /// `ignore_columns`.
    fn bulk<'a, T, I>(
        &mut self,
        builder: &BulkCopyBuilder,
        items: I,
        ignore_columns: &[&str],
    ) -> impl Future<Output = Result<RowsAffected>> + Send
    where
        T: Entity + Sync + 'a,
        I: IntoIterator<Item = &'a T> + Send,
        I::IntoIter: Send,
    {
        async move {
            self.ensure_open().await?;
            let mut bulk = builder.set_connection(self).build()?;
            bulk.map_columns::<T>(ignore_columns);
            let reader = ObjectReader::new(items, bulk.column_mapping());
            bulk.write_to_server(stream::iter(reader)).await
        }
    }
}

impl<E: Executor> ExecutorExt for E {}
