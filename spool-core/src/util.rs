/// Formats a possibly long command text for error messages and logs.
#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            {
                let query: &str = &$query;
                let mut end = ::std::cmp::min(query.len(), 497);
                while !query.is_char_boundary(end) {
                    end -= 1;
                }
                query[..end].trim_end()
            },
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Implements [`Executor`](crate::Executor) for a transaction type by
/// delegating every call to the connection it wraps.
///
/// ```rust,ignore
/// pub struct MyTransaction<'c> {
///     connection: &'c mut MyConnection,
/// }
/// impl_executor_transaction!(MyDriver, MyTransaction<'c>, connection);
/// ```
#[macro_export]
macro_rules! impl_executor_transaction {
    ($driver:ty, $transaction:ident<$lt:lifetime>, $connection:ident) => {
        impl<$lt> $crate::Executor for $transaction<$lt> {
            type Driver = $driver;

            fn state(&self) -> $crate::ConnectionState {
                $crate::Executor::state(&*self.$connection)
            }

            fn open(&mut self) -> impl ::std::future::Future<Output = $crate::Result<()>> + Send {
                $crate::Executor::open(&mut *self.$connection)
            }

            fn run<'s>(
                &'s mut self,
                command: ::std::sync::Arc<$crate::CommandDef>,
            ) -> impl $crate::stream::Stream<Item = $crate::Result<$crate::QueryResult>> + Send + 's
            {
                $crate::Executor::run(&mut *self.$connection, command)
            }

            fn write_bulk<'s, S>(
                &'s mut self,
                target: &'s $crate::BulkCopyDef,
                mapping: &'s $crate::ColumnMapping,
                rows: S,
            ) -> impl ::std::future::Future<Output = $crate::Result<$crate::RowsAffected>> + Send + 's
            where
                S: $crate::stream::Stream<Item = $crate::Result<$crate::RowLabeled>> + Send + 's,
            {
                $crate::Executor::write_bulk(&mut *self.$connection, target, mapping, rows)
            }
        }
    };
}
