use crate::{Event, MockDatabase, MockDriver, MockTransaction};
use async_stream::stream;
use spool_core::{
    BulkCopyDef, ColumnMapping, CommandDef, Connection, ConnectionState, Driver, Error, Executor,
    QueryResult, Result, Row, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt},
};
use std::{borrow::Cow, future::Future, mem, pin::pin, sync::Arc};

pub struct MockConnection {
    pub(crate) database: MockDatabase,
    pub(crate) state: ConnectionState,
}

impl MockConnection {
    pub fn new(database: MockDatabase) -> Self {
        Self {
            database,
            state: ConnectionState::Closed,
        }
    }

    pub fn database(&self) -> &MockDatabase {
        &self.database
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(Error::msg("The mock connection is closed"));
        }
        Ok(())
    }
}

/// Releases the cursor and then the statement of an executed command.
struct StatementGuard(MockDatabase);

impl Drop for StatementGuard {
    fn drop(&mut self) {
        self.0.record(Event::CursorClosed);
        self.0.record(Event::StatementReleased);
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    fn state(&self) -> ConnectionState {
        self.state
    }

    async fn open(&mut self) -> Result<()> {
        self.database.open()?;
        self.state = ConnectionState::Open;
        Ok(())
    }

    fn run<'s>(
        &'s mut self,
        command: Arc<CommandDef>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        let database = self.database.clone();
        let usable = self.ensure_usable();
        stream! {
            match usable.and_then(|_| database.execute(&command)) {
                Err(error) => {
                    log::error!("{:#}", error);
                    yield Err(error);
                }
                Ok(results) => {
                    let _statement = StatementGuard(database.clone());
                    for result in results {
                        yield result;
                    }
                }
            }
        }
    }

    fn write_bulk<'s, S>(
        &'s mut self,
        target: &'s BulkCopyDef,
        mapping: &'s ColumnMapping,
        rows: S,
    ) -> impl Future<Output = Result<RowsAffected>> + Send + 's
    where
        S: Stream<Item = Result<RowLabeled>> + Send + 's,
    {
        let database = self.database.clone();
        let usable = self.ensure_usable();
        async move {
            usable?;
            let targets = database.bulk_targets(target, mapping)?;
            let limit = database.bulk_limit();
            let batch_size = target.batch_size.unwrap_or(usize::MAX);
            database.record(Event::BulkStarted(target.to_string()));
            let mut rows = pin!(rows);
            let mut batch = Vec::<Row>::new();
            let mut received = 0;
            let mut written = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                if limit == Some(received) {
                    return Err(Error::msg(format!(
                        "The mock database stopped receiving rows after {}",
                        received
                    )));
                }
                received += 1;
                batch.push(
                    mapping
                        .iter()
                        .map(|v| row.get_column(v.source).cloned().unwrap_or_default())
                        .collect(),
                );
                if batch.len() >= batch_size {
                    written += batch.len() as u64;
                    database.flush(target, &targets, mem::take(&mut batch))?;
                }
            }
            if !batch.is_empty() {
                written += batch.len() as u64;
                database.flush(target, &targets, batch)?;
            }
            database.record(Event::BulkFinished(written));
            Ok(RowsAffected {
                rows_affected: written,
                last_affected_id: None,
            })
        }
    }
}

impl Connection for MockConnection {
    type Transaction<'c> = MockTransaction<'c>;

    #[allow(refining_impl_trait)]
    async fn connect(url: Cow<'static, str>) -> Result<MockConnection> {
        let prefix = format!("{}://", <Self::Driver as Driver>::NAME);
        let Some(name) = url.strip_prefix(&prefix) else {
            let error = Error::msg(format!(
                "Expected mock connection url to start with `{}`",
                prefix
            ));
            log::error!("{:#}", error);
            return Err(error);
        };
        Ok(MockDatabase::named(name).connection())
    }

    async fn begin(&mut self) -> Result<MockTransaction<'_>> {
        self.ensure_usable()?;
        MockTransaction::new(self)
    }
}
