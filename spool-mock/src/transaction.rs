use crate::{MockConnection, MockDriver};
use spool_core::{Result, Transaction, impl_executor_transaction};

/// Transaction over a snapshot of the tables. Dropping it without commit
/// rolls back.
pub struct MockTransaction<'c> {
    connection: &'c mut MockConnection,
    done: bool,
}

impl<'c> MockTransaction<'c> {
    pub(crate) fn new(connection: &'c mut MockConnection) -> Result<Self> {
        connection.database.begin()?;
        Ok(Self {
            connection,
            done: false,
        })
    }
}

impl_executor_transaction!(MockDriver, MockTransaction<'c>, connection);

impl<'c> Transaction<'c> for MockTransaction<'c> {
    async fn commit(mut self) -> Result<()> {
        self.done = true;
        self.connection.database.commit()
    }

    async fn rollback(mut self) -> Result<()> {
        self.done = true;
        self.connection.database.rollback()
    }
}

impl Drop for MockTransaction<'_> {
    fn drop(&mut self) {
        if !self.done {
            log::debug!("Rolling back a mock transaction that was not completed");
            let _ = self.connection.database.rollback();
        }
    }
}
