use crate::{
    AsValue, CommandState, Entity, Error, Failure, QueryResult, Result, RowLabeled, Value,
    error::fail,
    map_rows,
    stream::{BoxStream, Stream, StreamExt, TryStreamExt},
};
use async_stream::try_stream;

/// Forward-only, single pass handle over the results of a command.
///
/// The cursor owns the driver result stream (native cursor and statement) and
/// the state of the command that produced it. Dropping the cursor releases the
/// driver stream first and the command state last. Rows are read one at a
/// time with [`Cursor::next`]; a row that has been advanced past is gone.
pub struct Cursor<'c> {
    results: BoxStream<'c, Result<QueryResult>>,
    pending: Option<RowLabeled>,
    current: Option<RowLabeled>,
    exhausted: bool,
    command: CommandState,
}

impl<'c> Cursor<'c> {
    pub(crate) async fn open(
        results: BoxStream<'c, Result<QueryResult>>,
        command: CommandState,
    ) -> Result<Self> {
        let mut cursor = Self {
            results,
            pending: None,
            current: None,
            exhausted: false,
            command,
        };
        cursor.pending = cursor.fetch().await?;
        Ok(cursor)
    }

    async fn fetch(&mut self) -> Result<Option<RowLabeled>> {
        if self.exhausted {
            return Ok(None);
        }
        while let Some(result) = self.results.next().await {
            let result = match result {
                Ok(v) => v,
                Err(e) => {
                    self.exhausted = true;
                    return Err(fail(
                        e.context(format!(
                            "While reading the results of:\n{}",
                            self.command.definition()
                        )),
                        Failure::Execute,
                    ));
                }
            };
            if let Some(row) = self.command.absorb(result) {
                return Ok(Some(row));
            }
        }
        self.exhausted = true;
        Ok(None)
    }

    /// Advance to the next row, returns false once there are no more rows.
    pub async fn next(&mut self) -> Result<bool> {
        self.current = None;
        self.current = match self.pending.take() {
            Some(row) => Some(row),
            None => self.fetch().await?,
        };
        Ok(self.current.is_some())
    }

    /// The row the cursor is positioned on.
    pub fn row(&self) -> Option<&RowLabeled> {
        self.current.as_ref()
    }

    /// Move the current row out of the cursor.
    pub fn take_row(&mut self) -> Option<RowLabeled> {
        self.current.take()
    }

    /// Column names of the result set.
    ///
    /// Labels travel with the rows, so they are known once a row has been
    /// fetched: a result set without rows reports no columns.
    pub fn names(&self) -> &[String] {
        self.current
            .as_ref()
            .or(self.pending.as_ref())
            .map(RowLabeled::names)
            .unwrap_or_default()
    }

    pub fn field_count(&self) -> usize {
        self.names().len()
    }

    pub fn ordinal(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|v| v == name)
    }

    pub fn get(&self, ordinal: usize) -> Option<&Value> {
        self.current.as_ref().and_then(|v| v.get(ordinal))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.current.as_ref().and_then(|v| v.get_column(name))
    }

    pub fn is_null(&self, ordinal: usize) -> bool {
        self.get(ordinal).is_none_or(Value::is_null)
    }

    /// Read a column of the current row converted to `T`.
    pub fn get_as<T: AsValue>(&self, name: &str) -> Result<T> {
        let Some(value) = self.get_by_name(name) else {
            return Err(Error::msg(format!(
                "Column `{}` is not available in the current row of:\n{}",
                name,
                self.command.definition()
            )));
        };
        T::try_from_value(value.clone())
            .map_err(|e| fail(e.context(format!("Column `{}`", name)), Failure::Mapping))
    }

    /// State of the command that produced this cursor (output parameters and
    /// affected counts seen so far).
    pub fn command(&self) -> &CommandState {
        &self.command
    }

    /// The rows following the current position, as a stream owning the cursor.
    pub fn into_rows(mut self) -> impl Stream<Item = Result<RowLabeled>> + Send + 'c {
        try_stream! {
            while self.next().await? {
                if let Some(row) = self.current.take() {
                    yield row;
                }
            }
        }
    }

    /// Lazily map the remaining rows to `T`.
    pub fn enumerate<T>(self) -> impl Stream<Item = Result<T>> + Send + 'c
    where
        T: Entity + Default + Send + 'c,
    {
        map_rows(self.into_rows())
    }

    /// Map all the remaining rows to `T`, the cursor is released before this
    /// returns.
    pub async fn enumerate_all<T>(self) -> Result<Vec<T>>
    where
        T: Entity + Default + Send + 'c,
    {
        self.enumerate().try_collect().await
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        log::trace!("Closing the cursor of: {}", self.command.definition());
    }
}
