use crate::{
    MockConnection, MockResponse,
    interpreter::{Projection, Statement, parse},
};
use spool_core::{
    AsValue, BulkCopyDef, ColumnMapping, CommandDef, CommandKind, Direction, Error, QueryResult,
    Result, Row, RowLabeled, RowNames, RowsAffected, Value,
};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError},
};

/// Lifecycle events recorded by the mock database, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Opened,
    Began,
    Committed,
    RolledBack,
    /// A statement was prepared and executed, holds the command text.
    Executed(String),
    CursorClosed,
    StatementReleased,
    /// Holds the destination table.
    BulkStarted(String),
    /// Holds the number of rows in the batch.
    BatchFlushed(usize),
    /// Holds the total number of rows written.
    BulkFinished(u64),
}

#[derive(Debug, Clone)]
pub(crate) struct MockTable {
    pub(crate) columns: RowNames,
    pub(crate) identity: Option<usize>,
    pub(crate) next_identity: i64,
    pub(crate) rows: Vec<Row>,
}

impl MockTable {
    fn new(columns: RowNames, identity: Option<usize>) -> Self {
        Self {
            columns,
            identity,
            next_identity: 1,
            rows: Vec::new(),
        }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|v| v == column)
    }

    /// Appends a row from `(column index, value)` pairs, missing columns are
    /// NULL and the identity is generated unless provided. Returns the identity.
    fn insert(
        &mut self,
        values: impl IntoIterator<Item = (usize, Value)>,
        keep_identity: bool,
    ) -> Option<i64> {
        let mut row = vec![Value::Null; self.columns.len()].into_boxed_slice();
        for (i, value) in values {
            row[i] = value;
        }
        let identity = self.identity.map(|i| {
            let provided = if keep_identity {
                i64::try_from_value(row[i].clone()).ok()
            } else {
                None
            };
            let id = provided.unwrap_or(self.next_identity);
            self.next_identity = self.next_identity.max(id + 1);
            row[i] = Value::Int64(Some(id));
            id
        });
        self.rows.push(row);
        identity
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub(crate) scripts: HashMap<String, MockResponse>,
    pub(crate) tables: BTreeMap<String, MockTable>,
    pub(crate) snapshot: Option<BTreeMap<String, MockTable>>,
    pub(crate) journal: Vec<Event>,
    pub(crate) fail_open: Option<String>,
    pub(crate) fail_bulk_after: Option<usize>,
}

static DATABASES: LazyLock<Mutex<HashMap<String, MockDatabase>>> =
    LazyLock::new(Default::default);

/// Shared handle to an in-memory database.
///
/// Clones share the same data, every connection created from a handle (or
/// connected to `mock://<name>`) sees the same tables and writes to the same
/// journal.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// The database registered under `name`, created on first use.
    pub fn named(name: &str) -> Self {
        DATABASES
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    /// A new closed connection to this database.
    pub fn connection(&self) -> MockConnection {
        MockConnection::new(self.clone())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer `response` whenever a command with exactly this text runs.
    pub fn script(&self, text: impl Into<String>, response: MockResponse) -> &Self {
        self.lock().scripts.insert(text.into(), response);
        self
    }

    /// Create (or replace) a table.
    pub fn with_table(&self, table: &str, columns: &[&str]) -> &Self {
        self.lock().tables.insert(
            table.to_string(),
            MockTable::new(columns.iter().map(|v| v.to_string()).collect(), None),
        );
        self
    }

    /// Mark a column of an existing table as identity, its values are
    /// generated on insert.
    pub fn with_identity(&self, table: &str, column: &str) -> &Self {
        if let Some(table) = self.lock().tables.get_mut(table) {
            table.identity = table.position(column);
        }
        self
    }

    /// Append rows to an existing table, values in column order.
    pub fn insert<I, R>(&self, table: &str, rows: I) -> &Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Value>,
    {
        if let Some(table) = self.lock().tables.get_mut(table) {
            for row in rows {
                table.insert(row.into_iter().enumerate(), true);
            }
        }
        self
    }

    /// Current content of a table, `None` if it does not exist.
    pub fn table_rows(&self, table: &str) -> Option<Vec<RowLabeled>> {
        self.lock().tables.get(table).map(|table| {
            table
                .rows
                .iter()
                .map(|v| RowLabeled::new(table.columns.clone(), v.clone()))
                .collect()
        })
    }

    /// Make every connection open fail with `message`.
    pub fn fail_open(&self, message: impl Into<String>) -> &Self {
        self.lock().fail_open = Some(message.into());
        self
    }

    /// Make bulk copies fail when `rows` rows of the copy were received.
    pub fn fail_bulk_after(&self, rows: usize) -> &Self {
        self.lock().fail_bulk_after = Some(rows);
        self
    }

    pub fn journal(&self) -> Vec<Event> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    pub(crate) fn record(&self, event: Event) {
        log::trace!("Mock database event: {:?}", event);
        self.lock().journal.push(event);
    }

    pub(crate) fn open(&self) -> Result<()> {
        let mut state = self.lock();
        if let Some(message) = &state.fail_open {
            return Err(Error::msg(message.clone()));
        }
        state.journal.push(Event::Opened);
        Ok(())
    }

    pub(crate) fn begin(&self) -> Result<()> {
        let mut state = self.lock();
        if state.snapshot.is_some() {
            return Err(Error::msg("A transaction is already active"));
        }
        let tables = state.tables.clone();
        state.snapshot = Some(tables);
        state.journal.push(Event::Began);
        Ok(())
    }

    pub(crate) fn commit(&self) -> Result<()> {
        let mut state = self.lock();
        if state.snapshot.take().is_none() {
            return Err(Error::msg("There is no active transaction to commit"));
        }
        state.journal.push(Event::Committed);
        Ok(())
    }

    pub(crate) fn rollback(&self) -> Result<()> {
        let mut state = self.lock();
        let Some(snapshot) = state.snapshot.take() else {
            return Err(Error::msg("There is no active transaction to roll back"));
        };
        state.tables = snapshot;
        state.journal.push(Event::RolledBack);
        Ok(())
    }

    /// Prepare and run a command. The outer error means nothing was prepared,
    /// inner errors are produced while results are read and come last.
    pub(crate) fn execute(&self, command: &CommandDef) -> Result<Vec<Result<QueryResult>>> {
        let mut state = self.lock();
        let text = command.text.trim();
        let results = match state.scripts.get(text).cloned() {
            Some(response) => scripted(&response, command)?,
            None => match command.kind {
                CommandKind::TableDirect => select(&state, text, Projection::All)?,
                CommandKind::Text => interpret(&mut state, command)?,
                CommandKind::StoredProcedure => {
                    return Err(Error::msg(format!(
                        "Stored procedure `{}` does not exist",
                        text
                    )));
                }
            },
        };
        state.journal.push(Event::Executed(text.to_string()));
        Ok(results)
    }

    /// Validate the destination of a bulk copy, returning the destination
    /// column index of each mapped source.
    pub(crate) fn bulk_targets(
        &self,
        target: &BulkCopyDef,
        mapping: &ColumnMapping,
    ) -> Result<Vec<usize>> {
        let state = self.lock();
        let Some(table) = state.tables.get(target.table.as_ref()) else {
            return Err(Error::msg(format!("Table `{}` does not exist", target)));
        };
        mapping
            .iter()
            .map(|v| {
                table.position(&v.destination).ok_or_else(|| {
                    Error::msg(format!(
                        "Column `{}` does not exist in table `{}`",
                        v.destination, target
                    ))
                })
            })
            .collect()
    }

    pub(crate) fn bulk_limit(&self) -> Option<usize> {
        self.lock().fail_bulk_after
    }

    /// Append a batch of bulk rows, each row holds values aligned with `targets`.
    pub(crate) fn flush(
        &self,
        target: &BulkCopyDef,
        targets: &[usize],
        batch: Vec<Row>,
    ) -> Result<()> {
        let mut state = self.lock();
        let Some(table) = state.tables.get_mut(target.table.as_ref()) else {
            return Err(Error::msg(format!("Table `{}` does not exist", target)));
        };
        let len = batch.len();
        for row in batch {
            table.insert(
                targets.iter().copied().zip(row.into_vec()),
                target.options.keep_identity,
            );
        }
        state.journal.push(Event::BatchFlushed(len));
        Ok(())
    }
}

fn scripted(response: &MockResponse, command: &CommandDef) -> Result<Vec<Result<QueryResult>>> {
    if let Some(message) = &response.prepare_error {
        return Err(Error::msg(message.clone()));
    }
    let mut results = Vec::new();
    if let Some(labels) = &response.labels {
        let limit = response.error_after.as_ref().map(|(n, _)| *n);
        for row in response.rows.iter().take(limit.unwrap_or(usize::MAX)) {
            results.push(Ok(RowLabeled::new(labels.clone(), row.clone()).into()));
        }
    }
    if let Some((_, message)) = &response.error_after {
        results.push(Err(Error::msg(message.clone())));
        return Ok(results);
    }
    for output in &response.outputs {
        if command
            .parameter(&output.name)
            .is_some_and(|v| v.direction.is_output())
        {
            results.push(Ok(output.clone().into()));
        }
    }
    if let Some(affected) = response.affected {
        results.push(Ok(affected.into()));
    }
    Ok(results)
}

fn select(
    state: &MockState,
    table_name: &str,
    projection: Projection,
) -> Result<Vec<Result<QueryResult>>> {
    let Some(table) = state.tables.get(table_name) else {
        return Err(Error::msg(format!("Table `{}` does not exist", table_name)));
    };
    Ok(match projection {
        Projection::All => table
            .rows
            .iter()
            .map(|v| Ok(RowLabeled::new(table.columns.clone(), v.clone()).into()))
            .collect(),
        Projection::Count => {
            let labels: RowNames = ["COUNT(*)".to_string()].into();
            vec![Ok(RowLabeled::new(
                labels,
                [Value::Int64(Some(table.rows.len() as i64))].into(),
            )
            .into())]
        }
        Projection::Columns(columns) => {
            let indexes = columns
                .iter()
                .map(|c| {
                    table.position(c).ok_or_else(|| {
                        Error::msg(format!(
                            "Column `{}` does not exist in table `{}`",
                            c, table_name
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let labels: RowNames = columns.iter().map(|v| v.to_string()).collect();
            table
                .rows
                .iter()
                .map(|row| {
                    Ok(RowLabeled::new(
                        labels.clone(),
                        indexes.iter().map(|&i| row[i].clone()).collect(),
                    )
                    .into())
                })
                .collect()
        }
    })
}

fn interpret(state: &mut MockState, command: &CommandDef) -> Result<Vec<Result<QueryResult>>> {
    let affected =
        |rows_affected: usize, last_affected_id: Option<i64>| -> Vec<Result<QueryResult>> {
            vec![Ok(QueryResult::Affected(RowsAffected {
                rows_affected: rows_affected as u64,
                last_affected_id,
            }))]
        };
    Ok(match parse(&command.text)? {
        Statement::CreateTable { table, columns } => {
            if state.tables.contains_key(table) {
                return Err(Error::msg(format!("Table `{}` already exists", table)));
            }
            let identity = columns.iter().position(|(_, identity)| *identity);
            state.tables.insert(
                table.to_string(),
                MockTable::new(columns.iter().map(|(v, _)| v.to_string()).collect(), identity),
            );
            affected(0, None)
        }
        Statement::DropTable { table, if_exists } => {
            if state.tables.remove(table).is_none() && !if_exists {
                return Err(Error::msg(format!("Table `{}` does not exist", table)));
            }
            affected(0, None)
        }
        Statement::Delete { table } => {
            let Some(table) = state.tables.get_mut(table) else {
                return Err(Error::msg(format!("Table `{}` does not exist", table)));
            };
            let count = table.rows.len();
            table.rows.clear();
            affected(count, None)
        }
        Statement::Insert { table: name } => {
            let Some(table) = state.tables.get_mut(name) else {
                return Err(Error::msg(format!("Table `{}` does not exist", name)));
            };
            let values = command
                .parameters
                .iter()
                .filter(|v| v.direction == Direction::Input)
                .map(|v| {
                    let column = v.name.trim_start_matches('@');
                    table
                        .position(column)
                        .map(|i| (i, v.value.clone()))
                        .ok_or_else(|| {
                            Error::msg(format!(
                                "Column `{}` does not exist in table `{}`",
                                column, name
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            let id = table.insert(values, false);
            affected(1, id)
        }
        Statement::Select { table, projection } => select(state, table, projection)?,
    })
}
