use spool_core::{Direction, Parameter, Row, RowNames, RowsAffected, Value};
use std::borrow::Cow;

/// What the mock database answers when a scripted command text is executed.
///
/// ```rust,ignore
/// database.script(
///     "create_user",
///     MockResponse::affected(1).output("id", Value::Int64(Some(10))),
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    pub(crate) labels: Option<RowNames>,
    pub(crate) rows: Vec<Row>,
    pub(crate) outputs: Vec<Parameter>,
    pub(crate) affected: Option<RowsAffected>,
    pub(crate) prepare_error: Option<String>,
    pub(crate) error_after: Option<(usize, String)>,
}

impl MockResponse {
    /// No rows, reports `rows_affected` modified rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            affected: Some(RowsAffected {
                rows_affected,
                last_affected_id: None,
            }),
            ..Default::default()
        }
    }

    /// A result set.
    pub fn rows<I, R>(labels: &[&str], rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Value>,
    {
        Self {
            labels: Some(labels.iter().map(|v| v.to_string()).collect()),
            rows: rows
                .into_iter()
                .map(|v| v.into_iter().collect::<Row>())
                .collect(),
            ..Default::default()
        }
    }

    /// The command fails before producing anything.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            prepare_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Report a value for an output parameter once the rows were read.
    pub fn output(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.outputs.push(Parameter {
            name: name.into(),
            value: value.into(),
            direction: Direction::Output,
        });
        self
    }

    pub fn last_id(mut self, id: i64) -> Self {
        self.affected.get_or_insert_default().last_affected_id = Some(id);
        self
    }

    /// Fail with `message` after `rows` rows were produced.
    pub fn fail_after(mut self, rows: usize, message: impl Into<String>) -> Self {
        self.error_after = Some((rows, message.into()));
        self
    }
}
