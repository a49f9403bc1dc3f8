use crate::{
    AsValue, Cursor, Error, Executor, Failure, QueryResult, Result, RowLabeled, RowsAffected, Value,
    error::fail, stream::StreamExt, truncate_long,
};
use std::{
    borrow::Cow,
    collections::HashSet,
    fmt::{self, Display},
    pin::pin,
    sync::Arc,
    time::Duration,
};

/// How the driver should interpret the command text.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// SQL text.
    #[default]
    Text,
    /// Name of a stored procedure, parameters are passed by name.
    StoredProcedure,
    /// Name of a table, all its rows are returned.
    TableDirect,
}

/// Direction of a command parameter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl Direction {
    /// True when the driver reports a value back for the parameter.
    pub fn is_output(&self) -> bool {
        !matches!(self, Direction::Input)
    }
}

/// A named command parameter. For output directions `value` is the typed NULL
/// declaring the expected type until the driver reports the actual value.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: Cow<'static, str>,
    pub value: Value,
    pub direction: Direction,
}

impl Parameter {
    pub fn new(name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            direction: Direction::Input,
        }
    }
}

/// Immutable description of a command: what a builder produces.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct CommandDef {
    pub text: Cow<'static, str>,
    pub kind: CommandKind,
    pub parameters: Vec<Parameter>,
    /// Passed to the driver, the execution layer does not enforce it.
    pub timeout: Option<Duration>,
}

impl CommandDef {
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|v| v.name == name)
    }
}

impl Display for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::Text => write!(f, "{}", truncate_long!(self.text)),
            CommandKind::StoredProcedure => write!(f, "procedure {}", truncate_long!(self.text)),
            CommandKind::TableDirect => write!(f, "table {}", truncate_long!(self.text)),
        }
    }
}

/// Produces the command to run.
///
/// Implementors only describe the command through [`CommandBuilder::definition`];
/// the execution layer binds it to a connection with
/// `builder.set_connection(connection).build()` right before running it and
/// never reuses the resulting [`Command`].
pub trait CommandBuilder: Send + Sync {
    fn definition(&self) -> Result<CommandDef>;

    /// Bind the builder to the connection (or transaction) the command will run on.
    fn set_connection<'c, E: Executor>(
        &self,
        connection: &'c mut E,
    ) -> BoundCommandBuilder<'c, '_, E, Self> {
        BoundCommandBuilder {
            connection,
            builder: self,
        }
    }
}

/// A [`CommandBuilder`] bound to a connection, ready to `build`.
pub struct BoundCommandBuilder<'c, 'b, E: Executor, B: CommandBuilder + ?Sized> {
    connection: &'c mut E,
    builder: &'b B,
}

impl<'c, 'b, E: Executor, B: CommandBuilder + ?Sized> BoundCommandBuilder<'c, 'b, E, B> {
    pub fn build(self) -> Result<Command<'c, E>> {
        let definition = self
            .builder
            .definition()
            .map_err(|e| fail(e, Failure::Build))?;
        Ok(Command {
            connection: self.connection,
            state: CommandState::new(definition),
        })
    }
}

impl CommandBuilder for CommandDef {
    fn definition(&self) -> Result<CommandDef> {
        Ok(self.clone())
    }
}

impl CommandBuilder for &str {
    fn definition(&self) -> Result<CommandDef> {
        SqlCommand::text(self.to_string()).definition()
    }
}

impl CommandBuilder for String {
    fn definition(&self) -> Result<CommandDef> {
        SqlCommand::text(self.clone()).definition()
    }
}

/// The general purpose [`CommandBuilder`].
///
/// ```rust,ignore
/// let command = SqlCommand::procedure("create_user")
///     .parameter("name", "alice")
///     .output("id", Value::Int64(None))
///     .timeout(Duration::from_secs(5));
/// ```
#[derive(Default, Debug, Clone)]
pub struct SqlCommand {
    definition: CommandDef,
}

impl SqlCommand {
    pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
        Self {
            definition: CommandDef::new(text),
        }
    }
    pub fn procedure(name: impl Into<Cow<'static, str>>) -> Self {
        Self::text(name).kind(CommandKind::StoredProcedure)
    }
    pub fn table(name: impl Into<Cow<'static, str>>) -> Self {
        Self::text(name).kind(CommandKind::TableDirect)
    }
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.definition.kind = kind;
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.definition.timeout = Some(timeout);
        self
    }
    pub fn parameter(self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.with_parameter(name, value.into(), Direction::Input)
    }
    /// Declare an output parameter, `value` gives its type (usually a typed NULL).
    pub fn output(self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.with_parameter(name, value.into(), Direction::Output)
    }
    pub fn input_output(self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.with_parameter(name, value.into(), Direction::InputOutput)
    }
    pub fn return_value(self, name: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.with_parameter(name, value.into(), Direction::ReturnValue)
    }
    pub fn with_parameter(
        mut self,
        name: impl Into<Cow<'static, str>>,
        value: Value,
        direction: Direction,
    ) -> Self {
        self.definition.parameters.push(Parameter {
            name: name.into(),
            value,
            direction,
        });
        self
    }
}

impl CommandBuilder for SqlCommand {
    fn definition(&self) -> Result<CommandDef> {
        let definition = &self.definition;
        if definition.text.trim().is_empty() {
            return Err(Error::msg("The command text is empty"));
        }
        if definition.kind == CommandKind::TableDirect && !definition.parameters.is_empty() {
            return Err(Error::msg(format!(
                "Command `{}` reads a table directly and cannot have parameters",
                definition
            )));
        }
        let mut names = HashSet::with_capacity(definition.parameters.len());
        if let Some(duplicate) = definition
            .parameters
            .iter()
            .find(|v| !names.insert(v.name.as_ref()))
        {
            return Err(Error::msg(format!(
                "Parameter `{}` is declared more than once in command `{}`",
                duplicate.name, definition
            )));
        }
        Ok(definition.clone())
    }
}

/// What is known about a command once built, updated as it executes.
///
/// This is what the after-execution hooks receive.
#[derive(Debug, Clone)]
pub struct CommandState {
    definition: Arc<CommandDef>,
    outputs: Vec<Parameter>,
    rows_affected: Option<RowsAffected>,
}

impl CommandState {
    fn new(definition: CommandDef) -> Self {
        Self {
            definition: definition.into(),
            outputs: Vec::new(),
            rows_affected: None,
        }
    }
    pub fn definition(&self) -> &CommandDef {
        &self.definition
    }
    /// Values reported by the driver for non input parameters.
    pub fn outputs(&self) -> &[Parameter] {
        &self.outputs
    }
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.iter().find(|v| v.name == name).map(|v| &v.value)
    }
    /// Get an output value converted to `T`.
    pub fn output_as<T: AsValue>(&self, name: &str) -> Result<T> {
        let Some(value) = self.output(name) else {
            return Err(Error::msg(format!(
                "Command `{}` did not report a value for parameter `{}`",
                self.definition, name
            )));
        };
        T::try_from_value(value.clone())
    }
    pub fn rows_affected(&self) -> Option<RowsAffected> {
        self.rows_affected
    }
    pub(crate) fn shared_definition(&self) -> Arc<CommandDef> {
        self.definition.clone()
    }
    /// Absorb a non row result, returns the row back if it was one.
    pub(crate) fn absorb(&mut self, result: QueryResult) -> Option<RowLabeled> {
        match result {
            QueryResult::Row(row) => return Some(row),
            QueryResult::Output(parameter) => {
                match self.outputs.iter_mut().find(|v| v.name == parameter.name) {
                    Some(existing) => *existing = parameter,
                    None => self.outputs.push(parameter),
                }
            }
            QueryResult::Affected(affected) => self
                .rows_affected
                .get_or_insert_default()
                .extend([affected]),
        }
        None
    }
}

/// A built command bound to the connection it will run on.
///
/// The command borrows the connection mutably for its whole life, so a
/// connection never runs two commands at once.
pub struct Command<'c, E: Executor> {
    connection: &'c mut E,
    state: CommandState,
}

impl<'c, E: Executor> Command<'c, E> {
    pub fn definition(&self) -> &CommandDef {
        self.state.definition()
    }
    pub fn state(&self) -> &CommandState {
        &self.state
    }
    pub fn connection(&mut self) -> &mut E {
        self.connection
    }

    /// Run the command ignoring any row and return the affected count (0 when
    /// the driver reports none).
    ///
    /// The driver statement is released before this returns, on every path.
    pub async fn execute_non_query(&mut self) -> Result<RowsAffected> {
        log::debug!("Executing: {}", self.state.definition);
        let definition = self.state.shared_definition();
        {
            let mut results = pin!(self.connection.run(definition));
            while let Some(result) = results.next().await {
                let result = result.map_err(|e| {
                    fail(
                        e.context(format!("While executing:\n{}", self.state.definition)),
                        Failure::Execute,
                    )
                })?;
                self.state.absorb(result);
            }
        }
        Ok(self.state.rows_affected.unwrap_or_default())
    }

    /// Run the command and hand its results over to a [`Cursor`].
    ///
    /// The first result is fetched before returning, so execution errors
    /// surface here.
    pub async fn execute_reader(self) -> Result<Cursor<'c>> {
        log::debug!("Executing: {}", self.state.definition);
        let Command { connection, state } = self;
        let results = connection.run(state.shared_definition()).boxed();
        Cursor::open(results, state).await
    }
}
