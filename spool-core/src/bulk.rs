use crate::{
    Entity, Error, Executor, Failure, Result, RowLabeled, RowsAffected, error::fail,
    stream::Stream,
};
use std::{
    borrow::Cow,
    fmt::{self, Display},
    time::Duration,
};

/// Flags forwarded to the driver bulk-copy channel.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkCopyOptions {
    /// Keep the source values for identity columns.
    pub keep_identity: bool,
    /// Keep NULLs instead of applying column defaults.
    pub keep_nulls: bool,
    /// Hold a table lock for the duration of the copy.
    pub table_lock: bool,
    pub check_constraints: bool,
    pub fire_triggers: bool,
}

/// Destination and settings of a bulk copy.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct BulkCopyDef {
    pub table: Cow<'static, str>,
    pub schema: Cow<'static, str>,
    /// Rows sent per batch, `None` sends everything in one batch.
    pub batch_size: Option<usize>,
    pub timeout: Option<Duration>,
    pub options: BulkCopyOptions,
}

impl Display for BulkCopyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.schema.is_empty() {
            write!(f, "{}.", self.schema)?;
        }
        f.write_str(&self.table)
    }
}

/// Describes a bulk copy, bound to a connection when the copy runs.
#[derive(Default, Debug, Clone)]
pub struct BulkCopyBuilder {
    definition: BulkCopyDef,
}

impl BulkCopyBuilder {
    pub fn new(table: impl Into<Cow<'static, str>>) -> Self {
        Self {
            definition: BulkCopyDef {
                table: table.into(),
                ..Default::default()
            },
        }
    }
    pub fn schema(mut self, schema: impl Into<Cow<'static, str>>) -> Self {
        self.definition.schema = schema.into();
        self
    }
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.definition.batch_size = Some(batch_size);
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.definition.timeout = Some(timeout);
        self
    }
    pub fn options(mut self, options: BulkCopyOptions) -> Self {
        self.definition.options = options;
        self
    }
    pub fn definition(&self) -> Result<BulkCopyDef> {
        let definition = &self.definition;
        if definition.table.trim().is_empty() {
            return Err(Error::msg("The bulk copy destination table is empty"));
        }
        if definition.batch_size == Some(0) {
            return Err(Error::msg(format!(
                "The batch size of the bulk copy into `{}` must be greater than zero",
                definition
            )));
        }
        Ok(definition.clone())
    }
    pub fn set_connection<'c, E: Executor>(
        &self,
        connection: &'c mut E,
    ) -> BoundBulkCopyBuilder<'c, '_, E> {
        BoundBulkCopyBuilder {
            connection,
            builder: self,
        }
    }
}

pub struct BoundBulkCopyBuilder<'c, 'b, E: Executor> {
    connection: &'c mut E,
    builder: &'b BulkCopyBuilder,
}

impl<'c, 'b, E: Executor> BoundBulkCopyBuilder<'c, 'b, E> {
    pub fn build(self) -> Result<BulkCopy<'c, E>> {
        let definition = self
            .builder
            .definition()
            .map_err(|e| fail(e, Failure::Build))?;
        Ok(BulkCopy {
            connection: self.connection,
            definition,
            mapping: ColumnMapping::default(),
        })
    }
}

/// Association between a source member and a destination column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    /// Member name, also the label of the rows sent to the channel.
    pub source: &'static str,
    /// Member index in [`Entity::columns`].
    pub source_index: usize,
    pub destination: Cow<'static, str>,
}

/// Ordered source to destination column associations of a bulk copy.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<ColumnMap>,
}

impl ColumnMapping {
    /// One identity mapping (member name to the same column name) per member
    /// of `T`, in declaration order, except the members named in
    /// `ignore_columns` (exact match).
    pub fn for_entity<T: Entity>(ignore_columns: &[&str]) -> Self {
        Self {
            columns: T::columns()
                .iter()
                .enumerate()
                .filter(|(_, c)| !ignore_columns.contains(&c.name))
                .map(|(i, c)| ColumnMap {
                    source: c.name,
                    source_index: i,
                    destination: c.name.into(),
                })
                .collect(),
        }
    }
    pub fn push(&mut self, column: ColumnMap) {
        self.columns.push(column);
    }
    pub fn iter(&self) -> impl Iterator<Item = &ColumnMap> {
        self.columns.iter()
    }
    pub fn len(&self) -> usize {
        self.columns.len()
    }
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
    pub fn get(&self, source: &str) -> Option<&ColumnMap> {
        self.columns.iter().find(|v| v.source == source)
    }
    pub fn contains(&self, source: &str) -> bool {
        self.get(source).is_some()
    }
    pub fn destination(&self, source: &str) -> Option<&str> {
        self.get(source).map(|v| v.destination.as_ref())
    }
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|v| v.destination.as_ref())
    }
}

impl<'a> IntoIterator for &'a ColumnMapping {
    type Item = &'a ColumnMap;
    type IntoIter = std::slice::Iter<'a, ColumnMap>;
    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

/// The bulk-copy channel bound to a connection.
pub struct BulkCopy<'c, E: Executor> {
    connection: &'c mut E,
    definition: BulkCopyDef,
    mapping: ColumnMapping,
}

impl<'c, E: Executor> BulkCopy<'c, E> {
    pub fn definition(&self) -> &BulkCopyDef {
        &self.definition
    }

    pub fn column_mapping(&self) -> &ColumnMapping {
        &self.mapping
    }

    pub fn column_mapping_mut(&mut self) -> &mut ColumnMapping {
        &mut self.mapping
    }

    /// Replace the column mapping with the members of `T` minus `ignore_columns`.
    pub fn map_columns<T: Entity>(&mut self, ignore_columns: &[&str]) -> &ColumnMapping {
        self.mapping = ColumnMapping::for_entity::<T>(ignore_columns);
        &self.mapping
    }

    /// Stream the rows to the destination, returns the rows written.
    ///
    /// Rows are labeled with the mapping sources. When the driver fails part
    /// way, whatever batches it flushed already stay written.
    pub async fn write_to_server<S>(&mut self, rows: S) -> Result<RowsAffected>
    where
        S: Stream<Item = Result<RowLabeled>> + Send,
    {
        if self.mapping.is_empty() {
            return Err(fail(
                Error::msg(format!(
                    "No column is mapped for the bulk copy into `{}`",
                    self.definition
                )),
                Failure::BulkLoad,
            ));
        }
        log::debug!(
            "Bulk copy into `{}` of columns {}",
            self.definition,
            self.mapping
                .destinations()
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.connection
            .write_bulk(&self.definition, &self.mapping, rows)
            .await
            .map_err(|e| {
                fail(
                    e.context(format!("While copying rows into `{}`", self.definition)),
                    Failure::BulkLoad,
                )
            })
    }
}
