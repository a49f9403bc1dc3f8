use crate::{Result, RowLabeled, RowMapper, RowNames, Value};

/// Descriptor of an entity member.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Name matched against result labels and used as bulk copy source.
    pub name: &'static str,
    /// Rust field name.
    pub field: &'static str,
    /// Typed NULL describing the member type.
    pub value: Value,
    pub nullable: bool,
}

/// Typed accessor of a struct: lists its members and reads or writes them by
/// position or name without per-type code at the call site.
///
/// Usually derived:
/// ```rust,ignore
/// #[derive(Entity, Default)]
/// struct UserDto {
///     #[spool(name = "Id")]
///     id: i32,
///     #[spool(name = "Name")]
///     name: String,
/// }
/// ```
pub trait Entity {
    /// Members in declaration order. The index of a member in this slice is
    /// the index accepted by `get_column` and `set_column`.
    fn columns() -> &'static [ColumnDef];

    /// Value of the member at `index`, `None` if out of range.
    fn get_column(&self, index: usize) -> Option<Value>;

    /// Convert `value` and assign it to the member at `index`.
    fn set_column(&mut self, index: usize, value: Value) -> Result<()>;

    /// Member index for a name, exact case-sensitive match.
    fn column_index(name: &str) -> Option<usize> {
        Self::columns().iter().position(|c| c.name == name)
    }

    fn get(&self, name: &str) -> Option<Value> {
        Self::column_index(name).and_then(|i| self.get_column(i))
    }

    /// Assign a member by name, returns false if there is no such member.
    fn set(&mut self, name: &str, value: Value) -> Result<bool> {
        match Self::column_index(name) {
            Some(i) => self.set_column(i, value).map(|_| true),
            None => Ok(false),
        }
    }

    fn from_row(row: RowLabeled) -> Result<Self>
    where
        Self: Default + Sized,
    {
        RowMapper::new().map(row)
    }

    /// Every member as a labeled row.
    fn row_labeled(&self) -> RowLabeled {
        let columns = Self::columns();
        RowLabeled {
            labels: columns
                .iter()
                .map(|c| c.name.to_string())
                .collect::<RowNames>(),
            values: (0..columns.len())
                .map(|i| self.get_column(i).unwrap_or_default())
                .collect(),
        }
    }
}
