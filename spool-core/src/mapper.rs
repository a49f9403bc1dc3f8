use crate::{
    Context, Entity, Failure, Result, RowLabeled, RowNames,
    error::fail,
    stream::{Stream, StreamExt},
};
use std::{any, iter::zip, marker::PhantomData, sync::Arc};

/// Materializes rows into entities.
///
/// For every row a new `T::default()` is created and each column whose label
/// matches a member (exact, case-sensitive) is converted and assigned. Columns
/// without a member are ignored, members without a column keep their default.
///
/// The label-to-member plan is computed once per result set: rows of the
/// same result set share their labels allocation.
pub struct RowMapper<T> {
    labels: Option<RowNames>,
    plan: Box<[Option<usize>]>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity + Default> RowMapper<T> {
    pub fn new() -> Self {
        Self {
            labels: None,
            plan: Box::default(),
            _entity: PhantomData,
        }
    }

    pub fn map(&mut self, row: RowLabeled) -> Result<T> {
        if !self
            .labels
            .as_ref()
            .is_some_and(|v| Arc::ptr_eq(v, &row.labels))
        {
            self.plan = row.labels.iter().map(|v| T::column_index(v)).collect();
            self.labels = Some(row.labels.clone());
        }
        let mut result = T::default();
        let values = row.values.into_vec();
        for ((target, value), name) in zip(zip(self.plan.iter(), values), row.labels.iter()) {
            let Some(index) = target else {
                continue;
            };
            result
                .set_column(*index, value)
                .with_context(|| format!("Column `{}` of `{}`", name, any::type_name::<T>()))
                .map_err(|e| fail(e, Failure::Mapping))?;
        }
        Ok(result)
    }
}

impl<T: Entity + Default> Default for RowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazily map a stream of rows to `T`, one row at a time.
pub fn map_rows<'s, T, S>(rows: S) -> impl Stream<Item = Result<T>> + Send + 's
where
    T: Entity + Default + Send + 's,
    S: Stream<Item = Result<RowLabeled>> + Send + 's,
{
    let mut mapper = RowMapper::<T>::new();
    rows.map(move |row| row.and_then(|row| mapper.map(row)))
}
