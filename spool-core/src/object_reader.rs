use crate::{ColumnMapping, Entity, Error, Result, RowLabeled, RowNames};
use std::{any, marker::PhantomData};

/// Sequential, read-once view of a collection of entities as rows.
///
/// Each item is exposed with only the mapped members, labeled with the
/// mapping source names. Items are pulled one at a time from the source
/// iterator, nothing is buffered.
pub struct ObjectReader<'a, T: Entity + 'a, I: Iterator<Item = &'a T>> {
    items: I,
    labels: RowNames,
    indexes: Box<[usize]>,
    read: u64,
    _entity: PhantomData<&'a T>,
}

impl<'a, T: Entity + 'a, I: Iterator<Item = &'a T>> ObjectReader<'a, T, I> {
    pub fn new(items: impl IntoIterator<IntoIter = I>, mapping: &ColumnMapping) -> Self {
        Self {
            items: items.into_iter(),
            labels: mapping.iter().map(|v| v.source.to_string()).collect(),
            indexes: mapping.iter().map(|v| v.source_index).collect(),
            read: 0,
            _entity: PhantomData,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.labels
    }

    /// Number of items read so far.
    pub fn rows_read(&self) -> u64 {
        self.read
    }

    fn row_of(&self, item: &T) -> Result<RowLabeled> {
        let values = self
            .indexes
            .iter()
            .map(|&i| {
                item.get_column(i).ok_or_else(|| {
                    Error::msg(format!(
                        "Member {} does not exist in `{}`",
                        i,
                        any::type_name::<T>()
                    ))
                })
            })
            .collect::<Result<_>>()?;
        Ok(RowLabeled::new(self.labels.clone(), values))
    }
}

impl<'a, T: Entity + 'a, I: Iterator<Item = &'a T>> Iterator for ObjectReader<'a, T, I> {
    type Item = Result<RowLabeled>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.next()?;
        self.read += 1;
        Some(self.row_of(item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}
