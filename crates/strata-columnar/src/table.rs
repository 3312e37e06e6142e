#![forbid(unsafe_code)]

use crate::chunked::ChunkedArray;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::selector::{resolve_columns, resolve_index, ColumnSelector, RowSelector};
use crate::types::Value;
use std::ops::Range;

/// An ordered collection of columns sharing one schema and one row count.
///
/// Tables are immutable: every transformation returns a new table whose
/// columns share chunk storage with the source.
#[derive(Clone, Debug)]
pub struct Table {
    schema: Schema,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Pair an explicit schema with its columns.
    ///
    /// Every column's field must equal the schema field at the same position
    /// and all columns must have the same length.
    pub fn try_new(schema: Schema, columns: Vec<Column>) -> Result<Self> {
        if schema.len() != columns.len() {
            return Err(Error::LengthMismatch {
                expected: schema.len(),
                actual: columns.len(),
            });
        }
        for (field, column) in schema.fields().iter().zip(&columns) {
            if field != column.field() {
                return Err(Error::type_mismatch(
                    describe_field(field),
                    describe_field(column.field()),
                ));
            }
        }
        let rows = common_length(&columns)?.unwrap_or(0);
        Ok(Self {
            schema,
            columns,
            rows,
        })
    }

    /// Build a table from columns, deriving the schema from their fields.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = common_length(&columns)?.unwrap_or(0);
        Ok(Self::assemble(columns, rows))
    }

    /// Build a table from `(name, data)` pairs in iteration order.
    ///
    /// Field types come from the data; a field is nullable iff its data holds a null.
    pub fn from_arrays<N, A, I>(arrays: I) -> Result<Self>
    where
        N: Into<String>,
        A: Into<ChunkedArray>,
        I: IntoIterator<Item = (N, A)>,
    {
        let columns = arrays
            .into_iter()
            .map(|(name, data)| Column::inferred(name, data))
            .collect();
        Self::from_columns(columns)
    }

    /// Callers guarantee every column has `rows` rows.
    fn assemble(columns: Vec<Column>, rows: usize) -> Self {
        let schema = columns.iter().map(|c| c.field().clone()).collect();
        Self {
            schema,
            columns,
            rows,
        }
    }

    /// A table with no columns that still reports `rows` rows.
    pub(crate) fn without_columns(rows: usize) -> Self {
        Self::assemble(Vec::new(), rows)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// First column called `name`, if any.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.schema.index_of(name).map(|i| &self.columns[i])
    }

    /// Look up a single column by name or signed position.
    ///
    /// Names fail with [`Error::Key`] when absent; positions must land in
    /// `[-n, n)`. Ranges select several columns and are rejected here; use
    /// [`Table::select_columns`] for them.
    pub fn column(&self, key: impl Into<ColumnSelector>) -> Result<&Column> {
        match key.into() {
            ColumnSelector::Name(name) => self.column_by_name(&name).ok_or(Error::Key(name)),
            ColumnSelector::Index(index) => {
                let index = resolve_index(index, self.columns.len())?;
                Ok(&self.columns[index])
            }
            ColumnSelector::Range(_) => Err(Error::InvalidArgument(
                "a range selects several columns; use select_columns".to_owned(),
            )),
        }
    }

    pub fn value_at(&self, row: usize, col: usize) -> Result<Value> {
        let column = self
            .columns
            .get(col)
            .ok_or_else(|| Error::index(col, self.columns.len()))?;
        column.value_at(row)
    }

    pub fn row(&self, row: usize) -> Result<Vec<Value>> {
        if row >= self.rows {
            return Err(Error::index(row, self.rows));
        }
        self.columns.iter().map(|c| c.value_at(row)).collect()
    }

    /// Row-major copy of every cell.
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        let mut rows: Vec<Vec<Value>> = (0..self.rows)
            .map(|_| Vec::with_capacity(self.columns.len()))
            .collect();
        for column in &self.columns {
            for (row, value) in column.data().values().enumerate() {
                rows[row].push(value);
            }
        }
        rows
    }

    /// Select columns by name, position or range, in the given order.
    ///
    /// Duplicates are kept. An empty selector list selects every column.
    pub fn select_columns<S, I>(&self, selectors: I) -> Result<Table>
    where
        S: Into<ColumnSelector>,
        I: IntoIterator<Item = S>,
    {
        self.select_columns_where(selectors, |_, _| true)
    }

    /// Like [`Table::select_columns`], then keep only candidates for which
    /// `predicate(column, position)` holds.
    ///
    /// `position` is the candidate's position in the resolved selector list,
    /// which is the column index when no selectors are given.
    pub fn select_columns_where<S, I, P>(&self, selectors: I, mut predicate: P) -> Result<Table>
    where
        S: Into<ColumnSelector>,
        I: IntoIterator<Item = S>,
        P: FnMut(&Column, usize) -> bool,
    {
        let selectors: Vec<ColumnSelector> = selectors.into_iter().map(Into::into).collect();
        let candidates: Vec<usize> = if selectors.is_empty() {
            (0..self.columns.len()).collect()
        } else {
            resolve_columns(&selectors, &self.schema)?
        };
        let columns = candidates
            .into_iter()
            .enumerate()
            .filter(|(position, index)| predicate(&self.columns[*index], *position))
            .map(|(_, index)| self.columns[index].clone())
            .collect();
        Ok(Self::assemble(columns, self.rows))
    }

    /// A table without the column named or positioned by `key`.
    pub fn remove_column(&self, key: impl Into<ColumnSelector>) -> Result<Table> {
        let index = match key.into() {
            ColumnSelector::Name(name) => self.schema.index_of(&name).ok_or(Error::Key(name))?,
            ColumnSelector::Index(index) => resolve_index(index, self.columns.len())?,
            ColumnSelector::Range(_) => {
                return Err(Error::InvalidArgument(
                    "remove_column takes a single name or position".to_owned(),
                ))
            }
        };
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, c)| c.clone())
            .collect();
        Ok(Self::assemble(columns, self.rows))
    }

    /// Add, replace or remove columns by name.
    ///
    /// When `other` names a column more than once, its last entry wins. Each
    /// entry applies to the first column with that name: no data removes it,
    /// data replaces it in place. Unmatched names with data are appended in
    /// order of first appearance; unmatched removals are ignored.
    pub fn merge(&self, other: impl Into<MergeSource>) -> Result<Table> {
        let source: MergeSource = other.into();
        let mut entries: Vec<(String, MergeEntry)> = Vec::new();
        for (name, entry) in source.entries {
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = entry,
                None => entries.push((name, entry)),
            }
        }

        let mut applied = vec![false; entries.len()];
        let mut columns = Vec::with_capacity(self.columns.len() + entries.len());
        for column in &self.columns {
            match entries.iter().position(|(name, _)| name == column.name()) {
                Some(pos) if !applied[pos] => {
                    applied[pos] = true;
                    if let MergeEntry::Replace(data) = &entries[pos].1 {
                        columns.push(data.clone());
                    }
                }
                _ => columns.push(column.clone()),
            }
        }
        for ((_, entry), applied) in entries.into_iter().zip(applied) {
            if let (false, MergeEntry::Replace(data)) = (applied, entry) {
                columns.push(data);
            }
        }

        if self.columns.is_empty() {
            return Self::from_columns(columns);
        }
        if let Some(bad) = columns.iter().find(|c| c.len() != self.rows) {
            return Err(Error::LengthMismatch {
                expected: self.rows,
                actual: bad.len(),
            });
        }
        Ok(Self::assemble(columns, self.rows))
    }

    /// Select rows. Selectors apply in order and their results are concatenated.
    ///
    /// Result columns are zero-copy views over the source chunks; chunk
    /// boundaries are kept (see [`Table::pack`]).
    pub fn slice<S, I>(&self, selectors: I) -> Result<Table>
    where
        S: Into<RowSelector>,
        I: IntoIterator<Item = S>,
    {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        let mut any = false;
        for selector in selectors {
            any = true;
            let selector: RowSelector = selector.into();
            ranges.extend(selector.resolve(self.rows)?);
        }
        if !any {
            return Err(Error::InvalidArgument(
                "slice needs at least one selector".to_owned(),
            ));
        }

        let rows = ranges.iter().map(|r| r.len()).sum();
        let columns = self
            .columns
            .iter()
            .map(|column| Ok(column.with_data(column.data().take_ranges(&ranges)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: self.schema.clone(),
            columns,
            rows,
        })
    }

    /// Repack every column into the minimal number of chunks.
    pub fn pack(&self) -> Result<Table> {
        let columns = self
            .columns
            .iter()
            .map(|column| Ok(column.with_data(column.data().pack()?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: self.schema.clone(),
            columns,
            rows: self.rows,
        })
    }

    /// Append the rows of `other`, which must share this table's schema.
    pub fn vertical_concat(&self, other: &Table) -> Result<Table> {
        Self::concat(&[self.clone(), other.clone()])
    }

    /// Stack tables sharing one schema. Chunk lists are concatenated, not copied.
    pub fn concat(tables: &[Table]) -> Result<Table> {
        let Some(first) = tables.first() else {
            return Err(Error::InvalidArgument(
                "cannot concatenate an empty list of tables".to_owned(),
            ));
        };
        if let Some(other) = tables.iter().find(|t| t.schema != first.schema) {
            return Err(Error::type_mismatch(
                describe_schema(&first.schema),
                describe_schema(&other.schema),
            ));
        }

        let columns = (0..first.columns.len())
            .map(|col| {
                let rest: Vec<&ChunkedArray> =
                    tables[1..].iter().map(|t| t.columns[col].data()).collect();
                let data = first.columns[col].data().concat(&rest)?;
                Ok(first.columns[col].with_data(data))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            schema: first.schema.clone(),
            columns,
            rows: tables.iter().map(|t| t.rows).sum(),
        })
    }
}

/// Structural equality: equal schemas and equal cell values, ignoring chunk layout.
impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
            && self.rows == other.rows
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.data() == b.data())
    }
}

/// Length shared by every column, `None` when there are no columns.
fn common_length(columns: &[Column]) -> Result<Option<usize>> {
    let Some(first) = columns.first() else {
        return Ok(None);
    };
    let rows = first.len();
    if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
        return Err(Error::LengthMismatch {
            expected: rows,
            actual: bad.len(),
        });
    }
    Ok(Some(rows))
}

fn describe_field(field: &Field) -> String {
    format!(
        "{}: {}{}",
        field.name(),
        field.data_type(),
        if field.is_nullable() { "" } else { " not null" }
    )
}

pub(crate) fn describe_schema(schema: &Schema) -> String {
    let fields: Vec<String> = schema.fields().iter().map(describe_field).collect();
    format!("[{}]", fields.join(", "))
}

#[derive(Clone, Debug)]
enum MergeEntry {
    Replace(Column),
    Remove,
}

/// The right-hand side of [`Table::merge`]: ordered `(name, data or removal)` pairs.
#[derive(Clone, Debug, Default)]
pub struct MergeSource {
    entries: Vec<(String, MergeEntry)>,
}

impl MergeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the column `name` with `data`.
    pub fn set(mut self, name: impl Into<String>, data: impl Into<ChunkedArray>) -> Self {
        let name = name.into();
        let column = Column::inferred(name.clone(), data);
        self.entries.push((name, MergeEntry::Replace(column)));
        self
    }

    /// Remove the column `name` if present.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.entries.push((name.into(), MergeEntry::Remove));
        self
    }
}

impl From<&Table> for MergeSource {
    fn from(table: &Table) -> Self {
        let entries = table
            .columns
            .iter()
            .map(|c| (c.name().to_owned(), MergeEntry::Replace(c.clone())))
            .collect();
        Self { entries }
    }
}

impl<N, A> FromIterator<(N, Option<A>)> for MergeSource
where
    N: Into<String>,
    A: Into<ChunkedArray>,
{
    fn from_iter<I: IntoIterator<Item = (N, Option<A>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(MergeSource::new(), |source, (name, data)| match data {
                Some(data) => source.set(name, data),
                None => source.remove(name),
            })
    }
}

impl<N, A> From<Vec<(N, Option<A>)>> for MergeSource
where
    N: Into<String>,
    A: Into<ChunkedArray>,
{
    fn from(entries: Vec<(N, Option<A>)>) -> Self {
        entries.into_iter().collect()
    }
}
