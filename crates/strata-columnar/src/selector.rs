#![forbid(unsafe_code)]

//! Row and column selectors.
//!
//! Positions are signed: negative values count back from the end, so `-1`
//! is the last row (or column). Resolution into concrete positions is a pure
//! function of the selector and the length it is applied to.

use crate::array::Array;
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::{DataType, Value};
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

/// A range of signed positions with open or closed ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
    /// Whether `end` itself is part of the range.
    pub inclusive: bool,
}

impl IndexRange {
    /// Normalize into a half-open range over `[0, len]`.
    ///
    /// The start must land in `[0, len]` after adding `len` to a negative
    /// value. The end is clamped to `len`; an end before the start yields an
    /// empty range.
    pub fn resolve(&self, len: usize) -> Result<Range<usize>> {
        let n = len as i64;
        let raw_start = self.start.unwrap_or(0);
        let start = if raw_start < 0 { raw_start.saturating_add(n) } else { raw_start };
        if !(0..=n).contains(&start) {
            return Err(Error::index(raw_start, len));
        }

        let end = match self.end {
            None => n,
            Some(raw_end) => {
                let end = if raw_end < 0 { raw_end.saturating_add(n) } else { raw_end };
                let end = if self.inclusive { end.saturating_add(1) } else { end };
                end.min(n)
            }
        };
        let end = end.max(start);
        Ok(start as usize..end as usize)
    }
}

impl From<Range<i64>> for IndexRange {
    fn from(r: Range<i64>) -> Self {
        Self {
            start: Some(r.start),
            end: Some(r.end),
            inclusive: false,
        }
    }
}

impl From<RangeInclusive<i64>> for IndexRange {
    fn from(r: RangeInclusive<i64>) -> Self {
        Self {
            start: Some(*r.start()),
            end: Some(*r.end()),
            inclusive: true,
        }
    }
}

impl From<RangeFrom<i64>> for IndexRange {
    fn from(r: RangeFrom<i64>) -> Self {
        Self {
            start: Some(r.start),
            end: None,
            inclusive: false,
        }
    }
}

impl From<RangeTo<i64>> for IndexRange {
    fn from(r: RangeTo<i64>) -> Self {
        Self {
            start: None,
            end: Some(r.end),
            inclusive: false,
        }
    }
}

impl From<RangeToInclusive<i64>> for IndexRange {
    fn from(r: RangeToInclusive<i64>) -> Self {
        Self {
            start: None,
            end: Some(r.end),
            inclusive: true,
        }
    }
}

impl From<RangeFull> for IndexRange {
    fn from(_: RangeFull) -> Self {
        Self {
            start: None,
            end: None,
            inclusive: false,
        }
    }
}

/// Resolve a signed position against `len`, requiring it to land in `[0, len)`.
pub fn resolve_index(index: i64, len: usize) -> Result<usize> {
    let n = len as i64;
    let resolved = if index < 0 { index + n } else { index };
    if (0..n).contains(&resolved) {
        Ok(resolved as usize)
    } else {
        Err(Error::index(index, len))
    }
}

/// Identifies one or more columns of a table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSelector {
    /// First column with this name.
    Name(String),
    /// Signed position.
    Index(i64),
    Range(IndexRange),
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        ColumnSelector::Name(name.to_owned())
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        ColumnSelector::Name(name)
    }
}

impl From<i64> for ColumnSelector {
    fn from(index: i64) -> Self {
        ColumnSelector::Index(index)
    }
}

macro_rules! impl_range_selector {
    ($selector:ident, $($range:ty),*) => {
        $(
            impl From<$range> for $selector {
                fn from(r: $range) -> Self {
                    $selector::Range(IndexRange::from(r))
                }
            }
        )*
    };
}

impl_range_selector!(
    ColumnSelector,
    Range<i64>,
    RangeInclusive<i64>,
    RangeFrom<i64>,
    RangeTo<i64>,
    RangeToInclusive<i64>,
    RangeFull
);

/// Resolve column selectors against a schema into column positions.
///
/// Order and duplicates are preserved. Unknown names fail with
/// [`Error::Key`]; indices outside `[-n, n)` with [`Error::Index`].
pub fn resolve_columns(selectors: &[ColumnSelector], schema: &Schema) -> Result<Vec<usize>> {
    let n = schema.len();
    let mut out = Vec::with_capacity(selectors.len());
    for selector in selectors {
        match selector {
            ColumnSelector::Name(name) => {
                out.push(schema.index_of(name).ok_or_else(|| Error::Key(name.clone()))?)
            }
            ColumnSelector::Index(index) => out.push(resolve_index(*index, n)?),
            ColumnSelector::Range(range) => out.extend(range.resolve(n)?),
        }
    }
    Ok(out)
}

/// Identifies a set of rows of a table.
#[derive(Clone, Debug)]
pub enum RowSelector {
    /// Boolean mask over every row; null entries do not select.
    Mask(Array),
    /// A single signed row position.
    Index(i64),
    Range(IndexRange),
    /// `len` consecutive rows from a signed start, clamped at the end of the table.
    FromLength(i64, usize),
}

impl From<i64> for RowSelector {
    fn from(index: i64) -> Self {
        RowSelector::Index(index)
    }
}

impl From<Array> for RowSelector {
    fn from(mask: Array) -> Self {
        RowSelector::Mask(mask)
    }
}

impl From<(i64, usize)> for RowSelector {
    fn from((from, len): (i64, usize)) -> Self {
        RowSelector::FromLength(from, len)
    }
}

impl_range_selector!(
    RowSelector,
    Range<i64>,
    RangeInclusive<i64>,
    RangeFrom<i64>,
    RangeTo<i64>,
    RangeToInclusive<i64>,
    RangeFull
);

impl RowSelector {
    /// Resolve into ordered half-open row ranges over a table of `n_rows` rows.
    pub fn resolve(&self, n_rows: usize) -> Result<Vec<Range<usize>>> {
        match self {
            RowSelector::Index(index) => {
                let row = resolve_index(*index, n_rows)?;
                Ok(vec![row..row + 1])
            }
            RowSelector::Range(range) => {
                let range = range.resolve(n_rows)?;
                Ok(if range.is_empty() { Vec::new() } else { vec![range] })
            }
            RowSelector::FromLength(from, len) => {
                let range = IndexRange {
                    start: Some(*from),
                    end: None,
                    inclusive: false,
                }
                .resolve(n_rows)?;
                let end = range.start.saturating_add(*len).min(n_rows);
                Ok(if end > range.start {
                    vec![range.start..end]
                } else {
                    Vec::new()
                })
            }
            RowSelector::Mask(mask) => mask_runs(mask, n_rows),
        }
    }
}

/// Collapse a boolean mask into runs of consecutive selected rows.
fn mask_runs(mask: &Array, n_rows: usize) -> Result<Vec<Range<usize>>> {
    if mask.data_type() != DataType::Boolean {
        return Err(Error::type_mismatch(DataType::Boolean, mask.data_type()));
    }
    if mask.len() != n_rows {
        return Err(Error::LengthMismatch {
            expected: n_rows,
            actual: mask.len(),
        });
    }

    let mut runs: Vec<Range<usize>> = Vec::new();
    for (row, value) in mask.values().enumerate() {
        if value != Value::Boolean(true) {
            continue;
        }
        match runs.last_mut() {
            Some(run) if run.end == row => run.end += 1,
            _ => runs.push(row..row + 1),
        }
    }
    Ok(runs)
}
