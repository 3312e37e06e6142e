#![forbid(unsafe_code)]

use crate::array::Array;
use crate::error::{Error, Result};
use crate::types::{DataType, Value};
use std::ops::Range;

/// An ordered sequence of same-typed [`Array`] chunks presented as one logical column.
#[derive(Clone, Debug)]
pub struct ChunkedArray {
    data_type: DataType,
    chunks: Vec<Array>,
    /// `starts[i]` is the logical row at which chunk `i` begins; the final entry is the length.
    starts: Vec<usize>,
}

impl ChunkedArray {
    pub fn try_new(data_type: DataType, chunks: Vec<Array>) -> Result<Self> {
        if let Some(bad) = chunks.iter().find(|c| c.data_type() != data_type) {
            return Err(Error::type_mismatch(data_type, bad.data_type()));
        }
        Ok(Self::from_parts(data_type, chunks))
    }

    /// Build from a non-empty chunk list, taking the type from the first chunk.
    pub fn from_chunks(chunks: Vec<Array>) -> Result<Self> {
        let Some(first) = chunks.first() else {
            return Err(Error::InvalidArgument(
                "a chunked array needs at least one chunk to infer its type".to_owned(),
            ));
        };
        Self::try_new(first.data_type(), chunks)
    }

    /// A chunked array with no chunks at all.
    pub fn empty(data_type: DataType) -> Self {
        Self::from_parts(data_type, Vec::new())
    }

    fn from_parts(data_type: DataType, chunks: Vec<Array>) -> Self {
        let mut starts = Vec::with_capacity(chunks.len() + 1);
        let mut total = 0usize;
        starts.push(0);
        for chunk in &chunks {
            total += chunk.len();
            starts.push(total);
        }
        Self {
            data_type,
            chunks,
            starts,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, index: usize) -> Option<&Array> {
        self.chunks.get(index)
    }

    pub fn chunks(&self) -> &[Array] {
        &self.chunks
    }

    pub fn null_count(&self) -> usize {
        self.chunks.iter().map(Array::null_count).sum()
    }

    /// Resolve a logical row to `(chunk_index, offset_in_chunk)`.
    pub fn locate(&self, index: usize) -> Result<(usize, usize)> {
        let len = self.len();
        if index >= len {
            return Err(Error::index(index, len));
        }
        // Last chunk starting at or before `index`; empty chunks share their
        // start with the next chunk and are skipped this way.
        let chunk = self.starts.partition_point(|&start| start <= index) - 1;
        Ok((chunk, index - self.starts[chunk]))
    }

    pub fn value_at(&self, index: usize) -> Result<Value> {
        let (chunk, offset) = self.locate(index)?;
        Ok(self.chunks[chunk].cell(offset))
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.chunks.iter().flat_map(|chunk| chunk.values())
    }

    /// Zero-copy view of `len` rows starting at `offset`.
    ///
    /// The result holds one chunk per source chunk the range touches.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        let total = self.len();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= total)
            .ok_or_else(|| Error::index(offset.saturating_add(len), total))?;
        let mut chunks = Vec::new();
        self.push_range(offset..end, &mut chunks)?;
        Ok(Self::from_parts(self.data_type, chunks))
    }

    /// Concatenate zero-copy views over each row range, in order.
    pub(crate) fn take_ranges(&self, ranges: &[Range<usize>]) -> Result<Self> {
        let mut chunks = Vec::new();
        for range in ranges {
            if range.end > self.len() {
                return Err(Error::index(range.end, self.len()));
            }
            self.push_range(range.clone(), &mut chunks)?;
        }
        Ok(Self::from_parts(self.data_type, chunks))
    }

    fn push_range(&self, range: Range<usize>, out: &mut Vec<Array>) -> Result<()> {
        if range.is_empty() {
            return Ok(());
        }
        let first = self.starts.partition_point(|&start| start <= range.start) - 1;
        for (chunk_idx, chunk) in self.chunks.iter().enumerate().skip(first) {
            let chunk_start = self.starts[chunk_idx];
            if chunk_start >= range.end {
                break;
            }
            let lo = range.start.max(chunk_start) - chunk_start;
            let hi = range.end.min(chunk_start + chunk.len()) - chunk_start;
            if hi > lo {
                out.push(chunk.slice(lo, hi - lo)?);
            }
        }
        Ok(())
    }

    /// Physically concatenate every chunk into a single chunk.
    ///
    /// An empty array packs to zero chunks.
    pub fn pack(&self) -> Result<Self> {
        if self.is_empty() {
            return Ok(Self::empty(self.data_type));
        }
        let non_empty: Vec<Array> = self
            .chunks
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect();
        let packed = Array::concat(&non_empty)?;
        Ok(Self::from_parts(self.data_type, vec![packed]))
    }

    /// Append the chunks of `others` after this array's chunks.
    pub fn concat(&self, others: &[&ChunkedArray]) -> Result<Self> {
        let mut chunks = self.chunks.clone();
        for other in others {
            if other.data_type != self.data_type {
                return Err(Error::type_mismatch(self.data_type, other.data_type));
            }
            chunks.extend(other.chunks.iter().cloned());
        }
        Ok(Self::from_parts(self.data_type, chunks))
    }
}

impl From<Array> for ChunkedArray {
    fn from(array: Array) -> Self {
        Self::from_parts(array.data_type(), vec![array])
    }
}

/// Logical equality: chunk layout is ignored.
impl PartialEq for ChunkedArray {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type
            && self.len() == other.len()
            && self.values().eq(other.values())
    }
}
