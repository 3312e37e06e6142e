//! Immutable, chunked, columnar tables.
//!
//! This crate focuses on:
//! - Typed arrays with validity bitmaps and zero-copy slicing over shared buffers.
//! - Chunked columns that keep their chunk layout through transformations.
//! - Table transformations (row slicing, column selection, merge, removal, packing).
//! - Persistence through Arrow IPC (file and stream), Parquet and CSV.

#![forbid(unsafe_code)]

mod array;
mod bitmap;
mod chunked;
mod column;
mod error;
pub mod io;
mod schema;
mod selector;
mod table;
mod types;

pub use crate::array::{Array, ValueBuffer};
pub use crate::bitmap::BitVec;
pub use crate::chunked::ChunkedArray;
pub use crate::column::Column;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::io::{
    detect_format, infer_type, read_table, write_table, CsvOptions, FileFormat, LoadOptions,
    SaveOptions, StreamTableWriter,
};
pub use crate::schema::{Field, Schema};
pub use crate::selector::{resolve_index, ColumnSelector, IndexRange, RowSelector};
pub use crate::table::{MergeSource, Table};
pub use crate::types::{
    date32_to_date, date64_to_date, date_to_date32, datetime_to_timestamp, timestamp_to_datetime,
    DataType, TimeUnit, Value,
};
