#![forbid(unsafe_code)]

use super::arrow::{table_from_record_batches, table_to_record_batches};
use crate::error::Result;
use crate::table::Table;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use std::io::Write;

/// Encode `table` as a single Parquet file; each record batch becomes a row group slice.
pub fn write_parquet<W: Write + Send>(table: &Table, writer: W) -> Result<W> {
    let (schema, batches) = table_to_record_batches(table)?;
    let mut writer = ArrowWriter::try_new(writer, schema, None)?;
    for batch in &batches {
        writer.write(batch)?;
    }
    Ok(writer.into_inner()?)
}

pub fn read_parquet(bytes: Vec<u8>) -> Result<Table> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    table_from_record_batches(&schema, &batches)
}
