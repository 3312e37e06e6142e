#![forbid(unsafe_code)]

//! Arrow IPC framing for the batch (file) and stream formats.

use super::arrow::{table_from_record_batches, table_to_record_batches, to_arrow_schema};
use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::table::{describe_schema, Table};
use arrow_ipc::reader::{FileReader, StreamReader};
use arrow_ipc::writer::{FileWriter, StreamWriter};
use std::io::{Cursor, Write};

pub fn write_file<W: Write>(table: &Table, writer: W) -> Result<W> {
    let (schema, batches) = table_to_record_batches(table)?;
    let mut writer = FileWriter::try_new(writer, &schema)?;
    for batch in &batches {
        writer.write(batch)?;
    }
    writer.finish()?;
    Ok(writer.into_inner()?)
}

pub fn read_file(bytes: Vec<u8>) -> Result<Table> {
    let reader = FileReader::try_new(Cursor::new(bytes), None)?;
    let schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    table_from_record_batches(&schema, &batches)
}

pub fn write_stream<W: Write>(table: &Table, writer: W) -> Result<W> {
    let mut writer = StreamTableWriter::try_new(writer, table.schema())?;
    writer.write(table)?;
    writer.finish()
}

pub fn read_stream(bytes: Vec<u8>) -> Result<Table> {
    let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
    let schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    table_from_record_batches(&schema, &batches)
}

/// Incrementally appends tables sharing one schema to an IPC stream.
///
/// Reading the stream back yields a single table holding every appended row,
/// with one chunk per written record batch.
pub struct StreamTableWriter<W: Write> {
    writer: StreamWriter<W>,
    schema: Schema,
}

impl<W: Write> StreamTableWriter<W> {
    pub fn try_new(writer: W, schema: &Schema) -> Result<Self> {
        let writer = StreamWriter::try_new(writer, &to_arrow_schema(schema))?;
        Ok(Self {
            writer,
            schema: schema.clone(),
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn write(&mut self, table: &Table) -> Result<()> {
        if table.schema() != &self.schema {
            return Err(Error::type_mismatch(
                describe_schema(&self.schema),
                describe_schema(table.schema()),
            ));
        }
        let (_, batches) = table_to_record_batches(table)?;
        for batch in &batches {
            self.writer.write(batch)?;
        }
        Ok(())
    }

    /// Write the end-of-stream marker and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.finish()?;
        Ok(self.writer.into_inner()?)
    }
}
