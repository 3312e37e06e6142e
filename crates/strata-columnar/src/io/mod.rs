#![forbid(unsafe_code)]

//! Saving and loading tables.
//!
//! Binary formats are Arrow-based: [`FileFormat::Batch`] is the Arrow IPC
//! file format, [`FileFormat::Stream`] the IPC stream format and
//! [`FileFormat::Parquet`] a Parquet file. [`FileFormat::Csv`] is delimited
//! text. Loading without an explicit format sniffs the leading bytes.

pub mod arrow;
pub mod csv;
pub mod ipc;
pub mod parquet;

pub use self::csv::{infer_type, CsvOptions};
pub use self::ipc::StreamTableWriter;

use crate::error::Result;
use crate::table::Table;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const IPC_FILE_MAGIC: &[u8] = b"ARROW1";
const IPC_CONTINUATION: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
const PARQUET_MAGIC: &[u8] = b"PAR1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// Arrow IPC file format.
    #[default]
    Batch,
    /// Arrow IPC stream format.
    Stream,
    Csv,
    Parquet,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub format: FileFormat,
    pub csv: CsvOptions,
}

impl SaveOptions {
    pub fn with_format(format: FileFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// `None` detects the format from the content.
    pub format: Option<FileFormat>,
    pub csv: CsvOptions,
}

impl LoadOptions {
    pub fn with_format(format: FileFormat) -> Self {
        Self {
            format: Some(format),
            ..Self::default()
        }
    }
}

/// Guess the format of `bytes` from its leading magic; anything unrecognized is CSV.
pub fn detect_format(bytes: &[u8]) -> FileFormat {
    let format = if bytes.starts_with(IPC_FILE_MAGIC) {
        FileFormat::Batch
    } else if bytes.starts_with(IPC_CONTINUATION) {
        FileFormat::Stream
    } else if bytes.starts_with(PARQUET_MAGIC) {
        FileFormat::Parquet
    } else {
        FileFormat::Csv
    };
    log::trace!(
        "detected {format:?} from {} leading byte(s)",
        bytes.len().min(8)
    );
    format
}

/// Encode `table` into `writer`, returning the writer once everything is flushed.
pub fn write_table<W: Write + Send>(writer: W, table: &Table, options: &SaveOptions) -> Result<W> {
    match options.format {
        FileFormat::Batch => ipc::write_file(table, writer),
        FileFormat::Stream => ipc::write_stream(table, writer),
        FileFormat::Csv => csv::write_csv(table, writer, &options.csv),
        FileFormat::Parquet => parquet::write_parquet(table, writer),
    }
}

/// Decode a table from an in-memory buffer.
pub fn read_table(bytes: Vec<u8>, options: &LoadOptions) -> Result<Table> {
    let format = match options.format {
        Some(format) => format,
        None => detect_format(&bytes),
    };
    match format {
        FileFormat::Batch => ipc::read_file(bytes),
        FileFormat::Stream => ipc::read_stream(bytes),
        FileFormat::Csv => csv::read_csv(bytes.as_slice(), &options.csv),
        FileFormat::Parquet => parquet::read_parquet(bytes),
    }
}

impl Table {
    /// Write this table to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        log::debug!(
            "saving {} row(s) x {} column(s) to {} as {:?}",
            self.row_count(),
            self.column_count(),
            path.display(),
            options.format
        );
        let file = BufWriter::new(File::create(path)?);
        let mut file = write_table(file, self, options)?;
        file.flush()?;
        Ok(())
    }

    /// Read a table from `path`. The whole file is read before decoding, so a
    /// failure never yields a partial table.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Table> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let table = read_table(bytes, options)?;
        log::debug!(
            "loaded {} row(s) x {} column(s) from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }

    pub fn save_default(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path, &SaveOptions::default())
    }

    pub fn load_default(path: impl AsRef<Path>) -> Result<Table> {
        Self::load(path, &LoadOptions::default())
    }
}
