#![forbid(unsafe_code)]

//! Delimited text import and export.
//!
//! Text carries no type information, so reading infers a [`DataType`] per
//! column from a sample of rows unless [`CsvOptions::schema`] pins one.
//! Narrow numeric types do not survive a round trip: integers come back as
//! `int64` and floats as `double` (or `int64` when every value is integral).

use crate::array::Array;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::table::Table;
use crate::types::{date_to_date32, datetime_to_timestamp, DataType, TimeUnit, Value};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::io::{Read, Write};
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Options for reading and writing delimited text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// First record holds column names. Without one, columns are named `f0`, `f1`, ...
    pub has_header: bool,
    /// Number of data rows examined when inferring column types.
    pub sample_rows: usize,
    /// Skip inference and parse every column as the given field's type.
    pub schema: Option<Schema>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            sample_rows: 1000,
            schema: None,
        }
    }
}

pub fn write_csv<W: Write>(table: &Table, writer: W, options: &CsvOptions) -> Result<W> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    if options.has_header {
        writer
            .write_record(table.schema().names())
            .map_err(|e| map_csv_error(e, 1))?;
    }

    let mut columns: Vec<_> = table.columns().iter().map(|c| c.data().values()).collect();
    let mut record: Vec<String> = Vec::with_capacity(columns.len());
    for row in 0..table.row_count() {
        record.clear();
        record.extend(
            columns
                .iter_mut()
                .map(|values| values.next().map(|v| v.to_string()).unwrap_or_default()),
        );
        writer
            .write_record(&record)
            .map_err(|e| map_csv_error(e, row as u64 + 1))?;
    }

    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

pub fn read_csv<R: Read>(reader: R, options: &CsvOptions) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        // Headers are handled here so row numbers in errors count every record.
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records: Vec<StringRecord> = Vec::new();
    let mut record = StringRecord::new();
    let mut record_index: u64 = 0;
    loop {
        match csv_reader.read_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                records.push(record.clone());
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    let (header, rows): (Option<&StringRecord>, &[StringRecord]) = if options.has_header {
        match records.split_first() {
            Some((header, rows)) => (Some(header), rows),
            None => (None, &[]),
        }
    } else {
        (None, &records[..])
    };
    // Row numbers reported in errors are 1-based and include the header line.
    let first_row: u64 = if header.is_some() { 2 } else { 1 };

    let schema = match &options.schema {
        Some(schema) => schema.clone(),
        None => {
            let names: Vec<String> = match header {
                Some(header) => header.iter().map(str::to_owned).collect(),
                None => {
                    let width = rows.iter().map(StringRecord::len).max().unwrap_or(0);
                    (0..width).map(|i| format!("f{i}")).collect()
                }
            };
            let sample = &rows[..rows.len().min(options.sample_rows)];
            names
                .into_iter()
                .enumerate()
                .map(|(i, name)| {
                    let data_type = infer_type(sample.iter().map(|r| r.get(i).unwrap_or("")));
                    Field::new(name, data_type)
                })
                .collect()
        }
    };

    let width = schema.len();
    let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); width];
    let mut widest_extra = 0usize;
    for (offset, row) in rows.iter().enumerate() {
        let row_number = first_row + offset as u64;
        if row.len() > width {
            widest_extra = widest_extra.max(row.len() - width);
        }
        for (i, field) in schema.fields().iter().enumerate() {
            let raw = row.get(i).unwrap_or("");
            cells[i].push(parse_field(raw, field.data_type(), row_number)?);
        }
    }
    if widest_extra > 0 {
        log::warn!(
            "csv rows carry up to {widest_extra} field(s) beyond the {width} column(s); extra fields dropped"
        );
    }

    let columns = schema
        .fields()
        .iter()
        .zip(cells)
        .map(|(field, values)| {
            let data = Array::from_values(field.data_type(), &values)?;
            if options.schema.is_some() {
                Column::try_new(field.clone(), data)
            } else {
                Ok(Column::inferred(field.name(), data))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    match options.schema {
        Some(_) => Table::try_new(schema, columns),
        None => Table::from_columns(columns),
    }
}

/// Pick the narrowest type every non-empty sample parses as.
///
/// Candidates are tried in order: `int64`, `double`, `bool` (`true`/`false`),
/// `date32` (`YYYY-MM-DD`), and finally `string`. A column with no non-empty
/// samples is `string`.
pub fn infer_type<'a, I>(samples: I) -> DataType
where
    I: IntoIterator<Item = &'a str>,
{
    let mut saw_value = false;
    let mut is_int = true;
    let mut is_float = true;
    let mut is_bool = true;
    let mut is_date = true;

    for sample in samples {
        let v = sample.trim();
        if v.is_empty() {
            continue;
        }
        saw_value = true;
        is_int &= v.parse::<i64>().is_ok();
        is_float &= parse_float(v).is_some();
        is_bool &= parse_bool(v).is_some();
        is_date &= NaiveDate::parse_from_str(v, DATE_FORMAT).is_ok();
        if !(is_int || is_float || is_bool || is_date) {
            break;
        }
    }

    if !saw_value {
        DataType::Utf8
    } else if is_int {
        DataType::Int64
    } else if is_float {
        DataType::Float64
    } else if is_bool {
        DataType::Boolean
    } else if is_date {
        DataType::Date32
    } else {
        DataType::Utf8
    }
}

fn parse_field(raw: &str, data_type: DataType, row: u64) -> Result<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    if data_type == DataType::Utf8 {
        return Ok(Value::Utf8(Arc::from(raw)));
    }

    let v = raw.trim();
    if v.is_empty() {
        return Ok(Value::Null);
    }
    let parsed = match data_type {
        DataType::Boolean => parse_bool(v).map(Value::Boolean),
        DataType::Int8 => v.parse().ok().map(Value::Int8),
        DataType::Int16 => v.parse().ok().map(Value::Int16),
        DataType::Int32 => v.parse().ok().map(Value::Int32),
        DataType::Int64 => v.parse().ok().map(Value::Int64),
        DataType::UInt8 => v.parse().ok().map(Value::UInt8),
        DataType::UInt16 => v.parse().ok().map(Value::UInt16),
        DataType::UInt32 => v.parse().ok().map(Value::UInt32),
        DataType::UInt64 => v.parse().ok().map(Value::UInt64),
        DataType::Float32 => v.parse().ok().map(Value::Float32),
        DataType::Float64 => parse_float(v).map(Value::Float64),
        DataType::Date32 => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .ok()
            .map(|d| Value::Date32(date_to_date32(d))),
        DataType::Date64 => NaiveDate::parse_from_str(v, DATE_FORMAT)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .and_then(|dt| datetime_to_timestamp(TimeUnit::Millisecond, dt))
            .map(Value::Date64),
        DataType::Timestamp(unit) => parse_datetime(v)
            .and_then(|dt| datetime_to_timestamp(unit, dt))
            .map(|raw| Value::Timestamp(unit, raw)),
        DataType::Utf8 => Some(Value::Utf8(Arc::from(raw))),
    };
    parsed.ok_or_else(|| Error::Csv {
        row,
        reason: format!("cannot parse {v:?} as {data_type}"),
    })
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Rejects the textual specials (`inf`, `NaN`) that `f64::from_str` accepts.
fn parse_float(v: &str) -> Option<f64> {
    if !v.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    v.parse().ok()
}

fn parse_datetime(v: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(v, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(v, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(v, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> Error {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => Error::Io(e),
        _ => {
            let row = pos.map(|p| p.record() + 1).unwrap_or(fallback_row);
            Error::Csv { row, reason }
        }
    }
}
