#![forbid(unsafe_code)]

//! Conversion between tables and Arrow record batches.
//!
//! Every binary format goes through this module: a table is cut into record
//! batches wherever any column has a chunk boundary, and batches read back
//! become the chunks of the loaded columns.

use crate::array::{Array, ValueBuffer};
use crate::chunked::ChunkedArray;
use crate::column::Column;
use crate::error::{Error, Result};
use crate::schema::{Field, Schema};
use crate::table::Table;
use crate::types::{DataType, TimeUnit};
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Date32Type, Date64Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow_array::{
    Array as _, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, RecordBatch, RecordBatchOptions, StringArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow_schema::{
    DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema, SchemaRef,
    TimeUnit as ArrowTimeUnit,
};
use std::sync::Arc;

macro_rules! primitive_to_arrow {
    ($array:expr, $values:expr, $arrow:ty) => {{
        let start = $array.offset();
        let values: Vec<_> = $values[start..start + $array.len()]
            .iter()
            .enumerate()
            .map(|(i, v)| (!$array.is_null(i)).then_some(*v))
            .collect();
        Arc::new(<$arrow>::from(values)) as ArrayRef
    }};
}

macro_rules! primitive_from_arrow {
    ($array:expr, $arrow:ty) => {
        $array.as_primitive::<$arrow>().iter().collect::<Vec<_>>()
    };
}

pub fn to_arrow_type(data_type: DataType) -> ArrowDataType {
    match data_type {
        DataType::Boolean => ArrowDataType::Boolean,
        DataType::Int8 => ArrowDataType::Int8,
        DataType::Int16 => ArrowDataType::Int16,
        DataType::Int32 => ArrowDataType::Int32,
        DataType::Int64 => ArrowDataType::Int64,
        DataType::UInt8 => ArrowDataType::UInt8,
        DataType::UInt16 => ArrowDataType::UInt16,
        DataType::UInt32 => ArrowDataType::UInt32,
        DataType::UInt64 => ArrowDataType::UInt64,
        DataType::Float32 => ArrowDataType::Float32,
        DataType::Float64 => ArrowDataType::Float64,
        DataType::Utf8 => ArrowDataType::Utf8,
        DataType::Date32 => ArrowDataType::Date32,
        DataType::Date64 => ArrowDataType::Date64,
        DataType::Timestamp(unit) => ArrowDataType::Timestamp(to_arrow_unit(unit), None),
    }
}

fn to_arrow_unit(unit: TimeUnit) -> ArrowTimeUnit {
    match unit {
        TimeUnit::Second => ArrowTimeUnit::Second,
        TimeUnit::Millisecond => ArrowTimeUnit::Millisecond,
        TimeUnit::Microsecond => ArrowTimeUnit::Microsecond,
        TimeUnit::Nanosecond => ArrowTimeUnit::Nanosecond,
    }
}

pub fn from_arrow_type(data_type: &ArrowDataType) -> Result<DataType> {
    Ok(match data_type {
        ArrowDataType::Boolean => DataType::Boolean,
        ArrowDataType::Int8 => DataType::Int8,
        ArrowDataType::Int16 => DataType::Int16,
        ArrowDataType::Int32 => DataType::Int32,
        ArrowDataType::Int64 => DataType::Int64,
        ArrowDataType::UInt8 => DataType::UInt8,
        ArrowDataType::UInt16 => DataType::UInt16,
        ArrowDataType::UInt32 => DataType::UInt32,
        ArrowDataType::UInt64 => DataType::UInt64,
        ArrowDataType::Float32 => DataType::Float32,
        ArrowDataType::Float64 => DataType::Float64,
        ArrowDataType::Utf8 | ArrowDataType::LargeUtf8 => DataType::Utf8,
        ArrowDataType::Date32 => DataType::Date32,
        ArrowDataType::Date64 => DataType::Date64,
        ArrowDataType::Timestamp(unit, _) => DataType::Timestamp(match unit {
            ArrowTimeUnit::Second => TimeUnit::Second,
            ArrowTimeUnit::Millisecond => TimeUnit::Millisecond,
            ArrowTimeUnit::Microsecond => TimeUnit::Microsecond,
            ArrowTimeUnit::Nanosecond => TimeUnit::Nanosecond,
        }),
        other => return Err(Error::type_mismatch("a supported column type", other)),
    })
}

pub fn to_arrow_schema(schema: &Schema) -> ArrowSchema {
    ArrowSchema::new(
        schema
            .fields()
            .iter()
            .map(|f| ArrowField::new(f.name(), to_arrow_type(f.data_type()), f.is_nullable()))
            .collect::<Vec<_>>(),
    )
}

pub fn from_arrow_schema(schema: &ArrowSchema) -> Result<Schema> {
    schema
        .fields()
        .iter()
        .map(|f| {
            Ok(Field::new(f.name().as_str(), from_arrow_type(f.data_type())?)
                .with_nullable(f.is_nullable()))
        })
        .collect()
}

pub fn array_to_arrow(array: &Array) -> ArrayRef {
    match (array.buffer(), array.data_type()) {
        (ValueBuffer::Boolean(bits), _) => {
            let start = array.offset();
            let values: Vec<Option<bool>> = (0..array.len())
                .map(|i| (!array.is_null(i)).then(|| bits.get(start + i)))
                .collect();
            Arc::new(BooleanArray::from(values))
        }
        (ValueBuffer::Int8(v), _) => primitive_to_arrow!(array, v, Int8Array),
        (ValueBuffer::Int16(v), _) => primitive_to_arrow!(array, v, Int16Array),
        (ValueBuffer::Int32(v), DataType::Date32) => primitive_to_arrow!(array, v, Date32Array),
        (ValueBuffer::Int32(v), _) => primitive_to_arrow!(array, v, Int32Array),
        (ValueBuffer::Int64(v), DataType::Date64) => primitive_to_arrow!(array, v, Date64Array),
        (ValueBuffer::Int64(v), DataType::Timestamp(TimeUnit::Second)) => {
            primitive_to_arrow!(array, v, TimestampSecondArray)
        }
        (ValueBuffer::Int64(v), DataType::Timestamp(TimeUnit::Millisecond)) => {
            primitive_to_arrow!(array, v, TimestampMillisecondArray)
        }
        (ValueBuffer::Int64(v), DataType::Timestamp(TimeUnit::Microsecond)) => {
            primitive_to_arrow!(array, v, TimestampMicrosecondArray)
        }
        (ValueBuffer::Int64(v), DataType::Timestamp(TimeUnit::Nanosecond)) => {
            primitive_to_arrow!(array, v, TimestampNanosecondArray)
        }
        (ValueBuffer::Int64(v), _) => primitive_to_arrow!(array, v, Int64Array),
        (ValueBuffer::UInt8(v), _) => primitive_to_arrow!(array, v, UInt8Array),
        (ValueBuffer::UInt16(v), _) => primitive_to_arrow!(array, v, UInt16Array),
        (ValueBuffer::UInt32(v), _) => primitive_to_arrow!(array, v, UInt32Array),
        (ValueBuffer::UInt64(v), _) => primitive_to_arrow!(array, v, UInt64Array),
        (ValueBuffer::Float32(v), _) => primitive_to_arrow!(array, v, Float32Array),
        (ValueBuffer::Float64(v), _) => primitive_to_arrow!(array, v, Float64Array),
        (ValueBuffer::Utf8(v), _) => {
            let start = array.offset();
            let values: Vec<Option<&str>> = v[start..start + array.len()]
                .iter()
                .enumerate()
                .map(|(i, s)| (!array.is_null(i)).then_some(&**s))
                .collect();
            Arc::new(StringArray::from(values))
        }
    }
}

pub fn array_from_arrow(array: &ArrayRef) -> Result<Array> {
    Ok(match array.data_type() {
        ArrowDataType::Boolean => Array::from(array.as_boolean().iter().collect::<Vec<_>>()),
        ArrowDataType::Int8 => Array::from(primitive_from_arrow!(array, Int8Type)),
        ArrowDataType::Int16 => Array::from(primitive_from_arrow!(array, Int16Type)),
        ArrowDataType::Int32 => Array::from(primitive_from_arrow!(array, Int32Type)),
        ArrowDataType::Int64 => Array::from(primitive_from_arrow!(array, Int64Type)),
        ArrowDataType::UInt8 => Array::from(primitive_from_arrow!(array, UInt8Type)),
        ArrowDataType::UInt16 => Array::from(primitive_from_arrow!(array, UInt16Type)),
        ArrowDataType::UInt32 => Array::from(primitive_from_arrow!(array, UInt32Type)),
        ArrowDataType::UInt64 => Array::from(primitive_from_arrow!(array, UInt64Type)),
        ArrowDataType::Float32 => Array::from(primitive_from_arrow!(array, Float32Type)),
        ArrowDataType::Float64 => Array::from(primitive_from_arrow!(array, Float64Type)),
        ArrowDataType::Utf8 => Array::from(array.as_string::<i32>().iter().collect::<Vec<_>>()),
        ArrowDataType::LargeUtf8 => {
            Array::from(array.as_string::<i64>().iter().collect::<Vec<_>>())
        }
        ArrowDataType::Date32 => Array::date32(primitive_from_arrow!(array, Date32Type)),
        ArrowDataType::Date64 => Array::date64(primitive_from_arrow!(array, Date64Type)),
        ArrowDataType::Timestamp(ArrowTimeUnit::Second, _) => Array::timestamp(
            TimeUnit::Second,
            primitive_from_arrow!(array, TimestampSecondType),
        ),
        ArrowDataType::Timestamp(ArrowTimeUnit::Millisecond, _) => Array::timestamp(
            TimeUnit::Millisecond,
            primitive_from_arrow!(array, TimestampMillisecondType),
        ),
        ArrowDataType::Timestamp(ArrowTimeUnit::Microsecond, _) => Array::timestamp(
            TimeUnit::Microsecond,
            primitive_from_arrow!(array, TimestampMicrosecondType),
        ),
        ArrowDataType::Timestamp(ArrowTimeUnit::Nanosecond, _) => Array::timestamp(
            TimeUnit::Nanosecond,
            primitive_from_arrow!(array, TimestampNanosecondType),
        ),
        other => return Err(Error::type_mismatch("a supported column type", other)),
    })
}

/// Row offsets where any column starts a new chunk, plus `0` and the row count.
fn batch_boundaries(table: &Table) -> Vec<usize> {
    let mut bounds = vec![0, table.row_count()];
    for column in table.columns() {
        let mut end = 0;
        for chunk in column.data().chunks() {
            end += chunk.len();
            bounds.push(end);
        }
    }
    bounds.sort_unstable();
    bounds.dedup();
    bounds
}

/// Cut a table into record batches along the union of its chunk boundaries.
pub fn table_to_record_batches(table: &Table) -> Result<(SchemaRef, Vec<RecordBatch>)> {
    let schema: SchemaRef = Arc::new(to_arrow_schema(table.schema()));
    let mut batches = Vec::new();
    for window in batch_boundaries(table).windows(2) {
        let (start, end) = (window[0], window[1]);
        if end <= start {
            continue;
        }
        let arrays = table
            .columns()
            .iter()
            .map(|column| {
                let region = column.data().slice(start, end - start)?.pack()?;
                let chunk = region.chunk(0).ok_or_else(|| {
                    Error::Corrupt(format!("column {} has no rows in [{start}, {end})", column.name()))
                })?;
                Ok(array_to_arrow(chunk))
            })
            .collect::<Result<Vec<_>>>()?;
        let options = RecordBatchOptions::new().with_row_count(Some(end - start));
        batches.push(RecordBatch::try_new_with_options(
            schema.clone(),
            arrays,
            &options,
        )?);
    }
    Ok((schema, batches))
}

/// Rebuild a table from record batches sharing `schema`; each batch becomes one chunk per column.
pub fn table_from_record_batches(schema: &ArrowSchema, batches: &[RecordBatch]) -> Result<Table> {
    let schema = from_arrow_schema(schema)?;
    let mut chunks: Vec<Vec<Array>> = vec![Vec::new(); schema.len()];
    for batch in batches {
        if batch.num_columns() != schema.len() {
            return Err(Error::Corrupt(format!(
                "record batch has {} columns, schema has {}",
                batch.num_columns(),
                schema.len()
            )));
        }
        if batch.num_rows() == 0 {
            continue;
        }
        for (slot, array) in chunks.iter_mut().zip(batch.columns()) {
            slot.push(array_from_arrow(array)?);
        }
    }
    if schema.is_empty() {
        return Ok(Table::without_columns(
            batches.iter().map(RecordBatch::num_rows).sum(),
        ));
    }

    let columns = schema
        .fields()
        .iter()
        .zip(chunks)
        .map(|(field, chunks)| {
            let data = ChunkedArray::try_new(field.data_type(), chunks)?;
            Column::try_new(field.clone(), data)
        })
        .collect::<Result<Vec<_>>>()?;
    Table::try_new(schema, columns)
}
