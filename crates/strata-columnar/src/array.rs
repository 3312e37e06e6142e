#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::error::{Error, Result};
use crate::types::{DataType, TimeUnit, Value};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

macro_rules! concat_primitive {
    ($arrays:expr, $total:expr, $data_type:expr, $variant:ident) => {{
        let mut out = Vec::with_capacity($total);
        for array in $arrays {
            let ValueBuffer::$variant(values) = &array.values else {
                return Err(Error::type_mismatch($data_type, array.values.physical_name()));
            };
            out.extend_from_slice(&values[array.offset..array.offset + array.len]);
        }
        ValueBuffer::$variant(out.into())
    }};
}

macro_rules! collect_values {
    ($values:expr, $data_type:expr, $variant:ident) => {
        $values
            .iter()
            .map(|v| match v {
                Value::Null => Ok(None),
                Value::$variant(x) => Ok(Some(*x)),
                other => Err(Error::type_mismatch($data_type, other.type_name())),
            })
            .collect::<Result<Vec<_>>>()?
    };
}

/// Physical storage backing an [`Array`].
///
/// Temporal types reuse the integer buffers: `Date32` is stored as `Int32`,
/// `Date64` and `Timestamp` as `Int64`.
#[derive(Clone, Debug)]
pub enum ValueBuffer {
    Boolean(Arc<BitVec>),
    Int8(Arc<[i8]>),
    Int16(Arc<[i16]>),
    Int32(Arc<[i32]>),
    Int64(Arc<[i64]>),
    UInt8(Arc<[u8]>),
    UInt16(Arc<[u16]>),
    UInt32(Arc<[u32]>),
    UInt64(Arc<[u64]>),
    Float32(Arc<[f32]>),
    Float64(Arc<[f64]>),
    Utf8(Arc<[Arc<str>]>),
}

impl ValueBuffer {
    pub fn len(&self) -> usize {
        match self {
            ValueBuffer::Boolean(v) => v.len(),
            ValueBuffer::Int8(v) => v.len(),
            ValueBuffer::Int16(v) => v.len(),
            ValueBuffer::Int32(v) => v.len(),
            ValueBuffer::Int64(v) => v.len(),
            ValueBuffer::UInt8(v) => v.len(),
            ValueBuffer::UInt16(v) => v.len(),
            ValueBuffer::UInt32(v) => v.len(),
            ValueBuffer::UInt64(v) => v.len(),
            ValueBuffer::Float32(v) => v.len(),
            ValueBuffer::Float64(v) => v.len(),
            ValueBuffer::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this buffer can back an array of `data_type`.
    pub fn stores(&self, data_type: DataType) -> bool {
        matches!(
            (self, data_type),
            (ValueBuffer::Boolean(_), DataType::Boolean)
                | (ValueBuffer::Int8(_), DataType::Int8)
                | (ValueBuffer::Int16(_), DataType::Int16)
                | (ValueBuffer::Int32(_), DataType::Int32 | DataType::Date32)
                | (
                    ValueBuffer::Int64(_),
                    DataType::Int64 | DataType::Date64 | DataType::Timestamp(_)
                )
                | (ValueBuffer::UInt8(_), DataType::UInt8)
                | (ValueBuffer::UInt16(_), DataType::UInt16)
                | (ValueBuffer::UInt32(_), DataType::UInt32)
                | (ValueBuffer::UInt64(_), DataType::UInt64)
                | (ValueBuffer::Float32(_), DataType::Float32)
                | (ValueBuffer::Float64(_), DataType::Float64)
                | (ValueBuffer::Utf8(_), DataType::Utf8)
        )
    }

    fn physical_name(&self) -> &'static str {
        match self {
            ValueBuffer::Boolean(_) => "bool",
            ValueBuffer::Int8(_) => "int8",
            ValueBuffer::Int16(_) => "int16",
            ValueBuffer::Int32(_) => "int32",
            ValueBuffer::Int64(_) => "int64",
            ValueBuffer::UInt8(_) => "uint8",
            ValueBuffer::UInt16(_) => "uint16",
            ValueBuffer::UInt32(_) => "uint32",
            ValueBuffer::UInt64(_) => "uint64",
            ValueBuffer::Float32(_) => "float",
            ValueBuffer::Float64(_) => "double",
            ValueBuffer::Utf8(_) => "string",
        }
    }
}

/// An immutable, fixed-type sequence of values with an optional validity bitmap.
///
/// Buffers are reference counted: [`Array::slice`] returns a view sharing the
/// same allocation, so slicing never copies values.
#[derive(Clone, Debug)]
pub struct Array {
    data_type: DataType,
    values: ValueBuffer,
    validity: Option<Arc<BitVec>>,
    offset: usize,
    len: usize,
    null_count: usize,
}

impl Array {
    /// Build an array from a raw buffer and optional validity bitmap.
    ///
    /// `validity[i] == false` marks slot `i` as null regardless of the stored value.
    pub fn try_new(
        data_type: DataType,
        values: ValueBuffer,
        validity: Option<BitVec>,
    ) -> Result<Self> {
        if !values.stores(data_type) {
            return Err(Error::type_mismatch(data_type, values.physical_name()));
        }
        if let Some(validity) = &validity {
            if validity.len() != values.len() {
                return Err(Error::LengthMismatch {
                    expected: values.len(),
                    actual: validity.len(),
                });
            }
        }
        Ok(Self::from_parts(data_type, values, validity))
    }

    /// Caller guarantees `values.stores(data_type)` and matching validity length.
    fn from_parts(data_type: DataType, values: ValueBuffer, validity: Option<BitVec>) -> Self {
        let len = values.len();
        let validity = validity.filter(|v| !v.all_true());
        let null_count = validity
            .as_ref()
            .map(|v| v.len() - v.count_ones())
            .unwrap_or(0);
        Self {
            data_type,
            values,
            validity: validity.map(Arc::new),
            offset: 0,
            len,
            null_count,
        }
    }

    /// An array of `len` nulls.
    pub fn new_null(data_type: DataType, len: usize) -> Self {
        let values = match data_type {
            DataType::Boolean => ValueBuffer::Boolean(Arc::new(
                std::iter::repeat(false).take(len).collect(),
            )),
            DataType::Int8 => ValueBuffer::Int8(vec![0; len].into()),
            DataType::Int16 => ValueBuffer::Int16(vec![0; len].into()),
            DataType::Int32 | DataType::Date32 => ValueBuffer::Int32(vec![0; len].into()),
            DataType::Int64 | DataType::Date64 | DataType::Timestamp(_) => {
                ValueBuffer::Int64(vec![0; len].into())
            }
            DataType::UInt8 => ValueBuffer::UInt8(vec![0; len].into()),
            DataType::UInt16 => ValueBuffer::UInt16(vec![0; len].into()),
            DataType::UInt32 => ValueBuffer::UInt32(vec![0; len].into()),
            DataType::UInt64 => ValueBuffer::UInt64(vec![0; len].into()),
            DataType::Float32 => ValueBuffer::Float32(vec![0.0; len].into()),
            DataType::Float64 => ValueBuffer::Float64(vec![0.0; len].into()),
            DataType::Utf8 => ValueBuffer::Utf8(vec![Arc::<str>::from(""); len].into()),
        };
        let validity = std::iter::repeat(false).take(len).collect();
        Self::from_parts(data_type, values, Some(validity))
    }

    pub fn date32(days: Vec<Option<i32>>) -> Self {
        let (values, validity) = split_options(days);
        Self::from_parts(DataType::Date32, ValueBuffer::Int32(values), validity)
    }

    pub fn date64(millis: Vec<Option<i64>>) -> Self {
        let (values, validity) = split_options(millis);
        Self::from_parts(DataType::Date64, ValueBuffer::Int64(values), validity)
    }

    pub fn timestamp(unit: TimeUnit, values: Vec<Option<i64>>) -> Self {
        let (values, validity) = split_options(values);
        Self::from_parts(DataType::Timestamp(unit), ValueBuffer::Int64(values), validity)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// Whether slot `index` is null. Out-of-range indices report `false`.
    pub fn is_null(&self, index: usize) -> bool {
        index < self.len
            && self
                .validity
                .as_ref()
                .is_some_and(|v| !v.get(self.offset + index))
    }

    pub fn value_at(&self, index: usize) -> Result<Value> {
        if index >= self.len {
            return Err(Error::index(index, self.len));
        }
        Ok(self.cell(index))
    }

    /// Calendar date at `index` for `Date32`/`Date64`/`Timestamp` arrays.
    pub fn date_at(&self, index: usize) -> Result<Option<NaiveDate>> {
        match self.temporal_at(index)? {
            None => Ok(None),
            Some(value) => value.to_date().transpose(),
        }
    }

    /// Calendar date-time at `index` for `Date32`/`Date64`/`Timestamp` arrays.
    pub fn datetime_at(&self, index: usize) -> Result<Option<NaiveDateTime>> {
        match self.temporal_at(index)? {
            None => Ok(None),
            Some(value) => value.to_datetime().transpose(),
        }
    }

    fn temporal_at(&self, index: usize) -> Result<Option<Value>> {
        if !self.data_type.is_temporal() {
            return Err(Error::type_mismatch("temporal type", self.data_type));
        }
        let value = self.value_at(index)?;
        Ok((!value.is_null()).then_some(value))
    }

    /// Read slot `index` without a bounds check against `self.len`.
    ///
    /// Callers must ensure `index < self.len()`.
    pub(crate) fn cell(&self, index: usize) -> Value {
        if self.is_null(index) {
            return Value::Null;
        }
        let i = self.offset + index;
        match (&self.values, self.data_type) {
            (ValueBuffer::Boolean(v), _) => Value::Boolean(v.get(i)),
            (ValueBuffer::Int8(v), _) => Value::Int8(v[i]),
            (ValueBuffer::Int16(v), _) => Value::Int16(v[i]),
            (ValueBuffer::Int32(v), DataType::Date32) => Value::Date32(v[i]),
            (ValueBuffer::Int32(v), _) => Value::Int32(v[i]),
            (ValueBuffer::Int64(v), DataType::Date64) => Value::Date64(v[i]),
            (ValueBuffer::Int64(v), DataType::Timestamp(unit)) => Value::Timestamp(unit, v[i]),
            (ValueBuffer::Int64(v), _) => Value::Int64(v[i]),
            (ValueBuffer::UInt8(v), _) => Value::UInt8(v[i]),
            (ValueBuffer::UInt16(v), _) => Value::UInt16(v[i]),
            (ValueBuffer::UInt32(v), _) => Value::UInt32(v[i]),
            (ValueBuffer::UInt64(v), _) => Value::UInt64(v[i]),
            (ValueBuffer::Float32(v), _) => Value::Float32(v[i]),
            (ValueBuffer::Float64(v), _) => Value::Float64(v[i]),
            (ValueBuffer::Utf8(v), _) => Value::Utf8(v[i].clone()),
        }
    }

    pub(crate) fn buffer(&self) -> &ValueBuffer {
        &self.values
    }

    /// Position of this view's first slot within [`Array::buffer`].
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len).map(move |i| self.cell(i))
    }

    /// Zero-copy view of `len` slots starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= self.len)
            .ok_or_else(|| Error::index(offset.saturating_add(len), self.len))?;
        let start = self.offset + offset;
        let null_count = match &self.validity {
            Some(v) => len - v.count_ones_in(start, len),
            None => 0,
        };
        debug_assert!(end <= self.len);
        Ok(Self {
            data_type: self.data_type,
            values: self.values.clone(),
            validity: self.validity.clone(),
            offset: start,
            len,
            null_count,
        })
    }

    /// Physically concatenate same-typed arrays into one contiguous array.
    pub fn concat(arrays: &[Array]) -> Result<Self> {
        let Some(first) = arrays.first() else {
            return Err(Error::InvalidArgument(
                "cannot concatenate an empty list of arrays".to_owned(),
            ));
        };
        let data_type = first.data_type;
        if let Some(other) = arrays.iter().find(|a| a.data_type != data_type) {
            return Err(Error::type_mismatch(data_type, other.data_type));
        }
        if let [single] = arrays {
            if single.offset == 0 && single.len == single.values.len() {
                return Ok(single.clone());
            }
        }

        let total: usize = arrays.iter().map(|a| a.len).sum();
        let values = match &first.values {
            ValueBuffer::Boolean(_) => {
                let mut out = BitVec::with_capacity_bits(total);
                for array in arrays {
                    let ValueBuffer::Boolean(bits) = &array.values else {
                        return Err(Error::type_mismatch(data_type, array.values.physical_name()));
                    };
                    for i in array.offset..array.offset + array.len {
                        out.push(bits.get(i));
                    }
                }
                ValueBuffer::Boolean(Arc::new(out))
            }
            ValueBuffer::Int8(_) => concat_primitive!(arrays, total, data_type, Int8),
            ValueBuffer::Int16(_) => concat_primitive!(arrays, total, data_type, Int16),
            ValueBuffer::Int32(_) => concat_primitive!(arrays, total, data_type, Int32),
            ValueBuffer::Int64(_) => concat_primitive!(arrays, total, data_type, Int64),
            ValueBuffer::UInt8(_) => concat_primitive!(arrays, total, data_type, UInt8),
            ValueBuffer::UInt16(_) => concat_primitive!(arrays, total, data_type, UInt16),
            ValueBuffer::UInt32(_) => concat_primitive!(arrays, total, data_type, UInt32),
            ValueBuffer::UInt64(_) => concat_primitive!(arrays, total, data_type, UInt64),
            ValueBuffer::Float32(_) => concat_primitive!(arrays, total, data_type, Float32),
            ValueBuffer::Float64(_) => concat_primitive!(arrays, total, data_type, Float64),
            ValueBuffer::Utf8(_) => concat_primitive!(arrays, total, data_type, Utf8),
        };

        let validity = if arrays.iter().any(|a| a.null_count > 0) {
            let mut bits = BitVec::with_capacity_bits(total);
            for array in arrays {
                for i in 0..array.len {
                    bits.push(!array.is_null(i));
                }
            }
            Some(bits)
        } else {
            None
        };

        Ok(Self::from_parts(data_type, values, validity))
    }

    /// Build an array of `data_type` from cell values; `Value::Null` becomes a null slot.
    pub fn from_values(data_type: DataType, values: &[Value]) -> Result<Self> {
        let array = match data_type {
            DataType::Boolean => Array::from(collect_values!(values, data_type, Boolean)),
            DataType::Int8 => Array::from(collect_values!(values, data_type, Int8)),
            DataType::Int16 => Array::from(collect_values!(values, data_type, Int16)),
            DataType::Int32 => Array::from(collect_values!(values, data_type, Int32)),
            DataType::Int64 => Array::from(collect_values!(values, data_type, Int64)),
            DataType::UInt8 => Array::from(collect_values!(values, data_type, UInt8)),
            DataType::UInt16 => Array::from(collect_values!(values, data_type, UInt16)),
            DataType::UInt32 => Array::from(collect_values!(values, data_type, UInt32)),
            DataType::UInt64 => Array::from(collect_values!(values, data_type, UInt64)),
            DataType::Float32 => Array::from(collect_values!(values, data_type, Float32)),
            DataType::Float64 => Array::from(collect_values!(values, data_type, Float64)),
            DataType::Date32 => Array::date32(collect_values!(values, data_type, Date32)),
            DataType::Date64 => Array::date64(collect_values!(values, data_type, Date64)),
            DataType::Utf8 => {
                let strings = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Utf8(s) => Ok(Some(s.clone())),
                        other => Err(Error::type_mismatch(data_type, other.type_name())),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Array::from(strings)
            }
            DataType::Timestamp(unit) => {
                let raw = values
                    .iter()
                    .map(|v| match v {
                        Value::Null => Ok(None),
                        Value::Timestamp(u, raw) if *u == unit => Ok(Some(*raw)),
                        other => Err(Error::type_mismatch(data_type, other.type_name())),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Array::timestamp(unit, raw)
            }
        };
        Ok(array)
    }
}

/// Split `Option<T>` values into a dense buffer plus a validity bitmap.
/// The bitmap is dropped when every slot is valid.
fn split_options<T: Copy + Default>(values: Vec<Option<T>>) -> (Arc<[T]>, Option<BitVec>) {
    let validity: BitVec = values.iter().map(Option::is_some).collect();
    let dense: Vec<T> = values.into_iter().map(Option::unwrap_or_default).collect();
    let validity = (!validity.all_true()).then_some(validity);
    (dense.into(), validity)
}

macro_rules! impl_from_native {
    ($native:ty, $variant:ident, $data_type:expr) => {
        impl From<Vec<$native>> for Array {
            fn from(values: Vec<$native>) -> Self {
                Array::from_parts($data_type, ValueBuffer::$variant(values.into()), None)
            }
        }

        impl From<Vec<Option<$native>>> for Array {
            fn from(values: Vec<Option<$native>>) -> Self {
                let (values, validity) = split_options(values);
                Array::from_parts($data_type, ValueBuffer::$variant(values), validity)
            }
        }
    };
}

impl_from_native!(i8, Int8, DataType::Int8);
impl_from_native!(i16, Int16, DataType::Int16);
impl_from_native!(i32, Int32, DataType::Int32);
impl_from_native!(i64, Int64, DataType::Int64);
impl_from_native!(u8, UInt8, DataType::UInt8);
impl_from_native!(u16, UInt16, DataType::UInt16);
impl_from_native!(u32, UInt32, DataType::UInt32);
impl_from_native!(u64, UInt64, DataType::UInt64);
impl_from_native!(f32, Float32, DataType::Float32);
impl_from_native!(f64, Float64, DataType::Float64);

impl From<Vec<bool>> for Array {
    fn from(values: Vec<bool>) -> Self {
        let bits: BitVec = values.into_iter().collect();
        Array::from_parts(DataType::Boolean, ValueBuffer::Boolean(Arc::new(bits)), None)
    }
}

impl From<Vec<Option<bool>>> for Array {
    fn from(values: Vec<Option<bool>>) -> Self {
        let validity: BitVec = values.iter().map(Option::is_some).collect();
        let bits: BitVec = values.iter().map(|v| v.unwrap_or(false)).collect();
        let validity = (!validity.all_true()).then_some(validity);
        Array::from_parts(DataType::Boolean, ValueBuffer::Boolean(Arc::new(bits)), validity)
    }
}

impl From<Vec<Option<Arc<str>>>> for Array {
    fn from(values: Vec<Option<Arc<str>>>) -> Self {
        let validity: BitVec = values.iter().map(Option::is_some).collect();
        let empty: Arc<str> = Arc::from("");
        let strings: Vec<Arc<str>> = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| empty.clone()))
            .collect();
        let validity = (!validity.all_true()).then_some(validity);
        Array::from_parts(DataType::Utf8, ValueBuffer::Utf8(strings.into()), validity)
    }
}

impl From<Vec<Option<&str>>> for Array {
    fn from(values: Vec<Option<&str>>) -> Self {
        values
            .into_iter()
            .map(|v| v.map(Arc::<str>::from))
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<Vec<Option<String>>> for Array {
    fn from(values: Vec<Option<String>>) -> Self {
        values
            .into_iter()
            .map(|v| v.map(Arc::<str>::from))
            .collect::<Vec<_>>()
            .into()
    }
}

impl From<Vec<&str>> for Array {
    fn from(values: Vec<&str>) -> Self {
        values.into_iter().map(Some).collect::<Vec<_>>().into()
    }
}

impl From<Vec<String>> for Array {
    fn from(values: Vec<String>) -> Self {
        values.into_iter().map(Some).collect::<Vec<_>>().into()
    }
}

/// Logical equality: same type and same values, nulls equal to nulls.
impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.data_type == other.data_type
            && self.len == other.len
            && self.values().eq(other.values())
    }
}
