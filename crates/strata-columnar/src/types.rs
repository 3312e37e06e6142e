#![forbid(unsafe_code)]

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::Arc;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn per_second(self) -> i64 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Millisecond => 1_000,
            TimeUnit::Microsecond => 1_000_000,
            TimeUnit::Nanosecond => 1_000_000_000,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }
}

/// Logical type of an array, field or column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Utf8,
    /// Days since the Unix epoch, stored as `i32`.
    Date32,
    /// Milliseconds since the Unix epoch, stored as `i64`.
    Date64,
    /// Time since the Unix epoch in the given unit, stored as `i64`.
    Timestamp(TimeUnit),
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            DataType::Date32 | DataType::Date64 | DataType::Timestamp(_)
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Boolean => f.write_str("bool"),
            DataType::Int8 => f.write_str("int8"),
            DataType::Int16 => f.write_str("int16"),
            DataType::Int32 => f.write_str("int32"),
            DataType::Int64 => f.write_str("int64"),
            DataType::UInt8 => f.write_str("uint8"),
            DataType::UInt16 => f.write_str("uint16"),
            DataType::UInt32 => f.write_str("uint32"),
            DataType::UInt64 => f.write_str("uint64"),
            DataType::Float32 => f.write_str("float"),
            DataType::Float64 => f.write_str("double"),
            DataType::Utf8 => f.write_str("string"),
            DataType::Date32 => f.write_str("date32[day]"),
            DataType::Date64 => f.write_str("date64[ms]"),
            DataType::Timestamp(unit) => write!(f, "timestamp[{}]", unit.suffix()),
        }
    }
}

/// A single logical cell value.
///
/// Temporal values keep their raw epoch offset; use [`Value::to_date`] and
/// [`Value::to_datetime`] for the calendar view.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Utf8(Arc<str>),
    Date32(i32),
    Date64(i64),
    Timestamp(TimeUnit, i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The type this value belongs to, or `None` for [`Value::Null`].
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt8(_) => DataType::UInt8,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Utf8(_) => DataType::Utf8,
            Value::Date32(_) => DataType::Date32,
            Value::Date64(_) => DataType::Date64,
            Value::Timestamp(unit, _) => DataType::Timestamp(*unit),
        })
    }

    pub(crate) fn type_name(&self) -> String {
        self.data_type()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "null".to_owned())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of any integral value (including raw temporal offsets).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(v) => Some(i64::from(*v)),
            Value::Int16(v) => Some(i64::from(*v)),
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            Value::UInt8(v) => Some(i64::from(*v)),
            Value::UInt16(v) => Some(i64::from(*v)),
            Value::UInt32(v) => Some(i64::from(*v)),
            Value::UInt64(v) => i64::try_from(*v).ok(),
            Value::Date32(v) => Some(i64::from(*v)),
            Value::Date64(v) | Value::Timestamp(_, v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::UInt64(v) => Some(*v as f64),
            other if other.data_type().is_some_and(DataType::is_numeric) => {
                other.as_i64().map(|v| v as f64)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(v) => Some(&**v),
            _ => None,
        }
    }

    /// Calendar date for `Date32`/`Date64`/`Timestamp` values.
    ///
    /// `Some(Err(_))` means the raw offset is outside the calendar range chrono
    /// can represent; `None` means the value is not temporal.
    pub fn to_date(&self) -> Option<crate::Result<NaiveDate>> {
        match self {
            Value::Date32(days) => Some(date32_to_date(*days)),
            Value::Date64(millis) => Some(date64_to_date(*millis)),
            Value::Timestamp(unit, v) => Some(timestamp_to_datetime(*unit, *v).map(|dt| dt.date())),
            _ => None,
        }
    }

    pub fn to_datetime(&self) -> Option<crate::Result<NaiveDateTime>> {
        match self {
            Value::Date32(days) => {
                Some(date32_to_date(*days).map(|d| d.and_time(chrono::NaiveTime::MIN)))
            }
            Value::Date64(millis) => Some(timestamp_to_datetime(TimeUnit::Millisecond, *millis)),
            Value::Timestamp(unit, v) => Some(timestamp_to_datetime(*unit, *v)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Utf8(v) => f.write_str(v),
            Value::Date32(days) => match date32_to_date(*days) {
                Ok(date) => write!(f, "{}", date.format("%Y-%m-%d")),
                Err(_) => write!(f, "{days}"),
            },
            Value::Date64(millis) => match date64_to_date(*millis) {
                Ok(date) => write!(f, "{}", date.format("%Y-%m-%d")),
                Err(_) => write!(f, "{millis}"),
            },
            Value::Timestamp(unit, v) => match timestamp_to_datetime(*unit, *v) {
                Ok(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
                Err(_) => write!(f, "{v}"),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(Arc::from(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

pub fn date32_to_date(days: i32) -> crate::Result<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or(crate::Error::TemporalOutOfRange(i64::from(days)))
}

pub fn date_to_date32(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn date64_to_date(millis: i64) -> crate::Result<NaiveDate> {
    timestamp_to_datetime(TimeUnit::Millisecond, millis).map(|dt| dt.date())
}

pub fn timestamp_to_datetime(unit: TimeUnit, value: i64) -> crate::Result<NaiveDateTime> {
    let per_second = unit.per_second();
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    u32::try_from(nanos)
        .ok()
        .and_then(|nanos| DateTime::from_timestamp(secs, nanos))
        .map(|dt| dt.naive_utc())
        .ok_or(crate::Error::TemporalOutOfRange(value))
}

/// Inverse of [`timestamp_to_datetime`]; `None` on overflow of the unit.
pub fn datetime_to_timestamp(unit: TimeUnit, dt: NaiveDateTime) -> Option<i64> {
    let utc = dt.and_utc();
    match unit {
        TimeUnit::Second => Some(utc.timestamp()),
        TimeUnit::Millisecond => Some(utc.timestamp_millis()),
        TimeUnit::Microsecond => Some(utc.timestamp_micros()),
        TimeUnit::Nanosecond => utc.timestamp_nanos_opt(),
    }
}
