#![forbid(unsafe_code)]

use crate::chunked::ChunkedArray;
use crate::error::{Error, Result};
use crate::schema::Field;
use crate::types::{DataType, Value};

/// A [`Field`] bound to its data; the unit of storage inside a table.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    field: Field,
    data: ChunkedArray,
}

impl Column {
    pub fn try_new(field: Field, data: impl Into<ChunkedArray>) -> Result<Self> {
        let data = data.into();
        if data.data_type() != field.data_type() {
            return Err(Error::type_mismatch(field.data_type(), data.data_type()));
        }
        Ok(Self { field, data })
    }

    /// Column whose field is inferred from the data (see [`Field::infer`]).
    pub fn inferred(name: impl Into<String>, data: impl Into<ChunkedArray>) -> Self {
        let data = data.into();
        Self {
            field: Field::infer(name, &data),
            data,
        }
    }

    pub fn name(&self) -> &str {
        self.field.name()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn data(&self) -> &ChunkedArray {
        &self.data
    }

    pub fn data_type(&self) -> DataType {
        self.field.data_type()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn n_chunks(&self) -> usize {
        self.data.n_chunks()
    }

    pub fn value_at(&self, index: usize) -> Result<Value> {
        self.data.value_at(index)
    }

    /// Same field, different data. The caller keeps the type invariant.
    pub(crate) fn with_data(&self, data: ChunkedArray) -> Self {
        debug_assert_eq!(data.data_type(), self.field.data_type());
        Self {
            field: self.field.clone(),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Array;

    #[test]
    fn try_new_checks_declared_type() {
        let field = Field::new("count", DataType::UInt8);
        let err = Column::try_new(field.clone(), Array::from(vec![1i32])).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let column = Column::try_new(field, Array::from(vec![1u8, 2])).unwrap();
        assert_eq!(column.name(), "count");
        assert_eq!(column.len(), 2);
        assert_eq!(column.value_at(1).unwrap(), Value::UInt8(2));
    }
}
