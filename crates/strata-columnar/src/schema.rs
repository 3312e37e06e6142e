#![forbid(unsafe_code)]

use crate::chunked::ChunkedArray;
use crate::types::DataType;

/// A named, typed column descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Field {
    /// A nullable field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Derive a field from its data: type from the array, nullable iff any slot is null.
    pub fn infer(name: impl Into<String>, data: &ChunkedArray) -> Self {
        Self::new(name, data.data_type()).with_nullable(data.null_count() > 0)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Ordered fields describing a table's shape. Duplicate names are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// Position of the first field called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field_with_name(&self, name: &str) -> Option<&Field> {
        self.index_of(name).map(|i| &self.fields[i])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Array;

    #[test]
    fn duplicate_names_resolve_to_first_match() {
        let schema = Schema::new(vec![
            Field::new("a", DataType::Int64),
            Field::new("b", DataType::Utf8),
            Field::new("a", DataType::Boolean),
        ]);
        assert_eq!(schema.index_of("a"), Some(0));
        assert_eq!(
            schema.field_with_name("a").map(Field::data_type),
            Some(DataType::Int64)
        );
        assert_eq!(schema.index_of("z"), None);
    }

    #[test]
    fn infer_derives_nullability_from_data() {
        let dense = ChunkedArray::from(Array::from(vec![1u8, 2]));
        let sparse = ChunkedArray::from(Array::from(vec![Some(true), None]));
        assert!(!Field::infer("x", &dense).is_nullable());
        assert!(Field::infer("y", &sparse).is_nullable());
        assert_eq!(Field::infer("y", &sparse).data_type(), DataType::Boolean);
    }
}
