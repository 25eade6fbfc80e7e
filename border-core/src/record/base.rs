//! Record and its values.
use crate::error::LrrError;
use chrono::prelude::{DateTime, Local};
use std::collections::{
    hash_map::{IntoIter, Iter, Keys},
    HashMap,
};

/// A value stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f32),

    /// A timestamp with local timezone.
    DateTime(DateTime<Local>),

    /// A 1-dimensional array.
    Array1(Vec<f32>),

    /// A 2-dimensional array with its shape.
    Array2(Vec<f32>, [usize; 2]),

    /// A 3-dimensional array with its shape.
    Array3(Vec<f32>, [usize; 3]),

    /// A text value.
    String(String),
}

/// A mapping from string keys to [`RecordValue`]s.
#[derive(Debug, Clone, Default)]
pub struct Record(HashMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        Self(HashMap::from([(name.into(), RecordValue::Scalar(value))]))
    }

    /// Creates a record from a slice of key-value pairs.
    pub fn from_slice<K: Into<String> + Clone>(s: &[(K, RecordValue)]) -> Self {
        Self(
            s.iter()
                .map(|(k, v)| (k.clone().into(), v.clone()))
                .collect(),
        )
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair, overwriting an existing value of the same key.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Consumes the record and iterates over its key-value pairs.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns `true` if the record has the given key.
    pub fn contains_key(&self, k: &str) -> bool {
        self.0.contains_key(k)
    }

    /// Merges two records. Values of `record` win on duplicated keys.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Merges another record into this one in place.
    pub fn merge_inplace(&mut self, record: Record) {
        self.0.extend(record.0);
    }

    /// Gets a scalar value.
    pub fn get_scalar(&self, k: &str) -> Result<f32, LrrError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(LrrError::RecordValueTypeError("Scalar".to_string())),
            None => Err(LrrError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, LrrError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(LrrError::RecordValueTypeError("Array1".to_string())),
            None => Err(LrrError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a 3-dimensional array and its shape.
    pub fn get_array3(&self, k: &str) -> Result<(Vec<f32>, [usize; 3]), LrrError> {
        match self.0.get(k) {
            Some(RecordValue::Array3(v, s)) => Ok((v.clone(), *s)),
            Some(_) => Err(LrrError::RecordValueTypeError("Array3".to_string())),
            None => Err(LrrError::RecordKeyError(k.to_string())),
        }
    }

    /// Gets a string value.
    pub fn get_string(&self, k: &str) -> Result<String, LrrError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(LrrError::RecordValueTypeError("String".to_string())),
            None => Err(LrrError::RecordKeyError(k.to_string())),
        }
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the record has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_getters() {
        let mut record = Record::from_scalar("reward", 1.5);
        record.insert("termination", RecordValue::String("max_steps".to_string()));

        assert_eq!(record.get_scalar("reward").unwrap(), 1.5);
        assert_eq!(record.get_string("termination").unwrap(), "max_steps");
        assert!(matches!(
            record.get_scalar("termination"),
            Err(LrrError::RecordValueTypeError(_))
        ));
        assert!(matches!(
            record.get_array1("obs"),
            Err(LrrError::RecordKeyError(_))
        ));
    }

    #[test]
    fn test_merge_overwrites() {
        let a = Record::from_slice(&[
            ("x", RecordValue::Scalar(0.0)),
            ("theta", RecordValue::Scalar(0.1)),
        ]);
        let b = Record::from_scalar("theta", 0.2);

        let merged = a.merge(b);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get_scalar("theta").unwrap(), 0.2);

        let mut c = Record::empty();
        assert!(c.is_empty());
        c.merge_inplace(merged);
        assert!(c.contains_key("x"));
    }
}
