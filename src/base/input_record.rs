use crate::StrError;
use serde_json::{Map, Value};

/// Holds a key-value input record (e.g., one line describing a material or an element)
///
/// Required fields are obtained with the `get_*` functions, which fail if the key is absent.
/// Optional fields are obtained with the `optional_*` functions, which return a default value.
///
/// # Examples
///
/// ```
/// use fmsim::base::InputRecord;
/// use fmsim::StrError;
///
/// fn main() -> Result<(), StrError> {
///     let ir = InputRecord::from_json(r#"{"mu": 0.5, "bsides": [0, 2]}"#)?;
///     assert_eq!(ir.get_f64("mu")?, 0.5);
///     assert_eq!(ir.optional_f64("c", 0.0)?, 0.0);
///     assert_eq!(ir.get_int_array("bsides")?, &[0, 2]);
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct InputRecord {
    fields: Map<String, Value>,
}

impl InputRecord {
    /// Allocates an empty record
    pub fn new() -> Self {
        InputRecord { fields: Map::new() }
    }

    /// Parses a record given as a JSON object
    pub fn from_json(json: &str) -> Result<Self, StrError> {
        let value: Value = serde_json::from_str(json).map_err(|_| "cannot parse input record")?;
        match value {
            Value::Object(fields) => Ok(InputRecord { fields }),
            _ => Err("input record must be a JSON object"),
        }
    }

    /// Sets a field (e.g., when writing back the record)
    pub fn set<T: Into<Value>>(&mut self, key: &str, value: T) -> &mut Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Returns whether the record contains the key or not
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns a required real number
    pub fn get_f64(&self, key: &str) -> Result<f64, StrError> {
        match self.fields.get(key) {
            Some(value) => value.as_f64().ok_or("field has wrong type"),
            None => Err("required field is missing"),
        }
    }

    /// Returns a required non-negative integer
    pub fn get_usize(&self, key: &str) -> Result<usize, StrError> {
        match self.fields.get(key) {
            Some(value) => match value.as_u64() {
                Some(v) => Ok(v as usize),
                None => Err("field has wrong type"),
            },
            None => Err("required field is missing"),
        }
    }

    /// Returns a required array of integers
    pub fn get_int_array(&self, key: &str) -> Result<Vec<i64>, StrError> {
        match self.fields.get(key) {
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_i64().ok_or("field has wrong type"))
                .collect(),
            Some(_) => Err("field has wrong type"),
            None => Err("required field is missing"),
        }
    }

    /// Returns an optional real number
    pub fn optional_f64(&self, key: &str, default: f64) -> Result<f64, StrError> {
        if self.contains(key) {
            self.get_f64(key)
        } else {
            Ok(default)
        }
    }

    /// Returns an optional non-negative integer
    pub fn optional_usize(&self, key: &str, default: usize) -> Result<usize, StrError> {
        if self.contains(key) {
            self.get_usize(key)
        } else {
            Ok(default)
        }
    }

    /// Returns an optional array of integers (empty if absent)
    pub fn optional_int_array(&self, key: &str) -> Result<Vec<i64>, StrError> {
        if self.contains(key) {
            self.get_int_array(key)
        } else {
            Ok(Vec::new())
        }
    }

    /// Returns the JSON representation of the record
    pub fn to_json(&self) -> String {
        Value::Object(self.fields.clone()).to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::InputRecord;

    #[test]
    fn from_json_captures_errors() {
        assert_eq!(InputRecord::from_json("{").err(), Some("cannot parse input record"));
        assert_eq!(
            InputRecord::from_json("[1, 2]").err(),
            Some("input record must be a JSON object")
        );
    }

    #[test]
    fn getters_work() {
        let ir = InputRecord::from_json(r#"{"mu": 1.5, "n": 3, "codes": [1, -2], "name": "x"}"#).unwrap();
        assert_eq!(ir.get_f64("mu"), Ok(1.5));
        assert_eq!(ir.get_f64("n"), Ok(3.0));
        assert_eq!(ir.get_usize("n"), Ok(3));
        assert_eq!(ir.get_int_array("codes"), Ok(vec![1, -2]));
        assert_eq!(ir.get_f64("name").err(), Some("field has wrong type"));
        assert_eq!(ir.get_usize("mu").err(), Some("field has wrong type"));
        assert_eq!(ir.get_int_array("mu").err(), Some("field has wrong type"));
        assert_eq!(ir.get_f64("c").err(), Some("required field is missing"));
        assert_eq!(ir.get_usize("c").err(), Some("required field is missing"));
        assert_eq!(ir.get_int_array("c").err(), Some("required field is missing"));
        assert_eq!(ir.optional_f64("c", 7.0), Ok(7.0));
        assert_eq!(ir.optional_usize("c", 7), Ok(7));
        assert_eq!(ir.optional_int_array("c"), Ok(Vec::new()));
        assert_eq!(ir.optional_f64("mu", 7.0), Ok(1.5));
    }

    #[test]
    fn set_and_to_json_work() {
        let mut ir = InputRecord::new();
        ir.set("mu", 2.0).set("averagingtype", 3);
        let copy = InputRecord::from_json(&ir.to_json()).unwrap();
        assert_eq!(copy.get_f64("mu"), Ok(2.0));
        assert_eq!(copy.get_usize("averagingtype"), Ok(3));
    }
}
