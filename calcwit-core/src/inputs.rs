//! Circuit input documents.
//!
//! Inputs are keyed by the name of a main-component signal. Values may be
//! JSON integers, decimal strings (for numbers wider than 64 bits or
//! negative values), or arbitrarily nested arrays, which are flattened in
//! row-major order to match the signal's array layout.

use num_bigint::BigInt;
use serde_json::Value;

use crate::error::InputError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inputs {
    entries: Vec<(String, Vec<BigInt>)>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the flattened values of input `name`.
    pub fn insert<V: Into<BigInt>>(&mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) {
        let name = name.into();
        let values: Vec<BigInt> = values.into_iter().map(Into::into).collect();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((name, values)),
        }
    }

    pub fn with<V: Into<BigInt>>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.insert(name, values);
        self
    }

    /// Parse a JSON object such as `{"a": 3, "b": ["4", [5, 6]]}`.
    pub fn from_json(text: &str) -> Result<Self, InputError> {
        let doc: Value = serde_json::from_str(text).map_err(|e| InputError::Json(e.to_string()))?;
        let Value::Object(map) = doc else {
            return Err(InputError::NotAnObject(kind_of(&doc)));
        };
        let mut inputs = Inputs::new();
        for (name, value) in map {
            let mut values = Vec::new();
            flatten(&name, &value, &mut values)?;
            inputs.entries.push((name, values));
        }
        Ok(inputs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BigInt])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten(name: &str, value: &Value, out: &mut Vec<BigInt>) -> Result<(), InputError> {
    match value {
        Value::Number(n) => {
            let v = if let Some(i) = n.as_i64() {
                BigInt::from(i)
            } else if let Some(u) = n.as_u64() {
                BigInt::from(u)
            } else {
                return Err(InputError::InvalidNumber {
                    name: name.to_string(),
                    literal: n.to_string(),
                });
            };
            out.push(v);
        }
        Value::String(s) => {
            let v = s.trim().parse::<BigInt>().map_err(|_| InputError::InvalidNumber {
                name: name.to_string(),
                literal: s.clone(),
            })?;
            out.push(v);
        }
        Value::Array(items) => {
            for item in items {
                flatten(name, item, out)?;
            }
        }
        other => {
            return Err(InputError::UnsupportedValue {
                name: name.to_string(),
                found: kind_of(other),
            })
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
