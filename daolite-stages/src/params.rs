// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Untyped stage parameters as they appear in pipeline descriptions.
//!
//! A [`ParamMap`] is turned into the typed parameters of a stage with a
//! [`ParamReader`], which reports missing required parameters and rejects
//! names the stage does not know.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use daolite_engine::types::LatencyResult;
use daolite_engine::{invalid_config, missing_parameter};
use serde::{Deserialize, Serialize};

/// Largest float that is read as a count; above this not every integer can
/// be represented.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// A single parameter value.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(values: Vec<i64>) -> Self {
        ParamValue::List(values.into_iter().map(ParamValue::Integer).collect())
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{v}"),
            ParamValue::Integer(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v}"),
            ParamValue::List(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Named parameters of one component.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Build a [`ParamMap`] from `name => value` pairs.
///
/// # Example
///
/// ```rust
/// let params = daolite_stages::params! { "n_pixels" => 1024, "scale" => 2.0 };
/// assert_eq!(params.len(), 2);
/// ```
#[macro_export]
macro_rules! params {
    ($($name:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::params::ParamMap::new();
        $(
            map.insert($name.to_string(), $crate::params::ParamValue::from($value));
        )*
        map
    }};
}

/// Reads typed values out of a [`ParamMap`] for one component.
pub struct ParamReader<'a> {
    component: &'a str,
    params: &'a ParamMap,
    known: BTreeSet<&'static str>,
}

impl<'a> ParamReader<'a> {
    #[must_use]
    pub fn new(component: &'a str, params: &'a ParamMap) -> Self {
        Self {
            component,
            params,
            known: BTreeSet::new(),
        }
    }

    fn get(&mut self, name: &'static str) -> Option<&'a ParamValue> {
        self.known.insert(name);
        self.params.get(name)
    }

    fn wrong_type<T>(&self, name: &str, expected: &str, value: &ParamValue) -> LatencyResult<T> {
        invalid_config!(
            "Component '{}' parameter '{name}' should be {expected}, got '{value}'",
            self.component
        )
    }

    fn to_count(&self, name: &str, value: &ParamValue) -> LatencyResult<usize> {
        match value {
            ParamValue::Integer(v) if *v >= 0 => Ok(*v as usize),
            ParamValue::Float(v) if *v >= 0.0 && *v <= MAX_EXACT_COUNT && v.fract() == 0.0 => {
                Ok(*v as usize)
            }
            _ => self.wrong_type(name, "a non-negative integer", value),
        }
    }

    /// A non-negative integer that must be present.
    pub fn required_count(&mut self, name: &'static str) -> LatencyResult<usize> {
        match self.count(name)? {
            Some(v) => Ok(v),
            None => missing_parameter!(self.component, name),
        }
    }

    /// An optional non-negative integer.
    pub fn count(&mut self, name: &'static str) -> LatencyResult<Option<usize>> {
        match self.get(name) {
            Some(value) => self.to_count(name, value).map(Some),
            None => Ok(None),
        }
    }

    /// An optional number.
    pub fn number(&mut self, name: &'static str) -> LatencyResult<Option<f64>> {
        match self.get(name) {
            Some(ParamValue::Integer(v)) => Ok(Some(*v as f64)),
            Some(ParamValue::Float(v)) => Ok(Some(*v)),
            Some(value) => self.wrong_type(name, "a number", value),
            None => Ok(None),
        }
    }

    /// An optional boolean flag.
    pub fn flag(&mut self, name: &'static str) -> LatencyResult<Option<bool>> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(value) => self.wrong_type(name, "true or false", value),
            None => Ok(None),
        }
    }

    /// An optional string.
    pub fn text(&mut self, name: &'static str) -> LatencyResult<Option<&'a str>> {
        match self.get(name) {
            Some(ParamValue::Text(v)) => Ok(Some(v.as_str())),
            Some(value) => self.wrong_type(name, "a string", value),
            None => Ok(None),
        }
    }

    /// An optional list of non-negative integers.
    pub fn counts(&mut self, name: &'static str) -> LatencyResult<Option<Vec<usize>>> {
        match self.get(name) {
            Some(ParamValue::List(values)) => values
                .iter()
                .map(|v| self.to_count(name, v))
                .collect::<LatencyResult<Vec<_>>>()
                .map(Some),
            Some(value) => self.wrong_type(name, "a list of non-negative integers", value),
            None => Ok(None),
        }
    }

    /// Check that every parameter given was one the stage reads.
    pub fn finish(self) -> LatencyResult {
        for name in self.params.keys() {
            if !self.known.contains(name.as_str()) {
                return invalid_config!(
                    "Component '{}' has unknown parameter '{name}'",
                    self.component
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads() {
        let params = crate::params! {
            "a" => 3,
            "b" => 2.0,
            "c" => true,
            "d" => "pco_camlink",
            "e" => vec![1, 0, 2],
        };
        let mut reader = ParamReader::new("comp", &params);
        assert_eq!(reader.required_count("a").unwrap(), 3);
        assert_eq!(reader.count("b").unwrap(), Some(2));
        assert_eq!(reader.flag("c").unwrap(), Some(true));
        assert_eq!(reader.text("d").unwrap(), Some("pco_camlink"));
        assert_eq!(reader.counts("e").unwrap(), Some(vec![1, 0, 2]));
        assert_eq!(reader.number("missing").unwrap(), None);
        reader.finish().unwrap();
    }

    #[test]
    fn wrong_types() {
        let params = crate::params! { "a" => -1, "b" => 2.5, "c" => 1 };
        let mut reader = ParamReader::new("comp", &params);
        assert!(reader.count("a").is_err());
        assert!(reader.count("b").is_err());
        assert!(reader.flag("c").is_err());
    }

    #[test]
    fn float_counts() {
        let params = crate::params! { "a" => 4096.0, "b" => 1.0e20, "c" => f64::INFINITY };
        let mut reader = ParamReader::new("comp", &params);
        assert_eq!(reader.count("a").unwrap(), Some(4096));
        assert_eq!(
            reader.count("b").unwrap_err().to_string(),
            "Error: Invalid configuration: Component 'comp' parameter 'b' should be a \
             non-negative integer, got '100000000000000000000'"
        );
        assert!(reader.count("c").is_err());
    }

    #[test]
    fn missing_and_unknown() {
        let params = crate::params! { "typo" => 1 };
        let mut reader = ParamReader::new("comp", &params);
        let err = reader.required_count("n_pixels").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Component 'comp' is missing required parameter 'n_pixels'"
        );
        let err = reader.finish().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Invalid configuration: Component 'comp' has unknown parameter 'typo'"
        );
    }
}
