// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

#[macro_export]
/// Build an `Err(LatencyError::InvalidConfiguration)` from format arguments
macro_rules! invalid_config {
    ($($arg:tt)+) => {
        Err($crate::types::LatencyError::InvalidConfiguration(format!($($arg)+)))
    };
}

#[macro_export]
/// Build an `Err(LatencyError::MissingRequiredParameter)` for a component
macro_rules! missing_parameter {
    ($component:expr, $parameter:expr) => {
        Err($crate::types::LatencyError::MissingRequiredParameter {
            component: $component.to_string(),
            parameter: $parameter.to_string(),
        })
    };
}

/// The `LatencyError` is what should be returned in the case of an error
#[derive(Clone, Debug, PartialEq)]
pub enum LatencyError {
    /// Non-positive hardware attributes, zero group counts, negative or
    /// malformed workload sizes, duplicate names.
    InvalidConfiguration(String),

    /// A stage was built without a parameter its formula needs.
    MissingRequiredParameter {
        component: String,
        parameter: String,
    },

    /// A component names a dependency that is not part of the graph.
    MissingDependency {
        component: String,
        dependency: String,
    },

    /// The dependency edges contain a cycle; lists the unresolved components.
    GraphCycle { components: Vec<String> },

    /// A file or document could not be read or parsed.
    Parse(String),
}

impl fmt::Display for LatencyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LatencyError::InvalidConfiguration(msg) => {
                write!(f, "Error: Invalid configuration: {msg}")
            }
            LatencyError::MissingRequiredParameter {
                component,
                parameter,
            } => {
                write!(
                    f,
                    "Error: Component '{component}' is missing required parameter '{parameter}'"
                )
            }
            LatencyError::MissingDependency {
                component,
                dependency,
            } => {
                write!(
                    f,
                    "Error: Component '{component}' depends on unknown component '{dependency}'"
                )
            }
            LatencyError::GraphCycle { components } => {
                write!(
                    f,
                    "Error: Dependency cycle between components: {}",
                    components.join(", ")
                )
            }
            LatencyError::Parse(msg) => {
                write!(f, "Error: Parse failed: {msg}")
            }
        }
    }
}

impl Error for LatencyError {}

/// The LatencyResult is the return type for most estimator functions
pub type LatencyResult<T = ()> = Result<T, LatencyError>;

/// Check that a floating-point attribute is finite and strictly positive.
pub fn require_positive(what: &str, value: f64) -> LatencyResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        invalid_config!("{what} must be positive, got {value}")
    }
}

/// Check that a floating-point attribute is finite and not negative.
pub fn require_non_negative(what: &str, value: f64) -> LatencyResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        invalid_config!("{what} must not be negative, got {value}")
    }
}

/// Check that a count is non-zero.
pub fn require_non_zero(what: &str, value: usize) -> LatencyResult<usize> {
    if value == 0 {
        invalid_config!("{what} must be non-zero")
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let err = LatencyError::GraphCycle {
            components: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Error: Dependency cycle between components: a, b"
        );

        let err: LatencyResult = missing_parameter!("Camera", "n_pixels");
        assert_eq!(
            err.unwrap_err().to_string(),
            "Error: Component 'Camera' is missing required parameter 'n_pixels'"
        );
    }

    #[test]
    fn checks() {
        assert!(require_positive("scale", 0.0).is_err());
        assert!(require_positive("scale", f64::NAN).is_err());
        assert!(require_positive("scale", f64::INFINITY).is_err());
        assert_eq!(require_positive("scale", 2.0), Ok(2.0));
        assert_eq!(require_non_negative("delay", 0.0), Ok(0.0));
        assert!(require_non_negative("delay", -1.0).is_err());
        assert!(require_non_zero("group", 0).is_err());
        assert_eq!(require_non_zero("group", 4), Ok(4));
    }
}
