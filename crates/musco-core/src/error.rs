//! Error types for the core value types and collaborator interfaces

use thiserror::Error;

/// Violations of bound construction or endpoint-bound containment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("Expected lower bound <= upper bound, but lower bound={lower}, upper bound={upper}")]
    Inverted { lower: f64, upper: f64 },
    #[error("Bounds must be numbers, but got lower bound={lower}, upper bound={upper}")]
    NotANumber { lower: f64, upper: f64 },
    #[error(
        "For variable {variable}, expected [initial value lower bound] >= [lower bound], \
         but initial value lower bound={initial}, lower bound={lower}"
    )]
    InitialLowerBelow {
        variable: String,
        initial: f64,
        lower: f64,
    },
    #[error(
        "For variable {variable}, expected [final value lower bound] >= [lower bound], \
         but final value lower bound={final_}, lower bound={lower}"
    )]
    FinalLowerBelow {
        variable: String,
        final_: f64,
        lower: f64,
    },
    #[error(
        "For variable {variable}, expected [initial value upper bound] <= [upper bound], \
         but initial value upper bound={initial}, upper bound={upper}"
    )]
    InitialUpperAbove {
        variable: String,
        initial: f64,
        upper: f64,
    },
    #[error(
        "For variable {variable}, expected [final value upper bound] <= [upper bound], \
         but final value upper bound={final_}, upper bound={upper}"
    )]
    FinalUpperAbove {
        variable: String,
        final_: f64,
        upper: f64,
    },
}

impl BoundsError {
    /// Name of the variable whose bounds are inconsistent, if any
    pub fn variable(&self) -> Option<&str> {
        match self {
            BoundsError::Inverted { .. } | BoundsError::NotANumber { .. } => None,
            BoundsError::InitialLowerBelow { variable, .. }
            | BoundsError::FinalLowerBelow { variable, .. }
            | BoundsError::InitialUpperAbove { variable, .. }
            | BoundsError::FinalUpperAbove { variable, .. } => Some(variable),
        }
    }
}

/// Failures reported by a model while binding names to model entities
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("No frame found at path '{0}'")]
    UnknownFrame(String),
    #[error("Component '{component}' has no scalar property '{property}'")]
    UnknownProperty { component: String, property: String },
    #[error("Cannot set property '{property}' of component '{component}' to {value}")]
    NonFiniteProperty {
        component: String,
        property: String,
        value: f64,
    },
}

/// Failures while building or reading reference data
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Column '{label}' has {got} rows, but the table has {expected} time points")]
    ColumnLength {
        label: String,
        expected: usize,
        got: usize,
    },
    #[error(
        "Expected column label '{0}' to match one of the labels in the reference data, \
         but it was not found"
    )]
    MissingColumn(String),
    #[error("Reference data contains redundant column label '{0}'")]
    RedundantColumn(String),
    #[error("Time must be strictly increasing, but t[{index}]={time} follows {previous}")]
    NonIncreasingTime {
        index: usize,
        previous: f64,
        time: f64,
    },
    #[error("Time must be finite, but t[{index}]={time}")]
    NonFiniteTime { index: usize, time: f64 },
    #[error("Cannot build an interpolant for '{0}' without samples")]
    EmptySeries(String),
    #[error("Row {row} has {got} columns, but the table declares {expected} labels")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("Failed to read reference file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse reference file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
