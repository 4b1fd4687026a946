//! Problem errors
//!
//! Every failure is raised while declaring or initializing a problem; the
//! evaluation methods never fail once initialization succeeded.

use musco_core::{BoundsError, ModelError, ReferenceError};
use thiserror::Error;

/// Broad class of a [`ProblemError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Inconsistent declaration (names, reference sources, arities, weights)
    Configuration,
    /// A declared name does not resolve against the model or reference data
    Binding,
    /// Endpoint bounds outside the main bounds
    Validation,
    /// Lookup by name of something never declared
    Lookup,
    /// Reading or parsing a file
    Io,
}

#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("Cannot add a {kind} if it does not have a name")]
    EmptyName { kind: &'static str },
    #[error("A {kind} with name '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },
    #[error(
        "Goal '{goal}': an in-memory reference table and reference file '{file}' \
         cannot be supplied simultaneously"
    )]
    DualReferenceSource { goal: String, file: String },
    #[error("Goal '{goal}': no reference table or reference file was supplied")]
    NoReferenceData { goal: String },
    #[error("Constraint '{name}' declares {got} equation bounds, but has {expected} equations")]
    ConstraintBoundsArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("There are {expected} parameters in this problem, but {got} values were provided")]
    ArityMismatch { expected: usize, got: usize },
    #[error("'{owner}': weight must be non-negative, but got {weight}")]
    NegativeWeight { owner: String, weight: f64 },
    #[error("Parameter '{0}' does not name any component")]
    NoParameterTarget(String),
    #[error("A problem needs at least one phase")]
    NoPhases,

    #[error("State info provided for nonexistent state '{0}'")]
    UnknownState(String),
    #[error("Control info provided for nonexistent actuator '{0}'")]
    UnknownControl(String),
    #[error("'{owner}': no frame found at path '{path}'")]
    UnknownFrame { owner: String, path: String },
    #[error(
        "Goal '{goal}': expected frame path '{path}' to match one of the column labels \
         in the reference data, but it was not found"
    )]
    MissingReferenceColumn { goal: String, path: String },
    #[error("Goal '{goal}': reference data contains redundant column label '{label}'")]
    RedundantColumn { goal: String, label: String },
    #[error("Parameter '{parameter}': {source}")]
    Parameter {
        parameter: String,
        #[source]
        source: ModelError,
    },
    #[error("Goal '{goal}': {source}")]
    Reference {
        goal: String,
        #[source]
        source: ReferenceError,
    },

    #[error(transparent)]
    InvalidBounds(#[from] BoundsError),

    #[error("No {kind} with name '{name}' found")]
    NotFound { kind: &'static str, name: String },

    #[error("Failed to read problem file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse problem: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProblemError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProblemError::EmptyName { .. }
            | ProblemError::DuplicateName { .. }
            | ProblemError::DualReferenceSource { .. }
            | ProblemError::NoReferenceData { .. }
            | ProblemError::ConstraintBoundsArity { .. }
            | ProblemError::ArityMismatch { .. }
            | ProblemError::NegativeWeight { .. }
            | ProblemError::NoParameterTarget(_)
            | ProblemError::NoPhases => ErrorCategory::Configuration,

            ProblemError::Reference {
                source: ReferenceError::Io { .. } | ReferenceError::Parse { .. },
                ..
            } => ErrorCategory::Io,

            ProblemError::UnknownState(_)
            | ProblemError::UnknownControl(_)
            | ProblemError::UnknownFrame { .. }
            | ProblemError::MissingReferenceColumn { .. }
            | ProblemError::RedundantColumn { .. }
            | ProblemError::Parameter { .. }
            | ProblemError::Reference { .. } => ErrorCategory::Binding,

            ProblemError::InvalidBounds(_) => ErrorCategory::Validation,

            ProblemError::NotFound { .. } => ErrorCategory::Lookup,

            ProblemError::Io { .. } | ProblemError::Json(_) => ErrorCategory::Io,
        }
    }

    /// Attach a goal name to a reference-data failure
    pub(crate) fn reference(goal: &str, source: ReferenceError) -> Self {
        match source {
            ReferenceError::MissingColumn(path) => ProblemError::MissingReferenceColumn {
                goal: goal.to_string(),
                path,
            },
            ReferenceError::RedundantColumn(label) => ProblemError::RedundantColumn {
                goal: goal.to_string(),
                label,
            },
            source => ProblemError::Reference {
                goal: goal.to_string(),
                source,
            },
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: &str) -> Self {
        ProblemError::NotFound {
            kind,
            name: name.to_string(),
        }
    }
}
