//! Problem configuration
//!
//! Bound policies shared by every multibody constraint of a phase, and
//! loading/saving whole problems as JSON.

use std::fs;
use std::path::Path;

use musco_core::Bounds;
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;
use crate::problem::{Problem, ProblemDecl};

/// Default magnitude of the Lagrange multiplier bounds
pub const DEFAULT_MULTIPLIER_BOUND: f64 = 1000.0;

/// Bounds applied uniformly to multibody constraints and their multipliers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintPolicy {
    /// Bounds on every scalar multibody-constraint equation
    pub multibody_constraint_bounds: Bounds,
    /// Bounds on every Lagrange multiplier
    pub multiplier_bounds: Bounds,
}

impl Default for ConstraintPolicy {
    fn default() -> Self {
        Self {
            // Constraint equations are enforced exactly
            multibody_constraint_bounds: Bounds::fixed(0.0),
            multiplier_bounds: Bounds::symmetric(DEFAULT_MULTIPLIER_BOUND),
        }
    }
}

/// Parse a problem from JSON and validate its declarations
pub fn problem_from_json(text: &str) -> Result<Problem, ProblemError> {
    let decl: ProblemDecl = serde_json::from_str(text)?;
    Problem::try_from(decl)
}

/// Read a problem from a JSON file and validate its declarations
pub fn problem_from_file(path: impl AsRef<Path>) -> Result<Problem, ProblemError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ProblemError::Io {
        path: path.display().to_string(),
        source,
    })?;
    problem_from_json(&text)
}

/// Serialize a problem to pretty-printed JSON
///
/// In-memory reference tables are not part of the output; only reference
/// file paths are.
pub fn problem_to_json(problem: &Problem) -> Result<String, ProblemError> {
    Ok(serde_json::to_string_pretty(problem)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ConstraintPolicy::default();
        assert!(policy.multibody_constraint_bounds.is_equality());
        assert_eq!(policy.multibody_constraint_bounds.lower(), Some(0.0));
        assert_eq!(policy.multiplier_bounds.lower(), Some(-1000.0));
        assert_eq!(policy.multiplier_bounds.upper(), Some(1000.0));
    }

    #[test]
    fn test_partial_policy_uses_defaults() {
        let policy: ConstraintPolicy =
            serde_json::from_str(r#"{"multiplier_bounds": [-50.0, 50.0]}"#).unwrap();
        assert_eq!(policy.multiplier_bounds.upper(), Some(50.0));
        assert!(policy.multibody_constraint_bounds.is_equality());
    }

    #[test]
    fn test_missing_problem_file() {
        let err = problem_from_file("/nonexistent/problem.json").unwrap_err();
        assert!(matches!(err, ProblemError::Io { .. }));
    }
}
