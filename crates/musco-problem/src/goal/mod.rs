//! Goals (cost terms)
//!
//! A [`Goal`] is a declaration: it names its targets by path and owns its
//! configuration. [`Goal::initialize`] binds it to a model and yields a
//! [`BoundGoal`] whose integrand the solver evaluates repeatedly:
//!
//! ```text
//! J = Σ_goals w_goal ∫ integrand(t, x(t)) dt
//! ```
//!
//! - [`AccelerationTrackingGoal`]: weighted squared error between model and
//!   reference frame accelerations
//! - [`ControlEffortGoal`]: weighted sum of squared controls

mod acceleration_tracking;
mod control_effort;

pub use acceleration_tracking::*;
pub use control_effort::*;

use std::fmt;

use musco_core::{Model, Stage, State};
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// Default weight of goals and weight entries
pub const DEFAULT_WEIGHT: f64 = 1.0;

pub(crate) fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// Weight for one named target (frame path, actuator path)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    pub name: String,
    pub weight: f64,
}

/// Insert or replace the weight for `name`
pub(crate) fn upsert_weight(weights: &mut Vec<WeightEntry>, name: String, weight: f64) {
    match weights.iter_mut().find(|w| w.name == name) {
        Some(entry) => entry.weight = weight,
        None => weights.push(WeightEntry { name, weight }),
    }
}

pub(crate) fn check_weight(owner: &str, weight: f64) -> Result<f64, ProblemError> {
    if weight < 0.0 || weight.is_nan() {
        return Err(ProblemError::NegativeWeight {
            owner: owner.to_string(),
            weight,
        });
    }
    Ok(weight)
}

/// Declared goal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Goal {
    AccelerationTracking(AccelerationTrackingGoal),
    ControlEffort(ControlEffortGoal),
}

impl Goal {
    pub fn name(&self) -> &str {
        match self {
            Goal::AccelerationTracking(g) => g.name(),
            Goal::ControlEffort(g) => g.name(),
        }
    }

    /// Bind to `model`; all resolution failures surface here
    pub fn initialize(&self, model: &dyn Model) -> Result<BoundGoal, ProblemError> {
        Ok(match self {
            Goal::AccelerationTracking(g) => BoundGoal::AccelerationTracking(g.initialize(model)?),
            Goal::ControlEffort(g) => BoundGoal::ControlEffort(g.initialize(model)?),
        })
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::AccelerationTracking(g) => fmt::Display::fmt(g, f),
            Goal::ControlEffort(g) => fmt::Display::fmt(g, f),
        }
    }
}

impl From<AccelerationTrackingGoal> for Goal {
    fn from(goal: AccelerationTrackingGoal) -> Self {
        Goal::AccelerationTracking(goal)
    }
}

impl From<ControlEffortGoal> for Goal {
    fn from(goal: ControlEffortGoal) -> Self {
        Goal::ControlEffort(goal)
    }
}

/// Goal bound to a model, ready for evaluation
///
/// Immutable after initialization; evaluation only touches the caller's
/// [`State`].
#[derive(Debug, Clone)]
pub enum BoundGoal {
    AccelerationTracking(AccelerationTracker),
    ControlEffort(ControlEffort),
}

impl BoundGoal {
    pub fn name(&self) -> &str {
        match self {
            BoundGoal::AccelerationTracking(g) => g.name(),
            BoundGoal::ControlEffort(g) => g.name(),
        }
    }

    /// Minimum stage the state is realized to before evaluation
    pub fn stage(&self) -> Stage {
        match self {
            BoundGoal::AccelerationTracking(_) => Stage::Acceleration,
            BoundGoal::ControlEffort(_) => Stage::Velocity,
        }
    }

    /// Number of integral outputs
    pub fn num_integrals(&self) -> usize {
        1
    }

    /// Weighted integrand at the state's time
    pub fn calc_integrand(&self, model: &dyn Model, state: &mut State) -> f64 {
        model.realize(state, self.stage());
        match self {
            BoundGoal::AccelerationTracking(g) => g.calc_integrand(model, state),
            BoundGoal::ControlEffort(g) => g.calc_integrand(state),
        }
    }
}

impl fmt::Display for BoundGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundGoal::AccelerationTracking(g) => fmt::Display::fmt(g, f),
            BoundGoal::ControlEffort(g) => fmt::Display::fmt(g, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_weight() {
        let mut weights = Vec::new();
        upsert_weight(&mut weights, "/a".to_string(), 2.0);
        upsert_weight(&mut weights, "/b".to_string(), 1.0);
        upsert_weight(&mut weights, "/a".to_string(), 3.0);
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].weight, 3.0);
    }

    #[test]
    fn test_check_weight() {
        assert_eq!(check_weight("g", 0.0).unwrap(), 0.0);
        assert!(matches!(
            check_weight("g", -1.0),
            Err(ProblemError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn test_goal_serde_tag() {
        let goal = Goal::from(ControlEffortGoal::new("effort"));
        let json = serde_json::to_string(&goal).unwrap();
        assert!(json.contains(r#""type":"control_effort""#));
        let back: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name(), "effort");
    }
}
