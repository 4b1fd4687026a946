//! Optimal control problem
//!
//! A [`Problem`] is an ordered list of phases. It always has at least one;
//! the convenience mutators and lookups act on the first phase.

use std::fmt;
use std::path::Path;

use musco_core::{Bounds, FinalBounds, InitialBounds, Model, VariableInfo};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::ProblemError;
use crate::goal::Goal;
use crate::parameter::Parameter;
use crate::path_constraint::PathConstraint;
use crate::phase::{BoundPhase, Phase};

/// Deserializing a `Problem` runs the same declaration checks as
/// [`Problem::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ProblemDecl")]
pub struct Problem {
    phases: Vec<Phase>,
}

/// Serialized form, checked by [`Problem::validate`] on conversion
#[derive(Deserialize)]
pub(crate) struct ProblemDecl {
    #[serde(default = "single_phase")]
    phases: Vec<Phase>,
}

fn single_phase() -> Vec<Phase> {
    vec![Phase::default()]
}

impl TryFrom<ProblemDecl> for Problem {
    type Error = ProblemError;

    fn try_from(decl: ProblemDecl) -> Result<Self, Self::Error> {
        let problem = Self {
            phases: decl.phases,
        };
        problem.validate()?;
        Ok(problem)
    }
}

impl Default for Problem {
    fn default() -> Self {
        Self {
            phases: single_phase(),
        }
    }
}

impl Problem {
    /// Problem with one empty phase
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(text: &str) -> Result<Self, ProblemError> {
        config::problem_from_json(text)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProblemError> {
        config::problem_from_file(path)
    }

    pub fn to_json_string(&self) -> Result<String, ProblemError> {
        config::problem_to_json(self)
    }

    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Result<&Phase, ProblemError> {
        self.phases
            .get(index)
            .ok_or_else(|| ProblemError::not_found("phase", &index.to_string()))
    }

    pub fn phase_mut(&mut self, index: usize) -> Result<&mut Phase, ProblemError> {
        self.phases
            .get_mut(index)
            .ok_or_else(|| ProblemError::not_found("phase", &index.to_string()))
    }

    pub fn add_phase(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn first(&self) -> &Phase {
        &self.phases[0]
    }

    fn first_mut(&mut self) -> &mut Phase {
        &mut self.phases[0]
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.first_mut().set_model_name(name);
    }

    pub fn set_time_bounds(&mut self, initial: InitialBounds, final_: FinalBounds) {
        self.first_mut().set_time_bounds(initial, final_);
    }

    pub fn set_state_info(
        &mut self,
        name: &str,
        bounds: Bounds,
        initial: InitialBounds,
        final_: FinalBounds,
    ) -> Result<(), ProblemError> {
        self.first_mut().set_state_info(name, bounds, initial, final_)
    }

    pub fn set_control_info(
        &mut self,
        name: &str,
        bounds: Bounds,
        initial: InitialBounds,
        final_: FinalBounds,
    ) -> Result<(), ProblemError> {
        self.first_mut().set_control_info(name, bounds, initial, final_)
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), ProblemError> {
        self.first_mut().add_parameter(parameter)
    }

    pub fn add_goal(&mut self, goal: impl Into<Goal>) -> Result<(), ProblemError> {
        self.first_mut().add_goal(goal)
    }

    pub fn add_path_constraint(
        &mut self,
        constraint: impl Into<PathConstraint>,
    ) -> Result<(), ProblemError> {
        self.first_mut().add_path_constraint(constraint)
    }

    pub fn set_multibody_constraint_bounds(&mut self, bounds: Bounds) {
        self.first_mut().set_multibody_constraint_bounds(bounds);
    }

    pub fn set_multiplier_bounds(&mut self, bounds: Bounds) {
        self.first_mut().set_multiplier_bounds(bounds);
    }

    pub fn state_info(&self, name: &str) -> Result<&VariableInfo, ProblemError> {
        self.first().state_info(name)
    }

    pub fn control_info(&self, name: &str) -> Result<&VariableInfo, ProblemError> {
        self.first().control_info(name)
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter, ProblemError> {
        self.first().parameter(name)
    }

    pub fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, ProblemError> {
        self.first_mut().parameter_mut(name)
    }

    pub fn goal(&self, name: &str) -> Result<&Goal, ProblemError> {
        self.first().goal(name)
    }

    pub fn goal_mut(&mut self, name: &str) -> Result<&mut Goal, ProblemError> {
        self.first_mut().goal_mut(name)
    }

    pub fn path_constraint(&self, name: &str) -> Result<&PathConstraint, ProblemError> {
        self.first().path_constraint(name)
    }

    pub fn state_info_names(&self) -> Vec<String> {
        self.first().state_info_names()
    }

    pub fn control_info_names(&self) -> Vec<String> {
        self.first().control_info_names()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.first().parameter_names()
    }

    pub fn goal_names(&self) -> Vec<String> {
        self.first().goal_names()
    }

    pub fn path_constraint_names(&self) -> Vec<String> {
        self.first().path_constraint_names()
    }

    /// Apply parameter values of the first phase to `model`
    pub fn apply_parameters_to_model(
        &self,
        values: &[f64],
        model: &mut dyn Model,
    ) -> Result<(), ProblemError> {
        self.first().apply_parameters_to_model(values, model)
    }

    pub fn validate(&self) -> Result<(), ProblemError> {
        if self.phases.is_empty() {
            return Err(ProblemError::NoPhases);
        }
        self.phases.iter().try_for_each(Phase::validate)
    }

    /// Bind every phase to `model`
    pub fn initialize(&self, model: &dyn Model) -> Result<BoundProblem, ProblemError> {
        let phases = self
            .phases
            .iter()
            .map(|phase| phase.initialize(model))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BoundProblem { phases })
    }
}

fn write_phases<T: fmt::Display>(f: &mut fmt::Formatter<'_>, phases: &[T]) -> fmt::Result {
    if phases.len() > 1 {
        writeln!(f, "Number of phases: {}", phases.len())?;
        for (i, phase) in phases.iter().enumerate() {
            writeln!(f, "Phase {}:", i)?;
            write!(f, "{}", phase)?;
        }
        Ok(())
    } else {
        phases.iter().try_for_each(|phase| write!(f, "{}", phase))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_phases(f, &self.phases)
    }
}

/// A problem whose phases are bound to a model
#[derive(Debug, Clone)]
pub struct BoundProblem {
    phases: Vec<BoundPhase>,
}

impl BoundProblem {
    pub fn num_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn phases(&self) -> &[BoundPhase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Result<&BoundPhase, ProblemError> {
        self.phases
            .get(index)
            .ok_or_else(|| ProblemError::not_found("phase", &index.to_string()))
    }
}

impl fmt::Display for BoundProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_phases(f, &self.phases)
    }
}
