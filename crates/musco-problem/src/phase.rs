//! Phase declaration and binding
//!
//! A [`Phase`] declares one trajectory segment of an optimal control
//! problem:
//!
//! ```text
//! minimize    Σ_goals ∫ integrand(t, x, u, p) dt
//! subject to  model dynamics and multibody constraints (multipliers λ)
//!             lb ≤ g(t, x, u, p) ≤ ub     (path constraints)
//!             bounds on t₀, t_f, x, u, p, λ
//! ```
//!
//! [`Phase::initialize`] resolves every declared name against a model and
//! returns a [`BoundPhase`] that a transcription scheme evaluates.

use std::collections::HashMap;
use std::fmt;

use musco_core::{
    Bounds, FinalBounds, InitialBounds, Model, ModelId, State, VariableInfo,
};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ConstraintPolicy;
use crate::error::ProblemError;
use crate::goal::{BoundGoal, Goal};
use crate::multibody::MultibodyConstraint;
use crate::parameter::Parameter;
use crate::path_constraint::{BoundPathConstraint, ConstraintEvaluation, PathConstraint};

/// Declaration of one phase
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase {
    /// Name of the model this phase is meant for
    model_name: String,
    time_initial_bounds: InitialBounds,
    time_final_bounds: FinalBounds,
    state_infos: Vec<VariableInfo>,
    control_infos: Vec<VariableInfo>,
    parameters: Vec<Parameter>,
    goals: Vec<Goal>,
    path_constraints: Vec<PathConstraint>,
    constraint_policy: ConstraintPolicy,
}

/// Fail if `name` is empty or already among `existing`
fn check_new_name<'a>(
    kind: &'static str,
    name: &str,
    mut existing: impl Iterator<Item = &'a str>,
) -> Result<(), ProblemError> {
    if name.is_empty() {
        return Err(ProblemError::EmptyName { kind });
    }
    if existing.any(|n| n == name) {
        return Err(ProblemError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Insert `info` or replace the entry with the same name in place
fn upsert_info(infos: &mut Vec<VariableInfo>, info: VariableInfo) {
    match infos.iter_mut().find(|i| i.name() == info.name()) {
        Some(slot) => *slot = info,
        None => infos.push(info),
    }
}

impl Phase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn set_model_name(&mut self, name: impl Into<String>) {
        self.model_name = name.into();
    }

    pub fn set_time_bounds(&mut self, initial: InitialBounds, final_: FinalBounds) {
        self.time_initial_bounds = initial;
        self.time_final_bounds = final_;
    }

    pub fn time_initial_bounds(&self) -> InitialBounds {
        self.time_initial_bounds
    }

    pub fn time_final_bounds(&self) -> FinalBounds {
        self.time_final_bounds
    }

    /// Set bounds of the state variable `name`, replacing earlier bounds
    ///
    /// The endpoint bounds must lie within the main bounds; on failure the
    /// phase is left unchanged.
    pub fn set_state_info(
        &mut self,
        name: &str,
        bounds: Bounds,
        initial: InitialBounds,
        final_: FinalBounds,
    ) -> Result<(), ProblemError> {
        let info = VariableInfo::new(name, bounds, initial, final_)?;
        upsert_info(&mut self.state_infos, info);
        Ok(())
    }

    /// Set bounds of the control for the actuator at `name`
    pub fn set_control_info(
        &mut self,
        name: &str,
        bounds: Bounds,
        initial: InitialBounds,
        final_: FinalBounds,
    ) -> Result<(), ProblemError> {
        let info = VariableInfo::new(name, bounds, initial, final_)?;
        upsert_info(&mut self.control_infos, info);
        Ok(())
    }

    pub fn add_parameter(&mut self, parameter: Parameter) -> Result<(), ProblemError> {
        check_new_name(
            "parameter",
            parameter.name(),
            self.parameters.iter().map(Parameter::name),
        )?;
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn add_goal(&mut self, goal: impl Into<Goal>) -> Result<(), ProblemError> {
        let goal = goal.into();
        check_new_name("goal", goal.name(), self.goals.iter().map(Goal::name))?;
        self.goals.push(goal);
        Ok(())
    }

    pub fn add_path_constraint(
        &mut self,
        constraint: impl Into<PathConstraint>,
    ) -> Result<(), ProblemError> {
        let constraint = constraint.into();
        check_new_name(
            "path constraint",
            constraint.name(),
            self.path_constraints.iter().map(PathConstraint::name),
        )?;
        self.path_constraints.push(constraint);
        Ok(())
    }

    /// Bounds on every scalar multibody-constraint equation
    pub fn set_multibody_constraint_bounds(&mut self, bounds: Bounds) {
        self.constraint_policy.multibody_constraint_bounds = bounds;
    }

    /// Bounds on every Lagrange multiplier
    pub fn set_multiplier_bounds(&mut self, bounds: Bounds) {
        self.constraint_policy.multiplier_bounds = bounds;
    }

    pub fn constraint_policy(&self) -> &ConstraintPolicy {
        &self.constraint_policy
    }

    pub fn state_info(&self, name: &str) -> Result<&VariableInfo, ProblemError> {
        self.state_infos
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| ProblemError::not_found("state info", name))
    }

    pub fn control_info(&self, name: &str) -> Result<&VariableInfo, ProblemError> {
        self.control_infos
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| ProblemError::not_found("control info", name))
    }

    pub fn parameter(&self, name: &str) -> Result<&Parameter, ProblemError> {
        self.parameters
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| ProblemError::not_found("parameter", name))
    }

    /// Renaming through this reference can create duplicate names;
    /// [`Phase::validate`] reports them.
    pub fn parameter_mut(&mut self, name: &str) -> Result<&mut Parameter, ProblemError> {
        self.parameters
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ProblemError::not_found("parameter", name))
    }

    pub fn goal(&self, name: &str) -> Result<&Goal, ProblemError> {
        self.goals
            .iter()
            .find(|g| g.name() == name)
            .ok_or_else(|| ProblemError::not_found("goal", name))
    }

    pub fn goal_mut(&mut self, name: &str) -> Result<&mut Goal, ProblemError> {
        self.goals
            .iter_mut()
            .find(|g| g.name() == name)
            .ok_or_else(|| ProblemError::not_found("goal", name))
    }

    pub fn path_constraint(&self, name: &str) -> Result<&PathConstraint, ProblemError> {
        self.path_constraints
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ProblemError::not_found("path constraint", name))
    }

    pub fn state_infos(&self) -> &[VariableInfo] {
        &self.state_infos
    }

    pub fn control_infos(&self) -> &[VariableInfo] {
        &self.control_infos
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn path_constraints(&self) -> &[PathConstraint] {
        &self.path_constraints
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    pub fn state_info_names(&self) -> Vec<String> {
        self.state_infos.iter().map(|i| i.name().to_string()).collect()
    }

    pub fn control_info_names(&self) -> Vec<String> {
        self.control_infos.iter().map(|i| i.name().to_string()).collect()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn goal_names(&self) -> Vec<String> {
        self.goals.iter().map(|g| g.name().to_string()).collect()
    }

    pub fn path_constraint_names(&self) -> Vec<String> {
        self.path_constraints
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Check invariants that the setters enforce but deserialization and
    /// mutable access do not
    pub fn validate(&self) -> Result<(), ProblemError> {
        for info in self.state_infos.iter().chain(&self.control_infos) {
            info.validate()?;
        }
        for (i, p) in self.parameters.iter().enumerate() {
            check_new_name("parameter", p.name(), self.parameters[..i].iter().map(Parameter::name))?;
        }
        for (i, g) in self.goals.iter().enumerate() {
            check_new_name("goal", g.name(), self.goals[..i].iter().map(Goal::name))?;
        }
        for (i, c) in self.path_constraints.iter().enumerate() {
            check_new_name(
                "path constraint",
                c.name(),
                self.path_constraints[..i].iter().map(PathConstraint::name),
            )?;
        }
        Ok(())
    }

    /// Bind the phase to `model`
    ///
    /// Resolves, in order: state infos, control infos, parameters, goals,
    /// the model's enabled multibody constraints and their multipliers, and
    /// path constraints. The model is only read; calling this again with
    /// another model yields an independent [`BoundPhase`].
    pub fn initialize(&self, model: &dyn Model) -> Result<BoundPhase, ProblemError> {
        if !self.model_name.is_empty() && self.model_name != model.name() {
            warn!(
                expected = %self.model_name,
                model = %model.name(),
                "phase is bound to a model with a different name"
            );
        }

        let state_names = model.state_variable_names();
        for info in &self.state_infos {
            if !state_names.iter().any(|n| n == info.name()) {
                return Err(ProblemError::UnknownState(info.name().to_string()));
            }
        }

        let actuator_paths = model.actuator_paths();
        for info in &self.control_infos {
            if !actuator_paths.iter().any(|p| p == info.name()) {
                return Err(ProblemError::UnknownControl(info.name().to_string()));
            }
        }

        for parameter in &self.parameters {
            parameter.initialize(model)?;
        }

        let goals = self
            .goals
            .iter()
            .map(|g| g.initialize(model))
            .collect::<Result<Vec<_>, _>>()?;

        let policy = &self.constraint_policy;
        let mut multibody_constraints = Vec::new();
        let mut multipliers = HashMap::new();
        let mut num_multibody_constraint_equations = 0;
        for descriptor in model.constraints().iter().filter(|d| d.enabled) {
            let constraint =
                MultibodyConstraint::from_descriptor(descriptor, policy.multibody_constraint_bounds);
            num_multibody_constraint_equations += constraint.num_equations();
            multipliers.insert(
                constraint.name().to_string(),
                constraint.multiplier_infos(policy.multiplier_bounds),
            );
            debug!(constraint = %constraint, "multibody constraint");
            multibody_constraints.push(constraint);
        }

        let mut path_constraints = Vec::with_capacity(self.path_constraints.len());
        let mut num_path_constraint_equations = 0;
        for constraint in &self.path_constraints {
            let bound = constraint.initialize(model, num_path_constraint_equations)?;
            num_path_constraint_equations += bound.num_equations();
            path_constraints.push(bound);
        }

        info!(
            model = %model.name(),
            goals = goals.len(),
            multibody_constraints = multibody_constraints.len(),
            multibody_constraint_equations = num_multibody_constraint_equations,
            path_constraint_equations = num_path_constraint_equations,
            "phase initialized"
        );

        Ok(BoundPhase {
            model_id: model.id(),
            multibody_constraints,
            multipliers,
            num_multibody_constraint_equations,
            goals,
            path_constraints,
            num_path_constraint_equations,
        })
    }

    /// Write parameter values into the model, in declaration order
    ///
    /// Parameters applied before a failing one stay applied.
    pub fn apply_parameters_to_model(
        &self,
        values: &[f64],
        model: &mut dyn Model,
    ) -> Result<(), ProblemError> {
        if values.len() != self.parameters.len() {
            return Err(ProblemError::ArityMismatch {
                expected: self.parameters.len(),
                got: values.len(),
            });
        }
        for (parameter, &value) in self.parameters.iter().zip(values) {
            parameter.apply_to_model(model, value)?;
        }
        Ok(())
    }
}

fn write_section<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    items: &[T],
) -> fmt::Result {
    if items.is_empty() {
        return writeln!(f, "{}: none", title);
    }
    writeln!(f, "{}: (total: {})", title, items.len())?;
    for item in items {
        writeln!(f, "    {}", item)?;
    }
    Ok(())
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.model_name.is_empty() {
            writeln!(f, "Model: {}", self.model_name)?;
        }
        writeln!(
            f,
            "Time. initial: {} final: {}",
            self.time_initial_bounds, self.time_final_bounds
        )?;
        write_section(f, "Goals", &self.goals)?;
        writeln!(
            f,
            "Multibody constraints: bounds: {}. multiplier bounds: {}",
            self.constraint_policy.multibody_constraint_bounds,
            self.constraint_policy.multiplier_bounds
        )?;
        write_section(f, "Path constraints", &self.path_constraints)?;
        write_section(f, "States", &self.state_infos)?;
        write_section(f, "Controls", &self.control_infos)?;
        write_section(f, "Parameters", &self.parameters)
    }
}

/// A phase bound to one model
///
/// Immutable; evaluation only touches the caller's [`State`].
#[derive(Debug, Clone)]
pub struct BoundPhase {
    model_id: ModelId,
    multibody_constraints: Vec<MultibodyConstraint>,
    /// Multipliers per multibody constraint name
    multipliers: HashMap<String, Vec<VariableInfo>>,
    num_multibody_constraint_equations: usize,
    goals: Vec<BoundGoal>,
    path_constraints: Vec<BoundPathConstraint>,
    num_path_constraint_equations: usize,
}

impl BoundPhase {
    /// Whether this phase was bound to exactly this model instance
    pub fn is_bound_to(&self, model: &dyn Model) -> bool {
        self.model_id == model.id()
    }

    /// Enabled multibody constraints in discovery order
    pub fn multibody_constraints(&self) -> &[MultibodyConstraint] {
        &self.multibody_constraints
    }

    pub fn multibody_constraint(&self, name: &str) -> Result<&MultibodyConstraint, ProblemError> {
        self.multibody_constraints
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| ProblemError::not_found("multibody constraint", name))
    }

    pub fn multibody_constraint_names(&self) -> Vec<String> {
        self.multibody_constraints
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Multipliers of the multibody constraint `name`
    pub fn multiplier_infos(&self, name: &str) -> Result<&[VariableInfo], ProblemError> {
        self.multipliers
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ProblemError::not_found("multibody constraint", name))
    }

    /// Every multiplier, grouped by constraint in discovery order
    pub fn all_multiplier_infos(&self) -> impl Iterator<Item = &VariableInfo> {
        self.multibody_constraints
            .iter()
            .filter_map(|c| self.multipliers.get(c.name()))
            .flatten()
    }

    pub fn num_multibody_constraint_equations(&self) -> usize {
        self.num_multibody_constraint_equations
    }

    pub fn num_multipliers(&self) -> usize {
        self.multipliers.values().map(Vec::len).sum()
    }

    pub fn goals(&self) -> &[BoundGoal] {
        &self.goals
    }

    pub fn path_constraints(&self) -> &[BoundPathConstraint] {
        &self.path_constraints
    }

    pub fn num_path_constraint_equations(&self) -> usize {
        self.num_path_constraint_equations
    }

    /// Integrand of every goal at the state's time, in declaration order
    pub fn calc_goal_integrands(&self, model: &dyn Model, state: &mut State) -> DVector<f64> {
        DVector::from_iterator(
            self.goals.len(),
            self.goals.iter().map(|g| g.calc_integrand(model, state)),
        )
    }

    /// Values of every path-constraint equation
    pub fn calc_path_constraint_errors(&self, model: &dyn Model, state: &mut State) -> DVector<f64> {
        let mut errors = DVector::zeros(self.num_path_constraint_equations);
        for constraint in &self.path_constraints {
            let slice = &mut errors.as_mut_slice()[constraint.equations()];
            constraint.calc_errors(model, state, slice);
        }
        errors
    }

    /// Path-constraint values checked against their bounds
    pub fn check_path_constraints(&self, model: &dyn Model, state: &mut State) -> ConstraintEvaluation {
        let errors = self.calc_path_constraint_errors(model, state);
        let mut eval = ConstraintEvaluation::new();
        for constraint in &self.path_constraints {
            constraint.record(&errors.as_slice()[constraint.equations()], &mut eval);
        }
        eval
    }
}

impl fmt::Display for BoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_section(f, "Goals", &self.goals)?;
        write_section(f, "Multibody constraints", &self.multibody_constraints)?;
        if !self.multibody_constraints.is_empty() {
            writeln!(f, "Lagrange multipliers: (total: {})", self.num_multipliers())?;
        }
        write_section(f, "Path constraints", &self.path_constraints)
    }
}
