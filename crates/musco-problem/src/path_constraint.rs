//! Path constraints
//!
//! Algebraic constraints enforced at every point of the trajectory:
//!
//! ```text
//! lb ≤ g(t, x(t)) ≤ ub
//! ```
//!
//! - [`FrameDistanceConstraint`]: distance between pairs of frame origins
//! - [`ControlBoundConstraint`]: values of selected controls
//!
//! Each bound constraint owns a contiguous slice of the phase's path
//! constraint equations, starting at its offset.

use std::fmt;
use std::ops::Range;

use musco_core::{Bounds, ConstraintInfo, FrameIndex, Model, Stage, State};
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// Path-constraint values checked against their bounds
#[derive(Debug, Clone)]
pub struct ConstraintEvaluation {
    /// Constraint values, one per scalar equation
    pub values: Vec<f64>,
    /// `constraint[equation]` names for debugging
    pub names: Vec<String>,
    /// Whether every value lies within its bounds
    pub all_satisfied: bool,
    /// Largest distance of a value outside its bounds (0 if all satisfied)
    pub max_violation: f64,
}

impl ConstraintEvaluation {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            names: Vec::new(),
            all_satisfied: true,
            max_violation: 0.0,
        }
    }

    pub fn add(&mut self, name: String, value: f64, bounds: Bounds) {
        let violation = bounds.violation(value);
        self.names.push(name);
        self.values.push(value);
        if violation > 0.0 || value.is_nan() {
            self.all_satisfied = false;
            self.max_violation = self.max_violation.max(violation);
        }
    }
}

impl Default for ConstraintEvaluation {
    fn default() -> Self {
        Self::new()
    }
}

/// Two frames whose origins must stay within `bounds` of each other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePair {
    pub frame1: String,
    pub frame2: String,
    #[serde(default)]
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDistanceConstraint {
    info: ConstraintInfo,
    #[serde(default)]
    pairs: Vec<FramePair>,
}

impl FrameDistanceConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: ConstraintInfo::new(name),
            pairs: Vec::new(),
        }
    }

    pub fn add_frame_pair(
        &mut self,
        frame1: impl Into<String>,
        frame2: impl Into<String>,
        bounds: Bounds,
    ) {
        self.pairs.push(FramePair {
            frame1: frame1.into(),
            frame2: frame2.into(),
            bounds,
        });
    }

    pub fn pairs(&self) -> &[FramePair] {
        &self.pairs
    }

    fn initialize(&self, model: &dyn Model) -> Result<(BoundKind, Vec<Bounds>), ProblemError> {
        let resolve = |path: &str| {
            model.find_frame(path).ok_or_else(|| ProblemError::UnknownFrame {
                owner: self.info.name().to_string(),
                path: path.to_string(),
            })
        };
        let frames = self
            .pairs
            .iter()
            .map(|pair| Ok((resolve(&pair.frame1)?, resolve(&pair.frame2)?)))
            .collect::<Result<Vec<_>, ProblemError>>()?;
        let bounds = self.pairs.iter().map(|pair| pair.bounds).collect();
        Ok((BoundKind::FrameDistance(frames), bounds))
    }
}

/// Bounds on selected controls; all controls when no path is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlBoundConstraint {
    info: ConstraintInfo,
    #[serde(default)]
    control_paths: Vec<String>,
    #[serde(default)]
    bounds: Bounds,
}

impl ControlBoundConstraint {
    pub fn new(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            info: ConstraintInfo::new(name),
            control_paths: Vec::new(),
            bounds,
        }
    }

    pub fn add_control_path(&mut self, path: impl Into<String>) {
        self.control_paths.push(path.into());
    }

    pub fn control_paths(&self) -> &[String] {
        &self.control_paths
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn initialize(&self, model: &dyn Model) -> Result<(BoundKind, Vec<Bounds>), ProblemError> {
        let indices: Vec<usize> = if self.control_paths.is_empty() {
            (0..model.actuator_paths().len()).collect()
        } else {
            self.control_paths
                .iter()
                .map(|path| {
                    model
                        .control_index(path)
                        .ok_or_else(|| ProblemError::UnknownControl(path.clone()))
                })
                .collect::<Result<Vec<_>, ProblemError>>()?
        };
        let bounds = vec![self.bounds; indices.len()];
        Ok((BoundKind::ControlBound(indices), bounds))
    }
}

/// Declared path constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathConstraint {
    FrameDistance(FrameDistanceConstraint),
    ControlBound(ControlBoundConstraint),
}

impl PathConstraint {
    pub fn info(&self) -> &ConstraintInfo {
        match self {
            PathConstraint::FrameDistance(c) => &c.info,
            PathConstraint::ControlBound(c) => &c.info,
        }
    }

    /// Pre-set per-equation bounds; replaces the bounds derived at
    /// initialization and must have one entry per equation
    pub fn info_mut(&mut self) -> &mut ConstraintInfo {
        match self {
            PathConstraint::FrameDistance(c) => &mut c.info,
            PathConstraint::ControlBound(c) => &mut c.info,
        }
    }

    pub fn name(&self) -> &str {
        self.info().name()
    }

    /// Bind to `model`, taking equations `offset..offset + n` of the phase
    pub fn initialize(
        &self,
        model: &dyn Model,
        offset: usize,
    ) -> Result<BoundPathConstraint, ProblemError> {
        let (kind, derived) = match self {
            PathConstraint::FrameDistance(c) => c.initialize(model)?,
            PathConstraint::ControlBound(c) => c.initialize(model)?,
        };
        let declared = self.info();
        let bounds = if declared.bounds().is_empty() {
            derived
        } else if declared.num_equations() == derived.len() {
            declared.bounds().to_vec()
        } else {
            return Err(ProblemError::ConstraintBoundsArity {
                name: declared.name().to_string(),
                expected: derived.len(),
                got: declared.num_equations(),
            });
        };
        let mut info = ConstraintInfo::new(declared.name());
        info.set_bounds(bounds);
        Ok(BoundPathConstraint { info, offset, kind })
    }
}

impl fmt::Display for PathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathConstraint::FrameDistance(c) => {
                write!(f, "{}. frame distance. number of frame pairs: {}", c.info.name(), c.pairs.len())
            }
            PathConstraint::ControlBound(c) => {
                write!(f, "{}. control bound. bounds: {}", c.info.name(), c.bounds)
            }
        }
    }
}

impl From<FrameDistanceConstraint> for PathConstraint {
    fn from(constraint: FrameDistanceConstraint) -> Self {
        PathConstraint::FrameDistance(constraint)
    }
}

impl From<ControlBoundConstraint> for PathConstraint {
    fn from(constraint: ControlBoundConstraint) -> Self {
        PathConstraint::ControlBound(constraint)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BoundKind {
    FrameDistance(Vec<(FrameIndex, FrameIndex)>),
    ControlBound(Vec<usize>),
}

/// Path constraint bound to a model
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPathConstraint {
    info: ConstraintInfo,
    offset: usize,
    kind: BoundKind,
}

impl BoundPathConstraint {
    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn info(&self) -> &ConstraintInfo {
        &self.info
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn num_equations(&self) -> usize {
        self.info.num_equations()
    }

    /// Indices of this constraint's equations in the phase
    pub fn equations(&self) -> Range<usize> {
        self.offset..self.offset + self.num_equations()
    }

    /// Minimum stage the state is realized to before evaluation
    pub fn stage(&self) -> Stage {
        match self.kind {
            BoundKind::FrameDistance(_) => Stage::Position,
            BoundKind::ControlBound(_) => Stage::Velocity,
        }
    }

    /// Write this constraint's values into `errors` (length `num_equations`)
    pub fn calc_errors(&self, model: &dyn Model, state: &mut State, errors: &mut [f64]) {
        debug_assert_eq!(errors.len(), self.num_equations());
        model.realize(state, self.stage());
        match &self.kind {
            BoundKind::FrameDistance(pairs) => {
                for (error, &(frame1, frame2)) in errors.iter_mut().zip(pairs) {
                    let p1 = model.frame_transform(state, frame1).translation.vector;
                    let p2 = model.frame_transform(state, frame2).translation.vector;
                    *error = (p1 - p2).norm();
                }
            }
            BoundKind::ControlBound(indices) => {
                let controls = state.controls();
                for (error, &index) in errors.iter_mut().zip(indices) {
                    *error = controls[index];
                }
            }
        }
    }

    /// Append this constraint's values (in `errors`) to `eval`
    pub(crate) fn record(&self, errors: &[f64], eval: &mut ConstraintEvaluation) {
        for (i, (&value, &bounds)) in errors.iter().zip(self.info.bounds()).enumerate() {
            eval.add(format!("{}[{}]", self.info.name(), i), value, bounds);
        }
    }
}

impl fmt::Display for BoundPathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. offset: {}", self.info, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use musco_core::model::{FrameMotion, PrescribedModel};
    use nalgebra::{DVector, Vector3};

    fn model() -> PrescribedModel {
        PrescribedModel::new("m")
            .with_actuator("/forceset/a")
            .with_actuator("/forceset/b")
            .with_actuator("/forceset/c")
            .with_frame("/bodyset/foot_r", FrameMotion::fixed(Vector3::new(0.1, 0.0, 0.2)))
            .with_frame("/bodyset/foot_l", FrameMotion::fixed(Vector3::new(0.1, 0.0, -0.2)))
    }

    fn feet() -> PathConstraint {
        let mut c = FrameDistanceConstraint::new("feet");
        c.add_frame_pair("/bodyset/foot_r", "/bodyset/foot_l", Bounds::new(0.1, 1.0).unwrap());
        c.into()
    }

    #[test]
    fn test_frame_distance() {
        let model = model();
        let bound = feet().initialize(&model, 4).unwrap();
        assert_eq!(bound.equations(), 4..5);
        assert_eq!(bound.stage(), Stage::Position);

        let mut state = model.default_state(0.0);
        let mut errors = [0.0];
        bound.calc_errors(&model, &mut state, &mut errors);
        assert_relative_eq!(errors[0], 0.4, epsilon = 1e-12);
        assert!(state.stage() >= Stage::Position);
    }

    #[test]
    fn test_control_bound_defaults_to_all_controls() {
        let model = model();
        let c: PathConstraint = ControlBoundConstraint::new("activation", Bounds::new(0.0, 1.0).unwrap()).into();
        let bound = c.initialize(&model, 0).unwrap();
        assert_eq!(bound.num_equations(), 3);

        let mut state = model.default_state(0.0);
        state.set_controls(DVector::from_vec(vec![0.2, 1.5, -0.1]));
        let mut errors = vec![0.0; 3];
        bound.calc_errors(&model, &mut state, &mut errors);
        assert_eq!(errors, vec![0.2, 1.5, -0.1]);

        let mut eval = ConstraintEvaluation::new();
        bound.record(&errors, &mut eval);
        assert!(!eval.all_satisfied);
        assert_relative_eq!(eval.max_violation, 0.5, epsilon = 1e-12);
        assert_eq!(eval.names[1], "activation[1]");
    }

    #[test]
    fn test_unknown_targets() {
        let model = model();
        let mut c = ControlBoundConstraint::new("activation", Bounds::unset());
        c.add_control_path("/forceset/missing");
        assert!(matches!(
            PathConstraint::from(c).initialize(&model, 0),
            Err(ProblemError::UnknownControl(_))
        ));

        let mut c = FrameDistanceConstraint::new("feet");
        c.add_frame_pair("/bodyset/foot_r", "/bodyset/hand_r", Bounds::unset());
        assert!(matches!(
            PathConstraint::from(c).initialize(&model, 0),
            Err(ProblemError::UnknownFrame { ref path, .. }) if path == "/bodyset/hand_r"
        ));
    }

    #[test]
    fn test_preset_bounds_arity() {
        let model = model();
        let mut c = feet();
        c.info_mut().set_bounds(vec![Bounds::fixed(0.4)]);
        let bound = c.initialize(&model, 0).unwrap();
        assert!(bound.info().bounds()[0].is_equality());

        c.info_mut().set_bounds(vec![Bounds::fixed(0.4); 2]);
        assert!(matches!(
            c.initialize(&model, 0),
            Err(ProblemError::ConstraintBoundsArity { expected: 1, got: 2, .. })
        ));
    }
}
