//! In-memory model with analytic frame motion
//!
//! Every frame follows a prescribed rigid-body motion with constant linear
//! acceleration and constant angular velocity:
//!
//! ```text
//! p(t) = p₀ + v₀t + ½at²
//! R(t) = exp(ωt) R₀
//! ```
//!
//! State variables, actuators, constraints and properties are plain
//! declarations. This is enough to bind and evaluate problems without a
//! full physics engine.

use std::collections::BTreeMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use super::{
    ConstraintDescriptor, ConstraintIndex, FrameIndex, Model, ModelId, Stage, State,
};
use crate::error::ModelError;

/// Prescribed rigid motion of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMotion {
    /// Origin position at t = 0 [m]
    pub position: Vector3<f64>,
    /// Origin velocity at t = 0 [m/s]
    pub velocity: Vector3<f64>,
    /// Constant origin acceleration [m/s²]
    pub acceleration: Vector3<f64>,
    /// Orientation at t = 0 (frame to ground)
    pub orientation: UnitQuaternion<f64>,
    /// Constant angular velocity in ground [rad/s]
    pub angular_velocity: Vector3<f64>,
}

impl Default for FrameMotion {
    fn default() -> Self {
        Self::fixed(Vector3::zeros())
    }
}

impl FrameMotion {
    /// Frame at rest at `position`
    pub fn fixed(position: Vector3<f64>) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            acceleration: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            angular_velocity: Vector3::zeros(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vector3<f64>) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vector3<f64>) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_orientation(mut self, orientation: UnitQuaternion<f64>) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vector3<f64>) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn position_at(&self, t: f64) -> Vector3<f64> {
        self.position + self.velocity * t + 0.5 * self.acceleration * t * t
    }

    pub fn velocity_at(&self, t: f64) -> Vector3<f64> {
        self.velocity + self.acceleration * t
    }

    pub fn orientation_at(&self, t: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_scaled_axis(self.angular_velocity * t) * self.orientation
    }
}

/// Model whose frames move along prescribed trajectories
#[derive(Debug)]
pub struct PrescribedModel {
    id: ModelId,
    name: String,
    gravity: Vector3<f64>,
    state_variables: Vec<String>,
    actuators: Vec<String>,
    constraints: Vec<ConstraintDescriptor>,
    frames: Vec<(String, FrameMotion)>,
    properties: BTreeMap<(String, String), f64>,
}

impl Clone for PrescribedModel {
    /// Copies are distinct model instances with their own identity
    fn clone(&self) -> Self {
        Self {
            id: ModelId::next(),
            name: self.name.clone(),
            gravity: self.gravity,
            state_variables: self.state_variables.clone(),
            actuators: self.actuators.clone(),
            constraints: self.constraints.clone(),
            frames: self.frames.clone(),
            properties: self.properties.clone(),
        }
    }
}

impl PrescribedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ModelId::next(),
            name: name.into(),
            gravity: crate::gravity_y_up(),
            state_variables: Vec::new(),
            actuators: Vec::new(),
            constraints: Vec::new(),
            frames: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_state_variable(mut self, name: impl Into<String>) -> Self {
        self.state_variables.push(name.into());
        self
    }

    pub fn with_actuator(mut self, path: impl Into<String>) -> Self {
        self.actuators.push(path.into());
        self
    }

    /// Append a constraint; its index is its position in the constraint set
    pub fn with_constraint(
        mut self,
        enabled: bool,
        num_position: usize,
        num_velocity: usize,
        num_acceleration: usize,
    ) -> Self {
        let index = ConstraintIndex(self.constraints.len());
        self.constraints.push(ConstraintDescriptor {
            index,
            enabled,
            num_position,
            num_velocity,
            num_acceleration,
        });
        self
    }

    pub fn with_frame(mut self, path: impl Into<String>, motion: FrameMotion) -> Self {
        self.frames.push((path.into(), motion));
        self
    }

    pub fn with_property(
        mut self,
        component: impl Into<String>,
        property: impl Into<String>,
        value: f64,
    ) -> Self {
        self.properties
            .insert((component.into(), property.into()), value);
        self
    }

    /// Enable or disable a constraint at the working state
    ///
    /// Returns false if no constraint has that index.
    pub fn set_constraint_enabled(&mut self, index: ConstraintIndex, enabled: bool) -> bool {
        match self.constraints.iter_mut().find(|c| c.index == index) {
            Some(constraint) => {
                constraint.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn property(&self, component: &str, property: &str) -> Option<f64> {
        self.properties
            .get(&(component.to_string(), property.to_string()))
            .copied()
    }

    /// Default state at `time`, one coordinate and speed per state pair
    pub fn default_state(&self, time: f64) -> State {
        let n = self.state_variables.len();
        State::zeros(time, n / 2 + n % 2, n / 2, self.actuators.len())
    }

    fn motion(&self, frame: FrameIndex) -> &FrameMotion {
        &self.frames[frame.0].1
    }
}

impl Model for PrescribedModel {
    fn id(&self) -> ModelId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn state_variable_names(&self) -> Vec<String> {
        self.state_variables.clone()
    }

    fn actuator_paths(&self) -> Vec<String> {
        self.actuators.clone()
    }

    fn constraints(&self) -> Vec<ConstraintDescriptor> {
        self.constraints.clone()
    }

    fn find_frame(&self, path: &str) -> Option<FrameIndex> {
        self.frames
            .iter()
            .position(|(p, _)| p == path)
            .map(FrameIndex)
    }

    fn frame_path(&self, frame: FrameIndex) -> Option<&str> {
        self.frames.get(frame.0).map(|(p, _)| p.as_str())
    }

    fn has_property(&self, component: &str, property: &str) -> bool {
        self.property(component, property).is_some()
    }

    fn set_property(
        &mut self,
        component: &str,
        property: &str,
        value: f64,
    ) -> Result<(), ModelError> {
        if !value.is_finite() {
            return Err(ModelError::NonFiniteProperty {
                component: component.to_string(),
                property: property.to_string(),
                value,
            });
        }
        match self
            .properties
            .get_mut(&(component.to_string(), property.to_string()))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ModelError::UnknownProperty {
                component: component.to_string(),
                property: property.to_string(),
            }),
        }
    }

    fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    fn frame_transform(&self, state: &State, frame: FrameIndex) -> Isometry3<f64> {
        debug_assert!(state.stage() >= Stage::Position);
        let motion = self.motion(frame);
        let t = state.time();
        Isometry3::from_parts(
            Translation3::from(motion.position_at(t)),
            motion.orientation_at(t),
        )
    }

    fn frame_angular_velocity(&self, state: &State, frame: FrameIndex) -> Vector3<f64> {
        debug_assert!(state.stage() >= Stage::Velocity);
        self.motion(frame).angular_velocity
    }

    fn frame_linear_acceleration(&self, state: &State, frame: FrameIndex) -> Vector3<f64> {
        debug_assert!(state.stage() >= Stage::Acceleration);
        self.motion(frame).acceleration
    }
}
