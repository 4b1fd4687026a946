//! Multibody model interface
//!
//! A problem is initialized against a [`Model`] and evaluated against a
//! [`State`]. The model is the physics engine: it enumerates state
//! variables, actuators, frames and multibody constraints, and computes
//! frame kinematics once a state has been realized to the right [`Stage`].
//!
//! - [`PrescribedModel`]: in-memory model with analytic frame motion
//! - [`Imu`]: orientation, gyroscope and accelerometer outputs of a frame

mod imu;
mod prescribed;
mod state;

pub use imu::*;
pub use prescribed::*;
pub use state::*;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Isometry3, Vector3};

use crate::error::ModelError;

/// Identity of one model instance
///
/// Two models compare equal only if they are the same instance; copies get
/// a fresh identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(u64);

impl ModelId {
    /// Allocate an identity never handed out before in this process
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Handle to a frame inside a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameIndex(pub usize);

/// Handle to a constraint in the physics engine's constraint set
///
/// Stable only while the engine's constraint set is not resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintIndex(pub usize);

impl fmt::Display for ConstraintIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A multibody constraint as reported by the engine at the working state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    pub index: ConstraintIndex,
    /// Disabled constraints contribute no equations
    pub enabled: bool,
    /// Holonomic (position-level) equations
    pub num_position: usize,
    /// Nonholonomic (velocity-level) equations
    pub num_velocity: usize,
    /// Acceleration-only equations
    pub num_acceleration: usize,
}

impl ConstraintDescriptor {
    pub fn num_equations(&self) -> usize {
        self.num_position + self.num_velocity + self.num_acceleration
    }
}

/// Physics-engine view of a multibody model
///
/// Kinematic queries require the state to be realized to the stage noted
/// on each method; callers use [`Model::realize`] first.
pub trait Model: Send + Sync {
    fn id(&self) -> ModelId;

    fn name(&self) -> &str;

    /// Names of all continuous state variables
    fn state_variable_names(&self) -> Vec<String>;

    /// Paths of all scalar actuators, relative to the model root
    ///
    /// The position of a path is the index of its control in
    /// [`State::controls`].
    fn actuator_paths(&self) -> Vec<String>;

    /// Index of the control driving the actuator at `path`
    fn control_index(&self, path: &str) -> Option<usize> {
        self.actuator_paths().iter().position(|p| p == path)
    }

    /// Multibody constraints at the model's working state
    fn constraints(&self) -> Vec<ConstraintDescriptor>;

    fn find_frame(&self, path: &str) -> Option<FrameIndex>;

    /// Like [`Model::find_frame`], failing for unknown paths
    fn frame(&self, path: &str) -> Result<FrameIndex, ModelError> {
        self.find_frame(path)
            .ok_or_else(|| ModelError::UnknownFrame(path.to_string()))
    }

    fn frame_path(&self, frame: FrameIndex) -> Option<&str>;

    /// Whether `component` has a scalar property called `property`
    fn has_property(&self, component: &str, property: &str) -> bool;

    fn set_property(
        &mut self,
        component: &str,
        property: &str,
        value: f64,
    ) -> Result<(), ModelError>;

    fn gravity(&self) -> Vector3<f64>;

    /// Compute everything the state needs up to `stage`
    fn realize(&self, state: &mut State, stage: Stage) {
        state.advance_to(stage);
    }

    /// Pose of the frame in ground (Position stage)
    fn frame_transform(&self, state: &State, frame: FrameIndex) -> Isometry3<f64>;

    /// Angular velocity of the frame in ground (Velocity stage)
    fn frame_angular_velocity(&self, state: &State, frame: FrameIndex) -> Vector3<f64>;

    /// Linear acceleration of the frame origin in ground (Acceleration stage)
    fn frame_linear_acceleration(&self, state: &State, frame: FrameIndex) -> Vector3<f64>;
}
