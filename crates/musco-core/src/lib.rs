//! # musco Core
//!
//! Building blocks for musculoskeletal trajectory optimization.
//!
//! This crate holds the value types shared by every optimal-control problem
//! (variable bounds, variable infos, constraint infos) together with the
//! interfaces of the two collaborators a problem is evaluated against: the
//! multibody model and the time-series reference data.
//!
//! ## Modules
//!
//! - [`bounds`]: Closed ranges with an unset state, endpoint bounds
//! - [`variable`]: Named variable bounds with endpoint validation
//! - [`constraint`]: Named blocks of scalar constraint equations
//! - [`model`]: Multibody model interface, simulation state, IMU outputs
//! - [`reference`]: Time-series tables and interpolating splines
//! - [`error`]: Error types

pub mod bounds;
pub mod constraint;
pub mod error;
pub mod model;
pub mod reference;
pub mod variable;

pub use bounds::{Bounds, FinalBounds, InitialBounds};
pub use constraint::ConstraintInfo;
pub use error::{BoundsError, ModelError, ReferenceError};
pub use model::{
    ConstraintDescriptor, ConstraintIndex, FrameIndex, Model, ModelId, Stage, State,
};
pub use variable::VariableInfo;

// Common type aliases
use nalgebra::{UnitQuaternion, Vector3};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// Unit quaternion type for rotations
pub type Quat = UnitQuaternion<f64>;

/// Standard gravity [m/s²]
pub const GRAVITY: f64 = 9.80665;

/// Default gravity vector (Y-up convention used by musculoskeletal models)
pub fn gravity_y_up() -> Vec3 {
    Vec3::new(0.0, -GRAVITY, 0.0)
}
