//! IMU outputs of a model frame
//!
//! An [`Imu`] is attached to a frame by path and reports what an ideal
//! inertial measurement unit rigidly mounted on that frame would read.

use nalgebra::{UnitQuaternion, Vector3};

use super::{FrameIndex, Model, State};
use crate::error::ModelError;

/// Ideal IMU attached to a model frame
#[derive(Debug, Clone, PartialEq)]
pub struct Imu {
    frame_path: String,
    frame: FrameIndex,
}

/// One set of IMU readings
#[derive(Debug, Clone)]
pub struct ImuMeasurement {
    /// Frame orientation in ground
    pub orientation: UnitQuaternion<f64>,
    /// Angular velocity in ground [rad/s]
    pub angular_velocity: Vector3<f64>,
    /// Specific force in the IMU frame [m/s²]
    pub specific_force: Vector3<f64>,
}

impl Imu {
    /// Attach to the frame at `frame_path`
    pub fn attach(model: &dyn Model, frame_path: &str) -> Result<Self, ModelError> {
        Ok(Self {
            frame_path: frame_path.to_string(),
            frame: model.frame(frame_path)?,
        })
    }

    pub fn frame_path(&self) -> &str {
        &self.frame_path
    }

    /// Orientation of the frame in ground (Position stage)
    pub fn orientation(&self, model: &dyn Model, state: &State) -> UnitQuaternion<f64> {
        model.frame_transform(state, self.frame).rotation
    }

    /// Angular velocity of the frame in ground (Velocity stage)
    pub fn gyroscope_signal(&self, model: &dyn Model, state: &State) -> Vector3<f64> {
        model.frame_angular_velocity(state, self.frame)
    }

    /// Specific force = acceleration - gravity, in the IMU frame
    /// (Acceleration stage)
    pub fn accelerometer_signal(&self, model: &dyn Model, state: &State) -> Vector3<f64> {
        let acceleration = model.frame_linear_acceleration(state, self.frame);
        let specific_force_ground = acceleration - model.gravity();
        self.orientation(model, state)
            .inverse_transform_vector(&specific_force_ground)
    }

    /// All readings at once (Acceleration stage)
    pub fn measure(&self, model: &dyn Model, state: &State) -> ImuMeasurement {
        ImuMeasurement {
            orientation: self.orientation(model, state),
            angular_velocity: self.gyroscope_signal(model, state),
            specific_force: self.accelerometer_signal(model, state),
        }
    }
}
