//! Acceleration tracking
//!
//! Penalizes the difference between the linear acceleration of model frames
//! and reference accelerations (e.g. from accelerometers after gravity
//! compensation):
//!
//! ```text
//! integrand = Σᵢ wᵢ ‖aᵢ(t) - aᵢ,ref(t)‖²
//! ```
//!
//! where aᵢ is the acceleration of frame i's origin in ground and aᵢ,ref is
//! interpolated from the reference data, one spline per component.

use std::fmt;

use musco_core::model::FrameIndex;
use musco_core::reference::{
    check_redundant_labels, Interpolant, SplineSet, TimeSeriesTableVec3,
};
use musco_core::{Model, State};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{check_weight, default_weight, upsert_weight, WeightEntry};
use crate::error::ProblemError;

/// Suffixes of the flattened reference columns, one per axis
pub const ACCELERATION_SUFFIXES: [&str; 3] =
    ["/acceleration_x", "/acceleration_y", "/acceleration_z"];

/// Declared acceleration tracking goal
///
/// Reference data comes either from an in-memory table or from a
/// reference file, never both. Without explicit frame paths every column
/// of the reference data is tracked, using its label as the frame path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccelerationTrackingGoal {
    name: String,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    reference_file: String,
    #[serde(skip)]
    reference: Option<TimeSeriesTableVec3>,
    #[serde(default)]
    frame_paths: Vec<String>,
    #[serde(default)]
    acceleration_weights: Vec<WeightEntry>,
}

impl AccelerationTrackingGoal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: default_weight(),
            reference_file: String::new(),
            reference: None,
            frame_paths: Vec::new(),
            acceleration_weights: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Use an in-memory table of reference accelerations
    pub fn set_reference(&mut self, table: TimeSeriesTableVec3) {
        self.reference = Some(table);
    }

    /// Read reference accelerations from a JSON file at initialization
    pub fn set_reference_file(&mut self, path: impl Into<String>) {
        self.reference_file = path.into();
    }

    pub fn reference_file(&self) -> &str {
        &self.reference_file
    }

    /// Track only these frames (each must be a reference column label)
    pub fn set_frame_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frame_paths = paths.into_iter().map(Into::into).collect();
    }

    pub fn frame_paths(&self) -> &[String] {
        &self.frame_paths
    }

    /// Weight of one frame's error (frames default to 1)
    pub fn set_weight_for_frame(&mut self, frame_path: impl Into<String>, weight: f64) {
        upsert_weight(&mut self.acceleration_weights, frame_path.into(), weight);
    }

    fn has_in_memory_reference(&self) -> bool {
        self.reference.as_ref().is_some_and(|t| !t.is_empty())
    }

    fn load_reference(&self) -> Result<TimeSeriesTableVec3, ProblemError> {
        match (self.has_in_memory_reference(), !self.reference_file.is_empty()) {
            (true, true) => Err(ProblemError::DualReferenceSource {
                goal: self.name.clone(),
                file: self.reference_file.clone(),
            }),
            (true, false) => Ok(self.reference.clone().unwrap_or_default()),
            (false, true) => TimeSeriesTableVec3::from_json_file(&self.reference_file)
                .map_err(|e| ProblemError::reference(&self.name, e)),
            (false, false) => Err(ProblemError::NoReferenceData {
                goal: self.name.clone(),
            }),
        }
    }

    pub fn initialize(&self, model: &dyn Model) -> Result<AccelerationTracker, ProblemError> {
        let weight = check_weight(&self.name, self.weight)?;
        let source = self.load_reference()?;

        // Duplicates in the source are rejected even if the selection
        // below would only pick one of them.
        check_redundant_labels(source.labels())
            .map_err(|e| ProblemError::reference(&self.name, e))?;

        let table = if self.frame_paths.is_empty() {
            source
        } else {
            source
                .select(&self.frame_paths)
                .map_err(|e| ProblemError::reference(&self.name, e))?
        };
        check_redundant_labels(table.labels())
            .map_err(|e| ProblemError::reference(&self.name, e))?;

        for entry in &self.acceleration_weights {
            if !table.labels().contains(&entry.name) {
                warn!(
                    goal = %self.name,
                    frame = %entry.name,
                    "acceleration weight given for a frame that is not tracked; ignoring it"
                );
            }
        }

        let mut frames = Vec::with_capacity(table.num_columns());
        for path in table.labels() {
            let frame = model
                .find_frame(path)
                .ok_or_else(|| ProblemError::UnknownFrame {
                    owner: self.name.clone(),
                    path: path.clone(),
                })?;
            let frame_weight = self
                .acceleration_weights
                .iter()
                .find(|w| &w.name == path)
                .map_or(Ok(default_weight()), |w| {
                    check_weight(&format!("{}: {}", self.name, path), w.weight)
                })?;
            if frame_weight == 0.0 {
                warn!(goal = %self.name, frame = %path, "frame has zero weight");
            }
            frames.push(TrackedFrame {
                path: path.clone(),
                frame,
                weight: frame_weight,
            });
        }

        let splines = SplineSet::from_table(&table.flatten(ACCELERATION_SUFFIXES))
            .map_err(|e| ProblemError::reference(&self.name, e))?;

        debug!(
            goal = %self.name,
            frames = frames.len(),
            splines = splines.len(),
            "acceleration tracking goal initialized"
        );

        Ok(AccelerationTracker {
            name: self.name.clone(),
            weight,
            reference_file: self.reference_file.clone(),
            frames,
            splines,
        })
    }
}

impl fmt::Display for AccelerationTrackingGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. acceleration tracking. weight: {}", self.name, self.weight)?;
        if !self.reference_file.is_empty() {
            write!(f, ". acceleration reference file: {}", self.reference_file)?;
        }
        Ok(())
    }
}

/// A model frame resolved from a reference column
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    pub path: String,
    pub frame: FrameIndex,
    pub weight: f64,
}

/// Acceleration tracking goal bound to a model
#[derive(Debug, Clone)]
pub struct AccelerationTracker {
    name: String,
    weight: f64,
    reference_file: String,
    frames: Vec<TrackedFrame>,
    /// Three splines per frame, in frame order (x, y, z)
    splines: SplineSet,
}

impl AccelerationTracker {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[TrackedFrame] {
        &self.frames
    }

    /// Interpolated reference acceleration of the i-th tracked frame, or
    /// `None` when there is no such frame
    pub fn reference_acceleration(&self, i: usize, t: f64) -> Option<Vector3<f64>> {
        (i < self.frames.len()).then(|| self.reference_at(i, t))
    }

    /// `i` must index `frames`
    fn reference_at(&self, i: usize, t: f64) -> Vector3<f64> {
        Vector3::new(
            self.splines[3 * i].value(t),
            self.splines[3 * i + 1].value(t),
            self.splines[3 * i + 2].value(t),
        )
    }

    /// Requires the state realized to the Acceleration stage
    pub(crate) fn calc_integrand(&self, model: &dyn Model, state: &State) -> f64 {
        let t = state.time();
        let integrand: f64 = self
            .frames
            .iter()
            .enumerate()
            .map(|(i, tracked)| {
                let acceleration = model.frame_linear_acceleration(state, tracked.frame);
                let error = acceleration - self.reference_at(i, t);
                tracked.weight * error.norm_squared()
            })
            .sum();
        self.weight * integrand
    }
}

impl fmt::Display for AccelerationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. acceleration tracking. weight: {}", self.name, self.weight)?;
        if !self.reference_file.is_empty() {
            write!(f, "\n        acceleration reference file: {}", self.reference_file)?;
        }
        for (i, tracked) in self.frames.iter().enumerate() {
            write!(
                f,
                "\n        frame {}: {}, weight: {}",
                i, tracked.path, tracked.weight
            )?;
        }
        Ok(())
    }
}
