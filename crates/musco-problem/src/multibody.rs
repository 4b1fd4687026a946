//! Multibody constraints and their Lagrange multipliers
//!
//! Kinematic constraints of the model (welds, coupled coordinates, point
//! on surface, ...) are discovered at initialization. Each enabled
//! constraint contributes mp + mv + ma scalar equations, and one Lagrange
//! multiplier per equation becomes an optimization variable.

use std::fmt;

use musco_core::{Bounds, ConstraintDescriptor, ConstraintIndex, ConstraintInfo, VariableInfo};

/// Multibody constraint discovered in a model
#[derive(Debug, Clone, PartialEq)]
pub struct MultibodyConstraint {
    index: ConstraintIndex,
    num_position: usize,
    num_velocity: usize,
    num_acceleration: usize,
    info: ConstraintInfo,
}

impl MultibodyConstraint {
    /// Constraint named `cid{index}`, every equation bounded by `bounds`
    pub fn from_descriptor(descriptor: &ConstraintDescriptor, bounds: Bounds) -> Self {
        let info = ConstraintInfo::uniform(
            format!("cid{}", descriptor.index),
            descriptor.num_equations(),
            bounds,
        );
        Self {
            index: descriptor.index,
            num_position: descriptor.num_position,
            num_velocity: descriptor.num_velocity,
            num_acceleration: descriptor.num_acceleration,
            info,
        }
    }

    pub fn index(&self) -> ConstraintIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn info(&self) -> &ConstraintInfo {
        &self.info
    }

    pub fn num_position_equations(&self) -> usize {
        self.num_position
    }

    pub fn num_velocity_equations(&self) -> usize {
        self.num_velocity
    }

    pub fn num_acceleration_equations(&self) -> usize {
        self.num_acceleration
    }

    pub fn num_equations(&self) -> usize {
        self.info.num_equations()
    }

    /// Replicate `bounds` over every scalar equation
    pub fn set_bounds(&mut self, bounds: Bounds) {
        let n = self.num_equations();
        self.info.set_bounds(vec![bounds; n]);
    }

    /// One multiplier per equation: position, then velocity, then
    /// acceleration (`lambda_cid{index}_p{i}`, `_v{i}`, `_a{i}`)
    ///
    /// Initial and final bounds equal the main bounds.
    pub fn multiplier_infos(&self, bounds: Bounds) -> Vec<VariableInfo> {
        let prefix = format!("lambda_{}", self.info.name());
        let levels = [
            ('p', self.num_position),
            ('v', self.num_velocity),
            ('a', self.num_acceleration),
        ];
        levels
            .iter()
            .flat_map(|&(level, count)| (0..count).map(move |i| (level, i)))
            .map(|(level, i)| {
                VariableInfo::with_uniform_bounds(format!("{}_{}{}", prefix, level, i), bounds)
            })
            .collect()
    }
}

impl fmt::Display for MultibodyConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. holonomic: {}, non-holonomic: {}, acceleration: {}. bounds: {}",
            self.info.name(),
            self.num_position,
            self.num_velocity,
            self.num_acceleration,
            self.info.bounds().first().copied().unwrap_or_default()
        )
    }
}
