//! Named blocks of scalar constraint equations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;

/// Name and per-equation bounds of one constraint block
///
/// The number of scalar equations is the length of the bounds vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstraintInfo {
    name: String,
    #[serde(default)]
    bounds: Vec<Bounds>,
}

impl ConstraintInfo {
    /// Constraint info without equations yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// Constraint info with `num_equations` copies of `bounds`
    pub fn uniform(name: impl Into<String>, num_equations: usize, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            bounds: vec![bounds; num_equations],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn bounds(&self) -> &[Bounds] {
        &self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Vec<Bounds>) {
        self.bounds = bounds;
    }

    pub fn num_equations(&self) -> usize {
        self.bounds.len()
    }

    /// Lower bound of every equation, `-inf` where unset
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.limits().0).collect()
    }

    /// Upper bound of every equation, `inf` where unset
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.limits().1).collect()
    }
}

impl fmt::Display for ConstraintInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. number of scalar equations: {}. bounds:",
            self.name,
            self.bounds.len()
        )?;
        for (i, b) in self.bounds.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, b)?;
        }
        Ok(())
    }
}
