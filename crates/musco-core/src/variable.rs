//! Named variable bounds

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, FinalBounds, InitialBounds};
use crate::error::BoundsError;

/// Bounds declaration for one state, control or multiplier variable
///
/// The main bounds apply over the whole trajectory; the initial and final
/// bounds, when set, narrow them at the endpoints and must lie within them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    name: String,
    #[serde(default)]
    bounds: Bounds,
    #[serde(default)]
    initial_bounds: InitialBounds,
    #[serde(default)]
    final_bounds: FinalBounds,
}

impl VariableInfo {
    /// Create a variable info and validate its endpoint bounds
    pub fn new(
        name: impl Into<String>,
        bounds: Bounds,
        initial_bounds: InitialBounds,
        final_bounds: FinalBounds,
    ) -> Result<Self, BoundsError> {
        let info = Self {
            name: name.into(),
            bounds,
            initial_bounds,
            final_bounds,
        };
        info.validate()?;
        Ok(info)
    }

    /// Variable with every bound unset
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Bounds::unset(),
            initial_bounds: InitialBounds::unset(),
            final_bounds: FinalBounds::unset(),
        }
    }

    /// Variable with the same bounds over the whole trajectory and at
    /// both endpoints
    pub fn with_uniform_bounds(name: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            name: name.into(),
            bounds,
            initial_bounds: bounds.into(),
            final_bounds: bounds.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn initial_bounds(&self) -> InitialBounds {
        self.initial_bounds
    }

    pub fn final_bounds(&self) -> FinalBounds {
        self.final_bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn set_initial_bounds(&mut self, bounds: InitialBounds) {
        self.initial_bounds = bounds;
    }

    pub fn set_final_bounds(&mut self, bounds: FinalBounds) {
        self.final_bounds = bounds;
    }

    /// Check that the endpoint bounds lie within the main bounds
    ///
    /// Unset main bounds are treated as `(-inf, inf)`.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let (lower, upper) = self.bounds.limits();

        if let Some(initial) = self.initial_bounds.lower() {
            if initial < lower {
                return Err(BoundsError::InitialLowerBelow {
                    variable: self.name.clone(),
                    initial,
                    lower,
                });
            }
        }
        if let Some(final_) = self.final_bounds.lower() {
            if final_ < lower {
                return Err(BoundsError::FinalLowerBelow {
                    variable: self.name.clone(),
                    final_,
                    lower,
                });
            }
        }
        if let Some(initial) = self.initial_bounds.upper() {
            if initial > upper {
                return Err(BoundsError::InitialUpperAbove {
                    variable: self.name.clone(),
                    initial,
                    upper,
                });
            }
        }
        if let Some(final_) = self.final_bounds.upper() {
            if final_ > upper {
                return Err(BoundsError::FinalUpperAbove {
                    variable: self.name.clone(),
                    final_,
                    upper,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for VariableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. bounds: {}", self.name, self.bounds)?;
        if self.initial_bounds.is_set() {
            write!(f, " initial: {}", self.initial_bounds)?;
        }
        if self.final_bounds.is_set() {
            write!(f, " final: {}", self.final_bounds)?;
        }
        Ok(())
    }
}
