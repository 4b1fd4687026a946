//! Variable and constraint bounds
//!
//! A [`Bounds`] is either unset or a closed range `[lower, upper]`. Unset
//! bounds impose no restriction. [`InitialBounds`] and [`FinalBounds`]
//! narrow a variable's main bounds only at the trajectory endpoints.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::BoundsError;

/// Closed range `[lower, upper]`, or unset
///
/// Serialized as `null` or `[lower, upper]`. Deserialization applies the
/// same checks as [`Bounds::new`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Option<[f64; 2]>", into = "Option<[f64; 2]>")]
pub struct Bounds {
    range: Option<[f64; 2]>,
}

impl Bounds {
    /// Bounds that impose no restriction
    pub const fn unset() -> Self {
        Self { range: None }
    }

    /// Equality bounds: lower = upper = `value`
    pub fn fixed(value: f64) -> Self {
        Self {
            range: Some([value, value]),
        }
    }

    /// Range `[-|magnitude|, |magnitude|]`
    pub fn symmetric(magnitude: f64) -> Self {
        let m = magnitude.abs();
        Self {
            range: Some([-m, m]),
        }
    }

    /// Range bounds, rejecting NaN and `lower > upper`
    pub fn new(lower: f64, upper: f64) -> Result<Self, BoundsError> {
        if lower.is_nan() || upper.is_nan() {
            return Err(BoundsError::NotANumber { lower, upper });
        }
        if lower > upper {
            return Err(BoundsError::Inverted { lower, upper });
        }
        Ok(Self {
            range: Some([lower, upper]),
        })
    }

    /// Whether these bounds restrict anything
    pub fn is_set(&self) -> bool {
        self.range.is_some()
    }

    pub fn lower(&self) -> Option<f64> {
        self.range.map(|[lower, _]| lower)
    }

    pub fn upper(&self) -> Option<f64> {
        self.range.map(|[_, upper]| upper)
    }

    /// Whether lower and upper coincide
    pub fn is_equality(&self) -> bool {
        matches!(self.range, Some([lower, upper]) if lower == upper)
    }

    /// Range with unset bounds widened to `(-inf, inf)`
    pub fn limits(&self) -> (f64, f64) {
        match self.range {
            Some([lower, upper]) => (lower, upper),
            None => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    /// Whether `value` lies in the range (always true when unset)
    pub fn contains(&self, value: f64) -> bool {
        let (lower, upper) = self.limits();
        lower <= value && value <= upper
    }

    /// Amount by which `value` lies outside the range (0 when inside)
    pub fn violation(&self, value: f64) -> f64 {
        let (lower, upper) = self.limits();
        if value < lower {
            lower - value
        } else if value > upper {
            value - upper
        } else {
            0.0
        }
    }
}

impl TryFrom<Option<[f64; 2]>> for Bounds {
    type Error = BoundsError;

    fn try_from(range: Option<[f64; 2]>) -> Result<Self, BoundsError> {
        match range {
            Some([lower, upper]) => Self::new(lower, upper),
            None => Ok(Self::unset()),
        }
    }
}

impl From<Bounds> for Option<[f64; 2]> {
    fn from(bounds: Bounds) -> Self {
        bounds.range
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.range {
            None => write!(f, "unset"),
            Some([lower, upper]) if lower == upper => write!(f, "{}", lower),
            Some([lower, upper]) => write!(f, "[{}, {}]", lower, upper),
        }
    }
}

macro_rules! endpoint_bounds {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Bounds);

        impl $name {
            pub const fn unset() -> Self {
                Self(Bounds::unset())
            }

            pub fn fixed(value: f64) -> Self {
                Self(Bounds::fixed(value))
            }

            pub fn new(lower: f64, upper: f64) -> Result<Self, BoundsError> {
                Bounds::new(lower, upper).map(Self)
            }

            pub fn bounds(&self) -> Bounds {
                self.0
            }
        }

        impl From<Bounds> for $name {
            fn from(bounds: Bounds) -> Self {
                Self(bounds)
            }
        }

        impl Deref for $name {
            type Target = Bounds;

            fn deref(&self) -> &Bounds {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

endpoint_bounds!(
    /// Bounds applied only at the initial time of a trajectory
    InitialBounds
);

endpoint_bounds!(
    /// Bounds applied only at the final time of a trajectory
    FinalBounds
);
