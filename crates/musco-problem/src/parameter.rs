//! Time-invariant parameters
//!
//! A parameter is an optimization variable written into a scalar property
//! of one or more model components (e.g. the mass of a body).

use std::fmt;

use musco_core::{Bounds, Model};
use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    component_paths: Vec<String>,
    property_name: String,
    #[serde(default)]
    bounds: Bounds,
}

impl Parameter {
    pub fn new<I, S>(
        name: impl Into<String>,
        component_paths: I,
        property_name: impl Into<String>,
        bounds: Bounds,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            component_paths: component_paths.into_iter().map(Into::into).collect(),
            property_name: property_name.into(),
            bounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn component_paths(&self) -> &[String] {
        &self.component_paths
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    /// Check that every component has the targeted property
    pub fn initialize(&self, model: &dyn Model) -> Result<(), ProblemError> {
        if self.component_paths.is_empty() {
            return Err(ProblemError::NoParameterTarget(self.name.clone()));
        }
        for component in &self.component_paths {
            if !model.has_property(component, &self.property_name) {
                return Err(ProblemError::Parameter {
                    parameter: self.name.clone(),
                    source: musco_core::ModelError::UnknownProperty {
                        component: component.clone(),
                        property: self.property_name.clone(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Write `value` into the property of every component
    pub fn apply_to_model(&self, model: &mut dyn Model, value: f64) -> Result<(), ProblemError> {
        for component in &self.component_paths {
            model
                .set_property(component, &self.property_name, value)
                .map_err(|source| ProblemError::Parameter {
                    parameter: self.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. model property name: {}. component paths: {}. bounds: {}",
            self.name,
            self.property_name,
            self.component_paths.join(", "),
            self.bounds
        )
    }
}
