//! Control effort
//!
//! ```text
//! integrand = Σⱼ wⱼ uⱼ(t)²
//! ```
//!
//! over every actuator control; actuators without an explicit weight count
//! with weight 1.

use std::fmt;

use musco_core::{Model, State};
use serde::{Deserialize, Serialize};

use super::{check_weight, default_weight, upsert_weight, WeightEntry};
use crate::error::ProblemError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlEffortGoal {
    name: String,
    #[serde(default = "default_weight")]
    weight: f64,
    #[serde(default)]
    control_weights: Vec<WeightEntry>,
}

impl ControlEffortGoal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weight: default_weight(),
            control_weights: Vec::new(),
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

    pub fn set_weight_for_control(&mut self, actuator_path: impl Into<String>, weight: f64) {
        upsert_weight(&mut self.control_weights, actuator_path.into(), weight);
    }

    pub fn initialize(&self, model: &dyn Model) -> Result<ControlEffort, ProblemError> {
        let weight = check_weight(&self.name, self.weight)?;
        for entry in &self.control_weights {
            if model.control_index(&entry.name).is_none() {
                return Err(ProblemError::UnknownControl(entry.name.clone()));
            }
        }

        let terms = model
            .actuator_paths()
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let w = match self.control_weights.iter().find(|w| &w.name == path) {
                    Some(entry) => check_weight(&format!("{}: {}", self.name, path), entry.weight)?,
                    None => default_weight(),
                };
                Ok((index, w))
            })
            .collect::<Result<Vec<_>, ProblemError>>()?;

        Ok(ControlEffort {
            name: self.name.clone(),
            weight,
            terms,
        })
    }
}

impl fmt::Display for ControlEffortGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. control effort. weight: {}", self.name, self.weight)
    }
}

/// Control effort goal bound to a model
#[derive(Debug, Clone)]
pub struct ControlEffort {
    name: String,
    weight: f64,
    /// (control index, weight)
    terms: Vec<(usize, f64)>,
}

impl ControlEffort {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn calc_integrand(&self, state: &State) -> f64 {
        let controls = state.controls();
        let integrand: f64 = self
            .terms
            .iter()
            .map(|&(index, w)| w * controls[index].powi(2))
            .sum();
        self.weight * integrand
    }
}

impl fmt::Display for ControlEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. control effort. weight: {}. number of controls: {}",
            self.name,
            self.weight,
            self.terms.len()
        )
    }
}
