//! musco Problem
//!
//! Declarative model of a musculoskeletal optimal control problem.
//!
//! A [`Problem`] holds one or more phases. Each [`Phase`] declares bounds
//! on time, states, controls and parameters, a set of goals (cost terms)
//! and path constraints. Declarations refer to model components by path
//! only; [`Phase::initialize`] resolves them against a [`musco_core::Model`]
//! and produces a [`BoundPhase`]:
//!
//! ```text
//! minimize    Σ_goals ∫ integrand(t, x, u, p) dt
//! subject to  ẋ = f(x, u, p, λ)           (multibody dynamics)
//!             0 = φ(q), ν(q, u), α(q, u, u̇)  (multibody constraints)
//!             lb ≤ g(t, x, u, p) ≤ ub     (path constraints)
//! ```
//!
//! # Components
//!
//! - [`phase`]: Phase declaration and binding
//! - [`problem`]: Multi-phase problem
//! - [`goal`]: Acceleration tracking and control effort goals
//! - [`path_constraint`]: Frame distance and control bound constraints
//! - [`multibody`]: Multibody constraints and Lagrange multipliers
//! - [`parameter`]: Time-invariant model parameters
//! - [`config`]: Constraint bound policies and JSON problem files

pub mod config;
pub mod error;
pub mod goal;
pub mod multibody;
pub mod parameter;
pub mod path_constraint;
pub mod phase;
pub mod problem;

// Re-exports
pub use config::ConstraintPolicy;
pub use error::{ErrorCategory, ProblemError};
pub use goal::{
    AccelerationTracker, AccelerationTrackingGoal, BoundGoal, ControlEffort, ControlEffortGoal,
    Goal,
};
pub use multibody::MultibodyConstraint;
pub use parameter::Parameter;
pub use path_constraint::{
    BoundPathConstraint, ConstraintEvaluation, ControlBoundConstraint, FrameDistanceConstraint,
    PathConstraint,
};
pub use phase::{BoundPhase, Phase};
pub use problem::{BoundProblem, Problem};
