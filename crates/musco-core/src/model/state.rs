//! Simulation state and realization stages

use nalgebra::DVector;

/// Computation stages, in the order the engine realizes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Topology,
    Model,
    Instance,
    Time,
    Position,
    Velocity,
    Dynamics,
    Acceleration,
    Report,
}

/// One instant of a trajectory as seen by the physics engine
///
/// Holds time, generalized coordinates `q`, generalized speeds `u` and the
/// actuator controls, plus the stage up to which derived quantities are
/// valid. Changing an input drops the stage back to where that input
/// enters the computation.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    time: f64,
    q: DVector<f64>,
    u: DVector<f64>,
    controls: DVector<f64>,
    stage: Stage,
}

impl State {
    pub fn new(time: f64, q: DVector<f64>, u: DVector<f64>, controls: DVector<f64>) -> Self {
        Self {
            time,
            q,
            u,
            controls,
            stage: Stage::Time,
        }
    }

    /// State at `time` with zero coordinates, speeds and controls
    pub fn zeros(time: f64, num_q: usize, num_u: usize, num_controls: usize) -> Self {
        Self::new(
            time,
            DVector::zeros(num_q),
            DVector::zeros(num_u),
            DVector::zeros(num_controls),
        )
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
        self.invalidate(Stage::Instance);
    }

    pub fn q(&self) -> &DVector<f64> {
        &self.q
    }

    pub fn set_q(&mut self, q: DVector<f64>) {
        self.q = q;
        self.invalidate(Stage::Time);
    }

    pub fn u(&self) -> &DVector<f64> {
        &self.u
    }

    pub fn set_u(&mut self, u: DVector<f64>) {
        self.u = u;
        self.invalidate(Stage::Position);
    }

    pub fn controls(&self) -> &DVector<f64> {
        &self.controls
    }

    pub fn set_controls(&mut self, controls: DVector<f64>) {
        self.controls = controls;
        self.invalidate(Stage::Velocity);
    }

    /// Highest stage whose quantities are valid
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Mark the state realized through `stage` (never moves backwards)
    pub fn advance_to(&mut self, stage: Stage) {
        self.stage = self.stage.max(stage);
    }

    fn invalidate(&mut self, stage: Stage) {
        self.stage = self.stage.min(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert!(Stage::Position < Stage::Velocity);
        assert!(Stage::Velocity < Stage::Acceleration);
    }

    #[test]
    fn test_advance_and_invalidate() {
        let mut state = State::zeros(0.0, 2, 2, 1);
        assert_eq!(state.stage(), Stage::Time);

        state.advance_to(Stage::Acceleration);
        state.advance_to(Stage::Position);
        assert_eq!(state.stage(), Stage::Acceleration);

        state.set_u(DVector::from_vec(vec![1.0, 2.0]));
        assert_eq!(state.stage(), Stage::Position);

        state.set_time(0.5);
        assert_eq!(state.stage(), Stage::Instance);
        assert_eq!(state.time(), 0.5);
    }
}
