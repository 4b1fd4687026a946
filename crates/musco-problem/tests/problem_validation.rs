//! Problem Validation Tests
//!
//! End-to-end checks of problem declaration and binding:
//! 1. Endpoint bounds must lie within the main bounds
//! 2. Declarations are name-indexed (upsert) or name-unique (append)
//! 3. Binding discovers multibody constraints and synthesizes multipliers
//! 4. Acceleration tracking matches a directly computed squared error
//! 5. Problems survive a JSON round trip

use approx::assert_relative_eq;
use nalgebra::Vector3;

use musco_core::model::{FrameMotion, PrescribedModel};
use musco_core::reference::TimeSeriesTableVec3;
use musco_core::{Bounds, BoundsError, FinalBounds, InitialBounds, Model, Stage, VariableInfo};
use musco_problem::{
    AccelerationTrackingGoal, ControlEffortGoal, ErrorCategory, Goal, Parameter, Phase,
    Problem, ProblemError,
};

const Q: &str = "/jointset/knee_r/knee_angle_r/value";

fn main_bounds() -> Bounds {
    Bounds::new(-1.0, 1.0).unwrap()
}

/// Walking model with one knee coordinate, two actuators and three
/// constraints, the middle one disabled
fn walker() -> PrescribedModel {
    PrescribedModel::new("walker")
        .with_state_variable(Q)
        .with_state_variable("/jointset/knee_r/knee_angle_r/speed")
        .with_actuator("/forceset/soleus_r")
        .with_actuator("/forceset/tibant_r")
        .with_constraint(true, 2, 0, 0)
        .with_constraint(false, 1, 0, 0)
        .with_constraint(true, 1, 1, 1)
        .with_property("/bodyset/tibia_r", "mass", 3.5)
}

/// Endpoint bounds vs main bounds: one case just inside and one just
/// outside each of the four inequalities
mod endpoint_bounds_tests {
    use super::*;

    fn check(initial: InitialBounds, final_: FinalBounds) -> Result<VariableInfo, BoundsError> {
        VariableInfo::new(Q, main_bounds(), initial, final_)
    }

    #[test]
    fn test_initial_lower() {
        assert!(check(InitialBounds::new(-1.0, 0.0).unwrap(), FinalBounds::unset()).is_ok());
        let err = check(InitialBounds::new(-1.001, 0.0).unwrap(), FinalBounds::unset()).unwrap_err();
        assert!(matches!(err, BoundsError::InitialLowerBelow { .. }));
        assert_eq!(
            err.to_string(),
            format!(
                "For variable {}, expected [initial value lower bound] >= [lower bound], \
                 but initial value lower bound=-1.001, lower bound=-1",
                Q
            )
        );
    }

    #[test]
    fn test_final_lower() {
        assert!(check(InitialBounds::unset(), FinalBounds::new(-1.0, 0.0).unwrap()).is_ok());
        assert!(matches!(
            check(InitialBounds::unset(), FinalBounds::new(-1.001, 0.0).unwrap()),
            Err(BoundsError::FinalLowerBelow { .. })
        ));
    }

    #[test]
    fn test_initial_upper() {
        assert!(check(InitialBounds::new(0.0, 1.0).unwrap(), FinalBounds::unset()).is_ok());
        assert!(matches!(
            check(InitialBounds::new(0.0, 1.001).unwrap(), FinalBounds::unset()),
            Err(BoundsError::InitialUpperAbove { .. })
        ));
    }

    #[test]
    fn test_final_upper() {
        assert!(check(InitialBounds::unset(), FinalBounds::new(0.0, 1.0).unwrap()).is_ok());
        assert!(matches!(
            check(InitialBounds::unset(), FinalBounds::new(0.0, 1.001).unwrap()),
            Err(BoundsError::FinalUpperAbove { .. })
        ));
    }

    #[test]
    fn test_phase_reports_validation_category() {
        let mut phase = Phase::new();
        let err = phase
            .set_state_info(Q, main_bounds(), InitialBounds::fixed(2.0), FinalBounds::unset())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}

/// Upsert and duplicate rejection
mod declaration_tests {
    use super::*;

    #[test]
    fn test_state_info_upsert_is_idempotent() {
        let mut problem = Problem::new();
        problem
            .set_state_info(Q, main_bounds(), InitialBounds::unset(), FinalBounds::unset())
            .unwrap();
        problem
            .set_state_info(Q, Bounds::new(-0.5, 0.5).unwrap(), InitialBounds::unset(), FinalBounds::unset())
            .unwrap();

        assert_eq!(problem.state_info_names().len(), 1);
        assert_eq!(problem.state_info(Q).unwrap().bounds().lower(), Some(-0.5));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut problem = Problem::new();
        problem.add_goal(ControlEffortGoal::new("effort")).unwrap();
        assert!(problem.add_goal(AccelerationTrackingGoal::new("effort")).is_err());
        assert_eq!(problem.goal_names().len(), 1);

        let mass = || Parameter::new("mass", ["/bodyset/tibia_r"], "mass", Bounds::unset());
        problem.add_parameter(mass()).unwrap();
        assert!(matches!(
            problem.add_parameter(mass()),
            Err(ProblemError::DuplicateName { kind: "parameter", .. })
        ));
        assert_eq!(problem.parameter_names().len(), 1);

        let activation = || {
            musco_problem::ControlBoundConstraint::new("activation", Bounds::new(0.0, 1.0).unwrap())
        };
        problem.add_path_constraint(activation()).unwrap();
        assert!(problem.add_path_constraint(activation()).is_err());
        assert_eq!(problem.path_constraint_names().len(), 1);
    }
}

/// Multibody constraint discovery and multipliers
mod multibody_tests {
    use super::*;

    #[test]
    fn test_multiplier_count_matches_equations() {
        let mut phase = Phase::new();
        phase.set_multiplier_bounds(Bounds::symmetric(250.0));
        let bound = phase.initialize(&walker()).unwrap();

        for constraint in bound.multibody_constraints() {
            let multipliers = bound.multiplier_infos(constraint.name()).unwrap();
            assert_eq!(
                multipliers.len(),
                constraint.num_position_equations()
                    + constraint.num_velocity_equations()
                    + constraint.num_acceleration_equations()
            );
            for m in multipliers {
                assert_eq!(m.bounds(), Bounds::symmetric(250.0));
            }
        }
        assert_eq!(bound.num_multipliers(), bound.num_multibody_constraint_equations());
    }

    #[test]
    fn test_reinitialize_reflects_only_new_model() {
        let phase = Phase::new();
        let model_a = walker();
        let model_b = PrescribedModel::new("other").with_constraint(false, 1, 0, 0).with_constraint(true, 0, 2, 0);

        let bound_a = phase.initialize(&model_a).unwrap();
        let bound_b = phase.initialize(&model_b).unwrap();

        assert_eq!(bound_a.multibody_constraint_names(), vec!["cid0", "cid2"]);
        assert_eq!(bound_b.multibody_constraint_names(), vec!["cid1"]);
        assert_eq!(bound_b.num_multipliers(), 2);
        assert!(bound_b.multiplier_infos("cid0").is_err());
        assert!(bound_b.is_bound_to(&model_b));
        assert!(!bound_b.is_bound_to(&model_a));
    }

    #[test]
    fn test_copied_model_is_a_different_instance() {
        let model = walker();
        let bound = Phase::new().initialize(&model).unwrap();
        assert!(!bound.is_bound_to(&model.clone()));
    }
}

/// Acceleration tracking against synthetic reference data
mod tracking_tests {
    use super::*;

    fn two_frame_model() -> PrescribedModel {
        PrescribedModel::new("tracker")
            .with_frame("A", FrameMotion::default().with_acceleration(Vector3::new(1.0, 0.0, 0.0)))
            .with_frame("B", FrameMotion::default().with_acceleration(Vector3::new(0.0, -2.0, 0.5)))
    }

    fn reference() -> TimeSeriesTableVec3 {
        let mut table = TimeSeriesTableVec3::new(vec![0.0, 0.1, 0.2]);
        table.append_column("A", vec![Vector3::zeros(); 3]).unwrap();
        table
            .append_column("B", vec![Vector3::new(0.0, -2.0, 0.5); 3])
            .unwrap();
        table
    }

    fn integrand(goal: AccelerationTrackingGoal, model: &PrescribedModel, t: f64) -> f64 {
        let mut phase = Phase::new();
        phase.add_goal(goal).unwrap();
        let bound = phase.initialize(model).unwrap();
        let mut state = model.default_state(t);
        bound.calc_goal_integrands(model, &mut state)[0]
    }

    #[test]
    fn test_weighted_squared_error_round_trip() {
        let model = two_frame_model();
        let mut goal = AccelerationTrackingGoal::new("tracking");
        goal.set_reference(reference());
        goal.set_weight_for_frame("A", 2.0);
        goal.set_weight_for_frame("B", 1.0);

        assert_relative_eq!(integrand(goal, &model, 0.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integrand_matches_direct_computation() {
        let model = two_frame_model();
        let mut goal = AccelerationTrackingGoal::new("tracking");
        goal.set_reference(reference());
        goal.set_weight_for_frame("B", 0.5);
        let tracker = goal.initialize(&model).unwrap();

        let mut state = model.default_state(0.15);
        model.realize(&mut state, Stage::Acceleration);
        let expected: f64 = tracker
            .frames()
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let error = model.frame_linear_acceleration(&state, f.frame)
                    - tracker.reference_acceleration(i, 0.15).unwrap();
                f.weight * error.norm_squared()
            })
            .sum();
        assert_relative_eq!(expected, 1.0, epsilon = 1e-12);

        let bound = Goal::from(goal).initialize(&model).unwrap();
        assert_eq!(bound.stage(), Stage::Acceleration);
        assert_relative_eq!(bound.calc_integrand(&model, &mut state), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_dual_reference_source_rejected() {
        let mut goal = AccelerationTrackingGoal::new("tracking");
        goal.set_reference(reference());
        goal.set_reference_file("accelerations.json");
        let err = goal.initialize(&two_frame_model()).unwrap_err();
        assert!(matches!(err, ProblemError::DualReferenceSource { .. }));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_redundant_columns_rejected() {
        let mut table = reference();
        table.append_column("A", vec![Vector3::zeros(); 3]).unwrap();

        let mut all_columns = AccelerationTrackingGoal::new("tracking");
        all_columns.set_reference(table.clone());
        assert!(matches!(
            all_columns.initialize(&two_frame_model()),
            Err(ProblemError::RedundantColumn { ref label, .. }) if label == "A"
        ));

        let mut selected = AccelerationTrackingGoal::new("tracking");
        selected.set_reference(table);
        selected.set_frame_paths(["B"]);
        assert!(matches!(
            selected.initialize(&two_frame_model()),
            Err(ProblemError::RedundantColumn { .. })
        ));
    }

    #[test]
    fn test_reference_file() {
        let path = std::env::temp_dir().join(format!(
            "musco_tracking_reference_{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"times": [0.0, 1.0],
                "labels": ["A", "B"],
                "data": [[[0.0, 0.0, 0.0], [0.0, -2.0, 0.5]],
                         [[2.0, 0.0, 0.0], [0.0, -2.0, 0.5]]]}"#,
        )
        .unwrap();

        let mut goal = AccelerationTrackingGoal::new("tracking");
        goal.set_reference_file(path.display().to_string());
        let model = two_frame_model();
        // Halfway the reference of A is (1, 0, 0): no error left
        let value = integrand(goal, &model, 0.5);
        std::fs::remove_file(&path).ok();
        assert_relative_eq!(value, 0.0, epsilon = 1e-12);
    }
}

/// Parameters
mod parameter_tests {
    use super::*;

    #[test]
    fn test_arity_mismatch_leaves_parameters_unchanged() {
        let mut model = walker();
        let mut problem = Problem::new();
        problem
            .add_parameter(Parameter::new("tibia_mass", ["/bodyset/tibia_r"], "mass", Bounds::unset()))
            .unwrap();

        let err = problem
            .apply_parameters_to_model(&[1.0, 2.0], &mut model)
            .unwrap_err();
        assert!(matches!(err, ProblemError::ArityMismatch { expected: 1, got: 2 }));
        assert_eq!(problem.parameter_names().len(), 1);
        assert_eq!(model.property("/bodyset/tibia_r", "mass"), Some(3.5));

        problem.apply_parameters_to_model(&[4.0], &mut model).unwrap();
        assert_eq!(model.property("/bodyset/tibia_r", "mass"), Some(4.0));
    }
}

/// JSON problem files
mod json_tests {
    use super::*;

    #[test]
    fn test_problem_round_trip() {
        let mut problem = Problem::new();
        problem.set_model_name("walker");
        problem.set_time_bounds(InitialBounds::fixed(0.0), FinalBounds::new(0.5, 1.5).unwrap());
        problem
            .set_state_info(Q, main_bounds(), InitialBounds::fixed(0.0), FinalBounds::unset())
            .unwrap();
        problem
            .set_control_info("/forceset/soleus_r", Bounds::new(0.0, 1.0).unwrap(), InitialBounds::unset(), FinalBounds::unset())
            .unwrap();
        problem
            .add_parameter(Parameter::new("tibia_mass", ["/bodyset/tibia_r"], "mass", Bounds::new(3.0, 4.0).unwrap()))
            .unwrap();
        let mut goal = AccelerationTrackingGoal::new("tracking");
        goal.set_reference_file("accelerations.json");
        goal.set_frame_paths(["/bodyset/tibia_r"]);
        problem.add_goal(goal).unwrap();
        problem.add_goal(ControlEffortGoal::new("effort")).unwrap();
        problem.set_multiplier_bounds(Bounds::symmetric(500.0));

        let json = problem.to_json_string().unwrap();
        let back = Problem::from_json_str(&json).unwrap();

        assert_eq!(back.goal_names(), vec!["tracking".to_string(), "effort".to_string()]);
        assert_eq!(back.state_info(Q).unwrap(), problem.state_info(Q).unwrap());
        assert_eq!(back.parameter("tibia_mass").unwrap(), problem.parameter("tibia_mass").unwrap());
        let phase = back.phase(0).unwrap();
        assert_eq!(phase.model_name(), "walker");
        assert_eq!(phase.time_final_bounds().upper(), Some(1.5));
        assert_eq!(phase.constraint_policy().multiplier_bounds, Bounds::symmetric(500.0));
        assert_eq!(back.to_string(), problem.to_string());
    }

    #[test]
    fn test_invalid_bounds_in_file_rejected() {
        let json = format!(
            r#"{{"phases": [{{"state_infos": [
                {{"name": "{}", "bounds": [-1.0, 1.0], "initial_bounds": [2.0, 2.0]}}
            ]}}]}}"#,
            Q
        );
        assert!(matches!(
            Problem::from_json_str(&json),
            Err(ProblemError::InvalidBounds(BoundsError::InitialUpperAbove { .. }))
        ));
    }

    #[test]
    fn test_inverted_bounds_in_file_rejected() {
        let inverted_state = format!(
            r#"{{"phases": [{{"state_infos": [{{"name": "{}", "bounds": [1.0, -1.0]}}]}}]}}"#,
            Q
        );
        let err = Problem::from_json_str(&inverted_state).unwrap_err();
        assert!(matches!(err, ProblemError::Json(_)));
        assert!(err.to_string().contains("lower bound=1"), "{}", err);

        let inverted_multipliers =
            r#"{"phases": [{"constraint_policy": {"multiplier_bounds": [5.0, -5.0]}}]}"#;
        assert!(Problem::from_json_str(inverted_multipliers).is_err());
    }

    #[test]
    fn test_direct_deserialization_validates() {
        let duplicate_goals = r#"{"phases": [{"goals": [
            {"type": "control_effort", "name": "effort"},
            {"type": "control_effort", "name": "effort"}
        ]}]}"#;
        assert!(serde_json::from_str::<Problem>(duplicate_goals).is_err());
        assert!(matches!(
            Problem::from_json_str(duplicate_goals),
            Err(ProblemError::DuplicateName { kind: "goal", .. })
        ));
    }
}
