#[cfg(test)]
mod tests {
    use nalgebra::{Translation3, UnitQuaternion};
    use crate::arm::{ArmSettings, MotionState};
    use crate::constraints::Constraints;
    use crate::kinematic_traits::{Joints, Kinematics, Pose};
    use crate::motion_error::MotionFault;
    use crate::tests::test_utils::{arm_at, arm_with, joints_close, WORKING_POSE};

    #[test]
    fn test_jump_to_reachable_pose() {
        let (mut arm, faults) = arm_at(&WORKING_POSE);
        let wanted: Joints = [0.2, 0.35, 0.5, 0.1, 0.6, -0.1];
        let pose = arm.kinematics().forward(&wanted);

        arm.jump_to(&pose).expect("pose is reachable");
        assert!(joints_close(&arm.joint_angles(), &wanted, 1e-6),
                "Got {:?}", arm.joint_angles());
        assert_eq!(faults.count(), 0);
        assert_eq!(arm.motion_state(), MotionState::Halted);
    }

    #[test]
    fn test_unreachable_pose_changes_nothing() {
        let (mut arm, faults) = arm_at(&WORKING_POSE);
        let before = arm.joint_angles();
        let far = Pose::from_parts(Translation3::new(5.0, 0.0, 0.0), UnitQuaternion::identity());

        let result = arm.jump_to(&far);
        assert!(matches!(result, Err(MotionFault::Unreachable { .. })));
        assert_eq!(arm.joint_angles(), before);
        assert!(arm.is_faulted());
        assert_eq!(arm.motion_state(), MotionState::Halted);
        assert_eq!(faults.count(), 1);

        // While faulted, even reachable poses are refused and not reported again
        let near = arm.kinematics().forward(&WORKING_POSE);
        assert!(arm.jump_to(&near).is_err());
        assert_eq!(faults.count(), 1);
        assert_eq!(arm.joint_angles(), before);

        arm.clear_fault();
        arm.jump_to(&near).expect("fault was cleared");
    }

    #[test]
    fn test_solution_outside_range_changes_nothing() {
        let mut settings = ArmSettings::default();
        let mut from = settings.constraints.from;
        let mut to = settings.constraints.to;
        from[0] = -0.5;
        to[0] = 0.5;
        settings.constraints = Constraints::new(from, to);

        let (mut arm, faults) = arm_with(settings, &WORKING_POSE);
        let before = arm.joint_angles();
        let pose = arm.kinematics().forward(&[1.0, 0.3, 0.6, 0.0, 0.5, 0.0]);

        let result = arm.jump_to(&pose);
        assert!(matches!(result, Err(MotionFault::JointOutOfRange { joint: 0, .. })), "{:?}", result);
        assert_eq!(arm.joint_angles(), before);
        assert!(arm.is_faulted());
        assert_eq!(faults.last(), result.err());
    }

    #[test]
    fn test_resolve_joints_does_not_move() {
        let (mut arm, _) = arm_at(&WORKING_POSE);
        let wanted: Joints = [-0.3, 0.25, 0.65, 0.0, 0.45, 0.2];
        let pose = arm.kinematics().forward(&wanted);

        let resolved = arm.resolve_joints(&pose).expect("pose is reachable");
        assert!(joints_close(&resolved, &wanted, 1e-6));
        assert_eq!(arm.joint_angles(), WORKING_POSE);
    }
}
