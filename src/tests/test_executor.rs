#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use crate::arm::{MotionState, Termination};
    use crate::capabilities::{Frames, Registers};
    use crate::controller::ArmController;
    use crate::executor::{MotionInstruction, MotionInstructionExecutor, Program, ProgramRunner, PointRef, RunnerState};
    use crate::frame::Frame;
    use crate::kinematic_traits::{Joints, Pose};
    use crate::motion_error::{EvaluationError, ExecutionError, MotionFault};
    use crate::point::Point;
    use crate::tests::test_utils::{arm_at, joints_close, WORKING_POSE};
    use crate::utils::assert_pose_eq;

    fn shifted(x: f64, y: f64, z: f64) -> Frame {
        Frame::new(Vector3::new(x, y, z), UnitQuaternion::identity())
    }

    /// Runs the program to its end, ticking the arm after every update of the runner.
    fn run(runner: &mut ProgramRunner, arm: &mut ArmController, executor: &MotionInstructionExecutor,
           program: &Program) -> RunnerState {
        for _ in 0..5000 {
            let state = runner.update(arm, executor, program).clone();
            if matches!(state, RunnerState::Finished | RunnerState::Stopped(_)) {
                return state;
            }
            arm.tick(1.0);
        }
        panic!("Program {} did not end", program.name);
    }

    fn joint_program(targets: &[Joints]) -> Program {
        let mut program = Program::new("joints");
        for (index, joints) in targets.iter().enumerate() {
            program.positions.insert(index, Point::from_joints(*joints));
            program.instructions.push(MotionInstruction::joint(PointRef::Local(index), 1.0));
        }
        program
    }

    #[test]
    fn test_resolution_order() {
        let mut registers = Registers::default();
        registers.set_position(1, Point::from_pose(&Pose::translation(0.0, 0.0, 0.05)));
        let mut frames = Frames::default();
        frames.user.insert(2, shifted(0.1, 0.0, 0.0));
        frames.tool.insert(3, shifted(0.0, 0.0, 0.1));

        let mut program = Program::new("resolve");
        program.positions.insert(0, Point::from_pose(&Pose::translation(0.2, 0.0, 1.0)));
        let instruction = MotionInstruction::linear(PointRef::Local(0), 0.5)
            .with_offset(1)
            .with_frames(Some(3), Some(2));

        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let resolved = executor.resolve(&instruction, &program).expect("everything is defined");
        assert!((resolved.position - Vector3::new(0.3, 0.0, 0.95)).norm() < 1e-12, "{:?}", resolved.position);
        assert!(resolved.orientation.angle() < 1e-12);
    }

    #[test]
    fn test_tool_frame_keeps_joints() {
        let registers = Registers::default();
        let mut frames = Frames::default();
        frames.tool.insert(0, shifted(0.0, 0.0, 0.1));
        let mut program = Program::new("joints");
        program.positions.insert(0, Point::with_joints(&Pose::translation(0.5, 0.0, 1.0), WORKING_POSE));
        let instruction = MotionInstruction::joint(PointRef::Local(0), 1.0).with_frames(Some(0), None);

        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let resolved = executor.resolve(&instruction, &program).expect("everything is defined");
        assert_eq!(resolved.joints, Some(WORKING_POSE));
        assert!((resolved.position.z - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_rotating_offset_turns_around_tcp() {
        let mut registers = Registers::default();
        let turn = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        registers.set_position(1, Point::from_pose(&Pose::from_parts(Translation3::identity(), turn)));
        let mut frames = Frames::default();
        frames.tool.insert(0, shifted(0.0, 0.0, 0.1));

        let mut program = Program::new("turn");
        program.positions.insert(0, Point::from_pose(&Pose::translation(0.5, 0.0, 1.0)));
        let instruction = MotionInstruction::linear(PointRef::Local(0), 0.5)
            .with_offset(1)
            .with_frames(Some(0), None);

        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let flange = executor.resolve(&instruction, &program).expect("everything is defined").pose();
        assert!((flange.translation.vector - Vector3::new(0.5, 0.1, 1.0)).norm() < 1e-12, "{:?}", flange.translation);
        let tcp = flange * Translation3::new(0.0, 0.0, 0.1);
        assert!((tcp.translation.vector - Vector3::new(0.5, 0.0, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_resolution_errors() {
        let mut registers = Registers::default();
        registers.positions.insert(2, None);
        let frames = Frames::default();
        let mut program = Program::new("errors");
        program.positions.insert(0, Point::from_joints([0.0; 6]));
        let executor = MotionInstructionExecutor::new(&registers, &frames);

        let missing = MotionInstruction::joint(PointRef::Local(5), 1.0);
        assert_eq!(executor.resolve(&missing, &program), Err(ExecutionError::MissingPoint(5)));

        let uninitialized = MotionInstruction::joint(PointRef::Global(2), 1.0);
        assert_eq!(executor.resolve(&uninitialized, &program),
                   Err(ExecutionError::Evaluation(EvaluationError::Uninitialized(2))));

        let undefined_offset = MotionInstruction::joint(PointRef::Local(0), 1.0).with_offset(9);
        assert_eq!(executor.resolve(&undefined_offset, &program),
                   Err(ExecutionError::Evaluation(EvaluationError::UndefinedRegister(9))));

        let no_user = MotionInstruction::joint(PointRef::Local(0), 1.0).with_frames(None, Some(1));
        assert_eq!(executor.resolve(&no_user, &program), Err(ExecutionError::MissingUserFrame(1)));

        let no_tool = MotionInstruction::joint(PointRef::Local(0), 1.0).with_frames(Some(4), None);
        assert_eq!(executor.resolve(&no_tool, &program), Err(ExecutionError::MissingToolFrame(4)));
    }

    #[test]
    fn test_circular_needs_secondary() {
        let registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, _) = arm_at(&WORKING_POSE);
        let mut program = Program::new("arc");
        program.positions.insert(0, Point::from_pose(&arm.flange_pose()));
        let instruction = MotionInstruction {
            secondary: None,
            ..MotionInstruction::circular(PointRef::Local(0), PointRef::Local(1), 0.1)
        };

        let executor = MotionInstructionExecutor::new(&registers, &frames);
        assert_eq!(executor.execute(&mut arm, &instruction, &program), Err(ExecutionError::MissingSecondary));
        assert_eq!(arm.motion_state(), MotionState::Halted);
    }

    #[test]
    fn test_faulted_arm_refuses() {
        let registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, _) = arm_at(&WORKING_POSE);
        assert!(arm.move_to_joints(&[0.0, 3.0, 0.0, 0.0, 0.0, 0.0]).is_err());

        let program = joint_program(&[[0.1, 0.0, 0.0, 0.0, 0.0, 0.0]]);
        let executor = MotionInstructionExecutor::new(&registers, &frames);
        assert_eq!(executor.execute(&mut arm, &program.instructions[0], &program), Err(ExecutionError::Faulted));
    }

    #[test]
    fn test_runner_finishes() {
        let registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, faults) = arm_at(&[0.0; 6]);
        let targets = [
            [0.5, 0.2, 0.3, 0.0, 0.4, 0.0],
            WORKING_POSE,
            [0.0; 6],
        ];
        let program = joint_program(&targets);
        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let mut runner = ProgramRunner::new(false);

        assert_eq!(run(&mut runner, &mut arm, &executor, &program), RunnerState::Finished);
        assert_eq!(runner.next_instruction(), 3);
        assert!(joints_close(&arm.joint_angles(), &[0.0; 6], 1e-12));
        assert_eq!(faults.count(), 0);
    }

    #[test]
    fn test_single_step() {
        let registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, _) = arm_at(&[0.0; 6]);
        let targets = [[0.2, 0.0, 0.0, 0.0, 0.0, 0.0], [0.4, 0.0, 0.0, 0.0, 0.0, 0.0]];
        let program = joint_program(&targets);
        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let mut runner = ProgramRunner::new(true);

        assert_eq!(runner.update(&mut arm, &executor, &program), &RunnerState::Running);
        assert_eq!(arm.motion_state(), MotionState::JointMoving);
        // Still moving, the runner waits
        arm.tick(1.0);
        assert_eq!(runner.update(&mut arm, &executor, &program), &RunnerState::Running);
        while arm.tick(1.0) != MotionState::Halted {}

        assert_eq!(runner.update(&mut arm, &executor, &program), &RunnerState::Paused);
        assert_eq!(runner.update(&mut arm, &executor, &program), &RunnerState::Paused);
        assert_eq!(runner.next_instruction(), 1);
        assert!(joints_close(&arm.joint_angles(), &targets[0], 1e-12));

        runner.resume();
        runner.set_single_step(false);
        assert_eq!(run(&mut runner, &mut arm, &executor, &program), RunnerState::Finished);
        assert!(joints_close(&arm.joint_angles(), &targets[1], 1e-12));
    }

    #[test]
    fn test_runner_stops_on_fault() {
        let mut registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, faults) = arm_at(&WORKING_POSE);
        let far = Translation3::new(3.0, 0.0, 0.0) * arm.flange_pose();
        registers.set_position(0, Point::from_pose(&far));

        let mut program = Program::new("too far");
        program.instructions.push(MotionInstruction::linear(PointRef::Global(0), 1.0));
        program.instructions.push(MotionInstruction::joint(PointRef::Global(0), 1.0));
        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let mut runner = ProgramRunner::new(false);

        assert_eq!(run(&mut runner, &mut arm, &executor, &program), RunnerState::Stopped(ExecutionError::Faulted));
        assert_eq!(runner.next_instruction(), 1);
        assert_eq!(faults.count(), 1);

        // A joint move to a pose without solution fails before anything moves
        arm.clear_fault();
        let result = executor.execute(&mut arm, &program.instructions[1], &program);
        assert!(matches!(result, Err(ExecutionError::Motion(MotionFault::Unreachable { .. }))), "{:?}", result);
        assert_eq!(arm.motion_state(), MotionState::Halted);
    }

    #[test]
    fn test_program_with_arc() {
        let registers = Registers::default();
        let frames = Frames::default();
        let (mut arm, faults) = arm_at(&WORKING_POSE);
        let start = arm.flange_pose();

        let mut program = Program::new("arc");
        program.positions.insert(0, Point::from_pose(&(Translation3::new(-0.05, 0.05, 0.0) * start)));
        program.positions.insert(1, Point::from_pose(&(Translation3::new(-0.1, 0.0, 0.0) * start)));
        program.instructions.push(
            MotionInstruction::circular(PointRef::Local(0), PointRef::Local(1), 0.5)
                .with_termination(Termination::Continuous(100)));
        let executor = MotionInstructionExecutor::new(&registers, &frames);
        let mut runner = ProgramRunner::new(false);

        assert_eq!(run(&mut runner, &mut arm, &executor, &program), RunnerState::Finished);
        assert_eq!(faults.count(), 0);
        assert_eq!(arm.termination(), Termination::Continuous(100));
        assert_pose_eq(&arm.flange_pose(), &program.positions[&1].pose(), 1e-5, 1e-4);
    }
}
