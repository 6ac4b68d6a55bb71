//! Tick driven motion of the arm: joint moves, Cartesian moves, live jogging and the
//! sticky fault.

use std::sync::Arc;

use nalgebra::{Unit, UnitQuaternion, Vector3};
use tracing::{debug, warn};

use crate::arm::{ArmConfiguration, ArmSettings, JogFrame, LinearMove, MotionRequest, MotionState, MotionTarget, Speed, Termination};
use crate::capabilities::{FaultSink, LogFaultSink, ObjectId, RegisterProvider, SceneObject, SceneQuery};
use crate::cartesian::CartesianPath;
use crate::collisions::{can_pickup, BoxId};
use crate::end_effector::PickupOutcome;
use crate::interpolator::{advance_all, retarget};
use crate::kinematic_traits::{Joints, Kinematics, Pose};
use crate::kinematics_impl::{compare_poses, OPWKinematics};
use crate::motion_error::{JogAbort, MotionFault};
use crate::base::Base;

/// Flange must end a Cartesian move this close to the target, in meters and radians.
const ARRIVAL_DISTANCE: f64 = 1e-5;
const ARRIVAL_ANGLE: f64 = 1e-4;

const PATH_EPSILON: f64 = 1e-9;

pub struct ArmController {
    config: ArmConfiguration,
    kinematics: Base,
    faults: Box<dyn FaultSink>,
}

impl ArmController {
    /// Arm at zero joint angles, halted, reporting faults to the log.
    pub fn new(settings: ArmSettings) -> Self {
        Self::with_fault_sink(settings, Box::new(LogFaultSink))
    }

    pub fn with_fault_sink(settings: ArmSettings, faults: Box<dyn FaultSink>) -> Self {
        let kinematics = Base {
            robot: Arc::new(OPWKinematics::new(settings.parameters)),
            base: settings.base,
        };
        let mut controller = ArmController {
            config: ArmConfiguration::new(settings),
            kinematics,
            faults,
        };
        controller.refresh_boxes();
        controller
    }

    pub fn config(&self) -> &ArmConfiguration {
        &self.config
    }

    pub fn kinematics(&self) -> &dyn Kinematics {
        &self.kinematics
    }

    pub fn joint_angles(&self) -> Joints {
        self.config.joint_angles()
    }

    /// Places the arm without motion or range checks. Boxes follow immediately.
    pub fn set_joint_angles(&mut self, angles: &Joints) {
        self.config.commit(angles);
        self.refresh_boxes();
    }

    /// World pose of the flange.
    pub fn flange_pose(&self) -> Pose {
        self.kinematics.forward(&self.joint_angles())
    }

    pub fn motion_state(&self) -> MotionState {
        self.config.motion
    }

    pub fn is_faulted(&self) -> bool {
        self.config.fault.is_some()
    }

    pub fn fault(&self) -> Option<&MotionFault> {
        self.config.fault.as_ref()
    }

    pub fn clear_fault(&mut self) {
        if let Some(fault) = self.config.fault.take() {
            debug!("Fault cleared: {}", fault);
        }
    }

    pub fn termination(&self) -> Termination {
        self.config.termination
    }

    /// Starts a joint move at full speed.
    pub fn move_to_joints(&mut self, angles: &Joints) -> Result<(), MotionFault> {
        self.start_joint_move(angles, 1.0)
    }

    /// Starts a straight Cartesian move of the flange at full speed.
    pub fn move_to_pose(&mut self, pose: &Pose) -> Result<(), MotionFault> {
        self.start_linear_move(pose, 1.0)
    }

    /// Starts a circular Cartesian move through the position of `via` at full speed.
    pub fn move_circular(&mut self, via: &Pose, pose: &Pose) -> Result<(), MotionFault> {
        self.start_circular_move(via, pose, 1.0)
    }

    /// Starts the requested move at the requested speed.
    pub fn request(&mut self, request: &MotionRequest) -> Result<(), MotionFault> {
        let speed = match request.speed {
            Speed::Fraction(fraction) => fraction,
            Speed::MetersPerSecond(rate) => rate / self.config.settings.motor_speed,
        }.clamp(0.0, 1.0);
        match &request.target {
            MotionTarget::Joints(angles) => self.start_joint_move(angles, speed)?,
            MotionTarget::Pose(pose) => self.start_linear_move(pose, speed)?,
            MotionTarget::Arc { via, end } => self.start_circular_move(via, end, speed)?,
        }
        self.config.termination = request.termination;
        Ok(())
    }

    fn start_joint_move(&mut self, angles: &Joints, speed: f64) -> Result<(), MotionFault> {
        self.check_not_faulted()?;
        if let Err(fault) = self.validate(angles) {
            self.raise(fault.clone());
            return Err(fault);
        }
        self.config.stop_jog();
        self.config.linear = None;
        for (segment, &target) in self.config.segments.iter_mut().zip(angles.iter()) {
            retarget(segment, target);
        }
        self.config.joint_speed = speed;
        self.config.motion = MotionState::JointMoving;
        debug!("Joint move to {:?} at {:.0}%", angles, speed * 100.0);
        Ok(())
    }

    fn start_linear_move(&mut self, pose: &Pose, speed: f64) -> Result<(), MotionFault> {
        self.check_not_faulted()?;
        let path = CartesianPath::linear(self.flange_pose(), *pose);
        self.begin_path(path, speed);
        Ok(())
    }

    fn start_circular_move(&mut self, via: &Pose, pose: &Pose, speed: f64) -> Result<(), MotionFault> {
        self.check_not_faulted()?;
        match CartesianPath::circular(self.flange_pose(), via, *pose) {
            Ok(path) => {
                self.begin_path(path, speed);
                Ok(())
            }
            Err(fault) => {
                self.raise(fault.clone());
                Err(fault)
            }
        }
    }

    fn begin_path(&mut self, path: CartesianPath, speed: f64) {
        self.config.stop_jog();
        debug!("Cartesian move over {:.4} m at {:.0}%", path.length(), speed * 100.0);
        self.config.linear = Some(LinearMove { path, progress: 0.0, speed });
        self.config.motion = MotionState::LinearMoving;
    }

    /// Advances the simulation by one tick. `fraction` scales all speeds, 1.0 being the
    /// rated speed. Returns the motion state after the tick.
    pub fn tick(&mut self, fraction: f64) -> MotionState {
        if !self.is_faulted() {
            match self.config.motion {
                MotionState::JointMoving => self.step_joints(fraction),
                MotionState::LinearMoving => self.step_path(fraction),
                MotionState::Halted => {
                    if self.config.is_jogging() {
                        self.jog(fraction);
                    }
                }
            }
        }
        self.refresh_boxes();
        self.config.motion
    }

    fn step_joints(&mut self, fraction: f64) {
        let speed = self.config.joint_speed * fraction;
        let steps: Vec<f64> = self.config.segments.iter()
            .map(|segment| segment.speed * speed)
            .collect();
        if advance_all(&mut self.config.segments, &steps) {
            debug!("Joint move done");
            self.halt();
        }
    }

    fn step_path(&mut self, fraction: f64) {
        let Some(linear) = self.config.linear.as_mut() else {
            self.halt();
            return;
        };
        let settings = &self.config.settings;
        let linear_step = settings.motor_speed / settings.tick_rate * fraction * linear.speed;
        let angular_step = settings.orientation_speed / settings.tick_rate * fraction * linear.speed;

        let mut increment: f64 = 1.0;
        let length = linear.path.length();
        if length > PATH_EPSILON {
            increment = increment.min(linear_step / length);
        }
        let angle = linear.path.rotation_angle();
        if angle > PATH_EPSILON {
            increment = increment.min(angular_step / angle);
        }
        linear.progress = (linear.progress + increment).min(1.0);
        let progress = linear.progress;
        let next = linear.path.pose_at(progress);
        let end = *linear.path.end();

        if self.jump_to(&next).is_err() {
            return;
        }
        if progress >= 1.0 {
            if !compare_poses(&self.flange_pose(), &end, ARRIVAL_DISTANCE, ARRIVAL_ANGLE) {
                warn!("Cartesian move ended off target");
            }
            debug!("Cartesian move done");
            self.halt();
        }
    }

    /// Moves the arm straight to the pose. Either all joints move or, if the pose has no
    /// solution inside the joint ranges, none does and the arm faults.
    pub fn jump_to(&mut self, pose: &Pose) -> Result<(), MotionFault> {
        let angles = self.resolve_joints(pose)?;
        self.config.commit(&angles);
        Ok(())
    }

    /// Joint angles closest to the current ones that put the flange at the pose. The arm
    /// faults if there are none inside the joint ranges.
    pub fn resolve_joints(&mut self, pose: &Pose) -> Result<Joints, MotionFault> {
        self.check_not_faulted()?;
        let solved = match self.kinematics.solve(&self.joint_angles(), pose) {
            Some(angles) => self.validate(&angles).map(|_| angles),
            None => Err(MotionFault::Unreachable { position: pose.translation.vector }),
        };
        if let Err(fault) = &solved {
            self.raise(fault.clone());
        }
        solved
    }

    fn validate(&self, angles: &Joints) -> Result<(), MotionFault> {
        let constraints = &self.config.settings.constraints;
        match constraints.first_violation(angles) {
            Some(joint) => {
                let (lower, upper) = constraints.bounds(joint);
                Err(MotionFault::JointOutOfRange { joint, angle: angles[joint], lower, upper })
            }
            None => Ok(()),
        }
    }

    fn check_not_faulted(&self) -> Result<(), MotionFault> {
        match &self.config.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn raise(&mut self, fault: MotionFault) {
        warn!("Fault: {}", fault);
        self.faults.report(&fault);
        self.config.fault = Some(fault);
        self.halt();
    }

    /// Stops any move and all jogging. Joints stay where they are.
    pub fn halt(&mut self) {
        self.config.stop_jog();
        self.config.linear = None;
        self.config.motion = MotionState::Halted;
    }

    pub fn set_jog_frame(&mut self, frame: JogFrame) {
        self.halt();
        self.config.jog.frame = frame;
    }

    /// Sets the jog rate of one joint, -1.0 to 1.0. Applied in the joint jog frame only.
    /// A joint index the arm does not have is ignored.
    pub fn set_joint_jog(&mut self, joint: usize, rate: f64) {
        let Some(segment) = self.config.segments.get_mut(joint) else {
            warn!("No joint {} to jog", joint);
            return;
        };
        segment.jog_rate = rate.clamp(-1.0, 1.0);
        self.config.jog.abort = None;
    }

    /// Sets the Cartesian jog rates along the axes of the jog frame.
    pub fn set_linear_jog(&mut self, rates: Vector3<f64>) {
        self.config.jog.linear = rates;
    }

    /// Sets the Cartesian jog rates around the axes of the jog frame.
    pub fn set_rotational_jog(&mut self, rates: Vector3<f64>) {
        self.config.jog.rotational = rates;
    }

    /// Why the last joint jog stopped, if a joint reached its limit.
    pub fn jog_abort(&self) -> Option<JogAbort> {
        self.config.jog.abort
    }

    fn jog(&mut self, fraction: f64) {
        match self.config.jog.frame {
            JogFrame::Joint => {
                if let Err(abort) = self.jog_joints(fraction) {
                    warn!("{}", abort);
                    self.config.jog.abort = Some(abort);
                    self.halt();
                }
            }
            _ => {
                // Faults are raised and logged by jump_to
                let _ = self.jog_cartesian(fraction);
            }
        }
    }

    fn jog_joints(&mut self, fraction: f64) -> Result<(), JogAbort> {
        for (joint, segment) in self.config.segments.iter_mut().enumerate() {
            if segment.jog_rate == 0.0 {
                continue;
            }
            let trial = segment.angle() + segment.speed * segment.jog_rate * fraction;
            if segment.permits(trial) {
                segment.set_angle(trial);
                segment.set_target(trial);
            } else {
                segment.jog_rate = 0.0;
                return Err(JogAbort { joint, angle: trial });
            }
        }
        Ok(())
    }

    fn jog_cartesian(&mut self, fraction: f64) -> Result<(), MotionFault> {
        let current = self.flange_pose();
        let jog = &self.config.jog;
        let inverse = jog.frame.inverse_orientation();
        let mut target = jog.target.unwrap_or(current);

        if jog.is_translating() {
            let step = self.config.settings.jog_linear_step() * fraction;
            target.translation.vector += inverse * jog.linear * step;
        } else {
            target.translation = current.translation;
        }

        if jog.is_rotating() {
            if let Some(axis) = Unit::try_new(inverse * jog.rotational, PATH_EPSILON) {
                let theta = self.config.settings.jog_rotation_step * fraction;
                let rotated = UnitQuaternion::from_axis_angle(&axis, theta) * target.rotation;
                target.rotation = if rotated.coords.dot(&current.rotation.coords) < 0.0 {
                    UnitQuaternion::new_unchecked(-rotated.into_inner())
                } else {
                    rotated
                };
            }
        } else {
            target.rotation = current.rotation;
        }

        self.config.jog.target = Some(target);
        self.jump_to(&target)
    }

    /// Recomputes the world poses of every box from the current joint angles.
    fn refresh_boxes(&mut self) {
        let poses = self.kinematics.forward_with_joint_poses(&self.joint_angles());
        let ArmConfiguration { collisions, end_effector, .. } = &mut self.config;
        collisions.update(&self.kinematics.base, &poses, end_effector.effector_mut());
    }

    pub fn check_self_collisions(&mut self) -> bool {
        let ArmConfiguration { collisions, end_effector, .. } = &mut self.config;
        collisions.check_self_collisions(end_effector.effector_mut())
    }

    pub fn collision_pairs(&self) -> Vec<(BoxId, BoxId)> {
        self.config.collisions.collision_pairs(self.config.end_effector.effector())
    }

    pub fn check_object_collision(&mut self, object: &dyn SceneObject) -> bool {
        let ArmConfiguration { collisions, end_effector, .. } = &mut self.config;
        collisions.check_object_collision(end_effector.effector_mut(), object)
    }

    pub fn can_pickup(&self, object: &dyn SceneObject) -> bool {
        can_pickup(self.config.end_effector.effector(), object)
    }

    pub fn reset_display_states(&mut self) {
        let ArmConfiguration { collisions, end_effector, .. } = &mut self.config;
        collisions.reset_display_states(end_effector.effector_mut());
    }

    pub fn cycle_end_effector(&mut self, registers: &mut dyn RegisterProvider) {
        self.config.end_effector.cycle_end_effector(registers);
        self.refresh_boxes();
    }

    pub fn toggle_ee_state(&mut self, registers: &mut dyn RegisterProvider, scene: &dyn SceneQuery) -> PickupOutcome {
        self.config.end_effector.toggle_ee_state(registers, scene)
    }

    pub fn held(&self) -> Option<ObjectId> {
        self.config.end_effector.held()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::RecordingFaultSink;

    #[test]
    fn test_halt_is_idempotent() {
        let mut arm = ArmController::new(ArmSettings::default());
        arm.move_to_joints(&[0.5, 0.0, 0.0, 0.0, 0.0, 0.0]).expect("target is in range");
        assert_eq!(arm.motion_state(), MotionState::JointMoving);
        arm.halt();
        arm.halt();
        assert_eq!(arm.motion_state(), MotionState::Halted);
        assert_eq!(arm.tick(1.0), MotionState::Halted);
    }

    #[test]
    fn test_out_of_range_target_faults() {
        let mut arm = ArmController::with_fault_sink(ArmSettings::default(), Box::new(RecordingFaultSink::default()));
        let result = arm.move_to_joints(&[0.0, std::f64::consts::PI, 0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(result, Err(MotionFault::JointOutOfRange { joint: 1, .. })));
        assert!(arm.is_faulted());
        assert_eq!(arm.motion_state(), MotionState::Halted);
        // Sticky until cleared
        assert!(arm.move_to_joints(&[0.1, 0.0, 0.0, 0.0, 0.0, 0.0]).is_err());
        arm.clear_fault();
        assert!(arm.move_to_joints(&[0.1, 0.0, 0.0, 0.0, 0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_request_speed() {
        let mut arm = ArmController::new(ArmSettings::default());
        let request = MotionRequest {
            target: MotionTarget::Joints([0.2, 0.0, 0.0, 0.0, 0.0, 0.0]),
            speed: Speed::Fraction(0.5),
            termination: Termination::Continuous(50),
        };
        arm.request(&request).expect("target is in range");
        let step = arm.config().segments[0].speed * 0.5;
        arm.tick(1.0);
        assert!((arm.joint_angles()[0] - step).abs() < 1e-12);
        assert_eq!(arm.termination(), Termination::Continuous(50));
    }
}
