//! Settings of the simulated arm and the state it carries between ticks.

use std::f64::consts::PI;

use nalgebra::{UnitQuaternion, Vector3};

use crate::cartesian::CartesianPath;
use crate::collisions::CollisionDetector;
use crate::constraints::Constraints;
use crate::end_effector::{EndEffectorController, EndEffectorKind};
use crate::frame::Frame;
use crate::joint_segment::{JointSegment, RotationAxis};
use crate::kinematic_traits::{Joints, Pose};
use crate::motion_error::{JogAbort, MotionFault};
use crate::parameters::opw_kinematics::Parameters;

/// Physical description of the arm and the rates of the simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmSettings {
    pub parameters: Parameters,
    pub constraints: Constraints,

    /// Radians per tick at full speed.
    pub joint_speeds: Joints,

    /// Local axis each joint rotates around.
    pub axes: [RotationAxis; 6],

    /// Mount pose of the arm in the world.
    pub base: Pose,

    /// Rated speed of the flange in Cartesian moves, m/s.
    pub motor_speed: f64,

    /// Ticks per second.
    pub tick_rate: f64,

    /// Rated rotation speed of the flange in Cartesian moves, rad/s.
    pub orientation_speed: f64,

    /// Rotation per tick of the Cartesian jog at full speed, in radians.
    pub jog_rotation_step: f64,
}

impl Default for ArmSettings {
    /// The simulated six axis arm mounted at the world origin.
    fn default() -> Self {
        let per_tick = |degrees_per_second: f64| degrees_per_second.to_radians() / 60.0;
        ArmSettings {
            parameters: Parameters::simulated_arm(),
            constraints: Constraints::new(
                [0.0, 4.34, 5.027, 0.0, 59.0 * PI / 40.0, 0.0],
                [0.0, 2.01, 4.363, 0.0, 11.0 * PI / 20.0, 0.0],
            ),
            joint_speeds: [
                per_tick(150.0), per_tick(150.0), per_tick(200.0),
                per_tick(250.0), per_tick(250.0), per_tick(420.0),
            ],
            axes: [
                RotationAxis::Z, RotationAxis::Y, RotationAxis::Y,
                RotationAxis::Z, RotationAxis::Y, RotationAxis::Z,
            ],
            base: Pose::identity(),
            motor_speed: 1.0,
            tick_rate: 60.0,
            orientation_speed: PI,
            jog_rotation_step: 2.5_f64.to_radians(),
        }
    }
}

impl ArmSettings {
    /// Flange travel per tick of the Cartesian jog at full speed, in meters.
    pub fn jog_linear_step(&self) -> f64 {
        self.motor_speed / self.tick_rate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Halted,
    JointMoving,
    LinearMoving,
}

/// Reference frame of the live jog.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum JogFrame {
    /// Every joint jogs on its own.
    #[default]
    Joint,
    World,
    Tool(Frame),
    User(Frame),
}

impl JogFrame {
    /// Orientation jog vectors are rotated through before they are applied in world coordinates.
    pub(crate) fn inverse_orientation(&self) -> UnitQuaternion<f64> {
        match self {
            JogFrame::Joint | JogFrame::World => UnitQuaternion::identity(),
            JogFrame::Tool(frame) | JogFrame::User(frame) => frame.orientation.inverse(),
        }
    }
}

/// Cartesian jog input. Components are rates between -1.0 and 1.0.
#[derive(Debug, Clone, Default)]
pub struct JogState {
    pub frame: JogFrame,
    pub linear: Vector3<f64>,
    pub rotational: Vector3<f64>,

    /// Pose the Cartesian jog accumulates towards. Starts at the current pose.
    pub(crate) target: Option<Pose>,

    /// Reason the last joint jog stopped, if it stopped at a range limit.
    pub(crate) abort: Option<JogAbort>,
}

impl JogState {
    pub fn is_translating(&self) -> bool {
        self.linear != Vector3::zeros()
    }

    pub fn is_rotating(&self) -> bool {
        self.rotational != Vector3::zeros()
    }
}

/// Commanded speed of a move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Speed {
    /// Fraction of the rated speed, 0.0 to 1.0.
    Fraction(f64),
    /// Flange speed in m/s.
    MetersPerSecond(f64),
}

/// How the move ends. Moves always stop exactly at the target; the tolerance of a
/// continuous termination is only carried along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    #[default]
    Fine,
    Continuous(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MotionTarget {
    Joints(Joints),
    Pose(Pose),
    Arc { via: Pose, end: Pose },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MotionRequest {
    pub target: MotionTarget,
    pub speed: Speed,
    pub termination: Termination,
}

impl MotionRequest {
    pub fn new(target: MotionTarget, speed: Speed) -> Self {
        MotionRequest { target, speed, termination: Termination::Fine }
    }
}

/// Cartesian move in progress.
#[derive(Debug, Clone)]
pub(crate) struct LinearMove {
    pub path: CartesianPath,
    /// Fraction of the path already travelled.
    pub progress: f64,
    /// Fraction of the rated speed.
    pub speed: f64,
}

/// Everything that changes while the arm runs. Segments and boxes are built once and
/// mutated in place.
#[derive(Debug, Clone)]
pub struct ArmConfiguration {
    pub settings: ArmSettings,
    pub segments: Vec<JointSegment>,
    pub collisions: CollisionDetector,
    pub end_effector: EndEffectorController,
    pub jog: JogState,
    pub(crate) motion: MotionState,
    pub(crate) fault: Option<MotionFault>,
    pub(crate) linear: Option<LinearMove>,
    /// Fraction of the rated speed of the current joint move.
    pub(crate) joint_speed: f64,
    pub(crate) termination: Termination,
}

impl ArmConfiguration {
    pub fn new(settings: ArmSettings) -> Self {
        let segments = (0..6)
            .map(|joint| {
                let (lower, upper) = settings.constraints.bounds(joint);
                JointSegment::new(settings.axes[joint], lower, upper, settings.joint_speeds[joint])
            })
            .collect();
        ArmConfiguration {
            settings,
            segments,
            collisions: CollisionDetector::new(),
            end_effector: EndEffectorController::new(EndEffectorKind::None),
            jog: JogState::default(),
            motion: MotionState::Halted,
            fault: None,
            linear: None,
            joint_speed: 1.0,
            termination: Termination::Fine,
        }
    }

    pub fn joint_angles(&self) -> Joints {
        std::array::from_fn(|joint| self.segments[joint].angle())
    }

    /// Sets the angles and the targets of all joints.
    pub(crate) fn commit(&mut self, angles: &Joints) {
        for (segment, &angle) in self.segments.iter_mut().zip(angles.iter()) {
            segment.set_angle(angle);
            segment.set_target(angle);
        }
    }

    /// Zeroes every jog rate.
    pub(crate) fn stop_jog(&mut self) {
        for segment in self.segments.iter_mut() {
            segment.jog_rate = 0.0;
        }
        self.jog.linear = Vector3::zeros();
        self.jog.rotational = Vector3::zeros();
        self.jog.target = None;
    }

    pub(crate) fn is_jogging(&self) -> bool {
        match self.jog.frame {
            JogFrame::Joint => self.segments.iter().any(|segment| segment.jog_rate != 0.0),
            _ => self.jog.is_translating() || self.jog.is_rotating(),
        }
    }
}
