//! Errors raised while moving the arm or resolving motion instructions.

use std::error::Error;
use std::fmt;

use nalgebra::Vector3;

/// Failure of a move. It is sticky: the arm stays faulted and does not move until
/// the fault is cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionFault {
    /// No inverse kinematics solution for the pose.
    Unreachable { position: Vector3<f64> },
    /// Solution exists but violates the range of the joint.
    JointOutOfRange { joint: usize, angle: f64, lower: f64, upper: f64 },
    /// The three points of a circular move do not define a circle.
    DegenerateArc,
}

impl fmt::Display for MotionFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MotionFault::Unreachable { position } =>
                write!(f, "Pose at ({:.4}, {:.4}, {:.4}) is unreachable", position.x, position.y, position.z),
            MotionFault::JointOutOfRange { joint, angle, lower, upper } =>
                write!(f, "J{} at {:.2}° is outside [{:.2}°, {:.2}°]",
                       joint + 1, angle.to_degrees(), lower.to_degrees(), upper.to_degrees()),
            MotionFault::DegenerateArc =>
                write!(f, "Circular move through colinear points"),
        }
    }
}

impl Error for MotionFault {}

/// Live jog of a joint would leave its range. Jogging stops but no fault is raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogAbort {
    pub joint: usize,
    pub angle: f64,
}

impl fmt::Display for JogAbort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Jog stopped: J{} would move to {:.2}°", self.joint + 1, self.angle.to_degrees())
    }
}

impl Error for JogAbort {}

/// Failure to produce a position from a register.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationError {
    UndefinedRegister(usize),
    Uninitialized(usize),
    Expression(String),
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvaluationError::UndefinedRegister(index) => write!(f, "PR[{}] does not exist", index),
            EvaluationError::Uninitialized(index) => write!(f, "PR[{}] is not initialized", index),
            EvaluationError::Expression(msg) => write!(f, "Expression error: {}", msg),
        }
    }
}

impl Error for EvaluationError {}

/// Failure to resolve or start a motion instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    MissingPoint(usize),
    MissingToolFrame(usize),
    MissingUserFrame(usize),
    /// Circular instruction without its secondary point.
    MissingSecondary,
    Evaluation(EvaluationError),
    Motion(MotionFault),
    /// The arm is faulted and does not accept moves.
    Faulted,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutionError::MissingPoint(index) => write!(f, "P[{}] is not defined", index),
            ExecutionError::MissingToolFrame(index) => write!(f, "Tool frame {} is not defined", index),
            ExecutionError::MissingUserFrame(index) => write!(f, "User frame {} is not defined", index),
            ExecutionError::MissingSecondary => write!(f, "Circular motion without secondary point"),
            ExecutionError::Evaluation(err) => write!(f, "{}", err),
            ExecutionError::Motion(fault) => write!(f, "{}", fault),
            ExecutionError::Faulted => write!(f, "Arm is faulted"),
        }
    }
}

impl Error for ExecutionError {}

impl From<EvaluationError> for ExecutionError {
    fn from(err: EvaluationError) -> Self {
        ExecutionError::Evaluation(err)
    }
}

impl From<MotionFault> for ExecutionError {
    fn from(fault: MotionFault) -> Self {
        ExecutionError::Motion(fault)
    }
}
