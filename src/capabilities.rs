//! Narrow interfaces the simulator needs from its host: registers, frames, fault
//! reporting and the scene. Simple in-memory implementations are provided.

use std::collections::HashMap;

use tracing::warn;

use crate::frame::Frame;
use crate::joint_body::BoundingBox;
use crate::motion_error::{EvaluationError, MotionFault};
use crate::point::Point;

pub type ObjectId = usize;

/// Position registers and digital I/O registers.
pub trait RegisterProvider {
    /// Resolved point stored in the position register.
    fn position(&self, index: usize) -> Result<Point, EvaluationError>;

    /// State of the I/O register, None if there is no such register.
    fn io(&self, index: usize) -> Option<bool>;

    fn set_io(&mut self, index: usize, on: bool);
}

/// Tool and user frames taught on the host.
pub trait FrameProvider {
    fn tool_frame(&self, index: usize) -> Option<Frame>;
    fn user_frame(&self, index: usize) -> Option<Frame>;
}

/// Receives the faults raised by the arm.
pub trait FaultSink {
    fn report(&mut self, fault: &MotionFault);
}

/// Object in the scene that can be tested against the boxes of the arm.
pub trait SceneObject {
    fn id(&self) -> ObjectId;

    fn collides_with(&self, bbox: &BoundingBox) -> bool;

    /// Only objects that are not fixed to the scene can be picked up.
    fn is_graspable(&self) -> bool {
        true
    }
}

/// Objects of the scene, in a fixed iteration order.
pub trait SceneQuery {
    fn objects(&self) -> Vec<&dyn SceneObject>;
}

/// Fault sink that writes the faults to the log.
#[derive(Debug, Default)]
pub struct LogFaultSink;

impl FaultSink for LogFaultSink {
    fn report(&mut self, fault: &MotionFault) {
        warn!("Motion fault: {}", fault);
    }
}

/// Fault sink that keeps the faults, mostly useful for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingFaultSink {
    pub faults: Vec<MotionFault>,
}

impl FaultSink for RecordingFaultSink {
    fn report(&mut self, fault: &MotionFault) {
        self.faults.push(fault.clone());
    }
}

/// In-memory registers.
#[derive(Debug, Default, Clone)]
pub struct Registers {
    pub positions: HashMap<usize, Option<Point>>,
    pub io: HashMap<usize, bool>,
}

impl Registers {
    /// Registers with the I/O registers 0 to `io_count - 1` defined and off.
    pub fn with_io(io_count: usize) -> Self {
        Registers {
            positions: HashMap::new(),
            io: (0..io_count).map(|index| (index, false)).collect(),
        }
    }

    pub fn set_position(&mut self, index: usize, point: Point) {
        self.positions.insert(index, Some(point));
    }
}

impl RegisterProvider for Registers {
    fn position(&self, index: usize) -> Result<Point, EvaluationError> {
        match self.positions.get(&index) {
            Some(Some(point)) => Ok(*point),
            Some(None) => Err(EvaluationError::Uninitialized(index)),
            None => Err(EvaluationError::UndefinedRegister(index)),
        }
    }

    fn io(&self, index: usize) -> Option<bool> {
        self.io.get(&index).copied()
    }

    fn set_io(&mut self, index: usize, on: bool) {
        self.io.insert(index, on);
    }
}

/// In-memory tool and user frames.
#[derive(Debug, Default, Clone)]
pub struct Frames {
    pub tool: HashMap<usize, Frame>,
    pub user: HashMap<usize, Frame>,
}

impl FrameProvider for Frames {
    fn tool_frame(&self, index: usize) -> Option<Frame> {
        self.tool.get(&index).copied()
    }

    fn user_frame(&self, index: usize) -> Option<Frame> {
        self.user.get(&index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers() {
        let mut registers = Registers::with_io(2);
        assert_eq!(registers.io(1), Some(false));
        assert_eq!(registers.io(5), None);
        registers.set_io(1, true);
        assert_eq!(registers.io(1), Some(true));

        registers.positions.insert(3, None);
        assert_eq!(registers.position(3), Err(EvaluationError::Uninitialized(3)));
        assert_eq!(registers.position(4), Err(EvaluationError::UndefinedRegister(4)));
        registers.set_position(4, Point::from_joints([0.0; 6]));
        assert!(registers.position(4).is_ok());
    }
}
