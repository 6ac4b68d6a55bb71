//! Helpers shared by the scenario tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::arm::{ArmSettings, MotionState};
use crate::capabilities::FaultSink;
use crate::controller::ArmController;
use crate::kinematic_traits::Joints;
use crate::motion_error::MotionFault;

/// Fault sink that can still be inspected after the arm took ownership of it.
#[derive(Clone, Default)]
pub struct SharedFaults(pub Rc<RefCell<Vec<MotionFault>>>);

impl SharedFaults {
    pub fn count(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn last(&self) -> Option<MotionFault> {
        self.0.borrow().last().cloned()
    }
}

impl FaultSink for SharedFaults {
    fn report(&mut self, fault: &MotionFault) {
        self.0.borrow_mut().push(fault.clone());
    }
}

/// Default arm at the given joint angles, with a fault sink to inspect.
pub fn arm_at(joints: &Joints) -> (ArmController, SharedFaults) {
    arm_with(ArmSettings::default(), joints)
}

pub fn arm_with(settings: ArmSettings, joints: &Joints) -> (ArmController, SharedFaults) {
    let faults = SharedFaults::default();
    let mut arm = ArmController::with_fault_sink(settings, Box::new(faults.clone()));
    arm.set_joint_angles(joints);
    (arm, faults)
}

/// Ticks at full speed until the arm halts. Returns the number of ticks taken.
pub fn run_until_halted(arm: &mut ArmController, max_ticks: usize) -> usize {
    for tick in 1..=max_ticks {
        if arm.tick(1.0) == MotionState::Halted {
            return tick;
        }
    }
    panic!("Arm still moving after {} ticks", max_ticks);
}

/// Joint angles compared on the circle.
pub fn joints_close(a: &Joints, b: &Joints, tolerance: f64) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| {
        let diff = (x - y).rem_euclid(2.0 * std::f64::consts::PI);
        diff.min(2.0 * std::f64::consts::PI - diff) <= tolerance
    })
}

/// Joint angles that put the flange of the default arm somewhere in front of it, away
/// from the wrist singularity.
pub const WORKING_POSE: Joints = [0.0, 0.3, 0.6, 0.0, 0.5, 0.0];
