//! Places the arm in the world.
//! Base takes an arbitrary implementation of Kinematics and is such an implementation itself:
//! ```
//! use std::sync::Arc;
//! use nalgebra::Isometry3;
//! use rs_arm_simulator::base::Base;
//! use rs_arm_simulator::kinematic_traits::{Joints, Kinematics, Pose};
//! use rs_arm_simulator::kinematics_impl::OPWKinematics;
//! use rs_arm_simulator::parameters::opw_kinematics::Parameters;
//!
//! // Half meter high pedestal
//! let arm = Base {
//!   robot: Arc::new(OPWKinematics::new(Parameters::simulated_arm())),
//!   base: Isometry3::translation(0.0, 0.0, 0.5),
//! };
//!
//! let joints: Joints = [0.0, 0.1, 0.2, 0.3, 0.0, 0.5];
//! let flange: Pose = arm.forward(&joints);
//! println!("The flange is at: {:?}", flange);
//! ```

extern crate nalgebra as na;

use std::sync::Arc;
use na::Isometry3;
use crate::kinematic_traits::{Joints, Kinematics, Pose, Singularity, Solutions};

/// Defines the fixed base that holds the arm, moving it to its installed location
/// and rotating if the arm is mounted on a wall or upside down.
#[derive(Clone)]
pub struct Base {
    pub robot: Arc<dyn Kinematics>,  // The arm

    /// Transformation from the world origin to the arm base.
    pub base: Isometry3<f64>,
}

impl Kinematics for Base {
    fn inverse(&self, tcp: &Pose) -> Solutions {
        self.robot.inverse(&(self.base.inverse() * tcp))
    }

    fn inverse_continuing(&self, tcp: &Pose, previous: &Joints) -> Solutions {
        self.robot.inverse_continuing(&(self.base.inverse() * tcp), previous)
    }

    fn forward(&self, joints: &Joints) -> Pose {
        self.base * self.robot.forward(joints)
    }

    fn forward_with_joint_poses(&self, joints: &Joints) -> [Pose; 6] {
        self.robot.forward_with_joint_poses(joints).map(|pose| self.base * pose)
    }

    fn kinematic_singularity(&self, qs: &Joints) -> Option<Singularity> {
        self.robot.kinematic_singularity(qs)
    }
}
