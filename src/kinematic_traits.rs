//! Defines the kinematics traits and the shared type aliases.

extern crate nalgebra as na;

use na::Isometry3;

/// Pose is used as the pose of the robot flange or tool centre point. It contains both
/// Cartesian position and rotation quaternion.
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(1.0, 0.0, 0.0);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Rotations of the 6 joints, in radians.
pub type Joints = [f64; 6];

/// The solver may return up to 8 solutions, each defining the rotations of the 6 joints.
/// All returned solutions are valid and cross-checked with forward kinematics.
pub type Solutions = Vec<Joints>;

// Joint indices, to make the code that addresses them explicitly more readable.
pub const J1: usize = 0;
pub const J2: usize = 1;
pub const J3: usize = 2;
pub const J4: usize = 3;
pub const J5: usize = 4;
pub const J6: usize = 5;

/// Kinematic singularity types the solver can detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Singularity {
    /// J5 is close to 0 or ±π so that J4 and J6 rotate around the same axis.
    A,
}

pub trait Kinematics: Send + Sync {
    /// Find inverse kinematics (joint position) for this pose.
    /// This function is faster but does not handle the singularity J5 = 0 well.
    /// All returned solutions are cross-checked with forward kinematics and
    /// valid.
    fn inverse(&self, pose: &Pose) -> Solutions;

    /// Find inverse kinematics (joint position) for this pose.
    /// This function handles the singularity J5 = 0 by keeping the previous values
    /// the values J4 and J5 from the previous solution.
    /// The solutions are sorted by proximity to the previous position, closest first.
    fn inverse_continuing(&self, pose: &Pose, previous: &Joints) -> Solutions;

    /// Find forward kinematics (pose from joint positions).
    fn forward(&self, qs: &Joints) -> Pose;

    /// Pose of every joint frame, J1 to J6. The last element equals `forward`.
    fn forward_with_joint_poses(&self, joints: &Joints) -> [Pose; 6];

    /// Detect the singularity. Returns either A type singularity or None if
    /// no singularity detected.
    fn kinematic_singularity(&self, qs: &Joints) -> Option<Singularity>;

    /// Closest solution to `current`, or None if the pose cannot be reached.
    /// The solver is range-agnostic: joint limits are checked by the caller.
    fn solve(&self, current: &Joints, pose: &Pose) -> Option<Joints> {
        self.inverse_continuing(pose, current).into_iter().next()
    }
}
