//! Motion targets: a pose, optionally with the joint angles that produced it.

use nalgebra::{Translation3, UnitQuaternion, Vector3};

use crate::kinematic_traits::{Joints, Pose};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub joints: Option<Joints>,
}

impl Point {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Point { position, orientation, joints: None }
    }

    pub fn from_pose(pose: &Pose) -> Self {
        Point::new(pose.translation.vector, pose.rotation)
    }

    pub fn with_joints(pose: &Pose, joints: Joints) -> Self {
        Point { joints: Some(joints), ..Point::from_pose(pose) }
    }

    /// Point that only carries joint angles, with the pose left at identity.
    pub fn from_joints(joints: Joints) -> Self {
        Point { joints: Some(joints), ..Point::new(Vector3::zeros(), UnitQuaternion::identity()) }
    }

    pub fn pose(&self) -> Pose {
        Pose::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// Applies an offset register: positions add up, orientations compose and joint angles add up.
    /// Joint angles are kept only if both points have them, as otherwise they no longer describe
    /// the resulting pose.
    pub fn offset_by(&self, offset: &Point) -> Point {
        let joints = match (self.joints, offset.joints) {
            (Some(a), Some(b)) => Some(std::array::from_fn(|i| a[i] + b[i])),
            _ => None,
        };
        Point {
            position: self.position + offset.position,
            orientation: offset.orientation * self.orientation,
            joints,
        }
    }
}
