//! Oriented bounding boxes the arm, its end effector and scene parts are made of.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use parry3d::shape::Cuboid;

use crate::kinematic_traits::Pose;

/// How the box is shown by whoever renders the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Normal,
    Colliding,
    Selected,
    Held,
}

/// Box with the given half extents. Its world pose is derived from the pose of whatever it is
/// attached to (base, joint frame, flange) and the fixed local offset.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub half_extents: Vector3<f64>,
    /// Pose of the box relative to its anchor.
    pub local: Isometry3<f64>,
    pose: Pose,
    shape: Cuboid,
    pub state: DisplayState,
}

impl BoundingBox {
    pub fn new(half_extents: Vector3<f64>, local: Isometry3<f64>) -> Self {
        BoundingBox {
            half_extents,
            local,
            pose: local,
            shape: Cuboid::new(half_extents.cast::<f32>()),
            state: DisplayState::Normal,
        }
    }

    /// Axis aligned box centred at the given offset from its anchor.
    pub fn at(offset: [f64; 3], half_extents: [f64; 3]) -> Self {
        Self::new(
            Vector3::from(half_extents),
            Isometry3::from_parts(Translation3::from(Vector3::from(offset)), UnitQuaternion::identity()),
        )
    }

    /// Same as `at`, additionally rotated around the local X axis.
    pub fn tilted(offset: [f64; 3], half_extents: [f64; 3], angle_x: f64) -> Self {
        Self::new(
            Vector3::from(half_extents),
            Isometry3::from_parts(
                Translation3::from(Vector3::from(offset)),
                UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle_x),
            ),
        )
    }

    /// Current world pose.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Recompute the world pose from the pose of the anchor.
    pub fn place(&mut self, anchor: &Pose) {
        self.pose = anchor * self.local;
    }

    /// Moves the box to the given world pose, for boxes that are not attached to the arm.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// Separating axis overlap test.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        matches!(
            parry3d::query::intersection_test(
                &self.pose.cast::<f32>(), &self.shape,
                &other.pose.cast::<f32>(), &other.shape),
            Ok(true)
        )
    }
}
