//! Supports concept of the frame that is common in robotics.
//! User frames let the program keep its positions relative to some work object (pallet, fixture).
//! If the object moves, only the frame needs to be taught again, most often from 3 points measured
//! both before and after displacement. Tool frames describe where the tool centre point is
//! relative to the flange.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use std::error::Error;
use std::fmt;

use crate::kinematic_traits::Pose;
use crate::point::Point;

/// Rigid transform (no stretching) given by the origin and orientation of the frame,
/// expressed in native coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub origin: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Frame {
    pub fn new(origin: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Frame { origin, orientation }
    }

    pub fn identity() -> Self {
        Frame::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    pub fn from_isometry(isometry: &Isometry3<f64>) -> Self {
        Frame::new(isometry.translation.vector, isometry.rotation)
    }

    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.origin), self.orientation)
    }

    /// Converts a point expressed in this frame into native coordinates. Joint angles,
    /// if any, are native already and are kept.
    pub fn to_native(&self, point: &Point) -> Point {
        let pose = self.isometry() * point.pose();
        Point { joints: point.joints, ..Point::from_pose(&pose) }
    }

    /// Inverse of `to_native`.
    pub fn from_native(&self, pose: &Pose) -> Pose {
        self.isometry().inverse() * pose
    }

    /// Flange pose that puts the tool centre point of this tool frame at `tcp`.
    pub fn flange_for_tcp(&self, tcp: &Pose) -> Pose {
        tcp * self.isometry().inverse()
    }

    /// Frame that only shifts: point `p` measured before the displacement is `q` after it.
    pub fn translation(p: Point3<f64>, q: Point3<f64>) -> Frame {
        Frame::new(q - p, UnitQuaternion::identity())
    }

    /// Teaches a frame from three points measured before (`p`) and after (`q`) the work
    /// object moved. The displacement may shift and rotate but not stretch.
    pub fn frame(p: [Point3<f64>; 3], q: [Point3<f64>; 3]) -> Result<Frame, FrameError> {
        const NON_ISOMETRY_TOLERANCE: f64 = 0.005; // 5 mm
        let stretched = [(0, 1), (0, 2), (1, 2)].iter().any(|&(i, j)| {
            ((p[i] - p[j]).norm() - (q[i] - q[j]).norm()).abs() >= NON_ISOMETRY_TOLERANCE
        });
        if stretched {
            return Err(FrameError::NotIsometry { source: p, target: q });
        }

        let from = basis(&p).ok_or(FrameError::Colinear { points: p, source: true })?;
        let to = basis(&q).ok_or(FrameError::Colinear { points: q, source: false })?;
        let rotation = UnitQuaternion::from_rotation_matrix(
            &Rotation3::from_matrix_unchecked(to * from.transpose()));
        Ok(Frame::new(q[0] - rotation.transform_point(&p[0]), rotation))
    }
}

/// Orthonormal basis spanned by three points, None if they are on one line.
fn basis(points: &[Point3<f64>; 3]) -> Option<Matrix3<f64>> {
    let v1 = points[1] - points[0];
    let v2 = points[2] - points[0];
    let normal = v1.cross(&v2);
    if normal.norm() == 0.0 {
        return None;
    }
    let b1 = v1.normalize();
    let b2 = normal.normalize();
    Some(Matrix3::from_columns(&[b1, b2, b1.cross(&b2)]))
}

/// Points that cannot be used to teach a frame. The offending points are included.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameError {
    /// The three points are on one line. `source` tells if these are the points measured
    /// before the displacement.
    Colinear { points: [Point3<f64>; 3], source: bool },
    /// Distances between the points changed with the displacement.
    NotIsometry { source: [Point3<f64>; 3], target: [Point3<f64>; 3] },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FrameError::Colinear { points, source } => write!(
                f, "Cannot create a frame from colinear {} points: {:?}, {:?}, {:?}",
                if *source { "source" } else { "target" }, points[0], points[1], points[2]),
            FrameError::NotIsometry { source, target } => write!(
                f, "Not isometry: {:?} cannot be moved onto {:?} without stretching", source, target),
        }
    }
}

impl Error for FrameError {}
