//! Straight and circular flange paths for Cartesian moves. Position follows the path
//! geometry, orientation is spherically interpolated from the start to the end.

use nalgebra::{Translation3, Unit, UnitQuaternion, Vector3};

use crate::kinematic_traits::Pose;
use crate::motion_error::MotionFault;

#[derive(Debug, Clone)]
enum Geometry {
    Line,
    Arc {
        centre: Vector3<f64>,
        axis: Unit<Vector3<f64>>,
        sweep: f64,
    },
}

#[derive(Debug, Clone)]
pub struct CartesianPath {
    start: Pose,
    end: Pose,
    geometry: Geometry,
}

impl CartesianPath {
    pub fn linear(start: Pose, end: Pose) -> Self {
        CartesianPath { start, end, geometry: Geometry::Line }
    }

    /// Arc from `start` through the position of `via` to `end`. Fails if the three positions
    /// are colinear or coincide.
    pub fn circular(start: Pose, via: &Pose, end: Pose) -> Result<Self, MotionFault> {
        let p1 = start.translation.vector;
        let u = via.translation.vector - p1;
        let v = end.translation.vector - p1;
        let w = u.cross(&v);
        let w_norm_2 = w.norm_squared();
        if w_norm_2 < 1e-12 {
            return Err(MotionFault::DegenerateArc);
        }

        // Circumcentre of the three points
        let centre = p1 + (v * u.norm_squared() - u * v.norm_squared()).cross(&w) / (2.0 * w_norm_2);
        let axis = Unit::new_normalize(w);
        let sweep = angle_around(&axis, &(p1 - centre), &(end.translation.vector - centre));

        Ok(CartesianPath { start, end, geometry: Geometry::Arc { centre, axis, sweep } })
    }

    pub fn start(&self) -> &Pose {
        &self.start
    }

    pub fn end(&self) -> &Pose {
        &self.end
    }

    /// Distance the flange travels along the path.
    pub fn length(&self) -> f64 {
        match &self.geometry {
            Geometry::Line => (self.end.translation.vector - self.start.translation.vector).norm(),
            Geometry::Arc { centre, sweep, .. } => (self.start.translation.vector - centre).norm() * sweep,
        }
    }

    /// Rotation of the flange from start to end.
    pub fn rotation_angle(&self) -> f64 {
        self.start.rotation.angle_to(&self.end.rotation)
    }

    /// Pose at the given fraction of the path, 0.0 being the start and 1.0 the end.
    pub fn pose_at(&self, fraction: f64) -> Pose {
        let fraction = fraction.clamp(0.0, 1.0);
        let position = match &self.geometry {
            Geometry::Line => self.start.translation.vector.lerp(&self.end.translation.vector, fraction),
            Geometry::Arc { centre, axis, sweep } => {
                let radius = self.start.translation.vector - centre;
                centre + UnitQuaternion::from_axis_angle(axis, sweep * fraction) * radius
            }
        };
        let rotation = self.start.rotation
            .try_slerp(&self.end.rotation, fraction, 1e-9)
            .unwrap_or(if fraction < 0.5 { self.start.rotation } else { self.end.rotation });
        Pose::from_parts(Translation3::from(position), rotation)
    }
}

/// Counterclockwise angle around `axis` from `a` to `b`, in [0, 2π).
fn angle_around(axis: &Unit<Vector3<f64>>, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let angle = f64::atan2(a.cross(b).dot(axis), a.dot(b));
    angle.rem_euclid(2.0 * std::f64::consts::PI)
}
