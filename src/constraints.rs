//! Mechanical joint limits.

use std::f64::consts::PI;

use crate::kinematic_traits::Joints;

const TWO_PI: f64 = 2.0 * PI;

/// Angle normalized into [0, 2π).
pub fn mod2pi(angle: f64) -> f64 {
    let normalized = angle.rem_euclid(TWO_PI);
    // Tiny negative values round up to 2π
    if normalized >= TWO_PI { 0.0 } else { normalized }
}

/// Checks if the angle lies in the range that starts at `from` and continues in the increasing
/// direction until `to`, wrapping around through 0 when `from > to`. Equal bounds mean the
/// full circle. Bounds must be normalized.
pub fn within_range(angle: f64, from: f64, to: f64) -> bool {
    if from == to {
        return true;
    }
    let angle = mod2pi(angle);
    if from <= to {
        angle >= from && angle <= to
    } else {
        angle >= from || angle <= to
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraints {
    /// Normalized lower limit. If more than upper limit, the range wraps-around through 0
    pub from: [f64; 6],

    /// Normalized upper limit. If less than lower limit, the range wraps-around through 0
    pub to: [f64; 6],
}

impl Constraints {
    pub fn new(from: [f64; 6], to: [f64; 6]) -> Self {
        Constraints {
            from: from.map(mod2pi),
            to: to.map(mod2pi),
        }
    }

    /// Constraints that allow every joint to rotate the full circle.
    pub fn unconstrained() -> Self {
        Constraints::new([0.0; 6], [TWO_PI; 6])
    }

    /// Joint without constraints, from == to
    pub fn is_full_circle(&self, joint: usize) -> bool {
        self.from[joint] == self.to[joint]
    }

    /// Lower and upper bound of this joint, normalized into [0, 2π).
    pub fn bounds(&self, joint: usize) -> (f64, f64) {
        (self.from[joint], self.to[joint])
    }

    /// Checks if the given angle is inside the range of this joint.
    pub fn permits(&self, joint: usize, angle: f64) -> bool {
        within_range(angle, self.from[joint], self.to[joint])
    }

    /// Index of the first joint that is out of range, if any.
    pub fn first_violation(&self, angles: &Joints) -> Option<usize> {
        (0..6).find(|&joint| !self.permits(joint, angles[joint]))
    }
}
