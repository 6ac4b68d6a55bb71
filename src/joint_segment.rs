//! One rotational degree of freedom of the arm.

use crate::constraints::{mod2pi, within_range};

/// Local axis the joint rotates around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationAxis {
    X,
    Y,
    Z,
}

/// Committed direction of rotation towards the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Positive,
    Negative,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Positive => 1.0,
            Direction::Negative => -1.0,
        }
    }
}

/// State of a single joint. Angles are kept normalized into [0, 2π) after every mutation.
#[derive(Debug, Clone)]
pub struct JointSegment {
    pub axis: RotationAxis,
    angle: f64,
    target: f64,
    lower: f64,
    upper: f64,
    /// Radians per tick at full speed.
    pub speed: f64,
    pub direction: Direction,
    /// Live jog rate, -1.0 to 1.0. Zero when not jogging.
    pub jog_rate: f64,
}

impl JointSegment {
    /// Creates a segment at zero angle. `lower == upper` (after normalization) makes the
    /// joint rotate the full circle.
    pub fn new(axis: RotationAxis, lower: f64, upper: f64, speed: f64) -> Self {
        JointSegment {
            axis,
            angle: 0.0,
            target: 0.0,
            lower: mod2pi(lower),
            upper: mod2pi(upper),
            speed,
            direction: Direction::Positive,
            jog_rate: 0.0,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.angle = mod2pi(angle);
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = mod2pi(target);
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn is_full_circle(&self) -> bool {
        self.lower == self.upper
    }

    pub fn permits(&self, angle: f64) -> bool {
        within_range(angle, self.lower, self.upper)
    }
}
