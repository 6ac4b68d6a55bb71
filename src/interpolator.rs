//! Per-tick stepping of joints towards their targets, and the choice of rotation
//! direction that keeps the swept arc inside the joint range.

use std::f64::consts::PI;

pub use crate::constraints::mod2pi;
use crate::joint_segment::{Direction, JointSegment};

/// Joint is considered at its target when closer than this, in radians.
pub const EPSILON: f64 = 1e-4;

const TWO_PI: f64 = 2.0 * PI;

/// Signed shortest rotation from `from` to `to`, in (-π, π].
pub fn minimum_distance(from: f64, to: f64) -> f64 {
    let distance = mod2pi(to - from);
    if distance > PI { distance - TWO_PI } else { distance }
}

/// Direction to rotate from the current angle of the segment to `target`. The naive
/// shortest rotation is reversed when a range bound lies strictly between the current
/// angle and the target. A zero distance keeps the committed direction.
pub fn select_direction(segment: &JointSegment, target: f64) -> Direction {
    let current = segment.angle();
    let dist_t = minimum_distance(current, target);
    if dist_t == 0.0 {
        return segment.direction;
    }
    let naive = if dist_t > 0.0 { Direction::Positive } else { Direction::Negative };
    if segment.is_full_circle() {
        return naive;
    }

    let (lower, upper) = segment.bounds();
    let dist_lb = minimum_distance(current, lower);
    let dist_ub = minimum_distance(current, upper);
    let blocks = |bound: f64| bound.signum() == dist_t.signum() && bound != 0.0 && bound.abs() < dist_t.abs();

    if blocks(dist_lb) || blocks(dist_ub) {
        match naive {
            Direction::Positive => Direction::Negative,
            Direction::Negative => Direction::Positive,
        }
    } else {
        naive
    }
}

/// Sets a new target for the segment and commits the direction to reach it.
pub fn retarget(segment: &mut JointSegment, target: f64) {
    segment.direction = select_direction(segment, target);
    segment.set_target(target);
}

/// Moves the segment one step towards its target in the committed direction. A full step
/// is taken while at least one step remains, otherwise the segment snaps onto the target,
/// so it is never overshot. Returns true if the segment is at its target after the call.
pub fn advance(segment: &mut JointSegment, step: f64) -> bool {
    let target = segment.target();
    if minimum_distance(segment.angle(), target).abs() <= EPSILON {
        return true;
    }
    let sign = segment.direction.sign();
    let remaining = mod2pi((target - segment.angle()) * sign);
    if remaining >= step {
        segment.set_angle(segment.angle() + sign * step);
        if minimum_distance(segment.angle(), target).abs() > EPSILON {
            return false;
        }
    }
    segment.set_angle(target);
    true
}

/// Advances every segment, each with its own step. Done only when all of them are done.
pub fn advance_all(segments: &mut [JointSegment], steps: &[f64]) -> bool {
    segments.iter_mut()
        .zip(steps.iter())
        .fold(true, |done, (segment, &step)| advance(segment, step) & done)
}
