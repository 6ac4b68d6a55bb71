//! Analytic forward and inverse kinematics for arms with a parallel base and spherical wrist.

use std::f64::consts::PI;

use nalgebra::{Isometry3, Matrix3, Rotation3, Translation3, UnitQuaternion, Vector3};

use crate::kinematic_traits::{Joints, Kinematics, Pose, Singularity, Solutions, J1, J2, J3, J4, J5, J6};
use crate::parameters::opw_kinematics::Parameters;
use crate::utils::opw_kinematics::is_valid;

const DISTANCE_TOLERANCE: f64 = 1e-6;
const ANGULAR_TOLERANCE: f64 = 1e-6;

/// Below this |sin(J5)| the wrist is considered singular.
const SINGULARITY_ANGLE_THR: f64 = 0.01 * PI / 180.0;

#[derive(Debug, Clone)]
pub struct OPWKinematics {
    parameters: Parameters,
}

impl OPWKinematics {
    /// Creates a new `OPWKinematics` instance with the given parameters.
    pub fn new(parameters: Parameters) -> Self {
        OPWKinematics { parameters }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Joint values to the angles the geometric model works with.
    fn to_model(&self, joints: &Joints) -> Joints {
        let p = &self.parameters;
        std::array::from_fn(|i| joints[i] * p.sign_corrections[i] as f64 - p.offsets[i])
    }

    /// Geometric model angles back to joint values, normalized into (-π, π].
    fn from_model(&self, q: &Joints) -> Joints {
        let p = &self.parameters;
        std::array::from_fn(|i| normalize_angle((q[i] + p.offsets[i]) * p.sign_corrections[i] as f64))
    }

    fn matches(&self, pose: &Pose, joints: &Joints) -> bool {
        is_valid(joints) && compare_poses(pose, &self.forward(joints), DISTANCE_TOLERANCE, ANGULAR_TOLERANCE)
    }

    /// All 8 analytic candidates, in model angles. Unreachable branches contain NaN.
    fn model_candidates(&self, pose: &Pose) -> [Joints; 8] {
        let p = &self.parameters;
        let m = pose.rotation.to_rotation_matrix().into_inner();
        let t = pose.translation.vector;

        // Wrist centre
        let cx = t.x - p.c4 * m[(0, 2)];
        let cy = t.y - p.c4 * m[(1, 2)];
        let cz = t.z - p.c4 * m[(2, 2)];

        let nx1 = f64::sqrt((cx * cx + cy * cy - p.b * p.b).max(0.0)) - p.a1;

        let tmp1 = f64::atan2(cy, cx);
        let tmp2 = f64::atan2(p.b, nx1 + p.a1);
        let theta1_i = tmp1 - tmp2;
        let theta1_ii = tmp1 + tmp2 - PI;

        let tmp3 = cz - p.c1;
        let s1_2 = nx1 * nx1 + tmp3 * tmp3;
        let tmp4 = nx1 + 2.0 * p.a1;
        let s2_2 = tmp4 * tmp4 + tmp3 * tmp3;
        let kappa_2 = p.a2 * p.a2 + p.c3 * p.c3;
        let c2_2 = p.c2 * p.c2;

        let tmp5 = s1_2 + c2_2 - kappa_2;
        let s1 = f64::sqrt(s1_2);
        let s2 = f64::sqrt(s2_2);

        let tmp13 = f64::acos(tmp5 / (2.0 * s1 * p.c2));
        let tmp14 = f64::atan2(nx1, tmp3);
        let theta2_i = -tmp13 + tmp14;
        let theta2_ii = tmp13 + tmp14;

        let tmp6 = s2_2 + c2_2 - kappa_2;
        let tmp15 = f64::acos(tmp6 / (2.0 * s2 * p.c2));
        let tmp16 = f64::atan2(nx1 + 2.0 * p.a1, tmp3);
        let theta2_iii = -tmp15 - tmp16;
        let theta2_iv = tmp15 - tmp16;

        let tmp7 = s1_2 - c2_2 - kappa_2;
        let tmp8 = s2_2 - c2_2 - kappa_2;
        let tmp9 = 2.0 * p.c2 * f64::sqrt(kappa_2);
        let tmp10 = f64::atan2(p.a2, p.c3);
        let tmp11 = f64::acos(tmp7 / tmp9);
        let tmp12 = f64::acos(tmp8 / tmp9);

        let theta1 = [theta1_i, theta1_i, theta1_ii, theta1_ii];
        let theta2 = [theta2_i, theta2_ii, theta2_iii, theta2_iv];
        let theta3 = [tmp11 - tmp10, -tmp11 - tmp10, tmp12 - tmp10, -tmp12 - tmp10];

        let mut candidates = [[f64::NAN; 6]; 8];
        for i in 0..4 {
            let (sin1, cos1) = theta1[i].sin_cos();
            let (s23, c23) = (theta2[i] + theta3[i]).sin_cos();

            let mm = m[(0, 2)] * s23 * cos1 + m[(1, 2)] * s23 * sin1 + m[(2, 2)] * c23;
            let theta5 = f64::atan2(f64::sqrt((1.0 - mm * mm).max(0.0)), mm);
            let theta4 = f64::atan2(
                m[(1, 2)] * cos1 - m[(0, 2)] * sin1,
                m[(0, 2)] * c23 * cos1 + m[(1, 2)] * c23 * sin1 - m[(2, 2)] * s23,
            );
            let theta6 = f64::atan2(
                m[(0, 1)] * s23 * cos1 + m[(1, 1)] * s23 * sin1 + m[(2, 1)] * c23,
                -m[(0, 0)] * s23 * cos1 - m[(1, 0)] * s23 * sin1 - m[(2, 0)] * c23,
            );

            candidates[i] = [theta1[i], theta2[i], theta3[i], theta4, theta5, theta6];
            // Flipped wrist
            candidates[i + 4] = [theta1[i], theta2[i], theta3[i], theta4 + PI, -theta5, theta6 - PI];
        }
        candidates
    }

    /// At the wrist singularity only J4 + J6 (or J4 - J6) is defined. Keep J4 where it was
    /// and let J6 take the rest of the rotation.
    fn continue_through_singularity(&self, pose: &Pose, q: &Joints, previous: &Joints) -> Option<Joints> {
        if q[J5].sin().abs() > SINGULARITY_ANGLE_THR {
            return None;
        }
        let r_0c = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), q[J1])
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), q[J2] + q[J3]);
        let r_ce = r_0c.to_rotation_matrix().into_inner().transpose()
            * pose.rotation.to_rotation_matrix().into_inner();

        let mut adjusted = *q;
        adjusted[J4] = previous[J4];
        if q[J5].cos() > 0.0 {
            let sum = f64::atan2(r_ce[(1, 0)], r_ce[(0, 0)]);
            adjusted[J6] = sum - previous[J4];
        } else {
            let difference = f64::atan2(-r_ce[(0, 1)], -r_ce[(0, 0)]);
            adjusted[J6] = previous[J4] - difference;
        }
        Some(adjusted)
    }
}

impl Kinematics for OPWKinematics {
    fn inverse(&self, pose: &Pose) -> Solutions {
        let mut solutions: Solutions = Vec::with_capacity(8);
        for q in self.model_candidates(pose) {
            let joints = self.from_model(&q);
            if self.matches(pose, &joints) {
                push_distinct(&mut solutions, joints);
            }
        }
        solutions
    }

    fn inverse_continuing(&self, pose: &Pose, previous: &Joints) -> Solutions {
        let previous_model = self.to_model(previous);
        let mut solutions: Solutions = Vec::with_capacity(8);

        for q in self.model_candidates(pose) {
            if !is_valid(&q) {
                continue;
            }
            let continued = self
                .continue_through_singularity(pose, &q, &previous_model)
                .map(|adjusted| self.from_model(&adjusted))
                .filter(|joints| self.matches(pose, joints));
            let joints = continued.unwrap_or_else(|| self.from_model(&q));
            if self.matches(pose, &joints) {
                push_distinct(&mut solutions, joints);
            }
        }

        solutions.sort_by(|a, b| {
            joint_distance(a, previous).total_cmp(&joint_distance(b, previous))
        });
        solutions
    }

    fn forward(&self, joints: &Joints) -> Pose {
        let p = &self.parameters;
        let q = self.to_model(joints);

        let psi3 = f64::atan2(p.a2, p.c3);
        let k = f64::sqrt(p.a2 * p.a2 + p.c3 * p.c3);

        let cx1 = p.c2 * f64::sin(q[1]) + k * f64::sin(q[1] + q[2] + psi3) + p.a1;
        let cy1 = p.b;
        let cz1 = p.c2 * f64::cos(q[1]) + k * f64::cos(q[1] + q[2] + psi3);

        let cx0 = cx1 * f64::cos(q[0]) - cy1 * f64::sin(q[0]);
        let cy0 = cx1 * f64::sin(q[0]) + cy1 * f64::cos(q[0]);
        let cz0 = cz1 + p.c1;

        let s1 = f64::sin(q[0]);
        let s2 = f64::sin(q[1]);
        let s3 = f64::sin(q[2]);
        let s4 = f64::sin(q[3]);
        let s5 = f64::sin(q[4]);
        let s6 = f64::sin(q[5]);

        let c1 = f64::cos(q[0]);
        let c2 = f64::cos(q[1]);
        let c3 = f64::cos(q[2]);
        let c4 = f64::cos(q[3]);
        let c5 = f64::cos(q[4]);
        let c6 = f64::cos(q[5]);

        let r_0c = Matrix3::new(
            c1 * c2 * c3 - c1 * s2 * s3, -s1, c1 * c2 * s3 + c1 * s2 * c3,
            s1 * c2 * c3 - s1 * s2 * s3, c1, s1 * c2 * s3 + s1 * s2 * c3,
            -s2 * c3 - c2 * s3, 0.0, -s2 * s3 + c2 * c3,
        );

        let r_ce = Matrix3::new(
            c4 * c5 * c6 - s4 * s6, -c4 * c5 * s6 - s4 * c6, c4 * s5,
            s4 * c5 * c6 + c4 * s6, -s4 * c5 * s6 + c4 * c6, s4 * s5,
            -s5 * c6, s5 * s6, c5,
        );

        let r_oe = r_0c * r_ce;

        let translation = Vector3::new(cx0, cy0, cz0) + p.c4 * r_oe * Vector3::z();
        let rotation = Rotation3::from_matrix_unchecked(r_oe);

        Pose::from_parts(Translation3::from(translation),
                         UnitQuaternion::from_rotation_matrix(&rotation))
    }

    fn forward_with_joint_poses(&self, joints: &Joints) -> [Pose; 6] {
        let p = &self.parameters;
        let q = self.to_model(joints);

        let rz = |angle: f64| UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle);
        let ry = |angle: f64| UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);

        let r1 = rz(q[J1]);
        let r2 = r1 * ry(q[J2]);
        let r3 = r1 * ry(q[J2] + q[J3]);
        let r4 = r3 * rz(q[J4]);
        let r5 = r4 * ry(q[J5]);

        let shoulder = r1 * Vector3::new(p.a1, p.b, p.c1);
        let elbow = shoulder + r2 * Vector3::new(0.0, 0.0, p.c2);
        let forearm = elbow + r3 * Vector3::new(p.a2, 0.0, 0.0);
        let wrist = elbow + r3 * Vector3::new(p.a2, 0.0, p.c3);

        let pose = |position: Vector3<f64>, rotation: UnitQuaternion<f64>| {
            Isometry3::from_parts(Translation3::from(position), rotation)
        };

        [
            pose(Vector3::zeros(), r1),
            pose(shoulder, r2),
            pose(elbow, r3),
            pose(forearm, r4),
            pose(wrist, r5),
            self.forward(joints),
        ]
    }

    fn kinematic_singularity(&self, qs: &Joints) -> Option<Singularity> {
        let q = self.to_model(qs);
        if q[J5].sin().abs() < SINGULARITY_ANGLE_THR {
            Some(Singularity::A)
        } else {
            None
        }
    }
}

// Compare two poses with the given tolerance.
pub(crate) fn compare_poses(ta: &Isometry3<f64>, tb: &Isometry3<f64>,
                            distance_tolerance: f64, angular_tolerance: f64) -> bool {
    let translation_distance = (ta.translation.vector - tb.translation.vector).norm();
    let angular_distance = ta.rotation.angle_to(&tb.rotation);

    translation_distance.abs() <= distance_tolerance && angular_distance.abs() <= angular_tolerance
}

fn normalize_angle(angle: f64) -> f64 {
    let mut normalized = angle % (2.0 * PI);
    if normalized > PI {
        normalized -= 2.0 * PI;
    } else if normalized <= -PI {
        normalized += 2.0 * PI;
    }
    normalized
}

/// Sum of the shortest rotations needed to move every joint from `a` to `b`.
fn joint_distance(a: &Joints, b: &Joints) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| normalize_angle(x - y).abs()).sum()
}

fn push_distinct(solutions: &mut Solutions, joints: Joints) {
    if !solutions.iter().any(|s| joint_distance(s, &joints) < 1e-6) {
        solutions.push(joints);
    }
}
