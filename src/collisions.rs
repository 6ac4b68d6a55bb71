//! Implements collision detection between the arm segments, the mounted end effector
//! and objects of the scene.

use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::capabilities::SceneObject;
use crate::end_effector::EndEffector;
use crate::joint_body::{BoundingBox, DisplayState};
use crate::kinematic_traits::{Pose, J1, J2, J3, J4, J5, J6};

/// Body box indices.
pub const BASE: usize = 0;
pub const TURRET: usize = 1;
pub const SHOULDER: usize = 2;
pub const LOWER_ARM: usize = 3;
pub const ELBOW: usize = 4;
pub const FOREARM: usize = 5;
pub const WRIST: usize = 6;

/// Body pairs that can physically reach each other. Adjacent segments always touch at
/// their joint and are not checked.
pub const SELF_COLLISION_PAIRS: [(usize, usize); 9] = [
    (BASE, LOWER_ARM), (BASE, ELBOW), (BASE, FOREARM), (BASE, WRIST),
    (TURRET, FOREARM), (TURRET, WRIST),
    (SHOULDER, FOREARM), (SHOULDER, WRIST),
    (LOWER_ARM, FOREARM),
];

/// Body boxes the solid boxes of the end effector are checked against.
pub const EFFECTOR_PAIRS: [usize; 4] = [BASE, TURRET, SHOULDER, LOWER_ARM];

/// Identifies a box in collision reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BoxId {
    Body(usize),
    Effector(usize),
}

/// What the pose of a body box is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Base,
    Joint(usize),
}

/// Struct representing a collision task for detecting collisions
/// between two boxes.
struct CollisionTask<'a> {
    i: BoxId,
    j: BoxId,
    box_i: &'a BoundingBox,
    box_j: &'a BoundingBox,
}

#[derive(Debug, Clone)]
pub struct CollisionDetector {
    /// Boxes of the arm body, indexed by BASE, TURRET, ... WRIST.
    pub body: Vec<BoundingBox>,
    anchors: Vec<Anchor>,
}

impl Default for CollisionDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionDetector {
    /// Box layout of the simulated arm.
    pub fn new() -> Self {
        let layout = [
            (Anchor::Base, BoundingBox::at([0.0, 0.0, 0.1], [0.2, 0.2, 0.1])),
            (Anchor::Joint(J1), BoundingBox::at([0.0, 0.0, 0.3], [0.15, 0.15, 0.1])),
            (Anchor::Joint(J1), BoundingBox::at([0.15, 0.0, 0.45], [0.1, 0.12, 0.08])),
            (Anchor::Joint(J2), BoundingBox::at([0.0, 0.0, 0.3], [0.06, 0.08, 0.25])),
            (Anchor::Joint(J3), BoundingBox::at([0.0, 0.0, 0.0], [0.08, 0.08, 0.08])),
            (Anchor::Joint(J4), BoundingBox::at([0.0, 0.0, 0.32], [0.05, 0.05, 0.24])),
            (Anchor::Joint(J5), BoundingBox::at([0.0, 0.0, 0.0], [0.05, 0.05, 0.05])),
        ];
        let (anchors, body) = layout.into_iter().unzip();
        CollisionDetector { body, anchors }
    }

    /// Recomputes the world poses of all boxes from the base pose and the world poses of the
    /// joint frames, and returns every box to the normal display state.
    pub fn update(&mut self, base: &Pose, joint_poses: &[Pose; 6], effector: &mut EndEffector) {
        for (bbox, anchor) in self.body.iter_mut().zip(self.anchors.iter()) {
            let anchor_pose = match anchor {
                Anchor::Base => base,
                Anchor::Joint(joint) => &joint_poses[*joint],
            };
            bbox.place(anchor_pose);
        }
        effector.place(&joint_poses[J6]);
        self.reset_display_states(effector);
    }

    pub fn reset_display_states(&mut self, effector: &mut EndEffector) {
        for bbox in self.body.iter_mut().chain(effector.solid.iter_mut()) {
            bbox.state = DisplayState::Normal;
        }
    }

    /// Pairs of boxes that currently overlap.
    pub fn collision_pairs(&self, effector: &EndEffector) -> Vec<(BoxId, BoxId)> {
        let mut tasks = Vec::with_capacity(SELF_COLLISION_PAIRS.len() + EFFECTOR_PAIRS.len() * effector.solid.len());
        for &(i, j) in SELF_COLLISION_PAIRS.iter() {
            tasks.push(CollisionTask {
                i: BoxId::Body(i),
                j: BoxId::Body(j),
                box_i: &self.body[i],
                box_j: &self.body[j],
            });
        }
        for (e, solid) in effector.solid.iter().enumerate() {
            for &i in EFFECTOR_PAIRS.iter() {
                tasks.push(CollisionTask {
                    i: BoxId::Body(i),
                    j: BoxId::Effector(e),
                    box_i: &self.body[i],
                    box_j: solid,
                });
            }
        }
        let mut collisions = process_collision_tasks(tasks);
        collisions.sort();
        collisions
    }

    /// Checks the curated pairs, marks the boxes of every colliding pair and returns true if
    /// there was any.
    pub fn check_self_collisions(&mut self, effector: &mut EndEffector) -> bool {
        let collisions = self.collision_pairs(effector);
        for (i, j) in &collisions {
            self.mark(effector, *i);
            self.mark(effector, *j);
        }
        !collisions.is_empty()
    }

    /// Checks the object against every body box and every solid box of the end effector.
    /// Boxes the object hits are marked.
    pub fn check_object_collision(&mut self, effector: &mut EndEffector, object: &dyn SceneObject) -> bool {
        let mut hit = false;
        for bbox in self.body.iter_mut().chain(effector.solid.iter_mut()) {
            if object.collides_with(bbox) {
                bbox.state = DisplayState::Colliding;
                hit = true;
            }
        }
        hit
    }

    fn mark(&mut self, effector: &mut EndEffector, id: BoxId) {
        let bbox = match id {
            BoxId::Body(i) => &mut self.body[i],
            BoxId::Effector(i) => &mut effector.solid[i],
        };
        bbox.state = DisplayState::Colliding;
    }
}

/// The object can be grasped if it is inside at least one pickup zone of the effector
/// while touching none of its solid boxes.
pub fn can_pickup(effector: &EndEffector, object: &dyn SceneObject) -> bool {
    !effector.solid.iter().any(|bbox| object.collides_with(bbox))
        && effector.pickup.iter().any(|bbox| object.collides_with(bbox))
}

fn process_collision_tasks(tasks: Vec<CollisionTask>) -> Vec<(BoxId, BoxId)> {
    tasks.par_iter()
        .filter_map(|task| {
            if task.box_i.intersects(task.box_j) {
                Some((task.i.min(task.j), task.i.max(task.j)))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::end_effector::EndEffectorKind;
    use crate::kinematic_traits::{Joints, Kinematics};
    use crate::kinematics_impl::OPWKinematics;
    use crate::parameters::opw_kinematics::Parameters;
    use std::f64::consts::PI;

    fn placed(joints: &Joints, kind: EndEffectorKind) -> (CollisionDetector, EndEffector) {
        let robot = OPWKinematics::new(Parameters::simulated_arm());
        let mut detector = CollisionDetector::new();
        let mut effector = EndEffector::new(kind, false);
        detector.update(&Pose::identity(), &robot.forward_with_joint_poses(joints), &mut effector);
        (detector, effector)
    }

    #[test]
    fn test_home_is_free() {
        for kind in EndEffectorKind::ALL {
            let (mut detector, mut effector) = placed(&[0.0; 6], kind);
            assert!(!detector.check_self_collisions(&mut effector), "{}", kind);
            assert!(detector.body.iter().all(|bbox| bbox.state == DisplayState::Normal));
        }
    }

    #[test]
    fn test_folded_forearm_hits_shoulder() {
        let (mut detector, mut effector) = placed(&[0.0, 0.0, PI, 0.0, 0.0, 0.0], EndEffectorKind::None);
        let pairs = detector.collision_pairs(&effector);
        assert!(pairs.contains(&(BoxId::Body(SHOULDER), BoxId::Body(WRIST))), "{:?}", pairs);
        assert!(detector.check_self_collisions(&mut effector));
        assert_eq!(detector.body[SHOULDER].state, DisplayState::Colliding);
        assert_eq!(detector.body[WRIST].state, DisplayState::Colliding);
        assert_eq!(detector.body[TURRET].state, DisplayState::Normal);
    }

    #[test]
    fn test_pairs_are_symmetric() {
        let (detector, effector) = placed(&[0.0, 0.0, PI, 0.0, 0.0, 0.0], EndEffectorKind::Claw);
        for (i, j) in SELF_COLLISION_PAIRS {
            assert_eq!(detector.body[i].intersects(&detector.body[j]),
                       detector.body[j].intersects(&detector.body[i]));
        }
        for solid in &effector.solid {
            for i in EFFECTOR_PAIRS {
                assert_eq!(solid.intersects(&detector.body[i]), detector.body[i].intersects(solid));
            }
        }
    }

    #[test]
    fn test_update_resets_marks() {
        let (mut detector, mut effector) = placed(&[0.0, 0.0, PI, 0.0, 0.0, 0.0], EndEffectorKind::None);
        assert!(detector.check_self_collisions(&mut effector));
        let robot = OPWKinematics::new(Parameters::simulated_arm());
        detector.update(&Pose::identity(), &robot.forward_with_joint_poses(&[0.0; 6]), &mut effector);
        assert!(detector.body.iter().all(|bbox| bbox.state == DisplayState::Normal));
    }
}
