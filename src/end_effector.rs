//! End effectors the arm can carry, their boxes and the grasp logic.

use std::fmt;

use tracing::info;

use crate::capabilities::{ObjectId, RegisterProvider, SceneQuery};
use crate::collisions::can_pickup;
use crate::joint_body::BoundingBox;
use crate::kinematic_traits::Pose;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndEffectorKind {
    None,
    Suction,
    Claw,
    Pointer,
    GlueGun,
    Wielder,
}

impl EndEffectorKind {
    /// All kinds in the order they are cycled through.
    pub const ALL: [EndEffectorKind; 6] = [
        EndEffectorKind::None,
        EndEffectorKind::Suction,
        EndEffectorKind::Claw,
        EndEffectorKind::Pointer,
        EndEffectorKind::GlueGun,
        EndEffectorKind::Wielder,
    ];

    pub fn next(self) -> Self {
        match self {
            EndEffectorKind::None => EndEffectorKind::Suction,
            EndEffectorKind::Suction => EndEffectorKind::Claw,
            EndEffectorKind::Claw => EndEffectorKind::Pointer,
            EndEffectorKind::Pointer => EndEffectorKind::GlueGun,
            EndEffectorKind::GlueGun => EndEffectorKind::Wielder,
            EndEffectorKind::Wielder => EndEffectorKind::None,
        }
    }

    /// I/O register that switches this effector on and off.
    pub fn io_register(self) -> Option<usize> {
        match self {
            EndEffectorKind::None => None,
            EndEffectorKind::Suction => Some(0),
            EndEffectorKind::Claw => Some(1),
            EndEffectorKind::Pointer => Some(2),
            EndEffectorKind::GlueGun => Some(3),
            EndEffectorKind::Wielder => Some(4),
        }
    }
}

impl fmt::Display for EndEffectorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EndEffectorKind::None => "NONE",
            EndEffectorKind::Suction => "SUCTION",
            EndEffectorKind::Claw => "CLAW",
            EndEffectorKind::Pointer => "POINTER",
            EndEffectorKind::GlueGun => "GLUE_GUN",
            EndEffectorKind::Wielder => "WIELDER",
        };
        write!(f, "{}", name)
    }
}

/// Boxes of an effector, local to the flange with +Z pointing out of it.
/// Solid boxes are what the effector is made of, pickup zones are where a part
/// must be to be grasped.
fn layout(kind: EndEffectorKind, on: bool) -> (Vec<BoundingBox>, Vec<BoundingBox>) {
    let faceplate = || BoundingBox::at([0.0, 0.0, 0.018], [0.048, 0.048, 0.018]);
    match kind {
        EndEffectorKind::None => (vec![faceplate()], vec![]),
        EndEffectorKind::Suction => (
            vec![
                BoundingBox::at([0.0, 0.0, 0.027], [0.048, 0.048, 0.027]),
                BoundingBox::at([0.0, 0.0, 0.095], [0.0185, 0.0185, 0.041]),
                BoundingBox::at([0.0, 0.06, 0.08], [0.0185, 0.031, 0.0185]),
            ],
            vec![
                BoundingBox::at([0.0, 0.0, 0.1395], [0.0125, 0.0125, 0.0015]),
                BoundingBox::at([0.0, 0.0935, 0.08], [0.0125, 0.0015, 0.0125]),
            ],
        ),
        EndEffectorKind::Claw => {
            // Fingers close in when the claw is on
            let finger_y = if on { 0.023 } else { 0.027 };
            (
                vec![
                    BoundingBox::at([0.0, 0.0, 0.027], [0.048, 0.048, 0.027]),
                    BoundingBox::at([0.0, finger_y, 0.085], [0.0445, 0.0105, 0.0155]),
                    BoundingBox::at([0.0, -finger_y, 0.085], [0.0445, 0.0105, 0.0155]),
                ],
                vec![BoundingBox::at([0.0, 0.0, 0.085], [0.0275, 0.0015, 0.0075])],
            )
        }
        EndEffectorKind::Pointer => (
            vec![
                faceplate(),
                BoundingBox::at([0.0, 0.0, 0.06], [0.02, 0.02, 0.024]),
                BoundingBox::tilted([0.0, 0.03, 0.12], [0.006, 0.006, 0.05], -0.75),
                BoundingBox::at([0.0, 0.065, 0.165], [0.004, 0.004, 0.004]),
            ],
            vec![],
        ),
        EndEffectorKind::GlueGun => (
            vec![
                faceplate(),
                BoundingBox::at([0.0, 0.0, 0.075], [0.03, 0.04, 0.05]),
                BoundingBox::at([0.0, 0.0, 0.14], [0.008, 0.008, 0.015]),
            ],
            vec![],
        ),
        EndEffectorKind::Wielder => (
            vec![
                faceplate(),
                BoundingBox::at([0.0, 0.0, 0.07], [0.025, 0.025, 0.045]),
                BoundingBox::at([0.0, 0.0, 0.13], [0.005, 0.005, 0.015]),
            ],
            vec![],
        ),
    }
}

/// The effector mounted on the flange together with its boxes.
#[derive(Debug, Clone)]
pub struct EndEffector {
    kind: EndEffectorKind,
    on: bool,
    flange: Pose,
    pub solid: Vec<BoundingBox>,
    pub pickup: Vec<BoundingBox>,
}

impl EndEffector {
    pub fn new(kind: EndEffectorKind, on: bool) -> Self {
        let (solid, pickup) = layout(kind, on);
        EndEffector { kind, on, flange: Pose::identity(), solid, pickup }
    }

    pub fn kind(&self) -> EndEffectorKind {
        self.kind
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Switches the effector. Boxes that depend on the state move to their new offsets
    /// relative to the last flange pose.
    pub fn set_on(&mut self, on: bool) {
        if self.on == on {
            return;
        }
        self.on = on;
        let (solid, pickup) = layout(self.kind, on);
        for (bbox, fresh) in self.solid.iter_mut().zip(solid) {
            bbox.local = fresh.local;
        }
        for (bbox, fresh) in self.pickup.iter_mut().zip(pickup) {
            bbox.local = fresh.local;
        }
        let flange = self.flange;
        self.place(&flange);
    }

    /// Recomputes world poses of all boxes from the flange pose.
    pub fn place(&mut self, flange: &Pose) {
        self.flange = *flange;
        for bbox in self.solid.iter_mut().chain(self.pickup.iter_mut()) {
            bbox.place(flange);
        }
    }
}

/// Result of evaluating grasp and release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupOutcome {
    Grabbed(ObjectId),
    Released(ObjectId),
    Unchanged,
}

/// Owns the active effector and the reference to the held object. Nothing else writes them.
#[derive(Debug, Clone)]
pub struct EndEffectorController {
    effector: EndEffector,
    held: Option<ObjectId>,
}

impl EndEffectorController {
    pub fn new(kind: EndEffectorKind) -> Self {
        EndEffectorController { effector: EndEffector::new(kind, false), held: None }
    }

    pub fn effector(&self) -> &EndEffector {
        &self.effector
    }

    pub(crate) fn effector_mut(&mut self) -> &mut EndEffector {
        &mut self.effector
    }

    pub fn kind(&self) -> EndEffectorKind {
        self.effector.kind
    }

    pub fn is_on(&self) -> bool {
        self.effector.on
    }

    pub fn held(&self) -> Option<ObjectId> {
        self.held
    }

    /// Mounts the next effector and reads its state from its I/O register (off if it has
    /// none). Anything still held is then released, which switches the new effector off.
    pub fn cycle_end_effector(&mut self, registers: &mut dyn RegisterProvider) {
        let kind = self.effector.kind.next();
        let on = kind.io_register()
            .and_then(|index| registers.io(index))
            .unwrap_or(false);
        let mut effector = EndEffector::new(kind, on);
        effector.place(&self.effector.flange);
        self.effector = effector;
        info!("End effector {} mounted, {}", kind, if on { "on" } else { "off" });
        self.release_held_object(registers);
    }

    /// Flips the effector on or off, writes the new state to its I/O register and
    /// evaluates grasp or release.
    pub fn toggle_ee_state(&mut self, registers: &mut dyn RegisterProvider,
                           scene: &dyn SceneQuery) -> PickupOutcome {
        let on = !self.effector.on;
        self.effector.set_on(on);
        if let Some(index) = self.effector.kind.io_register() {
            registers.set_io(index, on);
        }
        self.check_pickup_collision(scene)
    }

    /// When on and empty, grabs the first graspable object in scene order that can be picked up.
    /// When off and holding, releases. Otherwise does nothing.
    pub fn check_pickup_collision(&mut self, scene: &dyn SceneQuery) -> PickupOutcome {
        match (self.effector.on, self.held) {
            (true, None) => {
                let grabbed = scene.objects().into_iter()
                    .find(|object| object.is_graspable() && can_pickup(&self.effector, *object))
                    .map(|object| object.id());
                match grabbed {
                    Some(id) => {
                        self.held = Some(id);
                        info!("{} grabbed object {}", self.effector.kind, id);
                        PickupOutcome::Grabbed(id)
                    }
                    None => PickupOutcome::Unchanged,
                }
            }
            (false, Some(id)) => {
                self.held = None;
                info!("{} released object {}", self.effector.kind, id);
                PickupOutcome::Released(id)
            }
            _ => PickupOutcome::Unchanged,
        }
    }

    /// Drops the held object, if any. The effector is switched off and its register updated.
    pub fn release_held_object(&mut self, registers: &mut dyn RegisterProvider) -> Option<ObjectId> {
        let released = self.held.take()?;
        self.effector.set_on(false);
        if let Some(index) = self.effector.kind.io_register() {
            registers.set_io(index, false);
        }
        info!("{} released object {}", self.effector.kind, released);
        Some(released)
    }
}
