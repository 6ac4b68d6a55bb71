//! Parts and fixtures placed around the arm.

use crate::capabilities::{ObjectId, SceneObject, SceneQuery};
use crate::joint_body::{BoundingBox, DisplayState};
use crate::kinematic_traits::Pose;

/// Box shaped object of the scene. Fixtures cannot be picked up.
#[derive(Debug, Clone)]
pub struct Part {
    pub id: ObjectId,
    pub name: String,
    pub bbox: BoundingBox,
    pub fixed: bool,
}

impl Part {
    pub fn new(id: ObjectId, name: &str, half_extents: [f64; 3], pose: Pose) -> Self {
        let mut bbox = BoundingBox::at([0.0; 3], half_extents);
        bbox.set_pose(pose);
        Part { id, name: name.to_string(), bbox, fixed: false }
    }

    pub fn fixture(id: ObjectId, name: &str, half_extents: [f64; 3], pose: Pose) -> Self {
        Part { fixed: true, ..Part::new(id, name, half_extents, pose) }
    }
}

impl SceneObject for Part {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn collides_with(&self, bbox: &BoundingBox) -> bool {
        self.bbox.intersects(bbox)
    }

    fn is_graspable(&self) -> bool {
        !self.fixed
    }
}

#[derive(Debug, Default, Clone)]
pub struct Scene {
    pub parts: Vec<Part>,
}

impl Scene {
    pub fn new(parts: Vec<Part>) -> Self {
        Scene { parts }
    }

    pub fn part(&self, id: ObjectId) -> Option<&Part> {
        self.parts.iter().find(|part| part.id == id)
    }

    /// Marks the part that is held, and only it, as held.
    pub fn mark_held(&mut self, held: Option<ObjectId>) {
        for part in &mut self.parts {
            part.bbox.state = if Some(part.id) == held { DisplayState::Held } else { DisplayState::Normal };
        }
    }
}

impl SceneQuery for Scene {
    fn objects(&self) -> Vec<&dyn SceneObject> {
        self.parts.iter().map(|part| part as &dyn SceneObject).collect()
    }
}
