//! Areas
//!
//! An area is a batch of objects laid out around (0,0). Loading one places
//! the batch at an origin and requests that every object join the space.
//!
//! ```text
//!   AreaLayout (JSON)  ──populate──►  detached objects at layout coords
//!                                        │ shift by origin
//!                                        ▼
//!                                     add_object (queued if iterating)
//! ```

use serde::{Serialize, Deserialize};

use crate::core::direction::Direction;
use crate::core::vec2::FixedVec2;
use crate::geom::{Shape, Transform};
use super::error::SpaceError;
use super::object::{CollisionResponse, ObjectId};
use super::state::Space;

/// Something that can fill a space with objects.
pub trait Area {
    /// Create the area's objects, detached and positioned relative to (0,0).
    fn populate(&self, space: &mut Space) -> Result<Vec<ObjectId>, SpaceError>;
}

/// Movement settings of a blueprint object.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MobileBlueprint {
    /// Movement priority
    pub priority: i32,
    /// Initial per-frame velocity
    pub velocity: FixedVec2,
}

/// One object of a layout. The shape is used for the locator and, where
/// enabled, for the solid, overlap and collision hitboxes too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Locator position relative to the area origin
    pub position: FixedVec2,
    /// Shape shared by every hitbox of the object
    pub shape: Shape,
    /// Solid faces; empty means not solid
    #[serde(default)]
    pub solid: Vec<Direction>,
    /// Whether the object gets an overlap hitbox
    #[serde(default)]
    pub overlap: bool,
    /// Draw priority within a cell
    #[serde(default)]
    pub draw_priority: i32,
    /// Present for objects that move
    #[serde(default)]
    pub mobile: Option<MobileBlueprint>,
    /// Constant collision response; the default behavior slides
    #[serde(default)]
    pub response: Option<CollisionResponse>,
}

/// Errors from reading a layout.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Malformed JSON.
    #[error("layout parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A blueprint's shape is inverted or has a negative radius.
    #[error("blueprint {0} has an invalid shape")]
    InvalidShape(usize),
}

/// A list of blueprints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaLayout {
    /// Objects, created in order
    pub objects: Vec<Blueprint>,
}

fn shape_is_valid(shape: &Shape) -> bool {
    match *shape {
        Shape::Circle { radius } => radius >= 0,
        Shape::Rectangle { left, top, right, bottom } => left <= right && top <= bottom,
        _ => true,
    }
}

impl AreaLayout {
    /// Parse a layout and check its shapes.
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        let layout: AreaLayout = serde_json::from_str(json)?;
        if let Some(index) = layout.objects.iter().position(|b| !shape_is_valid(&b.shape)) {
            return Err(LayoutError::InvalidShape(index));
        }
        Ok(layout)
    }
}

impl Blueprint {
    fn build(&self, space: &mut Space) -> Result<ObjectId, SpaceError> {
        let locator = space.create_hitbox(self.shape.clone(), Transform::at(self.position));
        let id = match &self.mobile {
            Some(mobile) => {
                let collision = space.create_hitbox(self.shape.clone(), Transform::default());
                let id = space.create_mobile_object(locator, collision)?;
                space.set_movement_priority(id, mobile.priority)?;
                space.set_velocity(id, mobile.velocity)?;
                id
            }
            None => space.create_object(locator)?,
        };

        if !self.solid.is_empty() {
            let solid = space.create_hitbox(self.shape.clone(), Transform::default());
            space.set_solid_hitbox(id, Some(solid))?;
            for &direction in &self.solid {
                space.set_surface(id, direction, true)?;
            }
        }
        if self.overlap {
            let overlap = space.create_hitbox(self.shape.clone(), Transform::default());
            space.set_overlap_hitbox(id, Some(overlap))?;
        }
        space.set_draw_priority(id, self.draw_priority)?;
        if let Some(response) = self.response {
            space.set_behavior(id, Some(Box::new(response)))?;
        }
        Ok(id)
    }
}

impl Area for AreaLayout {
    fn populate(&self, space: &mut Space) -> Result<Vec<ObjectId>, SpaceError> {
        self.objects.iter().map(|blueprint| blueprint.build(space)).collect()
    }
}

impl Space {
    /// Populate `area`, move its objects by `origin` and request their
    /// addition. Returns the new objects in creation order.
    pub fn load_area<A: Area + ?Sized>(&mut self, area: &A, origin: FixedVec2) -> Result<Vec<ObjectId>, SpaceError> {
        let ids = area.populate(self)?;
        for &id in &ids {
            self.shift(id, origin);
            self.add_object(id)?;
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::FIXED_ONE;

    const LAYOUT: &str = r#"{
        "objects": [
            {
                "position": {"x": 0, "y": 655360},
                "shape": {"Rectangle": {"left": -6553600, "top": 0, "right": 6553600, "bottom": 65536}},
                "solid": ["Up"]
            },
            {
                "position": {"x": 0, "y": 0},
                "shape": {"Rectangle": {"left": -32768, "top": -32768, "right": 32768, "bottom": 32768}},
                "overlap": true,
                "draw_priority": 2,
                "mobile": {"priority": 5, "velocity": {"x": 0, "y": 131072}},
                "response": "Stop"
            }
        ]
    }"#;

    #[test]
    fn test_layout_parses() {
        let layout = AreaLayout::from_json_str(LAYOUT).unwrap();
        assert_eq!(layout.objects.len(), 2);
        assert_eq!(layout.objects[0].solid, vec![Direction::Up]);
        assert_eq!(layout.objects[0].mobile, None);
        assert_eq!(layout.objects[1].response, Some(CollisionResponse::Stop));
    }

    #[test]
    fn test_layout_rejects_inverted_shape() {
        let json = r#"{"objects": [
            {"position": {"x": 0, "y": 0}, "shape": "Point"},
            {"position": {"x": 0, "y": 0}, "shape": {"Rectangle": {"left": 1, "top": 0, "right": 0, "bottom": 1}}}
        ]}"#;
        assert!(matches!(AreaLayout::from_json_str(json), Err(LayoutError::InvalidShape(1))));
        assert!(matches!(AreaLayout::from_json_str("[]"), Err(LayoutError::Parse(_))));
    }

    #[test]
    fn test_load_area_at_origin() {
        let layout = AreaLayout::from_json_str(LAYOUT).unwrap();
        let mut space = Space::default();
        let origin = FixedVec2::from_ints(100, 50);
        let ids = space.load_area(&layout, origin).unwrap();

        assert_eq!(ids.len(), 2);
        let (floor, body) = (ids[0], ids[1]);
        assert!(space.contains(floor) && space.contains(body));
        assert_eq!(space.position(floor), Some(FixedVec2::from_ints(100, 60)));
        assert_eq!(space.position(body), Some(origin));
        assert_eq!(space.movement_priority(body), Some(5));
        assert_eq!(space.mobile_objects(), vec![body]);
        assert_eq!(space.object(body).map(|o| o.draw_priority()), Some(2));
        assert!(space.object(body).and_then(|o| o.overlap()).is_some());
    }

    #[test]
    fn test_loaded_objects_collide() {
        let layout = AreaLayout::from_json_str(LAYOUT).unwrap();
        let mut space = Space::default();
        let ids = space.load_area(&layout, FixedVec2::ZERO).unwrap();
        let (floor, body) = (ids[0], ids[1]);

        for _ in 0..10 {
            space.advance_frame();
        }
        // Falls 2 per frame until its bottom rests on the floor's top at y = 10.
        assert_eq!(space.position(body), Some(FixedVec2::new(0, 10 * FIXED_ONE - FIXED_ONE / 2)));
        assert_eq!(space.velocity(body), Some(FixedVec2::ZERO));
        assert!(space.collisions(body).is_empty(), "records only from the frame that hit");
        assert!(space.contains(floor));
    }

    #[test]
    fn test_load_area_while_iterating_is_deferred() {
        let layout = AreaLayout::from_json_str(LAYOUT).unwrap();
        let mut space = Space::default();
        let mut loaded = Vec::new();
        let anchor = space.create_hitbox(Shape::Point, Transform::default());
        let anchor = space.create_object(anchor).unwrap();
        space.add_object(anchor).unwrap();

        space.visit_objects(|space, _| {
            loaded = space.load_area(&layout, FixedVec2::ZERO).unwrap();
            assert!(loaded.iter().all(|&id| !space.contains(id)));
        });
        assert!(loaded.iter().all(|&id| space.contains(id)));
    }
}
