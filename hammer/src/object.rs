//! Body records owned by the world.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::grid::TileGeometry;
use crate::math::Vec2;
use crate::shape::{Edge, Mesh};

/// Opaque handle to a body. Ids are never reused within a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BodyId(u64);

impl BodyId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying integer id (useful for debugging or serialization).
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a body moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionType {
    /// Never moves.
    #[default]
    Static,
    /// Moves by its velocity only; ignores gravity and collision response.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

/// Collision quality hint. Stored but not used by the discrete solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionQuality {
    Discrete,
    #[default]
    LinearCast,
}

/// Which collision path a body takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectType {
    #[default]
    Sprite,
    Tilemap,
}

/// Mutable physical state of one body.
#[derive(Clone, Debug)]
pub struct HammerObject {
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) angular_velocity: Vec2,
    pub(crate) force: Vec2,
    pub(crate) mass: f32,
    pub(crate) motion_type: MotionType,
    pub(crate) motion_quality: MotionQuality,
    pub(crate) object_type: ObjectType,
    pub(crate) mesh: Option<Mesh>,
    /// Local box for sprites, offset by `position` at test time.
    pub(crate) aabb: Aabb,
    /// World-space tile boxes for tilemaps. Shared so a step can read the
    /// geometry while sprites are borrowed mutably.
    pub(crate) tilemap: Option<Arc<TileGeometry>>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) grounded: bool,
    pub(crate) is_trigger: bool,
}

impl HammerObject {
    pub(crate) fn new(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            angular_velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            mass,
            motion_type: MotionType::Static,
            motion_quality: MotionQuality::default(),
            object_type: ObjectType::Sprite,
            mesh: None,
            aabb: Aabb::default(),
            tilemap: None,
            edges: Vec::new(),
            grounded: false,
            is_trigger: false,
        }
    }

    pub(crate) fn is_sprite(&self) -> bool {
        self.object_type == ObjectType::Sprite
    }

    pub(crate) fn is_tilemap(&self) -> bool {
        self.object_type == ObjectType::Tilemap
    }

    /// Tilemaps never move regardless of their motion type.
    pub(crate) fn integrates(&self) -> bool {
        self.motion_type != MotionType::Static && !self.is_tilemap()
    }

    /// Only dynamic, non-trigger bodies are pushed out of contacts.
    pub(crate) fn responds_to_collisions(&self) -> bool {
        self.motion_type == MotionType::Dynamic && !self.is_trigger
    }

    pub(crate) fn snapshot(&self, id: BodyId) -> BodySnapshot {
        BodySnapshot {
            id,
            position: self.position,
            velocity: self.velocity,
            force: self.force,
            mass: self.mass,
            motion_type: self.motion_type,
            motion_quality: self.motion_quality,
            object_type: self.object_type,
            aabb: self.aabb,
            tile_count: self.tilemap.as_ref().map_or(0, |geometry| geometry.tiles().len()),
            grounded: self.grounded,
            is_trigger: self.is_trigger,
        }
    }
}

/// Serializable copy of a body's observable state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub position: Vec2,
    pub velocity: Vec2,
    pub force: Vec2,
    pub mass: f32,
    pub motion_type: MotionType,
    pub motion_quality: MotionQuality,
    pub object_type: ObjectType,
    pub aabb: Aabb,
    pub tile_count: usize,
    pub grounded: bool,
    pub is_trigger: bool,
}
