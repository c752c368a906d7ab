//! Typed read/write façade over a [`HammerWorld`].

use std::sync::Arc;

use crate::aabb::Aabb;
use crate::error::{HammerError, Result};
use crate::math::Vec2;
use crate::object::{BodyId, BodySnapshot, MotionQuality, MotionType};
use crate::shape::{Edge, Mesh, ShapeSettings};
use crate::world::HammerWorld;

/// Gameplay-facing handle for creating and driving bodies.
///
/// Cheap to clone; every clone talks to the same world. Operations on an id
/// that is no longer registered return [`HammerError::BodyNotFound`].
#[derive(Clone)]
pub struct HammerInterface {
    world: Arc<HammerWorld>,
}

impl HammerInterface {
    /// Wrap a shared world.
    pub fn new(world: Arc<HammerWorld>) -> Self {
        Self { world }
    }

    /// The world this interface drives.
    pub fn world(&self) -> &Arc<HammerWorld> {
        &self.world
    }

    // ------------------------------
    // Lifecycle
    // ------------------------------

    /// Create a body from `shape` and register it. The shape variant decides
    /// whether the body is a sprite or a tilemap.
    pub fn create_and_add_body(
        &self,
        shape: ShapeSettings,
        motion_type: MotionType,
        position: Vec2,
        is_trigger: bool,
    ) -> Result<BodyId> {
        ensure_finite("position", position)?;
        let shape = shape.resolve()?;
        Ok(self.world.add_body(shape, motion_type, position, is_trigger))
    }

    /// Unregister a body. Its contacts end with an exit event on the next step.
    pub fn remove_body(&self, id: BodyId) -> Result<()> {
        self.world.remove_body(id)
    }

    /// Whether `id` is still registered.
    pub fn contains(&self, id: BodyId) -> bool {
        self.world.contains(id)
    }

    /// Number of registered bodies, sprites and tilemaps alike.
    pub fn body_count(&self) -> usize {
        self.world.body_count()
    }

    /// Serializable copy of the body's current state.
    pub fn snapshot(&self, id: BodyId) -> Result<BodySnapshot> {
        self.world.with_body(id, |body| body.snapshot(id))
    }

    /// Not modelled: bodies are always active.
    pub fn set_active(&self, _id: BodyId, _active: bool) -> Result<()> {
        Err(HammerError::Unsupported("set_active"))
    }

    // ------------------------------
    // Kinematics
    // ------------------------------

    /// World position of the body's local origin.
    pub fn position(&self, id: BodyId) -> Result<Vec2> {
        self.world.with_body(id, |body| body.position)
    }

    /// Teleport a body. Contacts are re-evaluated on the next step.
    pub fn set_position(&self, id: BodyId, position: Vec2) -> Result<()> {
        ensure_finite("position", position)?;
        self.world.with_body_mut(id, |body| body.position = position)
    }

    /// Velocity still waiting to be applied. Part of it drains every step.
    pub fn linear_velocity(&self, id: BodyId) -> Result<Vec2> {
        self.world.with_body(id, |body| body.velocity)
    }

    /// Replace the velocity.
    pub fn set_linear_velocity(&self, id: BodyId, velocity: Vec2) -> Result<()> {
        ensure_finite("velocity", velocity)?;
        self.world.with_body_mut(id, |body| body.velocity = velocity)
    }

    /// Add to the current velocity.
    pub fn add_linear_velocity(&self, id: BodyId, velocity: Vec2) -> Result<()> {
        ensure_finite("velocity", velocity)?;
        self.world.with_body_mut(id, |body| body.velocity += velocity)
    }

    /// Stored for callers that expect it; rotation is not simulated.
    pub fn angular_velocity(&self, id: BodyId) -> Result<Vec2> {
        self.world.with_body(id, |body| body.angular_velocity)
    }

    pub fn set_angular_velocity(&self, id: BodyId, velocity: Vec2) -> Result<()> {
        ensure_finite("angular velocity", velocity)?;
        self.world.with_body_mut(id, |body| body.angular_velocity = velocity)
    }

    // ------------------------------
    // Forces and mass
    // ------------------------------

    /// Accumulated force. Only the vertical lift is consumed by the step.
    pub fn force(&self, id: BodyId) -> Result<Vec2> {
        self.world.with_body(id, |body| body.force)
    }

    /// Accumulate `force`. A positive Y component lifts a dynamic body off
    /// the ground and decays under gravity while airborne.
    pub fn add_force(&self, id: BodyId, force: Vec2) -> Result<()> {
        ensure_finite("force", force)?;
        self.world.with_body_mut(id, |body| body.force += force)
    }

    /// Not modelled: use [`add_linear_velocity`](Self::add_linear_velocity).
    pub fn add_impulse(&self, _id: BodyId, _impulse: Vec2) -> Result<()> {
        Err(HammerError::Unsupported("add_impulse"))
    }

    /// Mass; scales how fast gravity pulls the body.
    pub fn mass(&self, id: BodyId) -> Result<f32> {
        self.world.with_body(id, |body| body.mass)
    }

    /// Set the mass. Must be finite and positive.
    pub fn set_mass(&self, id: BodyId, mass: f32) -> Result<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(HammerError::InvalidArgument(format!(
                "mass must be positive, got {mass}"
            )));
        }
        self.world.with_body_mut(id, |body| body.mass = mass)
    }

    // ------------------------------
    // Gravity (world-wide)
    // ------------------------------

    /// World-wide gravity magnitude.
    pub fn gravity(&self) -> f32 {
        self.world.gravity()
    }

    /// Replace the world-wide gravity magnitude.
    pub fn set_gravity(&self, gravity: f32) -> Result<()> {
        self.world.set_gravity(gravity)
    }

    /// Gravity seen by `id`. There is one gravity value for the whole world;
    /// the id is only checked for existence.
    pub fn gravity_factor(&self, id: BodyId) -> Result<f32> {
        self.world.with_body(id, |_| ())?;
        Ok(self.world.gravity())
    }

    /// Sets the world-wide gravity. Affects every body, not just `id`.
    pub fn set_gravity_factor(&self, id: BodyId, gravity: f32) -> Result<()> {
        self.world.with_body(id, |_| ())?;
        self.world.set_gravity(gravity)
    }

    // ------------------------------
    // Classification
    // ------------------------------

    /// How the body moves.
    pub fn motion_type(&self, id: BodyId) -> Result<MotionType> {
        self.world.with_body(id, |body| body.motion_type)
    }

    /// Switch between static, kinematic and dynamic.
    pub fn set_motion_type(&self, id: BodyId, motion_type: MotionType) -> Result<()> {
        self.world.with_body_mut(id, |body| body.motion_type = motion_type)
    }

    /// Stored quality hint; the solver is always discrete.
    pub fn motion_quality(&self, id: BodyId) -> Result<MotionQuality> {
        self.world.with_body(id, |body| body.motion_quality)
    }

    pub fn set_motion_quality(&self, id: BodyId, quality: MotionQuality) -> Result<()> {
        self.world.with_body_mut(id, |body| body.motion_quality = quality)
    }

    /// Whether the body stood on tilemap geometry during the last step.
    pub fn grounded(&self, id: BodyId) -> Result<bool> {
        self.world.with_body(id, |body| body.grounded)
    }

    /// Triggers report contacts but are never pushed.
    pub fn is_trigger(&self, id: BodyId) -> Result<bool> {
        self.world.with_body(id, |body| body.is_trigger)
    }

    // ------------------------------
    // Shape data
    // ------------------------------

    /// Local bounding box of a sprite body, relative to its position.
    pub fn aabb(&self, id: BodyId) -> Result<Aabb> {
        self.world.with_body(id, |body| body.aabb)
    }

    /// Render mesh the body was created from, if any.
    pub fn mesh(&self, id: BodyId) -> Result<Option<Mesh>> {
        self.world.with_body(id, |body| body.mesh.clone())
    }

    /// Edges of an edge-list body; empty otherwise.
    pub fn edges(&self, id: BodyId) -> Result<Vec<Edge>> {
        self.world.with_body(id, |body| body.edges.clone())
    }

    /// World-space tile boxes of a tilemap body; empty for sprites.
    pub fn tilemap_aabbs(&self, id: BodyId) -> Result<Vec<Aabb>> {
        self.world.with_body(id, |body| {
            body.tilemap
                .as_ref()
                .map(|geometry| geometry.tiles().to_vec())
                .unwrap_or_default()
        })
    }
}

fn ensure_finite(what: &str, value: Vec2) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(HammerError::InvalidArgument(format!(
            "{what} must be finite, got {value:?}"
        )))
    }
}
