//! Body registry and the per-step simulation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::aabb;
use crate::config::HammerConfig;
use crate::error::{HammerError, Result};
use crate::events::{ContactListeners, ContactMap, ContactPair, HammerEvent};
use crate::grid::TileGeometry;
use crate::math::Vec2;
use crate::object::{BodyId, BodySnapshot, HammerObject, MotionType};
use crate::shape::ResolvedShape;
use crate::sync;

type Bodies = BTreeMap<BodyId, HammerObject>;

/// Owns every body and advances them in fixed steps.
///
/// Bodies live in an ordered map so a step visits them in id order and two
/// worlds fed the same inputs produce the same trajectories.
pub struct HammerWorld {
    config: HammerConfig,
    bodies: RwLock<Bodies>,
    contacts: Mutex<ContactMap>,
    /// `f32` bits; readable without taking the registry lock.
    gravity: AtomicU32,
    next_id: AtomicU64,
    listeners: Arc<ContactListeners>,
}

/// What the collision pass observed during one step.
#[derive(Debug, Default)]
struct StepContacts {
    touching: BTreeSet<ContactPair>,
    tilemap_contacts: Vec<BodyId>,
}

/// Result of testing one sprite against all tile geometry.
#[derive(Debug, Default, Clone, Copy)]
struct TileContact {
    touched: bool,
    grounded: bool,
}

impl Default for HammerWorld {
    fn default() -> Self {
        Self::build(HammerConfig::default())
    }
}

impl HammerWorld {
    pub fn new(config: HammerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HammerConfig) -> Self {
        Self {
            gravity: AtomicU32::new(config.gravity.to_bits()),
            config,
            bodies: RwLock::new(BTreeMap::new()),
            contacts: Mutex::new(ContactMap::default()),
            next_id: AtomicU64::new(1),
            listeners: Arc::new(ContactListeners::default()),
        }
    }

    /// Settings the world was built with.
    pub fn config(&self) -> &HammerConfig {
        &self.config
    }

    /// Callbacks and channels notified after every step.
    pub fn listeners(&self) -> &Arc<ContactListeners> {
        &self.listeners
    }

    /// World-wide gravity magnitude, pulling toward -Y.
    pub fn gravity(&self) -> f32 {
        f32::from_bits(self.gravity.load(Ordering::Acquire))
    }

    /// Replace the world-wide gravity. Rejects NaN and infinities.
    pub fn set_gravity(&self, gravity: f32) -> Result<()> {
        if !gravity.is_finite() {
            return Err(HammerError::InvalidArgument(format!(
                "gravity must be finite, got {gravity}"
            )));
        }
        self.gravity.store(gravity.to_bits(), Ordering::Release);
        Ok(())
    }

    /// Number of registered bodies.
    pub fn body_count(&self) -> usize {
        sync::read(&self.bodies).len()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        sync::read(&self.bodies).contains_key(&id)
    }

    /// Number of body pairs currently in contact.
    pub fn contact_count(&self) -> usize {
        sync::lock(&self.contacts).len()
    }

    /// Whether `a` and `b` were touching at the end of the last step.
    pub fn is_touching(&self, a: BodyId, b: BodyId) -> bool {
        sync::lock(&self.contacts).contains(&ContactPair::new(a, b))
    }

    /// Snapshot of every body, in id order.
    pub fn snapshot(&self) -> Vec<BodySnapshot> {
        sync::read(&self.bodies)
            .iter()
            .map(|(id, body)| body.snapshot(*id))
            .collect()
    }

    pub(crate) fn add_body(
        &self,
        shape: ResolvedShape,
        motion_type: MotionType,
        position: Vec2,
        is_trigger: bool,
    ) -> BodyId {
        let id = BodyId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut body = HammerObject::new(position, self.config.default_mass);
        body.motion_type = motion_type;
        body.object_type = shape.object_type;
        body.mesh = shape.mesh;
        body.aabb = shape.aabb;
        body.edges = shape.edges;
        body.is_trigger = is_trigger;
        if !shape.tiles.is_empty() {
            body.tilemap = Some(Arc::new(TileGeometry::new(
                shape.tiles,
                self.config.tile_cell_size,
            )));
        }

        log::debug!(
            "added {:?} body {id} ({:?}) at ({}, {})",
            body.object_type,
            motion_type,
            position.x,
            position.y
        );
        sync::write(&self.bodies).insert(id, body);
        id
    }

    /// Remove a body. Contacts involving it end on the next step.
    pub(crate) fn remove_body(&self, id: BodyId) -> Result<()> {
        match sync::write(&self.bodies).remove(&id) {
            Some(_) => {
                log::debug!("removed body {id}");
                Ok(())
            }
            None => Err(HammerError::BodyNotFound(id)),
        }
    }

    pub(crate) fn with_body<R>(&self, id: BodyId, f: impl FnOnce(&HammerObject) -> R) -> Result<R> {
        sync::read(&self.bodies)
            .get(&id)
            .map(f)
            .ok_or(HammerError::BodyNotFound(id))
    }

    pub(crate) fn with_body_mut<R>(
        &self,
        id: BodyId,
        f: impl FnOnce(&mut HammerObject) -> R,
    ) -> Result<R> {
        sync::write(&self.bodies)
            .get_mut(&id)
            .map(f)
            .ok_or(HammerError::BodyNotFound(id))
    }

    /// Advance the world by `dt` seconds.
    ///
    /// The registry stays write-locked for the whole step: integration runs
    /// first, collision resolution second, then the contact map is
    /// reconciled. Listeners are called after the locks are released, so
    /// when this returns the step and its events are fully applied.
    pub fn simulate(&self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            log::warn!("ignoring simulation step with dt = {dt}");
            return;
        }

        let gravity = self.gravity();
        let events = {
            let mut bodies = sync::write(&self.bodies);

            let mut sprites = Vec::new();
            let mut tilemaps = Vec::new();
            for (id, body) in bodies.iter() {
                if body.is_sprite() {
                    sprites.push(*id);
                } else if let Some(geometry) = &body.tilemap {
                    tilemaps.push(Arc::clone(geometry));
                }
            }

            integrate_all(&mut bodies, self.config.parallel, gravity, dt);
            let step = self.resolve_collisions(&mut bodies, &sprites, &tilemaps);

            let mut contacts = sync::lock(&self.contacts);
            let mut events = contacts.reconcile(&step.touching, |id| bodies.contains_key(&id));
            events.extend(
                step.tilemap_contacts
                    .iter()
                    .map(|&body| HammerEvent::TilemapContactPersisted { body }),
            );

            log::trace!(
                "step dt={dt}: {} sprites, {} tilemaps, {} contacts, {} events",
                sprites.len(),
                tilemaps.len(),
                contacts.len(),
                events.len()
            );
            events
        };

        self.listeners.dispatch(&events);
    }

    fn resolve_collisions(
        &self,
        bodies: &mut Bodies,
        sprites: &[BodyId],
        tilemaps: &[Arc<TileGeometry>],
    ) -> StepContacts {
        let mut step = StepContacts::default();

        for &id in sprites {
            for &other_id in sprites {
                if id == other_id {
                    continue;
                }

                let (mtv, touching, other_is_trigger) = {
                    let (Some(body), Some(other)) = (bodies.get(&id), bodies.get(&other_id)) else {
                        continue;
                    };
                    let touching = aabb::world_aabb(body)
                        .inflated(self.config.contact_margin)
                        .overlaps(&aabb::world_aabb(other));
                    (aabb::check_collision_mtv(body, other), touching, other.is_trigger)
                };

                if touching {
                    step.touching.insert(ContactPair::new(id, other_id));
                }

                if let (Some(mtv), Some(body)) = (mtv, bodies.get_mut(&id)) {
                    if body.responds_to_collisions() && !other_is_trigger {
                        body.position += mtv;
                        body.velocity.y = 0.0;
                    }
                }
            }

            let Some(body) = bodies.get_mut(&id) else {
                continue;
            };
            if !body.responds_to_collisions() {
                body.grounded = false;
                continue;
            }
            let contact = resolve_against_tiles(body, tilemaps, &self.config);
            body.grounded = contact.grounded;
            if contact.touched {
                step.tilemap_contacts.push(id);
            }
        }

        step
    }
}

#[cfg(feature = "parallel")]
fn integrate_all(bodies: &mut Bodies, parallel: bool, gravity: f32, dt: f32) {
    use rayon::prelude::*;

    if parallel {
        bodies
            .par_iter_mut()
            .for_each(|(_, body)| integrate_body(body, gravity, dt));
    } else {
        bodies
            .values_mut()
            .for_each(|body| integrate_body(body, gravity, dt));
    }
}

#[cfg(not(feature = "parallel"))]
fn integrate_all(bodies: &mut Bodies, _parallel: bool, gravity: f32, dt: f32) {
    bodies
        .values_mut()
        .for_each(|body| integrate_body(body, gravity, dt));
}

/// Gravity plus position integration for one body.
///
/// Velocity behaves as a per-step impulse: the part of it that was applied
/// to the position this step is drained from it.
fn integrate_body(body: &mut HammerObject, gravity: f32, dt: f32) {
    if !body.integrates() {
        return;
    }

    if body.motion_type == MotionType::Dynamic {
        apply_gravity(body, gravity, dt);
    }

    let applied = body.velocity * dt;
    body.position += applied;
    body.velocity -= applied;
}

/// A grounded body ignores gravity until an upward force lifts it off. While
/// airborne, an upward force keeps pulling the body up and decays under
/// gravity.
fn apply_gravity(body: &mut HammerObject, gravity: f32, dt: f32) {
    let pull = dt * gravity * body.mass;
    let lifted = body.force.y > 0.0;

    if body.grounded {
        if lifted {
            body.velocity.y += pull;
            body.grounded = false;
        }
        return;
    }

    if lifted {
        body.velocity.y += pull;
        body.force.y = (body.force.y - dt * gravity).max(0.0);
    } else {
        body.velocity.y -= pull;
    }
}

fn resolve_against_tiles(
    body: &mut HammerObject,
    tilemaps: &[Arc<TileGeometry>],
    config: &HammerConfig,
) -> TileContact {
    let mut contact = TileContact::default();
    let region = aabb::world_aabb(body).inflated(config.broad_phase_margin);

    for geometry in tilemaps {
        for tile in geometry.candidates(&region) {
            match aabb::check_collision_with_tilemap_mtv(body.aabb, body.position, *tile) {
                Some(mtv) => {
                    contact.touched = true;
                    if aabb::resolve_tile_hit(body, mtv) {
                        contact.grounded = true;
                    }
                }
                None => {
                    let standing = body.velocity.y <= 0.0
                        && aabb::world_aabb(body).rests_on(tile, config.ground_probe);
                    if standing {
                        contact.touched = true;
                        contact.grounded = true;
                    }
                }
            }
        }
    }

    contact
}
