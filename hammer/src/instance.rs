use std::sync::Arc;

use crossbeam_channel::Receiver;

use crate::config::HammerConfig;
use crate::error::Result;
use crate::events::HammerEvent;
use crate::interface::HammerInterface;
use crate::object::BodyId;
use crate::world::HammerWorld;

/// Entry point owned by the game loop: one world, its interface and its
/// contact listeners.
pub struct HammerInstance {
    world: Arc<HammerWorld>,
    interface: HammerInterface,
}

impl Default for HammerInstance {
    fn default() -> Self {
        Self::from_world(HammerWorld::default())
    }
}

impl HammerInstance {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: HammerConfig) -> Result<Self> {
        Ok(Self::from_world(HammerWorld::new(config)?))
    }

    fn from_world(world: HammerWorld) -> Self {
        let world = Arc::new(world);
        log::info!(
            "hammer instance ready (gravity {}, parallel {})",
            world.gravity(),
            world.config().parallel
        );
        Self {
            interface: HammerInterface::new(Arc::clone(&world)),
            world,
        }
    }

    pub fn world(&self) -> &Arc<HammerWorld> {
        &self.world
    }

    pub fn interface(&self) -> &HammerInterface {
        &self.interface
    }

    /// Step the world once. Registered listeners have run by the time this
    /// returns.
    pub fn simulate(&self, dt: f32) {
        self.world.simulate(dt);
    }

    pub fn on_contact_added<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        self.world.listeners().on_contact_added(callback);
    }

    pub fn on_contact_persisted<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        self.world.listeners().on_contact_persisted(callback);
    }

    pub fn on_contact_exit<F>(&self, callback: F)
    where
        F: Fn(BodyId, BodyId) + Send + Sync + 'static,
    {
        self.world.listeners().on_contact_exit(callback);
    }

    pub fn on_tilemap_contact_persisted<F>(&self, callback: F)
    where
        F: Fn(BodyId) + Send + Sync + 'static,
    {
        self.world.listeners().on_tilemap_contact_persisted(callback);
    }

    /// Channel receiving every event emitted from now on.
    pub fn subscribe(&self) -> Receiver<HammerEvent> {
        self.world.listeners().subscribe()
    }
}
