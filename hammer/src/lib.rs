//! Hammer2D - a small axis-aligned physics core for sprite and tilemap games.
//!
//! Bodies are boxes that integrate velocity under a single world gravity,
//! get pushed apart along the minimum translation vector, and land on static
//! tile geometry. Contacts between sprites are tracked across steps and
//! reported through callbacks or a channel.

pub mod aabb;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod instance;
pub mod interface;
pub mod math;
pub mod object;
pub mod shape;
mod sync;
pub mod world;

pub use crate::aabb::Aabb;
pub use crate::config::{HammerConfig, STANDARD_GRAVITY};
pub use crate::error::{HammerError, Result};
pub use crate::events::{ContactListeners, ContactPair, HammerEvent};
pub use crate::instance::HammerInstance;
pub use crate::interface::HammerInterface;
pub use crate::math::Vec2;
pub use crate::object::{BodyId, BodySnapshot, HammerObject, MotionQuality, MotionType, ObjectType};
pub use crate::shape::{Edge, Mesh, ShapeSettings};
pub use crate::world::HammerWorld;
