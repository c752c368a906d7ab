//! Axis-aligned bounding boxes and minimum-translation-vector resolution.
//!
//! Everything here is pure: functions take positions and boxes by value and
//! report what should happen. The only mutation is [`resolve_tile_hit`],
//! which applies the tilemap resolution policy to a single body.

use serde::{Deserialize, Serialize};

use crate::error::{HammerError, Result};
use crate::math::Vec2;
use crate::object::HammerObject;
use crate::shape::Mesh;

/// Number of indices that describe one tile quad (two triangles).
const INDICES_PER_QUAD: usize = 6;

/// Axis-aligned bounding box defined by its min and max corners.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Build a box from two corners in any order.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// The same box moved by `offset`.
    pub fn translated(self, offset: Vec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The box grown by `margin` on every side.
    pub fn inflated(self, margin: f32) -> Self {
        let m = Vec2::new(margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Penetration depth on each axis. A component is positive only when the
    /// boxes overlap on that axis.
    pub fn overlap_amount(&self, other: &Aabb) -> Vec2 {
        Vec2::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
        )
    }

    /// Strict overlap: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let amount = self.overlap_amount(other);
        amount.x > 0.0 && amount.y > 0.0
    }

    /// True when `self` sits on top of `floor`: the boxes overlap
    /// horizontally and the gap between `self`'s bottom and `floor`'s top is
    /// within `tolerance`.
    pub fn rests_on(&self, floor: &Aabb, tolerance: f32) -> bool {
        let gap = self.min.y - floor.max.y;
        self.overlap_amount(floor).x > 0.0 && gap.abs() <= tolerance
    }
}

/// World-space box of a sprite body.
pub fn world_aabb(body: &HammerObject) -> Aabb {
    body.aabb.translated(body.position)
}

/// Sprite-vs-sprite overlap test.
///
/// Returns the translation that moves `a` out of `b`, or `None` when the
/// boxes do not overlap on both axes. The MTV lies on the axis with the
/// smaller penetration (X wins ties) and points away from `b` based on the
/// bodies' positions.
pub fn check_collision_mtv(a: &HammerObject, b: &HammerObject) -> Option<Vec2> {
    mtv_between(a.position, a.aabb, b.position, b.aabb)
}

/// Position-based MTV between two local boxes placed at `a_pos` and `b_pos`.
pub fn mtv_between(a_pos: Vec2, a_box: Aabb, b_pos: Vec2, b_box: Aabb) -> Option<Vec2> {
    let a_world = a_box.translated(a_pos);
    let b_world = b_box.translated(b_pos);
    let amount = a_world.overlap_amount(&b_world);
    if amount.x <= 0.0 || amount.y <= 0.0 {
        return None;
    }

    if amount.x <= amount.y {
        let direction = if a_pos.x < b_pos.x { -1.0 } else { 1.0 };
        Some(Vec2::new(amount.x * direction, 0.0))
    } else {
        let direction = if a_pos.y < b_pos.y { -1.0 } else { 1.0 };
        Some(Vec2::new(0.0, amount.y * direction))
    }
}

/// Sprite-vs-tile overlap test. `tile` is already in world space.
///
/// Axis selection matches [`check_collision_mtv`]; the sign comes from which
/// side of the tile's center the sprite's center lies on, so a sprite that
/// straddles a tile is still pushed out on its own side.
pub fn check_collision_with_tilemap_mtv(
    sprite_aabb: Aabb,
    sprite_pos: Vec2,
    tile: Aabb,
) -> Option<Vec2> {
    let sprite = sprite_aabb.translated(sprite_pos);
    let amount = sprite.overlap_amount(&tile);
    if amount.x <= 0.0 || amount.y <= 0.0 {
        return None;
    }

    let sprite_center = sprite.center();
    let tile_center = tile.center();
    if amount.x <= amount.y {
        let from_left = sprite_center.x < tile_center.x;
        Some(Vec2::new(if from_left { -amount.x } else { amount.x }, 0.0))
    } else {
        let from_below = sprite_center.y < tile_center.y;
        Some(Vec2::new(0.0, if from_below { -amount.y } else { amount.y }))
    }
}

/// Apply the tilemap resolution policy to `body` for one tile hit.
///
/// Returns true when the hit was resolved as floor contact (vertical axis,
/// pushing up), which is what grounds a body.
pub fn resolve_tile_hit(body: &mut HammerObject, mut mtv: Vec2) -> bool {
    if body.velocity.dot(body.position) > 0.0 {
        body.position.x -= mtv.x;
    } else {
        body.position.x += mtv.x;
    }

    // Falling or still: vertical resolution always lifts the body out.
    if body.velocity.y <= 0.0 {
        mtv.y = mtv.y.abs();
    }

    let lateral = mtv.x.abs() > mtv.y.abs();
    if lateral {
        body.velocity = Vec2::ZERO;
    } else {
        body.velocity.y = 0.0;
    }

    body.position.y += mtv.y;
    !lateral && mtv.y > 0.0
}

/// Local box spanning the extents of `vertices`, or `None` for an empty set.
pub fn compute_aabb(vertices: &[Vec2]) -> Option<Aabb> {
    let (first, rest) = vertices.split_first()?;
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), v| (min.min(*v), max.max(*v)));
    Some(Aabb { min, max })
}

/// One box per `(min, max)` tile bound pair as produced by a tilemap loader.
pub fn create_aabb_list_from_tilemap(min_max_pairs: &[(Vec2, Vec2)]) -> Vec<Aabb> {
    min_max_pairs
        .iter()
        .map(|&(min, max)| Aabb::new(min, max))
        .collect()
}

/// One box per quad of a tilemap mesh (six indices per tile).
pub fn build_aabbs_from_quad_mesh(mesh: &Mesh) -> Result<Vec<Aabb>> {
    if mesh.indices.len() % INDICES_PER_QUAD != 0 {
        return Err(HammerError::InvalidShapeSettings(format!(
            "tile mesh has {} indices, expected a multiple of {INDICES_PER_QUAD}",
            mesh.indices.len()
        )));
    }

    mesh.indices
        .chunks_exact(INDICES_PER_QUAD)
        .map(|quad| {
            let corners = quad
                .iter()
                .map(|&i| {
                    mesh.vertices.get(i as usize).copied().ok_or_else(|| {
                        HammerError::InvalidShapeSettings(format!(
                            "tile mesh index {i} is out of range ({} vertices)",
                            mesh.vertices.len()
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            compute_aabb(&corners)
                .ok_or_else(|| HammerError::InvalidShapeSettings("empty tile quad".into()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::MotionType;

    fn unit_body(x: f32, y: f32) -> HammerObject {
        let mut body = HammerObject::new(Vec2::new(x, y), 0.3);
        body.aabb = Aabb::new(Vec2::ZERO, Vec2::ONE);
        body.motion_type = MotionType::Dynamic;
        body
    }

    #[test]
    fn edge_contact_is_not_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let b = a.translated(Vec2::new(1.0, 0.0));
        assert!(!a.overlaps(&b));
        assert!(a.inflated(0.01).overlaps(&b));
    }

    #[test]
    fn mtv_picks_smaller_axis() {
        let a = unit_body(0.0, 0.0);
        let b = unit_body(0.5, 0.9);
        let mtv = check_collision_mtv(&a, &b).expect("boxes overlap");
        assert_eq!(mtv.x, 0.0);
        assert!((mtv.y + 0.1).abs() < 1e-6, "a is below b, so it is pushed down: {mtv:?}");
    }

    #[test]
    fn mtv_prefers_x_on_ties() {
        let a = unit_body(0.0, 0.0);
        let b = unit_body(0.5, 0.5);
        let mtv = check_collision_mtv(&a, &b).expect("boxes overlap");
        assert_eq!(mtv, Vec2::new(-0.5, 0.0));
    }

    #[test]
    fn overlap_is_symmetric_with_opposite_mtv() {
        let cases = [(0.3, 0.2), (-0.7, 0.4), (0.9, -0.95), (1.0, 0.0), (2.0, 2.0)];
        for (x, y) in cases {
            let a = unit_body(0.0, 0.0);
            let b = unit_body(x, y);
            let ab = check_collision_mtv(&a, &b);
            let ba = check_collision_mtv(&b, &a);
            assert_eq!(ab.is_some(), ba.is_some(), "case ({x}, {y})");
            if let (Some(ab), Some(ba)) = (ab, ba) {
                assert_eq!(ab, -ba, "case ({x}, {y})");
            }
        }
    }

    #[test]
    fn tile_mtv_uses_centers() {
        let tile = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(4.0, 1.0));
        let sprite = Aabb::new(Vec2::ZERO, Vec2::ONE);
        let mtv = check_collision_with_tilemap_mtv(sprite, Vec2::new(1.0, 0.8), tile)
            .expect("sprite sinks into the tile");
        assert_eq!(mtv.x, 0.0);
        assert!((mtv.y - 0.2).abs() < 1e-6);

        assert!(check_collision_with_tilemap_mtv(sprite, Vec2::new(1.0, 1.0), tile).is_none());
    }

    #[test]
    fn floor_hit_grounds_and_stops_fall() {
        let mut body = unit_body(1.0, 0.8);
        body.velocity = Vec2::new(0.0, -3.0);
        let grounded = resolve_tile_hit(&mut body, Vec2::new(0.0, 0.2));
        assert!(grounded);
        assert_eq!(body.velocity.y, 0.0);
        assert!((body.position.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn wall_hit_stops_both_axes() {
        let mut body = unit_body(-2.0, 0.5);
        body.velocity = Vec2::new(1.0, 0.0);
        let grounded = resolve_tile_hit(&mut body, Vec2::new(-0.1, 0.0));
        assert!(!grounded);
        assert_eq!(body.velocity, Vec2::ZERO);
        assert!((body.position.x + 2.1).abs() < 1e-6);
    }

    #[test]
    fn rests_on_detects_standing_contact() {
        let floor = Aabb::new(Vec2::ZERO, Vec2::new(3.0, 1.0));
        let feet = Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0));
        assert!(feet.rests_on(&floor, 0.001));
        assert!(!feet.translated(Vec2::new(0.0, 0.1)).rests_on(&floor, 0.001));
        assert!(!feet.translated(Vec2::new(2.0, 0.0)).rests_on(&floor, 0.001));
    }

    #[test]
    fn compute_aabb_spans_vertices() {
        let verts = [Vec2::new(-1.0, 2.0), Vec2::new(3.0, -4.0), Vec2::new(0.5, 0.5)];
        let aabb = compute_aabb(&verts).expect("non-empty");
        assert_eq!(aabb.min, Vec2::new(-1.0, -4.0));
        assert_eq!(aabb.max, Vec2::new(3.0, 2.0));
        assert!(compute_aabb(&[]).is_none());
    }

    #[test]
    fn tilemap_pairs_are_normalised() {
        let list = create_aabb_list_from_tilemap(&[(Vec2::new(1.0, 1.0), Vec2::new(0.0, 0.0))]);
        assert_eq!(list, vec![Aabb::new(Vec2::ZERO, Vec2::ONE)]);
        assert_eq!(list[0].width(), 1.0);
    }

    #[test]
    fn quad_mesh_builds_one_box_per_tile() {
        let mesh = Mesh {
            vertices: vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
            ],
            indices: vec![0, 1, 2, 2, 3, 0, 1, 4, 5, 5, 2, 1],
        };
        let boxes = build_aabbs_from_quad_mesh(&mesh).expect("valid mesh");
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[1], Aabb::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)));
    }

    #[test]
    fn quad_mesh_rejects_bad_indices() {
        let mesh = Mesh {
            vertices: vec![Vec2::ZERO],
            indices: vec![0, 0, 0, 0, 0, 9],
        };
        assert!(matches!(
            build_aabbs_from_quad_mesh(&mesh),
            Err(HammerError::InvalidShapeSettings(_))
        ));

        let ragged = Mesh {
            vertices: vec![Vec2::ZERO],
            indices: vec![0, 0, 0],
        };
        assert!(build_aabbs_from_quad_mesh(&ragged).is_err());
    }
}
