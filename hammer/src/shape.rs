//! Shape descriptions handed to the interface when a body is created.

use serde::{Deserialize, Serialize};

use crate::aabb::{self, Aabb};
use crate::error::{HammerError, Result};
use crate::math::Vec2;
use crate::object::ObjectType;

/// Collider mesh: 2D vertices plus a triangle index list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Vec2>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned quad from `min` to `max`, wound as two triangles.
    pub fn quad(min: Vec2, max: Vec2) -> Self {
        Self {
            vertices: vec![
                min,
                Vec2::new(max.x, min.y),
                max,
                Vec2::new(min.x, max.y),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }
}

/// A collision edge with its outward normal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: Vec2,
    pub b: Vec2,
    pub normal: Vec2,
}

/// What a body is made of. The variant decides the body's [`ObjectType`]
/// and which bounding data the world keeps for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShapeSettings {
    /// A sprite with an explicit local `(min, max)` box, or a box derived
    /// from the mesh extents when `bounds` is `None`.
    MeshSprite {
        mesh: Mesh,
        bounds: Option<(Vec2, Vec2)>,
    },
    /// A sprite described by an edge list. The box comes from the mesh;
    /// edges are stored on the body but do not take part in resolution.
    EdgeList { mesh: Mesh, edges: Vec<Edge> },
    /// Static tile geometry as world-space `(min, max)` pairs.
    TilemapTiles { tiles: Vec<(Vec2, Vec2)> },
    /// Static tile geometry as a quad mesh in world space.
    TilemapMesh { mesh: Mesh },
}

/// Validated shape data ready to be stored on a body.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedShape {
    pub object_type: ObjectType,
    pub mesh: Option<Mesh>,
    pub aabb: Aabb,
    pub tiles: Vec<Aabb>,
    pub edges: Vec<Edge>,
}

impl ShapeSettings {
    /// Sprite whose box and quad mesh both span `min` to `max`.
    pub fn sprite_box(min: Vec2, max: Vec2) -> Self {
        Self::MeshSprite {
            mesh: Mesh::quad(min, max),
            bounds: Some((min, max)),
        }
    }

    pub fn tiles(tiles: Vec<(Vec2, Vec2)>) -> Self {
        Self::TilemapTiles { tiles }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::MeshSprite { .. } | Self::EdgeList { .. } => ObjectType::Sprite,
            Self::TilemapTiles { .. } | Self::TilemapMesh { .. } => ObjectType::Tilemap,
        }
    }

    pub(crate) fn resolve(self) -> Result<ResolvedShape> {
        let object_type = self.object_type();
        match self {
            Self::MeshSprite { mesh, bounds } => {
                let aabb = match bounds {
                    Some((min, max)) => {
                        if !(min.x <= max.x && min.y <= max.y) {
                            return Err(invalid(format!(
                                "sprite bounds are inverted: min {min:?}, max {max:?}"
                            )));
                        }
                        Aabb { min, max }
                    }
                    None => mesh_bounds(&mesh)?,
                };
                Ok(ResolvedShape {
                    object_type,
                    mesh: Some(mesh),
                    aabb: finite(aabb)?,
                    tiles: Vec::new(),
                    edges: Vec::new(),
                })
            }
            Self::EdgeList { mesh, edges } => {
                let aabb = finite(mesh_bounds(&mesh)?)?;
                Ok(ResolvedShape {
                    object_type,
                    mesh: Some(mesh),
                    aabb,
                    tiles: Vec::new(),
                    edges,
                })
            }
            Self::TilemapTiles { tiles } => {
                if let Some((min, max)) = tiles.iter().find(|(a, b)| !(a.is_finite() && b.is_finite())) {
                    return Err(invalid(format!("tile bounds are not finite: {min:?}, {max:?}")));
                }
                let tiles = aabb::create_aabb_list_from_tilemap(&tiles);
                tilemap_shape(object_type, None, tiles)
            }
            Self::TilemapMesh { mesh } => {
                let tiles = aabb::build_aabbs_from_quad_mesh(&mesh)?;
                tilemap_shape(object_type, Some(mesh), tiles)
            }
        }
    }
}

fn tilemap_shape(object_type: ObjectType, mesh: Option<Mesh>, tiles: Vec<Aabb>) -> Result<ResolvedShape> {
    if tiles.is_empty() {
        return Err(invalid("tilemap has no tiles".into()));
    }
    for tile in &tiles {
        finite(*tile)?;
    }
    Ok(ResolvedShape {
        object_type,
        mesh,
        aabb: Aabb::default(),
        tiles,
        edges: Vec::new(),
    })
}

fn mesh_bounds(mesh: &Mesh) -> Result<Aabb> {
    aabb::compute_aabb(&mesh.vertices)
        .ok_or_else(|| invalid("mesh has no vertices to derive a bounding box from".into()))
}

fn finite(aabb: Aabb) -> Result<Aabb> {
    if aabb.is_finite() {
        Ok(aabb)
    } else {
        Err(invalid(format!("bounding box is not finite: {aabb:?}")))
    }
}

fn invalid(msg: String) -> HammerError {
    HammerError::InvalidShapeSettings(msg)
}
