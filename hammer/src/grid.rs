//! Uniform grid broad phase over static tile boxes.
//!
//! Each tile is bucketed into every cell its box touches, unless it spans
//! so many cells that it is kept aside and checked by every query. A query
//! walks the cells under a region and returns the indices of tiles whose
//! boxes overlap it, so only tiles that can plausibly touch a sprite reach
//! the narrow phase.

use std::collections::HashMap;

use crate::aabb::Aabb;
use crate::math::Vec2;

/// A cell in the grid (grid coordinates).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Tiles covering more cells than this are kept out of the buckets and
/// checked by every query instead.
const MAX_CELLS_PER_TILE: u64 = 64;

/// Sparse spatial index from grid cells to tile indices.
#[derive(Clone, Debug)]
pub struct TileGrid {
    cell_size: f32,
    cells: HashMap<GridCoord, Vec<usize>>,
    oversized: Vec<usize>,
}

impl TileGrid {
    /// Index `tiles` with square cells of `cell_size` world units.
    pub fn build(tiles: &[Aabb], cell_size: f32) -> Self {
        let mut grid = Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        };
        for (index, tile) in tiles.iter().enumerate() {
            let (lo, hi) = grid.cell_range(tile);
            if cell_count(lo, hi) > MAX_CELLS_PER_TILE {
                grid.oversized.push(index);
                continue;
            }
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    grid.cells.entry(GridCoord::new(x, y)).or_default().push(index);
                }
            }
        }
        if !grid.oversized.is_empty() {
            log::debug!(
                "{} tiles too large for {cell_size}-unit cells, checked on every query",
                grid.oversized.len()
            );
        }
        grid
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of tiles that bypass the buckets.
    pub fn oversized_tiles(&self) -> usize {
        self.oversized.len()
    }

    /// Convert a world position to grid coordinates. Coordinates beyond the
    /// `i32` range saturate.
    pub fn world_to_grid(&self, world_pos: Vec2) -> GridCoord {
        GridCoord {
            x: (world_pos.x / self.cell_size).floor() as i32,
            y: (world_pos.y / self.cell_size).floor() as i32,
        }
    }

    /// Indices of tiles whose boxes overlap `region`, ascending.
    ///
    /// A region covering more cells than are occupied scans the tile list
    /// directly, so the cost never exceeds one pass over the tiles.
    pub fn query(&self, tiles: &[Aabb], region: &Aabb) -> Vec<usize> {
        let (lo, hi) = self.cell_range(region);
        let mut hits = Vec::new();
        if cell_count(lo, hi) > self.cells.len() as u64 {
            hits.extend(0..tiles.len());
        } else {
            for y in lo.y..=hi.y {
                for x in lo.x..=hi.x {
                    if let Some(bucket) = self.cells.get(&GridCoord::new(x, y)) {
                        hits.extend(bucket.iter().copied());
                    }
                }
            }
            hits.extend(self.oversized.iter().copied());
        }
        hits.sort_unstable();
        hits.dedup();
        hits.retain(|&i| tiles.get(i).is_some_and(|tile| tile.overlaps(region)));
        hits
    }

    fn cell_range(&self, aabb: &Aabb) -> (GridCoord, GridCoord) {
        (self.world_to_grid(aabb.min), self.world_to_grid(aabb.max))
    }
}

fn cell_count(lo: GridCoord, hi: GridCoord) -> u64 {
    let width = (i64::from(hi.x) - i64::from(lo.x) + 1).max(0) as u64;
    let height = (i64::from(hi.y) - i64::from(lo.y) + 1).max(0) as u64;
    width.saturating_mul(height)
}

/// Static tile boxes of one tilemap together with their grid index.
#[derive(Clone, Debug)]
pub struct TileGeometry {
    tiles: Vec<Aabb>,
    grid: TileGrid,
}

impl TileGeometry {
    pub fn new(tiles: Vec<Aabb>, cell_size: f32) -> Self {
        let grid = TileGrid::build(&tiles, cell_size);
        Self { tiles, grid }
    }

    pub fn tiles(&self) -> &[Aabb] {
        &self.tiles
    }

    /// Tiles that overlap `region`, in tile order.
    pub fn candidates<'a>(&'a self, region: &Aabb) -> impl Iterator<Item = &'a Aabb> + 'a {
        self.grid
            .query(&self.tiles, region)
            .into_iter()
            .map(move |index| &self.tiles[index])
    }
}
