//! Deterministic per-tile resource generation.
//!
//! # Pipeline
//!
//! 1. Each of the tile and its eight neighbours scatters a seeded number of
//!    points uniformly over its own bounds.  A tile's stream is seeded only
//!    by the world seed and its coordinates, so the neighbour points seen
//!    from tile A are the same ones tile B scatters for itself.
//! 2. Lloyd relaxation over the combined 3×3 point set evens out clusters.
//!    Including the neighbours avoids thinning near tile edges.
//! 3. Points that ended up outside the target tile are dropped; the rest
//!    are snapped to the alignment grid and de-duplicated.
//! 4. Each surviving point reseeds from its own coordinates and draws a
//!    feature kind from the weighted table.
//! 5. The set is capped at `max_resources`.
//!
//! Generation reads no clock and no shared state: the same world seed,
//! config and tile always give the same resources, whatever order tiles are
//! generated in.

use tracing::debug;

use ts_core::{FeatureWeight, Point, Rect, ResourceId, SeededRng, TerrainConfig, mix_seed};

use crate::voronoi::lloyd_relax;
use crate::{ResourceNode, TerrainError, TerrainResult, TerrainTileId};

/// Salt for per-point feature streams, keeping them apart from tile streams.
const FEATURE_SALT: u64 = 0x6665_6174_7572_6573;
/// Salt for resource IDs.
const RESOURCE_SALT: u64 = 0x7265_736f_7572_6365;

/// Generates resource nodes for terrain tiles of one world.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    world_seed: u64,
    config:     TerrainConfig,
}

impl TerrainGenerator {
    /// Fails if `config` is invalid (e.g. `min_points > max_points`).
    pub fn new(world_seed: u64, config: TerrainConfig) -> TerrainResult<Self> {
        config.validate()?;
        Ok(Self { world_seed, config })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    pub fn tile_size(&self) -> f64 {
        self.config.tile_size
    }

    /// Terrain tiles overlapping `rect`.
    pub fn tiles_covering(&self, rect: Rect) -> Vec<TerrainTileId> {
        TerrainTileId::covering(rect, self.config.tile_size)
    }

    /// Scatter the raw points of `tile`.  Independent of every other tile.
    pub fn scatter(&self, tile: TerrainTileId) -> Vec<Point> {
        let mut rng = SeededRng::new(tile.seed(self.world_seed));
        let count = rng.gen_range(self.config.min_points..=self.config.max_points);
        let bounds = tile.bounds(self.config.tile_size);
        (0..count)
            .map(|_| {
                Point::new(
                    bounds.min.x + rng.unit() * bounds.width(),
                    bounds.min.y + rng.unit() * bounds.height(),
                )
            })
            .collect()
    }

    /// Generate the resources of `tile`.
    pub fn generate(&self, tile: TerrainTileId) -> TerrainResult<Vec<ResourceNode>> {
        let size = self.config.tile_size;
        let bounds = tile.bounds(size);

        let mut sites: Vec<Point> = tile.with_neighbours().into_iter().flat_map(|t| self.scatter(t)).collect();
        if sites.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(TerrainError::Malformed { tile: tile.to_string(), reason: "non-finite scatter point".into() });
        }

        let region = Rect::new(
            Point::new(bounds.min.x - size, bounds.min.y - size),
            Point::new(bounds.max.x + size, bounds.max.y + size),
        );
        lloyd_relax(&mut sites, region, self.config.lloyd_iterations);

        let mut points: Vec<Point> = sites
            .into_iter()
            .filter(|p| bounds.contains(*p))
            .map(|p| p.snapped(self.config.snap))
            .filter(|p| bounds.contains(*p))
            .collect();
        points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        points.dedup();

        let mut nodes: Vec<ResourceNode> = points
            .into_iter()
            .map(|p| self.make_node(tile, p))
            .collect::<TerrainResult<_>>()?;

        nodes.sort_by_key(|n| n.id);
        nodes.truncate(self.config.max_resources);

        debug!(%tile, resources = nodes.len(), "terrain tile generated");
        Ok(nodes)
    }

    fn make_node(&self, tile: TerrainTileId, p: Point) -> TerrainResult<ResourceNode> {
        let coords = [p.x.to_bits(), p.y.to_bits()];
        let mut rng = SeededRng::new(mix_seed(self.world_seed ^ FEATURE_SALT, &coords));
        let feature = pick_feature(&self.config.features, rng.unit()).ok_or_else(|| {
            TerrainError::Malformed { tile: tile.to_string(), reason: "empty feature table".into() }
        })?;

        Ok(ResourceNode {
            id:         ResourceId(mix_seed(self.world_seed ^ RESOURCE_SALT, &coords)),
            kind:       feature.kind,
            tile,
            position:   p,
            capacity:   feature.capacity,
            remaining:  feature.capacity,
            respawn_ms: feature.respawn_ms,
            respawn_at: None,
        })
    }
}

/// Cumulative weighted pick: `roll` in `[0, 1)` selects the entry whose
/// cumulative share first exceeds it.  Non-positive weights never win.
pub fn pick_feature(features: &[FeatureWeight], roll: f64) -> Option<&FeatureWeight> {
    let total: f64 = features.iter().map(|f| f.weight.max(0.0)).sum();
    if !(total > 0.0) {
        return None;
    }
    let target = roll.clamp(0.0, 1.0) * total;
    let mut acc = 0.0;
    let mut last_positive = None;
    for f in features {
        if f.weight <= 0.0 {
            continue;
        }
        acc += f.weight;
        last_positive = Some(f);
        if target < acc {
            return Some(f);
        }
    }
    // Rounding can leave `target == total`.
    last_positive
}

/// Generate `tile` with a throwaway generator.
pub fn generate_terrain_tile(
    world_seed: u64,
    config:     &TerrainConfig,
    tile:       TerrainTileId,
) -> TerrainResult<Vec<ResourceNode>> {
    TerrainGenerator::new(world_seed, config.clone())?.generate(tile)
}
