//! World configuration.
//!
//! Loaded by the application (usually from JSON) and handed to the
//! subsystems.  Every field has a default, so a config file only needs to
//! name what it overrides:
//!
//! ```json
//! { "cell_size": 1000.0, "scheduler": { "lock_stale_after_ms": 60000 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, Point};

// ── WorldConfig ───────────────────────────────────────────────────────────────

/// Top-level configuration for one world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Master seed for procedural generation.  The same seed always yields
    /// the same terrain.
    pub world_seed: u64,

    /// Side length of a simulation cell, in world units.
    pub cell_size: f64,

    pub nav:       NavConfig,
    pub terrain:   TerrainConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_seed: 0x7057_5eed,
            cell_size:  1000.0,
            nav:        NavConfig::default(),
            terrain:    TerrainConfig::default(),
            scheduler:  SchedulerConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        let config: WorldConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load_json(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject configurations the subsystems cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.cell_size > 0.0) {
            return Err(CoreError::Config(format!("cell_size must be > 0, got {}", self.cell_size)));
        }
        self.nav.validate()?;
        self.terrain.validate()?;
        self.scheduler.validate()
    }
}

// ── NavConfig ─────────────────────────────────────────────────────────────────

/// Tile-map geometry and walking speeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// World position of the top-left corner of tile `(0, 0)`.
    pub origin: Point,

    /// Side length of one tile, in world units.
    pub tile_unit: f64,

    /// Time to cross one tile left/right.
    pub horizontal_step_ms: i64,

    /// Time to cross one tile up/down.
    pub vertical_step_ms: i64,

    /// Delay between "now" and the first waypoint of a new path.
    pub lead_time_ms: i64,

    /// Walker loop guard: maximum tiles stepped per path.
    pub max_steps: usize,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            origin:             Point::ORIGIN,
            tile_unit:          50.0,
            horizontal_step_ms: 500,
            vertical_step_ms:   250,
            lead_time_ms:       1_000,
            max_steps:          1_000,
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.tile_unit > 0.0) {
            return Err(CoreError::Config(format!("nav.tile_unit must be > 0, got {}", self.tile_unit)));
        }
        if self.horizontal_step_ms <= 0 || self.vertical_step_ms <= 0 {
            return Err(CoreError::Config("nav step times must be > 0".into()));
        }
        if self.lead_time_ms < 0 {
            return Err(CoreError::Config("nav.lead_time_ms must be >= 0".into()));
        }
        Ok(())
    }
}

// ── TerrainConfig ─────────────────────────────────────────────────────────────

/// The kinds of scattered feature the terrain generator can place.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Tree,
    Rock,
    Ore,
    BerryBush,
}

/// One entry of the weighted feature table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub kind:       ResourceKind,
    /// Relative selection weight (need not sum to 1 across the table).
    pub weight:     f64,
    /// Harvest units when full.
    pub capacity:   u32,
    /// Delay after depletion before the node refills.
    pub respawn_ms: i64,
}

/// Procedural terrain parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Side length of a terrain tile, in world units.  Independent of
    /// `cell_size`.
    pub tile_size: f64,

    /// Inclusive bounds on the number of seed points scattered per tile.
    pub min_points: u32,
    pub max_points: u32,

    /// Lloyd relaxation rounds.
    pub lloyd_iterations: u32,

    /// Alignment grid that surviving points are snapped to.
    pub snap: f64,

    /// Hard cap on resources emitted per tile.
    pub max_resources: usize,

    pub features: Vec<FeatureWeight>,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            tile_size:        2_000.0,
            min_points:       10,
            max_points:       18,
            lloyd_iterations: 2,
            snap:             10.0,
            max_resources:    24,
            features: vec![
                FeatureWeight { kind: ResourceKind::Tree,      weight: 0.55, capacity: 5, respawn_ms: 300_000 },
                FeatureWeight { kind: ResourceKind::Rock,      weight: 0.25, capacity: 8, respawn_ms: 600_000 },
                FeatureWeight { kind: ResourceKind::Ore,       weight: 0.05, capacity: 3, respawn_ms: 1_800_000 },
                FeatureWeight { kind: ResourceKind::BerryBush, weight: 0.15, capacity: 4, respawn_ms: 120_000 },
            ],
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.tile_size > 0.0) {
            return Err(CoreError::Config(format!("terrain.tile_size must be > 0, got {}", self.tile_size)));
        }
        if self.min_points > self.max_points {
            return Err(CoreError::Config(format!(
                "terrain.min_points ({}) exceeds max_points ({})",
                self.min_points, self.max_points
            )));
        }
        let total: f64 = self.features.iter().map(|f| f.weight.max(0.0)).sum();
        if !(total > 0.0) {
            return Err(CoreError::Config("terrain.features needs a positive total weight".into()));
        }
        Ok(())
    }
}

// ── SchedulerConfig ───────────────────────────────────────────────────────────

/// Cell-tick scheduling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// A cell lock older than this is considered abandoned and may be taken
    /// over.  Must comfortably exceed the slowest expected tick.
    pub lock_stale_after_ms: i64,

    /// Attempts per tick before giving up with a retry-later error.
    pub max_attempts: u32,

    /// Simulated duration of one cell tick.
    pub tick_duration_ms: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lock_stale_after_ms: 120_000,
            max_attempts:        3,
            tick_duration_ms:    1_000,
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.lock_stale_after_ms <= 0 {
            return Err(CoreError::Config("scheduler.lock_stale_after_ms must be > 0".into()));
        }
        if self.max_attempts == 0 {
            return Err(CoreError::Config("scheduler.max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}
