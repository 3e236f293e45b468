//! The demo village: tile map, dwellings and villagers.
//!
//! ```text
//!   hut_north ─┐                      ┌─ hut_east
//!              │                      │
//!   ═══════════╪══════════╪═══════════╪════  row 20
//!              │          │
//!   hut_south ─┘       workshop
//! ```

use std::collections::BTreeMap;
use std::io::Cursor;

use anyhow::Result;

use ts_core::{AgentId, ObjectId, Point, Rect, Timestamp, WorldConfig};
use ts_nav::{Building, TileCoord, TileGeometry, TileMap, TileMapBuilder, class, load_buildings_reader};
use ts_store::{AgentDoc, ObjectDoc, ObjectKind, Store, StoreExt};

pub const MAP_WIDTH:  usize = 60;
pub const MAP_HEIGHT: usize = 40;

const MAIN_ROAD_ROW: i32 = 20;

// Tile coordinates.  Each door is on its footprint's outer ring.
const BUILDINGS_CSV: &str = "\
id,x,y,width,height,door_x,door_y\n\
hut_north,4,4,5,4,6,7\n\
hut_east,44,6,4,4,45,9\n\
hut_south,10,30,5,5,12,30\n\
workshop,26,24,6,5,28,24\n\
";

const VILLAGERS: [(&str, &str); 6] = [
    ("Ada", "hut_north"),
    ("Bram", "hut_north"),
    ("Cleo", "hut_east"),
    ("Dov", "hut_east"),
    ("Esme", "hut_south"),
    ("Finn", "hut_south"),
];

/// Ids and positions handed to the behavior.
pub struct Village {
    pub map:   TileMap,
    pub homes: BTreeMap<ObjectId, Point>,
}

/// Stamp the buildings onto a blank map and connect every door to the main
/// road with a short spur.
pub fn build_map() -> Result<(TileMap, Vec<Building>)> {
    let buildings = load_buildings_reader(Cursor::new(BUILDINGS_CSV))?;

    let mut builder = TileMapBuilder::new(MAP_WIDTH, MAP_HEIGHT, class::EMPTY);
    builder.road_row(MAIN_ROAD_ROW, 0, MAP_WIDTH as i32 - 1);
    for b in &buildings {
        let door = b.door();
        let spur_from = if door.y < MAIN_ROAD_ROW { door.y + 1 } else { door.y - 1 };
        builder.road_col(door.x, spur_from, MAIN_ROAD_ROW);
    }
    builder.add_buildings(&buildings)?;
    Ok((builder.build(), buildings))
}

/// A building's footprint in world units.
fn footprint(b: &Building, config: &WorldConfig) -> Rect {
    let unit = config.nav.tile_unit;
    let corner = Point::new(config.nav.origin.x + b.x as f64 * unit, config.nav.origin.y + b.y as f64 * unit);
    Rect::from_origin(corner, b.width as f64 * unit, b.height as f64 * unit)
}

/// Centre of a building's interior, in world units.
fn interior_centre(b: &Building, geometry: &TileGeometry) -> Point {
    let tile = TileCoord::new(b.x + b.width as i32 / 2, b.y + b.height as i32 / 2);
    geometry.center(tile)
}

/// Write dwellings, the workshop and the villagers.  Each villager starts
/// inside their home.
pub fn populate<S: Store>(store: &S, config: &WorldConfig, now: Timestamp) -> Result<Village> {
    let (map, buildings) = build_map()?;
    let geometry = TileGeometry::from_config(&config.nav);

    let mut homes = BTreeMap::new();
    let mut by_name = BTreeMap::new();
    for (i, b) in buildings.iter().enumerate() {
        let id = ObjectId(i as u64 + 1);
        let kind = if b.id.starts_with("hut") { ObjectKind::Dwelling } else { ObjectKind::Workshop };
        let mut object = ObjectDoc::new(id, kind, interior_centre(b, &geometry), config.cell_size)
            .with_footprint(footprint(b, config), config.cell_size);
        object.residents = VILLAGERS
            .iter()
            .enumerate()
            .filter(|(_, (_, home))| *home == b.id)
            .map(|(n, _)| AgentId(n as u64 + 1))
            .collect();
        if kind == ObjectKind::Dwelling {
            homes.insert(id, object.position);
        }
        by_name.insert(b.id.as_str(), object.clone());
        store.insert(&object)?;
    }

    for (n, (name, home)) in VILLAGERS.iter().enumerate() {
        let Some(house) = by_name.get(home) else {
            anyhow::bail!("villager {name} has unknown home {home}");
        };
        let mut agent = AgentDoc::new(AgentId(n as u64 + 1), *name, house.position, now, config.cell_size);
        agent.home = Some(house.id);
        store.insert(&agent)?;
    }

    Ok(Village { map, homes })
}
