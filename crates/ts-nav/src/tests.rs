//! Unit tests for ts-nav.
//!
//! All tests use small hand-written maps so expected directions can be
//! worked out on paper.

#[cfg(test)]
mod helpers {
    use ts_core::{NavConfig, Point};

    use crate::{Building, CostTable, TileGeometry, TileMap, TileMapBuilder};

    /// The two-by-two map from the design notes:
    ///
    /// ```text
    /// |-
    /// -|
    /// ```
    pub fn bars_map() -> (TileMap, CostTable) {
        let map = TileMap::parse("|-\n-|");
        let costs: CostTable = [('|', 5.0), ('-', 3.0)].into_iter().collect();
        (map, costs)
    }

    /// A uniform-cost open field.
    pub fn field(width: usize, height: usize) -> (TileMap, CostTable) {
        let text = vec![".".repeat(width); height].join("\n");
        (TileMap::parse(&text), CostTable::new().with('.', 1.0))
    }

    /// A hut whose only entrance faces the road along the bottom row:
    ///
    /// ```text
    /// .#####.
    /// .#hhh#.
    /// .#hhh#.
    /// .##D##.
    /// =======
    /// ```
    pub fn hut_map() -> TileMap {
        let mut b = TileMapBuilder::new(7, 5, '.');
        b.road_row(4, 0, 6);
        b.add_building(&hut()).unwrap();
        b.build()
    }

    pub fn hut() -> Building {
        Building { id: "hut".into(), x: 1, y: 0, width: 5, height: 4, door_x: 3, door_y: 3 }
    }

    pub fn geometry() -> TileGeometry {
        TileGeometry::new(Point::ORIGIN, 10.0)
    }

    pub fn nav_config() -> NavConfig {
        NavConfig {
            origin:             Point::ORIGIN,
            tile_unit:          10.0,
            horizontal_step_ms: 500,
            vertical_step_ms:   250,
            lead_time_ms:       1_000,
            max_steps:          100,
        }
    }
}

// ── Tile maps & geometry ──────────────────────────────────────────────────────

#[cfg(test)]
mod tile_map {
    use ts_core::Point;

    use crate::{CostTable, TileCoord, TileGeometry, TileMap};

    #[test]
    fn ragged_rows() {
        let map = TileMap::parse("abc\nd\nef\n");
        assert_eq!(map.height(), 3);
        assert_eq!(map.width(), 3);
        assert_eq!(map.get(TileCoord::new(0, 1)), Some('d'));
        assert_eq!(map.get(TileCoord::new(2, 1)), None);
        assert_eq!(map.get(TileCoord::new(-1, 0)), None);
        assert_eq!(map.to_string(), "abc\nd\nef");
    }

    #[test]
    fn unknown_and_negative_costs_are_impassable() {
        let costs = CostTable::new().with('a', 1.0).with('n', -1.0).with('i', f64::INFINITY);
        assert_eq!(costs.cost('a'), Some(1.0));
        assert_eq!(costs.cost('z'), None);
        assert_eq!(costs.cost('n'), None);
        assert_eq!(costs.cost('i'), None);
    }

    #[test]
    fn tile_of_floors_relative_to_origin() {
        let g = TileGeometry::new(Point::new(100.0, 100.0), 10.0);
        assert_eq!(g.tile_of(Point::new(100.0, 100.0)), TileCoord::new(0, 0));
        assert_eq!(g.tile_of(Point::new(119.9, 105.0)), TileCoord::new(1, 0));
        assert_eq!(g.tile_of(Point::new(99.0, 100.0)), TileCoord::new(-1, 0));
        assert_eq!(g.center(TileCoord::new(1, 2)), Point::new(115.0, 125.0));
    }
}

// ── Building overlay ──────────────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use std::io::Cursor;

    use super::helpers::{hut, hut_map};
    use crate::{Building, NavError, TileMapBuilder, load_buildings_reader};

    #[test]
    fn building_is_stamped() {
        let map = hut_map();
        assert_eq!(
            map.to_string(),
            ".#####.\n.#hhh#.\n.#hhh#.\n.##D##.\n======="
        );
    }

    #[test]
    fn layout_rows_are_padded() {
        let b = TileMapBuilder::from_layout("===\n=");
        assert_eq!(b.width(), 3);
        assert_eq!(b.build().to_string(), "===\n=..");
    }

    #[test]
    fn door_on_corner_rejected() {
        let mut b = TileMapBuilder::new(7, 5, '.');
        let bad = Building { door_x: 1, door_y: 0, ..hut() };
        let err = b.add_building(&bad).unwrap_err();
        assert!(matches!(err, NavError::InvalidBuilding { .. }), "got {err}");
    }

    #[test]
    fn footprint_past_edge_rejected() {
        let mut b = TileMapBuilder::new(7, 5, '.');
        let bad = Building { x: 4, door_x: 6, ..hut() };
        assert!(b.add_building(&bad).is_err());
    }

    #[test]
    fn csv_loading() {
        let csv = "id,x,y,width,height,door_x,door_y\n\
                   hut,1,0,5,4,3,3\n\
                   shed, 0, 0, 3, 3, 1, 2\n";
        let buildings = load_buildings_reader(Cursor::new(csv)).unwrap();
        assert_eq!(buildings.len(), 2);
        assert_eq!(buildings[0], hut());
        assert_eq!(buildings[1].id, "shed");
        assert_eq!(buildings[1].door_y, 2);
    }

    #[test]
    fn csv_bad_row_is_error() {
        let csv = "id,x,y,width,height,door_x,door_y\nhut,one,0,5,4,3,3\n";
        assert!(matches!(load_buildings_reader(Cursor::new(csv)), Err(NavError::Csv(_))));
    }
}

// ── Direction maps ────────────────────────────────────────────────────────────

#[cfg(test)]
mod direction {
    use super::helpers::{bars_map, field, hut_map};
    use crate::{CostTable, Direction, TileCoord, TileMap, class, compute_direction_map};

    #[test]
    fn bars_scenario() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(1, 1));

        assert_eq!(dm.weight_at(TileCoord::new(1, 1)), 0.0);
        assert_eq!(dm.direction_at(TileCoord::new(1, 1)), Direction::Destination);
        assert_eq!(dm.weight_at(TileCoord::new(1, 0)), 3.0);
        assert_eq!(dm.weight_at(TileCoord::new(0, 1)), 3.0);
        // Both neighbours offer 3 + 5; the horizontal one is examined last.
        assert_eq!(dm.weight_at(TileCoord::new(0, 0)), 8.0);
        assert_eq!(dm.direction_at(TileCoord::new(0, 0)), Direction::Right);
        assert_eq!(dm.render(), ">v\n>*");
    }

    #[test]
    fn deterministic() {
        let map = hut_map();
        let costs = CostTable::standard();
        let a = compute_direction_map(&map, &costs, TileCoord::new(3, 1));
        let b = compute_direction_map(&map, &costs, TileCoord::new(3, 1));
        assert_eq!(a, b);
        assert_eq!(a.render(), b.render());
    }

    #[test]
    fn open_field_tie_breaks_close_the_larger_gap() {
        let (map, costs) = field(3, 3);
        let dm = compute_direction_map(&map, &costs, TileCoord::new(2, 2));
        assert_eq!(dm.render(), ">vv\n>>v\n>>*");
        assert_eq!(dm.weight_at(TileCoord::new(0, 0)), 4.0);
    }

    #[test]
    fn tie_breaks_mirror_with_destination() {
        let (map, costs) = field(3, 3);
        let dm = compute_direction_map(&map, &costs, TileCoord::new(0, 0));
        assert_eq!(dm.render(), "*<<\n^<<\n^^<");
    }

    #[test]
    fn walls_are_unreachable() {
        let map = hut_map();
        let dm = compute_direction_map(&map, &CostTable::standard(), TileCoord::new(3, 1));
        assert!(!dm.is_reachable(TileCoord::new(1, 1)));
        assert_eq!(dm.direction_at(TileCoord::new(1, 1)), Direction::None);
        assert_eq!(dm.direction_at(TileCoord::new(3, 3)), Direction::Up);
        assert_eq!(map.get(TileCoord::new(3, 3)), Some(class::DOOR));
    }

    #[test]
    fn destination_outside_map() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(9, 9));
        assert!(!dm.has_destination());
        assert_eq!(dm.render(), "  \n  ");
        assert!(!dm.is_reachable(TileCoord::new(0, 0)));
    }

    #[test]
    fn short_rows_are_impassable() {
        let map = TileMap::parse("...\n.\n...");
        let costs = CostTable::new().with('.', 1.0);
        let dm = compute_direction_map(&map, &costs, TileCoord::new(2, 2));
        assert!(!dm.is_reachable(TileCoord::new(1, 1)));
        // Reachable only the long way round, down the left column.
        assert_eq!(dm.weight_at(TileCoord::new(2, 0)), 6.0);
        assert!(dm.is_reachable(TileCoord::new(0, 0)));
        assert_eq!(dm.direction_at(TileCoord::new(0, 1)), Direction::Down);
    }

    #[test]
    fn json_keeps_unreachable_weights() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(9, 9));
        let json = serde_json::to_string(&dm).unwrap();
        let back: crate::DirectionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dm);
        assert!(back.weight_at(TileCoord::new(0, 0)).is_infinite());
    }
}

// ── Path walking ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod walker {
    use ts_core::{NavConfig, Point, Timestamp};

    use super::helpers::{bars_map, field, geometry, hut_map, nav_config};
    use crate::{CostTable, TileCoord, compute_direction_map, compute_path};

    #[test]
    fn bars_scenario_path() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(1, 1));
        let path = compute_path(&dm, &geometry(), Point::new(5.0, 5.0), Timestamp(0), &nav_config());

        let got: Vec<(i64, Point)> = path.waypoints.iter().map(|w| (w.time.0, w.location)).collect();
        assert_eq!(
            got,
            vec![
                (1_000, Point::new(5.0, 5.0)),
                (1_500, Point::new(15.0, 5.0)),
                (1_750, Point::new(15.0, 15.0)),
            ]
        );
    }

    #[test]
    fn straight_run_is_one_segment() {
        let (map, costs) = field(6, 1);
        let dm = compute_direction_map(&map, &costs, TileCoord::new(5, 0));
        let path = compute_path(&dm, &geometry(), Point::new(3.0, 5.0), Timestamp(0), &nav_config());
        assert_eq!(path.len(), 2);
        assert_eq!(path.last().unwrap().location, Point::new(55.0, 5.0));
        assert_eq!(path.arrival(), Some(Timestamp(1_000 + 5 * 500)));
    }

    #[test]
    fn enters_building_through_door() {
        let map = hut_map();
        let dm = compute_direction_map(&map, &CostTable::standard(), TileCoord::new(3, 1));
        let path = compute_path(&dm, &geometry(), Point::new(5.0, 45.0), Timestamp(0), &nav_config());

        let locations: Vec<Point> = path.waypoints.iter().map(|w| w.location).collect();
        assert_eq!(
            locations,
            vec![Point::new(5.0, 45.0), Point::new(35.0, 45.0), Point::new(35.0, 15.0)]
        );
        assert_eq!(path.arrival(), Some(Timestamp(1_000 + 3 * 500 + 3 * 250)));
    }

    #[test]
    fn already_at_destination() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(1, 1));
        let path = compute_path(&dm, &geometry(), Point::new(12.0, 18.0), Timestamp(0), &nav_config());
        assert_eq!(path.len(), 1);
        assert!(path.is_stationary());
    }

    #[test]
    fn unreachable_destination_does_not_move() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(-3, 0));
        let path = compute_path(&dm, &geometry(), Point::new(5.0, 5.0), Timestamp(0), &nav_config());
        assert_eq!(path.len(), 1);
        assert_eq!(path.first().unwrap().time, Timestamp(1_000));
    }

    #[test]
    fn step_guard_bounds_the_walk() {
        let (map, costs) = field(50, 1);
        let dm = compute_direction_map(&map, &costs, TileCoord::new(49, 0));
        let cfg = NavConfig { max_steps: 4, ..nav_config() };
        let path = compute_path(&dm, &geometry(), Point::new(5.0, 5.0), Timestamp(0), &cfg);
        assert_eq!(path.len(), 2);
        assert_eq!(path.last().unwrap().location, Point::new(45.0, 5.0));
        assert_eq!(path.arrival(), Some(Timestamp(1_000 + 4 * 500)));
    }

    #[test]
    fn origin_off_map_does_not_move() {
        let (map, costs) = bars_map();
        let dm = compute_direction_map(&map, &costs, TileCoord::new(1, 1));
        let path = compute_path(&dm, &geometry(), Point::new(-50.0, 5.0), Timestamp(0), &nav_config());
        assert!(path.is_stationary());
    }
}

// ── Cache & navigator ─────────────────────────────────────────────────────────

#[cfg(test)]
mod navigator {
    use std::sync::Arc;

    use ts_core::{Point, Timestamp};

    use super::helpers::{bars_map, hut_map, nav_config};
    use crate::{
        CostTable, DirectionMapCache, DirectionMapNavigator, Navigator, StraightLineNavigator,
        TileCoord, TileMap,
    };

    #[test]
    fn cache_reuses_maps() {
        let (map, costs) = bars_map();
        let cache = DirectionMapCache::new(map, costs);
        let a = cache.get(TileCoord::new(1, 1));
        let b = cache.get(TileCoord::new(1, 1));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);

        cache.invalidate();
        assert!(cache.is_empty());
        let c = cache.get(TileCoord::new(1, 1));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(*a, *c);
    }

    #[test]
    fn replacing_the_map_changes_results() {
        let (map, costs) = bars_map();
        let cache = DirectionMapCache::new(map, costs);
        assert_eq!(cache.get(TileCoord::new(1, 1)).render(), ">v\n>*");

        cache.replace_map(TileMap::parse("--\n--"));
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(TileCoord::new(1, 1)).weight_at(TileCoord::new(0, 0)), 6.0);
    }

    #[test]
    fn direction_map_navigator_plans_to_tile_center() {
        let nav = DirectionMapNavigator::new(hut_map(), CostTable::standard(), nav_config());
        let path = nav.plan(Point::new(5.0, 45.0), Point::new(33.0, 12.0), Timestamp(0)).unwrap();
        assert_eq!(path.last().unwrap().location, Point::new(35.0, 15.0));
        assert_eq!(nav.cache().len(), 1);
    }

    #[test]
    fn straight_line_navigator() {
        let nav = StraightLineNavigator { config: nav_config() };
        let path = nav.plan(Point::ORIGIN, Point::new(30.0, 40.0), Timestamp(0)).unwrap();
        assert_eq!(path.len(), 2);
        // 50 units = 5 tiles at 500 ms.
        assert_eq!(path.arrival(), Some(Timestamp(3_500)));
    }
}
