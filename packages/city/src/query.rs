//! Gameplay queries against the loaded map.
//!
//! Positions are in meters. World `x` runs along map `x`, world `z` along map
//! `y`, and world `y` is up.

use crate::map::GameMap;
use city_data::{
    GroundType,
    MAP_LAYERS_COUNT,
    meters_to_map_units,
    map_units_to_meters,
    map_units_to_pixels,
    pixels_to_map_units,
    slope_height,
};
use cmp_format::District;
use vek::*;


/// Cells `trace_segment_2d` steps through before giving up. Keeps line of
/// sight checks short range.
pub const TRACE_MAX_STEPS: usize = 16;


impl GameMap {
    /// Height of the ground under `pos`, in meters.
    ///
    /// Starts at the layer `pos` is in and falls through air, and through
    /// water if `exclude_water`, until it lands on a slope or a solid block.
    /// Falling past the bottom layer gives 0.
    pub fn height_at_position(&self, pos: Vec3<f32>, exclude_water: bool) -> f32 {
        let x = meters_to_map_units(pos.x);
        let y = meters_to_map_units(pos.z);
        let cell = Vec2::new(x.floor() as i32, y.floor() as i32);
        let mut layer = ((meters_to_map_units(pos.y) + 0.5).floor() as i32)
            .clamp(0, MAP_LAYERS_COUNT as i32 - 1);

        let mut height = layer as f32;
        while height > 0.0 {
            let block = self.get_block_info(cell.x, cell.y, layer);
            if block.has_slope() {
                let px = map_units_to_pixels(x - cell.x as f32);
                let py = map_units_to_pixels(y - cell.y as f32);
                height += pixels_to_map_units(slope_height(block.slope_type, px, py));
                break;
            }
            let falls_through = block.ground_type == GroundType::Air
                || (exclude_water && block.ground_type == GroundType::Water);
            if !falls_through {
                break;
            }
            height -= 1.0;
            layer -= 1;
        }
        map_units_to_meters(height)
    }

    /// Height of the top-most water block under `pos`, in meters, 0 if the
    /// column holds no water.
    pub fn water_level_at_position(&self, pos: Vec3<f32>) -> f32 {
        let x = meters_to_map_units(pos.x).floor() as i32;
        let y = meters_to_map_units(pos.z).floor() as i32;
        (0..MAP_LAYERS_COUNT as i32)
            .rev()
            .find(|&layer| self.get_block_info(x, y, layer).ground_type == GroundType::Water)
            .map(|layer| map_units_to_meters(layer as f32))
            .unwrap_or(0.0)
    }

    /// District containing `pos`. Districts are checked smallest first.
    pub fn district_at_position(&self, pos: Vec3<f32>) -> Option<&District> {
        let x = meters_to_map_units(pos.x).floor() as i32;
        let y = meters_to_map_units(pos.z).floor() as i32;
        let district = self.districts()
            .iter()
            .find(|district| district.contains(x, y));
        if district.is_none() {
            debug!("no district at block <{}, {}>", x, y);
        }
        district
    }

    /// Walk the cells from `origin` towards `destination` on the layer at
    /// `height` and return where the segment first enters a building.
    ///
    /// Positions are `<x, z>` in meters. Gives up after `TRACE_MAX_STEPS`
    /// cells, or when the destination cell is reached.
    pub fn trace_segment_2d(
        &self,
        origin: Vec2<f32>,
        destination: Vec2<f32>,
        height: f32,
    ) -> Option<Vec2<f32>> {
        let origin = origin.map(meters_to_map_units);
        let destination = destination.map(meters_to_map_units);
        let layer = meters_to_map_units(height).floor() as i32;
        if origin == destination {
            return None;
        }
        let end = destination.map(|n| n.floor() as i32);
        let dir = (destination - origin).normalized();

        let mut cell = origin.map(|n| n.floor() as i32);
        // ray length between crossings of x and y cell edges
        let delta = dir.map(|n| (1.0 / n).abs());
        let step = dir.map(|n| if n < 0.0 { -1 } else { 1 });
        let mut side_dist = Vec2::new(
            if dir.x < 0.0 {
                (origin.x - cell.x as f32) * delta.x
            } else {
                (cell.x as f32 + 1.0 - origin.x) * delta.x
            },
            if dir.y < 0.0 {
                (origin.y - cell.y as f32) * delta.y
            } else {
                (cell.y as f32 + 1.0 - origin.y) * delta.y
            },
        );

        for _ in 0..TRACE_MAX_STEPS {
            let crossed_x = side_dist.x < side_dist.y;
            if crossed_x {
                side_dist.x += delta.x;
                cell.x = cell.x.saturating_add(step.x);
            } else {
                side_dist.y += delta.y;
                cell.y = cell.y.saturating_add(step.y);
            }

            if self.get_block_info(cell.x, cell.y, layer).ground_type == GroundType::Building {
                let wall_dist = if crossed_x {
                    (cell.x as f32 - origin.x + (1 - step.x) as f32 / 2.0) / dir.x
                } else {
                    (cell.y as f32 - origin.y + (1 - step.y) as f32 / 2.0) / dir.y
                };
                let hit = origin + dir * wall_dist;
                return Some(hit.map(map_units_to_meters));
            }

            if cell == end {
                break;
            }
        }
        None
    }
}


#[cfg(test)]
use crate::map::test_util::loaded_map;
#[cfg(test)]
use city_data::{BlockGrid, MapBlockInfo, MAP_DIMENSIONS};
#[cfg(test)]
use cmp_format::RawContainer;

#[cfg(test)]
fn map_of(grid: &BlockGrid) -> GameMap {
    loaded_map(&RawContainer::compress(grid).unwrap())
}

#[cfg(test)]
fn ground(ground_type: GroundType) -> MapBlockInfo {
    MapBlockInfo { ground_type, ..MapBlockInfo::default() }
}

#[cfg(test)]
fn block_center(x: i32, y: i32, layer: i32) -> Vec3<f32> {
    Vec3::new(x as f32 + 0.5, layer as f32, y as f32 + 0.5) * 4.0
}

#[test]
fn height_falls_to_solid_ground() {
    let mut grid = BlockGrid::new();
    *grid.get_mut(3, 3, 1).unwrap() = ground(GroundType::Pavement);
    *grid.get_mut(4, 3, 2).unwrap() = ground(GroundType::Water);
    *grid.get_mut(4, 3, 1).unwrap() = ground(GroundType::Field);
    let map = map_of(&grid);

    // air above layer 1 falls down to it
    assert_eq!(map.height_at_position(block_center(3, 3, 4), false), 4.0);
    // all air falls to the bottom
    assert_eq!(map.height_at_position(block_center(8, 8, 5), false), 0.0);
    // water is solid unless excluded
    assert_eq!(map.height_at_position(block_center(4, 3, 3), false), 8.0);
    assert_eq!(map.height_at_position(block_center(4, 3, 3), true), 4.0);
    // far above the map starts from the top layer
    assert_eq!(map.height_at_position(block_center(3, 3, 40), false), 4.0);
}

#[test]
fn height_follows_slopes() {
    let mut grid = BlockGrid::new();
    // 45 degree ramp rising to the east
    *grid.get_mut(6, 6, 1).unwrap() = MapBlockInfo {
        ground_type: GroundType::Road,
        slope_type: 44,
        ..MapBlockInfo::default()
    };
    let map = map_of(&grid);

    let west = Vec3::new(6.0 * 4.0, 8.0, 6.5 * 4.0);
    let middle = Vec3::new(6.5 * 4.0, 8.0, 6.5 * 4.0);
    let east = Vec3::new(6.999 * 4.0, 8.0, 6.5 * 4.0);
    assert_eq!(map.height_at_position(west, false), 4.0);
    // pixel 32 of 63
    let expected_middle = (1.0 + (32.0f32 * 64.0 / 63.0).round() / 64.0) * 4.0;
    assert_eq!(map.height_at_position(middle, false), expected_middle);
    assert_eq!(map.height_at_position(east, false), 8.0);
}

#[test]
fn water_level_is_top_water_layer() {
    let mut grid = BlockGrid::new();
    *grid.get_mut(10, 2, 0).unwrap() = ground(GroundType::Water);
    *grid.get_mut(10, 2, 2).unwrap() = ground(GroundType::Water);
    let map = map_of(&grid);
    assert_eq!(map.water_level_at_position(block_center(10, 2, 5)), 8.0);
    assert_eq!(map.water_level_at_position(block_center(11, 2, 5)), 0.0);
}

#[test]
fn district_lookup_prefers_smaller() {
    let mut raw = RawContainer::compress(&BlockGrid::new()).unwrap();
    raw.districts = vec![
        District { x: 0, y: 0, w: 100, h: 100, sample_index: 1, name: "Suburbs".into() },
        District { x: 20, y: 20, w: 10, h: 10, sample_index: 2, name: "Mall".into() },
    ];
    let map = loaded_map(&raw);

    assert_eq!(map.district_at_position(block_center(25, 25, 0)).unwrap().name, "Mall");
    assert_eq!(map.district_at_position(block_center(30, 25, 0)).unwrap().name, "Suburbs");
    assert!(map.district_at_position(block_center(150, 5, 0)).is_none());
}

#[test]
fn trace_gives_up_after_max_steps() {
    let mut grid = BlockGrid::new();
    for y in 0..MAP_DIMENSIONS as i32 {
        *grid.get_mut(18, y, 0).unwrap() = ground(GroundType::Building);
    }
    let map = map_of(&grid);
    let destination = Vec2::new(25.5, 0.5) * 4.0;

    // the wall is 18 cells out, past the step limit
    let origin = Vec2::new(0.5, 0.5) * 4.0;
    assert_eq!(map.trace_segment_2d(origin, destination, 0.0), None);
    assert_eq!(map.trace_segment_2d(origin, origin, 0.0), None);

    // 15 cells out is in range
    let origin = Vec2::new(3.5, 0.5) * 4.0;
    let hit = map.trace_segment_2d(origin, destination, 0.0).unwrap();
    assert!((hit.x - 72.0).abs() < 1e-4);
    assert!((hit.y - 2.0).abs() < 1e-4);
}

#[test]
fn trace_far_outside_the_map() {
    let map = map_of(&BlockGrid::new());
    let origin = Vec2::new(9.0e9, 2.0);
    let toward_map = Vec2::new(-9.0e9, 2.0);
    assert_eq!(map.trace_segment_2d(origin, origin + Vec2::new(4096.0, 0.0), 0.0), None);
    assert_eq!(map.trace_segment_2d(origin, toward_map, 0.0), None);
    assert_eq!(map.trace_segment_2d(toward_map, origin, 0.0), None);
}

#[test]
fn trace_hits_buildings() {
    let mut grid = BlockGrid::new();
    for y in 0..MAP_DIMENSIONS as i32 {
        *grid.get_mut(5, y, 1).unwrap() = ground(GroundType::Building);
    }
    let map = map_of(&grid);

    // along +x from the middle of cell 1 hits the west wall of cell 5
    let origin = Vec2::new(1.5, 3.5) * 4.0;
    let hit = map.trace_segment_2d(origin, Vec2::new(9.5, 3.5) * 4.0, 4.0).unwrap();
    assert!((hit.x - 20.0).abs() < 1e-4);
    assert!((hit.y - 14.0).abs() < 1e-4);

    // along -x from cell 8 hits the east wall of cell 5
    let hit = map.trace_segment_2d(Vec2::new(8.5, 3.5) * 4.0, origin, 4.0).unwrap();
    assert!((hit.x - 24.0).abs() < 1e-4);

    // a different layer has no building
    assert_eq!(map.trace_segment_2d(origin, Vec2::new(9.5, 3.5) * 4.0, 0.0), None);
    // destination reached before the wall
    assert_eq!(map.trace_segment_2d(origin, Vec2::new(3.5, 3.5) * 4.0, 4.0), None);
}
