//! Dense block grid covering the whole map.

use crate::{
    MAP_DIMENSIONS,
    MAP_LAYERS_COUNT,
    axis::MapDirection,
    block::{GroundType, MapBlockInfo, TrafficHint},
};
use vek::*;


const NUM_BLOCKS: usize = MAP_LAYERS_COUNT * MAP_DIMENSIONS * MAP_DIMENSIONS;


/// Every block of the map, stored as `[layer][y][x]`.
///
/// Never resized after construction. Lookups through `get_clamp` clamp out
/// of range coordinates into the map rather than failing, so code working
/// near the map edge sees the edge blocks repeated.
#[derive(Clone, PartialEq)]
pub struct BlockGrid {
    blocks: Box<[MapBlockInfo]>,
}

impl BlockGrid {
    /// Grid of air blocks.
    pub fn new() -> Self {
        BlockGrid {
            blocks: vec![MapBlockInfo::default(); NUM_BLOCKS].into_boxed_slice(),
        }
    }

    /// Reset every block to air.
    pub fn clear(&mut self) {
        self.blocks.fill(MapBlockInfo::default());
    }

    fn index(x: usize, y: usize, layer: usize) -> usize {
        (layer * MAP_DIMENSIONS + y) * MAP_DIMENSIONS + x
    }

    fn in_bounds(x: i32, y: i32, layer: i32) -> bool {
        (0..MAP_DIMENSIONS as i32).contains(&x)
            && (0..MAP_DIMENSIONS as i32).contains(&y)
            && (0..MAP_LAYERS_COUNT as i32).contains(&layer)
    }

    /// Block at exact coordinates, `None` if outside the map.
    pub fn get(&self, x: i32, y: i32, layer: i32) -> Option<&MapBlockInfo> {
        if Self::in_bounds(x, y, layer) {
            Some(&self.blocks[Self::index(x as usize, y as usize, layer as usize)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: i32, y: i32, layer: i32) -> Option<&mut MapBlockInfo> {
        if Self::in_bounds(x, y, layer) {
            Some(&mut self.blocks[Self::index(x as usize, y as usize, layer as usize)])
        } else {
            None
        }
    }

    /// Block at coordinates clamped into the map.
    pub fn get_clamp(&self, x: i32, y: i32, layer: i32) -> &MapBlockInfo {
        let x = x.clamp(0, MAP_DIMENSIONS as i32 - 1) as usize;
        let y = y.clamp(0, MAP_DIMENSIONS as i32 - 1) as usize;
        let layer = layer.clamp(0, MAP_LAYERS_COUNT as i32 - 1) as usize;
        &self.blocks[Self::index(x, y, layer)]
    }

    /// Block one step away in `direction`, with the same clamping as
    /// `get_clamp`.
    pub fn get_neighbour(
        &self,
        x: i32,
        y: i32,
        layer: i32,
        direction: MapDirection,
    ) -> &MapBlockInfo {
        let Vec2 { x: dx, y: dy } = direction.to_vec();
        self.get_clamp(x.saturating_add(dx), y.saturating_add(dy), layer)
    }

    /// Blocks of one column, bottom layer first.
    pub fn column(&self, x: i32, y: i32) -> Option<[MapBlockInfo; MAP_LAYERS_COUNT]> {
        if !Self::in_bounds(x, y, 0) {
            return None;
        }
        let mut column = [MapBlockInfo::default(); MAP_LAYERS_COUNT];
        for (layer, block) in column.iter_mut().enumerate() {
            *block = self.blocks[Self::index(x as usize, y as usize, layer)];
        }
        Some(column)
    }

    /// Move road, ground and traffic bits down onto the block they
    /// describe.
    ///
    /// The source data stores direction bits, ground type and traffic hint
    /// one layer above the block carrying the matching graphics. This copies
    /// them down one layer and clears them on the top layer. Slopes are left
    /// where they are, the mesh builder reads them from the block above.
    pub fn fix_shifted_bits(&mut self) {
        for y in 0..MAP_DIMENSIONS {
            for x in 0..MAP_DIMENSIONS {
                for layer in 0..MAP_LAYERS_COUNT - 1 {
                    let above = self.blocks[Self::index(x, y, layer + 1)];
                    let curr = &mut self.blocks[Self::index(x, y, layer)];
                    curr.up_direction = above.up_direction;
                    curr.down_direction = above.down_direction;
                    curr.left_direction = above.left_direction;
                    curr.right_direction = above.right_direction;
                    curr.ground_type = above.ground_type;
                    curr.traffic_hint = above.traffic_hint;
                }

                let top = &mut self.blocks[Self::index(x, y, MAP_LAYERS_COUNT - 1)];
                top.up_direction = false;
                top.down_direction = false;
                top.left_direction = false;
                top.right_direction = false;
                top.ground_type = GroundType::Air;
                top.traffic_hint = TrafficHint::None;
            }
        }
    }

    /// Number of blocks differing from a default air block.
    pub fn count_non_empty(&self) -> usize {
        self.blocks
            .iter()
            .filter(|block| **block != MapBlockInfo::default())
            .count()
    }
}

impl Default for BlockGrid {
    fn default() -> Self {
        BlockGrid::new()
    }
}

impl std::fmt::Debug for BlockGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("BlockGrid")
            .field("non_empty", &self.count_non_empty())
            .finish()
    }
}


#[cfg(test)]
fn building() -> MapBlockInfo {
    MapBlockInfo {
        ground_type: GroundType::Building,
        ..MapBlockInfo::default()
    }
}

#[test]
fn clamped_lookup_never_fails() {
    let mut grid = BlockGrid::new();
    let max = MAP_DIMENSIONS as i32 - 1;
    let top = MAP_LAYERS_COUNT as i32 - 1;
    *grid.get_mut(0, max, top).unwrap() = building();

    assert_eq!(grid.get_clamp(-5, 999999, 999), grid.get_clamp(0, max, top));
    assert_eq!(grid.get_clamp(-5, 999999, 999).ground_type, GroundType::Building);
    assert_eq!(grid.get_clamp(i32::MIN, i32::MAX, i32::MIN), grid.get_clamp(0, max, 0));
    assert!(grid.get(-1, 0, 0).is_none());
    assert!(grid.get(0, 0, MAP_LAYERS_COUNT as i32).is_none());
}

#[test]
fn neighbours_follow_compass_offsets() {
    let mut grid = BlockGrid::new();
    *grid.get_mut(11, 9, 2).unwrap() = building();

    assert_eq!(grid.get_neighbour(10, 10, 2, MapDirection::NE).ground_type, GroundType::Building);
    assert_eq!(grid.get_neighbour(11, 10, 2, MapDirection::N).ground_type, GroundType::Building);
    assert_eq!(grid.get_neighbour(11, 8, 2, MapDirection::S).ground_type, GroundType::Building);
    assert!(grid.get_neighbour(10, 10, 2, MapDirection::SW).is_air());
    // stepping off the map edge clamps back onto the edge
    *grid.get_mut(0, 0, 0).unwrap() = building();
    assert_eq!(grid.get_neighbour(0, 0, 0, MapDirection::NW).ground_type, GroundType::Building);
}

#[test]
fn fix_shifted_bits_moves_ground_down() {
    let mut grid = BlockGrid::new();
    *grid.get_mut(3, 4, 2).unwrap() = MapBlockInfo {
        ground_type: GroundType::Road,
        up_direction: true,
        traffic_hint: TrafficHint::TrafficLights,
        slope_type: 5,
        ..MapBlockInfo::default()
    };
    let top = MAP_LAYERS_COUNT as i32 - 1;
    *grid.get_mut(3, 4, top).unwrap() = building();

    grid.fix_shifted_bits();

    let moved = grid.get(3, 4, 1).unwrap();
    assert_eq!(moved.ground_type, GroundType::Road);
    assert!(moved.up_direction);
    assert_eq!(moved.traffic_hint, TrafficHint::TrafficLights);
    assert_eq!(moved.slope_type, 0);

    let source = grid.get(3, 4, 2).unwrap();
    assert_eq!(source.ground_type, GroundType::Air);
    assert_eq!(source.slope_type, 5);

    assert!(grid.get(3, 4, top).unwrap().is_air());
    assert_eq!(grid.get(3, 4, top - 1).unwrap().ground_type, GroundType::Building);
}

#[test]
fn clear_resets_everything() {
    let mut grid = BlockGrid::new();
    *grid.get_mut(100, 100, 3).unwrap() = building();
    assert_eq!(grid.count_non_empty(), 1);
    assert_eq!(grid.column(100, 100).unwrap()[3].ground_type, GroundType::Building);
    grid.clear();
    assert_eq!(grid.count_non_empty(), 0);
}
