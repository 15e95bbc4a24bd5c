//! In-memory model of a city map.
//!
//! ## blocks, layers, columns
//!
//! The city is a grid of _blocks_, each a 1x1x1 cell described by a
//! `MapBlockInfo`: ground type, road direction bits, slope, texture indices
//! per face, and a few rendering flags. The grid is `MAP_DIMENSIONS` blocks
//! wide and deep and `MAP_LAYERS_COUNT` _layers_ tall. Layer 0 is the lowest.
//! All blocks at one `<x,y>` form a _column_.
//!
//! ```
//! use city_data::{BlockGrid, GroundType, MapDirection};
//!
//! let mut grid = BlockGrid::new();
//! grid.get_mut(10, 20, 1).unwrap().ground_type = GroundType::Road;
//!
//! // out of range lookups clamp onto the map edge
//! assert!(grid.get_clamp(-4, 20, 1).is_air());
//! assert_eq!(
//!     grid.get_neighbour(10, 21, 1, MapDirection::N).ground_type,
//!     GroundType::Road,
//! );
//! ```
//!
//! ## units
//!
//! Positions are measured in one of three units:
//!
//! - _map units_, where one block is 1.0 long,
//! - _pixels_, where one block is `PIXELS_PER_MAP_UNIT` long; block textures
//!   and slope heights are specified in these,
//! - _meters_, the world units used by gameplay, `METERS_PER_MAP_UNIT` per
//!   block.
//!
//! In world space, `x` runs along map `x`, `z` runs along map `y`, and `y` is
//! up.

pub mod axis;
pub mod block;
pub mod grid;
pub mod slope;

pub use crate::{
    axis::{
        Face,
        PerFace,
        FACES,
        NUM_FACES,
        MapDirection,
    },
    block::{
        MapBlockInfo,
        GroundType,
        LidRotation,
        TrafficHint,
        BlockType,
        InvalidBlockBits,
    },
    grid::BlockGrid,
    slope::{
        SlopeAxis,
        SlopeRamp,
        MAX_SLOPE_TYPE,
        slope_height,
        slope_height_min,
        slope_height_max,
    },
};


/// Width and height of the map in blocks.
pub const MAP_DIMENSIONS: usize = 256;

/// Number of layers in the map.
pub const MAP_LAYERS_COUNT: usize = 6;

/// Side length of a block in pixels.
pub const PIXELS_PER_MAP_UNIT: i32 = 64;

/// Side length of a block in meters.
pub const METERS_PER_MAP_UNIT: f32 = 4.0;


pub fn meters_to_map_units(meters: f32) -> f32 {
    meters / METERS_PER_MAP_UNIT
}

pub fn map_units_to_meters(map_units: f32) -> f32 {
    map_units * METERS_PER_MAP_UNIT
}

/// Truncates towards zero.
pub fn map_units_to_pixels(map_units: f32) -> i32 {
    (map_units * PIXELS_PER_MAP_UNIT as f32) as i32
}

pub fn pixels_to_map_units(pixels: i32) -> f32 {
    pixels as f32 / PIXELS_PER_MAP_UNIT as f32
}

/// Layers are numbered from the top down in some source records.
pub fn invert_layer(layer: usize) -> usize {
    MAP_LAYERS_COUNT - 1 - layer
}


#[test]
fn unit_conversions() {
    assert_eq!(meters_to_map_units(10.0), 2.5);
    assert_eq!(map_units_to_meters(2.5), 10.0);
    assert_eq!(map_units_to_pixels(0.5), 32);
    assert_eq!(map_units_to_pixels(0.999), 63);
    assert_eq!(pixels_to_map_units(16), 0.25);
    assert_eq!(invert_layer(0), MAP_LAYERS_COUNT - 1);
}
