//! Top-down city map engine core: loading maps, querying them, and meshing
//! them for rendering.

#[macro_use]
extern crate tracing;

pub mod logging;
pub mod settings;
pub mod style;
pub mod map;
pub mod query;
pub mod mesh;

pub use crate::{
    map::GameMap,
    settings::Settings,
    style::{
        StyleData,
        StyleFormat,
        StyleSource,
        DirStyleSource,
        BlockTextureLookup,
    },
    mesh::{
        CityVertex,
        CityMesh,
        MapMeshBuilder,
    },
};
