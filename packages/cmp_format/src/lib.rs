//! Reading and writing the binary map container.
//!
//! ## layout
//!
//! All values are little-endian. In order:
//!
//! 1. header, see `Header`. Its version code must be `CMP_VERSION_CODE`.
//! 2. base tiles, `MAP_DIMENSIONS * MAP_DIMENSIONS` `i32`s.
//! 3. column data, `column_size / 2` `u16`s.
//! 4. block records, `block_size / 8` records of
//!    `{ type_map: u16, type_map_ext: u8, faces: [u8; 5] }`.
//! 5. startup objects, `object_pos_size / 14` records.
//! 6. routes, `route_size` opaque bytes.
//! 7. service locations, a fixed 108-byte block.
//! 8. districts, `nav_data_size / 36` records.
//!
//! Sections 2 through 4 encode the block grid, see the `columns` module.
//!
//! ```
//! use cmp_format::{RawContainer, decode_container};
//! use city_data::{BlockGrid, GroundType};
//!
//! let mut grid = BlockGrid::new();
//! grid.get_mut(1, 2, 0).unwrap().ground_type = GroundType::Water;
//! let bytes = RawContainer::compress(&grid).unwrap().to_bytes().unwrap();
//!
//! let container = decode_container(&bytes[..]).unwrap();
//! assert_eq!(container.grid, grid);
//! ```

pub mod error;
pub mod reader;
pub mod writer;
pub mod header;
pub mod columns;
pub mod records;
pub mod container;

pub use crate::{
    error::{
        Error,
        ErrorKind,
        Result,
    },
    reader::CmpReader,
    writer::CmpWriter,
    header::{
        Header,
        CMP_VERSION_CODE,
        HEADER_LEN,
    },
    columns::CompressedGrid,
    records::{
        StartupObject,
        ServiceBases,
        ServiceKind,
        District,
    },
    container::{
        MapContainer,
        RawContainer,
        decode_container,
    },
};
