//! Whole-container decoding and encoding.

use crate::{
    error::*,
    reader::CmpReader,
    writer::CmpWriter,
    header::{
        Header,
        CMP_VERSION_CODE,
        section_records,
        section_size,
    },
    columns::{
        CompressedGrid,
        BLOCK_RECORD_LEN,
        decompress,
        read_base_tiles,
        read_column_data,
        read_blocks,
        write_block,
    },
    records::{
        StartupObject,
        ServiceBases,
        District,
        STARTUP_OBJECT_RECORD_LEN,
        DISTRICT_RECORD_LEN,
        read_startup_objects,
        read_districts,
    },
};
use city_data::BlockGrid;
use std::io::{Read, Write};
use tracing::debug;


/// Fully decoded map container.
#[derive(Debug, Clone)]
pub struct MapContainer {
    pub header: Header,
    pub grid: BlockGrid,
    /// Deduplicated.
    pub startup_objects: Vec<StartupObject>,
    pub service_bases: ServiceBases,
    /// Non-empty districts, smallest first.
    pub districts: Vec<District>,
}

/// Decode a map container. The route section is skipped.
pub fn decode_container<R: Read>(read: R) -> Result<MapContainer> {
    let mut reader = CmpReader::new(read);
    let header = Header::read(&mut reader)?;
    debug!(
        "container header: style {}, sample {}, routes {}B, objects {}B, columns {}B, \
        blocks {}B, nav {}B",
        header.style_number,
        header.sample_number,
        header.route_size,
        header.object_pos_size,
        header.column_size,
        header.block_size,
        header.nav_data_size,
    );

    let route_len = section_records(header.route_size, 1, "route")?;
    let num_objects = section_records(header.object_pos_size, STARTUP_OBJECT_RECORD_LEN, "object position")?;
    let num_column_entries = section_records(header.column_size, 2, "column")?;
    let num_blocks = section_records(header.block_size, BLOCK_RECORD_LEN, "block")?;
    let num_districts = section_records(header.nav_data_size, DISTRICT_RECORD_LEN, "navigation")?;

    let base_tiles = read_base_tiles(&mut reader)?;
    let column_data = read_column_data(&mut reader, num_column_entries)?;
    let blocks = read_blocks(&mut reader, num_blocks)?;
    let mut grid = BlockGrid::new();
    decompress(&base_tiles, &column_data, &blocks, &mut grid)?;
    debug!(
        "decompressed {} column entries and {} blocks into {} non-empty cells",
        column_data.len(),
        blocks.len(),
        grid.count_non_empty(),
    );

    let startup_objects = read_startup_objects(&mut reader, num_objects)?;
    reader.skip(route_len as u64)?;
    let service_bases = ServiceBases::read(&mut reader)?;
    let districts = read_districts(&mut reader, num_districts)?;
    debug!(
        "read {} startup objects, {} districts",
        startup_objects.len(),
        districts.len(),
    );

    Ok(MapContainer {
        header,
        grid,
        startup_objects,
        service_bases,
        districts,
    })
}


/// Container contents as they are laid out in the file, ready for
/// encoding. Nothing is deduplicated, sorted or filtered on the way out.
#[derive(Debug, Clone, PartialEq)]
pub struct RawContainer {
    pub style_number: u8,
    pub sample_number: u8,
    pub grid: CompressedGrid,
    pub startup_objects: Vec<StartupObject>,
    /// Opaque route bytes.
    pub routes: Vec<u8>,
    pub service_bases: ServiceBases,
    pub districts: Vec<District>,
}

impl RawContainer {
    /// Container holding `grid`, with every other section empty.
    pub fn compress(grid: &BlockGrid) -> Result<Self> {
        Ok(RawContainer {
            style_number: 0,
            sample_number: 0,
            grid: CompressedGrid::compress(grid)?,
            startup_objects: Vec::new(),
            routes: Vec::new(),
            service_bases: ServiceBases::default(),
            districts: Vec::new(),
        })
    }

    pub fn header(&self) -> Result<Header> {
        Ok(Header {
            version_code: CMP_VERSION_CODE,
            style_number: self.style_number,
            sample_number: self.sample_number,
            route_size: section_size(self.routes.len(), 1, "route")?,
            object_pos_size: section_size(
                self.startup_objects.len(),
                STARTUP_OBJECT_RECORD_LEN,
                "object position",
            )?,
            column_size: section_size(self.grid.column_data.len(), 2, "column")?,
            block_size: section_size(self.grid.blocks.len(), BLOCK_RECORD_LEN, "block")?,
            nav_data_size: section_size(self.districts.len(), DISTRICT_RECORD_LEN, "navigation")?,
        })
    }

    pub fn write<W: Write>(&self, write: W) -> Result<()> {
        let mut writer = CmpWriter::new(write);
        self.header()?.write(&mut writer)?;
        for &base_tile in &self.grid.base_tiles {
            writer.write_i32(base_tile)?;
        }
        for &entry in &self.grid.column_data {
            writer.write_u16(entry)?;
        }
        for block in &self.grid.blocks {
            write_block(&mut writer, block)?;
        }
        for object in &self.startup_objects {
            object.write(&mut writer)?;
        }
        writer.write_bytes(&self.routes)?;
        self.service_bases.write(&mut writer)?;
        for district in &self.districts {
            district.write(&mut writer)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        Ok(buf)
    }
}


#[cfg(test)]
use city_data::{GroundType, MapBlockInfo, MAP_LAYERS_COUNT};

#[cfg(test)]
fn sample_grid() -> BlockGrid {
    let mut grid = BlockGrid::new();
    for layer in 0..3 {
        *grid.get_mut(12, 40, layer).unwrap() = MapBlockInfo {
            ground_type: GroundType::Building,
            remap: layer as u8,
            ..MapBlockInfo::default()
        };
    }
    *grid.get_mut(13, 40, 0).unwrap() = MapBlockInfo {
        ground_type: GroundType::Road,
        slope_type: 41,
        ..MapBlockInfo::default()
    };
    grid
}

#[test]
fn container_decodes_what_was_written() {
    let grid = sample_grid();
    let mut raw = RawContainer::compress(&grid).unwrap();
    raw.style_number = 1;
    let object = StartupObject { x: 100, y: 200, z: 2, object_type: 9, ..Default::default() };
    raw.startup_objects = vec![object, object];
    raw.routes = vec![0xab; 17];
    raw.service_bases.hospital.push(vek::Vec3::new(3, 4, MAP_LAYERS_COUNT as i32 - 1));
    raw.districts = vec![
        District { x: 0, y: 0, w: 255, h: 255, sample_index: 0, name: "City".into() },
        District { x: 10, y: 30, w: 20, h: 20, sample_index: 4, name: "Docks".into() },
    ];

    let container = decode_container(&raw.to_bytes().unwrap()[..]).unwrap();
    assert_eq!(container.header.style_number, 1);
    assert_eq!(container.header.route_size, 17);
    assert_eq!(container.grid, grid);
    assert_eq!(container.startup_objects, vec![object]);
    assert_eq!(container.service_bases, raw.service_bases);
    assert_eq!(container.districts[0].name, "Docks");
    assert_eq!(container.districts[1].name, "City");
}

#[test]
fn container_errors() {
    let bytes = RawContainer::compress(&sample_grid()).unwrap().to_bytes().unwrap();

    let mut bad_version = bytes.clone();
    bad_version[..4].copy_from_slice(&330i32.to_le_bytes());
    assert_eq!(
        decode_container(&bad_version[..]).unwrap_err().kind(),
        ErrorKind::UnsupportedVersion,
    );

    let truncated = &bytes[..bytes.len() - 1];
    assert_eq!(decode_container(truncated).unwrap_err().kind(), ErrorKind::Io);

    // block section no longer a whole number of records
    let mut bad_size = bytes.clone();
    bad_size[20..24].copy_from_slice(&7i32.to_le_bytes());
    assert_eq!(
        decode_container(&bad_size[..]).unwrap_err().kind(),
        ErrorKind::MalformedData,
    );
}
