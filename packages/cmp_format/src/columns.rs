//! Column-indirection encoding of the block grid.
//!
//! The grid is stored as three tables:
//!
//! - _base tiles_, one `i32` per `<x,y>` column, `[y][x]` order. Each is the
//!   byte offset of the column's entry in the column data.
//! - _column data_, a `u16` array. A column entry starts with the number of
//!   empty layers on top of the column, `6 - height`, followed by `height`
//!   block indices going from the top of the column downwards.
//! - _blocks_, the table of distinct block records the indices point into.
//!
//! Identical columns share one entry and identical blocks share one record.

use crate::{
    error::*,
    reader::CmpReader,
    writer::CmpWriter,
};
use city_data::{
    BlockGrid,
    MapBlockInfo,
    MAP_DIMENSIONS,
    MAP_LAYERS_COUNT,
};
use std::{
    collections::HashMap,
    io::{Read, Write},
};
use tracing::debug;


/// Number of base tiles.
pub const BASE_TILES_COUNT: usize = MAP_DIMENSIONS * MAP_DIMENSIONS;

/// Size of one block record in bytes.
pub const BLOCK_RECORD_LEN: usize = 8;


/// The three tables a block grid is stored as.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedGrid {
    pub base_tiles: Vec<i32>,
    pub column_data: Vec<u16>,
    pub blocks: Vec<MapBlockInfo>,
}

impl CompressedGrid {
    /// Encode a grid, sharing identical columns and blocks.
    pub fn compress(grid: &BlockGrid) -> Result<Self> {
        let air = MapBlockInfo::default();
        let mut blocks = Vec::new();
        let mut block_indices = HashMap::new();
        let mut column_data = Vec::new();
        let mut column_offsets: HashMap<Vec<u16>, usize> = HashMap::new();
        let mut base_tiles = Vec::with_capacity(BASE_TILES_COUNT);

        for y in 0..MAP_DIMENSIONS as i32 {
            for x in 0..MAP_DIMENSIONS as i32 {
                let column = grid.column(x, y).unwrap_or([air; MAP_LAYERS_COUNT]);
                let height = column
                    .iter()
                    .rposition(|block| *block != air)
                    .map(|top| top + 1)
                    .unwrap_or(0);

                let mut entry = Vec::with_capacity(height + 1);
                entry.push((MAP_LAYERS_COUNT - height) as u16);
                for block in column[..height].iter().rev() {
                    let next_index = blocks.len();
                    let index = *block_indices.entry(*block).or_insert(next_index);
                    if index == next_index {
                        blocks.push(*block);
                    }
                    let index = u16::try_from(index).map_err(|_| error!(
                        MalformedData, None,
                        "more than {} distinct blocks", u16::MAX as usize + 1,
                    ))?;
                    entry.push(index);
                }

                let offset = match column_offsets.get(&entry) {
                    Some(&offset) => offset,
                    None => {
                        let offset = column_data.len();
                        column_data.extend_from_slice(&entry);
                        column_offsets.insert(entry, offset);
                        offset
                    }
                };
                let base_tile = i32::try_from(offset * 2).map_err(|_| error!(
                    MalformedData, None,
                    "column data of {} entries overflows base tile offsets", column_data.len(),
                ))?;
                base_tiles.push(base_tile);
            }
        }

        debug!(
            "compressed grid into {} column entries, {} blocks",
            column_data.len(),
            blocks.len(),
        );
        Ok(CompressedGrid { base_tiles, column_data, blocks })
    }

    /// Expand into a dense grid.
    pub fn decompress(&self) -> Result<BlockGrid> {
        let mut grid = BlockGrid::new();
        decompress(&self.base_tiles, &self.column_data, &self.blocks, &mut grid)?;
        Ok(grid)
    }
}

/// Fill `grid` from the three tables. Cells above each column's height are
/// left untouched.
pub fn decompress(
    base_tiles: &[i32],
    column_data: &[u16],
    blocks: &[MapBlockInfo],
    grid: &mut BlockGrid,
) -> Result<()> {
    ensure!(
        base_tiles.len() == BASE_TILES_COUNT,
        MalformedData, None,
        "{} base tiles, expected {}", base_tiles.len(), BASE_TILES_COUNT,
    );
    for y in 0..MAP_DIMENSIONS {
        for x in 0..MAP_DIMENSIONS {
            let base_tile = base_tiles[y * MAP_DIMENSIONS + x];
            ensure!(
                base_tile >= 0 && base_tile % 2 == 0,
                MalformedData, None,
                "column <{}, {}> has invalid base tile offset {}", x, y, base_tile,
            );
            let element = base_tile as usize / 2;
            let skip = *column_data.get(element).ok_or_else(|| error!(
                MalformedData, None,
                "column <{}, {}> starts at {}, past the end of {} column entries",
                x, y, element, column_data.len(),
            ))? as usize;
            ensure!(
                skip <= MAP_LAYERS_COUNT,
                MalformedData, None,
                "column <{}, {}> skips {} layers", x, y, skip,
            );
            let height = MAP_LAYERS_COUNT - skip;
            ensure!(
                element + height < column_data.len(),
                MalformedData, None,
                "column <{}, {}> of height {} runs past the end of the column data",
                x, y, height,
            );

            for z in 0..height {
                let src = column_data[element + height - z] as usize;
                let block = blocks.get(src).ok_or_else(|| error!(
                    MalformedData, None,
                    "column <{}, {}> layer {} uses block {}, only {} blocks",
                    x, y, z, src, blocks.len(),
                ))?;
                if let Some(cell) = grid.get_mut(x as i32, y as i32, z as i32) {
                    *cell = *block;
                }
            }
        }
    }
    Ok(())
}

pub fn read_base_tiles<R: Read>(reader: &mut CmpReader<R>) -> Result<Vec<i32>> {
    let bytes = reader.read_vec(BASE_TILES_COUNT * 4)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

pub fn read_column_data<R: Read>(
    reader: &mut CmpReader<R>,
    count: usize,
) -> Result<Vec<u16>> {
    let bytes = reader.read_vec(count * 2)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect())
}

pub fn read_blocks<R: Read>(
    reader: &mut CmpReader<R>,
    count: usize,
) -> Result<Vec<MapBlockInfo>> {
    let start = reader.offset();
    let bytes = reader.read_vec(count * BLOCK_RECORD_LEN)?;
    bytes
        .chunks_exact(BLOCK_RECORD_LEN)
        .enumerate()
        .map(|(i, c)| {
            let type_map = u16::from_le_bytes([c[0], c[1]]);
            let faces = [c[3], c[4], c[5], c[6], c[7]];
            MapBlockInfo::from_raw(type_map, c[2], faces).map_err(|e| Error::new(
                ErrorKind::MalformedData,
                e,
                Some(start + (i * BLOCK_RECORD_LEN) as u64),
            ))
        })
        .collect()
}

pub fn write_block<W: Write>(writer: &mut CmpWriter<W>, block: &MapBlockInfo) -> Result<()> {
    let (type_map, type_map_ext, faces) = block.to_raw();
    writer.write_u16(type_map)?;
    writer.write_u8(type_map_ext)?;
    writer.write_bytes(&faces)?;
    Ok(())
}


#[cfg(test)]
use city_data::GroundType;

#[cfg(test)]
fn block(ground_type: GroundType, lid: u8) -> MapBlockInfo {
    let mut block = MapBlockInfo { ground_type, ..MapBlockInfo::default() };
    block.faces.0[4] = lid;
    block
}

#[test]
fn decompress_follows_column_formula() {
    let blocks = vec![
        block(GroundType::Field, 1),
        block(GroundType::Building, 2),
        block(GroundType::Road, 3),
    ];
    // entry 0: empty column
    // entry 1: height 3, top to bottom 2, 1, 0
    // entry 5: height 1, block 1
    let column_data = vec![6, 3, 2, 1, 0, 5, 1];
    let mut base_tiles = vec![0; BASE_TILES_COUNT];
    base_tiles[7 * MAP_DIMENSIONS + 4] = 2;
    base_tiles[MAP_DIMENSIONS - 1] = 10;

    let mut grid = BlockGrid::new();
    decompress(&base_tiles, &column_data, &blocks, &mut grid).unwrap();

    for z in 0..3 {
        let src = column_data[1 + 3 - z] as usize;
        assert_eq!(grid.get(4, 7, z as i32), Some(&blocks[src]));
    }
    assert_eq!(grid.get(4, 7, 0).unwrap().ground_type, GroundType::Field);
    assert_eq!(grid.get(4, 7, 2).unwrap().ground_type, GroundType::Road);
    assert!(grid.get(4, 7, 3).unwrap().is_air());
    assert_eq!(grid.get(255, 0, 0), Some(&blocks[1]));
    assert_eq!(grid.count_non_empty(), 4);
}

#[test]
fn decompress_rejects_bad_indirection() {
    let blocks = vec![block(GroundType::Field, 1)];
    let mut grid = BlockGrid::new();

    let mut base_tiles = vec![0; BASE_TILES_COUNT];
    base_tiles[3] = 1;
    let error = decompress(&base_tiles, &[6], &blocks, &mut grid).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MalformedData);

    let base_tiles = vec![0; BASE_TILES_COUNT];
    assert!(decompress(&base_tiles, &[7], &blocks, &mut grid).is_err());
    // height 2 but only one index follows
    assert!(decompress(&base_tiles, &[4, 0], &blocks, &mut grid).is_err());
    // index past the block table
    assert!(decompress(&base_tiles, &[5, 1], &blocks, &mut grid).is_err());
    assert!(decompress(&base_tiles, &[], &blocks, &mut grid).is_err());
}

#[test]
fn compress_shares_columns_and_blocks() {
    let mut grid = BlockGrid::new();
    let road = block(GroundType::Road, 7);
    for x in 0..MAP_DIMENSIONS as i32 {
        *grid.get_mut(x, 3, 0).unwrap() = road;
    }
    *grid.get_mut(9, 9, 2).unwrap() = road;

    let compressed = CompressedGrid::compress(&grid).unwrap();
    // air and road are the only distinct blocks
    assert_eq!(compressed.blocks.len(), 2);
    // empty column, road column, and the column with air under a road
    assert_eq!(compressed.column_data, vec![6, 5, 0, 3, 0, 1, 1]);
    assert_eq!(compressed.base_tiles[3 * MAP_DIMENSIONS + 100], 2);
    assert_eq!(compressed.decompress().unwrap(), grid);
}

#[test]
fn block_records_reject_invalid_bits() {
    let mut writer = CmpWriter::new(Vec::new());
    write_block(&mut writer, &block(GroundType::Pavement, 4)).unwrap();
    // traffic hint 2 is never valid
    writer.write_bytes(&[0, 0, 2, 0, 0, 0, 0, 0]).unwrap();
    let bytes = writer.into_inner();

    let ok = read_blocks(&mut CmpReader::new(&bytes[..BLOCK_RECORD_LEN]), 1).unwrap();
    assert_eq!(ok, vec![block(GroundType::Pavement, 4)]);

    let error = read_blocks(&mut CmpReader::new(&bytes[..]), 2).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::MalformedData);
    assert_eq!(error.offset(), Some(BLOCK_RECORD_LEN as u64));
}
