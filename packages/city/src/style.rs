//! Companion style files.
//!
//! A map names its style by number. Only the style header is read here, it
//! is enough to lay out the block texture atlas.

use city_data::BlockType;
use cmp_format::CmpReader;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
};
use serde::{Serialize, Deserialize};
use anyhow::{Context, Result, ensure};


/// Bytes of one 64x64 block texture.
pub const BLOCK_TEXTURE_AREA: u32 = 64 * 64;


/// Which flavor of style file goes with a map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StyleFormat {
    /// 24-bit color.
    #[default]
    G24,
    /// 8-bit color.
    Gry,
}

impl StyleFormat {
    pub fn version_code(self) -> u32 {
        match self {
            StyleFormat::G24 => 336,
            StyleFormat::Gry => 325,
        }
    }

    /// Number of `u32` fields in the header, version code included.
    fn header_fields(self) -> usize {
        match self {
            StyleFormat::G24 => 16,
            StyleFormat::Gry => 13,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            StyleFormat::G24 => "G24",
            StyleFormat::Gry => "GRY",
        }
    }
}

/// File name of style `style_number`, like `STYLE001.G24`.
pub fn style_file_name(style_number: u8, format: StyleFormat) -> String {
    format!("STYLE{:03}.{}", style_number, format.extension())
}


/// Maps a block face texture index to its layer in the block texture atlas.
pub trait BlockTextureLookup {
    fn block_texture_index(&self, block_type: BlockType, index: u8) -> u32;
}

/// Block texture counts of a loaded style.
///
/// The atlas holds all side textures, then all lid textures, then all aux
/// textures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct StyleData {
    pub side_blocks_count: u32,
    pub lid_blocks_count: u32,
    pub aux_blocks_count: u32,
}

impl StyleData {
    pub fn read_header<R: Read>(read: R, format: StyleFormat) -> Result<Self> {
        let mut reader = CmpReader::new(read);
        let version_code = reader.read_u32()?;
        ensure!(
            version_code == format.version_code(),
            "style version {}, expected {}", version_code, format.version_code(),
        );
        let mut blocks_count = |section: &str| -> Result<u32> {
            let size = reader.read_u32()?;
            ensure!(
                size % BLOCK_TEXTURE_AREA == 0,
                "{} block section size {} is not a multiple of {}", section, size, BLOCK_TEXTURE_AREA,
            );
            Ok(size / BLOCK_TEXTURE_AREA)
        };
        let style = StyleData {
            side_blocks_count: blocks_count("side")?,
            lid_blocks_count: blocks_count("lid")?,
            aux_blocks_count: blocks_count("aux")?,
        };
        reader.skip(4 * (format.header_fields() - 4) as u64)?;
        Ok(style)
    }

    pub fn total_blocks_count(&self) -> u32 {
        self.side_blocks_count + self.lid_blocks_count + self.aux_blocks_count
    }
}

impl BlockTextureLookup for StyleData {
    fn block_texture_index(&self, block_type: BlockType, index: u8) -> u32 {
        let index = index as u32;
        let count = match block_type {
            BlockType::Side => self.side_blocks_count,
            BlockType::Lid => self.lid_blocks_count,
            BlockType::Aux => self.aux_blocks_count,
        };
        if index >= count {
            trace!("{:?} texture {} past the {} in the style", block_type, index, count);
        }
        match block_type {
            BlockType::Side => index,
            BlockType::Lid => index + self.side_blocks_count,
            BlockType::Aux => index + self.side_blocks_count + self.lid_blocks_count,
        }
    }
}


/// Somewhere styles can be loaded from by file name.
pub trait StyleSource {
    fn load_style(&mut self, name: &str) -> Result<StyleData>;
}

/// Loads styles from files in a directory.
#[derive(Debug, Clone)]
pub struct DirStyleSource {
    dir: PathBuf,
    format: StyleFormat,
}

impl DirStyleSource {
    pub fn new(dir: impl AsRef<Path>, format: StyleFormat) -> Self {
        DirStyleSource {
            dir: dir.as_ref().to_owned(),
            format,
        }
    }
}

impl StyleSource for DirStyleSource {
    fn load_style(&mut self, name: &str) -> Result<StyleData> {
        let path = self.dir.join(name);
        let file = File::open(&path)
            .with_context(|| format!("cannot open style file {}", path.display()))?;
        let style = StyleData::read_header(BufReader::new(file), self.format)
            .with_context(|| format!("cannot read header of style file {}", path.display()))?;
        debug!(
            "loaded style {}: {} side, {} lid, {} aux blocks",
            name,
            style.side_blocks_count,
            style.lid_blocks_count,
            style.aux_blocks_count,
        );
        Ok(style)
    }
}


#[cfg(test)]
fn style_header(format: StyleFormat, sizes: &[u32]) -> Vec<u8> {
    let mut bytes = format.version_code().to_le_bytes().to_vec();
    for i in 1..format.header_fields() {
        let size = sizes.get(i - 1).copied().unwrap_or(0);
        bytes.extend_from_slice(&size.to_le_bytes());
    }
    bytes
}

#[test]
fn style_file_names() {
    assert_eq!(style_file_name(1, StyleFormat::G24), "STYLE001.G24");
    assert_eq!(style_file_name(12, StyleFormat::Gry), "STYLE012.GRY");
}

#[test]
fn style_header_block_counts() {
    let bytes = style_header(StyleFormat::G24, &[10 * 4096, 5 * 4096, 2 * 4096, 999]);
    assert_eq!(bytes.len(), 64);
    let style = StyleData::read_header(&bytes[..], StyleFormat::G24).unwrap();
    assert_eq!(style, StyleData { side_blocks_count: 10, lid_blocks_count: 5, aux_blocks_count: 2 });
    assert_eq!(style.total_blocks_count(), 17);

    assert_eq!(style.block_texture_index(BlockType::Side, 3), 3);
    assert_eq!(style.block_texture_index(BlockType::Lid, 3), 13);
    assert_eq!(style.block_texture_index(BlockType::Aux, 1), 16);
}

#[test]
fn style_header_errors() {
    let g24 = style_header(StyleFormat::G24, &[4096]);
    assert!(StyleData::read_header(&g24[..], StyleFormat::Gry).is_err());
    assert!(StyleData::read_header(&g24[..20], StyleFormat::G24).is_err());

    let uneven = style_header(StyleFormat::Gry, &[4097]);
    assert!(StyleData::read_header(&uneven[..], StyleFormat::Gry).is_err());
    let gry = style_header(StyleFormat::Gry, &[4096]);
    assert_eq!(StyleData::read_header(&gry[..], StyleFormat::Gry).unwrap().side_blocks_count, 1);
}

#[test]
fn dir_style_source_reads_files() {
    let dir = std::env::temp_dir().join(format!("city-styles-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("STYLE003.G24"), style_header(StyleFormat::G24, &[4096, 8192])).unwrap();

    let mut source = DirStyleSource::new(&dir, StyleFormat::G24);
    assert_eq!(source.load_style("STYLE003.G24").unwrap().lid_blocks_count, 2);
    assert!(source.load_style("STYLE004.G24").is_err());
    std::fs::remove_dir_all(&dir).unwrap();
}
