//! Container header.

use crate::{
    error::*,
    reader::CmpReader,
    writer::CmpWriter,
};
use std::io::{Read, Write};


/// Only container version this crate reads.
pub const CMP_VERSION_CODE: i32 = 331;

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 28;


/// Fixed-layout header at the start of a map container.
///
/// The five sizes are byte lengths of the variable-size sections which follow
/// the base tile grid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub version_code: i32,
    /// Number of the companion style file.
    pub style_number: u8,
    /// Number of the companion audio sample file.
    pub sample_number: u8,
    pub route_size: i32,
    pub object_pos_size: i32,
    pub column_size: i32,
    pub block_size: i32,
    pub nav_data_size: i32,
}

impl Header {
    /// Read a header, failing with `UnsupportedVersion` unless its version
    /// code is `CMP_VERSION_CODE`.
    pub fn read<R: Read>(reader: &mut CmpReader<R>) -> Result<Self> {
        let version_code = reader.read_i32()?;
        ensure!(
            version_code == CMP_VERSION_CODE,
            UnsupportedVersion, Some(0),
            "container version {}, expected {}", version_code, CMP_VERSION_CODE,
        );
        let style_number = reader.read_u8()?;
        let sample_number = reader.read_u8()?;
        let _reserved: [u8; 2] = reader.read_array()?;
        Ok(Header {
            version_code,
            style_number,
            sample_number,
            route_size: reader.read_i32()?,
            object_pos_size: reader.read_i32()?,
            column_size: reader.read_i32()?,
            block_size: reader.read_i32()?,
            nav_data_size: reader.read_i32()?,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut CmpWriter<W>) -> Result<()> {
        writer.write_i32(self.version_code)?;
        writer.write_u8(self.style_number)?;
        writer.write_u8(self.sample_number)?;
        writer.write_bytes(&[0; 2])?;
        writer.write_i32(self.route_size)?;
        writer.write_i32(self.object_pos_size)?;
        writer.write_i32(self.column_size)?;
        writer.write_i32(self.block_size)?;
        writer.write_i32(self.nav_data_size)?;
        Ok(())
    }
}

/// Number of `record_len`-byte records in a section of `size` bytes.
pub fn section_records(size: i32, record_len: usize, section: &str) -> Result<usize> {
    ensure!(
        size >= 0,
        MalformedData, None,
        "{} section has negative size {}", section, size,
    );
    let size = size as usize;
    ensure!(
        size % record_len == 0,
        MalformedData, None,
        "{} section size {} is not a multiple of {}", section, size, record_len,
    );
    Ok(size / record_len)
}

/// Section size field for `count` records of `record_len` bytes.
pub fn section_size(count: usize, record_len: usize, section: &str) -> Result<i32> {
    count
        .checked_mul(record_len)
        .and_then(|size| i32::try_from(size).ok())
        .ok_or_else(|| error!(
            MalformedData, None,
            "{} section of {} records does not fit a size field", section, count,
        ))
}


#[test]
fn header_layout() {
    let header = Header {
        version_code: CMP_VERSION_CODE,
        style_number: 1,
        sample_number: 2,
        route_size: 3,
        object_pos_size: 14,
        column_size: 6,
        block_size: 16,
        nav_data_size: 36,
    };
    let mut writer = CmpWriter::new(Vec::new());
    header.write(&mut writer).unwrap();
    let bytes = writer.into_inner();
    assert_eq!(bytes.len(), HEADER_LEN);
    assert_eq!(&bytes[4..8], &[1, 2, 0, 0]);
    assert_eq!(Header::read(&mut CmpReader::new(&bytes[..])).unwrap(), header);
}

#[test]
fn header_rejects_other_versions() {
    let mut bytes = vec![0; HEADER_LEN];
    bytes[..4].copy_from_slice(&336i32.to_le_bytes());
    let error = Header::read(&mut CmpReader::new(&bytes[..])).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::UnsupportedVersion);
}

#[test]
fn section_sizes_must_divide() {
    assert_eq!(section_records(72, 36, "nav").unwrap(), 2);
    assert_eq!(section_records(0, 8, "block").unwrap(), 0);
    assert_eq!(section_records(20, 8, "block").unwrap_err().kind(), ErrorKind::MalformedData);
    assert_eq!(section_records(-8, 8, "block").unwrap_err().kind(), ErrorKind::MalformedData);
    assert_eq!(section_size(3, 14, "object").unwrap(), 42);
}
