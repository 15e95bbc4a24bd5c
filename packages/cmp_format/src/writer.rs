//! Little-endian binary stream writing.

use crate::error::Result;
use std::io::Write;


/// Writes fixed-width little-endian values to a `std::io::Write`.
pub struct CmpWriter<W> {
    write: W,
}

macro_rules! write_le_bytes {
    ($($m:ident($t:ident),)*)=>{$(
        pub fn $m(&mut self, n: $t) -> Result<()> {
            self.write_bytes(&n.to_le_bytes())
        }
    )*};
}

impl<W: Write> CmpWriter<W> {
    pub fn new(write: W) -> Self {
        CmpWriter { write }
    }

    pub fn into_inner(self) -> W {
        self.write
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write.write_all(bytes)?;
        Ok(())
    }

    write_le_bytes!(
        write_u8(u8),
        write_i8(i8),
        write_u16(u16),
        write_i16(i16),
        write_u32(u32),
        write_i32(i32),
    );
}


#[test]
fn writes_little_endian() {
    let mut writer = CmpWriter::new(Vec::new());
    writer.write_i32(331).unwrap();
    writer.write_i16(-2).unwrap();
    writer.write_u8(7).unwrap();
    assert_eq!(writer.into_inner(), [0x4b, 0x01, 0x00, 0x00, 0xfe, 0xff, 0x07]);
}
