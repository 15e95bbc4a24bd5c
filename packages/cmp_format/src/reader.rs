//! Little-endian binary stream reading.

use crate::error::{
    Result,
    Error,
    ErrorKind,
};
use std::{
    mem::size_of,
    io::{self, Read},
    borrow::BorrowMut,
};


/// Reads fixed-width little-endian values from a `std::io::Read`, keeping
/// count of how many bytes have been consumed.
pub struct CmpReader<R> {
    read: R,
    offset: u64,
}

macro_rules! read_le_bytes {
    ($($m:ident($t:ident),)*)=>{$(
        pub fn $m(&mut self) -> Result<$t> {
            let buf = self.read([0; size_of::<$t>()])?;
            Ok($t::from_le_bytes(buf))
        }
    )*};
}

impl<R> CmpReader<R> {
    pub fn new(read: R) -> Self {
        CmpReader { read, offset: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.read
    }

    fn io_error(&self, error: io::Error) -> Error {
        Error::new(ErrorKind::Io, error, Some(self.offset))
    }
}

impl<R: Read> CmpReader<R> {
    fn read<B: BorrowMut<[u8]>>(&mut self, mut buf: B) -> Result<B> {
        let len = buf.borrow_mut().len();
        if let Err(e) = self.read.read_exact(buf.borrow_mut()) {
            return Err(self.io_error(e));
        }
        self.offset += len as u64;
        Ok(buf)
    }

    read_le_bytes!(
        read_u8(u8),
        read_i8(i8),
        read_u16(u16),
        read_i16(i16),
        read_u32(u32),
        read_i32(i32),
    );

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.read([0; N])
    }

    /// Read exactly `len` bytes. Memory is only committed as bytes actually
    /// arrive, so a bogus length fails on the stream ending rather than on
    /// allocation.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Err(e) = (&mut self.read).take(len as u64).read_to_end(&mut buf) {
            return Err(self.io_error(e));
        }
        if buf.len() != len {
            self.offset += buf.len() as u64;
            return Err(self.io_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("wanted {} bytes, stream ended after {}", len, buf.len()),
            )));
        }
        self.offset += len as u64;
        Ok(buf)
    }

    /// Consume and discard `len` bytes.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let skipped = match io::copy(&mut (&mut self.read).take(len), &mut io::sink()) {
            Ok(n) => n,
            Err(e) => return Err(self.io_error(e)),
        };
        self.offset += skipped;
        if skipped != len {
            return Err(self.io_error(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("wanted to skip {} bytes, stream ended after {}", len, skipped),
            )));
        }
        Ok(())
    }
}


#[test]
fn reads_little_endian() {
    let bytes = [0x4b, 0x01, 0x00, 0x00, 0xfe, 0xff, 0x07, 0xaa, 0xbb];
    let mut reader = CmpReader::new(&bytes[..]);
    assert_eq!(reader.read_i32().unwrap(), 331);
    assert_eq!(reader.read_i16().unwrap(), -2);
    assert_eq!(reader.read_u8().unwrap(), 7);
    assert_eq!(reader.offset(), 7);
    assert_eq!(reader.read_array::<2>().unwrap(), [0xaa, 0xbb]);
    assert_eq!(reader.offset(), 9);
}

#[test]
fn truncated_stream_is_io_error() {
    let bytes = [1, 2, 3];
    let mut reader = CmpReader::new(&bytes[..]);
    reader.skip(2).unwrap();
    let error = reader.read_u16().unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Io);
    assert_eq!(error.offset(), Some(2));

    let mut reader = CmpReader::new(&bytes[..]);
    assert_eq!(reader.read_vec(5).unwrap_err().kind(), ErrorKind::Io);

    let mut reader = CmpReader::new(&bytes[..]);
    assert_eq!(reader.skip(4).unwrap_err().kind(), ErrorKind::Io);
}
