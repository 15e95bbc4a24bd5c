//! Error types.

use std::fmt::{self, Formatter, Display};


pub type Result<I> = std::result::Result<I, Error>;

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: Box<dyn std::error::Error + Send + Sync>,
    offset: Option<u64>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKind {
    /// Underlying IO error, including the stream ending early.
    Io,

    /// The header's version code is not the one this crate reads.
    UnsupportedVersion,

    /// The bytes are not a valid map container. Covers section sizes which
    /// don't divide into records, indirection entries pointing outside their
    /// tables, and bit fields holding codes no block may have.
    MalformedData,
}

impl Error {
    pub fn new<E>(
        kind: ErrorKind,
        error: E,
        offset: Option<u64>,
    ) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            error: error.into(),
            offset,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset into the stream at which the error was detected, if it
    /// was detected while reading.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.error
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.error
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, error, None)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            ErrorKind::Io => "IO error",
            ErrorKind::UnsupportedVersion => "unsupported version",
            ErrorKind::MalformedData => "malformed data",
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.kind, f)?;
        f.write_str(", ")?;
        Display::fmt(&self.error, f)?;
        if let Some(offset) = self.offset {
            write!(f, " (at byte {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}


macro_rules! error {
    ($k:ident, $offset:expr, $($e:tt)*)=>{
        $crate::error::Error::new(
            $crate::error::ErrorKind::$k,
            format!($($e)*),
            $offset,
        )
    };
}

macro_rules! bail {
    ($($e:tt)*)=>{ return Err(error!($($e)*)) };
}

macro_rules! ensure {
    ($c:expr, $($e:tt)*)=>{
        if !$c {
            bail!($($e)*);
        }
    };
}

pub(crate) use error;
pub(crate) use bail;
pub(crate) use ensure;
