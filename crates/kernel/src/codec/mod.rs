//! Well-Known Text and Well-Known Binary encoding.
//!
//! Both decoders return owned, freshly built geometries and fail with a
//! [`CodecError`] on malformed input, including an unknown tag or type code.

pub mod wkb;
pub mod wkt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Geometry, GeometryError};

/// WKB byte order marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    /// Big-endian, marker byte 0.
    #[default]
    Xdr,
    /// Little-endian, marker byte 1.
    Ndr,
}

impl ByteOrder {
    pub fn marker(&self) -> u8 {
        match self {
            Self::Xdr => 0,
            Self::Ndr => 1,
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0 => Some(Self::Xdr),
            1 => Some(Self::Ndr),
            _ => None,
        }
    }
}

/// Deepest collection nesting either decoder accepts.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("unknown geometry tag `{0}`")]
    UnknownTag(String),
    #[error("expected {expected} at offset {offset}, found `{found}`")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        offset: usize,
    },
    #[error("unexpected end of text, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("coordinate has {found} ordinates, expected {expected}")]
    OrdinateCount { expected: usize, found: usize },
    #[error("trailing input at offset {0}")]
    TrailingInput(usize),
    #[error("unknown WKB byte order marker {0}")]
    UnknownByteOrder(u8),
    #[error("unknown WKB geometry type code {0}")]
    UnknownTypeCode(u32),
    #[error("WKB input truncated at offset {0}")]
    Truncated(usize),
    #[error("geometry nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("count {0} does not fit a WKB u32")]
    CountOverflow(usize),
    #[error(transparent)]
    Structure(#[from] GeometryError),
}

impl Geometry {
    /// WKT with six decimals.
    pub fn as_text(&self) -> String {
        wkt::WktWriter::default().write(self)
    }

    pub fn as_text_with_precision(&self, precision: usize) -> String {
        wkt::WktWriter::new(precision).write(self)
    }

    /// WKB in XDR (big-endian) order.
    pub fn as_binary(&self) -> Result<Vec<u8>, CodecError> {
        wkb::write(self, ByteOrder::Xdr)
    }

    pub fn as_binary_with_order(&self, order: ByteOrder) -> Result<Vec<u8>, CodecError> {
        wkb::write(self, order)
    }

    pub fn from_text(text: &str) -> Result<Geometry, CodecError> {
        wkt::read(text)
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Geometry, CodecError> {
        wkb::read(bytes)
    }
}
