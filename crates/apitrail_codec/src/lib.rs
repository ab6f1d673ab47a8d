//! Binary codecs.
//!
//! Two formats live here. The manifest is the cached patch history,
//! written and read back by the pipeline on every run. The search index is
//! a compact write-only dump of every entity in the graph, packed for
//! client-side lookup. Both are little-endian with u8-length-prefixed
//! strings.

mod manifest;
mod rw;
mod search;

use std::io;

use thiserror::Error;

pub use manifest::{decode_manifest, encode_manifest};
pub use rw::{Reader, Writer};
pub use search::encode_search_index;

/// Errors produced while encoding or decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Length-prefixed strings carry at most 255 bytes.
    #[error("string of {0} bytes exceeds length prefix")]
    StringTooLong(usize),
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
    /// A tag byte outside the format's defined range. The format has no
    /// skippable regions, so an unknown tag poisons everything after it.
    #[error("invalid {what} tag {value:#04x}")]
    InvalidTag { what: &'static str, value: u8 },
    #[error("invalid timestamp: {0}")]
    InvalidDate(String),
}
