//! Reads RIFF containers and decodes Akai `.akp` programs out of them.
//!
//! [`riff::RiffFile`] walks the chunk/list tree and hands every chunk to a
//! [`riff::ChunkHandler`]; [`akai::AkaiDecoder`] is the handler that fills a
//! [`Program`]. [`decode_file`] wires the two together for a path on disk.

pub mod akai;
pub mod error;
pub mod fourcc;
pub mod program;
pub mod reader;
pub mod riff;

use std::io::{Read, Seek};
use std::path::Path;

pub use crate::akai::AkaiDecoder;
pub use crate::error::{Result, RiffError};
pub use crate::program::{Keygroup, Program};
pub use crate::reader::{ByteReader, ContainerHeader};
pub use crate::riff::{ByteOrder, ChunkHandler, ChunkHeader, RiffFile, WalkReport};

/// A program together with what the walk reported about its container.
#[derive(Debug)]
pub struct Decoded {
    pub program: Program,
    pub container: ContainerHeader,
    pub report: WalkReport,
}

/// Decodes the program stored at `path`, named after the file stem.
///
/// Any failure comes back as [`RiffError::File`] with the cause attached.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<Decoded> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let decode = || -> Result<Decoded> {
        let mut riff = RiffFile::open(path)?;
        decode_riff(name, &mut riff)
    };
    decode().map_err(|err| err.in_file(path))
}

/// Decodes a program from any seekable stream holding `stream_len` bytes.
pub fn decode_reader<R: Read + Seek>(
    name: impl Into<String>,
    inner: R,
    stream_len: u64,
) -> Result<Decoded> {
    let mut riff = RiffFile::from_reader(inner, stream_len)?;
    decode_riff(name.into(), &mut riff)
}

fn decode_riff<R: Read + Seek>(name: String, riff: &mut RiffFile<R>) -> Result<Decoded> {
    let mut decoder = AkaiDecoder::new(name);
    let report = riff.walk(&mut decoder)?;
    Ok(Decoded {
        program: decoder.into_program(),
        container: *riff.container(),
        report,
    })
}
