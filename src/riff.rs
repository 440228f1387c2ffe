//! Recursive descent over the RIFF chunk/list tree.
//!
//! The walker only makes structural decisions: which bytes belong to which
//! element, how much of the enclosing scope is left and where padding goes.
//! What a chunk means is left to a [`ChunkHandler`].

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{Result, RiffError};
use crate::fourcc::{self, from_fourcc};
use crate::reader::{ByteReader, ContainerHeader};

const HEADER_LEN: u64 = 8;

/// Size and tag of a chunk handed to a [`ChunkHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub tag: u32,
    pub size: u32,
    /// `size` rounded up to the next even number.
    pub padded_size: u64,
}

impl ChunkHeader {
    pub fn new(tag: u32, size: u32) -> Self {
        let size64 = u64::from(size);
        ChunkHeader {
            tag,
            size,
            padded_size: size64 + (size64 & 1),
        }
    }
}

/// Receives every non-list element the walker meets.
pub trait ChunkHandler {
    /// Consumes (part of) the chunk payload and returns how many bytes it read.
    ///
    /// The walker skips whatever remains of `padded_size` afterwards, so
    /// returning 0 discards the chunk.
    fn chunk<R: Read + Seek>(
        &mut self,
        reader: &mut ByteReader<R>,
        chunk: ChunkHeader,
    ) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    /// RIFX. Detected only; element reads stay little-endian.
    BigEndian,
}

/// What a walk saw, including the size mismatches that lists absorbed.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub elements: usize,
    pub lists: usize,
    pub recovered: Vec<RiffError>,
}

/// An open, validated container positioned just after its form type.
#[derive(Debug)]
pub struct RiffFile<R> {
    reader: ByteReader<R>,
    container: ContainerHeader,
}

impl RiffFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let stream_len = file.metadata()?.len();
        RiffFile::from_reader(BufReader::new(file), stream_len)
    }
}

impl<R: Read + Seek> RiffFile<R> {
    /// Reads and validates the container header of a stream holding `stream_len` bytes.
    pub fn from_reader(inner: R, stream_len: u64) -> Result<Self> {
        let mut reader = ByteReader::new(inner);
        let container = reader.read_container_header()?;

        if container.tag != fourcc::RIFF && container.tag != fourcc::RIFX {
            return Err(RiffError::InvalidFormat(from_fourcc(container.tag)));
        }

        let declared = u64::from(container.declared_size) + HEADER_LEN;
        if stream_len < declared {
            return Err(RiffError::TruncatedFile {
                declared,
                actual: stream_len,
            });
        }

        info!(
            "container '{}' with form type '{}' ({} bytes)",
            from_fourcc(container.tag),
            from_fourcc(container.form_type),
            container.declared_size
        );

        Ok(RiffFile { reader, container })
    }

    pub fn container(&self) -> &ContainerHeader {
        &self.container
    }

    pub fn byte_order(&self) -> ByteOrder {
        if self.container.tag == fourcc::RIFX {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }

    /// Walks every top-level element. Errors that escape the top level abort the walk.
    pub fn walk<H: ChunkHandler>(&mut self, handler: &mut H) -> Result<WalkReport> {
        let mut report = WalkReport::default();
        let mut remaining = self.container.content_len();

        while remaining > 0 {
            if !self.read_element(&mut remaining, handler, &mut report)? {
                break;
            }
        }

        if remaining > 0 {
            debug!("{remaining} trailing bytes too short for another element");
        }
        Ok(report)
    }

    /// Reads one element out of a scope with `remaining` bytes left.
    ///
    /// Returns `Ok(false)` when the scope cannot hold another header.
    pub fn read_element<H: ChunkHandler>(
        &mut self,
        remaining: &mut u64,
        handler: &mut H,
        report: &mut WalkReport,
    ) -> Result<bool> {
        if *remaining < HEADER_LEN {
            return Ok(false);
        }

        let (tag, size) = self.reader.read_header()?;
        *remaining -= HEADER_LEN;

        if u64::from(size) > *remaining {
            let available = *remaining;
            self.reader.skip(available)?;
            *remaining = 0;
            return Err(RiffError::ElementSizeMismatch {
                tag: from_fourcc(tag),
                needed: size,
                available,
            });
        }

        report.elements += 1;

        if tag == fourcc::LIST {
            if size < 4 {
                self.reader.skip(u64::from(size))?;
                *remaining -= u64::from(size);
                return Err(RiffError::ElementSizeMismatch {
                    tag: from_fourcc(tag),
                    needed: 4,
                    available: u64::from(size),
                });
            }
            let form_type = self.reader.read_u32()?;
            self.process_list(form_type, u64::from(size) - 4, handler, report)?;
            *remaining -= u64::from(size);
        } else {
            let chunk = ChunkHeader::new(tag, size);
            debug!("chunk '{}' ({} bytes)", from_fourcc(tag), size);
            let consumed = handler.chunk(&mut self.reader, chunk)?;
            if consumed < chunk.padded_size {
                self.reader.skip(chunk.padded_size - consumed)?;
            } else if consumed > chunk.padded_size {
                warn!(
                    "chunk '{}' read {} bytes past its {} byte payload; stream is out of step",
                    from_fourcc(tag),
                    consumed - chunk.padded_size,
                    chunk.padded_size
                );
            }
            // The final odd chunk of a scope may have no pad byte to account for.
            *remaining = remaining.saturating_sub(chunk.padded_size);
        }

        Ok(true)
    }

    fn process_list<H: ChunkHandler>(
        &mut self,
        form_type: u32,
        mut length: u64,
        handler: &mut H,
        report: &mut WalkReport,
    ) -> Result<()> {
        let list_type = from_fourcc(form_type);
        debug!("list '{list_type}' ({length} bytes)");
        report.lists += 1;

        while length > 0 {
            match self.read_element(&mut length, handler, report) {
                Ok(true) => {}
                Ok(false) => {
                    // Tail too short for another header.
                    self.reader.skip(length)?;
                    break;
                }
                Err(err) if err.is_recoverable() => {
                    warn!("list '{list_type}' cut short: {err}");
                    report.recovered.push(err);
                    self.reader.skip(length)?;
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn into_reader(self) -> ByteReader<R> {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Records every chunk and reads its payload in full.
    #[derive(Default)]
    struct Recorder {
        chunks: Vec<(String, Vec<u32>)>,
    }

    impl ChunkHandler for Recorder {
        fn chunk<R: Read + Seek>(
            &mut self,
            reader: &mut ByteReader<R>,
            chunk: ChunkHeader,
        ) -> Result<u64> {
            let mut bytes = Vec::new();
            for _ in 0..chunk.size {
                bytes.push(reader.read_byte()?);
            }
            self.chunks.push((from_fourcc(chunk.tag), bytes));
            Ok(u64::from(chunk.size))
        }
    }

    fn element(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn list(form: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
        let mut body = form.to_vec();
        for child in children {
            body.extend_from_slice(child);
        }
        let mut out = b"LIST".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn container(tag: &[u8; 4], form: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
        let mut body = form.to_vec();
        for child in children {
            body.extend_from_slice(child);
        }
        let mut out = tag.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    fn open(data: Vec<u8>) -> Result<RiffFile<Cursor<Vec<u8>>>> {
        let len = data.len() as u64;
        RiffFile::from_reader(Cursor::new(data), len)
    }

    #[test]
    fn test_walks_nested_lists_in_order() {
        let data = container(
            b"RIFF",
            b"AVI ",
            &[
                list(b"hdrl", &[element(b"avih", &[1, 2, 3, 4])]),
                list(b"movi", &[element(b"00dc", &[5, 6]), element(b"01wb", &[7])]),
                element(b"idx1", &[8, 9]),
            ],
        );
        let mut riff = open(data.clone()).unwrap();
        let mut recorder = Recorder::default();

        let report = riff.walk(&mut recorder).unwrap();

        let tags: Vec<&str> = recorder.chunks.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["avih", "00dc", "01wb", "idx1"]);
        assert_eq!(recorder.chunks[2].1, vec![7]);
        assert_eq!(report.lists, 2);
        assert_eq!(report.elements, 6);
        assert!(report.recovered.is_empty());

        // Every byte of the container was accounted for.
        let mut cursor = riff.into_reader().into_inner();
        assert_eq!(cursor.stream_position().unwrap(), data.len() as u64);
    }

    #[test]
    fn test_odd_chunk_consumes_pad_byte() {
        let data = container(
            b"RIFF",
            b"WAVE",
            &[element(b"odd ", &[1, 2, 3]), element(b"next", &[4, 5])],
        );
        let mut riff = open(data).unwrap();
        let mut recorder = Recorder::default();

        riff.walk(&mut recorder).unwrap();

        assert_eq!(recorder.chunks[0].1, vec![1, 2, 3]);
        assert_eq!(recorder.chunks[1], ("next".to_string(), vec![4, 5]));
    }

    #[test]
    fn test_unconsumed_chunk_is_skipped() {
        struct Ignore;
        impl ChunkHandler for Ignore {
            fn chunk<R: Read + Seek>(
                &mut self,
                _reader: &mut ByteReader<R>,
                _chunk: ChunkHeader,
            ) -> Result<u64> {
                Ok(0)
            }
        }

        let data = container(b"RIFF", b"WAVE", &[element(b"junk", &[9; 5])]);
        let len = data.len() as u64;
        let mut riff = open(data).unwrap();

        let report = riff.walk(&mut Ignore).unwrap();

        assert_eq!(report.elements, 1);
        let mut cursor = riff.into_reader().into_inner();
        assert_eq!(cursor.stream_position().unwrap(), len);
    }

    #[test]
    fn test_handler_overrun_is_not_rewound() {
        /// Reads a fixed number of bytes whatever the chunk declares.
        struct Greedy;
        impl ChunkHandler for Greedy {
            fn chunk<R: Read + Seek>(
                &mut self,
                reader: &mut ByteReader<R>,
                _chunk: ChunkHeader,
            ) -> Result<u64> {
                for _ in 0..4 {
                    reader.read_byte()?;
                }
                Ok(4)
            }
        }

        let data = container(b"RIFF", b"APRG", &[element(b"kgrp", &[1, 2]), element(b"tail", &[3, 4])]);
        let mut riff = open(data).unwrap();

        // The overrun eats into the next header, which no longer fits the budget.
        let result = riff.walk(&mut Greedy);
        assert!(matches!(result, Err(RiffError::ElementSizeMismatch { .. })));
    }

    #[test]
    fn test_rejects_unknown_container_tag() {
        let data = container(b"FORM", b"AIFF", &[]);
        assert!(matches!(open(data), Err(RiffError::InvalidFormat(tag)) if tag == "FORM"));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let mut data = container(b"RIFF", b"WAVE", &[element(b"data", &[0; 8])]);
        data.truncate(20);
        let mut cursor = Cursor::new(data);

        assert!(matches!(
            RiffFile::from_reader(&mut cursor, 20),
            Err(RiffError::TruncatedFile { declared: 28, actual: 20 })
        ));
        // Nothing past the container header was touched.
        assert_eq!(cursor.position(), ContainerHeader::LEN);
    }

    #[test]
    fn test_rifx_is_detected_but_read_little_endian() {
        let data = container(b"RIFX", b"akai", &[element(b"prg ", &[1, 2])]);
        let mut riff = open(data).unwrap();
        assert_eq!(riff.byte_order(), ByteOrder::BigEndian);

        let mut recorder = Recorder::default();
        riff.walk(&mut recorder).unwrap();
        assert_eq!(recorder.chunks[0].1, vec![1, 2]);
    }

    #[test]
    fn test_list_contains_size_mismatch() {
        // The inner chunk claims 100 bytes inside a list with far fewer.
        let mut bad_chunk = b"bad ".to_vec();
        bad_chunk.extend_from_slice(&100u32.to_le_bytes());
        bad_chunk.extend_from_slice(&[0; 4]);

        let data = container(
            b"RIFF",
            b"AVI ",
            &[
                list(b"strl", &[element(b"good", &[1, 2]), bad_chunk]),
                element(b"tail", &[3, 4]),
            ],
        );
        let mut riff = open(data).unwrap();
        let mut recorder = Recorder::default();

        let report = riff.walk(&mut recorder).unwrap();

        let tags: Vec<&str> = recorder.chunks.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["good", "tail"]);
        assert_eq!(report.recovered.len(), 1);
        assert!(matches!(
            &report.recovered[0],
            RiffError::ElementSizeMismatch { tag, needed: 100, available: 4 } if tag == "bad "
        ));
    }

    #[test]
    fn test_list_tail_shorter_than_header_is_skipped() {
        let mut tailed = list(b"INFO", &[element(b"ISFT", &[1, 2])]);
        tailed.extend_from_slice(&[0xEE, 0xEE]);
        let size = u32::from_le_bytes([tailed[4], tailed[5], tailed[6], tailed[7]]) + 2;
        tailed[4..8].copy_from_slice(&size.to_le_bytes());

        let data = container(b"RIFF", b"APRG", &[tailed, element(b"prg ", &[7, 8])]);
        let len = data.len() as u64;
        let mut riff = open(data).unwrap();
        let mut recorder = Recorder::default();

        let report = riff.walk(&mut recorder).unwrap();

        let tags: Vec<&str> = recorder.chunks.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["ISFT", "prg "]);
        assert_eq!(recorder.chunks[1].1, vec![7, 8]);
        assert!(report.recovered.is_empty());
        let mut cursor = riff.into_reader().into_inner();
        assert_eq!(cursor.stream_position().unwrap(), len);
    }

    #[test]
    fn test_list_smaller_than_form_type_is_mismatch() {
        let mut short_list = b"LIST".to_vec();
        short_list.extend_from_slice(&2u32.to_le_bytes());
        short_list.extend_from_slice(&[0, 0]);

        let data = container(
            b"RIFF",
            b"AVI ",
            &[list(b"hdrl", &[short_list, element(b"late", &[1, 2])]), element(b"tail", &[3, 4])],
        );
        let mut riff = open(data).unwrap();
        let mut recorder = Recorder::default();

        let report = riff.walk(&mut recorder).unwrap();

        let tags: Vec<&str> = recorder.chunks.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(tags, vec!["tail"]);
        assert_eq!(report.recovered.len(), 1);
        assert!(matches!(
            &report.recovered[0],
            RiffError::ElementSizeMismatch { tag, needed: 4, available: 2 } if tag == "LIST"
        ));
    }

    #[test]
    fn test_top_level_size_mismatch_propagates() {
        let mut body = b"WAVE".to_vec();
        body.extend_from_slice(b"data");
        body.extend_from_slice(&64u32.to_le_bytes());
        body.extend_from_slice(&[0; 4]);
        let mut data = b"RIFF".to_vec();
        data.extend_from_slice(&(body.len() as u32).to_le_bytes());
        data.extend_from_slice(&body);

        let mut riff = open(data).unwrap();
        let result = riff.walk(&mut Recorder::default());
        assert!(matches!(result, Err(RiffError::ElementSizeMismatch { .. })));
    }

    #[test]
    fn test_read_element_stops_below_header_size() {
        let data = container(b"RIFF", b"WAVE", &[]);
        let mut riff = open(data).unwrap();
        let mut remaining = 7;
        let more = riff
            .read_element(&mut remaining, &mut Recorder::default(), &mut WalkReport::default())
            .unwrap();
        assert!(!more);
        assert_eq!(remaining, 7);
    }

    #[test]
    fn test_chunk_header_padding() {
        assert_eq!(ChunkHeader::new(0, 7).padded_size, 8);
        assert_eq!(ChunkHeader::new(0, 8).padded_size, 8);
        assert_eq!(ChunkHeader::new(0, u32::MAX).padded_size, u64::from(u32::MAX) + 1);
    }
}
