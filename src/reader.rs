use std::io::{Read, Seek, SeekFrom};

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Result, RiffError};

/// The twelve bytes that open every container: tag, declared size and form type.
#[derive(BinRead, Debug, Clone, Copy, PartialEq, Eq)]
#[br(little)]
pub struct ContainerHeader {
    pub tag: u32,
    pub declared_size: u32,
    pub form_type: u32,
}

impl ContainerHeader {
    pub const LEN: u64 = 12;

    /// Bytes of nested elements following the form type.
    pub fn content_len(&self) -> u64 {
        u64::from(self.declared_size).saturating_sub(4)
    }
}

/// Forward-only primitive reads over a single stream.
///
/// No position is tracked here; every call advances the underlying stream.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
}

impl<R: Read + Seek> ByteReader<R> {
    pub fn new(inner: R) -> Self {
        ByteReader { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn read_container_header(&mut self) -> Result<ContainerHeader> {
        ContainerHeader::read(&mut self.inner).map_err(|err| match err {
            err if err.is_eof() => RiffError::CorruptFile {
                expected: ContainerHeader::LEN as usize,
            },
            binrw::Error::Io(io) => RiffError::Io(io),
            other => RiffError::Io(std::io::Error::other(other.to_string())),
        })
    }

    /// Reads an element header as `(tag, size)`.
    pub fn read_header(&mut self) -> Result<(u32, u32)> {
        let mut buf = [0u8; 8];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| RiffError::short_read(e, 8))?;
        let mut fields = &buf[..];
        let tag = fields.read_u32::<LittleEndian>()?;
        let size = fields.read_u32::<LittleEndian>()?;
        Ok((tag, size))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner
            .read_u32::<LittleEndian>()
            .map_err(|e| RiffError::short_read(e, 4))
    }

    /// Reads two bytes, zero-extended.
    pub fn read_u16(&mut self) -> Result<u32> {
        self.inner
            .read_u16::<LittleEndian>()
            .map(u32::from)
            .map_err(|e| RiffError::short_read(e, 2))
    }

    pub fn read_byte(&mut self) -> Result<u32> {
        self.inner
            .read_u8()
            .map(u32::from)
            .map_err(|e| RiffError::short_read(e, 1))
    }

    /// Moves forward `count` bytes without reading them. Landing on or past EOF is fine.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let offset = i64::try_from(count).map_err(|_| {
            RiffError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("cannot skip {count} bytes"),
            ))
        })?;
        self.inner.seek(SeekFrom::Current(offset))?;
        Ok(())
    }
}
