//! Container header: serialize, parse, backpatch.
//!
//! On-disk layout, all integers little-endian, no padding:
//!
//! ```text
//! offset 0   magic    4 bytes  "JOYE"
//!        4   version  1 byte   (1)
//!        5   nonce    16 bytes random per file, doubles as the KDF salt
//!        21  size     8 bytes  plaintext length; 0 until backpatched
//!        29  auth_tag 32 bytes HMAC-SHA256 over tags || ciphertext
//!        61  tags_len 2 bytes
//!        63  tags     tags_len bytes, authenticated but not encrypted
//! ```
//!
//! Ciphertext follows immediately; its length equals the plaintext length.
//! The writer emits `size` and `auth_tag` zeroed and patches them during
//! finalization, so their offsets are recorded at emission time.

use crate::error::{JoyeError, Result};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom, Write};

/// File magic identifying the container format.
pub const MAGIC: &[u8; 4] = b"JOYE";

/// The only format version currently written or accepted.
pub const VERSION: u8 = 1;

/// Per-file nonce length; also the KDF salt length.
pub const NONCE_SIZE: usize = 16;

/// Authentication tag length (HMAC-SHA256 output).
pub const AUTH_TAG_SIZE: usize = 32;

/// Fixed header length up to and including `tags_len`.
pub const FIXED_HEADER_SIZE: usize = 4 + 1 + NONCE_SIZE + 8 + AUTH_TAG_SIZE + 2;

/// Upper bound on the opaque tag blob (`tags_len` is a u16).
pub const MAX_TAGS_LEN: usize = u16::MAX as usize;

/// Parsed header contents.
#[derive(Debug, Clone)]
pub struct Header {
    pub version: u8,
    pub nonce: [u8; NONCE_SIZE],
    /// Plaintext length as stored; 0 means "not backpatched", and readers
    /// recover it from the source length instead.
    pub size: u64,
    pub auth_tag: [u8; AUTH_TAG_SIZE],
    pub tags: Vec<u8>,
}

impl Header {
    /// Offset of the data region relative to the header start.
    pub fn data_offset(&self) -> u64 {
        (FIXED_HEADER_SIZE + self.tags.len()) as u64
    }
}

/// Offsets recorded while emitting a header, needed for backpatching.
#[derive(Debug, Clone, Copy)]
pub struct HeaderLayout {
    /// Absolute offset of the reserved size + auth_tag slots.
    pub reserved_offset: u64,
    /// Absolute offset where ciphertext begins.
    pub data_offset: u64,
}

/// Serializable summary for display; never parsed back.
#[derive(Debug, Serialize)]
pub struct HeaderSummary {
    pub version: u8,
    pub suite: &'static str,
    pub nonce: String,
    pub size: u64,
    pub size_backpatched: bool,
    pub auth_tag: String,
    pub tags_len: usize,
    pub tags: Option<String>,
    pub data_offset: u64,
}

impl From<&Header> for HeaderSummary {
    fn from(h: &Header) -> Self {
        Self {
            version: h.version,
            suite: crate::cipher::CipherSuite::Aes256CtrHmacSha256.name(),
            nonce: hex::encode(h.nonce),
            size: h.size,
            size_backpatched: h.size != 0,
            auth_tag: hex::encode(h.auth_tag),
            tags_len: h.tags.len(),
            tags: std::str::from_utf8(&h.tags).ok().map(str::to_owned),
            data_offset: h.data_offset(),
        }
    }
}

/// Emit a header with zeroed size/auth slots and return the recorded layout.
///
/// Offsets are taken from the sink's current position, so a container can be
/// embedded at a nonzero offset of a larger file.
pub fn write_reserved<W: Write + Seek>(
    sink: &mut W,
    nonce: &[u8; NONCE_SIZE],
    tags: &[u8],
) -> Result<HeaderLayout> {
    if tags.len() > MAX_TAGS_LEN {
        return Err(JoyeError::TagsTooLarge(tags.len()));
    }

    sink.write_all(MAGIC)?;
    sink.write_all(&[VERSION])?;
    sink.write_all(nonce)?;

    let reserved_offset = sink.stream_position()?;
    sink.write_all(&[0u8; 8 + AUTH_TAG_SIZE])?;

    sink.write_all(&(tags.len() as u16).to_le_bytes())?;
    sink.write_all(tags)?;

    let data_offset = sink.stream_position()?;
    Ok(HeaderLayout {
        reserved_offset,
        data_offset,
    })
}

/// Backpatch the reserved size and auth_tag slots.
///
/// Leaves the sink positioned at the end of the patched region.
pub fn patch<W: Write + Seek>(
    sink: &mut W,
    layout: &HeaderLayout,
    size: u64,
    auth_tag: &[u8; AUTH_TAG_SIZE],
) -> Result<()> {
    sink.seek(SeekFrom::Start(layout.reserved_offset))?;
    sink.write_all(&size.to_le_bytes())?;
    sink.write_all(auth_tag)?;
    Ok(())
}

/// Parse a header from the source's current position.
///
/// Magic and version are validated before any other field is trusted; every
/// read checks remaining length, so a truncated source fails cleanly.
pub fn read<R: Read>(source: &mut R) -> Result<Header> {
    let mut magic = [0u8; 4];
    read_exact(source, &mut magic)?;
    if &magic != MAGIC {
        return Err(JoyeError::BadMagic);
    }

    let mut version = [0u8; 1];
    read_exact(source, &mut version)?;
    let version = version[0];
    if version != VERSION {
        return Err(JoyeError::UnsupportedVersion(version));
    }

    let mut nonce = [0u8; NONCE_SIZE];
    read_exact(source, &mut nonce)?;

    let mut size = [0u8; 8];
    read_exact(source, &mut size)?;
    let size = u64::from_le_bytes(size);

    let mut auth_tag = [0u8; AUTH_TAG_SIZE];
    read_exact(source, &mut auth_tag)?;

    let mut tags_len = [0u8; 2];
    read_exact(source, &mut tags_len)?;
    let tags_len = u16::from_le_bytes(tags_len) as usize;

    let mut tags = vec![0u8; tags_len];
    read_exact(source, &mut tags)?;

    Ok(Header {
        version,
        nonce,
        size,
        auth_tag,
        tags,
    })
}

/// Probe whether the source starts with the container magic.
///
/// Consumes up to 4 bytes from the source; short input is simply "no".
pub fn sniff<R: Read>(source: &mut R) -> bool {
    let mut magic = [0u8; 4];
    match source.read_exact(&mut magic) {
        Ok(()) => &magic == MAGIC,
        Err(_) => false,
    }
}

/// Check a file on disk for the container magic without opening a session.
pub fn is_container_file<P: AsRef<std::path::Path>>(path: P) -> bool {
    match std::fs::File::open(path) {
        Ok(mut file) => sniff(&mut file),
        Err(_) => false,
    }
}

fn read_exact<R: Read>(source: &mut R, buf: &mut [u8]) -> Result<()> {
    source.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            JoyeError::TruncatedHeader
        } else {
            JoyeError::Io(e)
        }
    })
}
