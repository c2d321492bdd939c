//! Encrypting writer session.
//!
//! A `Writer` owns its sink for the lifetime of one container. It emits the
//! header with zeroed size/auth slots up front, streams ciphertext, and may
//! seek backward to overwrite regions it already emitted (consumers backpatch
//! box and frame headers after the fact). Because of those rewrites, the
//! authentication tag is intentionally NOT maintained incrementally: a hash
//! updated during writes would be stale the moment a seek rewrites earlier
//! bytes. Finalization instead re-reads the whole ciphertext region, which is
//! why the sink must also implement `Read` and why `finish` costs a full
//! second pass over everything written.

use crate::cipher::KeystreamCipher;
use crate::error::{JoyeError, Result};
use crate::header::{self, HeaderLayout, AUTH_TAG_SIZE, NONCE_SIZE};
use crate::kdf::{self, KEY_SIZE};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;
use std::io::{Read, Seek, SeekFrom, Write};

type HmacSha256 = Hmac<Sha256>;

/// Encryption scratch size; writes are chunked through an owned buffer.
const SCRATCH_SIZE: usize = 16 * 1024;

/// Streaming encryptor over a seekable sink.
///
/// Single-threaded and blocking; one session owns one sink and one cipher
/// state. Sharing a session across threads is prevented by `&mut` receivers.
pub struct Writer<W: Read + Write + Seek> {
    sink: W,
    key: [u8; KEY_SIZE],
    cipher: KeystreamCipher,
    layout: HeaderLayout,
    tags: Vec<u8>,
    /// Logical position within the plaintext stream.
    position: u64,
    /// High-water mark: the logical stream length, surviving backward seeks.
    total: u64,
    finished: bool,
    scratch: Vec<u8>,
}

impl<W: Read + Write + Seek> Writer<W> {
    /// Start a container on the sink at its current position.
    ///
    /// Generates the per-file nonce, derives the key, and writes the header
    /// with zeroed size and auth_tag slots to be patched by [`finish`].
    ///
    /// [`finish`]: Writer::finish
    pub fn new(mut sink: W, password: &str, tags: &[u8]) -> Result<Self> {
        if password.is_empty() {
            return Err(JoyeError::EmptyPassword);
        }

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        let layout = header::write_reserved(&mut sink, &nonce, tags)?;
        let key = kdf::derive_key(password, &nonce)?;
        let cipher = KeystreamCipher::new(&key, &nonce);

        Ok(Self {
            sink,
            key,
            cipher,
            layout,
            tags: tags.to_vec(),
            position: 0,
            total: 0,
            finished: false,
            scratch: vec![0u8; SCRATCH_SIZE],
        })
    }

    /// Current logical position within the plaintext stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Logical stream length: the highest position ever written.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Shared access to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Finalize the container. Idempotent; later writes and seeks fail.
    ///
    /// Flushes the sink, re-reads the ciphertext region feeding an HMAC
    /// seeded with the tag blob, then backpatches `size` and the tag into
    /// the reserved header slots. Any error surfaces here rather than
    /// leaving a file that silently claims success.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        self.sink.flush()?;
        let tag = self.recompute_tag()?;
        header::patch(&mut self.sink, &self.layout, self.total, &tag)?;
        self.sink.flush()?;

        self.finished = true;
        Ok(())
    }

    /// Full pass over `[data_offset, EOF)` producing the tag over
    /// `tags || ciphertext`.
    fn recompute_tag(&mut self) -> Result<[u8; AUTH_TAG_SIZE]> {
        self.sink.seek(SeekFrom::Start(self.layout.data_offset))?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| JoyeError::Crypto(format!("HMAC init: {}", e)))?;
        mac.update(&self.tags);

        loop {
            let n = self.sink.read(&mut self.scratch)?;
            if n == 0 {
                break;
            }
            mac.update(&self.scratch[..n]);
        }

        Ok(mac.finalize().into_bytes().into())
    }

    fn check_open(&self) -> Result<()> {
        if self.finished {
            return Err(JoyeError::SessionFinished);
        }
        Ok(())
    }
}

impl<W: Read + Write + Seek> Write for Writer<W> {
    /// Encrypt and write at the current logical position.
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.check_open()?;

        for chunk in data.chunks(SCRATCH_SIZE) {
            let buf = &mut self.scratch[..chunk.len()];
            buf.copy_from_slice(chunk);
            self.cipher.apply(buf)?;
            self.sink.write_all(buf)?;
        }

        self.position += data.len() as u64;
        if self.position > self.total {
            self.total = self.position;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.check_open()?;
        self.sink.flush()
    }
}

impl<W: Read + Write + Seek> Seek for Writer<W> {
    /// Seek within the plaintext stream; `End` is relative to [`total`].
    ///
    /// Repositions both the sink and the keystream, so a subsequent write
    /// overwrites ciphertext with bytes a sequential pass would have
    /// produced at that offset.
    ///
    /// [`total`]: Writer::total
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.check_open()?;

        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
            SeekFrom::End(delta) => self.total as i128 + delta as i128,
        };
        if target < 0 {
            return Err(JoyeError::NegativeSeek(target as i64).into());
        }
        let target = target as u64;

        self.sink
            .seek(SeekFrom::Start(self.layout.data_offset + target))?;
        self.cipher.reposition(target);
        self.position = target;
        Ok(target)
    }
}

impl<W: Read + Write + Seek> Drop for Writer<W> {
    /// Best-effort finalization; errors cannot surface from a drop, so
    /// callers that need the tag guaranteed call [`finish`] explicitly.
    ///
    /// [`finish`]: Writer::finish
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
