//! Decrypting reader session.
//!
//! Reading is a pure projection of the source: there is no finalization
//! state, and decryption never checks authenticity on its own. A wrong
//! password or a flipped ciphertext byte produces garbage plaintext, not an
//! error; only [`Reader::verify`] detects either. The open call forces the
//! caller to pick a side of that trade-off explicitly via [`Integrity`].

use crate::cipher::KeystreamCipher;
use crate::error::{JoyeError, Result};
use crate::header::{self, Header};
use crate::kdf::{self, KEY_SIZE};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

type HmacSha256 = Hmac<Sha256>;

/// Verification scratch size for the whole-file pass.
const SCRATCH_SIZE: usize = 16 * 1024;

/// What to do about authenticity when opening a container.
///
/// Decryption works without verification, so the choice cannot be implied;
/// every call site states it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrity {
    /// Run the whole-file authentication pass during open and refuse the
    /// session on mismatch. Costs a full read of the ciphertext up front.
    VerifyFirst,
    /// Open without checking. The caller owns calling [`Reader::verify`]
    /// before trusting any plaintext.
    Deferred,
}

/// Streaming decryptor over a seekable source.
///
/// Single-threaded and blocking; one session owns one source and one cipher
/// state. Sharing a session across threads is prevented by `&mut` receivers.
pub struct Reader<R: Read + Seek> {
    source: R,
    header: Header,
    data_offset: u64,
    /// Plaintext length; from the header, or recovered from the source
    /// length when the header slot was never backpatched.
    size: u64,
    key: [u8; KEY_SIZE],
    cipher: KeystreamCipher,
    position: u64,
}

impl<R: Read + Seek> Reader<R> {
    /// Open a container at the source's current position.
    pub fn open(mut source: R, password: &str, integrity: Integrity) -> Result<Self> {
        let start = source.stream_position()?;
        let header = header::read(&mut source)?;
        let data_offset = start + header.data_offset();

        let key = kdf::derive_key(password, &header.nonce)?;

        let size = if header.size != 0 {
            header.size
        } else {
            // Placeholder size: the writer never finished, or wrote to a
            // sink whose length it could not know. Recover from the source.
            let end = source.seek(SeekFrom::End(0))?;
            source.seek(SeekFrom::Start(data_offset))?;
            end.saturating_sub(data_offset)
        };

        let cipher = KeystreamCipher::new(&key, &header.nonce);
        let mut reader = Self {
            source,
            header,
            data_offset,
            size,
            key,
            cipher,
            position: 0,
        };

        if integrity == Integrity::VerifyFirst && !reader.verify()? {
            return Err(JoyeError::AuthenticationMismatch);
        }

        Ok(reader)
    }

    /// Plaintext length in bytes.
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current logical position within the plaintext stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The opaque tag blob stored in the header.
    pub fn tags(&self) -> &[u8] {
        &self.header.tags
    }

    /// The stored authentication tag.
    pub fn auth_tag(&self) -> &[u8; header::AUTH_TAG_SIZE] {
        &self.header.auth_tag
    }

    /// Recompute the authentication tag over `tags || ciphertext` and
    /// compare it to the stored one.
    ///
    /// Reads the ciphertext fresh from the data region, ignoring the
    /// streaming cipher state, and restores the logical position afterwards,
    /// so interleaving with `read` is safe. Constant-time comparison.
    pub fn verify(&mut self) -> Result<bool> {
        let saved = self.position;
        self.source.seek(SeekFrom::Start(self.data_offset))?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| JoyeError::Crypto(format!("HMAC init: {}", e)))?;
        mac.update(&self.header.tags);

        let mut buf = vec![0u8; SCRATCH_SIZE];
        loop {
            let n = self.source.read(&mut buf)?;
            if n == 0 {
                break;
            }
            mac.update(&buf[..n]);
        }

        let computed: [u8; header::AUTH_TAG_SIZE] = mac.finalize().into_bytes().into();
        let ok = constant_time_compare(&computed, &self.header.auth_tag);

        self.source
            .seek(SeekFrom::Start(self.data_offset + saved))?;
        Ok(ok)
    }

    /// Release the session and hand back the source.
    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read + Seek> Read for Reader<R> {
    /// Decrypt up to `buf.len()` bytes at the current position.
    ///
    /// Returns `Ok(0)` at end of stream; EOF is never an error.
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.size.saturating_sub(self.position);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = (buf.len() as u64).min(remaining) as usize;
        let n = self.source.read(&mut buf[..want])?;
        self.cipher.apply(&mut buf[..n])?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for Reader<R> {
    /// Seek within the plaintext stream, bounded to `[0, len]`.
    ///
    /// Negative targets error; past-end targets clamp to the stream length
    /// so the next read reports end of stream.
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.position as i128 + delta as i128,
            SeekFrom::End(delta) => self.size as i128 + delta as i128,
        };
        if target < 0 {
            return Err(JoyeError::NegativeSeek(target as i64).into());
        }
        let target = (target as u64).min(self.size);

        self.source
            .seek(SeekFrom::Start(self.data_offset + target))?;
        self.cipher.reposition(target);
        self.position = target;
        Ok(target)
    }
}

/// Check a container file's authenticity without keeping a session around.
pub fn verify_file<P: AsRef<Path>>(path: P, password: &str) -> Result<bool> {
    let file = std::fs::File::open(path)?;
    let mut reader = Reader::open(file, password, Integrity::Deferred)?;
    reader.verify()
}

/// Constant-time comparison to prevent timing attacks
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::FIXED_HEADER_SIZE;
    use crate::writer::Writer;
    use std::io::{Cursor, Write};

    fn sealed(payload: &[u8], tags: &[u8], password: &str) -> Vec<u8> {
        let mut w = Writer::new(Cursor::new(Vec::new()), password, tags).unwrap();
        w.write_all(payload).unwrap();
        w.finish().unwrap();
        w.get_ref().get_ref().clone()
    }

    fn open_deferred(bytes: Vec<u8>, password: &str) -> Reader<Cursor<Vec<u8>>> {
        Reader::open(Cursor::new(bytes), password, Integrity::Deferred).unwrap()
    }

    #[test]
    fn test_round_trip_with_tags() {
        let bytes = sealed(b"hello world", b"demo", "s3cret");
        let mut r = open_deferred(bytes, "s3cret");

        assert_eq!(r.tags(), b"demo");
        assert_eq!(r.len(), 11);

        let mut out = [0u8; 11];
        r.read_exact(&mut out).unwrap();
        assert_eq!(&out, b"hello world");

        // EOF is a zero-length read, never an error.
        let mut one = [0u8; 1];
        assert_eq!(r.read(&mut one).unwrap(), 0);

        assert!(r.verify().unwrap());
    }

    #[test]
    fn test_wrong_password_opens_but_fails_verify() {
        let bytes = sealed(b"hello world", b"", "s3cret");
        let mut r = open_deferred(bytes, "wrong");

        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out.len(), 11);
        assert_ne!(out, b"hello world");
        assert!(!r.verify().unwrap());
    }

    #[test]
    fn test_tampered_byte_reads_fine_but_fails_verify() {
        let mut bytes = sealed(b"hello world", b"", "s3cret");
        bytes[FIXED_HEADER_SIZE + 2] ^= 0x01;

        let mut r = open_deferred(bytes, "s3cret");
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_ne!(out, b"hello world");
        assert_eq!(out.len(), 11);
        assert!(!r.verify().unwrap());
    }

    #[test]
    fn test_verify_first_refuses_tampered_container() {
        let clean = sealed(b"payload", b"", "s3cret");
        assert!(Reader::open(Cursor::new(clean.clone()), "s3cret", Integrity::VerifyFirst).is_ok());

        let mut tampered = clean;
        let last = tampered.len() - 1;
        tampered[last] ^= 0xFF;
        assert!(matches!(
            Reader::open(Cursor::new(tampered), "s3cret", Integrity::VerifyFirst),
            Err(JoyeError::AuthenticationMismatch)
        ));
    }

    #[test]
    fn test_size_slot_zero_recovers_from_source_length() {
        let mut bytes = sealed(b"recoverable payload", b"", "s3cret");
        bytes[21..29].fill(0);

        let mut r = open_deferred(bytes, "s3cret");
        assert_eq!(r.len(), 19);
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"recoverable payload");
        // The size slot is not authenticated; only tags and ciphertext are.
        assert!(r.verify().unwrap());
    }

    #[test]
    fn test_seek_bounds() {
        let bytes = sealed(&[7u8; 32], b"", "s3cret");
        let mut r = open_deferred(bytes, "s3cret");

        assert_eq!(r.seek(SeekFrom::Start(16)).unwrap(), 16);
        assert_eq!(r.seek(SeekFrom::Current(-8)).unwrap(), 8);
        assert_eq!(r.seek(SeekFrom::End(-2)).unwrap(), 30);
        // Past-end clamps, negative errors.
        assert_eq!(r.seek(SeekFrom::Start(1000)).unwrap(), 32);
        assert!(r.seek(SeekFrom::Current(-40)).is_err());
    }

    #[test]
    fn test_verify_preserves_read_position() {
        let bytes = sealed(b"abcdefgh", b"", "s3cret");
        let mut r = open_deferred(bytes, "s3cret");

        let mut first = [0u8; 3];
        r.read_exact(&mut first).unwrap();
        assert!(r.verify().unwrap());
        assert_eq!(r.position(), 3);

        let mut rest = Vec::new();
        r.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"defgh");
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2]));
    }
}
