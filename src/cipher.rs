//! AES-256-CTR keystream with random-access repositioning.
//!
//! The keystream at byte `pos` depends only on `pos`, never on what was
//! encrypted before it. That is what makes seek-and-rewrite possible: the
//! cipher can be dropped onto any offset and produce the exact bytes a
//! sequential pass would have produced there. The subtle part is rebuilding
//! the counter: the 16-byte nonce is split into a fixed 8-byte random prefix
//! and a 64-bit big-endian block counter in the low 8 bytes. Carries from the
//! counter never propagate into the prefix.

use crate::error::{JoyeError, Result};
use crate::header::NONCE_SIZE;
use crate::kdf::KEY_SIZE;
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

/// Cipher block size in bytes; the keystream is generated in blocks this big.
pub const BLOCK_SIZE: usize = 16;

/// AES-256-CTR with a 64-bit big-endian counter in the low nonce bytes.
type Aes256Ctr = ctr::Ctr64BE<Aes256>;

/// The closed set of primitive pairings the container supports. The header
/// version byte selects the suite; there is exactly one today, and adding
/// another means bumping the format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherSuite {
    Aes256CtrHmacSha256,
}

impl CipherSuite {
    /// Resolve the suite for a header version byte.
    pub fn from_version(version: u8) -> Option<Self> {
        match version {
            crate::header::VERSION => Some(Self::Aes256CtrHmacSha256),
            _ => None,
        }
    }

    pub const fn key_len(self) -> usize {
        KEY_SIZE
    }

    pub const fn tag_len(self) -> usize {
        32
    }

    pub const fn block_len(self) -> usize {
        BLOCK_SIZE
    }

    pub const fn name(self) -> &'static str {
        "AES-256-CTR + HMAC-SHA-256"
    }
}

/// A positioned keystream. Encrypting and decrypting are the same operation
/// (XOR against the keystream), so one type serves both sessions.
pub struct KeystreamCipher {
    key: [u8; KEY_SIZE],
    base_nonce: [u8; NONCE_SIZE],
    cipher: Aes256Ctr,
    position: u64,
}

impl KeystreamCipher {
    /// Install key and base nonce at logical position 0.
    pub fn new(key: &[u8; KEY_SIZE], base_nonce: &[u8; NONCE_SIZE]) -> Self {
        Self {
            key: *key,
            base_nonce: *base_nonce,
            cipher: Aes256Ctr::new(key.into(), base_nonce.into()),
            position: 0,
        }
    }

    /// Current logical byte position in the keystream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Move the keystream to an arbitrary byte offset.
    ///
    /// Rebuilds the effective nonce for `pos / 16` by adding the block count
    /// into the low 8 nonce bytes (big-endian, carries confined there), then
    /// burns `pos % 16` keystream bytes so the next byte lines up with the
    /// sub-block phase.
    pub fn reposition(&mut self, pos: u64) {
        let block = pos / BLOCK_SIZE as u64;

        let mut nonce = self.base_nonce;
        let low = u64::from_be_bytes(nonce[8..16].try_into().expect("8-byte slice"));
        nonce[8..16].copy_from_slice(&low.wrapping_add(block).to_be_bytes());

        let mut cipher = Aes256Ctr::new(&self.key.into(), &nonce.into());

        let phase = (pos % BLOCK_SIZE as u64) as usize;
        if phase > 0 {
            let mut discard = [0u8; BLOCK_SIZE];
            cipher.apply_keystream(&mut discard[..phase]);
        }

        self.cipher = cipher;
        self.position = pos;
    }

    /// XOR the buffer against the keystream in place and advance.
    pub fn apply(&mut self, buf: &mut [u8]) -> Result<()> {
        self.cipher
            .try_apply_keystream(buf)
            .map_err(|e| JoyeError::Crypto(format!("keystream exhausted: {}", e)))?;
        self.position += buf.len() as u64;
        Ok(())
    }
}
