//! Password-based key derivation.
//!
//! PBKDF2-HMAC-SHA256 with a fixed iteration count. The count is part of the
//! on-disk contract: files written with a different count cannot be decrypted,
//! so it is deliberately not configurable. The per-file nonce doubles as the
//! salt, which keeps the header free of a separate salt field.

use crate::error::{JoyeError, Result};
use crate::header::NONCE_SIZE;
use digest::Output;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Derived key length in bytes (AES-256, also the HMAC key).
pub const KEY_SIZE: usize = 32;

/// Fixed PBKDF2 iteration count (on-disk compatibility constant).
pub const PBKDF2_ROUNDS: u32 = 2145;

/// Derive the 32-byte session key from a password and the file nonce.
///
/// Single-block PBKDF2 (RFC 8018): the requested key length equals the
/// SHA-256 output, so `T_1 = U_1 xor U_2 xor ... xor U_c` is the whole key.
pub fn derive_key(password: &str, salt: &[u8; NONCE_SIZE]) -> Result<[u8; KEY_SIZE]> {
    if password.is_empty() {
        return Err(JoyeError::EmptyPassword);
    }

    let mut mac = new_mac(password)?;
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut u: Output<HmacSha256> = mac.finalize().into_bytes();
    let mut t = u;

    for _ in 1..PBKDF2_ROUNDS {
        let mut mac = new_mac(password)?;
        mac.update(&u);
        u = mac.finalize().into_bytes();
        for (t, u) in t.iter_mut().zip(u.iter()) {
            *t ^= u;
        }
    }

    Ok(t.into())
}

fn new_mac(password: &str) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(password.as_bytes())
        .map_err(|e| JoyeError::Crypto(format!("HMAC init: {}", e)))
}
