//! Upload signature and ephemeral request ids.
//!
//! The vendor verifies every upload against
//!
//! ```text
//! sign = Base64( AES-128-CBC( PKCS7( md5_hex(image) || timestamp_ms ), key, iv ) )
//! ```
//!
//! and correlates calls through an ephemeral id (`e_id`), a 32-char hex
//! rendering of `murmur3_x64_128(fingerprint, seed = 31)`. Both must match the
//! vendor byte for byte.

use aes::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use std::io::Cursor;

use crate::UpstreamError;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Seed the vendor's web client uses for `e_id` hashing.
pub const E_ID_SEED: u32 = 31;

/// Signature attached to an upload, with the timestamp it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub sign: String,
    pub timestamp_ms: i64,
}

/// Computes upload signatures with a fixed key/IV pair.
#[derive(Clone)]
pub struct Signer {
    key: [u8; 16],
    iv: [u8; 16],
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(key: &[u8], iv: &[u8]) -> Result<Self, UpstreamError> {
        let key: [u8; 16] = key.try_into().map_err(|_| {
            UpstreamError::InvalidConfig(format!("sign key must be 16 bytes, got {}", key.len()))
        })?;
        let iv: [u8; 16] = iv.try_into().map_err(|_| {
            UpstreamError::InvalidConfig(format!("sign iv must be 16 bytes, got {}", iv.len()))
        })?;
        Ok(Self { key, iv })
    }

    /// Sign `payload` with the current wall-clock time.
    pub fn sign(&self, payload: &[u8]) -> Signature {
        self.sign_at(payload, Utc::now().timestamp_millis())
    }

    /// Sign `payload` for an explicit timestamp. Deterministic.
    pub fn sign_at(&self, payload: &[u8], timestamp_ms: i64) -> Signature {
        let digest = md5::compute(payload);
        let plaintext = format!("{digest:x}{timestamp_ms}");
        let cipher = Aes128CbcEnc::new(&self.key.into(), &self.iv.into());
        let encrypted = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        Signature {
            sign: STANDARD.encode(encrypted),
            timestamp_ms,
        }
    }
}

/// Derive an `e_id` from a caller-supplied fingerprint.
pub fn ephemeral_id_from(fingerprint: &str) -> String {
    // Reading from an in-memory slice cannot fail.
    let hashed =
        murmur3::murmur3_x64_128(&mut Cursor::new(fingerprint.as_bytes()), E_ID_SEED)
            .unwrap_or_default();
    format!("{hashed:032x}")
}

/// Generate a fresh `e_id` from 16 random bytes.
pub fn generate_e_id() -> String {
    let nonce: [u8; 16] = rand::random();
    ephemeral_id_from(&hex::encode(nonce))
}
