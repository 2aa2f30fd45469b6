//! WireGuard key material.
//!
//! Keys are 32 bytes, exchanged as 44-character standard base64.

use base64::prelude::*;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

pub use super::types::Key;
use super::types::WG_KEY_LEN;
use crate::error::{Error, Result};

/// Generate a clamped Curve25519 private key.
pub fn generate_private_key() -> Key {
    let mut key = [0u8; WG_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    clamp(&mut key);
    key
}

/// Apply the Curve25519 scalar clamp.
pub fn clamp(key: &mut Key) {
    key[0] &= 248;
    key[31] &= 127;
    key[31] |= 64;
}

/// X25519 base-point product of `private_key`.
pub fn derive_public_key(private_key: &Key) -> Key {
    let secret = StaticSecret::from(*private_key);
    PublicKey::from(&secret).to_bytes()
}

/// Generate a preshared key.
pub fn generate_preshared_key() -> Key {
    let mut key = [0u8; WG_KEY_LEN];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

pub fn encode(key: &Key) -> String {
    BASE64_STANDARD.encode(key)
}

/// Decode base64 key text. Anything but exactly 32 bytes is `INVALID_KEY`.
pub fn decode(text: &str) -> Result<Key> {
    let bytes = BASE64_STANDARD
        .decode(text.trim())
        .map_err(|e| Error::InvalidKey(format!("{}: {}", text, e)))?;

    Key::try_from(bytes.as_slice()).map_err(|_| {
        Error::InvalidKey(format!(
            "expected {} bytes, got {}",
            WG_KEY_LEN,
            bytes.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_private_key_is_clamped() {
        for _ in 0..16 {
            let key = generate_private_key();
            assert_eq!(key[0] & 7, 0);
            assert_eq!(key[31] & 128, 0);
            assert_eq!(key[31] & 64, 64);
        }
    }

    #[test]
    fn test_clamp() {
        let mut key = [0xffu8; 32];
        clamp(&mut key);
        assert_eq!(key[0], 248);
        assert_eq!(key[31], 127);
    }

    #[test]
    fn test_derive_public_key_rfc7748() {
        // Alice's key pair from RFC 7748, section 6.1
        let private = decode("dwdtCnMYpX08FsFyUbJmRd9ML4frwJkqsXf7pR25LCo=").unwrap();
        let public = derive_public_key(&private);
        assert_eq!(encode(&public), "hSDwCYkwp1R0i33ctD73Wg2/Og0mOBr066SpjqqbTmo=");
    }

    #[test]
    fn test_encoded_length() {
        assert_eq!(encode(&generate_private_key()).len(), 44);
        assert_eq!(encode(&generate_preshared_key()).len(), 44);
    }

    #[test]
    fn test_decode_roundtrip() {
        let key = generate_private_key();
        assert_eq!(decode(&encode(&key)).unwrap(), key);
        assert_eq!(decode(&format!(" {}\n", encode(&key))).unwrap(), key);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode("not base64!").unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(decode("AAAA").unwrap_err().kind(), ErrorKind::InvalidKey);
        assert_eq!(decode("").unwrap_err().kind(), ErrorKind::InvalidKey);
    }
}
