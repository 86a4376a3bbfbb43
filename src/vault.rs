use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{DecryptError, DecryptErrorKind, Error};

const KEY_HEX_LEN: usize = 64;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Decrypt an encrypted vault blob back into dotenv plaintext.
///
/// `ciphertext` is a base64-encoded buffer laid out as a 12-byte nonce,
/// the AES-256-GCM ciphertext, and a 16-byte authentication tag.
/// `key_material` supplies the key as its trailing 64 hex characters, so
/// full key URIs can be passed through unchanged.
pub fn decrypt(ciphertext: &str, key_material: &str) -> Result<String, Error> {
    let key = decode_key(key_material)?;

    let blob = BASE64
        .decode(ciphertext.trim())
        .map_err(|_| DecryptError::new(DecryptErrorKind::MalformedCiphertext))?;
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(DecryptError::new(DecryptErrorKind::MalformedCiphertext).into());
    }

    let (nonce, sealed) = blob.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new((&key).into());
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| DecryptError::new(DecryptErrorKind::AuthenticationFailed))?;

    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}

fn decode_key(key_material: &str) -> Result<[u8; 32], DecryptError> {
    let invalid = || DecryptError::new(DecryptErrorKind::InvalidKeyMaterial);

    let hex_tail = key_material
        .len()
        .checked_sub(KEY_HEX_LEN)
        .and_then(|start| key_material.get(start..))
        .ok_or_else(invalid)?;
    let bytes = hex::decode(hex_tail).map_err(|_| invalid())?;

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
