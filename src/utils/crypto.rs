//! # Cipher Envelope
//!
//! AES-256 in CBC mode with PKCS#7 padding.
//!
//! This is confidentiality only. Padding validation is the sole integrity signal
//! the cipher gives; nothing here authenticates the ciphertext.
//!
//! Cipher instances live for exactly one call and are zeroized on drop, so no
//! key schedule outlives `encrypt`/`decrypt` on any exit path.

use crate::config::{IV_LEN, KEY_LEN};
use crate::error::{constants, ProtocolError, Result};
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

fn invalid_key_material(key: &[u8], iv: &[u8]) -> ProtocolError {
    ProtocolError::InvalidKeyMaterial {
        expected_key: KEY_LEN,
        expected_iv: IV_LEN,
        key_len: key.len(),
        iv_len: iv.len(),
    }
}

/// Error for an encrypted operation attempted with no session key at all.
///
/// Reported as `InvalidKeyMaterial` with a zero-length key.
pub(crate) fn missing_key() -> ProtocolError {
    invalid_key_material(&[], &[0u8; IV_LEN])
}

/// Rejects a key or IV of the wrong length.
pub(crate) fn validate_key_material(key: &[u8], iv: &[u8]) -> Result<()> {
    if key.len() != KEY_LEN || iv.len() != IV_LEN {
        return Err(invalid_key_material(key, iv));
    }
    Ok(())
}

/// Encrypts `plaintext` under a 32-byte key and 16-byte IV.
///
/// The output is always a whole number of blocks and at least one block longer
/// than a block-aligned input.
///
/// # Errors
/// Returns `ProtocolError::InvalidKeyMaterial` if the key or IV has the wrong length.
pub fn encrypt(plaintext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    validate_key_material(key, iv)?;
    let cipher =
        Aes256CbcEnc::new_from_slices(key, iv).map_err(|_| invalid_key_material(key, iv))?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypts `ciphertext` and strips its PKCS#7 padding.
///
/// # Errors
/// - `ProtocolError::InvalidKeyMaterial` if the key or IV has the wrong length
/// - `ProtocolError::PaddingOrIntegrityError` if the ciphertext is not block
///   aligned or the recovered padding is malformed
pub fn decrypt(ciphertext: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>> {
    validate_key_material(key, iv)?;
    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| invalid_key_material(key, iv))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| ProtocolError::PaddingOrIntegrityError)
}

/// Draws a fresh IV from the operating system's random source.
///
/// CBC needs a new unpredictable IV for every packet under the same key.
pub fn generate_iv() -> Result<[u8; IV_LEN]> {
    let mut iv = [0u8; IV_LEN];
    getrandom::fill(&mut iv)
        .map_err(|_| ProtocolError::SecurityError(constants::ERR_RNG_UNAVAILABLE.into()))?;
    Ok(iv)
}

/// A session key that is wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    key: [u8; KEY_LEN],
}

impl KeyMaterial {
    pub fn new(key: [u8; KEY_LEN]) -> Self {
        Self { key }
    }

    /// Build from a slice, e.g. one handed over by a key-agreement provider.
    ///
    /// # Errors
    /// Returns `ProtocolError::InvalidKeyMaterial` unless `key` is exactly 32 bytes.
    pub fn from_slice(key: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| ProtocolError::InvalidKeyMaterial {
            expected_key: KEY_LEN,
            expected_iv: IV_LEN,
            key_len: key.len(),
            iv_len: IV_LEN,
        })?;
        Ok(Self { key })
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.key
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const IV: [u8; 16] = [0x24; 16];

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_roundtrip() {
        let message = b"This message will be encrypted and decrypted.";
        let encrypted = encrypt(message, &KEY, &IV).unwrap();
        assert_ne!(encrypted.as_slice(), message.as_slice());
        let decrypted = decrypt(&encrypted, &KEY, &IV).unwrap();
        assert_eq!(decrypted, message);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_ciphertext_lengths() {
        assert_eq!(encrypt(&[], &KEY, &IV).unwrap().len(), 16);
        assert_eq!(encrypt(&[0u8; 15], &KEY, &IV).unwrap().len(), 16);
        assert_eq!(encrypt(&[0u8; 16], &KEY, &IV).unwrap().len(), 32);
        assert_eq!(encrypt(&[0u8; 17], &KEY, &IV).unwrap().len(), 32);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_nist_sp800_38a_first_block() {
        // F.2.5 CBC-AES256.Encrypt, block #1
        let key: Vec<u8> = [
            0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d,
            0x77, 0x81, 0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3,
            0x09, 0x14, 0xdf, 0xf4,
        ]
        .to_vec();
        let iv: Vec<u8> = (0u8..16).collect();
        let plaintext = [
            0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93,
            0x17, 0x2a,
        ];
        let expected = [
            0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b,
            0xfb, 0xd6,
        ];
        let ciphertext = encrypt(&plaintext, &key, &iv).unwrap();
        assert_eq!(&ciphertext[..16], &expected);
    }

    #[test]
    fn test_wrong_key_length() {
        let result = encrypt(b"data", &[0u8; 16], &IV);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidKeyMaterial { key_len: 16, .. })
        ));
    }

    #[test]
    fn test_wrong_iv_length() {
        let result = decrypt(&[0u8; 16], &KEY, &[0u8; 12]);
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidKeyMaterial { iv_len: 12, .. })
        ));
    }

    #[test]
    fn test_unaligned_ciphertext_rejected() {
        let result = decrypt(&[0u8; 17], &KEY, &IV);
        assert!(matches!(result, Err(ProtocolError::PaddingOrIntegrityError)));
    }

    #[test]
    fn test_empty_ciphertext_rejected() {
        let result = decrypt(&[], &KEY, &IV);
        assert!(matches!(result, Err(ProtocolError::PaddingOrIntegrityError)));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_bad_padding_detected() {
        // Flipping the second-to-last block alters the last plaintext block,
        // so the final padding byte is no longer a valid PKCS#7 value.
        let mut ciphertext = encrypt(&[0u8; 16], &KEY, &IV).unwrap();
        ciphertext[15] ^= 0x80;
        let result = decrypt(&ciphertext, &KEY, &IV);
        assert!(matches!(result, Err(ProtocolError::PaddingOrIntegrityError)));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_generate_iv_is_fresh() {
        let a = generate_iv().unwrap();
        let b = generate_iv().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_material_debug_redacted() {
        let key = KeyMaterial::new(KEY);
        assert_eq!(format!("{key:?}"), "KeyMaterial(<redacted>)");
    }

    #[test]
    fn test_key_material_from_short_slice() {
        assert!(matches!(
            KeyMaterial::from_slice(&[1u8; 31]),
            Err(ProtocolError::InvalidKeyMaterial { key_len: 31, .. })
        ));
    }

    #[test]
    fn test_missing_key_message() {
        let missing = missing_key().to_string();
        assert!(missing.contains(constants::ERR_MISSING_KEY), "{missing}");
        assert!(matches!(
            missing_key(),
            ProtocolError::InvalidKeyMaterial { key_len: 0, iv_len: IV_LEN, .. }
        ));

        let short = invalid_key_material(&[0u8; 16], &IV).to_string();
        assert!(!short.contains(constants::ERR_MISSING_KEY), "{short}");
    }
}
