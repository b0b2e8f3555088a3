//! Value encryption using AES-GCM.
//!
//! The secret length selects the cipher: 16 bytes is AES-128-GCM, 24 bytes
//! AES-192-GCM, 32 bytes AES-256-GCM. Any other length is a configuration
//! error. Each encryption draws a fresh random nonce and prefixes it to the
//! ciphertext, so decryption needs only the key.

use crate::error::{CoreError, CoreResult};
use aes_gcm::{
    aead::{
        generic_array::{typenum::U12, GenericArray},
        Aead, KeyInit,
    },
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm, Nonce,
};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// A validated symmetric secret.
///
/// Zeroized on drop; never printed by `Debug`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    /// Creates a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Fails with a config error unless the slice is exactly 16, 24 or 32
    /// bytes long.
    pub fn from_bytes(bytes: &[u8]) -> CoreResult<Self> {
        match bytes.len() {
            16 | 24 | 32 => Ok(Self {
                bytes: bytes.to_vec(),
            }),
            n => Err(CoreError::config(format!(
                "invalid secret key length {n}: must be 16, 24, or 32 bytes"
            ))),
        }
    }

    /// Returns the key bytes. Do not log or serialize the result.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

enum Cipher {
    Aes128(Box<Aes128Gcm>),
    Aes192(Box<Aes192Gcm>),
    Aes256(Box<Aes256Gcm>),
}

/// Encrypts and decrypts record values.
///
/// Output format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
pub struct Encryptor {
    cipher: Cipher,
}

impl Encryptor {
    /// Creates an encryptor for the given key.
    #[must_use]
    pub fn new(key: &SecretKey) -> Self {
        // SecretKey::from_bytes admits no other length.
        let cipher = match key.as_bytes().len() {
            16 => Cipher::Aes128(Box::new(Aes128Gcm::new(GenericArray::from_slice(
                key.as_bytes(),
            )))),
            24 => Cipher::Aes192(Box::new(Aes192Gcm::new(GenericArray::from_slice(
                key.as_bytes(),
            )))),
            32 => Cipher::Aes256(Box::new(Aes256Gcm::new(GenericArray::from_slice(
                key.as_bytes(),
            )))),
            n => unreachable!("secret key of length {n}"),
        };
        Self { cipher }
    }

    /// Encrypts plaintext, prefixing the random nonce.
    pub fn encrypt(&self, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = match &self.cipher {
            Cipher::Aes128(c) => c.encrypt(nonce, plaintext),
            Cipher::Aes192(c) => c.encrypt(nonce, plaintext),
            Cipher::Aes256(c) => c.encrypt(nonce, plaintext),
        }
        .map_err(|_| CoreError::transform("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);

        Ok(result)
    }

    /// Decrypts data produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// A wrong key, a truncated buffer, or tampered bytes all surface as
    /// corruption: a record whose transform does not match the engine's
    /// configuration is unreadable, not silently empty.
    pub fn decrypt(&self, data: &[u8]) -> CoreResult<Vec<u8>> {
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CoreError::corrupt("ciphertext too short"));
        }

        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let encrypted = &data[NONCE_SIZE..];

        match &self.cipher {
            Cipher::Aes128(c) => c.decrypt(nonce, encrypted),
            Cipher::Aes192(c) => c.decrypt(nonce, encrypted),
            Cipher::Aes256(c) => c.decrypt(nonce, encrypted),
        }
        .map_err(|_| CoreError::corrupt("decryption failed"))
    }
}

impl std::fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.cipher {
            Cipher::Aes128(_) => "Aes128Gcm",
            Cipher::Aes192(_) => "Aes192Gcm",
            Cipher::Aes256(_) => "Aes256Gcm",
        };
        f.debug_struct("Encryptor").field("cipher", &name).finish()
    }
}
