//! The record value transform pipeline.
//!
//! Two independently enabled stages applied to value bytes only - never the
//! key, never the header. Write order: compress, then encrypt. Read order is
//! the inverse. A disabled stage is the identity function.

use crate::config::StoreOptions;
use crate::crypto::{Encryptor, SecretKey};
use crate::error::{CoreError, CoreResult};

/// zstd compression level for value bytes.
const COMPRESSION_LEVEL: i32 = 3;

/// Applies the configured compress/encrypt pipeline to record values.
#[derive(Debug)]
pub struct Transformer {
    compress: bool,
    encryptor: Option<Encryptor>,
}

impl Transformer {
    /// Builds a transformer from the engine options.
    ///
    /// # Errors
    ///
    /// Fails with a config error if a secret is present but not 16, 24 or
    /// 32 bytes long.
    pub fn from_options(options: &StoreOptions) -> CoreResult<Self> {
        let encryptor = match &options.secret {
            Some(secret) => {
                let key = SecretKey::from_bytes(secret)?;
                Some(Encryptor::new(&key))
            }
            None => None,
        };

        Ok(Self {
            compress: options.compress,
            encryptor,
        })
    }

    /// A transformer with both stages disabled.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            compress: false,
            encryptor: None,
        }
    }

    /// Returns whether any stage is enabled.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        !self.compress && self.encryptor.is_none()
    }

    /// Transforms value bytes for writing: compress, then encrypt.
    pub fn encode(&self, value: &[u8]) -> CoreResult<Vec<u8>> {
        let compressed = if self.compress {
            zstd::bulk::compress(value, COMPRESSION_LEVEL)
                .map_err(|e| CoreError::transform(format!("compress: {e}")))?
        } else {
            value.to_vec()
        };

        match &self.encryptor {
            Some(encryptor) => encryptor.encrypt(&compressed),
            None => Ok(compressed),
        }
    }

    /// Reverses [`encode`](Self::encode): decrypt, then decompress.
    ///
    /// # Errors
    ///
    /// Failures surface as corruption - a record whose transforms do not
    /// match this engine's configuration must not silently read as garbage.
    pub fn decode(&self, value: &[u8]) -> CoreResult<Vec<u8>> {
        let decrypted = match &self.encryptor {
            Some(encryptor) => encryptor.decrypt(value)?,
            None => value.to_vec(),
        };

        if self.compress {
            zstd::decode_all(&decrypted[..])
                .map_err(|e| CoreError::corrupt(format!("decompress: {e}")))
        } else {
            Ok(decrypted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(compress: bool, secret: Option<&[u8]>) -> StoreOptions {
        let mut options = StoreOptions::new().compress(compress);
        if let Some(secret) = secret {
            options = options.secret(secret.to_vec());
        }
        options
    }

    #[test]
    fn identity_passes_bytes_through() {
        let transformer = Transformer::identity();
        assert!(transformer.is_identity());

        let value = b"plain bytes".to_vec();
        assert_eq!(transformer.encode(&value).unwrap(), value);
        assert_eq!(transformer.decode(&value).unwrap(), value);
    }

    #[test]
    fn compress_only_round_trip() {
        let transformer = Transformer::from_options(&options(true, None)).unwrap();

        let value = vec![b'x'; 4096];
        let encoded = transformer.encode(&value).unwrap();
        assert!(encoded.len() < value.len());
        assert_eq!(transformer.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn encrypt_only_round_trip() {
        let transformer =
            Transformer::from_options(&options(false, Some(&[9u8; 32]))).unwrap();

        let value = b"sensitive".to_vec();
        let encoded = transformer.encode(&value).unwrap();
        assert_ne!(encoded, value);
        assert_eq!(transformer.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn both_stages_round_trip() {
        let transformer =
            Transformer::from_options(&options(true, Some(&[5u8; 16]))).unwrap();

        let value = vec![42u8; 2048];
        let encoded = transformer.encode(&value).unwrap();
        assert_eq!(transformer.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn bad_secret_length_is_config_error() {
        let result = Transformer::from_options(&options(false, Some(&[0u8; 20])));
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }

    #[test]
    fn mismatched_configuration_is_corrupt() {
        let writer =
            Transformer::from_options(&options(false, Some(&[1u8; 16]))).unwrap();
        let reader =
            Transformer::from_options(&options(false, Some(&[2u8; 16]))).unwrap();

        let encoded = writer.encode(b"secret").unwrap();
        let result = reader.decode(&encoded);
        assert!(matches!(result, Err(CoreError::Corrupt { .. })));
    }

    #[test]
    fn garbage_decompress_is_corrupt() {
        let transformer = Transformer::from_options(&options(true, None)).unwrap();

        let result = transformer.decode(b"definitely not a zstd frame");
        assert!(matches!(result, Err(CoreError::Corrupt { .. })));
    }
}
