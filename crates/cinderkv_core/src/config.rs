//! Engine configuration.

/// Configuration for opening a [`LogStore`](crate::LogStore).
///
/// The server layer derives one of these from its own options file; tests
/// build them directly with the builder methods.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Active-file size threshold in bytes; an append that would push the
    /// active file past this seals it and opens a fresh one first.
    pub rotation_threshold: u64,

    /// Whether to compress value bytes before any encryption.
    pub compress: bool,

    /// Symmetric key for value encryption; must be exactly 16, 24 or 32
    /// bytes when present.
    pub secret: Option<Vec<u8>>,

    /// Unix permission bits for a freshly created data directory.
    pub dir_mode: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            rotation_threshold: 2 * 1024 * 1024 * 1024, // 2 GiB
            compress: false,
            secret: None,
            dir_mode: 0o755,
        }
    }
}

impl StoreOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rotation threshold in bytes.
    #[must_use]
    pub const fn rotation_threshold(mut self, bytes: u64) -> Self {
        self.rotation_threshold = bytes;
        self
    }

    /// Enables or disables value compression.
    #[must_use]
    pub const fn compress(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Sets the encryption secret.
    #[must_use]
    pub fn secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = StoreOptions::default();
        assert_eq!(options.rotation_threshold, 2 * 1024 * 1024 * 1024);
        assert!(!options.compress);
        assert!(options.secret.is_none());
        assert_eq!(options.dir_mode, 0o755);
    }

    #[test]
    fn builder() {
        let options = StoreOptions::new()
            .rotation_threshold(4096)
            .compress(true)
            .secret(*b"0123456789abcdef");

        assert_eq!(options.rotation_threshold, 4096);
        assert!(options.compress);
        assert_eq!(options.secret.as_deref(), Some(&b"0123456789abcdef"[..]));
    }
}
