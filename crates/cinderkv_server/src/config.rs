//! Server configuration file handling.
//!
//! Options load from YAML or JSON (decided by file extension) and are
//! validated before anything touches the disk or the network. The built-in
//! defaults serve a local instance with compaction armed at 03:00 daily.

use crate::error::{ServerError, ServerResult};
use cinderkv_core::StoreOptions;
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

const CONFIG_FILE: &str = "config.yaml";
const GIB: u64 = 1024 * 1024 * 1024;

/// Top-level server options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerOptions {
    /// HTTP port, in [1025, 65534].
    pub port: u16,
    /// Data directory path.
    pub path: String,
    /// Debug log level.
    #[serde(default)]
    pub debug: bool,
    /// Log file path; empty logs to stdout.
    #[serde(default)]
    pub logpath: String,
    /// Shared auth token.
    pub auth: String,
    /// Region compaction options.
    #[serde(default)]
    pub region: RegionOptions,
    /// Value encryption options.
    #[serde(default)]
    pub encryptor: EncryptorOptions,
    /// Value compression options.
    #[serde(default)]
    pub compressor: CompressorOptions,
    /// Periodic checkpoint options.
    #[serde(default)]
    pub checkpoint: CheckpointOptions,
    /// Optional client IP whitelist.
    #[serde(default)]
    pub allow_ip: Option<Vec<String>>,
}

/// Region compaction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionOptions {
    /// Whether the compaction worker runs.
    pub enable: bool,
    /// 6-field cron schedule (seconds first).
    pub cron: String,
    /// Minimum sealed-segment count before a pass does work. The same
    /// value is the active-file rotation threshold in GiB.
    pub threshold: u8,
}

/// Value encryption configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncryptorOptions {
    /// Whether values are encrypted.
    pub enable: bool,
    /// Secret key; must be exactly 16, 24 or 32 bytes when enabled.
    #[serde(default)]
    pub secret: String,
}

/// Value compression configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressorOptions {
    /// Whether values are compressed.
    pub enable: bool,
}

/// Periodic checkpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointOptions {
    /// Whether the checkpoint worker runs.
    pub enable: bool,
    /// Seconds between checkpoints.
    pub interval: u32,
}

impl Default for RegionOptions {
    fn default() -> Self {
        Self {
            enable: true,
            cron: "0 0 3 * * *".to_string(),
            threshold: 2,
        }
    }
}

impl Default for CheckpointOptions {
    fn default() -> Self {
        Self {
            enable: false,
            interval: 1800,
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            port: 2668,
            path: "/tmp/cinderkv".to_string(),
            debug: false,
            logpath: String::new(),
            auth: "Are we wide open to the world?".to_string(),
            region: RegionOptions::default(),
            encryptor: EncryptorOptions::default(),
            compressor: CompressorOptions::default(),
            checkpoint: CheckpointOptions::default(),
            allow_ip: None,
        }
    }
}

/// One validation rule over the full option set.
trait Validator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()>;
}

struct PortValidator;
struct PathValidator;
struct AuthValidator;
struct EncryptorValidator;
struct RegionValidator;

impl Validator for PortValidator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()> {
        if options.port <= 1024 || options.port >= 65535 {
            return Err(ServerError::config(
                "port range must be between 1025 and 65534",
            ));
        }
        Ok(())
    }
}

impl Validator for PathValidator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()> {
        if options.path.is_empty() {
            return Err(ServerError::config("data directory path cannot be empty"));
        }
        Ok(())
    }
}

impl Validator for AuthValidator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()> {
        if options.auth.is_empty() {
            return Err(ServerError::config("auth token cannot be empty"));
        }
        Ok(())
    }
}

impl Validator for EncryptorValidator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()> {
        if !options.encryptor.enable {
            return Ok(());
        }
        match options.encryptor.secret.len() {
            16 | 24 | 32 => Ok(()),
            _ => Err(ServerError::config(
                "invalid secret key length: it must be 16, 24, or 32 bytes",
            )),
        }
    }
}

impl Validator for RegionValidator {
    fn validate(&self, options: &ServerOptions) -> ServerResult<()> {
        if !options.region.enable {
            return Ok(());
        }
        Schedule::from_str(&options.region.cron)
            .map_err(|e| ServerError::config(format!("invalid region cron expression: {e}")))?;
        if options.region.threshold == 0 {
            return Err(ServerError::config("region threshold cannot be zero"));
        }
        Ok(())
    }
}

impl ServerOptions {
    /// Loads options from a YAML or JSON file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| ServerError::config(format!("read {}: {e}", path.display())))?;

        let is_json = path
            .extension()
            .map(|ext| ext == "json")
            .unwrap_or(false);

        let options: Self = if is_json {
            serde_json::from_str(&data)
                .map_err(|e| ServerError::config(format!("parse {}: {e}", path.display())))?
        } else {
            serde_yaml::from_str(&data)
                .map_err(|e| ServerError::config(format!("parse {}: {e}", path.display())))?
        };
        Ok(options)
    }

    /// Runs every validation rule, failing on the first violation.
    pub fn validate(&self) -> ServerResult<()> {
        let validators: [&dyn Validator; 5] = [
            &PortValidator,
            &PathValidator,
            &AuthValidator,
            &EncryptorValidator,
            &RegionValidator,
        ];
        for validator in validators {
            validator.validate(self)?;
        }
        Ok(())
    }

    /// Writes the effective configuration into the data directory as
    /// `config.yaml`.
    pub fn saved(&self) -> ServerResult<()> {
        let contents = serde_yaml::to_string(self)
            .map_err(|e| ServerError::config(format!("serialize config: {e}")))?;
        std::fs::write(Path::new(&self.path).join(CONFIG_FILE), contents)
            .map_err(|e| ServerError::config(format!("save config: {e}")))?;
        Ok(())
    }

    /// Derives the engine options.
    ///
    /// The one `region.threshold` knob feeds both the compaction trigger
    /// and the rotation threshold (in GiB), faithful to the source system.
    #[must_use]
    pub fn store_options(&self) -> StoreOptions {
        let mut store = StoreOptions::new()
            .rotation_threshold(u64::from(self.region.threshold.max(1)) * GIB)
            .compress(self.compressor.enable);
        if self.encryptor.enable {
            store = store.secret(self.encryptor.secret.as_bytes());
        }
        store
    }

    /// Returns whether the client IP whitelist is active.
    #[must_use]
    pub fn is_whitelist_enabled(&self) -> bool {
        self.allow_ip.as_ref().is_some_and(|ips| !ips.is_empty())
    }
}
