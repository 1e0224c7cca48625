//! Feeder configuration.
//!
//! A small TOML file; every key is optional:
//!
//! ```toml
//! # Where vJoyInterface.dll lives. Defaults to utils/<arch>/ next to the
//! # executable, then to the OS library search path.
//! library_path = 'C:\Program Files\vJoy\x64\vJoyInterface.dll'
//!
//! # Pause between releasing and re-acquiring a device in `reacquire`.
//! settle_delay_ms = 100
//!
//! # Refuse to open devices when the interface and driver versions differ.
//! check_version = false
//! ```

use crate::constants::DLL_FILENAME;
use crate::device::SessionOptions;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Upper bound for `settle_delay_ms`; anything longer is almost certainly a typo.
const MAX_SETTLE_DELAY_MS: u64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeederConfig {
    pub library_path: Option<PathBuf>,
    pub settle_delay_ms: u64,
    pub check_version: bool,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            check_version: false,
        }
    }
}

impl FeederConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: FeederConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        tracing::debug!(path = %path.display(), "reading feeder config");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "loaded feeder config");
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_delay_ms > MAX_SETTLE_DELAY_MS {
            return Err(ConfigError::Invalid {
                field: "settle_delay_ms",
                reason: format!(
                    "{} exceeds the {MAX_SETTLE_DELAY_MS} ms limit",
                    self.settle_delay_ms
                ),
            });
        }
        if let Some(path) = &self.library_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "library_path",
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Configured library path, or [`default_library_path`].
    pub fn library_path(&self) -> PathBuf {
        self.library_path
            .clone()
            .unwrap_or_else(default_library_path)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            check_version: self.check_version,
        }
    }
}

/// `utils/x64/vJoyInterface.dll` (or `utils/x86/...` on 32-bit builds) beside
/// the running executable if it exists, else the bare file name so the OS
/// loader searches its usual paths.
pub fn default_library_path() -> PathBuf {
    let arch = if cfg!(target_pointer_width = "64") {
        "x64"
    } else {
        "x86"
    };
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .map(|dir| dir.join("utils").join(arch).join(DLL_FILENAME))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(DLL_FILENAME))
}
