//! # Configuration Management
//!
//! Tunables for the session core: frame size ceiling and receive-buffer
//! sizing. Sessions are cheap to configure per-registry; the defaults suit
//! small-to-medium packet traffic.
//!
//! ## Configuration Sources
//! - TOML files via [`SessionConfig::from_file`]
//! - TOML strings via [`SessionConfig::from_toml`]
//! - Direct instantiation with [`SessionConfig::default`]
//!
//! ## Security Considerations
//! - `max_frame_len` bounds the allocation a single length prefix can demand,
//!   so a hostile peer cannot force memory exhaustion with one header.

use crate::error::{Result, SessionError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Max allowed frame body size (16 MB)
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Default initial capacity of the per-session receive buffer
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 64 * 1024;

/// Default amount of space reserved before each transport read
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

/// Per-session configuration held by the registry's session factory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest frame body (packet id + ciphertext) accepted or produced.
    pub max_frame_len: usize,

    /// Initial capacity of the accumulating receive buffer.
    pub read_buffer_capacity: usize,

    /// Bytes of capacity reserved before each transport read. A zero-capacity
    /// buffer would make `read_buf` report EOF, so this must stay positive.
    pub read_chunk: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
            read_chunk: DEFAULT_READ_CHUNK,
        }
    }
}

impl SessionConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| SessionError::Config(format!("failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SessionError::Config(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipelines cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_len < crate::core::frame::PACKET_ID_LEN {
            return Err(SessionError::Config(format!(
                "max_frame_len must be at least {} bytes",
                crate::core::frame::PACKET_ID_LEN
            )));
        }
        if self.max_frame_len > MAX_FRAME_LEN {
            return Err(SessionError::Config(format!(
                "max_frame_len {} exceeds hard cap {MAX_FRAME_LEN}",
                self.max_frame_len
            )));
        }
        if self.read_chunk == 0 {
            return Err(SessionError::Config(
                "read_chunk must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
