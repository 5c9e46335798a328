//! netradio configuration
//!
//! Buffering and visualization knobs with compiled defaults, overridable
//! from a TOML file.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Stream manager configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Seconds of audio to buffer ahead for the audio device.
    /// Must be larger than the host application's usual frame stutter time.
    pub stream_buffer_seconds: u32,

    /// Estimated stream bitrate in kbit/s, used to size the network buffer.
    pub estimated_bitrate_kbit: u32,

    /// Buffered percentage above which a starved stream resumes playback.
    pub rebuffer_resume_percent: u32,

    /// Waveform ring buffer capacity in mono samples.
    pub wave_buffer_capacity: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            stream_buffer_seconds: 10,
            estimated_bitrate_kbit: 128,
            rebuffer_resume_percent: 80,
            wave_buffer_capacity: 1024,
        }
    }
}

impl StreamConfig {
    /// Load configuration from a TOML file
    ///
    /// Missing keys fall back to the compiled defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Network stream buffer size in raw bytes (bitrate x seconds, 128 bytes/kbit)
    pub fn stream_buffer_bytes(&self) -> u32 {
        self.estimated_bitrate_kbit * self.stream_buffer_seconds * 128
    }
}
