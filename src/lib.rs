//! # netradio
//!
//! Streaming internet-audio session manager.
//!
//! **Purpose:** Own the lifecycle of zero-or-one active network audio stream
//! on behalf of a host application: start/stop/pause control, gain, stream
//! metadata, and waveform samples for visualization.
//!
//! **Architecture:** The host drives [`manager::StreamManager`] from its
//! single-threaded main loop (one [`manager::StreamManager::update`] per
//! frame). All decoding, buffering, and mixing live inside an external audio
//! engine reached through the [`engine::AudioEngine`] trait; this crate only
//! orchestrates stream handles, including a dead-stream queue for handles the
//! engine cannot release synchronously. The engine's processing thread feeds
//! a mutex-guarded waveform ring buffer ([`waveform::WaveformTap`]) read back
//! on the main thread.

pub mod config;
pub mod engine;
pub mod error;
pub mod manager;
pub mod metadata;
pub mod session;
pub mod waveform;

pub use config::StreamConfig;
pub use error::{Error, Result};
pub use manager::{PauseMode, PlayState, StreamManager};
pub use metadata::{MetadataMap, TagValue};
pub use waveform::WaveformTap;
