//! Stream session orchestration
//!
//! [`StreamManager`] owns at most one current [`StreamSession`], an optional
//! pending URL, and a queue of dead streams whose engine-side handles failed
//! to release synchronously. The host drives it from its single-threaded
//! main loop: one [`StreamManager::update`] per frame polls the engine,
//! promotes pending requests, refreshes metadata, and applies the
//! starvation/rebuffer hysteresis.
//!
//! Invariants:
//! - at most one session is current at any time; a second start request
//!   first tears down the current one
//! - a session is never current while the dead-stream queue is non-empty
//! - at most one pending URL; a newer request overwrites it

use crate::config::StreamConfig;
use crate::engine::{AudioEngine, OpenState, StreamChannel};
use crate::metadata::{translate_tag, MetadataMap, TranslatedTag};
use crate::session::StreamSession;
use crate::waveform::WaveformTap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Pause control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMode {
    /// Stop the stream, keeping the URL record for a later resume
    Pause,
    /// Restart the remembered URL
    Resume,
    /// Infer direction from whether a session is currently active
    Toggle,
}

/// Coarse playback state for the UI pull model
///
/// A stream is "active" once it has been requested to start; that does not
/// necessarily mean audio is coming out of the speakers yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// No session and no remembered URL
    Inactive,
    /// A session is current (opening, buffering, or playing)
    Active,
    /// No session, but a current or pending URL is remembered
    Paused,
}

/// Manager of a single internet audio stream
///
/// Generic over the external engine so the host can wire any backend and
/// the test suite can script one.
pub struct StreamManager<E: AudioEngine> {
    engine: E,
    config: StreamConfig,

    /// Current session, if any
    current: Option<StreamSession<E>>,

    /// Live playback channel once the current stream reported ready
    channel: Option<E::Channel>,

    /// Last requested URL; survives stop so pause/resume can restart it
    url: Option<String>,

    /// URL deferred until the dead-stream queue drains
    pending_url: Option<String>,

    /// Sessions whose engine handles failed to release; retried every tick
    dead: VecDeque<StreamSession<E>>,

    /// Last-set raw gain; the engine receives the squared, clamped value
    gain: f32,

    /// Canonical metadata for the current stream
    metadata: Option<MetadataMap>,

    /// Waveform capture shared with the engine's processing callback
    tap: Arc<WaveformTap>,
}

impl<E: AudioEngine> StreamManager<E> {
    /// Create a manager and apply the configured engine buffering
    pub fn new(engine: E, config: StreamConfig) -> Self {
        engine.set_stream_buffer_bytes(config.stream_buffer_bytes());
        let tap = Arc::new(WaveformTap::new(config.wave_buffer_capacity));

        Self {
            engine,
            config,
            current: None,
            channel: None,
            url: None,
            pending_url: None,
            dead: VecDeque::new(),
            gain: 1.0,
            metadata: None,
            tap,
        }
    }

    /// Start streaming `url`, tearing down any current session first
    ///
    /// With a non-empty URL the session opens immediately unless old streams
    /// are still draining, in which case the request is deferred to the next
    /// update tick. An empty URL only clears the remembered-URL record.
    pub fn start(&mut self, url: &str) {
        // "Stop" the stream, but don't clear the url record in case the new
        // url matches it
        self.stop();

        if url.is_empty() {
            info!("set internet stream to none");
            self.url = None;
            return;
        }

        if self.dead.is_empty() {
            self.open_session(url);
        } else {
            info!("deferring stream load until buffer release: {}", url);
            self.pending_url = Some(url.to_string());
        }
    }

    /// Stop the current stream; idempotent
    ///
    /// Keeps the remembered URL so [`StreamManager::pause`] can resume it.
    /// A session the engine cannot release synchronously moves to the
    /// dead-stream queue for retry on later ticks.
    pub fn stop(&mut self) {
        self.pending_url = None;
        self.metadata = None;

        // Silence the visualization tap and discard its history
        self.tap.set_active(false);
        self.tap.reset();

        if let Some(channel) = self.channel.take() {
            channel.set_paused(true);
            channel.set_priority(0);
            // Final channel cleanup belongs to the engine
        }

        if let Some(mut session) = self.current.take() {
            info!("stopping internet stream: {}", session.url());
            if !session.close(&self.engine) {
                warn!("pushing stream to dead list: {}", session.url());
                self.dead.push_back(session);
            }
        }
    }

    /// Pause, resume, or toggle the stream
    pub fn pause(&mut self, mode: PauseMode) {
        let pause = match mode {
            PauseMode::Pause => true,
            PauseMode::Resume => false,
            PauseMode::Toggle => self.current.is_some(),
        };

        if pause {
            if self.current.is_some() {
                self.stop();
            }
        } else {
            let url = self.url.clone().unwrap_or_default();
            self.start(&url);
        }
    }

    /// Per-frame tick: drain dead streams, promote pending requests, poll
    /// the engine, refresh metadata, and apply buffering hysteresis
    pub fn update(&mut self) {
        if !self.release_dead_streams() {
            assert!(
                self.current.is_none(),
                "a session may not be current while dead streams are draining"
            );
            return;
        }

        if let Some(url) = self.pending_url.take() {
            assert!(
                self.current.is_none(),
                "a pending request implies no current session"
            );
            self.open_session(&url);
        }

        let status = match self.current.as_ref() {
            Some(session) => session.status(&self.engine),
            None => return,
        };

        match status.state {
            OpenState::Ready => {
                // Stream is live; lazily create the playback channel
                if self.channel.is_none() {
                    let channel = self
                        .current
                        .as_ref()
                        .and_then(|session| session.start_stream(&self.engine));
                    if let Some(channel) = channel {
                        // Restore the previously set volume, enable the
                        // waveform tap, then let audio flow
                        channel.set_volume(engine_gain(self.gain));
                        self.tap.set_active(true);
                        channel.set_paused(false);
                        self.channel = Some(channel);
                    }
                }
            }
            OpenState::Error => {
                self.stop();
                return;
            }
            _ => {}
        }

        let Some(channel) = &self.channel else {
            return;
        };

        let dirty = channel.take_dirty_tags();
        if !dirty.is_empty() {
            let map = self.metadata.get_or_insert_with(MetadataMap::new);
            map.clear();
            for tag in &dirty {
                match translate_tag(tag) {
                    TranslatedTag::Entry(name, value) => {
                        map.insert(name, value);
                    }
                    TranslatedTag::SampleRateChange(hz) => {
                        info!("stream forced changing sample rate to {}", hz);
                        channel.set_sample_rate(hz);
                    }
                    TranslatedTag::Skip => {}
                }
            }
        }

        if status.starving {
            if !channel.paused() {
                info!(
                    "stream starvation detected, pausing until buffer refills (buffered={}%)",
                    status.buffered_percent
                );
                channel.set_paused(true);
            }
        } else if status.buffered_percent > self.config.rebuffer_resume_percent {
            channel.set_paused(false);
        }
    }

    /// Set the linear gain
    ///
    /// Stores the raw value and applies the perceptual curve
    /// (`clamp(v*v, 0, 1)`) to the live channel, if any.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
        if let Some(channel) = &self.channel {
            channel.set_volume(engine_gain(gain));
        }
    }

    /// Last-set raw gain, not the shaped value the engine received
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Remembered stream URL, if any
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Canonical metadata of the current stream (pull model; None when
    /// stopped)
    pub fn metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    /// Coarse playback state for UI display
    pub fn playing(&self) -> PlayState {
        if self.current.is_some() {
            PlayState::Active
        } else if self.url.is_some() || self.pending_url.is_some() {
            PlayState::Paused
        } else {
            PlayState::Inactive
        }
    }

    /// Copy the newest waveform samples into `out` for visualization
    ///
    /// Records `out.len()` as the ring's minimum retained history. Returns
    /// false when no channel/session is live or the channel is muted.
    ///
    /// # Panics
    /// Panics when `out.len()` exceeds half the ring capacity; that is a
    /// programmer error, not a runtime condition.
    pub fn wave_data(&self, out: &mut [f32]) -> bool {
        assert!(
            out.len() <= self.tap.capacity() / 2,
            "wave window of {} samples exceeds half the ring capacity ({})",
            out.len(),
            self.tap.capacity()
        );

        let Some(channel) = &self.channel else {
            return false;
        };
        if self.current.is_none() {
            return false;
        }
        if channel.muted() {
            return false;
        }

        self.tap.read_latest(out)
    }

    /// Waveform tap to wire into the engine's DSP chain
    pub fn waveform_tap(&self) -> Arc<WaveformTap> {
        Arc::clone(&self.tap)
    }

    /// Apply engine buffering knobs, both in milliseconds
    pub fn set_buffer_sizes(&self, stream_buffer_ms: u32, decode_buffer_ms: u32) {
        let bytes = stream_buffer_ms / 1000 * self.config.estimated_bitrate_kbit * 128;
        self.engine.set_stream_buffer_bytes(bytes);
        self.engine.set_decode_buffer_ms(decode_buffer_ms);
    }

    /// Open a session for `url` and record it as current
    fn open_session(&mut self, url: &str) {
        info!("starting internet stream: {}", url);
        self.current = Some(StreamSession::open(&self.engine, url));
        self.url = Some(url.to_string());
        self.metadata = Some(MetadataMap::new());
    }

    /// Retry-close every dead stream; true when the queue is empty
    fn release_dead_streams(&mut self) -> bool {
        let engine = &self.engine;
        self.dead.retain_mut(|session| {
            if session.close(engine) {
                info!("closed dead stream: {}", session.url());
                false
            } else {
                true
            }
        });
        self.dead.is_empty()
    }
}

impl<E: AudioEngine> Drop for StreamManager<E> {
    fn drop(&mut self) {
        self.stop();
        // Bounded drain; the engine eventually reports handles closeable
        for _ in 0..100 {
            if self.release_dead_streams() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Perceptual gain curve applied to the engine's volume control
fn engine_gain(gain: f32) -> f32 {
    (gain * gain).clamp(0.0, 1.0)
}
