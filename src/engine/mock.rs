//! Scriptable in-memory audio engine
//!
//! Test double for [`AudioEngine`]: streams open instantly into a scriptable
//! state table, channels record every command, and release can be made to
//! fail retryably to exercise the dead-stream queue. Clones share state so a
//! test can keep a handle while the manager owns the engine.

use super::{AudioEngine, OpenState, RawTag, StreamChannel, StreamStatus};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Point-in-time view of a mock channel, for test assertions
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub paused: bool,
    pub priority: i32,
    pub volume: f32,
    pub muted: bool,
    pub sample_rate: Option<f32>,
    /// Every `set_paused` argument in call order
    pub pause_commands: Vec<bool>,
}

#[derive(Debug)]
struct ChannelState {
    paused: bool,
    priority: i32,
    volume: f32,
    muted: bool,
    sample_rate: Option<f32>,
    dirty_tags: Vec<RawTag>,
    pause_commands: Vec<bool>,
}

/// Mock playback channel; all state lives behind a shared mutex
pub struct MockChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl StreamChannel for MockChannel {
    fn set_paused(&self, paused: bool) {
        let mut state = self.state.lock().unwrap();
        state.paused = paused;
        state.pause_commands.push(paused);
    }

    fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn set_priority(&self, priority: i32) {
        self.state.lock().unwrap().priority = priority;
    }

    fn set_volume(&self, volume: f32) {
        self.state.lock().unwrap().volume = volume;
    }

    fn muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn set_sample_rate(&self, rate_hz: f32) {
        self.state.lock().unwrap().sample_rate = Some(rate_hz);
    }

    fn take_dirty_tags(&self) -> Vec<RawTag> {
        std::mem::take(&mut self.state.lock().unwrap().dirty_tags)
    }
}

#[derive(Debug)]
struct StreamCell {
    url: String,
    status: StreamStatus,
    releasable: bool,
    released: bool,
}

#[derive(Debug, Default)]
struct Inner {
    streams: Mutex<HashMap<u64, StreamCell>>,
    next_stream_id: AtomicU64,
    fail_next_open: AtomicBool,
    last_channel: Mutex<Option<Arc<Mutex<ChannelState>>>>,
    stream_buffer_bytes: Mutex<Option<u32>>,
    decode_buffer_ms: Mutex<Option<u32>>,
}

/// Opaque mock stream handle
#[derive(Debug)]
pub struct MockStream {
    id: u64,
}

/// Scriptable engine; cheap to clone, clones share all state
#[derive(Clone, Default)]
pub struct MockEngine {
    inner: Arc<Inner>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open` call fail
    pub fn fail_next_open(&self) {
        self.inner.fail_next_open.store(true, Ordering::SeqCst);
    }

    /// Script the polled status of every live stream opened for `url`
    pub fn set_status(&self, url: &str, status: StreamStatus) {
        let mut streams = self.inner.streams.lock().unwrap();
        for cell in streams.values_mut() {
            if cell.url == url && !cell.released {
                cell.status = status;
            }
        }
    }

    /// Mark `url`'s streams fully opened with a full buffer
    pub fn set_ready(&self, url: &str) {
        self.set_status(
            url,
            StreamStatus {
                state: OpenState::Ready,
                buffered_percent: 100,
                starving: false,
            },
        );
    }

    /// Control whether `release` succeeds for `url`'s streams
    pub fn set_releasable(&self, url: &str, releasable: bool) {
        let mut streams = self.inner.streams.lock().unwrap();
        for cell in streams.values_mut() {
            if cell.url == url {
                cell.releasable = releasable;
            }
        }
    }

    /// Number of opened streams not yet released
    pub fn live_streams(&self) -> usize {
        let streams = self.inner.streams.lock().unwrap();
        streams.values().filter(|cell| !cell.released).count()
    }

    /// Whether every stream opened for `url` has been released
    pub fn is_released(&self, url: &str) -> bool {
        let streams = self.inner.streams.lock().unwrap();
        streams
            .values()
            .filter(|cell| cell.url == url)
            .all(|cell| cell.released)
    }

    /// Queue dirty tags on the most recently created channel
    pub fn push_dirty_tags(&self, tags: Vec<RawTag>) {
        if let Some(state) = self.inner.last_channel.lock().unwrap().as_ref() {
            state.lock().unwrap().dirty_tags.extend(tags);
        }
    }

    /// Mute or unmute the most recently created channel
    pub fn set_channel_muted(&self, muted: bool) {
        if let Some(state) = self.inner.last_channel.lock().unwrap().as_ref() {
            state.lock().unwrap().muted = muted;
        }
    }

    /// Snapshot the most recently created channel, if any
    pub fn channel(&self) -> Option<ChannelSnapshot> {
        let last = self.inner.last_channel.lock().unwrap();
        last.as_ref().map(|state| {
            let state = state.lock().unwrap();
            ChannelSnapshot {
                paused: state.paused,
                priority: state.priority,
                volume: state.volume,
                muted: state.muted,
                sample_rate: state.sample_rate,
                pause_commands: state.pause_commands.clone(),
            }
        })
    }

    /// Last stream buffer size applied via `set_stream_buffer_bytes`
    pub fn stream_buffer_bytes(&self) -> Option<u32> {
        *self.inner.stream_buffer_bytes.lock().unwrap()
    }

    /// Last decode buffer size applied via `set_decode_buffer_ms`
    pub fn decode_buffer_ms(&self) -> Option<u32> {
        *self.inner.decode_buffer_ms.lock().unwrap()
    }
}

impl AudioEngine for MockEngine {
    type Stream = MockStream;
    type Channel = MockChannel;

    fn open(&self, url: &str) -> Result<MockStream> {
        if self.inner.fail_next_open.swap(false, Ordering::SeqCst) {
            return Err(Error::StreamOpen(format!("mock engine refused {url}")));
        }

        let id = self.inner.next_stream_id.fetch_add(1, Ordering::SeqCst);
        self.inner.streams.lock().unwrap().insert(
            id,
            StreamCell {
                url: url.to_string(),
                status: StreamStatus {
                    state: OpenState::Connecting,
                    buffered_percent: 0,
                    starving: false,
                },
                releasable: true,
                released: false,
            },
        );
        Ok(MockStream { id })
    }

    fn poll(&self, stream: &MockStream) -> StreamStatus {
        let streams = self.inner.streams.lock().unwrap();
        streams
            .get(&stream.id)
            .map(|cell| cell.status)
            .unwrap_or(StreamStatus {
                state: OpenState::Error,
                buffered_percent: 0,
                starving: false,
            })
    }

    fn play(&self, _stream: &MockStream, start_paused: bool) -> Result<MockChannel> {
        let state = Arc::new(Mutex::new(ChannelState {
            paused: start_paused,
            priority: 128,
            volume: 1.0,
            muted: false,
            sample_rate: None,
            dirty_tags: Vec::new(),
            pause_commands: Vec::new(),
        }));
        *self.inner.last_channel.lock().unwrap() = Some(Arc::clone(&state));
        Ok(MockChannel { state })
    }

    fn release(&self, stream: MockStream) -> std::result::Result<(), MockStream> {
        let mut streams = self.inner.streams.lock().unwrap();
        match streams.get_mut(&stream.id) {
            Some(cell) if cell.releasable => {
                cell.released = true;
                Ok(())
            }
            Some(_) => Err(stream),
            None => Ok(()),
        }
    }

    fn set_stream_buffer_bytes(&self, bytes: u32) {
        *self.inner.stream_buffer_bytes.lock().unwrap() = Some(bytes);
    }

    fn set_decode_buffer_ms(&self, ms: u32) {
        *self.inner.decode_buffer_ms.lock().unwrap() = Some(ms);
    }
}
