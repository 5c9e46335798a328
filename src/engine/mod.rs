//! Audio engine collaborator contract
//!
//! The external engine owns stream decode, network buffering, playback, and
//! the DSP graph. This crate reaches it through [`AudioEngine`] and
//! [`StreamChannel`] so the session manager can be tested against a
//! scriptable double ([`mock::MockEngine`]) and wired to a real backend by
//! the host application.
//!
//! Stream opening is non-blocking at the engine level: `open` returns a
//! handle immediately and the caller polls [`AudioEngine::poll`] until the
//! stream reports [`OpenState::Ready`] or [`OpenState::Error`].

pub mod mock;

use crate::error::Result;

/// Open state of a stream handle as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenState {
    /// Still establishing the network connection
    Connecting,
    /// Connected, filling the network buffer
    Buffering,
    /// Fully opened and playable
    Ready,
    /// Open failed or the stream died
    Error,
}

/// Snapshot of a stream's open/buffering state
#[derive(Debug, Clone, Copy)]
pub struct StreamStatus {
    /// Open state of the stream handle
    pub state: OpenState,

    /// Network buffer fill percentage (0-100)
    pub buffered_percent: u32,

    /// Network buffer is nearly empty, risking audible dropout
    pub starving: bool,
}

/// Container format a metadata tag was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagContainer {
    Id3v2,
    Asf,
    Vorbis,
    /// Engine-internal pseudo tags (e.g. forced sample-rate changes)
    Engine,
    Unknown,
}

/// Text encoding of a raw tag payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Single-byte text, mapped byte-for-byte into Unicode
    Latin1,
    /// UTF-8, possibly with a leading BOM
    Utf8,
    /// UTF-16 with optional BOM; unmarked input is treated as big-endian
    Utf16,
    /// UTF-16 big-endian, no BOM expected
    Utf16Be,
}

/// Raw tag datum as delivered by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum TagData {
    Integer(i64),
    Float(f64),
    /// Undecoded text bytes plus their declared encoding
    Text(Vec<u8>, TextEncoding),
}

/// One metadata tag reported by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RawTag {
    /// Tag name as it appears in the container (e.g. "TPE1", "WM/AlbumArtist")
    pub name: String,

    /// Container format the tag came from
    pub container: TagContainer,

    /// Tag payload
    pub data: TagData,
}

/// Live playback channel for an opened stream
///
/// Channels are engine-owned; dropping one releases only this crate's
/// reference, final cleanup stays with the engine. Muting is controlled by
/// the host through the engine's own mixer interface; this crate only reads
/// the flag.
pub trait StreamChannel {
    /// Pause or resume playback on this channel
    fn set_paused(&self, paused: bool);

    /// Whether the channel is currently paused
    fn paused(&self) -> bool;

    /// Set the channel's mixing priority (0 = lowest)
    fn set_priority(&self, priority: i32);

    /// Set the channel volume (0.0-1.0, already perceptually shaped)
    fn set_volume(&self, volume: f32);

    /// Whether the channel is muted at the engine level
    fn muted(&self) -> bool;

    /// Retarget the channel's output sample rate in Hz
    fn set_sample_rate(&self, rate_hz: f32);

    /// Tags that changed since the last call; the engine clears its dirty set
    fn take_dirty_tags(&self) -> Vec<RawTag>;
}

/// External audio engine contract
///
/// `Stream` is an opaque open-stream handle; `Channel` is a live playback
/// channel created from a ready stream.
pub trait AudioEngine {
    type Stream;
    type Channel: StreamChannel;

    /// Begin opening `url` without blocking
    ///
    /// An `Err` here means the engine refused the request outright; the
    /// session is marked not-ready and no retry is attempted.
    fn open(&self, url: &str) -> Result<Self::Stream>;

    /// Poll the open/buffering state of a stream handle
    fn poll(&self, stream: &Self::Stream) -> StreamStatus;

    /// Create a playback channel for a ready stream
    ///
    /// With `start_paused` the channel comes up silent so gain and the
    /// visualization tap can be wired before audio flows.
    fn play(&self, stream: &Self::Stream, start_paused: bool) -> Result<Self::Channel>;

    /// Release engine-side stream resources
    ///
    /// A retryable failure (engine still holds the handle, e.g. mid-connect)
    /// returns the handle to the caller for a later attempt.
    fn release(&self, stream: Self::Stream) -> std::result::Result<(), Self::Stream>;

    /// Set the network stream buffer size in raw bytes
    fn set_stream_buffer_bytes(&self, bytes: u32);

    /// Set the engine's default decode buffer size in milliseconds
    fn set_decode_buffer_ms(&self, ms: u32);
}
