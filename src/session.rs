//! Stream session lifecycle
//!
//! A [`StreamSession`] is one attempt to open and play a single network
//! audio URL. Opening is non-blocking: the engine hands back a handle
//! immediately and the owner polls [`StreamSession::status`] until the
//! stream is ready or errored. Closing is best-effort; the engine may refuse
//! to release a handle synchronously (e.g. mid-connect), in which case the
//! session is kept and retried later from the dead-stream queue.

use crate::engine::{AudioEngine, OpenState, StreamStatus};
use tracing::{info, warn};
use uuid::Uuid;

/// One attempt to open and play a single URL
pub struct StreamSession<E: AudioEngine> {
    /// Session id for log correlation
    id: Uuid,

    /// Source URL, opaque to this crate
    url: String,

    /// Engine stream handle; None after release or a failed open
    stream: Option<E::Stream>,

    /// Whether the engine accepted the open request
    ready: bool,
}

impl<E: AudioEngine> StreamSession<E> {
    /// Begin opening `url` on the engine
    ///
    /// An engine refusal leaves the session not-ready; no retry is attempted
    /// here, the caller must issue a fresh start.
    pub fn open(engine: &E, url: &str) -> Self {
        let id = Uuid::new_v4();
        match engine.open(url) {
            Ok(stream) => Self {
                id,
                url: url.to_string(),
                stream: Some(stream),
                ready: true,
            },
            Err(e) => {
                warn!("couldn't open stream {} ({}): {}", url, id, e);
                Self {
                    id,
                    url: url.to_string(),
                    stream: None,
                    ready: false,
                }
            }
        }
    }

    /// Session id for log correlation
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Source URL this session was opened for
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the engine accepted the open request
    pub fn ready(&self) -> bool {
        self.ready
    }

    /// Poll the engine for open state and buffering progress
    ///
    /// A session without a live handle reports [`OpenState::Error`].
    pub fn status(&self, engine: &E) -> StreamStatus {
        match &self.stream {
            Some(stream) => engine.poll(stream),
            None => StreamStatus {
                state: OpenState::Error,
                buffered_percent: 0,
                starving: false,
            },
        }
    }

    /// Request a playback channel for this stream
    ///
    /// Requires a live and fully opened stream; otherwise logs a warning and
    /// returns None. The channel starts paused so the caller can apply gain
    /// and wire the visualization tap before audio flows.
    pub fn start_stream(&self, engine: &E) -> Option<E::Channel> {
        let Some(stream) = &self.stream else {
            warn!("no internet stream to start playing ({})", self.id);
            return None;
        };
        if engine.poll(stream).state != OpenState::Ready {
            warn!("stream {} not ready to play ({})", self.url, self.id);
            return None;
        }

        match engine.play(stream, true) {
            Ok(channel) => Some(channel),
            Err(e) => {
                warn!("couldn't start stream {} ({}): {}", self.url, self.id, e);
                None
            }
        }
    }

    /// Attempt to close the session synchronously
    ///
    /// Returns true when the engine-side handle is gone (or there never was
    /// one). Refuses to release while the engine still reports Connecting,
    /// and keeps the handle on a retryable release failure; either way the
    /// caller should park the session and retry on a later tick.
    pub fn close(&mut self, engine: &E) -> bool {
        let Some(stream) = self.stream.take() else {
            return true;
        };

        if engine.poll(&stream).state == OpenState::Connecting {
            self.stream = Some(stream);
            return false;
        }

        match engine.release(stream) {
            Ok(()) => true,
            Err(stream) => {
                self.stream = Some(stream);
                false
            }
        }
    }
}

impl<E: AudioEngine> Drop for StreamSession<E> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            info!("dropping stream session {} with a live handle ({})", self.url, self.id);
        }
    }
}
