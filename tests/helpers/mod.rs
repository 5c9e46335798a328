//! Shared test helpers: manager construction over the scriptable mock engine

use netradio::engine::mock::MockEngine;
use netradio::{StreamConfig, StreamManager};

pub const URL: &str = "http://radio.example.com/stream.mp3";

/// Opt-in test logging via RUST_LOG
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Fresh manager over a shared-handle mock engine
pub fn manager() -> (StreamManager<MockEngine>, MockEngine) {
    init_logging();
    let engine = MockEngine::new();
    let manager = StreamManager::new(engine.clone(), StreamConfig::default());
    (manager, engine)
}

/// Manager already playing `URL`: started, engine reports ready, one update
/// has created the playback channel
pub fn playing_manager() -> (StreamManager<MockEngine>, MockEngine) {
    let (mut manager, engine) = manager();
    manager.start(URL);
    engine.set_ready(URL);
    manager.update();
    assert!(!engine.channel().expect("channel created").paused);
    (manager, engine)
}
