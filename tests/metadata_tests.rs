//! Metadata and waveform integration tests
//!
//! Dirty-tag translation through the update tick, the sample-rate-change
//! pseudo tag, and the wave-data read path including its hard precondition.

mod helpers;

use helpers::{manager, playing_manager, URL};
use netradio::engine::{RawTag, TagContainer, TagData, TextEncoding};
use netradio::TagValue;

fn tag(name: &str, container: TagContainer, data: TagData) -> RawTag {
    RawTag {
        name: name.to_string(),
        container,
        data,
    }
}

#[test]
fn test_dirty_tags_rebuild_metadata_map() {
    let (mut mgr, engine) = playing_manager();

    engine.push_dirty_tags(vec![
        tag(
            "TPE1",
            TagContainer::Id3v2,
            TagData::Text(b"Some Artist\0".to_vec(), TextEncoding::Latin1),
        ),
        tag(
            "Title",
            TagContainer::Asf,
            TagData::Text(b"Some Song".to_vec(), TextEncoding::Utf8),
        ),
        tag("BITRATE", TagContainer::Unknown, TagData::Integer(128)),
    ]);
    mgr.update();

    let map = mgr.metadata().unwrap();
    assert_eq!(map.get("ARTIST"), Some(&TagValue::Text("Some Artist".into())));
    assert_eq!(map.get("TITLE"), Some(&TagValue::Text("Some Song".into())));
    assert_eq!(map.get("BITRATE"), Some(&TagValue::Integer(128)));
}

#[test]
fn test_map_is_rebuilt_not_merged() {
    let (mut mgr, engine) = playing_manager();

    engine.push_dirty_tags(vec![tag(
        "TPE1",
        TagContainer::Id3v2,
        TagData::Text(b"First".to_vec(), TextEncoding::Latin1),
    )]);
    mgr.update();
    assert!(mgr.metadata().unwrap().contains_key("ARTIST"));

    // A later dirty set replaces the whole map
    engine.push_dirty_tags(vec![tag(
        "TIT2",
        TagContainer::Id3v2,
        TagData::Text(b"Second".to_vec(), TextEncoding::Latin1),
    )]);
    mgr.update();

    let map = mgr.metadata().unwrap();
    assert!(!map.contains_key("ARTIST"));
    assert_eq!(map.get("TITLE"), Some(&TagValue::Text("Second".into())));
}

#[test]
fn test_no_dirty_tags_leaves_map_untouched() {
    let (mut mgr, engine) = playing_manager();

    engine.push_dirty_tags(vec![tag(
        "TIT2",
        TagContainer::Id3v2,
        TagData::Text(b"Keep Me".to_vec(), TextEncoding::Latin1),
    )]);
    mgr.update();

    mgr.update();
    assert_eq!(
        mgr.metadata().unwrap().get("TITLE"),
        Some(&TagValue::Text("Keep Me".into()))
    );
}

#[test]
fn test_sample_rate_change_retargets_channel() {
    let (mut mgr, engine) = playing_manager();

    engine.push_dirty_tags(vec![
        tag(
            "Sample Rate Change",
            TagContainer::Engine,
            TagData::Float(48_000.0),
        ),
        tag(
            "TIT2",
            TagContainer::Id3v2,
            TagData::Text(b"Song".to_vec(), TextEncoding::Latin1),
        ),
    ]);
    mgr.update();

    // Applied to the channel, never stored in the map
    assert_eq!(engine.channel().unwrap().sample_rate, Some(48_000.0));
    let map = mgr.metadata().unwrap();
    assert!(!map.contains_key("Sample Rate Change"));
    assert!(map.contains_key("TITLE"));
}

#[test]
fn test_utf16_tag_payload_normalizes() {
    let (mut mgr, engine) = playing_manager();

    // "Hi" as UTF-16BE with BOM and trailing NUL
    let bytes = vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i', 0x00, 0x00];
    engine.push_dirty_tags(vec![tag(
        "TIT2",
        TagContainer::Id3v2,
        TagData::Text(bytes, TextEncoding::Utf16),
    )]);
    mgr.update();

    assert_eq!(
        mgr.metadata().unwrap().get("TITLE"),
        Some(&TagValue::Text("Hi".into()))
    );
}

#[test]
fn test_wave_data_requires_live_channel() {
    let (mgr, _engine) = manager();
    let mut window = [0.0; 16];
    assert!(!mgr.wave_data(&mut window));
}

#[test]
fn test_wave_data_false_when_muted() {
    let (mgr, engine) = playing_manager();

    let tap = mgr.waveform_tap();
    let mut scratch = [0.0; 4];
    tap.process(&[0.1, 0.2, 0.3, 0.4], &mut scratch, 2);

    engine.set_channel_muted(true);
    let mut window = [0.0; 16];
    assert!(!mgr.wave_data(&mut window));

    engine.set_channel_muted(false);
    assert!(mgr.wave_data(&mut window));
}

#[test]
fn test_wave_data_copies_and_zero_pads() {
    let (mgr, _engine) = playing_manager();

    // Two stereo frames mixed down to [0.2, 0.4]
    let tap = mgr.waveform_tap();
    let mut scratch = [0.0; 4];
    tap.process(&[0.1, 0.3, 0.3, 0.5], &mut scratch, 2);

    let mut window = [9.0; 4];
    assert!(mgr.wave_data(&mut window));
    assert!((window[0] - 0.2).abs() < 1e-6);
    assert!((window[1] - 0.4).abs() < 1e-6);
    assert_eq!(&window[2..], &[0.0, 0.0]);
}

#[test]
#[should_panic(expected = "exceeds half the ring capacity")]
fn test_wave_data_oversize_window_panics() {
    let (mgr, _engine) = manager();
    // Default capacity 1024: anything over 512 is a programmer error
    let mut window = vec![0.0; 513];
    mgr.wave_data(&mut window);
}

#[test]
fn test_stop_resets_wave_history() {
    let (mut mgr, _engine) = playing_manager();

    let tap = mgr.waveform_tap();
    let mut scratch = [0.0; 2];
    tap.process(&[0.5, 0.5], &mut scratch, 1);
    assert!(tap.occupied() > 0);

    mgr.stop();
    assert_eq!(tap.occupied(), 0);
    assert!(!tap.is_active());
}
