//! Stream metadata tag translation
//!
//! Engines report tags under container-specific names and a grab bag of text
//! encodings. This module normalizes them into a canonical map for display:
//! ID3v2 `TIT2`/`TPE1` and ASF `Title`/`WM/AlbumArtist` become
//! `TITLE`/`ARTIST`, and every text payload is decoded to a `String` with
//! BOMs and one trailing NUL stripped.
//!
//! The engine-internal "Sample Rate Change" pseudo tag is never stored; it is
//! surfaced so the caller can retarget the playback channel's output rate.

use crate::engine::{RawTag, TagContainer, TagData, TextEncoding};
use std::collections::BTreeMap;
use tracing::debug;

/// Canonical metadata map, rebuilt whenever the stream reports dirty tags
pub type MetadataMap = BTreeMap<String, TagValue>;

/// Normalized tag value
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Outcome of translating one raw engine tag
#[derive(Debug, Clone, PartialEq)]
pub enum TranslatedTag {
    /// Store under the canonical name
    Entry(String, TagValue),

    /// Engine requests an output sample-rate change; not stored in the map
    SampleRateChange(f32),

    /// Engine-internal or unusable tag, skipped
    Skip,
}

/// Translate a raw engine tag into its canonical form
pub fn translate_tag(tag: &RawTag) -> TranslatedTag {
    let name = match tag.container {
        TagContainer::Id3v2 => {
            if tag.name.eq_ignore_ascii_case("TIT2") {
                "TITLE".to_string()
            } else if tag.name.eq_ignore_ascii_case("TPE1") {
                "ARTIST".to_string()
            } else {
                tag.name.clone()
            }
        }
        TagContainer::Asf => {
            if tag.name.eq_ignore_ascii_case("Title") {
                "TITLE".to_string()
            } else if tag.name.eq_ignore_ascii_case("WM/AlbumArtist") {
                "ARTIST".to_string()
            } else {
                tag.name.clone()
            }
        }
        TagContainer::Engine => {
            if tag.name.eq_ignore_ascii_case("Sample Rate Change") {
                if let TagData::Float(hz) = &tag.data {
                    return TranslatedTag::SampleRateChange(*hz as f32);
                }
            }
            // Other engine-internal pseudo tags carry no display value
            return TranslatedTag::Skip;
        }
        _ => {
            if tag.name.eq_ignore_ascii_case("TITLE") || tag.name.eq_ignore_ascii_case("ARTIST") {
                tag.name.to_ascii_uppercase()
            } else {
                tag.name.clone()
            }
        }
    };

    let value = match &tag.data {
        TagData::Integer(v) => TagValue::Integer(*v),
        TagData::Float(v) => TagValue::Float(*v),
        TagData::Text(bytes, encoding) => TagValue::Text(decode_text(bytes, *encoding)),
    };

    debug!("tag {} -> {}: {:?}", tag.name, name, value);
    TranslatedTag::Entry(name, value)
}

/// Decode a raw text payload into a `String`
///
/// Strips a leading BOM where the encoding allows one and one trailing NUL
/// terminator, which streams routinely include in tag payloads.
fn decode_text(data: &[u8], encoding: TextEncoding) -> String {
    let mut out = match encoding {
        TextEncoding::Latin1 => data.iter().map(|&b| b as char).collect(),
        TextEncoding::Utf8 => {
            let body = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
            String::from_utf8_lossy(body).into_owned()
        }
        TextEncoding::Utf16 => decode_utf16(data, None),
        TextEncoding::Utf16Be => decode_utf16(data, Some(true)),
    };
    if out.ends_with('\0') {
        out.pop();
    }
    out
}

/// Decode UTF-16 bytes, sniffing the BOM when the endianness is not forced
///
/// Unmarked input defaults to big-endian. An odd-length payload keeps its
/// final byte as a high-byte-only code unit rather than dropping it.
fn decode_utf16(data: &[u8], force_big_endian: Option<bool>) -> String {
    let mut big_endian = force_big_endian.unwrap_or(true);
    let mut body = data;

    if force_big_endian.is_none() && data.len() >= 2 {
        match (data[0], data[1]) {
            (0xFE, 0xFF) => {
                big_endian = true;
                body = &data[2..];
            }
            (0xFF, 0xFE) => {
                big_endian = false;
                body = &data[2..];
            }
            _ => {}
        }
    }

    let mut units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    if body.len() % 2 == 1 {
        units.push((body[body.len() - 1] as u16) << 8);
    }

    String::from_utf16_lossy(&units)
}
