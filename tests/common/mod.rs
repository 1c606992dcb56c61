//! Synthetic MPEG 1 layer III streams for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;

use id3::{Frame, Tag, TagLike, Version};
use mp3bind::binder::{BindError, Binder, BindOption, Input, SUMMARY_FRAME_LEN};

/// 128 kbit/s at 44.1 kHz: 417 bytes unpadded.
pub const KBPS_128: u8 = 9;
/// 160 kbit/s at 44.1 kHz: 522 bytes unpadded.
pub const KBPS_160: u8 = 10;

pub const FRAME_128_LEN: usize = 417;
pub const FRAME_160_LEN: usize = 522;

/// 1152 samples at 44.1 kHz.
pub const FRAME_NANOS: u64 = 26_122_448;

/// One stereo frame with the given bit rate index, filled with `fill`.
pub fn frame(bitrate_index: u8, fill: u8) -> Vec<u8> {
    let len = match bitrate_index {
        KBPS_128 => FRAME_128_LEN,
        KBPS_160 => FRAME_160_LEN,
        other => panic!("no length table for bit rate index {other}"),
    };

    let mut raw = vec![fill; len];
    raw[..4].copy_from_slice(&[0xFF, 0xFB, bitrate_index << 4, 0x00]);
    raw
}

/// An encoder summary frame as written by LAME (no audio).
pub fn xing_frame() -> Vec<u8> {
    let mut raw = frame(KBPS_128, 0);
    // stereo: 4 header bytes + 32 bytes side info
    raw[36..40].copy_from_slice(b"Xing");
    raw
}

/// A serialized ID3v2.4 block with the given text frames.
pub fn id3_block(texts: &[(&str, &str)]) -> Vec<u8> {
    let mut tag = Tag::new();
    for (id, value) in texts {
        tag.add_frame(Frame::text(*id, *value));
    }
    serialize(&tag)
}

pub fn serialize(tag: &Tag) -> Vec<u8> {
    let mut raw = Vec::new();
    tag.write_to(&mut raw, Version::Id3v24).unwrap();
    raw
}

pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

pub fn inputs(sources: Vec<Vec<u8>>) -> Vec<Input<'static>> {
    sources
        .into_iter()
        .map(|bytes| Box::new(Cursor::new(bytes)) as Input<'static>)
        .collect()
}

/// Bind in memory and return the output bytes.
pub fn bind(sources: Vec<Vec<u8>>, options: Vec<BindOption<'_>>) -> Result<Vec<u8>, BindError> {
    let binder = Binder::default();
    let mut output = Vec::new();
    let mut scratch = Cursor::new(Vec::new());
    binder.bind(&mut output, &mut scratch, inputs(sources), options)?;
    Ok(output)
}

/// Length of the leading ID3v2 block (0 without one).
pub fn tag_len(output: &[u8]) -> usize {
    if output.len() < 10 || &output[..3] != b"ID3" {
        return 0;
    }
    let size = output[6..10]
        .iter()
        .fold(0usize, |acc, b| (acc << 7) | usize::from(b & 0x7F));
    let footer = if output[5] & 0x10 != 0 { 10 } else { 0 };
    10 + size + footer
}

pub fn read_tag(output: &[u8]) -> Tag {
    Tag::read_from2(Cursor::new(output)).unwrap()
}

/// Bytes after the tag: summary frame followed by the audio.
pub fn audio(output: &[u8]) -> &[u8] {
    &output[tag_len(output)..]
}

/// The summary frame at the start of the audio.
pub struct Summary {
    pub marker: [u8; 4],
    pub frames: u32,
    pub bytes: u32,
}

pub fn summary(output: &[u8]) -> Summary {
    let header = &audio(output)[..SUMMARY_FRAME_LEN];
    // mono MPEG 1: 4 header bytes + 17 bytes side info
    let at = 21;
    let be = |i: usize| u32::from_be_bytes(header[i..i + 4].try_into().unwrap());
    Summary {
        marker: header[at..at + 4].try_into().unwrap(),
        frames: be(at + 8),
        bytes: be(at + 12),
    }
}

/// (id, value, warning) triples as seen by a tag visitor.
pub type TagEvents = RefCell<Vec<(String, String, Option<mp3bind::TagWarning>)>>;

pub fn record(
    events: &TagEvents,
) -> impl FnMut(&str, &str, Option<&mp3bind::TagWarning>) + '_ {
    move |id, value, warning| {
        events
            .borrow_mut()
            .push((id.to_string(), value.to_string(), warning.cloned()))
    }
}

pub fn title(tag: &Tag) -> Option<&str> {
    tag.title()
}

/// CHAP frames of `tag`, ordered by start time.
pub fn chapter_frames(tag: &Tag) -> Vec<&id3::frame::Chapter> {
    let mut found: Vec<_> = tag
        .frames()
        .filter_map(|f| match f.content() {
            id3::frame::Content::Chapter(c) => Some(c),
            _ => None,
        })
        .collect();
    found.sort_by_key(|c| c.start_time);
    found
}

pub fn toc_frame(tag: &Tag) -> Option<&id3::frame::TableOfContents> {
    tag.frames().find_map(|f| match f.content() {
        id3::frame::Content::TableOfContents(t) => Some(t),
        _ => None,
    })
}

pub fn chapter_title(chapter: &id3::frame::Chapter) -> Option<&str> {
    chapter
        .frames
        .iter()
        .find(|f| f.id() == "TIT2")
        .and_then(|f| f.content().text())
}
