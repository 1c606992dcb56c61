//! mpeg/mod.rs
//!
//! The frame/tag source the binder reads from.
//! Public API:
//! - [`ObjectSource`]: "give me the next frame or tag, or nothing at the end"
//! - [`ObjectDecoder`]: opens an [`ObjectSource`] over any reader
//! - [`MpegDecoder`] / [`FrameReader`]: the default implementation
//!
//! The binder only talks to the two traits, so a different decoder can be
//! plugged in without touching the binding engine.

mod header;
mod reader;

use std::io::{self, Read};
use std::time::Duration;

pub use header::{ChannelMode, FrameHeader, MpegLayer, MpegVersion};
pub use reader::FrameReader;

/// One typed object found in an MPEG audio elementary stream.
#[derive(Debug, Clone)]
pub enum MpegObject {
    Frame(MpegFrame),
    /// Raw bytes of an inline ID3v2 block (header included).
    Tag(Vec<u8>),
}

/// One audio frame: its decoded header plus the raw bytes (header included).
#[derive(Debug, Clone)]
pub struct MpegFrame {
    header: FrameHeader,
    raw: Vec<u8>,
}

impl MpegFrame {
    /// Build a frame from raw bytes, parsing the header from the first 4 bytes.
    pub fn from_raw(raw: Vec<u8>) -> Option<Self> {
        let head: [u8; header::HEADER_LEN] = raw.get(..header::HEADER_LEN)?.try_into().ok()?;
        let header = FrameHeader::parse(head)?;
        Some(Self { header, raw })
    }

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn bit_rate(&self) -> u32 {
        self.header.bit_rate
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn sample_count(&self) -> u32 {
        self.header.sample_count()
    }

    /// Playback time of this frame (truncated to whole nanoseconds).
    pub fn duration(&self) -> Duration {
        let nanos = u64::from(self.sample_count()) * 1_000_000_000 / u64::from(self.sample_rate());
        Duration::from_nanos(nanos)
    }

    /// True for encoder summary frames (Xing / Info / VBRI).
    ///
    /// Those carry no audio and only describe the file they came from.
    pub fn is_summary_frame(&self) -> bool {
        let offset = header::HEADER_LEN + self.header.side_info_size();
        let marker = self.raw.get(offset..offset + 4);
        if matches!(marker, Some(b"Xing") | Some(b"Info")) {
            return true;
        }

        self.raw.get(36..40) == Some(&b"VBRI"[..])
    }
}

/// A lazily decoded sequence of frames and tags.
pub trait ObjectSource {
    /// Next object, `Ok(None)` once the stream is exhausted.
    fn next_object(&mut self) -> io::Result<Option<MpegObject>>;
}

/// Opens an [`ObjectSource`] over a reader.
pub trait ObjectDecoder {
    fn objects<'r>(&self, reader: &'r mut dyn Read) -> Box<dyn ObjectSource + 'r>;
}

/// Default decoder backed by [`FrameReader`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MpegDecoder;

impl ObjectDecoder for MpegDecoder {
    fn objects<'r>(&self, reader: &'r mut dyn Read) -> Box<dyn ObjectSource + 'r> {
        Box::new(FrameReader::new(reader))
    }
}
