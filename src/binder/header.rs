//! binder/header.rs
//!
//! Summary (Xing/Info) header: placeholder and reconciliation.
//!
//! The header has to sit in front of the audio but describes totals that are
//! only known once every frame has been copied. So:
//! 1. write `SUMMARY_FRAME_LEN` zero bytes before the first frame
//! 2. copy frames, counting them
//! 3. seek back over the frames and the placeholder, overwrite it in place
//!
//! The placeholder and the real header must be the same length, otherwise
//! the patch would overwrite (or leave a gap before) the first audio frame.

use std::io::{Seek, SeekFrom, Write};

use crate::mpeg::FrameHeader;

/// MPEG 1, layer III, 64 kbit/s, 44.1 kHz, padded, no CRC, mono.
const SUMMARY_FRAME_HEAD: [u8; 4] = [0xFF, 0xFB, 0x52, 0xC0];

/// Length of the frame described by `SUMMARY_FRAME_HEAD`.
pub const SUMMARY_FRAME_LEN: usize = 209;

const MARKER_SINGLE_BITRATE: &[u8; 4] = b"Xing";
const MARKER_MULTIPLE_BITRATES: &[u8; 4] = b"Info";

/// Flags: frame count and byte count fields present.
const FLAG_FRAMES_AND_BYTES: u8 = 0x03;

/// Aggregate statistics of the audio-only payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryStats {
    pub frames: u64,
    pub bytes: u64,
    pub multiple_bitrates: bool,
}

/// Build the summary frame for `stats`.
///
/// The marker position is derived from the frame's own header (side
/// information size depends on MPEG version and channel mode).
pub fn summary_frame(stats: &SummaryStats) -> Vec<u8> {
    let mut raw = vec![0u8; SUMMARY_FRAME_LEN];
    raw[..4].copy_from_slice(&SUMMARY_FRAME_HEAD);

    let side_info = FrameHeader::parse(SUMMARY_FRAME_HEAD)
        .map(|h| h.side_info_size())
        .unwrap_or_default();
    let offset = 4 + side_info;

    let marker = if stats.multiple_bitrates {
        MARKER_MULTIPLE_BITRATES
    } else {
        MARKER_SINGLE_BITRATE
    };
    raw[offset..offset + 4].copy_from_slice(marker);
    raw[offset + 7] = FLAG_FRAMES_AND_BYTES;
    raw[offset + 8..offset + 12].copy_from_slice(&clamp_u32(stats.frames).to_be_bytes());
    raw[offset + 12..offset + 16].copy_from_slice(&clamp_u32(stats.bytes).to_be_bytes());

    raw
}

/// Overwrite the placeholder written before `stats.bytes` bytes of audio.
///
/// Expects the stream positioned right after the last copied frame; leaves it
/// at the end of the stream.
pub fn reconcile<W: Write + Seek + ?Sized>(out: &mut W, stats: &SummaryStats) -> std::io::Result<()> {
    let header = summary_frame(stats);

    let back = stats.bytes + SUMMARY_FRAME_LEN as u64;
    let back = i64::try_from(back).map_err(std::io::Error::other)?;
    out.seek(SeekFrom::Current(-back))?;

    tracing::debug!(
        frames = stats.frames,
        bytes = stats.bytes,
        multiple_bitrates = stats.multiple_bitrates,
        "patching summary header"
    );
    out.write_all(&header)?;

    out.seek(SeekFrom::End(0))?;
    Ok(())
}

fn clamp_u32(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}
