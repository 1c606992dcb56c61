//! mpeg/reader.rs
//! Buffered scanner that turns a byte stream into `MpegObject`s.
//!
//! Recognised at the current position, in this order:
//! - `ID3` + plausible header -> ID3v2 block (header + body + optional footer), returned raw
//! - `TAG` -> ID3v1 block (fixed 128 bytes), skipped
//! - sync word + valid header -> audio frame
//! - anything else -> slide forward one byte and try again
//!
//! A stream that ends in the middle of a frame ends the scan; it is not an
//! error. An ID3v2 block that claims more bytes than the stream has left is
//! treated as a false match: its bytes are scanned again from the byte after
//! `I`. Real read errors are returned.

use std::io::{self, BufReader, Cursor, Read};

use super::header::{FrameHeader, HEADER_LEN};
use super::{MpegFrame, MpegObject, ObjectSource};

const ID3V2_HEADER_LEN: usize = 10;
const ID3V2_FOOTER_LEN: usize = 10;
const ID3V2_FOOTER_FLAG: u8 = 0x10;
const ID3V1_LEN: usize = 128;

pub struct FrameReader<R: Read> {
    reader: BufReader<R>,
    /// Bytes already consumed from `reader` that have to be scanned again.
    replay: Cursor<Vec<u8>>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            replay: Cursor::new(Vec::new()),
        }
    }

    /// Fill `buf` from the replay buffer first, then from the stream.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        read_or_eof(&mut (&mut self.replay).chain(&mut self.reader), buf)
    }

    /// Read the rest of an ID3v2 block whose first 4 bytes are in `head`.
    ///
    /// `None` when the block is not a real one; everything read after the
    /// leading `I` is then queued for scanning again.
    fn read_id3v2(&mut self, head: [u8; HEADER_LEN]) -> io::Result<Option<Vec<u8>>> {
        let mut raw = head.to_vec();
        let mut rest = [0u8; ID3V2_HEADER_LEN - HEADER_LEN];
        let complete = self.fill(&mut rest)?;
        raw.extend_from_slice(&rest);

        if !complete || !plausible_id3v2_header(&raw) {
            self.requeue(raw);
            return Ok(None);
        }

        let mut body_len = syncsafe_u32(&raw[6..10]) as u64;
        if raw[5] & ID3V2_FOOTER_FLAG != 0 {
            body_len += ID3V2_FOOTER_LEN as u64;
        }

        // Grows with what is actually there instead of trusting the header.
        let read = (&mut (&mut self.replay).chain(&mut self.reader))
            .take(body_len)
            .read_to_end(&mut raw)?;

        if (read as u64) < body_len {
            tracing::debug!(
                claimed = body_len,
                available = read,
                "ID3v2 block runs past the end of the stream, rescanning"
            );
            self.requeue(raw);
            return Ok(None);
        }

        Ok(Some(raw))
    }

    /// Queue `consumed[1..]` (plus whatever was still waiting) for scanning.
    fn requeue(&mut self, consumed: Vec<u8>) {
        let position = self.replay.position() as usize;
        let mut pending = consumed.get(1..).map(<[u8]>::to_vec).unwrap_or_default();
        pending.extend_from_slice(self.replay.get_ref().get(position..).unwrap_or_default());
        self.replay = Cursor::new(pending);
    }

    /// Read the rest of an audio frame whose header is in `head`.
    fn read_frame(
        &mut self,
        header: FrameHeader,
        head: [u8; HEADER_LEN],
    ) -> io::Result<Option<MpegFrame>> {
        let len = header.frame_len().max(HEADER_LEN);

        let mut raw = vec![0u8; len];
        raw[..HEADER_LEN].copy_from_slice(&head);
        if !self.fill(&mut raw[HEADER_LEN..])? {
            return Ok(None);
        }

        Ok(Some(MpegFrame { header, raw }))
    }

    fn skip(&mut self, count: usize) -> io::Result<bool> {
        let skipped = io::copy(
            &mut (&mut (&mut self.replay).chain(&mut self.reader)).take(count as u64),
            &mut io::sink(),
        )?;
        Ok(skipped == count as u64)
    }
}

impl<R: Read> ObjectSource for FrameReader<R> {
    fn next_object(&mut self) -> io::Result<Option<MpegObject>> {
        let mut window = [0u8; HEADER_LEN];
        if !self.fill(&mut window)? {
            return Ok(None);
        }

        loop {
            if &window[..3] == b"ID3" {
                if let Some(raw) = self.read_id3v2(window)? {
                    return Ok(Some(MpegObject::Tag(raw)));
                }
                // false match: scanning resumes right after the `I`
                if !self.fill(&mut window)? {
                    return Ok(None);
                }
                continue;
            }

            if &window[..3] == b"TAG" {
                if !self.skip(ID3V1_LEN - HEADER_LEN)? {
                    return Ok(None);
                }
                if !self.fill(&mut window)? {
                    return Ok(None);
                }
                continue;
            }

            if let Some(header) = FrameHeader::parse(window) {
                return Ok(self.read_frame(header, window)?.map(MpegObject::Frame));
            }

            // resync
            window.copy_within(1.., 0);
            if !self.fill(&mut window[HEADER_LEN - 1..])? {
                return Ok(None);
            }
        }
    }
}

/// Major version 2..=4, revision not 0xFF, size bytes below 0x80.
fn plausible_id3v2_header(header: &[u8]) -> bool {
    header.len() >= ID3V2_HEADER_LEN
        && (2..=4).contains(&header[3])
        && header[4] != 0xFF
        && header[6..10].iter().all(|b| b & 0x80 == 0)
}

/// `read_exact`, but a clean or partial end of stream yields `Ok(false)`.
fn read_or_eof(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// ID3v2 sizes store 7 bits per byte.
fn syncsafe_u32(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .fold(0u32, |acc, &b| (acc << 7) | u32::from(b & 0x7F))
}
