//! mpeg/header.rs
//! MPEG audio frame header parsing.
//!
//! The header is the 4 bytes at the start of every frame. Everything we need
//! for binding comes out of it:
//! - frame length (so we know how many bytes to copy)
//! - sample count + sample rate (so we can add up playback duration)
//! - bit rate (so we can tell CBR from VBR)
//! - side information size (so we know where a Xing/Info marker lives)

/// Size of the frame header in bytes.
pub const HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegVersion {
    V1,
    V2,
    V2_5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpegLayer {
    I,
    II,
    III,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    Stereo,
    JointStereo,
    DualChannel,
    Mono,
}

// kbit/s, index 0 ("free") and 15 ("bad") are rejected before lookup.
const BITRATES_V1_L1: [u32; 16] = [
    0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0,
];
const BITRATES_V1_L2: [u32; 16] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0,
];
const BITRATES_V1_L3: [u32; 16] = [
    0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0,
];
const BITRATES_V2_L1: [u32; 16] = [
    0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0,
];
const BITRATES_V2_L23: [u32; 16] = [
    0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0,
];

const SAMPLE_RATES_V1: [u32; 3] = [44100, 48000, 32000];
const SAMPLE_RATES_V2: [u32; 3] = [22050, 24000, 16000];
const SAMPLE_RATES_V2_5: [u32; 3] = [11025, 12000, 8000];

/// Decoded MPEG audio frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: MpegVersion,
    pub layer: MpegLayer,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    pub padding: bool,
    pub crc_protected: bool,
    pub channel_mode: ChannelMode,
}

impl FrameHeader {
    /// Parse the 4 header bytes.
    ///
    /// Returns `None` when the bytes are not a usable header:
    /// - no sync word
    /// - reserved version / layer / sample rate
    /// - "free" or "bad" bit rate index (free format frames have no
    ///   self-describing length, so we can't delimit them)
    pub fn parse(bytes: [u8; HEADER_LEN]) -> Option<Self> {
        if bytes[0] != 0xFF || bytes[1] & 0xE0 != 0xE0 {
            return None;
        }

        let version = match (bytes[1] >> 3) & 0b11 {
            0b00 => MpegVersion::V2_5,
            0b10 => MpegVersion::V2,
            0b11 => MpegVersion::V1,
            _ => return None,
        };

        let layer = match (bytes[1] >> 1) & 0b11 {
            0b01 => MpegLayer::III,
            0b10 => MpegLayer::II,
            0b11 => MpegLayer::I,
            _ => return None,
        };

        let crc_protected = bytes[1] & 0b1 == 0;

        let bitrate_index = usize::from(bytes[2] >> 4);
        if bitrate_index == 0 || bitrate_index == 15 {
            return None;
        }

        let table = match (version, layer) {
            (MpegVersion::V1, MpegLayer::I) => &BITRATES_V1_L1,
            (MpegVersion::V1, MpegLayer::II) => &BITRATES_V1_L2,
            (MpegVersion::V1, MpegLayer::III) => &BITRATES_V1_L3,
            (_, MpegLayer::I) => &BITRATES_V2_L1,
            (_, _) => &BITRATES_V2_L23,
        };
        let bit_rate = table[bitrate_index] * 1000;

        let sample_rate_index = usize::from((bytes[2] >> 2) & 0b11);
        let rates = match version {
            MpegVersion::V1 => &SAMPLE_RATES_V1,
            MpegVersion::V2 => &SAMPLE_RATES_V2,
            MpegVersion::V2_5 => &SAMPLE_RATES_V2_5,
        };
        let sample_rate = *rates.get(sample_rate_index)?;

        let padding = (bytes[2] >> 1) & 0b1 == 1;

        let channel_mode = match bytes[3] >> 6 {
            0b00 => ChannelMode::Stereo,
            0b01 => ChannelMode::JointStereo,
            0b10 => ChannelMode::DualChannel,
            _ => ChannelMode::Mono,
        };

        Some(Self {
            version,
            layer,
            bit_rate,
            sample_rate,
            padding,
            crc_protected,
            channel_mode,
        })
    }

    /// Number of PCM samples (per channel) encoded in one frame.
    pub fn sample_count(&self) -> u32 {
        match (self.layer, self.version) {
            (MpegLayer::I, _) => 384,
            (MpegLayer::II, _) => 1152,
            (MpegLayer::III, MpegVersion::V1) => 1152,
            (MpegLayer::III, _) => 576,
        }
    }

    /// Total frame length in bytes, header included.
    pub fn frame_len(&self) -> usize {
        let padding = u32::from(self.padding);
        let len = match self.layer {
            // Layer I counts in 4 byte slots.
            MpegLayer::I => (12 * self.bit_rate / self.sample_rate + padding) * 4,
            _ => self.sample_count() / 8 * self.bit_rate / self.sample_rate + padding,
        };
        len as usize
    }

    /// Size of the layer III side information block that follows the header.
    ///
    /// The four layer III cases (MPEG 1 vs. MPEG 2/2.5, mono vs. the rest)
    /// are the whole table; other layers carry no side information.
    pub fn side_info_size(&self) -> usize {
        if self.layer != MpegLayer::III {
            return 0;
        }

        let mono = self.channel_mode == ChannelMode::Mono;
        match (self.version, mono) {
            (MpegVersion::V1, true) => 17,
            (MpegVersion::V1, false) => 32,
            (_, true) => 9,
            (_, false) => 17,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mpeg1_layer3_stereo_128k() {
        let header = FrameHeader::parse([0xFF, 0xFB, 0x90, 0x00]).unwrap();

        assert_eq!(header.version, MpegVersion::V1);
        assert_eq!(header.layer, MpegLayer::III);
        assert_eq!(header.bit_rate, 128_000);
        assert_eq!(header.sample_rate, 44100);
        assert!(!header.padding);
        assert!(!header.crc_protected);
        assert_eq!(header.channel_mode, ChannelMode::Stereo);
        assert_eq!(header.sample_count(), 1152);
        assert_eq!(header.frame_len(), 417);
        assert_eq!(header.side_info_size(), 32);
    }

    #[test]
    fn padding_adds_one_byte() {
        let header = FrameHeader::parse([0xFF, 0xFB, 0x92, 0x00]).unwrap();
        assert_eq!(header.frame_len(), 418);
    }

    #[test]
    fn mpeg2_layer3_mono() {
        // MPEG 2, layer III, 64 kbit/s, 22050 Hz, mono
        let header = FrameHeader::parse([0xFF, 0xF3, 0x80, 0xC0]).unwrap();

        assert_eq!(header.version, MpegVersion::V2);
        assert_eq!(header.bit_rate, 64_000);
        assert_eq!(header.sample_rate, 22050);
        assert_eq!(header.sample_count(), 576);
        assert_eq!(header.frame_len(), 208);
        assert_eq!(header.side_info_size(), 9);
    }

    #[test]
    fn layer1_uses_slots() {
        // MPEG 1, layer I, 32 kbit/s, 48000 Hz
        let header = FrameHeader::parse([0xFF, 0xFF, 0x14, 0x00]).unwrap();

        assert_eq!(header.layer, MpegLayer::I);
        assert_eq!(header.sample_count(), 384);
        assert_eq!(header.frame_len(), 32);
        assert_eq!(header.side_info_size(), 0);
    }

    #[test]
    fn rejects_invalid_headers() {
        // no sync
        assert!(FrameHeader::parse([0xFE, 0xFB, 0x90, 0x00]).is_none());
        // reserved version
        assert!(FrameHeader::parse([0xFF, 0xEB, 0x90, 0x00]).is_none());
        // reserved layer
        assert!(FrameHeader::parse([0xFF, 0xF9, 0x90, 0x00]).is_none());
        // free format
        assert!(FrameHeader::parse([0xFF, 0xFB, 0x00, 0x00]).is_none());
        // bad bit rate
        assert!(FrameHeader::parse([0xFF, 0xFB, 0xF0, 0x00]).is_none());
        // reserved sample rate
        assert!(FrameHeader::parse([0xFF, 0xFB, 0x9C, 0x00]).is_none());
    }
}
