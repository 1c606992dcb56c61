//! binder/bind.rs
//!
//! The fixed processors every run gets:
//! - [`bind`]: stream every input into the scratch area, capture metadata
//! - [`write_metadata`]: serialize the outgoing tag to the output
//! - [`combine`]: append the scratch audio to the output

use std::io::{self, Read, Seek, SeekFrom, Write};

use super::errors::{StageError, StageResult};
use super::header::{self, SUMMARY_FRAME_LEN, SummaryStats};
use super::job::Job;
use crate::mpeg::MpegObject;

pub(crate) const BIND_LABEL: &str = "binding";
pub(crate) const WRITE_METADATA_LABEL: &str = "writing metadata";
pub(crate) const COMBINE_LABEL: &str = "combining metadata and audio";

/// Scan all inputs once, in order.
///
/// Per input:
/// - a leading summary frame (Xing/Info/VBRI) is dropped, it only describes
///   that one file
/// - audio frames go to the scratch area, their duration to the input's total
/// - inline ID3v2 blocks are merged into the input's captured metadata
///
/// An input without frames is fine: zero duration, empty metadata.
pub(crate) fn bind(job: &mut Job<'_>) -> StageResult<()> {
    job.scratch
        .write_all(&[0u8; SUMMARY_FRAME_LEN])
        .map_err(StageError::io("writing the summary placeholder"))?;

    let mut stats = SummaryStats::default();
    let mut first_bitrate: Option<u32> = None;

    for index in 0..job.inputs.len() {
        job.check_cancelled()?;
        (job.visitors.bind)(index);

        let input = &mut job.inputs[index];
        // The same stream may back several inputs, so always start over.
        input
            .seek(SeekFrom::Start(0))
            .map_err(StageError::io(format!("seeking input #{index}")))?;

        let reader: &mut dyn Read = input;
        let mut objects = job.decoder.objects(reader);
        let mut leading_frame = true;
        let mut frames_in_input = 0u64;

        while let Some(object) = objects.next_object().map_err(|source| StageError::Io {
            operation: format!("reading input #{index}"),
            source,
        })? {
            match object {
                MpegObject::Frame(frame) => {
                    if std::mem::take(&mut leading_frame) && frame.is_summary_frame() {
                        continue;
                    }

                    let bit_rate = frame.bit_rate();
                    match first_bitrate {
                        None => first_bitrate = Some(bit_rate),
                        Some(first) if first != bit_rate => stats.multiple_bitrates = true,
                        Some(_) => {}
                    }

                    job.scratch
                        .write_all(frame.raw())
                        .map_err(StageError::io("writing audio"))?;

                    job.durations[index] += frame.duration();
                    stats.frames += 1;
                    stats.bytes += frame.raw().len() as u64;
                    frames_in_input += 1;
                }
                MpegObject::Tag(raw) => {
                    job.captured[index]
                        .merge_block(&raw)
                        .map_err(|source| StageError::Metadata { index, source })?;
                }
            }
        }

        tracing::debug!(
            index,
            frames = frames_in_input,
            duration_ms = job.durations[index].as_millis() as u64,
            "input scanned"
        );

        let texts = job.captured[index].texts();
        (job.visitors.metadata)(index, &texts);
    }

    header::reconcile(&mut *job.scratch, &stats)
        .map_err(StageError::io("writing the summary header"))?;

    tracing::info!(
        inputs = job.inputs.len(),
        frames = stats.frames,
        bytes = stats.bytes,
        multiple_bitrates = stats.multiple_bitrates,
        "audio bound"
    );

    Ok(())
}

pub(crate) fn write_metadata(job: &mut Job<'_>) -> StageResult<()> {
    job.tag
        .write_to(&mut *job.output)
        .map_err(StageError::Serialize)
}

pub(crate) fn combine(job: &mut Job<'_>) -> StageResult<()> {
    job.scratch
        .seek(SeekFrom::Start(0))
        .map_err(StageError::io("rewinding the audio"))?;

    let copied = io::copy(&mut *job.scratch, &mut *job.output)
        .map_err(StageError::io("copying audio to the output"))?;

    job.output
        .flush()
        .map_err(StageError::io("flushing the output"))?;

    tracing::debug!(bytes = copied, "audio appended");
    Ok(())
}
