//! binder/tagging.rs
//!
//! Metadata processors that work on the outgoing tag:
//! - [`copy_from`]: copy a captured input tag as the starting point
//! - [`apply_text`]: set / replace / delete explicit text tags
//! - [`cover`]: install the front cover picture

use std::collections::BTreeMap;
use std::io::Read;

use super::errors::{StageError, StageResult, TagWarning};
use super::job::Job;
use crate::tags::{TAG_PICTURE, TAG_TRACK, TagValue, is_valid_frame_id};

pub(crate) const COPY_LABEL: &str = "copying metadata";
pub(crate) const APPLY_LABEL: &str = "applying metadata";
pub(crate) const COVER_LABEL: &str = "adding cover";

const COVER_DESCRIPTION: &str = "Front cover";

pub type TextTransform<'o> =
    Box<dyn FnOnce(&BTreeMap<String, String>) -> BTreeMap<String, String> + 'o>;

/// Copy everything captured from input `index` into the outgoing tag, except:
/// - chapter markers / table of contents (they describe the original file)
/// - the track position (`TRCK`), which changes once files are bound
///
/// An empty template is reported as a warning, not an error.
pub(crate) fn copy_from(job: &mut Job<'_>, index: usize) -> StageResult<()> {
    let count = job.captured.len();
    let template = job
        .captured
        .get(index)
        .ok_or(StageError::TemplateOutOfRange { index, count })?;

    if template.is_empty() {
        (job.visitors.tag_copy)("", "", Some(&TagWarning::NoTagsInTemplate { index }));
        return Ok(());
    }

    for frame in template.frames() {
        let id = frame.id();
        let value = TagValue::of(frame);

        let skip = matches!(value, TagValue::Chapter(_) | TagValue::ChapterToc { .. })
            || id == TAG_TRACK;
        if skip {
            let warning = TagWarning::SkipCopying { id: id.to_string() };
            (job.visitors.tag_copy)(id, "", Some(&warning));
            continue;
        }

        if matches!(value, TagValue::Text(_) | TagValue::Picture { .. }) {
            (job.visitors.tag_copy)(id, &value.describe(), None);
        }

        job.tag.add_frame(frame.clone());
    }

    Ok(())
}

/// Apply the text tags returned by `transform`.
///
/// `transform` sees the current text view of the outgoing tag, which lets the
/// caller derive defaults only where nothing was copied.
/// Per returned entry:
/// - empty value -> the tag is removed
/// - otherwise -> the tag is set (replacing any previous value)
/// - an id the resolver doesn't know is still applied, with a warning
/// - an id that isn't a v2.4 frame id (`MYTAG`, `TT2`) is skipped, with a warning
pub(crate) fn apply_text(job: &mut Job<'_>, transform: TextTransform<'_>) -> StageResult<()> {
    let desired = transform(&job.tag.texts());

    for (id, value) in desired {
        if !is_valid_frame_id(&id) {
            let warning = TagWarning::InvalidId { id: id.clone() };
            (job.visitors.tag_apply)(&id, &value, Some(&warning));
            continue;
        }

        let warning = job.resolver.description_for(&id).err();

        if value.is_empty() {
            job.tag.remove(&id);
        } else {
            job.tag.set_text(&id, value.as_str())?;
        }

        (job.visitors.tag_apply)(&id, &value, warning.as_ref());
    }

    Ok(())
}

/// Read the whole picture and make it the one and only cover.
pub(crate) fn cover(job: &mut Job<'_>, mime_type: &str, reader: &mut dyn Read) -> StageResult<()> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(StageError::io("reading the cover"))?;

    job.tag.remove(TAG_PICTURE);
    job.tag.insert(
        TAG_PICTURE,
        TagValue::Picture {
            mime_type: mime_type.to_string(),
            description: COVER_DESCRIPTION.to_string(),
            data,
        },
    )?;

    (job.visitors.tag_apply)(TAG_PICTURE, mime_type, None);
    Ok(())
}
