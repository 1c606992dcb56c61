//! binder/chapters.rs
//!
//! Chapter construction from per-input playback durations.

use std::time::Duration;

use super::errors::{StageResult, TagWarning};
use super::job::Job;
use crate::tags::{ChapterMarker, TAG_CHAPTER, TAG_CHAPTER_TOC, TagValue, format_timestamp};

pub(crate) const CHAPTERS_LABEL: &str = "building chapters";

const TOC_ELEMENT_ID: &str = "toc";

/// Decides per input: `Some(title)` makes it a chapter, `None` skips it.
/// Arguments are (input index, ordinal of the next chapter, starting at 1).
pub type ChapterPredicate<'o> = Box<dyn FnMut(usize, usize) -> Option<String> + 'o>;

/// One chapter per included input, back to back, plus a table of contents.
///
/// Offsets advance over every input, included or not: a skipped filler track
/// still pushes the following chapters back by its own length.
pub(crate) fn build(job: &mut Job<'_>, mut predicate: ChapterPredicate<'_>) -> StageResult<()> {
    let mut start = Duration::ZERO;
    let mut ordinal = 1usize;
    let mut elements = Vec::new();

    for (index, duration) in job.durations.iter().copied().enumerate() {
        let end = start + duration;

        match predicate(index, ordinal) {
            Some(title) => {
                let element_id = format!("chp{ordinal}");
                let range = format!(
                    "Chapter {ordinal}: {} - {}",
                    format_timestamp(start),
                    format_timestamp(end)
                );
                (job.visitors.tag_apply)(&range, &title, None);

                job.tag.insert(
                    TAG_CHAPTER,
                    TagValue::Chapter(ChapterMarker {
                        element_id: element_id.clone(),
                        start,
                        end,
                        title: Some(title),
                    }),
                )?;
                elements.push(element_id);
                ordinal += 1;
            }
            None => {
                let warning = TagWarning::ChapterSkipped { index };
                (job.visitors.tag_apply)(TAG_CHAPTER, "", Some(&warning));
            }
        }

        start = end;
    }

    if !elements.is_empty() {
        tracing::debug!(chapters = elements.len(), "chapter table built");
        job.tag.insert(
            TAG_CHAPTER_TOC,
            TagValue::ChapterToc {
                element_id: TOC_ELEMENT_ID.to_string(),
                elements,
            },
        )?;
    }

    Ok(())
}
