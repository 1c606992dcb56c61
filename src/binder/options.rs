//! binder/options.rs
//!
//! Configuration units for a bind run.
//!
//! Every option targets one [`Stage`] and carries an action that is applied to
//! the [`Job`] when that stage runs. Options are built with the free functions
//! in this module (or [`BindOption::custom`]) and consumed by
//! [`Binder::bind`](super::Binder::bind).

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use super::bind;
use super::chapters::{self, CHAPTERS_LABEL, ChapterPredicate};
use super::errors::{StageResult, TagWarning};
use super::job::{BindVisitor, Job, MetadataVisitor, StageVisitor, TagVisitor};
use super::stage::Stage;
use super::tagging::{self, APPLY_LABEL, COPY_LABEL, COVER_LABEL, TextTransform};

type CustomProcessor<'o> = Box<dyn for<'j> FnOnce(&mut Job<'j>) -> StageResult<()> + 'o>;

pub(crate) enum Action<'o> {
    StageVisitor(StageVisitor<'o>),
    BindVisitor(BindVisitor<'o>),
    MetadataVisitor(MetadataVisitor<'o>),
    TagCopyVisitor(TagVisitor<'o>),
    TagApplyVisitor(TagVisitor<'o>),
    CopyMetadata(usize),
    ApplyText(TextTransform<'o>),
    Cover {
        mime_type: String,
        reader: Box<dyn Read + 'o>,
    },
    Chapters(ChapterPredicate<'o>),
    Bind,
    WriteMetadata,
    Combine,
    Custom(CustomProcessor<'o>),
}

impl<'o> Action<'o> {
    pub(crate) fn run<'j>(self, job: &mut Job<'j>) -> StageResult<()>
    where
        'o: 'j,
    {
        match self {
            Action::StageVisitor(v) => job.visitors.stage = v,
            Action::BindVisitor(v) => job.visitors.bind = v,
            Action::MetadataVisitor(v) => job.visitors.metadata = v,
            Action::TagCopyVisitor(v) => job.visitors.tag_copy = v,
            Action::TagApplyVisitor(v) => job.visitors.tag_apply = v,
            Action::CopyMetadata(index) => return tagging::copy_from(job, index),
            Action::ApplyText(transform) => return tagging::apply_text(job, transform),
            Action::Cover {
                mime_type,
                mut reader,
            } => return tagging::cover(job, &mime_type, &mut *reader),
            Action::Chapters(predicate) => return chapters::build(job, predicate),
            Action::Bind => return bind::bind(job),
            Action::WriteMetadata => return bind::write_metadata(job),
            Action::Combine => return bind::combine(job),
            Action::Custom(processor) => return processor(job),
        }
        Ok(())
    }
}

/// One configuration unit: a stage, a human-readable action label, and what
/// to do to the job when the stage runs.
pub struct BindOption<'o> {
    pub(crate) stage: Stage,
    pub(crate) label: String,
    pub(crate) action: Action<'o>,
}

impl<'o> BindOption<'o> {
    pub(crate) fn new(stage: Stage, label: impl Into<String>, action: Action<'o>) -> Self {
        Self {
            stage,
            label: label.into(),
            action,
        }
    }

    /// An option running an arbitrary processor in `stage`.
    ///
    /// Processors of the same stage run in the order they were supplied.
    pub fn custom<F>(stage: Stage, label: impl Into<String>, processor: F) -> Self
    where
        F: for<'j> FnOnce(&mut Job<'j>) -> StageResult<()> + 'o,
    {
        Self::new(stage, label, Action::Custom(Box::new(processor)))
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// The processors every run ends with, in this order.
    pub(crate) fn fixed() -> [BindOption<'o>; 3] {
        [
            Self::new(Stage::Bind, bind::BIND_LABEL, Action::Bind),
            Self::new(
                Stage::WriteMetadata,
                bind::WRITE_METADATA_LABEL,
                Action::WriteMetadata,
            ),
            Self::new(
                Stage::CombineAudioAndMetadata,
                bind::COMBINE_LABEL,
                Action::Combine,
            ),
        ]
    }
}

impl fmt::Debug for BindOption<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindOption")
            .field("stage", &self.stage)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Called with (stage, action label) before every processor after Init.
pub fn stage_visitor<'o>(visitor: impl FnMut(Stage, &str) + 'o) -> BindOption<'o> {
    BindOption::new(
        Stage::Init,
        "installing stage visitor",
        Action::StageVisitor(Box::new(visitor)),
    )
}

/// Called with the source index before each source is scanned.
pub fn bind_visitor<'o>(visitor: impl FnMut(usize) + 'o) -> BindOption<'o> {
    BindOption::new(
        Stage::Init,
        "installing bind visitor",
        Action::BindVisitor(Box::new(visitor)),
    )
}

/// Called after each source is scanned, with the text tags found in it.
pub fn metadata_visitor<'o>(
    visitor: impl FnMut(usize, &BTreeMap<String, String>) + 'o,
) -> BindOption<'o> {
    BindOption::new(
        Stage::Init,
        "installing metadata visitor",
        Action::MetadataVisitor(Box::new(visitor)),
    )
}

pub fn tag_copy_visitor<'o>(
    visitor: impl FnMut(&str, &str, Option<&TagWarning>) + 'o,
) -> BindOption<'o> {
    BindOption::new(
        Stage::Init,
        "installing tag copy visitor",
        Action::TagCopyVisitor(Box::new(visitor)),
    )
}

/// Also receives cover art and chapter notifications.
pub fn tag_apply_visitor<'o>(
    visitor: impl FnMut(&str, &str, Option<&TagWarning>) + 'o,
) -> BindOption<'o> {
    BindOption::new(
        Stage::Init,
        "installing tag apply visitor",
        Action::TagApplyVisitor(Box::new(visitor)),
    )
}

/// Start the outgoing tag from what was captured in source `index`.
pub fn copy_metadata_from(index: usize) -> BindOption<'static> {
    BindOption::new(
        Stage::CopyMetadata,
        COPY_LABEL,
        Action::CopyMetadata(index),
    )
}

/// Apply text tags computed from the current text view of the outgoing tag.
///
/// An empty value deletes the tag.
pub fn apply_text_metadata<'o>(
    transform: impl FnOnce(&BTreeMap<String, String>) -> BTreeMap<String, String> + 'o,
) -> BindOption<'o> {
    BindOption::new(
        Stage::ApplyMetadata,
        APPLY_LABEL,
        Action::ApplyText(Box::new(transform)),
    )
}

/// Apply a fixed set of text tags, e.g. `[("TIT2", "Combined")]`.
pub fn apply_text_tags<I, K, V>(tags: I) -> BindOption<'static>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let tags: BTreeMap<String, String> = tags
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    apply_text_metadata(move |_| tags)
}

/// Use the image read from `reader` as the front cover, replacing any other
/// picture. The reader is drained when the stage runs.
pub fn cover<'o>(mime_type: impl Into<String>, reader: impl Read + 'o) -> BindOption<'o> {
    BindOption::new(
        Stage::ApplyMetadata,
        COVER_LABEL,
        Action::Cover {
            mime_type: mime_type.into(),
            reader: Box::new(reader),
        },
    )
}

/// Build one chapter per source the predicate accepts.
///
/// The predicate gets (source index, ordinal of the next chapter) and returns
/// the chapter title, or `None` to leave the source out.
pub fn chapters<'o>(predicate: impl FnMut(usize, usize) -> Option<String> + 'o) -> BindOption<'o> {
    BindOption::new(
        Stage::BuildChapters,
        CHAPTERS_LABEL,
        Action::Chapters(Box::new(predicate)),
    )
}
