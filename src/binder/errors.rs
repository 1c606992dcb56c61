//! binder/errors.rs
//!
//! Error and warning types for the binding pipeline.
//!
//! Two kinds of conditions, kept apart by type:
//! - fatal: [`BindError`] (wrapping a [`StageError`]) aborts the run
//! - soft: [`TagWarning`] is only handed to visitors and never aborts

use std::io;

use thiserror::Error;

use super::stage::Stage;
use crate::tags::InvalidFrameId;

/// Top-level error returned from a bind run.
#[derive(Error, Debug)]
pub enum BindError {
    /// A supplied option is not a [`BindOption`](super::BindOption).
    #[error("unusable option at position {index}")]
    UnusableOption { index: usize },

    /// The run was cancelled through a [`CancelHandle`](super::CancelHandle).
    #[error("binding was cancelled")]
    Cancelled,

    /// A processor failed.
    #[error("stage '{stage}' failed while {action}: {source}")]
    StageFailed {
        stage: Stage,
        action: String,
        #[source]
        source: StageError,
    },
}

impl BindError {
    pub fn stage_failed(stage: Stage, action: impl Into<String>, source: StageError) -> Self {
        match source {
            StageError::Cancelled => Self::Cancelled,
            source => Self::StageFailed {
                stage,
                action: action.into(),
                source,
            },
        }
    }
}

/// Error from a single processor.
#[derive(Error, Debug)]
pub enum StageError {
    /// Reading, writing or seeking a stream failed.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// An inline metadata block of an input could not be decoded.
    #[error("invalid metadata in input #{index}: {source}")]
    Metadata {
        index: usize,
        #[source]
        source: id3::Error,
    },

    /// The outgoing tag could not be serialized.
    #[error("can not write metadata: {0}")]
    Serialize(#[source] id3::Error),

    /// Copy-from-template points past the inputs.
    #[error("template index {index} is out of range ({count} inputs)")]
    TemplateOutOfRange { index: usize, count: usize },

    /// A processor tried to add an entry under an id ID3v2.4 can't store.
    #[error(transparent)]
    InvalidFrameId(#[from] InvalidFrameId),

    #[error("cancelled")]
    Cancelled,
}

impl StageError {
    /// Adapter for `map_err`: `.map_err(StageError::io("seeking input"))`.
    pub fn io(operation: impl Into<String>) -> impl FnOnce(io::Error) -> Self {
        let operation = operation.into();
        move |source| Self::Io { operation, source }
    }
}

pub type StageResult<T> = Result<T, StageError>;

/// Soft condition reported to visitors. Never turned into an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagWarning {
    /// The tag id is not well-known; the value is written anyway.
    #[error("tag '{id}' is not well-known")]
    NonStandard { id: String },

    /// The description lookup itself failed.
    #[error("can not resolve tag '{id}': {reason}")]
    Unresolvable { id: String, reason: String },

    /// The id can't be written to an ID3v2.4 tag; the entry is skipped.
    #[error("'{id}' is not a valid frame id, skipping")]
    InvalidId { id: String },

    /// The copy template has no tags at all.
    #[error("no tags in template input #{index}")]
    NoTagsInTemplate { index: usize },

    /// The entry is deliberately not copied from the template.
    #[error("ignoring tag '{id}' for copying")]
    SkipCopying { id: String },

    /// The input was excluded from the chapter list.
    #[error("input #{index} is not a chapter")]
    ChapterSkipped { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failure_carries_context() {
        let err = BindError::stage_failed(
            Stage::Bind,
            "binding",
            StageError::Io {
                operation: "seeking input #1".to_string(),
                source: io::Error::other("disk gone"),
            },
        );

        assert_eq!(
            err.to_string(),
            "stage 'Bind' failed while binding: I/O error while seeking input #1: disk gone"
        );
    }

    #[test]
    fn invalid_frame_id_message_passes_through() {
        let err = StageError::from(InvalidFrameId("TT2".to_string()));
        assert_eq!(err.to_string(), "'TT2' is not an ID3v2.4 frame id");
    }

    #[test]
    fn cancelled_processor_surfaces_as_cancelled_run() {
        let err = BindError::stage_failed(Stage::Bind, "binding", StageError::Cancelled);
        assert!(matches!(err, BindError::Cancelled));
    }
}
