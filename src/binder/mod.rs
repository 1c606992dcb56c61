//! binder/mod.rs
//!
//! The binding engine.
//! Public API:
//! - [`Binder`]: runs one bind (sources -> single output with a merged tag)
//! - option constructors ([`stage_visitor`], [`copy_metadata_from`], [`chapters`], ...)
//! - [`BindError`] / [`StageError`] for failures, [`TagWarning`] for soft conditions
//!
//! A run is a sequence of processors grouped by [`Stage`]. Stages run in
//! their declared order; within a stage, processors run in the order the
//! options were supplied. Bind, WriteMetadata and CombineAudioAndMetadata
//! always get one fixed processor each, after any user option of that stage.

mod bind;
mod chapters;
mod errors;
mod header;
mod job;
mod options;
mod stage;
mod tagging;

use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;

pub use chapters::ChapterPredicate;
pub use errors::{BindError, StageError, StageResult, TagWarning};
pub use header::{SUMMARY_FRAME_LEN, SummaryStats, summary_frame};
pub use job::{
    BindVisitor, CancelHandle, Input, Job, MetadataVisitor, ReadSeek, ReadWriteSeek,
    StageVisitor, TagVisitor, Visitors,
};
pub use options::{
    BindOption, apply_text_metadata, apply_text_tags, bind_visitor, chapters, copy_metadata_from,
    cover, metadata_visitor, stage_visitor, tag_apply_visitor, tag_copy_visitor,
};
pub use stage::Stage;
pub use tagging::TextTransform;

use crate::mpeg::{MpegDecoder, ObjectDecoder};
use crate::tags::{TagResolver, V24Resolver};

/// Binds MPEG audio sources into one output.
///
/// A `Binder` holds no per-run state and may be reused; each call to
/// [`bind`](Self::bind) builds a fresh [`Job`].
pub struct Binder {
    resolver: Box<dyn TagResolver>,
    decoder: Box<dyn ObjectDecoder>,
    cancel: CancelHandle,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(V24Resolver::new())
    }
}

impl Binder {
    pub fn new(resolver: impl TagResolver + 'static) -> Self {
        Self {
            resolver: Box::new(resolver),
            decoder: Box::new(MpegDecoder),
            cancel: CancelHandle::new(),
        }
    }

    /// Replace the frame/tag decoder used to scan sources.
    pub fn with_decoder(mut self, decoder: impl ObjectDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Handle that cancels the current (or next) run from anywhere.
    ///
    /// The flag stays set until [`CancelHandle::reset`] is called.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Bind `inputs`, in order, into `output`.
    ///
    /// `scratch` holds the audio-only bytes until the tag has been written;
    /// it is expected to be empty. Nothing is written to `output` before the
    /// WriteMetadata stage, so a failing run leaves it untouched unless it
    /// fails while writing.
    pub fn bind<'j, 'o: 'j>(
        &'j self,
        output: &'j mut dyn Write,
        scratch: &'j mut dyn ReadWriteSeek,
        inputs: Vec<Input<'j>>,
        options: Vec<BindOption<'o>>,
    ) -> Result<(), BindError> {
        let mut job = Job::new(
            output,
            scratch,
            inputs,
            &*self.resolver,
            &*self.decoder,
            self.cancel.clone(),
        );

        let mut stages: BTreeMap<Stage, Vec<BindOption<'o>>> = BTreeMap::new();
        for option in options.into_iter().chain(BindOption::fixed()) {
            stages.entry(option.stage).or_default().push(option);
        }

        tracing::debug!(
            inputs = job.input_count(),
            processors = stages.values().map(Vec::len).sum::<usize>(),
            "starting bind"
        );

        for (stage, options) in stages {
            for BindOption { label, action, .. } in options {
                if job.cancel.is_cancelled() {
                    tracing::info!(%stage, "bind cancelled");
                    return Err(BindError::Cancelled);
                }

                if stage != Stage::Init {
                    (job.visitors.stage)(stage, &label);
                }
                tracing::debug!(%stage, action = %label, "running processor");

                action
                    .run(&mut job)
                    .map_err(|source| BindError::stage_failed(stage, label, source))?;
            }
        }

        tracing::info!(inputs = job.input_count(), "bind finished");
        Ok(())
    }

    /// Like [`bind`](Self::bind), for options collected as `Box<dyn Any>`.
    ///
    /// Every element must be a `BindOption<'static>`; otherwise the run fails
    /// with [`BindError::UnusableOption`] before anything is read or written.
    pub fn bind_any<'j>(
        &'j self,
        output: &'j mut dyn Write,
        scratch: &'j mut dyn ReadWriteSeek,
        inputs: Vec<Input<'j>>,
        options: Vec<Box<dyn Any>>,
    ) -> Result<(), BindError> {
        let options = options
            .into_iter()
            .enumerate()
            .map(|(index, option)| {
                option
                    .downcast::<BindOption<'static>>()
                    .map(|option| *option)
                    .map_err(|_| BindError::UnusableOption { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.bind(output, scratch, inputs, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;

    fn run(binder: &Binder, options: Vec<BindOption<'_>>) -> Result<Vec<u8>, BindError> {
        let mut output = Vec::new();
        let mut scratch = Cursor::new(Vec::new());
        binder.bind(&mut output, &mut scratch, Vec::new(), options)?;
        Ok(output)
    }

    #[test]
    fn stages_run_in_order_regardless_of_option_order() {
        let seen = RefCell::new(Vec::new());
        let binder = Binder::default();

        let options = vec![
            chapters(|_, _| None),
            BindOption::custom(Stage::CopyMetadata, "first copy", |_| Ok(())),
            stage_visitor(|stage, label| seen.borrow_mut().push((stage, label.to_string()))),
            BindOption::custom(Stage::CopyMetadata, "second copy", |_| Ok(())),
        ];
        run(&binder, options).unwrap();

        let seen = seen.into_inner();
        let stages: Vec<Stage> = seen.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            stages,
            vec![
                Stage::Bind,
                Stage::CopyMetadata,
                Stage::CopyMetadata,
                Stage::BuildChapters,
                Stage::WriteMetadata,
                Stage::CombineAudioAndMetadata,
            ]
        );
        assert_eq!(seen[1].1, "first copy");
        assert_eq!(seen[2].1, "second copy");
    }

    #[test]
    fn no_inputs_writes_only_the_summary_frame() {
        let output = run(&Binder::default(), Vec::new()).unwrap();
        assert_eq!(output.len(), SUMMARY_FRAME_LEN);
        assert_eq!(output, summary_frame(&SummaryStats::default()));
    }

    #[test]
    fn failing_processor_names_stage_and_action() {
        let err = run(
            &Binder::default(),
            vec![copy_metadata_from(3)],
        )
        .unwrap_err();

        match err {
            BindError::StageFailed { stage, action, source } => {
                assert_eq!(stage, Stage::CopyMetadata);
                assert_eq!(action, "copying metadata");
                assert!(matches!(
                    source,
                    StageError::TemplateOutOfRange { index: 3, count: 0 }
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let binder = Binder::default();
        binder.cancel_handle().cancel();

        let mut output = Vec::new();
        let mut scratch = Cursor::new(Vec::new());
        let err = binder
            .bind(&mut output, &mut scratch, Vec::new(), Vec::new())
            .unwrap_err();

        assert!(matches!(err, BindError::Cancelled));
        assert!(output.is_empty());
        assert!(scratch.into_inner().is_empty());

        binder.cancel_handle().reset();
        assert!(run(&binder, Vec::new()).is_ok());
    }

    #[test]
    fn cancel_from_a_processor_stops_the_run() {
        let binder = Binder::default();
        let handle = binder.cancel_handle();

        let err = run(
            &binder,
            vec![BindOption::custom(Stage::CopyMetadata, "cancel", move |_| {
                handle.cancel();
                Ok(())
            })],
        )
        .unwrap_err();

        assert!(matches!(err, BindError::Cancelled));
    }

    #[test]
    fn bind_any_rejects_foreign_options() {
        let binder = Binder::default();
        let mut output = Vec::new();
        let mut scratch = Cursor::new(Vec::new());

        let options: Vec<Box<dyn Any>> = vec![
            Box::new(copy_metadata_from(0)),
            Box::new("not an option"),
        ];
        let err = binder
            .bind_any(&mut output, &mut scratch, Vec::new(), options)
            .unwrap_err();

        assert!(matches!(err, BindError::UnusableOption { index: 1 }));
        assert!(output.is_empty());
    }

    #[test]
    fn bind_any_runs_valid_options() {
        let binder = Binder::default();
        let mut output = Vec::new();
        let mut scratch = Cursor::new(Vec::new());

        let options: Vec<Box<dyn Any>> = vec![Box::new(apply_text_tags([("TIT2", "Combined")]))];
        binder
            .bind_any(&mut output, &mut scratch, Vec::new(), options)
            .unwrap();

        let tag = id3::Tag::read_from2(Cursor::new(&output)).unwrap();
        assert_eq!(id3::TagLike::title(&tag), Some("Combined"));
    }
}
