//! binder/job.rs
//!
//! The state threaded through one bind run.
//!
//! A `Job` lives exactly as long as one call to `Binder::bind` and is never
//! shared. Processors get `&mut Job` one at a time, in stage order.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::errors::{StageError, StageResult, TagWarning};
use super::stage::Stage;
use crate::mpeg::ObjectDecoder;
use crate::tags::{Metadata, TagResolver};

/// A readable, seekable input stream.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// The scratch area for audio-only bytes: written, patched, then read back.
pub trait ReadWriteSeek: Read + Write + Seek {}
impl<T: Read + Write + Seek + ?Sized> ReadWriteSeek for T {}

pub type Input<'a> = Box<dyn ReadSeek + 'a>;

pub type StageVisitor<'a> = Box<dyn FnMut(Stage, &str) + 'a>;
pub type BindVisitor<'a> = Box<dyn FnMut(usize) + 'a>;
pub type MetadataVisitor<'a> = Box<dyn FnMut(usize, &BTreeMap<String, String>) + 'a>;
pub type TagVisitor<'a> = Box<dyn FnMut(&str, &str, Option<&TagWarning>) + 'a>;

/// Callbacks for progress and soft warnings. All default to no-ops.
pub struct Visitors<'a> {
    /// (stage, action label) before every non-Init processor.
    pub stage: StageVisitor<'a>,
    /// Source index, before it is scanned.
    pub bind: BindVisitor<'a>,
    /// Source index + text view of its captured metadata, after it is scanned.
    pub metadata: MetadataVisitor<'a>,
    /// (tag id, value, warning) while copying from the template.
    pub tag_copy: TagVisitor<'a>,
    /// (tag id, value, warning) while applying tags, cover art and chapters.
    pub tag_apply: TagVisitor<'a>,
}

impl Default for Visitors<'_> {
    fn default() -> Self {
        Self {
            stage: Box::new(|_, _| {}),
            bind: Box::new(|_| {}),
            metadata: Box::new(|_, _| {}),
            tag_copy: Box::new(|_, _, _| {}),
            tag_apply: Box::new(|_, _, _| {}),
        }
    }
}

/// Shared cancellation flag.
///
/// Cancelling stops the run at the next processor or input boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the owner can run again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub struct Job<'a> {
    pub(crate) output: &'a mut dyn Write,
    pub(crate) scratch: &'a mut dyn ReadWriteSeek,
    pub(crate) inputs: Vec<Input<'a>>,

    pub(crate) resolver: &'a dyn TagResolver,
    pub(crate) decoder: &'a dyn ObjectDecoder,
    pub(crate) cancel: CancelHandle,

    /// The outgoing tag.
    pub(crate) tag: Metadata,
    /// Inline metadata captured per input.
    pub(crate) captured: Vec<Metadata>,
    /// Accumulated playback time per input.
    pub(crate) durations: Vec<Duration>,

    pub(crate) visitors: Visitors<'a>,
}

impl<'a> Job<'a> {
    pub(crate) fn new(
        output: &'a mut dyn Write,
        scratch: &'a mut dyn ReadWriteSeek,
        inputs: Vec<Input<'a>>,
        resolver: &'a dyn TagResolver,
        decoder: &'a dyn ObjectDecoder,
        cancel: CancelHandle,
    ) -> Self {
        let count = inputs.len();
        Self {
            output,
            scratch,
            inputs,
            resolver,
            decoder,
            cancel,
            tag: Metadata::new(),
            captured: vec![Metadata::new(); count],
            durations: vec![Duration::ZERO; count],
            visitors: Visitors::default(),
        }
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// The tag that will be written in front of the audio.
    pub fn metadata(&self) -> &Metadata {
        &self.tag
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.tag
    }

    /// Metadata captured from input `index` (empty before Bind has run).
    pub fn captured(&self, index: usize) -> Option<&Metadata> {
        self.captured.get(index)
    }

    /// Playback time per input (zero before Bind has run).
    pub fn durations(&self) -> &[Duration] {
        &self.durations
    }

    pub fn visitors_mut(&mut self) -> &mut Visitors<'a> {
        &mut self.visitors
    }

    pub(crate) fn check_cancelled(&self) -> StageResult<()> {
        if self.cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }
        Ok(())
    }
}
