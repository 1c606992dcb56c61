//! mp3bind
//!
//! # What this crate is
//! A library that binds (concatenates) MPEG audio files into one file without
//! re-encoding, and writes a single ID3v2.4 tag for the result.
//!
//! # How a bind works
//! Think "assembly line" with fixed stations, run strictly one after another:
//!
//! - `Init` = options install their callbacks (visitors)
//! - `Bind` = every source is scanned: frames go to a scratch area, inline
//!   tags are captured, playback time is summed per source
//! - `CopyMetadata` / `ApplyMetadata` / `BuildChapters` = the outgoing tag is
//!   assembled from captured tags, explicit values, cover art and chapters
//! - `WriteMetadata` + `CombineAudioAndMetadata` = tag first, then the audio
//!
//! The scratch area starts with a Xing/Info summary frame whose totals are
//! patched in once the last frame has been copied.
//!
//! # Layout
//! - [`mpeg`]: frame/tag scanner behind the `ObjectSource` / `ObjectDecoder` traits
//! - [`tags`]: the metadata model (an `id3::Tag` wrapper) and tag-id resolver
//! - [`binder`]: stages, options, the [`Binder`] itself
//! - [`sources`]: caller-side input preparation (shared handles, interlacing)
//!
//! # Not included
//! - Re-encoding or sample-rate conversion
//! - A command line front end
//! - Installing a `tracing` subscriber (that's the application's job)

pub mod binder;
pub mod mpeg;
pub mod sources;
pub mod tags;

pub use binder::{
    BindError, BindOption, Binder, CancelHandle, Stage, StageError, TagWarning,
    apply_text_metadata, apply_text_tags, bind_visitor, chapters, copy_metadata_from, cover,
    metadata_visitor, stage_visitor, tag_apply_visitor, tag_copy_visitor,
};
pub use tags::{InvalidFrameId, Metadata, TagValue};
