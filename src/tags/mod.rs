//! tags/mod.rs
//!
//! The in-memory ID3v2 tag used for both the per-input captured metadata and
//! the single tag written in front of the bound audio.
//! Public API:
//! - [`Metadata`]: add/replace, delete, typed and text views, serialization
//! - [`TagValue`]: the typed view of one entry
//! - [`TagResolver`] / [`V24Resolver`]: "is this a well-known tag id?"
//!
//! Storage is an `id3::Tag`, so anything an inline block contains survives a
//! copy, even frame kinds we don't model (`TagValue::Other`).

mod resolver;
mod util;

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::time::Duration;

use id3::frame::{
    Chapter, Comment, Content, ExtendedLink, ExtendedText, Lyrics, Picture, PictureType,
    TableOfContents, Unknown,
};
use id3::{Frame, Tag, TagLike, Version};
use thiserror::Error;

pub use resolver::{TagResolver, V24Resolver};
pub use util::format_timestamp;

pub const TAG_TITLE: &str = "TIT2";
pub const TAG_TRACK: &str = "TRCK";
pub const TAG_PICTURE: &str = "APIC";
pub const TAG_CHAPTER: &str = "CHAP";
pub const TAG_CHAPTER_TOC: &str = "CTOC";

/// Offsets in CHAP frames are "not used" when all bits are set.
const IGNORED_OFFSET: u32 = u32::MAX;

/// Language of comment / lyrics frames built from a plain value.
const DEFAULT_LANG: &str = "eng";

/// Text encoding byte for UTF-8 bodies of frames the `id3` crate doesn't model.
const ENCODING_UTF8: u8 = 0x03;

/// A frame id that can't appear in an ID3v2.4 tag.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not an ID3v2.4 frame id")]
pub struct InvalidFrameId(pub String);

/// Four characters, `A-Z` / `0-9`, starting with a letter.
///
/// Three-character (ID3v2.2) ids are rejected: the `id3` crate would silently
/// map them to a different v2.3 id.
pub fn is_valid_frame_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 4
        && bytes[0].is_ascii_uppercase()
        && bytes
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

fn check_id(id: &str) -> Result<(), InvalidFrameId> {
    if is_valid_frame_id(id) {
        Ok(())
    } else {
        Err(InvalidFrameId(id.to_string()))
    }
}

/// Content for a frame set from one plain string value.
/// - `T***` -> text, `TXXX` -> user text without description
/// - `W***` -> link, `WXXX` -> user link without description
/// - `COMM` / `USLT` -> comment / lyrics in `DEFAULT_LANG`
/// - anything else -> raw UTF-8 body, written as is
fn content_for(id: &str, value: String) -> Content {
    match id {
        "TXXX" => Content::ExtendedText(ExtendedText {
            description: String::new(),
            value,
        }),
        "WXXX" => Content::ExtendedLink(ExtendedLink {
            description: String::new(),
            link: value,
        }),
        "COMM" => Content::Comment(Comment {
            lang: DEFAULT_LANG.to_string(),
            description: String::new(),
            text: value,
        }),
        "USLT" => Content::Lyrics(Lyrics {
            lang: DEFAULT_LANG.to_string(),
            description: String::new(),
            text: value,
        }),
        _ if id.starts_with('T') => Content::Text(value),
        _ if id.starts_with('W') => Content::Link(value),
        _ => {
            let mut data = vec![ENCODING_UTF8];
            data.extend_from_slice(value.as_bytes());
            Content::Unknown(Unknown {
                data,
                version: Version::Id3v24,
            })
        }
    }
}

/// One chapter marker: a named time range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterMarker {
    pub element_id: String,
    pub start: Duration,
    pub end: Duration,
    pub title: Option<String>,
}

/// Typed view of one tag entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    Picture {
        mime_type: String,
        description: String,
        data: Vec<u8>,
    },
    Chapter(ChapterMarker),
    ChapterToc {
        element_id: String,
        elements: Vec<String>,
    },
    /// A frame kind we carry along but don't interpret (comments, lyrics, ...).
    Other,
}

impl TagValue {
    pub(crate) fn of(frame: &Frame) -> Self {
        Self::from_content(frame.content())
    }

    fn from_content(content: &Content) -> Self {
        match content {
            Content::Text(s) => TagValue::Text(s.clone()),
            Content::Picture(p) => TagValue::Picture {
                mime_type: p.mime_type.clone(),
                description: p.description.clone(),
                data: p.data.clone(),
            },
            Content::Chapter(c) => TagValue::Chapter(ChapterMarker {
                element_id: c.element_id.clone(),
                start: Duration::from_millis(u64::from(c.start_time)),
                end: Duration::from_millis(u64::from(c.end_time)),
                title: c.frames.iter().find_map(|f| match f.content() {
                    Content::Text(s) if f.id() == TAG_TITLE => Some(s.clone()),
                    _ => None,
                }),
            }),
            Content::TableOfContents(t) => TagValue::ChapterToc {
                element_id: t.element_id.clone(),
                elements: t.elements.clone(),
            },
            _ => TagValue::Other,
        }
    }

    fn into_content(self) -> Option<Content> {
        let content = match self {
            TagValue::Text(s) => Content::Text(s),
            TagValue::Picture {
                mime_type,
                description,
                data,
            } => Content::Picture(Picture {
                mime_type,
                picture_type: PictureType::CoverFront,
                description,
                data,
            }),
            TagValue::Chapter(marker) => Content::Chapter(Chapter {
                element_id: marker.element_id,
                start_time: util::duration_to_millis(marker.start),
                end_time: util::duration_to_millis(marker.end),
                start_offset: IGNORED_OFFSET,
                end_offset: IGNORED_OFFSET,
                frames: marker
                    .title
                    .map(|title| vec![Frame::text(TAG_TITLE, title)])
                    .unwrap_or_default(),
            }),
            TagValue::ChapterToc {
                element_id,
                elements,
            } => Content::TableOfContents(TableOfContents {
                element_id,
                top_level: true,
                ordered: true,
                elements,
                frames: Vec::new(),
            }),
            TagValue::Other => return None,
        };
        Some(content)
    }

    /// Short human-readable rendering, used when reporting to visitors.
    pub fn describe(&self) -> String {
        match self {
            TagValue::Text(s) => s.clone(),
            TagValue::Picture { mime_type, .. } => format!("Image of type '{mime_type}'"),
            TagValue::Chapter(marker) => marker.title.clone().unwrap_or_default(),
            TagValue::ChapterToc { elements, .. } => elements.join(", "),
            TagValue::Other => String::new(),
        }
    }
}

/// An ID3v2 tag under construction (or captured from an input).
#[derive(Debug, Clone)]
pub struct Metadata {
    tag: Tag,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self { tag: Tag::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.tag.frames().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.tag.frames().count()
    }

    /// Add an entry, replacing the conflicting one if present.
    ///
    /// Conflicts follow the `id3` crate: same frame id, and for chapters the
    /// same element id, for pictures the same picture type.
    /// `TagValue::Other` can't be built from scratch and is ignored.
    pub fn insert(&mut self, id: &str, value: TagValue) -> Result<(), InvalidFrameId> {
        check_id(id)?;
        if let Some(content) = value.into_content() {
            self.tag.add_frame(Frame::with_content(id, content));
        }
        Ok(())
    }

    /// Set `id` to a single value, replacing every entry with that id.
    ///
    /// The frame kind follows the id (see `content_for`), so non-text ids
    /// like `COMM` or private ones like `XYZW` still serialize.
    pub fn set_text(&mut self, id: &str, text: impl Into<String>) -> Result<(), InvalidFrameId> {
        check_id(id)?;
        self.tag.remove(id);
        self.tag
            .add_frame(Frame::with_content(id, content_for(id, text.into())));
        Ok(())
    }

    /// Remove every entry with this id. Returns true if anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        !self.tag.remove(id).is_empty()
    }

    pub fn get(&self, id: &str) -> Option<TagValue> {
        self.tag.get(id).map(|f| TagValue::from_content(f.content()))
    }

    /// First plain text value for `id`.
    pub fn text(&self, id: &str) -> Option<&str> {
        match self.tag.get(id)?.content() {
            Content::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// All plain text entries: id -> value.
    pub fn texts(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();

        for frame in self.tag.frames() {
            if let Content::Text(s) = frame.content() {
                out.entry(frame.id().to_string()).or_insert_with(|| s.clone());
            }
        }

        out
    }

    /// Typed view over every entry, in tag order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, TagValue)> + '_ {
        self.tag
            .frames()
            .map(|f| (f.id(), TagValue::from_content(f.content())))
    }

    pub fn has_picture(&self) -> bool {
        self.tag.frames().any(|f| f.id() == TAG_PICTURE)
    }

    /// Parse a raw inline ID3v2 block and merge its frames into this tag.
    ///
    /// Frames are applied in block order, so a block that defines an id
    /// twice leaves the last definition.
    pub fn merge_block(&mut self, raw: &[u8]) -> Result<(), id3::Error> {
        let block = Tag::read_from2(Cursor::new(raw))?;
        for frame in block.frames() {
            self.tag.add_frame(frame.clone());
        }
        Ok(())
    }

    /// Serialize as ID3v2.4. An empty tag writes nothing.
    pub fn write_to(&self, writer: impl Write) -> Result<(), id3::Error> {
        if self.is_empty() {
            return Ok(());
        }
        self.tag.write_to(writer, Version::Id3v24)
    }

    pub(crate) fn frames(&self) -> impl Iterator<Item = &Frame> + '_ {
        self.tag.frames()
    }

    pub(crate) fn add_frame(&mut self, frame: Frame) {
        self.tag.add_frame(frame);
    }
}
