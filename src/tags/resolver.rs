//! tags/resolver.rs
//! Maps tag ids to human-readable descriptions.
//!
//! Used to decide whether an explicitly applied tag is "well-known". An id
//! that doesn't resolve is still written; the caller just gets a warning.

use std::collections::HashMap;

use crate::binder::TagWarning;

pub trait TagResolver {
    /// Description for `id`, or the warning explaining why there is none.
    fn description_for(&self, id: &str) -> Result<String, TagWarning>;
}

/// Well-known ID3v2.4 frames: (id, description).
const V24_COMMON_IDS: &[(&str, &str)] = &[
    ("APIC", "Attached picture"),
    ("CHAP", "Chapters"),
    ("COMM", "Comments"),
    ("CTOC", "Table of contents"),
    ("POPM", "Popularimeter"),
    ("TALB", "Album/Movie/Show title"),
    ("TBPM", "BPM"),
    ("TCOM", "Composer"),
    ("TCON", "Content type"),
    ("TCOP", "Copyright message"),
    ("TDEN", "Encoding time"),
    ("TDLY", "Playlist delay"),
    ("TDOR", "Original release time"),
    ("TDRC", "Recording time"),
    ("TDRL", "Release time"),
    ("TDTG", "Tagging time"),
    ("TENC", "Encoded by"),
    ("TEXT", "Lyricist/Text writer"),
    ("TFLT", "File type"),
    ("TIPL", "Involved people list"),
    ("TIT1", "Content group description"),
    ("TIT2", "Title/Songname/Content description"),
    ("TIT3", "Subtitle/Description refinement"),
    ("TKEY", "Initial key"),
    ("TLAN", "Language"),
    ("TLEN", "Length"),
    ("TMCL", "Musician credits list"),
    ("TMED", "Media type"),
    ("TMOO", "Mood"),
    ("TOAL", "Original album/movie/show title"),
    ("TOFN", "Original filename"),
    ("TOLY", "Original lyricist/text writer"),
    ("TOPE", "Original artist/performer"),
    ("TOWN", "File owner/licensee"),
    ("TPE1", "Lead artist/Lead performer/Soloist/Performing group"),
    ("TPE2", "Band/Orchestra/Accompaniment"),
    ("TPE3", "Conductor/Performer refinement"),
    ("TPE4", "Interpreted, remixed, or otherwise modified by"),
    ("TPOS", "Part of a set"),
    ("TPRO", "Produced notice"),
    ("TPUB", "Publisher"),
    ("TRCK", "Track number/Position in set"),
    ("TRSN", "Internet radio station name"),
    ("TRSO", "Internet radio station owner"),
    ("TSOA", "Album sort order"),
    ("TSOP", "Performer sort order"),
    ("TSOT", "Title sort order"),
    ("TSRC", "ISRC (international standard recording code)"),
    ("TSSE", "Software/Hardware and settings used for encoding"),
    ("TSST", "Set subtitle"),
    ("TXXX", "User defined text information frame"),
    ("USLT", "Unsynchronised lyrics/text transcription"),
];

/// Resolver over the well-known ID3v2.4 frame ids.
#[derive(Debug, Clone)]
pub struct V24Resolver {
    known: HashMap<&'static str, &'static str>,
}

impl V24Resolver {
    pub fn new() -> Self {
        Self {
            known: V24_COMMON_IDS.iter().copied().collect(),
        }
    }
}

impl Default for V24Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TagResolver for V24Resolver {
    fn description_for(&self, id: &str) -> Result<String, TagWarning> {
        self.known
            .get(id)
            .map(|d| d.to_string())
            .ok_or_else(|| TagWarning::NonStandard { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_well_known_ids() {
        let resolver = V24Resolver::new();

        assert_eq!(
            resolver.description_for("TALB").unwrap(),
            "Album/Movie/Show title"
        );
        assert_eq!(
            resolver.description_for("TRCK").unwrap(),
            "Track number/Position in set"
        );
    }

    #[test]
    fn unknown_id_is_non_standard() {
        let resolver = V24Resolver::new();

        assert_eq!(
            resolver.description_for("XYZW"),
            Err(TagWarning::NonStandard {
                id: "XYZW".to_string()
            })
        );
    }
}
