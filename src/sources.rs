//! sources.rs
//!
//! Helpers for preparing the input list before a bind run:
//! - [`SharedSource`]: one opened stream usable in several input slots
//! - [`open_once`]: open a list of paths, opening repeated paths only once
//! - [`interlace`] / [`index_after_interlace`]: put a filler between sources
//!   and remap indices chosen before the filler was inserted

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Clonable `Read + Seek` handle over a single stream.
///
/// Clones share the stream and its position. The binder seeks every input
/// to its start before reading it, so a shared stream can appear several
/// times in one input list (a filler track between every chapter, say).
#[derive(Debug)]
pub struct SharedSource<R> {
    inner: Rc<RefCell<R>>,
}

impl<R> SharedSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Number of handles (this one included) sharing the stream.
    pub fn handles(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl<R> Clone for SharedSource<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Read> Read for SharedSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.borrow_mut().read(buf)
    }
}

impl<R: Seek> Seek for SharedSource<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.borrow_mut().seek(pos)
    }
}

/// Open every path, in order. A path listed more than once is opened once and
/// its handle shared between the slots.
pub fn open_once<P: AsRef<Path>>(paths: &[P]) -> io::Result<Vec<SharedSource<File>>> {
    let mut opened: HashMap<PathBuf, SharedSource<File>> = HashMap::new();
    let mut sources = Vec::with_capacity(paths.len());

    for path in paths {
        let path = path.as_ref();
        let source = match opened.get(path) {
            Some(source) => source.clone(),
            None => {
                let source = SharedSource::new(File::open(path)?);
                opened.insert(path.to_path_buf(), source.clone());
                source
            }
        };
        sources.push(source);
    }

    tracing::debug!(inputs = sources.len(), opened = opened.len(), "inputs opened");
    Ok(sources)
}

/// Put `filler` between every two consecutive items: `[a, b, c]` becomes
/// `[a, f, b, f, c]`. Lists shorter than two are returned as is.
pub fn interlace<T: Clone>(items: Vec<T>, filler: T) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }

    let mut out = Vec::with_capacity(items.len() * 2 - 1);
    let mut items = items.into_iter();
    out.extend(items.next());
    for item in items {
        out.push(filler.clone());
        out.push(item);
    }
    out
}

/// Where item `index` of the original list ended up after [`interlace`].
///
/// `interlaced_len` is the length of the interlaced list; a list of one (or
/// none) was not interlaced and keeps its indices.
pub fn index_after_interlace(interlaced_len: usize, index: usize) -> usize {
    if interlaced_len <= 1 {
        return index;
    }
    index * 2
}

/// True for the filler slots of an interlaced list.
pub fn is_filler_slot(interlaced: bool, index: usize) -> bool {
    interlaced && index % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    #[test]
    fn interlace_puts_filler_between_items() {
        assert_eq!(interlace(vec!["a", "b", "c"], "f"), vec!["a", "f", "b", "f", "c"]);
        assert_eq!(interlace(vec!["a", "b"], "f"), vec!["a", "f", "b"]);
    }

    #[test]
    fn interlace_leaves_short_lists_alone() {
        assert_eq!(interlace(vec!["a"], "f"), vec!["a"]);
        assert!(interlace(Vec::<&str>::new(), "f").is_empty());
    }

    #[test]
    fn index_follows_its_item() {
        let original = vec!["a", "b", "c"];
        let interlaced = interlace(original.clone(), "f");

        for (index, item) in original.iter().enumerate() {
            let moved = index_after_interlace(interlaced.len(), index);
            assert_eq!(interlaced[moved], *item);
            assert!(!is_filler_slot(true, moved));
        }
        assert_eq!(index_after_interlace(1, 0), 0);
    }

    #[test]
    fn filler_slots() {
        assert!(is_filler_slot(true, 1));
        assert!(!is_filler_slot(true, 2));
        assert!(!is_filler_slot(false, 1));
    }

    #[test]
    fn shared_handles_see_one_stream() {
        let mut a = SharedSource::new(Cursor::new(b"abcdef".to_vec()));
        let mut b = a.clone();
        assert_eq!(a.handles(), 2);

        let mut buf = [0u8; 2];
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
        b.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"cd");

        b.seek(SeekFrom::Start(0)).unwrap();
        a.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ab");
    }

    #[test]
    fn open_once_shares_repeated_paths() {
        let dir = tempfile::tempdir().unwrap();
        let track = dir.path().join("track.mp3");
        let filler = dir.path().join("filler.mp3");
        File::create(&track).unwrap().write_all(b"track").unwrap();
        File::create(&filler).unwrap().write_all(b"filler").unwrap();

        let paths = interlace(vec![track.clone(), track], filler);
        let sources = open_once(&paths).unwrap();

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].handles(), 2);
        assert_eq!(sources[1].handles(), 1);
    }

    #[test]
    fn open_once_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_once(&[dir.path().join("missing.mp3")]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
