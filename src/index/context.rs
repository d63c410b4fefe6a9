//! Index lifecycle coordination.
//!
//! One [`IndexContext`] owns an index root directory. It hands out shared
//! [`WordIndex`] handles, serializes builds so two callers can never build
//! the same book at once, and fans independent books out across a thread
//! pool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use ahash::AHashMap;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::index::reader::WordIndex;
use crate::index::writer::{BuildOutcome, VerseSource, build_index};
use crate::utils::progress::ProgressSink;
use crate::utils::words::WordTokenizer;
use crate::versification::Versification;

pub struct IndexContext {
    root: PathBuf,
    v11n: &'static Versification,
    building: Mutex<HashSet<String>>,
    open: Mutex<AHashMap<String, Arc<WordIndex>>>,
}

impl IndexContext {
    pub fn new(root: impl Into<PathBuf>, v11n: &'static Versification) -> Self {
        Self {
            root: root.into(),
            v11n,
            building: Mutex::new(HashSet::new()),
            open: Mutex::new(AHashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versification(&self) -> &'static Versification {
        self.v11n
    }

    /// Whether a completed index exists for `book`.
    pub fn is_indexed(&self, book: &str) -> bool {
        self.root.join(book).is_dir()
    }

    /// Shared handle for `book`'s index. Handles are cached, so repeated
    /// opens share one entry table, mapping, and passage cache.
    pub fn open(&self, book: &str) -> Result<Arc<WordIndex>> {
        let mut open = self.open.lock().map_err(|_| lock_poisoned())?;
        if let Some(index) = open.get(book) {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(WordIndex::open(&self.root, book)?);
        open.insert(book.to_string(), Arc::clone(&index));
        Ok(index)
    }

    /// Release every cached handle's loaded state. Handles still held by
    /// callers stay valid and reload lazily.
    pub fn deactivate_all(&self) {
        if let Ok(open) = self.open.lock() {
            for index in open.values() {
                index.deactivate();
            }
        }
    }

    /// Build (or rebuild) the index for one book.
    ///
    /// At most one build per book may run at a time; a second caller gets
    /// [`Error::ConcurrentBuild`] immediately rather than queueing.
    pub fn build(
        &self,
        book: &str,
        source: &dyn VerseSource,
        tokenizer: &dyn WordTokenizer,
        progress: &dyn ProgressSink,
        cancel: Option<&AtomicBool>,
    ) -> Result<BuildOutcome> {
        let _guard = BuildGuard::acquire(&self.building, book)?;

        let outcome = build_index(
            &self.root,
            book,
            self.v11n,
            source,
            tokenizer,
            progress,
            cancel,
        )?;

        if outcome == BuildOutcome::Complete {
            // A cached handle may still hold the retired store's mapping.
            if let Ok(open) = self.open.lock() {
                if let Some(index) = open.get(book) {
                    index.deactivate();
                }
            }
        }

        Ok(outcome)
    }

    /// Build several books in parallel. Each book gets its own build lock;
    /// the shared cancel flag stops all of them.
    pub fn build_many(
        &self,
        jobs: Vec<(String, &dyn VerseSource)>,
        tokenizer: &dyn WordTokenizer,
        progress: &dyn ProgressSink,
        cancel: Option<&AtomicBool>,
    ) -> Vec<(String, Result<BuildOutcome>)> {
        jobs.into_par_iter()
            .map(|(book, source)| {
                let result = self.build(&book, source, tokenizer, progress, cancel);
                (book, result)
            })
            .collect()
    }
}

fn lock_poisoned() -> Error {
    Error::corrupt("index context lock poisoned")
}

/// Holds a book's slot in the building set; releases it on drop so failed
/// builds do not wedge the book.
struct BuildGuard<'a> {
    building: &'a Mutex<HashSet<String>>,
    book: String,
}

impl<'a> BuildGuard<'a> {
    fn acquire(building: &'a Mutex<HashSet<String>>, book: &str) -> Result<Self> {
        let mut set = building.lock().map_err(|_| lock_poisoned())?;
        if !set.insert(book.to_string()) {
            return Err(Error::ConcurrentBuild(book.to_string()));
        }
        Ok(Self {
            building,
            book: book.to_string(),
        })
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.building.lock() {
            set.remove(&self.book);
        }
    }
}
