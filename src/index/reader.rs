//! Index lookup.
//!
//! A [`WordIndex`] handle is cheap to open; the entry table and the
//! memory-mapped data blob are only loaded on first use (or an explicit
//! [`activate`](WordIndex::activate)) and can be dropped again with
//! [`deactivate`](WordIndex::deactivate) to release the resources while
//! keeping the handle alive.

use std::fs::File;
use std::io::BufReader;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use lru::LruCache;
use memmap2::Mmap;

use crate::error::{Error, Result};
use crate::index::types::{DATA_FILE, FORMAT_VERSION, INDEX_FILE, META_FILE, IndexMeta, WordEntry};
use crate::passage::Passage;
use crate::utils::encoding::{read_u16_le, read_u32_le, read_u64_le};
use crate::utils::words::normalize_word;

/// Lookup surface the query engine depends on. Implemented by
/// [`WordIndex`]; test doubles can implement it in memory.
pub trait WordLookup {
    /// Passage for an exact word; empty for an absent word.
    fn find(&self, word: &str) -> Result<Passage>;

    /// All indexed words starting with `prefix`, in sorted order.
    fn find_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Number of recently looked-up passages kept decoded per index.
const PASSAGE_CACHE_SIZE: usize = 256;

struct Active {
    entries: Vec<WordEntry>,
    data: Mmap,
    meta: IndexMeta,
}

impl Active {
    fn load(dir: &Path) -> Result<Self> {
        let meta_path = dir.join(META_FILE);
        let meta_file = File::open(&meta_path)
            .map_err(|e| Error::io(format!("opening {}", meta_path.display()), e))?;
        let meta: IndexMeta = serde_json::from_reader(BufReader::new(meta_file))
            .map_err(|e| Error::io(format!("parsing {}", meta_path.display()), e.into()))?;
        if meta.version != FORMAT_VERSION {
            return Err(Error::corrupt(format!(
                "unsupported index version {} in {}",
                meta.version,
                meta_path.display()
            )));
        }

        let index_path = dir.join(INDEX_FILE);
        let index_file = File::open(&index_path)
            .map_err(|e| Error::io(format!("opening {}", index_path.display()), e))?;
        let entries = read_entries(BufReader::new(index_file), &index_path)?;

        let data_path = dir.join(DATA_FILE);
        let data_file = File::open(&data_path)
            .map_err(|e| Error::io(format!("opening {}", data_path.display()), e))?;
        // Safety: the file is not mutated while mapped; builds replace the
        // whole directory rather than writing in place.
        let data = unsafe { Mmap::map(&data_file) }
            .map_err(|e| Error::io(format!("mapping {}", data_path.display()), e))?;

        if data.len() as u64 != meta.data_len {
            return Err(Error::corrupt(format!(
                "{} is {} bytes, metadata says {}",
                data_path.display(),
                data.len(),
                meta.data_len
            )));
        }

        Ok(Self {
            entries,
            data,
            meta,
        })
    }

    fn slice(&self, entry: &WordEntry) -> Result<&[u8]> {
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        self.data.get(start..end).ok_or_else(|| {
            Error::corrupt(format!(
                "entry for '{}' points past the data blob",
                entry.word
            ))
        })
    }
}

fn read_entries(mut reader: BufReader<File>, path: &Path) -> Result<Vec<WordEntry>> {
    use std::io::Read;

    let io_err = |e| Error::io(format!("reading {}", path.display()), e);

    let count = read_u32_le(&mut reader).map_err(io_err)?;
    let mut entries = Vec::with_capacity(count as usize);

    for _ in 0..count {
        let word_len = read_u16_le(&mut reader).map_err(io_err)?;
        let mut word_bytes = vec![0u8; word_len as usize];
        reader.read_exact(&mut word_bytes).map_err(io_err)?;
        let word = String::from_utf8(word_bytes)
            .map_err(|_| Error::corrupt(format!("non-UTF-8 word in {}", path.display())))?;

        let offset = read_u64_le(&mut reader).map_err(io_err)?;
        let length = read_u32_le(&mut reader).map_err(io_err)?;
        let verse_count = read_u32_le(&mut reader).map_err(io_err)?;

        if entries.last().is_some_and(|prev: &WordEntry| prev.word >= word) {
            return Err(Error::corrupt(format!(
                "entry table in {} is not sorted",
                path.display()
            )));
        }

        entries.push(WordEntry {
            word,
            offset,
            length,
            verse_count,
        });
    }

    Ok(entries)
}

/// Read handle for one book's word index.
pub struct WordIndex {
    dir: PathBuf,
    book: String,
    state: RwLock<Option<Active>>,
    cache: Mutex<LruCache<String, Passage>>,
}

impl WordIndex {
    /// Open a handle. The store files are not touched until the first
    /// lookup; only the directory's existence is verified here.
    pub fn open(root: &Path, book: &str) -> Result<Self> {
        let dir = root.join(book);
        if !dir.is_dir() {
            return Err(Error::io(
                format!("no index for '{book}'"),
                std::io::Error::new(std::io::ErrorKind::NotFound, dir.display().to_string()),
            ));
        }
        let cache_size = NonZeroUsize::new(PASSAGE_CACHE_SIZE)
            .unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            dir,
            book: book.to_string(),
            state: RwLock::new(None),
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    pub fn book(&self) -> &str {
        &self.book
    }

    /// Whether the store is currently loaded.
    pub fn is_active(&self) -> bool {
        self.state.read().is_ok_and(|s| s.is_some())
    }

    /// Load the entry table and map the data blob now rather than on the
    /// first lookup. Idempotent.
    pub fn activate(&self) -> Result<()> {
        self.with_active(|_| Ok(()))
    }

    /// Drop the loaded table, the mapping, and the passage cache. The
    /// next lookup reloads them.
    pub fn deactivate(&self) {
        if let Ok(mut state) = self.state.write() {
            *state = None;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Metadata recorded at build time. Activates if needed.
    pub fn meta(&self) -> Result<IndexMeta> {
        self.with_active(|active| Ok(active.meta.clone()))
    }

    /// Number of distinct indexed words. Activates if needed.
    pub fn word_count(&self) -> Result<usize> {
        self.with_active(|active| Ok(active.entries.len()))
    }

    fn with_active<T>(&self, f: impl FnOnce(&Active) -> Result<T>) -> Result<T> {
        {
            let state = self.state.read().map_err(|_| lock_poisoned())?;
            if let Some(active) = state.as_ref() {
                return f(active);
            }
        }

        let mut state = self.state.write().map_err(|_| lock_poisoned())?;
        if state.is_none() {
            *state = Some(Active::load(&self.dir)?);
        }
        match state.as_ref() {
            Some(active) => f(active),
            None => Err(lock_poisoned()),
        }
    }
}

fn lock_poisoned() -> Error {
    Error::corrupt("index state lock poisoned")
}

impl WordLookup for WordIndex {
    fn find(&self, word: &str) -> Result<Passage> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Ok(Passage::empty());
        }

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(passage) = cache.get(&word) {
                return Ok(passage.clone());
            }
        }

        let passage = self.with_active(|active| {
            match active
                .entries
                .binary_search_by(|e| e.word.as_str().cmp(&word))
            {
                Ok(i) => Passage::from_bytes(active.slice(&active.entries[i])?),
                Err(_) => Ok(Passage::empty()),
            }
        })?;

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(word, passage.clone());
        }
        Ok(passage)
    }

    fn find_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = normalize_word(prefix);
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        self.with_active(|active| {
            let start = active
                .entries
                .partition_point(|e| e.word.as_str() < prefix.as_str());
            Ok(active.entries[start..]
                .iter()
                .take_while(|e| e.word.starts_with(&prefix))
                .map(|e| e.word.clone())
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::writer::{BuildOutcome, build_index};
    use crate::utils::progress::NullProgress;
    use crate::utils::words::SimpleTokenizer;
    use crate::versification::{Ordinal, Versification};

    struct OneVerse(&'static str);

    impl crate::index::writer::VerseSource for OneVerse {
        fn text(&self, ordinal: Ordinal) -> Result<String> {
            Ok(if ordinal == 1 {
                self.0.to_string()
            } else {
                String::new()
            })
        }
    }

    fn build(dir: &Path, text: &'static str) {
        let outcome = build_index(
            dir,
            "kjv",
            Versification::kjv(),
            &OneVerse(text),
            &SimpleTokenizer,
            &NullProgress,
            None,
        )
        .unwrap();
        assert_eq!(outcome, BuildOutcome::Complete);
    }

    #[test]
    fn test_open_missing_index_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(WordIndex::open(dir.path(), "nope").is_err());
    }

    #[test]
    fn test_find_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), "God saw the light, that it was good");

        let index = WordIndex::open(dir.path(), "kjv").unwrap();
        assert!(!index.is_active());

        let god = index.find("God").unwrap();
        assert!(index.is_active());
        assert_eq!(god, Passage::from_ordinal(1));

        // Absent word is empty, not an error.
        assert!(index.find("moses").unwrap().is_empty());

        let go = index.find_prefix("go").unwrap();
        assert_eq!(go, vec!["god".to_string(), "good".to_string()]);
        assert!(index.find_prefix("zz").unwrap().is_empty());
    }

    #[test]
    fn test_deactivate_releases_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), "light");

        let index = WordIndex::open(dir.path(), "kjv").unwrap();
        index.activate().unwrap();
        assert!(index.is_active());

        index.deactivate();
        assert!(!index.is_active());

        assert_eq!(index.find("light").unwrap(), Passage::from_ordinal(1));
        assert!(index.is_active());
    }

    #[test]
    fn test_meta_and_word_count() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), "the light and the dark");

        let index = WordIndex::open(dir.path(), "kjv").unwrap();
        assert_eq!(index.word_count().unwrap(), 4);
        let meta = index.meta().unwrap();
        assert_eq!(meta.book, "kjv");
        assert_eq!(meta.versification, "KJV");
    }

    #[test]
    fn test_corrupt_blob_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        build(dir.path(), "light");

        // Truncate the data blob behind the entry table's back.
        let data_path = dir.path().join("kjv").join(DATA_FILE);
        std::fs::write(&data_path, b"").unwrap();

        let index = WordIndex::open(dir.path(), "kjv").unwrap();
        assert!(matches!(
            index.find("light"),
            Err(Error::IndexIo { .. })
        ));
    }
}
