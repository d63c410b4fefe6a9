//! Index construction.
//!
//! A build walks every verse of the versification in ordinal order, feeds
//! each verse's words into an in-memory accumulator, then serializes the
//! accumulated word -> Passage map into a fresh store directory. The new
//! directory replaces any prior index for the same book only after it is
//! complete, so a failed or cancelled build never damages an existing
//! index.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use ahash::AHashMap;
use roaring::RoaringBitmap;

use crate::error::{Error, Result};
use crate::index::types::{DATA_FILE, FORMAT_VERSION, INDEX_FILE, META_FILE, IndexMeta};
use crate::passage::{Passage, VerseRange};
use crate::utils::encoding::{write_u16_le, write_u32_le, write_u64_le};
use crate::utils::progress::ProgressSink;
use crate::utils::words::WordTokenizer;
use crate::versification::{Ordinal, Versification};

/// Share of the progress range spent scanning verses; the remainder
/// covers serialization.
const SCAN_PERCENT: u64 = 60;

/// Supplies the plain text of each verse of the book being indexed.
///
/// Implementations must be cheap to call per verse; the builder makes one
/// call per ordinal in the versification.
pub trait VerseSource: Sync {
    fn text(&self, ordinal: Ordinal) -> Result<String>;
}

/// How a build run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The index was written and swapped into place.
    Complete,
    /// The cancel flag was observed; no on-disk state changed.
    Cancelled,
}

/// Accumulates word occurrences for one book, then writes the store.
pub struct IndexWriter<'a> {
    book_dir: PathBuf,
    book: String,
    v11n: &'a Versification,
    accum: AHashMap<String, RoaringBitmap>,
    seen_verses: RoaringBitmap,
}

impl<'a> IndexWriter<'a> {
    pub fn new(root: &Path, book: &str, v11n: &'a Versification) -> Self {
        Self {
            book_dir: root.join(book),
            book: book.to_string(),
            v11n,
            accum: AHashMap::new(),
            seen_verses: RoaringBitmap::new(),
        }
    }

    /// Record that each of `words` occurs in the verse at `ordinal`.
    pub fn add_verse<I, S>(&mut self, ordinal: Ordinal, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.accum
                .entry(word.as_ref().to_string())
                .or_default()
                .insert(ordinal);
            self.seen_verses.insert(ordinal);
        }
    }

    /// Serialize the accumulated map into a temp directory next to the
    /// final location, then swap it into place.
    pub fn write(&self, progress: &dyn ProgressSink) -> Result<()> {
        let temp_dir = self
            .book_dir
            .with_file_name(format!(".build-{}", self.book));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir)
                .map_err(|e| Error::io(format!("clearing {}", temp_dir.display()), e))?;
        }
        fs::create_dir_all(&temp_dir)
            .map_err(|e| Error::io(format!("creating {}", temp_dir.display()), e))?;

        let result = self.write_store(&temp_dir, progress);
        if result.is_err() {
            let _ = fs::remove_dir_all(&temp_dir);
            return result;
        }

        swap_into_place(&temp_dir, &self.book_dir)?;
        progress.update(100, "done");
        Ok(())
    }

    fn write_store(&self, dir: &Path, progress: &dyn ProgressSink) -> Result<()> {
        let mut words: Vec<&String> = self.accum.keys().collect();
        words.sort_unstable();

        let data_path = dir.join(DATA_FILE);
        let data_file = File::create(&data_path)
            .map_err(|e| Error::io(format!("creating {}", data_path.display()), e))?;
        let mut data = BufWriter::new(data_file);

        let index_path = dir.join(INDEX_FILE);
        let index_file = File::create(&index_path)
            .map_err(|e| Error::io(format!("creating {}", index_path.display()), e))?;
        let mut index = BufWriter::new(index_file);

        let io_err = |e| Error::io(format!("writing index for {}", self.book), e);

        write_u32_le(&mut index, words.len() as u32).map_err(io_err)?;

        let mut offset: u64 = 0;
        let mut last_percent = SCAN_PERCENT;
        for (i, word) in words.iter().enumerate() {
            let bitmap = &self.accum[*word];
            let blob = bitmap_to_passage(bitmap).to_bytes();

            data.write_all(&blob).map_err(io_err)?;

            write_u16_le(&mut index, word.len() as u16).map_err(io_err)?;
            index.write_all(word.as_bytes()).map_err(io_err)?;
            write_u64_le(&mut index, offset).map_err(io_err)?;
            write_u32_le(&mut index, blob.len() as u32).map_err(io_err)?;
            write_u32_le(&mut index, bitmap.len() as u32).map_err(io_err)?;

            offset += blob.len() as u64;

            let percent =
                SCAN_PERCENT + (100 - SCAN_PERCENT) * (i as u64 + 1) / words.len().max(1) as u64;
            if percent > last_percent {
                last_percent = percent;
                progress.update(percent as u8, word);
            }
        }

        data.flush().map_err(io_err)?;
        index.flush().map_err(io_err)?;

        let meta = IndexMeta {
            version: FORMAT_VERSION,
            book: self.book.clone(),
            versification: self.v11n.name().to_string(),
            word_count: words.len() as u32,
            verse_count: self.seen_verses.len() as u32,
            data_len: offset,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        };
        let meta_path = dir.join(META_FILE);
        let meta_file = File::create(&meta_path)
            .map_err(|e| Error::io(format!("creating {}", meta_path.display()), e))?;
        serde_json::to_writer_pretty(BufWriter::new(meta_file), &meta)
            .map_err(|e| Error::io(format!("writing {}", meta_path.display()), e.into()))?;

        Ok(())
    }
}

/// Full build driver: scan, accumulate, serialize, swap.
///
/// `cancel` is polled between verses; when it flips, the partial build is
/// discarded and any existing index for `book` is left untouched.
pub fn build_index(
    root: &Path,
    book: &str,
    v11n: &Versification,
    source: &dyn VerseSource,
    tokenizer: &dyn WordTokenizer,
    progress: &dyn ProgressSink,
    cancel: Option<&AtomicBool>,
) -> Result<BuildOutcome> {
    let mut writer = IndexWriter::new(root, book, v11n);

    let max = v11n.max_ordinal();
    let mut last_percent = 0;
    for ordinal in 1..=max {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Ok(BuildOutcome::Cancelled);
        }

        let text = source.text(ordinal)?;
        if !text.is_empty() {
            writer.add_verse(ordinal, tokenizer.words(&text));
        }

        let percent = (SCAN_PERCENT * ordinal as u64 / max as u64) as u8;
        if percent > last_percent {
            last_percent = percent;
            let verse = v11n.verse_at(ordinal)?;
            progress.update(percent, &verse.name(v11n));
        }
    }

    if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
        return Ok(BuildOutcome::Cancelled);
    }

    writer.write(progress)?;
    Ok(BuildOutcome::Complete)
}

/// Convert a dense ordinal bitmap into a normalized Passage by collapsing
/// consecutive runs.
fn bitmap_to_passage(bitmap: &RoaringBitmap) -> Passage {
    let mut ranges = Vec::new();
    let mut run: Option<(Ordinal, Ordinal)> = None;

    for ordinal in bitmap.iter() {
        run = match run {
            Some((start, end)) if ordinal == end + 1 => Some((start, ordinal)),
            Some((start, end)) => {
                ranges.push(VerseRange::new(start, end));
                Some((ordinal, ordinal))
            }
            None => Some((ordinal, ordinal)),
        };
    }
    if let Some((start, end)) = run {
        ranges.push(VerseRange::new(start, end));
    }

    Passage::from_ranges(ranges)
}

/// Replace `final_dir` with `temp_dir`. The previous store, if any, is
/// moved aside first and deleted only after the rename succeeds.
fn swap_into_place(temp_dir: &Path, final_dir: &Path) -> Result<()> {
    let old_dir = match (final_dir.parent(), final_dir.file_name()) {
        (Some(parent), Some(name)) => {
            parent.join(format!(".old-{}", name.to_string_lossy()))
        }
        _ => {
            return Err(Error::io(
                format!("resolving {}", final_dir.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad index path"),
            ));
        }
    };

    if old_dir.exists() {
        fs::remove_dir_all(&old_dir)
            .map_err(|e| Error::io(format!("clearing {}", old_dir.display()), e))?;
    }

    let had_previous = final_dir.exists();
    if had_previous {
        fs::rename(final_dir, &old_dir)
            .map_err(|e| Error::io(format!("retiring {}", final_dir.display()), e))?;
    }

    if let Err(e) = fs::rename(temp_dir, final_dir) {
        // Try to put the previous store back before reporting.
        if had_previous {
            let _ = fs::rename(&old_dir, final_dir);
        }
        return Err(Error::io(format!("installing {}", final_dir.display()), e));
    }

    if had_previous {
        let _ = fs::remove_dir_all(&old_dir);
    }

    Ok(())
}
