//! Ordinal model: bidirectional mapping between structured references
//! (book, chapter, verse) and dense verse ordinals.
//!
//! Everything above this module operates on ordinals; the versification is
//! only consulted at the edges (reference validation, canonical name
//! rendering, blur boundary clipping). The verse-count tables are fixed
//! data of the scheme, not computed here.

mod kjv;

use crate::error::{Error, Result};
use std::sync::OnceLock;

/// Dense integer uniquely identifying a verse within a versification.
/// Valid ordinals run `1..=max_ordinal`.
pub type Ordinal = u32;

/// 1-based book number in canonical order.
pub type BookId = u8;

/// An immutable, validated verse reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verse {
    pub book: BookId,
    pub chapter: u16,
    pub verse: u16,
    pub ordinal: Ordinal,
}

impl Verse {
    /// Canonical name, e.g. `Gen 1:1`.
    pub fn name(&self, v11n: &Versification) -> String {
        format!(
            "{} {}:{}",
            v11n.book_name(self.book),
            self.chapter,
            self.verse
        )
    }
}

struct BookData {
    short_name: &'static str,
    full_name: &'static str,
    verses_in_chapter: &'static [u16],
    /// Ordinal of chapter `c`'s first verse at index `c - 1`.
    chapter_start: Vec<Ordinal>,
    first_ordinal: Ordinal,
    last_ordinal: Ordinal,
}

/// A versification scheme: book layout plus the ordinal tables derived
/// from it at construction.
pub struct Versification {
    name: &'static str,
    books: Vec<BookData>,
    max_ordinal: Ordinal,
}

impl Versification {
    fn from_tables(name: &'static str, tables: &[(&'static str, &'static str, &'static [u16])]) -> Self {
        let mut books = Vec::with_capacity(tables.len());
        let mut next: Ordinal = 1;

        for &(short_name, full_name, verses_in_chapter) in tables {
            let first_ordinal = next;
            let mut chapter_start = Vec::with_capacity(verses_in_chapter.len());
            for &count in verses_in_chapter {
                chapter_start.push(next);
                next += count as Ordinal;
            }
            books.push(BookData {
                short_name,
                full_name,
                verses_in_chapter,
                chapter_start,
                first_ordinal,
                last_ordinal: next - 1,
            });
        }

        Self {
            name,
            books,
            max_ordinal: next - 1,
        }
    }

    /// The King James versification: 66 books, 31,102 verses.
    pub fn kjv() -> &'static Versification {
        static KJV: OnceLock<Versification> = OnceLock::new();
        KJV.get_or_init(|| Versification::from_tables("KJV", &kjv::BOOKS))
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn book_count(&self) -> u8 {
        self.books.len() as u8
    }

    pub fn max_ordinal(&self) -> Ordinal {
        self.max_ordinal
    }

    fn book_data(&self, book: BookId) -> Result<&BookData> {
        if book == 0 {
            return Err(Error::InvalidReference {
                book,
                chapter: 0,
                verse: 0,
            });
        }
        self.books
            .get(book as usize - 1)
            .ok_or(Error::InvalidReference {
                book,
                chapter: 0,
                verse: 0,
            })
    }

    /// Short book name used in canonical rendering, e.g. `Gen`.
    ///
    /// Panics on an out-of-range book; callers hold validated references.
    pub fn book_name(&self, book: BookId) -> &str {
        self.books[book as usize - 1].short_name
    }

    /// Full book name, e.g. `Genesis`.
    pub fn book_full_name(&self, book: BookId) -> &str {
        self.books[book as usize - 1].full_name
    }

    pub fn chapters_in(&self, book: BookId) -> Result<u16> {
        Ok(self.book_data(book)?.verses_in_chapter.len() as u16)
    }

    pub fn verses_in(&self, book: BookId, chapter: u16) -> Result<u16> {
        let data = self.book_data(book)?;
        if chapter == 0 || chapter as usize > data.verses_in_chapter.len() {
            return Err(Error::InvalidReference {
                book,
                chapter,
                verse: 0,
            });
        }
        Ok(data.verses_in_chapter[chapter as usize - 1])
    }

    /// Convert a structured reference to its dense ordinal.
    pub fn ordinal(&self, book: BookId, chapter: u16, verse: u16) -> Result<Ordinal> {
        let data = self.book_data(book).map_err(|_| Error::InvalidReference {
            book,
            chapter,
            verse,
        })?;
        if chapter == 0
            || chapter as usize > data.verses_in_chapter.len()
            || verse == 0
            || verse > data.verses_in_chapter[chapter as usize - 1]
        {
            return Err(Error::InvalidReference {
                book,
                chapter,
                verse,
            });
        }
        Ok(data.chapter_start[chapter as usize - 1] + verse as Ordinal - 1)
    }

    /// Construct a validated [`Verse`] from a structured reference.
    pub fn verse(&self, book: BookId, chapter: u16, verse: u16) -> Result<Verse> {
        let ordinal = self.ordinal(book, chapter, verse)?;
        Ok(Verse {
            book,
            chapter,
            verse,
            ordinal,
        })
    }

    /// Exact inverse of [`ordinal`](Self::ordinal).
    pub fn verse_at(&self, ordinal: Ordinal) -> Result<Verse> {
        if ordinal == 0 || ordinal > self.max_ordinal {
            return Err(Error::InvalidOrdinal(ordinal));
        }

        // partition_point gives the first book starting after `ordinal`.
        let book_idx = self
            .books
            .partition_point(|b| b.first_ordinal <= ordinal)
            - 1;
        let data = &self.books[book_idx];
        let chapter_idx = data.chapter_start.partition_point(|&s| s <= ordinal) - 1;

        Ok(Verse {
            book: (book_idx + 1) as BookId,
            chapter: (chapter_idx + 1) as u16,
            verse: (ordinal - data.chapter_start[chapter_idx] + 1) as u16,
            ordinal,
        })
    }

    /// Ordinal of the first verse in the chapter containing `ordinal`.
    pub fn chapter_start(&self, ordinal: Ordinal) -> Result<Ordinal> {
        let v = self.verse_at(ordinal)?;
        Ok(self.books[v.book as usize - 1].chapter_start[v.chapter as usize - 1])
    }

    /// Ordinal of the last verse in the chapter containing `ordinal`.
    pub fn chapter_end(&self, ordinal: Ordinal) -> Result<Ordinal> {
        let v = self.verse_at(ordinal)?;
        let data = &self.books[v.book as usize - 1];
        let start = data.chapter_start[v.chapter as usize - 1];
        Ok(start + data.verses_in_chapter[v.chapter as usize - 1] as Ordinal - 1)
    }

    /// Ordinal of the first verse in the book containing `ordinal`.
    pub fn book_start(&self, ordinal: Ordinal) -> Result<Ordinal> {
        let v = self.verse_at(ordinal)?;
        Ok(self.books[v.book as usize - 1].first_ordinal)
    }

    /// Ordinal of the last verse in the book containing `ordinal`.
    pub fn book_end(&self, ordinal: Ordinal) -> Result<Ordinal> {
        let v = self.verse_at(ordinal)?;
        Ok(self.books[v.book as usize - 1].last_ordinal)
    }

    pub(crate) fn is_chapter_start(&self, v: &Verse) -> bool {
        v.verse == 1
    }

    pub(crate) fn is_chapter_end(&self, v: &Verse) -> bool {
        let data = &self.books[v.book as usize - 1];
        v.verse == data.verses_in_chapter[v.chapter as usize - 1]
    }

    pub(crate) fn is_book_start(&self, v: &Verse) -> bool {
        v.chapter == 1 && v.verse == 1
    }

    pub(crate) fn is_book_end(&self, v: &Verse) -> bool {
        let data = &self.books[v.book as usize - 1];
        v.chapter as usize == data.verses_in_chapter.len() && self.is_chapter_end(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kjv_totals() {
        let v11n = Versification::kjv();
        assert_eq!(v11n.book_count(), 66);
        assert_eq!(v11n.max_ordinal(), 31102);
    }

    #[test]
    fn test_first_and_last_verse() {
        let v11n = Versification::kjv();
        assert_eq!(v11n.ordinal(1, 1, 1).unwrap(), 1);
        // Rev 22:21 is the last verse in the scheme.
        assert_eq!(v11n.ordinal(66, 22, 21).unwrap(), 31102);
    }

    #[test]
    fn test_round_trip_every_ordinal() {
        let v11n = Versification::kjv();
        for ord in 1..=v11n.max_ordinal() {
            let v = v11n.verse_at(ord).unwrap();
            assert_eq!(v11n.ordinal(v.book, v.chapter, v.verse).unwrap(), ord);
        }
    }

    #[test]
    fn test_invalid_references() {
        let v11n = Versification::kjv();
        assert!(matches!(
            v11n.ordinal(0, 1, 1),
            Err(Error::InvalidReference { .. })
        ));
        assert!(matches!(
            v11n.ordinal(67, 1, 1),
            Err(Error::InvalidReference { .. })
        ));
        // Genesis has 50 chapters.
        assert!(v11n.ordinal(1, 51, 1).is_err());
        // Gen 1 has 31 verses.
        assert!(v11n.ordinal(1, 1, 32).is_err());
        assert!(v11n.ordinal(1, 1, 0).is_err());
    }

    #[test]
    fn test_invalid_ordinals() {
        let v11n = Versification::kjv();
        assert!(matches!(v11n.verse_at(0), Err(Error::InvalidOrdinal(0))));
        assert!(v11n.verse_at(31103).is_err());
    }

    #[test]
    fn test_verse_names() {
        let v11n = Versification::kjv();
        assert_eq!(v11n.verse(1, 1, 1).unwrap().name(v11n), "Gen 1:1");
        assert_eq!(v11n.verse(8, 2, 10).unwrap().name(v11n), "Rut 2:10");
        assert_eq!(v11n.verse(9, 1, 1).unwrap().name(v11n), "1Sa 1:1");
        assert_eq!(v11n.book_full_name(1), "Genesis");
        assert_eq!(v11n.book_full_name(66), "Revelation");
    }

    #[test]
    fn test_chapter_boundaries() {
        let v11n = Versification::kjv();
        let gen_2_1 = v11n.ordinal(1, 2, 1).unwrap();
        assert_eq!(v11n.chapter_start(gen_2_1).unwrap(), gen_2_1);
        assert_eq!(
            v11n.chapter_end(gen_2_1).unwrap(),
            v11n.ordinal(1, 2, 25).unwrap()
        );
        assert_eq!(v11n.book_start(gen_2_1).unwrap(), 1);
        assert_eq!(
            v11n.book_end(gen_2_1).unwrap(),
            v11n.ordinal(1, 50, 26).unwrap()
        );
    }

    #[test]
    fn test_psalm_119() {
        // The longest chapter; a good sentinel for table transcription.
        let v11n = Versification::kjv();
        assert_eq!(v11n.verses_in(19, 119).unwrap(), 176);
    }
}
