use crate::error::Result;
use crate::versification::{Ordinal, Versification};

/// A closed interval of verse ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VerseRange {
    start: Ordinal,
    end: Ordinal,
}

impl VerseRange {
    /// Create a range; endpoints are swapped if given in reverse order.
    pub fn new(start: Ordinal, end: Ordinal) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// A single-verse range.
    pub fn at(ordinal: Ordinal) -> Self {
        Self {
            start: ordinal,
            end: ordinal,
        }
    }

    pub fn start(&self) -> Ordinal {
        self.start
    }

    pub fn end(&self) -> Ordinal {
        self.end
    }

    /// Number of verses covered.
    pub fn verse_count(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        self.start <= ordinal && ordinal <= self.end
    }

    pub fn overlaps(&self, other: &VerseRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if the two ranges overlap or touch with no ordinal gap, i.e.
    /// they would collapse into one range in a normalized Passage.
    pub fn mergeable(&self, other: &VerseRange) -> bool {
        let (lo, hi) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        hi.start <= lo.end.saturating_add(1)
    }

    /// Canonical display name, shortened the way references are written:
    /// whole books as `Gen` / `Gen-Exo`, whole chapters as `Rut 2` /
    /// `Deu 28-Rut 1`, in-chapter spans as `Mar 2:2-4`, and so on.
    pub fn name(&self, v11n: &Versification) -> Result<String> {
        let start = v11n.verse_at(self.start)?;
        let end = v11n.verse_at(self.end)?;

        let whole_chapters = v11n.is_chapter_start(&start) && v11n.is_chapter_end(&end);
        let whole_books = v11n.is_book_start(&start) && v11n.is_book_end(&end);

        if start.book != end.book {
            if whole_books {
                return Ok(format!(
                    "{}-{}",
                    v11n.book_name(start.book),
                    v11n.book_name(end.book)
                ));
            }
            if whole_chapters {
                return Ok(format!(
                    "{} {}-{} {}",
                    v11n.book_name(start.book),
                    start.chapter,
                    v11n.book_name(end.book),
                    end.chapter
                ));
            }
            return Ok(format!("{}-{}", start.name(v11n), end.name(v11n)));
        }

        if whole_books {
            return Ok(v11n.book_name(start.book).to_string());
        }

        if start.chapter != end.chapter {
            if whole_chapters {
                return Ok(format!(
                    "{} {}-{}",
                    v11n.book_name(start.book),
                    start.chapter,
                    end.chapter
                ));
            }
            return Ok(format!(
                "{}-{}:{}",
                start.name(v11n),
                end.chapter,
                end.verse
            ));
        }

        if whole_chapters {
            return Ok(format!("{} {}", v11n.book_name(start.book), start.chapter));
        }

        if start.verse != end.verse {
            return Ok(format!("{}-{}", start.name(v11n), end.verse));
        }

        Ok(start.name(v11n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versification::Versification;

    fn ord(book: u8, chapter: u16, verse: u16) -> Ordinal {
        Versification::kjv().ordinal(book, chapter, verse).unwrap()
    }

    #[test]
    fn test_new_swaps_reversed_endpoints() {
        let r = VerseRange::new(10, 5);
        assert_eq!(r.start(), 5);
        assert_eq!(r.end(), 10);
        assert_eq!(r.verse_count(), 6);
    }

    #[test]
    fn test_mergeable() {
        assert!(VerseRange::new(1, 5).mergeable(&VerseRange::new(6, 9)));
        assert!(VerseRange::new(6, 9).mergeable(&VerseRange::new(1, 5)));
        assert!(VerseRange::new(1, 5).mergeable(&VerseRange::new(3, 9)));
        assert!(!VerseRange::new(1, 5).mergeable(&VerseRange::new(7, 9)));
    }

    #[test]
    fn test_name_single_verse() {
        let v11n = Versification::kjv();
        let r = VerseRange::at(ord(41, 2, 3));
        assert_eq!(r.name(v11n).unwrap(), "Mar 2:3");
    }

    #[test]
    fn test_name_same_chapter_span() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(41, 2, 2), ord(41, 2, 4));
        assert_eq!(r.name(v11n).unwrap(), "Mar 2:2-4");
    }

    #[test]
    fn test_name_whole_chapter() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(8, 2, 1), ord(8, 2, 23));
        assert_eq!(r.name(v11n).unwrap(), "Rut 2");
    }

    #[test]
    fn test_name_whole_chapters_in_book() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(1, 2, 1), ord(1, 3, 24));
        assert_eq!(r.name(v11n).unwrap(), "Gen 2-3");
    }

    #[test]
    fn test_name_whole_book() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(8, 1, 1), ord(8, 4, 22));
        assert_eq!(r.name(v11n).unwrap(), "Rut");
    }

    #[test]
    fn test_name_whole_books() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(1, 1, 1), ord(2, 40, 38));
        assert_eq!(r.name(v11n).unwrap(), "Gen-Exo");
    }

    #[test]
    fn test_name_cross_book_whole_chapters() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(5, 28, 1), ord(8, 1, 22));
        assert_eq!(r.name(v11n).unwrap(), "Deu 28-Rut 1");
    }

    #[test]
    fn test_name_cross_book_partial() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(8, 3, 1), ord(9, 1, 1));
        assert_eq!(r.name(v11n).unwrap(), "Rut 3:1-1Sa 1:1");
    }

    #[test]
    fn test_name_cross_chapter_partial() {
        let v11n = Versification::kjv();
        let r = VerseRange::new(ord(1, 1, 5), ord(1, 2, 7));
        assert_eq!(r.name(v11n).unwrap(), "Gen 1:5-2:7");
    }
}
