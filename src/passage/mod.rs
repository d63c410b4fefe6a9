//! Passage algebra: normalized sets of verse ranges.
//!
//! A [`Passage`] is the unit everything else combines: word lookups return
//! one, the query engine folds them together, and the index stores them in
//! serialized form. The normalization invariant (sorted, disjoint, no
//! mergeable adjacency) holds on every value observable by callers.

mod range;

pub use range::VerseRange;

use crate::error::{Error, Result};
use crate::utils::encoding::{decode_varint, encode_varint};
use crate::versification::{Ordinal, Versification};

/// Controls whether blurring may cross a structural boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlurRestriction {
    /// Clip only at the ends of the versification.
    #[default]
    None,
    /// Clip each range at the chapter bounds of its endpoints.
    Chapter,
    /// Clip each range at the book bounds of its endpoints.
    Book,
}

/// An ordered sequence of pairwise-disjoint, non-adjacent verse ranges.
///
/// The empty Passage is a valid, distinguished value: it is what lookups
/// for absent words return. Equality is structural.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Passage {
    ranges: Vec<VerseRange>,
}

impl Passage {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_range(range: VerseRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    pub fn from_ordinal(ordinal: Ordinal) -> Self {
        Self::from_range(VerseRange::at(ordinal))
    }

    /// Build a Passage from arbitrary ranges, normalizing as needed.
    pub fn from_ranges(ranges: Vec<VerseRange>) -> Self {
        Self {
            ranges: normalize(ranges),
        }
    }

    pub fn ranges(&self) -> &[VerseRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn count_ranges(&self) -> usize {
        self.ranges.len()
    }

    pub fn count_verses(&self) -> u32 {
        self.ranges.iter().map(VerseRange::verse_count).sum()
    }

    pub fn contains(&self, ordinal: Ordinal) -> bool {
        let i = self.ranges.partition_point(|r| r.end() < ordinal);
        self.ranges.get(i).is_some_and(|r| r.contains(ordinal))
    }

    /// Set union: every ordinal present in either operand.
    pub fn union(&self, other: &Passage) -> Passage {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut merged = Vec::with_capacity(self.ranges.len() + other.ranges.len());
        merged.extend_from_slice(&self.ranges);
        merged.extend_from_slice(&other.ranges);
        Passage::from_ranges(merged)
    }

    /// Set intersection: ordinals present in both operands.
    pub fn intersect(&self, other: &Passage) -> Passage {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.ranges.len() && j < other.ranges.len() {
            let a = &self.ranges[i];
            let b = &other.ranges[j];

            let lo = a.start().max(b.start());
            let hi = a.end().min(b.end());
            if lo <= hi {
                out.push(VerseRange::new(lo, hi));
            }

            // Advance whichever range ends first.
            if a.end() < b.end() {
                i += 1;
            } else {
                j += 1;
            }
        }

        Passage::from_ranges(out)
    }

    /// Set difference: remove from `self` every ordinal present in `other`.
    /// A removal in the middle of a range splits it in two.
    pub fn subtract(&self, other: &Passage) -> Passage {
        let mut out = Vec::new();
        let mut j = 0;

        for a in &self.ranges {
            let mut cursor = a.start();

            while j < other.ranges.len() && other.ranges[j].end() < cursor {
                j += 1;
            }

            let mut k = j;
            while k < other.ranges.len() && other.ranges[k].start() <= a.end() {
                let b = &other.ranges[k];
                if b.start() > cursor {
                    out.push(VerseRange::new(cursor, b.start() - 1));
                }
                cursor = cursor.max(b.end().saturating_add(1));
                if cursor > a.end() {
                    break;
                }
                k += 1;
            }

            if cursor <= a.end() {
                out.push(VerseRange::new(cursor, a.end()));
            }
        }

        Passage::from_ranges(out)
    }

    /// Expand every range by `radius` ordinals in each direction, clipped
    /// per `restriction`, then re-normalize (expanded neighbours merge).
    pub fn blur(
        &self,
        radius: u32,
        restriction: BlurRestriction,
        v11n: &Versification,
    ) -> Result<Passage> {
        let mut out = Vec::with_capacity(self.ranges.len());

        for r in &self.ranges {
            let floor = match restriction {
                BlurRestriction::None => 1,
                BlurRestriction::Chapter => v11n.chapter_start(r.start())?,
                BlurRestriction::Book => v11n.book_start(r.start())?,
            };
            let ceil = match restriction {
                BlurRestriction::None => v11n.max_ordinal(),
                BlurRestriction::Chapter => v11n.chapter_end(r.end())?,
                BlurRestriction::Book => v11n.book_end(r.end())?,
            };

            let start = r.start().saturating_sub(radius).max(floor);
            let end = r.end().saturating_add(radius).min(ceil);
            out.push(VerseRange::new(start, end));
        }

        Ok(Passage::from_ranges(out))
    }

    /// Split off the first `max_ranges` ranges; returns `(kept, overflow)`.
    /// Used by paging callers.
    pub fn trim(&self, max_ranges: usize) -> (Passage, Passage) {
        if self.ranges.len() <= max_ranges {
            return (self.clone(), Passage::empty());
        }
        let kept = self.ranges[..max_ranges].to_vec();
        let overflow = self.ranges[max_ranges..].to_vec();
        (Passage { ranges: kept }, Passage { ranges: overflow })
    }

    /// Canonical human-readable name: range names joined by `", "`.
    pub fn name(&self, v11n: &Versification) -> Result<String> {
        let mut parts = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            parts.push(r.name(v11n)?);
        }
        Ok(parts.join(", "))
    }

    /// Compact binary encoding: varint range count, then per range the
    /// delta from the previous range's end and the in-range span. This is
    /// the on-disk format of the word index data blob.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_varint(self.ranges.len() as u32, &mut buf);

        let mut prev: Ordinal = 0;
        for r in &self.ranges {
            encode_varint(r.start() - prev, &mut buf);
            encode_varint(r.end() - r.start(), &mut buf);
            prev = r.end();
        }

        buf
    }

    /// Exact inverse of [`to_bytes`](Self::to_bytes). Rejects truncated,
    /// trailing, or non-monotonic data.
    pub fn from_bytes(buf: &[u8]) -> Result<Passage> {
        let mut pos = 0;
        let mut next = |what: &str| -> Result<u32> {
            let (value, consumed) = decode_varint(&buf[pos..])
                .ok_or_else(|| Error::corrupt(format!("truncated passage blob ({what})")))?;
            pos += consumed;
            Ok(value)
        };

        let count = next("range count")?;
        let mut ranges = Vec::with_capacity(count as usize);
        let mut prev: Ordinal = 0;

        for _ in 0..count {
            let gap = next("range start")?;
            if gap == 0 {
                return Err(Error::corrupt("passage blob ranges out of order"));
            }
            let start = prev
                .checked_add(gap)
                .ok_or_else(|| Error::corrupt("passage blob ordinal overflow"))?;
            let span = next("range span")?;
            let end = start
                .checked_add(span)
                .ok_or_else(|| Error::corrupt("passage blob ordinal overflow"))?;
            ranges.push(VerseRange::new(start, end));
            prev = end;
        }

        if pos != buf.len() {
            return Err(Error::corrupt("trailing bytes after passage blob"));
        }

        Ok(Passage { ranges })
    }
}

/// Sort, then collapse overlapping and gap-free adjacent ranges.
fn normalize(mut ranges: Vec<VerseRange>) -> Vec<VerseRange> {
    if ranges.len() < 2 {
        return ranges;
    }

    ranges.sort_unstable_by_key(VerseRange::start);

    let mut out: Vec<VerseRange> = Vec::with_capacity(ranges.len());
    for r in ranges {
        match out.last_mut() {
            Some(last) if last.mergeable(&r) => {
                *last = VerseRange::new(last.start(), last.end().max(r.end()));
            }
            _ => out.push(r),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versification::Versification;

    fn passage(ranges: &[(Ordinal, Ordinal)]) -> Passage {
        Passage::from_ranges(
            ranges
                .iter()
                .map(|&(s, e)| VerseRange::new(s, e))
                .collect(),
        )
    }

    #[test]
    fn test_normalization_merges_overlap_and_adjacency() {
        let p = passage(&[(10, 20), (1, 5), (6, 8), (15, 25)]);
        assert_eq!(p.ranges(), &[VerseRange::new(1, 8), VerseRange::new(10, 25)]);
    }

    #[test]
    fn test_normalization_keeps_gapped_ranges() {
        let p = passage(&[(1, 5), (7, 9)]);
        assert_eq!(p.count_ranges(), 2);
        assert_eq!(p.count_verses(), 8);
    }

    #[test]
    fn test_union_commutes() {
        let a = passage(&[(1, 10), (20, 30)]);
        let b = passage(&[(5, 25), (40, 45)]);
        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(
            a.union(&b).ranges(),
            &[VerseRange::new(1, 30), VerseRange::new(40, 45)]
        );
    }

    #[test]
    fn test_intersect_commutes() {
        let a = passage(&[(1, 10), (20, 30)]);
        let b = passage(&[(5, 25)]);
        assert_eq!(a.intersect(&b), b.intersect(&a));
        assert_eq!(
            a.intersect(&b).ranges(),
            &[VerseRange::new(5, 10), VerseRange::new(20, 25)]
        );
    }

    #[test]
    fn test_union_absorbs_intersection() {
        let a = passage(&[(1, 10), (20, 30)]);
        let b = passage(&[(5, 25), (40, 41)]);
        assert_eq!(a.union(&a.intersect(&b)), a);
    }

    #[test]
    fn test_subtract_splits_range() {
        let a = passage(&[(1, 20)]);
        let b = passage(&[(5, 10)]);
        assert_eq!(
            a.subtract(&b).ranges(),
            &[VerseRange::new(1, 4), VerseRange::new(11, 20)]
        );
    }

    #[test]
    fn test_subtract_edges_and_disjoint() {
        let a = passage(&[(5, 10), (20, 25)]);
        assert_eq!(a.subtract(&passage(&[(1, 6)])).ranges()[0], VerseRange::new(7, 10));
        assert_eq!(a.subtract(&passage(&[(30, 40)])), a);
        assert!(a.subtract(&a).is_empty());
        assert!(Passage::empty().subtract(&a).is_empty());
    }

    #[test]
    fn test_empty_identities() {
        let a = passage(&[(3, 7)]);
        let empty = Passage::empty();
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
        assert!(a.intersect(&empty).is_empty());
        assert_eq!(a.subtract(&empty), a);
    }

    #[test]
    fn test_contains() {
        let a = passage(&[(3, 7), (10, 12)]);
        assert!(a.contains(3));
        assert!(a.contains(7));
        assert!(a.contains(11));
        assert!(!a.contains(8));
        assert!(!a.contains(1));
        assert!(!a.contains(13));
    }

    #[test]
    fn test_blur_zero_is_identity() {
        let v11n = Versification::kjv();
        let a = passage(&[(100, 120), (300, 310)]);
        for restriction in [
            BlurRestriction::None,
            BlurRestriction::Chapter,
            BlurRestriction::Book,
        ] {
            assert_eq!(a.blur(0, restriction, v11n).unwrap(), a);
        }
    }

    #[test]
    fn test_blur_expands_and_merges() {
        let v11n = Versification::kjv();
        let a = passage(&[(100, 110), (113, 120)]);
        let blurred = a.blur(1, BlurRestriction::None, v11n).unwrap();
        // 110+1 and 113-1 leave no gap, so the ranges merge.
        assert_eq!(blurred.ranges(), &[VerseRange::new(99, 121)]);
    }

    #[test]
    fn test_blur_clips_at_scheme_bounds() {
        let v11n = Versification::kjv();
        let a = passage(&[(1, 2)]);
        let blurred = a.blur(5, BlurRestriction::None, v11n).unwrap();
        assert_eq!(blurred.ranges(), &[VerseRange::new(1, 7)]);

        let max = v11n.max_ordinal();
        let tail = passage(&[(max - 1, max)]);
        let blurred = tail.blur(5, BlurRestriction::None, v11n).unwrap();
        assert_eq!(blurred.ranges(), &[VerseRange::new(max - 6, max)]);
    }

    #[test]
    fn test_blur_chapter_restriction_clips() {
        let v11n = Versification::kjv();
        // Gen 2 spans ordinals 32..=56.
        let ch_start = v11n.ordinal(1, 2, 1).unwrap();
        let ch_end = v11n.ordinal(1, 2, 25).unwrap();
        let a = passage(&[(ch_start, ch_start + 2)]);

        let unrestricted = a.blur(4, BlurRestriction::None, v11n).unwrap();
        assert_eq!(unrestricted.ranges()[0].start(), ch_start - 4);

        let clipped = a.blur(4, BlurRestriction::Chapter, v11n).unwrap();
        assert_eq!(clipped.ranges()[0].start(), ch_start);
        assert_eq!(clipped.ranges()[0].end(), ch_start + 6);

        let near_end = passage(&[(ch_end - 1, ch_end)]);
        let clipped = near_end.blur(10, BlurRestriction::Chapter, v11n).unwrap();
        assert_eq!(clipped.ranges()[0].end(), ch_end);
    }

    #[test]
    fn test_blur_book_restriction_clips() {
        let v11n = Versification::kjv();
        // Exodus starts right after Gen 50:26.
        let exo_start = v11n.ordinal(2, 1, 1).unwrap();
        let a = passage(&[(exo_start, exo_start + 1)]);
        let clipped = a.blur(3, BlurRestriction::Book, v11n).unwrap();
        assert_eq!(clipped.ranges()[0].start(), exo_start);
    }

    #[test]
    fn test_trim_paging() {
        let a = passage(&[(1, 2), (5, 6), (9, 10)]);
        let (kept, overflow) = a.trim(2);
        assert_eq!(kept.ranges(), &[VerseRange::new(1, 2), VerseRange::new(5, 6)]);
        assert_eq!(overflow.ranges(), &[VerseRange::new(9, 10)]);

        let (kept, overflow) = a.trim(10);
        assert_eq!(kept, a);
        assert!(overflow.is_empty());
    }

    #[test]
    fn test_codec_roundtrip() {
        let cases = [
            Passage::empty(),
            passage(&[(1, 1)]),
            passage(&[(1, 31102)]),
            passage(&[(5, 10), (12, 40), (1000, 2000), (30000, 31000)]),
        ];
        for p in cases {
            let bytes = p.to_bytes();
            assert_eq!(Passage::from_bytes(&bytes).unwrap(), p);
        }
    }

    #[test]
    fn test_codec_rejects_garbage() {
        assert!(Passage::from_bytes(&[0x80]).is_err());
        // Claims one range but provides none.
        assert!(Passage::from_bytes(&[1]).is_err());
        // Trailing bytes after a valid empty passage.
        assert!(Passage::from_bytes(&[0, 7]).is_err());
    }

    #[test]
    fn test_passage_name_joins_ranges() {
        let v11n = Versification::kjv();
        let rut2 = passage(&[(
            v11n.ordinal(8, 2, 1).unwrap(),
            v11n.ordinal(8, 2, 23).unwrap(),
        )]);
        assert_eq!(rut2.name(v11n).unwrap(), "Rut 2");

        let two = rut2.union(&Passage::from_ordinal(v11n.ordinal(41, 2, 3).unwrap()));
        assert_eq!(two.name(v11n).unwrap(), "Rut 2, Mar 2:3");

        assert_eq!(Passage::empty().name(v11n).unwrap(), "");
    }
}
