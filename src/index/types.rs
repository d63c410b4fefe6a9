use serde::{Deserialize, Serialize};

/// Data blob: sequential serialized-Passage byte ranges, no framing.
pub const DATA_FILE: &str = "ref.data";

/// Entry table: sorted word -> (offset, length) records.
pub const INDEX_FILE: &str = "ref.index";

/// Human-readable metadata sidecar.
pub const META_FILE: &str = "meta.json";

/// Bumped when the on-disk layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// A pointer into the data blob for one indexed word.
///
/// Entries live in a table sorted by word, enabling exact lookup and
/// prefix range scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub offset: u64,
    pub length: u32,
    /// Number of verses the word occurs in; informational.
    pub verse_count: u32,
}

/// Index metadata stored in meta.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    pub version: u32,
    pub book: String,
    pub versification: String,
    pub word_count: u32,
    /// Distinct verses that contributed at least one word.
    pub verse_count: u32,
    pub data_len: u64,
    pub created_at: u64,
}
