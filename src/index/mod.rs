//! Persistent word index: build, store, and look up word -> Passage
//! mappings.
//!
//! Layout per book under the index root:
//!
//! ```text
//! <root>/<book>/ref.data    serialized passages, back to back
//! <root>/<book>/ref.index   sorted word -> (offset, length) table
//! <root>/<book>/meta.json   build metadata
//! ```
//!
//! Builds write into a temp directory and swap it in whole, so readers
//! never observe a partially written store.

mod context;
mod reader;
mod types;
mod writer;

pub use context::IndexContext;
pub use reader::{WordIndex, WordLookup};
pub use types::{IndexMeta, WordEntry};
pub use writer::{BuildOutcome, IndexWriter, VerseSource, build_index};
