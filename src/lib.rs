//! # VXI - Verse-Range Search Engine
//!
//! VXI answers boolean word searches over versified text ("which verses
//! contain moses but not aaron?") using a persistent word index and an
//! interval algebra over dense verse ordinals.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`versification`] - Reference <-> ordinal mapping (KJV scheme)
//! - [`passage`] - Normalized verse-range sets and their algebra
//! - [`index`] - Persistent word -> Passage store (build and lookup)
//! - [`query`] - Query tokenizer and evaluation engine
//! - [`utils`] - Encoding, tokenization, stemming, progress reporting
//!
//! ## Quick Start
//!
//! ```ignore
//! use vxi::index::IndexContext;
//! use vxi::query::QueryEngine;
//! use vxi::versification::Versification;
//!
//! let v11n = Versification::kjv();
//! let ctx = IndexContext::new("/path/to/indexes", v11n);
//!
//! // Build once (source supplies verse text, tokenizer splits it).
//! ctx.build("kjv", &source, &tokenizer, &progress, None)?;
//!
//! // Then query as often as needed.
//! let index = ctx.open("kjv")?;
//! let engine = QueryEngine::new(index.as_ref(), v11n);
//! let hits = engine.search("moses & aaron ~ 1")?;
//! println!("{}", hits.name(v11n)?);
//! ```
//!
//! ## Design
//!
//! Every verse is a dense ordinal; a search result is a [`passage::Passage`],
//! a sorted list of disjoint ordinal ranges. The on-disk index maps each
//! normalized word to its serialized Passage through a sorted entry table
//! and a memory-mapped data blob, so a lookup is one binary search plus
//! one positioned read. Queries combine passages with union, intersection,
//! subtraction, proximity blurring, and prefix/stemming expansion.

pub mod error;
pub mod index;
pub mod passage;
pub mod query;
pub mod utils;
pub mod versification;

pub use error::{Error, Result};
pub use index::{IndexContext, WordIndex, WordLookup};
pub use passage::{BlurRestriction, Passage, VerseRange};
pub use query::QueryEngine;
pub use versification::{Ordinal, Verse, Versification};
