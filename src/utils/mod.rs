//! Shared utilities.
//!
//! - [`encoding`] - Variable-length integer encoding (varint) and
//!   little-endian framing helpers
//! - [`words`] - Word segmentation and stemming strategies
//! - [`progress`] - Build-progress side channel

pub mod encoding;
pub mod progress;
pub mod words;

pub use encoding::*;
pub use progress::*;
pub use words::*;
