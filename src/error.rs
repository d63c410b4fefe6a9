use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the crate surfaces to its callers.
///
/// Absence of a word in the index is *not* an error; lookups for unknown
/// words yield the empty [`Passage`](crate::passage::Passage).
#[derive(Debug, Error)]
pub enum Error {
    /// A (book, chapter, verse) triple falls outside the versification.
    #[error("invalid reference: book {book} chapter {chapter} verse {verse}")]
    InvalidReference { book: u8, chapter: u16, verse: u16 },

    /// An ordinal falls outside `1..=max_ordinal`.
    #[error("invalid ordinal {0}")]
    InvalidOrdinal(u32),

    /// A malformed query string. `pos` is the byte offset of the offending
    /// token within the original query.
    #[error("search syntax error at offset {pos}: {message}")]
    SearchSyntax { pos: usize, message: String },

    /// Reading or writing the data blob, entry table, or metadata failed,
    /// or the on-disk data is corrupt. Surfaced during both build and
    /// query; never downgraded to an empty result.
    #[error("index i/o failure ({context})")]
    IndexIo {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A build was requested for a book whose build lock is already held.
    #[error("an index build for '{0}' is already running")]
    ConcurrentBuild(String),
}

impl Error {
    pub(crate) fn syntax(pos: usize, message: impl Into<String>) -> Self {
        Error::SearchSyntax {
            pos,
            message: message.into(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::IndexIo {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn corrupt(context: impl Into<String>) -> Self {
        let context = context.into();
        Error::IndexIo {
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, context.clone()),
            context,
        }
    }
}
