//! Query evaluation.
//!
//! The engine folds a token stream into a single result Passage. It keeps
//! a running accumulator per group frame plus just enough history for
//! blur, which rewrites the most recent operand rather than the whole
//! accumulator: `t1 & t2 ~ 1` blurs t2's passage, then redoes the
//! intersection against the pre-t2 accumulator.

use crate::error::{Error, Result};
use crate::index::WordLookup;
use crate::passage::{BlurRestriction, Passage};
use crate::query::tokenizer::{CommandKind, Token, tokenize};
use crate::utils::words::{Stemmer, SuffixStemmer, normalize_word};
use crate::versification::Versification;

/// The three commands that fold an operand into the accumulator. Blur and
/// the expansion keywords never reach this point; they rewrite operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Combine {
    #[default]
    Add,
    Retain,
    Remove,
}

fn combine(current: &Passage, operand: &Passage, how: Combine) -> Passage {
    match how {
        Combine::Add => current.union(operand),
        Combine::Retain => current.intersect(operand),
        Combine::Remove => current.subtract(operand),
    }
}

/// Pending word expansion set by `sw`/`gr`; consumed by the next word.
#[derive(Debug, Clone, Copy)]
enum Expand {
    StartsWith,
    Grammar,
}

/// Per-frame evaluation state. Groups push the outer frame and start
/// fresh; closing a group folds the inner result into the restored outer
/// frame as one operand.
#[derive(Default)]
struct Frame {
    current: Passage,
    /// Accumulator as it was before the last operand was combined in;
    /// blur rewinds to this.
    before_last: Passage,
    last_operand: Option<Passage>,
    last_combine: Combine,
    pending: Combine,
    /// Set when `pending` came from an explicit operator token, which
    /// then requires a right operand.
    pending_pos: Option<usize>,
    seen_operand: bool,
}

impl Frame {
    fn apply(&mut self, operand: Passage) {
        self.before_last = self.current.clone();
        self.current = combine(&self.current, &operand, self.pending);
        self.last_combine = self.pending;
        self.last_operand = Some(operand);
        self.pending = Combine::Add;
        self.pending_pos = None;
        self.seen_operand = true;
    }
}

static DEFAULT_STEMMER: SuffixStemmer = SuffixStemmer;

/// Evaluates query strings against one word index.
///
/// Cheap to construct; borrows the index handle and holds no state
/// between searches.
pub struct QueryEngine<'a> {
    index: &'a dyn WordLookup,
    v11n: &'static Versification,
    stemmer: &'a dyn Stemmer,
    restriction: BlurRestriction,
}

impl<'a> QueryEngine<'a> {
    pub fn new(index: &'a dyn WordLookup, v11n: &'static Versification) -> Self {
        Self {
            index,
            v11n,
            stemmer: &DEFAULT_STEMMER,
            restriction: BlurRestriction::default(),
        }
    }

    /// Replace the stemmer used for `gr`/`grammar` expansion.
    pub fn with_stemmer(mut self, stemmer: &'a dyn Stemmer) -> Self {
        self.stemmer = stemmer;
        self
    }

    /// Clip blur expansion at a structural boundary.
    pub fn with_blur_restriction(mut self, restriction: BlurRestriction) -> Self {
        self.restriction = restriction;
        self
    }

    /// Evaluate `query` and return the result Passage.
    pub fn search(&self, query: &str) -> Result<Passage> {
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return Err(Error::syntax(0, "empty query"));
        }

        let mut frame = Frame::default();
        let mut stack: Vec<(Frame, usize)> = Vec::new();
        let mut expand: Option<(Expand, usize)> = None;

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Param { text, .. } => {
                    let operand = self.resolve(text, expand.take().map(|(e, _)| e))?;
                    frame.apply(operand);
                }
                Token::Command { kind, pos } => {
                    let pos = *pos;
                    if expand.is_some() {
                        return Err(Error::syntax(pos, "expected a word after sw/gr"));
                    }
                    match kind {
                        CommandKind::Add | CommandKind::Retain | CommandKind::Remove => {
                            if frame.pending_pos.is_some() {
                                return Err(Error::syntax(pos, "operator follows an operator"));
                            }
                            let how = match kind {
                                CommandKind::Add => Combine::Add,
                                CommandKind::Retain => Combine::Retain,
                                _ => Combine::Remove,
                            };
                            if !frame.seen_operand && how != Combine::Add {
                                return Err(Error::syntax(pos, "operator has no left operand"));
                            }
                            frame.pending = how;
                            frame.pending_pos = Some(pos);
                        }
                        CommandKind::Blur => {
                            let radius = match tokens.get(i + 1) {
                                Some(Token::Param { text, pos }) => {
                                    text.parse::<u32>().map_err(|_| {
                                        Error::syntax(
                                            *pos,
                                            format!("blur radius '{text}' is not a number"),
                                        )
                                    })?
                                }
                                _ => return Err(Error::syntax(pos, "blur radius missing")),
                            };
                            i += 1;

                            let operand = frame
                                .last_operand
                                .take()
                                .ok_or_else(|| Error::syntax(pos, "nothing to blur"))?;
                            let blurred = operand.blur(radius, self.restriction, self.v11n)?;
                            frame.current =
                                combine(&frame.before_last, &blurred, frame.last_combine);
                            frame.last_operand = Some(blurred);
                        }
                        CommandKind::StartsWith => expand = Some((Expand::StartsWith, pos)),
                        CommandKind::Grammar => expand = Some((Expand::Grammar, pos)),
                        CommandKind::GroupOpen => {
                            stack.push((std::mem::take(&mut frame), pos));
                        }
                        CommandKind::GroupClose => {
                            if let Some(op_pos) = frame.pending_pos {
                                return Err(Error::syntax(op_pos, "operator dangling before ')'"));
                            }
                            if !frame.seen_operand {
                                return Err(Error::syntax(pos, "empty group"));
                            }
                            let Some((outer, _)) = stack.pop() else {
                                return Err(Error::syntax(pos, "unmatched ')'"));
                            };
                            let operand = std::mem::take(&mut frame.current);
                            frame = outer;
                            frame.apply(operand);
                        }
                    }
                }
            }
            i += 1;
        }

        if let Some((_, open_pos)) = stack.last() {
            return Err(Error::syntax(*open_pos, "unclosed group"));
        }
        if let Some((_, pos)) = expand {
            return Err(Error::syntax(pos, "sw/gr missing its word"));
        }
        if let Some(pos) = frame.pending_pos {
            return Err(Error::syntax(pos, "query ends with an operator"));
        }
        if !frame.seen_operand {
            return Err(Error::syntax(0, "query has no terms"));
        }

        Ok(frame.current)
    }

    /// [`search`](Self::search), then render the result's canonical name.
    pub fn search_name(&self, query: &str) -> Result<String> {
        self.search(query)?.name(self.v11n)
    }

    fn resolve(&self, raw: &str, expand: Option<Expand>) -> Result<Passage> {
        let word = normalize_word(raw);
        if word.is_empty() {
            return Ok(Passage::empty());
        }

        match expand {
            None => self.index.find(&word),
            Some(Expand::StartsWith) => self.union_of_prefix(&word, Passage::empty()),
            Some(Expand::Grammar) => {
                let own = self.index.find(&word)?;
                let root = self.stemmer.root(&word).to_string();
                self.union_of_prefix(&root, own)
            }
        }
    }

    fn union_of_prefix(&self, prefix: &str, seed: Passage) -> Result<Passage> {
        let mut result = seed;
        for word in self.index.find_prefix(prefix)? {
            result = result.union(&self.index.find(&word)?);
        }
        Ok(result)
    }
}
