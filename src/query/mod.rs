//! Query language: tokenizer and evaluation engine.
//!
//! Grammar (informal):
//!
//! ```text
//! expr    := term (command term)*
//! term    := word | "(" expr ")"
//! command := "/" | "|" | "&" | "+" | "," | "-" | "~" digits
//! word    := ("sw" | "startswith" | "gr" | "grammar")? literal
//! ```

mod engine;
mod tokenizer;

pub use engine::QueryEngine;
pub use tokenizer::{CommandKind, Token, tokenize};
