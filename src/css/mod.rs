//! Lightweight `@font-face` scanning and source rewriting.
//!
//! This is a lexical scan, not a CSS grammar: it recognizes flat
//! `@font-face { ... }` rules (optionally preceded by a `/* comment */`) and
//! the `url(...)` tokens inside them. Nested braces and malformed CSS are
//! out of scope.

mod parser;
mod rewriter;

pub use parser::{FontFaceBlock, SourceRef, parse};
pub use rewriter::{Replacement, data_uri_reference, relative_reference, rewrite};
