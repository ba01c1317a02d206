//! Table-driven parser dispatch.
//!
//! [`PARSERS`] is an ordered, append-only list of `(handles, parse)` pairs —
//! one entry per format dialect. The manifest generator picks the first
//! parser whose [`DocParser::handles`] matches a given path and hands it
//! the raw file bytes. Adding a new format is a pure append to this list;
//! no existing dispatch logic changes.

mod markdown;
mod mdx;
mod text;
mod tsx;

use std::path::Path;

use crate::error::Result;
use crate::types::Outline;

pub use markdown::MarkdownParser;
pub use mdx::MdxParser;
pub use text::TextParser;
pub use tsx::TsxParser;

/// The structured result of parsing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    /// Human-facing description string, built per the format's rules.
    pub description: String,
    /// Structural outline: headings, exports, or none.
    pub outline: Outline,
    /// Total line count of the original file.
    pub lines: usize,
    /// `documentation` or `code`, TS/TSX only.
    pub component: Option<&'static str>,
}

/// A format-specific parser. Implementations must never fail on
/// well-formed UTF-8 input of their declared type — at worst they return
/// an empty description and an empty outline.
pub trait DocParser: Send + Sync {
    /// Returns `true` if this parser claims `path` by its detected type.
    fn handles(&self, path: &Path) -> bool;

    /// Parses `bytes` (the raw file content at `path`) into a [`ParseResult`].
    fn parse(&self, path: &Path, bytes: &[u8]) -> Result<ParseResult>;
}

/// The ordered parser table. The manifest generator dispatches to the
/// first entry whose `handles` returns true.
pub fn table() -> Vec<Box<dyn DocParser>> {
    vec![
        Box::new(MarkdownParser),
        Box::new(MdxParser),
        Box::new(TextParser),
        Box::new(TsxParser),
    ]
}

/// Finds and runs the first matching parser for `path`, if any.
pub fn dispatch(path: &Path, bytes: &[u8]) -> Option<Result<ParseResult>> {
    table()
        .into_iter()
        .find(|p| p.handles(path))
        .map(|p| p.parse(path, bytes))
}

/// Collapses runs of ASCII/Unicode whitespace to a single space and trims
/// the ends. Shared by every parser that builds a heading or description
/// string from raw source text.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Counts lines the way the spec defines `lines`: newline count + 1 (a
/// file with no trailing newline still has at least one line; an empty
/// file has exactly one line).
pub(crate) fn count_lines(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| b == b'\n').count() + 1
}
