//! Plain text parser: no structure, just a description.

use std::path::Path;

use crate::detect::{self, FileType};
use crate::error::Result;
use crate::types::Outline;

use super::{ParseResult, count_lines};

/// Parses plain text (`.txt`) files.
pub struct TextParser;

impl super::DocParser for TextParser {
    fn handles(&self, path: &Path) -> bool {
        FileType::from_path(path) == FileType::Text
    }

    fn parse(&self, _path: &Path, bytes: &[u8]) -> Result<ParseResult> {
        let lines = count_lines(bytes);
        let stripped = detect::strip_bom(bytes);
        let text = String::from_utf8_lossy(stripped);
        let description = text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string();

        Ok(ParseResult {
            description,
            outline: Outline::None,
            lines,
            component: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DocParser;

    #[test]
    fn description_is_first_non_blank_line() {
        let bytes = b"\n\n  Hello world  \nmore text\n";
        let result = TextParser.parse(Path::new("a.txt"), bytes).expect("parse");
        assert_eq!(result.description, "Hello world");
        assert_eq!(result.outline, Outline::None);
    }

    #[test]
    fn empty_file_yields_empty_description() {
        let result = TextParser.parse(Path::new("a.txt"), b"").expect("parse");
        assert_eq!(result.description, "");
        assert_eq!(result.lines, 1);
    }

    #[test]
    fn lines_is_newline_count_plus_one() {
        let result = TextParser.parse(Path::new("a.txt"), b"a\nb\nc").expect("parse");
        assert_eq!(result.lines, 3);
    }
}
