//! TypeScript/TSX parser: classifies a file as `documentation` (JSX
//! headings) or `code` (top-level exports) by regex scan of the raw bytes.
//!
//! Per the spec's Open Question, line numbers for every match — heading
//! or export — are derived from the byte offset of that specific match,
//! never by re-searching for the match's text. This is what makes
//! duplicate heading/export text resolve to distinct, correct line
//! numbers.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::detect::{self, FileType};
use crate::error::Result;
use crate::types::{ExportItem, ExportKind, HeadingItem, Outline};

use super::{ParseResult, collapse_whitespace, count_lines};

/// Parses TypeScript (`.ts`) and TSX (`.tsx`) files.
pub struct TsxParser;

impl super::DocParser for TsxParser {
    fn handles(&self, path: &Path) -> bool {
        matches!(FileType::from_path(path), FileType::Ts | FileType::Tsx)
    }

    fn parse(&self, _path: &Path, bytes: &[u8]) -> Result<ParseResult> {
        let stripped = detect::strip_bom(bytes);
        let text = String::from_utf8_lossy(stripped);
        let lines = count_lines(bytes);

        let headings = find_jsx_headings(&text);
        if headings.len() >= 2 {
            let description = headings
                .iter()
                .find(|h| h.level == 1)
                .or_else(|| headings.first())
                .map(|h| h.text.clone())
                .unwrap_or_default();
            return Ok(ParseResult {
                description,
                outline: Outline::Headings { items: headings },
                lines,
                component: Some("documentation"),
            });
        }

        let exports = find_top_level_exports(&text);
        let description = first_jsdoc_summary(&text).unwrap_or_else(|| {
            exports
                .first()
                .map(|e| format!("{} {}", e.r#type.keyword(), e.name))
                .unwrap_or_default()
        });

        Ok(ParseResult {
            description,
            outline: Outline::Exports { items: exports },
            lines,
            component: Some("code"),
        })
    }
}

fn heading_re(level: u8) -> Regex {
    Regex::new(&format!(r"(?is)<h{level}[^>]*>(.*?)</h{level}>")).expect("valid regex")
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn find_jsx_headings(text: &str) -> Vec<HeadingItem> {
    let mut matches: Vec<(usize, u8, String)> = Vec::new();
    for level in 1..=6u8 {
        let re = heading_re(level);
        for cap in re.captures_iter(text) {
            let whole = cap.get(0).expect("group 0 always present");
            let inner = cap.get(1).map_or("", |m| m.as_str());
            let stripped = tag_re().replace_all(inner, "");
            let collapsed = collapse_whitespace(&stripped);
            if collapsed.is_empty() {
                continue;
            }
            matches.push((whole.start(), level, collapsed));
        }
    }
    matches.sort_by_key(|(offset, _, _)| *offset);
    matches
        .into_iter()
        .map(|(offset, level, text_val)| HeadingItem {
            level,
            text: text_val,
            line: line_at(text, offset),
        })
        .collect()
}

fn export_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*export\s+(const|function|interface|type|class)\s+([A-Za-z_$][\w$]*)")
            .expect("valid regex")
    })
}

fn find_top_level_exports(text: &str) -> Vec<ExportItem> {
    let mut items = Vec::new();
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        if let Some(caps) = export_line_re().captures(line) {
            let keyword = caps.get(1).map_or("", |m| m.as_str());
            let name = caps.get(2).map_or("", |m| m.as_str());
            if let Some(kind) = ExportKind::from_keyword(keyword) {
                items.push(ExportItem {
                    r#type: kind,
                    name: name.to_string(),
                    line: line_at(text, offset),
                });
            }
        }
        offset += line.len();
    }
    items
}

fn jsdoc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*\*(.*?)\*/").expect("valid regex"))
}

fn first_jsdoc_summary(text: &str) -> Option<String> {
    let caps = jsdoc_re().captures(text)?;
    let body = caps.get(1)?.as_str();
    for raw_line in body.lines() {
        let line = raw_line.trim().trim_start_matches('*').trim();
        if line.is_empty() || line.starts_with('@') {
            continue;
        }
        return Some(line.to_string());
    }
    None
}

/// 1-based line number containing byte offset `offset`.
fn line_at(text: &str, offset: usize) -> usize {
    text.as_bytes()[..offset.min(text.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DocParser;

    #[test]
    fn classifies_documentation_with_two_or_more_headings() {
        let src = "<h1>Title</h1>\n<p>intro</p>\n<h2>Section</h2>\n";
        let result = TsxParser.parse(Path::new("a.tsx"), src.as_bytes()).expect("parse");
        assert_eq!(result.component, Some("documentation"));
        assert_eq!(result.description, "Title");
        match result.outline {
            Outline::Headings { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].line, 1);
                assert_eq!(items[1].line, 3);
            },
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn classifies_code_with_fewer_than_two_headings() {
        let src = "export function Widget() {\n  return null\n}\n";
        let result = TsxParser.parse(Path::new("a.tsx"), src.as_bytes()).expect("parse");
        assert_eq!(result.component, Some("code"));
        match result.outline {
            Outline::Exports { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].name, "Widget");
                assert_eq!(items[0].r#type, ExportKind::Function);
            },
            _ => panic!("expected exports"),
        }
        assert_eq!(result.description, "function Widget");
    }

    #[test]
    fn jsdoc_summary_used_over_export_fallback() {
        let src = "/**\n * Renders the widget.\n * @param x input\n */\nexport const Widget = () => null\n";
        let result = TsxParser.parse(Path::new("a.ts"), src.as_bytes()).expect("parse");
        assert_eq!(result.description, "Renders the widget.");
    }

    #[test]
    fn duplicate_export_names_get_distinct_lines() {
        let src = "export const x = 1\nexport const x = 2\n";
        let result = TsxParser.parse(Path::new("a.ts"), src.as_bytes()).expect("parse");
        match result.outline {
            Outline::Exports { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].line, 1);
                assert_eq!(items[1].line, 2);
            },
            _ => panic!("expected exports"),
        }
    }

    #[test]
    fn nested_tags_inside_heading_are_stripped() {
        let src = "<h1>Hello <b>World</b></h1>\n<h2>Two</h2>\n";
        let result = TsxParser.parse(Path::new("a.tsx"), src.as_bytes()).expect("parse");
        match result.outline {
            Outline::Headings { items } => assert_eq!(items[0].text, "Hello World"),
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn no_exports_yields_empty_items_and_empty_description() {
        let src = "const x = 1\n";
        let result = TsxParser.parse(Path::new("a.ts"), src.as_bytes()).expect("parse");
        assert_eq!(result.description, "");
        match result.outline {
            Outline::Exports { items } => assert!(items.is_empty()),
            _ => panic!("expected exports"),
        }
    }
}
