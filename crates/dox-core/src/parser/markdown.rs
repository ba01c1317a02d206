//! Markdown parser: front-matter + CommonMark heading extraction.
//!
//! Headings are extracted with `tree-sitter-md`, the same CommonMark
//! engine the teacher crate uses, rather than regex or line scanning —
//! fenced code blocks are structurally distinct nodes so they never
//! contribute spurious headings.

use std::path::Path;

use tree_sitter::{Node, Parser, TreeCursor};

use crate::detect::{self, FileType};
use crate::error::{Error, Result};
use crate::types::{HeadingItem, Outline};

use super::{ParseResult, collapse_whitespace, count_lines};

/// Parses Markdown (`.md`) files.
pub struct MarkdownParser;

impl super::DocParser for MarkdownParser {
    fn handles(&self, path: &Path) -> bool {
        FileType::from_path(path) == FileType::Markdown
    }

    fn parse(&self, _path: &Path, bytes: &[u8]) -> Result<ParseResult> {
        parse_markdown_bytes(bytes)
    }
}

/// Parses raw Markdown bytes (BOM + front-matter aware). Shared with the
/// MDX parser, which delegates here after stripping JS syntax.
pub(crate) fn parse_markdown_bytes(bytes: &[u8]) -> Result<ParseResult> {
    let lines = count_lines(bytes);
    let stripped = detect::strip_bom(bytes);
    let text = String::from_utf8_lossy(stripped);
    let (front_matter, body) = detect::extract_front_matter(&text);
    let line_offset = front_matter.as_ref().map_or(0, |fm| fm.line_offset);

    let headings = extract_headings(body)?;

    let first_paragraph = first_paragraph(body);
    let description = build_description(
        front_matter.as_ref().and_then(|fm| fm.title.as_deref()),
        front_matter.as_ref().and_then(|fm| fm.description.as_deref()),
        &headings,
        body,
        first_paragraph.as_deref(),
    );

    let offset_headings: Vec<HeadingItem> = headings
        .into_iter()
        .map(|mut h| {
            h.line += line_offset;
            h
        })
        .collect();

    let outline = if offset_headings.is_empty() {
        Outline::None
    } else {
        Outline::Headings {
            items: offset_headings,
        }
    };

    Ok(ParseResult {
        description,
        outline,
        lines,
        component: None,
    })
}

fn build_description(
    title: Option<&str>,
    fm_description: Option<&str>,
    headings: &[HeadingItem],
    body: &str,
    first_paragraph: Option<&str>,
) -> String {
    match (title, fm_description) {
        (Some(t), Some(d)) if !t.is_empty() && !d.is_empty() => format!("{t} - {d}"),
        (Some(t), _) if !t.is_empty() => t.to_string(),
        (_, Some(d)) if !d.is_empty() => d.to_string(),
        _ => {
            if let Some(h1) = headings.iter().find(|h| h.level == 1) {
                if let Some(para) = paragraph_after_heading(body, h1.line, headings) {
                    return format!("{} - {para}", h1.text);
                }
                return h1.text.clone();
            }
            first_paragraph.unwrap_or_default().to_string()
        },
    }
}

/// Finds the first non-blank paragraph in the document (used for rule 5,
/// and as a fallback when no H1 has a following paragraph for rule 4).
fn first_paragraph(body: &str) -> Option<String> {
    let mut para = String::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !para.is_empty() {
                break;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with("```") {
            if !para.is_empty() {
                break;
            }
            continue;
        }
        if !para.is_empty() {
            para.push(' ');
        }
        para.push_str(trimmed);
    }
    if para.is_empty() {
        None
    } else {
        Some(collapse_whitespace(&para))
    }
}

/// The paragraph immediately following the heading at `h1_line` (1-based,
/// in `body`'s own coordinate space), stopping at the next heading.
fn paragraph_after_heading(body: &str, h1_line: usize, headings: &[HeadingItem]) -> Option<String> {
    let next_heading_line = headings
        .iter()
        .map(|h| h.line)
        .filter(|&l| l > h1_line)
        .min();

    let mut para = String::new();
    for (idx, line) in body.lines().enumerate() {
        let line_no = idx + 1;
        if line_no <= h1_line {
            continue;
        }
        if let Some(next) = next_heading_line {
            if line_no >= next {
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !para.is_empty() {
                break;
            }
            continue;
        }
        if !para.is_empty() {
            para.push(' ');
        }
        para.push_str(trimmed);
    }
    if para.is_empty() {
        None
    } else {
        Some(collapse_whitespace(&para))
    }
}

fn extract_headings(body: &str) -> Result<Vec<HeadingItem>> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_md::LANGUAGE.into())
        .map_err(|e| Error::parse(format!("failed to set tree-sitter language: {e}")))?;

    let tree = parser
        .parse(body, None)
        .ok_or_else(|| Error::parse("tree-sitter failed to parse markdown"))?;

    let mut headings = Vec::new();
    let mut cursor = tree.root_node().walk();
    walk(&mut cursor, body, &mut headings);
    Ok(headings)
}

fn walk(cursor: &mut TreeCursor, body: &str, headings: &mut Vec<HeadingItem>) {
    loop {
        let node = cursor.node();
        match node.kind() {
            "atx_heading" => {
                if let Some(item) = atx_heading_item(node, body) {
                    headings.push(item);
                }
            },
            "setext_heading" => {
                if let Some(item) = setext_heading_item(node, body) {
                    headings.push(item);
                }
            },
            _ => {},
        }

        if cursor.goto_first_child() {
            continue;
        }
        if cursor.goto_next_sibling() {
            continue;
        }
        loop {
            if !cursor.goto_parent() {
                return;
            }
            if cursor.goto_next_sibling() {
                break;
            }
        }
    }
}

fn atx_heading_item(node: Node, body: &str) -> Option<HeadingItem> {
    let level = atx_level(node)?;
    let raw = &body[node.byte_range()];
    let text = collapse_whitespace(raw.trim_start_matches('#').trim());
    if text.is_empty() {
        return None;
    }
    Some(HeadingItem {
        level,
        text,
        line: node.start_position().row + 1,
    })
}

fn atx_level(node: Node) -> Option<u8> {
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "atx_h1_marker" => return Some(1),
            "atx_h2_marker" => return Some(2),
            "atx_h3_marker" => return Some(3),
            "atx_h4_marker" => return Some(4),
            "atx_h5_marker" => return Some(5),
            "atx_h6_marker" => return Some(6),
            _ => {},
        }
    }
    None
}

fn setext_heading_item(node: Node, body: &str) -> Option<HeadingItem> {
    let mut level = None;
    let mut content_node = None;
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "setext_h1_underline" => level = Some(1),
            "setext_h2_underline" => level = Some(2),
            "paragraph" => content_node = Some(child),
            _ => {},
        }
    }
    let level = level?;
    let content_node = content_node?;
    let raw = &body[content_node.byte_range()];
    let text = collapse_whitespace(raw);
    if text.is_empty() {
        return None;
    }
    Some(HeadingItem {
        level,
        text,
        line: content_node.start_position().row + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DocParser;

    #[test]
    fn front_matter_title_and_description_combine() {
        let bytes = b"---\ntitle: Q\ndescription: An answer\n---\n\n## Section\n\nbody\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        assert_eq!(result.description, "Q - An answer");
        match result.outline {
            Outline::Headings { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].level, 2);
                assert_eq!(items[0].text, "Section");
                assert_eq!(items[0].line, 6);
            },
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn falls_back_to_first_h1_and_paragraph() {
        let bytes = b"# Getting Started\n\nA quick intro.\n\n## Install\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        assert_eq!(result.description, "Getting Started - A quick intro.");
    }

    #[test]
    fn falls_back_to_first_paragraph_with_no_headings() {
        let bytes = b"Just a line of body text.\n\nMore stuff.\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        assert_eq!(result.description, "Just a line of body text.");
        assert_eq!(result.outline, Outline::None);
    }

    #[test]
    fn fenced_code_blocks_do_not_produce_headings() {
        let bytes = b"# Title\n\n```\n# not a heading\n```\n\n## Real\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        match result.outline {
            Outline::Headings { items } => {
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].text, "Real");
            },
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn duplicate_heading_text_gets_distinct_lines() {
        let bytes = b"## Overview\n\nbody\n\n## Overview\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        match result.outline {
            Outline::Headings { items } => {
                assert_eq!(items.len(), 2);
                assert_ne!(items[0].line, items[1].line);
            },
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn missing_closing_fence_treats_whole_file_as_body() {
        let bytes = b"---\ntitle: Q\n\n# Heading\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        match result.outline {
            Outline::Headings { items } => assert_eq!(items[0].line, 4),
            _ => panic!("expected headings"),
        }
    }

    #[test]
    fn lines_counted_against_whole_original_file() {
        let bytes = b"---\ntitle: Q\n---\n\n# H\n\nbody\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        assert_eq!(result.lines, count_lines(bytes));
    }

    #[test]
    fn setext_heading_is_recognized() {
        let bytes = b"Title\n=====\n\nbody\n";
        let result = MarkdownParser.parse(Path::new("a.md"), bytes).expect("parse");
        match result.outline {
            Outline::Headings { items } => {
                assert_eq!(items[0].level, 1);
                assert_eq!(items[0].text, "Title");
            },
            _ => panic!("expected headings"),
        }
    }
}
