//! Format detection and preflight utilities.
//!
//! This is a leaf module: it has no dependency on the parser table, so the
//! parsers (and anything else) can depend on it without creating a cycle.
//! Covers extension-to-type classification, binary detection, BOM
//! stripping, and YAML front-matter extraction — the shared plumbing every
//! parser in [`crate::parser`] builds on.

use std::path::Path;

/// Detected file-type tag, driven purely by extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// `.md`
    Markdown,
    /// `.mdx`
    Mdx,
    /// `.txt`
    Text,
    /// `.tsx`
    Tsx,
    /// `.ts`
    Ts,
    /// Anything else.
    Unknown,
}

impl FileType {
    /// Classifies a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        match ext.as_deref() {
            Some("md") => Self::Markdown,
            Some("mdx") => Self::Mdx,
            Some("txt") => Self::Text,
            Some("tsx") => Self::Tsx,
            Some("ts") => Self::Ts,
            _ => Self::Unknown,
        }
    }

    /// The tag as it appears in manifest file records (`md|mdx|txt|tsx|ts|unknown`).
    #[must_use]
    pub const fn as_tag(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Mdx => "mdx",
            Self::Text => "txt",
            Self::Tsx => "tsx",
            Self::Ts => "ts",
            Self::Unknown => "unknown",
        }
    }
}

/// Number of leading bytes inspected for a NUL byte when classifying binary content.
pub const BINARY_SNIFF_LEN: usize = 512;

/// Returns `true` if the first [`BINARY_SNIFF_LEN`] bytes contain a NUL byte.
///
/// This is the same heuristic Git and most text tools use: genuine UTF-8
/// documentation never embeds NUL, so its presence is a reliable binary
/// signal without needing a full UTF-8 validation pass.
#[must_use]
pub fn is_binary(bytes: &[u8]) -> bool {
    let sniff = &bytes[..bytes.len().min(BINARY_SNIFF_LEN)];
    sniff.contains(&0)
}

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Strips a leading UTF-8 byte-order marker, if present.
#[must_use]
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    if bytes.starts_with(&UTF8_BOM) {
        &bytes[UTF8_BOM.len()..]
    } else {
        bytes
    }
}

/// A parsed YAML front-matter block: the raw `title`/`description` fields
/// (only these two are extracted, per the spec) plus the number of lines
/// the front-matter block itself occupied in the original file, so callers
/// can offset line numbers computed against the stripped body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    /// `title:` value, trimmed and unquoted.
    pub title: Option<String>,
    /// `description:` value, trimmed and unquoted.
    pub description: Option<String>,
    /// Number of lines consumed by the front-matter block, including both fences.
    pub line_offset: usize,
}

/// Extracts YAML front-matter from the start of `text`, if present.
///
/// Front-matter begins with a line that is exactly `---` (CR is tolerated)
/// and ends at the next such line. If no closing fence is found, the whole
/// text is treated as body and `None` is returned.
#[must_use]
pub fn extract_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end_matches(['\r', '\n']) != "---" {
        return (None, text);
    }

    let mut consumed = first.len();
    let mut body_start = None;
    let mut block = String::new();
    let mut line_count = 1;

    for line in lines {
        consumed += line.len();
        line_count += 1;
        if line.trim_end_matches(['\r', '\n']) == "---" {
            body_start = Some(consumed);
            break;
        }
        block.push_str(line);
    }

    let Some(body_start) = body_start else {
        return (None, text);
    };

    let mut fm = FrontMatter {
        line_offset: line_count,
        ..Default::default()
    };
    for line in block.lines() {
        if let Some(rest) = line.strip_prefix("title:") {
            fm.title = Some(unquote(rest.trim()));
        } else if let Some(rest) = line.strip_prefix("description:") {
            fm.description = Some(unquote(rest.trim()));
        }
    }

    (Some(fm), &text[body_start..])
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 {
        let bytes = s.as_bytes();
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_known_extensions_case_insensitively() {
        assert_eq!(
            FileType::from_path(&PathBuf::from("README.MD")),
            FileType::Markdown
        );
        assert_eq!(FileType::from_path(&PathBuf::from("a.mdx")), FileType::Mdx);
        assert_eq!(FileType::from_path(&PathBuf::from("a.txt")), FileType::Text);
        assert_eq!(FileType::from_path(&PathBuf::from("a.tsx")), FileType::Tsx);
        assert_eq!(FileType::from_path(&PathBuf::from("a.ts")), FileType::Ts);
        assert_eq!(
            FileType::from_path(&PathBuf::from("a.png")),
            FileType::Unknown
        );
        assert_eq!(
            FileType::from_path(&PathBuf::from("noext")),
            FileType::Unknown
        );
    }

    #[test]
    fn detects_nul_byte_within_sniff_window() {
        let mut bytes = vec![b'a'; 100];
        bytes[50] = 0;
        assert!(is_binary(&bytes));
        assert!(!is_binary(b"plain ascii text"));
    }

    #[test]
    fn nul_beyond_sniff_window_is_not_binary() {
        let mut bytes = vec![b'a'; BINARY_SNIFF_LEN + 10];
        bytes[BINARY_SNIFF_LEN + 5] = 0;
        assert!(!is_binary(&bytes));
    }

    #[test]
    fn strips_leading_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"hello");
        assert_eq!(strip_bom(&bytes), b"hello");
        assert_eq!(strip_bom(b"hello"), b"hello");
    }

    #[test]
    fn extracts_title_and_description() {
        let text = "---\ntitle: Q\ndescription: 'An answer'\n---\n\nBody text\n";
        let (fm, body) = extract_front_matter(text);
        let fm = fm.expect("front matter present");
        assert_eq!(fm.title.as_deref(), Some("Q"));
        assert_eq!(fm.description.as_deref(), Some("An answer"));
        assert_eq!(body, "\nBody text\n");
        assert_eq!(fm.line_offset, 4);
    }

    #[test]
    fn missing_closing_fence_yields_no_front_matter() {
        let text = "---\ntitle: Q\n\nBody\n";
        let (fm, body) = extract_front_matter(text);
        assert!(fm.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn no_leading_fence_yields_no_front_matter() {
        let text = "# Heading\n\nBody\n";
        let (fm, body) = extract_front_matter(text);
        assert!(fm.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn tolerates_crlf_fences() {
        let text = "---\r\ntitle: Q\r\n---\r\nBody\r\n";
        let (fm, body) = extract_front_matter(text);
        let fm = fm.expect("front matter present");
        assert_eq!(fm.title.as_deref(), Some("Q"));
        assert_eq!(body, "Body\r\n");
    }
}
