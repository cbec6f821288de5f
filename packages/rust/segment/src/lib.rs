//! Content segmenter: splits a markdown/text document into ordered sections
//! by heading boundaries.
//!
//! Heading markers of depth 1–3 open a new section; deeper markers are
//! treated as inline emphasis and stay in the body. Segmentation always
//! succeeds for any string input.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use stylepress_shared::{Section, SectionId};

/// ATX heading at any depth; depth decides boundary vs. body text.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)\s*#*\s*$").expect("valid regex"));

/// Heading depth beyond which a marker no longer opens a section.
const MAX_BOUNDARY_DEPTH: usize = 3;

/// Split raw text into ordered sections.
///
/// - A document with no headings yields exactly one section with an empty
///   heading.
/// - Leading content before the first heading becomes its own heading-less
///   section.
/// - An empty document yields zero sections.
/// - Heading markers inside fenced code blocks are body text, not boundaries.
#[instrument(skip(raw), fields(len = raw.len()))]
pub fn segment(raw: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut heading = String::new();
    let mut heading_level: u8 = 2;
    let mut body: Vec<&str> = Vec::new();
    let mut opened = false;
    let mut in_code_fence = false;

    for line in raw.lines() {
        if line.trim_start().starts_with("```") {
            in_code_fence = !in_code_fence;
            body.push(line);
            opened = true;
            continue;
        }

        let boundary = if in_code_fence {
            None
        } else {
            HEADING_RE.captures(line).and_then(|caps| {
                let depth = caps[1].len();
                (depth <= MAX_BOUNDARY_DEPTH)
                    .then(|| (depth as u8, caps[2].trim().to_string()))
            })
        };

        match boundary {
            Some((depth, text)) => {
                // Close the accumulating section, even a heading-less one,
                // so leading content is not lost.
                if opened {
                    sections.push(make_section(&heading, heading_level, &body));
                }
                heading = text;
                heading_level = depth;
                body.clear();
                opened = true;
            }
            None => {
                body.push(line);
                opened = opened || !line.trim().is_empty();
            }
        }
    }

    if opened {
        sections.push(make_section(&heading, heading_level, &body));
    }

    debug!(sections = sections.len(), "segmentation complete");
    sections
}

fn make_section(heading: &str, heading_level: u8, body: &[&str]) -> Section {
    Section {
        id: SectionId::new(),
        heading: heading.to_string(),
        heading_level,
        content: body.join("\n").trim().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_sections() {
        assert!(segment("").is_empty());
        assert!(segment("   \n  \n").is_empty());
    }

    #[test]
    fn no_headings_yields_single_unheaded_section() {
        let sections = segment("just a paragraph\nand another line");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].content, "just a paragraph\nand another line");
    }

    #[test]
    fn leading_content_becomes_own_section() {
        let sections = segment("intro text\n## Heading\nbody");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading, "");
        assert_eq!(sections[0].content, "intro text");
        assert_eq!(sections[1].heading, "Heading");
        assert_eq!(sections[1].heading_level, 2);
        assert_eq!(sections[1].content, "body");
    }

    #[test]
    fn depth_one_through_three_are_boundaries() {
        let sections = segment("# One\na\n## Two\nb\n### Three\nc");
        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].heading_level, 1);
        assert_eq!(sections[1].heading_level, 2);
        assert_eq!(sections[2].heading_level, 3);
    }

    #[test]
    fn depth_four_stays_in_body() {
        let sections = segment("## Section\ntext\n#### Not a boundary\nmore");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("#### Not a boundary"));
    }

    #[test]
    fn hash_inside_code_fence_is_body_text() {
        let raw = "## Code\n```bash\n# comment, not a heading\necho hi\n```\ntail";
        let sections = segment(raw);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].content.contains("# comment, not a heading"));
    }

    #[test]
    fn trailing_heading_with_no_body_is_kept() {
        let sections = segment("## First\nbody\n## Empty Tail");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].heading, "Empty Tail");
        assert_eq!(sections[1].content, "");
    }

    #[test]
    fn closing_hashes_are_stripped() {
        let sections = segment("## Heading ##\nbody");
        assert_eq!(sections[0].heading, "Heading");
    }

    #[test]
    fn sections_keep_document_order() {
        let sections = segment("# A\n1\n## B\n2\n# C\n3");
        let headings: Vec<_> = sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["A", "B", "C"]);
    }
}
