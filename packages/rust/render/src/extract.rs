//! Structured sub-content extraction from raw section text.
//!
//! Each extractor is conservative: it returns only what it confidently
//! matched, and the dispatcher decides whether the yield is enough for the
//! target component or whether to fall back to prose.

use std::sync::LazyLock;

use regex::Regex;

static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+(.+?)\s*$").expect("valid regex"));

static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(?:step\s+)?(\d+)[.):]\s+(.+?)\s*$").expect("valid regex")
});

static QUESTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:#+\s*)?(.{4,}\?)\s*$").expect("valid regex"));

static STAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:[.,]\d+)?\s*(?:%|percent)|\d{1,3}(?:[.,]\d{3})+)\s+([a-zA-Z][a-zA-Z\s]{2,40})")
        .expect("valid regex")
});

static QUOTE_ATTRIBUTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[—–-]{1,2}\s*(.+)$").expect("valid regex"));

/// A list/step item with an optional title/description split.
#[derive(Debug, Clone, PartialEq)]
pub struct TitledItem {
    pub title: String,
    pub description: String,
}

/// A question with its following answer paragraph(s).
#[derive(Debug, Clone, PartialEq)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A numeric figure with its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

/// A parsed markdown table.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Split an item on its first `": "` / `" - "` / `" — "` into title and
/// description; items without a split keep everything in `title`.
fn split_item(raw: &str) -> TitledItem {
    for sep in [": ", " — ", " - "] {
        if let Some((title, description)) = raw.split_once(sep) {
            if !title.trim().is_empty() && !description.trim().is_empty() {
                return TitledItem {
                    title: strip_emphasis(title.trim()),
                    description: description.trim().to_string(),
                };
            }
        }
    }
    TitledItem {
        title: strip_emphasis(raw.trim()),
        description: String::new(),
    }
}

/// Remove surrounding markdown emphasis markers from a short span.
fn strip_emphasis(s: &str) -> String {
    s.trim_matches(|c| c == '*' || c == '_').to_string()
}

/// Extract bullet-list items.
pub fn bullets(content: &str) -> Vec<TitledItem> {
    BULLET_RE
        .captures_iter(content)
        .map(|c| split_item(&c[1]))
        .collect()
}

/// Extract an ordered/numbered step sequence, preserving document order.
pub fn steps(content: &str) -> Vec<TitledItem> {
    NUMBERED_RE
        .captures_iter(content)
        .map(|c| split_item(&c[2]))
        .collect()
}

/// Pair question-like lines with the following answer paragraphs.
pub fn faqs(content: &str) -> Vec<QaPair> {
    let mut pairs: Vec<QaPair> = Vec::new();
    let mut current: Option<QaPair> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(caps) = QUESTION_RE.captures(trimmed) {
            if let Some(pair) = current.take() {
                if !pair.answer.is_empty() {
                    pairs.push(pair);
                }
            }
            current = Some(QaPair {
                question: strip_emphasis(&caps[1]),
                answer: String::new(),
            });
        } else if let Some(pair) = current.as_mut() {
            if !trimmed.is_empty() {
                if !pair.answer.is_empty() {
                    pair.answer.push(' ');
                }
                pair.answer.push_str(trimmed.trim_start_matches(['-', '*']).trim());
            }
        }
    }

    if let Some(pair) = current {
        if !pair.answer.is_empty() {
            pairs.push(pair);
        }
    }

    pairs
}

/// Extract numeric figures with trailing labels ("95% customer satisfaction").
pub fn stats(content: &str) -> Vec<Stat> {
    STAT_RE
        .captures_iter(content)
        .map(|c| Stat {
            value: c[1].trim().to_string(),
            label: c[2].trim().to_string(),
        })
        .collect()
}

/// Parse the first markdown table in the content.
pub fn table(content: &str) -> Option<Table> {
    let mut lines = content.lines().filter(|l| l.trim_start().starts_with('|'));

    let header_line = lines.next()?;
    let separator = lines.next()?;
    if !separator.contains("---") {
        return None;
    }

    let parse_row = |line: &str| -> Vec<String> {
        line.trim()
            .trim_matches('|')
            .split('|')
            .map(|cell| cell.trim().to_string())
            .collect()
    };

    let headers = parse_row(header_line);
    let rows: Vec<Vec<String>> = lines.map(parse_row).collect();

    if headers.is_empty() || rows.is_empty() {
        return None;
    }
    Some(Table { headers, rows })
}

/// Extract a leading `>` blockquote and an optional `— Name` attribution.
pub fn quote(content: &str) -> Option<(String, Option<String>)> {
    let mut quote_lines: Vec<&str> = Vec::new();
    let mut attribution: Option<String> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('>') {
            quote_lines.push(rest.trim());
        } else if !quote_lines.is_empty() {
            if let Some(caps) = QUOTE_ATTRIBUTION_RE.captures(trimmed) {
                attribution = Some(caps[1].trim().to_string());
            }
            break;
        }
    }

    if quote_lines.is_empty() {
        None
    } else {
        Some((quote_lines.join(" "), attribution))
    }
}

/// Split content into paragraphs on blank lines, skipping list/table lines
/// already consumed by structured extraction at the caller's discretion.
pub fn paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(|p| p.trim().replace('\n', " "))
        .filter(|p| !p.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_split_on_colon() {
        let items = bullets("- Cleaning: weekly service\n- Maintenance: upkeep\n- Billing");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Cleaning");
        assert_eq!(items[0].description, "weekly service");
        assert_eq!(items[2].title, "Billing");
        assert_eq!(items[2].description, "");
    }

    #[test]
    fn bullets_strip_bold_markers() {
        let items = bullets("- **Fast**: same-day response\n- **Fair**: fixed pricing");
        assert_eq!(items[0].title, "Fast");
    }

    #[test]
    fn steps_match_numbered_and_step_prefixed_lines() {
        let items = steps("1. Call us\n2) Get a quote\nStep 3: Sign the contract");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Call us");
        assert_eq!(items[2].title, "Sign the contract");
    }

    #[test]
    fn steps_keep_document_order() {
        let items = steps("1. First\n2. Second\n3. Third");
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn faqs_pair_questions_with_answers() {
        let content = "How long does it take?\nUsually one week.\n\nWhat does it cost?\nFrom 10 euros per month.";
        let pairs = faqs(content);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "How long does it take?");
        assert_eq!(pairs[0].answer, "Usually one week.");
    }

    #[test]
    fn question_without_answer_is_dropped() {
        let pairs = faqs("Is this the end?");
        assert!(pairs.is_empty());
    }

    #[test]
    fn multi_line_answers_are_joined() {
        let content = "Why choose us?\nTwo decades of experience.\nLocal teams everywhere.";
        let pairs = faqs(content);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "Two decades of experience. Local teams everywhere.");
    }

    #[test]
    fn stats_capture_value_and_label() {
        let found = stats("We serve 12,000 households with 98% satisfaction today.");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].value, "12,000");
        assert_eq!(found[1].value, "98%");
        assert!(found[1].label.contains("satisfaction"));
    }

    #[test]
    fn table_parses_headers_and_rows() {
        let content = "| Plan | Price |\n|------|-------|\n| Basic | $10 |\n| Pro | $25 |";
        let parsed = table(content).expect("table");
        assert_eq!(parsed.headers, vec!["Plan", "Price"]);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1], vec!["Pro", "$25"]);
    }

    #[test]
    fn table_requires_separator_row() {
        assert!(table("| a | b |\n| c | d |").is_none());
    }

    #[test]
    fn quote_with_attribution() {
        let content = "> Excellent service, always reachable.\n— R. Janssen, Amsterdam";
        let (text, who) = quote(content).expect("quote");
        assert_eq!(text, "Excellent service, always reachable.");
        assert_eq!(who.as_deref(), Some("R. Janssen, Amsterdam"));
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let paras = paragraphs("First paragraph\nstill first.\n\nSecond paragraph.");
        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0], "First paragraph still first.");
    }
}
