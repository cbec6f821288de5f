//! Role classification: heading/content keyword matching plus structural
//! pattern checks, in fixed priority order. First match wins.
//!
//! The keyword term sets come from config ([`RoleKeywords`]) so the
//! vocabulary can be swapped per language; the structural patterns
//! (numbered steps, question lines, table markers, bullet dominance) are
//! language-neutral.

use std::sync::LazyLock;

use regex::Regex;

use stylepress_shared::{Role, RoleKeywords, Section};

/// Ordered-step line: `1. Do this` or `2) Then that`.
static NUMBERED_STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\d+[.)]\s+\S").expect("valid regex"));

/// Bullet line: `- item` or `* item`.
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+\S").expect("valid regex"));

/// Markdown table separator row.
static TABLE_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\|?[\s:-]*---").expect("valid regex"));

/// Lines ending in a question mark.
static QUESTION_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^.{4,}\?\s*$").expect("valid regex"));

/// Percentages or large figures, a weak signal for data-heavy sections.
static STAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?\s*%|\d{1,3}(?:[.,]\d{3})+").expect("valid regex"));

/// Classify a single section's semantic role.
///
/// `index` is the section's position in the document; a heading-less leading
/// section classifies as introduction.
pub fn classify(section: &Section, index: usize, keywords: &RoleKeywords) -> Role {
    let heading = section.heading.to_lowercase();
    let content = section.content.to_lowercase();
    let matches = |terms: &[String]| {
        terms
            .iter()
            .any(|t| heading.contains(t.as_str()) || content.starts_with(t.as_str()))
    };

    // Priority order: first match wins.
    if index == 0 && section.heading.is_empty() {
        return Role::Introduction;
    }
    if matches(&keywords.introduction) {
        return Role::Introduction;
    }
    if matches(&keywords.definition) {
        return Role::Definition;
    }
    if matches(&keywords.faq) || question_count(&section.content) >= 2 {
        return Role::Faq;
    }
    if matches(&keywords.steps) || NUMBERED_STEP_RE.find_iter(&section.content).count() >= 2 {
        return Role::Steps;
    }
    if matches(&keywords.comparison) || TABLE_MARKER_RE.is_match(&section.content) {
        return Role::Comparison;
    }
    if matches(&keywords.summary) {
        return Role::Summary;
    }
    if matches(&keywords.testimonial) || section.content.trim_start().starts_with('>') {
        return Role::Testimonial;
    }
    if matches(&keywords.data) || STAT_RE.find_iter(&section.content).count() >= 3 {
        return Role::Data;
    }
    if matches(&keywords.cta) {
        return Role::Cta;
    }
    if bullet_dominant(&section.content) {
        return Role::List;
    }

    // Content with no match defaults to explanation; bare fragments with no
    // heading stay plain prose.
    if section.heading.is_empty() {
        Role::Prose
    } else {
        Role::Explanation
    }
}

/// Count of question-shaped lines in the content.
fn question_count(content: &str) -> usize {
    QUESTION_LINE_RE.find_iter(content).count()
}

/// Bullet-list-dominant: at least 3 bullets covering at least half of the
/// non-empty lines.
fn bullet_dominant(content: &str) -> bool {
    let bullets = BULLET_RE.find_iter(content).count();
    if bullets < 3 {
        return false;
    }
    let non_empty = content.lines().filter(|l| !l.trim().is_empty()).count();
    bullets * 2 >= non_empty
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
