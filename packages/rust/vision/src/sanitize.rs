//! Cleanup for collaborator-authored stylesheets.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:css)?\s*(.*?)```").expect("valid regex"));
static FIRST_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| {
        Regex::new(r"(?m)^\s*(?::root|@[a-z-]+[^{}\n]*|[.#\[a-zA-Z*][^{}\n]*)\s*\{")
            .expect("valid regex")
    });

/// Extract usable CSS from a collaborator reply.
///
/// Collaborators wrap CSS in markdown fences and often lead with commentary.
/// This keeps the fenced body when fences are present, otherwise drops
/// everything before the first rule. Returns `None` when nothing rule-like
/// survives or the result exceeds `max_chars`.
pub fn sanitize_stylesheet(raw: &str, max_chars: usize) -> Option<String> {
    let body = match FENCE_RE.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    };

    let start = FIRST_RULE_RE.find(&body)?.start();
    let css = body[start..].trim().to_string();

    if css.is_empty() || css.chars().count() > max_chars {
        return None;
    }
    Some(css)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_css_fence() {
        let raw = "Here is the improved stylesheet:\n```css\n:root { --sp-primary: #111; }\n```\nLet me know!";
        let css = sanitize_stylesheet(raw, 24_000).expect("usable");
        assert_eq!(css, ":root { --sp-primary: #111; }");
    }

    #[test]
    fn drops_prose_before_first_rule() {
        let raw = "I adjusted the spacing as requested.\n.sp-hero { padding: 2rem; }";
        let css = sanitize_stylesheet(raw, 24_000).expect("usable");
        assert!(css.starts_with(".sp-hero"));
        assert!(!css.contains("adjusted"));
    }

    #[test]
    fn keeps_media_query_openers() {
        let raw = "@media (min-width: 40rem) { .sp-section { padding: 1rem; } }";
        assert_eq!(sanitize_stylesheet(raw, 24_000).as_deref(), Some(raw));
    }

    #[test]
    fn pure_prose_is_unusable() {
        assert!(sanitize_stylesheet("Sorry, I cannot help with that.", 24_000).is_none());
    }

    #[test]
    fn oversize_output_is_unusable() {
        let raw = format!(".sp-a {{ content: \"{}\"; }}", "x".repeat(200));
        assert!(sanitize_stylesheet(&raw, 100).is_none());
    }
}
