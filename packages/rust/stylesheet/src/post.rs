//! Stylesheet post-processing for collaborator-authored CSS.
//!
//! Refined stylesheets coming back from the vision loop are mostly well
//! formed but have two recurring defects: duplicated `:root` blocks (the
//! model re-emits the variable preamble) and near-miss variable names from a
//! family the token resolver never defines. Both are repairable without
//! another round trip, so we fix them here instead of failing the iteration.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use stylepress_shared::ResolvedTokenSet;

static ROOT_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s):root\s*\{.*?\}").expect("valid regex"));
static VAR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*(--sp-[a-z0-9-]+)\s*(?:,\s*([^)]+))?\s*\)").expect("valid regex")
});
static SHADE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-\d{2,3}$").expect("valid regex"));

/// Near-miss names collaborators emit, mapped to the name the resolver
/// actually defines, or to a literal value.
const ALIASES: &[(&str, &str)] = &[
    ("--sp-color-primary", "--sp-primary"),
    ("--sp-color-secondary", "--sp-secondary"),
    ("--sp-color-accent", "--sp-accent"),
    ("--sp-color-background", "--sp-background"),
    ("--sp-color-surface", "--sp-surface"),
    ("--sp-color-text", "--sp-text"),
    ("--sp-color-border", "--sp-border"),
    ("--sp-bg", "--sp-background"),
    ("--sp-font-heading", "--sp-font-display"),
    ("--sp-font-size-md", "--sp-font-size-base"),
    ("--sp-radius", "--sp-radius-md"),
    ("--sp-radius-0", "0"),
    ("--sp-shadow", "--sp-shadow-md"),
    ("--sp-spacing-0", "0"),
    ("--sp-spacing-4", "--sp-space-4"),
    ("--sp-duration", "--sp-duration-normal"),
    ("--sp-ease", "--sp-ease-default"),
];

/// What [`postprocess`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostprocessReport {
    /// Duplicate `:root` blocks removed (zero when the input had at most one).
    pub root_blocks_stripped: usize,
    /// `var()` references rewritten to a defined variable or literal.
    pub variables_normalized: usize,
}

/// Repair collaborator CSS: keep only the first top-level `:root` block and
/// rewrite undefined `var()` references to the closest defined name.
///
/// References that stay undefined after normalization are left alone; the
/// compiler's dangling check decides whether that is fatal.
#[instrument(skip_all, fields(bytes = css.len()))]
pub fn postprocess(css: &str, tokens: &ResolvedTokenSet) -> (String, PostprocessReport) {
    let mut report = PostprocessReport::default();

    let css = strip_duplicate_roots(css, &mut report);
    let css = normalize_var_refs(&css, tokens, &mut report);

    if report != PostprocessReport::default() {
        debug!(
            stripped = report.root_blocks_stripped,
            normalized = report.variables_normalized,
            "repaired collaborator stylesheet"
        );
    }
    (css, report)
}

/// Whether the byte offset sits at top level, outside any enclosing block.
fn at_top_level(css: &str, offset: usize) -> bool {
    let mut depth = 0i32;
    for b in css[..offset].bytes() {
        match b {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// Keep the first top-level `:root` block; remove the rest. The first block
/// is the compiled preamble, so its declarations win. `:root` blocks nested
/// in at-rules (dark-mode overrides) are left alone.
fn strip_duplicate_roots(css: &str, report: &mut PostprocessReport) -> String {
    let blocks: Vec<_> = ROOT_BLOCK_RE
        .find_iter(css)
        .filter(|m| at_top_level(css, m.start()))
        .collect();
    if blocks.len() <= 1 {
        return css.to_string();
    }
    report.root_blocks_stripped = blocks.len() - 1;

    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    for (i, m) in blocks.iter().enumerate() {
        if i == 0 {
            continue;
        }
        out.push_str(&css[last..m.start()]);
        last = m.end();
    }
    out.push_str(&css[last..]);
    out
}

fn normalize_var_refs(
    css: &str,
    tokens: &ResolvedTokenSet,
    report: &mut PostprocessReport,
) -> String {
    let mut count = 0usize;
    let out = VAR_REF_RE
        .replace_all(css, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let fallback = caps.get(2).map(|m| m.as_str());
            if tokens.contains(name) {
                return caps[0].to_string();
            }
            match normalize_name(name, tokens) {
                Some(fixed) => {
                    count += 1;
                    if !fixed.starts_with("--") {
                        // Alias resolved to a literal value.
                        fixed
                    } else if let Some(fallback) = fallback {
                        format!("var({fixed}, {fallback})")
                    } else {
                        format!("var({fixed})")
                    }
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned();
    report.variables_normalized = count;
    out
}

/// Map an undefined name to a defined one: fixed alias table first, then a
/// numeric shade suffix strip (`--sp-primary-600` to `--sp-primary`).
fn normalize_name(name: &str, tokens: &ResolvedTokenSet) -> Option<String> {
    if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        if !target.starts_with("--") || tokens.contains(target) {
            return Some((*target).to_string());
        }
    }
    let stripped = SHADE_SUFFIX_RE.replace(name, "");
    if stripped != name && tokens.contains(&stripped) {
        return Some(stripped.into_owned());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> ResolvedTokenSet {
        let mut t = ResolvedTokenSet::default();
        t.insert("--sp-primary", "#2563eb");
        t.insert("--sp-background", "#ffffff");
        t.insert("--sp-font-display", "Sora");
        t.insert("--sp-radius-md", "0.5rem");
        t
    }

    #[test]
    fn single_root_passes_through() {
        let css = ":root {\n  --sp-primary: #2563eb;\n}\nbody { color: var(--sp-primary); }";
        let (out, report) = postprocess(css, &tokens());
        assert_eq!(out, css);
        assert_eq!(report, PostprocessReport::default());
    }

    #[test]
    fn duplicate_roots_are_stripped_first_wins() {
        let css = ":root { --sp-primary: #2563eb; }\n\
                   body { color: var(--sp-primary); }\n\
                   :root { --sp-primary: #111111; }";
        let (out, report) = postprocess(css, &tokens());
        assert_eq!(report.root_blocks_stripped, 1);
        assert_eq!(out.matches(":root {").count(), 1);
        assert!(out.contains("--sp-primary: #2563eb;"));
        assert!(!out.contains("#111111"));
        assert!(out.contains("body { color: var(--sp-primary); }"));
    }

    #[test]
    fn nested_root_in_media_query_is_not_stripped() {
        let css = ":root { --sp-primary: #2563eb; }\n\
                   @media (prefers-color-scheme: dark) {\n\
                     :root { --sp-background: #0b1220; }\n\
                   }";
        let (out, report) = postprocess(css, &tokens());
        assert_eq!(report.root_blocks_stripped, 0);
        assert!(out.contains("prefers-color-scheme"));
        assert!(out.contains("--sp-background: #0b1220;"));
    }

    #[test]
    fn alias_reference_is_rewritten() {
        let css = "h1 { font-family: var(--sp-font-heading); }";
        let (out, report) = postprocess(css, &tokens());
        assert!(out.contains("var(--sp-font-display)"));
        assert_eq!(report.variables_normalized, 1);
    }

    #[test]
    fn alias_with_fallback_keeps_the_fallback() {
        let css = "h1 { font-family: var(--sp-font-heading, serif); }";
        let (out, _) = postprocess(css, &tokens());
        assert!(out.contains("var(--sp-font-display, serif)"));
    }

    #[test]
    fn literal_alias_replaces_the_whole_reference() {
        let css = ".sp-x { margin: var(--sp-spacing-0); }";
        let (out, report) = postprocess(css, &tokens());
        assert!(out.contains("margin: 0;"));
        assert_eq!(report.variables_normalized, 1);
    }

    #[test]
    fn shade_suffix_is_stripped() {
        let css = "a { color: var(--sp-primary-600); }";
        let (out, report) = postprocess(css, &tokens());
        assert!(out.contains("var(--sp-primary)"));
        assert_eq!(report.variables_normalized, 1);
    }

    #[test]
    fn unknown_reference_is_left_for_the_dangling_check() {
        let css = "a { color: var(--sp-mystery); }";
        let (out, report) = postprocess(css, &tokens());
        assert!(out.contains("var(--sp-mystery)"));
        assert_eq!(report.variables_normalized, 0);
    }

    #[test]
    fn defined_reference_is_untouched() {
        let css = "a { border-radius: var(--sp-radius-md); }";
        let (out, _) = postprocess(css, &tokens());
        assert_eq!(out, css);
    }
}
