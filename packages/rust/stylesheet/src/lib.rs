//! Deterministic style compiler: resolved design tokens in, a complete
//! stylesheet out.
//!
//! The compiler is pure string assembly over the token set, so identical
//! tokens always yield byte-identical CSS. Every custom property referenced
//! anywhere in the output must be defined in the single `:root` block; a
//! reference to an undefined variable is a hard error, never silently
//! inherited-as-nothing at render time.

mod post;

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use stylepress_shared::{Emphasis, ResolvedTokenSet, Result, StylePressError};
use stylepress_tokens::dark_mode_overrides;

pub use post::{postprocess, PostprocessReport};

static VAR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*(--sp-[a-z0-9-]+)\s*(?:,\s*[^)]+)?\s*\)").expect("valid regex")
});

/// Emphasis styling ladder. Values are ordered with the enum so padding,
/// shadow depth and heading size all grow monotonically with emphasis.
const EMPHASIS_LADDER: &[(Emphasis, &str, &str, &str)] = &[
    (Emphasis::Minimal, "--sp-space-2", "--sp-shadow-none", "--sp-font-size-lg"),
    (Emphasis::Supporting, "--sp-space-4", "--sp-shadow-none", "--sp-font-size-xl"),
    (Emphasis::Standard, "--sp-space-6", "--sp-shadow-sm", "--sp-font-size-2xl"),
    (Emphasis::Featured, "--sp-space-10", "--sp-shadow-lg", "--sp-font-size-3xl"),
    (Emphasis::Hero, "--sp-space-16", "--sp-shadow-xl", "--sp-font-size-4xl"),
];

const WIDTHS: &[(&str, &str)] = &[
    ("narrow", "38rem"),
    ("medium", "46rem"),
    ("wide", "60rem"),
];

const FLOWS: &[(&str, &str)] = &[
    ("tight", "--sp-space-2"),
    ("normal", "--sp-space-8"),
    ("generous", "--sp-space-16"),
    ("dramatic", "--sp-space-24"),
];

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile a stylesheet for the given token set and the component classes the
/// renderer actually emitted.
///
/// The output carries exactly one top-level `:root` block and a rule for
/// every class in `components_used`, so the selector set is always a superset
/// of what the markup references.
#[instrument(skip_all, fields(vars = tokens.len(), components = components_used.len()))]
pub fn compile(tokens: &ResolvedTokenSet, components_used: &[String]) -> Result<String> {
    let mut css = String::with_capacity(8 * 1024);

    // Single :root with every resolved variable. BTreeMap keeps the order
    // stable across runs.
    css.push_str(":root {\n");
    for (name, value) in &tokens.vars {
        writeln!(css, "  {name}: {value};").expect("write to string");
    }
    css.push_str("}\n\n");

    css.push_str(base_rules());
    css.push_str(&section_rules());

    let mut classes: Vec<&str> = components_used.iter().map(String::as_str).collect();
    classes.sort_unstable();
    classes.dedup();
    for class in classes {
        let rules = component_rules(class).ok_or_else(|| {
            StylePressError::validation(format!("no style rules for component class {class}"))
        })?;
        css.push_str(rules);
        css.push('\n');
    }

    let dark = dark_mode_overrides(tokens);
    if !dark.is_empty() {
        css.push_str("@media (prefers-color-scheme: dark) {\n  :root {\n");
        for (name, value) in &dark {
            writeln!(css, "    {name}: {value};").expect("write to string");
        }
        css.push_str("  }\n}\n");
    }

    check_dangling(&css, tokens)?;
    debug!(bytes = css.len(), "stylesheet compiled");
    Ok(css)
}

/// Verify every `var(--sp-*)` reference in `css` resolves against `tokens`.
pub fn check_dangling(css: &str, tokens: &ResolvedTokenSet) -> Result<()> {
    for capture in VAR_REF_RE.captures_iter(css) {
        let name = &capture[1];
        if !tokens.contains(name) {
            return Err(StylePressError::dangling(name));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Rule blocks
// ---------------------------------------------------------------------------

fn base_rules() -> &'static str {
    "body {\n\
     \x20 margin: 0;\n\
     \x20 font-family: var(--sp-font-body);\n\
     \x20 font-size: var(--sp-font-size-base);\n\
     \x20 line-height: var(--sp-body-line-height);\n\
     \x20 color: var(--sp-text);\n\
     \x20 background: var(--sp-background);\n\
     }\n\n\
     h1, h2, h3, h4 {\n\
     \x20 font-family: var(--sp-font-display);\n\
     \x20 font-weight: var(--sp-heading-weight);\n\
     \x20 text-transform: var(--sp-heading-case);\n\
     \x20 letter-spacing: var(--sp-heading-tracking);\n\
     \x20 line-height: 1.2;\n\
     }\n\n\
     a {\n\
     \x20 color: var(--sp-primary);\n\
     }\n\n\
     .sp-article {\n\
     \x20 display: block;\n\
     }\n\n"
}

fn section_rules() -> String {
    let mut css = String::new();

    css.push_str(
        ".sp-section {\n\
         \x20 margin-inline: auto;\n\
         \x20 border-radius: var(--sp-radius-md);\n\
         }\n\n\
         .sp-section--standard:nth-of-type(even) {\n\
         \x20 background: var(--sp-surface);\n\
         }\n\n",
    );

    for (emphasis, padding, shadow, heading_size) in EMPHASIS_LADDER {
        let name = emphasis.as_str();
        writeln!(
            css,
            ".sp-section--{name} {{\n  padding-block: var({padding});\n  padding-inline: var(--sp-space-4);\n  box-shadow: var({shadow});\n}}\n\
             .sp-section--{name} .sp-section__heading {{\n  font-size: var({heading_size});\n}}\n",
        )
        .expect("write to string");
    }

    for (name, max_width) in WIDTHS {
        writeln!(css, ".sp-width--{name} {{\n  max-width: {max_width};\n}}\n")
            .expect("write to string");
    }
    css.push_str(".sp-width--full {\n  max-width: none;\n}\n\n");

    for (name, space) in FLOWS {
        writeln!(
            css,
            ".sp-flow-before--{name} {{\n  margin-top: var({space});\n}}\n\
             .sp-flow-after--{name} {{\n  margin-bottom: var({space});\n}}\n",
        )
        .expect("write to string");
    }

    css
}

/// Rules for one component root class. Returns `None` for classes the
/// compiler does not know, which callers treat as a validation error.
fn component_rules(class: &str) -> Option<&'static str> {
    Some(match class {
        "sp-prose" => {
            ".sp-prose p {\n\
             \x20 margin-block: var(--sp-space-3);\n\
             \x20 max-width: 65ch;\n\
             }\n"
        }
        "sp-hero" => {
            ".sp-hero {\n\
             \x20 background: var(--sp-gradient-hero);\n\
             \x20 color: var(--sp-text-inverse);\n\
             \x20 padding: var(--sp-space-16) var(--sp-space-6);\n\
             \x20 border-radius: var(--sp-radius-lg);\n\
             }\n\
             .sp-hero__title {\n\
             \x20 font-size: var(--sp-font-size-5xl);\n\
             \x20 margin: 0 0 var(--sp-space-4);\n\
             }\n\
             .sp-hero__lead {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 max-width: 48ch;\n\
             \x20 margin: 0;\n\
             }\n"
        }
        "sp-lead-paragraph" => {
            ".sp-lead-paragraph__text {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 color: var(--sp-text);\n\
             }\n\
             .sp-lead-paragraph p {\n\
             \x20 max-width: 65ch;\n\
             }\n"
        }
        "sp-definition-box" => {
            ".sp-definition-box {\n\
             \x20 background: var(--sp-surface);\n\
             \x20 border-left: 4px solid var(--sp-primary);\n\
             \x20 border-radius: var(--sp-radius-sm);\n\
             \x20 padding: var(--sp-space-5);\n\
             }\n\
             .sp-definition-box__text {\n\
             \x20 margin-block: var(--sp-space-2);\n\
             }\n"
        }
        "sp-feature-grid" => {
            ".sp-feature-grid {\n\
             \x20 display: grid;\n\
             \x20 grid-template-columns: repeat(auto-fit, minmax(16rem, 1fr));\n\
             \x20 gap: var(--sp-space-4);\n\
             }\n\
             .sp-feature-grid__item {\n\
             \x20 background: var(--sp-surface);\n\
             \x20 border: 1px solid var(--sp-border);\n\
             \x20 border-radius: var(--sp-radius-md);\n\
             \x20 padding: var(--sp-space-5);\n\
             \x20 box-shadow: var(--sp-shadow-sm);\n\
             }\n\
             .sp-feature-grid__title {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 margin: 0 0 var(--sp-space-2);\n\
             }\n\
             .sp-feature-grid__description {\n\
             \x20 color: var(--sp-text-muted);\n\
             \x20 margin: 0;\n\
             }\n"
        }
        "sp-checklist" => {
            ".sp-checklist {\n\
             \x20 list-style: none;\n\
             \x20 padding: 0;\n\
             \x20 display: grid;\n\
             \x20 gap: var(--sp-space-3);\n\
             }\n\
             .sp-checklist__item {\n\
             \x20 display: flex;\n\
             \x20 align-items: baseline;\n\
             \x20 gap: var(--sp-space-3);\n\
             }\n\
             .sp-checklist__marker {\n\
             \x20 flex: none;\n\
             \x20 width: var(--sp-space-4);\n\
             \x20 height: var(--sp-space-4);\n\
             \x20 border-radius: var(--sp-radius-full);\n\
             \x20 background: var(--sp-success);\n\
             }\n"
        }
        "sp-key-takeaways" => {
            ".sp-key-takeaways {\n\
             \x20 background: var(--sp-gradient-subtle);\n\
             \x20 border: 1px solid var(--sp-border);\n\
             \x20 border-radius: var(--sp-radius-lg);\n\
             \x20 padding: var(--sp-space-6);\n\
             }\n\
             .sp-key-takeaways__list {\n\
             \x20 margin: 0;\n\
             \x20 padding-left: var(--sp-space-5);\n\
             }\n\
             .sp-key-takeaways__item {\n\
             \x20 margin-block: var(--sp-space-2);\n\
             }\n"
        }
        "sp-step-list" => {
            ".sp-step-list {\n\
             \x20 list-style: none;\n\
             \x20 padding: 0;\n\
             \x20 counter-reset: none;\n\
             \x20 display: grid;\n\
             \x20 gap: var(--sp-space-5);\n\
             }\n\
             .sp-step-list__step {\n\
             \x20 display: flex;\n\
             \x20 gap: var(--sp-space-4);\n\
             }\n\
             .sp-step-list__number {\n\
             \x20 flex: none;\n\
             \x20 display: inline-grid;\n\
             \x20 place-items: center;\n\
             \x20 width: var(--sp-space-8);\n\
             \x20 height: var(--sp-space-8);\n\
             \x20 border-radius: var(--sp-radius-full);\n\
             \x20 background: var(--sp-primary);\n\
             \x20 color: var(--sp-text-inverse);\n\
             \x20 font-weight: var(--sp-heading-weight);\n\
             }\n\
             .sp-step-list__title {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 margin: 0 0 var(--sp-space-1);\n\
             }\n\
             .sp-step-list__description {\n\
             \x20 color: var(--sp-text-muted);\n\
             \x20 margin: 0;\n\
             }\n"
        }
        "sp-timeline" => {
            ".sp-timeline {\n\
             \x20 list-style: none;\n\
             \x20 padding: 0;\n\
             \x20 border-left: 2px solid var(--sp-border);\n\
             }\n\
             .sp-timeline__entry {\n\
             \x20 position: relative;\n\
             \x20 padding-left: var(--sp-space-6);\n\
             \x20 padding-block: var(--sp-space-3);\n\
             }\n\
             .sp-timeline__marker {\n\
             \x20 position: absolute;\n\
             \x20 left: calc(-1 * var(--sp-space-1));\n\
             \x20 width: var(--sp-space-2);\n\
             \x20 height: var(--sp-space-2);\n\
             \x20 border-radius: var(--sp-radius-full);\n\
             \x20 background: var(--sp-primary);\n\
             }\n\
             .sp-timeline__title {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 margin: 0 0 var(--sp-space-1);\n\
             }\n\
             .sp-timeline__description {\n\
             \x20 color: var(--sp-text-muted);\n\
             \x20 margin: 0;\n\
             }\n"
        }
        "sp-faq-accordion" => {
            ".sp-faq-accordion {\n\
             \x20 display: grid;\n\
             \x20 gap: var(--sp-space-3);\n\
             }\n\
             .sp-faq-accordion__item {\n\
             \x20 border: 1px solid var(--sp-border);\n\
             \x20 border-radius: var(--sp-radius-md);\n\
             \x20 background: var(--sp-surface);\n\
             \x20 padding: var(--sp-space-4);\n\
             }\n\
             .sp-faq-accordion__question {\n\
             \x20 cursor: pointer;\n\
             \x20 font-weight: var(--sp-heading-weight);\n\
             \x20 font-family: var(--sp-font-display);\n\
             }\n\
             .sp-faq-accordion__answer {\n\
             \x20 margin: var(--sp-space-3) 0 0;\n\
             \x20 color: var(--sp-text-muted);\n\
             }\n"
        }
        "sp-comparison-table" => {
            ".sp-comparison-table {\n\
             \x20 overflow-x: auto;\n\
             }\n\
             .sp-comparison-table table {\n\
             \x20 width: 100%;\n\
             \x20 border-collapse: collapse;\n\
             }\n\
             .sp-comparison-table th {\n\
             \x20 background: var(--sp-primary);\n\
             \x20 color: var(--sp-text-inverse);\n\
             \x20 text-align: left;\n\
             \x20 padding: var(--sp-space-3);\n\
             }\n\
             .sp-comparison-table td {\n\
             \x20 border-bottom: 1px solid var(--sp-border);\n\
             \x20 padding: var(--sp-space-3);\n\
             }\n\
             .sp-comparison-table tbody tr:nth-child(even) {\n\
             \x20 background: var(--sp-surface);\n\
             }\n"
        }
        "sp-testimonial-card" => {
            ".sp-testimonial-card {\n\
             \x20 margin: 0;\n\
             \x20 background: var(--sp-surface);\n\
             \x20 border-radius: var(--sp-radius-lg);\n\
             \x20 box-shadow: var(--sp-shadow-md);\n\
             \x20 padding: var(--sp-space-6);\n\
             }\n\
             .sp-testimonial-card__quote p {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 font-style: italic;\n\
             \x20 margin: 0;\n\
             }\n\
             .sp-testimonial-card__attribution {\n\
             \x20 display: block;\n\
             \x20 margin-top: var(--sp-space-4);\n\
             \x20 color: var(--sp-text-muted);\n\
             }\n"
        }
        "sp-stat-highlight" => {
            ".sp-stat-highlight__grid {\n\
             \x20 display: grid;\n\
             \x20 grid-template-columns: repeat(auto-fit, minmax(10rem, 1fr));\n\
             \x20 gap: var(--sp-space-4);\n\
             \x20 margin: 0;\n\
             }\n\
             .sp-stat-highlight__stat {\n\
             \x20 text-align: center;\n\
             \x20 padding: var(--sp-space-4);\n\
             }\n\
             .sp-stat-highlight__value {\n\
             \x20 display: block;\n\
             \x20 font-size: var(--sp-font-size-3xl);\n\
             \x20 font-family: var(--sp-font-display);\n\
             \x20 color: var(--sp-primary);\n\
             \x20 font-weight: var(--sp-heading-weight);\n\
             }\n\
             .sp-stat-highlight__label {\n\
             \x20 color: var(--sp-text-muted);\n\
             }\n"
        }
        "sp-blockquote" => {
            ".sp-blockquote {\n\
             \x20 margin: 0;\n\
             \x20 border-left: 4px solid var(--sp-accent);\n\
             \x20 padding-left: var(--sp-space-5);\n\
             }\n\
             .sp-blockquote p {\n\
             \x20 font-size: var(--sp-font-size-lg);\n\
             \x20 font-style: italic;\n\
             }\n\
             .sp-blockquote__cite {\n\
             \x20 color: var(--sp-text-muted);\n\
             \x20 font-style: normal;\n\
             }\n"
        }
        "sp-cta-banner" => {
            ".sp-cta-banner {\n\
             \x20 background: var(--sp-gradient-cta);\n\
             \x20 color: var(--sp-text-inverse);\n\
             \x20 border-radius: var(--sp-radius-lg);\n\
             \x20 padding: var(--sp-space-10) var(--sp-space-6);\n\
             \x20 text-align: center;\n\
             }\n\
             .sp-cta-banner__text {\n\
             \x20 max-width: 48ch;\n\
             \x20 margin-inline: auto;\n\
             }\n\
             .sp-cta-banner__button {\n\
             \x20 display: inline-block;\n\
             \x20 margin-top: var(--sp-space-4);\n\
             \x20 padding: var(--sp-space-3) var(--sp-space-6);\n\
             \x20 border-radius: var(--sp-radius-full);\n\
             \x20 background: var(--sp-background);\n\
             \x20 color: var(--sp-primary);\n\
             \x20 font-weight: var(--sp-heading-weight);\n\
             \x20 text-decoration: none;\n\
             \x20 transition: transform var(--sp-duration-fast) var(--sp-ease-default);\n\
             }\n\
             .sp-cta-banner__button:hover {\n\
             \x20 transform: translateY(-2px);\n\
             }\n"
        }
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
