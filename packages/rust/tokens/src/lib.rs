//! Token resolver: derives a complete, flat set of named style variables
//! from an abstract [`DesignPersonality`].
//!
//! Resolution is a pure function — same personality in, same token set out —
//! and fails loudly when required fields are missing. Silent defaulting of
//! required brand fields is exactly what produces dangling-variable
//! stylesheets, so validation runs before any derivation.

mod color;

use tracing::{debug, instrument};

use stylepress_shared::{DesignPersonality, ResolvedTokenSet, Result, StylePressError};

pub use color::Rgb;

/// Backgrounds with WCAG relative luminance below this are treated as
/// already-dark; no dark-mode overrides are emitted for them.
pub const DARK_LUMINANCE_CUTOFF: f64 = 0.18;

/// Names and exponents of the modular type scale: `size(k) = base × ratio^k`.
const TYPE_SCALE: [(&str, i32); 9] = [
    ("xs", -2),
    ("sm", -1),
    ("base", 0),
    ("lg", 1),
    ("xl", 2),
    ("2xl", 3),
    ("3xl", 4),
    ("4xl", 5),
    ("5xl", 6),
];

/// Fixed spacing index set; index `i` maps to `unit × i / 4`.
const SPACING_INDICES: [u32; 13] = [0, 1, 2, 3, 4, 5, 6, 8, 10, 12, 16, 20, 24];

const RADIUS_KEYS: [(&str, &str); 5] = [
    ("sm", "0.25rem"),
    ("md", "0.5rem"),
    ("lg", "0.75rem"),
    ("xl", "1rem"),
    ("full", "9999px"),
];

const SHADOW_KEYS: [(&str, &str); 6] = [
    ("none", "none"),
    ("sm", "0 1px 2px rgba(15, 23, 42, 0.06)"),
    ("md", "0 4px 8px rgba(15, 23, 42, 0.08)"),
    ("lg", "0 10px 20px rgba(15, 23, 42, 0.10)"),
    ("xl", "0 18px 36px rgba(15, 23, 42, 0.12)"),
    ("2xl", "0 28px 56px rgba(15, 23, 42, 0.16)"),
];

const DURATION_KEYS: [(&str, &str); 5] = [
    ("instant", "0ms"),
    ("fast", "150ms"),
    ("normal", "250ms"),
    ("slow", "400ms"),
    ("expressive", "700ms"),
];

const EASING_KEYS: [(&str, &str); 4] = [
    ("default", "cubic-bezier(0.4, 0, 0.2, 1)"),
    ("enter", "cubic-bezier(0, 0, 0.2, 1)"),
    ("exit", "cubic-bezier(0.4, 0, 1, 1)"),
    ("emphasis", "cubic-bezier(0.2, 0, 0, 1)"),
];

/// Dark palette substituted when the resolved background is light.
const DARK_OVERRIDES: [(&str, &str); 5] = [
    ("--sp-background", "#0b1220"),
    ("--sp-surface", "#111a2b"),
    ("--sp-text", "#e6ebf3"),
    ("--sp-text-muted", "#9aa7b8"),
    ("--sp-border", "#243246"),
];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that the minimum required personality fields are present.
///
/// Every missing field is named in the error, so callers can report the full
/// shortfall at once instead of failing one field at a time.
pub fn validate(personality: &DesignPersonality) -> Result<()> {
    let mut missing: Vec<&str> = Vec::new();

    let colors = &personality.colors;
    for (value, name) in [
        (&colors.primary, "colors.primary"),
        (&colors.background, "colors.background"),
        (&colors.surface, "colors.surface"),
        (&colors.text, "colors.text"),
        (&colors.border, "colors.border"),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            missing.push(name);
        }
    }

    let typography = &personality.typography;
    if typography.display_font.as_deref().is_none_or(str::is_empty) {
        missing.push("typography.display_font");
    }
    if typography.body_font.as_deref().is_none_or(str::is_empty) {
        missing.push("typography.body_font");
    }

    if personality.layout.radius.is_empty() {
        missing.push("layout.radius");
    }
    if personality.layout.shadow.is_empty() {
        missing.push("layout.shadow");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StylePressError::validation(format!(
            "missing required personality fields: {}",
            missing.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Derive the complete flat token set from a personality.
///
/// Pure and deterministic. Validates first; derivation only fills fields the
/// personality legitimately leaves open (light/dark primary shades, semantic
/// colors, motion defaults), never the required brand fields.
#[instrument(skip_all)]
pub fn resolve(personality: &DesignPersonality) -> Result<ResolvedTokenSet> {
    validate(personality)?;

    let colors = &personality.colors;
    let primary_raw = colors.primary.as_deref().expect("validated");
    let background_raw = colors.background.as_deref().expect("validated");

    let primary = Rgb::parse(primary_raw, "colors.primary")?;
    let background = Rgb::parse(background_raw, "colors.background")?;

    let mut tokens = ResolvedTokenSet::default();

    // --- Color roles ---
    let primary_light = match &colors.primary_light {
        Some(v) => v.clone(),
        None => primary.lighten(0.18).to_hex(),
    };
    let primary_dark = match &colors.primary_dark {
        Some(v) => v.clone(),
        None => primary.darken(0.18).to_hex(),
    };
    let secondary = colors.secondary.clone().unwrap_or_else(|| primary_dark.clone());
    let accent = colors.accent.clone().unwrap_or_else(|| primary_light.clone());

    tokens.insert("--sp-primary", primary.to_hex());
    tokens.insert("--sp-primary-light", primary_light);
    tokens.insert("--sp-primary-dark", primary_dark.clone());
    tokens.insert("--sp-secondary", secondary.clone());
    tokens.insert("--sp-accent", accent);
    tokens.insert("--sp-background", background.to_hex());
    let surface = colors.surface.clone().expect("validated");
    tokens.insert("--sp-surface", surface.clone());

    let text = colors.text.clone().expect("validated");
    let text_muted = match &colors.text_muted {
        Some(v) => v.clone(),
        None => match Rgb::parse(&text, "colors.text") {
            Ok(text_rgb) => text_rgb.lerp(background, 0.4).to_hex(),
            Err(_) => text.clone(),
        },
    };
    tokens.insert("--sp-text", text);
    tokens.insert("--sp-text-muted", text_muted);
    tokens.insert(
        "--sp-text-inverse",
        colors.text_inverse.clone().unwrap_or_else(|| "#ffffff".into()),
    );
    tokens.insert("--sp-border", colors.border.clone().expect("validated"));

    tokens.insert("--sp-success", colors.success.clone().unwrap_or_else(|| "#16a34a".into()));
    tokens.insert("--sp-warning", colors.warning.clone().unwrap_or_else(|| "#d97706".into()));
    tokens.insert("--sp-error", colors.error.clone().unwrap_or_else(|| "#dc2626".into()));
    tokens.insert("--sp-info", colors.info.clone().unwrap_or_else(|| "#0284c7".into()));

    // --- Typography ---
    let typography = &personality.typography;
    tokens.insert("--sp-font-display", typography.display_font.clone().expect("validated"));
    tokens.insert("--sp-font-body", typography.body_font.clone().expect("validated"));
    tokens.insert(
        "--sp-font-mono",
        typography
            .mono_font
            .clone()
            .unwrap_or_else(|| "ui-monospace, SFMono-Regular, Menlo, monospace".into()),
    );

    let base_size = typography.base_size_rem.unwrap_or(1.0);
    let ratio = typography.scale_ratio.unwrap_or(1.25);
    for (name, exponent) in TYPE_SCALE {
        tokens.insert(
            format!("--sp-font-size-{name}"),
            format_rem(base_size * ratio.powi(exponent)),
        );
    }

    tokens.insert(
        "--sp-heading-weight",
        typography.heading_weight.unwrap_or(700).to_string(),
    );
    tokens.insert(
        "--sp-heading-case",
        typography.heading_case.clone().unwrap_or_else(|| "none".into()),
    );
    tokens.insert(
        "--sp-heading-tracking",
        typography.heading_tracking.clone().unwrap_or_else(|| "0".into()),
    );
    tokens.insert(
        "--sp-body-line-height",
        format_number(typography.body_line_height.unwrap_or(1.6)),
    );

    // --- Spacing scale ---
    let unit = personality.layout.spacing_unit_rem.unwrap_or(1.0);
    for index in SPACING_INDICES {
        let value = if index == 0 {
            "0".to_string()
        } else {
            format_rem(unit * f64::from(index) / 4.0)
        };
        tokens.insert(format!("--sp-space-{index}"), value);
    }

    // --- Radius / shadow scales ---
    for (key, default) in RADIUS_KEYS {
        let value = personality
            .layout
            .radius
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into());
        tokens.insert(format!("--sp-radius-{key}"), value);
    }
    for (key, default) in SHADOW_KEYS {
        let value = personality
            .layout
            .shadow
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into());
        tokens.insert(format!("--sp-shadow-{key}"), value);
    }

    // --- Motion ---
    for (key, default) in DURATION_KEYS {
        let value = personality
            .motion
            .duration
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into());
        tokens.insert(format!("--sp-duration-{key}"), value);
    }
    for (key, default) in EASING_KEYS {
        let value = personality
            .motion
            .easing
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into());
        tokens.insert(format!("--sp-ease-{key}"), value);
    }

    // --- Derived gradients (fixed angle/stop conventions, no gradient input) ---
    tokens.insert(
        "--sp-gradient-hero",
        format!("linear-gradient(135deg, {} 0%, {} 100%)", primary.to_hex(), primary_dark),
    );
    tokens.insert(
        "--sp-gradient-cta",
        format!("linear-gradient(120deg, {} 0%, {} 100%)", primary.to_hex(), secondary),
    );
    tokens.insert(
        "--sp-gradient-subtle",
        format!("linear-gradient(180deg, {} 0%, {} 100%)", surface, background.to_hex()),
    );
    tokens.insert(
        "--sp-gradient-overlay",
        "linear-gradient(0deg, rgba(15, 23, 42, 0.55) 0%, rgba(15, 23, 42, 0) 100%)",
    );

    debug!(vars = tokens.len(), "token resolution complete");
    Ok(tokens)
}

/// Dark-mode override subset for a resolved token set.
///
/// Pure: inspects the resolved background; if it already falls in the dark
/// luminance bucket the override set is empty, otherwise the fixed dark
/// palette replaces background/surface/text/border roles.
pub fn dark_mode_overrides(
    tokens: &ResolvedTokenSet,
) -> std::collections::BTreeMap<String, String> {
    let already_dark = tokens
        .get("--sp-background")
        .and_then(|bg| Rgb::parse(bg, "--sp-background").ok())
        .is_some_and(|rgb| rgb.relative_luminance() < DARK_LUMINANCE_CUTOFF);

    if already_dark {
        return Default::default();
    }

    DARK_OVERRIDES
        .iter()
        .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a rem length rounded to 3 decimal places, trailing zeros trimmed.
fn format_rem(value: f64) -> String {
    format!("{}rem", format_number(value))
}

/// Round to 3 decimals and trim trailing zeros ("1.250" → "1.25", "1.000" → "1").
fn format_number(value: f64) -> String {
    let mut s = format!("{:.3}", (value * 1000.0).round() / 1000.0);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stylepress_shared::{ColorRoles, LayoutTokens, Typography};

    fn test_personality() -> DesignPersonality {
        let mut layout = LayoutTokens::default();
        layout.radius.insert("md".into(), "0.5rem".into());
        layout.shadow.insert("md".into(), "0 4px 8px rgba(0,0,0,0.1)".into());

        DesignPersonality {
            colors: ColorRoles {
                primary: Some("#336699".into()),
                background: Some("#ffffff".into()),
                surface: Some("#f4f6f8".into()),
                text: Some("#1a2330".into()),
                border: Some("#d5dbe2".into()),
                ..Default::default()
            },
            typography: Typography {
                display_font: Some("Inter, sans-serif".into()),
                body_font: Some("Inter, sans-serif".into()),
                base_size_rem: Some(1.0),
                scale_ratio: Some(1.25),
                ..Default::default()
            },
            layout,
            ..Default::default()
        }
    }

    #[test]
    fn validate_names_every_missing_field() {
        let err = validate(&DesignPersonality::default()).unwrap_err();
        let msg = err.to_string();
        for field in [
            "colors.primary",
            "colors.background",
            "colors.surface",
            "colors.text",
            "colors.border",
            "typography.display_font",
            "typography.body_font",
            "layout.radius",
            "layout.shadow",
        ] {
            assert!(msg.contains(field), "error should name {field}: {msg}");
        }
    }

    #[test]
    fn resolve_rejects_invalid_personality() {
        assert!(resolve(&DesignPersonality::default()).is_err());
    }

    #[test]
    fn type_scale_is_exact_modular_scale() {
        let tokens = resolve(&test_personality()).expect("resolve");
        assert_eq!(tokens.get("--sp-font-size-base"), Some("1rem"));
        assert_eq!(tokens.get("--sp-font-size-lg"), Some("1.25rem"));
        // 1.25^2 = 1.5625 → 1.563 (rounded to 3 decimals)
        assert_eq!(tokens.get("--sp-font-size-xl"), Some("1.563rem"));
        // 1.25^3 = 1.953125 → 1.953
        assert_eq!(tokens.get("--sp-font-size-2xl"), Some("1.953rem"));
        // 1.25^-2 = 0.64
        assert_eq!(tokens.get("--sp-font-size-xs"), Some("0.64rem"));
        // 1.25^6 = 3.814697… → 3.815
        assert_eq!(tokens.get("--sp-font-size-5xl"), Some("3.815rem"));
    }

    #[test]
    fn spacing_scale_has_fixed_indices_with_unit_at_four() {
        let tokens = resolve(&test_personality()).expect("resolve");
        assert_eq!(tokens.get("--sp-space-0"), Some("0"));
        assert_eq!(tokens.get("--sp-space-1"), Some("0.25rem"));
        assert_eq!(tokens.get("--sp-space-4"), Some("1rem"));
        assert_eq!(tokens.get("--sp-space-6"), Some("1.5rem"));
        assert_eq!(tokens.get("--sp-space-24"), Some("6rem"));
        assert!(tokens.get("--sp-space-7").is_none());
    }

    #[test]
    fn resolution_is_deterministic() {
        let personality = test_personality();
        let a = resolve(&personality).expect("resolve");
        let b = resolve(&personality).expect("resolve");
        assert_eq!(a, b);
    }

    #[test]
    fn gradients_use_fixed_conventions() {
        let tokens = resolve(&test_personality()).expect("resolve");
        let hero = tokens.get("--sp-gradient-hero").expect("hero gradient");
        assert!(hero.starts_with("linear-gradient(135deg"));
        assert!(hero.contains("#336699"));

        let subtle = tokens.get("--sp-gradient-subtle").expect("subtle gradient");
        assert!(subtle.contains("#f4f6f8"));
        assert!(subtle.contains("#ffffff"));
    }

    #[test]
    fn primary_shades_derived_when_absent() {
        let tokens = resolve(&test_personality()).expect("resolve");
        let light = tokens.get("--sp-primary-light").expect("light shade");
        let dark = tokens.get("--sp-primary-dark").expect("dark shade");
        assert_ne!(light, dark);
        let light_rgb = Rgb::parse(light, "test").unwrap();
        let dark_rgb = Rgb::parse(dark, "test").unwrap();
        assert!(light_rgb.relative_luminance() > dark_rgb.relative_luminance());
    }

    #[test]
    fn supplied_primary_shades_win_over_derivation() {
        let mut personality = test_personality();
        personality.colors.primary_dark = Some("#001122".into());
        let tokens = resolve(&personality).expect("resolve");
        assert_eq!(tokens.get("--sp-primary-dark"), Some("#001122"));
    }

    #[test]
    fn radius_defaults_fill_missing_keys() {
        let tokens = resolve(&test_personality()).expect("resolve");
        // Supplied key passes through; missing keys get scale defaults
        assert_eq!(tokens.get("--sp-radius-md"), Some("0.5rem"));
        assert_eq!(tokens.get("--sp-radius-full"), Some("9999px"));
    }

    #[test]
    fn dark_mode_empty_for_dark_background() {
        let mut personality = test_personality();
        personality.colors.background = Some("#0b1220".into());
        let tokens = resolve(&personality).expect("resolve");
        assert!(dark_mode_overrides(&tokens).is_empty());
    }

    #[test]
    fn dark_mode_overrides_light_background() {
        let tokens = resolve(&test_personality()).expect("resolve");
        let overrides = dark_mode_overrides(&tokens);
        assert_eq!(overrides.len(), 5);
        assert!(overrides.contains_key("--sp-background"));
        assert!(overrides.contains_key("--sp-text-muted"));
    }

    #[test]
    fn format_number_trims_trailing_zeros() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(1.9531), "1.953");
    }
}
