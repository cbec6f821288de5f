//! Core domain types for the StylePress content-to-design compiler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SectionId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for section identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub Uuid);

impl SectionId {
    /// Generate a new time-sortable section identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A content span bounded by heading markers.
///
/// Produced by the segmenter; immutable thereafter. `heading` is empty for
/// a leading section that precedes the first heading of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section identifier.
    pub id: SectionId,
    /// Heading text with markers stripped (may be empty).
    pub heading: String,
    /// Heading depth, 1–6. Leading sections report 2.
    pub heading_level: u8,
    /// Body text between this heading and the next boundary.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Role / ComponentKind / Emphasis
// ---------------------------------------------------------------------------

/// The semantic purpose of a section, decided by the blueprint architect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Introduction,
    Definition,
    Explanation,
    List,
    Steps,
    Faq,
    Comparison,
    Summary,
    Testimonial,
    Data,
    Cta,
    Prose,
}

impl Role {
    /// All roles, in classification priority order.
    pub const ALL: [Role; 12] = [
        Role::Introduction,
        Role::Definition,
        Role::Faq,
        Role::Steps,
        Role::Comparison,
        Role::Summary,
        Role::Testimonial,
        Role::Data,
        Role::Cta,
        Role::List,
        Role::Explanation,
        Role::Prose,
    ];

    /// Stable string form used in config keys and tracing fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Introduction => "introduction",
            Role::Definition => "definition",
            Role::Explanation => "explanation",
            Role::List => "list",
            Role::Steps => "steps",
            Role::Faq => "faq",
            Role::Comparison => "comparison",
            Role::Summary => "summary",
            Role::Testimonial => "testimonial",
            Role::Data => "data",
            Role::Cta => "cta",
            Role::Prose => "prose",
        }
    }
}

/// Broad grouping used to keep the role→component table honest: a role may
/// never be assigned a component from an incompatible category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentCategory {
    ContentDisplay,
    Conversion,
    Navigational,
}

/// The presentation pattern chosen to render a section.
///
/// Closed enum: the renderer dispatches with an exhaustive `match`, so adding
/// a variant forces every call site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentKind {
    Prose,
    FeatureGrid,
    StepList,
    FaqAccordion,
    Timeline,
    ComparisonTable,
    TestimonialCard,
    KeyTakeaways,
    Checklist,
    StatHighlight,
    Blockquote,
    DefinitionBox,
    LeadParagraph,
    CtaBanner,
    Hero,
}

impl ComponentKind {
    /// Every component kind, in declaration order.
    pub const ALL: [ComponentKind; 15] = [
        ComponentKind::Prose,
        ComponentKind::FeatureGrid,
        ComponentKind::StepList,
        ComponentKind::FaqAccordion,
        ComponentKind::Timeline,
        ComponentKind::ComparisonTable,
        ComponentKind::TestimonialCard,
        ComponentKind::KeyTakeaways,
        ComponentKind::Checklist,
        ComponentKind::StatHighlight,
        ComponentKind::Blockquote,
        ComponentKind::DefinitionBox,
        ComponentKind::LeadParagraph,
        ComponentKind::CtaBanner,
        ComponentKind::Hero,
    ];

    /// Stable kebab-case name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Prose => "prose",
            ComponentKind::FeatureGrid => "feature-grid",
            ComponentKind::StepList => "step-list",
            ComponentKind::FaqAccordion => "faq-accordion",
            ComponentKind::Timeline => "timeline",
            ComponentKind::ComparisonTable => "comparison-table",
            ComponentKind::TestimonialCard => "testimonial-card",
            ComponentKind::KeyTakeaways => "key-takeaways",
            ComponentKind::Checklist => "checklist",
            ComponentKind::StatHighlight => "stat-highlight",
            ComponentKind::Blockquote => "blockquote",
            ComponentKind::DefinitionBox => "definition-box",
            ComponentKind::LeadParagraph => "lead-paragraph",
            ComponentKind::CtaBanner => "cta-banner",
            ComponentKind::Hero => "hero",
        }
    }

    /// Root CSS class emitted for this component (`sp-` prefix).
    pub fn class_name(&self) -> String {
        format!("sp-{}", self.as_str())
    }

    /// Category this component belongs to.
    pub fn category(&self) -> ComponentCategory {
        match self {
            ComponentKind::CtaBanner | ComponentKind::Hero => ComponentCategory::Conversion,
            ComponentKind::KeyTakeaways => ComponentCategory::Navigational,
            _ => ComponentCategory::ContentDisplay,
        }
    }

    /// Minimum number of extracted items this component needs to look
    /// visually coherent. Components that render a single span of content
    /// have no minimum.
    pub fn min_items(&self) -> usize {
        match self {
            ComponentKind::FeatureGrid
            | ComponentKind::StepList
            | ComponentKind::FaqAccordion
            | ComponentKind::Timeline
            | ComponentKind::KeyTakeaways
            | ComponentKind::Checklist
            | ComponentKind::ComparisonTable => 2,
            _ => 0,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered visual-weight tier applied to a section.
///
/// Declaration order gives the total order `minimal < supporting < standard
/// < featured < hero` via the derived `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Emphasis {
    Minimal,
    Supporting,
    Standard,
    Featured,
    Hero,
}

impl Emphasis {
    /// All levels, heaviest first.
    pub const DESCENDING: [Emphasis; 5] = [
        Emphasis::Hero,
        Emphasis::Featured,
        Emphasis::Standard,
        Emphasis::Supporting,
        Emphasis::Minimal,
    ];

    /// Stable string form, used as a CSS class modifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Emphasis::Hero => "hero",
            Emphasis::Featured => "featured",
            Emphasis::Standard => "standard",
            Emphasis::Supporting => "supporting",
            Emphasis::Minimal => "minimal",
        }
    }
}

/// Horizontal layout budget for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutWidth {
    Narrow,
    Medium,
    Wide,
    Full,
}

impl LayoutWidth {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutWidth::Narrow => "narrow",
            LayoutWidth::Medium => "medium",
            LayoutWidth::Wide => "wide",
            LayoutWidth::Full => "full",
        }
    }
}

/// Vertical rhythm applied before/after a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacingSize {
    Tight,
    Normal,
    Generous,
    Dramatic,
}

impl SpacingSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpacingSize::Tight => "tight",
            SpacingSize::Normal => "normal",
            SpacingSize::Generous => "generous",
            SpacingSize::Dramatic => "dramatic",
        }
    }
}

/// Per-section presentation decision produced by the blueprint architect.
///
/// One per section; never mutated after creation — a new compilation produces
/// a new set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentAssignment {
    pub section_id: SectionId,
    pub role: Role,
    pub component: ComponentKind,
    pub emphasis: Emphasis,
    pub layout_width: LayoutWidth,
    pub spacing_before: SpacingSize,
    pub spacing_after: SpacingSize,
}

// ---------------------------------------------------------------------------
// DesignPersonality
// ---------------------------------------------------------------------------

/// Abstract brand color roles. Optional fields are derived or rejected by
/// the token resolver's validation — never silently defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorRoles {
    pub primary: Option<String>,
    pub primary_light: Option<String>,
    pub primary_dark: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
    pub surface: Option<String>,
    pub text: Option<String>,
    pub text_muted: Option<String>,
    pub text_inverse: Option<String>,
    pub border: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub info: Option<String>,
}

/// Abstract brand typography.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    /// Display/heading font stack.
    pub display_font: Option<String>,
    /// Body font stack.
    pub body_font: Option<String>,
    /// Monospace font stack.
    pub mono_font: Option<String>,
    /// Base body size in rem (defaults to 1.0 when absent).
    pub base_size_rem: Option<f64>,
    /// Modular scale ratio (defaults to 1.25 when absent).
    pub scale_ratio: Option<f64>,
    /// Heading font weight (e.g. 700).
    pub heading_weight: Option<u16>,
    /// Heading text-transform (e.g. "none", "uppercase").
    pub heading_case: Option<String>,
    /// Heading letter-spacing (e.g. "-0.02em").
    pub heading_tracking: Option<String>,
    /// Body line-height.
    pub body_line_height: Option<f64>,
}

/// Abstract layout tokens: radius/shadow scales and the spacing base unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutTokens {
    /// Radius scale keyed `sm`→`full`.
    pub radius: BTreeMap<String, String>,
    /// Shadow scale keyed `none`→`2xl`.
    pub shadow: BTreeMap<String, String>,
    /// Spacing base unit in rem (index 4 of the spacing scale).
    pub spacing_unit_rem: Option<f64>,
}

/// Abstract motion tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionTokens {
    /// Durations keyed `instant`→`expressive` (e.g. "150ms").
    pub duration: BTreeMap<String, String>,
    /// Easing curves keyed `default`/`enter`/`exit`/`emphasis`.
    pub easing: BTreeMap<String, String>,
}

/// An abstract, named bundle of brand style parameters.
///
/// Supplied externally (brand detection or manual entry); read-only input to
/// the token resolver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignPersonality {
    #[serde(default)]
    pub colors: ColorRoles,
    #[serde(default)]
    pub typography: Typography,
    #[serde(default)]
    pub layout: LayoutTokens,
    #[serde(default)]
    pub motion: MotionTokens,
}

// ---------------------------------------------------------------------------
// ResolvedTokenSet
// ---------------------------------------------------------------------------

/// The concrete variable→value map derived from a personality.
///
/// Invariant: every variable name referenced anywhere in compiled stylesheet
/// output must be a key of this map. A `BTreeMap` keeps iteration order
/// stable so identical input yields byte-identical stylesheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedTokenSet {
    pub vars: BTreeMap<String, String>,
}

impl ResolvedTokenSet {
    /// Insert a variable. Names must carry the `--sp-` prefix.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        debug_assert!(name.starts_with("--sp-"), "token name without --sp- prefix: {name}");
        self.vars.insert(name, value.into());
    }

    /// Look up a variable value by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Whether the set defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ExtractedComponent
// ---------------------------------------------------------------------------

/// Expected value kind for a content slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotKind {
    Text,
    RichText,
    ImageUrl,
    LinkUrl,
}

/// A named substitution point inside an extracted component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSlot {
    /// CSS selector locating the slot inside the fragment.
    pub selector: String,
    /// What kind of value may be injected.
    pub kind: SlotKind,
    /// Whether composition fails over to synthesis when no content matches.
    pub required: bool,
}

/// A literal markup + style fragment captured from a real reference site.
///
/// Frozen snapshot: the fragment must contain no templating syntax and no
/// style-variable references. [`ExtractedComponent::validate`] enforces this
/// at ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedComponent {
    /// Component-type category this fragment covers.
    pub component: ComponentKind,
    /// Literal HTML fragment.
    pub html: String,
    /// Literal CSS for the fragment.
    pub css: String,
    /// Declared substitution points.
    #[serde(default)]
    pub slots: Vec<ContentSlot>,
}

/// Templating markers that disqualify a fragment as a frozen snapshot.
const TEMPLATE_MARKERS: [&str; 4] = ["{{", "${", "<%", "var(--"];

impl ExtractedComponent {
    /// Ingestion-time validation: reject fragments whose markup or style
    /// contains templating syntax or style-variable references.
    pub fn validate(&self) -> std::result::Result<(), String> {
        for (field, content) in [("markup", &self.html), ("style", &self.css)] {
            for marker in TEMPLATE_MARKERS {
                if content.contains(marker) {
                    return Err(format!(
                        "extracted {} fragment {field} contains templating marker {marker:?}",
                        self.component
                    ));
                }
            }
        }
        if self.html.trim().is_empty() {
            return Err(format!("extracted {} fragment is empty", self.component));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ValidationResult
// ---------------------------------------------------------------------------

/// Per-dimension visual comparison scores (0–100), from the scoring
/// collaborator. Consumed only by the refinement loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub color_match: f64,
    pub typography_match: f64,
    pub spacing_match: f64,
    pub visual_depth: f64,
    pub brand_fit: f64,
    pub layout_sophistication: f64,
    /// Free-text observations.
    #[serde(default)]
    pub notes: String,
    /// Discrete fix instructions for the refiner.
    #[serde(default)]
    pub fixes: Vec<String>,
}

impl ValidationResult {
    /// Mean of all six dimensions, each clamped to 0–100.
    pub fn overall(&self) -> f64 {
        let dims = [
            self.color_match,
            self.typography_match,
            self.spacing_match,
            self.visual_depth,
            self.brand_fit,
            self.layout_sophistication,
        ];
        dims.iter().map(|d| d.clamp(0.0, 100.0)).sum::<f64>() / dims.len() as f64
    }
}

// ---------------------------------------------------------------------------
// CompiledOutput
// ---------------------------------------------------------------------------

/// How the final output was produced, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositionPath {
    /// Literal extracted brand fragments with slot substitution.
    ExtractedComponents,
    /// Token-based synthesis from a design personality.
    TokenSynthesis,
}

/// Final artifact of one compilation run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledOutput {
    /// Complete article markup.
    pub markup: String,
    /// Complete stylesheet covering every emitted class.
    pub stylesheet: String,
    /// Component names actually rendered (prose when a structured component
    /// fell back — callers can distinguish "as intended" from "via fallback").
    pub components_used: Vec<String>,
    /// Which composition path produced this output.
    pub path: CompositionPath,
    /// Refinement convergence flag; `None` when no refinement loop ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converged: Option<bool>,
    /// Structural SEO audit of the final markup.
    #[serde(default)]
    pub seo: SeoValidationResult,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The document handed to the compile pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleInput {
    pub title: String,
    pub sections: Vec<Section>,
    /// `<script type="application/ld+json">` blocks accompanying the source
    /// document. Carried through to the output byte-identically.
    #[serde(default)]
    pub structured_data: Vec<String>,
}

/// Optional business context passed as an explicit immutable parameter —
/// never module-level state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cta_url: Option<String>,
}

// ---------------------------------------------------------------------------
// SeoValidationResult
// ---------------------------------------------------------------------------

/// Structural SEO checks run over the final markup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoValidationResult {
    /// Exactly one top-level heading.
    pub single_h1: bool,
    /// No skipped heading levels (h1→h3 without h2 fails).
    pub no_skipped_levels: bool,
    /// Every `<img>` carries non-empty alt text.
    pub images_have_alt: bool,
    /// Structured-data blocks from the input survive byte-identically.
    pub structured_data_preserved: bool,
    /// Human-readable findings for each failed check.
    #[serde(default)]
    pub issues: Vec<String>,
}

impl SeoValidationResult {
    pub fn passed(&self) -> bool {
        self.single_h1
            && self.no_skipped_levels
            && self.images_have_alt
            && self.structured_data_preserved
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_total_order() {
        assert!(Emphasis::Hero > Emphasis::Featured);
        assert!(Emphasis::Featured > Emphasis::Standard);
        assert!(Emphasis::Standard > Emphasis::Supporting);
        assert!(Emphasis::Supporting > Emphasis::Minimal);
    }

    #[test]
    fn component_kind_serde_kebab() {
        let json = serde_json::to_string(&ComponentKind::FeatureGrid).expect("serialize");
        assert_eq!(json, r#""feature-grid""#);
        let parsed: ComponentKind = serde_json::from_str(r#""faq-accordion""#).expect("parse");
        assert_eq!(parsed, ComponentKind::FaqAccordion);
    }

    #[test]
    fn component_class_names_prefixed() {
        assert_eq!(ComponentKind::StepList.class_name(), "sp-step-list");
        assert_eq!(ComponentKind::Prose.class_name(), "sp-prose");
    }

    #[test]
    fn structured_components_require_two_items() {
        assert_eq!(ComponentKind::FeatureGrid.min_items(), 2);
        assert_eq!(ComponentKind::StepList.min_items(), 2);
        assert_eq!(ComponentKind::Blockquote.min_items(), 0);
        assert_eq!(ComponentKind::DefinitionBox.min_items(), 0);
        assert_eq!(ComponentKind::LeadParagraph.min_items(), 0);
    }

    #[test]
    fn validation_result_overall_is_clamped_mean() {
        let result = ValidationResult {
            color_match: 120.0,
            typography_match: -10.0,
            spacing_match: 50.0,
            visual_depth: 50.0,
            brand_fit: 50.0,
            layout_sophistication: 30.0,
            ..Default::default()
        };
        // 100 + 0 + 50 + 50 + 50 + 30 = 280 / 6
        assert!((result.overall() - 280.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn extracted_component_rejects_templating_markers() {
        for html in [
            "<div>{{title}}</div>",
            "<div>${name}</div>",
            "<div><% body %></div>",
            r#"<div style="color: var(--brand)">x</div>"#,
        ] {
            let fragment = ExtractedComponent {
                component: ComponentKind::Hero,
                html: html.into(),
                css: String::new(),
                slots: vec![],
            };
            assert!(fragment.validate().is_err(), "should reject {html}");
        }
    }

    #[test]
    fn extracted_component_rejects_templated_css() {
        for css in [
            ".hero { color: {{brand_color}}; }",
            ".hero { padding: var(--spacing-lg); }",
        ] {
            let fragment = ExtractedComponent {
                component: ComponentKind::Hero,
                html: "<div class=\"hero\">x</div>".into(),
                css: css.into(),
                slots: vec![],
            };
            assert!(fragment.validate().is_err(), "should reject {css}");
        }
    }

    #[test]
    fn extracted_component_accepts_frozen_fragment() {
        let fragment = ExtractedComponent {
            component: ComponentKind::Hero,
            html: r#"<section class="hero"><h1>Title</h1></section>"#.into(),
            css: ".hero { background: #003366; }".into(),
            slots: vec![ContentSlot {
                selector: "h1".into(),
                kind: SlotKind::Text,
                required: true,
            }],
        };
        assert!(fragment.validate().is_ok());
    }

    #[test]
    fn token_set_order_is_stable() {
        let mut a = ResolvedTokenSet::default();
        a.insert("--sp-primary", "#036");
        a.insert("--sp-background", "#fff");
        let mut b = ResolvedTokenSet::default();
        b.insert("--sp-background", "#fff");
        b.insert("--sp-primary", "#036");
        assert_eq!(a, b);
        let keys: Vec<_> = a.vars.keys().collect();
        assert_eq!(keys, vec!["--sp-background", "--sp-primary"]);
    }

    #[test]
    fn compiled_output_serde_roundtrip() {
        let output = CompiledOutput {
            markup: "<article></article>".into(),
            stylesheet: ":root {}".into(),
            components_used: vec!["hero".into(), "prose".into()],
            path: CompositionPath::TokenSynthesis,
            converged: Some(false),
            seo: SeoValidationResult::default(),
        };
        let json = serde_json::to_string(&output).expect("serialize");
        let parsed: CompiledOutput = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, output);
    }
}
