//! Component renderer dispatcher: turns a component assignment plus section
//! content into markup carrying stable `sp-*` class hooks.
//!
//! The dispatcher never emits inline style values — visual adjustment is
//! always achievable by rewriting the stylesheet alone, which is what makes
//! the vision refinement loop tractable. Dispatch is an exhaustive `match`
//! over the closed [`ComponentKind`] enum.

mod extract;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use stylepress_shared::{BusinessContext, ComponentAssignment, ComponentKind, Section};

pub use extract::{QaPair, Stat, Table, TitledItem};

static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static EM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid regex"));
static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("valid regex"));

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Ambient inputs the dispatcher may substitute into conversion components.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderContext<'a> {
    /// Article title, used by the hero when its section has no heading.
    pub article_title: &'a str,
    /// Optional business context (CTA copy and link).
    pub business: Option<&'a BusinessContext>,
}

/// Result of rendering one section.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    /// Markup fragment for the section.
    pub html: String,
    /// The component actually rendered — prose when a structured component
    /// fell back, so callers can tell "as intended" from "via fallback".
    pub component: ComponentKind,
    /// Root classes used, for the style compiler's coverage check.
    pub classes_used: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Render one section according to its assignment.
///
/// Fallback policy: a component requiring at least two structured items
/// (grids, lists, accordions, tables) renders generic prose when extraction
/// yields fewer — never an empty or single-item grid. Components with no
/// minimum never fall back.
#[instrument(skip_all, fields(component = %assignment.component, section = %section.id))]
pub fn render(
    assignment: &ComponentAssignment,
    section: &Section,
    ctx: &RenderContext<'_>,
) -> Rendered {
    let body = match assignment.component {
        ComponentKind::Prose => Some(prose_body(section)),
        ComponentKind::Hero => Some(hero_body(section, ctx)),
        ComponentKind::LeadParagraph => Some(lead_paragraph_body(section)),
        ComponentKind::DefinitionBox => Some(definition_box_body(section)),
        ComponentKind::Blockquote => Some(blockquote_body(section)),
        ComponentKind::TestimonialCard => Some(testimonial_body(section)),
        ComponentKind::StatHighlight => Some(stat_highlight_body(section)),
        ComponentKind::CtaBanner => Some(cta_banner_body(section, ctx)),
        ComponentKind::FeatureGrid => feature_grid_body(section),
        ComponentKind::Checklist => checklist_body(section),
        ComponentKind::KeyTakeaways => key_takeaways_body(section),
        ComponentKind::StepList => step_list_body(section),
        ComponentKind::Timeline => timeline_body(section),
        ComponentKind::FaqAccordion => faq_accordion_body(section),
        ComponentKind::ComparisonTable => comparison_table_body(section),
    };

    let (component, body) = match body {
        Some(body) => (assignment.component, body),
        None => {
            debug!(
                intended = %assignment.component,
                "structured extraction below minimum, falling back to prose"
            );
            (ComponentKind::Prose, prose_body(section))
        }
    };

    let html = format!(
        "<section class=\"sp-section sp-section--{emphasis} sp-width--{width} \
         sp-flow-before--{before} sp-flow-after--{after}\" data-component=\"{component}\" \
         data-role=\"{role}\">\n{body}</section>\n",
        emphasis = assignment.emphasis.as_str(),
        width = assignment.layout_width.as_str(),
        before = assignment.spacing_before.as_str(),
        after = assignment.spacing_after.as_str(),
        component = component.as_str(),
        role = assignment.role.as_str(),
    );

    Rendered {
        html,
        component,
        classes_used: vec![component.class_name()],
    }
}

// ---------------------------------------------------------------------------
// Component bodies
// ---------------------------------------------------------------------------

/// Section heading markup. Non-hero headings are clamped to h2+ so the hero
/// stays the document's only h1.
fn heading_html(section: &Section) -> String {
    if section.heading.is_empty() {
        return String::new();
    }
    let level = section.heading_level.clamp(2, 6);
    format!(
        "<h{level} class=\"sp-section__heading\">{}</h{level}>\n",
        inline_markup(&section.heading)
    )
}

fn prose_body(section: &Section) -> String {
    let mut html = String::from("<div class=\"sp-prose\">\n");
    html.push_str(&heading_html(section));
    for para in extract::paragraphs(&section.content) {
        html.push_str(&format!("<p>{}</p>\n", inline_markup(&para)));
    }
    html.push_str("</div>\n");
    html
}

fn hero_body(section: &Section, ctx: &RenderContext<'_>) -> String {
    let title = if section.heading.is_empty() {
        ctx.article_title
    } else {
        &section.heading
    };
    let mut html = String::from("<header class=\"sp-hero\">\n");
    html.push_str(&format!(
        "<h1 class=\"sp-hero__title\">{}</h1>\n",
        inline_markup(title)
    ));
    if let Some(lead) = extract::paragraphs(&section.content).first() {
        html.push_str(&format!("<p class=\"sp-hero__lead\">{}</p>\n", inline_markup(lead)));
    }
    html.push_str("</header>\n");
    html
}

fn lead_paragraph_body(section: &Section) -> String {
    let mut html = String::from("<div class=\"sp-lead-paragraph\">\n");
    html.push_str(&heading_html(section));
    let paras = extract::paragraphs(&section.content);
    for (i, para) in paras.iter().enumerate() {
        if i == 0 {
            html.push_str(&format!(
                "<p class=\"sp-lead-paragraph__text\">{}</p>\n",
                inline_markup(para)
            ));
        } else {
            html.push_str(&format!("<p>{}</p>\n", inline_markup(para)));
        }
    }
    html.push_str("</div>\n");
    html
}

fn definition_box_body(section: &Section) -> String {
    let mut html = String::from("<aside class=\"sp-definition-box\">\n");
    html.push_str(&heading_html(section));
    for para in extract::paragraphs(&section.content) {
        html.push_str(&format!(
            "<p class=\"sp-definition-box__text\">{}</p>\n",
            inline_markup(&para)
        ));
    }
    html.push_str("</aside>\n");
    html
}

fn blockquote_body(section: &Section) -> String {
    let (text, attribution) = extract::quote(&section.content)
        .unwrap_or_else(|| (section.content.trim().to_string(), None));
    let mut html = String::from("<blockquote class=\"sp-blockquote\">\n");
    html.push_str(&format!("<p>{}</p>\n", inline_markup(&text)));
    if let Some(who) = attribution {
        html.push_str(&format!(
            "<cite class=\"sp-blockquote__cite\">{}</cite>\n",
            inline_markup(&who)
        ));
    }
    html.push_str("</blockquote>\n");
    html
}

fn testimonial_body(section: &Section) -> String {
    let (text, attribution) = extract::quote(&section.content)
        .unwrap_or_else(|| (section.content.trim().to_string(), None));
    let mut html = String::from("<figure class=\"sp-testimonial-card\">\n");
    html.push_str(&format!(
        "<blockquote class=\"sp-testimonial-card__quote\"><p>{}</p></blockquote>\n",
        inline_markup(&text)
    ));
    if let Some(who) = attribution {
        html.push_str(&format!(
            "<figcaption class=\"sp-testimonial-card__attribution\">{}</figcaption>\n",
            inline_markup(&who)
        ));
    }
    html.push_str("</figure>\n");
    html
}

fn stat_highlight_body(section: &Section) -> String {
    let stats = extract::stats(&section.content);
    let mut html = String::from("<div class=\"sp-stat-highlight\">\n");
    html.push_str(&heading_html(section));
    if stats.is_empty() {
        for para in extract::paragraphs(&section.content) {
            html.push_str(&format!(
                "<p class=\"sp-stat-highlight__context\">{}</p>\n",
                inline_markup(&para)
            ));
        }
    } else {
        html.push_str("<dl class=\"sp-stat-highlight__grid\">\n");
        for stat in stats {
            html.push_str(&format!(
                "<div class=\"sp-stat-highlight__stat\"><dt class=\"sp-stat-highlight__label\">{}</dt>\
                 <dd class=\"sp-stat-highlight__value\">{}</dd></div>\n",
                inline_markup(&stat.label),
                inline_markup(&stat.value)
            ));
        }
        html.push_str("</dl>\n");
    }
    html.push_str("</div>\n");
    html
}

fn cta_banner_body(section: &Section, ctx: &RenderContext<'_>) -> String {
    let business = ctx.business;
    let cta_text = business
        .and_then(|b| b.cta_text.as_deref())
        .unwrap_or("Get in touch");
    let cta_url = business
        .and_then(|b| b.cta_url.as_deref())
        .unwrap_or("#contact");

    let mut html = String::from("<div class=\"sp-cta-banner\">\n");
    html.push_str(&heading_html(section));
    if let Some(para) = extract::paragraphs(&section.content).first() {
        html.push_str(&format!(
            "<p class=\"sp-cta-banner__text\">{}</p>\n",
            inline_markup(para)
        ));
    }
    html.push_str(&format!(
        "<a class=\"sp-cta-banner__button\" href=\"{}\">{}</a>\n",
        escape_html(cta_url),
        inline_markup(cta_text)
    ));
    html.push_str("</div>\n");
    html
}

fn feature_grid_body(section: &Section) -> Option<String> {
    let items = extract::bullets(&section.content);
    if items.len() < ComponentKind::FeatureGrid.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<div class=\"sp-feature-grid\">\n");
    for item in items {
        html.push_str("<div class=\"sp-feature-grid__item\">\n");
        html.push_str(&format!(
            "<h3 class=\"sp-feature-grid__title\">{}</h3>\n",
            inline_markup(&item.title)
        ));
        if !item.description.is_empty() {
            html.push_str(&format!(
                "<p class=\"sp-feature-grid__description\">{}</p>\n",
                inline_markup(&item.description)
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</div>\n");
    Some(html)
}

fn checklist_body(section: &Section) -> Option<String> {
    let items = extract::bullets(&section.content);
    if items.len() < ComponentKind::Checklist.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<ul class=\"sp-checklist\">\n");
    for item in items {
        html.push_str(&format!(
            "<li class=\"sp-checklist__item\"><span class=\"sp-checklist__marker\" \
             aria-hidden=\"true\"></span>{}</li>\n",
            inline_markup(&full_item_text(&item))
        ));
    }
    html.push_str("</ul>\n");
    Some(html)
}

fn key_takeaways_body(section: &Section) -> Option<String> {
    let mut items = extract::bullets(&section.content);
    if items.is_empty() {
        // Summaries are often written as short sentences, not bullets.
        items = extract::paragraphs(&section.content)
            .into_iter()
            .flat_map(|p| {
                p.split(". ")
                    .map(|s| s.trim().trim_end_matches('.').to_string())
                    .collect::<Vec<_>>()
            })
            .filter(|s| s.len() > 15)
            .map(|s| TitledItem {
                title: s,
                description: String::new(),
            })
            .collect();
    }
    if items.len() < ComponentKind::KeyTakeaways.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<div class=\"sp-key-takeaways\">\n<ul class=\"sp-key-takeaways__list\">\n");
    for item in items {
        html.push_str(&format!(
            "<li class=\"sp-key-takeaways__item\">{}</li>\n",
            inline_markup(&full_item_text(&item))
        ));
    }
    html.push_str("</ul>\n</div>\n");
    Some(html)
}

fn step_list_body(section: &Section) -> Option<String> {
    let steps = extract::steps(&section.content);
    if steps.len() < ComponentKind::StepList.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<ol class=\"sp-step-list\">\n");
    for (i, step) in steps.iter().enumerate() {
        html.push_str(&format!(
            "<li class=\"sp-step-list__step\"><span class=\"sp-step-list__number\" \
             aria-hidden=\"true\">{}</span><div class=\"sp-step-list__body\">\
             <h3 class=\"sp-step-list__title\">{}</h3>{}</div></li>\n",
            i + 1,
            inline_markup(&step.title),
            if step.description.is_empty() {
                String::new()
            } else {
                format!("<p class=\"sp-step-list__description\">{}</p>", inline_markup(&step.description))
            }
        ));
    }
    html.push_str("</ol>\n");
    Some(html)
}

fn timeline_body(section: &Section) -> Option<String> {
    let entries = extract::steps(&section.content);
    if entries.len() < ComponentKind::Timeline.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<ol class=\"sp-timeline\">\n");
    for entry in entries {
        html.push_str(&format!(
            "<li class=\"sp-timeline__entry\"><span class=\"sp-timeline__marker\" \
             aria-hidden=\"true\"></span><div class=\"sp-timeline__body\">\
             <h3 class=\"sp-timeline__title\">{}</h3>{}</div></li>\n",
            inline_markup(&entry.title),
            if entry.description.is_empty() {
                String::new()
            } else {
                format!("<p class=\"sp-timeline__description\">{}</p>", inline_markup(&entry.description))
            }
        ));
    }
    html.push_str("</ol>\n");
    Some(html)
}

fn faq_accordion_body(section: &Section) -> Option<String> {
    let pairs = extract::faqs(&section.content);
    if pairs.len() < ComponentKind::FaqAccordion.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<div class=\"sp-faq-accordion\">\n");
    for pair in pairs {
        html.push_str(&format!(
            "<details class=\"sp-faq-accordion__item\"><summary \
             class=\"sp-faq-accordion__question\">{}</summary>\
             <p class=\"sp-faq-accordion__answer\">{}</p></details>\n",
            inline_markup(&pair.question),
            inline_markup(&pair.answer)
        ));
    }
    html.push_str("</div>\n");
    Some(html)
}

fn comparison_table_body(section: &Section) -> Option<String> {
    let table = extract::table(&section.content)?;
    if table.rows.len() < ComponentKind::ComparisonTable.min_items() {
        return None;
    }
    let mut html = String::new();
    html.push_str(&heading_html(section));
    html.push_str("<div class=\"sp-comparison-table\">\n<table>\n<thead>\n<tr>");
    for header in &table.headers {
        html.push_str(&format!("<th>{}</th>", inline_markup(header)));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", inline_markup(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</div>\n");
    Some(html)
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

fn full_item_text(item: &TitledItem) -> String {
    if item.description.is_empty() {
        item.title.clone()
    } else {
        format!("{}: {}", item.title, item.description)
    }
}

/// Escape HTML-significant characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape, then convert the small inline markdown subset (bold, emphasis,
/// links) the article-writing workflow emits.
pub fn inline_markup(s: &str) -> String {
    let escaped = escape_html(s);
    let bold = BOLD_RE.replace_all(&escaped, "<strong>$1</strong>");
    let emphasized = EM_RE.replace_all(&bold, "<em>$1</em>");
    LINK_RE
        .replace_all(&emphasized, "<a href=\"$2\">$1</a>")
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
