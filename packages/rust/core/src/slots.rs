//! Slot substitution for extracted brand fragments.
//!
//! Fragments are frozen snapshots; substitution injects section content into
//! declared slots without touching the surrounding structure. Everything
//! works on the fragment's own re-serialization, so outer-HTML string
//! replacement is exact rather than heuristic.

use scraper::{Html, Selector};
use tracing::debug;

use stylepress_render::{escape_html, inline_markup};
use stylepress_shared::{BusinessContext, ContentSlot, ExtractedComponent, Section, SlotKind};

/// Why a fragment could not be composed literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SlotFailure {
    /// Slot selector did not parse.
    BadSelector(String),
    /// A required slot matched nothing, or had no content to inject.
    MissingRequired(String),
}

/// Substitute section content into the fragment's slots.
///
/// Optional slots that cannot be filled are left as captured. A failure on a
/// required slot fails the whole fragment so the caller can fall over to
/// synthesis.
pub(crate) fn substitute(
    fragment: &ExtractedComponent,
    section: &Section,
    business: Option<&BusinessContext>,
) -> Result<String, SlotFailure> {
    let doc = Html::parse_fragment(&fragment.html);
    let mut serialized = doc.root_element().inner_html();

    for slot in &fragment.slots {
        let selector = Selector::parse(&slot.selector)
            .map_err(|_| SlotFailure::BadSelector(slot.selector.clone()))?;

        let Some(element) = doc.select(&selector).next() else {
            if slot.required {
                return Err(SlotFailure::MissingRequired(slot.selector.clone()));
            }
            debug!(selector = %slot.selector, "optional slot matched nothing, leaving fragment text");
            continue;
        };

        let Some(value) = slot_content(slot, section, business) else {
            if slot.required {
                return Err(SlotFailure::MissingRequired(slot.selector.clone()));
            }
            continue;
        };

        let outer = element.html();
        let replaced = match slot.kind {
            SlotKind::LinkUrl => set_attr(&outer, "href", &value),
            SlotKind::ImageUrl => set_attr(&outer, "src", &value),
            SlotKind::Text | SlotKind::RichText => {
                let inner = element.inner_html();
                if inner.is_empty() {
                    match outer.rfind("</") {
                        Some(pos) => format!("{}{}{}", &outer[..pos], value, &outer[pos..]),
                        // Void element; nothing to inject into.
                        None => outer.clone(),
                    }
                } else {
                    outer.replacen(&inner, &value, 1)
                }
            }
        };
        serialized = serialized.replacen(&outer, &replaced, 1);
    }

    Ok(serialized)
}

/// Section content for one slot, already escaped for injection.
fn slot_content(
    slot: &ContentSlot,
    section: &Section,
    business: Option<&BusinessContext>,
) -> Option<String> {
    match slot.kind {
        SlotKind::Text => {
            let text = if section.heading.is_empty() {
                paragraphs(&section.content).into_iter().next()?
            } else {
                section.heading.clone()
            };
            Some(escape_html(&text))
        }
        SlotKind::RichText => {
            let paras = paragraphs(&section.content);
            if paras.is_empty() {
                return None;
            }
            Some(
                paras
                    .iter()
                    .map(|p| format!("<p>{}</p>", inline_markup(p)))
                    .collect::<Vec<_>>()
                    .join(""),
            )
        }
        SlotKind::LinkUrl => business
            .and_then(|b| b.cta_url.clone())
            .map(|url| escape_html(&url)),
        // Articles carry no image sources; image slots stay unfilled.
        SlotKind::ImageUrl => None,
    }
}

/// Replace (or add) one attribute value on a serialized element opener.
fn set_attr(outer: &str, name: &str, value: &str) -> String {
    let marker = format!("{name}=\"");
    if let Some(start) = outer.find(&marker) {
        let value_start = start + marker.len();
        match outer[value_start..].find('"') {
            Some(len) => format!(
                "{}{}{}",
                &outer[..value_start],
                value,
                &outer[value_start + len..]
            ),
            None => outer.to_string(),
        }
    } else if let Some(gt) = outer.find('>') {
        format!("{} {name}=\"{value}\"{}", &outer[..gt], &outer[gt..])
    } else {
        outer.to_string()
    }
}

fn paragraphs(content: &str) -> Vec<String> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
