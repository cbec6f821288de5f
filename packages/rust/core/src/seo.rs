//! Structural SEO checks over final markup.

use scraper::{Html, Selector};
use tracing::instrument;

use stylepress_shared::SeoValidationResult;

/// Validate heading structure, image alt text, and structured-data
/// preservation. `structured_data` holds the ld+json payloads from the input;
/// each must appear in `markup` byte-identically.
#[instrument(skip_all, fields(markup_bytes = markup.len()))]
pub fn validate_seo(markup: &str, structured_data: &[String]) -> SeoValidationResult {
    let doc = Html::parse_fragment(markup);
    let mut issues = Vec::new();

    let headings = Selector::parse("h1, h2, h3, h4, h5, h6").expect("valid selector");
    let levels: Vec<u8> = doc
        .select(&headings)
        .map(|el| el.value().name().as_bytes()[1] - b'0')
        .collect();

    let h1_count = levels.iter().filter(|&&l| l == 1).count();
    let single_h1 = h1_count == 1;
    if h1_count == 0 {
        issues.push("no <h1> found".to_string());
    } else if h1_count > 1 {
        issues.push(format!("{h1_count} <h1> elements found, expected exactly one"));
    }

    let mut no_skipped_levels = true;
    for pair in levels.windows(2) {
        if pair[1] > pair[0] + 1 {
            no_skipped_levels = false;
            issues.push(format!(
                "heading level skips from h{} to h{}",
                pair[0], pair[1]
            ));
        }
    }

    let images = Selector::parse("img").expect("valid selector");
    let mut images_have_alt = true;
    for img in doc.select(&images) {
        let alt_ok = img.value().attr("alt").is_some_and(|alt| !alt.trim().is_empty());
        if !alt_ok {
            images_have_alt = false;
            let src = img.value().attr("src").unwrap_or("<no src>");
            issues.push(format!("image {src} has no alt text"));
        }
    }

    let mut structured_data_preserved = true;
    for block in structured_data {
        if !markup.contains(block.as_str()) {
            structured_data_preserved = false;
            issues.push("a structured-data block was dropped or altered".to_string());
        }
    }

    SeoValidationResult {
        single_h1,
        no_skipped_levels,
        images_have_alt,
        structured_data_preserved,
        issues,
    }
}
