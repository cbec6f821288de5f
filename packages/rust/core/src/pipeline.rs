//! Token-synthesis compile pipeline: sections in, markup + stylesheet out.

use tracing::{info, instrument};

use stylepress_blueprint::architect;
use stylepress_render::{render, RenderContext};
use stylepress_shared::{
    ArticleInput, BusinessContext, CompiledOutput, CompositionPath, DesignPersonality,
    Result, RoleKeywords, StylePressError,
};
use stylepress_stylesheet::compile;
use stylepress_tokens::resolve;

use crate::seo::validate_seo;

/// Segment raw markdown into an [`ArticleInput`].
pub fn article_from_markdown(title: impl Into<String>, raw: &str) -> ArticleInput {
    ArticleInput {
        title: title.into(),
        sections: stylepress_segment::segment(raw),
        structured_data: Vec::new(),
    }
}

/// Compile an article through the full synthesis pipeline.
///
/// Pure function of its inputs: the same article and personality always
/// produce a byte-identical [`CompiledOutput`].
#[instrument(skip_all, fields(title = %article.title, sections = article.sections.len()))]
pub fn compile_personality(
    article: &ArticleInput,
    personality: &DesignPersonality,
    business: Option<&BusinessContext>,
    keywords: &RoleKeywords,
) -> Result<CompiledOutput> {
    if article.sections.is_empty() {
        return Err(StylePressError::validation("article has no sections"));
    }

    let assignments = architect(&article.sections, keywords, business);
    let ctx = RenderContext {
        article_title: &article.title,
        business,
    };

    let mut markup = String::from("<article class=\"sp-article\">\n");
    let mut components_used: Vec<String> = Vec::new();
    let mut classes: Vec<String> = Vec::new();

    for (assignment, section) in assignments.iter().zip(&article.sections) {
        let rendered = render(assignment, section, &ctx);
        markup.push_str(&rendered.html);

        let name = rendered.component.as_str().to_string();
        if !components_used.contains(&name) {
            components_used.push(name);
        }
        for class in rendered.classes_used {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
    }

    for block in &article.structured_data {
        markup.push_str("<script type=\"application/ld+json\">");
        markup.push_str(block);
        markup.push_str("</script>\n");
    }
    markup.push_str("</article>\n");

    let tokens = resolve(personality)?;
    let stylesheet = compile(&tokens, &classes)?;
    let seo = validate_seo(&markup, &article.structured_data);

    info!(
        components = components_used.len(),
        stylesheet_bytes = stylesheet.len(),
        seo_passed = seo.passed(),
        "article compiled via token synthesis"
    );

    Ok(CompiledOutput {
        markup,
        stylesheet,
        components_used,
        path: CompositionPath::TokenSynthesis,
        converged: None,
        seo,
    })
}
