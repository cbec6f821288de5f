//! Brand-aware composition policy.
//!
//! Order of preference: literal extracted fragments when a validated set
//! exists for the brand, token synthesis from a design personality otherwise.
//! With neither, composition is impossible and the error names both missing
//! preconditions. Extraction shortfalls inside a chosen path degrade
//! per-component, never the whole run.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, instrument, warn};

use stylepress_blueprint::architect;
use stylepress_render::{render, RenderContext};
use stylepress_shared::{
    ArticleInput, BusinessContext, ColorRoles, CompiledOutput, ComponentAssignment,
    ComponentKind, CompositionPath, DesignPersonality, LayoutTokens, RefinementConfig,
    Result, RoleKeywords, StylePressError, Typography,
};
use stylepress_stylesheet::{check_dangling, compile, postprocess};
use stylepress_tokens::resolve;
use stylepress_vision::{CancelSignal, PageRenderer, RefinementLoop, StyleRefiner, VisionScorer};

use crate::pipeline::compile_personality;
use crate::seo::validate_seo;
use crate::slots::{substitute, SlotFailure};
use crate::store::ComponentStore;

/// Collaborator seams for the optional refinement stage.
pub struct RefinementBackends<'a> {
    pub renderer: &'a dyn PageRenderer,
    pub scorer: &'a dyn VisionScorer,
    pub refiner: &'a dyn StyleRefiner,
}

/// Per-run composition inputs.
#[derive(Default, Clone, Copy)]
pub struct ComposeOptions<'a> {
    /// Brand whose extracted component set should be considered.
    pub brand_id: Option<&'a str>,
    /// Personality for the synthesis path and for fallback styling.
    pub personality: Option<&'a DesignPersonality>,
    pub business: Option<&'a BusinessContext>,
    /// Brand reference screenshot; enables refinement when backends exist.
    pub reference_png: Option<&'a [u8]>,
}

/// Composes compiled output from whichever brand source is available.
pub struct Composer<'a> {
    store: Option<&'a dyn ComponentStore>,
    refinement: Option<RefinementBackends<'a>>,
    keywords: &'a RoleKeywords,
    refinement_config: &'a RefinementConfig,
}

impl<'a> Composer<'a> {
    pub fn new(keywords: &'a RoleKeywords, refinement_config: &'a RefinementConfig) -> Self {
        Self {
            store: None,
            refinement: None,
            keywords,
            refinement_config,
        }
    }

    pub fn with_store(mut self, store: &'a dyn ComponentStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_refinement(mut self, backends: RefinementBackends<'a>) -> Self {
        self.refinement = Some(backends);
        self
    }

    /// Compose the article through the preferred available path.
    #[instrument(skip_all, fields(
        title = %article.title,
        brand = opts.brand_id.unwrap_or("-"),
        has_personality = opts.personality.is_some(),
    ))]
    pub async fn compose(
        &self,
        article: &ArticleInput,
        opts: ComposeOptions<'_>,
        cancel: CancelSignal,
    ) -> Result<CompiledOutput> {
        if let (Some(brand_id), Some(store)) = (opts.brand_id, self.store) {
            let fragments = store.get_all(brand_id).await?;
            let valid: Vec<_> = fragments
                .into_iter()
                .filter(|f| match f.validate() {
                    Ok(()) => true,
                    Err(reason) => {
                        warn!(component = %f.component, %reason, "skipping invalid fragment");
                        false
                    }
                })
                .collect();

            if !valid.is_empty() {
                info!(fragments = valid.len(), "composing from extracted components");
                return self.compose_extracted(article, &valid, &opts);
            }
            info!(brand = brand_id, "no usable extracted components, trying synthesis");
        }

        let Some(personality) = opts.personality else {
            return Err(StylePressError::NoBrandSource {
                detail: "no validated extracted component set for the brand and no design \
                         personality supplied; provide at least one"
                    .into(),
            });
        };

        let mut output =
            compile_personality(article, personality, opts.business, self.keywords)?;

        if let (Some(reference), Some(backends)) = (opts.reference_png, &self.refinement) {
            self.refine_in_place(&mut output, personality, reference, backends, cancel)
                .await?;
        }

        Ok(output)
    }

    async fn refine_in_place(
        &self,
        output: &mut CompiledOutput,
        personality: &DesignPersonality,
        reference_png: &[u8],
        backends: &RefinementBackends<'_>,
        cancel: CancelSignal,
    ) -> Result<()> {
        let tokens = resolve(personality)?;
        let refinement = RefinementLoop::new(
            backends.renderer,
            backends.scorer,
            backends.refiner,
            self.refinement_config,
        );
        let outcome = refinement
            .run(&output.markup, &output.stylesheet, reference_png, cancel)
            .await?;

        let (processed, report) = postprocess(&outcome.stylesheet, &tokens);
        match check_dangling(&processed, &tokens) {
            Ok(()) => {
                output.stylesheet = processed;
                output.converged = Some(outcome.converged);
                info!(
                    best_score = outcome.best_score,
                    iterations = outcome.iterations,
                    converged = outcome.converged,
                    normalized = report.variables_normalized,
                    "refinement finished"
                );
            }
            Err(e) => {
                warn!(error = %e, "refined stylesheet still dangling, keeping compiled one");
                output.converged = Some(false);
            }
        }
        Ok(())
    }

    /// Literal composition: substituted fragments where captured, synthesis
    /// per component where not.
    fn compose_extracted(
        &self,
        article: &ArticleInput,
        fragments: &[stylepress_shared::ExtractedComponent],
        opts: &ComposeOptions<'_>,
    ) -> Result<CompiledOutput> {
        if article.sections.is_empty() {
            return Err(StylePressError::validation("article has no sections"));
        }

        let mut by_kind: HashMap<ComponentKind, &stylepress_shared::ExtractedComponent> =
            HashMap::new();
        for fragment in fragments {
            by_kind.entry(fragment.component).or_insert(fragment);
        }

        let assignments = architect(&article.sections, self.keywords, opts.business);
        let ctx = RenderContext {
            article_title: &article.title,
            business: opts.business,
        };

        // Fallback styling still needs resolved tokens even when the caller
        // supplied no personality.
        let fallback_personality;
        let personality = match opts.personality {
            Some(p) => p,
            None => {
                fallback_personality = neutral_personality();
                &fallback_personality
            }
        };
        let tokens = resolve(personality)?;

        let mut markup = String::from("<article class=\"sp-article\">\n");
        let mut components_used: Vec<String> = Vec::new();
        let mut classes: Vec<String> = Vec::new();
        let mut fragment_css: Vec<&str> = Vec::new();

        for (assignment, section) in assignments.iter().zip(&article.sections) {
            let literal = by_kind.get(&assignment.component).and_then(|fragment| {
                match substitute(fragment, section, opts.business) {
                    Ok(html) => Some((fragment, html)),
                    Err(SlotFailure::MissingRequired(selector)) => {
                        warn!(
                            component = %assignment.component,
                            %selector,
                            "required slot unfillable, synthesizing this component"
                        );
                        None
                    }
                    Err(SlotFailure::BadSelector(selector)) => {
                        warn!(
                            component = %assignment.component,
                            %selector,
                            "slot selector invalid, synthesizing this component"
                        );
                        None
                    }
                }
            });

            match literal {
                Some((fragment, html)) => {
                    markup.push_str(&wrap_section(assignment, &html));
                    push_unique(&mut components_used, assignment.component.as_str());
                    if !fragment_css.contains(&fragment.css.as_str()) {
                        fragment_css.push(&fragment.css);
                    }
                }
                None => {
                    let rendered = render(assignment, section, &ctx);
                    markup.push_str(&rendered.html);
                    push_unique(&mut components_used, rendered.component.as_str());
                    for class in rendered.classes_used {
                        if !classes.contains(&class) {
                            classes.push(class);
                        }
                    }
                }
            }
        }

        for block in &article.structured_data {
            markup.push_str("<script type=\"application/ld+json\">");
            markup.push_str(block);
            markup.push_str("</script>\n");
        }
        markup.push_str("</article>\n");

        let mut stylesheet = compile(&tokens, &classes)?;
        for css in fragment_css {
            stylesheet.push('\n');
            stylesheet.push_str(css);
            stylesheet.push('\n');
        }

        let seo = validate_seo(&markup, &article.structured_data);

        Ok(CompiledOutput {
            markup,
            stylesheet,
            components_used,
            path: CompositionPath::ExtractedComponents,
            converged: None,
            seo,
        })
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Section wrapper matching the renderer's conventions, for literal
/// fragments.
fn wrap_section(assignment: &ComponentAssignment, body: &str) -> String {
    format!(
        "<section class=\"sp-section sp-section--{emphasis} sp-width--{width} \
         sp-flow-before--{before} sp-flow-after--{after}\" data-component=\"{component}\" \
         data-role=\"{role}\">\n{body}\n</section>\n",
        emphasis = assignment.emphasis.as_str(),
        width = assignment.layout_width.as_str(),
        before = assignment.spacing_before.as_str(),
        after = assignment.spacing_after.as_str(),
        component = assignment.component.as_str(),
        role = assignment.role.as_str(),
    )
}

/// Styling of last resort for synthesized fallbacks inside the extracted
/// path when the caller supplied no personality.
fn neutral_personality() -> DesignPersonality {
    DesignPersonality {
        colors: ColorRoles {
            primary: Some("#334155".into()),
            background: Some("#ffffff".into()),
            surface: Some("#f8fafc".into()),
            text: Some("#0f172a".into()),
            border: Some("#e2e8f0".into()),
            ..Default::default()
        },
        typography: Typography {
            display_font: Some("system-ui, sans-serif".into()),
            body_font: Some("system-ui, sans-serif".into()),
            ..Default::default()
        },
        layout: LayoutTokens {
            radius: BTreeMap::from([("md".to_string(), "0.5rem".to_string())]),
            shadow: BTreeMap::from([(
                "md".to_string(),
                "0 4px 12px rgba(15, 23, 42, 0.08)".to_string(),
            )]),
            ..Default::default()
        },
        ..Default::default()
    }
}
