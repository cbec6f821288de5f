//! Vision refinement: iteratively rewrite a compiled stylesheet until a
//! screenshot of the styled page scores close enough to the brand reference.
//!
//! The loop itself is deterministic plumbing; all judgment lives behind the
//! [`PageRenderer`], [`VisionScorer`] and [`StyleRefiner`] traits so tests
//! run against stubs and production wires in the HTTP collaborators.

mod collaborator;
mod sanitize;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use stylepress_shared::{RefinementConfig, Result, ValidationResult};

pub use collaborator::{Collaborator, HttpStyleRefiner, HttpVisionScorer, ScreenshotService};
pub use sanitize::sanitize_stylesheet;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Renders markup + stylesheet to a PNG screenshot.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn screenshot(&self, markup: &str, stylesheet: &str) -> Result<Vec<u8>>;
}

/// Scores a candidate screenshot against the brand reference.
#[async_trait]
pub trait VisionScorer: Send + Sync {
    async fn score(&self, reference_png: &[u8], candidate_png: &[u8]) -> Result<ValidationResult>;
}

/// Rewrites a stylesheet to address the scorer's fix list.
#[async_trait]
pub trait StyleRefiner: Send + Sync {
    async fn refine(&self, stylesheet: &str, validation: &ValidationResult) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Sender half of a cancellation pair.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiver half; cheap to clone into whatever needs to observe it.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires, for callers without a cancel path.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        // Keep the sender alive for the life of the receiver.
        std::mem::forget(tx);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

// ---------------------------------------------------------------------------
// Refinement loop
// ---------------------------------------------------------------------------

/// Result of a refinement run. `stylesheet` is always usable: the
/// best-scoring candidate seen, falling back to the input when nothing
/// scored higher.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineOutcome {
    pub stylesheet: String,
    pub best_score: f64,
    pub iterations: u32,
    pub converged: bool,
    /// Overall score per scored candidate, in order.
    pub history: Vec<f64>,
}

/// Drives score-refine rounds until the threshold is met, the iteration
/// budget runs out, or cancellation fires.
pub struct RefinementLoop<'a> {
    renderer: &'a dyn PageRenderer,
    scorer: &'a dyn VisionScorer,
    refiner: &'a dyn StyleRefiner,
    config: &'a RefinementConfig,
}

impl<'a> RefinementLoop<'a> {
    pub fn new(
        renderer: &'a dyn PageRenderer,
        scorer: &'a dyn VisionScorer,
        refiner: &'a dyn StyleRefiner,
        config: &'a RefinementConfig,
    ) -> Self {
        Self {
            renderer,
            scorer,
            refiner,
            config,
        }
    }

    /// Run the loop. The initial stylesheet is scored first; each iteration
    /// then refines and re-scores. A refined stylesheet that fails
    /// sanitization is discarded and the loop stops on the best seen so far.
    #[instrument(skip_all, fields(
        threshold = self.config.score_threshold,
        max_iterations = self.config.max_iterations,
    ))]
    pub async fn run(
        &self,
        markup: &str,
        stylesheet: &str,
        reference_png: &[u8],
        mut cancel: CancelSignal,
    ) -> Result<RefineOutcome> {
        let mut current = stylesheet.to_string();
        let mut best = current.clone();
        let mut best_score = f64::NEG_INFINITY;
        let mut history = Vec::new();
        let mut iterations = 0u32;

        loop {
            if cancel.is_cancelled() {
                warn!("refinement cancelled, keeping best stylesheet so far");
                break;
            }

            let validation = tokio::select! {
                result = self.score_candidate(markup, &current, reference_png) => result?,
                _ = cancel.cancelled() => {
                    warn!("refinement cancelled mid-score, keeping best stylesheet so far");
                    break;
                }
            };
            let overall = validation.overall();
            history.push(overall);
            if overall > best_score {
                best_score = overall;
                best = current.clone();
            }

            if overall >= self.config.score_threshold {
                info!(score = overall, iterations, "refinement converged");
                return Ok(RefineOutcome {
                    stylesheet: current,
                    best_score: overall,
                    iterations,
                    converged: true,
                    history,
                });
            }

            if iterations >= self.config.max_iterations {
                info!(
                    best_score,
                    iterations, "iteration budget exhausted without convergence"
                );
                break;
            }
            iterations += 1;

            debug!(iteration = iterations, score = overall, fixes = validation.fixes.len(),
                   "refining stylesheet");
            let refined = tokio::select! {
                result = self.refiner.refine(&current, &validation) => result?,
                _ = cancel.cancelled() => {
                    warn!("refinement cancelled mid-refine, keeping best stylesheet so far");
                    break;
                }
            };

            match sanitize_stylesheet(&refined, self.config.max_stylesheet_chars) {
                Some(cleaned) => current = cleaned,
                None => {
                    // Keep the last known-good stylesheet for the next round.
                    warn!(iteration = iterations, "refined stylesheet unusable, discarding it");
                }
            }
        }

        let best_score = if best_score.is_finite() { best_score } else { 0.0 };
        Ok(RefineOutcome {
            stylesheet: best,
            best_score,
            iterations,
            converged: false,
            history,
        })
    }

    async fn score_candidate(
        &self,
        markup: &str,
        stylesheet: &str,
        reference_png: &[u8],
    ) -> Result<ValidationResult> {
        let candidate = self.renderer.screenshot(markup, stylesheet).await?;
        self.scorer.score(reference_png, &candidate).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRenderer;

    #[async_trait]
    impl PageRenderer for StubRenderer {
        async fn screenshot(&self, _markup: &str, _stylesheet: &str) -> Result<Vec<u8>> {
            Ok(vec![0x89, 0x50, 0x4e, 0x47])
        }
    }

    struct FixedScorer {
        overall: f64,
        calls: AtomicUsize,
    }

    impl FixedScorer {
        fn new(overall: f64) -> Self {
            Self {
                overall,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VisionScorer for FixedScorer {
        async fn score(&self, _reference: &[u8], _candidate: &[u8]) -> Result<ValidationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ValidationResult {
                color_match: self.overall,
                typography_match: self.overall,
                spacing_match: self.overall,
                visual_depth: self.overall,
                brand_fit: self.overall,
                layout_sophistication: self.overall,
                ..Default::default()
            })
        }
    }

    struct CountingRefiner {
        calls: AtomicUsize,
    }

    impl CountingRefiner {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StyleRefiner for CountingRefiner {
        async fn refine(&self, stylesheet: &str, _validation: &ValidationResult) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("{stylesheet}\n/* pass {n} */ .sp-section {{ color: inherit; }}"))
        }
    }

    fn config() -> RefinementConfig {
        RefinementConfig {
            score_threshold: 90.0,
            max_iterations: 3,
            max_stylesheet_chars: 24_000,
        }
    }

    const CSS: &str = ".sp-section { display: block; }";

    #[tokio::test]
    async fn converges_immediately_on_high_score() {
        let scorer = FixedScorer::new(95.0);
        let refiner = CountingRefiner::new();
        let config = config();
        let lp = RefinementLoop::new(&StubRenderer, &scorer, &refiner, &config);

        let outcome = lp
            .run("<section></section>", CSS, b"ref", CancelSignal::never())
            .await
            .expect("loop runs");

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.stylesheet, CSS);
        assert_eq!(refiner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_budget_with_exactly_max_iterations_refines() {
        let scorer = FixedScorer::new(40.0);
        let refiner = CountingRefiner::new();
        let config = config();
        let lp = RefinementLoop::new(&StubRenderer, &scorer, &refiner, &config);

        let outcome = lp
            .run("<section></section>", CSS, b"ref", CancelSignal::never())
            .await
            .expect("loop runs");

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(refiner.calls.load(Ordering::SeqCst), 3);
        // Initial score plus one per refined candidate.
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.history.len(), 4);
    }

    #[tokio::test]
    async fn keeps_best_scoring_candidate_when_exhausted() {
        // Scores fall after the first candidate; the loop must return the
        // original stylesheet, not the last refinement.
        struct FallingScorer {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl VisionScorer for FallingScorer {
            async fn score(&self, _r: &[u8], _c: &[u8]) -> Result<ValidationResult> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                let overall = 60.0 - n as f64 * 10.0;
                Ok(ValidationResult {
                    color_match: overall,
                    typography_match: overall,
                    spacing_match: overall,
                    visual_depth: overall,
                    brand_fit: overall,
                    layout_sophistication: overall,
                    ..Default::default()
                })
            }
        }

        let scorer = FallingScorer {
            calls: AtomicUsize::new(0),
        };
        let refiner = CountingRefiner::new();
        let config = config();
        let lp = RefinementLoop::new(&StubRenderer, &scorer, &refiner, &config);

        let outcome = lp
            .run("<section></section>", CSS, b"ref", CancelSignal::never())
            .await
            .expect("loop runs");

        assert!(!outcome.converged);
        assert_eq!(outcome.stylesheet, CSS);
        assert_eq!(outcome.best_score, 60.0);
    }

    #[tokio::test]
    async fn pre_cancelled_signal_returns_input_untouched() {
        let scorer = FixedScorer::new(95.0);
        let refiner = CountingRefiner::new();
        let config = config();
        let lp = RefinementLoop::new(&StubRenderer, &scorer, &refiner, &config);

        let (handle, signal) = cancel_pair();
        handle.cancel();

        let outcome = lp
            .run("<section></section>", CSS, b"ref", signal)
            .await
            .expect("loop runs");

        assert!(!outcome.converged);
        assert_eq!(outcome.stylesheet, CSS);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
        assert_eq!(refiner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unusable_refinement_keeps_last_known_good() {
        struct ProseRefiner;

        #[async_trait]
        impl StyleRefiner for ProseRefiner {
            async fn refine(&self, _s: &str, _v: &ValidationResult) -> Result<String> {
                Ok("I could not produce CSS this time, sorry.".into())
            }
        }

        let scorer = FixedScorer::new(40.0);
        let config = config();
        let lp = RefinementLoop::new(&StubRenderer, &scorer, &ProseRefiner, &config);

        let outcome = lp
            .run("<section></section>", CSS, b"ref", CancelSignal::never())
            .await
            .expect("loop runs");

        // Every refinement is discarded, so the input survives the full
        // iteration budget.
        assert!(!outcome.converged);
        assert_eq!(outcome.stylesheet, CSS);
        assert_eq!(outcome.iterations, 3);
    }

    #[test]
    fn cancel_signal_observes_handle() {
        let (handle, signal) = cancel_pair();
        assert!(!signal.is_cancelled());
        handle.cancel();
        assert!(signal.is_cancelled());
    }
}
