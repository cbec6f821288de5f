//! Core orchestration for StylePress.
//!
//! Ties the pipeline stages together: segmentation, blueprinting, rendering,
//! token resolution, style compilation, optional vision refinement, and the
//! brand-aware composition policy that chooses between literal extracted
//! fragments and token synthesis.

pub mod compose;
pub mod pipeline;
pub mod seo;
mod slots;
pub mod store;

pub use compose::{ComposeOptions, Composer, RefinementBackends};
pub use pipeline::{article_from_markdown, compile_personality};
pub use seo::validate_seo;
pub use store::{ComponentStore, InMemoryComponentStore};
