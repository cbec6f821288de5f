//! Shared types, error model, and configuration for StylePress.
//!
//! This crate is the foundation depended on by all other StylePress crates.
//! It provides:
//! - [`StylePressError`] — the unified error type
//! - Domain types ([`Section`], [`ComponentAssignment`], [`DesignPersonality`],
//!   [`ResolvedTokenSet`], [`ExtractedComponent`], [`CompiledOutput`])
//! - Configuration ([`AppConfig`], [`RoleKeywords`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CollaboratorConfig, RefinementConfig, RoleKeywords, config_dir, config_file_path,
    load_config, load_config_from, validate_api_key,
};
pub use error::{Result, StylePressError};
pub use types::{
    ArticleInput, BusinessContext, ColorRoles, CompiledOutput, ComponentAssignment,
    ComponentCategory, ComponentKind, CompositionPath, ContentSlot, DesignPersonality, Emphasis,
    ExtractedComponent, LayoutTokens, LayoutWidth, MotionTokens, ResolvedTokenSet, Role, Section,
    SectionId, SeoValidationResult, SlotKind, SpacingSize, Typography, ValidationResult,
};
