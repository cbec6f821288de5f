//! Blueprint architect: classifies each section's semantic role and assigns
//! a presentation component, emphasis level, and layout parameters.
//!
//! Classification lives in [`classify`]; this module owns the role→component
//! compatibility table and the position-sensitive emphasis policy.

mod classify;

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, instrument};

use stylepress_shared::{
    BusinessContext, ComponentAssignment, ComponentKind, Emphasis, LayoutWidth, Role,
    RoleKeywords, Section, SpacingSize,
};

pub use classify::classify;

static BULLET_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[-*]\s+(.+)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Compatibility table
// ---------------------------------------------------------------------------

/// Static role→component compatibility table. Many-to-one is allowed; no
/// role maps to a component outside its declared category family.
pub fn compatible_components(role: Role) -> &'static [ComponentKind] {
    match role {
        Role::Introduction => &[ComponentKind::Hero, ComponentKind::LeadParagraph],
        Role::Definition => &[ComponentKind::DefinitionBox, ComponentKind::LeadParagraph],
        Role::Explanation => &[ComponentKind::Prose],
        Role::List => &[
            ComponentKind::FeatureGrid,
            ComponentKind::Checklist,
            ComponentKind::KeyTakeaways,
        ],
        Role::Steps => &[ComponentKind::StepList, ComponentKind::Timeline],
        Role::Faq => &[ComponentKind::FaqAccordion],
        Role::Comparison => &[ComponentKind::ComparisonTable],
        Role::Summary => &[ComponentKind::KeyTakeaways, ComponentKind::Prose],
        Role::Testimonial => &[ComponentKind::TestimonialCard, ComponentKind::Blockquote],
        Role::Data => &[ComponentKind::StatHighlight, ComponentKind::Prose],
        Role::Cta => &[ComponentKind::CtaBanner, ComponentKind::Prose],
        Role::Prose => &[ComponentKind::Prose],
    }
}

// ---------------------------------------------------------------------------
// Architect
// ---------------------------------------------------------------------------

/// Produce one [`ComponentAssignment`] per section.
///
/// Assignments are immutable once returned; a new compilation produces a new
/// set.
#[instrument(skip_all, fields(sections = sections.len()))]
pub fn architect(
    sections: &[Section],
    keywords: &RoleKeywords,
    context: Option<&BusinessContext>,
) -> Vec<ComponentAssignment> {
    let last = sections.len().saturating_sub(1);
    let mut assignments: Vec<ComponentAssignment> = sections
        .iter()
        .enumerate()
        .map(|(index, section)| {
            let role = classify(section, index, keywords);
            let emphasis = assign_emphasis(role, index);
            let component = select_component(role, section, index, context);
            let (layout_width, spacing_before, spacing_after) = layout_for(emphasis);

            ComponentAssignment {
                section_id: section.id.clone(),
                role,
                component,
                emphasis,
                layout_width,
                spacing_before,
                spacing_after,
            }
        })
        .collect();

    // At most one minimal per document: the trailing section, and only when
    // it carries the lowest-weight roles.
    if let Some(tail) = assignments.last_mut() {
        if last > 0
            && tail.emphasis == Emphasis::Standard
            && matches!(tail.role, Role::Explanation | Role::Prose)
        {
            tail.emphasis = Emphasis::Minimal;
            let (width, before, after) = layout_for(Emphasis::Minimal);
            tail.layout_width = width;
            tail.spacing_before = before;
            tail.spacing_after = after;
        }
    }

    debug!(assignments = assignments.len(), "blueprint complete");
    assignments
}

/// Position-sensitive emphasis policy.
fn assign_emphasis(role: Role, index: usize) -> Emphasis {
    if index == 0 {
        return Emphasis::Hero;
    }
    match role {
        Role::Introduction | Role::Definition => Emphasis::Featured,
        Role::Cta => Emphasis::Featured,
        Role::Summary | Role::Faq => Emphasis::Supporting,
        _ => Emphasis::Standard,
    }
}

/// Pick a concrete component from the role's compatibility row.
fn select_component(
    role: Role,
    section: &Section,
    index: usize,
    context: Option<&BusinessContext>,
) -> ComponentKind {
    match role {
        Role::Introduction => {
            if index == 0 {
                ComponentKind::Hero
            } else {
                ComponentKind::LeadParagraph
            }
        }
        Role::Definition => ComponentKind::DefinitionBox,
        Role::Explanation | Role::Prose => ComponentKind::Prose,
        Role::List => select_list_component(&section.content),
        Role::Steps => {
            if section.heading.to_lowercase().contains("timeline") {
                ComponentKind::Timeline
            } else {
                ComponentKind::StepList
            }
        }
        Role::Faq => ComponentKind::FaqAccordion,
        Role::Comparison => ComponentKind::ComparisonTable,
        Role::Summary => ComponentKind::KeyTakeaways,
        Role::Testimonial => {
            if section.content.trim_start().starts_with('>') {
                ComponentKind::Blockquote
            } else {
                ComponentKind::TestimonialCard
            }
        }
        Role::Data => ComponentKind::StatHighlight,
        Role::Cta => {
            // A CTA banner needs actual call-to-action copy to render.
            if context.is_some_and(|c| c.cta_text.is_some()) {
                ComponentKind::CtaBanner
            } else {
                ComponentKind::Prose
            }
        }
    }
}

/// List sections split on item shape: short plain items read as a checklist,
/// items with a title/description split read as a feature grid.
fn select_list_component(content: &str) -> ComponentKind {
    let items: Vec<&str> = BULLET_ITEM_RE
        .captures_iter(content)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if items.is_empty() {
        return ComponentKind::FeatureGrid;
    }

    let with_split = items
        .iter()
        .filter(|i| i.contains(": ") || i.contains(" - ") || i.contains(" — "))
        .count();
    if with_split * 2 >= items.len() {
        return ComponentKind::FeatureGrid;
    }

    let avg_len = items.iter().map(|i| i.len()).sum::<usize>() / items.len();
    if avg_len < 60 {
        ComponentKind::Checklist
    } else {
        ComponentKind::FeatureGrid
    }
}

/// Layout width and vertical rhythm follow the emphasis tier.
fn layout_for(emphasis: Emphasis) -> (LayoutWidth, SpacingSize, SpacingSize) {
    match emphasis {
        Emphasis::Hero => (LayoutWidth::Full, SpacingSize::Dramatic, SpacingSize::Generous),
        Emphasis::Featured => (LayoutWidth::Wide, SpacingSize::Generous, SpacingSize::Generous),
        Emphasis::Standard => (LayoutWidth::Medium, SpacingSize::Normal, SpacingSize::Normal),
        Emphasis::Supporting => (LayoutWidth::Medium, SpacingSize::Normal, SpacingSize::Tight),
        Emphasis::Minimal => (LayoutWidth::Narrow, SpacingSize::Tight, SpacingSize::Tight),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stylepress_shared::{ComponentCategory, SectionId};

    fn section(heading: &str, content: &str) -> Section {
        Section {
            id: SectionId::new(),
            heading: heading.into(),
            heading_level: 2,
            content: content.into(),
        }
    }

    fn doc() -> Vec<Section> {
        vec![
            section("", "An opening paragraph about the topic."),
            section("What is property management?", "It is the operation of real estate."),
            section("Our Services", "- cleaning\n- maintenance\n- administration\n- billing"),
            section("How to get started", "1. Call us\n2. Get a quote\n3. Sign the contract"),
            section("Frequently Asked Questions", "How much?\nIt depends.\nHow fast?\nSoon."),
            section("Conclusion", "In short, we handle everything."),
        ]
    }

    #[test]
    fn one_assignment_per_section_in_order() {
        let sections = doc();
        let assignments = architect(&sections, &RoleKeywords::default(), None);
        assert_eq!(assignments.len(), sections.len());
        for (section, assignment) in sections.iter().zip(&assignments) {
            assert_eq!(assignment.section_id, section.id);
        }
    }

    #[test]
    fn first_section_gets_hero() {
        let assignments = architect(&doc(), &RoleKeywords::default(), None);
        assert_eq!(assignments[0].emphasis, Emphasis::Hero);
        assert_eq!(assignments[0].component, ComponentKind::Hero);
        assert_eq!(assignments[0].layout_width, LayoutWidth::Full);
    }

    #[test]
    fn definition_after_first_is_featured() {
        let assignments = architect(&doc(), &RoleKeywords::default(), None);
        assert_eq!(assignments[1].role, Role::Definition);
        assert_eq!(assignments[1].emphasis, Emphasis::Featured);
        assert_eq!(assignments[1].component, ComponentKind::DefinitionBox);
    }

    #[test]
    fn summary_and_faq_are_supporting() {
        let assignments = architect(&doc(), &RoleKeywords::default(), None);
        assert_eq!(assignments[4].role, Role::Faq);
        assert_eq!(assignments[4].emphasis, Emphasis::Supporting);
        assert_eq!(assignments[5].role, Role::Summary);
        assert_eq!(assignments[5].emphasis, Emphasis::Supporting);
    }

    #[test]
    fn emphasis_order_invariant_holds() {
        let assignments = architect(&doc(), &RoleKeywords::default(), None);
        for assignment in &assignments {
            assert!(assignment.emphasis <= Emphasis::Hero);
            assert!(assignment.emphasis >= Emphasis::Minimal);
        }
    }

    #[test]
    fn at_most_one_minimal_and_only_trailing() {
        let mut sections = doc();
        sections.push(section("Closing remarks", "Plain trailing prose."));
        let assignments = architect(&sections, &RoleKeywords::default(), None);

        let minimal_count = assignments
            .iter()
            .filter(|a| a.emphasis == Emphasis::Minimal)
            .count();
        assert!(minimal_count <= 1);
        assert_eq!(assignments.last().unwrap().emphasis, Emphasis::Minimal);
    }

    #[test]
    fn short_bullets_become_checklist() {
        let assignments = architect(&doc(), &RoleKeywords::default(), None);
        assert_eq!(assignments[2].role, Role::List);
        assert_eq!(assignments[2].component, ComponentKind::Checklist);
    }

    #[test]
    fn titled_bullets_become_feature_grid() {
        let content = "- Cleaning: weekly communal cleaning with inspections\n\
                       - Maintenance: proactive upkeep of shared installations\n\
                       - Administration: bookkeeping, budgets and annual meetings";
        assert_eq!(select_list_component(content), ComponentKind::FeatureGrid);
    }

    #[test]
    fn cta_without_context_downgrades_to_prose() {
        let sections = vec![
            section("", "lead"),
            section("Get started today", "Reach out for a quote."),
        ];
        let assignments = architect(&sections, &RoleKeywords::default(), None);
        assert_eq!(assignments[1].role, Role::Cta);
        assert_eq!(assignments[1].component, ComponentKind::Prose);

        let context = BusinessContext {
            cta_text: Some("Request a quote".into()),
            ..Default::default()
        };
        let assignments = architect(&sections, &RoleKeywords::default(), Some(&context));
        assert_eq!(assignments[1].component, ComponentKind::CtaBanner);
    }

    #[test]
    fn selected_component_is_always_in_compatibility_row() {
        let context = BusinessContext {
            cta_text: Some("Call now".into()),
            ..Default::default()
        };
        let mut sections = doc();
        sections.push(section("Get started today", "Contact us."));
        for assignment in architect(&sections, &RoleKeywords::default(), Some(&context)) {
            assert!(
                compatible_components(assignment.role).contains(&assignment.component),
                "{:?} not compatible with {:?}",
                assignment.component,
                assignment.role
            );
        }
    }

    #[test]
    fn content_roles_never_map_to_conversion_components() {
        for role in [
            Role::List,
            Role::Steps,
            Role::Faq,
            Role::Comparison,
            Role::Summary,
            Role::Data,
            Role::Explanation,
            Role::Prose,
        ] {
            for component in compatible_components(role) {
                assert_ne!(
                    component.category(),
                    ComponentCategory::Conversion,
                    "{role:?} must not map to conversion component {component:?}"
                );
            }
        }
    }
}
