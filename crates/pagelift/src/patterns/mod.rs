//! Built-in recognition pattern catalogue.
//!
//! Patterns are registered layout first, then content, then widgets. That
//! order is the final tie-break between equally confident, equal-priority
//! matches.

mod content;
mod file;
mod layout;
mod widgets;

pub use file::{load_pattern_file, load_pattern_str, PatternSpec, StructureSpec};

use serde::Serialize;

use crate::config::RecognizerConfig;
use crate::registry::{PatternRegistry, RegisteredPattern};
use crate::types::ComponentType;

pub(crate) use content::SOCIAL_LINK_SELECTOR;

/// Built-in catalogue tuned by `config`.
pub fn registry_for(config: &RecognizerConfig) -> PatternRegistry {
    let mut registry = PatternRegistry::new();
    let groups = layout::patterns(config)
        .into_iter()
        .chain(content::patterns())
        .chain(widgets::patterns());
    for (component_type, patterns) in groups {
        registry
            .register(component_type, patterns)
            .expect("built-in patterns declare predicates");
    }
    registry
}

/// Built-in catalogue with default tunables.
pub fn default_registry() -> PatternRegistry {
    registry_for(&RecognizerConfig::default())
}

/// Listing row for one registered pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSummary {
    pub order: usize,
    pub component_type: ComponentType,
    pub confidence: u8,
    pub priority: i32,
    pub predicates: Vec<&'static str>,
    pub reason: String,
}

impl From<&RegisteredPattern> for PatternSummary {
    fn from(registered: &RegisteredPattern) -> Self {
        Self {
            order: registered.order,
            component_type: registered.component_type.clone(),
            confidence: registered.pattern.confidence,
            priority: registered.pattern.priority,
            predicates: registered.pattern.declared_predicates(),
            reason: registered.pattern.reason.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_type_has_patterns() {
        let registry = default_registry();
        for t in ComponentType::BUILTIN.iter() {
            assert!(
                !registry.all_patterns_for(t).is_empty(),
                "no built-in pattern for {t}"
            );
        }
    }

    #[test]
    fn test_builtin_selectors_and_regexes_compile() {
        let registry = default_registry();
        for registered in registry.all_patterns() {
            let p = &registered.pattern;
            if let Some(content) = &p.content_pattern {
                assert!(content.is_match("").is_ok(), "{}", p.reason);
            }
            if let Some(child) = &p.child_pattern {
                assert!(
                    crate::Selector::parse(child.as_str()).is_ok(),
                    "{}: {}",
                    p.reason,
                    child.as_str()
                );
            }
            if let Some(structure) = &p.structure_pattern {
                if let Some(sel) = &structure.child_selector {
                    assert!(crate::Selector::parse(sel.as_str()).is_ok(), "{}", p.reason);
                }
            }
            for (_, requirement) in &p.attributes {
                if let crate::pattern::AttributeMatch::Matches(re) = requirement {
                    assert!(re.is_match("").is_ok(), "{}", p.reason);
                }
            }
        }
    }

    #[test]
    fn test_summary_lists_predicates() {
        let registry = default_registry();
        let first = PatternSummary::from(&registry.all_patterns()[0]);
        assert_eq!(first.order, 0);
        assert_eq!(first.component_type, ComponentType::Section);
        assert_eq!(first.predicates, vec!["tagNames"]);
    }
}
