//! Ordered catalogue of recognition patterns, grouped by component type.

use std::collections::BTreeSet;

use crate::pattern::RecognitionPattern;
use crate::types::{ComponentType, PageliftError, PageliftResult};

/// A pattern together with the type it votes for and its global
/// registration index.
#[derive(Debug, Clone)]
pub struct RegisteredPattern {
    pub component_type: ComponentType,
    pub pattern: RecognitionPattern,
    /// Position in registration order across all types. Lower wins the last
    /// tie-break.
    pub order: usize,
}

/// Registry of recognition patterns.
///
/// Registration order is preserved across all types. The only validation is
/// rejecting patterns that declare no predicates, plus requiring custom
/// component types to be registered before patterns target them.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: Vec<RegisteredPattern>,
    custom_types: BTreeSet<String>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a site-specific component type. Names are kebab-case ASCII and
    /// may not shadow a built-in type.
    pub fn register_custom_type(&mut self, name: &str) -> PageliftResult<ComponentType> {
        let name = name.trim();
        let well_formed = !name.is_empty()
            && !name.starts_with('-')
            && !name.ends_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !well_formed || ComponentType::BUILTIN.iter().any(|t| t.as_str() == name) {
            return Err(PageliftError::InvalidCustomType(name.to_string()));
        }
        if !self.custom_types.insert(name.to_string()) {
            return Err(PageliftError::DuplicateCustomType(name.to_string()));
        }
        Ok(ComponentType::Custom(name.to_string()))
    }

    pub fn is_custom_type_registered(&self, name: &str) -> bool {
        self.custom_types.contains(name)
    }

    /// Registered custom type names, sorted.
    pub fn custom_types(&self) -> impl Iterator<Item = &str> {
        self.custom_types.iter().map(|s| s.as_str())
    }

    /// Append patterns for one component type.
    ///
    /// All-or-nothing: if any pattern is rejected, none are added.
    pub fn register(
        &mut self,
        component_type: ComponentType,
        patterns: Vec<RecognitionPattern>,
    ) -> PageliftResult<()> {
        if let ComponentType::Custom(name) = &component_type {
            if !self.custom_types.contains(name) {
                return Err(PageliftError::UnknownCustomType(name.clone()));
            }
        }
        if let Some(empty) = patterns.iter().find(|p| p.predicate_count() == 0) {
            return Err(PageliftError::EmptyPattern(empty.reason.clone()));
        }

        for pattern in patterns {
            let order = self.patterns.len();
            self.patterns.push(RegisteredPattern {
                component_type: component_type.clone(),
                pattern,
                order,
            });
        }
        Ok(())
    }

    /// Patterns for one type, in registration order.
    pub fn all_patterns_for(&self, component_type: &ComponentType) -> Vec<&RegisteredPattern> {
        self.patterns
            .iter()
            .filter(|p| &p.component_type == component_type)
            .collect()
    }

    /// Every pattern across all types, in registration order.
    pub fn all_patterns(&self) -> &[RegisteredPattern] {
        &self.patterns
    }

    /// Component types with at least one pattern, in order of first
    /// registration.
    pub fn component_types(&self) -> Vec<ComponentType> {
        let mut seen: Vec<ComponentType> = Vec::new();
        for p in &self.patterns {
            if !seen.contains(&p.component_type) {
                seen.push(p.component_type.clone());
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
