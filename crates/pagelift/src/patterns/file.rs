//! Declarative pattern catalogues loaded from JSON.
//!
//! ```json
//! [
//!   {
//!     "componentType": "cookie-banner",
//!     "classKeywords": ["cookie"],
//!     "attributes": { "aria-live": null, "data-consent": "^(yes|no)$" },
//!     "confidence": 90,
//!     "priority": 9,
//!     "reason": "consent banner"
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::pattern::RecognitionPattern;
use crate::registry::PatternRegistry;
use crate::types::{ComponentType, PageliftError, PageliftResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureSpec {
    pub min_children: usize,
    #[serde(default)]
    pub child_selector: Option<String>,
}

/// One pattern as written in a catalogue file. Every predicate except the
/// function form of `cssProperties` is expressible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    pub component_type: String,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub class_keywords: Vec<String>,
    /// Attribute name to `null` (must be present) or a regex on its value.
    #[serde(default)]
    pub attributes: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub aria_role: Option<String>,
    #[serde(default)]
    pub content_pattern: Option<String>,
    #[serde(default)]
    pub child_pattern: Option<String>,
    #[serde(default)]
    pub structure_pattern: Option<StructureSpec>,
    #[serde(default)]
    pub css_properties: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_confidence")]
    pub confidence: u8,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_confidence() -> u8 {
    50
}

impl PatternSpec {
    pub fn to_pattern(&self) -> RecognitionPattern {
        let reason = self
            .reason
            .clone()
            .unwrap_or_else(|| format!("{} (catalogue file)", self.component_type));
        let tags: Vec<&str> = self.tag_names.iter().map(String::as_str).collect();
        let classes: Vec<&str> = self.class_keywords.iter().map(String::as_str).collect();

        let mut pattern = RecognitionPattern::new(&reason)
            .tags(&tags)
            .classes(&classes)
            .confidence(self.confidence)
            .priority(self.priority);

        for (name, value) in &self.attributes {
            pattern = match value {
                Some(re) => pattern.attr_matches(name, re),
                None => pattern.attr_present(name),
            };
        }
        if let Some(role) = &self.aria_role {
            pattern = pattern.role(role);
        }
        if let Some(content) = &self.content_pattern {
            pattern = pattern.content(content);
        }
        if let Some(child) = &self.child_pattern {
            pattern = pattern.child(child);
        }
        if let Some(structure) = &self.structure_pattern {
            pattern = pattern.min_children(structure.min_children, structure.child_selector.as_deref());
        }
        if !self.css_properties.is_empty() {
            let table: Vec<(&str, Vec<&str>)> = self
                .css_properties
                .iter()
                .map(|(prop, values)| (prop.as_str(), values.iter().map(String::as_str).collect()))
                .collect();
            let borrowed: Vec<(&str, &[&str])> =
                table.iter().map(|(prop, values)| (*prop, values.as_slice())).collect();
            pattern = pattern.css_values(&borrowed);
        }
        pattern
    }
}

/// Load a JSON catalogue string into `registry`.
///
/// Unknown `componentType` names are registered as custom types first. The
/// whole catalogue is applied or none of it is. Returns the number of
/// patterns added.
pub fn load_pattern_str(json: &str, registry: &mut PatternRegistry) -> PageliftResult<usize> {
    let specs: Vec<PatternSpec> = serde_json::from_str(json)?;
    let mut staged = registry.clone();

    for spec in &specs {
        let component_type: ComponentType = spec
            .component_type
            .parse()
            .unwrap_or_else(|never| match never {});
        if let ComponentType::Custom(name) = &component_type {
            if !staged.is_custom_type_registered(name) {
                staged.register_custom_type(name)?;
                debug!(name = %name, "registered custom component type");
            }
        }
        staged.register(component_type, vec![spec.to_pattern()])?;
    }

    *registry = staged;
    Ok(specs.len())
}

/// Load a JSON catalogue file into `registry`.
pub fn load_pattern_file(path: &Path, registry: &mut PatternRegistry) -> PageliftResult<usize> {
    let json = std::fs::read_to_string(path)?;
    let added = load_pattern_str(&json, registry).map_err(|e| match e {
        PageliftError::Json(inner) => {
            PageliftError::InvalidPattern(format!("{}: {inner}", path.display()))
        }
        other => other,
    })?;
    info!(path = %path.display(), patterns = added, "loaded pattern catalogue");
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOGUE: &str = r#"[
        {
            "componentType": "cookie-banner",
            "classKeywords": ["cookie"],
            "attributes": { "aria-live": null },
            "confidence": 90,
            "priority": 9,
            "reason": "consent banner"
        },
        {
            "componentType": "alert",
            "tagNames": ["DIV"],
            "cssProperties": { "position": ["fixed"] },
            "structurePattern": { "minChildren": 1, "childSelector": "button" }
        }
    ]"#;

    #[test]
    fn test_spec_conversion() {
        let specs: Vec<PatternSpec> = serde_json::from_str(CATALOGUE).unwrap();
        let banner = specs[0].to_pattern();
        assert_eq!(banner.declared_predicates(), vec!["classKeywords", "attributes"]);
        assert_eq!(banner.confidence, 90);

        let alert = specs[1].to_pattern();
        assert_eq!(alert.tag_names, vec!["div".to_string()]);
        assert_eq!(alert.confidence, 50);
        assert_eq!(alert.reason, "alert (catalogue file)");
        assert_eq!(alert.predicate_count(), 3);
    }

    #[test]
    fn test_load_registers_custom_types() {
        let mut registry = PatternRegistry::new();
        let added = load_pattern_str(CATALOGUE, &mut registry).unwrap();
        assert_eq!(added, 2);
        assert!(registry.is_custom_type_registered("cookie-banner"));
        assert_eq!(registry.all_patterns_for(&ComponentType::Alert).len(), 1);
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let mut registry = PatternRegistry::new();
        let json = r#"[
            { "componentType": "banner-x", "classKeywords": ["x"] },
            { "componentType": "alert" }
        ]"#;
        let err = load_pattern_str(json, &mut registry).unwrap_err();
        assert!(matches!(err, PageliftError::EmptyPattern(_)));
        assert!(registry.is_empty());
        assert!(!registry.is_custom_type_registered("banner-x"));
    }

    #[test]
    fn test_catch_all_catalogue_entries_are_rejected() {
        for json in [
            r#"[{ "componentType": "alert", "classKeywords": [""] }]"#,
            r#"[{ "componentType": "alert", "structurePattern": { "minChildren": 0 } }]"#,
            r#"[{ "componentType": "alert", "contentPattern": "" }]"#,
            r#"[{ "componentType": "alert", "tagNames": [], "cssProperties": {} }]"#,
        ] {
            let mut registry = PatternRegistry::new();
            let err = load_pattern_str(json, &mut registry).unwrap_err();
            assert!(matches!(err, PageliftError::EmptyPattern(_)), "{json}");
            assert!(registry.is_empty());
        }
    }

    #[test]
    fn test_load_pattern_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOGUE.as_bytes()).unwrap();
        let mut registry = PatternRegistry::new();
        assert_eq!(load_pattern_file(file.path(), &mut registry).unwrap(), 2);
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let mut registry = PatternRegistry::new();
        let err = load_pattern_file(file.path(), &mut registry).unwrap_err();
        let path = file.path().display().to_string();
        assert!(matches!(err, PageliftError::InvalidPattern(msg) if msg.starts_with(&path)));
    }
}
