//! Recognition patterns: one heuristic rule for one component type.
//!
//! A pattern declares any subset of predicates. It matches a node iff every
//! declared predicate holds; absent predicates are vacuously true. A pattern
//! with no predicates at all is rejected by the registry.
//!
//! Text patterns and selectors are compiled when the pattern is built, but a
//! compile failure is not raised there: the broken predicate surfaces as a
//! [`PredicateFault`] when it is evaluated, and the engine treats the pattern
//! as non-matching for that node.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::accessor::{ElementView, PageAccessor, StyleSnapshot};
use crate::selector::{self, Selector};

/// Signature of a free-form CSS/geometry predicate.
pub type CssPredicateFn = dyn Fn(&StyleSnapshot, &ElementView) -> bool + Send + Sync;

/// A predicate that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateFault {
    /// Which predicate failed (`contentPattern`, `childPattern`, ...).
    pub predicate: &'static str,
    pub message: String,
}

impl fmt::Display for PredicateFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.predicate, self.message)
    }
}

// ── Predicate building blocks ────────────────────────────────────────────────

/// Regular expression over text, compiled up front, failing lazily.
#[derive(Clone)]
pub struct TextPattern {
    source: String,
    compiled: Result<Regex, String>,
}

impl TextPattern {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            compiled: Regex::new(source).map_err(|e| e.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> Result<bool, String> {
        match &self.compiled {
            Ok(re) => Ok(re.is_match(text)),
            Err(e) => Err(format!("invalid pattern '{}': {e}", self.source)),
        }
    }
}

impl fmt::Debug for TextPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextPattern({:?})", self.source)
    }
}

/// Selector compiled up front, failing lazily.
#[derive(Clone)]
pub struct SelectorPattern {
    source: String,
    compiled: Result<Selector, String>,
}

impl SelectorPattern {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            compiled: Selector::parse(source).map_err(|e| e.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn selector(&self, predicate: &'static str) -> Result<&Selector, PredicateFault> {
        self.compiled.as_ref().map_err(|e| PredicateFault {
            predicate,
            message: e.clone(),
        })
    }
}

impl fmt::Debug for SelectorPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SelectorPattern({:?})", self.source)
    }
}

/// Requirement on one attribute.
#[derive(Debug, Clone)]
pub enum AttributeMatch {
    /// The attribute must be present, any value.
    Present,
    /// The attribute must be present and its value must match.
    Matches(TextPattern),
}

/// Structural constraint on direct children.
#[derive(Debug, Clone)]
pub struct StructurePattern {
    pub min_children: usize,
    /// When set, only children matching this selector are counted.
    pub child_selector: Option<SelectorPattern>,
}

/// Style requirement: a table of allowed values, or an arbitrary predicate.
#[derive(Clone)]
pub enum CssRule {
    /// Every listed property must resolve to one of its allowed values
    /// (ASCII case-insensitive).
    Values(BTreeMap<String, Vec<String>>),
    /// Escape hatch for geometric and positional heuristics.
    Predicate(Arc<CssPredicateFn>),
}

impl fmt::Debug for CssRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssRule::Values(values) => f.debug_tuple("Values").field(values).finish(),
            CssRule::Predicate(_) => f.write_str("Predicate(<fn>)"),
        }
    }
}

// ── Pattern ──────────────────────────────────────────────────────────────────

/// One candidate rule for one component type.
///
/// Built with a chain of predicate setters:
///
/// ```
/// use pagelift::RecognitionPattern;
///
/// let pattern = RecognitionPattern::new("slick slider with images")
///     .classes(&["slick-slider"])
///     .child(".slick-slide img")
///     .confidence(95)
///     .priority(10);
/// assert_eq!(pattern.predicate_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RecognitionPattern {
    pub tag_names: Vec<String>,
    pub class_keywords: Vec<String>,
    pub attributes: Vec<(String, AttributeMatch)>,
    pub aria_role: Option<String>,
    pub content_pattern: Option<TextPattern>,
    pub child_pattern: Option<SelectorPattern>,
    pub structure_pattern: Option<StructurePattern>,
    pub css: Option<CssRule>,
    /// Belief strength, 0-100.
    pub confidence: u8,
    /// Tie-break between different component types at equal confidence.
    pub priority: i32,
    /// Audit string; never used for logic.
    pub reason: String,
}

impl RecognitionPattern {
    pub fn new(reason: &str) -> Self {
        Self {
            tag_names: Vec::new(),
            class_keywords: Vec::new(),
            attributes: Vec::new(),
            aria_role: None,
            content_pattern: None,
            child_pattern: None,
            structure_pattern: None,
            css: None,
            confidence: 50,
            priority: 0,
            reason: reason.to_string(),
        }
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tag_names
            .extend(tags.iter().map(|t| t.to_ascii_lowercase()));
        self
    }

    pub fn classes(mut self, keywords: &[&str]) -> Self {
        self.class_keywords
            .extend(keywords.iter().map(|k| k.to_string()));
        self
    }

    pub fn attr_present(mut self, name: &str) -> Self {
        self.attributes
            .push((name.to_ascii_lowercase(), AttributeMatch::Present));
        self
    }

    pub fn attr_matches(mut self, name: &str, pattern: &str) -> Self {
        self.attributes.push((
            name.to_ascii_lowercase(),
            AttributeMatch::Matches(TextPattern::new(pattern)),
        ));
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.aria_role = Some(role.to_string());
        self
    }

    pub fn content(mut self, pattern: &str) -> Self {
        self.content_pattern = Some(TextPattern::new(pattern));
        self
    }

    pub fn child(mut self, selector: &str) -> Self {
        self.child_pattern = Some(SelectorPattern::new(selector));
        self
    }

    pub fn min_children(mut self, min: usize, selector: Option<&str>) -> Self {
        self.structure_pattern = Some(StructurePattern {
            min_children: min,
            child_selector: selector.map(SelectorPattern::new),
        });
        self
    }

    pub fn css_values(mut self, values: &[(&str, &[&str])]) -> Self {
        let table = values
            .iter()
            .map(|(prop, allowed)| {
                (
                    prop.to_ascii_lowercase(),
                    allowed.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();
        self.css = Some(CssRule::Values(table));
        self
    }

    pub fn css_fn<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&StyleSnapshot, &ElementView) -> bool + Send + Sync + 'static,
    {
        self.css = Some(CssRule::Predicate(Arc::new(predicate)));
        self
    }

    /// Clamped to 100.
    pub fn confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Number of predicates this pattern declares.
    pub fn predicate_count(&self) -> usize {
        self.declared_predicates().len()
    }

    /// Names of the declared predicates.
    ///
    /// A predicate that holds for every node (empty keyword, empty text
    /// pattern, `minChildren` of zero, empty style table) is not counted.
    pub fn declared_predicates(&self) -> Vec<&'static str> {
        let structure = self
            .structure_pattern
            .as_ref()
            .is_some_and(|s| s.min_children > 0);
        let css = match &self.css {
            Some(CssRule::Values(table)) => !table.is_empty(),
            Some(CssRule::Predicate(_)) => true,
            None => false,
        };
        [
            ("tagNames", self.tag_names.iter().any(|t| !t.is_empty())),
            ("classKeywords", self.class_keywords.iter().any(|k| !k.is_empty())),
            ("attributes", !self.attributes.is_empty()),
            ("ariaRole", self.aria_role.is_some()),
            (
                "contentPattern",
                self.content_pattern.as_ref().is_some_and(|p| !p.as_str().is_empty()),
            ),
            ("childPattern", self.child_pattern.is_some()),
            ("structurePattern", structure),
            ("cssProperties", css),
        ]
        .into_iter()
        .filter_map(|(name, declared)| declared.then_some(name))
        .collect()
    }

    /// Evaluate every declared predicate against one node.
    ///
    /// Cheap attribute checks run before text, descendant and style checks,
    /// and evaluation stops at the first predicate that fails.
    pub fn evaluate(
        &self,
        view: &ElementView,
        page: &dyn PageAccessor,
    ) -> Result<bool, PredicateFault> {
        if !self.tag_names.is_empty() && !self.tag_names.iter().any(|t| t == &view.tag) {
            return Ok(false);
        }

        if let Some(role) = &self.aria_role {
            if view.attr("role") != Some(role.as_str()) {
                return Ok(false);
            }
        }

        if !self.class_keywords.is_empty() {
            let class_attr = view.class_attr();
            let hit = self
                .class_keywords
                .iter()
                .filter(|k| !k.is_empty())
                .any(|k| class_attr.contains(k.as_str()));
            if !hit {
                return Ok(false);
            }
        }

        for (name, requirement) in &self.attributes {
            let Some(value) = view.attr(name) else {
                return Ok(false);
            };
            if let AttributeMatch::Matches(pattern) = requirement {
                let ok = pattern.is_match(value).map_err(|message| PredicateFault {
                    predicate: "attributes",
                    message,
                })?;
                if !ok {
                    return Ok(false);
                }
            }
        }

        if let Some(CssRule::Values(table)) = &self.css {
            let all_allowed = table.iter().all(|(prop, allowed)| {
                view.style
                    .get(prop)
                    .map(|v| allowed.iter().any(|a| a.eq_ignore_ascii_case(v)))
                    .unwrap_or(false)
            });
            if !all_allowed {
                return Ok(false);
            }
        }

        if let Some(pattern) = &self.content_pattern {
            let ok = pattern.is_match(&view.text).map_err(|message| PredicateFault {
                predicate: "contentPattern",
                message,
            })?;
            if !ok {
                return Ok(false);
            }
        }

        if let Some(structure) = &self.structure_pattern {
            let selector = structure
                .child_selector
                .as_ref()
                .map(|s| s.selector("structurePattern"))
                .transpose()?;
            let count = selector::count_children(page, view.node, selector).map_err(|e| {
                PredicateFault {
                    predicate: "structurePattern",
                    message: e.to_string(),
                }
            })?;
            if count < structure.min_children {
                return Ok(false);
            }
        }

        if let Some(child) = &self.child_pattern {
            let selector = child.selector("childPattern")?;
            let found = selector::has_match(page, view.node, selector).map_err(|e| {
                PredicateFault {
                    predicate: "childPattern",
                    message: e.to_string(),
                }
            })?;
            if !found {
                return Ok(false);
            }
        }

        if let Some(CssRule::Predicate(predicate)) = &self.css {
            let outcome = catch_unwind(AssertUnwindSafe(|| (**predicate)(&view.style, view)));
            match outcome {
                Ok(true) => {}
                Ok(false) => return Ok(false),
                Err(_) => {
                    return Err(PredicateFault {
                        predicate: "cssProperties",
                        message: "style predicate panicked".into(),
                    })
                }
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    fn fixture() -> (crate::PageSnapshot, crate::NodeId) {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        let div = b.child(body, "div");
        b.class(div, "site-footer dark")
            .attr(div, "role", "contentinfo")
            .attr(div, "data-theme", "night")
            .style(div, "position", "sticky")
            .text(div, "© 2024 Acme Inc.");
        let ul = b.child(div, "ul");
        for _ in 0..3 {
            b.child(ul, "li");
        }
        (b.build(), div)
    }

    fn eval(pattern: &RecognitionPattern) -> Result<bool, PredicateFault> {
        let (snap, div) = fixture();
        let view = ElementView::read(&snap, div).unwrap();
        pattern.evaluate(&view, &snap)
    }

    #[test]
    fn test_all_declared_predicates_must_hold() {
        let p = RecognitionPattern::new("footer")
            .tags(&["div"])
            .classes(&["footer"])
            .role("contentinfo")
            .attr_matches("data-theme", "^ni")
            .content(r"©\s*\d{4}")
            .child("ul li")
            .css_values(&[("position", &["static", "sticky"])]);
        assert_eq!(p.predicate_count(), 7);
        assert!(!p.declared_predicates().contains(&"structurePattern"));
        assert_eq!(eval(&p), Ok(true));

        let mut p2 = p.clone();
        p2.tag_names = vec!["footer".into()];
        assert_eq!(eval(&p2), Ok(false));
    }

    #[test]
    fn test_class_keywords_are_substring_any_and_case_sensitive() {
        assert_eq!(eval(&RecognitionPattern::new("x").classes(&["nope", "foot"])), Ok(true));
        assert_eq!(eval(&RecognitionPattern::new("x").classes(&["FOOTER"])), Ok(false));
    }

    #[test]
    fn test_structure_pattern_counts_direct_children() {
        let (snap, div) = fixture();
        let ul = snap.children(div).unwrap()[0];
        let view = ElementView::read(&snap, ul).unwrap();
        let p = RecognitionPattern::new("list").min_children(3, Some("li"));
        assert_eq!(p.evaluate(&view, &snap), Ok(true));
        let p = RecognitionPattern::new("list").min_children(4, None);
        assert_eq!(p.evaluate(&view, &snap), Ok(false));
    }

    #[test]
    fn test_malformed_content_pattern_is_a_fault() {
        let p = RecognitionPattern::new("broken").content("(unclosed");
        let fault = eval(&p).unwrap_err();
        assert_eq!(fault.predicate, "contentPattern");
    }

    #[test]
    fn test_malformed_child_selector_is_a_fault() {
        let p = RecognitionPattern::new("broken").child("div >");
        assert_eq!(eval(&p).unwrap_err().predicate, "childPattern");
    }

    #[test]
    fn test_failed_cheap_predicate_short_circuits_fault() {
        let p = RecognitionPattern::new("broken")
            .tags(&["section"])
            .content("(unclosed");
        assert_eq!(eval(&p), Ok(false));
    }

    #[test]
    fn test_css_fn_receives_view() {
        let p = RecognitionPattern::new("sticky").css_fn(|style, view| {
            style.is("position", "sticky") && view.tag == "div"
        });
        assert_eq!(eval(&p), Ok(true));
    }

    #[test]
    fn test_panicking_css_fn_is_a_fault() {
        let p = RecognitionPattern::new("panics").css_fn(|_, _| panic!("boom"));
        assert_eq!(eval(&p).unwrap_err().predicate, "cssProperties");
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(RecognitionPattern::new("x").confidence(250).confidence, 100);
        assert_eq!(RecognitionPattern::new("x").predicate_count(), 0);
    }

    #[test]
    fn test_vacuous_predicates_are_not_counted() {
        for p in [
            RecognitionPattern::new("kw").classes(&[""]),
            RecognitionPattern::new("tag").tags(&[""]),
            RecognitionPattern::new("text").content(""),
            RecognitionPattern::new("kids").min_children(0, None),
            RecognitionPattern::new("kids li").min_children(0, Some("li")),
            RecognitionPattern::new("css").css_values(&[]),
            RecognitionPattern::new("css").css_values(&[]).classes(&["", ""]),
        ] {
            assert_eq!(p.predicate_count(), 0, "{}", p.reason);
        }
        let p = RecognitionPattern::new("mixed").classes(&["", "footer"]);
        assert_eq!(p.declared_predicates(), vec!["classKeywords"]);
        assert_eq!(eval(&p), Ok(true));
        let p = RecognitionPattern::new("mixed miss").classes(&["", "header"]);
        assert_eq!(eval(&p), Ok(false));
    }
}
