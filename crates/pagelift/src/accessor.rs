//! Style/structure accessor abstraction.
//!
//! Recognition never talks to a browser directly. Everything it knows about a
//! node (tag, attributes, computed style, geometry, text, children) comes
//! through the [`PageAccessor`] capability the caller injects. A live
//! headless-browser session and a frozen [`crate::PageSnapshot`] fixture are
//! interchangeable behind this trait.
//!
//! Accessor reads may go stale between calls when the backing DOM is live, so
//! the core re-reads per node instead of caching across a pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{BoundingBox, NodeId, Viewport};

/// Failure to supply data for a node.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("node {0} is detached from the document")]
    Detached(NodeId),

    #[error("node {0} is unknown to this accessor")]
    UnknownNode(NodeId),

    #[error("accessor unavailable: {0}")]
    Unavailable(String),
}

/// Result type for accessor reads.
pub type AccessResult<T> = Result<T, AccessError>;

/// Capability that supplies DOM and CSSOM state for nodes of one page.
pub trait PageAccessor {
    /// Lower-case tag name.
    fn tag_name(&self, node: NodeId) -> AccessResult<String>;

    /// All attributes, ordered by name.
    fn attributes(&self, node: NodeId) -> AccessResult<BTreeMap<String, String>>;

    /// Resolved (computed) style properties.
    fn computed_style(&self, node: NodeId) -> AccessResult<StyleSnapshot>;

    /// Border-box geometry in document coordinates.
    fn bounding_box(&self, node: NodeId) -> AccessResult<BoundingBox>;

    /// Rendered text content of the node and its descendants.
    fn text_content(&self, node: NodeId) -> AccessResult<String>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> AccessResult<Vec<NodeId>>;

    /// Viewport the page was laid out in.
    fn viewport(&self) -> Viewport;

    /// Full scrollable document height in CSS px.
    fn document_height(&self) -> f64;

    /// Single attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> AccessResult<Option<String>> {
        Ok(self.attributes(node)?.remove(name))
    }

    /// Whitespace-separated class list.
    fn class_list(&self, node: NodeId) -> AccessResult<Vec<String>> {
        Ok(self
            .attribute(node, "class")?
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default())
    }
}

// ── Computed style ───────────────────────────────────────────────────────────

/// Snapshot of resolved CSS properties for one element.
///
/// Property names are stored lower-case; values are kept as the accessor
/// reported them, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSnapshot(BTreeMap<String, String>);

impl StyleSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an inline `style="a: b; c: d"` declaration block.
    pub fn parse_declarations(block: &str) -> Self {
        let mut style = Self::new();
        for decl in block.split(';') {
            if let Some((prop, value)) = decl.split_once(':') {
                let prop = prop.trim();
                let value = value.trim().trim_end_matches("!important").trim();
                if !prop.is_empty() && !value.is_empty() {
                    style.set(prop, value);
                }
            }
        }
        style
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.0
            .insert(property.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .get(&property.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// True when `property` is present and equals `value` (ASCII case-insensitive).
    pub fn is(&self, property: &str, value: &str) -> bool {
        self.get(property)
            .map(|v| v.eq_ignore_ascii_case(value))
            .unwrap_or(false)
    }

    /// Leading pixel length of a property, e.g. `"24px"` → `24.0`. Unitless
    /// numbers are accepted; other units are not converted.
    pub fn px(&self, property: &str) -> Option<f64> {
        parse_px(self.get(property)?)
    }

    /// Insert `value` only when the property is not already present.
    pub fn set_default(&mut self, property: &str, value: &str) {
        self.0
            .entry(property.to_ascii_lowercase())
            .or_insert_with(|| value.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse a CSS pixel length (`"12px"`, `"12"`, `"12.5px"`). `normal` and
/// non-px units yield `None`.
pub fn parse_px(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let number = raw.strip_suffix("px").unwrap_or(raw).trim();
    number.parse::<f64>().ok()
}

// ── Element view ─────────────────────────────────────────────────────────────

/// Everything predicates may inspect about one node, read in one go.
///
/// Built fresh for every node the engine visits and dropped afterwards.
#[derive(Debug, Clone)]
pub struct ElementView {
    pub node: NodeId,
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub style: StyleSnapshot,
    pub rect: BoundingBox,
    pub text: String,
    pub children: Vec<NodeId>,
    pub viewport: Viewport,
    pub document_height: f64,
}

impl ElementView {
    /// Read a node through the accessor. Fails if any part of the read fails.
    pub fn read(page: &dyn PageAccessor, node: NodeId) -> AccessResult<Self> {
        let tag = page.tag_name(node)?;
        let attributes = page.attributes(node)?;
        let classes = attributes
            .get("class")
            .map(|c| c.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        Ok(Self {
            node,
            tag,
            classes,
            style: page.computed_style(node)?,
            rect: page.bounding_box(node)?,
            text: page.text_content(node)?,
            children: page.children(node)?,
            attributes,
            viewport: page.viewport(),
            document_height: page.document_height(),
        })
    }

    /// Raw `class` attribute (empty when absent).
    pub fn class_attr(&self) -> &str {
        self.attributes.get("class").map(|s| s.as_str()).unwrap_or("")
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Text with runs of whitespace collapsed to one space.
    pub fn normalized_text(&self) -> String {
        normalize_whitespace(&self.text)
    }
}

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
