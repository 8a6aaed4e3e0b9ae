//! Core data types shared by recognition, analysis and export.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::accessor::AccessError;
use crate::analyzers::AnalyzerOutput;

// ── Node handles and geometry ────────────────────────────────────────────────

/// Opaque handle to a DOM node owned by a [`crate::PageAccessor`].
///
/// The core never dereferences a handle itself; every read goes back through
/// the accessor that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Border-box geometry of an element in document coordinates (CSS px).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// True when the box has no measurable area (no layout information).
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Size of the layout viewport the page was captured at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1440.0,
            height: 900.0,
        }
    }
}

// ── Component types ──────────────────────────────────────────────────────────

/// Semantic UI category assigned to a DOM node.
///
/// The built-in variants form a closed set so exporters can match on them
/// exhaustively. Site-specific categories go through [`ComponentType::Custom`]
/// and must be registered with the [`crate::PatternRegistry`] before use.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentType {
    Section,
    Container,
    Row,
    Column,
    Hero,
    Header,
    Footer,
    Sidebar,
    Heading,
    Paragraph,
    Text,
    Blockquote,
    List,
    Image,
    Video,
    Button,
    Divider,
    IconList,
    SocialIcons,
    Alert,
    Tabs,
    Toggle,
    Accordion,
    ImageCarousel,
    PostsGrid,
    PriceList,
    StarRating,
    VideoPlaylist,
    Testimonial,
    Counter,
    ProgressBar,
    NavMenu,
    Form,
    Custom(String),
}

impl ComponentType {
    /// Every built-in component type, in catalogue order.
    pub const BUILTIN: [ComponentType; 33] = [
        ComponentType::Section,
        ComponentType::Container,
        ComponentType::Row,
        ComponentType::Column,
        ComponentType::Hero,
        ComponentType::Header,
        ComponentType::Footer,
        ComponentType::Sidebar,
        ComponentType::Heading,
        ComponentType::Paragraph,
        ComponentType::Text,
        ComponentType::Blockquote,
        ComponentType::List,
        ComponentType::Image,
        ComponentType::Video,
        ComponentType::Button,
        ComponentType::Divider,
        ComponentType::IconList,
        ComponentType::SocialIcons,
        ComponentType::Alert,
        ComponentType::Tabs,
        ComponentType::Toggle,
        ComponentType::Accordion,
        ComponentType::ImageCarousel,
        ComponentType::PostsGrid,
        ComponentType::PriceList,
        ComponentType::StarRating,
        ComponentType::VideoPlaylist,
        ComponentType::Testimonial,
        ComponentType::Counter,
        ComponentType::ProgressBar,
        ComponentType::NavMenu,
        ComponentType::Form,
    ];

    /// Kebab-case identifier, e.g. `image-carousel`.
    pub fn as_str(&self) -> &str {
        match self {
            ComponentType::Section => "section",
            ComponentType::Container => "container",
            ComponentType::Row => "row",
            ComponentType::Column => "column",
            ComponentType::Hero => "hero",
            ComponentType::Header => "header",
            ComponentType::Footer => "footer",
            ComponentType::Sidebar => "sidebar",
            ComponentType::Heading => "heading",
            ComponentType::Paragraph => "paragraph",
            ComponentType::Text => "text",
            ComponentType::Blockquote => "blockquote",
            ComponentType::List => "list",
            ComponentType::Image => "image",
            ComponentType::Video => "video",
            ComponentType::Button => "button",
            ComponentType::Divider => "divider",
            ComponentType::IconList => "icon-list",
            ComponentType::SocialIcons => "social-icons",
            ComponentType::Alert => "alert",
            ComponentType::Tabs => "tabs",
            ComponentType::Toggle => "toggle",
            ComponentType::Accordion => "accordion",
            ComponentType::ImageCarousel => "image-carousel",
            ComponentType::PostsGrid => "posts-grid",
            ComponentType::PriceList => "price-list",
            ComponentType::StarRating => "star-rating",
            ComponentType::VideoPlaylist => "video-playlist",
            ComponentType::Testimonial => "testimonial",
            ComponentType::Counter => "counter",
            ComponentType::ProgressBar => "progress-bar",
            ComponentType::NavMenu => "nav-menu",
            ComponentType::Form => "form",
            ComponentType::Custom(name) => name.as_str(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ComponentType::Custom(_))
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = std::convert::Infallible;

    /// Parses a kebab-case identifier. Names outside the built-in set become
    /// [`ComponentType::Custom`]; whether that custom type is usable is up to
    /// the registry.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Ok(Self::BUILTIN
            .iter()
            .find(|t| t.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ComponentType::Custom(name.to_string())))
    }
}

impl Serialize for ComponentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse::<ComponentType>().unwrap_or(ComponentType::Custom(raw)))
    }
}

// ── Recognition output ───────────────────────────────────────────────────────

/// One node of the recognized component tree.
///
/// Produced once per recognition pass. Only `analyzer_output` changes after
/// construction, and only once, when [`crate::analyzers::enrich`] runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedComponent {
    pub component_type: ComponentType,
    /// Confidence of the winning pattern, `0` for synthesized containers.
    pub confidence: u8,
    /// Source node, read-only back-reference into the accessor.
    pub element: NodeId,
    /// Audit string of the winning pattern; `None` when synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub children: Vec<RecognizedComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer_output: Option<AnalyzerOutput>,
}

impl RecognizedComponent {
    pub fn new(component_type: ComponentType, confidence: u8, element: NodeId) -> Self {
        Self {
            component_type,
            confidence,
            element,
            reason: None,
            children: Vec::new(),
            analyzer_output: None,
        }
    }

    /// Total number of components in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(|c| c.count()).sum::<usize>()
    }

    /// Pre-order iterator-style visit of the subtree.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a RecognizedComponent)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// First component of the given type in pre-order, if any.
    pub fn find(&self, component_type: &ComponentType) -> Option<&RecognizedComponent> {
        if &self.component_type == component_type {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(component_type))
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors surfaced by the pagelift library.
///
/// Data-quality problems met during recognition (a predicate that cannot be
/// evaluated, a detached node below the root, truncation) are not errors;
/// they are reported as [`crate::Diagnostic`]s on the recognition outcome.
#[derive(thiserror::Error, Debug)]
pub enum PageliftError {
    #[error("Pattern '{0}' declares no predicates and would match every node")]
    EmptyPattern(String),

    #[error("Custom component type not registered: {0}")]
    UnknownCustomType(String),

    #[error("Custom component type already registered: {0}")]
    DuplicateCustomType(String),

    #[error("Invalid custom component type name: '{0}'")]
    InvalidCustomType(String),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Root node unavailable: {0}")]
    RootUnavailable(#[from] AccessError),

    #[error("Mapper for '{mapper}' cannot export a '{component}' component")]
    UnsupportedComponent {
        mapper: ComponentType,
        component: ComponentType,
    },

    #[error("No widget mapper registered for component type '{0}'")]
    NoMapper(ComponentType),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type PageliftResult<T> = Result<T, PageliftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_type_round_trips_through_str() {
        for t in ComponentType::BUILTIN.iter() {
            let parsed: ComponentType = t.as_str().parse().unwrap();
            assert_eq!(&parsed, t);
        }
    }

    #[test]
    fn test_unknown_name_becomes_custom() {
        let parsed: ComponentType = "cookie-banner".parse().unwrap();
        assert_eq!(parsed, ComponentType::Custom("cookie-banner".into()));
        assert!(parsed.is_custom());
    }

    #[test]
    fn test_component_type_serializes_as_kebab_string() {
        let json = serde_json::to_string(&ComponentType::ImageCarousel).unwrap();
        assert_eq!(json, "\"image-carousel\"");
        let back: ComponentType = serde_json::from_str("\"posts-grid\"").unwrap();
        assert_eq!(back, ComponentType::PostsGrid);
    }

    #[test]
    fn test_bounding_box_edges() {
        let b = BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(b.right(), 110.0);
        assert_eq!(b.bottom(), 70.0);
        assert_eq!(b.center_x(), 60.0);
        assert!(!b.is_empty());
        assert!(BoundingBox::default().is_empty());
    }

    #[test]
    fn test_tree_helpers() {
        let mut root = RecognizedComponent::new(ComponentType::Section, 80, NodeId(0));
        let mut col = RecognizedComponent::new(ComponentType::Column, 70, NodeId(1));
        col.children
            .push(RecognizedComponent::new(ComponentType::Paragraph, 90, NodeId(2)));
        root.children.push(col);
        assert_eq!(root.count(), 3);
        assert_eq!(
            root.find(&ComponentType::Paragraph).map(|c| c.element),
            Some(NodeId(2))
        );
        assert!(root.find(&ComponentType::Footer).is_none());
    }
}
