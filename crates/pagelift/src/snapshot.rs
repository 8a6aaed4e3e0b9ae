//! Frozen page state implementing [`PageAccessor`].
//!
//! A `PageSnapshot` is an immutable arena of element nodes. It can be loaded
//! from a JSON capture produced by a headless-browser script (with computed
//! style and geometry), parsed from raw HTML via `scraper` (inline style only,
//! no geometry), or assembled in code with [`SnapshotBuilder`] for fixtures.
//!
//! # Capture format
//!
//! ```json
//! {
//!   "viewport": { "width": 1440, "height": 900 },
//!   "documentHeight": 3200,
//!   "root": {
//!     "tag": "body",
//!     "attributes": { "class": "home" },
//!     "style": { "display": "block" },
//!     "rect": { "x": 0, "y": 0, "width": 1440, "height": 3200 },
//!     "children": [ { "tag": "footer", "text": "© 2024 Acme", "children": [] } ]
//!   }
//! }
//! ```
//!
//! `text` is the node's full `textContent`; when omitted it is assembled from
//! the children. A node flagged `"detached": true` fails every read, which is
//! how a capture records an element that vanished mid-read.

use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accessor::{AccessError, AccessResult, PageAccessor, StyleSnapshot};
use crate::types::{BoundingBox, NodeId, PageliftError, PageliftResult, Viewport};

/// Deepest element nesting kept when parsing HTML.
const MAX_HTML_DEPTH: usize = 512;

/// Elements that never render and are left out of snapshots.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "meta", "link"];

// ── Capture (serde) types ────────────────────────────────────────────────────

/// Top-level JSON capture document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedPage {
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub document_height: Option<f64>,
    pub root: CapturedNode,
}

/// One element of a JSON capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedNode {
    pub tag: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub style: StyleSnapshot,
    #[serde(default)]
    pub rect: BoundingBox,
    #[serde(default)]
    pub detached: bool,
    #[serde(default)]
    pub children: Vec<CapturedNode>,
}

// ── Arena ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SnapshotNode {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    style: StyleSnapshot,
    rect: BoundingBox,
    detached: bool,
    children: Vec<NodeId>,
}

/// Immutable DOM/CSSOM snapshot of one page.
#[derive(Debug, Clone)]
pub struct PageSnapshot {
    nodes: Vec<SnapshotNode>,
    root: NodeId,
    viewport: Viewport,
    document_height: f64,
}

impl PageSnapshot {
    /// Root element handle (usually `<body>`).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of element nodes in the snapshot.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every node handle in document (pre-)order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Parse a JSON capture document.
    pub fn from_json(json: &str) -> PageliftResult<Self> {
        let capture: CapturedPage = serde_json::from_str(json)?;
        Ok(Self::from_capture(capture))
    }

    /// Flatten a capture into the arena.
    pub fn from_capture(capture: CapturedPage) -> Self {
        let mut nodes = Vec::new();
        let root = push_captured(&mut nodes, capture.root);
        let document_height = capture.document_height.unwrap_or_else(|| {
            nodes
                .iter()
                .map(|n| n.rect.bottom())
                .fold(capture.viewport.height, f64::max)
        });
        Self {
            nodes,
            root,
            viewport: capture.viewport,
            document_height,
        }
    }

    /// Parse raw HTML. The snapshot is rooted at `<body>` when one exists.
    ///
    /// Computed style is approximated by the inline `style` attribute plus the
    /// tag's default `display`; geometry is unknown and left empty.
    pub fn from_html(html: &str) -> PageliftResult<Self> {
        let document = Html::parse_document(html);
        let body_selector = scraper::Selector::parse("body").map_err(|e| {
            PageliftError::Snapshot(format!("body selector failed to parse: {e:?}"))
        })?;
        let root_el = document
            .select(&body_selector)
            .next()
            .unwrap_or_else(|| document.root_element());

        let mut nodes = Vec::new();
        let root = push_html_tree(&mut nodes, root_el);
        let viewport = Viewport::default();
        Ok(Self {
            nodes,
            root,
            viewport,
            document_height: viewport.height,
        })
    }

    fn node(&self, id: NodeId) -> AccessResult<&SnapshotNode> {
        let node = self.nodes.get(id.0).ok_or(AccessError::UnknownNode(id))?;
        if node.detached {
            return Err(AccessError::Detached(id));
        }
        Ok(node)
    }
}

impl PageAccessor for PageSnapshot {
    fn tag_name(&self, node: NodeId) -> AccessResult<String> {
        Ok(self.node(node)?.tag.clone())
    }

    fn attributes(&self, node: NodeId) -> AccessResult<BTreeMap<String, String>> {
        Ok(self.node(node)?.attributes.clone())
    }

    fn computed_style(&self, node: NodeId) -> AccessResult<StyleSnapshot> {
        Ok(self.node(node)?.style.clone())
    }

    fn bounding_box(&self, node: NodeId) -> AccessResult<BoundingBox> {
        Ok(self.node(node)?.rect)
    }

    fn text_content(&self, node: NodeId) -> AccessResult<String> {
        Ok(self.node(node)?.text.clone())
    }

    fn children(&self, node: NodeId) -> AccessResult<Vec<NodeId>> {
        Ok(self.node(node)?.children.clone())
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn document_height(&self) -> f64 {
        self.document_height
    }

    fn attribute(&self, node: NodeId, name: &str) -> AccessResult<Option<String>> {
        Ok(self.node(node)?.attributes.get(name).cloned())
    }
}

fn push_captured(nodes: &mut Vec<SnapshotNode>, captured: CapturedNode) -> NodeId {
    let id = NodeId(nodes.len());
    nodes.push(SnapshotNode {
        tag: captured.tag.to_ascii_lowercase(),
        attributes: captured.attributes,
        text: String::new(),
        style: captured.style,
        rect: captured.rect,
        detached: captured.detached,
        children: Vec::new(),
    });

    let mut child_texts = Vec::new();
    let mut children = Vec::with_capacity(captured.children.len());
    for child in captured.children {
        let child_id = push_captured(nodes, child);
        child_texts.push(nodes[child_id.0].text.clone());
        children.push(child_id);
    }

    let text = captured.text.unwrap_or_else(|| join_texts(None, &child_texts));
    let entry = &mut nodes[id.0];
    entry.text = text;
    entry.children = children;
    id
}

/// Flatten the rendered element tree under `root` into the arena.
///
/// Walks with an explicit stack. Text is appended to one buffer in document
/// order, so each kept element's text content is the buffer slice written
/// between its open and close. Elements deeper than [`MAX_HTML_DEPTH`] are
/// not kept but still contribute text to their kept ancestors.
fn push_html_tree(nodes: &mut Vec<SnapshotNode>, root: ElementRef<'_>) -> NodeId {
    let root_id = push_html_element(nodes, root);
    let mut buffer = String::new();
    // (remaining children, kept node, text start, depth)
    let mut stack = vec![(root.children(), Some(root_id), 0usize, 0usize)];

    while let Some((children, kept, _, depth)) = stack.last_mut() {
        let (parent, depth) = (*kept, *depth);
        let Some(child) = children.next() else {
            if let Some((_, Some(id), start, _)) = stack.pop() {
                nodes[id.0].text = buffer[start..].to_string();
            }
            continue;
        };

        if let Some(text) = child.value().as_text() {
            buffer.push_str(text);
            continue;
        }
        let Some(child_el) = ElementRef::wrap(child) else {
            continue;
        };
        if NON_RENDERED_TAGS.contains(&child_el.value().name()) {
            continue;
        }

        let kept_child = match parent {
            Some(parent) if depth < MAX_HTML_DEPTH => {
                let id = push_html_element(nodes, child_el);
                nodes[parent.0].children.push(id);
                Some(id)
            }
            _ => None,
        };
        stack.push((child_el.children(), kept_child, buffer.len(), depth + 1));
    }
    root_id
}

/// One element with attributes and approximated style; text and children
/// are filled in by [`push_html_tree`].
fn push_html_element(nodes: &mut Vec<SnapshotNode>, el: ElementRef<'_>) -> NodeId {
    let id = NodeId(nodes.len());
    let tag = el.value().name().to_ascii_lowercase();
    let attributes: BTreeMap<String, String> = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut style = attributes
        .get("style")
        .map(|s| StyleSnapshot::parse_declarations(s))
        .unwrap_or_default();
    style.set_default("display", default_display(&tag));

    nodes.push(SnapshotNode {
        tag,
        attributes,
        text: String::new(),
        style,
        rect: BoundingBox::default(),
        detached: false,
        children: Vec::new(),
    });
    id
}

fn join_texts(own: Option<&str>, child_texts: &[String]) -> String {
    own.into_iter()
        .chain(child_texts.iter().map(|s| s.as_str()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// User-agent default `display` for common tags.
fn default_display(tag: &str) -> &'static str {
    match tag {
        "span" | "a" | "strong" | "em" | "b" | "i" | "small" | "label" | "code" | "abbr"
        | "time" | "img" | "svg" | "button" | "input" | "select" | "textarea" | "iframe"
        | "video" | "picture" | "sup" | "sub" => "inline",
        "li" => "list-item",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        _ => "block",
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

/// Programmatic snapshot assembly for tests and adapters.
///
/// `text` set through the builder is the node's *own* text; the built
/// snapshot reports own text followed by all descendant text as the
/// node's text content.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<SnapshotNode>,
    own_text: Vec<Option<String>>,
    viewport: Viewport,
    document_height: Option<f64>,
}

impl SnapshotBuilder {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn document_height(mut self, height: f64) -> Self {
        self.document_height = Some(height);
        self
    }

    /// Create the root node. Must be called first.
    pub fn root(&mut self, tag: &str) -> NodeId {
        self.push(tag)
    }

    /// Append a child element to `parent`.
    pub fn child(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.push(tag);
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn attr(&mut self, node: NodeId, name: &str, value: &str) -> &mut Self {
        self.nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn class(&mut self, node: NodeId, classes: &str) -> &mut Self {
        self.attr(node, "class", classes)
    }

    pub fn text(&mut self, node: NodeId, text: &str) -> &mut Self {
        self.own_text[node.0] = Some(text.to_string());
        self
    }

    pub fn style(&mut self, node: NodeId, property: &str, value: &str) -> &mut Self {
        self.nodes[node.0].style.set(property, value);
        self
    }

    pub fn rect(&mut self, node: NodeId, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.nodes[node.0].rect = BoundingBox {
            x,
            y,
            width,
            height,
        };
        self
    }

    pub fn detach(&mut self, node: NodeId) -> &mut Self {
        self.nodes[node.0].detached = true;
        self
    }

    pub fn build(mut self) -> PageSnapshot {
        // Children always have higher ids than parents, so a reverse sweep
        // sees every child's final text before its parent.
        for idx in (0..self.nodes.len()).rev() {
            let child_texts: Vec<String> = self.nodes[idx]
                .children
                .iter()
                .map(|c| self.nodes[c.0].text.clone())
                .collect();
            self.nodes[idx].text = join_texts(self.own_text[idx].as_deref(), &child_texts);
        }
        let document_height = self.document_height.unwrap_or_else(|| {
            self.nodes
                .iter()
                .map(|n| n.rect.bottom())
                .fold(self.viewport.height, f64::max)
        });
        PageSnapshot {
            nodes: self.nodes,
            root: NodeId(0),
            viewport: self.viewport,
            document_height,
        }
    }

    fn push(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        let tag = tag.to_ascii_lowercase();
        let mut style = StyleSnapshot::new();
        style.set("display", default_display(&tag));
        self.nodes.push(SnapshotNode {
            tag,
            attributes: BTreeMap::new(),
            text: String::new(),
            style,
            rect: BoundingBox::default(),
            detached: false,
            children: Vec::new(),
        });
        self.own_text.push(None);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_html_roots_at_body_and_skips_scripts() {
        let html = r#"
        <html><head><title>t</title></head>
        <body class="home">
            <div style="display: flex; gap: 10px"><p>Hello <b>world</b></p></div>
            <script>var x = 1;</script>
        </body></html>
        "#;
        let snap = PageSnapshot::from_html(html).unwrap();
        let root = snap.root();
        assert_eq!(snap.tag_name(root).unwrap(), "body");
        let children = snap.children(root).unwrap();
        assert_eq!(children.len(), 1);

        let div = children[0];
        let style = snap.computed_style(div).unwrap();
        assert_eq!(style.get("display"), Some("flex"));
        assert_eq!(style.px("gap"), Some(10.0));

        let body_text = snap.text_content(root).unwrap();
        assert!(body_text.contains("Hello world"));
        assert!(!body_text.contains("var x"));
    }

    #[test]
    fn test_from_html_caps_deep_nesting() {
        let levels = 20_000;
        let html = format!(
            "<body>{}<span>bottom</span>{}<p>after</p></body>",
            "<div>".repeat(levels),
            "</div>".repeat(levels)
        );
        let snap = PageSnapshot::from_html(&html).unwrap();
        let root = snap.root();

        let mut depth = 0;
        let mut node = root;
        while let Some(&first) = snap.children(node).unwrap().first() {
            node = first;
            depth += 1;
        }
        assert_eq!(depth, MAX_HTML_DEPTH);
        assert_eq!(snap.text_content(node).unwrap(), "bottom");
        assert_eq!(snap.text_content(root).unwrap(), "bottomafter");
        assert_eq!(snap.children(root).unwrap().len(), 2);
    }

    #[test]
    fn test_from_html_default_display() {
        let snap = PageSnapshot::from_html("<body><span>a</span><li>b</li></body>").unwrap();
        let kids = snap.children(snap.root()).unwrap();
        assert!(snap.computed_style(kids[0]).unwrap().is("display", "inline"));
    }

    #[test]
    fn test_from_json_capture() {
        let json = r#"{
            "viewport": {"width": 1280, "height": 800},
            "root": {
                "tag": "BODY",
                "rect": {"x": 0, "y": 0, "width": 1280, "height": 2400},
                "children": [
                    {"tag": "p", "text": "One"},
                    {"tag": "p", "text": "Two", "detached": true}
                ]
            }
        }"#;
        let snap = PageSnapshot::from_json(json).unwrap();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap.tag_name(snap.root()).unwrap(), "body");
        assert_eq!(snap.document_height(), 2400.0);
        assert_eq!(snap.text_content(snap.root()).unwrap(), "One Two");

        let kids = snap.children(snap.root()).unwrap();
        assert_eq!(
            snap.tag_name(kids[1]),
            Err(AccessError::Detached(kids[1]))
        );
    }

    #[test]
    fn test_unknown_node() {
        let snap = PageSnapshot::from_html("<body></body>").unwrap();
        assert_eq!(
            snap.tag_name(NodeId(99)),
            Err(AccessError::UnknownNode(NodeId(99)))
        );
    }

    #[test]
    fn test_builder_composes_text() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        let div = b.child(body, "div");
        b.text(div, "Intro");
        let p = b.child(div, "p");
        b.text(p, "Body copy");
        let snap = b.build();
        assert_eq!(snap.text_content(div).unwrap(), "Intro Body copy");
        assert_eq!(snap.text_content(body).unwrap(), "Intro Body copy");
        assert_eq!(snap.document_height(), 900.0);
    }
}
