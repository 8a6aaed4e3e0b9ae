//! Elementor export: recognized component tree → Elementor element JSON.
//!
//! Every built-in [`ComponentType`] has exactly one [`WidgetMapper`], picked by
//! an exhaustive `match` in [`builtin_mapper`]. Custom types dispatch to
//! mappers registered on the [`ElementorExporter`].
//!
//! Elementor nests elements as `section > column > (widget | inner section)`.
//! Layout mappers normalize the recognized tree into that shape; see
//! [`layout`] for the rules.

mod content;
mod interactive;
pub mod layout;
mod media;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

use crate::accessor::{normalize_whitespace, PageAccessor, StyleSnapshot};
use crate::analyzers::{self, AnalyzerOutput};
use crate::config::ExportConfig;
use crate::types::{ComponentType, NodeId, PageliftError, PageliftResult, RecognizedComponent};

pub use media::{extract_slides, CarouselSettings, Slide};

/// Length of generated element ids.
pub const ID_LEN: usize = 7;

// ── Output model ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElType {
    Section,
    Column,
    Widget,
}

/// One Elementor element. Built fresh per export and never mutated after
/// the export returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementorWidget {
    pub id: String,
    pub el_type: ElType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_type: Option<String>,
    #[serde(default)]
    pub is_inner: bool,
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub elements: Vec<ElementorWidget>,
}

impl ElementorWidget {
    pub fn widget(id: String, widget_type: &str, settings: Map<String, Value>) -> Self {
        Self {
            id,
            el_type: ElType::Widget,
            widget_type: Some(widget_type.to_string()),
            is_inner: false,
            settings,
            elements: Vec::new(),
        }
    }

    pub fn section(id: String, settings: Map<String, Value>, elements: Vec<ElementorWidget>) -> Self {
        Self {
            id,
            el_type: ElType::Section,
            widget_type: None,
            is_inner: false,
            settings,
            elements,
        }
    }

    pub fn column(id: String, size: f64, elements: Vec<ElementorWidget>) -> Self {
        let mut settings = Map::new();
        settings.insert("_column_size".into(), json!(round_size(size)));
        Self {
            id,
            el_type: ElType::Column,
            widget_type: None,
            is_inner: false,
            settings,
            elements,
        }
    }

    /// Number of elements in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.elements.iter().map(|e| e.count()).sum::<usize>()
    }

    /// Every id in the subtree, pre-order, including slide/item ids nested in
    /// repeater settings.
    pub fn collect_ids(&self) -> Vec<String> {
        let mut out = vec![self.id.clone()];
        for value in self.settings.values() {
            collect_repeater_ids(value, &mut out);
        }
        for child in &self.elements {
            out.extend(child.collect_ids());
        }
        out
    }

    /// Copy with every generated id blanked, for shape comparisons.
    pub fn without_ids(&self) -> Self {
        let mut copy = self.clone();
        copy.id.clear();
        for value in copy.settings.values_mut() {
            blank_repeater_ids(value);
        }
        copy.elements = self.elements.iter().map(|e| e.without_ids()).collect();
        copy
    }
}

fn collect_repeater_ids(value: &Value, out: &mut Vec<String>) {
    if let Value::Array(items) = value {
        for item in items {
            if let Some(id) = item.get("_id").and_then(Value::as_str) {
                out.push(id.to_string());
            }
        }
    }
}

fn blank_repeater_ids(value: &mut Value) {
    if let Value::Array(items) = value {
        for item in items {
            if let Some(id) = item.get_mut("_id") {
                *id = Value::String(String::new());
            }
        }
    }
}

/// Elementor column sizes carry at most three decimals.
fn round_size(size: f64) -> f64 {
    (size * 1000.0).round() / 1000.0
}

/// Importable Elementor page template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementorDocument {
    pub version: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Vec<ElementorWidget>,
    pub page_settings: Map<String, Value>,
}

// ── Ids ──────────────────────────────────────────────────────────────────────

/// Hands out short hex ids, unique within one export.
#[derive(Debug, Default)]
pub struct IdGenerator {
    issued: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        loop {
            let id: String = Uuid::new_v4().simple().to_string()[..ID_LEN].to_string();
            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

// ── Mapping context ──────────────────────────────────────────────────────────

/// Per-export state handed to mappers: the page to read, the id source, and
/// the exporter for recursing into children.
pub struct ExportContext<'a> {
    pub page: &'a dyn PageAccessor,
    pub ids: IdGenerator,
    exporter: &'a ElementorExporter,
}

impl<'a> ExportContext<'a> {
    pub fn new(page: &'a dyn PageAccessor, exporter: &'a ElementorExporter) -> Self {
        Self {
            page,
            ids: IdGenerator::new(),
            exporter,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    /// Map one child through the exporter's dispatch.
    pub fn map_child(&mut self, component: &RecognizedComponent) -> PageliftResult<ElementorWidget> {
        let exporter = self.exporter;
        exporter.map_component(component, self)
    }

    /// Analyzer output for `component`, computed on the fly when the tree was
    /// not enriched.
    pub fn analysis(&self, component: &RecognizedComponent) -> AnalyzerOutput {
        match &component.analyzer_output {
            Some(output) => output.clone(),
            None => analyzers::analyze(&component.component_type, component.element, self.page),
        }
    }

    // Read helpers. All of them degrade to empty values on accessor faults.

    pub fn text(&self, node: NodeId) -> String {
        self.page
            .text_content(node)
            .map(|t| normalize_whitespace(&t))
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.page.tag_name(node).unwrap_or_default()
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.page
            .attribute(node, name)
            .ok()
            .flatten()
            .filter(|v| !v.trim().is_empty())
    }

    pub fn attributes(&self, node: NodeId) -> BTreeMap<String, String> {
        self.page.attributes(node).unwrap_or_default()
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.page.class_list(node).unwrap_or_default()
    }

    pub fn has_class_containing(&self, node: NodeId, needle: &str) -> bool {
        self.classes(node).iter().any(|c| c.contains(needle))
    }

    pub fn style(&self, node: NodeId) -> StyleSnapshot {
        self.page.computed_style(node).unwrap_or_default()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.page.children(node).unwrap_or_default()
    }

    pub fn select(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        analyzers::select(self.page, scope, selector)
    }

    pub fn select_first(&self, scope: NodeId, selector: &str) -> Option<NodeId> {
        self.select(scope, selector).into_iter().next()
    }

    pub fn has(&self, scope: NodeId, selector: &str) -> bool {
        analyzers::has(self.page, scope, selector)
    }

    /// Text of the first descendant matching `selector`, if non-empty.
    pub fn text_of(&self, scope: NodeId, selector: &str) -> Option<String> {
        self.select(scope, selector)
            .into_iter()
            .map(|n| self.text(n))
            .find(|t| !t.is_empty())
    }

    /// `href` of `node` when it is a link, else of its first descendant link.
    pub fn link_of(&self, node: NodeId) -> Option<String> {
        if self.tag(node) == "a" {
            if let Some(href) = self.attr(node, "href") {
                return Some(href);
            }
        }
        self.select_first(node, "a[href]")
            .and_then(|a| self.attr(a, "href"))
    }

    /// Image URL: `src`, else `data-src`, else `data-lazy`.
    pub fn image_url(&self, img: NodeId) -> Option<String> {
        ["src", "data-src", "data-lazy", "data-lazy-src"]
            .iter()
            .find_map(|name| self.attr(img, name))
    }
}

// ── Mapper contract ──────────────────────────────────────────────────────────

/// Transform for one component type into one Elementor element.
///
/// `map` must be total over components of [`WidgetMapper::component_type`]:
/// missing optional sub-structure falls back to the documented defaults.
/// Errors are reserved for contract violations (a child with no mapper).
pub trait WidgetMapper: Send + Sync {
    /// The component type this mapper accepts.
    fn component_type(&self) -> ComponentType;

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget>;

    /// Type-checked entry point.
    fn map_to_target(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let expected = self.component_type();
        if expected != component.component_type {
            return Err(PageliftError::UnsupportedComponent {
                mapper: expected,
                component: component.component_type.clone(),
            });
        }
        self.map(component, ctx)
    }
}

/// Mapper for a built-in type. `None` only for custom types.
pub fn builtin_mapper(component_type: &ComponentType) -> Option<&'static dyn WidgetMapper> {
    use layout::{ColumnMapper, Region, RegionMapper, RowMapper, SidebarMapper};

    let mapper: &'static dyn WidgetMapper = match component_type {
        ComponentType::Section => &RegionMapper { region: Region::Section },
        ComponentType::Container => &RegionMapper { region: Region::Container },
        ComponentType::Hero => &RegionMapper { region: Region::Hero },
        ComponentType::Header => &RegionMapper { region: Region::Header },
        ComponentType::Footer => &RegionMapper { region: Region::Footer },
        ComponentType::Row => &RowMapper,
        ComponentType::Column => &ColumnMapper,
        ComponentType::Sidebar => &SidebarMapper,
        ComponentType::Heading => &content::HeadingMapper,
        ComponentType::Paragraph => &content::TextEditorMapper { source: content::TextSource::Paragraph },
        ComponentType::Text => &content::TextEditorMapper { source: content::TextSource::Text },
        ComponentType::List => &content::TextEditorMapper { source: content::TextSource::List },
        ComponentType::Blockquote => &content::BlockquoteMapper,
        ComponentType::Button => &content::ButtonMapper,
        ComponentType::Divider => &content::DividerMapper,
        ComponentType::IconList => &content::IconListMapper,
        ComponentType::SocialIcons => &content::SocialIconsMapper,
        ComponentType::Image => &media::ImageMapper,
        ComponentType::Video => &media::VideoMapper,
        ComponentType::ImageCarousel => &media::ImageCarouselMapper,
        ComponentType::VideoPlaylist => &media::VideoPlaylistMapper,
        ComponentType::Alert => &interactive::AlertMapper,
        ComponentType::Tabs => &interactive::TabsMapper,
        ComponentType::Toggle => &interactive::DisclosureMapper { accordion: false },
        ComponentType::Accordion => &interactive::DisclosureMapper { accordion: true },
        ComponentType::PostsGrid => &interactive::PostsMapper,
        ComponentType::PriceList => &interactive::PriceListMapper,
        ComponentType::StarRating => &interactive::StarRatingMapper,
        ComponentType::Testimonial => &interactive::TestimonialMapper,
        ComponentType::Counter => &interactive::CounterMapper,
        ComponentType::ProgressBar => &interactive::ProgressMapper,
        ComponentType::NavMenu => &interactive::NavMenuMapper,
        ComponentType::Form => &interactive::FormMapper,
        ComponentType::Custom(_) => return None,
    };
    Some(mapper)
}

// ── Exporter ─────────────────────────────────────────────────────────────────

/// Walks a recognized tree and emits Elementor elements.
#[derive(Default)]
pub struct ElementorExporter {
    custom: BTreeMap<String, Box<dyn WidgetMapper>>,
    config: ExportConfig,
}

impl ElementorExporter {
    pub fn new(config: ExportConfig) -> Self {
        Self {
            custom: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Register the mapper for a custom component type. Rejected for
    /// built-in types, which always use their own mapper.
    pub fn register_mapper(&mut self, mapper: Box<dyn WidgetMapper>) -> PageliftResult<()> {
        match mapper.component_type() {
            ComponentType::Custom(name) => {
                self.custom.insert(name, mapper);
                Ok(())
            }
            builtin => Err(PageliftError::InvalidCustomType(builtin.to_string())),
        }
    }

    pub fn mapper_for(&self, component_type: &ComponentType) -> PageliftResult<&dyn WidgetMapper> {
        if let Some(mapper) = builtin_mapper(component_type) {
            return Ok(mapper);
        }
        match component_type {
            ComponentType::Custom(name) => self
                .custom
                .get(name)
                .map(|m| m.as_ref())
                .ok_or_else(|| PageliftError::NoMapper(component_type.clone())),
            _ => Err(PageliftError::NoMapper(component_type.clone())),
        }
    }

    /// Map one component (and, for layout types, its subtree).
    pub fn map_component(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let mapper = self.mapper_for(&component.component_type)?;
        let widget = mapper.map_to_target(component, ctx)?;
        debug!(
            component = %component.component_type,
            node = %component.element,
            el_type = ?widget.el_type,
            "mapped component"
        );
        Ok(widget)
    }

    /// Export a recognized tree as top-level Elementor sections.
    pub fn export_tree(
        &self,
        root: &RecognizedComponent,
        page: &dyn PageAccessor,
    ) -> PageliftResult<Vec<ElementorWidget>> {
        let mut ctx = ExportContext::new(page, self);
        let content = layout::top_level(root, &mut ctx)?;
        info!(
            sections = content.len(),
            ids = ctx.ids.issued(),
            "export complete"
        );
        Ok(content)
    }

    /// Enrich `root` with analyzer output, then export it wrapped in an
    /// importable page document.
    pub fn export_page(
        &self,
        root: &mut RecognizedComponent,
        page: &dyn PageAccessor,
    ) -> PageliftResult<ElementorDocument> {
        analyzers::enrich(root, page);
        let content = self.export_tree(root, page)?;
        Ok(ElementorDocument {
            version: self.config.version.clone(),
            title: self.config.title.clone(),
            kind: "page".to_string(),
            content,
            page_settings: Map::new(),
        })
    }
}

// ── Shared setting builders ──────────────────────────────────────────────────

/// Elementor URL control value.
pub(crate) fn link_value(url: &str) -> Value {
    let external = url.starts_with("http://") || url.starts_with("https://");
    json!({
        "url": url,
        "is_external": if external { "on" } else { "" },
        "nofollow": "",
    })
}

/// Elementor media control value.
pub(crate) fn media_value(url: &str, alt: Option<&str>) -> Value {
    json!({
        "url": url,
        "id": "",
        "alt": alt.unwrap_or(""),
        "source": "library",
    })
}

/// Elementor slider/dimension control value.
pub(crate) fn size_value(size: f64, unit: &str) -> Value {
    json!({ "unit": unit, "size": size, "sizes": [] })
}

pub(crate) fn yes_no(flag: bool) -> Value {
    Value::String(if flag { "yes" } else { "" }.to_string())
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    struct BannerMapper;

    impl WidgetMapper for BannerMapper {
        fn component_type(&self) -> ComponentType {
            ComponentType::Custom("cookie-banner".into())
        }

        fn map(
            &self,
            component: &RecognizedComponent,
            ctx: &mut ExportContext<'_>,
        ) -> PageliftResult<ElementorWidget> {
            let mut settings = Map::new();
            settings.insert("editor".into(), json!(ctx.text(component.element)));
            Ok(ElementorWidget::widget(ctx.next_id(), "text-editor", settings))
        }
    }

    fn page() -> (crate::PageSnapshot, NodeId) {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let div = b.root("div");
        b.text(div, "We use cookies");
        (b.build(), div)
    }

    #[test]
    fn test_ids_are_unique_and_short() {
        let mut ids = IdGenerator::new();
        let issued: HashSet<String> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(issued.len(), 500);
        assert!(issued.iter().all(|id| id.len() == ID_LEN
            && id.chars().all(|c| c.is_ascii_hexdigit())));
    }

    #[test]
    fn test_every_builtin_type_has_a_mapper() {
        for t in ComponentType::BUILTIN.iter() {
            let mapper = builtin_mapper(t).unwrap();
            assert_eq!(&mapper.component_type(), t);
        }
        assert!(builtin_mapper(&ComponentType::Custom("x".into())).is_none());
    }

    #[test]
    fn test_mapper_rejects_other_types() {
        let (snap, div) = page();
        let exporter = ElementorExporter::default();
        let mut ctx = ExportContext::new(&snap, &exporter);
        let heading = RecognizedComponent::new(ComponentType::Heading, 90, div);
        let err = builtin_mapper(&ComponentType::ImageCarousel)
            .unwrap()
            .map_to_target(&heading, &mut ctx)
            .unwrap_err();
        assert!(matches!(
            err,
            PageliftError::UnsupportedComponent { mapper: ComponentType::ImageCarousel, component: ComponentType::Heading }
        ));
    }

    #[test]
    fn test_custom_types_need_a_registered_mapper() {
        let (snap, div) = page();
        let banner = RecognizedComponent::new(ComponentType::Custom("cookie-banner".into()), 90, div);

        let exporter = ElementorExporter::default();
        let mut ctx = ExportContext::new(&snap, &exporter);
        assert!(matches!(
            exporter.map_component(&banner, &mut ctx),
            Err(PageliftError::NoMapper(_))
        ));

        let mut exporter = ElementorExporter::default();
        exporter.register_mapper(Box::new(BannerMapper)).unwrap();
        let mut ctx = ExportContext::new(&snap, &exporter);
        let widget = exporter.map_component(&banner, &mut ctx).unwrap();
        assert_eq!(widget.widget_type.as_deref(), Some("text-editor"));
        assert_eq!(widget.settings["editor"], "We use cookies");
    }

    #[test]
    fn test_widget_serializes_camel_case() {
        let widget = ElementorWidget::widget("abc1234".into(), "heading", Map::new());
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["elType"], "widget");
        assert_eq!(json["widgetType"], "heading");
        assert_eq!(json["isInner"], false);
        let column = serde_json::to_value(ElementorWidget::column("c".into(), 100.0 / 3.0, vec![])).unwrap();
        assert!(column.get("widgetType").is_none());
        assert_eq!(column["settings"]["_column_size"], 33.333);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }
}
