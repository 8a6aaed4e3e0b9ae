//! Layout mappers and structural normalization.
//!
//! Elementor only accepts `section > column > (widget | inner section)`.
//! Recognized trees are looser, so layout mappers reshape them:
//!
//! - a section holds columns only; consecutive non-column children are
//!   gathered into one column, and a section whose sole child is a row takes
//!   the row's columns directly;
//! - a row becomes an inner section, and each of its children that is not a
//!   column gets a column of its own;
//! - a column holds widgets and inner sections; nested columns are flattened;
//! - top-level widgets and columns are wrapped into a section;
//! - inner sections nest one level deep; anything below is flattened into
//!   the inner section's columns.
//!
//! Columns share the width left over by fixed-width columns (sidebars)
//! equally.

use serde_json::{json, Map, Value};

use super::{media_value, size_value, ElType, ElementorWidget, ExportContext, WidgetMapper};
use crate::analyzers::{AnalyzerOutput, SidebarPosition};
use crate::types::{ComponentType, PageliftResult, RecognizedComponent};

/// Setting carrying a column's fixed width percentage.
const INLINE_SIZE: &str = "_inline_size";
const COLUMN_SIZE: &str = "_column_size";

/// Top-level layout regions exported as Elementor sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Section,
    Container,
    Hero,
    Header,
    Footer,
}

impl Region {
    fn component_type(self) -> ComponentType {
        match self {
            Region::Section => ComponentType::Section,
            Region::Container => ComponentType::Container,
            Region::Hero => ComponentType::Hero,
            Region::Header => ComponentType::Header,
            Region::Footer => ComponentType::Footer,
        }
    }

    fn html_tag(self) -> &'static str {
        match self {
            Region::Section | Region::Hero => "section",
            Region::Container => "div",
            Region::Header => "header",
            Region::Footer => "footer",
        }
    }
}

// ── Mappers ──────────────────────────────────────────────────────────────────

/// Section-like regions.
pub struct RegionMapper {
    pub region: Region,
}

impl WidgetMapper for RegionMapper {
    fn component_type(&self) -> ComponentType {
        self.region.component_type()
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let id = ctx.next_id();
        let settings = region_settings(self.region, component, ctx);
        let children = map_children(component, ctx)?;
        let columns = into_columns(children, ctx);
        Ok(ElementorWidget::section(id, settings, columns))
    }
}

fn region_settings(
    region: Region,
    component: &RecognizedComponent,
    ctx: &ExportContext<'_>,
) -> Map<String, Value> {
    let mut settings = Map::new();
    settings.insert("html_tag".into(), json!(region.html_tag()));

    match ctx.analysis(component) {
        AnalyzerOutput::Section(s) => {
            let layout = if s.full_width { "full_width" } else { "boxed" };
            settings.insert("layout".into(), json!(layout));
            if let Some(h) = s.min_height {
                settings.insert("height".into(), json!("min-height"));
                settings.insert("custom_height".into(), size_value(h, "px"));
            }
            if s.background_color.is_some() || s.background_image.is_some() {
                settings.insert("background_background".into(), json!("classic"));
            }
            if let Some(color) = s.background_color {
                settings.insert("background_color".into(), json!(color));
            }
            if let Some(url) = s.background_image {
                settings.insert("background_image".into(), media_value(&url, None));
                settings.insert("background_size".into(), json!("cover"));
            }
        }
        AnalyzerOutput::Header(h) => {
            if h.sticky {
                settings.insert("sticky".into(), json!("top"));
            }
        }
        AnalyzerOutput::Footer(f) => {
            if let Some(color) = f.background_color {
                settings.insert("background_background".into(), json!("classic"));
                settings.insert("background_color".into(), json!(color));
            }
            if let Some(color) = f.text_color {
                settings.insert("color_text".into(), json!(color));
            }
        }
        _ => {}
    }

    if region == Region::Hero {
        settings
            .entry("height")
            .or_insert_with(|| json!("min-height"));
        settings
            .entry("custom_height")
            .or_insert_with(|| size_value(60.0, "vh"));
        settings.insert("content_position".into(), json!("middle"));
    }
    settings
}

/// Rows become inner sections with one column per child.
pub struct RowMapper;

impl WidgetMapper for RowMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Row
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let id = ctx.next_id();
        let children = map_children(component, ctx)?;
        let mut columns: Vec<ElementorWidget> = Vec::with_capacity(children.len());
        for child in children {
            match child.el_type {
                ElType::Column => columns.push(child),
                _ => {
                    let col_id = ctx.next_id();
                    columns.push(ElementorWidget::column(col_id, 100.0, vec![inner(child)]));
                }
            }
        }
        if columns.is_empty() {
            columns.push(ElementorWidget::column(ctx.next_id(), 100.0, Vec::new()));
        }
        balance(&mut columns);

        let mut settings = Map::new();
        if columns.len() <= 6 {
            settings.insert("structure".into(), json!(format!("{}0", columns.len())));
        }
        if let AnalyzerOutput::Row(row) = ctx.analysis(component) {
            if row.gap_px > 0.0 {
                settings.insert("gap".into(), json!("custom"));
                settings.insert("gap_columns_custom".into(), size_value(row.gap_px, "px"));
            }
            let position = match row.align_items.as_str() {
                "center" => Some("middle"),
                "flex-start" | "start" => Some("top"),
                "flex-end" | "end" => Some("bottom"),
                _ => None,
            };
            if let Some(p) = position {
                settings.insert("column_position".into(), json!(p));
            }
        }

        let mut section = ElementorWidget::section(id, settings, columns);
        section.is_inner = true;
        Ok(section)
    }
}

pub struct ColumnMapper;

impl WidgetMapper for ColumnMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Column
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let id = ctx.next_id();
        let children = map_children(component, ctx)?;
        Ok(ElementorWidget::column(id, 100.0, column_contents(children)))
    }
}

/// Sidebars become fixed-width columns.
pub struct SidebarMapper;

impl WidgetMapper for SidebarMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Sidebar
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let id = ctx.next_id();
        let analysis = ctx.analysis(component);
        let children = map_children(component, ctx)?;
        let mut column = ElementorWidget::column(id, 100.0, column_contents(children));

        if let AnalyzerOutput::Sidebar(s) = analysis {
            let viewport = ctx.page.viewport().width;
            if s.width > 0.0 && viewport > 0.0 {
                let percent = (s.width / viewport * 100.0).clamp(1.0, 100.0);
                column
                    .settings
                    .insert(INLINE_SIZE.into(), json!(super::round_size(percent)));
            }
            if s.sticky {
                column.settings.insert("sticky".into(), json!("top"));
            }
            let side = match s.position {
                SidebarPosition::Left => "left",
                SidebarPosition::Right => "right",
            };
            column.settings.insert(
                "_css_classes".into(),
                json!(format!("sidebar sidebar-{side}")),
            );
        }
        Ok(column)
    }
}

// ── Normalization ────────────────────────────────────────────────────────────

fn map_children(
    component: &RecognizedComponent,
    ctx: &mut ExportContext<'_>,
) -> PageliftResult<Vec<ElementorWidget>> {
    component
        .children
        .iter()
        .map(|child| ctx.map_child(child))
        .collect()
}

fn inner(mut element: ElementorWidget) -> ElementorWidget {
    if element.el_type == ElType::Section {
        element.is_inner = true;
    }
    element
}

/// Contents allowed inside a column: widgets and inner sections.
fn column_contents(children: Vec<ElementorWidget>) -> Vec<ElementorWidget> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        match child.el_type {
            ElType::Column => out.extend(child.elements),
            ElType::Section => out.push(inner(child)),
            ElType::Widget => out.push(child),
        }
    }
    out
}

/// Shape mapped children into a section's column list.
fn into_columns(children: Vec<ElementorWidget>, ctx: &mut ExportContext<'_>) -> Vec<ElementorWidget> {
    if children.len() == 1 && children[0].el_type == ElType::Section && children[0].is_inner {
        let row = children.into_iter().next().map(|r| r.elements).unwrap_or_default();
        if !row.is_empty() && row.iter().all(|c| c.el_type == ElType::Column) {
            let mut columns = row;
            balance(&mut columns);
            return columns;
        }
        return into_columns_general(row, ctx);
    }
    into_columns_general(children, ctx)
}

fn into_columns_general(
    children: Vec<ElementorWidget>,
    ctx: &mut ExportContext<'_>,
) -> Vec<ElementorWidget> {
    let mut columns = Vec::new();
    let mut pending: Vec<ElementorWidget> = Vec::new();

    for child in children {
        if child.el_type == ElType::Column {
            if !pending.is_empty() {
                let id = ctx.next_id();
                columns.push(ElementorWidget::column(id, 100.0, std::mem::take(&mut pending)));
            }
            columns.push(child);
        } else {
            pending.push(inner(child));
        }
    }
    if !pending.is_empty() || columns.is_empty() {
        let id = ctx.next_id();
        columns.push(ElementorWidget::column(id, 100.0, pending));
    }
    balance(&mut columns);
    columns
}

/// Fixed-width columns keep their width; the rest split what is left.
fn balance(columns: &mut [ElementorWidget]) {
    let fixed: f64 = columns.iter().filter_map(fixed_width).sum();
    let flexible = columns.iter().filter(|c| fixed_width(c).is_none()).count();

    let (keep_fixed, share) = if fixed < 100.0 && flexible > 0 {
        (true, (100.0 - fixed) / flexible as f64)
    } else if flexible == 0 {
        (true, 0.0)
    } else {
        (false, 100.0 / columns.len() as f64)
    };

    for column in columns.iter_mut() {
        let size = match fixed_width(column) {
            Some(w) if keep_fixed => w,
            _ => share,
        };
        column
            .settings
            .insert(COLUMN_SIZE.into(), json!(super::round_size(size)));
    }
}

fn fixed_width(column: &ElementorWidget) -> Option<f64> {
    column.settings.get(INLINE_SIZE).and_then(Value::as_f64)
}

/// Normalize a whole recognized tree into top-level sections.
///
/// A container root is unwrapped: its sections stand on their own and runs
/// of other content are wrapped in sections. Any other root is exported as
/// one section.
pub(super) fn top_level(
    root: &RecognizedComponent,
    ctx: &mut ExportContext<'_>,
) -> PageliftResult<Vec<ElementorWidget>> {
    let mapped = if root.component_type == ComponentType::Container {
        map_children(root, ctx)?
    } else {
        vec![ctx.map_child(root)?]
    };

    let mut sections = Vec::new();
    let mut pending = Vec::new();
    for element in mapped {
        if element.el_type == ElType::Section && !element.is_inner {
            flush(&mut pending, &mut sections, ctx);
            sections.push(element);
        } else {
            pending.push(element);
        }
    }
    flush(&mut pending, &mut sections, ctx);
    for section in &mut sections {
        limit_nesting(section);
    }
    Ok(sections)
}

/// Elementor renders one level of inner sections. Sections and columns
/// nested below an inner section are flattened into its columns.
fn limit_nesting(section: &mut ElementorWidget) {
    for column in &mut section.elements {
        for element in &mut column.elements {
            if element.el_type != ElType::Section {
                continue;
            }
            element.is_inner = true;
            for inner_column in &mut element.elements {
                inner_column.elements = widgets_only(std::mem::take(&mut inner_column.elements));
            }
        }
    }
}

fn widgets_only(elements: Vec<ElementorWidget>) -> Vec<ElementorWidget> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        if element.el_type == ElType::Widget {
            out.push(element);
        } else {
            out.extend(widgets_only(element.elements));
        }
    }
    out
}

fn flush(
    pending: &mut Vec<ElementorWidget>,
    sections: &mut Vec<ElementorWidget>,
    ctx: &mut ExportContext<'_>,
) {
    if pending.is_empty() {
        return;
    }
    let id = ctx.next_id();
    let columns = into_columns(std::mem::take(pending), ctx);
    sections.push(ElementorWidget::section(id, Map::new(), columns));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ElementorExporter;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::{NodeId, Viewport};

    fn component(t: ComponentType, node: NodeId, children: Vec<RecognizedComponent>) -> RecognizedComponent {
        let mut c = RecognizedComponent::new(t, 80, node);
        c.children = children;
        c
    }

    #[test]
    fn test_section_gathers_widgets_into_one_column() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let section = b.root("section");
        let h = b.child(section, "h2");
        let p = b.child(section, "p");
        let snap = b.build();

        let tree = component(
            ComponentType::Section,
            section,
            vec![
                component(ComponentType::Heading, h, vec![]),
                component(ComponentType::Paragraph, p, vec![]),
            ],
        );
        let out = ElementorExporter::default().export_tree(&tree, &snap).unwrap();
        assert_eq!(out.len(), 1);
        let section = &out[0];
        assert_eq!(section.el_type, ElType::Section);
        assert_eq!(section.settings["html_tag"], "section");
        assert_eq!(section.elements.len(), 1);
        assert_eq!(section.elements[0].el_type, ElType::Column);
        assert_eq!(section.elements[0].settings["_column_size"], 100.0);
        assert_eq!(section.elements[0].elements.len(), 2);
    }

    #[test]
    fn test_section_with_single_row_takes_row_columns() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let section = b.root("section");
        let row = b.child(section, "div");
        let a = b.child(row, "p");
        let c = b.child(row, "p");
        let d = b.child(row, "p");
        let snap = b.build();

        let tree = component(
            ComponentType::Section,
            section,
            vec![component(
                ComponentType::Row,
                row,
                vec![
                    component(ComponentType::Paragraph, a, vec![]),
                    component(ComponentType::Paragraph, c, vec![]),
                    component(ComponentType::Paragraph, d, vec![]),
                ],
            )],
        );
        let out = ElementorExporter::default().export_tree(&tree, &snap).unwrap();
        let columns = &out[0].elements;
        assert_eq!(columns.len(), 3);
        assert!(columns.iter().all(|c| c.el_type == ElType::Column));
        assert_eq!(columns[0].settings["_column_size"], 33.333);
    }

    #[test]
    fn test_sidebar_keeps_its_width() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("div");
        let main = b.child(body, "div");
        let aside = b.child(body, "aside");
        b.rect(aside, 1080.0, 0.0, 360.0, 900.0);
        let snap = b.build();

        let tree = component(
            ComponentType::Row,
            body,
            vec![
                component(ComponentType::Column, main, vec![]),
                component(ComponentType::Sidebar, aside, vec![]),
            ],
        );
        let out = ElementorExporter::default().export_tree(&tree, &snap).unwrap();
        let columns = &out[0].elements;
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].settings["_column_size"], 75.0);
        assert_eq!(columns[1].settings["_column_size"], 25.0);
        assert_eq!(columns[1].settings["_css_classes"], "sidebar sidebar-right");
    }

    #[test]
    fn test_container_root_is_unwrapped() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let body = b.root("body");
        let header = b.child(body, "header");
        let p = b.child(body, "p");
        let footer = b.child(body, "footer");
        let snap = b.build();

        let mut root = RecognizedComponent::new(ComponentType::Container, 0, body);
        root.children = vec![
            component(ComponentType::Header, header, vec![]),
            component(ComponentType::Paragraph, p, vec![]),
            component(ComponentType::Footer, footer, vec![]),
        ];
        let out = ElementorExporter::default().export_tree(&root, &snap).unwrap();
        let tags: Vec<&Value> = out.iter().map(|s| &s.settings["html_tag"]).collect();
        assert_eq!(out.len(), 3);
        assert_eq!(tags[0], "header");
        assert_eq!(tags[2], "footer");
        assert_eq!(out[1].elements[0].elements[0].widget_type.as_deref(), Some("text-editor"));
        assert!(out.iter().all(|s| !s.is_inner));
    }

    #[test]
    fn test_inner_sections_nest_one_level() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let outer = b.root("section");
        let h = b.child(outer, "h2");
        let middle = b.child(outer, "section");
        let p = b.child(middle, "p");
        let deepest = b.child(middle, "section");
        let q = b.child(deepest, "p");
        let snap = b.build();

        let tree = component(
            ComponentType::Section,
            outer,
            vec![
                component(ComponentType::Heading, h, vec![]),
                component(
                    ComponentType::Section,
                    middle,
                    vec![
                        component(ComponentType::Paragraph, p, vec![]),
                        component(
                            ComponentType::Section,
                            deepest,
                            vec![component(ComponentType::Paragraph, q, vec![])],
                        ),
                    ],
                ),
            ],
        );
        let out = ElementorExporter::default().export_tree(&tree, &snap).unwrap();
        assert_eq!(out.len(), 1);

        let column = &out[0].elements[0];
        assert_eq!(column.elements.len(), 2);
        let inner_section = &column.elements[1];
        assert_eq!(inner_section.el_type, ElType::Section);
        assert!(inner_section.is_inner);

        let inner_column = &inner_section.elements[0];
        assert_eq!(inner_column.elements.len(), 2);
        assert!(inner_column
            .elements
            .iter()
            .all(|e| e.el_type == ElType::Widget));
    }

    #[test]
    fn test_top_level_widget_is_wrapped() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let h = b.root("h1");
        b.text(h, "Hello");
        let snap = b.build();
        let out = ElementorExporter::default()
            .export_tree(&component(ComponentType::Heading, h, vec![]), &snap)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].el_type, ElType::Section);
        assert_eq!(out[0].elements[0].elements[0].widget_type.as_deref(), Some("heading"));
    }
}
