//! Basic content widgets: heading, text editor, blockquote, button, divider,
//! icon list and social icons.

use serde_json::{json, Map, Value};

use super::{escape_html, link_value, size_value, ElementorWidget, ExportContext, WidgetMapper};
use crate::types::{ComponentType, NodeId, PageliftResult, RecognizedComponent};

const HEADING_TAGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

fn text_align(ctx: &ExportContext<'_>, node: NodeId, settings: &mut Map<String, Value>) {
    let style = ctx.style(node);
    if let Some(align) = style.get("text-align") {
        let align = match align {
            "start" => "left",
            "end" => "right",
            other => other,
        };
        if matches!(align, "left" | "center" | "right" | "justify") {
            settings.insert("align".into(), json!(align));
        }
    }
}

// ── Heading ──────────────────────────────────────────────────────────────────

/// `heading`: title from the text, size from the tag (`h2` otherwise).
pub struct HeadingMapper;

impl WidgetMapper for HeadingMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Heading
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let tag = ctx.tag(node);
        let header_size = if HEADING_TAGS.contains(&tag.as_str()) {
            tag
        } else {
            ctx.attr(node, "aria-level")
                .and_then(|l| l.parse::<u8>().ok())
                .filter(|l| (1..=6).contains(l))
                .map(|l| format!("h{l}"))
                .unwrap_or_else(|| "h2".to_string())
        };

        let mut settings = Map::new();
        settings.insert("title".into(), json!(ctx.text(node)));
        settings.insert("header_size".into(), json!(header_size));
        if let Some(href) = ctx.link_of(node) {
            settings.insert("link".into(), link_value(&href));
        }
        text_align(ctx, node, &mut settings);
        Ok(ElementorWidget::widget(ctx.next_id(), "heading", settings))
    }
}

// ── Text editor ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    Paragraph,
    Text,
    List,
}

/// `text-editor`: paragraphs and free text become one `<p>`, lists keep
/// their items.
pub struct TextEditorMapper {
    pub source: TextSource,
}

impl WidgetMapper for TextEditorMapper {
    fn component_type(&self) -> ComponentType {
        match self.source {
            TextSource::Paragraph => ComponentType::Paragraph,
            TextSource::Text => ComponentType::Text,
            TextSource::List => ComponentType::List,
        }
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let editor = match self.source {
            TextSource::List => {
                let list_tag = if ctx.tag(node) == "ol" { "ol" } else { "ul" };
                let items: String = ctx
                    .children(node)
                    .into_iter()
                    .filter(|c| ctx.tag(*c) == "li")
                    .map(|li| format!("<li>{}</li>", escape_html(&ctx.text(li))))
                    .collect();
                format!("<{list_tag}>{items}</{list_tag}>")
            }
            TextSource::Paragraph | TextSource::Text => {
                format!("<p>{}</p>", escape_html(&ctx.text(node)))
            }
        };

        let mut settings = Map::new();
        settings.insert("editor".into(), json!(editor));
        text_align(ctx, node, &mut settings);
        Ok(ElementorWidget::widget(ctx.next_id(), "text-editor", settings))
    }
}

// ── Blockquote ───────────────────────────────────────────────────────────────

/// `blockquote`: quote text without the citation; author from `cite` or a
/// `footer`.
pub struct BlockquoteMapper;

impl WidgetMapper for BlockquoteMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Blockquote
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let author = ctx.text_of(node, "cite, footer, .author, figcaption");
        let full = ctx.text(node);
        let content = ctx
            .text_of(node, "p")
            .or_else(|| {
                author
                    .as_deref()
                    .map(|a| full.replace(a, "").trim().trim_end_matches(['—', '-']).trim().to_string())
            })
            .unwrap_or(full);

        let mut settings = Map::new();
        settings.insert("blockquote_content".into(), json!(content));
        settings.insert("blockquote_skin".into(), json!("border"));
        if let Some(author) = author {
            let author = author.trim_start_matches(['—', '-']).trim().to_string();
            settings.insert("author_name".into(), json!(author));
        }
        Ok(ElementorWidget::widget(ctx.next_id(), "blockquote", settings))
    }
}

// ── Button ───────────────────────────────────────────────────────────────────

/// `button`: label from text, `value` or `aria-label` ("Click here"
/// otherwise); link from the element or its first link.
pub struct ButtonMapper;

impl WidgetMapper for ButtonMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Button
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let text = Some(ctx.text(node))
            .filter(|t| !t.is_empty())
            .or_else(|| ctx.attr(node, "value"))
            .or_else(|| ctx.attr(node, "aria-label"))
            .unwrap_or_else(|| "Click here".to_string());

        let mut settings = Map::new();
        settings.insert("text".into(), json!(text));
        if let Some(href) = ctx.link_of(node) {
            settings.insert("link".into(), link_value(&href));
        }
        let size = match ctx.classes(node).iter().find_map(|c| size_class(c)) {
            Some(size) => size,
            None => "sm",
        };
        settings.insert("size".into(), json!(size));
        text_align(ctx, node, &mut settings);
        Ok(ElementorWidget::widget(ctx.next_id(), "button", settings))
    }
}

fn size_class(class: &str) -> Option<&'static str> {
    match class {
        c if c.ends_with("-xs") => Some("xs"),
        c if c.ends_with("-sm") || c.ends_with("-small") => Some("sm"),
        c if c.ends_with("-lg") || c.ends_with("-large") => Some("lg"),
        c if c.ends_with("-xl") => Some("xl"),
        _ => None,
    }
}

// ── Divider ──────────────────────────────────────────────────────────────────

/// `divider`: border style, weight and color from the top border; solid 1px
/// otherwise.
pub struct DividerMapper;

impl WidgetMapper for DividerMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Divider
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let style = ctx.style(component.element);
        let line = style
            .get("border-top-style")
            .filter(|s| matches!(*s, "solid" | "dashed" | "dotted" | "double"))
            .unwrap_or("solid");
        let weight = style.px("border-top-width").filter(|w| *w > 0.0).unwrap_or(1.0);

        let mut settings = Map::new();
        settings.insert("style".into(), json!(line));
        settings.insert("weight".into(), size_value(weight, "px"));
        if let Some(color) = style.get("border-top-color") {
            settings.insert("color".into(), json!(color));
        }
        Ok(ElementorWidget::widget(ctx.next_id(), "divider", settings))
    }
}

// ── Icon list ────────────────────────────────────────────────────────────────

/// `icon-list`: one item per `li` (or direct child), Font Awesome icon from
/// the item's `<i>` classes, `fas fa-check` otherwise.
pub struct IconListMapper;

impl WidgetMapper for IconListMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::IconList
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let mut items = ctx.select(node, "li");
        if items.is_empty() {
            items = ctx.children(node);
        }

        let mut list = Vec::with_capacity(items.len());
        for item in items {
            let text = ctx.text(item);
            if text.is_empty() {
                continue;
            }
            let (icon, library) = ctx
                .select(item, "i, span[class*=fa-]")
                .into_iter()
                .find_map(|i| ctx.attr(i, "class").filter(|c| c.contains("fa-")))
                .map(|class| {
                    let library = icon_library(&class);
                    (class, library)
                })
                .unwrap_or_else(|| ("fas fa-check".to_string(), "fa-solid"));

            let mut entry = json!({
                "_id": ctx.next_id(),
                "text": text,
                "selected_icon": { "value": icon, "library": library },
            });
            if let Some(href) = ctx.link_of(item) {
                entry["link"] = link_value(&href);
            }
            list.push(entry);
        }

        let mut settings = Map::new();
        settings.insert("view".into(), json!("traditional"));
        settings.insert("icon_list".into(), Value::Array(list));
        Ok(ElementorWidget::widget(ctx.next_id(), "icon-list", settings))
    }
}

fn icon_library(class: &str) -> &'static str {
    let has = |token: &str| class.split_whitespace().any(|c| c == token);
    if has("fab") || has("fa-brands") {
        "fa-brands"
    } else if has("far") || has("fa-regular") {
        "fa-regular"
    } else {
        "fa-solid"
    }
}

// ── Social icons ─────────────────────────────────────────────────────────────

/// Known networks: host fragment → Font Awesome brand icon.
const NETWORKS: [(&str, &str); 10] = [
    ("facebook.com", "fab fa-facebook"),
    ("twitter.com", "fab fa-twitter"),
    ("x.com", "fab fa-x-twitter"),
    ("instagram.com", "fab fa-instagram"),
    ("linkedin.com", "fab fa-linkedin"),
    ("youtube.com", "fab fa-youtube"),
    ("tiktok.com", "fab fa-tiktok"),
    ("pinterest.com", "fab fa-pinterest"),
    ("github.com", "fab fa-github"),
    ("wa.me", "fab fa-whatsapp"),
];

/// `social-icons`: one entry per link, brand icon from the link's host
/// (`fas fa-link` for unknown hosts).
pub struct SocialIconsMapper;

impl WidgetMapper for SocialIconsMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::SocialIcons
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let links = ctx.select(component.element, "a[href]");
        let mut list = Vec::with_capacity(links.len());
        for link in links {
            let Some(href) = ctx.attr(link, "href") else { continue };
            let (icon, library) = match network_icon(&href) {
                Some(icon) => (icon, "fa-brands"),
                None => ("fas fa-link", "fa-solid"),
            };
            list.push(json!({
                "_id": ctx.next_id(),
                "social_icon": { "value": icon, "library": library },
                "link": link_value(&href),
            }));
        }

        let mut settings = Map::new();
        settings.insert("social_icon_list".into(), Value::Array(list));
        settings.insert("shape".into(), json!("rounded"));
        Ok(ElementorWidget::widget(ctx.next_id(), "social-icons", settings))
    }
}

fn network_icon(href: &str) -> Option<&'static str> {
    let host = href
        .split("://")
        .nth(1)
        .unwrap_or(href)
        .split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();
    NETWORKS
        .iter()
        .find(|(domain, _)| host == *domain || host.ends_with(&format!(".{domain}")))
        .map(|(_, icon)| *icon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ElementorExporter;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    fn export_one(
        snap: &crate::PageSnapshot,
        t: ComponentType,
        node: NodeId,
    ) -> ElementorWidget {
        let exporter = ElementorExporter::default();
        let mut ctx = ExportContext::new(snap, &exporter);
        exporter
            .map_component(&RecognizedComponent::new(t, 90, node), &mut ctx)
            .unwrap()
    }

    #[test]
    fn test_heading_keeps_level_and_link() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let h = b.root("h3");
        b.style(h, "text-align", "center");
        let a = b.child(h, "a");
        b.attr(a, "href", "/about").text(a, "About us");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Heading, h);
        assert_eq!(w.settings["title"], "About us");
        assert_eq!(w.settings["header_size"], "h3");
        assert_eq!(w.settings["link"]["url"], "/about");
        assert_eq!(w.settings["link"]["is_external"], "");
        assert_eq!(w.settings["align"], "center");
    }

    #[test]
    fn test_list_becomes_editor_markup() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let ol = b.root("ol");
        for t in ["One", "Two & three"] {
            let li = b.child(ol, "li");
            b.text(li, t);
        }
        let snap = b.build();
        let w = export_one(&snap, ComponentType::List, ol);
        assert_eq!(w.widget_type.as_deref(), Some("text-editor"));
        assert_eq!(w.settings["editor"], "<ol><li>One</li><li>Two &amp; three</li></ol>");
    }

    #[test]
    fn test_button_defaults() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let button = b.root("button");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Button, button);
        assert_eq!(w.settings["text"], "Click here");
        assert_eq!(w.settings["size"], "sm");
        assert!(w.settings.get("link").is_none());
    }

    #[test]
    fn test_blockquote_splits_author() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let q = b.root("blockquote");
        let p = b.child(q, "p");
        b.text(p, "Simplicity is prerequisite for reliability.");
        let cite = b.child(q, "cite");
        b.text(cite, "— Edsger Dijkstra");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Blockquote, q);
        assert_eq!(w.settings["blockquote_content"], "Simplicity is prerequisite for reliability.");
        assert_eq!(w.settings["author_name"], "Edsger Dijkstra");
    }

    #[test]
    fn test_social_icons_by_host() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let ul = b.root("ul");
        for href in ["https://www.facebook.com/acme", "https://x.com/acme", "https://acme.example/rss"] {
            let li = b.child(ul, "li");
            let a = b.child(li, "a");
            b.attr(a, "href", href);
        }
        let snap = b.build();
        let w = export_one(&snap, ComponentType::SocialIcons, ul);
        let list = w.settings["social_icon_list"].as_array().unwrap();
        let icons: Vec<&str> = list
            .iter()
            .map(|e| e["social_icon"]["value"].as_str().unwrap())
            .collect();
        assert_eq!(icons, vec!["fab fa-facebook", "fab fa-x-twitter", "fas fa-link"]);
        assert_eq!(list[0]["link"]["is_external"], "on");
    }

    #[test]
    fn test_icon_list_reads_font_awesome_classes() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let ul = b.root("ul");
        let li = b.child(ul, "li");
        let i = b.child(li, "i");
        b.class(i, "fab fa-rust");
        b.text(li, "Memory safe");
        let li2 = b.child(ul, "li");
        b.text(li2, "Fast");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::IconList, ul);
        let list = w.settings["icon_list"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["selected_icon"]["value"], "fab fa-rust");
        assert_eq!(list[0]["selected_icon"]["library"], "fa-brands");
        assert_eq!(list[1]["selected_icon"]["value"], "fas fa-check");
        assert_ne!(list[0]["_id"], list[1]["_id"]);
    }
}
