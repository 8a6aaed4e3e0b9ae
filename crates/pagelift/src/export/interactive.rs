//! Interactive and composite widgets.

use regex::Regex;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;

use super::{escape_html, link_value, media_value, size_value, yes_no, ElementorWidget, ExportContext, WidgetMapper};
use crate::types::{ComponentType, NodeId, PageliftResult, RecognizedComponent};

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[$€£¥]\s?\d[\d.,]*|\d[\d.,]*\s?(?:[$€£¥]|USD|EUR|GBP)\b")
            .expect("price regex is valid")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").expect("number regex is valid"))
}

fn rating_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(?:out of|/|of)\s*(\d+)")
            .expect("rating label regex is valid")
    })
}

fn paragraph(text: &str) -> String {
    format!("<p>{}</p>", escape_html(text))
}

fn icon(value: &str, library: &str) -> Value {
    json!({ "value": value, "library": library })
}

/// Finite number with thousands separators removed. `NaN` and `inf` parse
/// as `f64` but serialize as `null`, so they are rejected.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

// ── Alert ────────────────────────────────────────────────────────────────────

/// `alert`: type from the class (`info` otherwise), title from a heading or
/// `<strong>`, dismiss button shown when a close control exists.
pub struct AlertMapper;

impl WidgetMapper for AlertMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Alert
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let classes = ctx.classes(node).join(" ");
        let alert_type = if classes.contains("success") {
            "success"
        } else if classes.contains("warning") {
            "warning"
        } else if classes.contains("danger") || classes.contains("error") {
            "danger"
        } else {
            "info"
        };

        let title = ctx
            .text_of(node, ".alert-title, .alert-heading, h1, h2, h3, h4, h5, h6, strong")
            .unwrap_or_default();
        let description = ctx
            .text_of(node, ".alert-description, .alert-body, p")
            .unwrap_or_else(|| {
                let full = ctx.text(node);
                full.strip_prefix(title.as_str())
                    .map(|rest| rest.trim().to_string())
                    .unwrap_or(full)
            });
        let dismissible = ctx.has(
            node,
            ".close, .btn-close, .dismiss, [data-dismiss], [data-bs-dismiss], [aria-label*=close], [aria-label*=Close]",
        );

        let mut settings = Map::new();
        settings.insert("alert_type".into(), json!(alert_type));
        settings.insert("alert_title".into(), json!(title));
        settings.insert("alert_description".into(), json!(description));
        settings.insert("show_dismiss".into(), json!(if dismissible { "show" } else { "hide" }));
        Ok(ElementorWidget::widget(ctx.next_id(), "alert", settings))
    }
}

// ── Tabs ─────────────────────────────────────────────────────────────────────

/// `tabs`: titles from the tabs analysis, contents from tab panels in order.
/// Missing titles become `Tab N`.
pub struct TabsMapper;

impl WidgetMapper for TabsMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Tabs
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let analysis = ctx.analysis(component).as_tabs().cloned().unwrap_or_default();

        let mut panels = ctx.select(node, "[role=tabpanel]");
        if panels.is_empty() {
            panels = ctx.select(node, ".tab-pane, .tab-panel, .tab-content > div");
        }
        let contents: Vec<String> = panels.iter().map(|p| ctx.text(*p)).collect();

        let count = analysis.titles.len().max(contents.len());
        let mut tabs = Vec::with_capacity(count);
        for i in 0..count {
            let title = analysis
                .titles
                .get(i)
                .filter(|t| !t.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("Tab {}", i + 1));
            let content = contents.get(i).map(|c| paragraph(c)).unwrap_or_default();
            tabs.push(json!({
                "_id": ctx.next_id(),
                "tab_title": title,
                "tab_content": content,
            }));
        }

        let mut settings = Map::new();
        settings.insert("tabs".into(), Value::Array(tabs));
        settings.insert(
            "type".into(),
            json!(if analysis.vertical { "vertical" } else { "horizontal" }),
        );
        Ok(ElementorWidget::widget(ctx.next_id(), "tabs", settings))
    }
}

// ── Toggle / accordion ───────────────────────────────────────────────────────

const ITEM_SELECTOR: &str = ".accordion-item, .toggle-item, .faq-item";
const ITEM_TITLE_SELECTOR: &str =
    ".accordion-header, .accordion-button, .accordion-title, .toggle-title, .faq-question, button, h3, h4, h5";
const ITEM_BODY_SELECTOR: &str =
    ".accordion-body, .accordion-content, .accordion-collapse, .toggle-content, .faq-answer, .collapse, p";

/// `toggle` and `accordion`: one item per `<details>` (summary as title) or
/// per item class convention. With neither, the whole element is one item.
pub struct DisclosureMapper {
    pub accordion: bool,
}

impl DisclosureMapper {
    fn details_item(ctx: &ExportContext<'_>, details: NodeId) -> (String, String) {
        let title = ctx.text_of(details, "summary").unwrap_or_default();
        let body = ctx
            .children(details)
            .into_iter()
            .filter(|c| ctx.tag(*c) != "summary")
            .map(|c| ctx.text(c))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        (title, body)
    }

    fn items(ctx: &ExportContext<'_>, node: NodeId) -> Vec<(String, String)> {
        if ctx.tag(node) == "details" {
            return vec![Self::details_item(ctx, node)];
        }
        let details = ctx.select(node, "details");
        if !details.is_empty() {
            return details.into_iter().map(|d| Self::details_item(ctx, d)).collect();
        }
        let items = ctx.select(node, ITEM_SELECTOR);
        if !items.is_empty() {
            return items
                .into_iter()
                .map(|item| {
                    (
                        ctx.text_of(item, ITEM_TITLE_SELECTOR).unwrap_or_default(),
                        ctx.text_of(item, ITEM_BODY_SELECTOR).unwrap_or_default(),
                    )
                })
                .collect();
        }
        vec![(
            ctx.text_of(node, ITEM_TITLE_SELECTOR).unwrap_or_default(),
            ctx.text_of(node, ITEM_BODY_SELECTOR)
                .unwrap_or_else(|| ctx.text(node)),
        )]
    }
}

impl WidgetMapper for DisclosureMapper {
    fn component_type(&self) -> ComponentType {
        if self.accordion {
            ComponentType::Accordion
        } else {
            ComponentType::Toggle
        }
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let items = Self::items(ctx, component.element);

        let mut tabs = Vec::with_capacity(items.len());
        for (i, (title, body)) in items.into_iter().enumerate() {
            let title = if title.is_empty() {
                format!("Item {}", i + 1)
            } else {
                title
            };
            tabs.push(json!({
                "_id": ctx.next_id(),
                "tab_title": title,
                "tab_content": paragraph(&body),
            }));
        }

        let mut settings = Map::new();
        settings.insert("tabs".into(), Value::Array(tabs));
        settings.insert("selected_icon".into(), icon("fas fa-plus", "fa-solid"));
        settings.insert("selected_active_icon".into(), icon("fas fa-minus", "fa-solid"));
        settings.insert("title_html_tag".into(), json!("div"));
        let widget_type = if self.accordion { "accordion" } else { "toggle" };
        Ok(ElementorWidget::widget(ctx.next_id(), widget_type, settings))
    }
}

// ── Posts ────────────────────────────────────────────────────────────────────

/// Elementor's posts-per-page default, used when no post was found.
const DEFAULT_POSTS_PER_PAGE: usize = 6;

/// `posts` (classic skin) from the posts-grid analysis.
pub struct PostsMapper;

impl WidgetMapper for PostsMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::PostsGrid
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let analysis = ctx
            .analysis(component)
            .as_posts_grid()
            .cloned()
            .unwrap_or_default();
        let per_page = if analysis.post_count == 0 {
            DEFAULT_POSTS_PER_PAGE
        } else {
            analysis.post_count
        };

        let mut settings = Map::new();
        settings.insert("_skin".into(), json!("classic"));
        settings.insert("posts_post_type".into(), json!("post"));
        settings.insert("classic_columns".into(), json!(analysis.column_count.to_string()));
        settings.insert("classic_posts_per_page".into(), json!(per_page));
        settings.insert("classic_show_title".into(), yes_no(true));
        settings.insert("classic_show_excerpt".into(), yes_no(analysis.has_excerpt));
        settings.insert(
            "classic_thumbnail".into(),
            json!(if analysis.has_featured_image { "top" } else { "none" }),
        );
        Ok(ElementorWidget::widget(ctx.next_id(), "posts", settings))
    }
}

// ── Price list ───────────────────────────────────────────────────────────────

/// `price-list`: one entry per list item. The price is the first currency
/// amount in the item; the title is a name-like element or the remaining
/// text.
pub struct PriceListMapper;

impl WidgetMapper for PriceListMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::PriceList
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let mut items = ctx.select(node, "li, .item, .price-list-item, .menu-item");
        if items.is_empty() {
            items = ctx.children(node);
        }

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let text = ctx.text(item);
            let price = price_re()
                .find(&text)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default();
            let title = ctx
                .text_of(item, ".title, .name, .item-title, h3, h4, h5, strong, dt")
                .unwrap_or_else(|| text.replace(&price, "").trim().to_string());
            let description = ctx
                .text_of(item, ".description, .item-description, p, dd, small")
                .unwrap_or_default();
            let image = ctx
                .select_first(item, "img")
                .and_then(|img| ctx.image_url(img))
                .unwrap_or_default();

            let mut entry = json!({
                "_id": ctx.next_id(),
                "title": title,
                "price": price,
                "item_description": description,
                "image": media_value(&image, None),
            });
            if let Some(href) = ctx.link_of(item) {
                entry["link"] = link_value(&href);
            }
            entries.push(entry);
        }

        let mut settings = Map::new();
        settings.insert("price_list".into(), Value::Array(entries));
        Ok(ElementorWidget::widget(ctx.next_id(), "price-list", settings))
    }
}

// ── Star rating ──────────────────────────────────────────────────────────────

/// `star-rating`: value from `data-rating`/`data-score`/`aria-valuenow`, an
/// "N out of M" label, star glyphs or filled-star elements, in that order;
/// 5 of 5 otherwise. Scales above 5 export as 10.
pub struct StarRatingMapper;

impl StarRatingMapper {
    fn rating(ctx: &ExportContext<'_>, node: NodeId) -> (f64, u32, bool) {
        if let Some(v) = ["data-rating", "data-score", "aria-valuenow"]
            .iter()
            .find_map(|a| ctx.attr(node, a).and_then(|v| parse_number(&v)))
        {
            let max = ctx
                .attr(node, "aria-valuemax")
                .and_then(|v| parse_number(&v))
                .unwrap_or(5.0);
            return (v, scale(max), false);
        }

        let label = ctx
            .attr(node, "aria-label")
            .or_else(|| ctx.attr(node, "title"))
            .unwrap_or_else(|| ctx.text(node));
        if let Some(caps) = rating_label_re().captures(&label) {
            let value = caps.get(1).and_then(|m| parse_number(m.as_str()));
            let max = caps.get(2).and_then(|m| parse_number(m.as_str()));
            if let (Some(value), Some(max)) = (value, max) {
                return (value, scale(max), false);
            }
        }

        let text = ctx.text(node);
        let full = text.chars().filter(|c| *c == '★').count();
        if full > 0 || text.contains('☆') {
            return (full as f64, 5, true);
        }

        let filled = ctx
            .select(node, ".filled, .full, .star-full, .star-filled, .fa-star")
            .len();
        if filled > 0 {
            return (filled as f64, 5, false);
        }
        (5.0, 5, false)
    }
}

fn scale(max: f64) -> u32 {
    if max > 5.0 {
        10
    } else {
        5
    }
}

impl WidgetMapper for StarRatingMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::StarRating
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let (rating, scale, unicode) = Self::rating(ctx, node);
        let title = ctx
            .text_of(node, ".rating-title, .rating-label, .title, .label")
            .unwrap_or_default();

        let mut settings = Map::new();
        settings.insert("rating_scale".into(), json!(scale.to_string()));
        settings.insert("rating".into(), json!(rating.clamp(0.0, scale as f64)));
        settings.insert(
            "star_style".into(),
            json!(if unicode { "star_unicode" } else { "star_fontawesome" }),
        );
        settings.insert("title".into(), json!(title));
        Ok(ElementorWidget::widget(ctx.next_id(), "star-rating", settings))
    }
}

// ── Testimonial ──────────────────────────────────────────────────────────────

/// `testimonial`: quote, author name and job, optional avatar.
pub struct TestimonialMapper;

impl WidgetMapper for TestimonialMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Testimonial
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let content = ctx
            .text_of(node, "blockquote, .testimonial-content, .testimonial-text, q, p")
            .unwrap_or_else(|| ctx.text(node));
        let name = ctx
            .text_of(node, ".testimonial-name, .name, .author, cite, strong")
            .map(|n| n.trim_start_matches(['—', '-']).trim().to_string())
            .unwrap_or_default();
        let job = ctx
            .text_of(node, ".testimonial-job, .job, .position, .role, .company, small")
            .unwrap_or_default();

        let mut settings = Map::new();
        settings.insert("testimonial_content".into(), json!(content));
        settings.insert("testimonial_name".into(), json!(name));
        settings.insert("testimonial_job".into(), json!(job));
        if let Some(img) = ctx.select_first(node, "img") {
            let url = ctx.image_url(img).unwrap_or_default();
            let alt = ctx.attr(img, "alt");
            settings.insert("testimonial_image".into(), media_value(&url, alt.as_deref()));
            settings.insert("testimonial_image_position".into(), json!("aside"));
        }
        Ok(ElementorWidget::widget(ctx.next_id(), "testimonial", settings))
    }
}

// ── Counter ──────────────────────────────────────────────────────────────────

/// `counter`: counts from 0 to the `data-count`/`data-to`/`data-target`
/// value or the first number in the text. Symbols around the number become
/// prefix and suffix; the remaining text is the title. Duration 2000ms.
pub struct CounterMapper;

impl WidgetMapper for CounterMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Counter
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let number_node = if ctx.attr(node, "data-count").is_some() {
            node
        } else {
            ctx.select_first(node, "[data-count], [data-to], [data-target], .counter-number, .count, .number")
                .unwrap_or(node)
        };
        let number_text = ctx.text(number_node);

        let (prefix, raw_number, suffix) = match number_re().find(&number_text) {
            Some(m) => {
                let prefix = number_text[..m.start()].trim().to_string();
                let suffix: String = number_text[m.end()..]
                    .chars()
                    .take_while(|c| !c.is_whitespace() && !c.is_alphanumeric())
                    .collect();
                (prefix, m.as_str().to_string(), suffix)
            }
            None => (String::new(), String::new(), String::new()),
        };
        let ending = ["data-count", "data-to", "data-target"]
            .iter()
            .find_map(|a| ctx.attr(number_node, a).and_then(|v| parse_number(&v)))
            .or_else(|| parse_number(&raw_number))
            .unwrap_or(0.0);

        let title = ctx
            .text_of(node, ".counter-title, .title, .label, p")
            .unwrap_or_else(|| {
                let full = ctx.text(node);
                let consumed = format!("{prefix}{raw_number}{suffix}");
                full.replacen(&consumed, "", 1).trim().to_string()
            });

        let mut settings = Map::new();
        settings.insert("starting_number".into(), json!(0));
        settings.insert("ending_number".into(), json!(ending));
        settings.insert("prefix".into(), json!(prefix));
        settings.insert("suffix".into(), json!(suffix));
        settings.insert("duration".into(), json!(2000));
        settings.insert("thousand_separator".into(), yes_no(raw_number.contains(',')));
        settings.insert("title".into(), json!(title));
        Ok(ElementorWidget::widget(ctx.next_id(), "counter", settings))
    }
}

// ── Progress bar ─────────────────────────────────────────────────────────────

/// `progress`: percent from `<progress value max>`, `aria-valuenow`, a
/// `data-percent`/`data-width` attribute or a `%` width on the bar; clamped
/// to 0..=100, 0 otherwise.
pub struct ProgressMapper;

impl ProgressMapper {
    fn percent(ctx: &ExportContext<'_>, node: NodeId) -> f64 {
        let bar = ctx
            .select_first(node, "[role=progressbar], progress, .progress-bar, .bar, .fill")
            .unwrap_or(node);
        for candidate in [node, bar] {
            let max = ["max", "aria-valuemax"]
                .iter()
                .find_map(|a| ctx.attr(candidate, a).and_then(|v| parse_number(&v)))
                .filter(|m| *m > 0.0)
                .unwrap_or(100.0);
            if let Some(value) = ["value", "aria-valuenow"]
                .iter()
                .find_map(|a| ctx.attr(candidate, a).and_then(|v| parse_number(&v)))
            {
                return value / max * 100.0;
            }
            if let Some(value) = ["data-percent", "data-width", "data-value"]
                .iter()
                .find_map(|a| ctx.attr(candidate, a).and_then(|v| parse_number(v.trim_end_matches('%'))))
            {
                return value;
            }
            if let Some(width) = ctx.style(candidate).get("width").and_then(|w| w.strip_suffix('%')) {
                if let Some(value) = parse_number(width) {
                    return value;
                }
            }
        }
        0.0
    }
}

impl WidgetMapper for ProgressMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::ProgressBar
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let percent = Self::percent(ctx, node).clamp(0.0, 100.0).round();
        let title = ctx
            .text_of(node, ".progress-title, .skill-name, .title, .label")
            .or_else(|| ctx.attr(node, "aria-label"))
            .unwrap_or_default();
        let inner_text = ctx
            .text_of(node, ".progress-text, .inner-text")
            .unwrap_or_default();

        let mut settings = Map::new();
        settings.insert("title".into(), json!(title));
        settings.insert("percent".into(), size_value(percent, "%"));
        settings.insert("display_percentage".into(), json!("show"));
        settings.insert("inner_text".into(), json!(inner_text));
        Ok(ElementorWidget::widget(ctx.next_id(), "progress", settings))
    }
}

// ── Nav menu ─────────────────────────────────────────────────────────────────

/// `nav-menu`: layout from orientation, plus the top-level links as
/// `menu_items` for recreating the menu.
pub struct NavMenuMapper;

impl WidgetMapper for NavMenuMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::NavMenu
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let list = ctx.select_first(node, "ul").unwrap_or(node);
        let style = ctx.style(list);
        let vertical = ctx.has_class_containing(node, "vertical")
            || ctx.attr(node, "aria-orientation").as_deref() == Some("vertical")
            || style.is("flex-direction", "column");
        let align = match style.get("justify-content") {
            Some("center") => "center",
            Some("flex-end") | Some("end") | Some("right") => "right",
            Some("space-between") | Some("space-around") | Some("space-evenly") => "justify",
            _ => "left",
        };

        let mut links = ctx.select(list, "li > a");
        if links.is_empty() {
            links = ctx.select(list, "a");
        }
        let mut menu_items = Vec::with_capacity(links.len());
        for a in links {
            let text = ctx.text(a);
            if text.is_empty() {
                continue;
            }
            let href = ctx.attr(a, "href").unwrap_or_else(|| "#".to_string());
            menu_items.push(json!({
                "_id": ctx.next_id(),
                "text": text,
                "link": link_value(&href),
            }));
        }

        let menu_name = ctx
            .attr(node, "aria-label")
            .unwrap_or_else(|| "Main Menu".to_string());
        let mut settings = Map::new();
        settings.insert("menu_name".into(), json!(menu_name));
        settings.insert(
            "layout".into(),
            json!(if vertical { "vertical" } else { "horizontal" }),
        );
        settings.insert("align_items".into(), json!(align));
        settings.insert("pointer".into(), json!("underline"));
        settings.insert("dropdown".into(), json!("tablet"));
        settings.insert("toggle".into(), json!("burger"));
        settings.insert("menu_items".into(), Value::Array(menu_items));
        Ok(ElementorWidget::widget(ctx.next_id(), "nav-menu", settings))
    }
}

// ── Form ─────────────────────────────────────────────────────────────────────

/// Input types Elementor forms support directly; others map to `text`.
const FIELD_TYPES: [&str; 10] = [
    "text", "email", "tel", "url", "number", "date", "time", "password", "checkbox", "radio",
];

/// `form`: one field per visible input, textarea or select. Labels come from
/// `label[for]`, `aria-label` or the placeholder; the submit text defaults
/// to `Send`.
pub struct FormMapper;

impl FormMapper {
    fn label(ctx: &ExportContext<'_>, form: NodeId, field: NodeId) -> String {
        let by_for = ctx
            .attr(field, "id")
            .filter(|id| !id.contains('\''))
            .and_then(|id| ctx.text_of(form, &format!("label[for='{id}']")));
        by_for
            .or_else(|| ctx.attr(field, "aria-label"))
            .or_else(|| ctx.attr(field, "placeholder"))
            .unwrap_or_default()
    }
}

impl WidgetMapper for FormMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Form
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let mut fields = Vec::new();
        for (i, field) in ctx.select(node, "input, textarea, select").into_iter().enumerate() {
            let tag = ctx.tag(field);
            let input_type = ctx
                .attr(field, "type")
                .map(|t| t.to_ascii_lowercase())
                .unwrap_or_else(|| "text".to_string());
            if tag == "input" && matches!(input_type.as_str(), "hidden" | "submit" | "button" | "reset" | "image") {
                continue;
            }
            let field_type = match tag.as_str() {
                "textarea" => "textarea",
                "select" => "select",
                _ if FIELD_TYPES.contains(&input_type.as_str()) => input_type.as_str(),
                _ => "text",
            }
            .to_string();

            let custom_id = ctx
                .attr(field, "name")
                .or_else(|| ctx.attr(field, "id"))
                .unwrap_or_else(|| format!("field_{}", i + 1));
            let required = ctx.page.attribute(field, "required").ok().flatten().is_some()
                || ctx.attr(field, "aria-required").as_deref() == Some("true");

            let mut entry = json!({
                "_id": ctx.next_id(),
                "custom_id": custom_id,
                "field_type": field_type,
                "field_label": Self::label(ctx, node, field),
                "placeholder": ctx.attr(field, "placeholder").unwrap_or_default(),
                "required": if required { "true" } else { "" },
                "width": "100",
            });
            if tag == "select" {
                let options = ctx
                    .select(field, "option")
                    .into_iter()
                    .map(|o| ctx.text(o))
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                entry["field_options"] = json!(options);
            }
            fields.push(entry);
        }

        let button_text = ctx
            .select_first(node, "button[type=submit], input[type=submit], button")
            .and_then(|b| {
                Some(ctx.text(b))
                    .filter(|t| !t.is_empty())
                    .or_else(|| ctx.attr(b, "value"))
            })
            .unwrap_or_else(|| "Send".to_string());
        let form_name = ["name", "id", "aria-label"]
            .iter()
            .find_map(|a| ctx.attr(node, a))
            .unwrap_or_else(|| "New Form".to_string());

        let mut settings = Map::new();
        settings.insert("form_name".into(), json!(form_name));
        settings.insert("form_fields".into(), Value::Array(fields));
        settings.insert("button_text".into(), json!(button_text));
        Ok(ElementorWidget::widget(ctx.next_id(), "form", settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ElementorExporter;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    fn export_one(snap: &crate::PageSnapshot, t: ComponentType, node: NodeId) -> ElementorWidget {
        let exporter = ElementorExporter::default();
        let mut ctx = ExportContext::new(snap, &exporter);
        exporter
            .map_component(&RecognizedComponent::new(t, 90, node), &mut ctx)
            .unwrap()
    }

    #[test]
    fn test_alert_type_and_dismiss() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "alert alert-warning").attr(root, "role", "alert");
        let strong = b.child(root, "strong");
        b.text(strong, "Heads up");
        let p = b.child(root, "p");
        b.text(p, "Maintenance tonight.");
        let close = b.child(root, "button");
        b.class(close, "btn-close");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Alert, root);
        assert_eq!(w.settings["alert_type"], "warning");
        assert_eq!(w.settings["alert_title"], "Heads up");
        assert_eq!(w.settings["alert_description"], "Maintenance tonight.");
        assert_eq!(w.settings["show_dismiss"], "show");
    }

    #[test]
    fn test_alert_defaults_to_info() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "notice").text(root, "Saved");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Alert, root);
        assert_eq!(w.settings["alert_type"], "info");
        assert_eq!(w.settings["alert_description"], "Saved");
        assert_eq!(w.settings["show_dismiss"], "hide");
    }

    #[test]
    fn test_tabs_pair_titles_with_panels() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        let list = b.child(root, "div");
        b.attr(list, "role", "tablist");
        for title in ["Overview", "Specs"] {
            let tab = b.child(list, "button");
            b.attr(tab, "role", "tab").text(tab, title);
        }
        for body in ["Fast & small.", "42 cores."] {
            let panel = b.child(root, "div");
            b.attr(panel, "role", "tabpanel").text(panel, body);
        }
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Tabs, root);
        let tabs = w.settings["tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[0]["tab_title"], "Overview");
        assert_eq!(tabs[0]["tab_content"], "<p>Fast &amp; small.</p>");
        assert_eq!(w.settings["type"], "horizontal");
    }

    #[test]
    fn test_accordion_from_details() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        for (q, a) in [("Shipping?", "Worldwide."), ("Returns?", "30 days.")] {
            let d = b.child(root, "details");
            let s = b.child(d, "summary");
            b.text(s, q);
            let p = b.child(d, "p");
            b.text(p, a);
        }
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Accordion, root);
        assert_eq!(w.widget_type.as_deref(), Some("accordion"));
        let tabs = w.settings["tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1]["tab_title"], "Returns?");
        assert_eq!(tabs[1]["tab_content"], "<p>30 days.</p>");
    }

    #[test]
    fn test_single_details_is_a_toggle() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let d = b.root("details");
        let s = b.child(d, "summary");
        b.text(s, "More");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Toggle, d);
        assert_eq!(w.widget_type.as_deref(), Some("toggle"));
        assert_eq!(w.settings["tabs"][0]["tab_title"], "More");
    }

    #[test]
    fn test_posts_from_analysis() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let grid = b.root("div");
        b.class(grid, "blog-grid columns-2");
        for _ in 0..4 {
            let article = b.child(grid, "article");
            b.child(article, "img");
        }
        let snap = b.build();
        let w = export_one(&snap, ComponentType::PostsGrid, grid);
        assert_eq!(w.widget_type.as_deref(), Some("posts"));
        assert_eq!(w.settings["classic_columns"], "2");
        assert_eq!(w.settings["classic_posts_per_page"], 4);
        assert_eq!(w.settings["classic_thumbnail"], "top");
        assert_eq!(w.settings["classic_show_excerpt"], "");
    }

    #[test]
    fn test_price_list_items() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let ul = b.root("ul");
        b.class(ul, "price-list");
        for (name, price) in [("Espresso", "$2.50"), ("Latte", "$3.75")] {
            let li = b.child(ul, "li");
            let n = b.child(li, "span");
            b.class(n, "name").text(n, name);
            let p = b.child(li, "span");
            b.text(p, price);
        }
        let snap = b.build();
        let w = export_one(&snap, ComponentType::PriceList, ul);
        let items = w.settings["price_list"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Espresso");
        assert_eq!(items[0]["price"], "$2.50");
        assert_eq!(items[1]["price"], "$3.75");
    }

    #[test]
    fn test_star_rating_sources() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        let labelled = b.child(root, "div");
        b.attr(labelled, "aria-label", "Rated 4.5 out of 5");
        let glyphs = b.child(root, "span");
        b.text(glyphs, "★★★☆☆");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::StarRating, labelled);
        assert_eq!(w.settings["rating"], 4.5);
        assert_eq!(w.settings["rating_scale"], "5");
        assert_eq!(w.settings["star_style"], "star_fontawesome");

        let w = export_one(&snap, ComponentType::StarRating, glyphs);
        assert_eq!(w.settings["rating"], 3.0);
        assert_eq!(w.settings["star_style"], "star_unicode");
    }

    #[test]
    fn test_testimonial_parts() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let fig = b.root("figure");
        let q = b.child(fig, "blockquote");
        b.text(q, "Changed how we ship.");
        let img = b.child(fig, "img");
        b.attr(img, "src", "/ana.jpg").attr(img, "alt", "Ana");
        let cite = b.child(fig, "cite");
        b.text(cite, "— Ana Ruiz");
        let role = b.child(fig, "small");
        b.text(role, "CTO, Acme");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Testimonial, fig);
        assert_eq!(w.settings["testimonial_content"], "Changed how we ship.");
        assert_eq!(w.settings["testimonial_name"], "Ana Ruiz");
        assert_eq!(w.settings["testimonial_job"], "CTO, Acme");
        assert_eq!(w.settings["testimonial_image"]["url"], "/ana.jpg");
    }

    #[test]
    fn test_counter_prefix_suffix_and_title() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "counter");
        let n = b.child(root, "span");
        b.class(n, "number").text(n, "1,200+");
        let t = b.child(root, "p");
        b.text(t, "Happy clients");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Counter, root);
        assert_eq!(w.settings["ending_number"], 1200.0);
        assert_eq!(w.settings["suffix"], "+");
        assert_eq!(w.settings["prefix"], "");
        assert_eq!(w.settings["title"], "Happy clients");
        assert_eq!(w.settings["thousand_separator"], "yes");
        assert_eq!(w.settings["starting_number"], 0);
    }

    #[test]
    fn test_counter_data_attribute_wins() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("span");
        b.attr(root, "data-count", "75").text(root, "0%");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Counter, root);
        assert_eq!(w.settings["ending_number"], 75.0);
        assert_eq!(w.settings["suffix"], "%");
    }

    #[test]
    fn test_non_finite_attributes_fall_through() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        let counter = b.child(root, "span");
        b.attr(counter, "data-count", "NaN").text(counter, "1,200+");
        let rating = b.child(root, "div");
        b.attr(rating, "data-rating", "inf")
            .attr(rating, "aria-label", "Rated 4 out of 5");
        let bar = b.child(root, "div");
        b.attr(bar, "aria-valuenow", "-inf")
            .class(bar, "bar")
            .style(bar, "width", "40%");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Counter, counter);
        assert_eq!(w.settings["ending_number"], 1200.0);

        let w = export_one(&snap, ComponentType::StarRating, rating);
        assert_eq!(w.settings["rating"], 4.0);

        assert!(parse_number("NaN").is_none());
        assert!(parse_number("infinity").is_none());
        assert_eq!(parse_number(" 1,500 "), Some(1500.0));
        let w = export_one(&snap, ComponentType::ProgressBar, bar);
        assert_eq!(w.settings["percent"]["size"], 40.0);
    }

    #[test]
    fn test_progress_percent_sources() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        let native = b.child(root, "progress");
        b.attr(native, "value", "3").attr(native, "max", "4");
        let styled = b.child(root, "div");
        b.class(styled, "skill-bar");
        let title = b.child(styled, "span");
        b.class(title, "skill-name").text(title, "Rust");
        let bar = b.child(styled, "div");
        b.class(bar, "bar").style(bar, "width", "85%");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::ProgressBar, native);
        assert_eq!(w.widget_type.as_deref(), Some("progress"));
        assert_eq!(w.settings["percent"]["size"], 75.0);

        let w = export_one(&snap, ComponentType::ProgressBar, styled);
        assert_eq!(w.settings["percent"]["size"], 85.0);
        assert_eq!(w.settings["title"], "Rust");
    }

    #[test]
    fn test_nav_menu_items() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let nav = b.root("nav");
        b.attr(nav, "aria-label", "Primary");
        let ul = b.child(nav, "ul");
        b.style(ul, "flex-direction", "column");
        for (text, href) in [("Home", "/"), ("Blog", "/blog")] {
            let li = b.child(ul, "li");
            let a = b.child(li, "a");
            b.attr(a, "href", href).text(a, text);
        }
        let snap = b.build();

        let w = export_one(&snap, ComponentType::NavMenu, nav);
        assert_eq!(w.settings["menu_name"], "Primary");
        assert_eq!(w.settings["layout"], "vertical");
        let items = w.settings["menu_items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["link"]["url"], "/blog");
    }

    #[test]
    fn test_form_fields() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let form = b.root("form");
        b.attr(form, "id", "contact");
        let label = b.child(form, "label");
        b.attr(label, "for", "email").text(label, "Your email");
        let email = b.child(form, "input");
        b.attr(email, "type", "email")
            .attr(email, "id", "email")
            .attr(email, "name", "email")
            .attr(email, "required", "");
        let msg = b.child(form, "textarea");
        b.attr(msg, "placeholder", "Message");
        let hidden = b.child(form, "input");
        b.attr(hidden, "type", "hidden");
        let submit = b.child(form, "button");
        b.attr(submit, "type", "submit").text(submit, "Get in touch");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::Form, form);
        assert_eq!(w.settings["form_name"], "contact");
        assert_eq!(w.settings["button_text"], "Get in touch");
        let fields = w.settings["form_fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["field_type"], "email");
        assert_eq!(fields[0]["field_label"], "Your email");
        assert_eq!(fields[0]["required"], "true");
        assert_eq!(fields[1]["field_type"], "textarea");
        assert_eq!(fields[1]["custom_id"], "field_2");
        assert_eq!(fields[1]["field_label"], "Message");
    }
}
