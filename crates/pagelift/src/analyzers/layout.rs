//! Row, section and sidebar analyzers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::select;
use crate::accessor::{parse_px, AccessResult, ElementView, PageAccessor};
use crate::types::NodeId;

// ── Row ──────────────────────────────────────────────────────────────────────

/// Horizontal arrangement of a row's children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowAnalysis {
    pub child_count: usize,
    /// `justify-content`; `flex-start` when unset or `normal`.
    pub justify_content: String,
    /// `align-items`; `stretch` when unset or `normal`.
    pub align_items: String,
    /// Column gap in px; `0` when unset or not in px.
    pub gap_px: f64,
    /// Row or children use a responsive grid class convention
    /// (`col-md-6`, `row-cols-3`, `md:…`, `grid-cols-4`, …).
    pub responsive_grid: bool,
}

impl Default for RowAnalysis {
    fn default() -> Self {
        Self {
            child_count: 0,
            justify_content: "flex-start".into(),
            align_items: "stretch".into(),
            gap_px: 0.0,
            responsive_grid: false,
        }
    }
}

fn responsive_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(^|\s)(row-cols-\d|col-(xs|sm|md|lg|xl|xxl)-\d+|(sm|md|lg|xl|2xl):\S|grid-cols-\d|elementor-col-\d+|is-stacked-on-mobile|wp-block-columns)",
        )
        .expect("responsive class regex is valid")
    })
}

pub(super) fn analyze_row(page: &dyn PageAccessor, node: NodeId) -> AccessResult<RowAnalysis> {
    let view = ElementView::read(page, node)?;
    let defaults = RowAnalysis::default();

    let justify_content = keyword_or(view.style.get("justify-content"), &defaults.justify_content);
    let align_items = keyword_or(view.style.get("align-items"), &defaults.align_items);
    let gap_px = view
        .style
        .get("column-gap")
        .or_else(|| view.style.get("gap"))
        .and_then(|g| g.split_whitespace().last().and_then(parse_px))
        .unwrap_or(0.0);

    let re = responsive_class_re();
    let mut responsive_grid = re.is_match(view.class_attr());
    for child in &view.children {
        if responsive_grid {
            break;
        }
        if let Ok(Some(class)) = page.attribute(*child, "class") {
            responsive_grid = re.is_match(&class);
        }
    }

    Ok(RowAnalysis {
        child_count: view.children.len(),
        justify_content,
        align_items,
        gap_px,
        responsive_grid,
    })
}

fn keyword_or(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() && v != "normal" => v.to_string(),
        _ => fallback.to_string(),
    }
}

// ── Section ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAnalysis {
    /// At least 90% of the viewport wide.
    pub full_width: bool,
    /// `min-height` in px, when set in px.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// URL from the first `url(...)` in `background-image`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
}

pub(super) fn analyze_section(
    page: &dyn PageAccessor,
    node: NodeId,
) -> AccessResult<SectionAnalysis> {
    let view = ElementView::read(page, node)?;
    Ok(SectionAnalysis {
        full_width: !view.rect.is_empty() && view.rect.width >= view.viewport.width * 0.9,
        min_height: view.style.px("min-height").filter(|h| *h > 0.0),
        background_color: visible_color(view.style.get("background-color")),
        background_image: view.style.get("background-image").and_then(css_url),
    })
}

/// `None` for unset or fully transparent colors.
pub(crate) fn visible_color(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    let transparent = value.is_empty()
        || value.eq_ignore_ascii_case("transparent")
        || value.replace(' ', "") == "rgba(0,0,0,0)";
    (!transparent).then(|| value.to_string())
}

/// First `url(...)` argument, unquoted.
pub(crate) fn css_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + "url(".len();
    let end = start + value[start..].find(')')?;
    let url = value[start..end].trim().trim_matches(|c| c == '"' || c == '\'');
    (!url.is_empty()).then(|| url.to_string())
}

// ── Sidebar ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SidebarPosition {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarAnalysis {
    /// Left when the horizontal midpoint lies in the left half of the viewport.
    pub position: SidebarPosition,
    pub width: f64,
    pub height: f64,
    /// `.widget`-style blocks, else direct children.
    pub widget_count: usize,
    /// `position: sticky` or `fixed`.
    pub sticky: bool,
}

pub(super) fn analyze_sidebar(
    page: &dyn PageAccessor,
    node: NodeId,
) -> AccessResult<SidebarAnalysis> {
    let view = ElementView::read(page, node)?;
    let position = if view.rect.center_x() < view.viewport.width / 2.0 {
        SidebarPosition::Left
    } else {
        SidebarPosition::Right
    };
    let widgets = select(page, node, ".widget, .wp-block-group, section");
    let widget_count = if widgets.is_empty() {
        view.children.len()
    } else {
        widgets.len()
    };

    Ok(SidebarAnalysis {
        position,
        width: view.rect.width,
        height: view.rect.height,
        widget_count,
        sticky: view.style.is("position", "sticky") || view.style.is("position", "fixed"),
    })
}
