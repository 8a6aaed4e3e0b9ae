//! Page region analyzers: footer and header.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::layout::visible_color;
use super::{grid_track_count, has, select, view};
use crate::accessor::{normalize_whitespace, AccessResult, ElementView, PageAccessor};
use crate::patterns::SOCIAL_LINK_SELECTOR;
use crate::types::NodeId;

/// How many levels below the footer to look for the element holding its
/// columns.
const COLUMN_SEARCH_DEPTH: usize = 2;

// ── Footer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterAnalysis {
    pub widget_count: usize,
    pub has_widgets: bool,
    pub social_link_count: usize,
    pub has_social_links: bool,
    /// A subscribe form or an email input.
    pub has_newsletter: bool,
    /// Shortest text block carrying a copyright marker and a year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_text: Option<String>,
    /// Column markers first, then grid tracks; `1` when neither is found.
    pub column_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl Default for FooterAnalysis {
    fn default() -> Self {
        Self {
            widget_count: 0,
            has_widgets: false,
            social_link_count: 0,
            has_social_links: false,
            has_newsletter: false,
            copyright_text: None,
            column_count: 1,
            background_color: None,
            text_color: None,
        }
    }
}

fn copyright_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(©|\(c\)|copyright)(.*\b(19|20)\d{2}\b)|\b(19|20)\d{2}\b.*(©|\(c\)|copyright)")
            .expect("copyright regex is valid")
    })
}

fn column_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(^|\s)(col|column|col-\S+|footer-col\S*|footer-column\S*|widget-column\S*|wp-block-column|elementor-column)(\s|$)",
        )
        .expect("column class regex is valid")
    })
}

pub(super) fn analyze_footer(page: &dyn PageAccessor, node: NodeId) -> AccessResult<FooterAnalysis> {
    let footer = ElementView::read(page, node)?;

    let widget_count = select(page, node, "[class*=widget]").len();
    let social_link_count = select(page, node, SOCIAL_LINK_SELECTOR).len();
    let has_newsletter = has(
        page,
        node,
        "form [type=email], input[type=email], .newsletter, [class*=subscribe], [class*=mailchimp]",
    );

    Ok(FooterAnalysis {
        widget_count,
        has_widgets: widget_count > 0,
        social_link_count,
        has_social_links: social_link_count > 0,
        has_newsletter,
        copyright_text: find_copyright(page, &footer),
        column_count: count_columns(page, &footer),
        background_color: visible_color(footer.style.get("background-color")),
        text_color: footer.style.get("color").map(str::to_string),
    })
}

/// Shortest leaf (or the footer itself) whose text carries the marker.
fn find_copyright(page: &dyn PageAccessor, footer: &ElementView) -> Option<String> {
    let re = copyright_re();
    if !re.is_match(&footer.text) {
        return None;
    }
    let mut best: Option<String> = None;
    for id in select(page, footer.node, "*") {
        let Some(leaf) = view(page, id) else { continue };
        if !leaf.children.is_empty() {
            continue;
        }
        let text = leaf.normalized_text();
        if re.is_match(&text) && best.as_ref().map_or(true, |b| text.len() < b.len()) {
            best = Some(text);
        }
    }
    best.or_else(|| Some(footer.normalized_text()))
}

fn count_columns(page: &dyn PageAccessor, footer: &ElementView) -> usize {
    let mut frontier = vec![footer.node];
    let mut by_marker = 0;
    let mut by_grid = None;

    for _ in 0..=COLUMN_SEARCH_DEPTH {
        let mut next = Vec::new();
        for node in frontier {
            let Some(v) = view(page, node) else { continue };
            let marked = v
                .children
                .iter()
                .filter(|c| {
                    page.attribute(**c, "class")
                        .ok()
                        .flatten()
                        .is_some_and(|class| column_class_re().is_match(&class))
                })
                .count();
            by_marker = by_marker.max(marked);
            if by_grid.is_none() && v.style.is("display", "grid") {
                by_grid = v.style.get("grid-template-columns").and_then(grid_track_count);
            }
            next.extend(v.children);
        }
        frontier = next;
    }

    if by_marker > 0 {
        by_marker
    } else {
        by_grid.unwrap_or(1)
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderAnalysis {
    /// `position: sticky` or `fixed`.
    pub sticky: bool,
    pub has_logo: bool,
    pub has_navigation: bool,
    pub has_search: bool,
    /// Short site title text next to the logo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_title: Option<String>,
}

pub(super) fn analyze_header(page: &dyn PageAccessor, node: NodeId) -> AccessResult<HeaderAnalysis> {
    let header = ElementView::read(page, node)?;
    let site_title = select(page, node, ".site-title, .site-name, .navbar-brand, .logo")
        .into_iter()
        .filter_map(|id| page.text_content(id).ok())
        .map(|t| normalize_whitespace(&t))
        .find(|t| !t.is_empty() && t.len() <= 80);

    Ok(HeaderAnalysis {
        sticky: header.style.is("position", "sticky") || header.style.is("position", "fixed"),
        has_logo: has(
            page,
            node,
            "[class*=logo] img, img[class*=logo], img[alt*=logo], img[alt*=Logo], a[rel=home] img, [class*=logo] svg",
        ),
        has_navigation: has(page, node, "nav, [role=navigation], .menu, .main-nav"),
        has_search: has(
            page,
            node,
            "[role=search], input[type=search], .search-form, [class*=search] input",
        ),
        site_title,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotBuilder;
    use crate::types::Viewport;

    #[test]
    fn test_footer_columns_from_markers() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let footer = b.root("footer");
        b.style(footer, "background-color", "#111").style(footer, "color", "#eee");
        let inner = b.child(footer, "div");
        b.class(inner, "container");
        for _ in 0..4 {
            let col = b.child(inner, "div");
            b.class(col, "footer-col widget");
        }
        let bottom = b.child(footer, "div");
        let p = b.child(bottom, "p");
        b.text(p, "© 2024 Acme Inc. All rights reserved.");
        let social = b.child(bottom, "a");
        b.attr(social, "href", "https://twitter.com/acme");
        let snap = b.build();

        let out = analyze_footer(&snap, footer).unwrap();
        assert_eq!(out.column_count, 4);
        assert_eq!(out.widget_count, 4);
        assert!(out.has_widgets);
        assert_eq!(out.social_link_count, 1);
        assert!(!out.has_newsletter);
        assert_eq!(
            out.copyright_text.as_deref(),
            Some("© 2024 Acme Inc. All rights reserved.")
        );
        assert_eq!(out.background_color.as_deref(), Some("#111"));
        assert_eq!(out.text_color.as_deref(), Some("#eee"));
    }

    #[test]
    fn test_footer_columns_fall_back_to_grid_tracks() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let footer = b.root("footer");
        let grid = b.child(footer, "div");
        b.style(grid, "display", "grid")
            .style(grid, "grid-template-columns", "repeat(3, 1fr)");
        let form = b.child(grid, "form");
        let input = b.child(form, "input");
        b.attr(input, "type", "email");
        let snap = b.build();

        let out = analyze_footer(&snap, footer).unwrap();
        assert_eq!(out.column_count, 3);
        assert!(out.has_newsletter);
        assert!(out.copyright_text.is_none());
    }

    #[test]
    fn test_footer_without_columns_has_one() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let footer = b.root("footer");
        let p = b.child(footer, "p");
        b.text(p, "Made with care");
        let snap = b.build();
        assert_eq!(analyze_footer(&snap, footer).unwrap().column_count, 1);
    }

    #[test]
    fn test_header_features() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let header = b.root("header");
        b.style(header, "position", "fixed");
        let brand = b.child(header, "a");
        b.class(brand, "site-logo").attr(brand, "rel", "home");
        b.child(brand, "img");
        let title = b.child(header, "span");
        b.class(title, "site-title").text(title, "Acme");
        let nav = b.child(header, "nav");
        b.child(nav, "a");
        let snap = b.build();

        let out = analyze_header(&snap, header).unwrap();
        assert!(out.sticky);
        assert!(out.has_logo);
        assert!(out.has_navigation);
        assert!(!out.has_search);
        assert_eq!(out.site_title.as_deref(), Some("Acme"));
    }
}
