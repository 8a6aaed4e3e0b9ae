//! Tabs and posts-grid analyzers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::{grid_track_count, has, select, view};
use crate::accessor::{normalize_whitespace, AccessResult, ElementView, PageAccessor};
use crate::types::NodeId;

/// Elementor's default posts-per-row.
const DEFAULT_POST_COLUMNS: usize = 3;

// ── Tabs ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabsAnalysis {
    pub tab_count: usize,
    /// Index of the selected tab; `0` when none is marked.
    pub active_index: usize,
    pub vertical: bool,
    pub titles: Vec<String>,
}

pub(super) fn analyze_tabs(page: &dyn PageAccessor, node: NodeId) -> AccessResult<TabsAnalysis> {
    let tabs = ElementView::read(page, node)?;

    let mut tab_ids = select(page, node, "[role=tab]");
    if tab_ids.is_empty() {
        tab_ids = select(
            page,
            node,
            ".tab-title, .tabs-nav li, .nav-tabs li, .tab-nav li, .tabs-title",
        );
    }

    let mut titles = Vec::with_capacity(tab_ids.len());
    let mut active_index = None;
    for (i, id) in tab_ids.iter().enumerate() {
        let Some(tab) = view(page, *id) else { continue };
        let selected = tab.attr("aria-selected") == Some("true")
            || tab
                .classes
                .iter()
                .any(|c| c == "active" || c == "is-active" || c == "current" || c.ends_with("-active"));
        if selected && active_index.is_none() {
            active_index = Some(i);
        }
        titles.push(tab.normalized_text());
    }

    let vertical = tabs.class_attr().contains("vertical")
        || select(page, node, "[role=tablist]")
            .into_iter()
            .filter_map(|id| view(page, id))
            .any(|list| {
                list.attr("aria-orientation") == Some("vertical")
                    || list.style.is("flex-direction", "column")
            });

    Ok(TabsAnalysis {
        tab_count: tab_ids.len(),
        active_index: active_index.unwrap_or(0),
        vertical,
        titles,
    })
}

// ── Posts grid ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsGridAnalysis {
    pub post_count: usize,
    /// Grid tracks, then a `cols-N`/`columns-N` class; `3` otherwise.
    pub column_count: usize,
    pub has_excerpt: bool,
    pub has_featured_image: bool,
    /// Title of the first post, for previews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_title: Option<String>,
}

impl Default for PostsGridAnalysis {
    fn default() -> Self {
        Self {
            post_count: 0,
            column_count: DEFAULT_POST_COLUMNS,
            has_excerpt: false,
            has_featured_image: false,
            first_title: None,
        }
    }
}

fn columns_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|\s)(?:[a-z-]*-)?(?:cols|columns|grid-cols|row-cols)-(\d{1,2})(?:\s|$)")
            .expect("columns class regex is valid")
    })
}

pub(super) fn analyze_posts_grid(
    page: &dyn PageAccessor,
    node: NodeId,
) -> AccessResult<PostsGridAnalysis> {
    let grid = ElementView::read(page, node)?;

    let mut posts = select(page, node, "article");
    if posts.is_empty() {
        posts = select(page, node, ".post, .card, .entry");
    }

    let first_title = posts.first().and_then(|first| {
        select(page, *first, "h1, h2, h3, h4, .entry-title, .card-title")
            .first()
            .and_then(|h| page.text_content(*h).ok())
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty())
    });

    Ok(PostsGridAnalysis {
        post_count: posts.len(),
        column_count: post_columns(page, &grid),
        has_excerpt: has(
            page,
            node,
            ".excerpt, .entry-summary, .post-excerpt, .card-text, article p",
        ),
        has_featured_image: has(
            page,
            node,
            "article img, .post img, .card img, .wp-post-image, .post-thumbnail",
        ),
        first_title,
    })
}

fn post_columns(page: &dyn PageAccessor, grid: &ElementView) -> usize {
    let mut candidates = vec![grid.clone()];
    candidates.extend(grid.children.iter().filter_map(|c| view(page, *c)));

    for v in &candidates {
        if v.style.is("display", "grid") {
            if let Some(n) = v.style.get("grid-template-columns").and_then(grid_track_count) {
                return n;
            }
        }
    }
    for v in &candidates {
        if let Some(n) = columns_class_re()
            .captures(v.class_attr())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            return n;
        }
    }
    DEFAULT_POST_COLUMNS
}
