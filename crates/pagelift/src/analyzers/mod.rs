//! Structural analyzers: per-type feature extraction once a node's type is
//! settled.
//!
//! Analyzers are pure reads through the [`PageAccessor`]. They never fail: a
//! node that cannot be read, or lacks a signal, yields the conservative
//! defaults documented on each output type. Running an analyzer twice on an
//! unchanged page gives the same output.

mod layout;
mod regions;
mod widgets;

pub use layout::{RowAnalysis, SectionAnalysis, SidebarAnalysis, SidebarPosition};
pub use regions::{FooterAnalysis, HeaderAnalysis};
pub use widgets::{PostsGridAnalysis, TabsAnalysis};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::{AccessResult, ElementView, PageAccessor};
use crate::selector::{self, Selector};
use crate::types::{ComponentType, NodeId, RecognizedComponent};

/// Semantic attributes extracted for one recognized component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnalyzerOutput {
    Row(RowAnalysis),
    Footer(FooterAnalysis),
    Sidebar(SidebarAnalysis),
    Header(HeaderAnalysis),
    Tabs(TabsAnalysis),
    PostsGrid(PostsGridAnalysis),
    Section(SectionAnalysis),
    /// The type has no analyzer.
    None,
}

impl AnalyzerOutput {
    pub fn as_row(&self) -> Option<&RowAnalysis> {
        match self {
            AnalyzerOutput::Row(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_footer(&self) -> Option<&FooterAnalysis> {
        match self {
            AnalyzerOutput::Footer(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sidebar(&self) -> Option<&SidebarAnalysis> {
        match self {
            AnalyzerOutput::Sidebar(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_header(&self) -> Option<&HeaderAnalysis> {
        match self {
            AnalyzerOutput::Header(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_tabs(&self) -> Option<&TabsAnalysis> {
        match self {
            AnalyzerOutput::Tabs(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_posts_grid(&self) -> Option<&PostsGridAnalysis> {
        match self {
            AnalyzerOutput::PostsGrid(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionAnalysis> {
        match self {
            AnalyzerOutput::Section(a) => Some(a),
            _ => None,
        }
    }
}

/// Run the analyzer for `component_type` against `node`.
pub fn analyze(
    component_type: &ComponentType,
    node: NodeId,
    page: &dyn PageAccessor,
) -> AnalyzerOutput {
    let output = match component_type {
        ComponentType::Row => AnalyzerOutput::Row(or_default(node, layout::analyze_row(page, node))),
        ComponentType::Section | ComponentType::Hero => {
            AnalyzerOutput::Section(or_default(node, layout::analyze_section(page, node)))
        }
        ComponentType::Sidebar => {
            AnalyzerOutput::Sidebar(or_default(node, layout::analyze_sidebar(page, node)))
        }
        ComponentType::Footer => {
            AnalyzerOutput::Footer(or_default(node, regions::analyze_footer(page, node)))
        }
        ComponentType::Header => {
            AnalyzerOutput::Header(or_default(node, regions::analyze_header(page, node)))
        }
        ComponentType::Tabs => AnalyzerOutput::Tabs(or_default(node, widgets::analyze_tabs(page, node))),
        ComponentType::PostsGrid => {
            AnalyzerOutput::PostsGrid(or_default(node, widgets::analyze_posts_grid(page, node)))
        }
        _ => AnalyzerOutput::None,
    };
    debug!(node = %node, component = %component_type, "analyzed");
    output
}

/// Fill `analyzer_output` for every node of the tree that does not have it
/// yet. Already-analyzed nodes are left untouched.
pub fn enrich(component: &mut RecognizedComponent, page: &dyn PageAccessor) {
    if component.analyzer_output.is_none() {
        component.analyzer_output = Some(analyze(
            &component.component_type,
            component.element,
            page,
        ));
    }
    for child in &mut component.children {
        enrich(child, page);
    }
}

fn or_default<T: Default>(node: NodeId, read: AccessResult<T>) -> T {
    read.unwrap_or_else(|e| {
        debug!(node = %node, "analyzer fell back to defaults: {e}");
        T::default()
    })
}

// ── Shared read helpers ──────────────────────────────────────────────────────

/// Descendants of `scope` matching a built-in selector. Unreadable subtrees
/// yield no matches.
pub(crate) fn select(page: &dyn PageAccessor, scope: NodeId, source: &str) -> Vec<NodeId> {
    match Selector::parse(source) {
        Ok(sel) => selector::select_all(page, scope, &sel).unwrap_or_default(),
        Err(_) => Vec::new(),
    }
}

pub(crate) fn has(page: &dyn PageAccessor, scope: NodeId, source: &str) -> bool {
    match Selector::parse(source) {
        Ok(sel) => selector::has_match(page, scope, &sel).unwrap_or(false),
        Err(_) => false,
    }
}

/// Number of tracks in a `grid-template-columns` value. Handles
/// `repeat(N, …)` and plain space-separated track lists.
pub(crate) fn grid_track_count(template: &str) -> Option<usize> {
    let template = template.trim();
    if template.is_empty() || template == "none" {
        return None;
    }
    let mut count = 0;
    let mut rest = template;
    while let Some(start) = rest.find("repeat(") {
        let head = &rest[..start];
        count += head.split_whitespace().count();
        let after = &rest[start + "repeat(".len()..];
        let repeat_n = after
            .split(',')
            .next()
            .and_then(|n| n.trim().parse::<usize>().ok())
            .unwrap_or(1);
        count += repeat_n;
        let mut depth = 1;
        let mut end = after.len();
        for (i, c) in after.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        rest = &after[end..];
    }
    count += split_tracks(rest);
    (count > 0).then_some(count)
}

/// Count top-level tracks, treating `minmax(...)` and friends as one.
fn split_tracks(list: &str) -> usize {
    let mut count = 0;
    let mut depth = 0;
    let mut in_token = false;
    for c in list.chars() {
        match c {
            '(' => {
                depth += 1;
                in_token = true;
            }
            ')' => depth -= 1,
            c if c.is_whitespace() && depth == 0 => {
                if in_token {
                    count += 1;
                }
                in_token = false;
            }
            _ => in_token = true,
        }
    }
    if in_token {
        count += 1;
    }
    count
}

/// Read a node, returning `None` when it is unreadable.
pub(crate) fn view(page: &dyn PageAccessor, node: NodeId) -> Option<ElementView> {
    ElementView::read(page, node).ok()
}
