//! Layout patterns: sections, containers, rows, columns and page regions.

use crate::accessor::ElementView;
use crate::config::RecognizerConfig;
use crate::pattern::RecognitionPattern as P;
use crate::types::ComponentType;

/// Width fraction of the viewport treated as "full width".
const FULL_WIDTH_RATIO: f64 = 0.9;

pub(super) fn patterns(config: &RecognizerConfig) -> Vec<(ComponentType, Vec<P>)> {
    let footer_proximity = config.footer_proximity_px;

    vec![
        (
            ComponentType::Section,
            vec![
                P::new("<section> element")
                    .tags(&["section"])
                    .confidence(70)
                    .priority(2),
                P::new("section/group class convention")
                    .tags(&["div", "section", "article"])
                    .classes(&["elementor-section", "wp-block-group", "section", "page-block"])
                    .confidence(60)
                    .priority(1),
                P::new("ARIA region landmark")
                    .role("region")
                    .confidence(55)
                    .priority(1),
            ],
        ),
        (
            ComponentType::Container,
            vec![
                P::new("<main> element")
                    .tags(&["main"])
                    .confidence(60)
                    .priority(0),
                P::new("container/wrapper class convention")
                    .tags(&["div"])
                    .classes(&["container", "wrapper", "inner", "e-con"])
                    .confidence(55)
                    .priority(0),
            ],
        ),
        (
            ComponentType::Row,
            vec![
                P::new("grid row class convention")
                    .tags(&["div", "section"])
                    .classes(&["row", "columns", "wp-block-columns", "elementor-row"])
                    .min_children(2, None)
                    .confidence(75)
                    .priority(3),
                P::new("horizontal flex container with several children")
                    .tags(&["div", "section"])
                    .min_children(2, None)
                    .css_fn(|style, _| {
                        matches!(style.get("display"), Some("flex") | Some("inline-flex"))
                            && !matches!(
                                style.get("flex-direction"),
                                Some("column") | Some("column-reverse")
                            )
                    })
                    .confidence(60)
                    .priority(1),
            ],
        ),
        (
            ComponentType::Column,
            vec![
                P::new("grid column class convention")
                    .tags(&["div"])
                    .classes(&["col-", "column", "wp-block-column", "elementor-col"])
                    .confidence(70)
                    .priority(2),
                P::new("column class with numeric width suffix")
                    .tags(&["div"])
                    .attr_matches("class", r"(^|\s)(col|span|grid)-?\d{1,2}(\s|$)")
                    .confidence(70)
                    .priority(2),
            ],
        ),
        (
            ComponentType::Hero,
            vec![
                P::new("hero/banner class convention")
                    .tags(&["div", "section", "header"])
                    .classes(&["hero", "jumbotron", "banner", "masthead-image"])
                    .confidence(80)
                    .priority(5),
                P::new("tall full-width block at the top of the page with an h1")
                    .child("h1")
                    .css_fn(is_top_hero_block)
                    .confidence(70)
                    .priority(4),
            ],
        ),
        (
            ComponentType::Header,
            vec![
                P::new("ARIA banner landmark")
                    .role("banner")
                    .confidence(90)
                    .priority(6),
                P::new("<header> element")
                    .tags(&["header"])
                    .confidence(85)
                    .priority(6),
                P::new("site header class convention")
                    .tags(&["div", "section", "nav"])
                    .classes(&["site-header", "header", "masthead", "navbar", "top-bar"])
                    .confidence(75)
                    .priority(5),
                P::new("fixed or sticky full-width bar pinned to the top with links")
                    .child("a")
                    .css_fn(is_pinned_top_bar)
                    .confidence(70)
                    .priority(5),
            ],
        ),
        (
            ComponentType::Footer,
            vec![
                P::new("ARIA contentinfo landmark")
                    .role("contentinfo")
                    .confidence(90)
                    .priority(6),
                P::new("<footer> element")
                    .tags(&["footer"])
                    .confidence(85)
                    .priority(6),
                P::new("site footer class convention")
                    .tags(&["div", "section"])
                    .classes(&["site-footer", "footer", "colophon", "site-info"])
                    .confidence(80)
                    .priority(5),
                P::new("full-width block at the bottom of the page with a copyright line")
                    .content(r"(?s)©.*\b(19|20)\d{2}\b|\b(19|20)\d{2}\b.*©")
                    .css_fn(move |_, view| is_bottom_band(view, footer_proximity))
                    .confidence(80)
                    .priority(5),
            ],
        ),
        (
            ComponentType::Sidebar,
            vec![
                P::new("ARIA complementary landmark")
                    .role("complementary")
                    .confidence(85)
                    .priority(6),
                P::new("<aside> element")
                    .tags(&["aside"])
                    .confidence(80)
                    .priority(6),
                P::new("sidebar/widget-area class convention")
                    .tags(&["div", "section"])
                    .classes(&["sidebar", "widget-area", "side-nav"])
                    .confidence(80)
                    .priority(5),
                P::new("narrow column pinned to a viewport edge, at least half the viewport tall")
                    .tags(&["div", "section", "nav"])
                    .css_fn(|_, view| is_edge_column(view))
                    .confidence(65)
                    .priority(3),
            ],
        ),
    ]
}

fn is_full_width(view: &ElementView) -> bool {
    !view.rect.is_empty() && view.rect.width >= view.viewport.width * FULL_WIDTH_RATIO
}

fn is_top_hero_block(_: &crate::accessor::StyleSnapshot, view: &ElementView) -> bool {
    is_full_width(view) && view.rect.y < 200.0 && view.rect.height >= view.viewport.height * 0.5
}

fn is_pinned_top_bar(style: &crate::accessor::StyleSnapshot, view: &ElementView) -> bool {
    (style.is("position", "fixed") || style.is("position", "sticky"))
        && is_full_width(view)
        && view.rect.y <= 10.0
        && view.rect.height <= view.viewport.height * 0.3
}

/// Full-width, ends within `proximity` px of the document bottom, and no
/// taller than half the document (which keeps `<body>` and page wrappers out).
fn is_bottom_band(view: &ElementView, proximity: f64) -> bool {
    is_full_width(view)
        && view.document_height - view.rect.bottom() <= proximity
        && view.rect.height <= view.document_height * 0.5
}

/// Narrow (at most 40% of the viewport), touching the left or right edge
/// within 20px, and at least half the viewport tall.
fn is_edge_column(view: &ElementView) -> bool {
    let rect = view.rect;
    let vw = view.viewport.width;
    !rect.is_empty()
        && rect.width <= vw * 0.4
        && (rect.x <= 20.0 || rect.right() >= vw - 20.0)
        && rect.height >= view.viewport.height * 0.5
}
