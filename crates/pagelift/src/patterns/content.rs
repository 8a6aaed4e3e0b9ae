//! Basic content patterns: text, headings, media, buttons and lists.

use crate::pattern::RecognitionPattern as P;
use crate::types::ComponentType;

/// Hosts whose links identify a social profile.
pub(crate) const SOCIAL_LINK_SELECTOR: &str = "a[href*='facebook.com'], a[href*='twitter.com'], \
     a[href*='x.com/'], a[href*='instagram.com'], a[href*='linkedin.com'], \
     a[href*='youtube.com'], a[href*='tiktok.com'], a[href*='pinterest.com'], a[href*='github.com']";

pub(super) fn patterns() -> Vec<(ComponentType, Vec<P>)> {
    vec![
        (
            ComponentType::Heading,
            vec![
                P::new("<h1>-<h6> element")
                    .tags(&["h1", "h2", "h3", "h4", "h5", "h6"])
                    .confidence(90)
                    .priority(8),
                P::new("ARIA heading role")
                    .role("heading")
                    .confidence(80)
                    .priority(7),
            ],
        ),
        (
            ComponentType::Paragraph,
            vec![P::new("<p> element")
                .tags(&["p"])
                .confidence(90)
                .priority(7)],
        ),
        (
            ComponentType::Text,
            vec![
                P::new("rich-text block class convention")
                    .tags(&["div"])
                    .classes(&["entry-content", "rich-text", "text-block", "wysiwyg"])
                    .confidence(55)
                    .priority(1),
                P::new("leaf element carrying text")
                    .tags(&["div", "span"])
                    .css_fn(|_, view| view.children.is_empty() && !view.text.trim().is_empty())
                    .confidence(40)
                    .priority(0),
            ],
        ),
        (
            ComponentType::Blockquote,
            vec![
                P::new("<blockquote> element")
                    .tags(&["blockquote"])
                    .confidence(90)
                    .priority(8),
                P::new("quote class convention")
                    .tags(&["div", "aside", "figure"])
                    .classes(&["pullquote", "blockquote", "quote"])
                    .confidence(70)
                    .priority(6),
            ],
        ),
        (
            ComponentType::List,
            vec![P::new("<ul>/<ol> with list items")
                .tags(&["ul", "ol"])
                .min_children(1, Some("li"))
                .confidence(70)
                .priority(4)],
        ),
        (
            ComponentType::IconList,
            vec![
                P::new("icon list class convention")
                    .classes(&["icon-list", "fa-ul", "feature-list", "checklist"])
                    .confidence(80)
                    .priority(8),
                P::new("list whose items carry icons")
                    .tags(&["ul", "ol"])
                    .child("li i, li svg, li [class*=icon]")
                    .confidence(75)
                    .priority(7),
            ],
        ),
        (
            ComponentType::Image,
            vec![
                P::new("<img> element")
                    .tags(&["img"])
                    .confidence(85)
                    .priority(5),
                P::new("<figure>/<picture> wrapping an image")
                    .tags(&["figure", "picture"])
                    .child("img")
                    .confidence(80)
                    .priority(6),
            ],
        ),
        (
            ComponentType::Video,
            vec![
                P::new("<video> element")
                    .tags(&["video"])
                    .confidence(90)
                    .priority(8),
                P::new("embedded YouTube/Vimeo player")
                    .tags(&["iframe"])
                    .attr_matches("src", r"(youtube\.com|youtube-nocookie\.com|youtu\.be|vimeo\.com)")
                    .confidence(90)
                    .priority(8),
                P::new("responsive video wrapper")
                    .classes(&["video-wrapper", "video-container", "embed-responsive", "wp-block-embed"])
                    .child("iframe, video")
                    .confidence(80)
                    .priority(8),
            ],
        ),
        (
            ComponentType::Button,
            vec![
                P::new("link styled as a button")
                    .tags(&["a"])
                    .classes(&["btn", "button", "cta"])
                    .confidence(85)
                    .priority(7),
                P::new("ARIA button role")
                    .role("button")
                    .confidence(80)
                    .priority(6),
                P::new("<button> element")
                    .tags(&["button"])
                    .confidence(75)
                    .priority(6),
                P::new("submit/button input")
                    .tags(&["input"])
                    .attr_matches("type", "^(submit|button)$")
                    .confidence(70)
                    .priority(6),
            ],
        ),
        (
            ComponentType::Divider,
            vec![
                P::new("<hr> element")
                    .tags(&["hr"])
                    .confidence(95)
                    .priority(8),
                P::new("divider class convention")
                    .tags(&["div", "span"])
                    .classes(&["divider", "separator"])
                    .confidence(75)
                    .priority(6),
            ],
        ),
        (
            ComponentType::SocialIcons,
            vec![
                P::new("social links class convention")
                    .classes(&["social-icons", "social-links", "share-buttons", "social-media"])
                    .child("a[href]")
                    .confidence(80)
                    .priority(8),
                P::new("group of links to social profiles")
                    .tags(&["ul", "div", "nav", "p"])
                    .min_children(2, None)
                    .child(SOCIAL_LINK_SELECTOR)
                    .confidence(65)
                    .priority(6),
            ],
        ),
    ]
}
