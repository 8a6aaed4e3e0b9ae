//! Interactive and composite widget patterns.

use crate::pattern::RecognitionPattern as P;
use crate::types::ComponentType;

/// Matches a price: a currency symbol next to a number, or a number with an
/// ISO currency code.
const PRICE_TEXT: &str = r"[$€£¥]\s?\d|\d\s?[$€£¥]|\d+[.,]\d{2}\s?(USD|EUR|GBP)\b";

pub(super) fn patterns() -> Vec<(ComponentType, Vec<P>)> {
    vec![
        (
            ComponentType::Alert,
            vec![
                P::new("ARIA alert role")
                    .role("alert")
                    .confidence(95)
                    .priority(9),
                P::new("alert/notice class convention")
                    .tags(&["div", "section", "aside", "p"])
                    .classes(&["alert", "notice", "notification", "callout"])
                    .confidence(80)
                    .priority(8),
            ],
        ),
        (
            ComponentType::Tabs,
            vec![
                P::new("contains an ARIA tablist")
                    .child("[role=tablist]")
                    .confidence(90)
                    .priority(9),
                P::new("tabs class convention")
                    .tags(&["div", "section"])
                    .classes(&["tabs", "tabset", "nav-tabs", "tab-container"])
                    .confidence(75)
                    .priority(7),
            ],
        ),
        (
            ComponentType::Toggle,
            vec![
                P::new("<details> disclosure")
                    .tags(&["details"])
                    .confidence(85)
                    .priority(8),
                P::new("toggle class convention")
                    .tags(&["div"])
                    .classes(&["toggle", "collapsible", "expandable"])
                    .confidence(70)
                    .priority(7),
            ],
        ),
        (
            ComponentType::Accordion,
            vec![
                P::new("accordion class convention")
                    .classes(&["accordion"])
                    .confidence(85)
                    .priority(8),
                P::new("group of <details> disclosures")
                    .min_children(2, Some("details"))
                    .confidence(85)
                    .priority(8),
            ],
        ),
        (
            ComponentType::ImageCarousel,
            vec![
                P::new("slick slider with images")
                    .classes(&["slick-slider"])
                    .child(".slick-slide img")
                    .confidence(95)
                    .priority(10),
                P::new("swiper with images")
                    .classes(&["swiper"])
                    .child(".swiper-slide img")
                    .confidence(95)
                    .priority(10),
                P::new("owl carousel with images")
                    .classes(&["owl-carousel"])
                    .child(".owl-item img")
                    .confidence(95)
                    .priority(10),
                P::new("ARIA carousel")
                    .attr_matches("aria-roledescription", "(?i)carousel")
                    .child("img")
                    .confidence(90)
                    .priority(9),
                P::new("generic carousel/slider class with images")
                    .tags(&["div", "section", "ul"])
                    .classes(&["carousel", "slider", "slideshow", "gallery-slider"])
                    .child("img")
                    .confidence(75)
                    .priority(8),
            ],
        ),
        (
            ComponentType::PostsGrid,
            vec![
                P::new("posts grid class convention with articles")
                    .classes(&["posts", "blog-grid", "post-grid", "post-list", "wp-block-post-template"])
                    .child("article, .post")
                    .confidence(85)
                    .priority(9),
                P::new("container of at least three articles")
                    .min_children(3, Some("article"))
                    .confidence(80)
                    .priority(8),
                P::new("grid of post cards")
                    .classes(&["grid", "cards"])
                    .min_children(3, Some("article, .post, .card"))
                    .confidence(75)
                    .priority(7),
            ],
        ),
        (
            ComponentType::PriceList,
            vec![
                P::new("price list class convention")
                    .classes(&["price-list", "pricing-list", "menu-list", "price-menu"])
                    .confidence(85)
                    .priority(9),
                P::new("list of priced items")
                    .tags(&["ul", "ol", "div"])
                    .min_children(3, Some("li, .item"))
                    .content(PRICE_TEXT)
                    .confidence(75)
                    .priority(8),
            ],
        ),
        (
            ComponentType::StarRating,
            vec![
                P::new("star rating class convention")
                    .classes(&["star-rating", "stars", "rating"])
                    .confidence(85)
                    .priority(9),
                P::new("labelled as a rating")
                    .attr_matches("aria-label", r"(?i)(rated|rating|\bstars?\b)")
                    .confidence(80)
                    .priority(8),
                P::new("short run of star glyphs")
                    .tags(&["div", "span", "p"])
                    .content(r"^\s*[★☆]{3,5}")
                    .confidence(80)
                    .priority(8),
            ],
        ),
        (
            ComponentType::VideoPlaylist,
            vec![
                P::new("playlist class convention with embedded videos")
                    .classes(&["playlist", "video-list"])
                    .child("iframe, video")
                    .confidence(85)
                    .priority(9),
                P::new("video gallery class convention")
                    .classes(&["video-gallery", "videos-grid"])
                    .confidence(75)
                    .priority(8),
            ],
        ),
        (
            ComponentType::Testimonial,
            vec![
                P::new("testimonial/review class convention")
                    .classes(&["testimonial", "review-card", "customer-quote"])
                    .confidence(85)
                    .priority(9),
                P::new("<figure> with a quotation and attribution")
                    .tags(&["figure"])
                    .child("blockquote")
                    .min_children(2, None)
                    .confidence(82)
                    .priority(8),
            ],
        ),
        (
            ComponentType::Counter,
            vec![
                P::new("animated counter data attribute")
                    .attr_present("data-count")
                    .confidence(85)
                    .priority(8),
                P::new("counter class convention")
                    .classes(&["counter", "count-up", "stat-number"])
                    .content(r"\d")
                    .confidence(80)
                    .priority(8),
            ],
        ),
        (
            ComponentType::ProgressBar,
            vec![
                P::new("ARIA progressbar role")
                    .role("progressbar")
                    .confidence(95)
                    .priority(9),
                P::new("<progress> element")
                    .tags(&["progress"])
                    .confidence(95)
                    .priority(9),
                P::new("progress/skill bar class convention")
                    .tags(&["div"])
                    .classes(&["progress-bar", "progressbar", "skill-bar"])
                    .confidence(80)
                    .priority(8),
            ],
        ),
        (
            ComponentType::NavMenu,
            vec![
                P::new("ARIA navigation landmark")
                    .role("navigation")
                    .confidence(85)
                    .priority(7),
                P::new("<nav> element")
                    .tags(&["nav"])
                    .confidence(80)
                    .priority(7),
                P::new("menu class convention with links")
                    .tags(&["ul", "div"])
                    .classes(&["menu", "main-nav", "navigation"])
                    .child("a")
                    .confidence(70)
                    .priority(5),
            ],
        ),
        (
            ComponentType::Form,
            vec![
                P::new("<form> element")
                    .tags(&["form"])
                    .confidence(90)
                    .priority(8),
                P::new("contact/newsletter block with inputs")
                    .tags(&["div", "section"])
                    .classes(&["contact-form", "newsletter", "subscribe", "wpcf7"])
                    .child("input, textarea")
                    .confidence(80)
                    .priority(7),
            ],
        ),
    ]
}
