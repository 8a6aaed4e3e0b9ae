//! Media widgets: image, video, image carousel and video playlist.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::{link_value, media_value, yes_no, ElementorWidget, ExportContext, WidgetMapper};
use crate::accessor::PageAccessor;
use crate::selector::{self, Selector};
use crate::types::{ComponentType, NodeId, PageliftResult, RecognizedComponent};

// ── Image ────────────────────────────────────────────────────────────────────

/// `image`: the element itself when it is an `<img>`, else its first image.
/// Caption from `figcaption`; link from an enclosed anchor.
pub struct ImageMapper;

impl WidgetMapper for ImageMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Image
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let img = if ctx.tag(node) == "img" {
            Some(node)
        } else {
            ctx.select_first(node, "img")
        };
        let url = img.and_then(|i| ctx.image_url(i)).unwrap_or_default();
        let alt = img.and_then(|i| ctx.attr(i, "alt"));

        let mut settings = Map::new();
        settings.insert("image".into(), media_value(&url, alt.as_deref()));
        settings.insert("image_size".into(), json!("full"));
        if let Some(caption) = ctx.text_of(node, "figcaption") {
            settings.insert("caption_source".into(), json!("custom"));
            settings.insert("caption".into(), json!(caption));
        }
        match ctx.link_of(node) {
            Some(href) => {
                settings.insert("link_to".into(), json!("custom"));
                settings.insert("link".into(), link_value(&href));
            }
            None => {
                settings.insert("link_to".into(), json!("none"));
            }
        }
        Ok(ElementorWidget::widget(ctx.next_id(), "image", settings))
    }
}

// ── Video ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoKind {
    Youtube,
    Vimeo,
    Hosted,
}

impl VideoKind {
    fn as_str(self) -> &'static str {
        match self {
            VideoKind::Youtube => "youtube",
            VideoKind::Vimeo => "vimeo",
            VideoKind::Hosted => "hosted",
        }
    }
}

/// Classify an embed URL and rewrite player URLs to canonical watch URLs.
fn classify_video(src: &str) -> (VideoKind, String) {
    let path_id = |marker: &str| -> Option<String> {
        let start = src.find(marker)? + marker.len();
        let id: String = src[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        (!id.is_empty()).then_some(id)
    };

    if src.contains("youtube.com") || src.contains("youtube-nocookie.com") || src.contains("youtu.be") {
        let id = path_id("/embed/")
            .or_else(|| path_id("youtu.be/"))
            .or_else(|| path_id("v="));
        let url = match id {
            Some(id) => format!("https://www.youtube.com/watch?v={id}"),
            None => src.to_string(),
        };
        return (VideoKind::Youtube, url);
    }
    if src.contains("vimeo.com") {
        let url = match path_id("/video/") {
            Some(id) => format!("https://vimeo.com/{id}"),
            None => src.to_string(),
        };
        return (VideoKind::Vimeo, url);
    }
    (VideoKind::Hosted, src.to_string())
}

fn url_key(kind: VideoKind) -> &'static str {
    match kind {
        VideoKind::Youtube => "youtube_url",
        VideoKind::Vimeo => "vimeo_url",
        VideoKind::Hosted => "hosted_url",
    }
}

/// URL-valued setting for a video source.
fn video_url_value(kind: VideoKind, url: &str) -> Value {
    match kind {
        VideoKind::Hosted => json!({ "url": url, "id": "" }),
        _ => json!(url),
    }
}

/// The playable element: `node` itself or its first `iframe`/`video`.
fn video_element(ctx: &ExportContext<'_>, node: NodeId) -> Option<NodeId> {
    match ctx.tag(node).as_str() {
        "iframe" | "video" => Some(node),
        _ => ctx.select_first(node, "iframe, video"),
    }
}

fn video_src(ctx: &ExportContext<'_>, player: NodeId) -> Option<String> {
    ctx.attr(player, "src")
        .or_else(|| ctx.attr(player, "data-src"))
        .or_else(|| {
            ctx.select_first(player, "source[src]")
                .and_then(|s| ctx.attr(s, "src"))
        })
}

/// `video`: YouTube, Vimeo or self-hosted. Autoplay, mute and loop from the
/// element's attributes or embed query; controls on unless a `<video>`
/// omits them.
pub struct VideoMapper;

impl WidgetMapper for VideoMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::Video
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let player = video_element(ctx, component.element);
        let src = player.and_then(|p| video_src(ctx, p)).unwrap_or_default();
        let (kind, url) = classify_video(&src);

        let flag = |attr: &str, query: &str| {
            player.is_some_and(|p| ctx.page.attribute(p, attr).ok().flatten().is_some())
                || src.contains(&format!("{query}=1"))
        };
        let is_video_tag = player.is_some_and(|p| ctx.tag(p) == "video");
        let controls = !is_video_tag || player.is_some_and(|p| ctx.page.attribute(p, "controls").ok().flatten().is_some());

        let mut settings = Map::new();
        settings.insert("video_type".into(), json!(kind.as_str()));
        settings.insert(url_key(kind).into(), video_url_value(kind, &url));
        settings.insert("autoplay".into(), yes_no(flag("autoplay", "autoplay")));
        settings.insert("mute".into(), yes_no(flag("muted", "mute")));
        settings.insert("loop".into(), yes_no(flag("loop", "loop")));
        settings.insert("controls".into(), yes_no(controls));
        Ok(ElementorWidget::widget(ctx.next_id(), "video", settings))
    }
}

// ── Image carousel ───────────────────────────────────────────────────────────

/// Images inside slides of the supported slider libraries (Slick, Swiper,
/// Owl Carousel).
const SLIDE_IMAGE_SELECTOR: &str = ".slick-slide img, .swiper-slide img, .owl-item img";

/// Library-made clones of real slides, used for infinite looping.
const CLONE_CLASSES: [&str; 3] = ["slick-cloned", "swiper-slide-duplicate", "cloned"];

const ARROW_SELECTOR: &str = ".slick-arrow, .slick-prev, .slick-next, .swiper-button-next, \
     .swiper-button-prev, .owl-nav, .owl-prev, .owl-next, .carousel-control-prev, \
     .carousel-control-next, [class*=arrow]";
const DOT_SELECTOR: &str = ".slick-dots, .swiper-pagination, .owl-dots, .carousel-indicators, \
     [class*=dots], [class*=pagination]";
const FADE_SELECTOR: &str = ".carousel-fade, .swiper-fade, .swiper-container-fade, .fade";

/// Attributes read, in order, for slides-to-show.
const SLIDES_TO_SHOW_ATTRS: [&str; 4] = [
    "data-slides-to-show",
    "data-slides-per-view",
    "data-items",
    "data-slides",
];
const AUTOPLAY_SPEED_ATTRS: [&str; 3] = [
    "data-autoplay-speed",
    "data-autoplay-timeout",
    "data-interval",
];

/// One carousel slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub image_url: String,
    /// Destination of the nearest anchor enclosing the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Slides below `root`.
///
/// Images inside library slide markers come first, each linked to its
/// nearest enclosing anchor; library clones are skipped. With no marked
/// slides, every image becomes an unlinked slide. The image URL is `src`,
/// then `data-src`, then `data-lazy`.
pub fn extract_slides(page: &dyn PageAccessor, root: NodeId) -> Vec<Slide> {
    let image_url = |img: NodeId| -> String {
        ["src", "data-src", "data-lazy"]
            .iter()
            .find_map(|name| page.attribute(img, name).ok().flatten().filter(|v| !v.trim().is_empty()))
            .unwrap_or_default()
    };

    let mut slides = Vec::new();
    if let Ok(sel) = Selector::parse(SLIDE_IMAGE_SELECTOR) {
        for m in selector::select_with_ancestors(page, root, &sel).unwrap_or_default() {
            let cloned = m.ancestors.iter().any(|a| {
                page.class_list(*a)
                    .map(|classes| classes.iter().any(|c| CLONE_CLASSES.contains(&c.as_str())))
                    .unwrap_or(false)
            });
            if cloned {
                continue;
            }
            let link = m.ancestors.iter().rev().find_map(|a| {
                let is_anchor = page.tag_name(*a).map(|t| t == "a").unwrap_or(false);
                if is_anchor {
                    page.attribute(*a, "href").ok().flatten()
                } else {
                    None
                }
            });
            slides.push(Slide {
                image_url: image_url(m.node),
                link,
            });
        }
    }
    if !slides.is_empty() {
        return slides;
    }

    let Ok(img) = Selector::parse("img") else {
        return slides;
    };
    selector::select_all(page, root, &img)
        .unwrap_or_default()
        .into_iter()
        .map(|node| Slide {
            image_url: image_url(node),
            link: None,
        })
        .collect()
}

/// Carousel behavior derived from markup, with Elementor's defaults where
/// the page gives no signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSettings {
    /// Default `"3"`.
    pub slides_to_show: String,
    /// Always `"1"`.
    pub slides_to_scroll: String,
    /// `both`, `arrows`, `dots` or `none`.
    pub navigation: String,
    /// Default off.
    pub autoplay: bool,
    /// Milliseconds, default 3000.
    pub autoplay_speed: u64,
    /// Always on.
    pub infinite: bool,
    /// `fade` when a fade marker is present, else `slide`.
    pub effect: String,
    /// Always 500ms.
    pub speed: u64,
    /// Always `full`.
    pub thumbnail_size: String,
}

impl CarouselSettings {
    pub fn derive(ctx: &ExportContext<'_>, root: NodeId) -> Self {
        let slick = slick_options(ctx, root);
        let slick_u64 = |key: &str| slick.as_ref().and_then(|o| o.get(key)).and_then(Value::as_u64);
        let slick_bool = |key: &str| slick.as_ref().and_then(|o| o.get(key)).and_then(Value::as_bool);

        let slides_to_show = first_positive(ctx, root, &SLIDES_TO_SHOW_ATTRS)
            .or_else(|| slick_u64("slidesToShow").filter(|n| *n > 0))
            .unwrap_or(3);

        let arrows = slick_bool("arrows").unwrap_or(false) || ctx.has(root, ARROW_SELECTOR);
        let dots = slick_bool("dots").unwrap_or(false) || ctx.has(root, DOT_SELECTOR);
        let navigation = match (arrows, dots) {
            (true, true) => "both",
            (true, false) => "arrows",
            (false, true) => "dots",
            (false, false) => "none",
        };

        let autoplay_attr = ctx.attr(root, "data-autoplay");
        let autoplay = autoplay_attr
            .as_deref()
            .map(|v| !matches!(v.trim(), "false" | "0" | "no" | "off"))
            .unwrap_or(false)
            || ctx.classes(root).iter().any(|c| c.contains("autoplay"))
            || slick_bool("autoplay").unwrap_or(false);

        let autoplay_speed = first_positive(ctx, root, &AUTOPLAY_SPEED_ATTRS)
            .or_else(|| {
                autoplay_attr
                    .as_deref()
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .filter(|n| *n > 1)
            })
            .or_else(|| slick_u64("autoplaySpeed").filter(|n| *n > 0))
            .unwrap_or(3000);

        let fade = ctx.classes(root).iter().any(|c| c.contains("fade"))
            || ctx.attr(root, "data-effect").as_deref() == Some("fade")
            || slick_bool("fade").unwrap_or(false)
            || ctx.has(root, FADE_SELECTOR);

        Self {
            slides_to_show: slides_to_show.to_string(),
            slides_to_scroll: "1".into(),
            navigation: navigation.into(),
            autoplay,
            autoplay_speed,
            infinite: true,
            effect: if fade { "fade" } else { "slide" }.into(),
            speed: 500,
            thumbnail_size: "full".into(),
        }
    }
}

/// First positive integer among `attrs` on `root`, then on its descendants.
fn first_positive(ctx: &ExportContext<'_>, root: NodeId, attrs: &[&str]) -> Option<u64> {
    let parse = |node: NodeId| {
        attrs.iter().find_map(|name| {
            ctx.attr(node, name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
        })
    };
    parse(root).or_else(|| {
        let selector = attrs
            .iter()
            .map(|a| format!("[{a}]"))
            .collect::<Vec<_>>()
            .join(", ");
        ctx.select(root, &selector).into_iter().find_map(&parse)
    })
}

/// Slick's `data-slick` JSON options on the root or a descendant.
fn slick_options(ctx: &ExportContext<'_>, root: NodeId) -> Option<Map<String, Value>> {
    std::iter::once(root)
        .chain(ctx.select(root, "[data-slick]"))
        .find_map(|node| ctx.attr(node, "data-slick"))
        .and_then(|raw| serde_json::from_str::<Map<String, Value>>(&raw).ok())
}

/// `image-carousel`, following the slide and settings rules of
/// [`extract_slides`] and [`CarouselSettings`].
pub struct ImageCarouselMapper;

impl WidgetMapper for ImageCarouselMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::ImageCarousel
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let slides = extract_slides(ctx.page, node);
        let derived = CarouselSettings::derive(ctx, node);

        let mut carousel = Vec::with_capacity(slides.len());
        for slide in slides {
            let mut entry = json!({
                "_id": ctx.next_id(),
                "id": "",
                "url": slide.image_url,
            });
            if let Some(link) = slide.link {
                entry["link"] = link_value(&link);
            }
            carousel.push(entry);
        }

        let yes_or_no = |flag: bool| json!(if flag { "yes" } else { "no" });
        let mut settings = Map::new();
        settings.insert("carousel".into(), Value::Array(carousel));
        settings.insert("slides_to_show".into(), json!(derived.slides_to_show));
        settings.insert("slides_to_scroll".into(), json!(derived.slides_to_scroll));
        settings.insert("navigation".into(), json!(derived.navigation));
        settings.insert("autoplay".into(), yes_or_no(derived.autoplay));
        settings.insert("autoplay_speed".into(), json!(derived.autoplay_speed));
        settings.insert("infinite".into(), yes_or_no(derived.infinite));
        settings.insert("effect".into(), json!(derived.effect));
        settings.insert("speed".into(), json!(derived.speed));
        settings.insert("thumbnail_size".into(), json!(derived.thumbnail_size));
        Ok(ElementorWidget::widget(ctx.next_id(), "image-carousel", settings))
    }
}

// ── Video playlist ───────────────────────────────────────────────────────────

/// `video-playlist`: one tab per embedded player; title from the player's
/// `title` attribute (`Video N` otherwise), playlist title from the first
/// heading (`Playlist` otherwise).
pub struct VideoPlaylistMapper;

impl WidgetMapper for VideoPlaylistMapper {
    fn component_type(&self) -> ComponentType {
        ComponentType::VideoPlaylist
    }

    fn map(
        &self,
        component: &RecognizedComponent,
        ctx: &mut ExportContext<'_>,
    ) -> PageliftResult<ElementorWidget> {
        let node = component.element;
        let players = ctx.select(node, "iframe, video");

        let mut tabs = Vec::with_capacity(players.len());
        for (i, player) in players.into_iter().enumerate() {
            let src = video_src(ctx, player).unwrap_or_default();
            let (kind, url) = classify_video(&src);
            let title = ctx
                .attr(player, "title")
                .unwrap_or_else(|| format!("Video {}", i + 1));
            let mut entry = json!({
                "_id": ctx.next_id(),
                "type": kind.as_str(),
                "title": title,
            });
            entry[url_key(kind)] = video_url_value(kind, &url);
            tabs.push(entry);
        }

        let playlist_title = ctx
            .text_of(node, "h1, h2, h3, h4")
            .unwrap_or_else(|| "Playlist".to_string());
        let mut settings = Map::new();
        settings.insert("playlist_title".into(), json!(playlist_title));
        settings.insert("tabs".into(), Value::Array(tabs));
        Ok(ElementorWidget::widget(ctx.next_id(), "video-playlist", settings))
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
    fn test_slick_slides_with_links() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "slick-slider").attr(root, "data-slides-to-show", "4");
        let track = b.child(root, "div");
        for (i, linked) in [true, false].iter().enumerate() {
            let slide = b.child(track, "div");
            b.class(slide, "slick-slide");
            let parent = if *linked {
                let a = b.child(slide, "a");
                b.attr(a, "href", "/promo");
                a
            } else {
                slide
            };
            let img = b.child(parent, "img");
            b.attr(img, "data-lazy", &format!("/img/{i}.jpg"));
        }
        let clone = b.child(track, "div");
        b.class(clone, "slick-slide slick-cloned");
        b.child(clone, "img");
        let dots = b.child(root, "ul");
        b.class(dots, "slick-dots");
        let snap = b.build();

        let slides = extract_slides(&snap, root);
        assert_eq!(
            slides,
            vec![
                Slide { image_url: "/img/0.jpg".into(), link: Some("/promo".into()) },
                Slide { image_url: "/img/1.jpg".into(), link: None },
            ]
        );

        let w = export_one(&snap, ComponentType::ImageCarousel, root);
        assert_eq!(w.settings["slides_to_show"], "4");
        assert_eq!(w.settings["navigation"], "dots");
        assert_eq!(w.settings["carousel"][0]["link"]["url"], "/promo");
    }

    #[test]
    fn test_carousel_defaults() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "gallery");
        let img = b.child(root, "img");
        b.attr(img, "src", "/a.jpg");
        let snap = b.build();

        let w = export_one(&snap, ComponentType::ImageCarousel, root);
        assert_eq!(w.widget_type.as_deref(), Some("image-carousel"));
        let s = &w.settings;
        assert_eq!(s["slides_to_show"], "3");
        assert_eq!(s["slides_to_scroll"], "1");
        assert_eq!(s["navigation"], "none");
        assert_eq!(s["autoplay"], "no");
        assert_eq!(s["autoplay_speed"], 3000);
        assert_eq!(s["infinite"], "yes");
        assert_eq!(s["effect"], "slide");
        assert_eq!(s["speed"], 500);
        assert_eq!(s["thumbnail_size"], "full");
    }

    #[test]
    fn test_carousel_reads_slick_options_and_autoplay() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        b.class(root, "slick-slider autoplay")
            .attr(root, "data-slick", r#"{"slidesToShow": 2, "fade": true, "arrows": true, "autoplaySpeed": 5000}"#);
        let slide = b.child(root, "div");
        b.class(slide, "slick-slide");
        let img = b.child(slide, "img");
        b.attr(img, "src", "/x.jpg");
        let snap = b.build();

        let exporter = ElementorExporter::default();
        let ctx = ExportContext::new(&snap, &exporter);
        let s = CarouselSettings::derive(&ctx, root);
        assert_eq!(s.slides_to_show, "2");
        assert!(s.autoplay);
        assert_eq!(s.autoplay_speed, 5000);
        assert_eq!(s.effect, "fade");
        assert_eq!(s.navigation, "arrows");
    }

    #[test]
    fn test_youtube_embed_is_canonicalized() {
        let (kind, url) = classify_video("https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1");
        assert_eq!(kind, VideoKind::Youtube);
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        let (kind, url) = classify_video("https://player.vimeo.com/video/76979871");
        assert_eq!(kind, VideoKind::Vimeo);
        assert_eq!(url, "https://vimeo.com/76979871");
        assert_eq!(classify_video("/media/intro.mp4").0, VideoKind::Hosted);
    }

    #[test]
    fn test_video_flags() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let video = b.root("video");
        b.attr(video, "src", "/intro.mp4").attr(video, "muted", "").attr(video, "loop", "");
        let snap = b.build();
        let w = export_one(&snap, ComponentType::Video, video);
        assert_eq!(w.settings["video_type"], "hosted");
        assert_eq!(w.settings["hosted_url"]["url"], "/intro.mp4");
        assert_eq!(w.settings["mute"], "yes");
        assert_eq!(w.settings["loop"], "yes");
        assert_eq!(w.settings["autoplay"], "");
        assert_eq!(w.settings["controls"], "");
    }

    #[test]
    fn test_playlist_tabs() {
        let mut b = SnapshotBuilder::new(Viewport::default());
        let root = b.root("div");
        let h = b.child(root, "h3");
        b.text(h, "Tutorials");
        for id in ["abc", "def"] {
            let f = b.child(root, "iframe");
            b.attr(f, "src", &format!("https://www.youtube.com/embed/{id}"));
        }
        let snap = b.build();
        let w = export_one(&snap, ComponentType::VideoPlaylist, root);
        assert_eq!(w.settings["playlist_title"], "Tutorials");
        let tabs = w.settings["tabs"].as_array().unwrap();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1]["title"], "Video 2");
        assert_eq!(tabs[1]["youtube_url"], "https://www.youtube.com/watch?v=def");
    }
}
