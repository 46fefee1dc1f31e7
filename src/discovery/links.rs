use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("a[href], area[href], form[action], iframe[src], frame[src]")
        .expect("static link selector")
});

static BASE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("base[href]").expect("static base selector"));

static STATIC_ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\.(png|jpe?g|gif|bmp|webp|svg|ico|css|js|mjs|map|woff2?|ttf|otf|eot|mp3|mp4|webm|ogg|wav|avi|mov|pdf|zip|gz|tgz|tar|rar|7z)$",
    )
    .expect("static asset pattern")
});

const NON_NAVIGABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Extracts navigable link targets from an HTML page, resolved to absolute
/// URLs against the page (or its `<base href>`).
pub fn extract_links(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let base = document
        .select(&BASE_SELECTOR)
        .next()
        .and_then(|e| e.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .unwrap_or_else(|| page_url.clone());

    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| {
            let attr = match element.value().name() {
                "form" => "action",
                "iframe" | "frame" => "src",
                _ => "href",
            };
            element.value().attr(attr)
        })
        .filter_map(|raw| resolve_link(&base, raw))
        .collect()
}

fn resolve_link(base: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if NON_NAVIGABLE_SCHEMES.iter().any(|s| lower.starts_with(s)) {
        return None;
    }

    let url = base.join(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || STATIC_ASSET.is_match(url.path()) {
        return None;
    }

    Some(url)
}

/// Missing content types are treated as HTML.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_none_or(|ct| ct.to_ascii_lowercase().contains("html"))
}
