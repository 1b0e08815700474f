//! HTML extraction strategies for the LCSC scraping fallbacks.
//!
//! Each strategy is a pure function over a parsed document that either yields
//! a URL or nothing; the chain drivers try them in a fixed order and return
//! the first hit. Keeping them pure lets every strategy be tested against
//! fixture HTML with no network involved.

use scraper::{Html, Selector};

/// Resolve `candidate` against `base` when it is relative.
fn resolve(base: &str, candidate: &str) -> Option<String> {
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }
    let base = reqwest::Url::parse(base).ok()?;
    base.join(candidate).ok().map(|url| url.to_string())
}

/// Scan free text for the first `http(s)` URL containing `needle`.
/// URLs are terminated at quotes, whitespace, and bracket characters.
fn find_url_containing(text: &str, needle: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find("http") {
        let start = search_from + offset;
        let tail = &text[start..];
        if !(tail.starts_with("http://") || tail.starts_with("https://")) {
            search_from = start + 4;
            continue;
        }
        let end = tail
            .find(|c: char| {
                c == '"' || c == '\'' || c == ')' || c == '(' || c == '<' || c.is_whitespace()
            })
            .unwrap_or(tail.len());
        let url = &tail[..end];
        if url.to_ascii_lowercase().contains(needle) {
            return Some(url.to_string());
        }
        search_from = start + end.max(4);
    }
    None
}

fn select<'a>(document: &'a Html, selector: &str) -> Vec<scraper::ElementRef<'a>> {
    Selector::parse(selector)
        .ok()
        .map(|sel| document.select(&sel).collect())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Datasheet strategies
// ---------------------------------------------------------------------------

/// First anchor whose `href` points at a PDF.
fn anchor_pdf_href(document: &Html) -> Option<String> {
    select(document, "a[href]").into_iter().find_map(|a| {
        let href = a.value().attr("href")?;
        let lower = href.to_ascii_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or(&lower);
        path.ends_with(".pdf").then(|| href.to_string())
    })
}

/// First `<iframe>` whose `src` embeds a PDF viewer.
fn iframe_pdf_src(document: &Html) -> Option<String> {
    select(document, "iframe[src]").into_iter().find_map(|frame| {
        let src = frame.value().attr("src")?;
        src.to_ascii_lowercase()
            .contains(".pdf")
            .then(|| src.to_string())
    })
}

/// PDF URL buried in an `onclick` handler (e.g. `onclick="open('...pdf')"`)
fn onclick_pdf_url(document: &Html) -> Option<String> {
    select(document, "[onclick]")
        .into_iter()
        .find_map(|element| find_url_containing(element.value().attr("onclick")?, ".pdf"))
}

/// PDF URL embedded in an inline script body.
fn inline_script_pdf_url(document: &Html) -> Option<String> {
    select(document, "script")
        .into_iter()
        .find_map(|script| find_url_containing(&script.inner_html(), ".pdf"))
}

/// `<meta http-equiv="refresh" content="0; url=...">` redirect target.
fn meta_refresh_url(document: &Html) -> Option<String> {
    select(document, "meta[http-equiv]")
        .into_iter()
        .find_map(|meta| {
            let equiv = meta.value().attr("http-equiv")?;
            if !equiv.eq_ignore_ascii_case("refresh") {
                return None;
            }
            let content = meta.value().attr("content")?;
            let (_, target) = content.split_once('=')?;
            let target = target.trim().trim_matches(['\'', '"']);
            (!target.is_empty()).then(|| target.to_string())
        })
}

/// Find the intermediate datasheet page link on an LCSC product page.
///
/// LCSC product pages do not link the PDF directly; they link a datasheet
/// landing page matching a known URL pattern which in turn embeds the
/// document.
pub(crate) fn find_intermediate_datasheet_link(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    select(&document, "a[href]")
        .into_iter()
        .find_map(|a| {
            let href = a.value().attr("href")?;
            let lower = href.to_ascii_lowercase();
            (lower.contains("datasheet.lcsc.com") || lower.contains("lcsc.com/datasheet/"))
                .then(|| href.to_string())
        })
        .and_then(|href| resolve(page_url, &href))
}

/// Run the datasheet strategies in order against an intermediate datasheet
/// page and return the first direct PDF URL found.
pub(crate) fn extract_datasheet_pdf(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let strategies: &[(&str, fn(&Html) -> Option<String>)] = &[
        ("anchor_href", anchor_pdf_href),
        ("iframe_src", iframe_pdf_src),
        ("onclick", onclick_pdf_url),
        ("inline_script", inline_script_pdf_url),
        ("meta_refresh", meta_refresh_url),
    ];
    for (name, strategy) in strategies {
        if let Some(url) = strategy(&document) {
            tracing::debug!(strategy = name, url = %url, "Datasheet strategy matched");
            return resolve(page_url, &url);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Image strategies
// ---------------------------------------------------------------------------

/// Open Graph `og:image` meta tag.
fn og_image(document: &Html) -> Option<String> {
    select(document, r#"meta[property="og:image"]"#)
        .into_iter()
        .find_map(|meta| meta.value().attr("content").map(str::to_string))
}

/// `image` field of a JSON-LD structured-data block.
fn json_ld_image(document: &Html) -> Option<String> {
    select(document, r#"script[type="application/ld+json"]"#)
        .into_iter()
        .find_map(|script| {
            let value: serde_json::Value = serde_json::from_str(&script.inner_html()).ok()?;
            match value.get("image")? {
                serde_json::Value::String(url) => Some(url.clone()),
                serde_json::Value::Array(items) => items
                    .first()
                    .and_then(|item| item.as_str())
                    .map(str::to_string),
                _ => None,
            }
        })
}

/// `background-image: url(...)` in an inline style attribute.
fn background_image_style(document: &Html) -> Option<String> {
    select(document, "[style]").into_iter().find_map(|element| {
        let style = element.value().attr("style")?;
        let start = style.find("background-image")?;
        let tail = &style[start..];
        let open = tail.find("url(")?;
        let inner = &tail[open + 4..];
        let close = inner.find(')')?;
        let url = inner[..close].trim().trim_matches(['\'', '"']);
        (!url.is_empty()).then(|| url.to_string())
    })
}

/// Product `<img>` tags, tried with the most specific selectors first.
fn product_img_tag(document: &Html) -> Option<String> {
    const SELECTORS: &[&str] = &[
        "img.product-image",
        "img#product-image",
        ".product-photo img",
        ".product-img img",
        r#"img[alt*="product"]"#,
    ];
    SELECTORS.iter().find_map(|selector| {
        select(document, selector)
            .into_iter()
            .find_map(|img| img.value().attr("src").map(str::to_string))
    })
}

/// Run the image strategies in order against a product page.
pub(crate) fn extract_image_url(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let strategies: &[(&str, fn(&Html) -> Option<String>)] = &[
        ("og_image", og_image),
        ("json_ld", json_ld_image),
        ("background_style", background_image_style),
        ("img_tag", product_img_tag),
    ];
    for (name, strategy) in strategies {
        if let Some(url) = strategy(&document) {
            tracing::debug!(strategy = name, url = %url, "Image strategy matched");
            return resolve(page_url, &url);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "https://www.lcsc.com/product-detail/C98220.html";

    #[test]
    fn anchor_strategy_finds_pdf_link() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://datasheet.lcsc.com/lcsc/RC0603FR.pdf?v=2">Download</a>
        </body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert_eq!(url, "https://datasheet.lcsc.com/lcsc/RC0603FR.pdf?v=2");
    }

    #[test]
    fn iframe_strategy_used_when_no_anchor() {
        let html = r#"<html><body>
            <iframe src="https://datasheet.lcsc.com/view/RC0603FR.pdf#toolbar=0"></iframe>
        </body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert!(url.contains("RC0603FR.pdf"));
    }

    #[test]
    fn onclick_strategy_extracts_quoted_url() {
        let html = r#"<html><body>
            <button onclick="window.open('https://datasheet.lcsc.com/RC0603FR.pdf')">View</button>
        </body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert_eq!(url, "https://datasheet.lcsc.com/RC0603FR.pdf");
    }

    #[test]
    fn inline_script_strategy_scans_script_bodies() {
        let html = r#"<html><head><script>
            var doc = "https://datasheet.lcsc.com/RC0603FR.pdf";
        </script></head><body></body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert_eq!(url, "https://datasheet.lcsc.com/RC0603FR.pdf");
    }

    #[test]
    fn meta_refresh_strategy_is_last_resort() {
        let html = r#"<html><head>
            <meta http-equiv="refresh" content="0; url=https://datasheet.lcsc.com/RC0603FR.pdf">
        </head><body></body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert_eq!(url, "https://datasheet.lcsc.com/RC0603FR.pdf");
    }

    #[test]
    fn strategies_tried_in_order() {
        // Both an anchor and an iframe are present; the anchor wins.
        let html = r#"<html><body>
            <iframe src="https://datasheet.lcsc.com/from-iframe.pdf"></iframe>
            <a href="https://datasheet.lcsc.com/from-anchor.pdf">Download</a>
        </body></html>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert!(url.ends_with("from-anchor.pdf"));
    }

    #[test]
    fn no_strategy_match_returns_none() {
        let html = "<html><body><p>Nothing to see</p></body></html>";
        assert!(extract_datasheet_pdf(html, PAGE).is_none());
    }

    #[test]
    fn relative_href_resolved_against_page() {
        let html = r#"<a href="/files/RC0603FR.pdf">Download</a>"#;
        let url = extract_datasheet_pdf(html, PAGE).unwrap();
        assert_eq!(url, "https://www.lcsc.com/files/RC0603FR.pdf");
    }

    #[test]
    fn intermediate_link_matched_by_pattern() {
        let html = r#"<html><body>
            <a href="/about">About</a>
            <a href="https://www.lcsc.com/datasheet/lcsc_datasheet_C98220.pdf">Datasheet</a>
        </body></html>"#;
        let url = find_intermediate_datasheet_link(html, PAGE).unwrap();
        assert!(url.contains("lcsc.com/datasheet/"));
    }

    #[test]
    fn og_image_preferred_over_img_tag() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://assets.lcsc.com/images/og.jpg">
        </head><body>
            <img class="product-image" src="https://assets.lcsc.com/images/tag.jpg">
        </body></html>"#;
        let url = extract_image_url(html, PAGE).unwrap();
        assert!(url.ends_with("og.jpg"));
    }

    #[test]
    fn json_ld_image_field_extracted() {
        let html = r#"<html><head>
            <script type="application/ld+json">
                {"@type": "Product", "image": ["https://assets.lcsc.com/images/ld.jpg"]}
            </script>
        </head><body></body></html>"#;
        let url = extract_image_url(html, PAGE).unwrap();
        assert!(url.ends_with("ld.jpg"));
    }

    #[test]
    fn background_image_style_extracted() {
        let html = r#"<div style="width:10px;background-image: url('https://assets.lcsc.com/images/bg.jpg');"></div>"#;
        let url = extract_image_url(html, PAGE).unwrap();
        assert!(url.ends_with("bg.jpg"));
    }

    #[test]
    fn product_img_selector_resolves_relative_src() {
        let html = r#"<div class="product-photo"><img src="/images/part.jpg"></div>"#;
        let url = extract_image_url(html, PAGE).unwrap();
        assert_eq!(url, "https://www.lcsc.com/images/part.jpg");
    }

    #[test]
    fn image_chain_returns_none_when_empty() {
        assert!(extract_image_url("<html></html>", PAGE).is_none());
    }
}
