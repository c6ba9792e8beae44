//! HTML extraction for crawled pages
//!
//! This module turns a fetched HTML document into the page record the index
//! engine stores:
//! - Title and meta description
//! - Visible body text, paragraphs and headers
//! - Images (src and alt text)
//! - Links to follow (absolute http(s) URLs)

use crate::storage::{Header, Image, NewPage};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text never counts as page content
const NON_CONTENT_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Everything extracted from one HTML page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// The URL the page was fetched from
    pub url: String,
    pub title: String,
    pub description: String,
    /// Visible body text, whitespace-collapsed
    pub content: String,
    pub paragraphs: Vec<String>,
    pub links: Vec<String>,
    pub headers: Vec<Header>,
    pub images: Vec<Image>,
    /// Set when the page has neither a title nor any body text
    pub invalid: bool,
}

impl ExtractedPage {
    /// The subset of the page that goes into `processed_pages`
    pub fn to_new_page(&self) -> NewPage {
        NewPage {
            link: self.url.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            description: self.description.clone(),
            paragraphs: self.paragraphs.clone(),
            links: self.links.clone(),
            headers: self.headers.clone(),
        }
    }
}

/// Parses HTML content and extracts the page record
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` tags, resolved against `base_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use dex_crawler::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hi</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract_page(html, &base_url);
/// assert_eq!(page.title, "Test");
/// assert_eq!(page.links, vec!["https://example.com/page"]);
/// ```
pub fn extract_page(html: &str, base_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_default();
    let content = extract_body_text(&document);
    let invalid = title.is_empty() && content.is_empty();

    ExtractedPage {
        url: base_url.to_string(),
        description: extract_description(&document).unwrap_or_default(),
        paragraphs: extract_paragraphs(&document),
        links: extract_links(&document, base_url),
        headers: extract_headers(&document),
        images: extract_images(&document, base_url),
        title,
        content,
        invalid,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description'][content]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Collects visible text under `<body>`, skipping scripts and styles
fn extract_body_text(document: &Html) -> String {
    let body_selector = match Selector::parse("body") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };
    let body = match document.select(&body_selector).next() {
        Some(body) => body,
        None => return String::new(),
    };

    let mut chunks = Vec::new();
    for node in body.descendants() {
        let text = match node.value().as_text() {
            Some(text) => text,
            None => continue,
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| NON_CONTENT_ELEMENTS.contains(&element.name()))
            .unwrap_or(false);
        if !hidden {
            chunks.push(&**text);
        }
    }

    collapse_whitespace(&chunks.join(" "))
}

fn extract_paragraphs(document: &Html) -> Vec<String> {
    let selector = match Selector::parse("p") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn extract_headers(document: &Html) -> Vec<Header> {
    let selector = match Selector::parse("h1, h2, h3, h4, h5, h6") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let content = element_text(element);
            if content.is_empty() {
                return None;
            }
            Some(Header {
                kind: element.value().name().to_string(),
                content,
            })
        })
        .collect()
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<Image> {
    let selector = match Selector::parse("img[src]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let src = element.value().attr("src")?;
            let src = resolve_link(src, base_url)?;
            Some(Image {
                src,
                alt: element.value().attr("alt").map(str::to_string),
            })
        })
        .collect()
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
