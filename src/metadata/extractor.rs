use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{HnError, Result};
use crate::domain::PageMetadata;

// Priority order; the first usable match wins.
const FAVICON_SELECTORS: &[&str] = &[
    r#"link[rel="apple-touch-icon"]"#,
    r#"link[rel="icon"]"#,
    r#"link[rel="shortcut icon"]"#,
];

const IMAGE_SELECTORS: &[&str] = &[
    r#"meta[name="og:image"]"#,
    r#"meta[name="og:image:url"]"#,
    r#"meta[name="og:image:secure_url"]"#,
    r#"meta[name="twitter:image"]"#,
    "main article figure img",
    "article figure img",
    "main figure img",
    "figure img",
];

const APPLICATION_NAME_SELECTORS: &[&str] = &[r#"meta[name="application-name"]"#];

/// Raw attribute values pulled out of a page, not yet resolved against its URL.
///
/// Independent of the page URL, so identical bodies share one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageCandidates {
    pub favicons: Vec<String>,
    pub images: Vec<String>,
    pub application_names: Vec<String>,
}

impl PageCandidates {
    /// Resolve candidates for the page at `page_url`.
    ///
    /// Favicons resolve against the origin and fall back to `/favicon.ico`;
    /// images resolve against the page itself.
    pub fn resolve(&self, page_url: &Url) -> PageMetadata {
        let origin = Url::parse(&page_url.origin().ascii_serialization())
            .unwrap_or_else(|_| page_url.clone());

        let favicon = self
            .favicons
            .iter()
            .find_map(|href| origin.join(href).ok())
            .or_else(|| page_url.join("/favicon.ico").ok())
            .map(String::from);

        let image = self
            .images
            .iter()
            .find_map(|src| page_url.join(src).ok())
            .map(String::from);

        PageMetadata {
            favicon,
            image,
            application_name: self.application_names.first().cloned(),
        }
    }
}

/// Compiled selectors for favicon, preview image and site name lookup.
pub struct ContentExtractor {
    favicons: Vec<Selector>,
    images: Vec<Selector>,
    application_names: Vec<Selector>,
}

impl ContentExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            favicons: compile(FAVICON_SELECTORS)?,
            images: compile(IMAGE_SELECTORS)?,
            application_names: compile(APPLICATION_NAME_SELECTORS)?,
        })
    }

    pub fn candidates(&self, html: &str) -> PageCandidates {
        let document = Html::parse_document(html);

        PageCandidates {
            favicons: collect(&document, &self.favicons, &["href"]),
            images: collect(&document, &self.images, &["content", "src"]),
            application_names: collect(&document, &self.application_names, &["content"]),
        }
    }
}

fn compile(selectors: &[&str]) -> Result<Vec<Selector>> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).map_err(|e| HnError::Other(format!("Selector error: {:?}", e))))
        .collect()
}

/// Non-empty, non-SVG attribute values in selector priority, then document order.
fn collect(document: &Html, selectors: &[Selector], attrs: &[&str]) -> Vec<String> {
    selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|element| first_attr(element, attrs))
        .filter(|value| !is_svg(value))
        .map(|value| value.trim().to_string())
        .collect()
}

fn first_attr<'a>(element: ElementRef<'a>, attrs: &[&str]) -> Option<&'a str> {
    attrs
        .iter()
        .filter_map(|attr| element.value().attr(attr))
        .find(|value| !value.trim().is_empty())
}

fn is_svg(value: &str) -> bool {
    let path = value.split(['?', '#']).next().unwrap_or(value);
    path.trim().to_ascii_lowercase().ends_with(".svg")
}
