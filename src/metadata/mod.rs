//! Page-metadata extraction for external story links.
//!
//! ```text
//! url → FetchCache (HTML only) → parse memo (by body hash) → resolve → PageMetadata
//! ```
//!
//! Failure of any kind (timeout, non-HTML body, transport error) yields an empty
//! [`PageMetadata`]; a broken preview never blocks the item it decorates.

mod config;
mod extractor;

pub use config::MetadataConfig;
pub use extractor::{ContentExtractor, PageCandidates};

use std::sync::Arc;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use sha2::{Digest, Sha256};
use tracing::debug;
use url::Url;

use crate::app::Result;
use crate::cache::{FetchCache, Resolution};
use crate::domain::PageMetadata;
use crate::fetcher::{is_html, Fetcher};

pub struct MetadataExtractor {
    fetcher: Arc<dyn Fetcher>,
    pages: FetchCache<Option<Arc<str>>>,
    parsed: Cache<String, Arc<PageCandidates>>,
    extractor: ContentExtractor,
    config: MetadataConfig,
}

impl MetadataExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: MetadataConfig) -> Result<Self> {
        let parsed: Cache<String, Arc<PageCandidates>> = Cache::builder()
            .max_capacity(config.parse_cache_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Ok(Self {
            fetcher,
            pages: FetchCache::new("pages"),
            parsed,
            extractor: ContentExtractor::new()?,
            config,
        })
    }

    /// HTML bodies by URL; `None` marks a non-HTML response.
    pub fn pages(&self) -> &FetchCache<Option<Arc<str>>> {
        &self.pages
    }

    /// Parse `url` if it points somewhere real, or `None` for absent, invalid
    /// and placeholder URLs.
    pub fn target(&self, url: Option<&str>) -> Option<Url> {
        let url = Url::parse(url?).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        match url.host_str() {
            Some(host) if host != self.config.placeholder_host => Some(url),
            _ => None,
        }
    }

    /// Favicon, preview image and site name for `url`.
    pub async fn extract(&self, url: Option<&str>) -> PageMetadata {
        let Some(page_url) = self.target(url) else {
            return PageMetadata::default();
        };

        let key = page_url.to_string();
        let fetcher = self.fetcher.clone();
        let max_bytes = self.config.max_body_bytes;
        let request = self.pages.request(Some(key.as_str()), move |u| {
            fetch_html(fetcher.clone(), u, max_bytes)
        });

        let html = match tokio::time::timeout(self.config.timeout(), request).await {
            Ok(Resolution::Ready(Some(html))) => html,
            Ok(Resolution::Ready(None)) => {
                debug!("{} is not HTML, skipping metadata", key);
                return PageMetadata::default();
            }
            Ok(Resolution::Failed(e)) => {
                debug!("metadata fetch for {} failed: {}", key, e);
                return PageMetadata::default();
            }
            Ok(Resolution::Pending) => return PageMetadata::default(),
            Err(_) => {
                debug!(
                    "metadata fetch for {} exceeded {:?}",
                    key,
                    self.config.timeout()
                );
                return PageMetadata::default();
            }
        };

        self.candidates(&html).resolve(&page_url)
    }

    /// Parse `html`, reusing an earlier parse of an identical body.
    pub fn candidates(&self, html: &str) -> Arc<PageCandidates> {
        let digest = hex::encode(Sha256::digest(html.as_bytes()));

        if let Some(hit) = self.parsed.get(&digest) {
            debug!("parse cache hit for {}", &digest[..12]);
            return hit;
        }

        let candidates = Arc::new(self.extractor.candidates(html));
        self.parsed.insert(digest, candidates.clone());
        candidates
    }

    /// Number of memoized parses currently held.
    pub fn parsed_count(&self) -> u64 {
        self.parsed.run_pending_tasks();
        self.parsed.entry_count()
    }
}

async fn fetch_html(
    fetcher: Arc<dyn Fetcher>,
    url: String,
    max_bytes: usize,
) -> Result<Option<Arc<str>>> {
    let Some(response) = fetcher.fetch_if(&url, is_html, max_bytes).await? else {
        debug!("{} is not HTML, body skipped", url);
        return Ok(None);
    };

    Ok(Some(Arc::from(String::from_utf8_lossy(&response.body).into_owned())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::fetcher::mock::MockFetcher;

    const PAGE: &str = r#"<html><head>
        <link rel="icon" href="/icon.png">
        <meta name="og:image" content="/preview.jpg">
        <meta name="application-name" content="Example">
    </head><body></body></html>"#;

    fn extractor(mock: Arc<MockFetcher>, config: MetadataConfig) -> MetadataExtractor {
        MetadataExtractor::new(mock, config).unwrap()
    }

    #[tokio::test]
    async fn test_extracts_from_html_page() {
        let mock = Arc::new(MockFetcher::new());
        mock.html("https://example.com/post", PAGE);
        let extractor = extractor(mock, MetadataConfig::default());

        let meta = extractor.extract(Some("https://example.com/post")).await;

        assert_eq!(meta.favicon.as_deref(), Some("https://example.com/icon.png"));
        assert_eq!(meta.image.as_deref(), Some("https://example.com/preview.jpg"));
        assert_eq!(meta.application_name.as_deref(), Some("Example"));
    }

    #[tokio::test]
    async fn test_non_html_is_not_parsed() {
        let mock = Arc::new(MockFetcher::new());
        mock.respond("https://example.com/paper.pdf", Some("application/pdf"), "%PDF-1.7");
        let extractor = extractor(mock, MetadataConfig::default());

        let meta = extractor.extract(Some("https://example.com/paper.pdf")).await;

        assert_eq!(meta, PageMetadata::default());
        assert!(meta.is_empty());
        assert_eq!(extractor.parsed_count(), 0);
        assert_eq!(extractor.pages().get("https://example.com/paper.pdf"), Some(None));
    }

    #[tokio::test]
    async fn test_non_html_body_is_never_downloaded() {
        let mock = Arc::new(MockFetcher::new());
        let pdf = "https://example.com/paper.pdf";
        mock.respond(pdf, Some("application/pdf"), "%PDF-1.7 lots of bytes");
        mock.html("https://example.com/post", PAGE);
        let extractor = extractor(mock.clone(), MetadataConfig::default());

        assert!(extractor.extract(Some(pdf)).await.is_empty());
        extractor.extract(Some("https://example.com/post")).await;

        assert_eq!(mock.calls(pdf), 1);
        assert_eq!(mock.body_reads(pdf), 0);
        assert_eq!(mock.body_reads("https://example.com/post"), 1);
    }

    #[tokio::test]
    async fn test_html_body_is_capped() {
        let mock = Arc::new(MockFetcher::new());
        let url = "https://example.com/huge";
        mock.html(url, PAGE);
        let config = MetadataConfig {
            max_body_bytes: 16,
            ..Default::default()
        };
        let extractor = extractor(mock, config);

        extractor.extract(Some(url)).await;

        let body = extractor.pages().get(url).flatten().unwrap();
        assert_eq!(body.len(), 16);
        assert!(PAGE.starts_with(&*body));
    }

    #[tokio::test]
    async fn test_skipped_urls_issue_no_request() {
        let mock = Arc::new(MockFetcher::new());
        let extractor = extractor(mock.clone(), MetadataConfig::default());

        assert!(extractor.extract(None).await.is_empty());
        assert!(extractor.extract(Some("http://localhost")).await.is_empty());
        assert!(extractor.extract(Some("not a url")).await.is_empty());
        assert!(extractor.extract(Some("mailto:a@example.com")).await.is_empty());
        assert_eq!(mock.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_yields_empty_metadata() {
        let mock = Arc::new(MockFetcher::new());
        mock.fail("https://down.example.com/", "connection refused");
        let extractor = extractor(mock, MetadataConfig::default());

        let meta = extractor.extract(Some("https://down.example.com/")).await;
        assert!(meta.is_empty());
    }

    #[tokio::test]
    async fn test_slow_page_times_out_then_completes_in_background() {
        let mock = Arc::new(MockFetcher::new());
        mock.html("https://slow.example.com/", PAGE);
        mock.set_delay(Duration::from_millis(200));
        let config = MetadataConfig {
            timeout_ms: 20,
            ..Default::default()
        };
        let extractor = extractor(mock.clone(), config);

        let first = extractor.extract(Some("https://slow.example.com/")).await;
        assert!(first.is_empty());

        tokio::time::sleep(Duration::from_millis(400)).await;
        let second = extractor.extract(Some("https://slow.example.com/")).await;

        assert_eq!(second.application_name.as_deref(), Some("Example"));
        assert_eq!(mock.calls("https://slow.example.com/"), 1);
    }

    #[tokio::test]
    async fn test_identical_bodies_parse_once() {
        let mock = Arc::new(MockFetcher::new());
        mock.html("https://a.example.com/", PAGE);
        mock.html("https://b.example.com/", PAGE);
        let extractor = extractor(mock, MetadataConfig::default());

        let a = extractor.extract(Some("https://a.example.com/")).await;
        let b = extractor.extract(Some("https://b.example.com/")).await;

        assert_eq!(extractor.parsed_count(), 1);
        assert_eq!(a.favicon.as_deref(), Some("https://a.example.com/icon.png"));
        assert_eq!(b.favicon.as_deref(), Some("https://b.example.com/icon.png"));
    }

    #[tokio::test]
    async fn test_concurrent_extracts_share_fetch() {
        let mock = Arc::new(MockFetcher::new());
        mock.html("https://example.com/post", PAGE);
        mock.set_delay(Duration::from_millis(10));
        let extractor = extractor(mock.clone(), MetadataConfig::default());

        let url = Some("https://example.com/post");
        let (a, b, c) = tokio::join!(
            extractor.extract(url),
            extractor.extract(url),
            extractor.extract(url)
        );

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(mock.calls("https://example.com/post"), 1);
    }
}
