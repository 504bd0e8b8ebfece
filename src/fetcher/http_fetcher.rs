use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};

use crate::app::{HnError, Result};
use crate::fetcher::{AcceptFn, FetchResult, Fetcher};

pub const DEFAULT_USER_AGENT: &str = "hnwire/0.1.0";

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_options(Duration::from_secs(10), DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }

    /// Send the request and check the status; the body is left unread.
    async fn send(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(HnError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn content_type(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let response = self.send(url).await?;
        let status = response.status().as_u16();
        let content_type = content_type(&response);
        let body = response.bytes().await?.to_vec();

        Ok(FetchResult {
            status,
            content_type,
            body,
        })
    }

    async fn fetch_if(
        &self,
        url: &str,
        accept: AcceptFn,
        max_bytes: usize,
    ) -> Result<Option<FetchResult>> {
        let mut response = self.send(url).await?;
        let status = response.status().as_u16();
        let content_type = content_type(&response);

        if !accept(content_type.as_deref()) {
            tracing::debug!("{} declared {:?}, body not read", url, content_type);
            return Ok(None);
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = max_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!("{} truncated at {} bytes", url, max_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(Some(FetchResult {
            status,
            content_type,
            body,
        }))
    }
}
