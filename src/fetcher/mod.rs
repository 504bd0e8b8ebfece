pub mod http_fetcher;
pub mod parallel;

use async_trait::async_trait;

use crate::app::Result;

/// A successfully received response.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Decides from the declared content type whether a body is worth reading.
pub type AcceptFn = fn(Option<&str>) -> bool;

/// Whether a declared content type is HTML.
pub fn is_html(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResult>;

    /// GET `url` but read the body only if `accept` approves the declared
    /// content type, and no more than `max_bytes` of it.
    ///
    /// Returns `Ok(None)` when the body was refused.
    async fn fetch_if(
        &self,
        url: &str,
        accept: AcceptFn,
        max_bytes: usize,
    ) -> Result<Option<FetchResult>>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory fetcher for tests.

    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::app::HnError;

    #[derive(Clone)]
    enum Reply {
        Ok(FetchResult),
        Fail(String),
    }

    #[derive(Default)]
    pub struct MockFetcher {
        routes: Mutex<HashMap<String, Reply>>,
        calls: Mutex<HashMap<String, usize>>,
        body_reads: Mutex<HashMap<String, usize>>,
        delay: Mutex<Option<Duration>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn json(&self, url: &str, body: &str) {
            self.respond(url, Some("application/json"), body);
        }

        pub fn html(&self, url: &str, body: &str) {
            self.respond(url, Some("text/html; charset=utf-8"), body);
        }

        pub fn respond(&self, url: &str, content_type: Option<&str>, body: &str) {
            self.routes.lock().unwrap().insert(
                url.to_string(),
                Reply::Ok(FetchResult {
                    status: 200,
                    content_type: content_type.map(String::from),
                    body: body.as_bytes().to_vec(),
                }),
            );
        }

        pub fn fail(&self, url: &str, message: &str) {
            self.routes
                .lock()
                .unwrap()
                .insert(url.to_string(), Reply::Fail(message.to_string()));
        }

        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = Some(delay);
        }

        pub fn calls(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        /// How many times the body of `url` was actually read.
        pub fn body_reads(&self, url: &str) -> usize {
            self.body_reads.lock().unwrap().get(url).copied().unwrap_or(0)
        }

        /// Headers-only half of a request: counts the call and looks up the reply.
        async fn head(&self, url: &str) -> Result<FetchResult> {
            *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let reply = self.routes.lock().unwrap().get(url).cloned();
            match reply {
                Some(Reply::Ok(result)) => Ok(result),
                Some(Reply::Fail(message)) => Err(HnError::Other(message)),
                None => Err(HnError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }

        fn read_body(&self, url: &str) {
            *self
                .body_reads
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default() += 1;
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResult> {
            let result = self.head(url).await?;
            self.read_body(url);
            Ok(result)
        }

        async fn fetch_if(
            &self,
            url: &str,
            accept: AcceptFn,
            max_bytes: usize,
        ) -> Result<Option<FetchResult>> {
            let mut result = self.head(url).await?;
            if !accept(result.content_type.as_deref()) {
                return Ok(None);
            }
            self.read_body(url);
            result.body.truncate(max_bytes);
            Ok(Some(result))
        }
    }
}
