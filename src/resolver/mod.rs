//! Typed access to the forum read API through the fetch cache.
//!
//! Cache keys are the endpoint URLs themselves, so two callers asking for the
//! same id always land on the same entry.

pub mod ancestors;

pub use ancestors::{Ancestry, AncestorResolver, DEFAULT_MAX_HOPS};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::app::{HnError, Result};
use crate::cache::{FetchCache, Resolution};
use crate::domain::{ForumItem, ForumUser, ItemId, StoryFilter, PLACEHOLDER_ID};
use crate::fetcher::Fetcher;

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Builds endpoint URLs for the forum API.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn item(&self, id: ItemId) -> String {
        format!("{}/item/{}.json", self.base, id)
    }

    /// The username is percent-encoded as a single path segment.
    pub fn user(&self, username: &str) -> String {
        let segment = format!("{}.json", username);
        let Ok(mut url) = Url::parse(&self.base) else {
            return format!("{}/user/{}", self.base, segment);
        };
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(["user", segment.as_str()]);
            }
            Err(()) => return format!("{}/user/{}", self.base, segment),
        }
        url.into()
    }

    pub fn stories(&self, filter: StoryFilter) -> String {
        format!("{}/{}stories.json", self.base, filter.as_str())
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Resolves items, users and story listings.
#[derive(Clone)]
pub struct ItemResolver {
    fetcher: Arc<dyn Fetcher>,
    endpoints: Endpoints,
    items: FetchCache<ForumItem>,
    users: FetchCache<ForumUser>,
    stories: FetchCache<Vec<ItemId>>,
}

impl ItemResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, endpoints: Endpoints) -> Self {
        Self {
            fetcher,
            endpoints,
            items: FetchCache::new("items"),
            users: FetchCache::new("users"),
            stories: FetchCache::new("stories"),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn items(&self) -> &FetchCache<ForumItem> {
        &self.items
    }

    pub fn users(&self) -> &FetchCache<ForumUser> {
        &self.users
    }

    pub fn stories(&self) -> &FetchCache<Vec<ItemId>> {
        &self.stories
    }

    /// Cache key for `id`, or `None` for absent and placeholder ids.
    pub fn item_key(&self, id: Option<ItemId>) -> Option<String> {
        match id {
            None | Some(PLACEHOLDER_ID) => None,
            Some(id) => Some(self.endpoints.item(id)),
        }
    }

    /// Look up an item. Placeholder ids stay pending without a request.
    pub async fn get_item(&self, id: Option<ItemId>) -> Resolution<ForumItem> {
        let key = self.item_key(id);
        let fetcher = self.fetcher.clone();
        self.items
            .request(key.as_deref(), move |url| fetch_json(fetcher.clone(), url))
            .await
    }

    pub async fn get_user(&self, username: Option<&str>) -> Resolution<ForumUser> {
        let key = username
            .filter(|name| !name.is_empty())
            .map(|name| self.endpoints.user(name));
        let fetcher = self.fetcher.clone();
        self.users
            .request(key.as_deref(), move |url| fetch_json(fetcher.clone(), url))
            .await
    }

    pub async fn get_story_ids(&self, filter: StoryFilter) -> Resolution<Vec<ItemId>> {
        let key = self.endpoints.stories(filter);
        let fetcher = self.fetcher.clone();
        self.stories
            .request(Some(key.as_str()), move |url| fetch_json(fetcher.clone(), url))
            .await
    }
}

/// GET `url` and decode it; a JSON `null` means the resource does not exist.
async fn fetch_json<T: DeserializeOwned>(fetcher: Arc<dyn Fetcher>, url: String) -> Result<T> {
    let response = fetcher.fetch(&url).await?;
    debug!("{} returned {} bytes", url, response.body.len());

    let parsed: Option<T> = serde_json::from_slice(&response.body)?;
    parsed.ok_or(HnError::NotFound(url))
}
