use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use crate::app::error::Result;
use crate::cache::{AppState, FocusMonitor};
use crate::config::Config;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::parallel::ParallelLoader;
use crate::fetcher::Fetcher;
use crate::metadata::MetadataExtractor;
use crate::resolver::{AncestorResolver, Endpoints, ItemResolver};

/// Owns every cache for one application lifetime.
pub struct AppContext {
    pub config: Config,
    pub fetcher: Arc<dyn Fetcher>,
    pub items: ItemResolver,
    pub ancestors: AncestorResolver,
    pub metadata: MetadataExtractor,
    pub loader: ParallelLoader,
    focus: Mutex<FocusMonitor>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::with_options(
            config.api.request_timeout(),
            &config.api.user_agent,
        )?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        let items = ItemResolver::new(fetcher.clone(), Endpoints::new(&config.api.base_url));
        let ancestors = AncestorResolver::with_max_hops(items.clone(), config.ancestry.max_hops);
        let metadata = MetadataExtractor::new(fetcher.clone(), config.metadata.clone())?;
        let loader = ParallelLoader::with_workers(items.clone(), config.api.workers);

        Ok(Self {
            config,
            fetcher,
            items,
            ancestors,
            metadata,
            loader,
            focus: Mutex::new(FocusMonitor::default()),
        })
    }

    /// Feed an app-state change; resuming to the foreground revalidates
    /// every cache. Returns whether a revalidation ran.
    pub fn set_app_state(&self, state: AppState) -> bool {
        let resumed = self
            .focus
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .transition(state);

        if resumed {
            let started = self.revalidate();
            info!("App resumed, {} background refetches started", started);
        }
        resumed
    }

    pub fn revalidate(&self) -> usize {
        self.items.items().revalidate()
            + self.items.users().revalidate()
            + self.items.stories().revalidate()
            + self.ancestors.chains().revalidate()
            + self.metadata.pages().revalidate()
    }

    pub fn clear(&self) {
        self.items.items().clear();
        self.items.users().clear();
        self.items.stories().clear();
        self.ancestors.chains().clear();
        self.metadata.pages().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Snapshot;
    use crate::domain::{ForumItem, StoryFilter};
    use crate::fetcher::mock::MockFetcher;

    const BASE: &str = "https://api.test/v0";

    fn context(mock: Arc<MockFetcher>) -> AppContext {
        let mut config = Config::default();
        config.api.base_url = BASE.to_string();
        AppContext::with_fetcher(config, mock).unwrap()
    }

    #[tokio::test]
    async fn test_resume_revalidates_subscribed_entries() {
        let mock = Arc::new(MockFetcher::new());
        let url = format!("{BASE}/item/1.json");
        mock.json(&url, r#"{"id": 1, "type": "story", "score": 1}"#);
        let ctx = context(mock.clone());

        ctx.items.get_item(Some(1)).await;
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let _sub = ctx.items.items().subscribe(&url, move |snap: &Snapshot<ForumItem>| {
            let _ = tx.send(snap.value.as_ref().and_then(|i| i.fields().score));
        });

        mock.json(&url, r#"{"id": 1, "type": "story", "score": 2}"#);
        assert!(!ctx.set_app_state(AppState::Active));
        assert!(!ctx.set_app_state(AppState::Background));
        assert_eq!(mock.calls(&url), 1);

        assert!(ctx.set_app_state(AppState::Active));
        assert_eq!(rx.recv().await, Some(Some(2)));
        assert_eq!(mock.calls(&url), 2);
    }

    #[tokio::test]
    async fn test_clear_forgets_everything() {
        let mock = Arc::new(MockFetcher::new());
        mock.json(&format!("{BASE}/topstories.json"), "[1, 2]");
        let ctx = context(mock.clone());

        ctx.items.get_story_ids(StoryFilter::Top).await;
        ctx.clear();
        ctx.items.get_story_ids(StoryFilter::Top).await;

        assert!(ctx.items.stories().len() == 1);
        assert_eq!(mock.calls(&format!("{BASE}/topstories.json")), 2);
    }
}
