use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::app::HnError;
use crate::cache::Resolution;
use crate::domain::{ForumItem, ItemId};
use crate::resolver::ItemResolver;

pub const DEFAULT_WORKERS: usize = 10;

/// Loads many items at once with a cap on concurrent requests.
pub struct ParallelLoader {
    resolver: ItemResolver,
    semaphore: Arc<Semaphore>,
}

impl ParallelLoader {
    pub fn new(resolver: ItemResolver) -> Self {
        Self::with_workers(resolver, DEFAULT_WORKERS)
    }

    pub fn with_workers(resolver: ItemResolver, workers: usize) -> Self {
        Self {
            resolver,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Resolve `ids` through the item cache. Results keep the input order.
    pub async fn load_items(&self, ids: &[ItemId]) -> Vec<(ItemId, Resolution<ForumItem>)> {
        let mut handles = Vec::with_capacity(ids.len());

        for &id in ids {
            let resolver = self.resolver.clone();
            let semaphore = self.semaphore.clone();

            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (id, Resolution::Pending);
                };
                (id, resolver.get_item(Some(id)).await)
            });

            handles.push((id, handle));
        }

        join_in_order(handles).await
    }
}

/// Await every task; a task that died still fills its slot with a failure.
async fn join_in_order(
    handles: Vec<(ItemId, JoinHandle<(ItemId, Resolution<ForumItem>)>)>,
) -> Vec<(ItemId, Resolution<ForumItem>)> {
    let mut results = Vec::with_capacity(handles.len());
    for (id, handle) in handles {
        match handle.await {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::error!("Task join error for item {}: {}", id, e);
                let error = HnError::Task(e.to_string());
                results.push((id, Resolution::Failed(Arc::new(error))));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fetcher::mock::MockFetcher;
    use crate::resolver::Endpoints;

    const BASE: &str = "https://api.test/v0";

    #[tokio::test]
    async fn test_load_items_keeps_order_and_dedupes() {
        let mock = Arc::new(MockFetcher::new());
        for id in 1..=5 {
            mock.json(
                &format!("{BASE}/item/{id}.json"),
                &format!(r#"{{"id": {id}, "type": "story"}}"#),
            );
        }
        let resolver = ItemResolver::new(mock.clone(), Endpoints::new(BASE));
        let loader = ParallelLoader::with_workers(resolver, 2);

        let results = loader.load_items(&[5, 3, 1, 3, 4, 2]).await;

        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![5, 3, 1, 3, 4, 2]);
        assert!(results.iter().all(|(id, r)| r.value().map(|i| i.id()) == Some(*id)));
        assert_eq!(mock.calls(&format!("{BASE}/item/3.json")), 1);
    }

    #[tokio::test]
    async fn test_failures_are_per_item() {
        let mock = Arc::new(MockFetcher::new());
        mock.json(&format!("{BASE}/item/1.json"), r#"{"id": 1, "type": "job"}"#);
        let resolver = ItemResolver::new(mock, Endpoints::new(BASE));
        let loader = ParallelLoader::new(resolver);

        let results = loader.load_items(&[1, 2]).await;

        assert!(results[0].1.is_ready());
        assert!(results[1].1.error().is_some());
    }

    #[tokio::test]
    async fn test_crashed_task_keeps_its_slot() {
        let handles = vec![
            (7, tokio::spawn(async { (7, Resolution::Pending) })),
            (
                8,
                tokio::spawn(async {
                    if true {
                        panic!("worker crashed");
                    }
                    (8, Resolution::Pending)
                }),
            ),
            (9, tokio::spawn(async { (9, Resolution::Pending) })),
        ];

        let results = join_in_order(handles).await;

        let ids: Vec<_> = results.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![7, 8, 9]);
        assert!(results[0].1.is_pending());
        assert!(matches!(
            results[1].1.error().map(|e| e.as_ref()),
            Some(HnError::Task(_))
        ));
    }
}
