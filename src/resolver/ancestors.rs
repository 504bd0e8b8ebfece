use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::app::{HnError, Result};
use crate::cache::{FetchCache, Resolution};
use crate::domain::{ForumItem, ItemId, PLACEHOLDER_ID};
use crate::resolver::ItemResolver;

/// Upper bound on parent hops before a chain is declared malformed.
pub const DEFAULT_MAX_HOPS: usize = 500;

/// Ancestors of a comment, root first.
#[derive(Debug, Clone, PartialEq)]
pub struct Ancestry {
    items: Vec<ForumItem>,
}

impl Ancestry {
    /// The story or poll the thread hangs off.
    pub fn root(&self) -> &ForumItem {
        &self.items[0]
    }

    /// Intermediate comments between the root and the starting comment.
    pub fn comments(&self) -> &[ForumItem] {
        &self.items[1..]
    }

    pub fn items(&self) -> &[ForumItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<ForumItem> {
        self.items
    }
}

/// Walks `parent` links upward to the root story or poll.
///
/// Each hop goes through the item cache, so chains that share ancestors share
/// fetches, and every item seen on the way is left cached under its own key.
#[derive(Clone)]
pub struct AncestorResolver {
    items: ItemResolver,
    chains: FetchCache<Ancestry>,
    max_hops: usize,
}

impl AncestorResolver {
    pub fn new(items: ItemResolver) -> Self {
        Self::with_max_hops(items, DEFAULT_MAX_HOPS)
    }

    pub fn with_max_hops(items: ItemResolver, max_hops: usize) -> Self {
        Self {
            items,
            chains: FetchCache::new("ancestors"),
            max_hops: max_hops.max(1),
        }
    }

    pub fn chains(&self) -> &FetchCache<Ancestry> {
        &self.chains
    }

    pub fn chain_key(&self, first_parent: ItemId) -> String {
        format!("{}#parents", self.items.endpoints().item(first_parent))
    }

    /// Resolve the ancestors above a comment, given the comment's `parent`.
    ///
    /// An absent seed stays pending without any request.
    pub async fn resolve(&self, first_parent: Option<ItemId>) -> Resolution<Ancestry> {
        let key = first_parent
            .filter(|id| *id != PLACEHOLDER_ID)
            .map(|id| (id, self.chain_key(id)));
        let Some((start, key)) = key else {
            return Resolution::Pending;
        };

        let items = self.items.clone();
        let max_hops = self.max_hops;
        self.chains
            .request(Some(key.as_str()), move |_key| {
                walk(items.clone(), start, max_hops)
            })
            .await
    }
}

async fn walk(items: ItemResolver, start: ItemId, max_hops: usize) -> Result<Ancestry> {
    let mut chain = VecDeque::new();
    let mut next = start;

    for hop in 0..max_hops {
        let item = items
            .get_item(Some(next))
            .await
            .into_result()?
            .ok_or_else(|| HnError::Other(format!("item {} is still pending", next)))?;

        debug!("ancestor hop {} from {}: {} {}", hop, start, item.kind(), item.id());

        let is_root = item.is_root();
        let parent = item.parent();
        let id = item.id();
        chain.push_front(item);

        if is_root {
            return Ok(Ancestry {
                items: chain.into(),
            });
        }

        next = parent.ok_or(HnError::BrokenChain { id })?;
    }

    warn!("ancestor chain from {} exceeded {} hops", start, max_hops);
    Err(HnError::ChainTooDeep {
        start,
        hops: max_hops,
    })
}
