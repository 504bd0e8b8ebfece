//! # hnwire
//!
//! Data resolution core for a Hacker News client: cached, de-duplicated reads
//! of the forum API, comment ancestry and link previews.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → FetchCache → ItemResolver → AncestorResolver
//!                     ↘ MetadataExtractor
//! ```
//!
//! - [`fetcher`]: HTTP transport behind an async trait
//! - [`cache`]: key-addressed cache with request de-duplication and revalidation
//! - [`resolver`]: typed item/user lookups and parent-chain walking
//! - [`metadata`]: favicon, preview image and site name extraction
//!
//! ## Quick Start
//!
//! ```bash
//! # Top stories
//! hnwire stories --filter top --limit 10
//!
//! # Thread context of a comment
//! hnwire parents 2921983
//!
//! # Link preview
//! hnwire metadata https://blog.rust-lang.org/
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the fetcher,
/// caches and resolvers, and forwards app-state changes to revalidation.
pub mod app;

/// Fetch cache with de-duplication, mutation and stale-while-revalidate.
///
/// - [`FetchCache`](cache::FetchCache): the cache itself
/// - [`Resolution`](cache::Resolution): pending / ready / failed
/// - [`FocusMonitor`](cache::FocusMonitor): foreground-resume detection
pub mod cache;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/hnwire/config.toml`.
pub mod config;

/// Forum items, users and page metadata.
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for GET requests
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ParallelLoader`](fetcher::parallel::ParallelLoader): Concurrent item loading with semaphore
pub mod fetcher;

/// Page-metadata extraction for external links.
pub mod metadata;

/// Item, user and ancestor-chain resolution.
pub mod resolver;
