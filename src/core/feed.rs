use crate::core::filter::FilterSpec;
use crate::core::pipeline::run_pipeline;
use crate::core::sort::SortKey;
use crate::domain::model::Listing;
use crate::domain::ports::ListingStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Where a fetch currently stands. `Loaded(vec![])` means "nothing matched",
/// which is not the same thing as `Loading`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Fetches listings for the current filter state. A new `refresh` aborts the
/// one still in flight, and a response whose generation is no longer current
/// is dropped, so the last request always wins.
pub struct ListingFeed<S: ListingStore + 'static> {
    store: Arc<S>,
    generation: Arc<AtomicU64>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<LoadState<Vec<Listing>>>>,
}

impl<S: ListingStore + 'static> ListingFeed<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            store,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Mutex::new(None),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState<Vec<Listing>>> {
        self.state.subscribe()
    }

    pub fn current(&self) -> LoadState<Vec<Listing>> {
        self.state.borrow().clone()
    }

    /// Start a fetch for `spec`/`sort`, superseding any earlier one.
    /// Must be called from within a tokio runtime.
    pub fn refresh(&self, spec: FilterSpec, sort: SortKey) {
        // 在 channel 鎖內遞增世代，與 publish 的檢查互斥
        let mut ticket = 0;
        self.state.send_modify(|current| {
            ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *current = LoadState::Loading;
        });

        let store = Arc::clone(&self.store);
        let generation = Arc::clone(&self.generation);
        let state = Arc::clone(&self.state);

        let handle = tokio::spawn(async move {
            let next = match store.fetch_listings(&spec).await {
                Ok(listings) => LoadState::Loaded(run_pipeline(&listings, &spec, sort)),
                Err(e) => {
                    tracing::error!("Listing fetch #{} failed: {}", ticket, e);
                    LoadState::Failed(e.user_friendly_message())
                }
            };

            if !publish(&state, &generation, ticket, next) {
                tracing::warn!("Discarding stale listing response (request #{})", ticket);
            }
        });

        let previous = match self.in_flight.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Refresh and wait until this request (or a later one) settles.
    pub async fn fetch(&self, spec: FilterSpec, sort: SortKey) -> LoadState<Vec<Listing>> {
        let mut rx = self.subscribe();
        self.refresh(spec, sort);

        loop {
            {
                let current = rx.borrow_and_update();
                if !current.is_loading() {
                    return current.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.current();
            }
        }
    }
}

/// Publish `next` only while `ticket` is still the current generation. The
/// check and the write happen under the channel lock.
fn publish(
    state: &watch::Sender<LoadState<Vec<Listing>>>,
    generation: &AtomicU64,
    ticket: u64,
    next: LoadState<Vec<Listing>>,
) -> bool {
    state.send_if_modified(|current| {
        if generation.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *current = next;
        true
    })
}

impl<S: ListingStore + 'static> Drop for ListingFeed<S> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.in_flight.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{sample_listings, InMemoryListingStore};
    use crate::domain::model::{Category, ListingId, ListingUpdate, NewListing};
    use crate::utils::error::{MarketError, Result};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Answers slowly for queries containing "slow".
    struct DelayedStore {
        inner: InMemoryListingStore,
    }

    #[async_trait]
    impl ListingStore for DelayedStore {
        async fn fetch_listings(&self, spec: &FilterSpec) -> Result<Vec<Listing>> {
            if spec.query.as_deref().is_some_and(|q| q.contains("slow")) {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            self.inner.fetch_listings(spec).await
        }

        async fn fetch_listing(&self, id: ListingId) -> Result<Listing> {
            self.inner.fetch_listing(id).await
        }

        async fn listings_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>> {
            self.inner.listings_by_owner(owner_id).await
        }

        async fn create_listing(&self, listing: NewListing) -> Result<Listing> {
            self.inner.create_listing(listing).await
        }

        async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<Listing> {
            self.inner.update_listing(id, update).await
        }

        async fn deactivate_listing(&self, id: ListingId) -> Result<()> {
            self.inner.deactivate_listing(id).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ListingStore for FailingStore {
        async fn fetch_listings(&self, _spec: &FilterSpec) -> Result<Vec<Listing>> {
            Err(MarketError::Backend {
                status: 503,
                message: "Service unavailable".to_string(),
            })
        }

        async fn fetch_listing(&self, id: ListingId) -> Result<Listing> {
            Err(MarketError::not_found("Skill", id))
        }

        async fn listings_by_owner(&self, _owner_id: &str) -> Result<Vec<Listing>> {
            Ok(Vec::new())
        }

        async fn create_listing(&self, _listing: NewListing) -> Result<Listing> {
            Err(MarketError::Backend {
                status: 503,
                message: "Service unavailable".to_string(),
            })
        }

        async fn update_listing(&self, id: ListingId, _update: ListingUpdate) -> Result<Listing> {
            Err(MarketError::not_found("Skill", id))
        }

        async fn deactivate_listing(&self, id: ListingId) -> Result<()> {
            Err(MarketError::not_found("Skill", id))
        }
    }

    #[tokio::test]
    async fn test_fetch_runs_pipeline() {
        let feed = ListingFeed::new(Arc::new(InMemoryListingStore::with_sample_data()));
        let spec = FilterSpec::default().with_category(Category::Music);

        let state = feed.fetch(spec, SortKey::Relevance).await;
        let listings = state.loaded().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, 5);
    }

    #[tokio::test]
    async fn test_empty_result_is_loaded_not_loading() {
        let feed = ListingFeed::new(Arc::new(InMemoryListingStore::with_sample_data()));
        let state = feed
            .fetch(FilterSpec::default().with_query("nothing matches this"), SortKey::Newest)
            .await;
        assert_eq!(state, LoadState::Loaded(Vec::new()));
    }

    #[tokio::test]
    async fn test_stale_response_never_overwrites_newer_one() {
        let store = DelayedStore {
            inner: InMemoryListingStore::new(sample_listings()),
        };
        let feed = ListingFeed::new(Arc::new(store));
        let mut rx = feed.subscribe();

        feed.refresh(FilterSpec::default().with_query("slow"), SortKey::Relevance);
        feed.refresh(FilterSpec::default().with_category(Category::Design), SortKey::Relevance);

        loop {
            rx.changed().await.unwrap();
            if !rx.borrow().is_loading() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(450)).await;

        let state = feed.current();
        let listings = state.loaded().unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, 2);
    }

    #[tokio::test]
    async fn test_failure_becomes_failed_state() {
        let feed = ListingFeed::new(Arc::new(FailingStore));
        let state = feed.fetch(FilterSpec::default(), SortKey::Relevance).await;
        assert_eq!(state, LoadState::Failed("Service unavailable".to_string()));
    }

    #[test]
    fn test_superseded_ticket_cannot_publish() {
        let (state, _rx) = watch::channel(LoadState::Loading);
        let generation = AtomicU64::new(2);

        assert!(!publish(&state, &generation, 1, LoadState::Loaded(sample_listings())));
        assert!(state.borrow().is_loading());

        assert!(publish(&state, &generation, 2, LoadState::Loaded(Vec::new())));
        assert_eq!(*state.borrow(), LoadState::Loaded(Vec::new()));
    }
}
