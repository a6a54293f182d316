//! Cached, refreshable data resources
//!
//! A [`Resource`] is one consumer's view of a [`Query`]: it remembers the last
//! params it was loaded with, the current [`ResourceState`], and reads and
//! writes the shared response cache.
//!
//! Every load is tagged with a generation number. When loads overlap, only
//! the most recent one may change the state; an older completion is reported
//! as [`FetchOutcome::Stale`] and otherwise ignored.

use crate::query::Query;
use farmacia_api_client::{ApiError, ApiResult, PrestashopClient};
use farmacia_core::cache::TtlCache;
use farmacia_telemetry::metrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Lifecycle of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceState<T> {
    /// Never loaded
    Idle,
    /// A load is in flight
    Loading,
    /// Data is available
    Ready(T),
    /// The backend answered with no data
    Empty,
    /// The last load failed; carries a message fit for display
    Failed(String),
}

impl<T> ResourceState<T> {
    /// Whether a load is in flight
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Loaded data, if any
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Result of one load
#[derive(Debug)]
pub enum FetchOutcome<T> {
    /// Data was loaded
    Ok(T),
    /// The backend had nothing for these params
    Empty,
    /// The load failed
    Error(ApiError),
    /// A newer load started before this one finished; its result was dropped
    Stale,
}

impl<T> FetchOutcome<T> {
    /// Whether data was loaded
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Whether the result was dropped in favour of a newer load
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }

    /// Loaded data, if any
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Ok(data) => Some(data),
            _ => None,
        }
    }

    /// The error, if the load failed
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }
}

/// What a consumer should display
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    /// Data to show: loaded data, or the placeholder after an empty or
    /// failed load when one was configured
    pub data: Option<T>,
    /// Whether `data` is the placeholder rather than loaded data
    pub is_placeholder: bool,
    /// Whether a load is in flight
    pub loading: bool,
    /// Display message of the last failure
    pub error: Option<String>,
}

struct Inner<P, T> {
    state: ResourceState<T>,
    params: Option<P>,
}

/// One cached, refreshable view of a query
pub struct Resource<Q: Query> {
    query: Q,
    client: PrestashopClient,
    cache: Arc<TtlCache>,
    generation: AtomicU64,
    inner: Mutex<Inner<Q::Params, Q::Output>>,
    placeholder: Option<Q::Output>,
}

impl<Q: Query> Resource<Q> {
    /// Create an idle resource sharing `cache` with other resources
    pub fn new(query: Q, client: PrestashopClient, cache: Arc<TtlCache>) -> Self {
        Self {
            query,
            client,
            cache,
            generation: AtomicU64::new(0),
            inner: Mutex::new(Inner {
                state: ResourceState::Idle,
                params: None,
            }),
            placeholder: None,
        }
    }

    /// Show `data` from [`view`](Self::view) when a load comes back empty
    /// or fails
    #[must_use]
    pub fn with_placeholder(mut self, data: Q::Output) -> Self {
        self.placeholder = Some(data);
        self
    }

    /// Load data for `params`, from the cache when a fresh entry exists
    pub async fn load(&self, params: Q::Params) -> FetchOutcome<Q::Output> {
        self.run(params, true).await
    }

    /// Reload the last params from the network, bypassing and then
    /// overwriting the cache entry
    pub async fn refresh(&self) -> FetchOutcome<Q::Output> {
        let params = self.lock().params.clone();
        match params {
            Some(params) => self.run(params, false).await,
            None => FetchOutcome::Error(ApiError::validation(
                "nothing to refresh: the resource was never loaded",
            )),
        }
    }

    /// Drop the cache entry for the last params
    pub fn invalidate(&self) -> bool {
        let params = self.lock().params.clone();
        params.is_some_and(|p| self.cache.remove(&self.query.cache_key(&p)))
    }

    /// Current state
    pub fn state(&self) -> ResourceState<Q::Output> {
        self.lock().state.clone()
    }

    /// Params of the most recent load
    pub fn params(&self) -> Option<Q::Params> {
        self.lock().params.clone()
    }

    /// Number of loads started so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Data to display, with the placeholder applied if one was configured
    pub fn view(&self) -> View<Q::Output> {
        let inner = self.lock();
        let placeholder = |error: Option<String>| View {
            data: self.placeholder.clone(),
            is_placeholder: self.placeholder.is_some(),
            loading: false,
            error,
        };

        match &inner.state {
            ResourceState::Idle => View {
                data: None,
                is_placeholder: false,
                loading: false,
                error: None,
            },
            ResourceState::Loading => View {
                data: None,
                is_placeholder: false,
                loading: true,
                error: None,
            },
            ResourceState::Ready(data) => View {
                data: Some(data.clone()),
                is_placeholder: false,
                loading: false,
                error: None,
            },
            ResourceState::Empty => placeholder(None),
            ResourceState::Failed(message) => placeholder(Some(message.clone())),
        }
    }

    async fn run(&self, params: Q::Params, use_cache: bool) -> FetchOutcome<Q::Output> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let key = self.query.cache_key(&params);

        {
            let mut inner = self.lock();
            inner.params = Some(params.clone());
            inner.state = ResourceState::Loading;
        }

        if use_cache {
            match self.cache.get_as::<Q::Output>(&key) {
                Ok(Some(data)) => {
                    metrics().increment("fetch.cache_hit");
                    debug!(query = self.query.name(), %key, "Cache hit");
                    return self.settle(generation, Ok(data));
                }
                Ok(None) => {
                    metrics().increment("fetch.cache_miss");
                    debug!(query = self.query.name(), %key, "Cache miss");
                }
                Err(e) => {
                    metrics().increment("fetch.cache_miss");
                    warn!(query = self.query.name(), %key, error = %e, "Unreadable cache entry, refetching");
                }
            }
        }

        let result = self.query.fetch(&self.client, &params).await;

        match result {
            Ok(ref data) if !self.query.is_empty(data) => {
                if let Err(e) = self.cache.set_as(&key, data) {
                    warn!(query = self.query.name(), error = %e, "Failed to cache response");
                }
            }
            // The data is gone upstream, so an older entry must not be served
            Ok(_) => {
                self.cache.remove(&key);
            }
            Err(ref e) if e.is_not_found() => {
                self.cache.remove(&key);
            }
            Err(_) => {}
        }
        metrics().gauge("cache.entries", u64::try_from(self.cache.len()).unwrap_or(u64::MAX));

        self.settle(generation, result)
    }

    /// Apply a finished load unless a newer one has started
    fn settle(&self, generation: u64, result: ApiResult<Q::Output>) -> FetchOutcome<Q::Output> {
        let mut inner = self.lock();

        let current = self.generation.load(Ordering::SeqCst);
        if current != generation {
            metrics().increment("fetch.stale");
            warn!(
                query = self.query.name(),
                generation,
                current,
                "Discarding stale response"
            );
            return FetchOutcome::Stale;
        }

        match result {
            Ok(data) if self.query.is_empty(&data) => {
                inner.state = ResourceState::Empty;
                FetchOutcome::Empty
            }
            Ok(data) => {
                inner.state = ResourceState::Ready(data.clone());
                FetchOutcome::Ok(data)
            }
            Err(e) if e.is_not_found() => {
                debug!(query = self.query.name(), error = %e, "Nothing found");
                inner.state = ResourceState::Empty;
                FetchOutcome::Empty
            }
            Err(e) => {
                metrics().increment("fetch.error");
                warn!(query = self.query.name(), error = %e, "Load failed");
                inner.state = ResourceState::Failed(e.user_message());
                FetchOutcome::Error(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<Q::Params, Q::Output>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
