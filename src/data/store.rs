use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use crate::core::{PriceSeries, Ticker};
use crate::data::MarketDataSource;
use crate::error::{ChartError, ChartResult};

/// Decides how many cached series to drop after an insert.
///
/// The store keeps entries ordered from least to most recently used and
/// drops from the front; the entry just inserted is never dropped.
pub trait EvictionPolicy: fmt::Debug + Send {
    fn excess(&self, cached: usize) -> usize;
}

/// Keeps every loaded series for the process lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetainAll;

impl EvictionPolicy for RetainAll {
    fn excess(&self, _cached: usize) -> usize {
        0
    }
}

/// Keeps at most `capacity` series, dropping the least recently used.
#[derive(Debug, Clone, Copy)]
pub struct CapacityLimit {
    capacity: NonZeroUsize,
}

impl CapacityLimit {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { capacity }
    }
}

impl EvictionPolicy for CapacityLimit {
    fn excess(&self, cached: usize) -> usize {
        cached.saturating_sub(self.capacity.get())
    }
}

/// Per-ticker series cache in front of a `MarketDataSource`.
///
/// Series are shared as immutable `Arc` handles; failed loads are not cached
/// so the ticker can be retried.
pub struct SeriesStore<S> {
    source: S,
    cache: IndexMap<Ticker, Arc<PriceSeries>>,
    policy: Box<dyn EvictionPolicy>,
}

impl<S: MarketDataSource> SeriesStore<S> {
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_policy(source, Box::new(RetainAll))
    }

    #[must_use]
    pub fn with_policy(source: S, policy: Box<dyn EvictionPolicy>) -> Self {
        Self {
            source,
            cache: IndexMap::new(),
            policy,
        }
    }

    /// Returns the cached series or fetches, canonicalizes and caches it.
    pub fn load(&mut self, ticker: &Ticker) -> ChartResult<Arc<PriceSeries>> {
        if let Some(series) = self.cache.shift_remove(ticker) {
            trace!(ticker = %ticker, "series cache hit");
            self.cache.insert(ticker.clone(), Arc::clone(&series));
            return Ok(series);
        }

        let candles = self.source.fetch(ticker).map_err(|err| match err {
            ChartError::DataUnavailable { .. } => err,
            other => ChartError::data_unavailable(ticker.as_str(), other.to_string()),
        })?;
        let series = Arc::new(PriceSeries::canonicalize(ticker.clone(), candles));
        debug!(ticker = %ticker, candles = series.len(), "series loaded");

        self.cache.insert(ticker.clone(), Arc::clone(&series));
        self.evict();
        Ok(series)
    }

    #[must_use]
    pub fn get(&self, ticker: &Ticker) -> Option<&PriceSeries> {
        self.cache.get(ticker).map(Arc::as_ref)
    }

    #[must_use]
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.cache.contains_key(ticker)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cached tickers, least recently used first.
    pub fn tickers(&self) -> impl Iterator<Item = &Ticker> {
        self.cache.keys()
    }

    /// Drops a cached series so the next `load` fetches it again.
    pub fn invalidate(&mut self, ticker: &Ticker) -> bool {
        self.cache.shift_remove(ticker).is_some()
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    fn evict(&mut self) {
        let excess = self
            .policy
            .excess(self.cache.len())
            .min(self.cache.len().saturating_sub(1));
        for _ in 0..excess {
            if let Some((ticker, _)) = self.cache.shift_remove_index(0) {
                warn!(ticker = %ticker, policy = ?self.policy, "evicted cached series");
            }
        }
    }
}

impl<S> fmt::Debug for SeriesStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesStore")
            .field("cached", &self.cache.keys().collect::<Vec<_>>())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
