//! Staleness-window cache of design and order listings.
//!
//! A refresh inside the window is a no-op unless forced. Refreshes are
//! serialized per cache instance; a caller that waited for another refresh
//! skips its own fetch when a fetch that started after its request has
//! completed meanwhile. A failed refresh leaves the previous snapshot and
//! timestamp untouched.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use madma_core::{Design, Order, Pubkey};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::chain::{ChainClient, Keyed, OrderScope};
use crate::error::Result;
use crate::rpc::RpcTransport;

/// Default staleness window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(30);

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Where a refresh reads listings from.
pub trait DataSource: Send + Sync {
    fn fetch_designs(&self) -> impl Future<Output = Result<Vec<Keyed<Design>>>> + Send;
    fn fetch_orders(&self) -> impl Future<Output = Result<Vec<Keyed<Order>>>> + Send;
}

/// Listings as seen by one viewer.
///
/// The store authority sees every order in the store; anyone else sees only
/// their own. Without a viewer there are no orders to show.
pub struct ChainSource<T> {
    chain: ChainClient<T>,
    viewer: Option<Pubkey>,
}

impl<T: RpcTransport> ChainSource<T> {
    #[must_use]
    pub const fn new(chain: ChainClient<T>, viewer: Option<Pubkey>) -> Self {
        Self { chain, viewer }
    }
}

impl<T: RpcTransport> DataSource for ChainSource<T> {
    async fn fetch_designs(&self) -> Result<Vec<Keyed<Design>>> {
        self.chain.all_designs().await
    }

    async fn fetch_orders(&self) -> Result<Vec<Keyed<Order>>> {
        let Some(viewer) = self.viewer else {
            return Ok(Vec::new());
        };
        let is_owner = self
            .chain
            .fetch_store()
            .await?
            .is_some_and(|store| store.is_authority(&viewer));
        let scope = if is_owner {
            OrderScope::Store
        } else {
            OrderScope::Buyer(viewer)
        };
        self.chain.all_orders(scope).await
    }
}

/// Cached listings.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub designs: Vec<Keyed<Design>>,
    pub orders: Vec<Keyed<Order>>,
    /// When the fetch that produced this snapshot started.
    pub last_fetch: Option<Instant>,
}

/// What a call to [`DataCache::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Inside the staleness window; nothing fetched.
    Fresh,
    /// A fetch that started after this request completed while waiting.
    Coalesced,
    /// Both listings were fetched and replaced.
    Fetched,
}

// =============================================================================
// DataCache
// =============================================================================

pub struct DataCache<S> {
    source: S,
    clock: Arc<dyn Clock>,
    window: Duration,
    snapshot: RwLock<Snapshot>,
    refresh_lock: Mutex<()>,
    /// Sequence number of the last fetch started.
    started: AtomicU64,
    /// Sequence number of the last fetch that completed successfully.
    completed: AtomicU64,
}

impl<S: DataSource> DataCache<S> {
    #[must_use]
    pub fn new(source: S, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            source,
            clock,
            window,
            snapshot: RwLock::new(Snapshot::default()),
            refresh_lock: Mutex::new(()),
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    /// Refresh both listings if stale, or unconditionally when `force` is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns the first fetch error; the cached snapshot is left as it was.
    #[instrument(skip(self))]
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        let requested = self.started.load(Ordering::Acquire);
        let _guard = self.refresh_lock.lock().await;

        if self.completed.load(Ordering::Acquire) > requested {
            debug!("Refresh satisfied by a newer fetch");
            return Ok(RefreshOutcome::Coalesced);
        }
        if !force && self.is_fresh() {
            debug!("Listings still fresh");
            return Ok(RefreshOutcome::Fresh);
        }

        let sequence = self.started.fetch_add(1, Ordering::AcqRel) + 1;
        let started_at = self.clock.now();

        let (designs, orders) =
            tokio::try_join!(self.source.fetch_designs(), self.source.fetch_orders())?;
        debug!(
            designs = designs.len(),
            orders = orders.len(),
            "Listings refreshed"
        );

        *self.write_snapshot() = Snapshot {
            designs,
            orders,
            last_fetch: Some(started_at),
        };
        self.completed.store(sequence, Ordering::Release);

        Ok(RefreshOutcome::Fetched)
    }

    /// True if the last successful fetch started inside the window.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        let now = self.clock.now();
        self.last_fetch()
            .is_some_and(|last| now.saturating_duration_since(last) < self.window)
    }

    #[must_use]
    pub fn designs(&self) -> Vec<Keyed<Design>> {
        self.read_snapshot().designs.clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Keyed<Order>> {
        self.read_snapshot().orders.clone()
    }

    #[must_use]
    pub fn last_fetch(&self) -> Option<Instant> {
        self.read_snapshot().last_fetch
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.read_snapshot().clone()
    }

    fn read_snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_snapshot(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }
}
