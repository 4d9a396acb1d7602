//! One viewer's session with the store: chain client, listing cache and
//! wallet, bound together.
//!
//! Every mutation is followed by a forced refresh so listings reflect the
//! confirmed write. Outcomes are reported through the notification sink.

use std::sync::Arc;
use std::time::Duration;

use madma_core::{Design, DesignUpdate, NewDesign, Order, OrderStatus, Pubkey};
use tracing::warn;

use crate::cache::{ChainSource, Clock, DataCache, RefreshOutcome};
use crate::chain::{ChainClient, Confirmed, Keyed};
use crate::error::{Result, StorefrontError, add_breadcrumb, set_sentry_wallet};
use crate::notify::{Notification, NotificationSink};
use crate::rpc::RpcTransport;
use crate::views::StoreInfo;
use crate::wallet::WalletSigner;

/// Shown when a mutation is attempted without a wallet.
pub const CONNECT_WALLET: &str = "Please connect your wallet!";

pub struct ProgramProvider<T> {
    chain: ChainClient<T>,
    cache: DataCache<ChainSource<T>>,
    wallet: Option<Arc<dyn WalletSigner>>,
    notifier: Arc<dyn NotificationSink>,
}

impl<T: RpcTransport> ProgramProvider<T> {
    #[must_use]
    pub fn new(
        chain: ChainClient<T>,
        wallet: Option<Arc<dyn WalletSigner>>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        let viewer = wallet.as_ref().map(|wallet| wallet.pubkey());
        if let Some(viewer) = &viewer {
            set_sentry_wallet(viewer);
        }
        let cache = DataCache::new(ChainSource::new(chain.clone(), viewer), clock, window);

        Self {
            chain,
            cache,
            wallet,
            notifier,
        }
    }

    /// Connected wallet address.
    #[must_use]
    pub fn viewer(&self) -> Option<Pubkey> {
        self.wallet.as_ref().map(|wallet| wallet.pubkey())
    }

    #[must_use]
    pub const fn chain(&self) -> &ChainClient<T> {
        &self.chain
    }

    #[must_use]
    pub const fn cache(&self) -> &DataCache<ChainSource<T>> {
        &self.cache
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if either listing fails to load.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        self.cache.refresh(force).await
    }

    #[must_use]
    pub fn designs(&self) -> Vec<Keyed<Design>> {
        self.cache.designs()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Keyed<Order>> {
        self.cache.orders()
    }

    /// Store summary, `None` if the store is not initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn store_info(&self) -> Result<Option<StoreInfo>> {
        let viewer = self.viewer();
        Ok(self
            .chain
            .fetch_store()
            .await?
            .map(|store| StoreInfo::new(&store, viewer.as_ref())))
    }

    /// True if the connected wallet is the store authority.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn is_owner(&self) -> Result<bool> {
        Ok(self
            .store_info()
            .await?
            .is_some_and(|info| info.is_owner))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// # Errors
    ///
    /// See [`ChainClient::initialize_store`].
    pub async fn initialize_store(&self) -> Result<Confirmed> {
        add_breadcrumb("store", "initialize", None);
        let result = match self.signer() {
            Ok(wallet) => self.chain.initialize_store(wallet).await,
            Err(err) => Err(err),
        };
        self.finish(("Store initialized", "Could not initialize the store"), result).await
    }

    /// # Errors
    ///
    /// See [`ChainClient::create_design`].
    pub async fn create_design(&self, design: NewDesign) -> Result<Confirmed> {
        add_breadcrumb("design", "create", Some(&[("title", design.title.as_str())]));
        let result = match self.signer() {
            Ok(wallet) => self.chain.create_design(wallet, design).await,
            Err(err) => Err(err),
        };
        self.finish(("Design created", "Could not create the design"), result).await
    }

    /// # Errors
    ///
    /// See [`ChainClient::update_design`].
    pub async fn update_design(&self, design: &Pubkey, update: DesignUpdate) -> Result<Confirmed> {
        let address = design.to_string();
        add_breadcrumb("design", "update", Some(&[("design", address.as_str())]));
        let result = match self.signer() {
            Ok(wallet) => self.chain.update_design(wallet, design, update).await,
            Err(err) => Err(err),
        };
        self.finish(("Design updated", "Could not update the design"), result).await
    }

    /// # Errors
    ///
    /// See [`ChainClient::toggle_design_availability`].
    pub async fn toggle_design_availability(&self, design: &Pubkey) -> Result<Confirmed> {
        let address = design.to_string();
        add_breadcrumb("design", "toggle", Some(&[("design", address.as_str())]));
        let result = match self.signer() {
            Ok(wallet) => self.chain.toggle_design_availability(wallet, design).await,
            Err(err) => Err(err),
        };
        self.finish(
            ("Design availability updated", "Could not change design availability"),
            result,
        )
        .await
    }

    /// # Errors
    ///
    /// See [`ChainClient::create_order`].
    pub async fn create_order(&self, design: &Pubkey, shipping_info: String) -> Result<Confirmed> {
        let address = design.to_string();
        add_breadcrumb("order", "create", Some(&[("design", address.as_str())]));
        let result = match self.signer() {
            Ok(wallet) => self.chain.create_order(wallet, design, shipping_info).await,
            Err(err) => Err(err),
        };
        self.finish(("Order placed", "Could not place the order"), result).await
    }

    /// # Errors
    ///
    /// See [`ChainClient::update_order_status`].
    pub async fn update_order_status(
        &self,
        order: &Pubkey,
        new_status: OrderStatus,
    ) -> Result<Confirmed> {
        let address = order.to_string();
        add_breadcrumb(
            "order",
            "status",
            Some(&[("order", address.as_str()), ("status", new_status.as_str())]),
        );
        let result = match self.signer() {
            Ok(wallet) => {
                self.chain
                    .update_order_status(wallet, order, new_status)
                    .await
            }
            Err(err) => Err(err),
        };
        self.finish(("Order status updated", "Could not update the order status"), result).await
    }

    fn signer(&self) -> Result<&dyn WalletSigner> {
        self.wallet
            .as_deref()
            .ok_or_else(|| StorefrontError::Precondition(CONNECT_WALLET.to_string()))
    }

    /// Report the outcome of a mutation and re-read listings after success.
    async fn finish(
        &self,
        (succeeded, failed): (&str, &str),
        result: Result<Confirmed>,
    ) -> Result<Confirmed> {
        match result {
            Ok(confirmed) => {
                self.notifier
                    .notify(Notification::success(succeeded).with_txid(confirmed.signature));
                // The write is confirmed; a failed re-read only leaves listings stale.
                if let Err(err) = self.cache.refresh(true).await {
                    warn!(error = %err, "Refresh after write failed");
                    self.notifier.notify(
                        Notification::info("Listings could not be refreshed")
                            .with_description(err.user_message()),
                    );
                }
                Ok(confirmed)
            }
            Err(err) => {
                err.report();
                self.notifier.notify(
                    Notification::error(failed).with_description(err.user_message()),
                );
                Err(err)
            }
        }
    }
}
