//! Chain client: reads and decodes program accounts, builds, signs and
//! confirms the six store instructions.
//!
//! Reads of the store singleton are cached with `moka` for the staleness
//! window and invalidated after every write that touches it. Design and order
//! listings are not cached here; see [`crate::cache::DataCache`].

use std::sync::Arc;
use std::time::Duration;

use madma_core::instruction;
use madma_core::{
    AccountRecord, Design, DesignId, DesignUpdate, MemcmpFilter, NewDesign, Order, OrderStatus,
    PROGRAM_ID, ProgramErrorCode, Pubkey, Store, pda,
};
use moka::future::Cache;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::{debug, info, instrument};

use crate::cache::DEFAULT_WINDOW;
use crate::error::{Result, StorefrontError};
use crate::rpc::{Commitment, RpcError, RpcTransport};
use crate::wallet::WalletSigner;

/// Custom error the system program returns when `init` targets an address
/// that is already in use.
const ACCOUNT_ALREADY_IN_USE: u32 = 0;

/// Chain client settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSettings {
    pub program_id: Pubkey,
    /// Commitment a transaction must reach before a write returns.
    pub commitment: Commitment,
    pub confirm_poll_interval: Duration,
    pub store_cache_ttl: Duration,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            program_id: PROGRAM_ID,
            commitment: Commitment::Confirmed,
            confirm_poll_interval: Duration::from_millis(500),
            store_cache_ttl: DEFAULT_WINDOW,
        }
    }
}

/// An account together with its address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<A> {
    pub address: Pubkey,
    pub account: A,
}

/// Which orders to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Every order placed in the store.
    Store,
    /// Orders placed by one buyer.
    Buyer(Pubkey),
}

/// A confirmed write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed {
    pub signature: Signature,
    /// Account the instruction created or modified.
    pub address: Pubkey,
}

// =============================================================================
// ChainClient
// =============================================================================

/// Client for the store program.
pub struct ChainClient<T> {
    inner: Arc<ChainClientInner<T>>,
}

struct ChainClientInner<T> {
    transport: T,
    settings: ChainSettings,
    store_address: Pubkey,
    store_cache: Cache<Pubkey, Option<Store>>,
}

impl<T> Clone for ChainClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: RpcTransport> ChainClient<T> {
    /// Create a new chain client.
    #[must_use]
    pub fn new(transport: T, settings: ChainSettings) -> Self {
        let store_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(settings.store_cache_ttl)
            .build();
        let (store_address, _) = pda::store_address(&settings.program_id);

        Self {
            inner: Arc::new(ChainClientInner {
                transport,
                settings,
                store_address,
                store_cache,
            }),
        }
    }

    #[must_use]
    pub fn program_id(&self) -> &Pubkey {
        &self.inner.settings.program_id
    }

    #[must_use]
    pub fn store_address(&self) -> &Pubkey {
        &self.inner.store_address
    }

    // =========================================================================
    // Read Methods
    // =========================================================================

    /// The store singleton, `None` if it has not been initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or the account does not decode.
    #[instrument(skip(self))]
    pub async fn fetch_store(&self) -> Result<Option<Store>> {
        if let Some(store) = self.inner.store_cache.get(&self.inner.store_address).await {
            debug!("Cache hit for store");
            return Ok(store);
        }
        self.reload_store().await
    }

    /// Read the store singleton from the cluster, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or the account does not decode.
    pub async fn reload_store(&self) -> Result<Option<Store>> {
        let store = self
            .inner
            .transport
            .get_account_data(&self.inner.store_address)
            .await?
            .map(|data| Store::decode(&data))
            .transpose()?;

        self.inner
            .store_cache
            .insert(self.inner.store_address, store.clone())
            .await;
        Ok(store)
    }

    /// Drop the cached store so the next read goes to the cluster.
    pub fn invalidate_store(&self) {
        self.inner.store_cache.invalidate_all();
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account exists at `address`.
    pub async fn fetch_design(&self, address: &Pubkey) -> Result<Design> {
        self.fetch_account(address).await
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no account exists at `address`.
    pub async fn fetch_order(&self, address: &Pubkey) -> Result<Order> {
        self.fetch_account(address).await
    }

    async fn fetch_account<A: AccountRecord>(&self, address: &Pubkey) -> Result<A> {
        let data = self
            .inner
            .transport
            .get_account_data(address)
            .await?
            .ok_or_else(|| StorefrontError::NotFound(format!("{} {address}", A::NAME)))?;
        Ok(A::decode(&data)?)
    }

    /// Every design of this store.
    ///
    /// Designs carry no store field, so a record belongs to this store when
    /// its address is the one derived from this store and its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or any record does not decode.
    #[instrument(skip(self))]
    pub async fn all_designs(&self) -> Result<Vec<Keyed<Design>>> {
        let accounts = self
            .inner
            .transport
            .get_program_accounts(self.program_id(), &[MemcmpFilter::kind::<Design>()])
            .await?;

        let mut designs = Vec::with_capacity(accounts.len());
        for (address, data) in accounts {
            let design = Design::decode(&data)?;
            let (expected, _) =
                pda::design_address(self.program_id(), self.store_address(), design.design_id);
            if expected == address {
                designs.push(Keyed {
                    address,
                    account: design,
                });
            } else {
                debug!(%address, "Skipping design that belongs to another store");
            }
        }
        Ok(designs)
    }

    /// Orders in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the RPC call fails or any record does not decode.
    #[instrument(skip(self))]
    pub async fn all_orders(&self, scope: OrderScope) -> Result<Vec<Keyed<Order>>> {
        let scope_filter = match scope {
            OrderScope::Store => MemcmpFilter::order_store(self.store_address()),
            OrderScope::Buyer(buyer) => MemcmpFilter::order_buyer(&buyer),
        };
        let accounts = self
            .inner
            .transport
            .get_program_accounts(
                self.program_id(),
                &[MemcmpFilter::kind::<Order>(), scope_filter],
            )
            .await?;

        accounts
            .into_iter()
            .map(|(address, data)| {
                Ok(Keyed {
                    address,
                    account: Order::decode(&data)?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Write Methods
    // =========================================================================

    /// Sign, send and confirm a single instruction. The wallet pays fees.
    ///
    /// # Errors
    ///
    /// Returns an error if signing, sending or confirmation fails, or the
    /// blockhash expires first.
    #[instrument(skip_all, fields(payer = %wallet.pubkey()))]
    pub async fn submit(
        &self,
        instruction: Instruction,
        wallet: &dyn WalletSigner,
    ) -> Result<Signature> {
        let payer = wallet.pubkey();
        let blockhash = self.inner.transport.get_latest_blockhash().await?;

        let mut transaction = Transaction::new_with_payer(&[instruction], Some(&payer));
        wallet.sign_transaction(&mut transaction, blockhash.hash)?;

        let signature = self.inner.transport.send_transaction(&transaction).await?;
        debug!(%signature, "Transaction sent");

        self.confirm(&signature, blockhash.last_valid_block_height)
            .await?;
        Ok(signature)
    }

    /// Poll until `signature` reaches the configured commitment, or the
    /// cluster passes `last_valid_block_height` without it.
    async fn confirm(&self, signature: &Signature, last_valid_block_height: u64) -> Result<()> {
        let transport = &self.inner.transport;
        loop {
            if let Some(status) = transport.get_signature_status(signature).await? {
                if let Some(failure) = status.err {
                    return Err(RpcError::TransactionFailed(failure).into());
                }
                if status.reached(self.inner.settings.commitment) {
                    return Ok(());
                }
            }

            if transport.get_block_height().await? > last_valid_block_height {
                return Err(RpcError::BlockhashExpired.into());
            }

            tokio::time::sleep(self.inner.settings.confirm_poll_interval).await;
        }
    }

    /// Create the store with the wallet as its authority.
    ///
    /// # Errors
    ///
    /// Returns `StoreAlreadyInitialized` without sending anything if the
    /// store exists.
    #[instrument(skip_all, fields(authority = %wallet.pubkey()))]
    pub async fn initialize_store(&self, wallet: &dyn WalletSigner) -> Result<Confirmed> {
        if self.reload_store().await?.is_some() {
            return Err(StorefrontError::Program(
                ProgramErrorCode::StoreAlreadyInitialized,
            ));
        }

        let instruction = instruction::initialize_store(self.program_id(), &wallet.pubkey())?;
        let signature = self
            .submit(instruction, wallet)
            .await
            .map_err(|err| match err.custom_code() {
                Some(ACCOUNT_ALREADY_IN_USE) => {
                    StorefrontError::Program(ProgramErrorCode::StoreAlreadyInitialized)
                }
                _ => err,
            })?;
        self.invalidate_store();

        info!(%signature, "Store initialized");
        Ok(Confirmed {
            signature,
            address: self.inner.store_address,
        })
    }

    /// Create a design with the next id.
    ///
    /// # Errors
    ///
    /// Returns a precondition error for empty fields or an uninitialized
    /// store; the program rejects a zero price and non-authority callers.
    #[instrument(skip_all, fields(authority = %wallet.pubkey(), title = %design.title))]
    pub async fn create_design(
        &self,
        wallet: &dyn WalletSigner,
        design: NewDesign,
    ) -> Result<Confirmed> {
        require_text("Title", &design.title)?;
        require_text("Description", &design.description)?;
        require_text("Image URL", &design.image_url)?;

        let store = self.require_store().await?;
        let design_id = DesignId::new(store.designs_count);
        let (address, _) = pda::design_address(self.program_id(), self.store_address(), design_id);

        let instruction =
            instruction::create_design(self.program_id(), &wallet.pubkey(), design_id, design)?;
        let signature = self.submit(instruction, wallet).await?;
        self.invalidate_store();

        info!(%signature, %address, %design_id, "Design created");
        Ok(Confirmed { signature, address })
    }

    /// Apply a partial update; omitted fields are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a precondition error if a provided text field is empty.
    #[instrument(skip_all, fields(authority = %wallet.pubkey(), design = %design))]
    pub async fn update_design(
        &self,
        wallet: &dyn WalletSigner,
        design: &Pubkey,
        update: DesignUpdate,
    ) -> Result<Confirmed> {
        for (field, value) in [
            ("Title", &update.title),
            ("Description", &update.description),
            ("Image URL", &update.image_url),
        ] {
            if let Some(value) = value {
                require_text(field, value)?;
            }
        }

        let instruction =
            instruction::update_design(self.program_id(), &wallet.pubkey(), design, update)?;
        let signature = self.submit(instruction, wallet).await?;

        info!(%signature, "Design updated");
        Ok(Confirmed {
            signature,
            address: *design,
        })
    }

    /// # Errors
    ///
    /// The program rejects non-authority callers.
    #[instrument(skip_all, fields(authority = %wallet.pubkey(), design = %design))]
    pub async fn toggle_design_availability(
        &self,
        wallet: &dyn WalletSigner,
        design: &Pubkey,
    ) -> Result<Confirmed> {
        let instruction =
            instruction::toggle_design_availability(self.program_id(), &wallet.pubkey(), design)?;
        let signature = self.submit(instruction, wallet).await?;

        info!(%signature, "Design availability toggled");
        Ok(Confirmed {
            signature,
            address: *design,
        })
    }

    /// Buy `design`, paying its current price to the store authority.
    ///
    /// # Errors
    ///
    /// Returns `OrderAlreadyExists` if the wallet already has an order at
    /// this store; the program rejects unavailable designs and short
    /// balances.
    #[instrument(skip_all, fields(buyer = %wallet.pubkey(), design = %design))]
    pub async fn create_order(
        &self,
        wallet: &dyn WalletSigner,
        design: &Pubkey,
        shipping_info: String,
    ) -> Result<Confirmed> {
        require_text("Shipping information", &shipping_info)?;

        let store = self.require_store().await?;
        let buyer = wallet.pubkey();
        let (address, _) = pda::order_address(self.program_id(), self.store_address(), &buyer);

        if self
            .inner
            .transport
            .get_account_data(&address)
            .await?
            .is_some()
        {
            return Err(StorefrontError::OrderAlreadyExists(address));
        }

        let instruction = instruction::create_order(
            self.program_id(),
            &buyer,
            &store.authority,
            design,
            shipping_info,
        )?;
        let signature = self
            .submit(instruction, wallet)
            .await
            .map_err(|err| match err.custom_code() {
                Some(ACCOUNT_ALREADY_IN_USE) => StorefrontError::OrderAlreadyExists(address),
                _ => err,
            })?;
        self.invalidate_store();

        info!(%signature, order = %address, "Order created");
        Ok(Confirmed { signature, address })
    }

    /// Set an order's status. No transition rules are applied client-side.
    ///
    /// # Errors
    ///
    /// The program rejects non-authority callers.
    #[instrument(skip_all, fields(authority = %wallet.pubkey(), order = %order, status = %new_status))]
    pub async fn update_order_status(
        &self,
        wallet: &dyn WalletSigner,
        order: &Pubkey,
        new_status: OrderStatus,
    ) -> Result<Confirmed> {
        let instruction = instruction::update_order_status(
            self.program_id(),
            &wallet.pubkey(),
            order,
            new_status,
        )?;
        let signature = self.submit(instruction, wallet).await?;

        info!(%signature, "Order status updated");
        Ok(Confirmed {
            signature,
            address: *order,
        })
    }

    async fn require_store(&self) -> Result<Store> {
        self.reload_store().await?.ok_or_else(|| {
            StorefrontError::Precondition("The store has not been initialized yet.".to_string())
        })
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StorefrontError::Precondition(format!("{field} is required.")));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("Title", "Sunset Tee").is_ok());
        let err = require_text("Title", "   ").unwrap_err();
        assert_eq!(err.user_message(), "Title is required.");
    }

    #[test]
    fn test_default_settings_target_deployed_program() {
        let settings = ChainSettings::default();
        assert_eq!(settings.program_id, PROGRAM_ID);
        assert_eq!(settings.commitment, Commitment::Confirmed);
        assert_eq!(settings.store_cache_ttl, Duration::from_secs(30));
    }
}
