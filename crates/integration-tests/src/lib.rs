//! Integration tests for the Madma storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p madma-integration-tests
//! ```
//!
//! # Test Harness
//!
//! No cluster is needed. [`FakeChain`] implements
//! [`madma_storefront::RpcTransport`] by executing submitted transactions
//! against an in-memory ledger, enforcing the same rules and returning the
//! same error codes as the deployed store program. [`ManualClock`] drives
//! the listing cache's staleness window and [`RecordingSink`] collects
//! notifications.
//!
//! ```rust,ignore
//! let ctx = TestContext::new();
//! let owner = ctx.wallet(10 * LAMPORTS_PER_SOL);
//! let provider = ctx.provider(Some(&owner));
//! provider.initialize_store().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use madma_core::instruction::StoreInstruction;
use madma_core::{
    AccountRecord, Design, DesignId, Lamports, MemcmpFilter, Order, OrderStatus, PROGRAM_ID,
    ProgramErrorCode, Pubkey, Store, pda,
};
use madma_storefront::rpc::{Commitment, RecentBlockhash, SignatureStatus, TransactionFailure};
use madma_storefront::{
    ChainClient, ChainSettings, Clock, KeypairWallet, Notification, NotificationSink,
    ProgramProvider, RpcError, RpcTransport, WalletSigner,
};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::CompiledInstruction;
use solana_sdk::message::Message;
use solana_sdk::signature::{Keypair, Signature};
use solana_sdk::transaction::Transaction;

/// Blocks a blockhash stays valid for.
const BLOCKHASH_LIFETIME: u64 = 150;

/// Custom code the system program returns for an address already in use.
pub const ACCOUNT_ALREADY_IN_USE: u32 = 0;

// =============================================================================
// FakeChain
// =============================================================================

/// Why an instruction was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Custom(u32),
    Other(&'static str),
}

impl From<ProgramErrorCode> for Failure {
    fn from(code: ProgramErrorCode) -> Self {
        Self::Custom(code.code())
    }
}

impl Failure {
    fn into_failure(self, instruction_index: u8) -> TransactionFailure {
        let (custom_code, detail) = match self {
            Self::Custom(code) => (
                Some(code),
                format!("{{\"InstructionError\":[{instruction_index},{{\"Custom\":{code}}}]}}"),
            ),
            Self::Other(name) => (
                None,
                format!("{{\"InstructionError\":[{instruction_index},\"{name}\"]}}"),
            ),
        };
        TransactionFailure {
            instruction_index: Some(instruction_index),
            custom_code,
            detail,
        }
    }
}

/// How a sent transaction settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Settlement {
    /// Rejections surface from `send_transaction`, the way a node's
    /// preflight simulation reports them.
    #[default]
    Preflight,
    /// Preflight is skipped: the transaction lands and a rejection shows up
    /// in its confirmed status.
    OnChain,
    /// The transaction is accepted but never lands.
    Dropped,
}

/// A recorded signature status, hidden until enough polls have passed.
#[derive(Debug, Clone)]
struct PendingStatus {
    remaining_polls: usize,
    status: SignatureStatus,
}

/// Program-owned accounts and wallet balances.
#[derive(Debug, Clone, Default)]
struct Ledger {
    accounts: HashMap<Pubkey, Vec<u8>>,
    balances: HashMap<Pubkey, u64>,
    /// Unix seconds handed to the next order.
    unix_timestamp: i64,
}

impl Ledger {
    fn load<A: AccountRecord>(&self, address: &Pubkey) -> Result<A, Failure> {
        let data = self
            .accounts
            .get(address)
            .ok_or(Failure::Other("AccountNotInitialized"))?;
        A::decode(data).map_err(|_| Failure::Other("AccountDidNotDeserialize"))
    }

    fn save<A: AccountRecord>(&mut self, address: Pubkey, account: &A) -> Result<(), Failure> {
        let data = account
            .encode()
            .map_err(|_| Failure::Other("AccountDidNotSerialize"))?;
        self.accounts.insert(address, data);
        Ok(())
    }

    fn create<A: AccountRecord>(&mut self, address: Pubkey, account: &A) -> Result<(), Failure> {
        if self.accounts.contains_key(&address) {
            return Err(Failure::Custom(ACCOUNT_ALREADY_IN_USE));
        }
        self.save(address, account)
    }
}

/// An account referenced by an instruction.
#[derive(Debug, Clone, Copy)]
struct AccountRef {
    key: Pubkey,
    signed: bool,
}

struct Inner {
    program_id: Pubkey,
    ledger: Mutex<Ledger>,
    statuses: Mutex<HashMap<Signature, PendingStatus>>,
    block_height: Mutex<u64>,
    program_account_reads: AtomicUsize,
    status_polls: AtomicUsize,
    confirmation_delay: AtomicUsize,
    settlement: Mutex<Settlement>,
    offline: AtomicBool,
}

/// In-memory cluster running the store program.
///
/// Transactions execute atomically: every instruction runs against a copy of
/// the ledger, which is committed only if all of them succeed. Every block
/// height read advances the chain by one block. See [`Settlement`] for how
/// rejections surface.
#[derive(Clone)]
pub struct FakeChain {
    inner: Arc<Inner>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new(PROGRAM_ID)
    }
}

impl FakeChain {
    #[must_use]
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            inner: Arc::new(Inner {
                program_id,
                ledger: Mutex::new(Ledger {
                    unix_timestamp: 1_700_000_000,
                    ..Ledger::default()
                }),
                statuses: Mutex::new(HashMap::new()),
                block_height: Mutex::new(1),
                program_account_reads: AtomicUsize::new(0),
                status_polls: AtomicUsize::new(0),
                confirmation_delay: AtomicUsize::new(0),
                settlement: Mutex::new(Settlement::default()),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Give `owner` a wallet balance.
    pub fn fund(&self, owner: &Pubkey, lamports: u64) {
        *self.ledger().balances.entry(*owner).or_default() += lamports;
    }

    #[must_use]
    pub fn balance(&self, owner: &Pubkey) -> Lamports {
        Lamports::new(self.ledger().balances.get(owner).copied().unwrap_or_default())
    }

    /// Place raw data at `address`, bypassing the program.
    pub fn insert_account(&self, address: Pubkey, data: Vec<u8>) {
        self.ledger().accounts.insert(address, data);
    }

    #[must_use]
    pub fn store(&self) -> Option<Store> {
        let (address, _) = pda::store_address(&self.inner.program_id);
        self.ledger().load(&address).ok()
    }

    #[must_use]
    pub fn design(&self, address: &Pubkey) -> Option<Design> {
        self.ledger().load(address).ok()
    }

    #[must_use]
    pub fn order(&self, address: &Pubkey) -> Option<Order> {
        self.ledger().load(address).ok()
    }

    /// Number of order accounts on the ledger.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.ledger()
            .accounts
            .values()
            .filter(|data| data.starts_with(&Order::DISCRIMINATOR))
            .count()
    }

    /// Number of `getProgramAccounts` calls served.
    #[must_use]
    pub fn program_account_reads(&self) -> usize {
        self.inner.program_account_reads.load(Ordering::SeqCst)
    }

    /// Number of `getSignatureStatuses` calls served.
    #[must_use]
    pub fn status_polls(&self) -> usize {
        self.inner.status_polls.load(Ordering::SeqCst)
    }

    /// Report no status for the next `polls` status reads of each new
    /// transaction.
    pub fn delay_confirmation(&self, polls: usize) {
        self.inner.confirmation_delay.store(polls, Ordering::SeqCst);
    }

    pub fn set_settlement(&self, settlement: Settlement) {
        *self
            .inner
            .settlement
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = settlement;
    }

    fn settlement(&self) -> Settlement {
        *self
            .inner
            .settlement
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// While offline every listing read fails.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.inner.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn advance_block(&self) {
        *self
            .inner
            .block_height
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn current_block(&self) -> u64 {
        *self
            .inner
            .block_height
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn execute(&self, transaction: &Transaction) -> Result<(), TransactionFailure> {
        transaction.verify().map_err(|err| TransactionFailure {
            instruction_index: None,
            custom_code: None,
            detail: err.to_string(),
        })?;

        let mut guard = self.ledger();
        let mut working = guard.clone();
        let message = &transaction.message;
        for (index, instruction) in message.instructions.iter().enumerate() {
            let index = u8::try_from(index).unwrap_or(u8::MAX);
            self.process(&mut working, message, instruction)
                .map_err(|failure| failure.into_failure(index))?;
        }
        working.unix_timestamp += 1;
        *guard = working;
        Ok(())
    }

    fn process(
        &self,
        ledger: &mut Ledger,
        message: &Message,
        instruction: &CompiledInstruction,
    ) -> Result<(), Failure> {
        let program = message
            .account_keys
            .get(usize::from(instruction.program_id_index))
            .ok_or(Failure::Other("NotEnoughAccountKeys"))?;
        if *program != self.inner.program_id {
            return Err(Failure::Other("IncorrectProgramId"));
        }

        let account = |position: usize| -> Result<AccountRef, Failure> {
            let index = instruction
                .accounts
                .get(position)
                .map(|index| usize::from(*index))
                .ok_or(Failure::Other("NotEnoughAccountKeys"))?;
            let key = message
                .account_keys
                .get(index)
                .ok_or(Failure::Other("NotEnoughAccountKeys"))?;
            Ok(AccountRef {
                key: *key,
                signed: message.is_signer(index),
            })
        };

        let program_id = &self.inner.program_id;
        let (store_address, store_bump) = pda::store_address(program_id);
        let store_ref = |position: usize| -> Result<AccountRef, Failure> {
            let store = account(position)?;
            if store.key == store_address {
                Ok(store)
            } else {
                Err(Failure::Other("ConstraintSeeds"))
            }
        };

        let decoded = StoreInstruction::unpack(&instruction.data)
            .map_err(|_| Failure::Other("InstructionDidNotDeserialize"))?;

        match decoded {
            StoreInstruction::InitializeStore => {
                let store = store_ref(0)?;
                let authority = signer(account(1)?)?;
                ledger.create(
                    store.key,
                    &Store {
                        authority: authority.key,
                        designs_count: 0,
                        earnings: Lamports::ZERO,
                        bump: store_bump,
                    },
                )
            }
            StoreInstruction::CreateDesign(args) => {
                let design = account(0)?;
                let store_key = store_ref(1)?.key;
                let mut store: Store = ledger.load(&store_key)?;
                require_authority(&store, account(2)?)?;
                if args.price == Lamports::ZERO {
                    return Err(ProgramErrorCode::InvalidPrice.into());
                }

                let design_id = DesignId::new(store.designs_count);
                let (expected, bump) = pda::design_address(program_id, &store_key, design_id);
                if design.key != expected {
                    return Err(Failure::Other("ConstraintSeeds"));
                }
                ledger.create(
                    design.key,
                    &Design {
                        design_id,
                        price: args.price,
                        title: args.title,
                        description: args.description,
                        image_url: args.image_url,
                        available: true,
                        sales_count: 0,
                        bump,
                    },
                )?;
                store.designs_count += 1;
                ledger.save(store_key, &store)
            }
            StoreInstruction::UpdateDesign(update) => {
                let design_key = account(0)?.key;
                let store: Store = ledger.load(&store_ref(1)?.key)?;
                require_authority(&store, account(2)?)?;
                let mut design: Design = ledger.load(&design_key)?;

                if let Some(title) = update.title {
                    design.title = title;
                }
                if let Some(description) = update.description {
                    design.description = description;
                }
                if let Some(image_url) = update.image_url {
                    design.image_url = image_url;
                }
                if let Some(price) = update.price {
                    if price == Lamports::ZERO {
                        return Err(ProgramErrorCode::InvalidPrice.into());
                    }
                    design.price = price;
                }
                if let Some(available) = update.available {
                    design.available = available;
                }
                ledger.save(design_key, &design)
            }
            StoreInstruction::ToggleDesignAvailability => {
                let design_key = account(0)?.key;
                let store: Store = ledger.load(&store_ref(1)?.key)?;
                require_authority(&store, account(2)?)?;
                let mut design: Design = ledger.load(&design_key)?;
                design.available = !design.available;
                ledger.save(design_key, &design)
            }
            StoreInstruction::CreateOrder { shipping_info } => {
                let order = account(0)?;
                let design_key = account(1)?.key;
                let store_key = store_ref(2)?.key;
                let store_authority = account(3)?;
                let buyer = signer(account(4)?)?;

                let (expected, bump) = pda::order_address(program_id, &store_key, &buyer.key);
                if order.key != expected {
                    return Err(Failure::Other("ConstraintSeeds"));
                }
                if ledger.accounts.contains_key(&order.key) {
                    return Err(Failure::Custom(ACCOUNT_ALREADY_IN_USE));
                }

                let mut store: Store = ledger.load(&store_key)?;
                if store.authority != store_authority.key {
                    return Err(ProgramErrorCode::Unauthorized.into());
                }
                let mut design: Design = ledger.load(&design_key)?;
                if !design.available {
                    return Err(ProgramErrorCode::DesignNotAvailable.into());
                }

                let price = design.price.as_u64();
                let balance = ledger.balances.entry(buyer.key).or_default();
                if *balance < price {
                    return Err(ProgramErrorCode::InsufficientBalance.into());
                }
                *balance -= price;
                *ledger.balances.entry(store.authority).or_default() += price;

                store.earnings = store
                    .earnings
                    .checked_add(design.price)
                    .ok_or(Failure::Custom(ProgramErrorCode::PaymentFailed.code()))?;
                design.sales_count += 1;

                let created_at = ledger.unix_timestamp;
                ledger.create(
                    order.key,
                    &Order {
                        store: store_key,
                        buyer: buyer.key,
                        design_id: design.design_id,
                        price_paid: design.price,
                        shipping_info,
                        status: OrderStatus::Created,
                        created_at,
                        bump,
                    },
                )?;
                ledger.save(design_key, &design)?;
                ledger.save(store_key, &store)
            }
            StoreInstruction::UpdateOrderStatus { new_status } => {
                let order_key = account(0)?.key;
                let store: Store = ledger.load(&store_ref(1)?.key)?;
                require_authority(&store, account(2)?)?;
                let mut order: Order = ledger.load(&order_key)?;
                order.status = new_status;
                ledger.save(order_key, &order)
            }
        }
    }
}

fn signer(account: AccountRef) -> Result<AccountRef, Failure> {
    if account.signed {
        Ok(account)
    } else {
        Err(Failure::Other("MissingRequiredSignature"))
    }
}

fn require_authority(store: &Store, account: AccountRef) -> Result<(), Failure> {
    let account = signer(account)?;
    if store.is_authority(&account.key) {
        Ok(())
    } else {
        Err(ProgramErrorCode::Unauthorized.into())
    }
}

impl RpcTransport for FakeChain {
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        Ok(self.ledger().accounts.get(address).cloned())
    }

    async fn get_program_accounts(
        &self,
        _program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, RpcError> {
        self.inner.program_account_reads.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers interleave the way real network reads do.
        tokio::task::yield_now().await;
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(RpcError::Rpc {
                code: -32005,
                message: "Node is unhealthy".to_string(),
            });
        }

        Ok(self
            .ledger()
            .accounts
            .iter()
            .filter(|(_, data)| filters.iter().all(|filter| filter.matches(data)))
            .map(|(address, data)| (*address, data.clone()))
            .collect())
    }

    async fn get_latest_blockhash(&self) -> Result<RecentBlockhash, RpcError> {
        Ok(RecentBlockhash {
            hash: Hash::new_unique(),
            last_valid_block_height: self.current_block() + BLOCKHASH_LIFETIME,
        })
    }

    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let signature = transaction
            .signatures
            .first()
            .copied()
            .ok_or_else(|| RpcError::InvalidResponse("unsigned transaction".to_string()))?;
        let err = match self.settlement() {
            Settlement::Dropped => return Ok(signature),
            Settlement::Preflight => {
                self.execute(transaction)
                    .map_err(RpcError::TransactionFailed)?;
                None
            }
            Settlement::OnChain => self.execute(transaction).err(),
        };
        self.advance_block();

        self.inner
            .statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                signature,
                PendingStatus {
                    remaining_polls: self.inner.confirmation_delay.load(Ordering::SeqCst),
                    status: SignatureStatus {
                        confirmation: Some(Commitment::Confirmed),
                        err,
                    },
                },
            );
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        self.inner.status_polls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self
            .inner
            .statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(pending) = statuses.get_mut(signature) else {
            return Ok(None);
        };
        if pending.remaining_polls > 0 {
            pending.remaining_polls -= 1;
            return Ok(None);
        }
        Ok(Some(pending.status.clone()))
    }

    async fn get_block_height(&self) -> Result<u64, RpcError> {
        self.advance_block();
        Ok(self.current_block())
    }
}

// =============================================================================
// Clock and notifications
// =============================================================================

/// A clock that only moves when told to.
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps every notification it receives.
#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    #[must_use]
    pub fn received(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

// =============================================================================
// TestContext
// =============================================================================

/// One fake cluster shared by any number of viewers.
pub struct TestContext {
    pub chain: FakeChain,
    pub clock: Arc<ManualClock>,
    pub notifications: Arc<RecordingSink>,
    pub settings: ChainSettings,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let settings = ChainSettings {
            confirm_poll_interval: Duration::from_millis(1),
            ..ChainSettings::default()
        };
        Self {
            chain: FakeChain::new(settings.program_id),
            clock: Arc::new(ManualClock::default()),
            notifications: Arc::new(RecordingSink::default()),
            settings,
        }
    }

    /// A fresh chain client with its own store cache.
    #[must_use]
    pub fn client(&self) -> ChainClient<FakeChain> {
        ChainClient::new(self.chain.clone(), self.settings)
    }

    /// A new wallet holding `lamports`.
    #[must_use]
    pub fn wallet(&self, lamports: u64) -> Arc<KeypairWallet> {
        let wallet = Arc::new(KeypairWallet::new(Keypair::new()));
        self.chain.fund(&wallet.pubkey(), lamports);
        wallet
    }

    /// A session for `wallet`, or a read-only one without a wallet.
    #[must_use]
    pub fn provider(&self, wallet: Option<&Arc<KeypairWallet>>) -> ProgramProvider<FakeChain> {
        let wallet = wallet.map(|wallet| Arc::clone(wallet) as Arc<dyn WalletSigner>);
        ProgramProvider::new(
            self.client(),
            wallet,
            self.notifications.clone(),
            self.clock.clone(),
            self.settings.store_cache_ttl,
        )
    }
}
