//! Madma Storefront - client library for the Madma print-on-demand store.
//!
//! # Architecture
//!
//! - All business rules live in the on-chain store program; this crate only
//!   reads its accounts and submits its instructions
//! - No optimistic updates: every confirmed write is followed by a forced
//!   re-read of the listings
//! - Listings are cached for a staleness window (30 seconds by default)
//!
//! # Modules
//!
//! - [`rpc`] - JSON-RPC transport and the [`rpc::RpcTransport`] seam
//! - [`chain`] - Account reads and the six store instructions
//! - [`cache`] - Staleness-window listing cache with an injected clock
//! - [`provider`] - One viewer's session: chain client, cache and wallet
//! - [`views`] - Filtering, sorting and formatting for display
//! - [`wallet`] - Transaction signing seam
//! - [`notify`] - User-facing notifications
//!
//! # Example
//!
//! ```rust,ignore
//! use madma_storefront::{ChainClient, HttpRpcClient, StorefrontConfig};
//!
//! let config = StorefrontConfig::from_env()?;
//! let chain = ChainClient::new(HttpRpcClient::new(&config.rpc), config.rpc.chain_settings());
//!
//! let designs = chain.all_designs().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod chain;
pub mod config;
pub mod error;
pub mod notify;
pub mod provider;
pub mod rpc;
pub mod views;
pub mod wallet;

pub use cache::{Clock, DataCache, RefreshOutcome, SystemClock};
pub use chain::{ChainClient, ChainSettings, Confirmed, Keyed, OrderScope};
pub use config::{ConfigError, RpcConfig, StorefrontConfig};
pub use error::{Result, StorefrontError};
pub use notify::{Notification, NotificationKind, NotificationSink, TracingSink};
pub use provider::ProgramProvider;
pub use rpc::{HttpRpcClient, RpcError, RpcTransport};
pub use wallet::{KeypairWallet, WalletError, WalletSigner};
