//! Madma Core - Shared types and the on-chain wire contract.
//!
//! This crate provides everything needed to talk to the Madma store program
//! without doing any I/O:
//! - `storefront` - Chain client, data cache, and views
//! - `cli` - Terminal storefront and store management
//! - `integration-tests` - In-memory program emulation for tests
//!
//! # Architecture
//!
//! The core crate contains only types, codecs and pure functions - no RPC
//! clients, no wallets, no clocks. Every byte layout here must match the
//! deployed program exactly, otherwise reads fail to decode and writes are
//! rejected.
//!
//! # Modules
//!
//! - [`types`] - Newtypes for design ids, lamport amounts, and order statuses
//! - [`account`] - Store, Design and Order account layouts
//! - [`instruction`] - Instruction payloads and account lists
//! - [`pda`] - Derived address scheme
//! - [`filter`] - Byte-offset equality predicates over encoded accounts
//! - [`error`] - Program error codes and codec errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod error;
pub mod filter;
pub mod instruction;
pub mod pda;
pub mod types;

pub use account::{AccountRecord, Design, Order, Store};
pub use error::{CodecError, ProgramErrorCode};
pub use filter::MemcmpFilter;
pub use instruction::{DesignUpdate, NewDesign, StoreInstruction};
pub use types::*;

pub use solana_program::pubkey::Pubkey;

/// Program id of the deployed Madma store program.
pub const PROGRAM_ID: Pubkey = solana_program::pubkey!("Djzp1vsviNw61kJSDFbYfUEGUXwaLTZVW2e1L76S8QtA");
