//! Byte-offset equality predicates over encoded accounts.
//!
//! RPC nodes evaluate these server-side (`memcmp` filters); the same type is
//! evaluated locally by [`MemcmpFilter::matches`].

use solana_program::pubkey::Pubkey;

use crate::account::{AccountRecord, DISCRIMINATOR_LEN};

/// Offset of `Order.store`.
pub const ORDER_STORE_OFFSET: usize = DISCRIMINATOR_LEN;
/// Offset of `Order.buyer`.
pub const ORDER_BUYER_OFFSET: usize = DISCRIMINATOR_LEN + 32;

/// Matches accounts whose bytes at `offset` equal `bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemcmpFilter {
    pub offset: usize,
    pub bytes: Vec<u8>,
}

impl MemcmpFilter {
    #[must_use]
    pub fn new(offset: usize, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            offset,
            bytes: bytes.into(),
        }
    }

    /// Accounts of kind `A`.
    #[must_use]
    pub fn kind<A: AccountRecord>() -> Self {
        Self::new(0, A::DISCRIMINATOR)
    }

    /// Orders placed in `store`.
    #[must_use]
    pub fn order_store(store: &Pubkey) -> Self {
        Self::new(ORDER_STORE_OFFSET, store.to_bytes())
    }

    /// Orders placed by `buyer`.
    #[must_use]
    pub fn order_buyer(buyer: &Pubkey) -> Self {
        Self::new(ORDER_BUYER_OFFSET, buyer.to_bytes())
    }

    #[must_use]
    pub fn matches(&self, data: &[u8]) -> bool {
        self.offset
            .checked_add(self.bytes.len())
            .and_then(|end| data.get(self.offset..end))
            .is_some_and(|window| window == self.bytes.as_slice())
    }
}
