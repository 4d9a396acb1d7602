//! Derived address scheme.
//!
//! These seeds are fixed by the deployed program. Changing any of them makes
//! the client compute addresses the program will reject.

use solana_program::pubkey::Pubkey;

use crate::types::DesignId;

pub const STORE_SEED: &[u8] = b"store";
pub const DESIGN_SEED: &[u8] = b"design";
pub const ORDER_SEED: &[u8] = b"order";

/// Store singleton: `["store"]`.
#[must_use]
pub fn store_address(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STORE_SEED], program_id)
}

/// Design: `["design", store, design_id as u64 LE]`.
#[must_use]
pub fn design_address(program_id: &Pubkey, store: &Pubkey, design_id: DesignId) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[DESIGN_SEED, store.as_ref(), &design_id.to_le_bytes()],
        program_id,
    )
}

/// Order: `["order", store, buyer]`. One order address per buyer.
#[must_use]
pub fn order_address(program_id: &Pubkey, store: &Pubkey, buyer: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[ORDER_SEED, store.as_ref(), buyer.as_ref()], program_id)
}
