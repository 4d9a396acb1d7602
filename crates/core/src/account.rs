//! Account layouts owned by the store program.
//!
//! Every account is an 8-byte discriminator (`sha256("account:<Name>")[..8]`)
//! followed by the Borsh encoding of its fields in declaration order. The
//! client only ever holds read-only projections of these records.

use borsh::{BorshDeserialize, BorshSerialize};
use chrono::{DateTime, Utc};
use solana_program::pubkey::Pubkey;

use crate::error::CodecError;
use crate::types::{DesignId, Lamports, OrderStatus};

/// Length of the type tag in front of every account.
pub const DISCRIMINATOR_LEN: usize = 8;

/// A record kind with a fixed discriminator.
pub trait AccountRecord: BorshSerialize + BorshDeserialize {
    /// Account name as declared by the program.
    const NAME: &'static str;
    /// `sha256("account:<NAME>")[..8]`.
    const DISCRIMINATOR: [u8; 8];

    /// Encode as stored on-chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the Borsh body cannot be written.
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut data = Self::DISCRIMINATOR.to_vec();
        self.serialize(&mut data).map_err(|source| CodecError::Body {
            kind: Self::NAME,
            source,
        })?;
        Ok(data)
    }

    /// Decode account data. Bytes past the end of the record are ignored,
    /// since accounts are often allocated larger than their content.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is too short, carries another kind's
    /// discriminator, or has a truncated body.
    fn decode(data: &[u8]) -> Result<Self, CodecError>
    where
        Self: Sized,
    {
        let (discriminator, mut body) =
            data.split_first_chunk::<DISCRIMINATOR_LEN>()
                .ok_or(CodecError::TooShort {
                    kind: Self::NAME,
                    len: data.len(),
                })?;
        if *discriminator != Self::DISCRIMINATOR {
            return Err(CodecError::Discriminator {
                kind: Self::NAME,
                found: *discriminator,
            });
        }
        Self::deserialize(&mut body).map_err(|source| CodecError::Body {
            kind: Self::NAME,
            source,
        })
    }
}

/// The marketplace singleton.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Store {
    /// Identity allowed to manage designs and order statuses.
    pub authority: Pubkey,
    /// Next design id; never decreases.
    pub designs_count: u64,
    /// Total accepted payments; never decreases.
    pub earnings: Lamports,
    pub bump: u8,
}

impl Store {
    #[must_use]
    pub fn is_authority(&self, identity: &Pubkey) -> bool {
        self.authority == *identity
    }
}

impl AccountRecord for Store {
    const NAME: &'static str = "Store";
    const DISCRIMINATOR: [u8; 8] = [130, 48, 247, 244, 182, 191, 30, 26];
}

/// A purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Design {
    pub design_id: DesignId,
    pub price: Lamports,
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// Gates purchasability. Designs are never deleted, only disabled.
    pub available: bool,
    pub sales_count: u64,
    pub bump: u8,
}

impl AccountRecord for Design {
    const NAME: &'static str = "Design";
    const DISCRIMINATOR: [u8; 8] = [212, 203, 23, 211, 13, 205, 25, 54];
}

/// A buyer's purchase of one design.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Order {
    pub store: Pubkey,
    pub buyer: Pubkey,
    /// Snapshot of the purchased design at order time.
    pub design_id: DesignId,
    pub price_paid: Lamports,
    pub shipping_info: String,
    pub status: OrderStatus,
    /// Unix timestamp, seconds.
    pub created_at: i64,
    pub bump: u8,
}

impl Order {
    /// Creation time, if the timestamp is representable.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created_at, 0)
    }
}

impl AccountRecord for Order {
    const NAME: &'static str = "Order";
    const DISCRIMINATOR: [u8; 8] = [134, 173, 223, 185, 77, 86, 28, 51];
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use sha2::{Digest, Sha256};

    use super::*;

    fn discriminator_for(name: &str) -> [u8; 8] {
        let digest = Sha256::digest(format!("account:{name}").as_bytes());
        let mut out = [0u8; 8];
        out.copy_from_slice(&digest[..8]);
        out
    }

    fn sample_order() -> Order {
        Order {
            store: Pubkey::new_unique(),
            buyer: Pubkey::new_unique(),
            design_id: DesignId::new(3),
            price_paid: Lamports::new(250_000_000),
            shipping_info: "1 Main St, Springfield".to_string(),
            status: OrderStatus::Shipped,
            created_at: 1_700_000_000,
            bump: 254,
        }
    }

    #[test]
    fn test_discriminators_match_anchor_hashes() {
        assert_eq!(Store::DISCRIMINATOR, discriminator_for("Store"));
        assert_eq!(Design::DISCRIMINATOR, discriminator_for("Design"));
        assert_eq!(Order::DISCRIMINATOR, discriminator_for("Order"));
    }

    #[test]
    fn test_store_round_trip() {
        let store = Store {
            authority: Pubkey::new_unique(),
            designs_count: 12,
            earnings: Lamports::new(9_000_000_000),
            bump: 255,
        };
        let data = store.encode().unwrap();
        // discriminator + pubkey + u64 + u64 + u8
        assert_eq!(data.len(), 8 + 32 + 8 + 8 + 1);
        assert_eq!(Store::decode(&data).unwrap(), store);
    }

    #[test]
    fn test_design_round_trip() {
        let design = Design {
            design_id: DesignId::new(7),
            price: Lamports::new(1_000_000_000),
            title: "Sunset Tee".to_string(),
            description: "Screen printed".to_string(),
            image_url: "https://example.com/sunset.png".to_string(),
            available: false,
            sales_count: 41,
            bump: 253,
        };
        let data = design.encode().unwrap();
        assert_eq!(Design::decode(&data).unwrap(), design);
    }

    #[test]
    fn test_order_round_trip_and_field_offsets() {
        let order = sample_order();
        let data = order.encode().unwrap();
        assert_eq!(&data[8..40], order.store.as_ref());
        assert_eq!(&data[40..72], order.buyer.as_ref());
        assert_eq!(Order::decode(&data).unwrap(), order);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let order = sample_order();
        let mut data = order.encode().unwrap();
        data.extend_from_slice(&[0u8; 64]);
        assert_eq!(Order::decode(&data).unwrap(), order);
    }

    #[test]
    fn test_decode_rejects_other_kind() {
        let data = sample_order().encode().unwrap();
        let err = Design::decode(&data).unwrap_err();
        assert!(matches!(err, CodecError::Discriminator { kind: "Design", .. }));
    }

    #[test]
    fn test_decode_rejects_short_and_truncated_data() {
        assert!(matches!(
            Store::decode(&[1, 2, 3]),
            Err(CodecError::TooShort { len: 3, .. })
        ));

        let data = sample_order().encode().unwrap();
        assert!(matches!(
            Order::decode(&data[..50]),
            Err(CodecError::Body { kind: "Order", .. })
        ));
    }

    #[test]
    fn test_created_at_utc() {
        let order = sample_order();
        assert_eq!(
            order.created_at_utc().unwrap().to_rfc3339(),
            "2023-11-14T22:13:20+00:00"
        );
    }
}
