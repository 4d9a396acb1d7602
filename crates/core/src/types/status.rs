//! Order status.
//!
//! The program stores the status as a one-byte enum index. The variant order
//! below is part of the wire contract.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Fulfillment status of an order.
///
/// Only the store authority can change it. No transition graph is enforced
/// on the client; the program is the only judge of which changes it accepts.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
pub enum OrderStatus {
    #[default]
    Created,
    Pending,
    Shipped,
    Delivered,
    Cancelled,
    Completed,
}

impl OrderStatus {
    /// Every status, in wire order.
    pub const ALL: [Self; 6] = [
        Self::Created,
        Self::Pending,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
        Self::Completed,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Pending => "Pending",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_index_follows_declaration_order() {
        for (index, status) in OrderStatus::ALL.into_iter().enumerate() {
            let encoded = borsh::to_vec(&status).unwrap();
            assert_eq!(encoded, vec![u8::try_from(index).unwrap()]);
        }
    }

    #[test]
    fn test_unknown_wire_index_is_rejected() {
        assert!(borsh::from_slice::<OrderStatus>(&[6]).is_err());
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!("CANCELLED".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
    }
}
