//! Program error codes and codec errors.

use thiserror::Error;

/// Custom errors returned by the store program.
///
/// Codes are fixed by the program (Anchor numbers custom errors from 6000)
/// and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u32)]
pub enum ProgramErrorCode {
    #[error("Invalid price")]
    InvalidPrice = 6000,
    #[error("Design not available")]
    DesignNotAvailable = 6001,
    #[error("Insufficient payment")]
    InsufficientPayment = 6002,
    #[error("Payment failed")]
    PaymentFailed = 6003,
    #[error("Insufficient balance")]
    InsufficientBalance = 6004,
    #[error("Unauthorized")]
    Unauthorized = 6005,
    #[error("Invalid order status")]
    InvalidOrderStatus = 6006,
    #[error("Store already initialized")]
    StoreAlreadyInitialized = 6007,
}

impl ProgramErrorCode {
    pub const ALL: [Self; 8] = [
        Self::InvalidPrice,
        Self::DesignNotAvailable,
        Self::InsufficientPayment,
        Self::PaymentFailed,
        Self::InsufficientBalance,
        Self::Unauthorized,
        Self::InvalidOrderStatus,
        Self::StoreAlreadyInitialized,
    ];

    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            6000 => Some(Self::InvalidPrice),
            6001 => Some(Self::DesignNotAvailable),
            6002 => Some(Self::InsufficientPayment),
            6003 => Some(Self::PaymentFailed),
            6004 => Some(Self::InsufficientBalance),
            6005 => Some(Self::Unauthorized),
            6006 => Some(Self::InvalidOrderStatus),
            6007 => Some(Self::StoreAlreadyInitialized),
            _ => None,
        }
    }

    /// Error name as declared by the program.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::InvalidPrice => "InvalidPrice",
            Self::DesignNotAvailable => "DesignNotAvailable",
            Self::InsufficientPayment => "InsufficientPayment",
            Self::PaymentFailed => "PaymentFailed",
            Self::InsufficientBalance => "InsufficientBalance",
            Self::Unauthorized => "Unauthorized",
            Self::InvalidOrderStatus => "InvalidOrderStatus",
            Self::StoreAlreadyInitialized => "StoreAlreadyInitialized",
        }
    }

    /// Message shown to the person who triggered the failed action.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::InvalidPrice => "The design price is not valid.",
            Self::DesignNotAvailable => "This design is not available for purchase.",
            Self::InsufficientPayment => "The payment did not cover the design price.",
            Self::PaymentFailed => "The payment could not be completed.",
            Self::InsufficientBalance => "Your wallet balance is too low for this purchase.",
            Self::Unauthorized => "Only the store owner can do that.",
            Self::InvalidOrderStatus => "That order status is not valid.",
            Self::StoreAlreadyInitialized => "The store has already been initialized.",
        }
    }
}

impl TryFrom<u32> for ProgramErrorCode {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(code)
    }
}

/// Errors encoding or decoding account and instruction bytes.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Data is shorter than the 8-byte discriminator.
    #[error("{kind} data too short: {len} bytes")]
    TooShort { kind: &'static str, len: usize },

    /// Discriminator does not belong to the expected kind.
    #[error("data is not a {kind} (discriminator {found:?})")]
    Discriminator { kind: &'static str, found: [u8; 8] },

    /// Discriminator matches no known instruction.
    #[error("unknown instruction discriminator {0:?}")]
    UnknownInstruction([u8; 8]),

    /// Borsh body failed to encode or decode.
    #[error("{kind} body: {source}")]
    Body {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_contiguous_from_6000() {
        for (offset, error) in (0u32..).zip(ProgramErrorCode::ALL) {
            assert_eq!(error.code(), 6000 + offset);
            assert_eq!(ProgramErrorCode::from_code(error.code()), Some(error));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(ProgramErrorCode::from_code(5999), None);
        assert_eq!(ProgramErrorCode::try_from(6008), Err(6008));
    }

    #[test]
    fn test_display_matches_program_messages() {
        assert_eq!(ProgramErrorCode::InvalidPrice.to_string(), "Invalid price");
        assert_eq!(
            ProgramErrorCode::StoreAlreadyInitialized.to_string(),
            "Store already initialized"
        );
        assert_eq!(ProgramErrorCode::Unauthorized.name(), "Unauthorized");
    }
}
