//! Unified error handling with Sentry integration.
//!
//! Every client operation returns `Result<T, StorefrontError>`. Callers show
//! [`StorefrontError::user_message`] and call [`StorefrontError::report`]
//! once, which captures infrastructure failures to Sentry.

use madma_core::{CodecError, PriceError, ProgramErrorCode, Pubkey};
use thiserror::Error;

use crate::rpc::RpcError;
use crate::wallet::WalletError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// RPC transport failed or the transaction failed without a program code.
    #[error("RPC error: {0}")]
    Rpc(RpcError),

    /// The store program rejected the transaction.
    #[error("Program error {code} ({name}): {0}", code = .0.code(), name = .0.name())]
    Program(ProgramErrorCode),

    /// Account data could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// The wallet could not sign.
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    /// Account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A local check failed before anything was sent.
    #[error("{0}")]
    Precondition(String),

    /// The buyer already has an order at this store.
    #[error("Order already exists: {0}")]
    OrderAlreadyExists(Pubkey),

    /// A price could not be parsed or converted.
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
}

impl From<RpcError> for StorefrontError {
    fn from(err: RpcError) -> Self {
        match err.custom_code().and_then(ProgramErrorCode::from_code) {
            Some(code) => Self::Program(code),
            None => Self::Rpc(err),
        }
    }
}

impl StorefrontError {
    /// Program-defined error code of a failed transaction that did not map
    /// to a known store program error.
    #[must_use]
    pub const fn custom_code(&self) -> Option<u32> {
        match self {
            Self::Rpc(err) => err.custom_code(),
            Self::Program(code) => Some(code.code()),
            _ => None,
        }
    }

    /// True for failures caused by the user's input or the program's rules,
    /// as opposed to infrastructure failures.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Program(_)
                | Self::NotFound(_)
                | Self::Precondition(_)
                | Self::OrderAlreadyExists(_)
                | Self::Price(_)
        )
    }

    /// Message safe to show to the user. Transport details are never
    /// included.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rpc(RpcError::BlockhashExpired) => {
                "The transaction expired before it was confirmed. Please try again.".to_string()
            }
            Self::Rpc(RpcError::TransactionFailed(_)) => "The transaction failed.".to_string(),
            Self::Rpc(RpcError::RateLimited(_)) => {
                "The network is busy. Please try again shortly.".to_string()
            }
            Self::Rpc(_) => "Could not reach the network. Please try again.".to_string(),
            Self::Program(code) => code.user_message().to_string(),
            Self::Codec(_) => "Received store data that could not be read.".to_string(),
            Self::Wallet(_) => "Your wallet could not sign the transaction.".to_string(),
            Self::NotFound(what) => format!("{what} was not found."),
            Self::Precondition(message) => message.clone(),
            Self::OrderAlreadyExists(_) => {
                "You already have an order with this store.".to_string()
            }
            Self::Price(err) => format!("Invalid price: {err}."),
        }
    }

    /// Log the error once; infrastructure failures are also captured to
    /// Sentry.
    pub fn report(&self) {
        if self.is_user_error() {
            tracing::warn!(error = %self, "Action rejected");
        } else {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Action failed"
            );
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Set the Sentry user context to the connected wallet.
pub fn set_sentry_wallet(wallet: &Pubkey) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(wallet.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::TransactionFailure;

    fn failed(custom_code: Option<u32>) -> RpcError {
        RpcError::TransactionFailed(TransactionFailure {
            instruction_index: Some(0),
            custom_code,
            detail: String::new(),
        })
    }

    #[test]
    fn test_program_codes_map_from_rpc() {
        let err = StorefrontError::from(failed(Some(6001)));
        assert!(matches!(
            err,
            StorefrontError::Program(ProgramErrorCode::DesignNotAvailable)
        ));
        assert_eq!(
            err.user_message(),
            "This design is not available for purchase."
        );
        assert!(err.is_user_error());
    }

    #[test]
    fn test_unknown_codes_stay_rpc_errors() {
        let err = StorefrontError::from(failed(Some(0)));
        assert!(matches!(err, StorefrontError::Rpc(_)));
        assert_eq!(err.custom_code(), Some(0));
        assert!(!err.is_user_error());
        assert_eq!(err.user_message(), "The transaction failed.");
    }

    #[test]
    fn test_program_error_display() {
        let err = StorefrontError::Program(ProgramErrorCode::Unauthorized);
        assert_eq!(err.to_string(), "Program error 6005 (Unauthorized): Unauthorized");
    }

    #[test]
    fn test_user_message_hides_transport_details() {
        let err = StorefrontError::from(RpcError::Rpc {
            code: -32005,
            message: "Node is behind by 42 slots".to_string(),
        });
        assert!(!err.user_message().contains("42"));
    }

    #[test]
    fn test_precondition_message_is_shown_verbatim() {
        let err = StorefrontError::Precondition("Please connect your wallet!".to_string());
        assert_eq!(err.to_string(), "Please connect your wallet!");
        assert_eq!(err.user_message(), "Please connect your wallet!");
    }
}
