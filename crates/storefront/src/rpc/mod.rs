//! JSON-RPC access to the cluster.
//!
//! # Architecture
//!
//! - [`RpcTransport`] is the seam between the chain client and the network
//! - [`HttpRpcClient`] speaks JSON-RPC 2.0 over `reqwest`
//! - Account data travels base64-encoded; transactions are bincode + base64
//!
//! Tests substitute an in-memory transport that emulates the program.

mod http;
pub mod types;

use std::future::Future;

use madma_core::{MemcmpFilter, Pubkey};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

pub use http::HttpRpcClient;
pub use types::{Commitment, RecentBlockhash, SignatureStatus, TransactionFailure};

/// Errors that can occur when talking to an RPC node.
#[derive(Debug, Error)]
pub enum RpcError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The node returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Rate limited by the node.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The transaction was simulated or executed and failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(TransactionFailure),

    /// The node answered with something we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The blockhash expired before the transaction was confirmed.
    #[error("Blockhash expired before confirmation")]
    BlockhashExpired,

    /// The transaction could not be serialized for sending.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl RpcError {
    /// Program-defined error code carried by a failed transaction.
    #[must_use]
    pub const fn custom_code(&self) -> Option<u32> {
        match self {
            Self::TransactionFailed(failure) => failure.custom_code,
            _ => None,
        }
    }
}

/// The RPC calls the chain client needs.
pub trait RpcTransport: Send + Sync + 'static {
    /// Raw data of one account, `None` if it does not exist.
    fn get_account_data(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, RpcError>> + Send;

    /// All accounts owned by `program_id` matching every filter.
    fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> impl Future<Output = Result<Vec<(Pubkey, Vec<u8>)>, RpcError>> + Send;

    fn get_latest_blockhash(&self) -> impl Future<Output = Result<RecentBlockhash, RpcError>> + Send;

    /// Submit a signed transaction. Simulation failures surface as
    /// [`RpcError::TransactionFailed`].
    fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> impl Future<Output = Result<Signature, RpcError>> + Send;

    /// `None` while the node has not seen the signature.
    fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<SignatureStatus>, RpcError>> + Send;

    fn get_block_height(&self) -> impl Future<Output = Result<u64, RpcError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_display() {
        let err = RpcError::Rpc {
            code: -32002,
            message: "Transaction simulation failed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "RPC error -32002: Transaction simulation failed"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = RpcError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");
    }

    #[test]
    fn test_custom_code() {
        let err = RpcError::TransactionFailed(TransactionFailure {
            instruction_index: Some(0),
            custom_code: Some(6005),
            detail: String::new(),
        });
        assert_eq!(err.custom_code(), Some(6005));
        assert_eq!(RpcError::BlockhashExpired.custom_code(), None);
    }
}
