//! JSON-RPC 2.0 client over HTTP.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use madma_core::{MemcmpFilter, Pubkey};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use solana_sdk::hash::Hash;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tracing::{debug, instrument};

use super::types::{
    Contextual, KeyedUiAccount, RpcResponse, UiAccount, UiBlockhash, UiSignatureStatus,
};
use super::{Commitment, RecentBlockhash, RpcError, RpcTransport, SignatureStatus, TransactionFailure};
use crate::config::RpcConfig;

/// Node error code for a failed preflight simulation.
const SEND_TRANSACTION_PREFLIGHT_FAILURE: i64 = -32002;

// =============================================================================
// HttpRpcClient
// =============================================================================

/// Client for a cluster RPC node.
#[derive(Clone)]
pub struct HttpRpcClient {
    inner: Arc<HttpRpcClientInner>,
}

struct HttpRpcClientInner {
    client: reqwest::Client,
    endpoint: String,
    commitment: Commitment,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a new RPC client.
    #[must_use]
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            inner: Arc::new(HttpRpcClientInner {
                client: reqwest::Client::new(),
                endpoint: config.url.expose_secret().to_string(),
                commitment: config.commitment,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Execute a JSON-RPC call.
    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, RpcError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(RpcError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                method,
                body = %response_text.chars().take(500).collect::<String>(),
                "RPC node returned non-success status"
            );
            return Err(RpcError::InvalidResponse(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: RpcResponse<R> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    method,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse RPC response"
                );
                return Err(RpcError::Parse(e));
            }
        };

        if let Some(error) = response.error {
            debug!(code = error.code, message = %error.message, "RPC error in response");

            // Preflight failures carry the execution error under `data.err`.
            if error.code == SEND_TRANSACTION_PREFLIGHT_FAILURE
                && let Some(err) = error.data.as_ref().and_then(|data| data.get("err"))
                && !err.is_null()
            {
                return Err(RpcError::TransactionFailed(TransactionFailure::from_value(err)));
            }

            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        response
            .result
            .ok_or_else(|| RpcError::InvalidResponse(format!("{method}: no result and no error")))
    }

    fn commitment_config(&self) -> Value {
        json!({ "commitment": self.inner.commitment.as_str() })
    }
}

fn decode_account_data(account: &UiAccount) -> Result<Vec<u8>, RpcError> {
    let (data, encoding) = &account.data;
    if encoding != "base64" {
        return Err(RpcError::InvalidResponse(format!(
            "unexpected account encoding: {encoding}"
        )));
    }
    BASE64
        .decode(data)
        .map_err(|e| RpcError::InvalidResponse(format!("account data: {e}")))
}

fn parse_pubkey(value: &str) -> Result<Pubkey, RpcError> {
    Pubkey::from_str(value).map_err(|e| RpcError::InvalidResponse(format!("pubkey {value}: {e}")))
}

fn memcmp_json(filter: &MemcmpFilter) -> Value {
    json!({
        "memcmp": {
            "offset": filter.offset,
            "bytes": BASE64.encode(&filter.bytes),
            "encoding": "base64",
        }
    })
}

impl RpcTransport for HttpRpcClient {
    #[instrument(skip(self), fields(address = %address))]
    async fn get_account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, RpcError> {
        let params = json!([
            address.to_string(),
            { "encoding": "base64", "commitment": self.inner.commitment.as_str() },
        ]);
        let response: Contextual<Option<UiAccount>> = self.call("getAccountInfo", params).await?;
        response.value.as_ref().map(decode_account_data).transpose()
    }

    #[instrument(skip(self, filters), fields(program_id = %program_id, filters = filters.len()))]
    async fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        filters: &[MemcmpFilter],
    ) -> Result<Vec<(Pubkey, Vec<u8>)>, RpcError> {
        let params = json!([
            program_id.to_string(),
            {
                "encoding": "base64",
                "commitment": self.inner.commitment.as_str(),
                "filters": filters.iter().map(memcmp_json).collect::<Vec<_>>(),
            },
        ]);
        let accounts: Vec<KeyedUiAccount> = self.call("getProgramAccounts", params).await?;
        debug!(count = accounts.len(), "Program accounts fetched");

        accounts
            .iter()
            .map(|keyed| Ok((parse_pubkey(&keyed.pubkey)?, decode_account_data(&keyed.account)?)))
            .collect()
    }

    async fn get_latest_blockhash(&self) -> Result<RecentBlockhash, RpcError> {
        let response: Contextual<UiBlockhash> = self
            .call("getLatestBlockhash", json!([self.commitment_config()]))
            .await?;
        let hash = Hash::from_str(&response.value.blockhash)
            .map_err(|e| RpcError::InvalidResponse(format!("blockhash: {e}")))?;
        Ok(RecentBlockhash {
            hash,
            last_valid_block_height: response.value.last_valid_block_height,
        })
    }

    #[instrument(skip_all)]
    async fn send_transaction(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let wire = bincode::serialize(transaction)
            .map_err(|e| RpcError::Serialization(e.to_string()))?;
        let params = json!([
            BASE64.encode(wire),
            { "encoding": "base64", "preflightCommitment": self.inner.commitment.as_str() },
        ]);
        let signature: String = self.call("sendTransaction", params).await?;
        Signature::from_str(&signature)
            .map_err(|e| RpcError::InvalidResponse(format!("signature {signature}: {e}")))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<Option<SignatureStatus>, RpcError> {
        let response: Contextual<Vec<Option<UiSignatureStatus>>> = self
            .call("getSignatureStatuses", json!([[signature.to_string()]]))
            .await?;
        Ok(response
            .value
            .into_iter()
            .next()
            .flatten()
            .map(SignatureStatus::from))
    }

    async fn get_block_height(&self) -> Result<u64, RpcError> {
        self.call("getBlockHeight", json!([self.commitment_config()]))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memcmp_json_shape() {
        let filter = MemcmpFilter::new(40, vec![1, 2, 3]);
        assert_eq!(
            memcmp_json(&filter),
            json!({"memcmp": {"offset": 40, "bytes": "AQID", "encoding": "base64"}})
        );
    }

    #[test]
    fn test_decode_account_data() {
        let account = UiAccount {
            data: ("AQID".to_string(), "base64".to_string()),
        };
        assert_eq!(decode_account_data(&account).unwrap(), vec![1, 2, 3]);

        let account = UiAccount {
            data: ("Ldp".to_string(), "base58".to_string()),
        };
        assert!(matches!(
            decode_account_data(&account),
            Err(RpcError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_preflight_error_shape_parses() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": -32002,
                "message": "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x1771",
                "data": { "err": { "InstructionError": [0, { "Custom": 6001 }] }, "logs": [] }
            }
        });
        let response: RpcResponse<String> = serde_json::from_value(body).unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, SEND_TRANSACTION_PREFLIGHT_FAILURE);
        let failure = TransactionFailure::from_value(&error.data.unwrap()["err"]);
        assert_eq!(failure.custom_code, Some(6001));
    }
}
