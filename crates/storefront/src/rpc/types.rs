//! Values exchanged with the RPC node.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::hash::Hash;

/// How settled a transaction or read must be.
///
/// Ordered so that `Finalized > Confirmed > Processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(format!("unknown commitment level: {other}")),
        }
    }
}

/// Blockhash to sign against, with the height after which it expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentBlockhash {
    pub hash: Hash,
    pub last_valid_block_height: u64,
}

/// A transaction the cluster executed and rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionFailure {
    /// Index of the failing instruction, when the error names one.
    pub instruction_index: Option<u8>,
    /// Program-defined error code (`{"Custom": n}`).
    pub custom_code: Option<u32>,
    /// Raw error as reported by the node.
    pub detail: String,
}

impl TransactionFailure {
    /// Build from the `err` value of a simulation or signature status.
    ///
    /// Recognizes `{"InstructionError": [index, {"Custom": code}]}`; any
    /// other shape is kept only as `detail`.
    #[must_use]
    pub fn from_value(err: &Value) -> Self {
        let instruction_error = err
            .get("InstructionError")
            .and_then(Value::as_array)
            .map(Vec::as_slice);

        let (instruction_index, custom_code) = match instruction_error {
            Some([index, cause]) => (
                index.as_u64().and_then(|i| u8::try_from(i).ok()),
                cause
                    .get("Custom")
                    .and_then(Value::as_u64)
                    .and_then(|code| u32::try_from(code).ok()),
            ),
            _ => (None, None),
        };

        Self {
            instruction_index,
            custom_code,
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for TransactionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.instruction_index, self.custom_code) {
            (Some(index), Some(code)) => {
                write!(f, "instruction {index} failed with custom error {code}")
            }
            _ => f.write_str(&self.detail),
        }
    }
}

/// Settlement state of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    /// `None` until the node reports a commitment level.
    pub confirmation: Option<Commitment>,
    /// Set when the transaction executed and failed.
    pub err: Option<TransactionFailure>,
}

impl SignatureStatus {
    /// True once the transaction has reached `target` or beyond.
    #[must_use]
    pub fn reached(&self, target: Commitment) -> bool {
        self.confirmation.is_some_and(|level| level >= target)
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct Contextual<T> {
    pub value: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UiAccount {
    /// `[base64_data, "base64"]`
    pub data: (String, String),
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyedUiAccount {
    pub pubkey: String,
    pub account: UiAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UiBlockhash {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UiSignatureStatus {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub confirmation_status: Option<Commitment>,
}

impl From<UiSignatureStatus> for SignatureStatus {
    fn from(status: UiSignatureStatus) -> Self {
        Self {
            confirmation: status.confirmation_status,
            err: status
                .err
                .filter(|err| !err.is_null())
                .map(|err| TransactionFailure::from_value(&err)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}
