//! Transaction signing seam.
//!
//! The client never touches key material directly; it hands a prepared
//! transaction to a [`WalletSigner`]. [`KeypairWallet`] signs with a local
//! keypair file, which is what the CLI uses.

use std::path::Path;

use madma_core::Pubkey;
use solana_sdk::hash::Hash;
use solana_sdk::signature::{Keypair, Signer, read_keypair_file};
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::Transaction;
use thiserror::Error;

/// Errors raised by a wallet.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Keypair file missing or malformed.
    #[error("Failed to read keypair {path}: {message}")]
    Keypair { path: String, message: String },

    /// Signing failed or was refused.
    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),
}

/// An identity able to sign transactions.
pub trait WalletSigner: Send + Sync {
    /// Public key of the signing identity; also the fee payer.
    fn pubkey(&self) -> Pubkey;

    /// Sign `transaction` against `blockhash`.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet cannot or will not sign.
    fn sign_transaction(&self, transaction: &mut Transaction, blockhash: Hash)
    -> Result<(), WalletError>;
}

/// Wallet backed by an in-memory keypair.
pub struct KeypairWallet {
    keypair: Keypair,
}

impl KeypairWallet {
    #[must_use]
    pub const fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load a keypair file (JSON array of 64 bytes).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, WalletError> {
        read_keypair_file(path)
            .map(Self::new)
            .map_err(|e| WalletError::Keypair {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish_non_exhaustive()
    }
}

impl WalletSigner for KeypairWallet {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_transaction(
        &self,
        transaction: &mut Transaction,
        blockhash: Hash,
    ) -> Result<(), WalletError> {
        transaction.try_sign(&[&self.keypair], blockhash)?;
        Ok(())
    }
}
