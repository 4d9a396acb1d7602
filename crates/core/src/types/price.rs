//! Lamport amounts and their display-unit conversion.
//!
//! Prices and earnings are stored on-chain as `u64` lamports. Display and
//! user entry use SOL, with `1 SOL = 1_000_000_000 lamports`. Conversion goes
//! through `rust_decimal` so that entered prices like `0.1` map to an exact
//! lamport count.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lamports in one SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places between lamports and SOL.
const SOL_SCALE: u32 = 9;

/// Errors converting a display amount into lamports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("'{0}' is not a number")]
    Invalid(String),
    #[error("price cannot be negative")]
    Negative,
    #[error("price has more than 9 decimal places")]
    TooPrecise,
    #[error("price is too large")]
    Overflow,
}

/// An amount in the smallest currency unit.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    BorshSerialize,
    BorshDeserialize,
)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn new(lamports: u64) -> Self {
        Self(lamports)
    }

    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Amount in SOL, with trailing zeros removed.
    #[must_use]
    pub fn to_sol(self) -> Decimal {
        Decimal::from_i128_with_scale(i128::from(self.0), SOL_SCALE).normalize()
    }

    /// Convert a SOL amount to lamports.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, finer than one lamport, or
    /// does not fit in a `u64`.
    pub fn from_sol(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        let lamports = amount
            .checked_mul(Decimal::from(LAMPORTS_PER_SOL))
            .ok_or(PriceError::Overflow)?;
        if !lamports.fract().is_zero() {
            return Err(PriceError::TooPrecise);
        }
        lamports.to_u64().map(Self).ok_or(PriceError::Overflow)
    }

    /// Parse a user-entered SOL amount such as `"1.5"`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a decimal number or fails
    /// [`Lamports::from_sol`].
    pub fn parse_sol(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        let amount =
            Decimal::from_str(trimmed).map_err(|_| PriceError::Invalid(trimmed.to_string()))?;
        Self::from_sol(amount)
    }

    /// Render with a fixed number of decimals, rounding half away from
    /// zero, e.g. `"0.0000 SOL"`.
    #[must_use]
    pub fn display_fixed(self, decimals: usize) -> String {
        let places = u32::try_from(decimals).unwrap_or(SOL_SCALE).min(SOL_SCALE);
        let rounded = self
            .to_sol()
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.decimals$} SOL")
    }

    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SOL", self.to_sol())
    }
}

impl From<u64> for Lamports {
    fn from(lamports: u64) -> Self {
        Self(lamports)
    }
}

impl From<Lamports> for u64 {
    fn from(lamports: Lamports) -> Self {
        lamports.0
    }
}
