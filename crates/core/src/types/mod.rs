//! Core types for Madma.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod status;

pub use id::*;
pub use price::{LAMPORTS_PER_SOL, Lamports, PriceError};
pub use status::*;
