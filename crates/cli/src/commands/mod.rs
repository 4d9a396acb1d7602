//! Command implementations.

pub mod designs;
pub mod orders;
pub mod store;

use madma_storefront::{Confirmed, Result, StorefrontError};

/// Report a read failure once before handing it back to `main`.
fn reported<T>(result: Result<T>) -> Result<T> {
    result.inspect_err(StorefrontError::report)
}

fn confirmed_lines(action: &str, confirmed: &Confirmed) -> Vec<String> {
    vec![
        format!("{action}: {}", confirmed.address),
        format!("Signature: {}", confirmed.signature),
    ]
}

#[allow(clippy::print_stdout)]
fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}
