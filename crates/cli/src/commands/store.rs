//! Store commands.

use madma_storefront::views::{StoreInfo, short_address};
use madma_storefront::{ProgramProvider, Result, RpcTransport};

use super::{confirmed_lines, print_lines, reported};

/// Show the store summary.
pub async fn show<T: RpcTransport>(provider: &ProgramProvider<T>) -> Result<()> {
    let info = reported(provider.store_info().await)?;
    print_lines(&render(info.as_ref()));
    Ok(())
}

/// Initialize the store with the connected wallet as authority.
pub async fn init<T: RpcTransport>(provider: &ProgramProvider<T>) -> Result<()> {
    let confirmed = provider.initialize_store().await?;
    print_lines(&confirmed_lines("Store initialized", &confirmed));
    Ok(())
}

fn render(info: Option<&StoreInfo>) -> Vec<String> {
    let Some(info) = info else {
        return vec!["The store has not been initialized. Run `madma store init`.".to_string()];
    };
    let mut lines = vec![
        format!("Authority: {} ({})", info.authority, short_address(&info.authority)),
        format!("Designs:   {}", info.designs_count),
        format!("Earnings:  {}", info.earnings),
    ];
    if info.is_owner {
        lines.push("You are the store owner.".to_string());
    }
    lines
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use madma_core::Pubkey;

    use super::*;

    #[test]
    fn test_render_uninitialized() {
        let lines = render(None);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("madma store init"));
    }

    #[test]
    fn test_render_owner() {
        let info = StoreInfo {
            authority: Pubkey::new_unique(),
            designs_count: 2,
            earnings: "0.2500 SOL".to_string(),
            is_owner: true,
        };
        let lines = render(Some(&info));
        assert_eq!(lines[2], "Earnings:  0.2500 SOL");
        assert_eq!(lines.last().map(String::as_str), Some("You are the store owner."));
    }
}
