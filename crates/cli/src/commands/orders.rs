//! Order commands.

use madma_core::{OrderStatus, Pubkey};
use madma_storefront::views::{OrderQuery, OrderRow, SortDirection, visible_orders};
use madma_storefront::{ProgramProvider, Result, RpcTransport, StorefrontError};

use super::{confirmed_lines, print_lines, reported};

/// List orders, newest first unless `ascending`. Buyers see their own
/// orders; `all` shows every order in the store and is reserved for the
/// store owner.
pub async fn list<T: RpcTransport>(
    provider: &ProgramProvider<T>,
    all: bool,
    search: String,
    ascending: bool,
) -> Result<()> {
    reported(provider.refresh(false).await)?;
    if all && !reported(provider.is_owner().await)? {
        return Err(StorefrontError::Precondition(
            "Only the store owner can list every order.".to_string(),
        ));
    }
    if provider.viewer().is_none() {
        print_lines(&["Connect a wallet to see your orders.".to_string()]);
        return Ok(());
    }

    let query = OrderQuery {
        viewer: provider.viewer(),
        owner_view: all,
        search,
        direction: if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        },
    };
    let orders = provider.orders();
    let rows: Vec<OrderRow> = visible_orders(&orders, &query)
        .into_iter()
        .map(OrderRow::from)
        .collect();
    print_lines(&render(&rows, all));
    Ok(())
}

/// Buy a design.
pub async fn create<T: RpcTransport>(
    provider: &ProgramProvider<T>,
    design: &Pubkey,
    shipping_info: String,
) -> Result<()> {
    let confirmed = provider.create_order(design, shipping_info).await?;
    print_lines(&confirmed_lines("Order placed", &confirmed));
    Ok(())
}

pub async fn set_status<T: RpcTransport>(
    provider: &ProgramProvider<T>,
    order: &Pubkey,
    status: OrderStatus,
) -> Result<()> {
    let confirmed = provider.update_order_status(order, status).await?;
    print_lines(&confirmed_lines(&format!("Order marked {status}"), &confirmed));
    Ok(())
}

fn render(rows: &[OrderRow], with_buyer: bool) -> Vec<String> {
    if rows.is_empty() {
        return vec!["No orders found.".to_string()];
    }
    let mut lines = Vec::with_capacity(rows.len() * 2);
    for row in rows {
        let buyer = if with_buyer {
            format!("  buyer {}", row.buyer)
        } else {
            String::new()
        };
        lines.push(format!(
            "{}  {:<9}  {}  design #{}  {}{buyer}",
            row.address, row.status.as_str(), row.price_paid, row.design_id, row.created_at
        ));
        lines.push(format!("    Ship to: {}", row.shipping_info));
    }
    lines
}
