//! Filtering, sorting and formatting of listings for display.
//!
//! Everything here is pure and works on cache snapshots.

use chrono::SecondsFormat;
use madma_core::{Design, DesignId, Order, OrderStatus, Pubkey, Store};

use crate::chain::Keyed;

/// Decimal places used for store earnings.
const EARNINGS_DECIMALS: usize = 4;

// =============================================================================
// Designs
// =============================================================================

/// Designs to show. The owner sees every design; anyone else only sees
/// designs that are available for purchase.
#[must_use]
pub fn visible_designs(designs: &[Keyed<Design>], owner_view: bool) -> Vec<&Keyed<Design>> {
    designs
        .iter()
        .filter(|design| owner_view || design.account.available)
        .collect()
}

/// A design ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignCard {
    pub address: Pubkey,
    pub design_id: DesignId,
    pub title: String,
    pub description: String,
    pub image_url: String,
    /// e.g. `"1.5 SOL"`
    pub price: String,
    pub available: bool,
    pub sales_count: u64,
}

impl From<&Keyed<Design>> for DesignCard {
    fn from(keyed: &Keyed<Design>) -> Self {
        let design = &keyed.account;
        Self {
            address: keyed.address,
            design_id: design.design_id,
            title: design.title.clone(),
            description: design.description.clone(),
            image_url: design.image_url.clone(),
            price: design.price.to_string(),
            available: design.available,
            sales_count: design.sales_count,
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Sort order on creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Which orders to show, and in what order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Connected wallet, if any.
    pub viewer: Option<Pubkey>,
    /// The store owner sees every order.
    pub owner_view: bool,
    /// Substring of the order address (case-sensitive) or of the shipping
    /// information (case-insensitive). Empty matches everything; whitespace
    /// is matched literally.
    pub search: String,
    pub direction: SortDirection,
}

impl OrderQuery {
    #[must_use]
    pub fn matches(&self, order: &Keyed<Order>) -> bool {
        let visible = self.owner_view || self.viewer.is_some_and(|viewer| order.account.buyer == viewer);
        if !visible {
            return false;
        }

        let needle = self.search.as_str();
        if needle.is_empty() {
            return true;
        }
        order.address.to_string().contains(needle)
            || order
                .account
                .shipping_info
                .to_lowercase()
                .contains(&needle.to_lowercase())
    }
}

/// Orders matching `query`, sorted by creation time.
#[must_use]
pub fn visible_orders<'a>(orders: &'a [Keyed<Order>], query: &OrderQuery) -> Vec<&'a Keyed<Order>> {
    let mut visible: Vec<_> = orders.iter().filter(|order| query.matches(order)).collect();
    visible.sort_by(|a, b| {
        let ordering = a.account.created_at.cmp(&b.account.created_at);
        match query.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    visible
}

/// An order ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub address: Pubkey,
    pub short_address: String,
    pub buyer: String,
    pub design_id: DesignId,
    pub price_paid: String,
    pub status: OrderStatus,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub shipping_info: String,
}

impl From<&Keyed<Order>> for OrderRow {
    fn from(keyed: &Keyed<Order>) -> Self {
        let order = &keyed.account;
        Self {
            address: keyed.address,
            short_address: short_address(&keyed.address),
            buyer: short_address(&order.buyer),
            design_id: order.design_id,
            price_paid: order.price_paid.to_string(),
            status: order.status,
            created_at: order.created_at_utc().map_or_else(
                || order.created_at.to_string(),
                |at| at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            shipping_info: order.shipping_info.clone(),
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store summary panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    pub authority: Pubkey,
    pub designs_count: u64,
    /// Four decimals, e.g. `"0.2500 SOL"`.
    pub earnings: String,
    pub is_owner: bool,
}

impl StoreInfo {
    #[must_use]
    pub fn new(store: &Store, viewer: Option<&Pubkey>) -> Self {
        Self {
            authority: store.authority,
            designs_count: store.designs_count,
            earnings: store.earnings.display_fixed(EARNINGS_DECIMALS),
            is_owner: viewer.is_some_and(|viewer| store.is_authority(viewer)),
        }
    }
}

/// `Abcd...wxyz`
#[must_use]
pub fn short_address(address: &Pubkey) -> String {
    let full = address.to_string();
    if full.len() <= 8 {
        return full;
    }
    match (full.get(..4), full.get(full.len() - 4..)) {
        (Some(head), Some(tail)) => format!("{head}...{tail}"),
        _ => full,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use madma_core::Lamports;

    use super::*;

    fn design(id: u64, available: bool, price: u64) -> Keyed<Design> {
        Keyed {
            address: Pubkey::new_unique(),
            account: Design {
                design_id: DesignId::new(id),
                price: Lamports::new(price),
                title: format!("Design {id}"),
                description: "Printed".to_string(),
                image_url: "https://example.com/d.png".to_string(),
                available,
                sales_count: 0,
                bump: 255,
            },
        }
    }

    fn order(buyer: Pubkey, created_at: i64, shipping_info: &str) -> Keyed<Order> {
        Keyed {
            address: Pubkey::new_unique(),
            account: Order {
                store: Pubkey::new_unique(),
                buyer,
                design_id: DesignId::new(0),
                price_paid: Lamports::new(1_500_000_000),
                shipping_info: shipping_info.to_string(),
                status: OrderStatus::Created,
                created_at,
                bump: 254,
            },
        }
    }

    #[test]
    fn test_unavailable_design_hidden_from_buyers_only() {
        let designs = vec![design(0, true, 1), design(1, false, 1)];

        let buyer_view = visible_designs(&designs, false);
        assert_eq!(buyer_view.len(), 1);
        assert_eq!(buyer_view[0].account.design_id, DesignId::new(0));

        assert_eq!(visible_designs(&designs, true).len(), 2);
    }

    #[test]
    fn test_design_card_price() {
        let card = DesignCard::from(&design(0, true, 1_000_000_000));
        assert_eq!(card.price, "1 SOL");
        let card = DesignCard::from(&design(0, true, 1_500_000_000));
        assert_eq!(card.price, "1.5 SOL");
    }

    #[test]
    fn test_orders_visible_to_their_buyer_only() {
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let orders = vec![order(alice, 10, "Alice St")];

        let alice_query = OrderQuery {
            viewer: Some(alice),
            ..OrderQuery::default()
        };
        let bob_query = OrderQuery {
            viewer: Some(bob),
            ..OrderQuery::default()
        };
        assert_eq!(visible_orders(&orders, &alice_query).len(), 1);
        assert!(visible_orders(&orders, &bob_query).is_empty());
        assert!(visible_orders(&orders, &OrderQuery::default()).is_empty());

        let owner_query = OrderQuery {
            viewer: Some(bob),
            owner_view: true,
            ..OrderQuery::default()
        };
        assert_eq!(visible_orders(&orders, &owner_query).len(), 1);
    }

    #[test]
    fn test_search_and_sort() {
        let buyer = Pubkey::new_unique();
        let orders = vec![
            order(buyer, 30, "12 Harbour Road, Lisbon"),
            order(buyer, 10, "4 Elm Street, Porto"),
            order(buyer, 20, "9 Rua Nova, lisbon"),
        ];
        let mut query = OrderQuery {
            owner_view: true,
            ..OrderQuery::default()
        };

        let created: Vec<i64> = visible_orders(&orders, &query)
            .iter()
            .map(|o| o.account.created_at)
            .collect();
        assert_eq!(created, vec![30, 20, 10]);

        query.direction = query.direction.toggle();
        query.search = "LISBON".to_string();
        let created: Vec<i64> = visible_orders(&orders, &query)
            .iter()
            .map(|o| o.account.created_at)
            .collect();
        assert_eq!(created, vec![20, 30]);
    }

    #[test]
    fn test_address_search_is_case_sensitive() {
        let buyer = Pubkey::new_unique();
        let orders = vec![order(buyer, 1, "nowhere")];
        let address = orders[0].address.to_string();
        let fragment = &address[..6];

        let mut query = OrderQuery {
            owner_view: true,
            search: fragment.to_string(),
            ..OrderQuery::default()
        };
        assert_eq!(visible_orders(&orders, &query).len(), 1);

        let flipped: String = fragment
            .chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect();
        if flipped != fragment && !address.contains(&flipped) {
            query.search = flipped;
            assert!(visible_orders(&orders, &query).is_empty());
        }
    }

    #[test]
    fn test_whitespace_search_is_literal() {
        let buyer = Pubkey::new_unique();
        let orders = vec![order(buyer, 1, "Lisbon"), order(buyer, 2, "12 Harbour Road")];
        let query = OrderQuery {
            owner_view: true,
            search: "  ".to_string(),
            ..OrderQuery::default()
        };
        assert!(visible_orders(&orders, &query).is_empty());

        let query = OrderQuery {
            search: " ".to_string(),
            ..query
        };
        let matched = visible_orders(&orders, &query);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].account.shipping_info, "12 Harbour Road");
    }

    #[test]
    fn test_order_row() {
        let buyer = Pubkey::new_unique();
        let row = OrderRow::from(&order(buyer, 1_700_000_000, "1 Main St"));
        assert_eq!(row.price_paid, "1.5 SOL");
        assert_eq!(row.created_at, "2023-11-14T22:13:20Z");
        assert_eq!(row.status.to_string(), "Created");
        assert!(row.buyer.contains("..."));
    }

    #[test]
    fn test_store_info() {
        let authority = Pubkey::new_unique();
        let store = Store {
            authority,
            designs_count: 3,
            earnings: Lamports::new(250_000_000),
            bump: 255,
        };

        let info = StoreInfo::new(&store, Some(&authority));
        assert_eq!(info.earnings, "0.2500 SOL");
        assert!(info.is_owner);

        assert!(!StoreInfo::new(&store, Some(&Pubkey::new_unique())).is_owner);
        assert!(!StoreInfo::new(&store, None).is_owner);

        let empty = Store {
            earnings: Lamports::ZERO,
            ..store
        };
        assert_eq!(StoreInfo::new(&empty, None).earnings, "0.0000 SOL");
    }

    #[test]
    fn test_short_address() {
        let address = Pubkey::new_unique();
        let full = address.to_string();
        let short = short_address(&address);
        assert_eq!(short.len(), 11);
        assert!(full.starts_with(&short[..4]));
        assert!(full.ends_with(&short[7..]));
    }
}
