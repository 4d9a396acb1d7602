//! Design commands.

use madma_core::{DesignUpdate, Lamports, NewDesign, Pubkey};
use madma_storefront::views::{DesignCard, visible_designs};
use madma_storefront::{ProgramProvider, Result, RpcTransport, StorefrontError};

use super::{confirmed_lines, print_lines, reported};

/// Fields given to `design update`; unset fields keep their current value.
#[derive(Debug, Default)]
pub struct UpdateFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Price in SOL.
    pub price: Option<String>,
    pub available: Option<bool>,
}

impl UpdateFields {
    fn into_update(self) -> Result<DesignUpdate> {
        Ok(DesignUpdate {
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            price: self.price.as_deref().map(Lamports::parse_sol).transpose()?,
            available: self.available,
        })
    }
}

/// List designs. Buyers see available designs; `all` shows every design
/// and is reserved for the store owner.
pub async fn list<T: RpcTransport>(provider: &ProgramProvider<T>, all: bool) -> Result<()> {
    reported(provider.refresh(false).await)?;
    if all && !reported(provider.is_owner().await)? {
        return Err(StorefrontError::Precondition(
            "Only the store owner can list unavailable designs.".to_string(),
        ));
    }

    let designs = provider.designs();
    let cards: Vec<DesignCard> = visible_designs(&designs, all)
        .into_iter()
        .map(DesignCard::from)
        .collect();
    print_lines(&render(&cards));
    Ok(())
}

/// Create a design priced in SOL.
pub async fn create<T: RpcTransport>(
    provider: &ProgramProvider<T>,
    title: String,
    description: String,
    image_url: String,
    price: &str,
) -> Result<()> {
    let design = NewDesign {
        title,
        description,
        image_url,
        price: Lamports::parse_sol(price)?,
    };
    let confirmed = provider.create_design(design).await?;
    print_lines(&confirmed_lines("Design created", &confirmed));
    Ok(())
}

pub async fn update<T: RpcTransport>(
    provider: &ProgramProvider<T>,
    design: &Pubkey,
    fields: UpdateFields,
) -> Result<()> {
    let confirmed = provider.update_design(design, fields.into_update()?).await?;
    print_lines(&confirmed_lines("Design updated", &confirmed));
    Ok(())
}

pub async fn toggle<T: RpcTransport>(provider: &ProgramProvider<T>, design: &Pubkey) -> Result<()> {
    let confirmed = provider.toggle_design_availability(design).await?;
    print_lines(&confirmed_lines("Availability toggled", &confirmed));
    Ok(())
}

fn render(cards: &[DesignCard]) -> Vec<String> {
    if cards.is_empty() {
        return vec!["No designs yet.".to_string()];
    }
    let mut lines = Vec::with_capacity(cards.len() * 3);
    for card in cards {
        let flag = if card.available { "" } else { " (unavailable)" };
        lines.push(format!(
            "#{} {} - {}{flag}",
            card.design_id, card.title, card.price
        ));
        lines.push(format!("    {}", card.description));
        lines.push(format!(
            "    {} | sold {} | {}",
            card.image_url, card.sales_count, card.address
        ));
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use madma_core::DesignId;

    use super::*;

    fn card(available: bool) -> DesignCard {
        DesignCard {
            address: Pubkey::new_unique(),
            design_id: DesignId::new(3),
            title: "Sunset Tee".to_string(),
            description: "Screen printed".to_string(),
            image_url: "https://example.com/sunset.png".to_string(),
            price: "0.25 SOL".to_string(),
            available,
            sales_count: 7,
        }
    }

    #[test]
    fn test_update_fields_parse_price() {
        let update = UpdateFields {
            price: Some("1.5".to_string()),
            ..UpdateFields::default()
        }
        .into_update()
        .unwrap();
        assert_eq!(update.price, Some(Lamports::new(1_500_000_000)));
        assert!(update.title.is_none());
    }

    #[test]
    fn test_update_fields_reject_bad_price() {
        let result = UpdateFields {
            price: Some("cheap".to_string()),
            ..UpdateFields::default()
        }
        .into_update();
        assert!(matches!(result, Err(StorefrontError::Price(_))));
    }

    #[test]
    fn test_empty_update_fields() {
        let update = UpdateFields::default().into_update().unwrap();
        assert!(update.is_empty());
    }

    #[test]
    fn test_render() {
        let lines = render(&[card(true), card(false)]);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "#3 Sunset Tee - 0.25 SOL");
        assert!(lines[3].ends_with("(unavailable)"));
        assert!(lines[2].contains("sold 7"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), vec!["No designs yet.".to_string()]);
    }
}
