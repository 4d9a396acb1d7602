//! Integration tests for the design catalog.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use madma_core::{
    AccountRecord, Design, DesignId, DesignUpdate, LAMPORTS_PER_SOL, Lamports, NewDesign,
    ProgramErrorCode, Pubkey, pda,
};
use madma_integration_tests::{FakeChain, TestContext};
use madma_storefront::views::{DesignCard, visible_designs};
use madma_storefront::{KeypairWallet, ProgramProvider, StorefrontError};

fn new_design(title: &str, price: u64) -> NewDesign {
    NewDesign {
        title: title.to_string(),
        description: format!("{title}, screen printed"),
        image_url: format!("https://example.com/{}.png", title.to_lowercase()),
        price: Lamports::new(price),
    }
}

async fn open_store(ctx: &TestContext) -> (Arc<KeypairWallet>, ProgramProvider<FakeChain>) {
    let owner = ctx.wallet(LAMPORTS_PER_SOL);
    let provider = ctx.provider(Some(&owner));
    provider.initialize_store().await.unwrap();
    (owner, provider)
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_designs_get_sequential_ids() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;

    let first = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();
    let second = provider
        .create_design(new_design("Harbour", LAMPORTS_PER_SOL))
        .await
        .unwrap();

    let store_address = *provider.chain().store_address();
    for (confirmed, id) in [(first, 0), (second, 1)] {
        let (expected, _) = pda::design_address(
            provider.chain().program_id(),
            &store_address,
            DesignId::new(id),
        );
        assert_eq!(confirmed.address, expected);

        let design = ctx.chain.design(&confirmed.address).unwrap();
        assert_eq!(design.design_id, DesignId::new(id));
        assert!(design.available);
        assert_eq!(design.sales_count, 0);
    }
    assert_eq!(ctx.chain.store().unwrap().designs_count, 2);
}

#[tokio::test]
async fn test_zero_price_rejected() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;

    let err = provider
        .create_design(new_design("Free", 0))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Program(ProgramErrorCode::InvalidPrice)
    ));
    assert_eq!(ctx.chain.store().unwrap().designs_count, 0);
}

#[tokio::test]
async fn test_only_authority_creates_designs() {
    let ctx = TestContext::new();
    let (_owner, _provider) = open_store(&ctx).await;
    let stranger = ctx.wallet(LAMPORTS_PER_SOL);

    let err = ctx
        .provider(Some(&stranger))
        .create_design(new_design("Bootleg", LAMPORTS_PER_SOL))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Program(ProgramErrorCode::Unauthorized)
    ));
    assert_eq!(ctx.chain.store().unwrap().designs_count, 0);
}

#[tokio::test]
async fn test_empty_title_rejected_before_sending() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;

    let err = provider
        .create_design(new_design("  ", LAMPORTS_PER_SOL))
        .await
        .unwrap_err();

    assert!(matches!(err, StorefrontError::Precondition(_)));
    assert_eq!(err.user_message(), "Title is required.");
}

// =============================================================================
// Update and toggle
// =============================================================================

#[tokio::test]
async fn test_empty_update_leaves_design_unchanged() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    let created = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();
    let before = ctx.chain.design(&created.address).unwrap();

    provider
        .update_design(&created.address, DesignUpdate::default())
        .await
        .unwrap();

    assert_eq!(ctx.chain.design(&created.address).unwrap(), before);
}

#[tokio::test]
async fn test_partial_update_changes_given_fields_only() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    let created = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();
    let before = ctx.chain.design(&created.address).unwrap();

    let update = DesignUpdate {
        title: Some("Sunset II".to_string()),
        price: Some(Lamports::new(2 * LAMPORTS_PER_SOL)),
        ..DesignUpdate::default()
    };
    provider.update_design(&created.address, update).await.unwrap();

    let after = ctx.chain.design(&created.address).unwrap();
    assert_eq!(after.title, "Sunset II");
    assert_eq!(after.price, Lamports::new(2 * LAMPORTS_PER_SOL));
    assert_eq!(after.description, before.description);
    assert_eq!(after.image_url, before.image_url);
    assert_eq!(after.available, before.available);
}

#[tokio::test]
async fn test_update_to_zero_price_rejected() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    let created = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();

    let update = DesignUpdate {
        price: Some(Lamports::ZERO),
        ..DesignUpdate::default()
    };
    let err = provider
        .update_design(&created.address, update)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Program(ProgramErrorCode::InvalidPrice)
    ));
    assert_eq!(
        ctx.chain.design(&created.address).unwrap().price,
        Lamports::new(LAMPORTS_PER_SOL)
    );
}

#[tokio::test]
async fn test_toggle_hides_design_from_buyers() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    let created = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();

    provider
        .toggle_design_availability(&created.address)
        .await
        .unwrap();
    assert!(!ctx.chain.design(&created.address).unwrap().available);

    let designs = provider.designs();
    assert_eq!(visible_designs(&designs, true).len(), 1);
    assert!(visible_designs(&designs, false).is_empty());

    provider
        .toggle_design_availability(&created.address)
        .await
        .unwrap();
    assert_eq!(visible_designs(&provider.designs(), false).len(), 1);
}

#[tokio::test]
async fn test_only_authority_toggles() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    let created = provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();
    let stranger = ctx.wallet(LAMPORTS_PER_SOL);

    let err = ctx
        .provider(Some(&stranger))
        .toggle_design_availability(&created.address)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Program(ProgramErrorCode::Unauthorized)
    ));
    assert!(ctx.chain.design(&created.address).unwrap().available);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_price_renders_in_sol() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();

    let designs = provider.designs();
    let card = DesignCard::from(&designs[0]);
    assert_eq!(card.price, "1 SOL");
    assert_eq!(card.title, "Sunset");
}

#[tokio::test]
async fn test_designs_from_other_addresses_are_ignored() {
    let ctx = TestContext::new();
    let (_owner, provider) = open_store(&ctx).await;
    provider
        .create_design(new_design("Sunset", LAMPORTS_PER_SOL))
        .await
        .unwrap();

    let stray = Design {
        design_id: DesignId::new(0),
        price: Lamports::new(1),
        title: "Elsewhere".to_string(),
        description: String::new(),
        image_url: String::new(),
        available: true,
        sales_count: 0,
        bump: 255,
    };
    ctx.chain
        .insert_account(Pubkey::new_unique(), stray.encode().unwrap());

    let designs = provider.chain().all_designs().await.unwrap();
    assert_eq!(designs.len(), 1);
    assert_eq!(designs[0].account.title, "Sunset");
}
