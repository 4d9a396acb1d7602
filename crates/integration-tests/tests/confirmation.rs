//! Integration tests for transaction confirmation.
//!
//! Writes wait until the cluster reports the signature at the configured
//! commitment, and give up only once the blockhash has expired.

#![allow(clippy::unwrap_used)]

use madma_core::{LAMPORTS_PER_SOL, Lamports, NewDesign, ProgramErrorCode};
use madma_integration_tests::{Settlement, TestContext};
use madma_storefront::{RpcError, StorefrontError, WalletSigner};

fn new_design() -> NewDesign {
    NewDesign {
        title: "Sunset Tee".to_string(),
        description: "Screen printed".to_string(),
        image_url: "https://example.com/sunset.png".to_string(),
        price: Lamports::new(LAMPORTS_PER_SOL),
    }
}

#[tokio::test]
async fn test_waits_for_delayed_confirmation() {
    let ctx = TestContext::new();
    let owner = ctx.wallet(LAMPORTS_PER_SOL);
    let provider = ctx.provider(Some(&owner));
    provider.initialize_store().await.unwrap();

    ctx.chain.delay_confirmation(3);
    let polls_before = ctx.chain.status_polls();
    let confirmed = provider.create_design(new_design()).await.unwrap();

    // Three empty answers, then the confirmed status.
    assert_eq!(ctx.chain.status_polls() - polls_before, 4);
    assert!(ctx.chain.design(&confirmed.address).is_some());
}

#[tokio::test]
async fn test_failed_status_maps_to_program_error() {
    let ctx = TestContext::new();
    let owner = ctx.wallet(LAMPORTS_PER_SOL);
    let owner_view = ctx.provider(Some(&owner));
    owner_view.initialize_store().await.unwrap();
    let design = owner_view.create_design(new_design()).await.unwrap();
    owner_view
        .toggle_design_availability(&design.address)
        .await
        .unwrap();

    ctx.chain.set_settlement(Settlement::OnChain);
    let buyer = ctx.wallet(2 * LAMPORTS_PER_SOL);
    let err = ctx
        .provider(Some(&buyer))
        .create_order(&design.address, "1 Main St".to_string())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Program(ProgramErrorCode::DesignNotAvailable)
    ));
    assert_eq!(ctx.chain.order_count(), 0);
    assert_eq!(
        ctx.chain.balance(&buyer.pubkey()),
        Lamports::new(2 * LAMPORTS_PER_SOL)
    );
}

#[tokio::test]
async fn test_dropped_transaction_expires() {
    let ctx = TestContext::new();
    let owner = ctx.wallet(LAMPORTS_PER_SOL);
    let provider = ctx.provider(Some(&owner));
    provider.initialize_store().await.unwrap();

    ctx.chain.set_settlement(Settlement::Dropped);
    let polls_before = ctx.chain.status_polls();
    let err = provider.create_design(new_design()).await.unwrap_err();

    assert!(matches!(
        err,
        StorefrontError::Rpc(RpcError::BlockhashExpired)
    ));
    assert_eq!(
        err.user_message(),
        "The transaction expired before it was confirmed. Please try again."
    );
    // Polling continued for the whole blockhash lifetime.
    assert!(ctx.chain.status_polls() - polls_before > 150);
    assert_eq!(ctx.chain.store().unwrap().designs_count, 0);
}
