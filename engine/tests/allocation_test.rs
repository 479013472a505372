//! Allocation engine tests over in-memory stores.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::Weekday;
use common::{Harness, at};
use fairqueue_core::{PaymentStatus, SalesError, TicketType, UserId};
use fairqueue_engine::SalesPolicy;
use tokio_test::assert_ok;

#[tokio::test]
async fn local_buyer_pays_full_price() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 10);
    let user = h.buyer("U", "ID");
    let admission = h.admit(&user).await;

    let ticket = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap();

    assert_eq!(ticket.price, 100);
    assert_eq!(ticket.queue_id, admission.queue_id);
    assert_eq!(ticket.user_id, user);
    assert_eq!(ticket.ticket_type, TicketType::Gold);
    assert_eq!(ticket.payment_status, PaymentStatus::Pending);
    assert_eq!(ticket.order_time, at(2025, 3, 1, 10));
    assert_eq!(h.remaining(&gold), 9);
    assert_eq!(h.store.unclaimed_slips(h.event_id(), TicketType::Gold), 9);
}

#[tokio::test]
async fn foreign_buyer_gets_cross_country_price() {
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 10);
    let user = h.buyer("U2", "SG");
    h.admit(&user).await;

    let ticket = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap();

    assert_eq!(ticket.price, 80);
}

#[tokio::test]
async fn second_allocation_is_already_ordered() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 10);
    let user = h.buyer("U", "ID");
    h.admit(&user).await;
    let engine = h.allocation();

    assert_ok!(engine.allocate_ticket(&h.request(&user, TicketType::Gold)).await);
    let err = engine
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::AlreadyOrdered);
    assert_eq!(err.to_string(), "user already order ticket");
    assert_eq!(h.remaining(&gold), 9);
}

#[tokio::test]
async fn claimed_slip_records_owner_and_queue() {
    // 4 remaining in the first quarter releases one position.
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 4);
    let user = h.buyer("U", "SG");
    let admission = h.admit(&user).await;

    let ticket = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap();

    let slip = h
        .store
        .slips()
        .into_iter()
        .find(|s| s.ticket_number == ticket.ticket_number)
        .unwrap();
    assert!(slip.is_used);
    assert_eq!(slip.user_id, Some(user));
    assert_eq!(slip.queue_id, Some(admission.queue_id));
    assert_eq!(slip.price, 80);
    assert_eq!(slip.payment_status, Some(PaymentStatus::Pending));
}

#[tokio::test]
async fn buyer_must_be_queued() {
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 10);
    let user = h.buyer("U", "ID");

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::NotInQueue);
    assert_eq!(err.to_string(), "user not in the queue");
}

#[tokio::test]
async fn exhausted_counter_is_sold_out_even_with_slips() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 10);
    let user = h.queued_buyer("U", "ID", 1);
    h.store.set_remaining(&gold, 0);

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::SoldOut);
    assert_eq!(err.to_string(), "ticket category sold out");
    assert_eq!(h.store.unclaimed_slips(h.event_id(), TicketType::Gold), 10);
    assert_eq!(h.store.call_count("claim_slip"), 0);
}

#[tokio::test]
async fn missing_class_is_rejected() {
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 10);
    let user = h.queued_buyer("U", "ID", 1);

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Diamond))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::TicketClassNotFound);
    assert_eq!(err.to_string(), "ticket detail not found");
}

#[tokio::test]
async fn no_free_slip_is_a_claim_failure() {
    let h = Harness::new();
    let gold = h.stock_with_slips(TicketType::Gold, 100, 5, 0);
    let user = h.queued_buyer("U", "ID", 1);

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::ClaimFailed);
    assert_eq!(err.to_string(), "failed to process order");
    assert_eq!(h.remaining(&gold), 5);
}

#[tokio::test]
async fn unknown_buyer_cannot_be_priced() {
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 10);
    let ghost = UserId::new("ghost");
    h.admit(&ghost).await;

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&ghost, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::UserNotFound);
    assert_eq!(h.store.call_count("claim_slip"), 0);
}

#[tokio::test]
async fn online_waits_for_offline_inventory() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 2);
    h.stock(TicketType::Online, 40, 5);
    let user = h.queued_buyer("U", "SG", 1);
    let engine = h.allocation();

    let err = engine
        .allocate_ticket(&h.request(&user, TicketType::Online))
        .await
        .unwrap_err();
    assert_eq!(err, SalesError::OfflineInventoryAvailable { remaining: 2 });
    assert_eq!(err.to_string(), "offline ticket still ready");

    h.store.set_remaining(&gold, 0);
    let ticket = engine
        .allocate_ticket(&h.request(&user, TicketType::Online))
        .await
        .unwrap();

    // No cross-country discount on Online.
    assert_eq!(ticket.price, 40);
}

#[tokio::test]
async fn online_without_offline_classes_is_country_not_found() {
    let h = Harness::new();
    h.stock(TicketType::Online, 40, 5);
    let user = h.queued_buyer("U", "ID", 1);

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Online))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::InventoryNotFound);
    assert_eq!(err.to_string(), "country not found");
}

#[tokio::test]
async fn offline_types_skip_the_channel_gate() {
    let h = Harness::new();
    h.stock(TicketType::Silver, 60, 3);
    let user = h.queued_buyer("U", "ID", 1);

    assert_ok!(
        h.allocation()
            .allocate_ticket(&h.request(&user, TicketType::Silver))
            .await
    );
    assert_eq!(h.store.call_count("sum_remaining"), 0);
}

#[tokio::test]
async fn sales_days_gate_applies_to_allocation() {
    let h = Harness::with_policy(SalesPolicy::default().with_sales_days(Weekday::Sat, Weekday::Sun));
    h.stock(TicketType::Gold, 100, 10);
    let user = h.queued_buyer("U", "ID", 1);
    h.clock.set(at(2025, 3, 5, 10));

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert_eq!(err, SalesError::SalesClosed { weekday: Weekday::Wed });
    assert_eq!(h.store.call_count("find_event"), 0);
}

#[tokio::test]
async fn failed_claim_leaves_counter_untouched() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 10);
    let user = h.queued_buyer("U", "ID", 1);
    h.store.fail_operation("claim_slip");

    let err = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Gold))
        .await
        .unwrap_err();

    assert!(matches!(err, SalesError::Store { operation: "claim_slip", .. }));
    assert_eq!(h.remaining(&gold), 10);
    assert_eq!(h.store.unclaimed_slips(h.event_id(), TicketType::Gold), 10);
}

#[tokio::test]
async fn discount_follows_policy() {
    let h = Harness::with_policy(SalesPolicy::default().with_discount_percent(35));
    h.stock(TicketType::Platinum, 999, 1);
    let user = h.queued_buyer("U", "SG", 1);

    let ticket = h
        .allocation()
        .allocate_ticket(&h.request(&user, TicketType::Platinum))
        .await
        .unwrap();

    assert_eq!(ticket.price, 999 * 65 / 100);
}
