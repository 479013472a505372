//! Concurrency stress tests for queue numbering and slip claims.
//!
//! These tests verify that under heavy concurrent load, positions are never
//! shared, capacity is never exceeded and no slip is claimed twice.
//!
//! Run with: `cargo test --test concurrency_stress_test -- --nocapture`

#![allow(clippy::expect_used, clippy::unwrap_used)] // Test code can use unwrap/expect

mod common;

use common::Harness;
use fairqueue_core::{SalesError, TicketType};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// Test: 100 concurrent claims against 10 slips.
///
/// Verifies that:
/// - Exactly 10 claims succeed
/// - The other 90 fail with "failed to process order"
/// - Every claimed slip has a single owner
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_hundred_buyers_ten_slips() {
    println!("🧪 Concurrency Stress Test: 100 concurrent claims for 10 slips");

    let h = Harness::new();
    // Counter above the slip count, so only the slip free-list limits claims.
    let gold = h.stock_with_slips(TicketType::Gold, 100, 1_000, 10);
    let buyers: Vec<_> = (1..=100)
        .map(|i| h.queued_buyer(&format!("U{i:03}"), "ID", i))
        .collect();

    let engine = Arc::new(h.allocation());
    let handles = buyers.iter().map(|buyer| {
        let engine = Arc::clone(&engine);
        let request = h.request(buyer, TicketType::Gold);
        tokio::spawn(async move { engine.allocate_ticket(&request).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let claimed: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();

    println!("  ✓ {} claimed, {} refused", claimed.len(), failures.len());
    assert_eq!(claimed.len(), 10);
    assert_eq!(failures.len(), 90);
    assert!(failures.iter().all(|e| **e == SalesError::ClaimFailed));

    let numbers: HashSet<_> = claimed.iter().map(|a| a.ticket_number.clone()).collect();
    assert_eq!(numbers.len(), 10, "a slip was handed out twice");
    let owners: HashSet<_> = claimed.iter().map(|a| a.user_id.clone()).collect();
    assert_eq!(owners.len(), 10);

    assert_eq!(h.store.unclaimed_slips(h.event_id(), TicketType::Gold), 0);
    assert_eq!(h.remaining(&gold), 990);
}

/// Test: the class counter and the slip count agree, so the last claims
/// may be refused by either guard, but the counter never underflows.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_counter_and_slips_drain_together() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 5);
    let buyers: Vec<_> = (1..=50)
        .map(|i| h.queued_buyer(&format!("U{i:02}"), "ID", i))
        .collect();

    let engine = Arc::new(h.allocation());
    let handles = buyers.iter().map(|buyer| {
        let engine = Arc::clone(&engine);
        let request = h.request(buyer, TicketType::Gold);
        tokio::spawn(async move { engine.allocate_ticket(&request).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 5);
    assert!(results.iter().filter_map(|r| r.as_ref().err()).all(|e| matches!(
        e,
        SalesError::SoldOut | SalesError::ClaimFailed
    )));
    assert_eq!(h.remaining(&gold), 0);
}

/// Test: one buyer firing 20 concurrent claims ends up with one slip.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_buyer_claims_once() {
    let h = Harness::new();
    let gold = h.stock(TicketType::Gold, 100, 20);
    let buyer = h.queued_buyer("U", "ID", 1);

    let engine = Arc::new(h.allocation());
    let handles = (0..20).map(|_| {
        let engine = Arc::clone(&engine);
        let request = h.request(&buyer, TicketType::Gold);
        tokio::spawn(async move { engine.allocate_ticket(&request).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == SalesError::AlreadyOrdered));
    assert_eq!(h.remaining(&gold), 19);
}

/// Test: 50 concurrent admissions get 50 distinct positions.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_admissions_get_unique_positions() {
    let h = Harness::new().in_peak_quarter();
    h.stock(TicketType::Gold, 100, 500);
    let buyers: Vec<_> = (1..=50).map(|i| h.buyer(&format!("U{i:02}"), "ID")).collect();

    let admission = Arc::new(h.admission());
    let event_id = h.event_id().clone();
    let handles = buyers.into_iter().map(|buyer| {
        let admission = Arc::clone(&admission);
        let event_id = event_id.clone();
        tokio::spawn(async move { admission.request_admission(&event_id, &buyer).await })
    });
    let positions: Vec<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap().queue_number)
        .collect();

    let unique: HashSet<_> = positions.iter().copied().collect();
    assert_eq!(unique.len(), 50);
    assert_eq!(unique, (1..=50).collect::<HashSet<_>>());
}

/// Test: 60 concurrent admissions against a capacity of 20.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_admissions_respect_capacity() {
    // 80 remaining in the first quarter releases 20 positions.
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 80);
    let buyers: Vec<_> = (1..=60).map(|i| h.buyer(&format!("U{i:02}"), "ID")).collect();

    let admission = Arc::new(h.admission());
    let event_id = h.event_id().clone();
    let handles = buyers.into_iter().map(|buyer| {
        let admission = Arc::clone(&admission);
        let event_id = event_id.clone();
        tokio::spawn(async move { admission.request_admission(&event_id, &buyer).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let admitted: HashSet<u64> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|a| a.queue_number))
        .collect();
    assert_eq!(admitted, (1..=20).collect::<HashSet<_>>());
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(SalesError::QueueFull { limit: 20, .. })))
            .count(),
        40
    );
    assert_eq!(h.store.queue_entries(h.event_id()).len(), 20);
}

/// Test: the same buyer racing 10 admissions is queued once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_buyer_admitted_once() {
    let h = Harness::new();
    h.stock(TicketType::Gold, 100, 400);
    let buyer = h.buyer("U", "ID");

    let admission = Arc::new(h.admission());
    let handles = (0..10).map(|_| {
        let admission = Arc::clone(&admission);
        let event_id = h.event_id().clone();
        let buyer = buyer.clone();
        tokio::spawn(async move { admission.request_admission(&event_id, &buyer).await })
    });
    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| *e == SalesError::AlreadyQueued));
    assert_eq!(h.store.queue_entries(h.event_id()).len(), 1);
}
