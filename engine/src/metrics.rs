//! Business metrics for admission and allocation.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `fairqueue_admissions_granted_total` - Queue positions granted
//! - `fairqueue_admissions_rejected_total{reason}` - Admissions rejected, by reason
//! - `fairqueue_allocations_claimed_total{ticket_type}` - Slips claimed
//! - `fairqueue_allocations_rejected_total{reason}` - Allocations rejected, by reason
//! - `fairqueue_capacity_lookups_total{result}` - Capacity lookups (hit, miss, error)
//!
//! Reasons are the `SalesError::kind` labels.

use metrics::describe_counter;

/// Initialize and register all business metrics descriptions.
///
/// Call once at startup, before anything is recorded.
pub fn register_sales_metrics() {
    describe_counter!(
        "fairqueue_admissions_granted_total",
        "Total number of queue positions granted"
    );
    describe_counter!(
        "fairqueue_admissions_rejected_total",
        "Total number of rejected admission requests by reason"
    );
    describe_counter!(
        "fairqueue_allocations_claimed_total",
        "Total number of ticket slips claimed by ticket type"
    );
    describe_counter!(
        "fairqueue_allocations_rejected_total",
        "Total number of rejected allocation requests by reason"
    );
    describe_counter!(
        "fairqueue_capacity_lookups_total",
        "Total number of queue capacity lookups by cache result (hit, miss, error)"
    );

    tracing::info!("Sales metrics registered");
}

/// Record a granted admission.
pub fn record_admission_granted(queue_number: u64) {
    metrics::counter!("fairqueue_admissions_granted_total").increment(1);
    tracing::debug!(queue_number, "Recorded admission_granted metric");
}

/// Record a rejected admission.
///
/// # Arguments
///
/// * `reason` - Error kind (e.g., "queue_full", "already_queued")
pub fn record_admission_rejected(reason: &'static str) {
    metrics::counter!("fairqueue_admissions_rejected_total", "reason" => reason).increment(1);
    tracing::debug!(reason, "Recorded admission_rejected metric");
}

/// Record a claimed slip.
pub fn record_allocation_claimed(ticket_type: &'static str, price: u64) {
    metrics::counter!("fairqueue_allocations_claimed_total", "ticket_type" => ticket_type)
        .increment(1);
    tracing::debug!(ticket_type, price, "Recorded allocation_claimed metric");
}

/// Record a rejected allocation.
///
/// # Arguments
///
/// * `reason` - Error kind (e.g., "sold_out", "already_ordered")
pub fn record_allocation_rejected(reason: &'static str) {
    metrics::counter!("fairqueue_allocations_rejected_total", "reason" => reason).increment(1);
    tracing::debug!(reason, "Recorded allocation_rejected metric");
}

/// Record a capacity lookup.
///
/// # Arguments
///
/// * `result` - "hit", "miss" or "error"
pub fn record_capacity_lookup(result: &'static str) {
    metrics::counter!("fairqueue_capacity_lookups_total", "result" => result).increment(1);
    tracing::debug!(result, "Recorded capacity_lookup metric");
}
