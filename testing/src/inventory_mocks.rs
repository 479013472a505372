//! In-memory inventory store.
//!
//! Implements every store contract from `fairqueue_core::providers` over a
//! single mutex, so each operation (including the slip claim) is atomic
//! exactly like the production store promises.

use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::{
    ChannelScope, ClaimOutcome, EventRepository, QueueInsert, QueueRepository, TicketRepository,
    UserRepository,
};
use fairqueue_core::types::{
    CohortTag, CountryCode, Event, EventId, Page, PageRequest, PendingEntry, QueueEntry, SlipClaim,
    TicketClass, TicketClassId, TicketSlip, TicketType, User, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inventory {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    classes: Vec<TicketClass>,
    slips: Vec<TicketSlip>,
    queue: Vec<QueueEntry>,
    failing: HashSet<&'static str>,
    calls: HashMap<&'static str, usize>,
}

impl Inventory {
    /// Count the call and fail it if a failure was injected.
    fn enter(&mut self, operation: &'static str) -> Result<()> {
        *self.calls.entry(operation).or_insert(0) += 1;
        if self.failing.contains(operation) {
            return Err(SalesError::store(operation, "injected failure"));
        }
        Ok(())
    }
}

/// In-memory inventory store for fast, deterministic testing.
///
/// Cloning shares the underlying data. Operations can be made to fail with
/// [`InMemoryInventoryStore::fail_operation`] and their calls counted with
/// [`InMemoryInventoryStore::call_count`]; operation names match the trait
/// method names.
///
/// # Example
///
/// ```
/// use fairqueue_testing::{fixtures, InMemoryInventoryStore};
/// use fairqueue_core::TicketType;
///
/// let store = InMemoryInventoryStore::new();
/// let event = fixtures::event("evt-1", "ID", "T1");
/// store.insert_event(event.clone());
/// store.insert_slips(fixtures::slips(&event, TicketType::Gold, 3));
/// assert_eq!(store.unclaimed_slips(&event.event_id, TicketType::Gold), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryInventoryStore {
    inner: Arc<Mutex<Inventory>>,
}

impl InMemoryInventoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inventory> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace an event
    pub fn insert_event(&self, event: Event) {
        self.lock().events.insert(event.event_id.clone(), event);
    }

    /// Add or replace a buyer
    pub fn insert_user(&self, user: User) {
        self.lock().users.insert(user.user_id.clone(), user);
    }

    /// Add a ticket class
    pub fn insert_ticket_class(&self, class: TicketClass) {
        self.lock().classes.push(class);
    }

    /// Provision slips
    pub fn insert_slips(&self, slips: impl IntoIterator<Item = TicketSlip>) {
        self.lock().slips.extend(slips);
    }

    /// Persist a queue entry directly, bypassing the capacity check
    pub fn insert_queue_entry_raw(&self, entry: QueueEntry) {
        self.lock().queue.push(entry);
    }

    /// Make every subsequent call to `operation` fail with a store error
    pub fn fail_operation(&self, operation: &'static str) {
        self.lock().failing.insert(operation);
    }

    /// Undo [`InMemoryInventoryStore::fail_operation`]
    pub fn heal_operation(&self, operation: &'static str) {
        self.lock().failing.remove(operation);
    }

    /// Number of calls made to `operation`
    #[must_use]
    pub fn call_count(&self, operation: &'static str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Current state of a ticket class
    #[must_use]
    pub fn ticket_class(&self, ticket_id: &TicketClassId) -> Option<TicketClass> {
        self.lock()
            .classes
            .iter()
            .find(|c| &c.ticket_id == ticket_id)
            .cloned()
    }

    /// Overwrite a class counter
    pub fn set_remaining(&self, ticket_id: &TicketClassId, remaining: u64) {
        if let Some(class) = self
            .lock()
            .classes
            .iter_mut()
            .find(|c| &c.ticket_id == ticket_id)
        {
            class.total_remaining = remaining;
        }
    }

    /// Every slip, claimed or not
    #[must_use]
    pub fn slips(&self) -> Vec<TicketSlip> {
        self.lock().slips.clone()
    }

    /// Unclaimed slips for (event, ticket type)
    #[must_use]
    pub fn unclaimed_slips(&self, event_id: &EventId, ticket_type: TicketType) -> usize {
        self.lock()
            .slips
            .iter()
            .filter(|s| !s.is_used && &s.event_id == event_id && s.ticket_type == ticket_type)
            .count()
    }

    /// Queue entries for an event in position order
    #[must_use]
    pub fn queue_entries(&self, event_id: &EventId) -> Vec<QueueEntry> {
        let mut entries: Vec<_> = self
            .lock()
            .queue
            .iter()
            .filter(|e| &e.event_id == event_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.queue_number);
        entries
    }
}

impl EventRepository for InMemoryInventoryStore {
    async fn find_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        let mut inner = self.lock();
        inner.enter("find_event")?;
        Ok(inner.events.get(event_id).cloned())
    }
}

impl UserRepository for InMemoryInventoryStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let mut inner = self.lock();
        inner.enter("find_user")?;
        Ok(inner.users.get(user_id).cloned())
    }
}

impl QueueRepository for InMemoryInventoryStore {
    async fn find_queue_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let mut inner = self.lock();
        inner.enter("find_queue_entry")?;
        Ok(inner
            .queue
            .iter()
            .find(|e| &e.event_id == event_id && &e.user_id == user_id)
            .cloned())
    }

    async fn enqueue(&self, entry: &PendingEntry, limit: u64) -> Result<QueueInsert> {
        let mut inner = self.lock();
        inner.enter("enqueue")?;

        let duplicate = inner
            .queue
            .iter()
            .any(|e| e.event_id == entry.event_id && e.user_id == entry.user_id);
        if duplicate {
            return Ok(QueueInsert::AlreadyQueued);
        }

        let position = inner
            .queue
            .iter()
            .filter(|e| e.event_id == entry.event_id)
            .map(|e| e.queue_number)
            .max()
            .unwrap_or(0)
            + 1;
        if position > limit {
            return Ok(QueueInsert::Full { position });
        }

        let persisted = entry.at_position(position);
        inner.queue.push(persisted.clone());
        Ok(QueueInsert::Inserted(persisted))
    }
}

impl TicketRepository for InMemoryInventoryStore {
    async fn sum_remaining(
        &self,
        country: &CountryCode,
        tag: &CohortTag,
        scope: ChannelScope,
    ) -> Result<Option<u64>> {
        let mut inner = self.lock();
        inner.enter("sum_remaining")?;

        let matching: Vec<u64> = inner
            .classes
            .iter()
            .filter(|c| &c.country.code == country && &c.tag == tag)
            .filter(|c| scope.includes(c.ticket_type))
            .map(|c| c.total_remaining)
            .collect();

        if matching.is_empty() {
            return Ok(None);
        }
        Ok(Some(matching.iter().sum()))
    }

    async fn find_ticket_class(
        &self,
        event_id: &EventId,
        ticket_type: TicketType,
    ) -> Result<Option<TicketClass>> {
        let mut inner = self.lock();
        inner.enter("find_ticket_class")?;
        Ok(inner
            .classes
            .iter()
            .find(|c| &c.event_id == event_id && c.ticket_type == ticket_type)
            .cloned())
    }

    async fn find_slip_by_owner(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<TicketSlip>> {
        let mut inner = self.lock();
        inner.enter("find_slip_by_owner")?;
        Ok(inner
            .slips
            .iter()
            .find(|s| s.is_used && &s.event_id == event_id && s.user_id.as_ref() == Some(user_id))
            .cloned())
    }

    async fn claim_slip(&self, claim: &SlipClaim) -> Result<ClaimOutcome> {
        let mut inner = self.lock();
        inner.enter("claim_slip")?;

        let already_owned = inner.slips.iter().any(|s| {
            s.is_used && s.event_id == claim.event_id && s.user_id.as_ref() == Some(&claim.user_id)
        });
        if already_owned {
            return Ok(ClaimOutcome::AlreadyOwned);
        }

        let Some(class_idx) = inner
            .classes
            .iter()
            .position(|c| c.ticket_id == claim.ticket_id && c.event_id == claim.event_id)
        else {
            return Ok(ClaimOutcome::ClassExhausted);
        };
        if inner.classes[class_idx].total_remaining == 0 {
            return Ok(ClaimOutcome::ClassExhausted);
        }

        let Some(slip_idx) = inner.slips.iter().position(|s| {
            !s.is_used && s.event_id == claim.event_id && s.ticket_type == claim.ticket_type
        }) else {
            return Ok(ClaimOutcome::NoSlipAvailable);
        };

        inner.classes[class_idx].total_remaining -= 1;
        let slip = &mut inner.slips[slip_idx];
        slip.apply_claim(claim);
        let claimed = slip.clone();

        tracing::debug!(
            ticket_number = %claimed.ticket_number,
            user_id = %claim.user_id,
            "Mock claimed slip"
        );

        Ok(ClaimOutcome::Claimed(claimed))
    }

    async fn list_slips_by_owner(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<TicketSlip>> {
        let mut inner = self.lock();
        inner.enter("list_slips_by_owner")?;

        let mut owned: Vec<TicketSlip> = inner
            .slips
            .iter()
            .filter(|s| s.is_used && s.user_id.as_ref() == Some(user_id))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let total = owned.len() as u64;
        let items = owned
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.size).unwrap_or(usize::MAX))
            .collect();

        Ok(Page { items, total })
    }
}
