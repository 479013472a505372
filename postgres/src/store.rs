//! `PostgreSQL` inventory store.

use crate::rows::{EventRow, QueueEntryRow, SlipRow, TicketClassRow, UserRow, from_db, to_db};
use fairqueue_core::error::{Result, SalesError};
use fairqueue_core::providers::{
    ChannelScope, ClaimOutcome, EventRepository, QueueInsert, QueueRepository, TicketRepository,
    UserRepository,
};
use fairqueue_core::types::{
    CohortTag, CountryCode, Event, EventId, Page, PageRequest, PendingEntry, QueueEntry, SlipClaim,
    TicketClass, TicketClassId, TicketSlip, TicketType, User, UserId,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use uuid::Uuid;

const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

const SLIP_COLUMNS: &str = "ticket_number, seat_number, is_used, user_id, queue_id, ticket_id, \
     event_id, country_code, price, ticket_type, payment_status, created_at, updated_at";

/// `PostgreSQL` implementation of every inventory contract.
///
/// One pool serves all four repositories; clone the store for each slot of
/// the sales environment.
///
/// # Example
///
/// ```no_run
/// use fairqueue_postgres::PostgresInventoryStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresInventoryStore::connect("postgres://localhost/fairqueue", 10).await?;
/// store.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresInventoryStore {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url` with up to `max_connections` connections.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the pool cannot connect.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        Self::connect_with_timeout(database_url, max_connections, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// Connect, waiting at most `acquire_timeout` for a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the pool cannot connect.
    pub async fn connect_with_timeout(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| SalesError::store("connect", e))?;
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SalesError::store("migrate", e))?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Provisioning
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert an event.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the insert fails.
    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO events
                (event_id, name, country_name, country_code, city, place, tag, date_time, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(event.event_id.as_str())
        .bind(&event.name)
        .bind(&event.country.name)
        .bind(event.country.code.as_str())
        .bind(&event.country.city)
        .bind(&event.country.place)
        .bind(event.tag.as_str())
        .bind(event.date_time)
        .bind(&event.description)
        .execute(&self.pool)
        .await
        .map_err(|e| SalesError::store("insert_event", e))?;
        Ok(())
    }

    /// Insert a buyer.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the insert fails.
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO users
                (user_id, full_name, email, country_name, country_code, city, place)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(user.user_id.as_str())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.country.name)
        .bind(user.country.code.as_str())
        .bind(&user.country.city)
        .bind(&user.country.place)
        .execute(&self.pool)
        .await
        .map_err(|e| SalesError::store("insert_user", e))?;
        Ok(())
    }

    /// Insert a ticket class.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the insert fails.
    pub async fn insert_ticket_class(&self, class: &TicketClass) -> Result<()> {
        const OP: &str = "insert_ticket_class";
        sqlx::query(
            r"
            INSERT INTO ticket_classes
                (ticket_id, event_id, ticket_type, price, total_quota, total_remaining,
                 country_name, country_code, city, place, tag)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(class.ticket_id.as_str())
        .bind(class.event_id.as_str())
        .bind(class.ticket_type.as_str())
        .bind(to_db(OP, class.price)?)
        .bind(to_db(OP, class.total_quota)?)
        .bind(to_db(OP, class.total_remaining)?)
        .bind(&class.country.name)
        .bind(class.country.code.as_str())
        .bind(&class.country.city)
        .bind(&class.country.place)
        .bind(class.tag.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SalesError::store(OP, e))?;
        Ok(())
    }

    /// Insert a queue entry at its recorded position, bypassing the
    /// capacity check.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if the insert fails, including when the
    /// buyer or the position is already taken.
    pub async fn insert_queue_entry(&self, entry: &QueueEntry) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| SalesError::store("insert_queue_entry", e))?;
        insert_entry(&mut *conn, entry, "insert_queue_entry").await
    }

    /// Provision slips in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`SalesError::Store`] if any insert fails; nothing is written
    /// in that case.
    pub async fn insert_slips(&self, slips: &[TicketSlip]) -> Result<()> {
        const OP: &str = "insert_slips";
        let mut tx = self.pool.begin().await.map_err(|e| SalesError::store(OP, e))?;

        for slip in slips {
            sqlx::query(
                r"
                INSERT INTO ticket_slips
                    (ticket_number, seat_number, is_used, user_id, queue_id, ticket_id, event_id,
                     country_code, price, ticket_type, payment_status, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                ",
            )
            .bind(&slip.ticket_number)
            .bind(i32::try_from(slip.seat_number).map_err(|e| SalesError::store(OP, e))?)
            .bind(slip.is_used)
            .bind(slip.user_id.as_ref().map(UserId::as_str))
            .bind(slip.queue_id.map(|id| *id.as_uuid()))
            .bind(slip.ticket_id.as_ref().map(TicketClassId::as_str))
            .bind(slip.event_id.as_str())
            .bind(slip.country_code.as_str())
            .bind(to_db(OP, slip.price)?)
            .bind(slip.ticket_type.as_str())
            .bind(slip.payment_status.map(|s| s.as_str()))
            .bind(slip.created_at)
            .bind(slip.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| SalesError::store(OP, e))?;
        }

        tx.commit().await.map_err(|e| SalesError::store(OP, e))?;
        tracing::debug!(count = slips.len(), "Provisioned ticket slips");
        Ok(())
    }
}

impl EventRepository for PostgresInventoryStore {
    async fn find_event(&self, event_id: &EventId) -> Result<Option<Event>> {
        let row: Option<EventRow> = sqlx::query_as(
            r"
            SELECT event_id, name, country_name, country_code, city, place, tag, date_time, description
            FROM events
            WHERE event_id = $1
            ",
        )
        .bind(event_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SalesError::store("find_event", e))?;

        Ok(row.map(Event::from))
    }
}

impl UserRepository for PostgresInventoryStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r"
            SELECT user_id, full_name, email, country_name, country_code, city, place
            FROM users
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SalesError::store("find_user", e))?;

        Ok(row.map(User::from))
    }
}

impl QueueRepository for PostgresInventoryStore {
    async fn find_queue_entry(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<QueueEntry>> {
        let row: Option<QueueEntryRow> = sqlx::query_as(
            r"
            SELECT queue_id, user_id, event_id, queue_number, country_code, created_at, updated_at
            FROM queue_entries
            WHERE event_id = $1 AND user_id = $2
            ",
        )
        .bind(event_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SalesError::store("find_queue_entry", e))?;

        row.map(QueueEntry::try_from).transpose()
    }

    async fn enqueue(&self, entry: &PendingEntry, limit: u64) -> Result<QueueInsert> {
        const OP: &str = "enqueue";

        // Dropping `tx` before commit rolls back and releases the event lock.
        let mut tx = self.pool.begin().await.map_err(|e| SalesError::store(OP, e))?;

        // Serializes admissions per event until commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(entry.event_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| SalesError::store(OP, e))?;

        let queued: Option<(Uuid,)> = sqlx::query_as(
            "SELECT queue_id FROM queue_entries WHERE event_id = $1 AND user_id = $2",
        )
        .bind(entry.event_id.as_str())
        .bind(entry.user_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| SalesError::store(OP, e))?;
        if queued.is_some() {
            return Ok(QueueInsert::AlreadyQueued);
        }

        let (highest,): (i64,) = sqlx::query_as(
            "SELECT COALESCE(MAX(queue_number), 0)::BIGINT FROM queue_entries WHERE event_id = $1",
        )
        .bind(entry.event_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| SalesError::store(OP, e))?;

        let position = from_db("queue_number", highest)? + 1;
        if position > limit {
            return Ok(QueueInsert::Full { position });
        }

        let persisted = entry.at_position(position);
        insert_entry(&mut *tx, &persisted, OP).await?;
        tx.commit().await.map_err(|e| SalesError::store(OP, e))?;

        Ok(QueueInsert::Inserted(persisted))
    }
}

async fn insert_entry(
    conn: &mut sqlx::PgConnection,
    entry: &QueueEntry,
    operation: &'static str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO queue_entries
            (queue_id, user_id, event_id, queue_number, country_code, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ",
    )
    .bind(*entry.queue_id.as_uuid())
    .bind(entry.user_id.as_str())
    .bind(entry.event_id.as_str())
    .bind(to_db(operation, entry.queue_number)?)
    .bind(entry.country_code.as_str())
    .bind(entry.created_at)
    .bind(entry.updated_at)
    .execute(conn)
    .await
    .map_err(|e| SalesError::store(operation, e))?;
    Ok(())
}

impl TicketRepository for PostgresInventoryStore {
    async fn sum_remaining(
        &self,
        country: &CountryCode,
        tag: &CohortTag,
        scope: ChannelScope,
    ) -> Result<Option<u64>> {
        let (matched, total): (i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*), COALESCE(SUM(total_remaining), 0)::BIGINT
            FROM ticket_classes
            WHERE country_code = $1 AND tag = $2 AND ($3 OR ticket_type <> $4)
            ",
        )
        .bind(country.as_str())
        .bind(tag.as_str())
        .bind(scope.includes(TicketType::Online))
        .bind(TicketType::Online.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| SalesError::store("sum_remaining", e))?;

        if matched == 0 {
            return Ok(None);
        }
        from_db("total_remaining", total).map(Some)
    }

    async fn find_ticket_class(
        &self,
        event_id: &EventId,
        ticket_type: TicketType,
    ) -> Result<Option<TicketClass>> {
        let row: Option<TicketClassRow> = sqlx::query_as(
            r"
            SELECT ticket_id, event_id, ticket_type, price, total_quota, total_remaining,
                   country_name, country_code, city, place, tag
            FROM ticket_classes
            WHERE event_id = $1 AND ticket_type = $2
            ",
        )
        .bind(event_id.as_str())
        .bind(ticket_type.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SalesError::store("find_ticket_class", e))?;

        row.map(TicketClass::try_from).transpose()
    }

    async fn find_slip_by_owner(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<TicketSlip>> {
        let row: Option<SlipRow> = sqlx::query_as(&format!(
            "SELECT {SLIP_COLUMNS} FROM ticket_slips \
             WHERE event_id = $1 AND user_id = $2 AND is_used \
             LIMIT 1"
        ))
        .bind(event_id.as_str())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SalesError::store("find_slip_by_owner", e))?;

        row.map(TicketSlip::try_from).transpose()
    }

    async fn claim_slip(&self, claim: &SlipClaim) -> Result<ClaimOutcome> {
        const OP: &str = "claim_slip";

        // Dropping `tx` before commit rolls every step back.
        let mut tx = self.pool.begin().await.map_err(|e| SalesError::store(OP, e))?;

        let owned: Option<(String,)> = sqlx::query_as(
            r"
            SELECT ticket_number FROM ticket_slips
            WHERE event_id = $1 AND user_id = $2 AND is_used
            LIMIT 1
            ",
        )
        .bind(claim.event_id.as_str())
        .bind(claim.user_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| SalesError::store(OP, e))?;
        if owned.is_some() {
            return Ok(ClaimOutcome::AlreadyOwned);
        }

        let decremented = sqlx::query(
            r"
            UPDATE ticket_classes
            SET total_remaining = total_remaining - 1
            WHERE ticket_id = $1 AND event_id = $2 AND total_remaining > 0
            ",
        )
        .bind(claim.ticket_id.as_str())
        .bind(claim.event_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| SalesError::store(OP, e))?;
        if decremented.rows_affected() == 0 {
            return Ok(ClaimOutcome::ClassExhausted);
        }

        let claimed: std::result::Result<Option<SlipRow>, sqlx::Error> = sqlx::query_as(&format!(
            "UPDATE ticket_slips \
             SET is_used = TRUE, user_id = $3, queue_id = $4, ticket_id = $5, price = $6, \
                 payment_status = $7, updated_at = $8, country_code = $9 \
             WHERE ticket_number = ( \
                 SELECT ticket_number FROM ticket_slips \
                 WHERE event_id = $1 AND ticket_type = $2 AND NOT is_used \
                 ORDER BY seat_number \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {SLIP_COLUMNS}"
        ))
        .bind(claim.event_id.as_str())
        .bind(claim.ticket_type.as_str())
        .bind(claim.user_id.as_str())
        .bind(*claim.queue_id.as_uuid())
        .bind(claim.ticket_id.as_str())
        .bind(to_db(OP, claim.price)?)
        .bind(claim.payment_status.as_str())
        .bind(claim.claimed_at)
        .bind(claim.country_code.as_str())
        .fetch_optional(&mut *tx)
        .await;

        let row = match claimed {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(ClaimOutcome::NoSlipAvailable),
            // A concurrent claim by the same buyer won the partial unique index.
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Ok(ClaimOutcome::AlreadyOwned);
            }
            Err(e) => return Err(SalesError::store(OP, e)),
        };

        tx.commit().await.map_err(|e| SalesError::store(OP, e))?;

        let slip = TicketSlip::try_from(row)?;
        tracing::debug!(
            ticket_number = %slip.ticket_number,
            user_id = %claim.user_id,
            "Claimed ticket slip"
        );
        Ok(ClaimOutcome::Claimed(slip))
    }

    async fn list_slips_by_owner(
        &self,
        user_id: &UserId,
        page: PageRequest,
    ) -> Result<Page<TicketSlip>> {
        const OP: &str = "list_slips_by_owner";

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM ticket_slips WHERE user_id = $1 AND is_used")
                .bind(user_id.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(|e| SalesError::store(OP, e))?;

        let rows: Vec<SlipRow> = sqlx::query_as(&format!(
            "SELECT {SLIP_COLUMNS} FROM ticket_slips \
             WHERE user_id = $1 AND is_used \
             ORDER BY updated_at DESC, ticket_number \
             LIMIT $2 OFFSET $3"
        ))
        .bind(user_id.as_str())
        .bind(to_db(OP, page.size)?)
        .bind(to_db(OP, page.offset())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SalesError::store(OP, e))?;

        let items = rows
            .into_iter()
            .map(TicketSlip::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page {
            items,
            total: from_db("count", total)?,
        })
    }
}
