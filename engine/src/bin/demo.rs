//! Fair ticketing demo
//!
//! Walks one event through admission and allocation:
//! - Buyers from the event's country and from abroad join the queue
//! - Each claims a Gold ticket (abroad buyers get the cross-country price)
//! - A second claim by the same buyer is refused
//! - An Online request is refused while physical tickets remain
//! - The buyer's claimed tickets are listed
//!
//! # Usage
//!
//! ```bash
//! # In-memory stores
//! cargo run --bin demo
//!
//! # PostgreSQL + Redis (DATABASE_URL, REDIS_URL)
//! FAIRQUEUE_BACKEND=postgres cargo run --bin demo
//! ```

use anyhow::Context;
use chrono::Utc;
use fairqueue_core::environment::{Clock, SystemClock};
use fairqueue_core::providers::{
    CapacityCache, EventRepository, QueueRepository, TicketRepository, UserRepository,
};
use fairqueue_core::{Event, EventId, TicketClass, TicketSlip, TicketType, User, UserId};
use fairqueue_engine::stores::RedisCapacityCache;
use fairqueue_engine::{
    AdmissionController, AllocationEngine, AllocationRequest, Config, OrderHistory,
    SalesEnvironment, SalesPolicy, metrics,
};
use fairqueue_postgres::PostgresInventoryStore;
use fairqueue_testing::{InMemoryCapacityCache, InMemoryInventoryStore, fixtures};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inventory provisioned for the demo event.
struct Seed {
    event: Event,
    users: Vec<User>,
    classes: Vec<TicketClass>,
    slips: Vec<TicketSlip>,
}

fn seed() -> Seed {
    let event_id = format!("demo-{}", Utc::now().timestamp());
    let event = fixtures::event(&event_id, "ID", "T1");

    Seed {
        users: vec![
            fixtures::user(&format!("{event_id}-jakarta"), "ID"),
            fixtures::user(&format!("{event_id}-singapore"), "SG"),
            fixtures::user(&format!("{event_id}-remote"), "ID"),
        ],
        classes: vec![
            fixtures::ticket_class(&event, TicketType::Gold, 100, 10),
            fixtures::ticket_class(&event, TicketType::Online, 50, 5),
        ],
        slips: fixtures::slips(&event, TicketType::Gold, 10)
            .into_iter()
            .chain(fixtures::slips(&event, TicketType::Online, 5))
            .collect(),
        event,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fairqueue_engine=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    metrics::register_sales_metrics();

    println!("\n🎫 ============================================");
    println!("   Fair Ticket Allocation - Live Demo");
    println!("============================================\n");

    let config = Config::from_env();
    let policy = config.sales.to_policy();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let seed = seed();

    let backend = std::env::var("FAIRQUEUE_BACKEND").unwrap_or_default();
    if backend.eq_ignore_ascii_case("postgres") {
        println!("⚙️  Using PostgreSQL at {} and Redis at {}", config.postgres.url, config.redis.url);

        let store = PostgresInventoryStore::connect_with_timeout(
            &config.postgres.url,
            config.postgres.max_connections,
            Duration::from_secs(config.postgres.connect_timeout),
        )
        .await
        .context("connecting to PostgreSQL")?;
        store.migrate().await.context("running migrations")?;

        store.insert_event(&seed.event).await?;
        for user in &seed.users {
            store.insert_user(user).await?;
        }
        for class in &seed.classes {
            store.insert_ticket_class(class).await?;
        }
        store.insert_slips(&seed.slips).await?;

        let cache = RedisCapacityCache::new(&config.redis.url)
            .await
            .context("connecting to Redis")?;
        let env = SalesEnvironment::new(store.clone(), store.clone(), store.clone(), store, cache, clock);
        run(env, policy, &seed).await
    } else {
        println!("⚙️  Using in-memory stores");

        let store = InMemoryInventoryStore::new();
        store.insert_event(seed.event.clone());
        for user in &seed.users {
            store.insert_user(user.clone());
        }
        for class in &seed.classes {
            store.insert_ticket_class(class.clone());
        }
        store.insert_slips(seed.slips.clone());

        let cache = InMemoryCapacityCache::new(clock.clone());
        let env = SalesEnvironment::new(store.clone(), store.clone(), store.clone(), store, cache, clock);
        run(env, policy, &seed).await
    }
}

async fn run<E, U, Q, T, C>(
    env: SalesEnvironment<E, U, Q, T, C>,
    policy: SalesPolicy,
    seed: &Seed,
) -> anyhow::Result<()>
where
    E: EventRepository + Clone,
    U: UserRepository + Clone,
    Q: QueueRepository + Clone,
    T: TicketRepository + Clone,
    C: CapacityCache + Clone,
{
    let admission = AdmissionController::new(env.clone(), policy.clone());
    let allocation = AllocationEngine::new(env.clone(), policy.clone());
    let history = OrderHistory::new(env.tickets.clone(), policy);

    let event_id: &EventId = &seed.event.event_id;
    let [local, abroad, remote] = seed.users.as_slice() else {
        anyhow::bail!("demo expects three buyers");
    };
    let (local, abroad, remote): (&UserId, &UserId, &UserId) =
        (&local.user_id, &abroad.user_id, &remote.user_id);

    println!("\n📋 Event {event_id} (country ID, cohort T1): Gold 100 × 10, Online 50 × 5\n");

    println!("1️⃣  Joining the queue...");
    for buyer in [local, abroad, remote] {
        match admission.request_admission(event_id, buyer).await {
            Ok(position) => println!("   ✓ {buyer} admitted\n{}", serde_json::to_string_pretty(&position)?),
            Err(e) => println!("   ✗ {buyer}: {e}"),
        }
    }

    println!("\n2️⃣  Claiming Gold tickets...");
    for buyer in [local, abroad] {
        let request = AllocationRequest::new(event_id.clone(), buyer.clone(), TicketType::Gold);
        match allocation.allocate_ticket(&request).await {
            Ok(ticket) => println!("   ✓ {buyer} paid {} for {}", ticket.price, ticket.ticket_number),
            Err(e) => println!("   ✗ {buyer}: {e}"),
        }
    }

    println!("\n3️⃣  Claiming a second Gold ticket...");
    let again = AllocationRequest::new(event_id.clone(), local.clone(), TicketType::Gold);
    match allocation.allocate_ticket(&again).await {
        Ok(ticket) => println!("   ⚠️  unexpectedly claimed {}", ticket.ticket_number),
        Err(e) => println!("   ✓ refused: {e}"),
    }

    println!("\n4️⃣  Requesting an Online ticket while Gold remains...");
    let online = AllocationRequest::new(event_id.clone(), remote.clone(), TicketType::Online);
    match allocation.allocate_ticket(&online).await {
        Ok(ticket) => println!("   ⚠️  unexpectedly claimed {}", ticket.ticket_number),
        Err(e) => println!("   ✓ refused: {e}"),
    }

    println!("\n5️⃣  Listing {local}'s tickets...");
    match history.list_claimed_tickets(local, 1, 10).await {
        Ok(page) => println!("{}", serde_json::to_string_pretty(&page)?),
        Err(e) => println!("   ✗ {e}"),
    }

    println!("\n✓ Demo complete\n");
    Ok(())
}
