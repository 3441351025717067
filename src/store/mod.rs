/// Event Store (SPEC_FULL.md §4.2).
///
/// Single SQLite file behind split read/write r2d2 pools, same architecture
/// as the teacher's `events::db::EventsDatabase`, with a schema swapped out
/// for the forensic tables named in SPEC_FULL.md §6: `cache`,
/// `intelligence_events`, `sol_flows`, `cartel_edges`, `operator_mappings`,
/// `alert_subscriptions`, `bundle_reports`.
mod bundle_reports;
mod cache;
mod cartel;
mod events;
mod flows;
mod maintenance;
mod subscriptions;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

use crate::logger::{self, LogTag};

const WRITE_POOL_MAX_SIZE: u32 = 2;
const READ_POOL_MAX_SIZE: u32 = 10;
const POOL_MIN_IDLE: u32 = 1;
const CONNECTION_TIMEOUT_MS: u64 = 30_000;

pub struct EventStore {
    write_pool: Pool<SqliteConnectionManager>,
    read_pool: Pool<SqliteConnectionManager>,
    database_path: String,
}

impl EventStore {
    pub async fn new(database_path: &str) -> Result<Self, String> {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("failed to create event store directory: {}", e))?;
            }
        }

        let write_manager = SqliteConnectionManager::file(database_path);
        let read_manager = SqliteConnectionManager::file(database_path);

        let write_pool = Pool::builder()
            .max_size(WRITE_POOL_MAX_SIZE)
            .min_idle(Some(POOL_MIN_IDLE))
            .connection_timeout(Duration::from_millis(CONNECTION_TIMEOUT_MS))
            .build(write_manager)
            .map_err(|e| format!("failed to create event store write pool: {}", e))?;

        let read_pool = Pool::builder()
            .max_size(READ_POOL_MAX_SIZE)
            .min_idle(Some(POOL_MIN_IDLE))
            .connection_timeout(Duration::from_millis(CONNECTION_TIMEOUT_MS))
            .build(read_manager)
            .map_err(|e| format!("failed to create event store read pool: {}", e))?;

        let store = EventStore {
            write_pool,
            read_pool,
            database_path: database_path.to_string(),
        };

        store.initialize_schema()?;
        logger::info(
            LogTag::EventStore,
            &format!("event store ready at {}", store.database_path),
        );
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), String> {
        let conn = self.get_write_connection()?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| format!("failed to set journal mode: {}", e))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|e| format!("failed to set synchronous mode: {}", e))?;
        conn.pragma_update(None, "cache_size", 10000)
            .map_err(|e| format!("failed to set cache size: {}", e))?;
        conn.pragma_update(None, "temp_store", "memory")
            .map_err(|e| format!("failed to set temp store: {}", e))?;
        conn.busy_timeout(Duration::from_millis(30_000))
            .map_err(|e| format!("failed to set busy timeout: {}", e))?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS cache (
                key         TEXT PRIMARY KEY,
                value       BLOB NOT NULL,
                expires_at  REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache(expires_at);

            CREATE TABLE IF NOT EXISTS intelligence_events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type  TEXT NOT NULL,
                mint        TEXT,
                deployer    TEXT,
                name        TEXT,
                symbol      TEXT,
                narrative   TEXT,
                mcap_usd    REAL,
                liq_usd     REAL,
                created_at  TEXT,
                rugged_at   TEXT,
                recorded_at REAL NOT NULL,
                extra_json  TEXT NOT NULL DEFAULT '{}'
            );
            CREATE INDEX IF NOT EXISTS idx_events_type_recorded ON intelligence_events(event_type, recorded_at);
            CREATE INDEX IF NOT EXISTS idx_events_mint ON intelligence_events(mint);
            CREATE INDEX IF NOT EXISTS idx_events_deployer ON intelligence_events(deployer);

            CREATE TABLE IF NOT EXISTS sol_flows (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                mint            TEXT NOT NULL,
                from_address    TEXT NOT NULL,
                to_address      TEXT NOT NULL,
                amount_lamports INTEGER NOT NULL,
                signature       TEXT NOT NULL,
                slot            INTEGER NOT NULL,
                block_time      INTEGER,
                hop             INTEGER NOT NULL,
                UNIQUE(mint, signature, from_address, to_address)
            );
            CREATE INDEX IF NOT EXISTS idx_sol_flows_mint ON sol_flows(mint);
            CREATE INDEX IF NOT EXISTS idx_sol_flows_block_time ON sol_flows(block_time);

            CREATE TABLE IF NOT EXISTS cartel_edges (
                wallet_a        TEXT NOT NULL,
                wallet_b        TEXT NOT NULL,
                signal_type     TEXT NOT NULL,
                signal_strength REAL NOT NULL,
                evidence_json   TEXT NOT NULL DEFAULT '{}',
                recorded_at     REAL NOT NULL,
                PRIMARY KEY (wallet_a, wallet_b, signal_type)
            );
            CREATE INDEX IF NOT EXISTS idx_cartel_edges_a ON cartel_edges(wallet_a);
            CREATE INDEX IF NOT EXISTS idx_cartel_edges_b ON cartel_edges(wallet_b);

            CREATE TABLE IF NOT EXISTS operator_mappings (
                fingerprint TEXT NOT NULL,
                wallet      TEXT NOT NULL,
                recorded_at REAL NOT NULL,
                PRIMARY KEY (fingerprint, wallet)
            );
            CREATE INDEX IF NOT EXISTS idx_operator_mappings_wallet ON operator_mappings(wallet);

            CREATE TABLE IF NOT EXISTS alert_subscriptions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                chat_id     INTEGER NOT NULL,
                sub_type    TEXT NOT NULL,
                value       TEXT NOT NULL,
                recorded_at REAL NOT NULL,
                UNIQUE(chat_id, sub_type, value)
            );

            CREATE TABLE IF NOT EXISTS bundle_reports (
                mint        TEXT PRIMARY KEY,
                deployer    TEXT NOT NULL,
                report_json TEXT NOT NULL,
                recorded_at REAL NOT NULL
            );
            ",
        )
        .map_err(|e| format!("failed to initialize event store schema: {}", e))?;

        Ok(())
    }

    fn get_write_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, String> {
        self.write_pool
            .get()
            .map_err(|e| format!("failed to acquire write connection: {}", e))
    }

    fn get_read_connection(&self) -> Result<PooledConnection<SqliteConnectionManager>, String> {
        let conn = self
            .read_pool
            .get()
            .map_err(|e| format!("failed to acquire read connection: {}", e))?;
        let _ = conn.pragma_update(None, "query_only", true);
        Ok(conn)
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }
}

fn now_unix() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
