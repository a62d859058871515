// Snapshot cache - the joined company list, stored whole in SQLite
//
// One row per sync, replaced wholesale. The engine never reads partial
// state: a snapshot is either the previous one or the new one.

use crate::models::Company;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub snapshot_id: String,
    pub content_hash: String,
    pub synced_at: DateTime<Utc>,
    pub company_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub meta: SnapshotMeta,
    pub companies: Vec<Company>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// New content stored, previous snapshot replaced
    Saved(SnapshotMeta),

    /// Content hash matched the cached snapshot; nothing written
    Unchanged(SnapshotMeta),
}

impl SaveOutcome {
    pub fn meta(&self) -> &SnapshotMeta {
        match self {
            SaveOutcome::Saved(meta) | SaveOutcome::Unchanged(meta) => meta,
        }
    }

    pub fn was_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved(_))
    }
}

/// Audit trail entry for cache writes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub snapshot_id: String,
    pub data: serde_json::Value,
}

impl SyncEvent {
    pub fn new(event_type: &str, snapshot_id: &str, data: serde_json::Value) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            snapshot_id: snapshot_id.to_string(),
            data,
        }
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            snapshot_id TEXT UNIQUE NOT NULL,
            content_hash TEXT NOT NULL,
            synced_at TEXT NOT NULL,
            company_count INTEGER NOT NULL,
            payload TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sync_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            snapshot_id TEXT NOT NULL,
            data TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sync_events_timestamp ON sync_events(timestamp)",
        [],
    )?;

    Ok(())
}

/// SHA-256 of the serialized company list
pub fn content_hash(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Store a new snapshot unless it is identical to the cached one.
pub fn save_snapshot(conn: &Connection, companies: &[Company]) -> Result<SaveOutcome> {
    let payload = serde_json::to_string(companies).context("Failed to serialize companies")?;
    let hash = content_hash(&payload);

    let previous = latest_meta(conn)?;
    if let Some(meta) = previous.as_ref() {
        if meta.content_hash == hash {
            return Ok(SaveOutcome::Unchanged(meta.clone()));
        }
    }

    let meta = SnapshotMeta {
        snapshot_id: uuid::Uuid::new_v4().to_string(),
        content_hash: hash,
        synced_at: Utc::now(),
        company_count: companies.len(),
    };

    let tx = conn
        .unchecked_transaction()
        .context("Failed to open snapshot transaction")?;

    tx.execute("DELETE FROM snapshots", [])?;
    tx.execute(
        "INSERT INTO snapshots (snapshot_id, content_hash, synced_at, company_count, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            meta.snapshot_id,
            meta.content_hash,
            meta.synced_at.to_rfc3339(),
            meta.company_count as i64,
            payload,
        ],
    )?;

    let event = SyncEvent::new(
        "snapshot_replaced",
        &meta.snapshot_id,
        serde_json::json!({
            "company_count": meta.company_count,
            "content_hash": meta.content_hash,
            "previous_snapshot_id": previous.as_ref().map(|p| p.snapshot_id.clone()),
        }),
    );
    insert_event(&tx, &event)?;

    tx.commit().context("Failed to commit snapshot")?;

    info!(
        snapshot_id = %meta.snapshot_id,
        companies = meta.company_count,
        "snapshot cached"
    );

    Ok(SaveOutcome::Saved(meta))
}

fn latest_meta(conn: &Connection) -> Result<Option<SnapshotMeta>> {
    conn.query_row(
        "SELECT snapshot_id, content_hash, synced_at, company_count
         FROM snapshots ORDER BY id DESC LIMIT 1",
        [],
        |row| {
            let synced_at: String = row.get(2)?;
            let company_count: i64 = row.get(3)?;
            Ok(SnapshotMeta {
                snapshot_id: row.get(0)?,
                content_hash: row.get(1)?,
                synced_at: parse_timestamp(&synced_at)?,
                company_count: company_count.max(0) as usize,
            })
        },
    )
    .optional()
    .context("Failed to read snapshot metadata")
}

/// Most recent cached snapshot, if any.
pub fn latest_snapshot(conn: &Connection) -> Result<Option<Snapshot>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT snapshot_id, payload FROM snapshots ORDER BY id DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((snapshot_id, payload)) = row else {
        return Ok(None);
    };

    let meta = latest_meta(conn)?
        .with_context(|| format!("Snapshot {} disappeared while reading", snapshot_id))?;
    let companies: Vec<Company> =
        serde_json::from_str(&payload).context("Failed to deserialize cached companies")?;

    Ok(Some(Snapshot { meta, companies }))
}

pub fn snapshot_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM snapshots", [], |row| row.get(0))?;
    Ok(count)
}

pub fn insert_event(conn: &Connection, event: &SyncEvent) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO sync_events (event_id, timestamp, event_type, snapshot_id, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.snapshot_id,
            data_json,
        ],
    )?;

    Ok(())
}

/// Newest first
pub fn recent_events(conn: &Connection, limit: usize) -> Result<Vec<SyncEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, snapshot_id, data
         FROM sync_events
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let events = stmt
        .query_map(params![limit as i64], |row| {
            let timestamp: String = row.get(1)?;
            let data_json: String = row.get(4)?;

            Ok(SyncEvent {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(&timestamp)?,
                event_type: row.get(2)?,
                snapshot_id: row.get(3)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
                })?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))
}

// ============================================================================
// TESTS
// ============================================================================
