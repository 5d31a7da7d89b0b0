// 🗄️ State Store - Everything that must survive between workflow steps
// Supplier configuration documents (holding the ledger), extraction snapshots,
// and an append-only audit log of recorded manual changes.

use crate::article::ArticleRecord;
use crate::ledger::{ManualChangeLedger, LEDGER_CONFIG_KEY};
use crate::reconciliation::LedgerChange;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Role of a stored extraction snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotKind {
    /// Written by a conversion, not yet confirmed as imported
    Pending,
    /// Confirmed import; the `previous` input of the next reconciliation
    Previous,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Pending => "pending",
            SnapshotKind::Previous => "previous",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub supplier: String,
    pub kind: SnapshotKind,
    pub taken_at: DateTime<Utc>,
    pub articles: Vec<ArticleRecord>,
}

// ============================================================================
// EVENTS
// ============================================================================

/// Event for audit trail
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }

    /// Audit event for an override written to the ledger
    pub fn manual_change_recorded(supplier: &str, change: &LedgerChange) -> Self {
        Event::new(
            "manual_change_recorded",
            "article",
            &format!("{}/{}", supplier, change.key),
            serde_json::json!({
                "attribute": change.attribute,
                "replaced": change.replaced,
                "manual": change.manual,
                "name": change.name,
            }),
            "reconciler",
        )
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Open (or create) the state database
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open state database: {:?}", path))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Supplier configuration documents (key-value JSON)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS config_documents (
            supplier TEXT PRIMARY KEY,
            document TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Extraction snapshots (one pending, one previous per supplier)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            supplier TEXT NOT NULL,
            kind TEXT NOT NULL,
            taken_at TEXT NOT NULL,
            articles TEXT NOT NULL,
            PRIMARY KEY (supplier, kind)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// CONFIGURATION DOCUMENTS + LEDGER
// ============================================================================

/// Load a supplier's configuration document (empty object if none yet)
pub fn load_config_document(conn: &Connection, supplier: &str) -> Result<serde_json::Value> {
    let document: Option<String> = conn
        .query_row(
            "SELECT document FROM config_documents WHERE supplier = ?1",
            params![supplier],
            |row| row.get(0),
        )
        .optional()?;

    match document {
        Some(json) => serde_json::from_str(&json)
            .with_context(|| format!("Corrupt configuration document for {}", supplier)),
        None => Ok(serde_json::json!({})),
    }
}

pub fn save_config_document(
    conn: &Connection,
    supplier: &str,
    document: &serde_json::Value,
) -> Result<()> {
    if !document.is_object() {
        bail!("Configuration document for {} must be a JSON object", supplier);
    }

    conn.execute(
        "INSERT INTO config_documents (supplier, document, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(supplier) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at",
        params![supplier, serde_json::to_string(document)?, Utc::now().to_rfc3339()],
    )?;

    Ok(())
}

/// Load the manual change ledger (empty if never written)
pub fn load_ledger(conn: &Connection, supplier: &str) -> Result<ManualChangeLedger> {
    let document = load_config_document(conn, supplier)?;

    match document.get(LEDGER_CONFIG_KEY) {
        Some(value) => ManualChangeLedger::from_value(value.clone())
            .with_context(|| format!("Corrupt manual change ledger for {}", supplier)),
        None => Ok(ManualChangeLedger::new()),
    }
}

/// Store the ledger, preserving every other key of the document
pub fn save_ledger(conn: &Connection, supplier: &str, ledger: &ManualChangeLedger) -> Result<()> {
    let mut document = load_config_document(conn, supplier)?;

    if let Some(map) = document.as_object_mut() {
        map.insert(LEDGER_CONFIG_KEY.to_string(), ledger.to_value()?);
    }

    save_config_document(conn, supplier, &document)
}

// ============================================================================
// SNAPSHOTS
// ============================================================================

pub fn save_snapshot(
    conn: &Connection,
    supplier: &str,
    kind: SnapshotKind,
    articles: &[ArticleRecord],
) -> Result<()> {
    let articles_json = serde_json::to_string(articles)?;

    conn.execute(
        "INSERT OR REPLACE INTO snapshots (supplier, kind, taken_at, articles) VALUES (?1, ?2, ?3, ?4)",
        params![supplier, kind.as_str(), Utc::now().to_rfc3339(), articles_json],
    )?;

    Ok(())
}

pub fn load_snapshot(conn: &Connection, supplier: &str, kind: SnapshotKind) -> Result<Option<Snapshot>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT taken_at, articles FROM snapshots WHERE supplier = ?1 AND kind = ?2",
            params![supplier, kind.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (taken_at, articles_json) = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let taken_at = DateTime::parse_from_rfc3339(&taken_at)
        .context("Corrupt snapshot timestamp")?
        .with_timezone(&Utc);
    let articles: Vec<ArticleRecord> =
        serde_json::from_str(&articles_json).context("Corrupt snapshot articles")?;

    Ok(Some(Snapshot {
        supplier: supplier.to_string(),
        kind,
        taken_at,
        articles,
    }))
}

/// Promote the pending snapshot to `previous` ("mark as imported")
///
/// Returns the number of articles promoted; errors if nothing is pending.
pub fn promote_pending_snapshot(conn: &Connection, supplier: &str) -> Result<usize> {
    let pending = match load_snapshot(conn, supplier, SnapshotKind::Pending)? {
        Some(snapshot) => snapshot,
        None => bail!("No pending conversion for supplier {}", supplier),
    };

    let tx = conn.unchecked_transaction()?;
    save_snapshot(&tx, supplier, SnapshotKind::Previous, &pending.articles)?;
    tx.execute(
        "DELETE FROM snapshots WHERE supplier = ?1 AND kind = ?2",
        params![supplier, SnapshotKind::Pending.as_str()],
    )?;
    tx.commit()?;

    Ok(pending.articles.len())
}

// ============================================================================
// EVENTS
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Most recent events, newest first
///
/// With `entity_prefix` only entities whose id starts with it are returned
/// (e.g. `"hof-sonnig/"` for one supplier); the limit applies after filtering.
pub fn get_recent_events(
    conn: &Connection,
    entity_prefix: Option<&str>,
    limit: usize,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE ?1 IS NULL OR substr(entity_id, 1, length(?1)) = ?1
         ORDER BY timestamp DESC, id DESC
         LIMIT ?2",
    )?;

    let events = stmt
        .query_map(params![entity_prefix, limit as i64], row_to_event)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<Event> {
    let timestamp_str: String = row.get(1)?;
    let data_json: String = row.get(5)?;

    Ok(Event {
        event_id: row.get(0)?,
        timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?
            .with_timezone(&Utc),
        event_type: row.get(2)?,
        entity_type: row.get(3)?,
        entity_id: row.get(4)?,
        data: serde_json::from_str(&data_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?,
        actor: row.get(6)?,
    })
}
