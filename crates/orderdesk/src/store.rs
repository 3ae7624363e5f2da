use rusqlite::{params, params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from the resolution store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Which identifier column a resolution lookup is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdType {
    #[serde(rename = "IH_NUMBER")]
    IhNumber,
    #[serde(rename = "CUSTOMER_ORDER_ID")]
    CustomerOrderId,
}

impl IdType {
    fn column(&self) -> &'static str {
        match self {
            IdType::IhNumber => "ih_number",
            IdType::CustomerOrderId => "customer_order_id",
        }
    }
}

/// One row of the order_resolution table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    pub ih_number: String,
    pub order_id: String,
    pub customer_order_id: String,
    pub integration_id: String,
    pub transaction_id: String,
    pub submitted_date: String,
    pub src_system: String,
    pub root_cause_analysis: String,
    pub action_taken: String,
    pub status: String,
}

/// One row of the SOP reference table: error code to root cause to next
/// action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopEntry {
    pub error_code: String,
    pub error_description: String,
    pub root_cause: String,
    pub next_action: String,
}

impl SopEntry {
    pub const HEADER: &'static str = "error_code|error_description|root_cause|next_action";

    pub fn to_row(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.error_code, self.error_description, self.root_cause, self.next_action
        )
    }
}

/// SQLite-backed store for order resolutions and the SOP table.
///
/// Each operation opens its own scoped connection and releases it on
/// drop, success or failure. Fine at support-desk volume; a pool would
/// be the next step if this ever sees real load.
pub struct OrderStore {
    path: PathBuf,
}

impl OrderStore {
    /// Open or create the store at the given path, running migrations.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS order_resolution (
                ih_number TEXT NOT NULL,
                order_id TEXT NOT NULL,
                customer_order_id TEXT NOT NULL,
                integration_id TEXT NOT NULL,
                transaction_id TEXT NOT NULL,
                submitted_date TEXT NOT NULL,
                src_system TEXT NOT NULL,
                root_cause_analysis TEXT NOT NULL,
                action_taken TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'OPEN'
            );

            CREATE TABLE IF NOT EXISTS sop (
                error_code TEXT PRIMARY KEY,
                error_description TEXT NOT NULL,
                root_cause TEXT NOT NULL,
                next_action TEXT NOT NULL
            );",
        )?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.path)?)
    }

    /// Look up resolution rows by identifier. The `IN` list is bound as
    /// repeated placeholders; caller-supplied identifiers never reach
    /// the SQL text.
    pub fn resolutions(
        &self,
        id_type: IdType,
        ids: &[String],
    ) -> Result<Vec<ResolutionRecord>, StoreError> {
        debug!(column = id_type.column(), count = ids.len(), "resolution lookup");
        let conn = self.connect()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT ih_number, order_id, customer_order_id, integration_id, transaction_id,
                    submitted_date, src_system, root_cause_analysis, action_taken, status
             FROM order_resolution WHERE {} IN ({})",
            id_type.column(),
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(ids.iter()), |row| {
            Ok(ResolutionRecord {
                ih_number: row.get(0)?,
                order_id: row.get(1)?,
                customer_order_id: row.get(2)?,
                integration_id: row.get(3)?,
                transaction_id: row.get(4)?,
                submitted_date: row.get(5)?,
                src_system: row.get(6)?,
                root_cause_analysis: row.get(7)?,
                action_taken: row.get(8)?,
                status: row.get(9)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Insert a resolution row with status OPEN.
    pub fn insert_resolution(&self, record: &ResolutionRecord) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO order_resolution (
                ih_number, order_id, customer_order_id, integration_id, transaction_id,
                submitted_date, src_system, root_cause_analysis, action_taken, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.ih_number,
                record.order_id,
                record.customer_order_id,
                record.integration_id,
                record.transaction_id,
                record.submitted_date,
                record.src_system,
                record.root_cause_analysis,
                record.action_taken,
                record.status,
            ],
        )?;
        Ok(())
    }

    /// Update the status of the resolution rows for one customer order.
    /// Returns whether any row matched, so callers can report the real
    /// outcome instead of assuming success.
    pub fn set_status(&self, customer_order_id: &str, status: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE order_resolution SET status = ?1 WHERE customer_order_id = ?2",
            params![status, customer_order_id],
        )?;
        debug!(customer_order_id, status, changed, "status update");
        Ok(changed > 0)
    }

    /// Full SOP table dump.
    pub fn sop_entries(&self) -> Result<Vec<SopEntry>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT error_code, error_description, root_cause, next_action FROM sop ORDER BY error_code",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SopEntry {
                error_code: row.get(0)?,
                error_description: row.get(1)?,
                root_cause: row.get(2)?,
                next_action: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Insert or replace one SOP entry.
    pub fn upsert_sop(&self, entry: &SopEntry) -> Result<(), StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO sop (error_code, error_description, root_cause, next_action)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(error_code) DO UPDATE SET
                error_description = excluded.error_description,
                root_cause = excluded.root_cause,
                next_action = excluded.next_action",
            params![
                entry.error_code,
                entry.error_description,
                entry.root_cause,
                entry.next_action,
            ],
        )?;
        Ok(())
    }
}
