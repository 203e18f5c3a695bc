use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{DocumentRecord, TargetMap};
use crate::util::ensure_directory;

const DOCUMENTS_KEY: &str = "documents";
const TARGETS_KEY: &str = "targets";

/// Opaque key/value blob store backing the document and target snapshots.
pub struct Store {
    connection: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }
        let connection = Connection::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory store")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn load_documents(&self) -> Result<Vec<DocumentRecord>> {
        Ok(self.load_blob(DOCUMENTS_KEY)?.unwrap_or_default())
    }

    pub fn save_documents(&self, documents: &[DocumentRecord]) -> Result<()> {
        self.save_blob(DOCUMENTS_KEY, documents)
    }

    pub fn load_targets(&self) -> Result<TargetMap> {
        Ok(self.load_blob(TARGETS_KEY)?.unwrap_or_default())
    }

    pub fn save_targets(&self, targets: &TargetMap) -> Result<()> {
        self.save_blob(TARGETS_KEY, targets)
    }

    pub fn last_updated(&self) -> Result<Option<DateTime<Utc>>> {
        self.connection
            .query_row("SELECT MAX(updated_at) FROM blobs", [], |row| row.get(0))
            .context("failed to read last store update")
    }

    fn load_blob<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let raw: Option<String> = self
            .connection
            .query_row("SELECT value FROM blobs WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read blob '{key}'"))?;

        raw.map(|value| {
            serde_json::from_str(&value).with_context(|| format!("failed to parse blob '{key}'"))
        })
        .transpose()
    }

    fn save_blob<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string(value)
            .with_context(|| format!("failed to serialize blob '{key}'"))?;
        self.connection
            .execute(
                "INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, data, Utc::now()],
            )
            .with_context(|| format!("failed to write blob '{key}'"))?;
        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS blobs (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create store schema")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{document, targets};
    use crate::model::RowStatus;

    #[test]
    fn empty_store_loads_empty_collections() {
        let store = Store::open_in_memory().expect("in-memory store should open");
        assert!(store.load_documents().expect("documents load").is_empty());
        assert!(store.load_targets().expect("targets load").is_empty());
        assert!(store.last_updated().expect("last update query").is_none());
    }

    #[test]
    fn saved_snapshots_load_back_unchanged() {
        let store = Store::open_in_memory().expect("in-memory store should open");
        let mut doc = document("A", "Most", 1, &["Datum", "Délka"], &[&["2023-05-01", "14,5"]]);
        doc.data.table_rows[0].status = Some(RowStatus::NeedsFix);
        doc.data.table_rows[0].requires_fix = true;
        let docs = vec![doc];
        let map = targets(&[("2023", "Most", 12000.0)]);

        store.save_documents(&docs).expect("documents save");
        store.save_targets(&map).expect("targets save");

        assert_eq!(store.load_documents().expect("documents load"), docs);
        assert_eq!(store.load_targets().expect("targets load"), map);
        assert!(store.last_updated().expect("last update query").is_some());
    }

    #[test]
    fn saving_again_replaces_the_blob() {
        let store = Store::open_in_memory().expect("in-memory store should open");
        let docs = vec![document("A", "Most", 1, &["Datum"], &[&["2023-05-01"]])];
        store.save_documents(&docs).expect("first save");
        store.save_documents(&[]).expect("second save");
        assert!(store.load_documents().expect("documents load").is_empty());
    }

    #[test]
    fn legacy_status_names_are_accepted() {
        let store = Store::open_in_memory().expect("in-memory store should open");
        let raw = r#"[{
            "id": "legacy",
            "fileName": "legacy.pdf",
            "uploadDate": "2023-11-02T09:15:00.000Z",
            "data": {
                "title": "Most - 2023/10",
                "center": "Most",
                "tableHeaders": ["Datum"],
                "tableRows": [{"values": ["2023-10-01"], "status": "REVISION", "requiresGisFix": true}]
            }
        }]"#;
        store
            .connection
            .execute(
                "INSERT INTO blobs (key, value, updated_at) VALUES ('documents', ?1, ?2)",
                params![raw, Utc::now()],
            )
            .expect("raw insert");

        let docs = store.load_documents().expect("legacy documents load");
        let row = &docs[0].data.table_rows[0];
        assert_eq!(row.status(), RowStatus::NeedsFix);
        assert!(row.requires_fix);
    }
}
