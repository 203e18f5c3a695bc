pub mod delete;
pub mod documents;
pub mod import;
pub mod mark;
pub mod rows;
pub mod stats;
pub mod status;
pub mod targets;

use std::path::PathBuf;

use anyhow::Result;
use tracing::debug;

use crate::config::{RollupConfig, resolve_config};
use crate::store::Store;

/// Resolved configuration plus the opened store, shared by every command.
pub struct Context {
    pub config: RollupConfig,
    pub store_path: PathBuf,
    pub store: Store,
}

impl Context {
    pub fn open(config_path: Option<PathBuf>, store_path: Option<PathBuf>) -> Result<Self> {
        let config = resolve_config(config_path.as_deref())?;
        let store_path = store_path.unwrap_or_else(|| config.store.path.clone());
        let store = Store::open(&store_path)?;

        debug!(store = %store_path.display(), "opened store");

        Ok(Self {
            config,
            store_path,
            store,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;

    use super::Context;
    use crate::config::RollupConfig;
    use crate::model::DocumentRecord;
    use crate::store::Store;

    static FIXTURE_COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// Context over an in-memory store seeded with `documents`.
    pub fn context(documents: &[DocumentRecord]) -> Context {
        let store = Store::open_in_memory().expect("in-memory store should open");
        if !documents.is_empty() {
            store.save_documents(documents).expect("seed documents");
        }
        Context {
            config: RollupConfig::default(),
            store_path: PathBuf::from(":memory:"),
            store,
        }
    }

    /// Writes `content` to a fresh file under the system temp directory.
    pub fn temp_file(name: &str, content: &str) -> PathBuf {
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let dir = std::env::temp_dir().join(format!(
            "rollup_{}_{}_{}",
            std::process::id(),
            FIXTURE_COUNTER.fetch_add(1, Ordering::Relaxed),
            stamp
        ));
        fs::create_dir_all(&dir).expect("fixture directory");
        let path = dir.join(name);
        fs::write(&path, content).expect("fixture file");
        path
    }
}
