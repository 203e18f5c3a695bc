use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{info, warn};

use crate::commands::Context;

pub fn run(ctx: &Context) -> Result<()> {
    info!(store = %ctx.store_path.display(), "status requested");

    let documents = ctx.store.load_documents()?;
    let targets = ctx.store.load_targets()?;

    if documents.is_empty() {
        warn!(path = %ctx.store_path.display(), "store holds no documents");
    }

    let rows = documents
        .iter()
        .map(|document| document.data.table_rows.len())
        .sum::<usize>();
    let units = documents
        .iter()
        .map(|document| document.unit())
        .filter(|unit| !unit.is_empty())
        .collect::<BTreeSet<&str>>();
    let years = targets.keys().cloned().collect::<Vec<String>>();
    let newest = documents.iter().map(|document| document.upload_date).max();
    let last_updated = ctx.store.last_updated()?;

    info!(
        documents = documents.len(),
        rows,
        units = %units.into_iter().collect::<Vec<&str>>().join(", "),
        target_years = %years.join(", "),
        newest_upload = %newest.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
        last_updated = %last_updated.map(|ts| ts.to_rfc3339()).unwrap_or_default(),
        "store status"
    );

    Ok(())
}
