use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config::ColumnVocabulary;
use crate::engine::columns::find_date_column;
use crate::model::{DocumentRecord, RowStatus, TableRow};

/// A stored row joined with its document context. Borrowed from the document
/// snapshot and rebuilt on every query; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedRow<'a> {
    pub id: String,
    pub document_id: &'a str,
    pub row_index: usize,
    pub unit: &'a str,
    pub title: &'a str,
    pub upload_date: DateTime<Utc>,
    pub values: &'a [String],
    pub filter_date: &'a str,
    pub status: RowStatus,
    pub requires_fix: bool,
    #[serde(skip)]
    pub document: &'a DocumentRecord,
}

impl<'a> MaterializedRow<'a> {
    fn new(
        document: &'a DocumentRecord,
        row_index: usize,
        row: &'a TableRow,
        filter_date: &'a str,
    ) -> Self {
        Self {
            id: row_identity(&document.id, row_index),
            document_id: &document.id,
            row_index,
            unit: document.unit(),
            title: &document.data.title,
            upload_date: document.upload_date,
            values: &row.values,
            filter_date,
            status: row.status(),
            requires_fix: row.requires_fix,
            document,
        }
    }
}

pub fn row_identity(document_id: &str, row_index: usize) -> String {
    format!("{document_id}-{row_index}")
}

/// Unit name followed by every trimmed, lower-cased cell, `|`-joined.
pub fn row_signature(unit: &str, values: &[String]) -> String {
    let mut parts = Vec::with_capacity(values.len() + 1);
    parts.push(unit.to_string());
    parts.extend(values.iter().map(|value| value.trim().to_lowercase()));
    parts.join("|")
}

/// Flattens documents newest first, rows in stored order. With `dedupe` on,
/// a row whose signature was already emitted is dropped, so the copy from the
/// most recently uploaded document survives.
pub fn materialize<'a>(
    documents: &'a [DocumentRecord],
    dedupe: bool,
    vocabulary: &ColumnVocabulary,
) -> Vec<MaterializedRow<'a>> {
    let mut ordered = documents.iter().collect::<Vec<&DocumentRecord>>();
    ordered.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));

    let mut seen = HashSet::<String>::new();
    let mut rows = Vec::new();
    let mut dropped = 0_usize;

    for document in ordered {
        let date_column = find_date_column(&document.data.table_headers, vocabulary);

        for (row_index, row) in document.data.table_rows.iter().enumerate() {
            if dedupe && !seen.insert(row_signature(document.unit(), &row.values)) {
                dropped += 1;
                continue;
            }

            let filter_date = date_column
                .and_then(|index| row.values.get(index))
                .map(String::as_str)
                .unwrap_or_default();
            rows.push(MaterializedRow::new(document, row_index, row, filter_date));
        }
    }

    debug!(
        documents = documents.len(),
        rows = rows.len(),
        duplicates_dropped = dropped,
        dedupe,
        "materialized rows"
    );

    rows
}
