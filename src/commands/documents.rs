use std::io::{self, Write};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cli::DocumentsArgs;
use crate::commands::Context;
use crate::model::DocumentRecord;
use crate::util::write_json_stdout;

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub unit: Option<String>,
    pub category: Option<String>,
    pub query: String,
}

impl DocumentFilter {
    /// Free text searches title, summary, unit and every table cell.
    pub fn matches(&self, document: &DocumentRecord) -> bool {
        let data = &document.data;
        let needle = self.query.to_lowercase();

        let matches_text = needle.is_empty()
            || data.title.to_lowercase().contains(&needle)
            || data.summary.to_lowercase().contains(&needle)
            || data.center.to_lowercase().contains(&needle)
            || data.table_rows.iter().any(|row| {
                row.values
                    .iter()
                    .any(|value| value.to_lowercase().contains(&needle))
            });
        let matches_category = self
            .category
            .as_deref()
            .is_none_or(|category| data.category == category);
        let matches_unit = self
            .unit
            .as_deref()
            .is_none_or(|unit| data.center == unit);

        matches_text && matches_category && matches_unit
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentListing<'a> {
    id: &'a str,
    file_name: &'a str,
    upload_date: DateTime<Utc>,
    title: &'a str,
    unit: &'a str,
    category: &'a str,
    date: &'a str,
    rows: usize,
}

impl<'a> DocumentListing<'a> {
    fn new(document: &'a DocumentRecord) -> Self {
        Self {
            id: &document.id,
            file_name: &document.file_name,
            upload_date: document.upload_date,
            title: &document.data.title,
            unit: &document.data.center,
            category: &document.data.category,
            date: &document.data.date,
            rows: document.data.table_rows.len(),
        }
    }
}

pub fn run(args: DocumentsArgs, ctx: &Context) -> Result<()> {
    let documents = ctx.store.load_documents()?;
    let filter = DocumentFilter {
        unit: args.unit,
        category: args.category,
        query: args.query,
    };

    let listings = documents
        .iter()
        .filter(|document| filter.matches(document))
        .map(DocumentListing::new)
        .collect::<Vec<DocumentListing<'_>>>();

    info!(
        total = documents.len(),
        returned = listings.len(),
        "listed documents"
    );

    if args.json {
        return write_json_stdout(&listings);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Documents: {} of {}", listings.len(), documents.len())?;
    for listing in &listings {
        writeln!(
            output,
            "{} | {} | {} | {} | uploaded={} rows={}",
            listing.id,
            listing.title,
            listing.unit,
            listing.category,
            listing.upload_date.format("%Y-%m-%d %H:%M"),
            listing.rows,
        )?;
    }
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::document;

    #[test]
    fn query_reaches_summary_and_table_cells() {
        let mut doc = document("A", "Most", 1, &["Ulice"], &[&["Nádražní"]]);
        doc.data.summary = "Kamerová prohlídka kanalizace".to_string();

        let by_summary = DocumentFilter {
            query: "KANALIZACE".to_string(),
            ..DocumentFilter::default()
        };
        assert!(by_summary.matches(&doc));

        let by_cell = DocumentFilter {
            query: "nádraž".to_string(),
            ..DocumentFilter::default()
        };
        assert!(by_cell.matches(&doc));

        let miss = DocumentFilter {
            query: "teplice".to_string(),
            ..DocumentFilter::default()
        };
        assert!(!miss.matches(&doc));
    }

    #[test]
    fn unit_and_category_must_match_exactly() {
        let doc = document("A", "Most", 1, &["Ulice"], &[]);

        let filter = DocumentFilter {
            unit: Some("Most".to_string()),
            category: Some("Inspection".to_string()),
            ..DocumentFilter::default()
        };
        assert!(filter.matches(&doc));

        let filter = DocumentFilter {
            category: Some("Faktura".to_string()),
            ..DocumentFilter::default()
        };
        assert!(!filter.matches(&doc));
    }
}
