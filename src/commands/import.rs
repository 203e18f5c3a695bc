use std::path::Path;

use anyhow::{Context as _, Result, bail};
use chrono::{DateTime, Datelike, Utc};
use tracing::info;

use crate::cli::ImportArgs;
use crate::commands::Context;
use crate::config::UnitConfig;
use crate::engine::values::parse_calendar_date;
use crate::model::{DocumentRecord, ExtractedData};
use crate::util::{read_json, sha256_file};

const DOCUMENT_ID_LEN: usize = 16;

pub fn run(args: ImportArgs, ctx: &Context) -> Result<()> {
    let extracted: ExtractedData = read_json(&args.extraction_path)?;
    let digest = sha256_file(&args.extraction_path)?;
    let document_id = digest[..DOCUMENT_ID_LEN].to_string();

    let mut documents = ctx.store.load_documents()?;
    if documents.iter().any(|document| document.id == document_id) {
        bail!(
            "{} was already imported as document {document_id}",
            args.extraction_path.display()
        );
    }

    let file_name = match args.file_name {
        Some(name) => name,
        None => file_name_of(&args.extraction_path)?,
    };
    let uploaded_at = args.uploaded_at.unwrap_or_else(Utc::now);
    let document = build_document(
        document_id,
        file_name,
        uploaded_at,
        extracted,
        &ctx.config.units,
    );

    info!(
        id = %document.id,
        title = %document.data.title,
        unit = %document.data.center,
        headers = document.data.table_headers.len(),
        rows = document.data.table_rows.len(),
        "imported document"
    );

    documents.insert(0, document);
    ctx.store.save_documents(&documents)?;

    Ok(())
}

fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))
}

pub fn build_document(
    id: String,
    file_name: String,
    upload_date: DateTime<Utc>,
    mut data: ExtractedData,
    units: &UnitConfig,
) -> DocumentRecord {
    if let Some(title) = report_title(&data, units) {
        data.title = title;
    }

    DocumentRecord {
        id,
        file_name,
        upload_date,
        data,
    }
}

/// `"<unit> - YYYY/MM"` from the document date, if that date parses.
fn report_title(data: &ExtractedData, units: &UnitConfig) -> Option<String> {
    let date = parse_calendar_date(&data.date)?;
    let unit = if units.is_unassigned(&data.center) {
        units.unknown_title.as_str()
    } else {
        data.center.as_str()
    };
    Some(format!("{unit} - {}/{:02}", date.year(), date.month()))
}
