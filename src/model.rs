use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow state of a single table row. `New` is the implicit default and is
/// never written out; a row without a stored status reads back as `New`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    #[default]
    New,
    Uploaded,
    #[serde(alias = "REVISION")]
    NeedsFix,
    Unusable,
}

impl RowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Uploaded => "uploaded",
            Self::NeedsFix => "needs-fix",
            Self::Unusable => "unusable",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RowStatus>,
    #[serde(default, alias = "requiresGisFix", skip_serializing_if = "is_false")]
    pub requires_fix: bool,
}

impl TableRow {
    pub fn status(&self) -> RowStatus {
        self.status.unwrap_or_default()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Structured output of the external extraction call, one table per document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub center: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub table_headers: Vec<String>,
    #[serde(default)]
    pub table_rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default)]
    pub file_name: String,
    pub upload_date: DateTime<Utc>,
    pub data: ExtractedData,
}

impl DocumentRecord {
    pub fn unit(&self) -> &str {
        &self.data.center
    }
}

/// Year -> unit -> annual planned quantity (meters).
pub type TargetMap = BTreeMap<String, BTreeMap<String, f64>>;
