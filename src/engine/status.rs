use serde::{Deserialize, Serialize};

use crate::model::{DocumentRecord, RowStatus, TableRow};

/// Address of one stored row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRef {
    pub document_id: String,
    pub row_index: usize,
}

impl RowRef {
    pub fn new(document_id: impl Into<String>, row_index: usize) -> Self {
        Self {
            document_id: document_id.into(),
            row_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowCommand {
    SetStatus { row: RowRef, status: RowStatus },
    BulkSetStatus { rows: Vec<RowRef>, status: RowStatus },
    ToggleFix { row: RowRef },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutcome {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies a row command to a document snapshot and hands back the updated
/// snapshot. References to missing documents or rows are skipped, never fatal.
pub fn apply(
    mut documents: Vec<DocumentRecord>,
    command: &RowCommand,
) -> (Vec<DocumentRecord>, CommandOutcome) {
    let mut outcome = CommandOutcome::default();

    match command {
        RowCommand::SetStatus { row, status } => {
            record(&mut outcome, write_status(&mut documents, row, *status));
        }
        RowCommand::BulkSetStatus { rows, status } => {
            for row in rows {
                record(&mut outcome, write_status(&mut documents, row, *status));
            }
        }
        RowCommand::ToggleFix { row } => {
            let toggled = match find_row(&mut documents, row) {
                Some(stored) => {
                    stored.requires_fix = !stored.requires_fix;
                    true
                }
                None => false,
            };
            record(&mut outcome, toggled);
        }
    }

    (documents, outcome)
}

fn record(outcome: &mut CommandOutcome, applied: bool) {
    if applied {
        outcome.applied += 1;
    } else {
        outcome.skipped += 1;
    }
}

fn write_status(documents: &mut [DocumentRecord], row: &RowRef, status: RowStatus) -> bool {
    let Some(stored) = find_row(documents, row) else {
        return false;
    };
    // NEW is the absence of a stored status.
    stored.status = (status != RowStatus::New).then_some(status);
    true
}

fn find_row<'a>(
    documents: &'a mut [DocumentRecord],
    row: &RowRef,
) -> Option<&'a mut TableRow> {
    documents
        .iter_mut()
        .find(|document| document.id == row.document_id)
        .and_then(|document| document.data.table_rows.get_mut(row.row_index))
}
