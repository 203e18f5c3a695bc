use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{BulkStatusArgs, SetStatusArgs, ToggleFixArgs};
use crate::commands::Context;
use crate::engine::status::{CommandOutcome, RowCommand, RowRef, apply};

pub fn set_status(args: SetStatusArgs, ctx: &Context) -> Result<()> {
    let row = RowRef::new(args.document_id, args.row_index);
    let command = RowCommand::SetStatus {
        row: row.clone(),
        status: args.status.into(),
    };
    let outcome = execute(ctx, &command)?;
    if outcome.applied == 0 {
        bail!("row {}:{} does not exist", row.document_id, row.row_index);
    }
    Ok(())
}

pub fn bulk_status(args: BulkStatusArgs, ctx: &Context) -> Result<()> {
    let command = RowCommand::BulkSetStatus {
        rows: args.items,
        status: args.status.into(),
    };
    let outcome = execute(ctx, &command)?;
    if outcome.skipped > 0 {
        warn!(skipped = outcome.skipped, "bulk status skipped missing rows");
    }
    Ok(())
}

pub fn toggle_fix(args: ToggleFixArgs, ctx: &Context) -> Result<()> {
    let row = RowRef::new(args.document_id, args.row_index);
    let command = RowCommand::ToggleFix { row: row.clone() };
    let outcome = execute(ctx, &command)?;
    if outcome.applied == 0 {
        bail!("row {}:{} does not exist", row.document_id, row.row_index);
    }
    Ok(())
}

/// Loads the snapshot, applies the command and saves only when a row changed.
fn execute(ctx: &Context, command: &RowCommand) -> Result<CommandOutcome> {
    let documents = ctx.store.load_documents()?;
    let (documents, outcome) = apply(documents, command);

    if outcome.applied > 0 {
        ctx.store.save_documents(&documents)?;
    }

    info!(
        applied = outcome.applied,
        skipped = outcome.skipped,
        "row command applied"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::StatusArg;
    use crate::commands::testing::context;
    use crate::engine::testing::document;
    use crate::model::{DocumentRecord, RowStatus};

    fn seeded() -> Context {
        context(&[document(
            "X",
            "Most",
            1,
            &["Datum", "Délka"],
            &[&["2023-05-01", "14,5"], &["2023-05-02", "3"]],
        )])
    }

    fn stored_rows(ctx: &Context) -> Vec<(RowStatus, bool)> {
        let documents: Vec<DocumentRecord> = ctx.store.load_documents().expect("documents load");
        documents[0]
            .data
            .table_rows
            .iter()
            .map(|row| (row.status(), row.requires_fix))
            .collect()
    }

    #[test]
    fn set_status_persists_the_new_status() {
        let ctx = seeded();
        let args = SetStatusArgs {
            document_id: "X".to_string(),
            row_index: 1,
            status: StatusArg::NeedsFix,
        };

        set_status(args, &ctx).expect("set-status should succeed");

        assert_eq!(
            stored_rows(&ctx),
            vec![(RowStatus::New, false), (RowStatus::NeedsFix, false)]
        );
    }

    #[test]
    fn single_row_commands_fail_on_missing_rows() {
        let ctx = seeded();
        let before = ctx.store.last_updated().expect("last update query");

        let err = set_status(
            SetStatusArgs {
                document_id: "X".to_string(),
                row_index: 5,
                status: StatusArg::Uploaded,
            },
            &ctx,
        )
        .expect_err("missing row should fail");
        assert!(err.to_string().contains("row X:5 does not exist"));

        let err = toggle_fix(
            ToggleFixArgs {
                document_id: "Y".to_string(),
                row_index: 0,
            },
            &ctx,
        )
        .expect_err("missing document should fail");
        assert!(err.to_string().contains("row Y:0 does not exist"));

        assert_eq!(ctx.store.last_updated().expect("last update query"), before);
    }

    #[test]
    fn toggle_fix_flips_the_flag_and_keeps_status() {
        let ctx = seeded();
        let args = ToggleFixArgs {
            document_id: "X".to_string(),
            row_index: 0,
        };

        toggle_fix(args.clone(), &ctx).expect("first toggle");
        assert_eq!(stored_rows(&ctx)[0], (RowStatus::New, true));

        toggle_fix(args, &ctx).expect("second toggle");
        assert_eq!(stored_rows(&ctx)[0], (RowStatus::New, false));
    }

    #[test]
    fn bulk_status_skips_missing_rows_without_failing() {
        let ctx = seeded();
        let args = BulkStatusArgs {
            status: StatusArg::Uploaded,
            items: vec![RowRef::new("X", 0), RowRef::new("X", 99)],
        };

        bulk_status(args, &ctx).expect("bulk-status should succeed");

        assert_eq!(
            stored_rows(&ctx),
            vec![(RowStatus::Uploaded, false), (RowStatus::New, false)]
        );
    }

    #[test]
    fn commands_that_change_nothing_are_not_saved() {
        let ctx = seeded();
        let before = ctx.store.last_updated().expect("last update query");
        let command = RowCommand::BulkSetStatus {
            rows: vec![RowRef::new("X", 7), RowRef::new("Z", 0)],
            status: RowStatus::Unusable,
        };

        let outcome = execute(&ctx, &command).expect("execute should succeed");

        assert_eq!(outcome, CommandOutcome { applied: 0, skipped: 2 });
        assert_eq!(ctx.store.last_updated().expect("last update query"), before);
    }
}
