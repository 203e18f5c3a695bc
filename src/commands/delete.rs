use anyhow::{Result, bail};
use tracing::info;

use crate::cli::DeleteArgs;
use crate::commands::Context;

pub fn run(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let mut documents = ctx.store.load_documents()?;
    let Some(position) = documents
        .iter()
        .position(|document| document.id == args.document_id)
    else {
        bail!("unknown document id: {}", args.document_id);
    };

    let removed = documents.remove(position);
    ctx.store.save_documents(&documents)?;

    info!(
        id = %removed.id,
        title = %removed.data.title,
        rows = removed.data.table_rows.len(),
        remaining = documents.len(),
        "deleted document"
    );

    Ok(())
}
