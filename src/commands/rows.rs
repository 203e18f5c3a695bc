use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::cli::RowsArgs;
use crate::commands::Context;
use crate::engine::filter::FilterState;
use crate::engine::materialize::MaterializedRow;
use crate::engine::query_rows;
use crate::util::write_json_stdout;

#[derive(Debug, Serialize)]
struct RowsResponse<'a> {
    filter: &'a FilterState,
    returned: usize,
    rows: &'a [MaterializedRow<'a>],
}

pub fn run(args: RowsArgs, ctx: &Context) -> Result<()> {
    let documents = ctx.store.load_documents()?;
    let filter = args.filter.to_state();
    let rows = query_rows(&documents, &filter, &ctx.config);

    info!(
        documents = documents.len(),
        returned = rows.len(),
        dedupe = filter.dedupe,
        "row query complete"
    );

    if args.json {
        return write_json_stdout(&RowsResponse {
            filter: &filter,
            returned: rows.len(),
            rows: &rows,
        });
    }

    write_text_response(&rows)
}

fn write_text_response(rows: &[MaterializedRow<'_>]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Rows: {}", rows.len())?;
    for row in rows {
        writeln!(
            output,
            "{} | {} | {}{} | {}",
            row.id,
            row.unit,
            row.status.as_str(),
            if row.requires_fix { " +fix" } else { "" },
            row.values.join(" | "),
        )?;
    }
    output.flush()?;
    Ok(())
}
