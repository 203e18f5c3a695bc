use std::io::{self, Write};

use anyhow::Result;
use chrono::{Datelike, Utc};
use tracing::info;

use crate::cli::StatsArgs;
use crate::commands::Context;
use crate::engine::aggregate::{StatisticsSummary, TargetBand};
use crate::engine::query_statistics;
use crate::util::write_json_stdout;

pub fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let documents = ctx.store.load_documents()?;
    let targets = ctx.store.load_targets()?;
    let filter = args.filter.to_state();
    let reference_year = args.reference_year.unwrap_or_else(|| Utc::now().year());

    let summary = query_statistics(&documents, &targets, &filter, reference_year, &ctx.config);

    info!(
        rows = summary.totals.rows,
        units = summary.units.len(),
        actual = summary.totals.actual,
        plan = summary.totals.plan,
        "statistics computed"
    );

    if args.json {
        return write_json_stdout(&summary);
    }

    write_text_response(&summary)
}

fn write_text_response(summary: &StatisticsSummary) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Period: year={} month={}",
        summary.year.as_deref().unwrap_or("all"),
        summary
            .month
            .map(|month| month.to_string())
            .unwrap_or_else(|| "all".to_string()),
    )?;
    let totals = &summary.totals;
    writeln!(
        output,
        "Totals: rows={} length={:.1} actual={:.1} plan={:.1} completion={:.0}% uploaded={} needs_fix={} unusable={} requires_fix={}",
        totals.rows,
        totals.total_length,
        totals.actual,
        totals.plan,
        totals.percentage,
        totals.counts.uploaded,
        totals.counts.needs_fix,
        totals.counts.unusable,
        totals.counts.requires_fix,
    )?;

    writeln!(output, "Units: {}", summary.units.len())?;
    for unit in &summary.units {
        writeln!(
            output,
            "  {}: actual={:.1} plan={:.1} completion={:.0}% rows={} uploaded={} ({:.0}%) requires_fix={} ({:.1}%)",
            unit.unit,
            unit.actual,
            unit.plan,
            unit.percentage,
            unit.counts.total,
            unit.counts.uploaded,
            unit.uploaded_percentage,
            unit.counts.requires_fix,
            unit.requires_fix_percentage,
        )?;
    }

    if let Some(monthly) = &summary.monthly {
        writeln!(output, "Monthly:")?;
        for row in monthly {
            let cells = row
                .months
                .iter()
                .map(|cell| format!("{:.0}{}", cell.value, band_marker(cell.band)))
                .collect::<Vec<String>>()
                .join(" ");
            writeln!(
                output,
                "  {}: {} | total={:.1} target/month={:.1}",
                row.unit, cells, row.total, row.monthly_target
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

fn band_marker(band: TargetBand) -> &'static str {
    match band {
        TargetBand::Met => "+",
        TargetBand::Near => "~",
        TargetBand::Below => "-",
        TargetBand::Untracked => "",
    }
}
