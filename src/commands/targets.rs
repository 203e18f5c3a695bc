use std::io::{self, Write};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::TargetsCommand;
use crate::commands::Context;
use crate::model::TargetMap;
use crate::util::{read_json, write_json_stdout};

pub fn run(command: TargetsCommand, ctx: &Context) -> Result<()> {
    match command {
        TargetsCommand::Show { json } => show(ctx, json),
        TargetsCommand::Set { year, unit, value } => {
            let mut targets = ctx.store.load_targets()?;
            let amount = parse_target_value(&value);
            if amount == 0.0 && value.trim().parse::<f64>().is_err() {
                warn!(value = %value, "non-numeric target stored as 0");
            }
            set_target(&mut targets, &year, &unit, amount);
            ctx.store.save_targets(&targets)?;
            info!(year = %year, unit = %unit, target = amount, "target updated");
            Ok(())
        }
        TargetsCommand::Replace { path } => {
            let targets: TargetMap = read_json(&path)?;
            ctx.store.save_targets(&targets)?;
            info!(
                path = %path.display(),
                years = targets.len(),
                "target map replaced"
            );
            Ok(())
        }
    }
}

fn show(ctx: &Context, json: bool) -> Result<()> {
    let targets = ctx.store.load_targets()?;
    if json {
        return write_json_stdout(&targets);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    for (year, units) in &targets {
        writeln!(output, "{year}:")?;
        for (unit, target) in units {
            writeln!(output, "  {unit}: {target:.0}")?;
        }
    }
    output.flush()?;
    Ok(())
}

pub fn parse_target_value(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

pub fn set_target(targets: &mut TargetMap, year: &str, unit: &str, value: f64) {
    targets
        .entry(year.to_string())
        .or_default()
        .insert(unit.to_string(), value);
}
