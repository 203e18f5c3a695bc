use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::filter::FilterState;
use crate::engine::status::RowRef;
use crate::model::RowStatus;

const ALL_SELECTION: &str = "all";

#[derive(Parser, Debug)]
#[command(
    name = "rollup",
    version,
    about = "Deduplicate, filter and roll up extracted inspection tables"
)]
pub struct Cli {
    /// TOML config file; defaults to ./rollup.toml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides `store.path` from the config.
    #[arg(long, global = true)]
    pub store_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Import(ImportArgs),
    Delete(DeleteArgs),
    Documents(DocumentsArgs),
    Rows(RowsArgs),
    Stats(StatsArgs),
    SetStatus(SetStatusArgs),
    BulkStatus(BulkStatusArgs),
    ToggleFix(ToggleFixArgs),
    #[command(subcommand)]
    Targets(TargetsCommand),
    Status,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// JSON produced by the extraction service.
    pub extraction_path: PathBuf,

    /// Original file name to record; defaults to the extraction file name.
    #[arg(long)]
    pub file_name: Option<String>,

    /// RFC 3339 upload timestamp; defaults to now.
    #[arg(long)]
    pub uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    pub document_id: String,
}

#[derive(Args, Debug, Clone)]
pub struct DocumentsArgs {
    #[arg(long)]
    pub unit: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long, default_value = "")]
    pub query: String,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Unit to show; omit or pass `all` for every unit.
    #[arg(long)]
    pub unit: Option<String>,

    /// Four-digit year; omit or pass `all` for every year.
    #[arg(long)]
    pub year: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,

    #[arg(long, default_value = "")]
    pub query: String,

    #[arg(long, default_value_t = false)]
    pub no_dedupe: bool,
}

impl FilterArgs {
    pub fn to_state(&self) -> FilterState {
        FilterState {
            unit: selection(self.unit.as_deref()),
            year: selection(self.year.as_deref()),
            month: self.month,
            text: self.query.clone(),
            dedupe: !self.no_dedupe,
        }
    }
}

fn selection(value: Option<&str>) -> Option<String> {
    value
        .filter(|value| !value.eq_ignore_ascii_case(ALL_SELECTION))
        .map(ToOwned::to_owned)
}

#[derive(Args, Debug, Clone)]
pub struct RowsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Year for matrix targets when no year is selected; defaults to the current year.
    #[arg(long)]
    pub reference_year: Option<i32>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    New,
    Uploaded,
    NeedsFix,
    Unusable,
}

impl From<StatusArg> for RowStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::New => Self::New,
            StatusArg::Uploaded => Self::Uploaded,
            StatusArg::NeedsFix => Self::NeedsFix,
            StatusArg::Unusable => Self::Unusable,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SetStatusArgs {
    pub document_id: String,

    pub row_index: usize,

    #[arg(value_enum)]
    pub status: StatusArg,
}

#[derive(Args, Debug, Clone)]
pub struct BulkStatusArgs {
    #[arg(value_enum)]
    pub status: StatusArg,

    /// Row reference as `<document-id>:<row-index>`; repeatable.
    #[arg(long = "item", value_parser = parse_row_ref, required = true)]
    pub items: Vec<RowRef>,
}

#[derive(Args, Debug, Clone)]
pub struct ToggleFixArgs {
    pub document_id: String,

    pub row_index: usize,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TargetsCommand {
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Set {
        #[arg(long)]
        year: String,

        #[arg(long)]
        unit: String,

        /// Annual planned quantity; non-numeric input is stored as 0.
        value: String,
    },
    /// Replaces the whole target map with the JSON file's content.
    Replace { path: PathBuf },
}

fn parse_row_ref(raw: &str) -> Result<RowRef, String> {
    let (document_id, row_index) = raw
        .rsplit_once(':')
        .ok_or_else(|| format!("expected <document-id>:<row-index>, got '{raw}'"))?;
    if document_id.is_empty() {
        return Err(format!("missing document id in '{raw}'"));
    }
    let row_index = row_index
        .parse::<usize>()
        .map_err(|err| format!("invalid row index in '{raw}': {err}"))?;
    Ok(RowRef::new(document_id, row_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_refs_split_on_the_last_colon() {
        assert_eq!(parse_row_ref("X:0"), Ok(RowRef::new("X", 0)));
        assert_eq!(parse_row_ref("a:b:12"), Ok(RowRef::new("a:b", 12)));
        assert!(parse_row_ref("X").is_err());
        assert!(parse_row_ref(":3").is_err());
        assert!(parse_row_ref("X:-1").is_err());
    }

    #[test]
    fn filter_flags_map_to_state() {
        let cli = Cli::try_parse_from([
            "rollup", "rows", "--unit", "Most", "--year", "2023", "--month", "6", "--no-dedupe",
        ])
        .expect("rows flags should parse");

        let Commands::Rows(args) = cli.command else {
            panic!("expected rows command");
        };
        let state = args.filter.to_state();
        assert_eq!(state.unit.as_deref(), Some("Most"));
        assert_eq!(state.year.as_deref(), Some("2023"));
        assert_eq!(state.month, Some(6));
        assert!(!state.dedupe);
        assert!(state.text.is_empty());
    }

    #[test]
    fn all_selects_every_unit_and_year() {
        let cli = Cli::try_parse_from(["rollup", "stats", "--unit", "all", "--year", "ALL"])
            .expect("stats flags should parse");

        let Commands::Stats(args) = cli.command else {
            panic!("expected stats command");
        };
        let state = args.filter.to_state();
        assert!(state.unit.is_none());
        assert!(state.year.is_none());
    }

    #[test]
    fn month_outside_calendar_is_rejected() {
        let result = Cli::try_parse_from(["rollup", "stats", "--month", "13"]);
        assert!(result.is_err());
    }

    #[test]
    fn bulk_status_collects_items() {
        let cli = Cli::try_parse_from([
            "rollup",
            "bulk-status",
            "uploaded",
            "--item",
            "X:0",
            "--item",
            "X:99",
        ])
        .expect("bulk flags should parse");

        let Commands::BulkStatus(args) = cli.command else {
            panic!("expected bulk-status command");
        };
        assert_eq!(args.status, StatusArg::Uploaded);
        assert_eq!(args.items, vec![RowRef::new("X", 0), RowRef::new("X", 99)]);
    }
}
