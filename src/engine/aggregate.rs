use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::config::RollupConfig;
use crate::engine::columns::ColumnRoles;
use crate::engine::filter::FilterState;
use crate::engine::materialize::MaterializedRow;
use crate::engine::values::{parse_length, resolve_period};
use crate::model::{DocumentRecord, RowStatus, TargetMap};

const MONTHS: usize = 12;

/// Everything besides the rows that the statistics depend on.
#[derive(Debug, Clone, Copy)]
pub struct StatisticsRequest<'a> {
    pub targets: &'a TargetMap,
    pub filter: &'a FilterState,
    /// Year whose targets colour the monthly matrix when no year is selected.
    pub reference_year: i32,
    pub config: &'a RollupConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub new: usize,
    pub uploaded: usize,
    pub needs_fix: usize,
    pub unusable: usize,
    pub requires_fix: usize,
}

impl StatusCounts {
    fn add(&mut self, row: &MaterializedRow<'_>) {
        self.total += 1;
        match row.status {
            RowStatus::New => self.new += 1,
            RowStatus::Uploaded => self.uploaded += 1,
            RowStatus::NeedsFix => self.needs_fix += 1,
            RowStatus::Unusable => self.unusable += 1,
        }
        if row.requires_fix {
            self.requires_fix += 1;
        }
    }

    pub fn share(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStatistics {
    pub unit: String,
    pub actual: f64,
    pub plan: f64,
    pub percentage: f64,
    pub counts: StatusCounts,
    pub uploaded_percentage: f64,
    pub requires_fix_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetBand {
    Met,
    Near,
    Below,
    /// No target to compare against.
    Untracked,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthCell {
    pub month: u32,
    pub value: f64,
    pub band: TargetBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRow {
    pub unit: String,
    pub monthly_target: f64,
    pub months: Vec<MonthCell>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewTotals {
    pub rows: usize,
    pub total_length: f64,
    pub actual: f64,
    pub plan: f64,
    pub percentage: f64,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub year: Option<String>,
    pub month: Option<u32>,
    pub totals: ViewTotals,
    pub units: Vec<UnitStatistics>,
    /// Only produced when no month is selected.
    pub monthly: Option<Vec<MonthlyRow>>,
}

#[derive(Debug, Default)]
struct UnitAccumulator {
    months: [f64; MONTHS],
    counts: StatusCounts,
}

impl UnitAccumulator {
    fn actual(&self, month: Option<u32>) -> f64 {
        match month {
            Some(month) => month_slot(month).map(|slot| self.months[slot]).unwrap_or(0.0),
            None => self.months.iter().sum(),
        }
    }
}

fn month_slot(month: u32) -> Option<usize> {
    (1..=MONTHS as u32)
        .contains(&month)
        .then(|| month as usize - 1)
}

pub fn completion_percentage(actual: f64, plan: f64) -> f64 {
    if plan > 0.0 { actual / plan * 100.0 } else { 0.0 }
}

/// Annual target for the selected year, or the sum over all years; divided
/// by twelve when a single month is selected.
pub fn plan_for(targets: &TargetMap, unit: &str, year: Option<&str>, month: Option<u32>) -> f64 {
    let annual = match year {
        Some(year) => annual_target(targets, year, unit),
        None => targets
            .values()
            .filter_map(|units| units.get(unit))
            .sum(),
    };

    if month.is_some() {
        annual / MONTHS as f64
    } else {
        annual
    }
}

fn annual_target(targets: &TargetMap, year: &str, unit: &str) -> f64 {
    targets
        .get(year)
        .and_then(|units| units.get(unit))
        .copied()
        .unwrap_or(0.0)
}

pub fn target_band(value: f64, monthly_target: f64, near_ratio: f64) -> TargetBand {
    if monthly_target <= 0.0 {
        TargetBand::Untracked
    } else if value >= monthly_target {
        TargetBand::Met
    } else if value >= monthly_target * near_ratio {
        TargetBand::Near
    } else {
        TargetBand::Below
    }
}

/// Rolls the filtered rows up per unit and calendar month. `documents` is the
/// full snapshot; it only contributes the list of known units.
pub fn summarize(
    documents: &[DocumentRecord],
    rows: &[MaterializedRow<'_>],
    request: &StatisticsRequest<'_>,
) -> StatisticsSummary {
    let units_config = &request.config.units;
    let filter = request.filter;

    let mut accumulators = BTreeMap::<String, UnitAccumulator>::new();
    let known_units = request
        .targets
        .values()
        .flat_map(|units| units.keys().map(String::as_str))
        .chain(documents.iter().map(DocumentRecord::unit));
    for unit in known_units {
        if units_config.is_unassigned(unit) {
            continue;
        }
        if filter.unit.as_deref().is_some_and(|selected| selected != unit) {
            continue;
        }
        accumulators.entry(unit.to_string()).or_default();
    }

    let mut roles_by_document = HashMap::<&str, ColumnRoles>::new();
    let mut view_counts = StatusCounts::default();
    let mut total_length = 0.0;
    let mut undated = 0_usize;

    for row in rows {
        let roles = *roles_by_document.entry(row.document_id).or_insert_with(|| {
            ColumnRoles::classify(&row.document.data.table_headers, &request.config.columns)
        });

        view_counts.add(row);
        let length = roles
            .length
            .and_then(|index| row.values.get(index))
            .map(|value| parse_length(value));
        total_length += length.unwrap_or(0.0);

        if units_config.is_unassigned(row.unit) {
            continue;
        }
        let accumulator = accumulators.entry(row.unit.to_string()).or_default();
        accumulator.counts.add(row);

        let date_cell = roles
            .date
            .and_then(|index| row.values.get(index))
            .map(String::as_str);
        match resolve_period(date_cell, &row.document.data.date) {
            Some(period) => {
                if let (Some(length), Some(slot)) = (length, month_slot(period.month)) {
                    accumulator.months[slot] += length;
                }
            }
            None => undated += 1,
        }
    }

    let units = accumulators
        .iter()
        .map(|(unit, accumulator)| {
            let actual = accumulator.actual(filter.month);
            let plan = plan_for(request.targets, unit, filter.year.as_deref(), filter.month);
            UnitStatistics {
                unit: unit.clone(),
                actual,
                plan,
                percentage: completion_percentage(actual, plan),
                counts: accumulator.counts,
                uploaded_percentage: accumulator.counts.share(accumulator.counts.uploaded),
                requires_fix_percentage: accumulator.counts.share(accumulator.counts.requires_fix),
            }
        })
        .collect::<Vec<UnitStatistics>>();

    let monthly = filter
        .month
        .is_none()
        .then(|| monthly_matrix(&accumulators, request));

    let actual = units.iter().map(|unit| unit.actual).sum::<f64>();
    let plan = units.iter().map(|unit| unit.plan).sum::<f64>();

    debug!(
        rows = rows.len(),
        units = units.len(),
        undated_rows = undated,
        "summarized statistics"
    );

    StatisticsSummary {
        year: filter.year.clone(),
        month: filter.month,
        totals: ViewTotals {
            rows: rows.len(),
            total_length,
            actual,
            plan,
            percentage: completion_percentage(actual, plan),
            counts: view_counts,
        },
        units,
        monthly,
    }
}

fn monthly_matrix(
    accumulators: &BTreeMap<String, UnitAccumulator>,
    request: &StatisticsRequest<'_>,
) -> Vec<MonthlyRow> {
    let year = request
        .filter
        .year
        .clone()
        .unwrap_or_else(|| request.reference_year.to_string());
    let near_ratio = request.config.plan.near_target_ratio;

    accumulators
        .iter()
        .map(|(unit, accumulator)| {
            let monthly_target = annual_target(request.targets, &year, unit) / MONTHS as f64;
            let months = accumulator
                .months
                .iter()
                .enumerate()
                .map(|(slot, value)| MonthCell {
                    month: slot as u32 + 1,
                    value: *value,
                    band: target_band(*value, monthly_target, near_ratio),
                })
                .collect::<Vec<MonthCell>>();

            MonthlyRow {
                unit: unit.clone(),
                monthly_target,
                months,
                total: accumulator.months.iter().sum(),
            }
        })
        .collect()
}
