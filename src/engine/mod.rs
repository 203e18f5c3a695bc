//! Row normalization and aggregation over extracted inspection tables.
//!
//! Everything here is a pure computation over an in-memory snapshot: column
//! roles are inferred from header text, rows are flattened (and optionally
//! merged across documents), filtered, and rolled up per unit and month.

pub mod aggregate;
pub mod columns;
pub mod filter;
pub mod materialize;
pub mod status;
pub mod values;

use crate::config::RollupConfig;
use crate::model::{DocumentRecord, TargetMap};

use self::aggregate::{StatisticsRequest, StatisticsSummary, summarize};
use self::filter::{FilterState, filter_rows};
use self::materialize::{MaterializedRow, materialize};

/// Materialized rows visible under `filter`, newest document first.
pub fn query_rows<'a>(
    documents: &'a [DocumentRecord],
    filter: &FilterState,
    config: &RollupConfig,
) -> Vec<MaterializedRow<'a>> {
    filter_rows(materialize(documents, filter.dedupe, &config.columns), filter)
}

pub fn query_statistics(
    documents: &[DocumentRecord],
    targets: &TargetMap,
    filter: &FilterState,
    reference_year: i32,
    config: &RollupConfig,
) -> StatisticsSummary {
    let rows = query_rows(documents, filter, config);
    let request = StatisticsRequest {
        targets,
        filter,
        reference_year,
        config,
    };
    summarize(documents, &rows, &request)
}
