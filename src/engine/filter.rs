use serde::Serialize;

use crate::engine::materialize::MaterializedRow;
use crate::engine::values::{extract_month, extract_year};

/// Request-scoped view selection. `None` and an empty text match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub unit: Option<String>,
    pub year: Option<String>,
    pub month: Option<u32>,
    pub text: String,
    pub dedupe: bool,
}

impl FilterState {
    pub fn matches(&self, row: &MaterializedRow<'_>) -> bool {
        self.matches_unit(row)
            && self.matches_year(row)
            && self.matches_month(row)
            && self.matches_text(row)
    }

    fn matches_unit(&self, row: &MaterializedRow<'_>) -> bool {
        self.unit.as_deref().is_none_or(|unit| row.unit == unit)
    }

    fn matches_year(&self, row: &MaterializedRow<'_>) -> bool {
        self.year
            .as_deref()
            .is_none_or(|year| extract_year(row.filter_date) == Some(year))
    }

    fn matches_month(&self, row: &MaterializedRow<'_>) -> bool {
        self.month
            .is_none_or(|month| extract_month(row.filter_date) == Some(month))
    }

    fn matches_text(&self, row: &MaterializedRow<'_>) -> bool {
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        row.values
            .iter()
            .any(|value| value.to_lowercase().contains(&needle))
            || row.unit.to_lowercase().contains(&needle)
            || row.title.to_lowercase().contains(&needle)
    }
}

/// Keeps the rows passing every predicate, in input order.
pub fn filter_rows<'a>(
    rows: Vec<MaterializedRow<'a>>,
    state: &FilterState,
) -> Vec<MaterializedRow<'a>> {
    rows.into_iter().filter(|row| state.matches(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnVocabulary;
    use crate::engine::materialize::materialize;
    use crate::engine::testing::document;
    use crate::model::DocumentRecord;

    fn snapshot() -> Vec<DocumentRecord> {
        vec![
            document(
                "a",
                "Most",
                1,
                &["Datum", "Ulice", "Délka"],
                &[&["2023-05-01", "Hlavní", "10"], &["15.06.2024", "Nádražní", "4"]],
            ),
            document("b", "Teplice", 2, &["Ulice", "Délka"], &[&["Krátká", "2"]]),
        ]
    }

    fn ids(rows: &[MaterializedRow<'_>]) -> Vec<String> {
        rows.iter().map(|row| row.id.clone()).collect()
    }

    #[test]
    fn default_state_matches_everything() {
        let docs = snapshot();
        let rows = materialize(&docs, false, &ColumnVocabulary::default());
        let filtered = filter_rows(rows, &FilterState::default());
        assert_eq!(ids(&filtered), vec!["b-0", "a-0", "a-1"]);
    }

    #[test]
    fn unknown_unit_yields_empty_result() {
        let docs = snapshot();
        let rows = materialize(&docs, false, &ColumnVocabulary::default());
        let state = FilterState {
            unit: Some("Praha".to_string()),
            ..FilterState::default()
        };
        assert!(filter_rows(rows, &state).is_empty());
    }

    #[test]
    fn year_and_month_use_the_filter_date_string() {
        let docs = snapshot();
        let vocabulary = ColumnVocabulary::default();

        let by_year = FilterState {
            year: Some("2024".to_string()),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &vocabulary), &by_year);
        assert_eq!(ids(&rows), vec!["a-1"]);

        let by_month = FilterState {
            month: Some(5),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &vocabulary), &by_month);
        assert_eq!(ids(&rows), vec!["a-0"]);
    }

    #[test]
    fn rows_without_a_date_never_match_a_period() {
        let docs = snapshot();
        let state = FilterState {
            unit: Some("Teplice".to_string()),
            year: Some("2023".to_string()),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &ColumnVocabulary::default()), &state);
        assert!(rows.is_empty());
    }

    #[test]
    fn text_matches_cells_unit_and_title() {
        let docs = snapshot();
        let vocabulary = ColumnVocabulary::default();

        let by_cell = FilterState {
            text: "NÁDRAŽ".to_string(),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &vocabulary), &by_cell);
        assert_eq!(ids(&rows), vec!["a-1"]);

        let by_unit = FilterState {
            text: "tepl".to_string(),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &vocabulary), &by_unit);
        assert_eq!(ids(&rows), vec!["b-0"]);

        let by_title = FilterState {
            text: "report a".to_string(),
            ..FilterState::default()
        };
        let rows = filter_rows(materialize(&docs, false, &vocabulary), &by_title);
        assert_eq!(ids(&rows), vec!["a-0", "a-1"]);
    }
}
