//! Running concatenation of per-measure exposure tables.

use exposure_core::table::ExposureTable;

/// Row-wise union of the accumulated table and `next`.
///
/// An absent accumulator yields `next` unchanged; otherwise the schema of
/// whichever side has rows wins, and two empty tables give an empty table.
pub fn concatenate(existing: Option<&ExposureTable>, next: &ExposureTable) -> ExposureTable {
    match existing {
        None => next.clone(),
        Some(table) => table.concat(next),
    }
}

/// Accumulator threaded through the per-measure loop.
///
/// Each [`push`](Self::push) consumes the accumulator and returns the next
/// value; the previous table is never modified in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureAggregator {
    table: Option<ExposureTable>,
}

impl ExposureAggregator {
    /// Accumulator with no rows yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one measure's canonicalised table.
    #[must_use]
    pub fn push(self, next: &ExposureTable) -> Self {
        Self {
            table: Some(concatenate(self.table.as_ref(), next)),
        }
    }

    /// Rows accumulated so far.
    pub fn num_rows(&self) -> usize {
        self.table.as_ref().map_or(0, ExposureTable::num_rows)
    }

    /// Final table; an accumulator that saw no measure yields an empty one.
    pub fn finish(self) -> ExposureTable {
        self.table.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_core::table::{Cell, EXPOSURE_COL, MEASURE_COL};
    use proptest::prelude::*;

    fn tagged(measure: &str, values: &[f64]) -> ExposureTable {
        let rows = values
            .iter()
            .map(|v| vec![Cell::from("USD"), Cell::from(*v)])
            .collect();
        ExposureTable::with_rows(["Currency", EXPOSURE_COL], rows)
            .unwrap()
            .extend_const(measure, MEASURE_COL)
    }

    #[test]
    fn test_absent_accumulator_yields_next() {
        let next = tagged("IR Delta", &[1.0]);
        assert_eq!(concatenate(None, &next), next);

        let empty = tagged("IR Vega", &[]);
        assert_eq!(concatenate(None, &empty), empty);
    }

    #[test]
    fn test_empty_side_keeps_populated_schema() {
        let populated = tagged("IR Delta", &[1.0, 2.0]);
        let empty = ExposureTable::new(["Currency"]);

        assert_eq!(concatenate(Some(&empty), &populated), populated);
        assert_eq!(concatenate(Some(&populated), &empty), populated);
    }

    #[test]
    fn test_aggregator_preserves_measure_order() {
        let table = ExposureAggregator::new()
            .push(&tagged("IR Delta", &[1.0]))
            .push(&tagged("IR Vega", &[]))
            .push(&tagged("FX Delta", &[2.0, 3.0]))
            .finish();

        let measures: Vec<_> = table
            .column(MEASURE_COL)
            .filter_map(Cell::as_str)
            .collect();
        assert_eq!(measures, vec!["IR Delta", "FX Delta", "FX Delta"]);
        assert_eq!(table.sum_column(EXPOSURE_COL), 6.0);
    }

    #[test]
    fn test_unused_aggregator_finishes_empty() {
        let aggregator = ExposureAggregator::new();
        assert_eq!(aggregator.num_rows(), 0);
        assert!(aggregator.finish().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_fold_order_does_not_change_rows(
            sizes in proptest::collection::vec(0usize..4, 1..6)
        ) {
            let tables: Vec<ExposureTable> = sizes
                .iter()
                .enumerate()
                .map(|(i, n)| {
                    let values: Vec<f64> = (0..*n).map(|k| (i * 10 + k) as f64).collect();
                    tagged(&format!("M{i}"), &values)
                })
                .collect();

            let left = tables
                .iter()
                .fold(ExposureAggregator::new(), |acc, t| acc.push(t))
                .finish();

            // Right-nested grouping: t0 ++ (t1 ++ (t2 ++ ...))
            let right = tables
                .iter()
                .rev()
                .fold(None::<ExposureTable>, |acc, t| {
                    Some(match acc {
                        None => t.clone(),
                        Some(rest) => concatenate(Some(t), &rest),
                    })
                })
                .unwrap_or_default();

            prop_assert_eq!(left.rows(), right.rows());
            prop_assert_eq!(left.num_rows(), sizes.iter().sum::<usize>());
        }
    }
}
