//! Keyed storage for the three record kinds
//!
//! Measurements live in a composite-key map `(test id, die id) -> row`, which
//! doubles as the per-test index (a key range). A secondary `die id -> test
//! ids` index serves per-die joins. Every destructive operation keeps dies
//! and measurements mutually consistent.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::core::config::TestOrder;
use crate::core::error::IntegrityError;
use crate::entities::{DieId, DieResult, Measurement, TestId, TestItemMeta};

/// Joined, indexed record tables of one dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTables {
    dies: BTreeMap<DieId, DieResult>,
    measurements: BTreeMap<(TestId, DieId), Measurement>,
    by_die: BTreeMap<DieId, BTreeSet<TestId>>,
    tests: BTreeMap<TestId, TestItemMeta>,
    load_order: Vec<TestId>,
}

/// Test item whose measurement rows disagree on limits
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitDifference {
    pub test_id: TestId,
    pub text: String,
    /// Distinct `(lo, hi)` pairs in first-seen order
    pub limits: Vec<(f64, f64)>,
}

impl RecordTables {
    /// Build the tables, enforcing the cross-table invariants
    ///
    /// Metadata rows merge last-occurrence-wins; duplicate `(test, die)`
    /// measurements keep the last row. A die id seen twice, or a measurement
    /// pointing at a missing die or test, is an integrity error.
    pub fn load(
        dies: impl IntoIterator<Item = DieResult>,
        measurements: impl IntoIterator<Item = Measurement>,
        tests: impl IntoIterator<Item = TestItemMeta>,
    ) -> Result<Self, IntegrityError> {
        let mut tables = Self::default();

        for die in dies {
            let die_id = die.die_id;
            if tables.dies.insert(die_id, die).is_some() {
                return Err(IntegrityError::DuplicateDie { die_id });
            }
        }

        for meta in tests {
            if !tables.tests.contains_key(&meta.test_id) {
                tables.load_order.push(meta.test_id);
            }
            tables.tests.insert(meta.test_id, meta);
        }

        for row in measurements {
            if !tables.tests.contains_key(&row.test_id) {
                return Err(IntegrityError::UnknownTest {
                    test_id: row.test_id,
                });
            }
            if !tables.dies.contains_key(&row.die_id) {
                return Err(IntegrityError::OrphanMeasurement {
                    test_id: row.test_id,
                    die_id: row.die_id,
                });
            }
            tables
                .by_die
                .entry(row.die_id)
                .or_default()
                .insert(row.test_id);
            tables.measurements.insert((row.test_id, row.die_id), row);
        }

        tracing::debug!(
            dies = tables.dies.len(),
            measurements = tables.measurements.len(),
            tests = tables.tests.len(),
            "record tables loaded"
        );
        Ok(tables)
    }

    pub fn die_count(&self) -> usize {
        self.dies.len()
    }

    pub fn measurement_count(&self) -> usize {
        self.measurements.len()
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dies.is_empty() && self.tests.is_empty()
    }

    pub fn die(&self, die_id: DieId) -> Option<&DieResult> {
        self.dies.get(&die_id)
    }

    /// All dies in die-id order
    pub fn dies(&self) -> impl Iterator<Item = &DieResult> {
        self.dies.values()
    }

    /// Ids of every live die
    pub fn population(&self) -> BTreeSet<DieId> {
        self.dies.keys().copied().collect()
    }

    pub fn test(&self, test_id: TestId) -> Option<&TestItemMeta> {
        self.tests.get(&test_id)
    }

    /// Metadata keyed by test id
    pub fn tests(&self) -> &BTreeMap<TestId, TestItemMeta> {
        &self.tests
    }

    pub fn measurement(&self, test_id: TestId, die_id: DieId) -> Option<&Measurement> {
        self.measurements.get(&(test_id, die_id))
    }

    /// Measurement rows of one die, in test-id order
    pub fn join(&self, die_id: DieId) -> Vec<&Measurement> {
        self.by_die
            .get(&die_id)
            .map(|test_ids| {
                test_ids
                    .iter()
                    .filter_map(|test_id| self.measurements.get(&(*test_id, die_id)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// De-duplicated measurement rows of one test item, in die-id order
    pub fn lookup_by_test(&self, test_id: TestId) -> Vec<&Measurement> {
        self.measurements
            .range((test_id, DieId::MIN)..=(test_id, DieId::MAX))
            .map(|(_, row)| row)
            .collect()
    }

    /// Test items in the order top-fail accumulation walks them
    pub fn ordered_test_ids(&self, order: TestOrder) -> Vec<TestId> {
        match order {
            TestOrder::TestId => self.tests.keys().copied().collect(),
            TestOrder::LoadOrder => self
                .load_order
                .iter()
                .copied()
                .filter(|id| self.tests.contains_key(id))
                .collect(),
            TestOrder::TestNumber => {
                let mut ids: Vec<(u32, TestId)> = self
                    .tests
                    .values()
                    .map(|meta| (meta.test_num, meta.test_id))
                    .collect();
                ids.sort_unstable();
                ids.into_iter().map(|(_, id)| id).collect()
            }
        }
    }

    /// Copy of the metadata with candidate limits swapped in
    ///
    /// Only the limit values change; flag bits stay as loaded.
    pub fn tests_with_limits(
        &self,
        limits: &BTreeMap<TestId, (f64, f64)>,
    ) -> BTreeMap<TestId, TestItemMeta> {
        let mut tests = self.tests.clone();
        for (test_id, (lo, hi)) in limits {
            if let Some(meta) = tests.get_mut(test_id) {
                meta.lo_limit = *lo;
                meta.hi_limit = *hi;
            }
        }
        tests
    }

    /// Keep only the given test items (destructive)
    pub fn filter_by_test_ids(&mut self, keep: &BTreeSet<TestId>) {
        self.tests.retain(|test_id, _| keep.contains(test_id));
        self.load_order.retain(|test_id| keep.contains(test_id));
        self.measurements
            .retain(|(test_id, _), _| keep.contains(test_id));
        for test_ids in self.by_die.values_mut() {
            test_ids.retain(|test_id| keep.contains(test_id));
        }
        self.by_die.retain(|_, test_ids| !test_ids.is_empty());
    }

    /// Remove the given dies and all of their measurements (destructive)
    ///
    /// Returns the number of dies actually removed.
    pub fn filter_by_die_ids(&mut self, exclude: &BTreeSet<DieId>) -> usize {
        let before = self.dies.len();
        self.dies.retain(|die_id, _| !exclude.contains(die_id));
        self.measurements
            .retain(|(_, die_id), _| !exclude.contains(die_id));
        self.by_die.retain(|die_id, _| !exclude.contains(die_id));
        before - self.dies.len()
    }

    /// Test items whose rows were produced under more than one limit pair
    pub fn limit_differences(&self) -> Vec<LimitDifference> {
        let mut diffs = Vec::new();
        for meta in self.tests.values() {
            let mut limits: Vec<(f64, f64)> = Vec::new();
            for row in self.lookup_by_test(meta.test_id) {
                let pair = (row.lo_limit, row.hi_limit);
                if !limits.contains(&pair) {
                    limits.push(pair);
                }
            }
            if limits.len() > 1 {
                diffs.push(LimitDifference {
                    test_id: meta.test_id,
                    text: meta.text(),
                    limits,
                });
            }
        }
        diffs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RecordTables {
        let dies = (1..=4).map(|id| DieResult::new(id, 0));
        let tests = vec![
            TestItemMeta::parametric(10, 200, "IDD", 0.0, 5.0),
            TestItemMeta::parametric(20, 100, "VDD", 0.0, 5.0),
        ];
        let mut rows = Vec::new();
        for die in 1..=4 {
            rows.push(Measurement::new(10, die, die as f64));
            rows.push(Measurement::new(20, die, 1.0));
        }
        RecordTables::load(dies, rows, tests).unwrap()
    }

    #[test]
    fn test_load_and_lookup() {
        let tables = sample();
        assert_eq!(tables.die_count(), 4);
        assert_eq!(tables.measurement_count(), 8);
        assert_eq!(tables.lookup_by_test(10).len(), 4);
        assert_eq!(tables.join(2).len(), 2);
        assert_eq!(tables.measurement(10, 3).unwrap().result, 3.0);
    }

    #[test]
    fn test_duplicate_measurement_last_wins() {
        let tables = RecordTables::load(
            vec![DieResult::new(1, 0)],
            vec![Measurement::new(1, 1, 1.0), Measurement::new(1, 1, 2.0)],
            vec![TestItemMeta::parametric(1, 1, "A", 0.0, 5.0)],
        )
        .unwrap();
        let rows = tables.lookup_by_test(1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].result, 2.0);
    }

    #[test]
    fn test_metadata_last_wins() {
        let tables = RecordTables::load(
            vec![],
            vec![],
            vec![
                TestItemMeta::parametric(1, 1, "A", 0.0, 5.0),
                TestItemMeta::parametric(1, 1, "A", 1.0, 6.0),
            ],
        )
        .unwrap();
        assert_eq!(tables.test_count(), 1);
        assert_eq!(tables.test(1).unwrap().hi_limit, 6.0);
    }

    #[test]
    fn test_orphan_measurement_rejected() {
        let err = RecordTables::load(
            vec![DieResult::new(1, 0)],
            vec![Measurement::new(1, 9, 1.0)],
            vec![TestItemMeta::parametric(1, 1, "A", 0.0, 5.0)],
        )
        .unwrap_err();
        assert_eq!(err, IntegrityError::OrphanMeasurement { test_id: 1, die_id: 9 });
    }

    #[test]
    fn test_unknown_test_rejected() {
        let err = RecordTables::load(
            vec![DieResult::new(1, 0)],
            vec![Measurement::new(7, 1, 1.0)],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, IntegrityError::UnknownTest { test_id: 7 });
    }

    #[test]
    fn test_duplicate_die_rejected() {
        let err = RecordTables::load(
            vec![DieResult::new(1, 0), DieResult::new(1, 1)],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, IntegrityError::DuplicateDie { die_id: 1 });
    }

    #[test]
    fn test_ordering() {
        let tables = sample();
        assert_eq!(tables.ordered_test_ids(TestOrder::TestNumber), vec![20, 10]);
        assert_eq!(tables.ordered_test_ids(TestOrder::TestId), vec![10, 20]);
        assert_eq!(tables.ordered_test_ids(TestOrder::LoadOrder), vec![10, 20]);
    }

    #[test]
    fn test_filter_by_die_ids_keeps_tables_consistent() {
        let mut tables = sample();
        let removed = tables.filter_by_die_ids(&BTreeSet::from([1, 3, 99]));
        assert_eq!(removed, 2);
        assert_eq!(tables.die_count(), 2);
        assert_eq!(tables.measurement_count(), 4);
        assert!(tables.join(1).is_empty());
        assert!(tables
            .lookup_by_test(10)
            .iter()
            .all(|row| tables.die(row.die_id).is_some()));
    }

    #[test]
    fn test_filter_by_test_ids() {
        let mut tables = sample();
        tables.filter_by_test_ids(&BTreeSet::from([20]));
        assert_eq!(tables.test_count(), 1);
        assert_eq!(tables.measurement_count(), 4);
        assert!(tables.lookup_by_test(10).is_empty());
        assert_eq!(tables.join(1).len(), 1);
        assert_eq!(tables.die_count(), 4);
    }

    #[test]
    fn test_tests_with_limits() {
        let tables = sample();
        let scratch = tables.tests_with_limits(&BTreeMap::from([(10, (-1.0, 9.0))]));
        assert_eq!(scratch[&10].lo_limit, -1.0);
        assert_eq!(scratch[&10].hi_limit, 9.0);
        assert_eq!(scratch[&20].hi_limit, 5.0);
        assert_eq!(tables.test(10).unwrap().hi_limit, 5.0);
    }

    #[test]
    fn test_limit_differences() {
        let tables = RecordTables::load(
            vec![DieResult::new(1, 0), DieResult::new(2, 0)],
            vec![
                Measurement::new(1, 1, 1.0).with_limits(0.0, 5.0),
                Measurement::new(1, 2, 1.0).with_limits(0.0, 6.0),
                Measurement::new(2, 1, 1.0).with_limits(0.0, 5.0),
            ],
            vec![
                TestItemMeta::parametric(1, 1, "A", 0.0, 6.0),
                TestItemMeta::parametric(2, 2, "B", 0.0, 5.0),
            ],
        )
        .unwrap();
        let diffs = tables.limit_differences();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].test_id, 1);
        assert_eq!(diffs[0].limits, vec![(0.0, 5.0), (0.0, 6.0)]);
    }
}
