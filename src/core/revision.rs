//! Limit revision engine
//!
//! Holds two generations of the record tables: the live one and, from the
//! first limit revision on, a frozen snapshot. Both are `Arc`s;
//! taking the snapshot is a reference-count bump and the first destructive
//! step on the live tables performs the actual copy (`Arc::make_mut`).
//! Revision operations read the snapshot and write the live generation.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::calculator::{CapabilityCalculator, TopFail};
use crate::core::config::AnalysisConfig;
use crate::core::error::{IntegrityError, RevisionError, UserStateError};
use crate::core::tables::RecordTables;
use crate::entities::{CapabilityResult, DieId, TestId};

/// Revision workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionState {
    #[default]
    Clean,
    LimitChanged,
    LimitRestored,
    DataFiltered,
    DataScreened,
}

impl std::fmt::Display for RevisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RevisionState::Clean => write!(f, "clean"),
            RevisionState::LimitChanged => write!(f, "limit_changed"),
            RevisionState::LimitRestored => write!(f, "limit_restored"),
            RevisionState::DataFiltered => write!(f, "data_filtered"),
            RevisionState::DataScreened => write!(f, "data_screened"),
        }
    }
}

/// Which side of a candidate window gets removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Remove dies with `lo <= RESULT <= hi`
    Inner,
    /// Remove dies with `RESULT < lo` or `RESULT > hi`
    Outer,
}

impl WindowMode {
    fn selects(&self, result: f64, limits: &CandidateLimits) -> bool {
        let inside = result >= limits.lo && result <= limits.hi;
        match self {
            WindowMode::Inner => inside,
            WindowMode::Outer => !inside,
        }
    }
}

impl FromStr for WindowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inner" => Ok(WindowMode::Inner),
            "outer" => Ok(WindowMode::Outer),
            _ => Err(format!("Invalid window mode: {}. Use inner or outer", s)),
        }
    }
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowMode::Inner => write!(f, "inner"),
            WindowMode::Outer => write!(f, "outer"),
        }
    }
}

/// Hypothetical limit pair for one test item
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateLimits {
    pub lo: f64,
    pub hi: f64,
}

impl CandidateLimits {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }
}

/// Candidate limits keyed by test id
pub type LimitMap = BTreeMap<TestId, CandidateLimits>;

/// Frozen original generation plus the results computed on it
#[derive(Debug, Clone)]
struct Snapshot {
    tables: Arc<RecordTables>,
    baseline: Vec<CapabilityResult>,
    attribution: TopFail,
}

/// Outcome of an engine operation, ready to publish
#[derive(Debug, Clone, Default)]
pub struct Recomputation {
    /// Top-fail count per test id
    pub top_fail: BTreeMap<TestId, usize>,
    /// Capability results in test order
    pub results: Vec<CapabilityResult>,
    /// Status line for the user
    pub message: String,
    /// Advisory, non-fatal conditions met on the way
    pub warnings: Vec<String>,
}

/// Stateful what-if limit workflow over one dataset
#[derive(Debug, Default)]
pub struct LimitRevisionEngine {
    config: AnalysisConfig,
    working: Option<Arc<RecordTables>>,
    snapshot: Option<Snapshot>,
    state: RevisionState,
    candidates: LimitMap,
}

impl LimitRevisionEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn state(&self) -> RevisionState {
        self.state
    }

    /// Live tables, if a dataset is loaded
    pub fn tables(&self) -> Option<&RecordTables> {
        self.working.as_deref()
    }

    /// Candidate limits currently tracked
    pub fn candidates(&self) -> &LimitMap {
        &self.candidates
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Install a freshly loaded dataset, discarding any revision history
    pub fn load(&mut self, tables: RecordTables) {
        tracing::info!(
            dies = tables.die_count(),
            tests = tables.test_count(),
            "dataset loaded"
        );
        self.working = Some(Arc::new(tables));
        self.snapshot = None;
        self.candidates.clear();
        self.state = RevisionState::Clean;
    }

    fn calculator(&self) -> CapabilityCalculator<'_> {
        CapabilityCalculator::new(&self.config)
    }

    fn working(&self) -> Result<&Arc<RecordTables>, UserStateError> {
        self.working.as_ref().ok_or(UserStateError::NoDataset)
    }

    /// Top-fail of the live tables from the stored fail bits
    pub fn top_fail(&self) -> Result<TopFail, RevisionError> {
        let tables = self.working()?;
        Ok(self.calculator().top_fail(tables)?)
    }

    /// Capability of the live tables under their own limits
    pub fn capability(
        &self,
        top_fail: &BTreeMap<TestId, usize>,
    ) -> Result<Vec<CapabilityResult>, RevisionError> {
        let tables = self.working()?;
        Ok(self.calculator().capability(tables, top_fail)?)
    }

    /// Top-fail and capability of the live tables
    pub fn recompute(&self) -> Result<Recomputation, RevisionError> {
        let top_fail = self.top_fail()?.count_map();
        let results = self.capability(&top_fail)?;
        Ok(Recomputation {
            top_fail,
            results,
            ..Default::default()
        })
    }

    /// Recompute fail rates against candidate limits
    ///
    /// Items whose candidate limits match the snapshot's within the
    /// configured tolerance keep their original result. Changed items keep
    /// their original statistics and limits but report the top-fail count
    /// obtained when every changed item is judged against its candidate
    /// window.
    pub fn apply_limit_revision(
        &mut self,
        limits: &LimitMap,
    ) -> Result<Recomputation, RevisionError> {
        let working = Arc::clone(self.working()?);
        if self.snapshot.is_none() {
            self.snapshot = Some(self.take_snapshot(working.clone())?);
        }
        let snapshot = self.snapshot.as_ref().ok_or(UserStateError::NoSnapshot)?;
        let calc = self.calculator();

        let mut warnings = Vec::new();
        let mut changed: BTreeMap<TestId, (f64, f64)> = BTreeMap::new();
        for (test_id, candidate) in limits {
            match snapshot.tables.test(*test_id) {
                Some(meta) => {
                    let tol = self.config.limit_tolerance;
                    if (candidate.lo - meta.lo_limit).abs() > tol
                        || (candidate.hi - meta.hi_limit).abs() > tol
                    {
                        changed.insert(*test_id, (candidate.lo, candidate.hi));
                    }
                }
                None => {
                    tracing::warn!(test_id, "candidate limits for unknown test ignored");
                    warnings.push(format!("Test {} is not part of the dataset", test_id));
                }
            }
        }

        let revised: BTreeMap<TestId, CapabilityResult> = if changed.is_empty() {
            BTreeMap::new()
        } else {
            let scratch = snapshot.tables.tests_with_limits(&changed);
            let top_fail = calc.top_fail_with_limits(&snapshot.tables, &scratch)?;
            calc.capability_with_tests(&snapshot.tables, &scratch, &top_fail.count_map())?
                .into_iter()
                .filter(|r| changed.contains_key(&r.test_id))
                .map(|r| (r.test_id, r))
                .collect()
        };

        let mut results = Vec::with_capacity(snapshot.baseline.len());
        let mut top_fail = BTreeMap::new();
        for original in &snapshot.baseline {
            if working.test(original.test_id).is_none() {
                continue;
            }
            let mut item = original.clone();
            match (revised.get(&item.test_id), changed.get(&item.test_id)) {
                (Some(candidate), Some((lo, hi))) => {
                    item.fail_qty = candidate.fail_qty;
                    item.fail_rate = candidate.fail_rate.clone();
                    item.new_lo_limit = Some(*lo);
                    item.new_hi_limit = Some(*hi);
                    item.rescued_fail_count =
                        Some(self.rescued_fail_count(item.test_id, *lo, *hi));
                    item.new_fail_rate = Some(candidate.fail_rate.clone());
                }
                _ => {
                    item.new_lo_limit = Some(item.lo_limit);
                    item.new_hi_limit = Some(item.hi_limit);
                    item.rescued_fail_count = Some(0);
                    item.new_fail_rate = Some(item.fail_rate.clone());
                }
            }
            top_fail.insert(item.test_id, item.fail_qty);
            results.push(item);
        }

        self.candidates = limits.clone();
        self.state = RevisionState::LimitChanged;
        tracing::info!(
            requested = limits.len(),
            changed = changed.len(),
            "limit revision applied"
        );
        Ok(Recomputation {
            top_fail,
            results,
            message: format!(
                "Recalculated fail rates with new limits for {} test item(s)",
                changed.len()
            ),
            warnings,
        })
    }

    fn take_snapshot(&self, tables: Arc<RecordTables>) -> Result<Snapshot, IntegrityError> {
        let calc = self.calculator();
        let attribution = calc.top_fail(&tables)?;
        let baseline = calc.capability(&tables, &attribution.count_map())?;
        tracing::debug!(tests = baseline.len(), "original snapshot taken");
        Ok(Snapshot {
            tables,
            baseline,
            attribution,
        })
    }

    /// Go back to the original limits on the live tables
    ///
    /// Dies removed by an earlier window drop stay removed.
    pub fn restore_original_limits(&mut self) -> Result<Recomputation, RevisionError> {
        self.working()?;
        match self.state {
            RevisionState::LimitChanged | RevisionState::LimitRestored => {}
            current => {
                return Err(UserStateError::WrongState {
                    expected: "limit_changed",
                    current,
                }
                .into())
            }
        }
        if self.snapshot.is_none() {
            return Err(UserStateError::NoSnapshot.into());
        }

        let mut outcome = self.recompute()?;
        self.candidates.clear();
        self.state = RevisionState::LimitRestored;
        tracing::info!("original limits restored");
        outcome.message =
            "Restored original limits; limits can be revised again".to_string();
        Ok(outcome)
    }

    /// Physically remove dies inside or outside the candidate windows
    ///
    /// Die selection reads the snapshot rows; removal hits the live tables.
    /// An empty `limits` map falls back to the active candidates.
    pub fn drop_rows_by_limit_window(
        &mut self,
        mode: WindowMode,
        limits: &LimitMap,
    ) -> Result<Recomputation, RevisionError> {
        self.working()?;
        if self.state != RevisionState::LimitChanged {
            return Err(UserStateError::WrongState {
                expected: "limit_changed",
                current: self.state,
            }
            .into());
        }
        let snapshot = self.snapshot.as_ref().ok_or(UserStateError::NoSnapshot)?;
        let limits = if !limits.is_empty() {
            limits
        } else if !self.candidates.is_empty() {
            &self.candidates
        } else {
            return Err(UserStateError::NoCandidateLimits.into());
        };

        let mut selected: BTreeSet<DieId> = BTreeSet::new();
        for (test_id, window) in limits {
            selected.extend(
                snapshot
                    .tables
                    .lookup_by_test(*test_id)
                    .into_iter()
                    .filter(|row| mode.selects(row.result, window))
                    .map(|row| row.die_id),
            );
        }

        let working = self.working.as_mut().ok_or(UserStateError::NoDataset)?;
        if !selected.iter().any(|die_id| working.die(*die_id).is_some()) {
            return Err(UserStateError::NothingToRemove.into());
        }
        let removed = Arc::make_mut(working).filter_by_die_ids(&selected);

        let mut outcome = self.recompute()?;
        self.state = RevisionState::DataFiltered;
        tracing::info!(%mode, removed, "dies removed by limit window");
        outcome.message = format!("Removed {} die(s) {} the limit window", removed, match mode {
            WindowMode::Inner => "inside",
            WindowMode::Outer => "outside",
        });
        Ok(outcome)
    }

    /// Narrow the live tables to the given test items
    ///
    /// No snapshot is taken here. A later revision snapshots the screened
    /// tables, and a reset needs a revision to have happened first.
    pub fn restrict_to_test_ids(
        &mut self,
        ids: &BTreeSet<TestId>,
    ) -> Result<Recomputation, RevisionError> {
        let mut warnings = Vec::new();
        if self.state == RevisionState::Clean {
            tracing::warn!("test items screened before any limit revision");
            warnings.push("Consider revising limits before screening test items".to_string());
        }
        let working = self.working.as_mut().ok_or(UserStateError::NoDataset)?;
        Arc::make_mut(working).filter_by_test_ids(ids);
        self.candidates.retain(|test_id, _| ids.contains(test_id));

        let mut outcome = self.recompute()?;
        self.state = RevisionState::DataScreened;
        outcome.message = format!("Screened {} test item(s) for analysis", ids.len());
        outcome.warnings = warnings;
        Ok(outcome)
    }

    /// Replace the live tables with the snapshot and forget all revisions
    pub fn reset_to_original(&mut self) -> Result<Recomputation, RevisionError> {
        self.working()?;
        let snapshot = self.snapshot.take().ok_or(UserStateError::NoSnapshot)?;
        self.working = Some(snapshot.tables);
        self.candidates.clear();
        self.state = RevisionState::Clean;

        let mut outcome = self.recompute()?;
        tracing::info!("reset to original dataset");
        outcome.message = "Reset to the original dataset".to_string();
        Ok(outcome)
    }

    /// Dies attributed as top-fail to `test_id` in the snapshot that would
    /// pass the candidate window
    ///
    /// Only top-fail dies count. A die that fails this item's original
    /// limits but was already removed by an earlier item in the test order
    /// is not counted, so the result never exceeds the item's FAIL_QTY.
    ///
    /// Zero without a snapshot, for unknown or functional items, and when the
    /// candidate window equals the original limits.
    pub fn rescued_fail_count(&self, test_id: TestId, lo: f64, hi: f64) -> usize {
        let Some(snapshot) = &self.snapshot else {
            return 0;
        };
        let Some(meta) = snapshot.tables.test(test_id) else {
            return 0;
        };
        let tol = self.config.limit_tolerance;
        if !meta.data_type.is_parametric()
            || ((lo - meta.lo_limit).abs() <= tol && (hi - meta.hi_limit).abs() <= tol)
        {
            return 0;
        }
        let Some(failed) = snapshot.attribution.failed_dies(test_id) else {
            return 0;
        };
        let rule = meta.limit_rule().with_limits(lo, hi);
        failed
            .iter()
            .filter_map(|die_id| snapshot.tables.measurement(test_id, *die_id))
            .filter(|row| rule.passes(row.result))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DieResult, Measurement, TestItemMeta};

    /// 10 dies, test 1 limits (0, 10), dies 1 and 2 out of limits
    fn engine() -> LimitRevisionEngine {
        let dies: Vec<DieResult> = (1..=10).map(|id| DieResult::new(id, 0)).collect();
        let mut rows = Vec::new();
        for die in 1..=10 {
            let value = match die {
                1 => -2.0,
                2 => 12.0,
                _ => die as f64 - 0.5,
            };
            rows.push(Measurement::new(1, die, value).with_failed(die <= 2));
            rows.push(Measurement::new(2, die, 1.0));
        }
        let tests = vec![
            TestItemMeta::parametric(1, 100, "IDD", 0.0, 10.0),
            TestItemMeta::parametric(2, 200, "VDD", 0.0, 5.0),
        ];
        let mut engine = LimitRevisionEngine::new(AnalysisConfig::default());
        engine.load(RecordTables::load(dies, rows, tests).unwrap());
        engine
    }

    fn limits(test_id: TestId, lo: f64, hi: f64) -> LimitMap {
        BTreeMap::from([(test_id, CandidateLimits::new(lo, hi))])
    }

    #[test]
    fn test_window_mode_parse() {
        assert_eq!("inner".parse::<WindowMode>().unwrap(), WindowMode::Inner);
        assert_eq!("OUTER".parse::<WindowMode>().unwrap(), WindowMode::Outer);
        assert!("middle".parse::<WindowMode>().is_err());
    }

    #[test]
    fn test_no_dataset() {
        let mut engine = LimitRevisionEngine::default();
        let err = engine.apply_limit_revision(&limits(1, 0.0, 1.0)).unwrap_err();
        assert_eq!(err, RevisionError::UserState(UserStateError::NoDataset));
        assert_eq!(engine.state(), RevisionState::Clean);
    }

    #[test]
    fn test_apply_unchanged_limits_passes_through() {
        let mut engine = engine();
        let before = engine.recompute().unwrap();
        let outcome = engine.apply_limit_revision(&limits(1, 0.0, 10.0)).unwrap();
        assert_eq!(engine.state(), RevisionState::LimitChanged);
        assert_eq!(outcome.results[0].fail_qty, before.results[0].fail_qty);
        assert_eq!(outcome.results[0].rescued_fail_count, Some(0));
        assert_eq!(outcome.results[0].new_lo_limit, Some(0.0));
        assert_eq!(outcome.results[0].new_fail_rate.as_deref(), Some("20.0%"));
    }

    #[test]
    fn test_apply_widened_limits() {
        let mut engine = engine();
        let outcome = engine.apply_limit_revision(&limits(1, -5.0, 15.0)).unwrap();
        let item = &outcome.results[0];
        assert_eq!(item.fail_qty, 0);
        assert_eq!(item.fail_rate, "0.0%");
        assert_eq!(item.lo_limit, 0.0);
        assert_eq!(item.hi_limit, 10.0);
        assert_eq!(item.new_lo_limit, Some(-5.0));
        assert_eq!(item.rescued_fail_count, Some(2));
        assert_eq!(outcome.top_fail[&1], 0);
        assert_eq!(engine.candidates().len(), 1);
    }

    #[test]
    fn test_snapshot_is_not_mutated_by_drop() {
        let mut engine = engine();
        let loaded = engine.tables().unwrap().clone();
        engine.apply_limit_revision(&limits(1, 0.0, 5.0)).unwrap();
        let outcome = engine
            .drop_rows_by_limit_window(WindowMode::Outer, &LimitMap::new())
            .unwrap();
        assert_eq!(engine.state(), RevisionState::DataFiltered);
        // dies 1, 2 and 6..=10 are outside [0, 5]
        assert_eq!(engine.tables().unwrap().die_count(), 3);
        assert_eq!(outcome.results[0].qty, 3);

        engine.reset_to_original().unwrap();
        assert_eq!(engine.tables().unwrap(), &loaded);
        assert_eq!(engine.state(), RevisionState::Clean);
        assert!(!engine.has_snapshot());
    }

    #[test]
    fn test_drop_requires_limit_changed() {
        let mut engine = engine();
        let err = engine
            .drop_rows_by_limit_window(WindowMode::Inner, &limits(1, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(
            err,
            RevisionError::UserState(UserStateError::WrongState { .. })
        ));
    }

    #[test]
    fn test_drop_nothing_to_remove() {
        let mut engine = engine();
        engine.apply_limit_revision(&limits(1, -100.0, 100.0)).unwrap();
        let err = engine
            .drop_rows_by_limit_window(WindowMode::Outer, &LimitMap::new())
            .unwrap_err();
        assert_eq!(err, RevisionError::UserState(UserStateError::NothingToRemove));
        assert_eq!(engine.tables().unwrap().die_count(), 10);
        assert_eq!(engine.state(), RevisionState::LimitChanged);
    }

    #[test]
    fn test_restore_keeps_filtered_dies() {
        let mut engine = engine();
        engine.apply_limit_revision(&limits(1, 0.0, 5.0)).unwrap();
        engine
            .drop_rows_by_limit_window(WindowMode::Inner, &LimitMap::new())
            .unwrap();
        assert!(engine.restore_original_limits().is_err());

        engine.apply_limit_revision(&limits(1, 0.0, 5.0)).unwrap();
        let outcome = engine.restore_original_limits().unwrap();
        assert_eq!(engine.state(), RevisionState::LimitRestored);
        assert!(engine.candidates().is_empty());
        // dies 3, 4 and 5 sat inside [0, 5]
        assert_eq!(engine.tables().unwrap().die_count(), 7);
        assert!(outcome.results.iter().all(|r| !r.has_revision()));
    }

    #[test]
    fn test_restrict_from_clean_warns() {
        let mut engine = engine();
        let outcome = engine.restrict_to_test_ids(&BTreeSet::from([2])).unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(engine.state(), RevisionState::DataScreened);
    }

    #[test]
    fn test_restrict_narrows_candidates() {
        let mut engine = engine();
        let mut map = limits(1, -1.0, 11.0);
        map.insert(2, CandidateLimits::new(0.0, 2.0));
        engine.apply_limit_revision(&map).unwrap();
        let outcome = engine.restrict_to_test_ids(&BTreeSet::from([2])).unwrap();
        assert!(outcome.warnings.is_empty());
        assert_eq!(engine.candidates().keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_screening_alone_leaves_nothing_to_reset() {
        let mut engine = engine();
        engine.restrict_to_test_ids(&BTreeSet::from([2])).unwrap();
        assert_eq!(engine.tables().unwrap().test_count(), 1);
        assert!(!engine.has_snapshot());
        let err = engine.reset_to_original().unwrap_err();
        assert_eq!(err, RevisionError::UserState(UserStateError::NoSnapshot));
    }

    /// 4 dies; test 1 fails die 1, test 2 fails dies 1 and 2
    fn overlapping_fails() -> LimitRevisionEngine {
        let dies: Vec<DieResult> = (1..=4).map(|id| DieResult::new(id, 0)).collect();
        let mut rows = Vec::new();
        for die in 1..=4 {
            let a = if die == 1 { 20.0 } else { 1.0 };
            let b = if die <= 2 { 20.0 } else { 1.0 };
            rows.push(Measurement::new(1, die, a).with_failed(die == 1));
            rows.push(Measurement::new(2, die, b).with_failed(die <= 2));
        }
        let tests = vec![
            TestItemMeta::parametric(1, 100, "A", 0.0, 10.0),
            TestItemMeta::parametric(2, 200, "B", 0.0, 10.0),
        ];
        let mut engine = LimitRevisionEngine::new(AnalysisConfig::default());
        engine.load(RecordTables::load(dies, rows, tests).unwrap());
        engine
    }

    #[test]
    fn test_identical_limits_after_screening_keep_fail_qty() {
        let mut engine = overlapping_fails();
        let screened = engine.restrict_to_test_ids(&BTreeSet::from([2])).unwrap();
        assert_eq!(screened.results[0].fail_qty, 2);

        let outcome = engine.apply_limit_revision(&limits(2, 0.0, 10.0)).unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].fail_qty, 2);
        assert_eq!(outcome.top_fail[&2], 2);

        engine.reset_to_original().unwrap();
        assert_eq!(engine.tables().unwrap().test_count(), 1);
    }

    #[test]
    fn test_reset_without_snapshot() {
        let mut engine = engine();
        let err = engine.reset_to_original().unwrap_err();
        assert_eq!(err, RevisionError::UserState(UserStateError::NoSnapshot));
    }

    #[test]
    fn test_rescued_skips_dies_failed_earlier() {
        let mut engine = overlapping_fails();
        let outcome = engine.apply_limit_revision(&limits(2, 0.0, 25.0)).unwrap();
        // die 1 is attributed to test 1, only die 2 counts for test 2
        assert_eq!(outcome.results[1].rescued_fail_count, Some(1));
        assert_eq!(engine.rescued_fail_count(2, 0.0, 25.0), 1);
    }

    #[test]
    fn test_rescued_fail_count_bounds() {
        let mut engine = engine();
        assert_eq!(engine.rescued_fail_count(1, -5.0, 15.0), 0);
        engine.apply_limit_revision(&limits(1, -5.0, 15.0)).unwrap();
        assert_eq!(engine.rescued_fail_count(1, 0.0, 10.0), 0);
        assert_eq!(engine.rescued_fail_count(1, -5.0, 10.0), 1);
        assert_eq!(engine.rescued_fail_count(1, -5.0, 15.0), 2);
        assert_eq!(engine.rescued_fail_count(99, -5.0, 15.0), 0);
    }
}
