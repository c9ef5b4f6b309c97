//! Analysis session
//!
//! Owns one loaded dataset, the current capability cache and the grouping
//! selection, and re-publishes every change to registered observers.
//!
//! Operations return `Ok(false)` and leave a status message when their
//! preconditions do not hold. Integrity violations are returned as `Err`;
//! the cache keeps its previous contents and the caller is expected to reset
//! or reload before continuing.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::mpsc;

use crate::core::config::AnalysisConfig;
use crate::core::error::{IntegrityError, RevisionError, UserStateError};
use crate::core::grouping::{self, ChartFrame, GroupColumn, Grouping};
use crate::core::revision::{LimitMap, LimitRevisionEngine, Recomputation, RevisionState, WindowMode};
use crate::core::summary::LotSummary;
use crate::core::tables::{LimitDifference, RecordTables};
use crate::entities::{
    CapabilityResult, DieResult, LotData, LotHeader, Measurement, TestId, TestItemMeta,
};

/// Change notification published to observers
///
/// Notifications carry no payload; observers re-read the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CapabilityChanged,
    ChartSelectionChanged,
    ChartDataRefreshed,
    Status(String),
}

/// Receiver of session notifications
pub trait SessionObserver {
    fn notify(&self, event: &SessionEvent);
}

impl SessionObserver for mpsc::Sender<SessionEvent> {
    fn notify(&self, event: &SessionEvent) {
        // a dropped receiver just stops listening
        let _ = self.send(event.clone());
    }
}

/// Capability results in test order with an id index
#[derive(Debug, Clone, Default)]
struct CapabilityCache {
    results: Vec<CapabilityResult>,
    index: HashMap<TestId, usize>,
}

impl CapabilityCache {
    fn build(results: Vec<CapabilityResult>) -> Self {
        let index = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.test_id, i))
            .collect();
        Self { results, index }
    }

    fn get(&self, test_id: TestId) -> Option<&CapabilityResult> {
        self.index.get(&test_id).map(|i| &self.results[*i])
    }
}

/// Stateful facade over one dataset
pub struct AnalysisSession {
    engine: LimitRevisionEngine,
    headers: BTreeMap<u32, LotHeader>,
    top_fail: Option<BTreeMap<TestId, usize>>,
    cache: CapabilityCache,
    grouping: Grouping,
    selection: Option<BTreeSet<String>>,
    observers: Vec<Box<dyn SessionObserver + Send>>,
    status: Option<String>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl AnalysisSession {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            engine: LimitRevisionEngine::new(config),
            headers: BTreeMap::new(),
            top_fail: None,
            cache: CapabilityCache::default(),
            grouping: Grouping::default(),
            selection: None,
            observers: Vec::new(),
            status: None,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.engine.config()
    }

    /// Register an observer for all future notifications
    pub fn subscribe(&mut self, observer: impl SessionObserver + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }

    fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(status = %message);
        self.emit(SessionEvent::Status(message.clone()));
        self.status = Some(message);
    }

    /// Latest status message
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn state(&self) -> RevisionState {
        self.engine.state()
    }

    /// Live tables, if a dataset is loaded
    pub fn tables(&self) -> Option<&RecordTables> {
        self.engine.tables()
    }

    pub fn headers(&self) -> &BTreeMap<u32, LotHeader> {
        &self.headers
    }

    /// Candidate limits of the active revision
    pub fn candidates(&self) -> &LimitMap {
        self.engine.candidates()
    }

    /// Load one dataset, replacing whatever was loaded before
    pub fn load(
        &mut self,
        dies: Vec<DieResult>,
        measurements: Vec<Measurement>,
        tests: Vec<TestItemMeta>,
    ) -> Result<(), IntegrityError> {
        let tables = RecordTables::load(dies, measurements, tests)?;
        self.install(tables, BTreeMap::new());
        Ok(())
    }

    /// Merge several parsed files into one dataset
    ///
    /// Die ids must be unique across files; test metadata merges with the
    /// last file winning.
    pub fn load_lots(&mut self, lots: Vec<LotData>) -> Result<(), IntegrityError> {
        let mut headers = BTreeMap::new();
        let mut dies = Vec::new();
        let mut measurements = Vec::new();
        let mut tests = Vec::new();
        for lot in lots {
            headers.insert(lot.header.file_id, lot.header);
            dies.extend(lot.dies);
            measurements.extend(lot.measurements);
            tests.extend(lot.tests);
        }
        let tables = RecordTables::load(dies, measurements, tests)?;
        self.install(tables, headers);
        Ok(())
    }

    fn install(&mut self, tables: RecordTables, headers: BTreeMap<u32, LotHeader>) {
        tracing::info!(files = headers.len(), "session loaded");
        self.engine.load(tables);
        self.headers = headers;
        self.top_fail = None;
        self.cache = CapabilityCache::default();
        self.grouping = Grouping::default();
        self.selection = None;
        self.emit(SessionEvent::ChartDataRefreshed);
    }

    /// Cumulative top-fail of the live tables
    pub fn recompute_top_fail(&mut self) -> Result<bool, IntegrityError> {
        match self.engine.top_fail() {
            Ok(top_fail) => {
                self.top_fail = Some(top_fail.count_map());
                Ok(true)
            }
            Err(err) => self.handle_error(err),
        }
    }

    /// Rebuild the capability cache from the current top-fail
    pub fn recompute_capability(&mut self) -> Result<bool, IntegrityError> {
        let Some(top_fail) = &self.top_fail else {
            return self.handle_error(UserStateError::TopFailMissing.into());
        };
        match self.engine.capability(top_fail) {
            Ok(results) => {
                self.cache = CapabilityCache::build(results);
                self.emit(SessionEvent::CapabilityChanged);
                Ok(true)
            }
            Err(err) => self.handle_error(err),
        }
    }

    /// Top-fail followed by capability
    pub fn analyze(&mut self) -> Result<bool, IntegrityError> {
        Ok(self.recompute_top_fail()? && self.recompute_capability()?)
    }

    pub fn apply_limit_revision(&mut self, limits: &LimitMap) -> Result<bool, IntegrityError> {
        let outcome = self.engine.apply_limit_revision(limits);
        self.publish(outcome, false)
    }

    pub fn restore_original_limits(&mut self) -> Result<bool, IntegrityError> {
        let outcome = self.engine.restore_original_limits();
        self.publish(outcome, true)
    }

    /// Remove dies inside or outside the candidate windows
    ///
    /// An empty `limits` map uses the limits of the active revision.
    pub fn drop_rows_by_limit_window(
        &mut self,
        mode: WindowMode,
        limits: &LimitMap,
    ) -> Result<bool, IntegrityError> {
        let outcome = self.engine.drop_rows_by_limit_window(mode, limits);
        self.publish(outcome, true)
    }

    pub fn restrict_to_test_ids(&mut self, ids: &[TestId]) -> Result<bool, IntegrityError> {
        let ids: BTreeSet<TestId> = ids.iter().copied().collect();
        let outcome = self.engine.restrict_to_test_ids(&ids);
        self.publish(outcome, true)
    }

    pub fn reset_to_original(&mut self) -> Result<bool, IntegrityError> {
        let outcome = self.engine.reset_to_original();
        self.publish(outcome, true)
    }

    fn publish(
        &mut self,
        outcome: Result<Recomputation, RevisionError>,
        data_changed: bool,
    ) -> Result<bool, IntegrityError> {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err) => return self.handle_error(err),
        };
        self.top_fail = Some(outcome.top_fail);
        self.cache = CapabilityCache::build(outcome.results);
        for warning in outcome.warnings {
            self.report(warning);
        }
        if !outcome.message.is_empty() {
            self.report(outcome.message);
        }
        self.emit(SessionEvent::CapabilityChanged);
        if data_changed {
            self.emit(SessionEvent::ChartDataRefreshed);
        }
        Ok(true)
    }

    fn handle_error(&mut self, err: RevisionError) -> Result<bool, IntegrityError> {
        match err {
            RevisionError::UserState(err) => {
                tracing::warn!(error = %err, "operation skipped");
                self.report(err.to_string());
                Ok(false)
            }
            RevisionError::Integrity(err) => {
                tracing::error!(error = %err, "data integrity violated");
                Err(err)
            }
        }
    }

    /// Cached capability result of one item
    pub fn get_capability(&self, test_id: TestId) -> Option<&CapabilityResult> {
        self.cache.get(test_id)
    }

    /// All cached results in test order
    pub fn capability_results(&self) -> &[CapabilityResult] {
        &self.cache.results
    }

    /// Published top-fail counts
    pub fn top_fail(&self) -> Option<&BTreeMap<TestId, usize>> {
        self.top_fail.as_ref()
    }

    /// `"{TEST_NUM}:{TEST_TXT}"` of a cached item
    pub fn get_text(&self, test_id: TestId) -> Option<&str> {
        self.cache.get(test_id).map(|r| r.text.as_str())
    }

    /// Partition the live dies by group and sub-group columns
    ///
    /// The grouping is kept for later chart frames; any group selection is
    /// cleared.
    pub fn group_by(
        &mut self,
        group_columns: &[GroupColumn],
        sub_group_columns: &[GroupColumn],
    ) -> BTreeMap<String, Vec<DieResult>> {
        self.grouping = Grouping::new(group_columns.to_vec(), sub_group_columns.to_vec());
        self.selection = None;
        let groups = match self.engine.tables() {
            Some(tables) => grouping::group_dies(tables, &self.headers, &self.grouping, self.config()),
            None => {
                self.report(UserStateError::NoDataset.to_string());
                return BTreeMap::new();
            }
        };
        tracing::debug!(groups = groups.len(), "dies grouped");
        self.emit(SessionEvent::ChartSelectionChanged);
        self.emit(SessionEvent::ChartDataRefreshed);
        groups
    }

    /// Restrict chart frames to the given group keys; `None` selects all
    pub fn select_groups(&mut self, groups: Option<BTreeSet<String>>) {
        self.selection = groups;
        self.emit(SessionEvent::ChartSelectionChanged);
    }

    pub fn grouping(&self) -> &Grouping {
        &self.grouping
    }

    /// Wide per-die result table for the requested items
    pub fn chart_frame(&self, test_ids: &[TestId]) -> Result<ChartFrame, IntegrityError> {
        match self.engine.tables() {
            Some(tables) => grouping::chart_frame(
                tables,
                &self.headers,
                &self.grouping,
                self.config(),
                test_ids,
                self.selection.as_ref(),
            ),
            None => Ok(ChartFrame::default()),
        }
    }

    /// Snapshot dies failing `test_id` that the candidate window would pass
    pub fn rescued_fail_count(&self, test_id: TestId, lo: f64, hi: f64) -> usize {
        self.engine.rescued_fail_count(test_id, lo, hi)
    }

    /// Bin, site, test-time and retest figures of the live dies
    pub fn lot_summary(&self) -> Option<LotSummary> {
        let tables = self.engine.tables()?;
        let dies: Vec<DieResult> = tables.dies().cloned().collect();
        Some(LotSummary::from_dies(&dies))
    }

    /// Items whose rows were tested under differing limits
    pub fn limit_differences(&self) -> Vec<LimitDifference> {
        self.engine
            .tables()
            .map(|tables| tables.limit_differences())
            .unwrap_or_default()
    }
}
