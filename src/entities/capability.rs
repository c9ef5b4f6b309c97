//! Computed capability result for one test item

use serde::{Deserialize, Serialize};

use crate::entities::{DataType, LimitType, TestId};

/// Capability statistics of one test item
///
/// `lo_limit`/`hi_limit` are always the original limits; a what-if pass
/// only fills the `new_*` fields, `fail_qty` and `fail_rate`.
/// Undefined statistics are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CapabilityResult {
    pub test_id: TestId,
    pub test_type: DataType,
    pub test_num: u32,
    pub test_txt: String,
    pub units: String,
    pub lo_limit: f64,
    pub hi_limit: f64,

    pub avg: Option<f64>,
    pub std: Option<f64>,
    pub median: Option<f64>,

    /// Process capability index, reported as an absolute value
    pub cpk: Option<f64>,
    /// Process capability, two-sided items only
    pub cp: Option<f64>,
    /// Process performance index (population std-dev)
    pub ppk: Option<f64>,
    /// Process performance, two-sided items only
    pub pp: Option<f64>,
    pub sigma_level: Option<f64>,

    /// Total measured quantity for this item
    pub qty: usize,
    /// Cumulative top-fail count
    pub fail_qty: usize,
    /// `fail_qty` as a percentage of `qty`, e.g. `"5.0%"`
    pub fail_rate: String,
    /// Rows whose stored test flag marks a local fail
    pub reject_qty: usize,
    pub reject_rate: String,

    /// Minimum over passing rows
    pub min: Option<f64>,
    /// Maximum over passing rows
    pub max: Option<f64>,
    pub lo_limit_type: LimitType,
    pub hi_limit_type: LimitType,
    pub all_data_min: Option<f64>,
    pub all_data_max: Option<f64>,
    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_lo_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_hi_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rescued_fail_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_fail_rate: Option<String>,
}

impl CapabilityResult {
    /// Whether a limit revision populated the `new_*` fields
    pub fn has_revision(&self) -> bool {
        self.new_lo_limit.is_some() || self.new_hi_limit.is_some()
    }

    /// Range to plot this item over
    ///
    /// Spans the enabled limits and all measured data. A degenerate
    /// single-point window (`lo == hi`) is widened by `ratio` of the limit
    /// value on each side, or by `zero_span` when the limit is zero.
    pub fn display_range(&self, ratio: f64, zero_span: f64) -> (f64, f64) {
        if self.lo_limit == self.hi_limit {
            return widen(self.lo_limit, ratio, zero_span);
        }

        let mut low = self.all_data_min;
        let mut high = self.all_data_max;
        if self.lo_limit_type != LimitType::Na {
            low = Some(low.map_or(self.lo_limit, |v| v.min(self.lo_limit)));
        }
        if self.hi_limit_type != LimitType::Na {
            high = Some(high.map_or(self.hi_limit, |v| v.max(self.hi_limit)));
        }

        match (low, high) {
            (Some(lo), Some(hi)) if lo < hi => (lo, hi),
            (Some(lo), _) => widen(lo, ratio, zero_span),
            (None, Some(hi)) => widen(hi, ratio, zero_span),
            (None, None) => widen(0.0, ratio, zero_span),
        }
    }
}

fn widen(value: f64, ratio: f64, zero_span: f64) -> (f64, f64) {
    if value == 0.0 {
        (-zero_span, zero_span)
    } else {
        let delta = (value * ratio).abs();
        (value - delta, value + delta)
    }
}
