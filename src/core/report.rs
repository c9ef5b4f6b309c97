//! Capability report summary over a result list

use serde::Serialize;

use crate::core::calculator::round_to;
use crate::entities::CapabilityResult;

/// CPK at or above this is considered capable
pub const CPK_CAPABLE: f64 = 1.33;

/// CPK below this is considered not capable
pub const CPK_MARGINAL: f64 = 1.0;

/// Aggregate view of a capability report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportSummary {
    pub total_items: usize,
    pub cpk_avg: Option<f64>,
    pub cpk_min: Option<f64>,
    pub cpk_max: Option<f64>,
    /// Items with CPK < 1.0
    pub cpk_lt_1: usize,
    /// Items with 1.0 <= CPK < 1.33
    pub cpk_1_to_1_33: usize,
    /// Items with CPK >= 1.33
    pub cpk_ge_1_33: usize,
    pub sigma_avg: Option<f64>,
}

impl ReportSummary {
    /// Share of `count` in the total, in percent
    pub fn share(&self, count: usize) -> f64 {
        if self.total_items == 0 {
            0.0
        } else {
            count as f64 / self.total_items as f64 * 100.0
        }
    }
}

/// One bar of the capability pareto
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParetoEntry {
    pub label: String,
    pub cpk: Option<f64>,
    pub fail_qty: usize,
}

/// Items that can be judged: CPK defined and a non-zero limit on some side
pub fn filter_valid_items(results: &[CapabilityResult]) -> Vec<CapabilityResult> {
    results
        .iter()
        .filter(|r| r.cpk.is_some() && (r.lo_limit != 0.0 || r.hi_limit != 0.0))
        .cloned()
        .collect()
}

/// Sort by CPK; items without a CPK always go last
pub fn sort_by_cpk(results: &[CapabilityResult], ascending: bool) -> Vec<CapabilityResult> {
    let mut sorted = results.to_vec();
    sorted.sort_by(|a, b| match (a.cpk, b.cpk) {
        (Some(x), Some(y)) if ascending => x.total_cmp(&y),
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    sorted
}

pub fn summary_statistics(results: &[CapabilityResult]) -> ReportSummary {
    let cpks: Vec<f64> = results.iter().filter_map(|r| r.cpk).collect();
    let sigmas: Vec<f64> = results.iter().filter_map(|r| r.sigma_level).collect();

    ReportSummary {
        total_items: results.len(),
        cpk_avg: average(&cpks).map(|v| round_to(v, 3)),
        cpk_min: cpks.iter().copied().reduce(f64::min).map(|v| round_to(v, 3)),
        cpk_max: cpks.iter().copied().reduce(f64::max).map(|v| round_to(v, 3)),
        cpk_lt_1: cpks.iter().filter(|c| **c < CPK_MARGINAL).count(),
        cpk_1_to_1_33: cpks
            .iter()
            .filter(|c| **c >= CPK_MARGINAL && **c < CPK_CAPABLE)
            .count(),
        cpk_ge_1_33: cpks.iter().filter(|c| **c >= CPK_CAPABLE).count(),
        sigma_avg: average(&sigmas).map(|v| round_to(v, 2)),
    }
}

/// Lowest-CPK items first
pub fn pareto(results: &[CapabilityResult], top_n: usize) -> Vec<ParetoEntry> {
    sort_by_cpk(results, true)
        .into_iter()
        .take(top_n)
        .map(|r| ParetoEntry {
            label: format!("{}:{}", r.test_num, r.test_txt),
            cpk: r.cpk,
            fail_qty: r.fail_qty,
        })
        .collect()
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
