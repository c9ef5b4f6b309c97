//! Capability calculator
//!
//! Two entry algorithms per test item:
//! - cumulative top-fail attribution, either from the stored fail bit or
//!   rebuilt from RESULT against (candidate) limits
//! - capability indices (Cp/Cpk/Pp/Ppk/sigma level) over passing rows
//!
//! Top-fail is cumulative in test order: a die removed by an earlier test
//! item is never counted against a later one.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::core::config::AnalysisConfig;
use crate::core::error::IntegrityError;
use crate::core::tables::RecordTables;
use crate::entities::{CapabilityResult, DieId, LimitType, Measurement, TestId, TestItemMeta};

/// Presentation range reported for functional items
const FUNCTIONAL_MIN: f64 = -0.1;
const FUNCTIONAL_MAX: f64 = 1.1;

/// Per-test top-fail attribution
///
/// Records which dies each test item newly excluded from the population.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopFail {
    order: Vec<TestId>,
    failed: BTreeMap<TestId, BTreeSet<DieId>>,
    survivors: usize,
}

impl TopFail {
    /// Top-fail count of one item, `None` if the item was not processed
    pub fn count(&self, test_id: TestId) -> Option<usize> {
        self.failed.get(&test_id).map(|dies| dies.len())
    }

    /// Dies attributed to one item
    pub fn failed_dies(&self, test_id: TestId) -> Option<&BTreeSet<DieId>> {
        self.failed.get(&test_id)
    }

    /// Counts in accumulation order
    pub fn counts(&self) -> Vec<(TestId, usize)> {
        self.order
            .iter()
            .map(|id| (*id, self.failed.get(id).map_or(0, |d| d.len())))
            .collect()
    }

    /// Counts keyed by test id
    pub fn count_map(&self) -> BTreeMap<TestId, usize> {
        self.failed
            .iter()
            .map(|(id, dies)| (*id, dies.len()))
            .collect()
    }

    /// Dies still alive after every item
    pub fn survivors(&self) -> usize {
        self.survivors
    }

    pub fn order(&self) -> &[TestId] {
        &self.order
    }
}

/// Remove from `population` the dies among `rows` classified as failing
///
/// Returns the removed die ids. The population may only shrink; anything
/// else is an integrity violation.
pub fn top_fail_step<'a>(
    test_id: TestId,
    population: &mut BTreeSet<DieId>,
    rows: impl IntoIterator<Item = &'a Measurement>,
    is_fail: impl Fn(&Measurement) -> bool,
) -> Result<BTreeSet<DieId>, IntegrityError> {
    let before = population.len();
    let failed: BTreeSet<DieId> = rows
        .into_iter()
        .filter(|row| population.contains(&row.die_id))
        .filter(|row| is_fail(row))
        .map(|row| row.die_id)
        .collect();
    population.retain(|die_id| !failed.contains(die_id));
    let after = population.len();
    if after > before {
        return Err(IntegrityError::PopulationGrew {
            test_id,
            before,
            after,
        });
    }
    Ok(failed)
}

/// Stateless calculator bound to an analysis config
#[derive(Debug, Clone, Copy)]
pub struct CapabilityCalculator<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> CapabilityCalculator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        self.config
    }

    /// Cumulative top-fail from the stored per-measurement fail bit
    pub fn top_fail(&self, tables: &RecordTables) -> Result<TopFail, IntegrityError> {
        self.accumulate(tables, tables.tests(), |_, row| row.is_fail())
    }

    /// Cumulative top-fail rebuilt from RESULT against `tests`' limits
    ///
    /// Parametric items compare each result with the item's limit rule; an
    /// item with both sides disabled contributes no fails. Functional items
    /// carry no numeric limits and keep their stored fail bit.
    pub fn top_fail_with_limits(
        &self,
        tables: &RecordTables,
        tests: &BTreeMap<TestId, TestItemMeta>,
    ) -> Result<TopFail, IntegrityError> {
        self.accumulate(tables, tests, |meta, row| {
            if meta.data_type.is_parametric() {
                meta.limit_rule().fails(row.result)
            } else {
                row.is_fail()
            }
        })
    }

    fn accumulate(
        &self,
        tables: &RecordTables,
        tests: &BTreeMap<TestId, TestItemMeta>,
        is_fail: impl Fn(&TestItemMeta, &Measurement) -> bool,
    ) -> Result<TopFail, IntegrityError> {
        let started = Instant::now();
        let order = tables.ordered_test_ids(self.config.test_order);
        let mut population = tables.population();
        let start_size = population.len();
        let mut failed = BTreeMap::new();

        for test_id in &order {
            let meta = tests
                .get(test_id)
                .ok_or(IntegrityError::UnknownTest { test_id: *test_id })?;
            let removed = top_fail_step(
                *test_id,
                &mut population,
                tables.lookup_by_test(*test_id),
                |row| is_fail(meta, row),
            )?;
            if population.len() > start_size {
                return Err(IntegrityError::PopulationGrew {
                    test_id: *test_id,
                    before: start_size,
                    after: population.len(),
                });
            }
            failed.insert(*test_id, removed);
        }

        tracing::debug!(
            tests = order.len(),
            survivors = population.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "top fail accumulated"
        );
        Ok(TopFail {
            order,
            failed,
            survivors: population.len(),
        })
    }

    /// Capability results for every test item, in top-fail order
    ///
    /// `top_fail` maps each test id to its cumulative top-fail count.
    pub fn capability(
        &self,
        tables: &RecordTables,
        top_fail: &BTreeMap<TestId, usize>,
    ) -> Result<Vec<CapabilityResult>, IntegrityError> {
        self.capability_with_tests(tables, tables.tests(), top_fail)
    }

    /// Capability results computed against `tests`' metadata
    pub fn capability_with_tests(
        &self,
        tables: &RecordTables,
        tests: &BTreeMap<TestId, TestItemMeta>,
        top_fail: &BTreeMap<TestId, usize>,
    ) -> Result<Vec<CapabilityResult>, IntegrityError> {
        let started = Instant::now();
        let order = tables.ordered_test_ids(self.config.test_order);
        let mut results = Vec::with_capacity(order.len());
        for test_id in order {
            let meta = tests
                .get(&test_id)
                .ok_or(IntegrityError::UnknownTest { test_id })?;
            let fail_qty = top_fail
                .get(&test_id)
                .copied()
                .ok_or(IntegrityError::MissingTopFail { test_id })?;
            let rows = tables.lookup_by_test(test_id);
            let result = if meta.data_type.is_parametric() {
                self.parametric(meta, fail_qty, &rows)
            } else {
                self.functional(meta, fail_qty, &rows)
            };
            results.push(result);
        }
        tracing::debug!(
            items = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "capability computed"
        );
        Ok(results)
    }

    /// Full statistics for a parametric item
    ///
    /// Statistics come from passing rows only; rates are relative to every
    /// row of the item.
    pub fn parametric(
        &self,
        meta: &TestItemMeta,
        fail_qty: usize,
        rows: &[&Measurement],
    ) -> CapabilityResult {
        let digits = self.config.stat_precision;
        let (rejects, passes): (Vec<&Measurement>, Vec<&Measurement>) =
            rows.iter().copied().partition(|row| row.is_fail());
        let values: Vec<f64> = passes.iter().map(|row| row.result).collect();
        let all_values: Vec<f64> = rows.iter().map(|row| row.result).collect();

        let mean = mean(&values);
        let std = sample_std(&values).map(|s| self.non_zero(s));
        let std_total = population_std(&values).map(|s| self.non_zero(s));

        let has_low = meta.has_low_limit();
        let has_high = meta.has_high_limit();

        let cpk = match (mean, std) {
            (Some(m), Some(s)) => self.one_sided_min(meta, m, s),
            _ => None,
        };
        let cp = match std {
            Some(s) if has_low && has_high => {
                Some(round_to((meta.hi_limit - meta.lo_limit) / (6.0 * s), digits))
            }
            _ => None,
        };
        let ppk = match (mean, std_total) {
            (Some(m), Some(s)) => self.one_sided_min(meta, m, s),
            _ => None,
        };
        let pp = match std_total {
            Some(s) if has_low && has_high => {
                Some(round_to((meta.hi_limit - meta.lo_limit) / (6.0 * s), digits))
            }
            _ => None,
        };
        let sigma_level = cpk
            .filter(|c| *c > 0.0)
            .map(|c| round_to(c * 3.0 + self.config.sigma_shift, self.config.sigma_precision));

        CapabilityResult {
            test_id: meta.test_id,
            test_type: meta.data_type,
            test_num: meta.test_num,
            test_txt: meta.test_txt.clone(),
            units: meta.units.clone(),
            lo_limit: meta.lo_limit,
            hi_limit: meta.hi_limit,
            avg: mean.map(|v| round_to(v, digits)),
            std: std.map(|v| round_to(v, digits)),
            median: median(&values).map(|v| round_to(v, digits)),
            cpk,
            cp,
            ppk,
            pp,
            sigma_level,
            qty: rows.len(),
            fail_qty,
            fail_rate: format_rate(fail_qty, rows.len(), self.config.rate_precision),
            reject_qty: rejects.len(),
            reject_rate: format_rate(rejects.len(), rows.len(), self.config.rate_precision),
            min: min(&values).map(|v| round_to(v, digits)),
            max: max(&values).map(|v| round_to(v, digits)),
            lo_limit_type: meta.lo_limit_type(),
            hi_limit_type: meta.hi_limit_type(),
            all_data_min: min(&all_values).map(|v| round_to(v, digits)),
            all_data_max: max(&all_values).map(|v| round_to(v, digits)),
            text: meta.text(),
            new_lo_limit: None,
            new_hi_limit: None,
            rescued_fail_count: None,
            new_fail_rate: None,
        }
    }

    /// Quantity and fail counts only; capability fields stay undefined
    pub fn functional(
        &self,
        meta: &TestItemMeta,
        fail_qty: usize,
        rows: &[&Measurement],
    ) -> CapabilityResult {
        let reject_qty = rows.iter().filter(|row| row.is_fail()).count();
        CapabilityResult {
            test_id: meta.test_id,
            test_type: meta.data_type,
            test_num: meta.test_num,
            test_txt: meta.test_txt.clone(),
            units: meta.units.clone(),
            lo_limit: meta.lo_limit,
            hi_limit: meta.hi_limit,
            avg: None,
            std: None,
            median: None,
            cpk: None,
            cp: None,
            ppk: None,
            pp: None,
            sigma_level: None,
            qty: rows.len(),
            fail_qty,
            fail_rate: format_rate(fail_qty, rows.len(), self.config.rate_precision),
            reject_qty,
            reject_rate: format_rate(reject_qty, rows.len(), self.config.rate_precision),
            min: Some(FUNCTIONAL_MIN),
            max: Some(FUNCTIONAL_MAX),
            lo_limit_type: LimitType::Gt,
            hi_limit_type: LimitType::Le,
            all_data_min: Some(FUNCTIONAL_MIN),
            all_data_max: Some(FUNCTIONAL_MAX),
            text: meta.text(),
            new_lo_limit: None,
            new_hi_limit: None,
            rescued_fail_count: None,
            new_fail_rate: None,
        }
    }

    /// `min` over enabled sides of the distance to the limit in units of
    /// `3 * std`, rounded, then made absolute
    fn one_sided_min(&self, meta: &TestItemMeta, mean: f64, std: f64) -> Option<f64> {
        let mut sides = Vec::with_capacity(2);
        if meta.has_high_limit() {
            sides.push((meta.hi_limit - mean) / (3.0 * std));
        }
        if meta.has_low_limit() {
            sides.push((mean - meta.lo_limit) / (3.0 * std));
        }
        sides
            .into_iter()
            .reduce(f64::min)
            .map(|v| round_to(v, self.config.stat_precision).abs())
    }

    fn non_zero(&self, std: f64) -> f64 {
        if std == 0.0 {
            self.config.std_epsilon
        } else {
            std
        }
    }
}

/// Percentage string of `qty / total`, e.g. `"5.0%"` or `"33.333%"`
pub fn format_rate(qty: usize, total: usize, precision: u32) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    let value = round_to(qty as f64 / total as f64 * 100.0, precision);
    if value.fract() == 0.0 {
        format!("{:.1}%", value)
    } else {
        format!("{}%", value)
    }
}

/// Round to `digits` decimal places, ties to even on the exact binary value
pub fn round_to(value: f64, digits: u32) -> f64 {
    format!("{:.*}", digits as usize, value)
        .parse()
        .unwrap_or(value)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Sample standard deviation (n - 1); undefined below two values
fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Population standard deviation (n)
fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / values.len() as f64).sqrt())
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
