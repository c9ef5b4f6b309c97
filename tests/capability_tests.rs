//! Capability statistics over a loaded dataset

mod common;

use common::{hundred_die_lot, IDD, VOUT};
use dct::core::{round_to, AnalysisConfig, CapabilityCalculator, RecordTables};
use dct::entities::flags::opt_flag;
use dct::entities::{DieResult, LimitType, Measurement, TestItemMeta};

fn tables() -> RecordTables {
    let (dies, rows, tests) = hundred_die_lot();
    RecordTables::load(dies, rows, tests).unwrap()
}

// ============================================================================
// Top fail and rates
// ============================================================================

#[test]
fn test_top_fail_counts_each_die_once() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let top_fail = calc.top_fail(&tables()).unwrap();

    assert_eq!(top_fail.count(IDD), Some(5));
    assert_eq!(top_fail.count(VOUT), Some(0));
    assert_eq!(top_fail.survivors(), 95);
    let total: usize = top_fail.counts().iter().map(|(_, n)| n).sum();
    assert_eq!(total + top_fail.survivors(), 100);
}

#[test]
fn test_rates_are_relative_to_item_quantity() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let tables = tables();
    let top_fail = calc.top_fail(&tables).unwrap().count_map();
    let results = calc.capability(&tables, &top_fail).unwrap();

    let idd = &results[0];
    assert_eq!(idd.test_id, IDD);
    assert_eq!(idd.qty, 100);
    assert_eq!(idd.fail_qty, 5);
    assert_eq!(idd.fail_rate, "5.0%");
    assert_eq!(idd.reject_qty, 5);
    assert_eq!(idd.reject_rate, "5.0%");
    assert_eq!(idd.text, "100:IDD");

    let vout = &results[1];
    assert_eq!(vout.fail_rate, "0.0%");
    assert_eq!(vout.reject_qty, 0);
}

#[test]
fn test_statistics_exclude_failing_rows() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let tables = tables();
    let top_fail = calc.top_fail(&tables).unwrap().count_map();
    let idd = calc.capability(&tables, &top_fail).unwrap().remove(0);

    assert_eq!(idd.max, Some(6.0));
    assert_eq!(idd.min, Some(4.0));
    assert_eq!(idd.all_data_max, Some(12.0));
    let cpk = idd.cpk.unwrap();
    let cp = idd.cp.unwrap();
    assert!(cpk > 0.0 && cpk <= cp);
    assert_eq!(idd.sigma_level, Some(round_to(cpk * 3.0 + 1.5, 2)));
}

// ============================================================================
// Numeric edge cases
// ============================================================================

#[test]
fn test_constant_results_use_epsilon() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let meta = TestItemMeta::parametric(1, 1, "FLAT", 0.0, 10.0);
    let rows: Vec<Measurement> = (1..=4).map(|id| Measurement::new(1, id, 5.0)).collect();
    let refs: Vec<&Measurement> = rows.iter().collect();

    let r = calc.parametric(&meta, 0, &refs);
    assert_eq!(r.std, Some(0.00001));
    assert!(r.cpk.unwrap().is_finite());
    assert!(r.cpk.unwrap() > 1000.0);
}

#[test]
fn test_single_sided_cpk() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let mut meta = TestItemMeta::parametric(1, 1, "LEAK", 0.0, 10.0);
    meta.opt_flag = opt_flag::NO_LOW_LIMIT;
    let rows: Vec<Measurement> = [7.0, 8.0, 9.0]
        .iter()
        .enumerate()
        .map(|(i, v)| Measurement::new(1, i as u32 + 1, *v))
        .collect();
    let refs: Vec<&Measurement> = rows.iter().collect();

    let r = calc.parametric(&meta, 0, &refs);
    // mean 8, sample std 1: (10 - 8) / 3
    assert_eq!(r.cpk, Some(0.666667));
    assert_eq!(r.cp, None);
    assert_eq!(r.lo_limit_type, LimitType::Na);
    assert_eq!(r.hi_limit_type, LimitType::Lt);
}

#[test]
fn test_zero_limits_display_range() {
    let config = AnalysisConfig::default();
    let calc = CapabilityCalculator::new(&config);
    let meta = TestItemMeta::parametric(1, 1, "OFFSET", 0.0, 0.0);
    let rows = vec![Measurement::new(1, 1, 0.0)];
    let refs: Vec<&Measurement> = rows.iter().collect();

    let r = calc.parametric(&meta, 0, &refs);
    assert_eq!(
        r.display_range(config.degenerate_ratio, config.degenerate_zero_span),
        (-0.1, 0.1)
    );
}

#[test]
fn test_duplicate_die_is_rejected() {
    let dies = vec![DieResult::new(1, 0), DieResult::new(1, 1)];
    assert!(RecordTables::load(dies, Vec::new(), Vec::new()).is_err());
}
