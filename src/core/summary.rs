//! Lot summary statistics over die results
//!
//! Bin, site, test-time and retest figures for the live dies. Percentages
//! are plain floats in `[0, 100]`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::entities::DieResult;

/// Which bin column to summarize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinKind {
    Hard,
    Soft,
}

impl BinKind {
    fn of(&self, die: &DieResult) -> u16 {
        match self {
            BinKind::Hard => die.hard_bin,
            BinKind::Soft => die.soft_bin,
        }
    }
}

/// Quantity and share of one bin at one site
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SiteShare {
    pub qty: usize,
    /// Share of that site's dies
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinStat {
    pub bin: u16,
    /// `P` for bin 1, `F` otherwise
    pub bin_type: char,
    pub qty: usize,
    pub percentage: f64,
    pub sites: BTreeMap<u8, SiteShare>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct YieldStat {
    pub total: usize,
    pub pass: usize,
    pub fail: usize,
    pub pass_rate: f64,
    pub fail_rate: f64,
}

impl YieldStat {
    fn from_dies<'a>(dies: impl IntoIterator<Item = &'a DieResult>) -> Self {
        let mut stat = Self::default();
        for die in dies {
            stat.total += 1;
            if die.is_pass() {
                stat.pass += 1;
            }
        }
        stat.fail = stat.total - stat.pass;
        stat.pass_rate = percent(stat.pass, stat.total);
        stat.fail_rate = percent(stat.fail, stat.total);
        stat
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SiteStats {
    pub all: YieldStat,
    pub sites: BTreeMap<u8, YieldStat>,
}

/// Mean test time in milliseconds, truncated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestTime {
    pub all: u64,
    pub pass_only: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetestStats {
    pub fresh: usize,
    pub retest: usize,
    pub fresh_rate: f64,
    pub retest_rate: f64,
}

/// Everything shown on a lot summary page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotSummary {
    pub hard_bins: Vec<BinStat>,
    pub soft_bins: Vec<BinStat>,
    pub sites: SiteStats,
    pub test_time: TestTime,
    pub retest: RetestStats,
}

impl LotSummary {
    pub fn from_dies(dies: &[DieResult]) -> Self {
        Self {
            hard_bins: bin_statistics(dies, BinKind::Hard),
            soft_bins: bin_statistics(dies, BinKind::Soft),
            sites: site_statistics(dies),
            test_time: test_time(dies),
            retest: retest_statistics(dies),
        }
    }
}

/// Per-bin quantities, ascending by bin number
pub fn bin_statistics(dies: &[DieResult], kind: BinKind) -> Vec<BinStat> {
    let mut site_totals: BTreeMap<u8, usize> = BTreeMap::new();
    let mut bins: BTreeMap<u16, BTreeMap<u8, usize>> = BTreeMap::new();
    for die in dies {
        *site_totals.entry(die.site_num).or_default() += 1;
        *bins
            .entry(kind.of(die))
            .or_default()
            .entry(die.site_num)
            .or_default() += 1;
    }

    bins.into_iter()
        .map(|(bin, per_site)| {
            let qty = per_site.values().sum();
            let sites = per_site
                .into_iter()
                .map(|(site, qty)| {
                    let total = site_totals.get(&site).copied().unwrap_or(0);
                    (
                        site,
                        SiteShare {
                            qty,
                            percentage: percent(qty, total),
                        },
                    )
                })
                .collect();
            BinStat {
                bin,
                bin_type: if bin == 1 { 'P' } else { 'F' },
                qty,
                percentage: percent(qty, dies.len()),
                sites,
            }
        })
        .collect()
}

pub fn site_statistics(dies: &[DieResult]) -> SiteStats {
    let mut by_site: BTreeMap<u8, Vec<&DieResult>> = BTreeMap::new();
    for die in dies {
        by_site.entry(die.site_num).or_default().push(die);
    }
    SiteStats {
        all: YieldStat::from_dies(dies),
        sites: by_site
            .into_iter()
            .map(|(site, dies)| (site, YieldStat::from_dies(dies)))
            .collect(),
    }
}

pub fn test_time(dies: &[DieResult]) -> TestTime {
    let mean = |times: Vec<u32>| -> u64 {
        if times.is_empty() {
            0
        } else {
            times.iter().map(|t| *t as u64).sum::<u64>() / times.len() as u64
        }
    };
    TestTime {
        all: mean(dies.iter().map(|d| d.test_time).collect()),
        pass_only: mean(dies.iter().filter(|d| d.is_pass()).map(|d| d.test_time).collect()),
    }
}

/// Fresh vs retested parts; an empty lot counts as all fresh
pub fn retest_statistics(dies: &[DieResult]) -> RetestStats {
    if dies.is_empty() {
        return RetestStats {
            fresh: 0,
            retest: 0,
            fresh_rate: 100.0,
            retest_rate: 0.0,
        };
    }
    let retest = dies.iter().filter(|d| d.is_retest()).count();
    let fresh = dies.len() - retest;
    RetestStats {
        fresh,
        retest,
        fresh_rate: percent(fresh, dies.len()),
        retest_rate: percent(retest, dies.len()),
    }
}

fn percent(qty: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        qty as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dies() -> Vec<DieResult> {
        let mut dies = Vec::new();
        for id in 0..8u32 {
            let mut die = DieResult::new(id, (id % 2) as u8);
            die.test_time = 100 + id;
            if id >= 6 {
                die.fail_flag = DieResult::FAIL;
                die.hard_bin = 5;
                die.soft_bin = 50 + id as u16;
            }
            if id == 3 {
                die.part_flag = DieResult::RETEST_BIT;
            }
            dies.push(die);
        }
        dies
    }

    #[test]
    fn test_bin_statistics() {
        let stats = bin_statistics(&dies(), BinKind::Hard);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].bin, 1);
        assert_eq!(stats[0].bin_type, 'P');
        assert_eq!(stats[0].qty, 6);
        assert_eq!(stats[0].percentage, 75.0);
        assert_eq!(stats[1].bin_type, 'F');
        assert_eq!(stats[1].sites[&0].qty, 1);
        assert_eq!(stats[1].sites[&0].percentage, 25.0);

        let soft = bin_statistics(&dies(), BinKind::Soft);
        assert_eq!(soft.len(), 3);
    }

    #[test]
    fn test_site_statistics() {
        let stats = site_statistics(&dies());
        assert_eq!(stats.all.total, 8);
        assert_eq!(stats.all.pass, 6);
        assert_eq!(stats.all.fail_rate, 25.0);
        assert_eq!(stats.sites[&1].total, 4);
        assert_eq!(stats.sites[&1].fail, 1);
    }

    #[test]
    fn test_test_time() {
        let time = test_time(&dies());
        // 100..=107 over all, 100..=105 over passing dies
        assert_eq!(time.all, 103);
        assert_eq!(time.pass_only, 102);
        assert_eq!(test_time(&[]), TestTime::default());
    }

    #[test]
    fn test_retest_statistics() {
        let stats = retest_statistics(&dies());
        assert_eq!(stats.retest, 1);
        assert_eq!(stats.fresh, 7);
        assert_eq!(stats.retest_rate, 12.5);
        assert_eq!(retest_statistics(&[]).fresh_rate, 100.0);
    }
}
