//! Test item metadata and limit semantics

use serde::{Deserialize, Serialize};

use crate::entities::flags::{self, opt_flag, parm_flag};
use crate::entities::TestId;

/// Kind of test record the item was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    /// Parametric test (one result per die)
    Ptr,
    /// Multi-result parametric test
    Mpr,
    /// Functional test (pass/fail only)
    Ftr,
}

impl DataType {
    /// Parametric items get the full capability treatment
    pub fn is_parametric(&self) -> bool {
        matches!(self, DataType::Ptr | DataType::Mpr)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataType::Ptr => write!(f, "PTR"),
            DataType::Mpr => write!(f, "MPR"),
            DataType::Ftr => write!(f, "FTR"),
        }
    }
}

/// Comparison applied on one side of the limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LimitType {
    /// Side disabled
    Na,
    /// `>=` low limit
    Ge,
    /// `>` low limit
    Gt,
    /// `<=` high limit
    Le,
    /// `<` high limit
    Lt,
}

impl std::fmt::Display for LimitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitType::Na => write!(f, "NA"),
            LimitType::Ge => write!(f, "GE"),
            LimitType::Gt => write!(f, "GT"),
            LimitType::Le => write!(f, "LE"),
            LimitType::Lt => write!(f, "LT"),
        }
    }
}

/// One row per test item, merged across files (last occurrence wins)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct TestItemMeta {
    pub test_id: TestId,

    #[serde(rename = "DATAT_TYPE")]
    pub data_type: DataType,

    pub test_num: u32,

    pub test_txt: String,

    #[serde(default)]
    pub units: String,

    /// Inclusive-comparison bits, see [`parm_flag`]
    #[serde(rename = "PARM_FLG", default)]
    pub parm_flag: u8,

    /// Disabled-side bits, see [`opt_flag`]
    #[serde(default)]
    pub opt_flag: u8,

    #[serde(default)]
    pub lo_limit: f64,

    #[serde(default)]
    pub hi_limit: f64,
}

impl TestItemMeta {
    /// Create a parametric item with strict limits on both sides
    pub fn parametric(test_id: TestId, test_num: u32, name: &str, lo_limit: f64, hi_limit: f64) -> Self {
        Self {
            test_id,
            data_type: DataType::Ptr,
            test_num,
            test_txt: name.to_string(),
            units: String::new(),
            parm_flag: 0,
            opt_flag: 0,
            lo_limit,
            hi_limit,
        }
    }

    /// Create a functional item
    pub fn functional(test_id: TestId, test_num: u32, name: &str) -> Self {
        Self {
            data_type: DataType::Ftr,
            ..Self::parametric(test_id, test_num, name, 0.0, 0.0)
        }
    }

    /// Display text used by charts and reports
    pub fn text(&self) -> String {
        format!("{}:{}", self.test_num, self.test_txt)
    }

    pub fn has_low_limit(&self) -> bool {
        !flags::has(self.opt_flag, opt_flag::NO_LOW_LIMIT)
    }

    pub fn has_high_limit(&self) -> bool {
        !flags::has(self.opt_flag, opt_flag::NO_HIGH_LIMIT)
    }

    /// Reported low side type; the inclusive bit outranks a disabled side
    pub fn lo_limit_type(&self) -> LimitType {
        if flags::has(self.parm_flag, parm_flag::EQUAL_LOW_LIMIT) {
            LimitType::Ge
        } else if !self.has_low_limit() {
            LimitType::Na
        } else {
            LimitType::Gt
        }
    }

    /// Reported high side type; the inclusive bit outranks a disabled side
    pub fn hi_limit_type(&self) -> LimitType {
        if flags::has(self.parm_flag, parm_flag::EQUAL_HIGH_LIMIT) {
            LimitType::Le
        } else if !self.has_high_limit() {
            LimitType::Na
        } else {
            LimitType::Lt
        }
    }

    /// Pass/fail rule built from this item's flags and limits
    pub fn limit_rule(&self) -> LimitRule {
        LimitRule::from_meta(self)
    }
}

/// How one side of a limit window compares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSide {
    Disabled,
    Inclusive,
    Strict,
}

/// Pass/fail predicate for a result against a limit window
///
/// The comparison kind of each side comes from the item's flag bits; the
/// limit values can be swapped for candidate limits while keeping the
/// comparison kinds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitRule {
    pub lo_limit: f64,
    pub hi_limit: f64,
    pub low: LimitSide,
    pub high: LimitSide,
}

impl LimitRule {
    pub fn from_meta(meta: &TestItemMeta) -> Self {
        let low = if !meta.has_low_limit() {
            LimitSide::Disabled
        } else if meta.lo_limit_type() == LimitType::Ge {
            LimitSide::Inclusive
        } else {
            LimitSide::Strict
        };
        let high = if !meta.has_high_limit() {
            LimitSide::Disabled
        } else if meta.hi_limit_type() == LimitType::Le {
            LimitSide::Inclusive
        } else {
            LimitSide::Strict
        };
        Self {
            lo_limit: meta.lo_limit,
            hi_limit: meta.hi_limit,
            low,
            high,
        }
    }

    /// Same comparison kinds, different limit values
    pub fn with_limits(self, lo_limit: f64, hi_limit: f64) -> Self {
        Self {
            lo_limit,
            hi_limit,
            ..self
        }
    }

    /// Both sides disabled: nothing can fail
    pub fn is_unbounded(&self) -> bool {
        self.low == LimitSide::Disabled && self.high == LimitSide::Disabled
    }

    pub fn passes(&self, result: f64) -> bool {
        let low_ok = match self.low {
            LimitSide::Disabled => true,
            LimitSide::Inclusive => result >= self.lo_limit,
            LimitSide::Strict => result > self.lo_limit,
        };
        let high_ok = match self.high {
            LimitSide::Disabled => true,
            LimitSide::Inclusive => result <= self.hi_limit,
            LimitSide::Strict => result < self.hi_limit,
        };
        low_ok && high_ok
    }

    pub fn fails(&self, result: f64) -> bool {
        !self.passes(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_limits() {
        let meta = TestItemMeta::parametric(1, 100, "VDD", 0.0, 10.0);
        let rule = meta.limit_rule();
        assert!(rule.passes(5.0));
        assert!(rule.fails(0.0));
        assert!(rule.fails(10.0));
        assert_eq!(meta.lo_limit_type(), LimitType::Gt);
        assert_eq!(meta.hi_limit_type(), LimitType::Lt);
    }

    #[test]
    fn test_inclusive_limits() {
        let mut meta = TestItemMeta::parametric(1, 100, "VDD", 0.0, 10.0);
        meta.parm_flag = parm_flag::EQUAL_LOW_LIMIT | parm_flag::EQUAL_HIGH_LIMIT;
        let rule = meta.limit_rule();
        assert!(rule.passes(0.0));
        assert!(rule.passes(10.0));
        assert!(rule.fails(10.0001));
        assert_eq!(meta.lo_limit_type(), LimitType::Ge);
        assert_eq!(meta.hi_limit_type(), LimitType::Le);
    }

    #[test]
    fn test_disabled_side_never_fails() {
        let mut meta = TestItemMeta::parametric(1, 100, "LEAK", 0.0, 1.0);
        meta.opt_flag = opt_flag::NO_LOW_LIMIT;
        let rule = meta.limit_rule();
        assert!(rule.passes(-1e9));
        assert!(rule.fails(2.0));
        assert_eq!(meta.lo_limit_type(), LimitType::Na);
    }

    #[test]
    fn test_inclusive_bit_reported_on_disabled_side() {
        let mut meta = TestItemMeta::parametric(1, 100, "LEAK", 0.0, 1.0);
        meta.opt_flag = opt_flag::NO_HIGH_LIMIT;
        meta.parm_flag = parm_flag::EQUAL_HIGH_LIMIT;
        assert_eq!(meta.hi_limit_type(), LimitType::Le);
        assert_eq!(meta.limit_rule().high, LimitSide::Disabled);
        assert!(meta.limit_rule().passes(1e9));
    }

    #[test]
    fn test_unbounded_rule() {
        let mut meta = TestItemMeta::parametric(1, 100, "INFO", 0.0, 0.0);
        meta.opt_flag = opt_flag::NO_LOW_LIMIT | opt_flag::NO_HIGH_LIMIT;
        let rule = meta.limit_rule();
        assert!(rule.is_unbounded());
        assert!(rule.passes(f64::MAX));
    }

    #[test]
    fn test_with_limits_keeps_comparison_kinds() {
        let mut meta = TestItemMeta::parametric(1, 100, "VDD", 0.0, 10.0);
        meta.parm_flag = parm_flag::EQUAL_HIGH_LIMIT;
        let rule = meta.limit_rule().with_limits(-5.0, 15.0);
        assert!(rule.passes(15.0));
        assert!(rule.fails(-5.0));
    }

    #[test]
    fn test_text() {
        let meta = TestItemMeta::functional(3, 2000, "SCAN");
        assert_eq!(meta.text(), "2000:SCAN");
        assert!(!meta.data_type.is_parametric());
    }
}
