//! Per-(test item, die) measurement record

use serde::{Deserialize, Serialize};

use crate::entities::flags::{self, test_flag};
use crate::entities::{DieId, TestId};

/// One numeric result of one test item on one die
///
/// `lo_limit`/`hi_limit` are the limits as they stood when the row was
/// produced; they differ between files when a test program changed limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Measurement {
    pub die_id: DieId,

    pub test_id: TestId,

    pub result: f64,

    /// Per-measurement test flag; [`test_flag::TEST_FAILED`] marks a local fail
    #[serde(rename = "TEST_FLG", default)]
    pub test_flag: u8,

    #[serde(rename = "PARM_FLG", default)]
    pub parm_flag: u8,

    #[serde(default)]
    pub opt_flag: u8,

    #[serde(default)]
    pub lo_limit: f64,

    #[serde(default)]
    pub hi_limit: f64,
}

impl Measurement {
    /// Create a passing measurement without limit information
    pub fn new(test_id: TestId, die_id: DieId, result: f64) -> Self {
        Self {
            die_id,
            test_id,
            result,
            test_flag: 0,
            parm_flag: 0,
            opt_flag: 0,
            lo_limit: 0.0,
            hi_limit: 0.0,
        }
    }

    /// Set or clear the failed bit
    pub fn with_failed(mut self, failed: bool) -> Self {
        if failed {
            self.test_flag |= test_flag::TEST_FAILED;
        } else {
            self.test_flag &= !test_flag::TEST_FAILED;
        }
        self
    }

    /// Copy the production-time limits onto the row
    pub fn with_limits(mut self, lo_limit: f64, hi_limit: f64) -> Self {
        self.lo_limit = lo_limit;
        self.hi_limit = hi_limit;
        self
    }

    /// Whether the stored test flag marks this row as failing
    pub fn is_fail(&self) -> bool {
        flags::has(self.test_flag, test_flag::TEST_FAILED)
    }
}
