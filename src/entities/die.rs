//! Per-die result record

use serde::{Deserialize, Serialize};

use crate::entities::DieId;

/// One row per die: where it sat, how it binned, whether it passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DieResult {
    /// Unique die identifier
    pub die_id: DieId,

    /// Identifier of the lot file this die was read from
    #[serde(default)]
    pub file_id: u32,

    #[serde(default)]
    pub head_num: u8,

    pub site_num: u8,

    pub x_coord: i16,

    pub y_coord: i16,

    pub hard_bin: u16,

    pub soft_bin: u16,

    /// Part-level flag (first test, retest, ...)
    #[serde(rename = "PART_FLG", default)]
    pub part_flag: u8,

    /// Pass/fail flag; note the inverted convention (1 = pass, 0 = fail)
    pub fail_flag: u8,

    /// Total test time in milliseconds
    #[serde(rename = "TEST_T", default)]
    pub test_time: u32,
}

impl DieResult {
    /// `FAIL_FLAG` value of a passing die
    pub const PASS: u8 = 1;

    /// `FAIL_FLAG` value of a failing die
    pub const FAIL: u8 = 0;

    /// `PART_FLG` bit marking a retested part
    pub const RETEST_BIT: u8 = 0b10;

    /// Create a passing die at the given site with bin 1
    pub fn new(die_id: DieId, site_num: u8) -> Self {
        Self {
            die_id,
            file_id: 0,
            head_num: 1,
            site_num,
            x_coord: 0,
            y_coord: 0,
            hard_bin: 1,
            soft_bin: 1,
            part_flag: 0,
            fail_flag: Self::PASS,
            test_time: 0,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.fail_flag == Self::PASS
    }

    pub fn is_retest(&self) -> bool {
        self.part_flag & Self::RETEST_BIT == Self::RETEST_BIT
    }
}
