//! Per-file header and the row bundle handed over by the parser

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{DieResult, Measurement, TestItemMeta};

/// Static header fields of one loaded file
///
/// Used for session bookkeeping and grouping only; never for capability math.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotHeader {
    /// Identifier linking dies to this file
    #[serde(default)]
    pub file_id: u32,

    #[serde(default)]
    pub lot_id: String,

    #[serde(default)]
    pub sblot_id: String,

    #[serde(default)]
    pub wafer_id: String,

    #[serde(default)]
    pub test_cod: String,

    #[serde(default)]
    pub flow_id: String,

    #[serde(default)]
    pub part_typ: String,

    #[serde(default)]
    pub job_nam: String,

    #[serde(default)]
    pub node_nam: String,

    /// Setup time, seconds since the epoch
    #[serde(default)]
    pub setup_t: i64,

    /// Start time, seconds since the epoch
    #[serde(default)]
    pub start_t: i64,

    #[serde(default)]
    pub site_cnt: u8,
}

impl LotHeader {
    pub fn new(file_id: u32, lot_id: &str) -> Self {
        Self {
            file_id,
            lot_id: lot_id.to_string(),
            ..Default::default()
        }
    }

    /// Start time as a timestamp, `None` when unset
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        timestamp(self.start_t)
    }

    /// Setup time as a timestamp, `None` when unset
    pub fn setup_time(&self) -> Option<DateTime<Utc>> {
        timestamp(self.setup_t)
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

/// Rows of one parsed file
#[derive(Debug, Clone, Default)]
pub struct LotData {
    pub header: LotHeader,
    pub dies: Vec<DieResult>,
    pub measurements: Vec<Measurement>,
    pub tests: Vec<TestItemMeta>,
}

impl LotData {
    /// Bundle rows under `header`, stamping each die with the header's file id
    pub fn new(
        header: LotHeader,
        mut dies: Vec<DieResult>,
        measurements: Vec<Measurement>,
        tests: Vec<TestItemMeta>,
    ) -> Self {
        for die in &mut dies {
            die.file_id = header.file_id;
        }
        Self {
            header,
            dies,
            measurements,
            tests,
        }
    }
}
