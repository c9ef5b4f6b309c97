//! Die grouping and the wide chart frame
//!
//! A group key has two halves, `{group}@{sub_group}`. Each half joins the
//! stringified values of its columns with `|`, or is `*` when no column is
//! selected. Grouping only partitions rows for charts and exports; it never
//! feeds the capability math.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::Serialize;

use crate::core::config::AnalysisConfig;
use crate::core::error::IntegrityError;
use crate::core::tables::RecordTables;
use crate::entities::{DieResult, LotHeader, TestId};

/// Column a die can be grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupColumn {
    // header columns
    FileId,
    LotId,
    SblotId,
    WaferId,
    TestCod,
    FlowId,
    PartTyp,
    JobNam,
    NodeNam,
    // die columns
    HeadNum,
    SiteNum,
    XCoord,
    YCoord,
    HardBin,
    SoftBin,
    PartFlg,
    FailFlag,
}

impl GroupColumn {
    pub const ALL: [GroupColumn; 17] = [
        GroupColumn::FileId,
        GroupColumn::LotId,
        GroupColumn::SblotId,
        GroupColumn::WaferId,
        GroupColumn::TestCod,
        GroupColumn::FlowId,
        GroupColumn::PartTyp,
        GroupColumn::JobNam,
        GroupColumn::NodeNam,
        GroupColumn::HeadNum,
        GroupColumn::SiteNum,
        GroupColumn::XCoord,
        GroupColumn::YCoord,
        GroupColumn::HardBin,
        GroupColumn::SoftBin,
        GroupColumn::PartFlg,
        GroupColumn::FailFlag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            GroupColumn::FileId => "FILE_ID",
            GroupColumn::LotId => "LOT_ID",
            GroupColumn::SblotId => "SBLOT_ID",
            GroupColumn::WaferId => "WAFER_ID",
            GroupColumn::TestCod => "TEST_COD",
            GroupColumn::FlowId => "FLOW_ID",
            GroupColumn::PartTyp => "PART_TYP",
            GroupColumn::JobNam => "JOB_NAM",
            GroupColumn::NodeNam => "NODE_NAM",
            GroupColumn::HeadNum => "HEAD_NUM",
            GroupColumn::SiteNum => "SITE_NUM",
            GroupColumn::XCoord => "X_COORD",
            GroupColumn::YCoord => "Y_COORD",
            GroupColumn::HardBin => "HARD_BIN",
            GroupColumn::SoftBin => "SOFT_BIN",
            GroupColumn::PartFlg => "PART_FLG",
            GroupColumn::FailFlag => "FAIL_FLAG",
        }
    }

    /// Stringified value of this column for one die
    ///
    /// Header columns of a die whose file has no header are empty.
    pub fn value(&self, header: Option<&LotHeader>, die: &DieResult) -> String {
        let text = |f: fn(&LotHeader) -> &str| header.map(f).unwrap_or_default().to_string();
        match self {
            GroupColumn::FileId => die.file_id.to_string(),
            GroupColumn::LotId => text(|h| h.lot_id.as_str()),
            GroupColumn::SblotId => text(|h| h.sblot_id.as_str()),
            GroupColumn::WaferId => text(|h| h.wafer_id.as_str()),
            GroupColumn::TestCod => text(|h| h.test_cod.as_str()),
            GroupColumn::FlowId => text(|h| h.flow_id.as_str()),
            GroupColumn::PartTyp => text(|h| h.part_typ.as_str()),
            GroupColumn::JobNam => text(|h| h.job_nam.as_str()),
            GroupColumn::NodeNam => text(|h| h.node_nam.as_str()),
            GroupColumn::HeadNum => die.head_num.to_string(),
            GroupColumn::SiteNum => die.site_num.to_string(),
            GroupColumn::XCoord => die.x_coord.to_string(),
            GroupColumn::YCoord => die.y_coord.to_string(),
            GroupColumn::HardBin => die.hard_bin.to_string(),
            GroupColumn::SoftBin => die.soft_bin.to_string(),
            GroupColumn::PartFlg => die.part_flag.to_string(),
            GroupColumn::FailFlag => die.fail_flag.to_string(),
        }
    }
}

impl std::fmt::Display for GroupColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for GroupColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase().replace('-', "_");
        GroupColumn::ALL
            .iter()
            .find(|col| col.name() == upper)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = GroupColumn::ALL.iter().map(|c| c.name()).collect();
                format!("Unknown group column: {}. Use one of {}", s, names.join(", "))
            })
    }
}

/// Selected group and sub-group columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouping {
    pub group: Vec<GroupColumn>,
    pub sub_group: Vec<GroupColumn>,
}

impl Grouping {
    pub fn new(group: Vec<GroupColumn>, sub_group: Vec<GroupColumn>) -> Self {
        Self { group, sub_group }
    }

    /// `{group}@{sub_group}` key of one die
    pub fn key(&self, config: &AnalysisConfig, header: Option<&LotHeader>, die: &DieResult) -> String {
        format!(
            "{}{}{}",
            half_key(&self.group, config, header, die),
            config.group_joiner,
            half_key(&self.sub_group, config, header, die)
        )
    }
}

fn half_key(
    columns: &[GroupColumn],
    config: &AnalysisConfig,
    header: Option<&LotHeader>,
    die: &DieResult,
) -> String {
    if columns.is_empty() {
        return config.group_wildcard.clone();
    }
    columns
        .iter()
        .map(|col| col.value(header, die))
        .collect::<Vec<_>>()
        .join(&config.group_separator)
}

/// Partition the live dies into named buckets
pub fn group_dies(
    tables: &RecordTables,
    headers: &BTreeMap<u32, LotHeader>,
    grouping: &Grouping,
    config: &AnalysisConfig,
) -> BTreeMap<String, Vec<DieResult>> {
    let mut groups: BTreeMap<String, Vec<DieResult>> = BTreeMap::new();
    for die in tables.dies() {
        let key = grouping.key(config, headers.get(&die.file_id), die);
        groups.entry(key).or_default().push(die.clone());
    }
    groups
}

/// One die of the chart frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub group: String,
    pub die: DieResult,
    /// RESULT per requested test id, in request order
    pub values: Vec<Option<f64>>,
}

/// Wide table of results: one row per die, one column per test item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartFrame {
    pub test_ids: Vec<TestId>,
    /// Display text per column, `"{TEST_NUM}:{TEST_TXT}"`
    pub columns: Vec<String>,
    pub rows: Vec<ChartRow>,
}

impl ChartFrame {
    /// Non-missing values of one column
    pub fn column(&self, test_id: TestId) -> Vec<f64> {
        let Some(index) = self.test_ids.iter().position(|id| *id == test_id) else {
            return Vec::new();
        };
        self.rows.iter().filter_map(|row| row.values[index]).collect()
    }

    /// Distinct group keys present, in sorted order
    pub fn groups(&self) -> BTreeSet<String> {
        self.rows.iter().map(|row| row.group.clone()).collect()
    }
}

/// Build the chart frame for the requested test ids
///
/// With a selection, only dies whose group key is selected are kept.
pub fn chart_frame(
    tables: &RecordTables,
    headers: &BTreeMap<u32, LotHeader>,
    grouping: &Grouping,
    config: &AnalysisConfig,
    test_ids: &[TestId],
    selection: Option<&BTreeSet<String>>,
) -> Result<ChartFrame, IntegrityError> {
    let mut columns = Vec::with_capacity(test_ids.len());
    for test_id in test_ids {
        let meta = tables
            .test(*test_id)
            .ok_or(IntegrityError::UnknownTest { test_id: *test_id })?;
        columns.push(meta.text());
    }

    let mut rows = Vec::new();
    for die in tables.dies() {
        let group = grouping.key(config, headers.get(&die.file_id), die);
        if selection.is_some_and(|selected| !selected.contains(&group)) {
            continue;
        }
        let values = test_ids
            .iter()
            .map(|test_id| tables.measurement(*test_id, die.die_id).map(|row| row.result))
            .collect();
        rows.push(ChartRow {
            group,
            die: die.clone(),
            values,
        });
    }

    Ok(ChartFrame {
        test_ids: test_ids.to_vec(),
        columns,
        rows,
    })
}
