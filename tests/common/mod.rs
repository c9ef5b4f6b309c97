//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo;
use assert_cmd::Command;
use dct::entities::{DieResult, Measurement, TestItemMeta};
use serde::Serialize;
use tempfile::TempDir;

/// Test id of the parametric item with five out-of-limit dies
pub const IDD: u32 = 1;

/// Test id of the parametric item every die passes
pub const VOUT: u32 = 2;

/// Helper to get a dct command
pub fn dct() -> Command {
    Command::new(cargo::cargo_bin!("dct"))
}

/// 100 dies on four sites
///
/// IDD has limits (0, 10); dies 1-5 read 12.0 and fail, the rest read
/// 4.0..=6.0 in steps of 0.5 by die id. VOUT has limits (0, 5) and every
/// die reads 2.0..=2.2.
pub fn hundred_die_lot() -> (Vec<DieResult>, Vec<Measurement>, Vec<TestItemMeta>) {
    let mut dies = Vec::new();
    let mut rows = Vec::new();
    for id in 1..=100u32 {
        let mut die = DieResult::new(id, (id % 4) as u8);
        die.x_coord = (id % 10) as i16;
        die.y_coord = (id / 10) as i16;
        die.test_time = 100;
        let failing = id <= 5;
        if failing {
            die.fail_flag = DieResult::FAIL;
            die.hard_bin = 5;
            die.soft_bin = 50;
        }
        dies.push(die);

        let idd = if failing { 12.0 } else { 4.0 + (id % 5) as f64 * 0.5 };
        rows.push(
            Measurement::new(IDD, id, idd)
                .with_failed(failing)
                .with_limits(0.0, 10.0),
        );
        rows.push(Measurement::new(VOUT, id, 2.0 + (id % 3) as f64 * 0.1).with_limits(0.0, 5.0));
    }
    let tests = vec![
        TestItemMeta::parametric(IDD, 100, "IDD", 0.0, 10.0),
        TestItemMeta::parametric(VOUT, 200, "VOUT", 0.0, 5.0),
    ];
    (dies, rows, tests)
}

/// Write the lot as CSV tables into `dir`
pub fn write_lot_dir(
    dir: &Path,
    dies: &[DieResult],
    rows: &[Measurement],
    tests: &[TestItemMeta],
) {
    fs::create_dir_all(dir).unwrap();
    write_table(&dir.join("dies.csv"), dies);
    write_table(&dir.join("measurements.csv"), rows);
    write_table(&dir.join("tests.csv"), tests);
}

fn write_table<T: Serialize>(path: &Path, records: &[T]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    for record in records {
        writer.serialize(record).unwrap();
    }
    writer.flush().unwrap();
}

/// Write the 100-die lot into a temp directory as `LOT1`
pub fn setup_lot_dir() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("LOT1");
    let (dies, rows, tests) = hundred_die_lot();
    write_lot_dir(&dir, &dies, &rows, &tests);
    (tmp, dir)
}
