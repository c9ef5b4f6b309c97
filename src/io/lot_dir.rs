//! Lot directories: three CSV tables plus an optional YAML header

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::entities::{DieResult, LotData, LotHeader, Measurement, TestItemMeta};
use crate::io::LoadError;

pub const DIES_FILE: &str = "dies.csv";
pub const MEASUREMENTS_FILE: &str = "measurements.csv";
pub const TESTS_FILE: &str = "tests.csv";
pub const HEADER_FILE: &str = "header.yaml";

/// Read one lot directory
///
/// `file_id` is used when the header does not set one (or there is no
/// header); the lot id then defaults to the directory name.
pub fn read_lot_dir(dir: &Path, file_id: u32) -> Result<LotData, LoadError> {
    let header_path = dir.join(HEADER_FILE);
    let mut header = if header_path.exists() {
        let content = fs::read_to_string(&header_path).map_err(|source| LoadError::Io {
            path: header_path.clone(),
            source,
        })?;
        serde_yml::from_str::<LotHeader>(&content).map_err(|e| LoadError::Yaml {
            path: header_path.clone(),
            message: e.to_string(),
        })?
    } else {
        LotHeader::default()
    };
    if header.file_id == 0 {
        header.file_id = file_id;
    }
    if header.lot_id.is_empty() {
        header.lot_id = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
    }

    let dies: Vec<DieResult> = read_table(dir, DIES_FILE)?;
    let measurements: Vec<Measurement> = read_table(dir, MEASUREMENTS_FILE)?;
    let tests: Vec<TestItemMeta> = read_table(dir, TESTS_FILE)?;
    tracing::debug!(
        dir = %dir.display(),
        file_id = header.file_id,
        dies = dies.len(),
        measurements = measurements.len(),
        tests = tests.len(),
        "lot directory read"
    );
    Ok(LotData::new(header, dies, measurements, tests))
}

/// Read several lot directories, numbering files from 1 in order
pub fn read_lots(dirs: &[impl AsRef<Path>]) -> Result<Vec<LotData>, LoadError> {
    dirs.iter()
        .enumerate()
        .map(|(i, dir)| read_lot_dir(dir.as_ref(), i as u32 + 1))
        .collect()
}

fn read_table<T: DeserializeOwned>(dir: &Path, file: &'static str) -> Result<Vec<T>, LoadError> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(LoadError::MissingFile {
            dir: dir.to_path_buf(),
            file,
        });
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|source| LoadError::Csv {
            path: path.clone(),
            source,
        })?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|source| LoadError::Csv { path, source })
}
