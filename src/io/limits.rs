//! Candidate limit files
//!
//! YAML map from test id to a `{lo, hi}` window:
//!
//! ```yaml
//! 1001: { lo: -5.0, hi: 15.0 }
//! 1002: { lo: 0.2, hi: 0.8 }
//! ```

use std::fs;
use std::path::Path;

use crate::core::revision::LimitMap;
use crate::io::LoadError;

/// Parse a candidate limit file
pub fn read_limits(path: &Path) -> Result<LimitMap, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_limits(&content).map_err(|message| LoadError::Yaml {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse candidate limits from YAML text; an empty document is an empty map
pub fn parse_limits(content: &str) -> Result<LimitMap, String> {
    if content.trim().is_empty() {
        return Ok(LimitMap::new());
    }
    let limits: LimitMap = serde_yml::from_str(content).map_err(|e| e.to_string())?;
    for (test_id, window) in &limits {
        if window.lo > window.hi {
            return Err(format!(
                "test {}: lo ({}) is above hi ({})",
                test_id, window.lo, window.hi
            ));
        }
    }
    Ok(limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::revision::CandidateLimits;
    use tempfile::tempdir;

    #[test]
    fn test_parse_limits() {
        let limits = parse_limits("1: { lo: -5.0, hi: 15.0 }\n7:\n  lo: 0\n  hi: 1.5\n").unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[&1], CandidateLimits::new(-5.0, 15.0));
        assert_eq!(limits[&7].hi, 1.5);
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_limits("\n").unwrap().is_empty());
    }

    #[test]
    fn test_inverted_window_rejected() {
        let err = parse_limits("3: { lo: 2, hi: 1 }").unwrap_err();
        assert!(err.contains("test 3"));
    }

    #[test]
    fn test_read_limits_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("limits.yaml");
        fs::write(&path, "5: { lo: 0, hi: 10 }\n").unwrap();
        assert_eq!(read_limits(&path).unwrap()[&5].hi, 10.0);
        assert!(matches!(
            read_limits(&tmp.path().join("missing.yaml")),
            Err(LoadError::Io { .. })
        ));
    }
}
