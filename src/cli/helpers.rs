//! Shared helper functions for CLI commands
//!
//! Dataset loading, argument parsers and small formatting utilities used
//! across the command modules.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::{GlobalOpts, InputArgs};
use crate::core::{AnalysisConfig, AnalysisSession, CandidateLimits};
use crate::entities::TestId;
use crate::io;

/// Load the config and every lot directory into an analyzed session
pub fn load_session(input: &InputArgs, global: &GlobalOpts) -> Result<AnalysisSession> {
    let config = AnalysisConfig::load(global.config.as_deref()).into_diagnostic()?;
    let lots = io::read_lots(input.lots.as_slice()).into_diagnostic()?;
    let mut session = AnalysisSession::new(config);
    session.load_lots(lots).into_diagnostic()?;
    if !session.analyze().into_diagnostic()? {
        return Err(miette::miette!(
            "{}",
            session.status().unwrap_or("Analysis failed")
        ));
    }
    Ok(session)
}

/// Print a status line on stderr unless `--quiet`
pub fn status(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{} {}", style("•").cyan(), message);
    }
}

/// Print a warning line on stderr unless `--quiet`
pub fn warn(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{} {}", style("!").yellow().bold(), style(message).yellow());
    }
}

/// Parse `ID=LO:HI` into a candidate limit entry
pub fn parse_limit_arg(s: &str) -> Result<(TestId, CandidateLimits), String> {
    let (id, window) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid limit '{}'. Use ID=LO:HI", s))?;
    let (lo, hi) = window
        .split_once(':')
        .ok_or_else(|| format!("Invalid limit '{}'. Use ID=LO:HI", s))?;
    let test_id: TestId = id
        .trim()
        .parse()
        .map_err(|_| format!("Invalid test id '{}'", id))?;
    let lo: f64 = lo
        .trim()
        .parse()
        .map_err(|_| format!("Invalid low limit '{}'", lo))?;
    let hi: f64 = hi
        .trim()
        .parse()
        .map_err(|_| format!("Invalid high limit '{}'", hi))?;
    if lo > hi {
        return Err(format!("Low limit {} is above high limit {}", lo, hi));
    }
    Ok((test_id, CandidateLimits::new(lo, hi)))
}

/// Format an optional statistic, empty when undefined
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
