//! `dct revise` command - what-if limit revision
//!
//! Steps run in a fixed order: apply candidate limits, drop dies by window,
//! narrow to test ids, restore, reset. Any step whose preconditions fail
//! aborts the command with the session's status message.

use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use std::sync::mpsc;

use crate::cli::helpers::{fmt_opt, load_session, parse_limit_arg, status, truncate_str};
use crate::cli::output::{emit, Grid};
use crate::cli::{GlobalOpts, InputArgs};
use crate::core::{
    AnalysisSession, CandidateLimits, IntegrityError, LimitMap, SessionEvent, WindowMode,
};
use crate::entities::{CapabilityResult, TestId};
use crate::io;

#[derive(clap::Args, Debug)]
pub struct ReviseArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// YAML file mapping test id to `{lo, hi}`
    #[arg(long)]
    pub limits: Option<PathBuf>,

    /// Candidate limit as ID=LO:HI (repeatable, overrides --limits)
    #[arg(long = "limit", short = 'l', value_parser = parse_limit_arg)]
    pub limit: Vec<(TestId, CandidateLimits)>,

    /// Remove dies inside (inner) or outside (outer) the candidate windows
    #[arg(long)]
    pub drop: Option<WindowMode>,

    /// Keep only these test ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<TestId>,

    /// Recompute with the original limits on the current dies
    #[arg(long)]
    pub restore: bool,

    /// Return to the dataset as loaded
    #[arg(long)]
    pub reset: bool,

    /// Only list items whose limits were revised
    #[arg(long)]
    pub changed_only: bool,
}

pub fn run(args: ReviseArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = load_session(&args.input, global)?;
    let (tx, rx) = mpsc::channel();
    session.subscribe(tx);

    let mut limits: LimitMap = match &args.limits {
        Some(path) => io::read_limits(path).into_diagnostic()?,
        None => LimitMap::new(),
    };
    limits.extend(args.limit.iter().copied());

    if !limits.is_empty() {
        step(&mut session, |s| s.apply_limit_revision(&limits))?;
    }
    if let Some(mode) = args.drop {
        step(&mut session, |s| s.drop_rows_by_limit_window(mode, &LimitMap::new()))?;
    }
    if !args.only.is_empty() {
        step(&mut session, |s| s.restrict_to_test_ids(&args.only))?;
    }
    if args.restore {
        step(&mut session, |s| s.restore_original_limits())?;
    }
    if args.reset {
        step(&mut session, |s| s.reset_to_original())?;
    }

    for event in rx.try_iter() {
        if let SessionEvent::Status(message) = event {
            status(global, &message);
        }
    }

    let results: Vec<&CapabilityResult> = session
        .capability_results()
        .iter()
        .filter(|r| !args.changed_only || is_revised(r))
        .collect();

    let mut grid = Grid::new(&[
        "TEST_ID", "ITEM", "LO", "HI", "NEW_LO", "NEW_HI", "CPK", "FAIL_QTY", "FAIL_RATE",
        "NEW_FAIL_RATE", "RESCUED",
    ]);
    for r in &results {
        grid.push(vec![
            r.test_id.to_string(),
            truncate_str(&r.text, 32),
            r.lo_limit.to_string(),
            r.hi_limit.to_string(),
            fmt_opt(r.new_lo_limit),
            fmt_opt(r.new_hi_limit),
            fmt_opt(r.cpk),
            r.fail_qty.to_string(),
            r.fail_rate.clone(),
            r.new_fail_rate.clone().unwrap_or_default(),
            r.rescued_fail_count.map(|n| n.to_string()).unwrap_or_default(),
        ]);
    }
    emit(global.format, &results, &grid)?;
    status(global, &format!("State: {}", session.state()));
    Ok(())
}

/// Whether the candidate window differs from the item's own limits
fn is_revised(r: &CapabilityResult) -> bool {
    r.new_lo_limit.is_some_and(|lo| lo != r.lo_limit)
        || r.new_hi_limit.is_some_and(|hi| hi != r.hi_limit)
}

/// Run one session operation, failing the command when it is skipped
fn step<F>(session: &mut AnalysisSession, op: F) -> Result<()>
where
    F: FnOnce(&mut AnalysisSession) -> Result<bool, IntegrityError>,
{
    if op(session).into_diagnostic()? {
        return Ok(());
    }
    let message = session.status().unwrap_or("Operation skipped").to_string();
    Err(miette::miette!("{}", message))
}
