//! `dct group` command - partition dies and export per-die chart data

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::cli::helpers::{fmt_opt, load_session, status, warn};
use crate::cli::output::{emit, Grid};
use crate::cli::{GlobalOpts, InputArgs};
use crate::core::{format_rate, GroupColumn};
use crate::entities::TestId;

#[derive(clap::Args, Debug)]
pub struct GroupArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Group columns, e.g. LOT_ID,WAFER_ID
    #[arg(long, value_delimiter = ',')]
    pub by: Vec<GroupColumn>,

    /// Sub-group columns, e.g. SITE_NUM
    #[arg(long, value_delimiter = ',')]
    pub sub: Vec<GroupColumn>,

    /// Emit one row per die with the results of these test ids
    #[arg(long, short = 't', value_delimiter = ',')]
    pub tests: Vec<TestId>,

    /// Keep only these group keys (repeatable)
    #[arg(long)]
    pub select: Vec<String>,
}

/// Die counts of one group
#[derive(Debug, Serialize)]
struct GroupRow {
    group: String,
    dies: usize,
    pass: usize,
    yield_rate: String,
}

pub fn run(args: GroupArgs, global: &GlobalOpts) -> Result<()> {
    let mut session = load_session(&args.input, global)?;
    let groups = session.group_by(&args.by, &args.sub);

    let selection: Option<BTreeSet<String>> = if args.select.is_empty() {
        None
    } else {
        for key in &args.select {
            if !groups.contains_key(key) {
                warn(global, &format!("No dies in group '{}'", key));
            }
        }
        Some(args.select.iter().cloned().collect())
    };

    if args.tests.is_empty() {
        let precision = session.config().rate_precision;
        let rows: Vec<GroupRow> = groups
            .iter()
            .filter(|(key, _)| selection.as_ref().is_none_or(|s| s.contains(*key)))
            .map(|(key, dies)| {
                let pass = dies.iter().filter(|d| d.is_pass()).count();
                GroupRow {
                    group: key.clone(),
                    dies: dies.len(),
                    pass,
                    yield_rate: format_rate(pass, dies.len(), precision),
                }
            })
            .collect();

        let mut grid = Grid::new(&["GROUP", "DIES", "PASS", "YIELD"]);
        for row in &rows {
            grid.push(vec![
                row.group.clone(),
                row.dies.to_string(),
                row.pass.to_string(),
                row.yield_rate.clone(),
            ]);
        }
        emit(global.format, &rows, &grid)?;
        status(global, &format!("{} group(s)", rows.len()));
        return Ok(());
    }

    session.select_groups(selection);
    let frame = session.chart_frame(&args.tests).into_diagnostic()?;

    let mut headers = vec!["GROUP", "FILE_ID", "DIE_ID", "SITE_NUM", "X", "Y"];
    headers.extend(frame.columns.iter().map(String::as_str));
    let mut grid = Grid::new(&headers);
    for row in &frame.rows {
        let mut cells = vec![
            row.group.clone(),
            row.die.file_id.to_string(),
            row.die.die_id.to_string(),
            row.die.site_num.to_string(),
            row.die.x_coord.to_string(),
            row.die.y_coord.to_string(),
        ];
        cells.extend(row.values.iter().map(|v| fmt_opt(*v)));
        grid.push(cells);
    }
    emit(global.format, &frame, &grid)?;
    status(
        global,
        &format!("{} die(s) in {} group(s)", frame.rows.len(), frame.groups().len()),
    );
    Ok(())
}
