//! `dct cap` command - capability report per test item

use clap::ValueEnum;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::collections::BTreeSet;

use crate::cli::helpers::{fmt_opt, load_session, truncate_str};
use crate::cli::output::{effective_format, emit, Grid};
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};
use crate::core::report::{self, ReportSummary};
use crate::entities::{CapabilityResult, TestId};

/// Sort direction for the Cpk column
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CpkSort {
    Asc,
    Desc,
}

#[derive(clap::Args, Debug)]
pub struct CapArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only report these test ids (comma separated)
    #[arg(long, short = 't', value_delimiter = ',')]
    pub tests: Vec<TestId>,

    /// Drop items without a Cpk or with a zero standard deviation
    #[arg(long)]
    pub valid_only: bool,

    /// Sort by Cpk; items without a Cpk go last
    #[arg(long, value_enum)]
    pub sort: Option<CpkSort>,

    /// Print aggregate Cpk statistics instead of the item list
    #[arg(long, conflicts_with = "pareto")]
    pub summary: bool,

    /// Print the lowest-Cpk items with their fail counts
    #[arg(long)]
    pub pareto: bool,
}

pub fn run(args: CapArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(&args.input, global)?;

    let mut results: Vec<CapabilityResult> = if args.tests.is_empty() {
        session.capability_results().to_vec()
    } else {
        let wanted: BTreeSet<TestId> = args.tests.iter().copied().collect();
        session
            .capability_results()
            .iter()
            .filter(|r| wanted.contains(&r.test_id))
            .cloned()
            .collect()
    };
    if args.valid_only {
        results = report::filter_valid_items(&results);
    }
    if let Some(sort) = args.sort {
        results = report::sort_by_cpk(&results, matches!(sort, CpkSort::Asc));
    }

    if args.summary {
        return print_summary(&report::summary_statistics(&results), global);
    }

    if args.pareto {
        let entries = report::pareto(&results, session.config().pareto_top_n);
        let mut grid = Grid::new(&["ITEM", "CPK", "FAIL_QTY"]);
        for entry in &entries {
            grid.push(vec![
                truncate_str(&entry.label, 40),
                fmt_opt(entry.cpk),
                entry.fail_qty.to_string(),
            ]);
        }
        return emit(global.format, &entries, &grid);
    }

    let mut grid = Grid::new(&[
        "TEST_ID", "ITEM", "UNITS", "LO", "HI", "AVG", "STD", "CPK", "CP", "SIGMA", "QTY",
        "FAIL_QTY", "FAIL_RATE", "REJECT_QTY", "REJECT_RATE",
    ]);
    for r in &results {
        grid.push(vec![
            r.test_id.to_string(),
            truncate_str(&r.text, 32),
            r.units.clone(),
            r.lo_limit.to_string(),
            r.hi_limit.to_string(),
            fmt_opt(r.avg),
            fmt_opt(r.std),
            fmt_opt(r.cpk),
            fmt_opt(r.cp),
            fmt_opt(r.sigma_level),
            r.qty.to_string(),
            r.fail_qty.to_string(),
            r.fail_rate.clone(),
            r.reject_qty.to_string(),
            r.reject_rate.clone(),
        ]);
    }
    emit(global.format, &results, &grid)?;

    if matches!(effective_format(global.format, true), OutputFormat::Table) && !global.quiet {
        eprintln!(
            "{} test item(s), {} die(s)",
            style(results.len()).cyan(),
            style(session.tables().map(|t| t.die_count()).unwrap_or(0)).cyan()
        );
    }
    Ok(())
}

fn print_summary(summary: &ReportSummary, global: &GlobalOpts) -> Result<()> {
    match effective_format(global.format, false) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(summary).into_diagnostic()?);
        }
        OutputFormat::Csv | OutputFormat::Table | OutputFormat::Auto => {
            let mut grid = Grid::new(&["METRIC", "VALUE"]);
            let share = |n: usize| format!("{} ({:.1}%)", n, summary.share(n));
            grid.push(vec!["Items".to_string(), summary.total_items.to_string()]);
            grid.push(vec!["Cpk avg".to_string(), fmt_opt(summary.cpk_avg)]);
            grid.push(vec!["Cpk min".to_string(), fmt_opt(summary.cpk_min)]);
            grid.push(vec!["Cpk max".to_string(), fmt_opt(summary.cpk_max)]);
            grid.push(vec!["Cpk < 1".to_string(), share(summary.cpk_lt_1)]);
            grid.push(vec!["1 <= Cpk < 1.33".to_string(), share(summary.cpk_1_to_1_33)]);
            grid.push(vec!["Cpk >= 1.33".to_string(), share(summary.cpk_ge_1_33)]);
            grid.push(vec!["Sigma avg".to_string(), fmt_opt(summary.sigma_avg)]);
            if matches!(global.format, OutputFormat::Csv) {
                grid.write_csv(std::io::stdout().lock())?;
            } else {
                println!("{}", grid.to_table());
            }
        }
    }
    Ok(())
}
