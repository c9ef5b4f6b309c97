//! `dct summary` command - bin, site, test time and retest figures

use clap::ValueEnum;
use miette::{miette, IntoDiagnostic, Result};

use crate::cli::helpers::{load_session, truncate_str};
use crate::cli::output::{effective_format, emit, Grid};
use crate::cli::{GlobalOpts, InputArgs, OutputFormat};
use crate::core::summary::{self, BinKind, LotSummary};
use crate::entities::DieResult;

/// CLI-friendly bin column
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliBinKind {
    Hard,
    Soft,
}

impl From<CliBinKind> for BinKind {
    fn from(cli: CliBinKind) -> Self {
        match cli {
            CliBinKind::Hard => BinKind::Hard,
            CliBinKind::Soft => BinKind::Soft,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only print the bin table for this bin column
    #[arg(long, value_enum)]
    pub bin: Option<CliBinKind>,

    /// Only print items tested under differing limits
    #[arg(long, conflicts_with = "bin")]
    pub limit_diff: bool,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(&args.input, global)?;

    if args.limit_diff {
        let diffs = session.limit_differences();
        let mut grid = Grid::new(&["TEST_ID", "ITEM", "LIMITS"]);
        for diff in &diffs {
            let limits: Vec<String> = diff
                .limits
                .iter()
                .map(|(lo, hi)| format!("[{}, {}]", lo, hi))
                .collect();
            grid.push(vec![
                diff.test_id.to_string(),
                truncate_str(&diff.text, 32),
                limits.join(" "),
            ]);
        }
        return emit(global.format, &diffs, &grid);
    }

    let lot = session
        .lot_summary()
        .ok_or_else(|| miette!("No dataset loaded"))?;

    if let Some(kind) = args.bin {
        let dies: Vec<DieResult> = session
            .tables()
            .map(|t| t.dies().cloned().collect())
            .unwrap_or_default();
        let bins = summary::bin_statistics(&dies, kind.into());
        return emit(global.format, &bins, &bin_grid(&bins));
    }

    match effective_format(global.format, false) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&lot).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&lot).into_diagnostic()?);
        }
        OutputFormat::Csv => overview_grid(&lot).write_csv(std::io::stdout().lock())?,
        OutputFormat::Table | OutputFormat::Auto => {
            println!("{}", overview_grid(&lot).to_table());
            println!("{}", bin_grid(&lot.hard_bins).to_table());
            println!("{}", bin_grid(&lot.soft_bins).to_table());
        }
    }
    Ok(())
}

fn bin_grid(bins: &[summary::BinStat]) -> Grid {
    let mut grid = Grid::new(&["BIN", "TYPE", "QTY", "PCT", "SITES"]);
    for bin in bins {
        let sites: Vec<String> = bin
            .sites
            .iter()
            .map(|(site, share)| format!("{}:{}", site, share.qty))
            .collect();
        grid.push(vec![
            bin.bin.to_string(),
            bin.bin_type.to_string(),
            bin.qty.to_string(),
            format!("{:.2}", bin.percentage),
            sites.join(" "),
        ]);
    }
    grid
}

fn overview_grid(lot: &LotSummary) -> Grid {
    let mut grid = Grid::new(&["SITE", "TOTAL", "PASS", "FAIL", "PASS_RATE"]);
    let mut push = |label: String, stat: &summary::YieldStat| {
        grid.push(vec![
            label,
            stat.total.to_string(),
            stat.pass.to_string(),
            stat.fail.to_string(),
            format!("{:.2}", stat.pass_rate),
        ]);
    };
    push("ALL".to_string(), &lot.sites.all);
    for (site, stat) in &lot.sites.sites {
        push(site.to_string(), stat);
    }
    grid.push(vec![
        "TEST_T".to_string(),
        lot.test_time.all.to_string(),
        lot.test_time.pass_only.to_string(),
        String::new(),
        String::new(),
    ]);
    grid.push(vec![
        "RETEST".to_string(),
        lot.retest.fresh.to_string(),
        lot.retest.retest.to_string(),
        String::new(),
        format!("{:.2}", lot.retest.fresh_rate),
    ]);
    grid
}
