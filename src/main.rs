use std::io;

use clap::{CommandFactory, Parser};
use dct::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    dct::core::logging::init(&cli.global.log_level);

    match cli.command {
        Commands::Cap(args) => dct::cli::commands::cap::run(args, &cli.global),
        Commands::Revise(args) => dct::cli::commands::revise::run(args, &cli.global),
        Commands::Group(args) => dct::cli::commands::group::run(args, &cli.global),
        Commands::Summary(args) => dct::cli::commands::summary::run(args, &cli.global),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "dct", &mut io::stdout());
            Ok(())
        }
    }
}
