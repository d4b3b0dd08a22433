mod cli;
mod control;
mod paths;
mod run;
mod sink;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Wedge(args)) => run::run_wedge(args),
        Some(Command::Warp(args)) => run::run_warp(args),
        None => run::run(cli.run),
    }
}
