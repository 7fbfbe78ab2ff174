//! sizing - effort sizing and task scheduling from the command line.

use clap::Parser;
use sizing::cli::Cli;
use sizing::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    if let Err(err) = cli.run() {
        let code = err.exit_code();
        eprintln!("error: {:#}", anyhow::Error::new(err));
        std::process::exit(code);
    }
}
