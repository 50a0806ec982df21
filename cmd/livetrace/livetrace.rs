use clap::Parser;
use livetrace_cli::cli::{self, CLI};

fn main() -> eyre::Result<()> {
    let CLI { opts, command } = CLI::parse();

    if let Some(subcommand) = command {
        return subcommand.run(&opts);
    }

    cli::run(&opts)
}
