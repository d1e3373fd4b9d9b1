use clap::Parser;
use stockplotter::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
