use clap::Parser;
use stocklens::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
