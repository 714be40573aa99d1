use clap::Parser;
use sectrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
