mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;
use engine_logging::{default_log_path, engine_info, level_from_name};

use cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    engine_logging::initialize(
        cli.log.into(),
        level_from_name(&cli.log_level),
        &default_log_path(),
    );
    engine_info!("blueprint {} starting: {:?}", env!("CARGO_PKG_VERSION"), cli.command);

    platform::run(cli)
}
