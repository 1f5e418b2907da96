pub mod aggregate;
pub mod alerts;
pub mod cli;
pub mod data_api;
pub mod enrich;
pub mod error;
pub mod partners;
pub mod ranking;
pub mod records;
pub mod services;
pub mod state;
pub mod types;
pub mod util;

use clap::Parser;

/// Parse the command line, set up logging and run one command.
pub fn run() -> i32 {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = cli::Cli::parse();
    log::debug!("Running {:?}", cli.command);
    cli::execute(cli)
}
