mod animation;
mod app;
mod args;
mod colour;
mod config;
mod diagnostic;
mod drawing;
mod entry;
mod handlers;
mod logging;
mod orchestrator;
mod process;
mod progress;
mod sequencer;
mod splash;
mod store;
mod wayland;

use args::Args;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), args.verbose);

    match orchestrator::run(&args) {
        Ok(outcome) => {
            log::debug!("Run outcome: {:?}", outcome);
            log::info!("Finished. Exiting cleanly.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
