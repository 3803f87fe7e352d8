use crate::sequencer::DEFAULT_TICK;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Launch programs in order behind a resolution-aware loading screen"
)]
pub struct Args {
    /// Specify a custom configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output to detect the resolution of and cover (e.g., DP-1, HDMI-A-1)
    #[arg(short, long)]
    pub display: Option<String>,

    /// Use this resolution instead of asking the compositor (e.g., 1920x1080)
    #[arg(long, value_parser = parse_resolution)]
    pub resolution: Option<String>,

    /// Progress update interval in milliseconds
    #[arg(
        long,
        default_value_t = DEFAULT_TICK.as_millis() as u64,
        value_parser = clap::value_parser!(u64).range(10..=1000)
    )]
    pub tick_ms: u64,

    /// Append log lines to this file instead of loadscreen.log next to the executable
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the launch plan for the detected profile and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Log debug messages
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

fn parse_resolution(value: &str) -> Result<String, String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let valid = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !valid(width) || !valid(height) {
        return Err(format!("expected WIDTHxHEIGHT, got '{}'", value));
    }
    Ok(value.to_string())
}
