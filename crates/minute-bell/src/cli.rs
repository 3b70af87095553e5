use std::path::PathBuf;

use clap::Parser;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", ",
    env!("BUILD_DATE"),
    ")"
);

/// Countdown to the daily minute of silence at 9:00 Kyiv time.
#[derive(Parser, Debug, Default)]
#[command(name = "minute-bell", version = VERSION)]
pub struct Args {
    /// Optional config file (TOML); defaults to config.toml next to the executable
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// List output devices and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Use a specific output device by substring match
    #[arg(long)]
    pub device: Option<String>,

    /// Output volume in percent (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: Option<u8>,

    /// Declaration clip played just before 9:00
    #[arg(long)]
    pub declaration: Option<PathBuf>,

    /// Run as if the Kyiv clock currently read HH:MM[:SS]
    #[arg(long, value_name = "HH:MM[:SS]")]
    pub start_at: Option<String>,

    /// Never show the volume check
    #[arg(long)]
    pub no_volume_check: bool,
}
