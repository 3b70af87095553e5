//! Minute Bell: a terminal countdown to the daily minute of silence at 9:00 Kyiv time.
//!
//! Once a second the Kyiv wall clock is mapped to a phase. Before 8:50 the screen
//! shows the current time; from 8:50 it counts down the seconds to 9:00, plays the
//! declaration clip seven seconds before, and during 9:00 sounds a short bang every
//! two seconds. Audio goes through a single CPAL output session.

use anyhow::Result;
use clap::Parser;
use minute_bell::{cli, config, runtime};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,minute_bell=info,minute_audio=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    if args.list_devices {
        minute_audio::device::list_devices(&cpal::default_host())?;
        return Ok(());
    }

    let (cfg, base_dir) = config::load_config(args.config.as_deref())?;
    let settings = config::resolve(&args, &cfg, base_dir.as_deref())?;
    runtime::run(settings)
}
