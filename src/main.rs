mod config;
mod filter;
mod helpers;
mod input;
mod kill;
mod manager;
mod process;
mod tui;
mod viewmodel;

use std::{fs::File, path::PathBuf};

use color_eyre::{eyre::WrapErr, Result};
use gumdrop::Options;
use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::{config::Config, kill::SignalTerminator, manager::SystemProvider};

#[derive(Options)]
struct Args {
    #[options(help = "Refresh interval in seconds", meta = "<SECS>")]
    interval: Option<f64>,

    #[options(short = "n", help = "Show at most N processes (0 = all)", meta = "<N>")]
    limit: Option<usize>,

    #[options(help = "Enable debug logging")]
    debug: bool,

    #[options(help = "Log file (default: <tmp>/tasktop.log)", meta = "<FILE>")]
    log_file: Option<PathBuf>,

    #[options(help = "Print help message")]
    help: bool,
}

fn main() -> Result<()> {
    let ops = Args::parse_args_default_or_exit();
    color_eyre::install()?;
    init_logging(&ops)?;

    let mut config = Config::load();
    if let Some(secs) = ops.interval {
        config.refresh_secs = secs;
    }
    if let Some(limit) = ops.limit {
        config.limit = limit;
    }
    tracing::info!(?config, "starting");

    //fail before touching the terminal
    let provider = SystemProvider::new().wrap_err("cannot read process information")?;

    tui::run(&config, provider, SignalTerminator).wrap_err("terminal error")?;
    Ok(())
}

///log to a file, stdout belongs to the tui
fn init_logging(ops: &Args) -> Result<()> {
    let path = ops
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tasktop.log"));
    let log_file =
        File::create(&path).wrap_err_with(|| format!("cannot create log file {}", path.display()))?;
    let log_level = if ops.debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_ansi(false)
                .with_target(false),
        )
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .init();
    Ok(())
}
