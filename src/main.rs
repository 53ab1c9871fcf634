//! adbsync - mirror a device directory into a local directory over adb

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;

use adbsync::config::load_config;
use adbsync::log::JsonLogger;
use adbsync::logger::{FanoutLogger, Logger, TextLogger};
use adbsync::progress::ConsoleReporter;
use adbsync::{AdbDevice, Args, SyncPlanner, TransferExecutor};

fn main() -> Result<()> {
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // 128 + SIGINT
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let settings = args.resolve(&config)?;

    let console = Arc::new(ConsoleReporter::new(settings.verbose, settings.dry_run));
    let mut logger = FanoutLogger::new();
    logger.push(console.clone());
    if let Some(ref p) = settings.log_file {
        let text = TextLogger::new(p)
            .with_context(|| format!("Failed to open log file {}", p.display()))?;
        logger.push(Arc::new(text));
    }
    if let Some(ref p) = settings.json_log {
        logger.push(Arc::new(JsonLogger::new(p)?));
    }

    if settings.dry_run {
        println!("DRY RUN MODE - No files will be copied");
    }
    let device = AdbDevice::new(&settings.adb, settings.device.clone());
    if settings.verbose {
        println!("Device: {}", device.serial().unwrap_or("(default)"));
        println!("Source: {}", settings.remote_root);
        println!("Destination: {}", settings.local_root.display());
    }

    let start = Instant::now();
    let executor = TransferExecutor::new(&device, settings.dry_run);
    let planner = SyncPlanner::new(&device, executor, &logger);

    let totals = match planner.run(&settings.remote_root, &settings.local_root) {
        Ok(totals) => totals,
        Err(e) => {
            logger.error("sync", &settings.remote_root, &format!("{e:#}"));
            console.finish();
            return Err(e);
        }
    };
    logger.done(totals.considered, totals.copied, start.elapsed().as_secs_f64());
    console.finish();

    let verb = if settings.dry_run { "Would copy" } else { "Copied" };
    println!(
        "{} {} files. {} files already up to date.",
        verb,
        totals.copied,
        totals.up_to_date()
    );
    Ok(())
}
