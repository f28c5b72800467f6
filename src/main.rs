use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::runtime::Runtime;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use candle_pulse::app_time::SystemClock;
use candle_pulse::config::CATALOG;
use candle_pulse::data::{CatalogSelection, select_tracked};
use candle_pulse::utils::time_utils::{epoch_ms_to_clock, utc_now_as_timestamp_ms};
use candle_pulse::{
    Cli, Command, ConfluenceScorer, InstrumentCatalog, RemoteCatalog, Scheduler, SchedulerEvent,
    StaticCatalog, describe_settings, load_catalog, spawn_scheduler,
};

fn main() -> Result<()> {
    // A. Init Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    let rt = Runtime::new().expect("Failed to create Tokio runtime");
    rt.block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // C. Configuration (file, flags, then catalog if nothing was named)
    let mut config = args.scheduler_config()?;
    let catalog_mode = Cli::needs_catalog(&config);
    let mut providers: Vec<Box<dyn InstrumentCatalog>> = Vec::new();
    let mut selection = CatalogSelection::default();
    if catalog_mode {
        if !args.offline {
            providers.push(Box::new(RemoteCatalog::new(&args.catalog_url)?));
        }
        providers.push(Box::new(StaticCatalog));

        let (entries, source) = load_catalog(&providers).await;
        selection = CatalogSelection::new(select_tracked(&entries, args.max_pairs));
        config.tracked_instruments = selection.current().to_vec();
        log::info!(
            "📋 Tracking {} instruments from {}",
            config.tracked_instruments.len(),
            source
        );
    }

    let scheduler = Scheduler::from_config(&config);
    log::info!("{}", describe_settings(scheduler.settings()));

    // D. Run until Ctrl-C
    let scorer = Arc::new(ConfluenceScorer::new(args.seed));
    let mut handle = spawn_scheduler(scheduler, Arc::new(SystemClock), scorer);

    // Only ticks when the instruments came from the catalog
    let rescan_period = Duration::from_secs(CATALOG.rescan_secs);
    let mut rescan = interval_at(Instant::now() + rescan_period, rescan_period);
    rescan.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = rescan.tick(), if catalog_mode => {
                let (entries, source) = load_catalog(&providers).await;
                if let Some(changed) = selection.update(select_tracked(&entries, args.max_pairs)) {
                    log::info!("📋 {} now lists {} tracked instruments", source, changed.len());
                    handle.send(Command::SetInstruments(changed))?;
                } else {
                    log::debug!(
                        "Catalog rescan at {}: selection unchanged",
                        epoch_ms_to_clock(utc_now_as_timestamp_ms())
                    );
                }
            }
            event = handle.next_event() => match event {
                Some(event) => report(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-C received, shutting down");
                break;
            }
        }
    }

    let scheduler = handle.shutdown().await?;
    let signals = scheduler.signals();
    match signals.average_confidence() {
        Some(avg) => log::info!("Session: {} signals, average confidence {:.1}%", signals.len(), avg),
        None => log::info!("Session: no signals"),
    }
    Ok(())
}

/// Signals go to stdout; everything else is already logged by the scheduler.
fn report(event: &SchedulerEvent) {
    match event {
        SchedulerEvent::SignalAccepted(record) => println!(
            "{} | {:<14} | {:<4} | {:>3}% | {} | {}",
            epoch_ms_to_clock(record.created_at_ms),
            record.instrument,
            record.direction,
            record.confidence,
            record.strategy.as_deref().unwrap_or("-"),
            record.window_id
        ),
        SchedulerEvent::Rotated { live } => {
            log::debug!("live instrument: {}", live.as_deref().unwrap_or("-"))
        }
        _ => {}
    }
}
