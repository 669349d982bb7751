// UTXO network simulation - CLI runner

use clap::Parser;
use std::time::{Duration, Instant};
use utxo_sim::{Cli, PayloadKind, Simulation};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let config = match cli.sim_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut sim = match Simulation::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error initializing: {}", e);
            std::process::exit(1);
        }
    };

    run(&mut sim, Duration::from_millis(cli.tick_ms.max(1)), Duration::from_secs(cli.duration_secs)).await;

    match serde_json::to_string_pretty(&sim.summary()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Host frame loop: one simulation tick per timer period
async fn run(sim: &mut Simulation, tick: Duration, duration: Duration) {
    let start = Instant::now();
    let mut interval = tokio::time::interval(tick);
    let mut blocks = 0usize;
    let mut txs = 0usize;

    while start.elapsed() < duration {
        interval.tick().await;
        sim.tick(start.elapsed().as_millis() as u64);

        for event in sim.drain_events() {
            match event.kind() {
                PayloadKind::Tx => txs += 1,
                PayloadKind::Block => blocks += 1,
            }
            if log::log_enabled!(log::Level::Trace) {
                match serde_json::to_string(&event) {
                    Ok(json) => log::trace!("{}", json),
                    Err(e) => log::warn!("Unserializable event: {}", e),
                }
            }
        }
    }

    log::info!(
        "Ran {:?}: {} tx events, {} block events, mining interval {} ms",
        duration,
        txs,
        blocks,
        sim.event_interval_ms()
    );
}
