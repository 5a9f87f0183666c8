//! Bridge server: runs resource scripts against the metadata bridge

use anyhow::{Context, Result};
use bridge::io::{ResourceWatcher, WatcherConfig};
use bridge::meta::{read_store, PropertyStore};
use bridge::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Runs Rhai resources with shared metadata and binding exports", long_about = None)]
struct Cli {
    /// Bridge configuration file
    #[arg(long, default_value = "bridge.json")]
    config: PathBuf,

    /// Stop after this many ticks instead of running until interrupted
    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long, default_value_t = 50)]
    tick_ms: u64,

    /// Do not restart resources when their scripts change
    #[arg(long)]
    no_watch: bool,

    /// Run a second peer over the in-process transport and report what it
    /// received
    #[arg(long)]
    mirror: bool,
}

fn main() -> std::process::ExitCode {
    match try_main() {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let config = if cli.config.exists() {
        BridgeConfig::load(&cli.config)
            .with_context(|| format!("loading config {}", cli.config.display()))?
    } else {
        BridgeConfig::default()
    };

    bridge::init_logging(config.log_filter.as_deref());
    info!(config = ?cli.config, peer = config.peer_id, "Starting bridge server");

    config
        .validate()
        .context("resource root is not usable")?;

    let hub = LoopbackHub::new();
    let mut runtime = Runtime::new(config.clone());
    let transport = hub.connect(runtime.replicator());

    let mirror = if cli.mirror {
        let mirror_config = BridgeConfig {
            peer_id: config.peer_id + 1,
            resources: Vec::new(),
            ..config.clone()
        };
        let mirror = Runtime::new(mirror_config);
        let mirror_transport = hub.connect(mirror.replicator());
        Some((mirror, mirror_transport))
    } else {
        None
    };

    for name in &config.resources {
        if let Err(e) = runtime.start_resource(name) {
            error!(resource = name, error = %e, "Failed to start resource");
        }
    }

    let mut watcher = if cli.no_watch {
        None
    } else {
        match ResourceWatcher::new(
            &config.resource_root,
            WatcherConfig {
                script_extension: config.script_extension.clone(),
                ..Default::default()
            },
        ) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!(error = %e, "Hot reload disabled");
                None
            }
        }
    };

    let interval = Duration::from_millis(cli.tick_ms);
    let mut last_tick = Instant::now();
    let mut tick_count = 0u64;

    while cli.ticks.map_or(true, |max| tick_count < max) {
        if let Some(watcher) = watcher.as_mut() {
            for name in watcher.poll() {
                if runtime.resource(&name).is_none() {
                    continue;
                }
                if let Err(e) = runtime.restart_resource(&name) {
                    error!(resource = name, error = %e, "Failed to reload resource");
                }
            }
        }

        let now = Instant::now();
        let delta_time = now.duration_since(last_tick).as_secs_f64();
        last_tick = now;

        runtime.tick(delta_time);
        runtime.flush_replication(&transport);

        if let Some((mirror, mirror_transport)) = mirror.as_ref() {
            mirror.pump_replication();
            mirror.flush_replication(mirror_transport);
        }

        tick_count += 1;
        std::thread::sleep(interval);
    }

    if let Some((mirror, _)) = mirror {
        let synced = mirror.host().shared_synced_meta();
        let synced = read_store(&synced);
        for key in synced.keys() {
            if let Some(value) = synced.get(&key) {
                info!(key, %value, "Mirror received shared synced metadata");
            }
        }
        drop(synced);
        mirror.shutdown();
    }

    info!(ticks = tick_count, "Shutting down");
    runtime.shutdown();
    Ok(())
}
