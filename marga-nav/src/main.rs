//! MargaNav - Sorting mission controller
//!
//! Loads the configuration, creates the rover and runs the mission until the
//! delivery limit is reached or Ctrl-C is pressed. The final map is written
//! as a JSON snapshot either way.

use marga_nav::error::{NavError, Result};
use marga_nav::{MargaConfig, Mission, status};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};
use yantra_io::{Rover, SupervisedRover, create_rover};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "marga_nav=info"
                    .parse()
                    .map_err(|e| NavError::Config(format!("log filter: {}", e)))?,
            ),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let config = if args.len() > 1 && !args[1].starts_with("--") {
        let config_path = Path::new(&args[1]);
        info!("Loading configuration from {:?}", config_path);
        MargaConfig::load(config_path)?
    } else if Path::new("marga.toml").exists() {
        info!("Loading configuration from marga.toml");
        MargaConfig::load(Path::new("marga.toml"))?
    } else {
        info!("Using default configuration");
        let mut config = MargaConfig::default();
        config.sync_device();
        config
    };

    info!("MargaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Arena {}x{}, device '{}' ({})",
        config.arena.rows, config.arena.cols, config.device.name, config.device.device_type
    );

    let (rover, stop) = create_rover(&config.device)?;

    // Ctrl-C halts the motors at once and ends the mission between phases
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            stop.halt();
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| NavError::Config(format!("Failed to install signal handler: {}", e)))?;
    }

    let mut rover: Box<dyn Rover> = if config.supervision.enabled {
        info!(
            "Supervising actuator calls ({} ms limit)",
            config.supervision.call_timeout_ms
        );
        Box::new(SupervisedRover::spawn(
            rover,
            Duration::from_millis(config.supervision.call_timeout_ms),
        )?)
    } else {
        rover
    };

    let status = status::spawn_display(config.output.status_queue)?;
    let mut mission = Mission::new(rover.as_mut(), &config, Arc::clone(&shutdown))
        .with_status(status.clone());
    let outcome = mission.run();
    let snapshot = mission.snapshot();
    drop(mission);

    if let Err(e) = rover.stop() {
        warn!("Failed to stop the rover: {}", e);
    }
    if status.dropped() > 0 {
        info!("Status display skipped {} events", status.dropped());
    }

    let snapshot_path = Path::new(&config.output.snapshot_path);
    snapshot.save(snapshot_path)?;
    info!("Map snapshot saved to {:?}", snapshot_path);

    match outcome {
        Ok(report) => {
            info!(
                "MargaNav finished: {} deliveries, bins {}",
                report.deliveries, report.registry
            );
            Ok(())
        }
        Err(NavError::Interrupted) | Err(NavError::Actuator(yantra_io::Error::Halted)) => {
            warn!("Mission interrupted");
            Ok(())
        }
        Err(e) => {
            error!("Mission failed: {}", e);
            Err(e)
        }
    }
}
