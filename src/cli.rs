// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for interval capture
//!
//! This module provides command-line functionality for:
//! - Running the interval scheduler
//! - Taking single photos, with or without the countdown
//! - Listing flash LEDs
//! - Showing and saving the configuration

use crate::CaptureArgs;
use intervalcam::backends::camera::{CaptureDevice, FileSourceCamera, V4l2Camera};
use intervalcam::config::{CameraSource, Config, FlashSetting};
use intervalcam::errors::{AppError, AppResult, CaptureError};
use intervalcam::flash::{FlashHardware, FlashState, NoTorch, SysfsTorch, TorchDriver};
use intervalcam::pipelines::interval::{
    CaptureJob, CaptureMode, CaptureScheduler, RandomSource, SchedulerEvent, SeededRandom,
    ThreadRandom, Trigger, parse_interval_minutes,
};
use intervalcam::pipelines::photo::{EncodingFormat, PhotoEncoder};
use intervalcam::storage::DirectoryStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Poll interval while waiting for an in-flight capture after Ctrl+C
const DRAIN_POLL: Duration = Duration::from_millis(100);

/// Load the config file and apply command-line overrides
pub fn effective_config(
    config_path: Option<&Path>,
    interval: Option<&str>,
    args: &CaptureArgs,
) -> AppResult<Config> {
    let mut config = match config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(interval) = interval {
        config.interval_minutes = parse_interval_minutes(interval)?;
    }
    if let Some(device) = &args.device {
        config.camera = CameraSource::V4l2 {
            device: device.clone(),
        };
    }
    if let Some(image) = &args.image {
        config.camera = CameraSource::File {
            path: image.clone(),
        };
    }
    if let Some(output) = &args.output {
        config.photo_dir = output.clone();
    }
    if args.png {
        config.photo_format = EncodingFormat::Png;
    }
    if args.no_flash {
        config.flash = FlashSetting::Off;
    }

    Ok(config)
}

/// Build the torch, camera and store described by the config
fn build_job(config: &Config) -> AppResult<CaptureJob> {
    let torch: Arc<dyn TorchDriver> = match config.flash {
        FlashSetting::Auto => match SysfsTorch::detect() {
            Some(torch) => Arc::new(torch),
            None => {
                warn!("No controllable flash LED, countdown will run without light");
                Arc::new(NoTorch)
            }
        },
        FlashSetting::Off => Arc::new(NoTorch),
    };

    let encoder = PhotoEncoder::new(config.photo_format, config.photo_quality);

    let camera: Arc<dyn CaptureDevice> = match &config.camera {
        CameraSource::V4l2 { device } => Arc::new(
            V4l2Camera::open(device, encoder, torch).map_err(CaptureError::Device)?,
        ),
        CameraSource::File { path } => Arc::new(
            FileSourceCamera::open(path, encoder, torch).map_err(CaptureError::Device)?,
        ),
    };

    let store = Arc::new(DirectoryStore::new(&config.photo_dir));

    Ok(CaptureJob::new(camera, store, FlashState::new()))
}

/// Single-threaded runtime: all suspension happens at timer and I/O awaits
fn runtime() -> AppResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Other(format!("Failed to start runtime: {}", e)))
}

/// Cancellation token fired by Ctrl+C
fn ctrlc_token() -> AppResult<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .map_err(|e| AppError::Other(format!("Failed to install Ctrl+C handler: {}", e)))?;
    Ok(token)
}

/// Print every torch transition
async fn torch_indicator(mut rx: watch::Receiver<bool>) {
    while rx.changed().await.is_ok() {
        let on = *rx.borrow_and_update();
        println!("  torch {}", if on { "● on" } else { "○ off" });
    }
}

/// Print scheduler events as they arrive
async fn event_printer(mut rx: broadcast::Receiver<SchedulerEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "Event printer lagged");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => break,
        };

        match event {
            SchedulerEvent::Started { interval } => {
                println!(
                    "Interval started: a photo every {:.1} min, 1 in 15 with a flash countdown",
                    interval.as_secs_f64() / 60.0
                );
            }
            SchedulerEvent::Stopped => println!("Interval stopped"),
            SchedulerEvent::Tick { tick, mode } => println!("[tick {}] {} capture", tick, mode),
            SchedulerEvent::TickSkipped { tick } => {
                println!("[tick {}] skipped, previous capture still running", tick)
            }
            SchedulerEvent::Captured { trigger, asset, .. } => {
                println!("{} saved {}", label(trigger), asset)
            }
            SchedulerEvent::CaptureFailed { trigger, error, .. } => {
                eprintln!("{} failed: {}", label(trigger), error)
            }
        }
    }
}

fn label(trigger: Trigger) -> String {
    match trigger {
        Trigger::Tick(tick) => format!("[tick {}]", tick),
        Trigger::Manual => "[manual]".to_string(),
    }
}

/// Run the interval scheduler until Ctrl+C
pub fn run_schedule(config: Config, seed: Option<u64>) -> AppResult<()> {
    let job = build_job(&config)?;
    let random: Box<dyn RandomSource> = match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };
    let stop = ctrlc_token()?;

    // Enter on stdin requests a countdown photo; the reader thread is
    // detached because a blocking read cannot be interrupted
    let (enter_tx, mut enter_rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let mut line = String::new();
        while std::io::stdin().read_line(&mut line).is_ok_and(|n| n > 0) {
            if enter_tx.send(()).is_err() {
                break;
            }
            line.clear();
        }
    });

    let rt = runtime()?;
    rt.block_on(async move {
        let mut scheduler = CaptureScheduler::with_random_source(job, random);
        tokio::spawn(torch_indicator(scheduler.flash_state().subscribe()));
        tokio::spawn(event_printer(scheduler.subscribe()));

        scheduler.start(config.interval_minutes)?;
        println!("Saving to {}", config.photo_dir.display());
        println!("Press Enter for a countdown photo, Ctrl+C to stop.");

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                Some(()) = enter_rx.recv() => {
                    // Ctrl+C during the countdown aborts it and ends the run
                    if let Err(e) = scheduler.trigger_until(CaptureMode::Countdown, &stop).await {
                        println!("{}", e);
                    }
                }
            }
        }

        scheduler.stop();
        while scheduler.is_capturing() {
            tokio::time::sleep(DRAIN_POLL).await;
        }
        // Let the printer flush the final events
        tokio::task::yield_now().await;

        Ok::<_, AppError>(())
    })?;

    info!("Interval capture finished");
    Ok(())
}

/// Take one photo, optionally preceded by the flash countdown
pub fn take_photo(config: Config, countdown: bool) -> AppResult<()> {
    let job = build_job(&config)?;
    let rt = runtime()?;

    let result = if countdown {
        let cancel = ctrlc_token()?;
        rt.block_on(async {
            tokio::spawn(torch_indicator(job.flash_state().subscribe()));
            println!("Get ready...");
            job.capture_with_countdown_until(&cancel).await
        })
    } else {
        rt.block_on(job.capture_silently())
    };

    let asset = result?;
    println!("Photo saved: {}", asset);
    Ok(())
}

/// List controllable flash LEDs
pub fn list_flash() {
    let hardware = FlashHardware::detect();

    if let Some(error) = &hardware.permission_error {
        println!("{}", error);
        return;
    }

    if !hardware.has_devices() {
        println!("No flash LEDs found.");
        return;
    }

    println!("Flash LEDs:");
    for device in &hardware.devices {
        println!(
            "  {} (max brightness {})",
            device.name(),
            device.max_brightness()
        );
    }
}

/// Print the effective configuration, optionally saving it
pub fn show_config(config: &Config, config_path: Option<&Path>, save: bool) -> AppResult<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Other(format!("Failed to serialize config: {}", e)))?;
    println!("{}", json);

    if save {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path()?,
        };
        config.save_to(&path)?;
        println!("Saved to {}", path.display());
    }

    Ok(())
}
