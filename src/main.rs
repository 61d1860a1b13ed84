// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use sunrise_i2c::bus::{LinuxRegisterBus, RegisterBus};
use sunrise_i2c::{Sunrise, SunriseReadings, SUNRISE_DEFAULT_ADDRESS};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sunrise-logger")]
#[command(about = "Poll a Senseair Sunrise CO2 sensor over I2C and log its readings")]
struct Args {
    /// I2C bus number, opened as /dev/i2c-<BUS>
    #[arg(long, default_value_t = 1)]
    bus: u8,

    /// Sensor address, decimal or 0x-prefixed hex
    #[arg(long, default_value_t = SUNRISE_DEFAULT_ADDRESS, value_parser = parse_address)]
    address: u16,

    /// Seconds between the start of two measurement cycles
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    interval: u64,

    /// Directory holding the log file
    #[arg(long, default_value = "local_files")]
    log_dir: PathBuf,

    #[arg(long, default_value = "sunrise.log")]
    log_file: String,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,

    /// Log each cycle as one JSON object
    #[arg(long)]
    json: bool,

    /// Keep polling after a failed cycle instead of exiting
    #[arg(long)]
    skip_failed_cycles: bool,
}

fn parse_address(value: &str) -> Result<u16, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    match parsed {
        Ok(address) if address <= 0x7f => Ok(address),
        Ok(address) => Err(format!("{:#x} is not a 7-bit I2C address", address)),
        Err(e) => Err(format!("invalid address '{}': {}", value, e)),
    }
}

fn setup_tracing(args: &Args) -> Result<()> {
    fs::create_dir_all(&args.log_dir)
        .with_context(|| format!("creating log directory {}", args.log_dir.display()))?;
    let path = args.log_dir.join(&args.log_file);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .with_context(|| format!("invalid log level '{}'", args.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stdout.and(Mutex::new(file)))
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}

fn log_readings(readings: &SunriseReadings, json: bool) -> Result<()> {
    if json {
        info!("{}", serde_json::to_string(readings)?);
        return Ok(());
    }
    info!("Error statuses: {}", readings.error_status);
    info!("Calibration status: {}", readings.calibration_status);
    info!("Measurement mode: {}", readings.measurement_mode);
    info!("Firmware type: {}", readings.firmware_type);
    info!("Firmware revision: {}", readings.firmware_revision);
    info!("Sensor ID: {}", readings.sensor_id);
    info!("Product code: {}", readings.product_code);
    info!("CO2 measure: {} ppm", readings.co2_filtered_compensated);
    info!("Unfiltered CO2 measure: {} ppm", readings.co2_unfiltered_compensated);
    info!("Uncompensated CO2 measure: {} ppm", readings.co2_filtered_uncompensated);
    info!("Raw CO2 measure: {} ppm", readings.co2_unfiltered_uncompensated);
    info!("Temperature measure: {:.2}°C", readings.temperature);
    info!("Pressure setting: {:.1} hPa", readings.pressure);
    info!("Cycle counts: {}", readings.cycle_count);
    info!("Cycle time: {} s", readings.cycle_time);
    Ok(())
}

fn poll_once<B: RegisterBus>(sensor: &mut Sunrise<B>, json: bool) -> Result<()> {
    info!("Getting measurements from sensor");
    let readings = sensor
        .read_all()
        .with_context(|| format!("reading Sunrise sensor at {:#04x}", sensor.address()))?;
    log_readings(&readings, json)
}

/// Log a failed cycle as critical before it ends the process.
fn fatal_cycle(address: u16, err: anyhow::Error) -> anyhow::Error {
    error!(
        "Could not read Sunrise sensor on address {:#04x} ({:#}); exiting",
        address, err
    );
    err
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(&args)?;

    info!("Initializing I2C bus {}", args.bus);
    let bus = match LinuxRegisterBus::open(args.bus, args.address) {
        Ok(bus) => bus,
        Err(e) => {
            error!("Could not initialize I2C bus {}; exiting", args.bus);
            return Err(e.into());
        }
    };
    info!("Opened {}", bus.path().display());
    let mut sensor = Sunrise::with_address(bus, args.address);

    if args.once {
        return poll_once(&mut sensor, args.json).map_err(|e| fatal_cycle(args.address, e));
    }

    info!(
        "Entering main loop (interval between measurements: {} s)",
        args.interval
    );
    // cycle starts stay on the fixed grid whatever the read takes
    let mut ticker = interval(Duration::from_secs(args.interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Ending main loop on user request; exiting");
                return Ok(());
            }
        }

        if let Err(e) = poll_once(&mut sensor, args.json) {
            if args.skip_failed_cycles {
                warn!("Skipping cycle: {:#}", e);
                continue;
            }
            return Err(fatal_cycle(args.address, e));
        }
    }
}
