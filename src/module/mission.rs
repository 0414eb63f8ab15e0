//! Sequential orchestration of one scheduled run.
//!
//! A run reads the clock once, stages and captures stills, pushes everything
//! to the device's Drive folder, syncs the operational logs, and powers the
//! board down unless the wake landed in the maintenance window.

use std::error::Error;
use std::{thread, time};

use chrono::{Local, Timelike};

use crate::module::cloud::drive::{self, DriveClient, RemoteStore};
use crate::module::cloud::{auth, CloudError};
use crate::module::device::camera::{self, CameraDriver, RpicamStill};
use crate::module::device::power::{self, GpioPowerPin, PowerPin};
use crate::module::util::conf::Config;
use crate::module::util::init::FieldcamProperty;
use crate::module::util::path;

/// Maintenance runs leave the board powered on afterwards.
pub fn is_maintenance(hour: u32, maintenance_hour: u32) -> bool {
    hour == maintenance_hour
}

/// Destination folder for this device, from the configured mapping.
/// An unmapped device identity aborts the run before any capture or upload.
pub fn resolve_destination(conf: &Config) -> Result<String, CloudError> {
    conf.destinations
        .get(&conf.system.device)
        .cloned()
        .ok_or_else(|| CloudError::UnmappedDevice(conf.system.device.clone()))
}

/// Capture, upload and log sync against the given hardware and store handles.
pub fn execute(
    conf: &Config,
    stamp: &str,
    staging: &str,
    parent: &str,
    camera: &mut dyn CameraDriver,
    store: &dyn RemoteStore,
) {
    let written = camera::capture_batch(
        camera,
        staging,
        &conf.system.device,
        stamp,
        conf.capture.count,
        conf.capture.interval_ms,
    );
    log::info!("{} of {} stills captured", written, conf.capture.count);

    drive::upload_images(store, staging, parent);

    for log_file in &conf.cloud.log_files {
        drive::sync_log(store, log_file, parent);
    }
}

/// Powers the board down unless this was a maintenance run.
pub fn finish(maintenance: bool, pin: &mut dyn PowerPin) {
    if maintenance {
        log::info!("Maintenance mode: the board stays powered on");
    } else {
        power::power_off(pin);
    }
}

/// One scheduled run, start to finish.
///
/// The error return is the fatal path: staging, destination resolution and
/// authorization. Capture, upload, log sync and GPIO failures are logged and
/// survived.
pub fn run(property: &FieldcamProperty) -> Result<(), Box<dyn Error>> {
    let conf = &property.conf;
    thread::sleep(time::Duration::from_secs(conf.schedule.boot_wait_s));

    // One clock read per run: the mode decision and every file name share it.
    let now = Local::now();
    let maintenance = is_maintenance(now.hour(), conf.schedule.maintenance_hour);
    let stamp = now.format("%Y%m%d_%H%M").to_string();
    log::info!(
        "Camera mode: {} stills will be captured (maintenance: {})",
        conf.capture.count,
        maintenance
    );

    let staging = path::dir::create_staging_dir(&conf.system.root)?;
    let parent = resolve_destination(conf)?;
    let cred = auth::login(&conf.cloud)?;

    let mut camera = RpicamStill::new(conf.capture.clone());
    let store = DriveClient::new(&cred);
    execute(conf, &stamp, &staging, &parent, &mut camera, &store);

    thread::sleep(time::Duration::from_secs(conf.schedule.shutdown_wait_s));

    if maintenance {
        finish(true, &mut NoPin);
    } else {
        match GpioPowerPin::new(conf.pin.shutdown_pin) {
            Ok(mut pin) => finish(false, &mut pin),
            Err(e) => log::error!("Can't open shutdown pin {}: {}", conf.pin.shutdown_pin, e),
        }
    }
    Ok(())
}

/// Stand-in pin for runs that never touch GPIO.
struct NoPin;

impl PowerPin for NoPin {
    fn drive_low(&mut self) -> Result<(), Box<dyn Error>> {
        Ok(())
    }
    fn release(&mut self) {}
}
