//! Config Handler.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provides TOML config file handling.
pub mod toml {

    use super::DEFAULT_CONFIG;
    use crate::module::define;
    use std::fs::File;
    use std::io::prelude::*;
    use std::path::Path;

    /// Loads a configuration file from the given directory.
    /// If not found, generates a default config file.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory where the configuration file is located or should be created.
    ///
    pub fn load(dir: &str) -> super::Config {
        // Check if the config file exists
        let path = Path::new(dir).join(define::path::CONF_FILE);
        let exist: bool = path.is_file();

        if !exist {
            // Create the default config if it doesn't exist
            let config: super::Config = toml::from_str(DEFAULT_CONFIG).unwrap();
            let toml_str = toml::to_string(&config).unwrap();
            let mut file = File::create(&path).unwrap();
            file.write_all(toml_str.as_bytes()).unwrap();
        }

        // Load the config
        let conf_str: String = std::fs::read_to_string(&path).unwrap();
        let setting: Result<super::Config, toml::de::Error> = toml::from_str(&conf_str);

        match setting {
            Ok(conf) => conf,
            Err(e) => panic!("Failed to parse TOML: {}", e),
        }
    }

    /// Saves a configuration file to the given directory.
    ///
    /// # Arguments
    ///
    /// * `dir` - The directory where the configuration file should be saved.
    /// * `conf` - The configuration data to be saved.
    ///
    pub fn save(dir: &str, conf: super::Config) {
        let toml_str = toml::to_string(&conf).unwrap();
        let path = crate::module::util::path::join(&[dir, define::path::CONF_FILE]);
        let mut file = File::create(path).unwrap();
        file.write_all(toml_str.as_bytes()).unwrap();
    }
}

/// Represents the configuration data structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub system: System,
    pub schedule: Schedule,
    pub capture: Capture,
    pub pin: Pin,
    pub cloud: Cloud,
    /// Device identity label to Drive folder id.
    pub destinations: HashMap<String, String>,
}

/// Represents system-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct System {
    pub device: String,
    pub root: String,
}

/// Represents the wake schedule parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Schedule {
    pub maintenance_hour: u32,
    pub boot_wait_s: u64,
    pub shutdown_wait_s: u64,
}

/// Represents still-capture parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Capture {
    pub count: u32,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub lens_position: f32,
    pub settle_ms: u64,
    pub interval_ms: u64,
}

/// Represents pin-related configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Pin {
    pub shutdown_pin: u8,
}

/// Represents cloud-session configuration parameters.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Cloud {
    pub token_file: String,
    pub credentials_file: String,
    pub log_files: Vec<String>,
}

// Default configuration data in TOML format
const DEFAULT_CONFIG: &str = r#"
[system]
  device = 'RPi01' # Device identity label; selects the destination folder
  root = '/home/pi' # Home root that holds the staging directory

[schedule]
  maintenance_hour = 11 # Hour of day during which the board stays powered on
  boot_wait_s = 10 # Stabilization wait after wake
  shutdown_wait_s = 10 # Stabilization wait before power-off

[capture]
  count = 2 # Stills per run
  width = 4608 # Still width (IMX708 maximum)
  height = 2592 # Still height (IMX708 maximum)
  quality = 100 # JPEG quality
  lens_position = 0.1 # Manual focus in dioptres (0.1 = 10m)
  settle_ms = 2000 # Sensor settle time before each shot
  interval_ms = 1000 # Pause between shots

[pin]
  shutdown_pin = 4 # BCM pin wired to the power management board

[cloud]
  token_file = '/home/pi/token.json' # Cached OAuth credential
  credentials_file = '/home/pi/credentials.json' # OAuth client secrets
  log_files = ['/home/pi/wittypi/wittyPi.log', '/home/pi/wittypi/schedule.log'] # Logs synced each run

[destinations]
  RPi01 = 'REPLACE-WITH-FOLDER-ID-01' # Drive folder id per device
  RPi02 = 'REPLACE-WITH-FOLDER-ID-02'
  RPi03 = 'REPLACE-WITH-FOLDER-ID-03'
  RPi04 = 'REPLACE-WITH-FOLDER-ID-04'
"#;
