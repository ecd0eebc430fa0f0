// SPDX-License-Identifier: GPL-3.0-only

//! Runtime settings and persisted user preferences
//!
//! [`Settings`] is assembled once from command-line options and defaults and
//! handed to each component. [`Config`] is the small set of user preferences
//! stored in `DayAfterDay.ini` next to the snapshots.

use crate::backends::camera::RetryPolicy;
use crate::constants::{self, naming, opacity};
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Which camera to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Index into the enumerated capture devices (0 = default camera)
    Index(usize),
    /// Explicit device node, e.g. `/dev/video2`
    Path(PathBuf),
}

impl Default for DeviceSelector {
    fn default() -> Self {
        DeviceSelector::Index(0)
    }
}

impl DeviceSelector {
    /// Parse a `--device` argument: a plain number is an index, anything else a path
    pub fn parse(arg: &str) -> Self {
        match arg.trim().parse::<usize>() {
            Ok(index) => DeviceSelector::Index(index),
            Err(_) => DeviceSelector::Path(PathBuf::from(arg)),
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Index(index) => write!(f, "camera #{}", index),
            DeviceSelector::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Settings shared by the capture loop, snapshot writer and history lister
#[derive(Debug, Clone)]
pub struct Settings {
    /// Flat directory holding snapshots and the config file
    pub snapshot_dir: PathBuf,
    /// Location of `DayAfterDay.ini`
    pub config_path: PathBuf,
    /// Camera to open
    pub device: DeviceSelector,
    /// Bound on the snapshot name increment search
    pub name_search_limit: u32,
    /// Backoff applied to failed frame reads
    pub retry: RetryPolicy,
}

impl Settings {
    /// Build settings from optional overrides
    pub fn new(snapshot_dir: Option<PathBuf>, device: Option<&str>) -> Self {
        let snapshot_dir = snapshot_dir.unwrap_or_else(default_snapshot_dir);
        let config_path = snapshot_dir.join(constants::CONFIG_FILE_NAME);

        Self {
            snapshot_dir,
            config_path,
            device: device.map(DeviceSelector::parse).unwrap_or_default(),
            name_search_limit: naming::DEFAULT_SEARCH_LIMIT,
            retry: RetryPolicy::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// `~/Documents/DayAfterDay`
pub fn default_snapshot_dir() -> PathBuf {
    let documents = dirs::document_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        Path::new(&home).join("Documents")
    });
    documents.join(constants::APP_DIR_NAME)
}

/// Overlay opacity as a whole percentage, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Opacity(u8);

impl Opacity {
    pub const TRANSPARENT: Opacity = Opacity(0);
    pub const OPAQUE: Opacity = Opacity(opacity::MAX);

    /// Clamp an arbitrary integer into range
    pub fn new(percent: i64) -> Self {
        Opacity(percent.clamp(0, opacity::MAX as i64) as u8)
    }

    pub fn percent(self) -> u8 {
        self.0
    }

    /// Move by `delta` percent, saturating at the bounds
    pub fn adjust(self, delta: i16) -> Self {
        Self::new(self.0 as i64 + delta as i64)
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Opacity(opacity::DEFAULT)
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Persisted user preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Opacity of the previous picture drawn over the live preview
    pub opacity: Opacity,
}

/// On-disk layout: an INI file with a single `[DEFAULT]` section.
/// The subset of INI used here is also valid TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(rename = "DEFAULT", default)]
    default: DefaultSection,
}

#[derive(Debug, Serialize, Deserialize)]
struct DefaultSection {
    #[serde(default = "default_opacity")]
    opacity: i64,
}

impl Default for DefaultSection {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
        }
    }
}

fn default_opacity() -> i64 {
    opacity::DEFAULT as i64
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Config {
            opacity: Opacity::new(file.default.opacity),
        }
    }
}

impl From<&Config> for ConfigFile {
    fn from(config: &Config) -> Self {
        ConfigFile {
            default: DefaultSection {
                opacity: config.opacity.percent() as i64,
            },
        }
    }
}

/// Reads and writes `DayAfterDay.ini`
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config file, failing with `ConfigUnreadable` if it is missing or corrupt
    pub fn read(&self) -> AppResult<Config> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::ConfigUnreadable(format!("{}: {}", self.path.display(), e))
        })?;
        let file: ConfigFile = toml::from_str(&contents).map_err(|e| {
            AppError::ConfigUnreadable(format!("{}: {}", self.path.display(), e))
        })?;
        Ok(file.into())
    }

    /// Load preferences for startup
    ///
    /// A missing file is created with defaults. A corrupt file is left
    /// untouched and defaults are used for this session.
    pub fn load_or_default(&self) -> Config {
        if !self.path.exists() {
            let config = Config::default();
            match self.save(&config) {
                Ok(()) => info!(path = %self.path.display(), "Created default config"),
                Err(e) => warn!(error = %e, "Could not create default config"),
            }
            return config;
        }

        match self.read() {
            Ok(config) => {
                debug!(opacity = %config.opacity, "Loaded config");
                config
            }
            Err(e) => {
                warn!(error = %e, "Falling back to default config");
                Config::default()
            }
        }
    }

    /// Write preferences, creating the parent directory if needed
    pub fn save(&self, config: &Config) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::ConfigWrite(e.to_string()))?;
        }

        let contents = toml::to_string(&ConfigFile::from(config))
            .map_err(|e| AppError::ConfigWrite(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| AppError::ConfigWrite(e.to_string()))?;

        debug!(path = %self.path.display(), opacity = %config.opacity, "Config saved");
        Ok(())
    }
}
