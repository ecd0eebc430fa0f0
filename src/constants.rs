// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application title shown in the terminal UI
pub const APP_TITLE: &str = "Day / Day";

/// Folder under the user's documents directory holding snapshots and config
pub const APP_DIR_NAME: &str = "DayAfterDay";

/// Configuration file name, stored next to the snapshots
pub const CONFIG_FILE_NAME: &str = "DayAfterDay.ini";

/// File naming for snapshots: `DayAfterDay-YYYY-MM-DD-HHMMSS-N.png`
pub mod naming {
    /// Leading component of every snapshot name
    pub const PREFIX: &str = "DayAfterDay";

    /// Snapshot file extension (always PNG)
    pub const EXTENSION: &str = "png";

    /// chrono format for the date/time part, colon-free
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

    /// Upper bound on the increment search before giving up
    pub const DEFAULT_SEARCH_LIMIT: u32 = 10_000;
}

/// Image extensions shown in the history (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Overlay opacity settings
pub mod opacity {
    /// Opacity used when the config is missing or unreadable
    pub const DEFAULT: u8 = 50;

    /// Maximum opacity (percent)
    pub const MAX: u8 = 100;

    /// Small step (arrow keys)
    pub const FINE_STEP: i16 = 1;

    /// Large step (page keys), matches the slider tick interval
    pub const COARSE_STEP: i16 = 10;
}

/// Capture loop timing
pub mod capture {
    use super::Duration;

    /// First backoff after a failed frame read
    pub const INITIAL_BACKOFF: Duration = Duration::from_millis(10);

    /// Backoff ceiling for repeated read failures
    pub const MAX_BACKOFF: Duration = Duration::from_millis(500);

    /// Log a warning every this many consecutive read failures
    pub const FAILURE_LOG_INTERVAL: u32 = 30;

    /// How long a blocking device read may wait before the stop flag is rechecked
    pub const READ_TIMEOUT: Duration = Duration::from_millis(250);

    /// Number of mmap buffers requested from V4L2
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Preferred capture resolution
    pub const PREFERRED_WIDTH: u32 = 1280;
    pub const PREFERRED_HEIGHT: u32 = 720;
}

/// One-shot photo from the command line
pub mod photo {
    use super::Duration;

    /// Frames arriving before this are discarded (auto-exposure settling)
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Give up if no frame arrives within this time
    pub const TIMEOUT: Duration = Duration::from_secs(5);
}

/// Terminal UI layout and timing
pub mod ui {
    use super::Duration;

    /// Input poll timeout, also the repaint interval
    pub const POLL_INTERVAL: Duration = Duration::from_millis(16);

    /// Width of the history column in terminal cells
    pub const HISTORY_PANEL_WIDTH: u16 = 34;

    /// Height of the history thumbnail preview in terminal cells
    pub const THUMBNAIL_ROWS: u16 = 10;

    /// Thumbnails are scaled to this pixel width
    pub const THUMBNAIL_WIDTH: u32 = 200;
}
