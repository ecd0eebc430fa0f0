// SPDX-License-Identifier: GPL-3.0-only

//! Application state management
//!
//! Everything the view draws lives in [`AppState`]. The capture thread never
//! touches it; frames are handed in through [`AppState::on_frame`] by the
//! event loop.

use crate::backends::camera::Frame;
use crate::config::{Config, ConfigStore, Opacity, Settings};
use crate::constants::ui;
use crate::errors::{CameraError, PhotoError};
use crate::pipelines::overlay::OverlayCompositor;
use crate::pipelines::photo::SnapshotWriter;
use crate::storage::{self, SnapshotRecord};
use image::RgbImage;
use std::path::Path;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, error, info, warn};

/// Preview state machine
///
/// `NoCamera → Previewing` on the first frame, then
/// `Previewing → Saving → Previewing` for every shutter press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PreviewState {
    /// No frame received yet (or the camera could not be opened)
    #[default]
    NoCamera,
    /// Live frames are arriving; the shutter is enabled
    Previewing,
    /// A snapshot write is in flight; the shutter is disabled
    Saving,
}

/// A history row: a snapshot and its lazily rendered thumbnail
#[derive(Debug)]
pub struct HistoryEntry {
    pub record: SnapshotRecord,
    thumbnail: Thumbnail,
}

#[derive(Debug)]
enum Thumbnail {
    NotLoaded,
    Loaded(RgbImage),
    Failed,
}

impl HistoryEntry {
    pub fn new(record: SnapshotRecord) -> Self {
        Self {
            record,
            thumbnail: Thumbnail::NotLoaded,
        }
    }

    /// Entry for a picture whose pixels are already in memory
    pub fn with_image(record: SnapshotRecord, image: &RgbImage) -> Self {
        Self {
            record,
            thumbnail: Thumbnail::Loaded(storage::thumbnail_of(image, ui::THUMBNAIL_WIDTH)),
        }
    }

    /// Thumbnail, decoding the file on first access
    pub fn thumbnail(&mut self) -> Option<&RgbImage> {
        if matches!(self.thumbnail, Thumbnail::NotLoaded) {
            self.thumbnail = match storage::load_thumbnail(&self.record.path, ui::THUMBNAIL_WIDTH) {
                Ok(image) => Thumbnail::Loaded(image),
                Err(e) => {
                    warn!(error = %e, "Failed to load thumbnail");
                    Thumbnail::Failed
                }
            };
        }

        match &self.thumbnail {
            Thumbnail::Loaded(image) => Some(image),
            _ => None,
        }
    }
}

/// Status bar message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// A snapshot write running on a worker thread
struct PendingSave {
    receiver: oneshot::Receiver<Result<SnapshotRecord, PhotoError>>,
    frame: Frame,
}

/// Main application state
pub struct AppState {
    writer: SnapshotWriter,
    config_store: ConfigStore,
    pub config: Config,

    pub preview: PreviewState,
    /// Why the preview is disabled, if the camera failed to open
    pub camera_error: Option<CameraError>,
    frame: Option<Frame>,
    preview_image: Option<RgbImage>,
    preview_dirty: bool,

    compositor: OverlayCompositor,
    pub overlay_enabled: bool,

    pub history: Vec<HistoryEntry>,
    pub selected: usize,

    pub status: StatusMessage,
    pub show_help: bool,
    pending_save: Option<PendingSave>,
}

impl AppState {
    /// Load preferences and the history for `settings`
    ///
    /// `camera_error` puts the app in history-only mode.
    pub fn new(settings: &Settings, camera_error: Option<CameraError>) -> Self {
        let config_store = ConfigStore::new(&settings.config_path);
        let config = config_store.load_or_default();

        let status = match &camera_error {
            Some(e) => StatusMessage::error(format!("{} (history only)", e)),
            None => StatusMessage::info(default_status()),
        };

        let mut state = Self {
            writer: SnapshotWriter::from_settings(settings),
            config_store,
            config,
            preview: PreviewState::NoCamera,
            camera_error,
            frame: None,
            preview_image: None,
            preview_dirty: false,
            compositor: OverlayCompositor::new(),
            overlay_enabled: true,
            history: Vec::new(),
            selected: 0,
            status,
            show_help: false,
            pending_save: None,
        };
        state.rescan();
        state
    }

    pub fn snapshot_dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn opacity(&self) -> Opacity {
        self.config.opacity
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// The shutter only works while previewing with a frame in hand
    pub fn shutter_enabled(&self) -> bool {
        self.preview == PreviewState::Previewing && self.frame.is_some()
    }

    /// Accept the newest frame from the capture loop
    pub fn on_frame(&mut self, frame: Frame) {
        if self.preview == PreviewState::NoCamera {
            info!(width = frame.width, height = frame.height, "First frame received");
            self.preview = PreviewState::Previewing;
        }
        self.frame = Some(frame);
        self.preview_dirty = true;
    }

    /// The capture thread went away; keep showing the last frame
    pub fn on_camera_lost(&mut self) {
        let error = CameraError::DeviceUnavailable("capture stopped".into());
        warn!(error = %error, "Camera lost");
        self.status = StatusMessage::error(error.to_string());
        self.camera_error = Some(error);
    }

    /// Image to draw in the preview area: the live frame, or the composite
    /// when the overlay is on
    pub fn preview_image(&mut self) -> Option<&RgbImage> {
        if self.preview_dirty {
            self.preview_dirty = false;
            self.preview_image = self.frame.as_ref().map(|frame| {
                if self.overlay_enabled {
                    self.compositor.compose(frame, self.config.opacity)
                } else {
                    frame.to_image()
                }
            });
        }
        self.preview_image.as_ref()
    }

    /// Start writing the current frame on a worker thread
    pub fn take_picture(&mut self) {
        self.show_help = false;

        if self.preview == PreviewState::Saving {
            debug!("Save already in progress");
            return;
        }
        let Some(frame) = self.frame.clone() else {
            self.status = StatusMessage::error(PhotoError::NoFrameAvailable.to_string());
            return;
        };

        let (sender, receiver) = oneshot::channel();
        let writer = self.writer.clone();
        let worker_frame = frame.clone();
        let spawned = std::thread::Builder::new()
            .name("snapshot-writer".into())
            .spawn(move || {
                let _ = sender.send(writer.save(Some(&worker_frame)));
            });

        match spawned {
            Ok(_) => {
                self.preview = PreviewState::Saving;
                self.pending_save = Some(PendingSave { receiver, frame });
                self.status = StatusMessage::info("Saving...");
            }
            Err(e) => {
                error!(error = %e, "Failed to spawn snapshot writer");
                self.status = StatusMessage::error(format!("Save failed: {}", e));
            }
        }
    }

    /// Check whether the in-flight save finished; returns true when it did
    pub fn poll_save(&mut self) -> bool {
        let Some(pending) = self.pending_save.as_mut() else {
            return false;
        };

        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => {
                Err(PhotoError::WriteFailed("snapshot writer exited".into()))
            }
        };

        if let Some(pending) = self.pending_save.take() {
            self.finish_save(result, &pending.frame);
        }
        true
    }

    fn finish_save(&mut self, result: Result<SnapshotRecord, PhotoError>, frame: &Frame) {
        self.preview = if self.frame.is_some() {
            PreviewState::Previewing
        } else {
            PreviewState::NoCamera
        };

        match result {
            Ok(record) => {
                self.status = StatusMessage::info(format!("Saved: {}", record.file_name()));
                let image = frame.to_image();
                self.compositor.set_reference(&record.path, image.clone());
                self.history.retain(|entry| entry.record.path != record.path);
                self.history.insert(0, HistoryEntry::with_image(record, &image));
                self.selected = 0;
                self.preview_dirty = true;
            }
            Err(e) => {
                error!(error = %e, "Failed to save snapshot");
                self.status = StatusMessage::error(e.to_string());
            }
        }
    }

    /// Block until the in-flight save (if any) finishes
    pub fn wait_for_save(&mut self) {
        while self.pending_save.is_some() {
            if !self.poll_save() {
                std::thread::sleep(ui::POLL_INTERVAL);
            }
        }
    }

    /// Move opacity by `delta`; the config file is only written on change
    pub fn adjust_opacity(&mut self, delta: i16) {
        let opacity = self.config.opacity.adjust(delta);
        if opacity == self.config.opacity {
            return;
        }

        self.config.opacity = opacity;
        self.preview_dirty = true;
        if let Err(e) = self.config_store.save(&self.config) {
            warn!(error = %e, "Failed to persist opacity");
            self.status = StatusMessage::error(e.to_string());
        }
    }

    pub fn toggle_overlay(&mut self) {
        self.overlay_enabled = !self.overlay_enabled;
        self.preview_dirty = true;
        self.status = StatusMessage::info(if self.overlay_enabled {
            "Overlay on"
        } else {
            "Overlay off"
        });
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.history.len() {
            self.selected += 1;
        }
    }

    /// Thumbnail of the selected history entry
    pub fn selected_thumbnail(&mut self) -> Option<&RgbImage> {
        self.history.get_mut(self.selected)?.thumbnail()
    }

    /// Rebuild the history from the directory
    ///
    /// Ignored while a save is in flight; the finished save updates the
    /// history itself.
    pub fn rescan(&mut self) {
        if self.preview == PreviewState::Saving {
            debug!("Rescan skipped during save");
            self.status = StatusMessage::info("Saving... rescan skipped");
            return;
        }

        match storage::list_snapshots(self.writer.dir()) {
            Ok(records) => {
                info!(count = records.len(), "History loaded");
                self.history = records.into_iter().map(HistoryEntry::new).collect();
            }
            Err(e) => {
                error!(error = %e, "Failed to scan snapshot directory");
                self.status = StatusMessage::error(e.to_string());
                self.history.clear();
            }
        }
        self.selected = self.selected.min(self.history.len().saturating_sub(1));
        self.load_reference();
    }

    /// Use the newest history entry as the overlay reference
    fn load_reference(&mut self) {
        let Some(newest) = self.history.first() else {
            self.compositor.clear_reference();
            self.preview_dirty = true;
            return;
        };
        if self.compositor.reference_path() == Some(newest.record.path.as_path()) {
            return;
        }

        match storage::load_image(&newest.record.path) {
            Ok(image) => self.compositor.set_reference(&newest.record.path, image),
            Err(e) => {
                warn!(error = %e, "Failed to load overlay reference");
                self.compositor.clear_reference();
            }
        }
        self.preview_dirty = true;
    }

    /// Open the snapshot folder in the file manager
    pub fn open_folder(&mut self) {
        let dir = self.writer.dir().to_path_buf();
        info!(path = %dir.display(), "Opening snapshot folder");
        if let Err(e) = open::that(&dir) {
            error!(error = %e, "Failed to open snapshot folder");
            self.status = StatusMessage::error(format!("Failed to open folder: {}", e));
        }
    }
}

/// Key hints shown when nothing else is being reported
pub fn default_status() -> &'static str {
    "space picture | ←/→ opacity | v overlay | h help | q quit"
}

/// Full key list
pub fn help_message() -> &'static str {
    "space/p: Take picture | ←/→: Opacity ±1 | PgUp/PgDn: Opacity ±10 | v: Toggle overlay | \
     ↑/↓: Select | r: Rescan | o: Open folder | h: Toggle help | q/Ctrl+C: Quit"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings(dir: &Path) -> Settings {
        Settings::new(Some(PathBuf::from(dir)), None)
    }

    fn frame() -> Frame {
        Frame::from_rgb(4, 2, vec![128; 24]).unwrap()
    }

    #[test]
    fn test_first_frame_enables_shutter() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);

        assert_eq!(state.preview, PreviewState::NoCamera);
        assert!(!state.shutter_enabled());

        state.on_frame(frame());
        assert_eq!(state.preview, PreviewState::Previewing);
        assert!(state.shutter_enabled());
    }

    #[test]
    fn test_shutter_without_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);

        state.take_picture();
        assert!(state.status.is_error);
        assert_eq!(state.preview, PreviewState::NoCamera);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_save_prepends_to_history() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);
        state.on_frame(frame());

        state.take_picture();
        assert_eq!(state.preview, PreviewState::Saving);
        assert!(!state.shutter_enabled());

        state.wait_for_save();
        assert_eq!(state.preview, PreviewState::Previewing);
        assert_eq!(state.history.len(), 1);
        assert!(state.history[0].record.path.is_file());
        assert!(state.selected_thumbnail().is_some());
    }

    #[test]
    fn test_rescan_during_save_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);
        state.on_frame(frame());

        state.take_picture();
        // Let the worker finish writing before the rescan runs
        std::thread::sleep(std::time::Duration::from_millis(200));
        state.rescan();
        state.wait_for_save();

        let on_disk = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
            .count();
        assert_eq!(on_disk, 1);
        assert_eq!(state.history.len(), on_disk);

        state.rescan();
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_failed_save_keeps_history_and_reference() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);
        state.on_frame(frame());
        state.take_picture();
        state.wait_for_save();
        let saved = state.history[0].record.path.clone();

        // A regular file where the directory should be makes every write fail
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        state.writer = SnapshotWriter::new(blocker.clone(), 10);

        state.take_picture();
        assert_eq!(state.preview, PreviewState::Saving);
        state.wait_for_save();

        assert!(state.status.is_error);
        assert_eq!(state.preview, PreviewState::Previewing);
        assert!(state.shutter_enabled());
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].record.path, saved);
        assert_eq!(state.compositor.reference_path(), Some(saved.as_path()));
    }

    #[test]
    fn test_opacity_written_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let mut state = AppState::new(&settings, None);

        // Created with defaults on first run
        assert!(settings.config_path.is_file());
        std::fs::remove_file(&settings.config_path).unwrap();

        state.config.opacity = Opacity::OPAQUE;
        state.adjust_opacity(10);
        assert!(!settings.config_path.exists());

        state.adjust_opacity(-10);
        let stored = ConfigStore::new(&settings.config_path).read().unwrap();
        assert_eq!(stored.opacity.percent(), 90);
    }

    #[test]
    fn test_camera_error_shows_history_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            &settings(dir.path()),
            Some(CameraError::DeviceUnavailable("no device".into())),
        );
        assert!(state.status.is_error);
        assert!(state.status.text.contains("history only"));
    }

    #[test]
    fn test_unsupported_format_shows_history_only() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(
            &settings(dir.path()),
            Some(CameraError::UnsupportedFormat("H264".into())),
        );
        assert!(state.status.is_error);
        assert!(state.status.text.contains("Unsupported pixel format: H264"));
        assert!(state.status.text.contains("history only"));
        assert_eq!(state.preview, PreviewState::NoCamera);
    }

    #[test]
    fn test_selection_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(&settings(dir.path()), None);
        state.select_next();
        assert_eq!(state.selected, 0);
        state.select_previous();
        assert_eq!(state.selected, 0);
    }
}
