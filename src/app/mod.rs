// SPDX-License-Identifier: GPL-3.0-only

//! Terminal user interface
//!
//! Live preview with the previous picture ghosted on top, the opacity gauge
//! and the snapshot history. The capture loop runs on its own thread and
//! feeds frames through a latest-wins slot that this loop polls between
//! input events.

pub mod keys;
pub mod state;
pub mod view;

pub use keys::Action;
pub use state::{AppState, HistoryEntry, PreviewState, StatusMessage};

use crate::backends::camera::{self, FrameReceiver};
use crate::config::Settings;
use crate::constants::ui;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, stdout};
use std::ops::ControlFlow;
use tracing::{info, warn};

/// Run the terminal UI until the user quits
pub fn run(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    info!(device = %settings.device, dir = %settings.snapshot_dir.display(), "Starting");

    // A missing camera only disables the preview
    let (capture, mut frames, camera_error) = match camera::start_capture(settings) {
        Ok((capture, frames)) => (Some(capture), Some(frames), None),
        Err(e) => {
            warn!(error = %e, "Camera unavailable, history only");
            (None, None, Some(e))
        }
    };

    let mut state = AppState::new(settings, camera_error);

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut state, frames.as_mut());

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Let a pending write land before the process exits
    state.wait_for_save();

    if let Some(mut capture) = capture {
        capture.stop();
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut frames: Option<&mut FrameReceiver>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        if let Some(receiver) = frames.as_deref_mut() {
            if let Some(frame) = receiver.latest() {
                state.on_frame(frame);
            } else if receiver.is_closed() && state.camera_error.is_none() {
                state.on_camera_lost();
            }
        }
        state.poll_save();

        terminal.draw(|f| view::draw(f, state))?;

        // Handle input with timeout for frame updates
        if event::poll(ui::POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(action) = keys::action_for(key)
            && apply(state, action).is_break()
        {
            break;
        }
    }

    Ok(())
}

/// Apply a user action to the state
pub fn apply(state: &mut AppState, action: Action) -> ControlFlow<()> {
    match action {
        Action::TakePicture => state.take_picture(),
        Action::AdjustOpacity(delta) => state.adjust_opacity(delta),
        Action::ToggleOverlay => state.toggle_overlay(),
        Action::SelectPrevious => state.select_previous(),
        Action::SelectNext => state.select_next(),
        Action::Rescan => state.rescan(),
        Action::OpenFolder => state.open_folder(),
        Action::ToggleHelp => state.toggle_help(),
        Action::Quit => return ControlFlow::Break(()),
    }
    ControlFlow::Continue(())
}
