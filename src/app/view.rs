// SPDX-License-Identifier: GPL-3.0-only

//! Terminal widgets
//!
//! Images are drawn with Unicode half-block characters: each cell shows two
//! vertical pixels, the upper one as foreground and the lower one as
//! background.

use super::state::{AppState, help_message};
use crate::constants::{self, ui};
use crate::pipelines::overlay::fit_within;
use image::RgbImage;
use ratatui::{
    Frame as TerminalFrame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Gauge, List, ListItem, ListState, Widget},
};

/// Draw the whole screen
pub fn draw(f: &mut TerminalFrame, state: &mut AppState) {
    let area = f.area();

    // Reserve bottom line for status
    let [body, status_area] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
    let [left, history_area] = Layout::horizontal([
        Constraint::Min(10),
        Constraint::Length(ui::HISTORY_PANEL_WIDTH),
    ])
    .areas(body);
    let [preview_area, gauge_area] =
        Layout::vertical([Constraint::Min(2), Constraint::Length(3)]).areas(left);

    let has_image = state.preview_image().is_some();
    let placeholder = match (state.camera_error.is_some(), has_image) {
        (true, _) => "Camera unavailable",
        (false, false) => "Waiting for camera...",
        (false, true) => "",
    };
    let title = format!(" {} ", constants::APP_TITLE);
    let preview_block = Block::bordered().title(title);
    let inner = preview_block.inner(preview_area);
    f.render_widget(preview_block, preview_area);
    f.render_widget(
        ImageWidget {
            image: state.preview_image(),
            placeholder,
        },
        inner,
    );

    let opacity = state.opacity();
    let gauge_style = if state.overlay_enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(
        Gauge::default()
            .block(Block::bordered().title(" Previous Picture Opacity "))
            .gauge_style(gauge_style)
            .percent(opacity.percent() as u16)
            .label(opacity.to_string()),
        gauge_area,
    );

    draw_history(f, state, history_area);

    let (text, is_error) = if state.show_help {
        (help_message(), false)
    } else {
        (state.status.text.as_str(), state.status.is_error)
    };
    f.render_widget(
        StatusBar {
            message: text,
            is_error,
        },
        status_area,
    );
}

fn draw_history(f: &mut TerminalFrame, state: &mut AppState, area: Rect) {
    let block = Block::bordered().title(format!(" History ({}) ", state.history.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [list_area, thumb_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(ui::THUMBNAIL_ROWS)]).areas(inner);

    let items: Vec<ListItem> = state
        .history
        .iter()
        .map(|entry| ListItem::new(entry.record.file_name().into_owned()))
        .collect();
    let list = List::new(items)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if !state.history.is_empty() {
        list_state.select(Some(state.selected));
    }
    f.render_stateful_widget(list, list_area, &mut list_state);

    f.render_widget(
        ImageWidget {
            image: state.selected_thumbnail(),
            placeholder: "",
        },
        thumb_area,
    );
}

/// Widget that renders an RGB image using half-block characters
pub struct ImageWidget<'a> {
    pub image: Option<&'a RgbImage>,
    /// Centered text shown when there is no image
    pub placeholder: &'a str,
}

impl Widget for ImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let Some(image) = self.image.filter(|image| image.width() > 0 && image.height() > 0) else {
            let msg = self.placeholder;
            let x = area.x + (area.width.saturating_sub(msg.chars().count() as u16)) / 2;
            let y = area.y + area.height / 2;
            buf.set_string(x, y, msg, Style::default());
            return;
        };

        // Each terminal cell displays 2 vertical pixels
        let (display_width, display_pixel_rows) = fit_within(
            image.dimensions(),
            (area.width as u32, area.height as u32 * 2),
        );
        let display_height = display_pixel_rows.div_ceil(2);
        if display_width == 0 || display_height == 0 {
            return;
        }

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width as u16)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height as u16)) / 2;

        let (iw, ih) = image.dimensions();
        let sample = |tx: u32, py: u32| -> Color {
            let sx = (tx as u64 * iw as u64 / display_width as u64).min(iw as u64 - 1) as u32;
            let sy = (py as u64 * ih as u64 / display_pixel_rows as u64).min(ih as u64 - 1) as u32;
            let [r, g, b] = image.get_pixel(sx, sy).0;
            Color::Rgb(r, g, b)
        };

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx as u16;
                let term_y = y_offset + ty as u16;

                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let top = sample(tx, ty * 2);
                let bottom = sample(tx, ty * 2 + 1);
                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    pub message: &'a str,
    pub is_error: bool,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bg = if self.is_error {
            Color::Red
        } else {
            Color::DarkGray
        };

        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(bg);
            }
        }

        let text: String = self.message.chars().take(area.width as usize).collect();
        buf.set_string(area.x, area.y, text, Style::default().fg(Color::White).bg(bg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_image_widget_uses_half_blocks() {
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);

        ImageWidget {
            image: Some(&image),
            placeholder: "",
        }
        .render(area, &mut buf);

        let cell = &buf[(0, 0)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(255, 0, 0));
    }

    #[test]
    fn test_image_widget_placeholder() {
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);

        ImageWidget {
            image: None,
            placeholder: "Waiting",
        }
        .render(area, &mut buf);

        assert_eq!(buf[(6, 1)].symbol(), "W");
    }

    #[test]
    fn test_status_bar_truncates() {
        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);

        StatusBar {
            message: "Saved: DayAfterDay-2024-01-01-120000-1.png",
            is_error: false,
        }
        .render(area, &mut buf);

        assert_eq!(buf[(4, 0)].symbol(), "d");
        assert_eq!(buf[(0, 0)].bg, Color::DarkGray);
    }
}
