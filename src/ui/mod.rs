mod chart;
mod map;

pub use chart::ChartScreen;
pub use map::MapScreen;

use crate::braille::BrailleCanvas;
use crate::color::Rgb;
use crate::tooltip::Tooltip;
use glam::DVec2;
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};
use std::time::Instant;

/// Bordered panel in the shared style
pub fn panel(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

/// Render a braille canvas layer with a specific color
pub fn render_layer(canvas: &BrailleCanvas, color: Rgb, area: Rect, buf: &mut Buffer) {
    let rows = canvas.height().min(area.height as usize);
    let cols = canvas.width().min(area.width as usize);

    for cy in 0..rows {
        let y = area.y + cy as u16;
        for cx in 0..cols {
            // Empty cells leave lower layers visible
            let Some(ch) = canvas.cell(cx, cy) else {
                continue;
            };
            let x = area.x + cx as u16;
            buf[(x, y)].set_char(ch).set_fg(color.into());
        }
    }
}

/// Draw the tooltip text at its anchor, faded by its current opacity
pub fn render_tooltip(tooltip: &Tooltip, now: Instant, area: Rect, buf: &mut Buffer) {
    if !tooltip.is_visible(now) || tooltip.text.is_empty() {
        return;
    }
    let area = area.intersection(buf.area);
    if area.is_empty() {
        return;
    }
    let opacity = tooltip.opacity(now);
    let text = format!(" {} ", tooltip.text);

    // Pull the anchor inside so edge hovers still show, shifting left when
    // the text would run off the right side
    let text_width = text.chars().count().min(area.width as usize) as u16;
    let (col, row) = tooltip.anchor;
    let col = col.min(area.right() - text_width).max(area.x);
    let row = row.clamp(area.y, area.bottom() - 1);

    let style = Style::default()
        .fg(tooltip.color.with_opacity(opacity).into())
        .bg(Rgb(32, 32, 32).with_opacity(opacity).into());
    let width = (area.right() - col) as usize;
    buf.set_stringn(col, row, text, width, style);
}

/// Braille pixel at the center of terminal cell (`col`, `row`), relative
/// to `area`. `None` when the cell is outside.
pub fn cell_to_pixel(area: Rect, col: u16, row: u16) -> Option<DVec2> {
    if !area.contains(Position::new(col, row)) {
        return None;
    }
    let px = (col - area.x) as f64 * 2.0 + 1.0;
    let py = (row - area.y) as f64 * 4.0 + 2.0;
    Some(DVec2::new(px, py))
}
