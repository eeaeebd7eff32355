use super::{cell_to_pixel, panel, render_layer, render_tooltip};
use crate::app::Screen;
use crate::color::Rgb;
use crate::map::basemap::rasterize_outlines;
use crate::map::projection::ZOOM_STEP;
use crate::map::view::source_id;
use crate::map::MapView;
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::time::Instant;

const OUTLINE_COLOR: Rgb = Rgb(90, 90, 90);

/// What a held left button is doing
#[derive(Clone, Copy, Debug, PartialEq)]
enum Drag {
    Pan { col: u16, row: u16 },
    Slider,
}

pub struct MapScreen {
    view: MapView,
    /// Map area of the last frame
    map_area: Rect,
    /// Slider track of the last frame
    track: Rect,
    drag: Option<Drag>,
}

impl MapScreen {
    pub fn new(view: MapView) -> Self {
        Self {
            view,
            map_area: Rect::default(),
            track: Rect::default(),
            drag: None,
        }
    }

    fn select_column(&mut self, col: u16, now: Instant) {
        let offset = col.saturating_sub(self.track.x);
        let year = self.view.slider().value_at_column(offset, self.track.width);
        self.view.set_year(year, now);
    }

    fn on_track(&self, col: u16, row: u16) -> bool {
        self.track.contains(Position::new(col, row))
    }

    fn render_map(&self, area: Rect, buf: &mut Buffer, now: Instant) {
        let vp = &self.view.surface.viewport;
        let (cols, rows) = (area.width as usize, area.height as usize);

        let active = self
            .view
            .surface
            .get_source(&source_id(self.view.year()))
            .map(|s| s.data())
            .unwrap_or_default();
        let outlines = rasterize_outlines(self.view.outlines(), active, cols, rows, vp);
        render_layer(&outlines, OUTLINE_COLOR, area, buf);

        for (layer, data) in self.view.surface.layers() {
            for bucket in layer.rasterize(data, cols, rows, vp) {
                render_layer(&bucket.canvas, bucket.color, area, buf);
            }
        }

        let overlay = self.view.overlay();
        let style = &overlay.style;
        let spikes = overlay.rasterize(cols, rows, vp);
        render_layer(&spikes.shadow, style.fill.scale(0.35), area, buf);
        render_layer(&spikes.fill, style.fill.with_opacity(style.fill_opacity), area, buf);
        render_layer(&spikes.stroke, style.stroke.with_opacity(style.stroke_opacity), area, buf);

        render_tooltip(self.view.tooltip(), now, area, buf);
    }

    /// `2013 ────●──── 2023`, remembering where the track landed
    fn render_slider(&mut self, area: Rect, buf: &mut Buffer) {
        // Squeezed out on very short terminals
        if area.is_empty() {
            self.track = Rect::default();
            return;
        }
        let slider = self.view.slider();
        let min = format!(" {} ", slider.min);
        let max = format!(" {} ", slider.max);
        let track = Rect {
            x: area.x + min.len() as u16,
            y: area.y,
            width: area.width.saturating_sub((min.len() + max.len()) as u16),
            height: 1,
        };

        let dim = Style::default().fg(Color::DarkGray);
        buf.set_string(area.x, area.y, &min, dim);
        let thumb = slider.thumb_column(track.width);
        for i in 0..track.width {
            let (ch, style) = if i == thumb {
                ('●', Style::default().fg(Color::Yellow))
            } else {
                ('─', dim)
            };
            buf[(track.x + i, track.y)].set_char(ch).set_style(style);
        }
        buf.set_string(track.x + track.width, area.y, &max, dim);
        self.track = track;
    }

    fn status_line(&self) -> Line<'static> {
        let vp = &self.view.surface.viewport;
        let center = format!(
            "{:.1}°{}, {:.1}°{}",
            vp.center_lat.abs(),
            if vp.center_lat >= 0.0 { "N" } else { "S" },
            vp.center_lon.abs(),
            if vp.center_lon >= 0.0 { "E" } else { "W" }
        );
        Line::from(vec![
            Span::styled(" Year: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.view.year().to_string(), Style::default().fg(Color::Yellow)),
            Span::styled(" | Zoom: ", Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:.1}", vp.zoom), Style::default().fg(Color::Yellow)),
            Span::styled(" | ", Style::default().fg(Color::DarkGray)),
            Span::styled(center, Style::default().fg(Color::Cyan)),
            Span::styled(" | Scores: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.view.source_status(), Style::default().fg(Color::Magenta)),
            Span::styled(
                " | hjkl:pan +/-:zoom [/]:year r:reset q:quit",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    }
}

impl Screen for MapScreen {
    fn title(&self) -> &str {
        "Journalist deaths and press freedom"
    }

    fn on_key(&mut self, key: KeyCode, now: Instant) {
        match key {
            // Pan with hjkl or arrow keys
            KeyCode::Left | KeyCode::Char('h') => self.view.surface.pan(-10.0, 0.0),
            KeyCode::Right | KeyCode::Char('l') => self.view.surface.pan(10.0, 0.0),
            KeyCode::Up | KeyCode::Char('k') => self.view.surface.pan(0.0, -6.0),
            KeyCode::Down | KeyCode::Char('j') => self.view.surface.pan(0.0, 6.0),

            KeyCode::Char('+') | KeyCode::Char('=') => self.view.surface.zoom_in(),
            KeyCode::Char('-') | KeyCode::Char('_') => self.view.surface.zoom_out(),
            KeyCode::Char('r') | KeyCode::Char('0') => self.view.surface.reset_camera(),

            KeyCode::Char('[') | KeyCode::Char('<') => {
                self.view.step_year(-1, now);
            }
            KeyCode::Char(']') | KeyCode::Char('>') => {
                self.view.step_year(1, now);
            }
            _ => {}
        }
    }

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let (col, row) = (mouse.column, mouse.row);
        let pixel = cell_to_pixel(self.map_area, col, row);

        match mouse.kind {
            MouseEventKind::ScrollUp => {
                if let Some(p) = pixel {
                    self.view.surface.zoom_at(p, ZOOM_STEP);
                }
            }
            MouseEventKind::ScrollDown => {
                if let Some(p) = pixel {
                    self.view.surface.zoom_at(p, -ZOOM_STEP);
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.on_track(col, row) {
                    self.drag = Some(Drag::Slider);
                    self.select_column(col, now);
                } else if pixel.is_some() {
                    self.drag = Some(Drag::Pan { col, row });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => match self.drag {
                Some(Drag::Slider) => self.select_column(col, now),
                Some(Drag::Pan { col: last_col, row: last_row }) => {
                    let dx = (last_col as f64 - col as f64) * 2.0;
                    let dy = (last_row as f64 - row as f64) * 4.0;
                    self.view.surface.pan(dx, dy);
                    self.drag = Some(Drag::Pan { col, row });
                }
                None => {}
            },
            MouseEventKind::Up(MouseButton::Left) => self.drag = None,
            MouseEventKind::Moved => match pixel {
                Some(p) => self.view.hover(p, (col, row), now),
                None => self.view.leave(now),
            },
            _ => {}
        }
    }

    fn draw(&mut self, frame: &mut Frame, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Map
                Constraint::Length(1), // Year slider
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        let block = panel(self.title());
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);
        self.map_area = inner;

        // Braille gives 2x4 resolution per character
        self.view
            .surface
            .resize(inner.width as usize * 2, inner.height as usize * 4);
        self.view.dispatch(now);

        let buf = frame.buffer_mut();
        self.render_map(inner, buf, now);
        self.render_slider(chunks[1], buf);

        if !chunks[2].is_empty() {
            frame.render_widget(Paragraph::new(self.status_line()), chunks[2]);
        }
    }
}
