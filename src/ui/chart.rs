use super::{cell_to_pixel, panel, render_layer, render_tooltip};
use crate::app::Screen;
use crate::chart::scale::{nice_ticks, year_ticks};
use crate::chart::ChartView;
use crossterm::event::{KeyCode, MouseEvent, MouseEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::time::Instant;

/// Columns reserved left of the plot for y labels
const Y_AXIS_WIDTH: u16 = 6;

pub struct ChartScreen {
    view: ChartView,
    /// Plot area of the last frame, for mouse mapping
    plot: Rect,
}

impl ChartScreen {
    pub fn new(view: ChartView) -> Self {
        Self {
            view,
            plot: Rect::default(),
        }
    }

    fn render_axes(&self, plot: Rect, buf: &mut Buffer) {
        // The year row sits below the plot, so an empty plot has no room for it
        if plot.is_empty() {
            return;
        }
        let label = Style::default().fg(Color::DarkGray);

        let (y0, y1) = self.view.y_domain();
        for tick in nice_ticks(y0, y1, 5) {
            let row = (self.view.y_scale().apply(tick) / 4.0).floor() as u16;
            if row >= plot.height {
                continue;
            }
            let text = format!("{:>w$}", tick, w = (Y_AXIS_WIDTH - 1) as usize);
            buf.set_stringn(
                plot.x.saturating_sub(Y_AXIS_WIDTH),
                plot.y + row,
                text,
                Y_AXIS_WIDTH as usize,
                label,
            );
        }

        let (x0, x1) = self.view.x_domain();
        let wanted = (plot.width / 10).max(2) as usize;
        let axis_row = plot.y + plot.height;
        // first column a label may start at without touching the previous one
        let mut free = 0;
        for tick in year_ticks(x0, x1, wanted) {
            let text = format!("{}", tick as i64);
            let len = text.len() as u16;
            if len > plot.width {
                break;
            }
            // Labels near the right edge slide left to stay whole
            let col = ((self.view.x_scale().apply(tick) / 2.0).floor() as u16).min(plot.width - len);
            if col < free {
                continue;
            }
            let end = col + len;
            buf.set_string(plot.x + col, axis_row, text, label);
            free = end + 1;
        }
    }
}

impl Screen for ChartScreen {
    fn title(&self) -> &str {
        "Journalist deaths by country"
    }

    fn on_key(&mut self, _key: KeyCode, _now: Instant) {}

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if !matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
            return;
        }
        match cell_to_pixel(self.plot, mouse.column, mouse.row) {
            Some(p) => self.view.hover(p, (mouse.column, mouse.row), now),
            None => self.view.leave(now),
        }
    }

    fn draw(&mut self, frame: &mut Frame, now: Instant) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(1)])
            .split(frame.area());

        let block = panel(self.title());
        let inner = block.inner(chunks[0]);
        frame.render_widget(block, chunks[0]);

        if let Some(message) = self.view.error() {
            let text = Paragraph::new(format!("Could not load chart data: {message}"))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(text, inner);
        } else {
            // y labels on the left, year labels on the bottom row
            let plot = Rect {
                x: inner.x + Y_AXIS_WIDTH.min(inner.width),
                y: inner.y,
                width: inner.width.saturating_sub(Y_AXIS_WIDTH),
                height: inner.height.saturating_sub(1),
            };
            self.plot = plot;
            self.view
                .resize_plot(plot.width as usize * 2, plot.height as usize * 4);

            let (cols, rows) = (plot.width as usize, plot.height as usize);
            let mut order: Vec<usize> = (0..self.view.series().len()).collect();
            // Hovered path on top
            if let Some(h) = self.view.hovered() {
                order.retain(|&i| i != h);
                order.push(h);
            }

            let buf = frame.buffer_mut();
            for i in order {
                let opacity = self.view.series_opacity(i, now);
                if opacity <= 0.01 {
                    continue;
                }
                let canvas = self.view.rasterize_series(i, cols, rows, now);
                let color = self.view.series()[i].color.with_opacity(opacity);
                render_layer(&canvas, color, plot, buf);
            }
            self.render_axes(plot, buf);
            render_tooltip(self.view.tooltip(), now, inner, buf);
        }

        let status = Line::from(vec![
            Span::styled(" Series: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.view.series().len().to_string(),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                if self.view.is_revealing(now) { " drawing" } else { "" },
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(
                " | hover a line to highlight | q:quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(status), chunks[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::records::Record;
    use crate::config::ChartConfig;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn rec(category: &str, year: i32, count: f64) -> Record {
        Record {
            category: category.to_string(),
            year,
            count,
        }
    }

    fn screen(records: &[Record], now: Instant) -> ChartScreen {
        ChartScreen::new(ChartView::new(records, &ChartConfig::default(), now))
    }

    fn moved(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Moved,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
        let buf = terminal.backend().buffer();
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let height = terminal.backend().buffer().area.height;
        (0..height).map(|y| row_text(terminal, y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_tooltip_on_top_row_is_drawn() {
        let t0 = Instant::now();
        let records = [rec("Iraq", 2013, 10.0), rec("Iraq", 2023, 10.0)];
        let mut screen = screen(&records, t0);
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();

        // The maximum sits on the first plot row
        let settled = t0 + Duration::from_secs(7);
        terminal.draw(|f| screen.draw(f, settled)).unwrap();
        let plot = screen.plot;
        screen.on_mouse(moved(plot.x + 10, plot.y), settled);
        assert_eq!(screen.view.hovered(), Some(0));

        let shown = settled + Duration::from_millis(300);
        terminal.draw(|f| screen.draw(f, shown)).unwrap();
        assert!(row_text(&terminal, plot.y).contains(" Iraq "));
    }

    #[test]
    fn test_wide_axis_has_one_label_per_year() {
        let t0 = Instant::now();
        let records = [rec("Iraq", 2013, 4.0), rec("Iraq", 2023, 9.0)];
        let mut screen = screen(&records, t0);
        let mut terminal = Terminal::new(TestBackend::new(220, 12)).unwrap();
        terminal.draw(|f| screen.draw(f, t0)).unwrap();

        let plot = screen.plot;
        let axis = row_text(&terminal, plot.y + plot.height);
        let labels: Vec<i64> = axis
            .split_whitespace()
            .filter_map(|w| w.parse().ok())
            .collect();
        assert_eq!(labels, (2013..=2023).collect::<Vec<_>>());
    }

    #[test]
    fn test_tiny_terminal_draws() {
        let t0 = Instant::now();
        let records = [rec("Iraq", 2013, 4.0), rec("Iraq", 2023, 9.0)];
        let mut screen = screen(&records, t0);
        for (w, h) in [(12, 3), (3, 1), (1, 1)] {
            let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
            terminal.draw(|f| screen.draw(f, t0)).unwrap();
        }
    }

    #[test]
    fn test_error_message_is_shown() {
        let t0 = Instant::now();
        let mut screen = ChartScreen::new(ChartView::failed(
            "line 3: bad count".to_string(),
            &ChartConfig::default(),
            t0,
        ));
        let mut terminal = Terminal::new(TestBackend::new(60, 8)).unwrap();
        terminal.draw(|f| screen.draw(f, t0)).unwrap();
        assert!(screen_text(&terminal).contains("line 3: bad count"));
    }
}
