pub mod palette;
pub mod records;
pub mod scale;
pub mod series;

use crate::anim::Tween;
use crate::braille::BrailleCanvas;
use crate::color::Rgb;
use crate::config::ChartConfig;
use crate::map::geometry::{distance_to_polyline, draw_polyline_prefix, polyline_length};
use crate::tooltip::Tooltip;
use glam::DVec2;
use records::Record;
use scale::{extent, LinearScale, TimeScale};
use series::{group_by_category, Series};
use std::time::{Duration, Instant};

/// Opacity of a hovered path
pub const HOVER_OPACITY: f64 = 1.0;
/// Opacity a path returns to after hover
pub const DIMMED_OPACITY: f64 = 0.4;
pub const HOVER_IN: Duration = Duration::from_millis(200);
pub const HOVER_OUT: Duration = Duration::from_millis(500);
/// Pointer distance in pixels that still counts as over a path
pub const HOVER_TOLERANCE: f64 = 3.0;

/// One drawn path and its animated opacity
#[derive(Clone, Debug)]
pub struct SeriesState {
    pub series: Series,
    pub color: Rgb,
    opacity: Tween,
}

impl SeriesState {
    pub fn opacity(&self, now: Instant) -> f64 {
        self.opacity.value_at(now)
    }

    pub fn target_opacity(&self) -> f64 {
        self.opacity.target()
    }
}

/// Controller for the multi-series line chart
pub struct ChartView {
    series: Vec<SeriesState>,
    x_domain: (f64, f64),
    y_domain: (f64, f64),
    x: TimeScale,
    y: LinearScale,
    reveal: Tween,
    tooltip: Tooltip,
    hovered: Option<usize>,
    error: Option<String>,
}

impl ChartView {
    pub fn new(records: &[Record], cfg: &ChartConfig, now: Instant) -> Self {
        let reveal = cfg.reveal();
        let series: Vec<SeriesState> = group_by_category(records)
            .into_iter()
            .map(|series| {
                let resting = if series.category == cfg.highlight {
                    DIMMED_OPACITY
                } else {
                    0.0
                };
                SeriesState {
                    color: palette::category_color(&series.category),
                    opacity: Tween::new(0.0, resting, now, reveal),
                    series,
                }
            })
            .collect();

        let x_domain = extent(records.iter().map(|r| r.year as f64)).unwrap_or((0.0, 0.0));
        let y_max = extent(records.iter().map(|r| r.count)).map_or(0.0, |(_, hi)| hi.max(0.0));
        let y_domain = (0.0, y_max);

        Self {
            series,
            x_domain,
            y_domain,
            x: TimeScale::new(x_domain, (0.0, 0.0)),
            y: LinearScale::new(y_domain, (0.0, 0.0)),
            reveal: Tween::new(0.0, 1.0, now, reveal),
            tooltip: Tooltip::new(now),
            hovered: None,
            error: None,
        }
    }

    /// A chart with nothing to draw that reports why
    pub fn failed(message: impl Into<String>, cfg: &ChartConfig, now: Instant) -> Self {
        let mut view = Self::new(&[], cfg, now);
        view.error = Some(message.into());
        view
    }

    /// Load the CSV named by the config. A load error leaves an empty chart
    /// that shows the message.
    pub fn from_config(cfg: &ChartConfig, now: Instant) -> Self {
        match records::load_records(&cfg.csv) {
            Ok(records) => {
                let view = Self::new(&records, cfg, now);
                let uncolored = view
                    .series
                    .iter()
                    .filter(|s| !palette::is_known(&s.series.category))
                    .count();
                if uncolored > 0 {
                    tracing::debug!(uncolored, "categories drawn in the fallback color");
                }
                tracing::info!(
                    records = records.len(),
                    series = view.series.len(),
                    path = ?cfg.csv,
                    "chart data loaded"
                );
                view
            }
            Err(e) => {
                tracing::error!("chart data unavailable: {e:#}");
                Self::failed(format!("{e:#}"), cfg, now)
            }
        }
    }

    /// Size of the plot area in Braille pixels
    pub fn resize_plot(&mut self, width: usize, height: usize) {
        let right = width.saturating_sub(1) as f64;
        let bottom = height.saturating_sub(1) as f64;
        self.x = TimeScale::new(self.x_domain, (0.0, right));
        self.y = LinearScale::new(self.y_domain, (bottom, 0.0));
    }

    pub fn series(&self) -> &[SeriesState] {
        &self.series
    }

    pub fn x_scale(&self) -> &TimeScale {
        &self.x
    }

    pub fn y_scale(&self) -> &LinearScale {
        &self.y
    }

    pub fn x_domain(&self) -> (f64, f64) {
        self.x_domain
    }

    pub fn y_domain(&self) -> (f64, f64) {
        self.y_domain
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Pixel positions of a series in data order
    pub fn series_points(&self, index: usize) -> Vec<DVec2> {
        self.series
            .get(index)
            .map(|s| {
                s.series
                    .points
                    .iter()
                    .map(|r| DVec2::new(self.x.apply(r.year as f64), self.y.apply(r.count)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Share of each path's length drawn so far
    pub fn reveal_fraction(&self, now: Instant) -> f64 {
        self.reveal.value_at(now)
    }

    /// True while the paths are still being drawn in
    pub fn is_revealing(&self, now: Instant) -> bool {
        !self.reveal.is_settled(now)
    }

    pub fn series_opacity(&self, index: usize, now: Instant) -> f64 {
        self.series.get(index).map_or(0.0, |s| s.opacity(now))
    }

    /// Draw the revealed part of one series on a fresh canvas
    pub fn rasterize_series(&self, index: usize, cols: usize, rows: usize, now: Instant) -> BrailleCanvas {
        let mut canvas = BrailleCanvas::new(cols, rows);
        let points = self.series_points(index);
        let length = polyline_length(&points) * self.reveal_fraction(now);
        draw_polyline_prefix(&mut canvas, &points, length);
        canvas
    }

    fn nearest_series(&self, p: DVec2) -> Option<usize> {
        (0..self.series.len())
            .map(|i| (i, distance_to_polyline(p, &self.series_points(i))))
            .filter(|(_, d)| *d <= HOVER_TOLERANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Pointer moved to pixel `p` inside the plot; `cell` is its terminal cell
    pub fn hover(&mut self, p: DVec2, cell: (u16, u16), now: Instant) {
        let hit = self.nearest_series(p);
        let anchor = (cell.0, cell.1.saturating_sub(1));

        match (hit, self.hovered) {
            (Some(i), Some(current)) if i == current => {
                self.tooltip.move_to(anchor);
            }
            (Some(i), previous) => {
                if let Some(prev) = previous {
                    self.dim(prev, now);
                }
                self.hovered = Some(i);
                let state = &mut self.series[i];
                state.opacity.retarget(now, HOVER_OPACITY, HOVER_IN);
                tracing::trace!(category = %state.series.category, "path hovered");
                self.tooltip
                    .show(now, state.series.category.clone(), state.color, anchor);
            }
            (None, Some(_)) => self.leave(now),
            (None, None) => {}
        }
    }

    /// Pointer left the hovered path or the plot
    pub fn leave(&mut self, now: Instant) {
        if let Some(prev) = self.hovered.take() {
            self.dim(prev, now);
            self.tooltip.hide(now);
        }
    }

    fn dim(&mut self, index: usize, now: Instant) {
        if let Some(state) = self.series.get_mut(index) {
            state.opacity.retarget(now, DIMMED_OPACITY, HOVER_OUT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tooltip::SHOWN_OPACITY;

    fn rec(category: &str, year: i32, count: f64) -> Record {
        Record {
            category: category.to_string(),
            year,
            count,
        }
    }

    fn chart(now: Instant) -> ChartView {
        let records = vec![
            rec("Iraq", 2013, 10.0),
            rec("Iraq", 2014, 20.0),
            rec("Syria", 2013, 0.0),
            rec("Syria", 2014, 5.0),
            rec("Nepal", 2013, 2.0),
            rec("Nepal", 2014, 2.0),
        ];
        let mut view = ChartView::new(&records, &ChartConfig::default(), now);
        view.resize_plot(101, 41);
        view
    }

    #[test]
    fn test_series_colors_and_domains() {
        let view = chart(Instant::now());
        let colors: Vec<_> = view.series().iter().map(|s| s.color).collect();
        assert_eq!(colors[0], palette::category_color("Iraq"));
        assert_eq!(colors[1], palette::category_color("Syria"));
        assert_eq!(colors[2], palette::FALLBACK);
        assert_eq!(view.x_domain(), (2013.0, 2014.0));
        assert_eq!(view.y_domain(), (0.0, 20.0));
    }

    #[test]
    fn test_points_span_plot() {
        let view = chart(Instant::now());
        let iraq = view.series_points(0);
        assert_eq!(iraq, vec![DVec2::new(0.0, 20.0), DVec2::new(100.0, 0.0)]);
        assert!(view.series_points(9).is_empty());
    }

    #[test]
    fn test_reveal_settles_to_resting_opacity() {
        let t0 = Instant::now();
        let view = chart(t0);
        assert_eq!(view.reveal_fraction(t0), 0.0);
        assert_eq!(view.series_opacity(0, t0), 0.0);

        let done = t0 + Duration::from_millis(6000);
        assert_eq!(view.reveal_fraction(done), 1.0);
        assert!(view.is_revealing(t0));
        assert!(!view.is_revealing(done));
        assert!((view.series_opacity(0, done) - DIMMED_OPACITY).abs() < 1e-12);
        assert_eq!(view.series_opacity(1, done), 0.0);
    }

    #[test]
    fn test_partial_reveal_draws_partial_path() {
        let t0 = Instant::now();
        let view = chart(t0);
        let half = view.rasterize_series(0, 51, 11, t0 + Duration::from_millis(3000));
        let full = view.rasterize_series(0, 51, 11, t0 + Duration::from_millis(6000));
        assert!(half.count_dots() > 0);
        assert!(half.count_dots() < full.count_dots());
        assert!(view.rasterize_series(0, 51, 11, t0).is_empty());
    }

    #[test]
    fn test_hover_raises_and_leave_dims() {
        let t0 = Instant::now();
        let mut view = chart(t0);

        // Syria runs from (0, 40) to (100, 30)
        view.hover(DVec2::new(50.0, 35.0), (25, 8), t0);
        assert_eq!(view.hovered(), Some(1));
        assert_eq!(view.series()[1].target_opacity(), HOVER_OPACITY);
        assert_eq!(view.tooltip().text, "Syria");
        assert_eq!(view.tooltip().color, palette::category_color("Syria"));
        assert_eq!(view.tooltip().anchor, (25, 7));
        assert_eq!(view.tooltip().target_opacity(), SHOWN_OPACITY);
        assert!((view.series_opacity(1, t0 + HOVER_IN) - 1.0).abs() < 1e-12);

        let later = t0 + HOVER_IN;
        view.hover(DVec2::new(50.0, 0.0), (25, 0), later);
        assert_eq!(view.hovered(), None);
        assert_eq!(view.series()[1].target_opacity(), DIMMED_OPACITY);
        assert_eq!(view.tooltip().target_opacity(), 0.0);
        assert!((view.series_opacity(1, later + HOVER_OUT) - DIMMED_OPACITY).abs() < 1e-12);
    }

    #[test]
    fn test_moving_between_paths_switches_highlight() {
        let t0 = Instant::now();
        let mut view = chart(t0);
        view.hover(DVec2::new(50.0, 35.0), (0, 0), t0);
        // Iraq passes through (50, 10)
        view.hover(DVec2::new(50.0, 10.0), (0, 0), t0);
        assert_eq!(view.hovered(), Some(0));
        assert_eq!(view.series()[0].target_opacity(), HOVER_OPACITY);
        assert_eq!(view.series()[1].target_opacity(), DIMMED_OPACITY);
        assert_eq!(view.tooltip().text, "Iraq");

        view.leave(t0);
        assert_eq!(view.series()[0].target_opacity(), DIMMED_OPACITY);
    }

    #[test]
    fn test_failed_chart_is_empty() {
        let cfg = ChartConfig {
            csv: "/nonexistent/linechart.csv".into(),
            ..ChartConfig::default()
        };
        let view = ChartView::from_config(&cfg, Instant::now());
        assert!(view.series().is_empty());
        assert!(view.error().unwrap().contains("linechart.csv"));
    }
}
