use crate::color::Rgb;
use crate::config::MapConfig;
use crate::data::{self, LineString};
use crate::map::choropleth::{FillLayer, StepRamp};
use crate::map::loader::SourceLoader;
use crate::map::projection::Viewport;
use crate::map::spikes::{SpikeFeature, SpikeOverlay, SpikeStyle};
use crate::map::surface::{MapEvent, MapSurface, SourceState};
use crate::slider::RangeSlider;
use crate::tooltip::Tooltip;
use anyhow::Result;
use glam::DVec2;
use std::time::Instant;

/// Id of the choropleth fill layer
pub const FILL_LAYER_ID: &str = "colormap";
/// Opacity of the choropleth fill
pub const FILL_OPACITY: f64 = 0.5;

/// Source id for a year's choropleth data
pub fn source_id(year: i32) -> String {
    format!("indexmap_all_{year}")
}

/// Controller for the spike + choropleth map. Owns the surface, the overlay,
/// the year slider and the tooltip.
pub struct MapView {
    pub surface: MapSurface,
    overlay: SpikeOverlay,
    slider: RangeSlider,
    outlines: Vec<LineString>,
    tooltip: Tooltip,
    hovered: Option<usize>,
    pointer: Option<(DVec2, (u16, u16))>,
    config: MapConfig,
    ramp: StepRamp,
    renders: u64,
}

impl MapView {
    pub fn new(
        cfg: &MapConfig,
        features: Vec<SpikeFeature>,
        outlines: Vec<LineString>,
        loader: SourceLoader,
        now: Instant,
    ) -> Result<Self> {
        let [lon, lat] = cfg.center;
        let viewport = Viewport::new(lon, lat, cfg.zoom, cfg.min_zoom, cfg.max_zoom);
        let style = SpikeStyle::from_config(&cfg.spike)?;

        Ok(Self {
            surface: MapSurface::new(viewport, loader),
            overlay: SpikeOverlay::new(features, style),
            slider: RangeSlider::new(cfg.year_min, cfg.year_max, 1, cfg.initial_year),
            outlines,
            tooltip: Tooltip::new(now),
            hovered: None,
            pointer: None,
            config: cfg.clone(),
            ramp: StepRamp::press_freedom(),
            renders: 0,
        })
    }

    /// Load the point features and basemap named by the config. Missing or
    /// broken files are logged and leave the map empty rather than failing.
    pub fn from_config(cfg: &MapConfig, now: Instant) -> Result<Self> {
        let features = match data::load_spike_features(&cfg.points) {
            Ok(f) => {
                tracing::info!(features = f.len(), path = ?cfg.points, "point features loaded");
                f
            }
            Err(e) => {
                tracing::warn!("point features unavailable: {e:#}");
                Vec::new()
            }
        };

        let outlines = match &cfg.coastlines {
            Some(path) if path.exists() => data::load_outlines(path).unwrap_or_else(|e| {
                tracing::warn!("basemap unavailable: {e:#}");
                Vec::new()
            }),
            Some(path) => {
                tracing::debug!(?path, "basemap file not found");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self::new(cfg, features, outlines, SourceLoader::new(), now)
    }

    pub fn year(&self) -> i32 {
        self.slider.value()
    }

    pub fn slider(&self) -> &RangeSlider {
        &self.slider
    }

    pub fn overlay(&self) -> &SpikeOverlay {
        &self.overlay
    }

    pub fn outlines(&self) -> &[LineString] {
        &self.outlines
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    /// Number of render events handled so far
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Slider input. Returns true when the year changed.
    pub fn set_year(&mut self, year: i32, now: Instant) -> bool {
        let changed = self.slider.set(year);
        if changed {
            self.year_changed(now);
        }
        changed
    }

    /// Move the slider by whole steps
    pub fn step_year(&mut self, steps: i32, now: Instant) -> bool {
        let changed = self.slider.step_by(steps);
        if changed {
            self.year_changed(now);
        }
        changed
    }

    fn year_changed(&mut self, now: Instant) {
        tracing::info!(year = self.slider.value(), "year selected");
        if self.surface.is_loaded() {
            self.update_map(now);
        }
    }

    /// Full refresh for the selected year: refilter, swap the choropleth
    /// source, reproject. Safe to call repeatedly for the same year.
    pub fn update_map(&mut self, now: Instant) {
        let year = self.slider.value();
        let markers = self.overlay.select_year(year as i64);
        tracing::debug!(year, markers, "overlay rebuilt");

        self.swap_choropleth(year);
        self.overlay.reproject(&self.surface.viewport);

        // Old marker indices are meaningless now
        let was_hovering = self.hovered.take().is_some();
        self.refresh_hover_at_pointer(now);
        if was_hovering && self.hovered.is_none() {
            self.tooltip.hide(now);
        }
    }

    fn swap_choropleth(&mut self, year: i32) {
        let id = source_id(year);
        let path = self.config.choropleth_path(year);

        let registered = if self.surface.get_source(&id).is_some() {
            self.surface.set_source_data(&id, &path)
        } else {
            self.surface.add_source(&id, &path)
        };
        if let Err(e) = registered {
            tracing::warn!(source_id = %id, "choropleth source not registered: {e}");
            return;
        }

        if self.surface.get_layer(FILL_LAYER_ID).is_some() {
            if let Err(e) = self.surface.remove_layer(FILL_LAYER_ID) {
                tracing::warn!("fill layer not removed: {e}");
            }
        }
        let layer = FillLayer::new(FILL_LAYER_ID, id, self.ramp.clone(), FILL_OPACITY);
        if let Err(e) = self.surface.add_layer(layer) {
            tracing::warn!("fill layer not added: {e}");
        }
    }

    /// Render-tick handler: camera moved or data arrived, so every screen
    /// position is recomputed. Sizes come from counts and do not change.
    pub fn on_render(&mut self) {
        self.renders += 1;
        self.overlay.reproject(&self.surface.viewport);
    }

    /// Collect finished loads and run the handlers for pending surface
    /// events. Called once per frame before drawing.
    pub fn dispatch(&mut self, now: Instant) {
        self.surface.poll();
        for event in self.surface.drain_events() {
            match event {
                MapEvent::Load => {
                    tracing::debug!("map loaded");
                    self.update_map(now);
                }
                MapEvent::Resize => {
                    tracing::debug!(
                        width = self.surface.viewport.width,
                        height = self.surface.viewport.height,
                        "overlay resized"
                    );
                }
                MapEvent::Render => {
                    self.on_render();
                    self.refresh_hover_at_pointer(now);
                }
            }
        }
    }

    /// Pointer moved to pixel `p` (tooltip anchored at terminal `cell`)
    pub fn hover(&mut self, p: DVec2, cell: (u16, u16), now: Instant) {
        self.pointer = Some((p, cell));
        self.refresh_hover_at_pointer(now);
    }

    /// Pointer left the map
    pub fn leave(&mut self, now: Instant) {
        self.pointer = None;
        if self.hovered.take().is_some() {
            self.tooltip.hide(now);
        }
    }

    fn refresh_hover_at_pointer(&mut self, now: Instant) {
        let Some((p, cell)) = self.pointer else {
            return;
        };
        let hit = self.overlay.hit_test(p).map(|(i, m)| (i, m.label()));

        match (hit, self.hovered) {
            (Some((i, _)), Some(current)) if i == current => {
                self.tooltip.move_to(tooltip_anchor(cell));
            }
            (Some((i, label)), _) => {
                self.hovered = Some(i);
                self.tooltip.show(now, label, Rgb::WHITE, tooltip_anchor(cell));
            }
            (None, Some(_)) => {
                self.hovered = None;
                self.tooltip.hide(now);
            }
            (None, None) => {}
        }
    }

    /// One-line summary of the selected year's choropleth source
    pub fn source_status(&self) -> String {
        let id = source_id(self.year());
        match self.surface.get_source(&id).map(|s| &s.state) {
            Some(SourceState::Loading) => "loading".to_string(),
            Some(SourceState::Ready) => "ready".to_string(),
            Some(SourceState::Failed(_)) => "no data".to_string(),
            None => "-".to_string(),
        }
    }
}

/// Tooltip sits just right of and above the pointer
fn tooltip_anchor(cell: (u16, u16)) -> (u16, u16) {
    (cell.0.saturating_add(2), cell.1.saturating_sub(1))
}
