use crate::braille::BrailleCanvas;
use crate::color::Rgb;
use crate::config::SpikeConfig;
use crate::map::geometry::{fill_polygon, point_in_triangle, spike_vertices, stroke_ring};
use crate::map::projection::Viewport;
use anyhow::{anyhow, Result};
use glam::DVec2;

/// A yearly death count at a country centroid
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeFeature {
    pub lon: f64,
    pub lat: f64,
    pub year: i64,
    pub country: String,
    pub count: f64,
}

/// Features whose year equals `year`, in source order
pub fn filter_by_year(features: &[SpikeFeature], year: i64) -> Vec<&SpikeFeature> {
    features.iter().filter(|f| f.year == year).collect()
}

/// Spike length for a count
#[inline]
pub fn marker_size(count: f64, length_per_count: f64) -> f64 {
    count * length_per_count
}

/// Resolved marker styling
#[derive(Clone, Debug)]
pub struct SpikeStyle {
    pub length_per_count: f64,
    pub width: f64,
    pub fill: Rgb,
    pub fill_opacity: f64,
    pub stroke: Rgb,
    pub stroke_opacity: f64,
    pub drop_shadow: bool,
    pub shadow_dy: f64,
}

impl SpikeStyle {
    pub fn from_config(cfg: &SpikeConfig) -> Result<Self> {
        let fill = Rgb::parse(&cfg.fill).ok_or_else(|| anyhow!("bad spike fill color {:?}", cfg.fill))?;
        let stroke =
            Rgb::parse(&cfg.stroke).ok_or_else(|| anyhow!("bad spike stroke color {:?}", cfg.stroke))?;
        Ok(Self {
            length_per_count: cfg.length_per_count,
            width: cfg.width,
            fill,
            fill_opacity: cfg.fill_opacity,
            stroke,
            stroke_opacity: cfg.stroke_opacity,
            drop_shadow: cfg.drop_shadow,
            shadow_dy: cfg.shadow_dy,
        })
    }
}

impl Default for SpikeStyle {
    fn default() -> Self {
        Self {
            length_per_count: 8.0,
            width: 7.0,
            fill: Rgb::LIGHT_GREY,
            fill_opacity: 0.85,
            stroke: Rgb::WHITE,
            stroke_opacity: 0.85,
            drop_shadow: true,
            shadow_dy: 4.0,
        }
    }
}

/// One drawn spike
#[derive(Clone, Debug, PartialEq)]
pub struct SpikeMarker {
    pub country: String,
    pub count: f64,
    pub lon: f64,
    pub lat: f64,
    /// Spike length in pixels
    pub length: f64,
    /// Projected base point; refreshed on every render
    pub anchor: DVec2,
}

impl SpikeMarker {
    pub fn vertices(&self, width: f64) -> [DVec2; 3] {
        spike_vertices(self.anchor, self.length, width)
    }

    /// Tooltip text for this marker
    pub fn label(&self) -> String {
        format!("{}, {} death", self.country, self.count)
    }
}

/// Canvases for one frame of the overlay, back to front
pub struct SpikeLayers {
    pub shadow: BrailleCanvas,
    pub fill: BrailleCanvas,
    pub stroke: BrailleCanvas,
}

/// The SVG-style overlay: all features loaded once, markers for the
/// selected year, positions recomputed per render.
pub struct SpikeOverlay {
    features: Vec<SpikeFeature>,
    pub style: SpikeStyle,
    year: Option<i64>,
    markers: Vec<SpikeMarker>,
}

impl SpikeOverlay {
    pub fn new(features: Vec<SpikeFeature>, style: SpikeStyle) -> Self {
        Self {
            features,
            style,
            year: None,
            markers: Vec::new(),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn year(&self) -> Option<i64> {
        self.year
    }

    pub fn markers(&self) -> &[SpikeMarker] {
        &self.markers
    }

    /// Replace all markers with the features of `year`.
    /// Anchors are stale until the next `reproject`.
    pub fn select_year(&mut self, year: i64) -> usize {
        let per_count = self.style.length_per_count;
        self.markers = filter_by_year(&self.features, year)
            .into_iter()
            .map(|f| SpikeMarker {
                country: f.country.clone(),
                count: f.count,
                lon: f.lon,
                lat: f.lat,
                length: marker_size(f.count, per_count),
                anchor: DVec2::ZERO,
            })
            .collect();
        self.year = Some(year);
        self.markers.len()
    }

    /// Recompute every marker's screen position for the current camera
    pub fn reproject(&mut self, viewport: &Viewport) {
        for m in &mut self.markers {
            m.anchor = viewport.project(m.lon, m.lat);
        }
    }

    /// Topmost marker under a pixel, with its index
    pub fn hit_test(&self, p: DVec2) -> Option<(usize, &SpikeMarker)> {
        let width = self.style.width;
        self.markers
            .iter()
            .enumerate()
            .rev()
            .find(|(_, m)| point_in_triangle(p, &m.vertices(width)))
    }

    /// Draw the markers onto fresh canvases of `cols` x `rows` characters
    pub fn rasterize(&self, cols: usize, rows: usize, viewport: &Viewport) -> SpikeLayers {
        let mut layers = SpikeLayers {
            shadow: BrailleCanvas::new(cols, rows),
            fill: BrailleCanvas::new(cols, rows),
            stroke: BrailleCanvas::new(cols, rows),
        };
        let width = self.style.width;
        let shadow_offset = DVec2::new(0.0, self.style.shadow_dy);

        for m in &self.markers {
            let tri = m.vertices(width);
            let top = DVec2::new(m.anchor.x, m.anchor.y - m.length);
            if !viewport.line_might_be_visible(top - DVec2::X * width, m.anchor + DVec2::X * width + shadow_offset) {
                continue;
            }
            if self.style.drop_shadow {
                let shadow: Vec<DVec2> = tri.iter().map(|&v| v + shadow_offset).collect();
                fill_polygon(&mut layers.shadow, &[shadow]);
            }
            fill_polygon(&mut layers.fill, &[tri.to_vec()]);
            stroke_ring(&mut layers.stroke, &tri);
        }

        layers
    }
}
