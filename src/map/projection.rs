use glam::DVec2;
use std::f64::consts::PI;

/// Zoom change per keyboard/wheel step, in zoom levels
pub const ZOOM_STEP: f64 = 0.5;

/// Web Mercator latitude limit
const MAX_LAT: f64 = 85.0;

/// Camera over the map canvas. `zoom` is a level (log2 scale); at `min_zoom`
/// the whole world spans the canvas width.
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

/// Normalized Web Mercator coordinates in [0, 1]
#[inline(always)]
fn mercator(lon: f64, lat: f64) -> (f64, f64) {
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            center_lon,
            center_lat: center_lat.clamp(-MAX_LAT, MAX_LAT),
            zoom: zoom.clamp(min_zoom, max_zoom),
            min_zoom,
            max_zoom,
            width: 0,
            height: 0,
        }
    }

    /// Resize the canvas; returns true when the size changed
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        let changed = self.width != width || self.height != height;
        self.width = width;
        self.height = height;
        changed
    }

    /// Pixels spanned by 360° of longitude at the current zoom
    #[inline]
    pub fn world_size(&self) -> f64 {
        self.width as f64 * 2f64.powf(self.zoom - self.min_zoom)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let center = self.project(self.center_lon, self.center_lat);
        let (lon, lat) = self.unproject(center + DVec2::new(dx, dy));
        self.center_lon = lon;
        self.center_lat = lat.clamp(-MAX_LAT, MAX_LAT);

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }
    }

    /// Set the zoom level, clamped; returns true when it changed
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let z = zoom.clamp(self.min_zoom, self.max_zoom);
        let changed = (z - self.zoom).abs() > f64::EPSILON;
        self.zoom = z;
        changed
    }

    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - ZOOM_STEP)
    }

    /// Zoom by `delta` levels keeping the point under `at` fixed
    pub fn zoom_at(&mut self, at: DVec2, delta: f64) -> bool {
        // Get the geographic coordinates under the pointer
        let (lon, lat) = self.unproject(at);

        if !self.set_zoom(self.zoom + delta) {
            return false;
        }

        // Pan so that point is back under the pointer
        let moved = self.project(lon, lat);
        self.pan(moved.x - at.x, moved.y - at.y);
        true
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> DVec2 {
        let (x, y) = mercator(lon, lat);
        let (cx, cy) = mercator(self.center_lon, self.center_lat);
        let scale = self.world_size();

        DVec2::new(
            (x - cx) * scale + self.width as f64 / 2.0,
            (y - cy) * scale + self.height as f64 / 2.0,
        )
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, p: DVec2) -> (f64, f64) {
        let scale = self.world_size();
        let (cx, cy) = mercator(self.center_lon, self.center_lat);

        let x = (p.x - self.width as f64 / 2.0) / scale + cx;
        let y = (p.y - self.height as f64 / 2.0) / scale + cy;

        let lon = x * 360.0 - 180.0;
        // Inverse Mercator for latitude
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;

        (lon, lat)
    }

    /// Rough bounding box test for a segment
    pub fn line_might_be_visible(&self, a: DVec2, b: DVec2) -> bool {
        let min = a.min(b);
        let max = a.max(b);
        max.x >= 0.0 && min.x < self.width as f64 && max.y >= 0.0 && min.y < self.height as f64
    }
}
