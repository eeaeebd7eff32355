use crate::map::choropleth::{FillLayer, ScoredPolygon};
use crate::map::loader::SourceLoader;
use crate::map::projection::Viewport;
use glam::DVec2;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Registration errors, mirroring what a tile renderer rejects
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("there is already a source with id \"{0}\"")]
    DuplicateSource(String),
    #[error("layer with id \"{0}\" already exists")]
    DuplicateLayer(String),
    #[error("source \"{0}\" not found")]
    UnknownSource(String),
    #[error("layer \"{0}\" not found")]
    UnknownLayer(String),
    #[error("source \"{source_id}\" is used by layer \"{layer}\"")]
    SourceInUse { source_id: String, layer: String },
}

/// Surface notifications, consumed once per frame by the owning view
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapEvent {
    /// First time the canvas has a size
    Load,
    /// Canvas size changed
    Resize,
    /// Something visible changed (camera, sources); screen positions are stale
    Render,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceState {
    Loading,
    Ready,
    Failed(String),
}

/// A GeoJSON source backed by a file
#[derive(Debug)]
pub struct GeoJsonSource {
    pub id: String,
    pub path: PathBuf,
    pub state: SourceState,
    generation: u64,
    data: Vec<ScoredPolygon>,
}

impl GeoJsonSource {
    pub fn data(&self) -> &[ScoredPolygon] {
        &self.data
    }
}

/// The host map: camera, sources, fill layers and events.
pub struct MapSurface {
    pub viewport: Viewport,
    home: Viewport,
    sources: HashMap<String, GeoJsonSource>,
    layers: Vec<FillLayer>,
    events: VecDeque<MapEvent>,
    render_requested: bool,
    loaded: bool,
    loader: SourceLoader,
    next_generation: u64,
}

impl MapSurface {
    pub fn new(viewport: Viewport, loader: SourceLoader) -> Self {
        Self {
            home: viewport.clone(),
            viewport,
            sources: HashMap::new(),
            layers: Vec::new(),
            events: VecDeque::new(),
            render_requested: false,
            loaded: false,
            loader,
            next_generation: 0,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Match the canvas to the container
    pub fn resize(&mut self, width: usize, height: usize) {
        if !self.viewport.resize(width, height) {
            return;
        }
        self.home.resize(width, height);
        if !self.loaded && width > 0 && height > 0 {
            self.loaded = true;
            self.events.push_back(MapEvent::Load);
        } else {
            self.events.push_back(MapEvent::Resize);
        }
        self.request_render();
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        let before = (self.viewport.center_lon, self.viewport.center_lat);
        self.viewport.pan(dx, dy);
        if before != (self.viewport.center_lon, self.viewport.center_lat) {
            self.request_render();
        }
    }

    pub fn zoom_in(&mut self) {
        if self.viewport.zoom_in() {
            self.request_render();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.viewport.zoom_out() {
            self.request_render();
        }
    }

    /// Zoom by `delta` levels about a pixel
    pub fn zoom_at(&mut self, at: DVec2, delta: f64) {
        if self.viewport.zoom_at(at, delta) {
            self.request_render();
        }
    }

    /// Back to the initial camera
    pub fn reset_camera(&mut self) {
        if self.viewport != self.home {
            self.viewport = self.home.clone();
            self.request_render();
        }
    }

    fn fetch(&mut self, id: &str, path: &Path) -> u64 {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.loader.request(id, generation, path);
        generation
    }

    /// Register a source and start loading it
    pub fn add_source(&mut self, id: &str, path: &Path) -> Result<(), SurfaceError> {
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.to_string()));
        }
        let generation = self.fetch(id, path);
        self.sources.insert(
            id.to_string(),
            GeoJsonSource {
                id: id.to_string(),
                path: path.to_path_buf(),
                state: SourceState::Loading,
                generation,
                data: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn get_source(&self, id: &str) -> Option<&GeoJsonSource> {
        self.sources.get(id)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Point an existing source at new data. Current data stays visible until
    /// the new data arrives.
    pub fn set_source_data(&mut self, id: &str, path: &Path) -> Result<(), SurfaceError> {
        if !self.sources.contains_key(id) {
            return Err(SurfaceError::UnknownSource(id.to_string()));
        }
        let generation = self.fetch(id, path);
        if let Some(source) = self.sources.get_mut(id) {
            source.path = path.to_path_buf();
            source.generation = generation;
            source.state = SourceState::Loading;
        }
        Ok(())
    }

    pub fn remove_source(&mut self, id: &str) -> Result<(), SurfaceError> {
        if let Some(layer) = self.layers.iter().find(|l| l.source == id) {
            return Err(SurfaceError::SourceInUse {
                source_id: id.to_string(),
                layer: layer.id.clone(),
            });
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SurfaceError::UnknownSource(id.to_string()))
    }

    pub fn add_layer(&mut self, layer: FillLayer) -> Result<(), SurfaceError> {
        if self.get_layer(&layer.id).is_some() {
            return Err(SurfaceError::DuplicateLayer(layer.id));
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(SurfaceError::UnknownSource(layer.source));
        }
        self.layers.push(layer);
        self.request_render();
        Ok(())
    }

    pub fn get_layer(&self, id: &str) -> Option<&FillLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn remove_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        let idx = self
            .layers
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| SurfaceError::UnknownLayer(id.to_string()))?;
        self.layers.remove(idx);
        self.request_render();
        Ok(())
    }

    /// Layers in draw order, each with its source's current data
    pub fn layers(&self) -> impl Iterator<Item = (&FillLayer, &[ScoredPolygon])> {
        self.layers.iter().map(move |layer| {
            let data = self.sources.get(&layer.source).map(|s| s.data()).unwrap_or(&[]);
            (layer, data)
        })
    }

    fn apply(&mut self, done: crate::map::loader::LoadResult) -> bool {
        let Some(source) = self.sources.get_mut(&done.source_id) else {
            tracing::debug!(source_id = %done.source_id, "result for removed source dropped");
            return false;
        };
        if source.generation != done.generation {
            tracing::debug!(
                source_id = %done.source_id,
                stale = done.generation,
                current = source.generation,
                "stale source data dropped"
            );
            return false;
        }
        match done.result {
            Ok(data) => {
                tracing::info!(
                    source_id = %done.source_id,
                    polygons = data.len(),
                    path = ?done.path,
                    "source loaded"
                );
                source.data = data;
                source.state = SourceState::Ready;
            }
            Err(e) => {
                tracing::warn!(source_id = %done.source_id, path = ?done.path, "source load failed: {e:#}");
                source.data.clear();
                source.state = SourceState::Failed(format!("{e:#}"));
            }
        }
        true
    }

    /// Apply finished fetches; returns how many changed a source
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        for done in self.loader.try_collect() {
            if self.apply(done) {
                applied += 1;
            }
        }
        if applied > 0 {
            self.request_render();
        }
        applied
    }

    /// Block until every fetch has been collected or `timeout` passes.
    /// Returns true when nothing is left in flight.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.loader.in_flight() > 0 {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            if let Some(done) = self.loader.recv_timeout(left) {
                if self.apply(done) {
                    self.request_render();
                }
            }
        }
        true
    }

    /// Events since the last call; at most one `Render`, always last
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        let mut events: Vec<MapEvent> = self.events.drain(..).collect();
        if std::mem::take(&mut self.render_requested) {
            events.push(MapEvent::Render);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::choropleth::StepRamp;
    use anyhow::anyhow;
    use std::sync::Arc;

    fn fake_loader() -> SourceLoader {
        SourceLoader::with_fetch(Arc::new(|path: &Path| {
            let name = path.to_string_lossy();
            if name.contains("missing") {
                return Err(anyhow!("no such file"));
            }
            if name.contains("slow") {
                std::thread::sleep(Duration::from_millis(150));
            }
            let score = if name.contains("slow") { 10.0 } else { 90.0 };
            Ok(vec![ScoredPolygon {
                rings: vec![vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]],
                score: Some(score),
            }])
        }))
    }

    fn surface() -> MapSurface {
        MapSurface::new(Viewport::new(0.0, 0.0, 1.5, 1.5, 5.0), fake_loader())
    }

    fn layer(source: &str) -> FillLayer {
        FillLayer::new("colormap", source, StepRamp::press_freedom(), 0.5)
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut s = surface();
        s.add_source("a", Path::new("a.geojson")).unwrap();
        assert_eq!(
            s.add_source("a", Path::new("a.geojson")),
            Err(SurfaceError::DuplicateSource("a".into()))
        );
        s.add_layer(layer("a")).unwrap();
        assert_eq!(s.add_layer(layer("a")), Err(SurfaceError::DuplicateLayer("colormap".into())));
        assert_eq!(s.add_layer(FillLayer::new("x", "nope", StepRamp::press_freedom(), 0.5)),
            Err(SurfaceError::UnknownSource("nope".into())));
        assert!(matches!(s.remove_source("a"), Err(SurfaceError::SourceInUse { .. })));
        s.remove_layer("colormap").unwrap();
        s.remove_source("a").unwrap();
        assert!(s.wait_idle(Duration::from_secs(5)));
    }

    #[test]
    fn test_load_then_ready() {
        let mut s = surface();
        s.add_source("a", Path::new("a.geojson")).unwrap();
        assert_eq!(s.get_source("a").unwrap().state, SourceState::Loading);
        assert!(s.wait_idle(Duration::from_secs(5)));
        let src = s.get_source("a").unwrap();
        assert_eq!(src.state, SourceState::Ready);
        assert_eq!(src.data().len(), 1);
    }

    #[test]
    fn test_failed_load_is_recorded() {
        let mut s = surface();
        s.add_source("m", Path::new("missing.geojson")).unwrap();
        assert!(s.wait_idle(Duration::from_secs(5)));
        let src = s.get_source("m").unwrap();
        assert!(matches!(src.state, SourceState::Failed(_)));
        assert!(src.data().is_empty());
    }

    #[test]
    fn test_stale_result_ignored() {
        let mut s = surface();
        s.add_source("a", Path::new("slow.geojson")).unwrap();
        s.set_source_data("a", Path::new("fast.geojson")).unwrap();
        assert!(s.wait_idle(Duration::from_secs(5)));
        let src = s.get_source("a").unwrap();
        assert_eq!(src.path, PathBuf::from("fast.geojson"));
        assert_eq!(src.data()[0].score, Some(90.0));
    }

    #[test]
    fn test_events_coalesce_render() {
        let mut s = surface();
        assert!(s.drain_events().is_empty());
        s.resize(100, 50);
        assert_eq!(s.drain_events(), vec![MapEvent::Load, MapEvent::Render]);
        s.pan(5.0, 0.0);
        s.zoom_in();
        assert_eq!(s.drain_events(), vec![MapEvent::Render]);
        s.resize(100, 50);
        assert!(s.drain_events().is_empty());
        s.resize(120, 50);
        assert_eq!(s.drain_events(), vec![MapEvent::Resize, MapEvent::Render]);
        s.reset_camera();
        assert_eq!(s.drain_events(), vec![MapEvent::Render]);
    }
}
