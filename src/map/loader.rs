use crate::data;
use crate::map::choropleth::ScoredPolygon;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

/// Reads and decodes a source file; runs on a worker thread
pub type FetchFn = Arc<dyn Fn(&Path) -> Result<Vec<ScoredPolygon>> + Send + Sync>;

/// A finished fetch, tagged with the request it answers
pub struct LoadResult {
    pub source_id: String,
    pub generation: u64,
    pub path: PathBuf,
    pub result: Result<Vec<ScoredPolygon>>,
}

/// Runs source fetches on the rayon pool and hands results back to the UI
/// thread through a channel.
pub struct SourceLoader {
    fetch: FetchFn,
    tx: Sender<LoadResult>,
    rx: Receiver<LoadResult>,
    in_flight: usize,
}

impl SourceLoader {
    /// Loader reading GeoJSON polygon files from disk
    pub fn new() -> Self {
        Self::with_fetch(Arc::new(|path: &Path| data::load_scored_polygons(path)))
    }

    pub fn with_fetch(fetch: FetchFn) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            fetch,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Start fetching `path` for `source_id`
    pub fn request(&mut self, source_id: &str, generation: u64, path: &Path) {
        let tx = self.tx.clone();
        let fetch = Arc::clone(&self.fetch);
        let source_id = source_id.to_string();
        let path = path.to_path_buf();
        self.in_flight += 1;

        tracing::debug!(%source_id, generation, ?path, "fetching source");
        rayon::spawn(move || {
            let result = fetch(&path);
            // Receiver gone means the surface was dropped
            let _ = tx.send(LoadResult {
                source_id,
                generation,
                path,
                result,
            });
        });
    }

    /// Fetches not yet collected
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect whatever has finished, without blocking
    pub fn try_collect(&mut self) -> Vec<LoadResult> {
        let done: Vec<LoadResult> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    /// Block up to `timeout` for the next result
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<LoadResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(done) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(done)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new()
    }
}
