use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, read from a TOML file. Every field has a default
/// so a missing file or a partial file both work.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub chart: ChartConfig,
    pub map: MapConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    /// CSV with `country,year,counts`
    pub csv: PathBuf,
    /// Stroke reveal duration in milliseconds
    pub reveal_ms: u64,
    /// Category that stays visible (dimmed) after the reveal
    pub highlight: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("data/linechart_journalist.csv"),
            reveal_ms: 6000,
            highlight: "Iraq".to_string(),
        }
    }
}

impl ChartConfig {
    pub fn reveal(&self) -> Duration {
        Duration::from_millis(self.reveal_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    /// Point features with `year`, `country`, `counts`
    pub points: PathBuf,
    /// Per-year polygon files; `{year}` is replaced by the selected year
    pub choropleth_template: String,
    /// Optional basemap outlines
    pub coastlines: Option<PathBuf>,
    pub initial_year: i32,
    pub year_min: i32,
    pub year_max: i32,
    /// [lon, lat]
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub spike: SpikeConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            points: PathBuf::from("vector/worldmap_centroid_deathyearcount.geojson"),
            choropleth_template: "vector/worldmap_freeIndex_{year}.geojson".to_string(),
            coastlines: None,
            initial_year: 2013,
            year_min: 2013,
            year_max: 2023,
            center: [18.2812, 9.1021],
            zoom: 1.5,
            min_zoom: 1.5,
            max_zoom: 5.0,
            spike: SpikeConfig::default(),
        }
    }
}

impl MapConfig {
    /// Path of the polygon file for a year
    pub fn choropleth_path(&self, year: i32) -> PathBuf {
        PathBuf::from(self.choropleth_template.replace("{year}", &year.to_string()))
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SpikeConfig {
    /// Spike length in pixels per unit of count
    pub length_per_count: f64,
    /// Base width in pixels
    pub width: f64,
    pub fill: String,
    pub fill_opacity: f64,
    pub stroke: String,
    pub stroke_opacity: f64,
    pub drop_shadow: bool,
    /// Vertical shadow offset in pixels
    pub shadow_dy: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            length_per_count: 8.0,
            width: 7.0,
            fill: "lightgrey".to_string(),
            fill_opacity: 0.85,
            stroke: "white".to_string(),
            stroke_opacity: 0.85,
            drop_shadow: true,
            shadow_dy: 4.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LogConfig {
    /// Log file; the terminal itself belongs to the UI
    pub file: PathBuf,
    /// Default filter when RUST_LOG is unset
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("press-map.log"),
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML configuration: {:?}", path))?;
        Ok(config)
    }

    /// Load `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(?path, "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Resolve relative data paths against `base`
    pub fn rebase(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.chart.csv);
        join(&mut self.map.points);
        if let Some(c) = self.map.coastlines.as_mut() {
            join(c);
        }
        if Path::new(&self.map.choropleth_template).is_relative() {
            self.map.choropleth_template = base
                .join(&self.map.choropleth_template)
                .to_string_lossy()
                .into_owned();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let m = &self.map;
        if m.year_min > m.year_max {
            bail!("map.year_min ({}) is after map.year_max ({})", m.year_min, m.year_max);
        }
        if !(m.year_min..=m.year_max).contains(&m.initial_year) {
            bail!(
                "map.initial_year ({}) outside [{}, {}]",
                m.initial_year,
                m.year_min,
                m.year_max
            );
        }
        if m.min_zoom > m.max_zoom {
            bail!("map.min_zoom ({}) is above map.max_zoom ({})", m.min_zoom, m.max_zoom);
        }
        if !m.choropleth_template.contains("{year}") {
            bail!("map.choropleth_template must contain a {{year}} placeholder");
        }
        if m.spike.length_per_count <= 0.0 {
            bail!("map.spike.length_per_count must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.map.initial_year, 2013);
        assert_eq!((cfg.map.year_min, cfg.map.year_max), (2013, 2023));
        assert_eq!(cfg.map.spike.length_per_count, 8.0);
        assert_eq!(cfg.chart.reveal(), Duration::from_secs(6));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [map]
            initial_year = 2020
            [map.spike]
            drop_shadow = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.map.initial_year, 2020);
        assert_eq!(cfg.map.year_max, 2023);
        assert!(!cfg.map.spike.drop_shadow);
        assert_eq!(cfg.chart.highlight, "Iraq");
    }

    #[test]
    fn test_validation_rejects_bad_year() {
        let mut cfg = AppConfig::default();
        cfg.map.initial_year = 2030;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_choropleth_path_template() {
        let cfg = MapConfig::default();
        assert_eq!(
            cfg.choropleth_path(2017),
            PathBuf::from("vector/worldmap_freeIndex_2017.geojson")
        );
    }

    #[test]
    fn test_rebase() {
        let mut cfg = AppConfig::default();
        cfg.rebase(Path::new("/srv/site"));
        assert_eq!(cfg.chart.csv, PathBuf::from("/srv/site/data/linechart_journalist.csv"));
        assert_eq!(
            cfg.map.choropleth_path(2013),
            PathBuf::from("/srv/site/vector/worldmap_freeIndex_2013.geojson")
        );
    }
}
