use crate::map::choropleth::{to_number, ScoredPolygon};
use crate::map::spikes::SpikeFeature;
use anyhow::{anyhow, Context, Result};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::fs;
use std::path::Path;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Read and parse a GeoJSON file
pub fn read_geojson(path: &Path) -> Result<GeoJson> {
    let mut bytes = fs::read(path).with_context(|| format!("Failed to read GeoJSON file: {:?}", path))?;
    let geojson: GeoJson = simd_json::serde::from_slice(&mut bytes)
        .with_context(|| format!("Failed to parse GeoJSON: {:?}", path))?;
    Ok(geojson)
}

fn into_features(geojson: GeoJson) -> Result<Vec<Feature>> {
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc.features),
        GeoJson::Feature(f) => Ok(vec![f]),
        GeoJson::Geometry(_) => Err(anyhow!("GeoJSON must be a FeatureCollection")),
    }
}

/// Load yearly point features (`year`, `country`, `counts` properties).
/// Features without a point, a year or a numeric count are skipped.
pub fn load_spike_features(path: &Path) -> Result<Vec<SpikeFeature>> {
    let features = into_features(read_geojson(path)?)?;
    let total = features.len();

    let spikes: Vec<SpikeFeature> = features.iter().filter_map(spike_feature).collect();

    if spikes.len() < total {
        tracing::debug!(skipped = total - spikes.len(), ?path, "point features without year, count or point");
    }
    Ok(spikes)
}

fn spike_feature(feature: &Feature) -> Option<SpikeFeature> {
    let (lon, lat) = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Point(coords)) if coords.len() >= 2 => (coords[0], coords[1]),
        _ => return None,
    };
    let props = feature.properties.as_ref();

    let year = props.and_then(|p| p.get("year")).and_then(|v| {
        v.as_i64()
            .or_else(|| v.as_f64().filter(|y| y.fract() == 0.0).map(|y| y as i64))
    })?;

    let country = props
        .and_then(|p| p.get("country"))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown")
        .to_string();

    // No count, no spike length
    let count = props.and_then(|p| p.get("counts")).and_then(|v| v.as_f64())?;

    Some(SpikeFeature {
        lon,
        lat,
        year,
        country,
        count,
    })
}

/// Load polygons scored by their `Score` property
pub fn load_scored_polygons(path: &Path) -> Result<Vec<ScoredPolygon>> {
    let features = into_features(read_geojson(path)?)?;
    let mut polygons = Vec::new();
    let mut unscored = 0usize;

    for feature in &features {
        let score = to_number(feature.properties.as_ref().and_then(|p| p.get("Score")));
        if score.is_none() {
            unscored += 1;
        }
        if let Some(geometry) = &feature.geometry {
            collect_polygons(geometry, score, &mut polygons);
        }
    }

    if unscored > 0 {
        tracing::debug!(unscored, ?path, "features with a non-numeric Score are not filled");
    }
    Ok(polygons)
}

fn to_ring(coords: &[Vec<f64>]) -> Vec<(f64, f64)> {
    coords.iter().filter(|c| c.len() >= 2).map(|c| (c[0], c[1])).collect()
}

fn collect_polygons(geometry: &Geometry, score: Option<f64>, out: &mut Vec<ScoredPolygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.push(ScoredPolygon {
            rings: rings.iter().map(|r| to_ring(r)).collect(),
            score,
        }),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.push(ScoredPolygon {
                    rings: rings.iter().map(|r| to_ring(r)).collect(),
                    score,
                });
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, score, out);
            }
        }
        _ => {}
    }
}

/// Load basemap outlines: lines as-is, polygon exterior rings closed
pub fn load_outlines(path: &Path) -> Result<Vec<LineString>> {
    let geojson = read_geojson(path)?;
    let mut lines = Vec::new();
    process_geojson_lines(&geojson, |line| lines.push(line));
    Ok(lines)
}

/// Process GeoJSON and extract line features
fn process_geojson_lines<F>(geojson: &GeoJson, mut add_line: F)
where
    F: FnMut(LineString),
{
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    process_geometry_lines(geometry, &mut add_line);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                process_geometry_lines(geometry, &mut add_line);
            }
        }
        GeoJson::Geometry(geometry) => {
            process_geometry_lines(geometry, &mut add_line);
        }
    }
}

fn process_geometry_lines<F>(geometry: &Geometry, add_line: &mut F)
where
    F: FnMut(LineString),
{
    match &geometry.value {
        Value::LineString(coords) => add_line(to_ring(coords)),
        Value::MultiLineString(lines) => {
            for coords in lines {
                add_line(to_ring(coords));
            }
        }
        Value::Polygon(rings) => {
            if let Some(exterior) = rings.first() {
                add_line(to_ring(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for exterior in polygons.iter().filter_map(|rings| rings.first()) {
                add_line(to_ring(exterior));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                process_geometry_lines(g, add_line);
            }
        }
        _ => {}
    }
}
