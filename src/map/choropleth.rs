use crate::braille::BrailleCanvas;
use crate::color::Rgb;
use crate::map::geometry::fill_polygon;
use crate::map::projection::Viewport;
use glam::DVec2;
use rayon::prelude::*;
use serde_json::Value;

/// Piecewise-constant color ramp: `base` below the first stop, then the color
/// of the greatest stop not above the input.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRamp {
    base: Rgb,
    stops: Vec<(f64, Rgb)>,
}

impl StepRamp {
    /// Stops must be strictly ascending
    pub fn new(base: Rgb, stops: Vec<(f64, Rgb)>) -> Self {
        debug_assert!(stops.windows(2).all(|w| w[0].0 < w[1].0));
        Self { base, stops }
    }

    /// Press-freedom score ramp (dark red = worst)
    pub fn press_freedom() -> Self {
        Self::new(
            Rgb(0x72, 0x00, 0x26),
            vec![
                (50.0, Rgb(0xd5, 0x29, 0x41)),
                (60.0, Rgb(0xfc, 0xd5, 0x81)),
                (70.0, Rgb(0xff, 0xf8, 0xe8)),
                (80.0, Rgb(0xff, 0xff, 0xff)),
            ],
        )
    }

    /// Index into `colors()` for an input value
    pub fn bucket(&self, value: f64) -> usize {
        self.stops.iter().take_while(|(stop, _)| value >= *stop).count()
    }

    pub fn evaluate(&self, value: f64) -> Rgb {
        self.colors()[self.bucket(value)]
    }

    /// Base color followed by each stop's color
    pub fn colors(&self) -> Vec<Rgb> {
        std::iter::once(self.base)
            .chain(self.stops.iter().map(|(_, c)| *c))
            .collect()
    }
}

/// Numeric coercion for property values: numbers pass through, strings are
/// parsed (blank is 0), null/missing is 0, booleans are 0/1. `None` means the
/// value can't be coerced.
pub fn to_number(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Some(0.0)
            } else {
                s.parse::<f64>().ok().filter(|v| v.is_finite())
            }
        }
        Some(_) => None,
    }
}

/// One polygon (exterior ring first, then holes) with its score
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredPolygon {
    pub rings: Vec<Vec<(f64, f64)>>,
    pub score: Option<f64>,
}

/// A fill layer bound to a source by id
#[derive(Clone, Debug)]
pub struct FillLayer {
    pub id: String,
    pub source: String,
    pub ramp: StepRamp,
    pub opacity: f64,
}

/// One rasterized color bucket
pub struct FillBucket {
    pub color: Rgb,
    pub canvas: BrailleCanvas,
}

impl FillLayer {
    pub fn new(id: impl Into<String>, source: impl Into<String>, ramp: StepRamp, opacity: f64) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            ramp,
            opacity,
        }
    }

    /// Fill every scored polygon into one canvas per ramp color.
    /// Colors carry the layer opacity already.
    pub fn rasterize(
        &self,
        polygons: &[ScoredPolygon],
        cols: usize,
        rows: usize,
        viewport: &Viewport,
    ) -> Vec<FillBucket> {
        let colors = self.ramp.colors();
        let buckets = colors.len();
        let empty = || vec![BrailleCanvas::new(cols, rows); buckets];

        let canvases = polygons
            .par_iter()
            .filter_map(|poly| {
                let score = poly.score?;
                let rings: Vec<Vec<DVec2>> = poly
                    .rings
                    .iter()
                    .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project(lon, lat)).collect())
                    .collect();
                let visible = rings
                    .first()
                    .map(|r| r.windows(2).any(|s| viewport.line_might_be_visible(s[0], s[1])))
                    .unwrap_or(false);
                visible.then(|| (self.ramp.bucket(score), rings))
            })
            .fold(empty, |mut acc, (bucket, rings)| {
                fill_polygon(&mut acc[bucket], &rings);
                acc
            })
            .reduce(empty, |mut a, b| {
                for (dst, src) in a.iter_mut().zip(&b) {
                    dst.merge(src);
                }
                a
            });

        colors
            .into_iter()
            .zip(canvases)
            .map(|(color, canvas)| FillBucket {
                color: color.with_opacity(self.opacity),
                canvas,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_boundaries() {
        let ramp = StepRamp::press_freedom();
        assert_eq!(ramp.evaluate(12.0), Rgb(0x72, 0x00, 0x26));
        assert_eq!(ramp.evaluate(49.99), Rgb(0x72, 0x00, 0x26));
        assert_eq!(ramp.evaluate(50.0), Rgb(0xd5, 0x29, 0x41));
        assert_eq!(ramp.evaluate(65.0), Rgb(0xfc, 0xd5, 0x81));
        assert_eq!(ramp.evaluate(70.0), Rgb(0xff, 0xf8, 0xe8));
        assert_eq!(ramp.evaluate(92.5), Rgb::WHITE);
        assert_eq!(ramp.colors().len(), 5);
    }

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(to_number(Some(&json!("71.3"))), Some(71.3));
        assert_eq!(to_number(Some(&json!(" 42 "))), Some(42.0));
        assert_eq!(to_number(Some(&json!(55))), Some(55.0));
        assert_eq!(to_number(Some(&json!(null))), Some(0.0));
        assert_eq!(to_number(None), Some(0.0));
        assert_eq!(to_number(Some(&json!(""))), Some(0.0));
        assert_eq!(to_number(Some(&json!(true))), Some(1.0));
        assert_eq!(to_number(Some(&json!("n/a"))), None);
        assert_eq!(to_number(Some(&json!([1, 2]))), None);
    }

    fn square(lon: f64, lat: f64, size: f64, score: Option<f64>) -> ScoredPolygon {
        ScoredPolygon {
            rings: vec![vec![
                (lon, lat),
                (lon + size, lat),
                (lon + size, lat + size),
                (lon, lat + size),
                (lon, lat),
            ]],
            score,
        }
    }

    #[test]
    fn test_rasterize_buckets_by_score() {
        let mut vp = Viewport::new(0.0, 0.0, 1.5, 1.5, 5.0);
        vp.resize(160, 80);
        let layer = FillLayer::new("colormap", "indexmap_all_2013", StepRamp::press_freedom(), 0.5);
        let polys = vec![
            square(-60.0, -10.0, 20.0, Some(30.0)),
            square(20.0, -10.0, 20.0, Some(85.0)),
            square(100.0, -10.0, 20.0, None),
        ];
        let buckets = layer.rasterize(&polys, 80, 20, &vp);
        assert_eq!(buckets.len(), 5);
        assert!(!buckets[0].canvas.is_empty());
        assert!(buckets[1].canvas.is_empty());
        assert!(!buckets[4].canvas.is_empty());
        assert_eq!(buckets[4].color, Rgb::WHITE.with_opacity(0.5));
    }
}
