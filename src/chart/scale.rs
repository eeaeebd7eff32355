/// Linear map from a data domain onto a pixel range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            // Degenerate domain maps to the middle of the range
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / (d1 - d0) * (r1 - r0)
    }
}

/// Time axis over whole years
pub type TimeScale = LinearScale;

/// Min and max of an iterator, `None` when empty
pub fn extent<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Round tick values covering [min, max], about `count` of them, spaced
/// 1, 2 or 5 times a power of ten.
pub fn nice_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || count == 0 {
        return Vec::new();
    }
    if min == max {
        return vec![min];
    }
    let (lo, hi) = if min < max { (min, max) } else { (max, min) };

    let raw = (hi - lo) / count as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let step = power
        * if error >= 50f64.sqrt() {
            10.0
        } else if error >= 10f64.sqrt() {
            5.0
        } else if error >= 2f64.sqrt() {
            2.0
        } else {
            1.0
        };

    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

/// Ticks for a year axis. Never finer than one year.
pub fn year_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    nice_ticks(min, max, count)
        .into_iter()
        .filter(|t| t.fract() == 0.0)
        .collect()
}
