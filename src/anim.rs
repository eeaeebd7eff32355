use std::time::{Duration, Instant};

/// Cubic in-out easing on t in [0, 1]
#[inline]
pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// A scalar animated from `from` to `to` over `duration`, starting at `start`.
///
/// Retargeting starts the new transition from the value shown at that
/// instant, so an interrupted fade never jumps.
#[derive(Clone, Debug)]
pub struct Tween {
    from: f64,
    to: f64,
    start: Instant,
    duration: Duration,
}

impl Tween {
    /// A tween already settled at `value`
    pub fn fixed(value: f64, now: Instant) -> Self {
        Self {
            from: value,
            to: value,
            start: now,
            duration: Duration::ZERO,
        }
    }

    pub fn new(from: f64, to: f64, start: Instant, duration: Duration) -> Self {
        Self { from, to, start, duration }
    }

    /// Eased progress in [0, 1]
    pub fn progress(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start);
        ease_cubic_in_out(elapsed.as_secs_f64() / self.duration.as_secs_f64())
    }

    pub fn value_at(&self, now: Instant) -> f64 {
        self.from + (self.to - self.from) * self.progress(now)
    }

    /// Value the tween is heading to
    pub fn target(&self) -> f64 {
        self.to
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }

    /// Restart towards `to` from the current value
    pub fn retarget(&mut self, now: Instant, to: f64, duration: Duration) {
        self.from = self.value_at(now);
        self.to = to;
        self.start = now;
        self.duration = duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease_cubic_in_out(2.0), 1.0);
    }

    #[test]
    fn test_tween_runs_to_target() {
        let t0 = Instant::now();
        let tween = Tween::new(0.0, 0.9, t0, Duration::from_millis(200));
        assert_eq!(tween.value_at(t0), 0.0);
        assert!((tween.value_at(t0 + Duration::from_millis(100)) - 0.45).abs() < 1e-9);
        assert!((tween.value_at(t0 + Duration::from_millis(500)) - 0.9).abs() < 1e-12);
        assert!(tween.is_settled(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_retarget_starts_from_current_value() {
        let t0 = Instant::now();
        let mut tween = Tween::new(0.0, 1.0, t0, Duration::from_millis(200));
        let mid = t0 + Duration::from_millis(100);
        tween.retarget(mid, 0.0, Duration::from_millis(500));
        assert!((tween.value_at(mid) - 0.5).abs() < 1e-9);
        assert_eq!(tween.target(), 0.0);
        assert_eq!(tween.value_at(mid + Duration::from_secs(1)), 0.0);
    }

    #[test]
    fn test_fixed_is_settled() {
        let t0 = Instant::now();
        let tween = Tween::fixed(0.4, t0);
        assert!(tween.is_settled(t0));
        assert_eq!(tween.value_at(t0), 0.4);
    }
}
