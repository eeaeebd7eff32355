use crate::anim::Tween;
use crate::color::Rgb;
use std::time::{Duration, Instant};

/// Opacity of a shown tooltip
pub const SHOWN_OPACITY: f64 = 0.9;
/// Fade-in duration
pub const SHOW_DURATION: Duration = Duration::from_millis(200);
/// Fade-out duration
pub const HIDE_DURATION: Duration = Duration::from_millis(500);

/// Floating label next to the pointer.
/// The text stays in place while fading out, so hover-out never flickers.
#[derive(Clone, Debug)]
pub struct Tooltip {
    pub text: String,
    pub color: Rgb,
    /// Terminal cell (column, row) of the top-left corner
    pub anchor: (u16, u16),
    opacity: Tween,
}

impl Tooltip {
    pub fn new(now: Instant) -> Self {
        Self {
            text: String::new(),
            color: Rgb::WHITE,
            anchor: (0, 0),
            opacity: Tween::fixed(0.0, now),
        }
    }

    /// Fade in with new content at the given anchor
    pub fn show(&mut self, now: Instant, text: impl Into<String>, color: Rgb, anchor: (u16, u16)) {
        self.text = text.into();
        self.color = color;
        self.anchor = anchor;
        self.opacity.retarget(now, SHOWN_OPACITY, SHOW_DURATION);
    }

    /// Follow the pointer without restarting the fade
    pub fn move_to(&mut self, anchor: (u16, u16)) {
        self.anchor = anchor;
    }

    pub fn hide(&mut self, now: Instant) {
        self.opacity.retarget(now, 0.0, HIDE_DURATION);
    }

    pub fn opacity(&self, now: Instant) -> f64 {
        self.opacity.value_at(now)
    }

    /// Opacity the tooltip is transitioning to (0 or 0.9)
    pub fn target_opacity(&self) -> f64 {
        self.opacity.target()
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.opacity(now) > 0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_hide_cycle() {
        let t0 = Instant::now();
        let mut tip = Tooltip::new(t0);
        assert!(!tip.is_visible(t0));

        tip.show(t0, "Iraq", Rgb(0x1f, 0x77, 0xb4), (10, 3));
        assert_eq!(tip.target_opacity(), SHOWN_OPACITY);
        let shown = t0 + SHOW_DURATION;
        assert!((tip.opacity(shown) - SHOWN_OPACITY).abs() < 1e-12);

        tip.hide(shown);
        assert_eq!(tip.target_opacity(), 0.0);
        assert!(tip.is_visible(shown));
        assert_eq!(tip.opacity(shown + HIDE_DURATION), 0.0);
        // text is kept through the fade-out
        assert_eq!(tip.text, "Iraq");
    }
}
