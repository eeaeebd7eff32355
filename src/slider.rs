/// Integer range input: bounds, step and current value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSlider {
    pub min: i32,
    pub max: i32,
    pub step: i32,
    value: i32,
}

impl RangeSlider {
    pub fn new(min: i32, max: i32, step: i32, value: i32) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        let mut slider = Self {
            min,
            max,
            step: step.max(1),
            value: min,
        };
        slider.set(value);
        slider
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Clamp to bounds and snap to the nearest step from `min`.
    /// Returns true when the value changed.
    pub fn set(&mut self, value: i32) -> bool {
        let clamped = value.clamp(self.min, self.max);
        let offset = clamped - self.min;
        let snapped = self.min + ((offset + self.step / 2) / self.step) * self.step;
        let snapped = if snapped > self.max { snapped - self.step } else { snapped };
        let changed = snapped != self.value;
        self.value = snapped;
        changed
    }

    /// Move by a number of steps
    pub fn step_by(&mut self, steps: i32) -> bool {
        self.set(self.value + steps * self.step)
    }

    /// Position of the thumb on a track `width` cells wide
    pub fn thumb_column(&self, width: u16) -> u16 {
        if width <= 1 || self.max == self.min {
            return 0;
        }
        let t = (self.value - self.min) as f64 / (self.max - self.min) as f64;
        (t * (width - 1) as f64).round() as u16
    }

    /// Value for a click at `col` on a track `width` cells wide
    pub fn value_at_column(&self, col: u16, width: u16) -> i32 {
        if width <= 1 {
            return self.min;
        }
        let t = (col.min(width - 1)) as f64 / (width - 1) as f64;
        self.min + (t * (self.max - self.min) as f64).round() as i32
    }
}
