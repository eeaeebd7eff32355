use ratatui::style::Color;

/// 24-bit color used by every mark before it reaches the terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    /// CSS `lightgrey`
    pub const LIGHT_GREY: Rgb = Rgb(211, 211, 211);

    /// Parse `#rrggbb` / `rrggbb`
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb(r, g, b))
    }

    /// Parse a hex code or one of the few CSS names the styles use
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Some(Self::WHITE),
            "black" => Some(Self::BLACK),
            "lightgrey" | "lightgray" => Some(Self::LIGHT_GREY),
            other => Self::from_hex(other),
        }
    }

    /// Alpha-blend this color over `background`
    pub fn blend_over(self, background: Rgb, alpha: f64) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8;
        Rgb(
            mix(self.0, background.0),
            mix(self.1, background.1),
            mix(self.2, background.2),
        )
    }

    /// Apply opacity against the terminal's (assumed black) background
    pub fn with_opacity(self, opacity: f64) -> Rgb {
        self.blend_over(Rgb::BLACK, opacity)
    }

    /// Multiply each channel (used for the drop shadow tint)
    pub fn scale(self, factor: f64) -> Rgb {
        let f = factor.max(0.0);
        let s = |c: u8| (c as f64 * f).round().min(255.0) as u8;
        Rgb(s(self.0), s(self.1), s(self.2))
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}
