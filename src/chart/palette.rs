use crate::color::Rgb;

/// Color for categories outside the fixed set
pub const FALLBACK: Rgb = Rgb::LIGHT_GREY;

/// The countries with an assigned color
pub const CATEGORY_COLORS: [(&str, Rgb); 15] = [
    ("Iraq", Rgb(0x1f, 0x77, 0xb4)),
    ("Philippines", Rgb(0xff, 0x7f, 0x0e)),
    ("Syria", Rgb(0x2c, 0xa0, 0x2c)),
    ("Mexico", Rgb(0xd6, 0x27, 0x28)),
    ("Pakistan", Rgb(0x94, 0x67, 0xbd)),
    ("Colombia", Rgb(0x8c, 0x56, 0x4b)),
    ("India", Rgb(0xe3, 0x77, 0xc2)),
    ("Somalia", Rgb(0x7f, 0x7f, 0x7f)),
    ("Russia", Rgb(0xbc, 0xbd, 0x22)),
    ("Afghanistan", Rgb(0x17, 0xbe, 0xcf)),
    ("Israel and the Occupied Palestinian Territory", Rgb(0xff, 0x98, 0x96)),
    ("Brazil", Rgb(0xae, 0xc7, 0xe8)),
    ("Algeria", Rgb(0xff, 0xbb, 0x78)),
    ("Honduras", Rgb(0x98, 0xdf, 0x8a)),
    ("Ukraine", Rgb(0xc5, 0xb0, 0xd5)),
];

pub fn is_known(category: &str) -> bool {
    CATEGORY_COLORS.iter().any(|(name, _)| *name == category)
}

pub fn category_color(category: &str) -> Rgb {
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, c)| *c)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_use_assigned_color() {
        for (name, color) in CATEGORY_COLORS {
            assert!(is_known(name));
            assert_eq!(category_color(name), color);
        }
        assert_eq!(category_color("Iraq"), Rgb::from_hex("#1f77b4").unwrap());
    }

    #[test]
    fn test_unknown_categories_fall_back() {
        for name in ["Nepal", "iraq", ""] {
            assert!(!is_known(name));
            assert_eq!(category_color(name), FALLBACK);
        }
    }

    #[test]
    fn test_colors_are_distinct() {
        let mut colors: Vec<_> = CATEGORY_COLORS.iter().map(|(_, c)| *c).collect();
        colors.sort_by_key(|c| (c.0, c.1, c.2));
        colors.dedup();
        assert_eq!(colors.len(), CATEGORY_COLORS.len());
    }
}
