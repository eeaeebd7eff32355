/// Braille Unicode canvas for high-resolution terminal graphics.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
#[derive(Clone)]
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    pixels: Vec<u8>, // Bit pattern per char, row-major
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width * height],
        }
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in characters
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel resolution (width*2, height*4)
    pub fn pixel_size(&self) -> (usize, usize) {
        (self.width * 2, self.height * 4)
    }

    /// Braille dot bit for a pixel inside its character cell.
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    #[inline(always)]
    fn dot_bit(x: usize, y: usize) -> u8 {
        match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        }
    }

    /// Set a pixel at the given coordinates.
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        self.pixels[cy * self.width + cx] |= Self::dot_bit(x, y);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Check whether a pixel is set
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        let cx = x / 2;
        let cy = y / 4;
        if cx >= self.width || cy >= self.height {
            return false;
        }
        self.pixels[cy * self.width + cx] & Self::dot_bit(x, y) != 0
    }

    /// True when no dot is set anywhere
    pub fn is_empty(&self) -> bool {
        self.pixels.iter().all(|&b| b == 0)
    }

    /// Number of dots set (used by tests and the status line)
    pub fn count_dots(&self) -> usize {
        self.pixels.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Braille character at a cell, `None` when the cell is blank
    pub fn cell(&self, cx: usize, cy: usize) -> Option<char> {
        if cx >= self.width || cy >= self.height {
            return None;
        }
        match self.pixels[cy * self.width + cx] {
            0 => None,
            b => char::from_u32(0x2800 + b as u32),
        }
    }

    /// Convert the canvas to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        (0..self.height)
            .map(|row| self.row_to_string(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[cfg(test)]
    fn row_to_string(&self, row: usize) -> String {
        if row >= self.height {
            return String::new();
        }
        self.pixels[row * self.width..(row + 1) * self.width]
            .iter()
            .map(|&b| char::from_u32(0x2800 + b as u32).unwrap_or(' '))
            .collect()
    }

    /// OR another canvas of the same size into this one
    pub fn merge(&mut self, other: &BrailleCanvas) {
        if other.width != self.width || other.height != self.height {
            return;
        }
        for (dst, src) in self.pixels.iter_mut().zip(&other.pixels) {
            *dst |= *src;
        }
    }
}
