use crate::braille::BrailleCanvas;
use glam::DVec2;

/// Draw a line using Bresenham's algorithm
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a segment between two sub-pixel points
#[inline]
pub fn draw_segment(canvas: &mut BrailleCanvas, a: DVec2, b: DVec2) {
    draw_line(
        canvas,
        a.x.round() as i32,
        a.y.round() as i32,
        b.x.round() as i32,
        b.y.round() as i32,
    );
}

/// Draw an open polyline
pub fn draw_polyline(canvas: &mut BrailleCanvas, points: &[DVec2]) {
    for pair in points.windows(2) {
        draw_segment(canvas, pair[0], pair[1]);
    }
}

/// Draw the first `length` pixels of a polyline (stroke-dashoffset reveal)
pub fn draw_polyline_prefix(canvas: &mut BrailleCanvas, points: &[DVec2], length: f64) {
    let mut remaining = length;
    for pair in points.windows(2) {
        if remaining <= 0.0 {
            break;
        }
        let (a, b) = (pair[0], pair[1]);
        let seg = a.distance(b);
        if seg <= remaining {
            draw_segment(canvas, a, b);
        } else {
            draw_segment(canvas, a, a + (b - a) * (remaining / seg));
        }
        remaining -= seg;
    }
}

/// Total length of a polyline
pub fn polyline_length(points: &[DVec2]) -> f64 {
    points.windows(2).map(|p| p[0].distance(p[1])).sum()
}

/// Fill polygon rings with the even-odd rule, one scanline per pixel row
pub fn fill_polygon(canvas: &mut BrailleCanvas, rings: &[Vec<DVec2>]) {
    let (w, h) = canvas.pixel_size();
    if w == 0 || h == 0 {
        return;
    }

    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in rings.iter().flatten() {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    if !min_y.is_finite() || max_y < 0.0 || min_y >= h as f64 {
        return;
    }

    let y_start = min_y.floor().max(0.0) as usize;
    let y_end = (max_y.ceil() as usize).min(h - 1);
    let mut crossings: Vec<f64> = Vec::new();

    for py in y_start..=y_end {
        let sy = py as f64 + 0.5;
        crossings.clear();

        for ring in rings {
            let n = ring.len();
            if n < 3 {
                continue;
            }
            for i in 0..n {
                let a = ring[i];
                let b = ring[(i + 1) % n];
                if (a.y <= sy) != (b.y <= sy) {
                    crossings.push(a.x + (sy - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let x0 = (span[0] - 0.5).ceil().max(0.0);
            let x1 = (span[1] - 0.5).floor().min(w as f64 - 1.0);
            if x1 < x0 {
                continue;
            }
            for px in x0 as usize..=x1 as usize {
                canvas.set_pixel(px, py);
            }
        }
    }
}

/// Outline a closed ring
pub fn stroke_ring(canvas: &mut BrailleCanvas, ring: &[DVec2]) {
    if ring.len() < 2 {
        return;
    }
    draw_polyline(canvas, ring);
    if let (Some(&first), Some(&last)) = (ring.first(), ring.last()) {
        if first != last {
            draw_segment(canvas, last, first);
        }
    }
}

/// Vertices of a spike glyph anchored at `base`: left foot, apex, right foot.
/// Screen y grows downwards, so the apex sits `length` pixels above the base.
#[inline]
pub fn spike_vertices(base: DVec2, length: f64, width: f64) -> [DVec2; 3] {
    [
        base + DVec2::new(-width / 2.0, 0.0),
        base + DVec2::new(0.0, -length),
        base + DVec2::new(width / 2.0, 0.0),
    ]
}

/// Point-in-triangle test, inclusive of edges
pub fn point_in_triangle(p: DVec2, tri: &[DVec2; 3]) -> bool {
    let cross = |a: DVec2, b: DVec2, c: DVec2| (b - a).perp_dot(c - a);
    let d1 = cross(tri[0], tri[1], p);
    let d2 = cross(tri[1], tri[2], p);
    let d3 = cross(tri[2], tri[0], p);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Distance from `p` to segment `ab`
pub fn distance_to_segment(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance from `p` to the nearest segment of a polyline
pub fn distance_to_polyline(p: DVec2, points: &[DVec2]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => points
            .windows(2)
            .map(|s| distance_to_segment(p, s[0], s[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_line() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        for x in 0..10 {
            assert!(canvas.is_set(x, 0));
        }
        assert_eq!(canvas.count_dots(), 10);
    }

    #[test]
    fn test_vertical_line() {
        let mut canvas = BrailleCanvas::new(1, 2);
        draw_line(&mut canvas, 0, 0, 0, 7);
        assert_eq!(canvas.count_dots(), 8);
    }

    #[test]
    fn test_prefix_draws_part_of_line() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(9.0, 0.0)];
        let mut half = BrailleCanvas::new(5, 1);
        draw_polyline_prefix(&mut half, &pts, 4.0);
        assert!(half.is_set(4, 0));
        assert!(!half.is_set(6, 0));

        let mut none = BrailleCanvas::new(5, 1);
        draw_polyline_prefix(&mut none, &pts, 0.0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = BrailleCanvas::new(4, 2);
        let ring = vec![
            DVec2::new(1.0, 1.0),
            DVec2::new(5.0, 1.0),
            DVec2::new(5.0, 5.0),
            DVec2::new(1.0, 5.0),
        ];
        fill_polygon(&mut canvas, &[ring]);
        // pixel centers 1.5..4.5 in both axes
        assert_eq!(canvas.count_dots(), 16);
        assert!(canvas.is_set(1, 1));
        assert!(canvas.is_set(4, 4));
        assert!(!canvas.is_set(5, 5));
    }

    #[test]
    fn test_fill_with_hole() {
        let mut canvas = BrailleCanvas::new(5, 3);
        let outer = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ];
        let hole = vec![
            DVec2::new(4.0, 4.0),
            DVec2::new(6.0, 4.0),
            DVec2::new(6.0, 6.0),
            DVec2::new(4.0, 6.0),
        ];
        fill_polygon(&mut canvas, &[outer, hole]);
        assert!(canvas.is_set(1, 1));
        assert!(!canvas.is_set(5, 5));
        assert_eq!(canvas.count_dots(), 100 - 4);
    }

    #[test]
    fn test_spike_shape_and_hit() {
        let tri = spike_vertices(DVec2::new(10.0, 20.0), 8.0, 7.0);
        assert_eq!(tri[1], DVec2::new(10.0, 12.0));
        assert!(point_in_triangle(DVec2::new(10.0, 18.0), &tri));
        assert!(!point_in_triangle(DVec2::new(10.0, 21.0), &tri));
        assert!(!point_in_triangle(DVec2::new(13.0, 13.0), &tri));
    }

    #[test]
    fn test_distance_to_polyline() {
        let pts = [DVec2::new(0.0, 0.0), DVec2::new(10.0, 0.0), DVec2::new(10.0, 10.0)];
        assert_eq!(distance_to_polyline(DVec2::new(5.0, 3.0), &pts), 3.0);
        assert_eq!(distance_to_polyline(DVec2::new(12.0, 5.0), &pts), 2.0);
        assert_eq!(distance_to_polyline(DVec2::ZERO, &[]), f64::INFINITY);
    }
}
