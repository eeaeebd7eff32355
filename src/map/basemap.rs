use crate::braille::BrailleCanvas;
use crate::data::LineString;
use crate::map::choropleth::ScoredPolygon;
use crate::map::geometry::draw_segment;
use crate::map::projection::Viewport;
use glam::DVec2;

/// Draw a linestring with viewport culling
pub fn draw_linestring(canvas: &mut BrailleCanvas, line: &[(f64, f64)], viewport: &Viewport) {
    if line.len() < 2 {
        return;
    }

    let mut prev: Option<DVec2> = None;

    for &(lon, lat) in line {
        let p = viewport.project(lon, lat);

        if let Some(q) = prev {
            // Skip segments that wrap around the antimeridian
            let dx = (p.x - q.x).abs();
            if dx < viewport.world_size() / 2.0 && viewport.line_might_be_visible(q, p) {
                draw_segment(canvas, q, p);
            }
        }

        prev = Some(p);
    }
}

/// Basemap outlines plus the borders of the active choropleth polygons
pub fn rasterize_outlines(
    outlines: &[LineString],
    polygons: &[ScoredPolygon],
    cols: usize,
    rows: usize,
    viewport: &Viewport,
) -> BrailleCanvas {
    let mut canvas = BrailleCanvas::new(cols, rows);
    for line in outlines {
        draw_linestring(&mut canvas, line, viewport);
    }
    for exterior in polygons.iter().filter_map(|p| p.rings.first()) {
        draw_linestring(&mut canvas, exterior, viewport);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_antimeridian_segment_skipped() {
        let mut vp = Viewport::new(0.0, 0.0, 1.5, 1.5, 5.0);
        vp.resize(100, 60);
        let mut canvas = BrailleCanvas::new(50, 15);
        draw_linestring(&mut canvas, &[(179.0, 0.0), (-179.0, 0.0)], &vp);
        assert!(canvas.is_empty());

        draw_linestring(&mut canvas, &[(-10.0, 0.0), (10.0, 0.0)], &vp);
        assert!(!canvas.is_empty());
    }
}
