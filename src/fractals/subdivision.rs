//! Recursive subdivision fractals - Sierpinski triangle and Koch edges
//!
//! Both generators walk an explicit work stack rather than the call stack.
//! Children are pushed in reverse so they are drawn in the natural order,
//! which keeps Koch output a continuous path.

use rand::Rng;

use super::palette::{pick, Palette, PALETTE_LEN};
use super::{KochParams, SierpinskiParams};
use crate::geometry::{cross, Point};
use crate::surface::DrawContext;

/// Shapes smaller than this are skipped as degenerate
const EPSILON: f64 = 1e-9;

/// Fill the 3^depth corner triangles of (p1, p2, p3).
///
/// Leaves are colored with palette index `depth % 5` of the leaf, which is
/// always 0.
///
/// # Returns
/// Number of triangles filled
pub fn subdivide_triangle<C: DrawContext + ?Sized>(
    ctx: &mut C,
    p1: Point,
    p2: Point,
    p3: Point,
    depth: u32,
    palette: &Palette,
) -> usize {
    let mut stack = vec![(p1, p2, p3, depth)];
    let mut filled = 0;

    while let Some((a, b, c, depth)) = stack.pop() {
        if depth == 0 {
            if cross(a, b, c).abs() < EPSILON {
                continue;
            }
            ctx.begin_path();
            ctx.move_to(a.x, a.y);
            ctx.line_to(b.x, b.y);
            ctx.line_to(c.x, c.y);
            ctx.close_path();
            ctx.set_fill_color(pick(palette, depth as usize % PALETTE_LEN));
            ctx.fill();
            filled += 1;
            continue;
        }

        let ab = a.midpoint(b);
        let bc = b.midpoint(c);
        let ac = a.midpoint(c);
        stack.push((ac, bc, c, depth - 1));
        stack.push((ab, b, bc, depth - 1));
        stack.push((a, ab, ac, depth - 1));
    }

    filled
}

/// Stroke the 4^depth segments of a Koch curve from p1 to p2.
///
/// The spike of each middle third is turned `spike_angle` radians away from
/// the segment direction, counter-clockwise on a y-down screen.
///
/// # Returns
/// Number of segments stroked
pub fn subdivide_edge<C: DrawContext + ?Sized>(
    ctx: &mut C,
    p1: Point,
    p2: Point,
    depth: u32,
    spike_angle: f64,
) -> usize {
    let mut stack = vec![(p1, p2, depth)];
    let mut stroked = 0;

    while let Some((start, end, depth)) = stack.pop() {
        if depth == 0 {
            if start.distance(end) < EPSILON {
                continue;
            }
            ctx.begin_path();
            ctx.move_to(start.x, start.y);
            ctx.line_to(end.x, end.y);
            ctx.stroke();
            stroked += 1;
            continue;
        }

        let third = (end - start) * (1.0 / 3.0);
        let p3 = start + third;
        let p5 = start + third * 2.0;
        let heading = (p5 - p3).angle() - spike_angle;
        let length = third.length();
        let p4 = p3 + Point::new(heading.cos(), heading.sin()) * length;

        stack.push((p5, end, depth - 1));
        stack.push((p4, p5, depth - 1));
        stack.push((p3, p4, depth - 1));
        stack.push((start, p3, depth - 1));
    }

    stroked
}

/// Clear `ctx` and draw a centered Sierpinski triangle.
/// The triangle's size is jittered by ±10%.
pub fn render_sierpinski<C, R>(
    ctx: &mut C,
    params: &SierpinskiParams,
    palette: &Palette,
    rng: &mut R,
) -> usize
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    let (w, h) = (ctx.width() as f64, ctx.height() as f64);
    let size = 0.8 * w.min(h) * rng.gen_range(0.9..1.1);
    let tri_h = size * 3f64.sqrt() / 2.0;
    let (cx, cy) = (w / 2.0, h / 2.0);

    ctx.clear();
    let filled = subdivide_triangle(
        ctx,
        Point::new(cx - size / 2.0, cy - tri_h / 2.0),
        Point::new(cx + size / 2.0, cy - tri_h / 2.0),
        Point::new(cx, cy + tri_h / 2.0),
        params.depth,
        palette,
    );
    tracing::debug!(depth = params.depth, filled, "Sierpinski drawn");
    filled
}

/// Clear `ctx` and draw a closed Koch triangle in a random palette color
pub fn render_koch<C, R>(
    ctx: &mut C,
    params: &KochParams,
    palette: &Palette,
    line_width: f64,
    rng: &mut R,
) -> usize
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    let (w, h) = (ctx.width() as f64, ctx.height() as f64);
    let size = 0.7 * w.min(h);
    let tri_h = size * 3f64.sqrt() / 2.0;
    let a = Point::new((w - size) / 2.0, (h + tri_h / 3.0) / 2.0);
    let b = a + Point::new(size, 0.0);
    let c = a + Point::new(size / 2.0, -tri_h);

    ctx.clear();
    ctx.set_stroke_color(pick(palette, rng.gen_range(0..PALETTE_LEN)));
    ctx.set_line_width(line_width);

    let mut stroked = 0;
    for (start, end) in [(a, b), (b, c), (c, a)] {
        stroked += subdivide_edge(ctx, start, end, params.depth, params.angle);
    }
    tracing::debug!(depth = params.depth, stroked, "Koch drawn");
    stroked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractals::palette::palette;
    use crate::surface::{Canvas, DrawCall, Recorder};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_PI_3;

    fn triangle() -> (Point, Point, Point) {
        (
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 86.6),
        )
    }

    #[test]
    fn test_sierpinski_leaf_count() {
        let (a, b, c) = triangle();
        for depth in 0..=5 {
            let mut rec = Recorder::new(100, 100);
            let n = subdivide_triangle(&mut rec, a, b, c, depth, &palette(0.0));
            assert_eq!(n, 3usize.pow(depth));
            assert_eq!(rec.fills.len(), 3usize.pow(depth));
        }
    }

    #[test]
    fn test_sierpinski_always_first_color() {
        let (a, b, c) = triangle();
        let pal = palette(75.0);
        for depth in [0, 3] {
            let mut rec = Recorder::new(100, 100);
            subdivide_triangle(&mut rec, a, b, c, depth, &pal);
            assert!(rec.fills.iter().all(|f| f.color == pal[0].to_rgba()));
        }
    }

    #[test]
    fn test_sierpinski_skips_center() {
        let (a, b, c) = triangle();
        let mut rec = Recorder::new(100, 100);
        subdivide_triangle(&mut rec, a, b, c, 1, &palette(0.0));
        // No leaf has all three vertices on the midpoints
        let mids = [a.midpoint(b), b.midpoint(c), a.midpoint(c)];
        assert!(!rec
            .fills
            .iter()
            .any(|f| f.points.iter().all(|p| mids.contains(p))));
    }

    #[test]
    fn test_degenerate_triangle_draws_nothing() {
        let p = Point::new(5.0, 5.0);
        let mut rec = Recorder::new(10, 10);
        let n = subdivide_triangle(&mut rec, p, p, Point::new(9.0, 9.0), 2, &palette(0.0));
        assert_eq!(n, 0);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_koch_segment_count_and_continuity() {
        let (p1, p2) = (Point::new(0.0, 100.0), Point::new(300.0, 100.0));
        for depth in 0..=4 {
            let mut rec = Recorder::new(400, 200);
            let n = subdivide_edge(&mut rec, p1, p2, depth, FRAC_PI_3);
            assert_eq!(n, 4usize.pow(depth));

            let segs = &rec.strokes;
            assert!(segs[0].start.distance(p1) < 1e-9);
            assert!(segs[segs.len() - 1].end.distance(p2) < 1e-9);
            for pair in segs.windows(2) {
                assert!(pair[0].end.distance(pair[1].start) < 1e-9);
            }
        }
    }

    #[test]
    fn test_koch_path_longer_than_chord() {
        let (p1, p2) = (Point::new(0.0, 0.0), Point::new(90.0, 0.0));
        let mut rec = Recorder::new(100, 100);
        subdivide_edge(&mut rec, p1, p2, 1, FRAC_PI_3);
        // Classic Koch: four thirds of the chord
        assert!((rec.stroked_length() - 120.0).abs() < 1e-9);

        for depth in 1..=3 {
            let mut rec = Recorder::new(100, 100);
            subdivide_edge(&mut rec, p1, p2, depth, 0.4);
            assert!(rec.stroked_length() > 90.0);
        }
    }

    #[test]
    fn test_koch_spike_points_up_on_screen() {
        let mut rec = Recorder::new(100, 100);
        subdivide_edge(&mut rec, Point::new(0.0, 50.0), Point::new(90.0, 50.0), 1, FRAC_PI_3);
        let tip = rec.strokes[1].end;
        assert!((tip.x - 45.0).abs() < 1e-9);
        assert!(tip.y < 50.0);
    }

    #[test]
    fn test_zero_length_edge_draws_nothing() {
        let p = Point::new(3.0, 3.0);
        let mut rec = Recorder::new(10, 10);
        assert_eq!(subdivide_edge(&mut rec, p, p, 3, 1.0), 0);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn test_render_sierpinski_clears_first() {
        let mut rec = Recorder::new(120, 100);
        let mut rng = StdRng::seed_from_u64(5);
        let n = render_sierpinski(&mut rec, &SierpinskiParams { depth: 4 }, &palette(0.0), &mut rng);
        assert_eq!(n, 81);
        assert_eq!(rec.calls[0], DrawCall::Clear);
    }

    #[test]
    fn test_render_koch_closed_triangle() {
        let mut rec = Recorder::new(200, 200);
        let mut rng = StdRng::seed_from_u64(6);
        let params = KochParams {
            depth: 2,
            angle: FRAC_PI_3,
        };
        let pal = palette(10.0);
        let n = render_koch(&mut rec, &params, &pal, 2.0, &mut rng);
        assert_eq!(n, 3 * 16);

        let first = rec.strokes[0].start;
        let last = rec.strokes[rec.strokes.len() - 1].end;
        assert!(first.distance(last) < 1e-9);
        let color = rec.strokes[0].color;
        assert!(pal.iter().any(|c| c.to_rgba() == color));
        assert!(rec.strokes.iter().all(|s| s.color == color));
    }

    #[test]
    fn test_render_sierpinski_on_canvas() {
        let mut canvas = Canvas::new(64, 64);
        let mut rng = StdRng::seed_from_u64(8);
        let pal = palette(200.0);
        render_sierpinski(&mut canvas, &SierpinskiParams { depth: 3 }, &pal, &mut rng);
        assert!(canvas.painted_pixels() > 0);
        // Centroid of the skipped middle triangle stays empty
        assert_eq!(canvas.pixel(32, 24), Some(crate::surface::canvas::BACKGROUND));
    }
}
