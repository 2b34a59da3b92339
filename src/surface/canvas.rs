//! Software canvas - an RGBA image with a minimal 2D path rasterizer
//!
//! Strokes use Bresenham lines stamped with a square brush; fills use an
//! even-odd scanline over every subpath of the current path.

use image::{ImageFormat, ImageResult, Rgba, RgbaImage};
use std::path::Path;

use super::{DrawContext, Raster};
use crate::geometry::{Affine, Point};

/// Color written by [`DrawContext::clear`]
pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    transform: Affine,
    stroke: Rgba<u8>,
    fill: Rgba<u8>,
    line_width: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            stroke: Rgba([0, 0, 0, 255]),
            fill: Rgba([0, 0, 0, 255]),
            line_width: 1.0,
        }
    }
}

/// Subpath in device coordinates
#[derive(Debug, Clone)]
struct SubPath {
    points: Vec<Point>,
    closed: bool,
}

impl SubPath {
    fn segments(&self, force_closed: bool) -> Vec<(Point, Point)> {
        let mut segments: Vec<(Point, Point)> =
            self.points.windows(2).map(|w| (w[0], w[1])).collect();
        if (self.closed || force_closed) && self.points.len() > 2 {
            if let (Some(&first), Some(&last)) = (self.points.first(), self.points.last()) {
                segments.push((last, first));
            }
        }
        segments
    }
}

#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    path: Vec<SubPath>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
            state: GraphicsState::default(),
            saved: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Pixel at (x, y), or `None` outside the canvas
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// Number of pixels that differ from the background
    pub fn painted_pixels(&self) -> usize {
        self.image.pixels().filter(|p| **p != BACKGROUND).count()
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    fn set(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x >= 0 && y >= 0 && x < self.image.width() as i64 && y < self.image.height() as i64 {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    fn draw_line(&mut self, p0: Point, p1: Point, width: i64, color: Rgba<u8>) {
        if !p0.is_finite() || !p1.is_finite() {
            return;
        }
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        let margin = width as f64;
        if p0.x.max(p1.x) < -margin
            || p0.y.max(p1.y) < -margin
            || p0.x.min(p1.x) > w + margin
            || p0.y.min(p1.y) > h + margin
        {
            return;
        }

        let mut x0 = p0.x.round() as i64;
        let mut y0 = p0.y.round() as i64;
        let x1 = p1.x.round() as i64;
        let y1 = p1.y.round() as i64;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        let lo = -(width / 2);
        let hi = lo + width;
        loop {
            for oy in lo..hi {
                for ox in lo..hi {
                    self.set(x0 + ox, y0 + oy, color);
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

impl Raster for Canvas {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.image.width() && y < self.image.height() {
            self.image.put_pixel(x, y, color);
        }
    }
}

impl DrawContext for Canvas {
    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    fn set_stroke_color(&mut self, color: Rgba<u8>) {
        self.state.stroke = color;
    }

    fn set_fill_color(&mut self, color: Rgba<u8>) {
        self.state.fill = color;
    }

    fn set_line_width(&mut self, width: f64) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.state.transform.apply(Point::new(x, y));
        self.path.push(SubPath {
            points: vec![p],
            closed: false,
        });
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let p = self.state.transform.apply(Point::new(x, y));
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(p),
            Some(sub) => {
                // A closed subpath continues from its first point
                let start = sub.points[0];
                self.path.push(SubPath {
                    points: vec![start, p],
                    closed: false,
                });
            }
            None => self.path.push(SubPath {
                points: vec![p],
                closed: false,
            }),
        }
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn fill(&mut self) {
        let edges: Vec<(Point, Point)> = self
            .path
            .iter()
            .filter(|sub| sub.points.len() >= 3)
            .flat_map(|sub| sub.segments(true))
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .collect();
        if edges.is_empty() {
            return;
        }

        let min_y = edges.iter().map(|(a, b)| a.y.min(b.y)).fold(f64::INFINITY, f64::min);
        let max_y = edges.iter().map(|(a, b)| a.y.max(b.y)).fold(f64::NEG_INFINITY, f64::max);
        let height = self.image.height() as f64;
        let width = self.image.width() as f64;
        let row_start = (min_y - 0.5).ceil().clamp(0.0, height) as u32;
        let row_end = (max_y - 0.5).ceil().clamp(0.0, height) as u32;
        let color = self.state.fill;

        let mut crossings: Vec<f64> = Vec::new();
        for row in row_start..row_end {
            let sy = row as f64 + 0.5;
            crossings.clear();
            crossings.extend(edges.iter().filter_map(|&(a, b)| {
                let spans = (a.y <= sy && b.y > sy) || (b.y <= sy && a.y > sy);
                spans.then(|| a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y))
            }));
            crossings.sort_by(|a, b| a.total_cmp(b));

            for pair in crossings.chunks_exact(2) {
                let start = (pair[0] - 0.5).ceil().clamp(0.0, width) as u32;
                let end = (pair[1] - 0.5).ceil().clamp(0.0, width) as u32;
                for x in start..end {
                    self.image.put_pixel(x, row, color);
                }
            }
        }
    }

    fn stroke(&mut self) {
        let width = (self.state.line_width * self.state.transform.mean_scale())
            .round()
            .max(1.0) as i64;
        let color = self.state.stroke;
        let segments: Vec<(Point, Point)> =
            self.path.iter().flat_map(|sub| sub.segments(false)).collect();
        for (a, b) in segments {
            self.draw_line(a, b, width, color);
        }
    }

    fn save(&mut self) {
        self.saved.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.state.transform = self.state.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.state.transform = self.state.transform.rotate(radians);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.state.transform = self.state.transform.scale(sx, sy);
    }
}
