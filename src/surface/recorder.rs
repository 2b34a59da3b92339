//! Recording surface - logs draw calls instead of rasterizing them
//!
//! Tracks the transform stack and current path like a real canvas so that
//! filled polygons and stroked segments can be inspected in device space.

use image::Rgba;

use super::{DrawContext, Raster};
use crate::geometry::{Affine, Point};

/// One call made against the surface, with arguments as passed
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Clear,
    SetStroke(Rgba<u8>),
    SetFill(Rgba<u8>),
    SetLineWidth(f64),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    ClosePath,
    Fill,
    Stroke,
    Save,
    Restore,
    Translate(f64, f64),
    Rotate(f64),
    Scale(f64, f64),
}

/// Polygon produced by a `fill`, in device coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct FilledPolygon {
    pub color: Rgba<u8>,
    pub points: Vec<Point>,
}

/// Segment produced by a `stroke`, in device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokedSegment {
    pub color: Rgba<u8>,
    pub start: Point,
    pub end: Point,
}

#[derive(Debug, Clone)]
pub struct Recorder {
    width: u32,
    height: u32,
    pixels: Vec<Option<Rgba<u8>>>,
    pub calls: Vec<DrawCall>,
    pub fills: Vec<FilledPolygon>,
    pub strokes: Vec<StrokedSegment>,
    transform: Affine,
    saved: Vec<(Affine, Rgba<u8>, Rgba<u8>)>,
    stroke_color: Rgba<u8>,
    fill_color: Rgba<u8>,
    path: Vec<Vec<Point>>,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![None; width as usize * height as usize],
            calls: Vec::new(),
            fills: Vec::new(),
            strokes: Vec::new(),
            transform: Affine::IDENTITY,
            saved: Vec::new(),
            stroke_color: Rgba([0, 0, 0, 255]),
            fill_color: Rgba([0, 0, 0, 255]),
            path: Vec::new(),
        }
    }

    /// Last color written to (x, y) by `put_pixel`
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize]
        } else {
            None
        }
    }

    /// Number of pixels written at least once since the last clear
    pub fn written_pixels(&self) -> usize {
        self.pixels.iter().filter(|p| p.is_some()).count()
    }

    pub fn count(&self, call: &DrawCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    /// Device-space length of every stroked segment
    pub fn stroked_length(&self) -> f64 {
        self.strokes.iter().map(|s| s.start.distance(s.end)).sum()
    }
}

impl Raster for Recorder {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = Some(color);
        }
    }
}

impl DrawContext for Recorder {
    fn clear(&mut self) {
        self.calls.push(DrawCall::Clear);
        self.pixels.iter_mut().for_each(|p| *p = None);
        self.fills.clear();
        self.strokes.clear();
    }

    fn set_stroke_color(&mut self, color: Rgba<u8>) {
        self.calls.push(DrawCall::SetStroke(color));
        self.stroke_color = color;
    }

    fn set_fill_color(&mut self, color: Rgba<u8>) {
        self.calls.push(DrawCall::SetFill(color));
        self.fill_color = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.calls.push(DrawCall::SetLineWidth(width));
    }

    fn begin_path(&mut self) {
        self.calls.push(DrawCall::BeginPath);
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::MoveTo(Point::new(x, y)));
        self.path.push(vec![self.transform.apply(Point::new(x, y))]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.calls.push(DrawCall::LineTo(Point::new(x, y)));
        let p = self.transform.apply(Point::new(x, y));
        match self.path.last_mut() {
            Some(sub) => sub.push(p),
            None => self.path.push(vec![p]),
        }
    }

    fn close_path(&mut self) {
        self.calls.push(DrawCall::ClosePath);
    }

    fn fill(&mut self) {
        self.calls.push(DrawCall::Fill);
        for sub in self.path.iter().filter(|sub| sub.len() >= 3) {
            self.fills.push(FilledPolygon {
                color: self.fill_color,
                points: sub.clone(),
            });
        }
    }

    fn stroke(&mut self) {
        self.calls.push(DrawCall::Stroke);
        for sub in &self.path {
            for w in sub.windows(2) {
                self.strokes.push(StrokedSegment {
                    color: self.stroke_color,
                    start: w[0],
                    end: w[1],
                });
            }
        }
    }

    fn save(&mut self) {
        self.calls.push(DrawCall::Save);
        self.saved.push((self.transform, self.stroke_color, self.fill_color));
    }

    fn restore(&mut self) {
        self.calls.push(DrawCall::Restore);
        if let Some((transform, stroke, fill)) = self.saved.pop() {
            self.transform = transform;
            self.stroke_color = stroke;
            self.fill_color = fill;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.calls.push(DrawCall::Translate(dx, dy));
        self.transform = self.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.calls.push(DrawCall::Rotate(radians));
        self.transform = self.transform.rotate(radians);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.calls.push(DrawCall::Scale(sx, sy));
        self.transform = self.transform.scale(sx, sy);
    }
}
