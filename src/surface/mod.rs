//! Drawing surfaces - the boundary between the engine and whatever displays it
//!
//! Escape-time generators only need a pixel grid ([`Raster`]); the turtle and
//! subdivision generators draw paths through a [`DrawContext`].
//! - canvas: software rasterizer backed by an RGBA image, exportable as PNG
//! - recorder: logs every draw call, for tests and headless inspection

pub mod canvas;
pub mod recorder;

pub use canvas::Canvas;
pub use recorder::{DrawCall, Recorder};

use image::Rgba;

/// Addressable pixel grid
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Overwrite one pixel. Out-of-range coordinates are ignored.
    fn put_pixel(&mut self, x: u32, y: u32, color: Rgba<u8>);
}

/// Path-drawing interface with an affine transform stack
pub trait DrawContext: Raster {
    /// Reset every pixel to the background
    fn clear(&mut self);
    fn set_stroke_color(&mut self, color: Rgba<u8>);
    fn set_fill_color(&mut self, color: Rgba<u8>);
    fn set_line_width(&mut self, width: f64);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f64, dy: f64);
    fn rotate(&mut self, radians: f64);
    fn scale(&mut self, sx: f64, sy: f64);
}
