//! Fractal Engine - procedural fractal generation
//!
//! Escape-time sets (Mandelbrot, Julia), L-system plants drawn by a turtle,
//! and recursive subdivision figures (Sierpinski, Koch), rendered onto any
//! [`surface::DrawContext`].

pub mod config;
pub mod engine;
pub mod fractals;
pub mod geometry;
pub mod logging;
pub mod surface;
pub mod turtle;
pub mod worker;

pub use engine::{FractalEngine, RenderSettings};
pub use fractals::{Family, FractalState, RenderError};
pub use surface::{Canvas, DrawContext, Raster};
pub use worker::{RenderJob, RenderWorker};
