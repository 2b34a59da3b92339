//! Mandelbrot and Julia sets by escape time
//!
//! Every pixel is mapped to the complex plane and iterated through
//! z_{n+1} = z_n^2 + c until |z|^2 reaches 4 or the iteration bound runs out.

use num_complex::Complex64;

use super::palette::escape_color;
use super::{JuliaParams, MandelbrotParams, RenderError};
use crate::surface::Raster;
use crate::worker::CancelToken;

/// Iteration bound when none is configured
pub const DEFAULT_MAX_ITER: u32 = 100;

/// Squared escape radius
const ESCAPE_RADIUS_SQ: f64 = 4.0;

/// Number of iterations before the orbit of z0 under z² + c escapes,
/// or `max_iter` if it never does
pub fn iterate(zx0: f64, zy0: f64, c_re: f64, c_im: f64, max_iter: u32) -> u32 {
    let c = Complex64::new(c_re, c_im);
    let mut z = Complex64::new(zx0, zy0);

    for i in 0..max_iter {
        if z.norm_sqr() >= ESCAPE_RADIUS_SQ {
            return i;
        }
        z = z * z + c;
    }

    max_iter
}

/// How pixels map onto the complex plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EscapeView {
    /// Each pixel is its own c, starting from z = c
    Mandelbrot { zoom: f64, pan_x: f64, pan_y: f64 },
    /// Each pixel is z0, iterated with a fixed c
    Julia { c_re: f64, c_im: f64, zoom: f64 },
}

impl From<&MandelbrotParams> for EscapeView {
    fn from(p: &MandelbrotParams) -> Self {
        EscapeView::Mandelbrot {
            zoom: p.zoom,
            pan_x: p.pan_x,
            pan_y: p.pan_y,
        }
    }
}

impl From<&JuliaParams> for EscapeView {
    fn from(p: &JuliaParams) -> Self {
        EscapeView::Julia {
            c_re: p.c_re,
            c_im: p.c_im,
            zoom: p.zoom,
        }
    }
}

impl EscapeView {
    pub fn zoom(&self) -> f64 {
        match *self {
            EscapeView::Mandelbrot { zoom, .. } | EscapeView::Julia { zoom, .. } => zoom,
        }
    }

    /// Escape count for pixel (x, y) of a width x height surface
    pub fn escape_count(&self, x: u32, y: u32, width: u32, height: u32, max_iter: u32) -> u32 {
        let (w, h) = (width as f64, height as f64);
        let dx = x as f64 - w / 2.0;
        let dy = y as f64 - h / 2.0;

        match *self {
            EscapeView::Mandelbrot { zoom, pan_x, pan_y } => {
                let zx = dx / zoom - pan_x;
                let zy = dy / zoom - pan_y;
                iterate(zx, zy, zx, zy, max_iter)
            }
            EscapeView::Julia { c_re, c_im, zoom } => {
                let zx = 1.5 * dx / (0.5 * zoom * w);
                let zy = dy / (0.5 * zoom * h);
                iterate(zx, zy, c_re, c_im, max_iter)
            }
        }
    }
}

/// Overwrite every pixel of `surface` with its escape-time color
pub fn render_escape_time<R: Raster + ?Sized>(
    surface: &mut R,
    view: &EscapeView,
    max_iter: u32,
) -> Result<(), RenderError> {
    render_escape_time_with(surface, view, max_iter, &CancelToken::never())
}

/// As [`render_escape_time`], abandoning the render between rows once
/// `cancel` reports that a newer request exists
pub fn render_escape_time_with<R: Raster + ?Sized>(
    surface: &mut R,
    view: &EscapeView,
    max_iter: u32,
    cancel: &CancelToken,
) -> Result<(), RenderError> {
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSurface { width, height });
    }
    let zoom = view.zoom();
    if !(zoom.is_finite() && zoom > 0.0) {
        return Err(RenderError::InvalidZoom(zoom));
    }

    tracing::debug!(?view, width, height, max_iter, "Escape-time render");

    for y in 0..height {
        if cancel.is_cancelled() {
            return Err(RenderError::Superseded {
                generation: cancel.generation(),
            });
        }
        for x in 0..width {
            let count = view.escape_count(x, y, width, height, max_iter);
            surface.put_pixel(x, y, escape_color(count, max_iter));
        }
    }

    Ok(())
}
