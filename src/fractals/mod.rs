//! Fractal families - state, parameters and generators
//!
//! One family is active at a time; every family keeps its own parameters so
//! switching back resumes where it left off.
//! - escape_time: Mandelbrot and Julia per-pixel iteration
//! - lsystem: string rewriting, drawn by the turtle interpreter
//! - subdivision: Sierpinski triangles and Koch edges
//! - palette: base-hue color palettes
//! - randomizer: family and parameter selection

pub mod escape_time;
pub mod lsystem;
pub mod palette;
pub mod randomizer;
pub mod subdivision;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },
    #[error("Zoom must be positive and finite, got {0}")]
    InvalidZoom(f64),
    #[error("{what} of {requested} exceeds the limit of {limit}")]
    LimitExceeded {
        what: &'static str,
        requested: u32,
        limit: u32,
    },
    #[error("Unmatched ']' at offset {position}")]
    StackUnderflow { position: usize },
    #[error("Render {generation} superseded by a newer request")]
    Superseded { generation: u64 },
    #[error("Render worker stopped")]
    WorkerStopped,
}

/// Fractal family selecting the active generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Mandelbrot,
    Julia,
    LSystem,
    Sierpinski,
    Koch,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Mandelbrot,
        Family::Julia,
        Family::LSystem,
        Family::Sierpinski,
        Family::Koch,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Family::Mandelbrot => "mandelbrot",
            Family::Julia => "julia",
            Family::LSystem => "lsystem",
            Family::Sierpinski => "sierpinski",
            Family::Koch => "koch",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Family::ALL.iter().map(Family::name).collect();
                format!("unknown family '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MandelbrotParams {
    /// Pixels per unit of the complex plane
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

impl Default for MandelbrotParams {
    fn default() -> Self {
        Self {
            zoom: 300.0,
            pan_x: 2.0,
            pan_y: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JuliaParams {
    pub c_re: f64,
    pub c_im: f64,
    pub zoom: f64,
}

impl Default for JuliaParams {
    fn default() -> Self {
        Self {
            c_re: -0.7,
            c_im: 0.27015,
            zoom: 2.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LSystemParams {
    pub iterations: u32,
    /// Turn angle in radians
    pub angle: f64,
}

impl Default for LSystemParams {
    fn default() -> Self {
        Self {
            iterations: 4,
            angle: PI / 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SierpinskiParams {
    pub depth: u32,
}

impl Default for SierpinskiParams {
    fn default() -> Self {
        Self { depth: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KochParams {
    pub depth: u32,
    /// Spike angle in radians
    pub angle: f64,
}

impl Default for KochParams {
    fn default() -> Self {
        Self {
            depth: 3,
            angle: PI / 3.0,
        }
    }
}

/// Upper bounds on recursive work, checked before anything is drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_lsystem_iterations: u32,
    pub max_sierpinski_depth: u32,
    pub max_koch_depth: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_lsystem_iterations: 7,
            max_sierpinski_depth: 10,
            max_koch_depth: 8,
        }
    }
}

/// Complete fractal state - active family plus every family's parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalState {
    pub family: Family,
    /// In [0, 1); picks the L-system rule variant
    pub seed: f64,
    /// In [0, 360); drives the palette
    pub base_hue: f64,
    pub mandelbrot: MandelbrotParams,
    pub julia: JuliaParams,
    pub lsystem: LSystemParams,
    pub sierpinski: SierpinskiParams,
    pub koch: KochParams,
}

impl Default for FractalState {
    fn default() -> Self {
        Self {
            family: Family::Mandelbrot,
            seed: 0.0,
            base_hue: 0.0,
            mandelbrot: MandelbrotParams::default(),
            julia: JuliaParams::default(),
            lsystem: LSystemParams::default(),
            sierpinski: SierpinskiParams::default(),
            koch: KochParams::default(),
        }
    }
}

impl FractalState {
    /// Check the active family's parameters against `limits`
    pub fn validate(&self, limits: &Limits) -> Result<(), RenderError> {
        fn check(what: &'static str, requested: u32, limit: u32) -> Result<(), RenderError> {
            if requested > limit {
                return Err(RenderError::LimitExceeded {
                    what,
                    requested,
                    limit,
                });
            }
            Ok(())
        }
        fn zoom(z: f64) -> Result<(), RenderError> {
            if !(z.is_finite() && z > 0.0) {
                return Err(RenderError::InvalidZoom(z));
            }
            Ok(())
        }

        match self.family {
            Family::Mandelbrot => zoom(self.mandelbrot.zoom),
            Family::Julia => zoom(self.julia.zoom),
            Family::LSystem => check(
                "L-system iterations",
                self.lsystem.iterations,
                limits.max_lsystem_iterations,
            ),
            Family::Sierpinski => check(
                "Sierpinski depth",
                self.sierpinski.depth,
                limits.max_sierpinski_depth,
            ),
            Family::Koch => check("Koch depth", self.koch.depth, limits.max_koch_depth),
        }
    }

    /// One-line summary of a family's parameters
    pub fn describe(&self, family: Family) -> String {
        match family {
            Family::Mandelbrot => format!(
                "zoom={:.1} pan=({:.3}, {:.3})",
                self.mandelbrot.zoom, self.mandelbrot.pan_x, self.mandelbrot.pan_y
            ),
            Family::Julia => {
                let c = format!("c={:.5}{:+.5}i", self.julia.c_re, self.julia.c_im);
                match randomizer::julia_constant(self.julia.c_re, self.julia.c_im) {
                    Some(k) => format!("{} ({}) zoom={:.2}", c, k.name, self.julia.zoom),
                    None => format!("{} zoom={:.2}", c, self.julia.zoom),
                }
            }
            Family::LSystem => format!(
                "iterations={} angle={:.1}°",
                self.lsystem.iterations,
                self.lsystem.angle.to_degrees()
            ),
            Family::Sierpinski => format!("depth={}", self.sierpinski.depth),
            Family::Koch => format!(
                "depth={} angle={:.1}°",
                self.koch.depth,
                self.koch.angle.to_degrees()
            ),
        }
    }
}
