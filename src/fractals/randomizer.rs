//! Parameter Randomizer - picks a family and a parameter set that renders well
//!
//! Julia constants come from a curated table rather than free sampling;
//! arbitrary c values mostly give dust or empty images.

use rand::Rng;
use std::f64::consts::PI;

use super::{Family, FractalState};

/// Known Julia set constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JuliaConstant {
    pub name: &'static str,
    pub c_re: f64,
    pub c_im: f64,
}

pub const JULIA_CONSTANTS: [JuliaConstant; 5] = [
    JuliaConstant { name: "spiral_arms", c_re: -0.7, c_im: 0.27015 },
    JuliaConstant { name: "dust_cloud", c_re: 0.285, c_im: 0.01 },
    JuliaConstant { name: "spiral_julia", c_re: -0.4, c_im: 0.6 },
    JuliaConstant { name: "dragon", c_re: -0.8, c_im: 0.156 },
    JuliaConstant { name: "dendrite", c_re: 0.0, c_im: 1.0 },
];

/// Look up the curated entry for a (c_re, c_im) pair
pub fn julia_constant(c_re: f64, c_im: f64) -> Option<&'static JuliaConstant> {
    JULIA_CONSTANTS
        .iter()
        .find(|k| k.c_re == c_re && k.c_im == c_im)
}

/// New state with a random family, fresh seed and hue, and fresh parameters
/// for that family. Other families' parameters are carried over unchanged.
pub fn randomize<R: Rng + ?Sized>(current: &FractalState, rng: &mut R) -> FractalState {
    let family = Family::ALL[rng.gen_range(0..Family::ALL.len())];
    let mut next = current.clone();

    match family {
        Family::Mandelbrot => {
            next.mandelbrot.zoom = rng.gen_range(200.0..1000.0);
            next.mandelbrot.pan_x = rng.gen_range(-2.0..2.0);
            next.mandelbrot.pan_y = rng.gen_range(-2.0..2.0);
        }
        Family::Julia => {
            let constant = JULIA_CONSTANTS[rng.gen_range(0..JULIA_CONSTANTS.len())];
            next.julia.c_re = constant.c_re;
            next.julia.c_im = constant.c_im;
            next.julia.zoom = rng.gen_range(1.5..3.5);
        }
        Family::LSystem => {
            next.lsystem.iterations = rng.gen_range(4..=6);
            next.lsystem.angle = rng.gen_range(PI / 12.0..PI / 3.0);
        }
        Family::Sierpinski => {
            next.sierpinski.depth = rng.gen_range(5..=8);
        }
        Family::Koch => {
            next.koch.depth = rng.gen_range(3..=5);
            next.koch.angle = rng.gen_range(PI / 6.0..PI / 3.0);
        }
    }

    next.family = family;
    next.base_hue = rng.gen_range(0.0..360.0);
    next.seed = rng.gen::<f64>();

    tracing::info!(
        family = %family,
        params = %next.describe(family),
        "Randomized fractal state"
    );
    next
}
