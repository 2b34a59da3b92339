//! L-System plants - deterministic string rewriting, drawn by the turtle
//!
//! Axiom: F, Rules: F → F[+F]F[-F]F, or F → F[+F][-F] when seed > 0.5.
//! Three copies of the plant are drawn rotated 120° apart around the center.

use rand::Rng;
use std::collections::HashMap;
use std::f64::consts::TAU;

use super::palette::{pick, Palette};
use super::{LSystemParams, RenderError};
use crate::surface::DrawContext;
use crate::turtle;

pub const AXIOM: &str = "F";

/// Five forward moves per generation
pub const DENSE_RULE: &str = "F[+F]F[-F]F";

/// Three forward moves per generation, all but one in branches
pub const BRANCHING_RULE: &str = "F[+F][-F]";

/// Rotated copies in the composite figure
pub const INSTANCES: usize = 3;

pub type Rules = HashMap<char, &'static str>;

/// Rewrite `axiom` for `iterations` generations.
/// Symbols without a rule are copied through unchanged.
pub fn expand(axiom: &str, rules: &HashMap<char, &str>, iterations: u32) -> String {
    let mut s = String::from(axiom);

    for _ in 0..iterations {
        let growth = rules.values().map(|r| r.len()).max().unwrap_or(1);
        let mut next = String::with_capacity(s.len() * growth);
        for c in s.chars() {
            match rules.get(&c) {
                Some(replacement) => next.push_str(replacement),
                None => next.push(c),
            }
        }
        s = next;
    }

    s
}

/// Rule set for a given state seed. The variant is fixed for a whole expansion.
pub fn rules_for_seed(seed: f64) -> Rules {
    let rule = if seed > 0.5 { BRANCHING_RULE } else { DENSE_RULE };
    HashMap::from([('F', rule)])
}

/// Draw the three-fold plant composite onto `ctx`.
///
/// The instruction string is expanded and validated before the surface is
/// cleared, so a rejected render leaves the surface untouched.
///
/// # Returns
/// Total number of segments drawn
pub fn render_lsystem<C, R>(
    ctx: &mut C,
    params: &LSystemParams,
    seed: f64,
    palette: &Palette,
    line_width: f64,
    rng: &mut R,
) -> Result<usize, RenderError>
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    let sentence = expand(AXIOM, &rules_for_seed(seed), params.iterations);
    turtle::validate(&sentence)?;
    tracing::debug!(
        iterations = params.iterations,
        symbols = sentence.len(),
        "L-system expanded"
    );

    let (w, h) = (ctx.width() as f64, ctx.height() as f64);
    let start_length = h / 4.0;
    ctx.clear();

    let mut segments = 0;
    for i in 0..INSTANCES {
        ctx.save();
        ctx.translate(w / 2.0, h / 2.0);
        ctx.rotate(i as f64 * TAU / INSTANCES as f64);
        ctx.translate(0.0, -h / 4.0);
        ctx.scale(1.0, -1.0);
        ctx.begin_path();
        ctx.set_stroke_color(pick(palette, i));
        ctx.set_line_width(line_width);
        segments += turtle::interpret(&sentence, ctx, start_length, params.angle, rng)?;
        ctx.stroke();
        ctx.restore();
    }

    Ok(segments)
}
