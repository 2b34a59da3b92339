//! Turtle 2D Path Interpreter
//!
//! Walks an L-system instruction string against a [`DrawContext`].
//! - `F`: draw forward (jittered length), then advance the full length
//! - `+` / `-`: turn by +/- the turn angle
//! - `[`: save position, heading and length; shrink length for the branch
//! - `]`: restore the last saved state
//!
//! The turtle's heading is +Y in its own frame. Saved states live on an
//! explicit stack of value snapshots local to one call, so separate
//! interpretations never share branch state.

use rand::Rng;
use std::ops::Range;

use crate::fractals::RenderError;
use crate::geometry::{Affine, Point};
use crate::surface::DrawContext;

/// Length multiplier applied when entering a branch
pub const BRANCH_SHRINK: f64 = 0.75;

/// Per-segment drawn-length jitter
pub const JITTER: Range<f64> = 0.9..1.1;

#[derive(Debug, Clone, Copy)]
struct TurtleState {
    transform: Affine,
    length: f64,
}

/// Check bracket balance. An unmatched `]` is rejected with its byte offset.
pub fn validate(instructions: &str) -> Result<(), RenderError> {
    let mut depth = 0usize;
    for (position, ch) in instructions.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err(RenderError::StackUnderflow { position });
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Interpret `instructions`, appending segments to the context's current path.
///
/// The instruction string is validated before anything is drawn.
///
/// # Returns
/// Number of segments drawn
pub fn interpret<C, R>(
    instructions: &str,
    ctx: &mut C,
    start_length: f64,
    turn_angle: f64,
    rng: &mut R,
) -> Result<usize, RenderError>
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    validate(instructions)?;

    let mut turtle = TurtleState {
        transform: Affine::IDENTITY,
        length: start_length,
    };
    let mut stack: Vec<TurtleState> = Vec::new();
    let mut segments = 0;

    for ch in instructions.chars() {
        match ch {
            'F' => {
                let drawn = turtle.length * rng.gen_range(JITTER);
                let from = turtle.transform.apply(Point::new(0.0, 0.0));
                let to = turtle.transform.apply(Point::new(0.0, drawn));
                ctx.move_to(from.x, from.y);
                ctx.line_to(to.x, to.y);
                turtle.transform = turtle.transform.translate(0.0, turtle.length);
                segments += 1;
            }
            '+' => turtle.transform = turtle.transform.rotate(turn_angle),
            '-' => turtle.transform = turtle.transform.rotate(-turn_angle),
            '[' => {
                stack.push(turtle);
                turtle.length *= BRANCH_SHRINK;
            }
            ']' => {
                // validate() guarantees a matching '['
                if let Some(saved) = stack.pop() {
                    turtle = saved;
                }
            }
            _ => {}
        }
    }

    Ok(segments)
}
