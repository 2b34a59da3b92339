//! Fractal Engine - Single Source of Truth for the current fractal
//!
//! Owns the [`FractalState`] and the random source, and dispatches each
//! render to the generator for the active family.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::fractals::escape_time::{render_escape_time_with, EscapeView, DEFAULT_MAX_ITER};
use crate::fractals::palette::palette;
use crate::fractals::{lsystem, randomizer, subdivision};
use crate::fractals::{Family, FractalState, Limits, RenderError};
use crate::surface::DrawContext;
use crate::worker::{CancelToken, RenderJob};

/// Knobs that apply to every render, independent of the fractal state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub max_iter: u32,
    pub line_width: f64,
    /// Plane units per unit of pan delta
    pub pan_scale: f64,
    pub limits: Limits,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            line_width: 2.0,
            pan_scale: 0.01,
            limits: Limits::default(),
        }
    }
}

/// Render `state` onto `surface`, replacing its previous contents.
///
/// Preconditions are checked before anything is drawn; on error the surface
/// is left as it was.
pub fn render<C, R>(
    state: &FractalState,
    settings: &RenderSettings,
    surface: &mut C,
    rng: &mut R,
) -> Result<(), RenderError>
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    render_with(state, settings, surface, rng, &CancelToken::never())
}

/// As [`render`], giving up early once `cancel` fires
pub fn render_with<C, R>(
    state: &FractalState,
    settings: &RenderSettings,
    surface: &mut C,
    rng: &mut R,
    cancel: &CancelToken,
) -> Result<(), RenderError>
where
    C: DrawContext + ?Sized,
    R: Rng + ?Sized,
{
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidSurface { width, height });
    }
    state.validate(&settings.limits)?;
    if cancel.is_cancelled() {
        return Err(RenderError::Superseded {
            generation: cancel.generation(),
        });
    }

    tracing::debug!(
        family = %state.family,
        params = %state.describe(state.family),
        width,
        height,
        "Rendering"
    );
    let palette = palette(state.base_hue);

    match state.family {
        Family::Mandelbrot => render_escape_time_with(
            surface,
            &EscapeView::from(&state.mandelbrot),
            settings.max_iter,
            cancel,
        )?,
        Family::Julia => render_escape_time_with(
            surface,
            &EscapeView::from(&state.julia),
            settings.max_iter,
            cancel,
        )?,
        Family::LSystem => {
            lsystem::render_lsystem(
                surface,
                &state.lsystem,
                state.seed,
                &palette,
                settings.line_width,
                rng,
            )?;
        }
        Family::Sierpinski => {
            subdivision::render_sierpinski(surface, &state.sierpinski, &palette, rng);
        }
        Family::Koch => {
            subdivision::render_koch(surface, &state.koch, &palette, settings.line_width, rng);
        }
    }

    Ok(())
}

/// Shift the Mandelbrot view by scaled deltas. Other families are returned
/// unchanged.
pub fn pan(state: &FractalState, delta_x: f64, delta_y: f64, scale: f64) -> FractalState {
    let mut next = state.clone();
    if state.family == Family::Mandelbrot {
        next.mandelbrot.pan_x += delta_x * scale;
        next.mandelbrot.pan_y += delta_y * scale;
    }
    next
}

pub struct FractalEngine<R: Rng = StdRng> {
    state: FractalState,
    settings: RenderSettings,
    rng: R,
}

impl FractalEngine<StdRng> {
    /// Engine with a reproducible random source
    pub fn seeded(settings: RenderSettings, seed: u64) -> Self {
        Self::new(settings, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(settings: RenderSettings) -> Self {
        Self::new(settings, StdRng::from_entropy())
    }
}

impl<R: Rng> FractalEngine<R> {
    /// Start with a randomized family and parameters
    pub fn new(settings: RenderSettings, mut rng: R) -> Self {
        let state = randomizer::randomize(&FractalState::default(), &mut rng);
        Self {
            state,
            settings,
            rng,
        }
    }

    /// Start from an explicit state
    pub fn with_state(settings: RenderSettings, state: FractalState, rng: R) -> Self {
        Self {
            state,
            settings,
            rng,
        }
    }

    pub fn state(&self) -> &FractalState {
        &self.state
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace the family, seed, hue and the new family's parameters
    pub fn randomize(&mut self) -> &FractalState {
        self.state = randomizer::randomize(&self.state, &mut self.rng);
        &self.state
    }

    pub fn pan(&mut self, delta_x: f64, delta_y: f64) -> &FractalState {
        self.state = pan(&self.state, delta_x, delta_y, self.settings.pan_scale);
        &self.state
    }

    /// Switch the active family, resuming its stored parameters
    pub fn select_family(&mut self, family: Family) -> &FractalState {
        if self.state.family != family {
            tracing::info!(from = %self.state.family, to = %family, "Family selected");
            self.state.family = family;
        }
        &self.state
    }

    pub fn render<C: DrawContext + ?Sized>(&mut self, surface: &mut C) -> Result<(), RenderError> {
        render(&self.state, &self.settings, surface, &mut self.rng)
    }

    /// Package the current state for the background worker
    pub fn job(&mut self, width: u32, height: u32) -> RenderJob {
        RenderJob {
            state: self.state.clone(),
            width,
            height,
            seed: self.rng.gen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractals::palette::INSIDE_COLOR;
    use crate::surface::{Canvas, DrawCall, Raster, Recorder};
    use image::Rgba;

    fn state(family: Family) -> FractalState {
        FractalState {
            family,
            ..Default::default()
        }
    }

    #[test]
    fn test_dispatch_per_family() {
        let settings = RenderSettings::default();
        let mut rng = StdRng::seed_from_u64(1);

        for family in Family::ALL {
            let mut rec = Recorder::new(40, 30);
            render(&state(family), &settings, &mut rec, &mut rng).unwrap();
            match family {
                Family::Mandelbrot | Family::Julia => {
                    assert_eq!(rec.written_pixels(), 40 * 30);
                    assert!(rec.calls.is_empty());
                }
                Family::LSystem => {
                    assert_eq!(rec.count(&DrawCall::Stroke), 3);
                    assert!(!rec.strokes.is_empty());
                }
                Family::Sierpinski => assert_eq!(rec.fills.len(), 3usize.pow(5)),
                Family::Koch => assert_eq!(rec.strokes.len(), 3 * 4usize.pow(3)),
            }
        }
    }

    #[test]
    fn test_rejects_empty_surface() {
        let mut rng = StdRng::seed_from_u64(2);
        for family in Family::ALL {
            let mut rec = Recorder::new(0, 5);
            let result = render(&state(family), &RenderSettings::default(), &mut rec, &mut rng);
            assert_eq!(result, Err(RenderError::InvalidSurface { width: 0, height: 5 }));
            assert!(rec.calls.is_empty());
        }
    }

    #[test]
    fn test_failed_render_keeps_previous_contents() {
        let mut canvas = Canvas::new(8, 8);
        let marker = Rgba([1, 2, 3, 255]);
        canvas.put_pixel(4, 4, marker);

        let mut bad = state(Family::Koch);
        bad.koch.depth = 99;
        let mut rng = StdRng::seed_from_u64(3);
        let result = render(&bad, &RenderSettings::default(), &mut canvas, &mut rng);
        assert!(matches!(result, Err(RenderError::LimitExceeded { requested: 99, .. })));
        assert_eq!(canvas.pixel(4, 4), Some(marker));
    }

    #[test]
    fn test_pan_only_moves_mandelbrot() {
        let m = state(Family::Mandelbrot);
        let panned = pan(&m, 100.0, -50.0, 0.01);
        assert!((panned.mandelbrot.pan_x - 3.0).abs() < 1e-12);
        assert!((panned.mandelbrot.pan_y - 1.0).abs() < 1e-12);

        let j = state(Family::Julia);
        assert_eq!(pan(&j, 100.0, -50.0, 0.01), j);
    }

    #[test]
    fn test_select_family_resumes_params() {
        let mut engine = FractalEngine::seeded(RenderSettings::default(), 4);
        engine.select_family(Family::Mandelbrot);
        engine.pan(10.0, 10.0);
        let mandelbrot = engine.state().mandelbrot;

        engine.select_family(Family::Koch);
        engine.pan(500.0, 500.0);
        engine.select_family(Family::Mandelbrot);
        assert_eq!(engine.state().mandelbrot, mandelbrot);
    }

    #[test]
    fn test_engine_starts_randomized_and_valid() {
        let settings = RenderSettings::default();
        for seed in 0..20 {
            let engine = FractalEngine::seeded(settings.clone(), seed);
            assert!(engine.state().validate(&settings.limits).is_ok());
        }
    }

    #[test]
    fn test_same_seed_same_image() {
        let draw = || {
            let mut engine = FractalEngine::seeded(RenderSettings::default(), 99);
            engine.select_family(Family::LSystem);
            let mut canvas = Canvas::new(60, 60);
            engine.render(&mut canvas).unwrap();
            canvas.into_image()
        };
        assert_eq!(draw(), draw());
    }

    #[test]
    fn test_deep_mandelbrot_through_engine() {
        let mut s = state(Family::Mandelbrot);
        s.mandelbrot.zoom = 1e7;
        s.mandelbrot.pan_x = 0.0;
        s.mandelbrot.pan_y = 0.0;
        let mut engine = FractalEngine::with_state(
            RenderSettings::default(),
            s,
            StdRng::seed_from_u64(5),
        );
        let mut canvas = Canvas::new(10, 10);
        engine.render(&mut canvas).unwrap();
        assert!(canvas.image().pixels().all(|p| *p == INSIDE_COLOR));
    }
}
