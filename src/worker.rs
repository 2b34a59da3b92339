//! Background render worker
//!
//! Renders run on tokio's blocking pool. Requests travel over a watch
//! channel, so a burst of requests collapses to the newest one, and a render
//! that has been overtaken stops at the next row instead of finishing.
//! Each render draws into its own canvas; only completed frames are published.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::engine::{self, RenderSettings};
use crate::fractals::{FractalState, RenderError};
use crate::surface::Canvas;

/// Tells a render whether a newer request has replaced it
#[derive(Debug, Clone)]
pub struct CancelToken {
    latest: Option<Arc<AtomicU64>>,
    generation: u64,
}

impl CancelToken {
    /// Token that never fires, for synchronous renders
    pub fn never() -> Self {
        Self {
            latest: None,
            generation: 0,
        }
    }

    pub fn new(latest: Arc<AtomicU64>, generation: u64) -> Self {
        Self {
            latest: Some(latest),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_cancelled(&self) -> bool {
        self.latest
            .as_ref()
            .map_or(false, |latest| latest.load(Ordering::Acquire) != self.generation)
    }
}

/// Everything needed to reproduce one render
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub state: FractalState,
    pub width: u32,
    pub height: u32,
    /// Seeds the jitter source for this render
    pub seed: u64,
}

/// A finished render
#[derive(Debug)]
pub struct Frame {
    pub generation: u64,
    pub state: FractalState,
    pub canvas: Canvas,
}

#[derive(Debug, Clone, Default)]
pub enum FrameStatus {
    #[default]
    Idle,
    Ready(Arc<Frame>),
    Failed {
        generation: u64,
        error: RenderError,
    },
}

pub struct RenderWorker {
    requests: watch::Sender<Option<(u64, RenderJob)>>,
    frames: watch::Receiver<FrameStatus>,
    latest: Arc<AtomicU64>,
    task: JoinHandle<()>,
}

impl RenderWorker {
    /// Start the worker loop. Must be called inside a tokio runtime.
    pub fn spawn(settings: RenderSettings) -> Self {
        let (requests, request_rx) = watch::channel(None);
        let (frame_tx, frames) = watch::channel(FrameStatus::Idle);
        let latest = Arc::new(AtomicU64::new(0));
        let task = tokio::spawn(run(request_rx, frame_tx, Arc::clone(&latest), settings));

        Self {
            requests,
            frames,
            latest,
            task,
        }
    }

    /// Queue a render, replacing any request not yet started.
    ///
    /// # Returns
    /// The generation number of this request
    pub fn submit(&self, job: RenderJob) -> u64 {
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, family = %job.state.family, "Render requested");
        self.requests.send_replace(Some((generation, job)));
        generation
    }

    pub fn subscribe(&self) -> watch::Receiver<FrameStatus> {
        self.frames.clone()
    }

    /// Wait until `generation`, or a request newer than it, has finished
    pub async fn wait_for(&self, generation: u64) -> Result<Arc<Frame>, RenderError> {
        let mut frames = self.frames.clone();
        loop {
            let outcome = match &*frames.borrow_and_update() {
                FrameStatus::Ready(frame) if frame.generation >= generation => {
                    Some(Ok(Arc::clone(frame)))
                }
                FrameStatus::Failed {
                    generation: failed,
                    error,
                } if *failed >= generation => Some(Err(error.clone())),
                _ => None,
            };
            if let Some(outcome) = outcome {
                return outcome;
            }
            frames
                .changed()
                .await
                .map_err(|_| RenderError::WorkerStopped)?;
        }
    }

    /// Stop accepting requests and wait for the loop to exit
    pub async fn shutdown(self) {
        let RenderWorker { requests, task, .. } = self;
        drop(requests);
        if let Err(e) = task.await {
            tracing::warn!("Render worker ended abnormally: {}", e);
        }
    }
}

async fn run(
    mut requests: watch::Receiver<Option<(u64, RenderJob)>>,
    frames: watch::Sender<FrameStatus>,
    latest: Arc<AtomicU64>,
    settings: RenderSettings,
) {
    tracing::debug!("Render worker started");

    while requests.changed().await.is_ok() {
        let Some((generation, job)) = requests.borrow_and_update().clone() else {
            continue;
        };

        let token = CancelToken::new(Arc::clone(&latest), generation);
        let settings = settings.clone();
        let outcome =
            tokio::task::spawn_blocking(move || render_job(job, generation, &settings, &token))
                .await;

        match outcome {
            Ok(Ok(frame)) => {
                tracing::info!(generation, family = %frame.state.family, "Frame ready");
                frames.send_replace(FrameStatus::Ready(Arc::new(frame)));
            }
            Ok(Err(RenderError::Superseded { .. })) => {
                tracing::debug!(generation, "Render superseded");
            }
            Ok(Err(error)) => {
                tracing::warn!(generation, "Render failed: {}", error);
                frames.send_replace(FrameStatus::Failed { generation, error });
            }
            Err(e) => {
                tracing::error!(generation, "Render task panicked: {}", e);
                frames.send_replace(FrameStatus::Failed {
                    generation,
                    error: RenderError::WorkerStopped,
                });
            }
        }
    }

    tracing::debug!("Render worker stopped");
}

fn render_job(
    job: RenderJob,
    generation: u64,
    settings: &RenderSettings,
    cancel: &CancelToken,
) -> Result<Frame, RenderError> {
    let mut rng = StdRng::seed_from_u64(job.seed);
    let mut canvas = Canvas::new(job.width, job.height);
    engine::render_with(&job.state, settings, &mut canvas, &mut rng, cancel)?;

    if cancel.is_cancelled() {
        return Err(RenderError::Superseded { generation });
    }
    Ok(Frame {
        generation,
        state: job.state,
        canvas,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fractals::escape_time::{render_escape_time_with, EscapeView};
    use crate::fractals::{Family, MandelbrotParams};
    use crate::surface::Recorder;

    fn job(family: Family, width: u32, height: u32) -> RenderJob {
        RenderJob {
            state: FractalState {
                family,
                ..Default::default()
            },
            width,
            height,
            seed: 1,
        }
    }

    #[test]
    fn test_cancel_token() {
        assert!(!CancelToken::never().is_cancelled());

        let latest = Arc::new(AtomicU64::new(3));
        let token = CancelToken::new(Arc::clone(&latest), 3);
        assert!(!token.is_cancelled());
        latest.store(4, Ordering::Release);
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_cancelled_escape_render_draws_nothing() {
        let latest = Arc::new(AtomicU64::new(2));
        let token = CancelToken::new(latest, 1);
        let mut rec = Recorder::new(16, 16);
        let view = EscapeView::from(&MandelbrotParams::default());
        let result = render_escape_time_with(&mut rec, &view, 50, &token);
        assert_eq!(result, Err(RenderError::Superseded { generation: 1 }));
        assert_eq!(rec.written_pixels(), 0);
    }

    #[tokio::test]
    async fn test_renders_submitted_job() {
        let worker = RenderWorker::spawn(RenderSettings::default());
        let generation = worker.submit(job(Family::Sierpinski, 64, 64));
        let frame = worker.wait_for(generation).await.unwrap();

        assert_eq!(frame.generation, generation);
        assert_eq!(frame.state.family, Family::Sierpinski);
        assert!(frame.canvas.painted_pixels() > 0);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_newer_request_wins() {
        let worker = RenderWorker::spawn(RenderSettings::default());

        let mut slow = job(Family::Mandelbrot, 600, 600);
        slow.state.mandelbrot = MandelbrotParams {
            zoom: 1e6,
            pan_x: 0.0,
            pan_y: 0.0,
        };
        worker.submit(slow);
        let latest = worker.submit(job(Family::Koch, 64, 64));

        let frame = worker.wait_for(latest).await.unwrap();
        assert_eq!(frame.generation, latest);
        assert_eq!(frame.state.family, Family::Koch);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_in_flight_render_is_abandoned() {
        let settings = RenderSettings {
            max_iter: 1000,
            ..Default::default()
        };
        let worker = RenderWorker::spawn(settings);
        let mut frames = worker.subscribe();

        // Every pixel is inside the set, so this runs the full iteration bound
        let mut slow = job(Family::Mandelbrot, 800, 800);
        slow.state.mandelbrot = MandelbrotParams {
            zoom: 1e6,
            pan_x: 0.0,
            pan_y: 0.0,
        };
        let first = worker.submit(slow);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let second = worker.submit(job(Family::Koch, 64, 64));

        let collect = async {
            let mut seen = Vec::new();
            loop {
                frames.changed().await.unwrap();
                let status = frames.borrow_and_update().clone();
                match status {
                    FrameStatus::Ready(frame) => {
                        seen.push(frame.generation);
                        if frame.generation == second {
                            return seen;
                        }
                    }
                    other => panic!("unexpected status: {:?}", other),
                }
            }
        };
        let seen = tokio::time::timeout(std::time::Duration::from_secs(60), collect)
            .await
            .unwrap();

        assert!(!seen.contains(&first));
        assert_eq!(seen, vec![second]);
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_job_reports_error() {
        let worker = RenderWorker::spawn(RenderSettings::default());
        let generation = worker.submit(job(Family::Julia, 0, 64));
        let result = worker.wait_for(generation).await;
        assert_eq!(
            result.map(|f| f.generation),
            Err(RenderError::InvalidSurface {
                width: 0,
                height: 64
            })
        );
        worker.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscriber_sees_frames() {
        let worker = RenderWorker::spawn(RenderSettings::default());
        let mut frames = worker.subscribe();
        let generation = worker.submit(job(Family::LSystem, 48, 48));

        frames.changed().await.unwrap();
        let status = frames.borrow().clone();
        match status {
            FrameStatus::Ready(frame) => assert_eq!(frame.generation, generation),
            other => panic!("unexpected status: {:?}", other),
        }
        worker.shutdown().await;
    }
}
