//! Single-resolution render session state machine.

use crate::formula::IterationFormula;
use crate::row_dispatcher::{RenderProgress, RowDispatcher, RowSource};
use deepzoom_core::{ColorMapper, EngineError, PixelBuffer, PixelSample, Rgba, BYTES_PER_PIXEL};
use std::time::Instant;

/// Fill for pixels no worker has written yet. Transparent so coarser layers
/// drawn underneath stay visible through a partial image.
pub const UNRENDERED: Rgba = [0, 0, 0, 0];

/// Evaluates a formula per pixel and colors the result.
pub struct PixelShader {
    pub formula: IterationFormula,
    pub palette: ColorMapper,
}

impl RowSource for PixelShader {
    fn render_row(&self, y: u32, width: u32, height: u32, out: &mut [u8]) {
        for (x, px) in out.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let sample = PixelSample::from_pixel(x as u32, y, width, height);
            let iterations = self.formula.evaluate(sample);
            px.copy_from_slice(&self.palette.color(iterations));
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererState {
    Idle,
    Rendering,
    Finished,
}

/// Wraps at most one `RowDispatcher` session.
///
/// `Idle -> Rendering` on start, `Rendering -> Finished` once every worker has
/// made its final claim, `Rendering -> Idle` on cancel, and `Finished -> Idle`
/// when the owner resets or takes the result.
pub struct FractalRenderer {
    thread_count: u32,
    state: RendererState,
    session: Option<RowDispatcher<PixelShader>>,
    image: Option<PixelBuffer>,
    started_at: Option<Instant>,
}

impl FractalRenderer {
    pub fn new(thread_count: u32) -> Self {
        Self {
            thread_count: thread_count.max(1),
            state: RendererState::Idle,
            session: None,
            image: None,
            started_at: None,
        }
    }

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn thread_count(&self) -> u32 {
        self.thread_count
    }

    /// Begin rendering a `width x height` image.
    ///
    /// Fails with `AlreadyRendering` while a session is active; that session is
    /// left running. A finished result that was never taken is discarded.
    pub fn start_render(
        &mut self,
        width: u32,
        height: u32,
        formula: IterationFormula,
        palette: ColorMapper,
    ) -> Result<(), EngineError> {
        if self.state == RendererState::Rendering {
            log::warn!("start_render({}x{}) ignored: already rendering", width, height);
            return Err(EngineError::AlreadyRendering);
        }

        let image = PixelBuffer::new(width, height, UNRENDERED)?;
        let shader = PixelShader { formula, palette };
        let session = RowDispatcher::start(shader, width, height, self.thread_count)?;

        self.image = Some(image);
        self.session = Some(session);
        self.started_at = Some(Instant::now());
        self.state = RendererState::Rendering;
        Ok(())
    }

    pub fn poll_progress(&self) -> RenderProgress {
        match (&self.state, &self.session) {
            (RendererState::Rendering, Some(session)) => session.progress(),
            (RendererState::Finished, _) => RenderProgress {
                done: true,
                progress: 1.0,
            },
            _ => RenderProgress::IDLE,
        }
    }

    /// Collect finished rows and advance the state machine.
    ///
    /// Call periodically. A worker panic tears the session down and is
    /// returned once as `WorkerPanicked`.
    pub fn update(&mut self) -> Result<RendererState, EngineError> {
        if self.state != RendererState::Rendering {
            return Ok(self.state);
        }
        let (Some(session), Some(image)) = (self.session.as_mut(), self.image.as_mut()) else {
            self.state = RendererState::Idle;
            return Ok(self.state);
        };

        session.drain_into(image);

        // Sample exit status before completion: a worker exits only after its
        // final claim, so exited && !done means one died mid-row.
        let exited = session.workers_exited();
        if session.is_done() {
            session.join()?;
            session.drain_into(image);
            self.session = None;
            self.state = RendererState::Finished;
            if let Some(started_at) = self.started_at.take() {
                log::info!(
                    "Rendered {}x{} in {:.1} ms",
                    image.width(),
                    image.height(),
                    started_at.elapsed().as_secs_f64() * 1000.0
                );
            }
        } else if exited {
            let result = session.join();
            self.discard();
            result?;
            return Err(EngineError::WorkerPanicked);
        }

        Ok(self.state)
    }

    /// Stop the active session, join its workers and drop its image.
    ///
    /// No-op unless rendering.
    pub fn cancel(&mut self) {
        if self.state != RendererState::Rendering {
            return;
        }
        if let Some(session) = self.session.as_mut() {
            let claimed = session.cancel();
            if let Err(e) = session.join() {
                log::warn!("Cancelled render ended with error: {}", e);
            }
            log::debug!("Render cancelled after {} rows", claimed);
        }
        self.discard();
    }

    /// Current image: complete when finished, a partial snapshot while
    /// rendering, `None` when idle.
    pub fn get_result_image(&mut self) -> Result<Option<&PixelBuffer>, EngineError> {
        self.update()?;
        Ok(self.image())
    }

    /// Like `get_result_image` without advancing the state machine.
    pub fn image(&self) -> Option<&PixelBuffer> {
        match self.state {
            RendererState::Idle => None,
            RendererState::Rendering | RendererState::Finished => self.image.as_ref(),
        }
    }

    /// `Finished -> Idle`, dropping the result.
    pub fn reset(&mut self) {
        if self.state == RendererState::Finished {
            self.discard();
        }
    }

    /// `Finished -> Idle`, handing the result to the caller.
    pub fn take_result(&mut self) -> Option<PixelBuffer> {
        if self.state != RendererState::Finished {
            return None;
        }
        let image = self.image.take();
        self.discard();
        image
    }

    fn discard(&mut self) {
        self.session = None;
        self.image = None;
        self.started_at = None;
        self.state = RendererState::Idle;
    }
}

impl Drop for FractalRenderer {
    fn drop(&mut self) {
        self.cancel();
    }
}
