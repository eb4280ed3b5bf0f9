//! Progressive coarse-to-fine rendering.
//!
//! Level 0 is the finest tier. After a viewport change the coarsest level is
//! rendered first and each finished level is published before the next finer
//! one starts, so a usable image is on screen almost immediately.

use crate::formula::IterationFormula;
use crate::renderer::{FractalRenderer, RendererState};
use crate::row_dispatcher::RenderProgress;
use deepzoom_core::{ColorMapper, EngineConfig, EngineError, PixelBuffer};

pub struct DecimationPyramid {
    /// Published images, indexed finest (0) to coarsest.
    levels: Vec<Option<PixelBuffer>>,
    decimation_factor: f64,
    base_pixel_scale: f64,
    current_level: usize,
    viewport: (u32, u32),
    formula: Option<IterationFormula>,
    palette: ColorMapper,
    renderer: FractalRenderer,
}

impl DecimationPyramid {
    pub fn new(
        level_count: usize,
        decimation_factor: f64,
        base_pixel_scale: f64,
        thread_count: u32,
        palette: ColorMapper,
    ) -> Self {
        let level_count = level_count.max(1);
        Self {
            levels: (0..level_count).map(|_| None).collect(),
            decimation_factor: sanitize(decimation_factor),
            base_pixel_scale: sanitize(base_pixel_scale),
            current_level: level_count - 1,
            viewport: (0, 0),
            formula: None,
            palette,
            renderer: FractalRenderer::new(thread_count),
        }
    }

    pub fn from_config(config: &EngineConfig, thread_count: u32) -> Self {
        Self::new(
            config.level_count(),
            config.decimation_factor,
            config.base_pixel_scale,
            thread_count,
            config.palette,
        )
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// `base_pixel_scale / decimation_factor^level`
    pub fn level_scale(&self, level: usize) -> f64 {
        self.base_pixel_scale / self.decimation_factor.powi(level as i32)
    }

    /// Image size of `level` for the current viewport.
    pub fn level_size(&self, level: usize) -> (u32, u32) {
        let divisor = self.decimation_factor.powi(level as i32);
        let (width, height) = self.viewport;
        let scaled = |extent: u32| (extent as f64 * self.base_pixel_scale / divisor).ceil() as u32;
        (scaled(width), scaled(height))
    }

    /// Throw away every level and restart at the coarsest one.
    pub fn on_viewport_change(
        &mut self,
        width: u32,
        height: u32,
        formula: IterationFormula,
    ) -> Result<(), EngineError> {
        self.renderer.cancel();
        self.levels.iter_mut().for_each(|level| *level = None);
        self.viewport = (width, height);
        self.formula = Some(formula);
        self.current_level = self.levels.len() - 1;
        self.start_current_level()
    }

    /// Advance the active session; publish it and move one level finer when
    /// it finishes.
    pub fn update(&mut self) -> Result<(), EngineError> {
        if self.renderer.update()? != RendererState::Finished {
            return Ok(());
        }
        if let Some(image) = self.renderer.take_result() {
            log::info!(
                "Published level {} ({}x{})",
                self.current_level,
                image.width(),
                image.height()
            );
            self.levels[self.current_level] = Some(image);
        }
        if self.current_level > 0 {
            self.current_level -= 1;
            self.start_current_level()?;
        }
        Ok(())
    }

    /// Finished images, coarsest first (draw order).
    pub fn published_levels(&self) -> impl Iterator<Item = (usize, &PixelBuffer)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(level, image)| image.as_ref().map(|image| (level, image)))
    }

    /// The level being rendered and its partial image.
    pub fn in_flight(&self) -> Option<(usize, &PixelBuffer)> {
        if self.renderer.state() != RendererState::Rendering {
            return None;
        }
        self.renderer.image().map(|image| (self.current_level, image))
    }

    pub fn level_progress(&self) -> RenderProgress {
        self.renderer.poll_progress()
    }

    /// True once the finest level is published.
    pub fn is_complete(&self) -> bool {
        self.current_level == 0 && self.levels[0].is_some()
    }

    /// Stop the active session. Published levels stay.
    pub fn cancel(&mut self) {
        self.renderer.cancel();
    }

    fn start_current_level(&mut self) -> Result<(), EngineError> {
        let Some(formula) = self.formula.clone() else {
            return Ok(());
        };
        let (width, height) = self.level_size(self.current_level);
        log::info!(
            "Starting level {} at {}x{} (scale {:.4})",
            self.current_level,
            width,
            height,
            self.level_scale(self.current_level)
        );
        self.renderer
            .start_render(width, height, formula, self.palette)
    }
}

fn sanitize(factor: f64) -> f64 {
    if factor.is_finite() && factor > 0.0 {
        factor
    } else {
        1.0
    }
}
