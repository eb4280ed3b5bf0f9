//! Engine facade driven by the presentation layer.
//!
//! Owns everything a running engine needs: the frame, the prepared formula
//! (including the reference orbit) and the decimation pyramid. Nothing here
//! is global; callers hold an `EngineContext` and pass it around.

use crate::formula::IterationFormula;
use crate::pyramid::DecimationPyramid;
use crate::row_dispatcher::RenderProgress;
use deepzoom_core::{EngineConfig, EngineError, Frame, PixelBuffer};

/// One drawable layer returned by `EngineContext::poll`.
#[derive(Clone, Copy, Debug)]
pub struct PublishedLevel<'a> {
    pub level: u32,
    pub image: &'a PixelBuffer,
    /// False for the level still being rendered (partial snapshot).
    pub done: bool,
}

pub struct EngineContext {
    config: EngineConfig,
    frame: Frame,
    thread_count: u32,
    formula: IterationFormula,
    pyramid: DecimationPyramid,
    viewport: Option<(u32, u32)>,
}

impl EngineContext {
    /// Engine with default settings apart from the cap and worker count.
    pub fn configure(frame: Frame, iteration_cap: u32, thread_count: u32) -> Result<Self, EngineError> {
        let config = EngineConfig {
            iteration_cap,
            thread_count,
            ..EngineConfig::default()
        };
        Self::with_config(frame, config)
    }

    pub fn with_config(frame: Frame, config: EngineConfig) -> Result<Self, EngineError> {
        let thread_count = config.resolved_thread_count(num_cpus::get());
        log::info!(
            "Engine: {:?} formula, cap {}, {} workers, {} levels",
            config.formula,
            config.iteration_cap,
            thread_count,
            config.level_count()
        );
        let formula =
            IterationFormula::for_frame(config.formula, &frame, config.iteration_cap, config.rebase)?;
        let pyramid = DecimationPyramid::from_config(&config, thread_count);
        Ok(Self {
            config,
            frame,
            thread_count,
            formula,
            pyramid,
            viewport: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn thread_count(&self) -> u32 {
        self.thread_count
    }

    pub fn viewport(&self) -> Option<(u32, u32)> {
        self.viewport
    }

    /// Restart the pyramid for a new canvas size. Unchanged sizes are ignored.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) -> Result<(), EngineError> {
        if self.viewport == Some((width, height)) {
            return Ok(());
        }
        log::debug!("Viewport resized to {}x{}", width, height);
        self.viewport = Some((width, height));
        self.pyramid
            .on_viewport_change(width, height, self.formula.clone())
    }

    /// Move to a new frame: rebuild the formula and restart the pyramid at the
    /// current viewport size.
    ///
    /// An invalid frame is rejected and the current render keeps going.
    pub fn set_frame(&mut self, frame: Frame) -> Result<(), EngineError> {
        let formula = IterationFormula::for_frame(
            self.config.formula,
            &frame,
            self.config.iteration_cap,
            self.config.rebase,
        )?;
        self.pyramid.cancel();
        self.formula = formula;
        self.frame = frame;
        match self.viewport {
            Some((width, height)) => {
                self.pyramid
                    .on_viewport_change(width, height, self.formula.clone())
            }
            None => Ok(()),
        }
    }

    /// Advance rendering and list every drawable layer, coarsest first.
    ///
    /// Published levels come with `done = true`; the level in flight, if any,
    /// is appended last as a partial image.
    pub fn poll(&mut self) -> Result<Vec<PublishedLevel<'_>>, EngineError> {
        self.pyramid.update()?;

        let mut layers: Vec<PublishedLevel<'_>> = self
            .pyramid
            .published_levels()
            .map(|(level, image)| PublishedLevel {
                level: level as u32,
                image,
                done: true,
            })
            .collect();
        if let Some((level, image)) = self.pyramid.in_flight() {
            layers.push(PublishedLevel {
                level: level as u32,
                image,
                done: false,
            });
        }
        Ok(layers)
    }

    /// Progress of the level currently rendering.
    pub fn progress(&self) -> RenderProgress {
        self.pyramid.level_progress()
    }

    pub fn current_level(&self) -> usize {
        self.pyramid.current_level()
    }

    /// True once the finest level is published.
    pub fn is_complete(&self) -> bool {
        self.pyramid.is_complete()
    }

    /// Cancel any active render and release every image.
    ///
    /// The next `on_viewport_resized` starts from scratch.
    pub fn shutdown(&mut self) {
        self.pyramid.cancel();
        self.pyramid = DecimationPyramid::from_config(&self.config, self.thread_count);
        self.viewport = None;
        log::info!("Engine shut down");
    }
}
