//! Iteration formula selection.
//!
//! A closed set of escape-time formulas, each carrying the per-frame data it
//! needs. Selected by `FormulaKind` from the engine config.

use crate::direct::{compute_pixel_arbitrary, compute_pixel_direct};
use crate::perturbation::{compute_pixel_perturbation, ReferenceOrbit};
use deepzoom_core::{EngineError, FormulaKind, Frame, PixelSample};
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct DirectDoubleConfig {
    pub center: (f64, f64),
    /// 1 / zoom
    pub sample_scale: f64,
    pub max_iterations: u32,
}

#[derive(Clone, Debug)]
pub struct DirectArbitraryConfig {
    pub frame: Arc<Frame>,
    pub max_iterations: u32,
}

#[derive(Clone, Debug)]
pub struct PerturbationConfig {
    /// Shared read-only by every worker of a render session.
    pub orbit: Arc<ReferenceOrbit>,
    /// 1 / zoom, so that δc = sample * sample_scale
    pub sample_scale: f64,
    pub max_iterations: u32,
    pub rebase: bool,
}

#[derive(Clone, Debug)]
pub enum IterationFormula {
    DirectDouble(DirectDoubleConfig),
    DirectArbitrary(DirectArbitraryConfig),
    Perturbation(PerturbationConfig),
}

impl IterationFormula {
    /// Prepare the formula `kind` for a frame.
    ///
    /// For perturbation this builds the reference orbit, the one expensive
    /// serial step of a frame. Call once per frame and clone the result.
    pub fn for_frame(
        kind: FormulaKind,
        frame: &Frame,
        max_iterations: u32,
        rebase: bool,
    ) -> Result<Self, EngineError> {
        frame.validate()?;
        let formula = match kind {
            FormulaKind::DirectDouble => IterationFormula::DirectDouble(DirectDoubleConfig {
                center: frame.center_f64(),
                sample_scale: frame.sample_scale(),
                max_iterations,
            }),
            FormulaKind::DirectArbitrary => {
                IterationFormula::DirectArbitrary(DirectArbitraryConfig {
                    frame: Arc::new(frame.clone()),
                    max_iterations,
                })
            }
            FormulaKind::Perturbation => {
                log::info!(
                    "Building reference orbit ({} iterations, {} bits)",
                    max_iterations,
                    frame.precision_bits()
                );
                let start = Instant::now();
                let orbit = ReferenceOrbit::build(frame, max_iterations)?;
                log::info!(
                    "Reference orbit: {} points in {:.1} ms (escaped at {:?})",
                    orbit.len(),
                    start.elapsed().as_secs_f64() * 1000.0,
                    orbit.escaped_at
                );
                Self::perturbation(frame, Arc::new(orbit), max_iterations, rebase)
            }
        };
        Ok(formula)
    }

    /// Perturbation formula over an already-built orbit.
    pub fn perturbation(
        frame: &Frame,
        orbit: Arc<ReferenceOrbit>,
        max_iterations: u32,
        rebase: bool,
    ) -> Self {
        IterationFormula::Perturbation(PerturbationConfig {
            orbit,
            sample_scale: frame.sample_scale(),
            max_iterations,
            rebase,
        })
    }

    pub fn kind(&self) -> FormulaKind {
        match self {
            IterationFormula::DirectDouble(_) => FormulaKind::DirectDouble,
            IterationFormula::DirectArbitrary(_) => FormulaKind::DirectArbitrary,
            IterationFormula::Perturbation(_) => FormulaKind::Perturbation,
        }
    }

    pub fn max_iterations(&self) -> u32 {
        match self {
            IterationFormula::DirectDouble(cfg) => cfg.max_iterations,
            IterationFormula::DirectArbitrary(cfg) => cfg.max_iterations,
            IterationFormula::Perturbation(cfg) => cfg.max_iterations,
        }
    }

    /// Escape time for one sample, or `SENTINEL_NO_ESCAPE`.
    pub fn evaluate(&self, sample: PixelSample) -> u32 {
        match self {
            IterationFormula::DirectDouble(cfg) => compute_pixel_direct(
                sample.re * cfg.sample_scale + cfg.center.0,
                sample.im * cfg.sample_scale + cfg.center.1,
                cfg.max_iterations,
            ),
            IterationFormula::DirectArbitrary(cfg) => {
                compute_pixel_arbitrary(&cfg.frame.sample_to_point(sample), cfg.max_iterations)
            }
            IterationFormula::Perturbation(cfg) => compute_pixel_perturbation(
                &cfg.orbit,
                (sample.re * cfg.sample_scale, sample.im * cfg.sample_scale),
                cfg.max_iterations,
                cfg.rebase,
            ),
        }
    }
}
