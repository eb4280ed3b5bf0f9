//! Engine configuration.
//!
//! Holds the knobs the presentation layer hands to the engine at startup.
//! Loaded from JSON or taken from the `DEFAULT_ENGINE_CONFIG` preset.

use crate::{ColorMapper, EngineError};
use serde::{Deserialize, Serialize};

/// Which iteration formula evaluates pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// Plain f64 escape time. Only valid while f64 can resolve adjacent pixels.
    DirectDouble,
    /// Escape time in BigFloat at the frame precision. For validation only.
    DirectArbitrary,
    /// f64 deltas against an arbitrary-precision reference orbit.
    #[default]
    Perturbation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum iterations per pixel, also the reference orbit length cap.
    pub iteration_cap: u32,
    /// Worker threads per render session. 0 = one per logical CPU.
    pub thread_count: u32,
    pub formula: FormulaKind,
    /// Rebase perturbation deltas onto the reference start when they outgrow
    /// the true orbit. Off by default; it visibly worsens some frames.
    pub rebase: bool,
    /// Number of resolution tiers in the progressive pyramid.
    pub decimation_levels: u32,
    /// Resolution ratio between consecutive tiers.
    pub decimation_factor: f64,
    /// Pixel scale of the finest tier relative to the viewport.
    pub base_pixel_scale: f64,
    pub palette: ColorMapper,
}

/// Default engine configuration.
pub static DEFAULT_ENGINE_CONFIG: EngineConfig = EngineConfig {
    iteration_cap: 10_000,
    thread_count: 0,
    formula: FormulaKind::Perturbation,
    rebase: false,
    decimation_levels: 3,
    decimation_factor: 3.0,
    base_pixel_scale: 1.0,
    palette: ColorMapper::HueCycle {
        degrees_per_iteration: 36,
    },
};

impl Default for EngineConfig {
    fn default() -> Self {
        DEFAULT_ENGINE_CONFIG.clone()
    }
}

impl EngineConfig {
    /// Parse a JSON config document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Worker count with the 0 = auto rule resolved.
    pub fn resolved_thread_count(&self, available: usize) -> u32 {
        if self.thread_count == 0 {
            available.max(1) as u32
        } else {
            self.thread_count
        }
    }

    /// Pyramid depth, at least one tier.
    pub fn level_count(&self) -> usize {
        self.decimation_levels.max(1) as usize
    }
}
