pub mod direct;
pub mod engine;
pub mod formula;
pub mod perturbation;
pub mod pyramid;
pub mod renderer;
pub mod row_dispatcher;

pub use direct::{compute_pixel_arbitrary, compute_pixel_direct, DIRECT_BAILOUT_SQ};
pub use engine::{EngineContext, PublishedLevel};
pub use formula::{DirectArbitraryConfig, DirectDoubleConfig, IterationFormula, PerturbationConfig};
pub use perturbation::{
    compute_pixel_perturbation, should_rebase, ReferenceOrbit, ORBIT_ESCAPE_RADIUS_SQ,
    PERTURBATION_BAILOUT_SQ,
};
pub use pyramid::DecimationPyramid;
pub use renderer::{FractalRenderer, PixelShader, RendererState, UNRENDERED};
pub use row_dispatcher::{RenderProgress, RowDispatcher, RowResult, RowSource};

// Re-export core types for convenience
pub use deepzoom_core::*;
