//! Engine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse coordinate: {0}")]
    Parse(String),

    #[error("Failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: usize },

    #[error("Invalid frame: {0}")]
    Frame(String),

    #[error("A render is already in progress")]
    AlreadyRendering,

    #[error("Invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Render worker panicked")]
    WorkerPanicked,

    #[error("Failed to spawn render worker: {0}")]
    Spawn(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the engine can keep going after this error.
    ///
    /// Allocation failures and lost workers leave no usable buffers behind.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Allocation { .. } | EngineError::WorkerPanicked | EngineError::Spawn(_)
        )
    }
}

/// Reserve exactly `len` elements, reporting allocation failure instead of aborting.
pub fn try_alloc_vec<T>(len: usize, what: &'static str) -> Result<Vec<T>, EngineError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len)
        .map_err(|_| EngineError::Allocation {
            what,
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    Ok(vec)
}
