use thiserror::Error;

/// Failures surfaced synchronously to the host.
///
/// Everything else that can go wrong at runtime (stale acks, unknown status
/// codes, overlapping resizes) is absorbed inside the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    /// The host view or container could not be resolved to a drawable surface.
    #[error("invalid host surface: {0}")]
    InvalidHostSurface(String),

    #[error("invalid bridge config: {0}")]
    InvalidConfig(String),

    /// The renderer refused or failed to create its canvas.
    #[error("renderer creation failed: {0}")]
    RendererCreation(String),

    /// An earlier creation attempt failed; the view stays without a renderer.
    #[error("renderer creation already failed for this view")]
    CreationFailed,

    #[error("a renderer is already live for this view")]
    AlreadyCreated,

    /// The view was torn down; handles are never recreated.
    #[error("canvas host has been destroyed")]
    Destroyed,
}
