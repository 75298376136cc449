use thiserror::Error;

/// Recoverable failures surfaced by triangulation, batching, and atlas
/// packing. Nothing here is fatal — per-entry failures are skipped by the
/// caller, matching the degenerate-geometry policy upstream of this crate.
#[derive(Debug, Error)]
pub enum GpuError {
  #[error("polygon has fewer than 3 vertices after flattening")]
  DegenerateGeometry,

  #[error("triangulation failed: {0}")]
  TriangulationFailed(#[from] lyon_tessellation::TessellationError),

  #[error("image ({width}x{height}) exceeds the atlas's maximum texture size")]
  ImageTooLargeForAtlas { width: u32, height: u32 },

  #[error("texture atlas is full and cannot grow further")]
  AtlasOutOfSpace,

  #[error("vertex buffer overflowed {limit} vertices in a single frame")]
  VertexBudgetExceeded { limit: u32 },
}
