use thiserror::Error;

/// Top-level failures a host embedding `tunis` needs to distinguish
/// (SPEC_FULL.md §7/§10.A). Only [`Error::GpuInit`] is fatal in the sense
/// the original engine treats it — a host is still free to log it and
/// keep running rather than aborting, which is the one liberty this port
/// takes with §6's "init failure terminates the process".
#[derive(Debug, Error)]
pub enum Error {
  /// The GPU backend could not be brought up (no adapter, device request
  /// refused, surface incompatible). Fatal in the original; modeled here
  /// as a value so a host can choose how to fail.
  #[error("GPU backend initialization failed: {0}")]
  GpuInit(String),

  /// `fonts.tfp` could not be read or decoded. Non-fatal: text commands
  /// issued afterward silently no-op per §7.
  #[error("font repository could not be loaded: {0}")]
  FontRepository(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error(transparent)]
  Gpu(#[from] tunis_gpu::error::GpuError),
}
