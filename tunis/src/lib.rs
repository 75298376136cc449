//! The Canvas-style surface that sits on top of `tunis_painter` and
//! `tunis_gpu`: configuration, the font repository, the image-decode task
//! queue, and the `Context` that ties a save/restore state stack and
//! render queue to the batcher and a GPU backend (SPEC_FULL.md §6, §10).

mod config;
mod context;
pub mod error;
pub mod font;
pub mod task_queue;

pub use config::Config;
pub use context::{stops, Context};
pub use error::Error;
pub use font::{Font, FontRepository, Glyph};
pub use task_queue::{ImageTask, ImageTaskQueue, ImageTaskSender, QueueFull};

pub use tunis_gpu::GpuBackend;
#[cfg(feature = "wgpu_backend")]
pub use tunis_gpu::wgpu_backend::WgpuBackend;
pub use tunis_painter::{
  Color, DrawOp, FillRule, FontDescriptor, GradientStop, ImageHandle, LineCap, LineJoin, Paint, RepeatMode,
};
