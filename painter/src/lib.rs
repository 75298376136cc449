//! Path construction, flattening, stroke expansion, and the paint/state
//! model and render queue that feed the triangulator and batcher in
//! `tunis_gpu`.

mod flatten;
mod geometry;
mod paint;
mod path;
mod queue;
mod stroke;

pub use flatten::{FlatPoint, FlattenConfig, Flattener, PointProperties, SubPath};
pub use paint::{
  Color, ContextState, FontDescriptor, GradientStop, ImageHandle, LinearGradient, Paint, RadialGradient,
  RepeatMode, StateStack,
};
pub use path::{Path, PathCommand};
pub use queue::{DrawOp, FillRule, RenderQueue, RenderQueueEntry};
pub use stroke::{expand_stroke, LineCap, LineJoin, StrokeContour, StrokeStyle};
