use smallvec::SmallVec;
use tunis_geom::{Point, Transform};

/// Straight (non-premultiplied) 8-bit-per-channel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Color {
  pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0 };
  pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };

  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self { Self { r, g, b, a } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientStop {
  pub offset: f32,
  pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
  Repeat,
  RepeatX,
  RepeatY,
  NoRepeat,
}

/// An opaque handle to a decoded image, owned by whatever texture atlas
/// resolves it at submission time. Decoding itself is out of scope here.
pub type ImageHandle = tunis_algo::Resource;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearGradient {
  pub start: Point,
  pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialGradient {
  pub center: Point,
  pub focal: Point,
  pub inner_radius: f32,
  pub outer_radius: f32,
}

/// The source of color for a fill or stroke. Stop lists cap at 4 entries,
/// matching the uniform block budget the batcher packs them into.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
  Solid(Color),
  LinearGradient { gradient: LinearGradient, stops: SmallVec<[GradientStop; 4]> },
  RadialGradient { gradient: RadialGradient, stops: SmallVec<[GradientStop; 4]> },
  Image { image: ImageHandle, repeat: RepeatMode },
}

impl Default for Paint {
  fn default() -> Self { Paint::Solid(Color::BLACK) }
}

impl Paint {
  pub fn linear_gradient(start: Point, end: Point, stops: impl IntoIterator<Item = GradientStop>) -> Self {
    Paint::LinearGradient { gradient: LinearGradient { start, end }, stops: stops.into_iter().take(4).collect() }
  }

  pub fn radial_gradient(
    center: Point,
    focal: Point,
    inner_radius: f32,
    outer_radius: f32,
    stops: impl IntoIterator<Item = GradientStop>,
  ) -> Self {
    Paint::RadialGradient {
      gradient: RadialGradient { center, focal, inner_radius, outer_radius },
      stops: stops.into_iter().take(4).collect(),
    }
  }
}

use crate::stroke::{LineCap, LineJoin};

/// `family` is a [`CowArc<str>`](tunis_algo::CowArc) rather than a `String`
/// so that the common case — a `'static` family name literal like `"Sans"`
/// — doesn't allocate a fresh copy every time `save`/`restore` clones the
/// whole `ContextState` (SPEC_FULL.md §3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontDescriptor {
  pub family: tunis_algo::CowArc<str>,
  pub weight: u16,
  pub italic: bool,
  pub size: f32,
}

/// A per-`save`/`restore` snapshot of every drawing property, per
/// SPEC_FULL.md §3. Cloning is the entire implementation of `save`; the
/// state is treated as a value throughout.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextState {
  pub fill_style: Paint,
  pub stroke_style: Paint,
  pub line_width: f32,
  pub line_cap: LineCap,
  pub line_join: LineJoin,
  pub miter_limit: f32,
  pub line_dashes: Vec<f32>,
  pub line_dash_offset: f32,
  pub global_alpha: f32,
  pub shadow_color: Color,
  pub shadow_offset_x: f32,
  pub shadow_offset_y: f32,
  pub transform: Transform,
  pub font: Option<FontDescriptor>,
}

impl Default for ContextState {
  fn default() -> Self {
    Self {
      fill_style: Paint::Solid(Color::BLACK),
      stroke_style: Paint::Solid(Color::BLACK),
      line_width: 1.0,
      line_cap: LineCap::Butt,
      line_join: LineJoin::Miter,
      miter_limit: 10.0,
      line_dashes: Vec::new(),
      line_dash_offset: 0.0,
      global_alpha: 1.0,
      shadow_color: Color::TRANSPARENT,
      shadow_offset_x: 0.0,
      shadow_offset_y: 0.0,
      transform: Transform::identity(),
      font: None,
    }
  }
}

/// The `save`/`restore` stack (SPEC_FULL.md §4.G). `restore` on an empty
/// stack is a no-op, matching Canvas2D.
#[derive(Debug, Clone)]
pub struct StateStack {
  current: ContextState,
  stack: Vec<ContextState>,
}

impl Default for StateStack {
  fn default() -> Self { Self { current: ContextState::default(), stack: Vec::new() } }
}

impl StateStack {
  pub fn new() -> Self { Self::default() }

  pub fn current(&self) -> &ContextState { &self.current }

  pub fn current_mut(&mut self) -> &mut ContextState { &mut self.current }

  pub fn save(&mut self) { self.stack.push(self.current.clone()); }

  pub fn restore(&mut self) {
    if let Some(prev) = self.stack.pop() {
      self.current = prev;
    }
  }

  pub fn depth(&self) -> usize { self.stack.len() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn save_restore_round_trips_state() {
    let mut stack = StateStack::new();
    let before = stack.current().clone();
    stack.save();
    stack.current_mut().line_width = 42.0;
    stack.current_mut().fill_style = Paint::Solid(Color::new(1, 2, 3, 4));
    stack.restore();
    assert_eq!(stack.current(), &before);
  }

  #[test]
  fn restore_on_empty_stack_is_noop() {
    let mut stack = StateStack::new();
    stack.current_mut().line_width = 7.0;
    stack.restore();
    assert_eq!(stack.current().line_width, 7.0);
  }

  #[test]
  fn nested_save_restore_unwinds_in_order() {
    let mut stack = StateStack::new();
    stack.current_mut().global_alpha = 1.0;
    stack.save();
    stack.current_mut().global_alpha = 0.5;
    stack.save();
    stack.current_mut().global_alpha = 0.25;
    stack.restore();
    assert_eq!(stack.current().global_alpha, 0.5);
    stack.restore();
    assert_eq!(stack.current().global_alpha, 1.0);
  }
}
