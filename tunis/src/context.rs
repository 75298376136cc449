use smallvec::SmallVec;
use tunis_geom::Point;
use tunis_gpu::{Batcher, GpuBackend, TextureAtlas};
use tunis_painter::{
  Color, DrawOp, FillRule, FontDescriptor, GradientStop, ImageHandle, LineCap, LineJoin, Paint, Path,
  RenderQueue, RepeatMode, StateStack,
};

use crate::config::Config;
use crate::font::FontRepository;
use crate::task_queue::ImageTaskQueue;

/// Ties the painter model (path, state, render queue) to the batching
/// and GPU submission pipeline (SPEC_FULL.md §6). One `Context` per
/// rendering surface; `beginFrame`/`endFrame` bracket a frame exactly
/// like the Canvas2D methods they're named after.
pub struct Context {
  state: StateStack,
  path: Path,
  queue: RenderQueue,
  batcher: Batcher,
  atlas: TextureAtlas,
  task_queue: ImageTaskQueue,
  fonts: Option<FontRepository>,
  config: Config,
  viewport: (f32, f32),
}

/// Initial atlas size; it grows on demand up to `config.max_texture_size`
/// (SPEC_FULL.md §4.I).
const INITIAL_ATLAS_SIZE: u32 = 256;

impl Context {
  pub fn new(config: Config) -> Self {
    let mut batcher = Batcher::new(config.max_texture_size);
    batcher.set_flatten_config(config.flatten_config());
    Self {
      state: StateStack::new(),
      path: Path::new(),
      queue: RenderQueue::new(),
      batcher,
      atlas: TextureAtlas::new(INITIAL_ATLAS_SIZE, config.max_texture_size),
      task_queue: ImageTaskQueue::new(),
      fonts: None,
      config,
      viewport: (0.0, 0.0),
    }
  }

  /// Loads `fonts.tfp` (SPEC_FULL.md §6, §10.D). A load failure is
  /// non-fatal per §7: the context keeps running with no fonts, and
  /// subsequent `fillText`/`strokeText` calls log and no-op. The `Error`
  /// is still returned so a caller that cares can observe it; one that
  /// doesn't may discard it (`let _ = ...`) and rely on the warning log.
  pub fn load_font_repository(&mut self, bytes: &[u8]) -> Result<(), crate::Error> {
    match FontRepository::load(bytes) {
      Ok(repo) => {
        self.fonts = Some(repo);
        Ok(())
      }
      Err(err) => {
        tracing::warn!(%err, "font repository failed to load; text commands will no-op");
        Err(crate::Error::FontRepository(Box::new(err)))
      }
    }
  }

  pub fn task_sender(&self) -> crate::task_queue::ImageTaskSender { self.task_queue.sender() }

  pub fn config(&self) -> &Config { &self.config }

  // -- frame lifecycle -----------------------------------------------

  pub fn begin_frame(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
    self.viewport = (width, height);
    self.config.device_pixel_ratio = device_pixel_ratio;
    self.batcher.set_flatten_config(self.config.flatten_config());
  }

  /// Runs the image-decode task queue (§4.I, §5), then drains the render
  /// queue through the batcher and submits it to `backend`. Returns the
  /// number of entries the batcher dropped as degenerate, for a caller
  /// that wants to surface it.
  pub fn end_frame<B: GpuBackend>(&mut self, backend: &mut B) -> usize {
    for task in self.task_queue.drain() {
      task(self);
    }

    let entries = self.queue.drain();
    let entry_count = entries.len();
    let dropped = self.batcher.end_frame(entries, self.viewport, &mut self.atlas, backend);
    self.atlas.end_frame();
    tracing::trace!(entry_count, batches = self.batcher.batches().len(), dropped, "frame submitted");
    dropped
  }

  /// Queues an opaque fill of `(l, t, w, h)` with `bg` ahead of anything
  /// else drawn this frame. Bypasses the current path/state entirely, the
  /// same way the Canvas2D method it's named after clears independent of
  /// the active path.
  pub fn clear_frame(&mut self, l: f32, t: f32, w: f32, h: f32, bg: Color) {
    let mut path = Path::new();
    path.rect(l, t, w, h);
    let mut state = tunis_painter::ContextState::default();
    state.fill_style = Paint::Solid(bg);
    self.queue.push(DrawOp::Fill(FillRule::NonZero), path, state);
  }

  // -- save / restore --------------------------------------------------

  pub fn save(&mut self) { self.state.save(); }

  pub fn restore(&mut self) { self.state.restore(); }

  // -- path construction (SPEC_FULL.md §4.A) ---------------------------

  pub fn begin_path(&mut self) { self.path.reset(); }

  pub fn close_path(&mut self) { self.path.close_path(); }

  pub fn move_to(&mut self, x: f32, y: f32) { self.path.move_to(x, y); }

  pub fn line_to(&mut self, x: f32, y: f32) { self.path.line_to(x, y); }

  pub fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) { self.path.bezier_curve_to(c1, c2, p); }

  pub fn quadratic_curve_to(&mut self, cp: Point, p: Point) { self.path.quadratic_curve_to(cp, p); }

  pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, ccw: bool) { self.path.arc(cx, cy, r, a0, a1, ccw); }

  pub fn arc_to(&mut self, p1: Point, p2: Point, r: f32) { self.path.arc_to(p1, p2, r); }

  #[allow(clippy::too_many_arguments)]
  pub fn ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32, a0: f32, a1: f32, ccw: bool) {
    self.path.ellipse(cx, cy, rx, ry, rotation, a0, a1, ccw);
  }

  pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) { self.path.rect(x, y, w, h); }

  // -- drawing (SPEC_FULL.md §3 Path lifecycle, §4.E) -------------------

  /// Enqueues the current path for filling, then resets it — per §3, a
  /// clone is pushed onto the render queue and the live path returns to
  /// empty, matching `beginPath()` + redrawing the Canvas2D way.
  pub fn fill(&mut self, rule: FillRule) {
    if self.path.is_empty() {
      self.path.reset();
      return;
    }
    self.queue.push(DrawOp::Fill(rule), self.path.clone(), self.state.current().clone());
    self.path.reset();
  }

  pub fn stroke(&mut self) {
    if self.path.is_empty() {
      self.path.reset();
      return;
    }
    self.queue.push(DrawOp::Stroke, self.path.clone(), self.state.current().clone());
    self.path.reset();
  }

  /// Fills `(x,y,w,h)` without touching the current path, as Canvas2D's
  /// `fillRect` does.
  pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
    let mut rect_path = Path::new();
    rect_path.rect(x, y, w, h);
    self.queue.push(DrawOp::Fill(FillRule::NonZero), rect_path, self.state.current().clone());
  }

  pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
    let mut rect_path = Path::new();
    rect_path.rect(x, y, w, h);
    self.queue.push(DrawOp::Stroke, rect_path, self.state.current().clone());
  }

  /// Queues a transparent fill over `(x,y,w,h)`. With the GPU contract's
  /// fixed `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blend state (§4.H) this has
  /// no visible effect against an opaque framebuffer — a true destructive
  /// clear needs a backend-level scissor-and-clear operation, which is
  /// out of scope per §1's "clipping beyond viewport" non-goal.
  pub fn clear_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
    let mut rect_path = Path::new();
    rect_path.rect(x, y, w, h);
    let mut state = self.state.current().clone();
    state.fill_style = Paint::Solid(Color::TRANSPARENT);
    state.global_alpha = 1.0;
    self.queue.push(DrawOp::Fill(FillRule::NonZero), rect_path, state);
  }

  /// Text rendering is a no-op stub per §9's open question: glyph lookup
  /// runs (and is logged if it misses) but no glyph geometry is produced
  /// or enqueued, since this crate never rasterizes glyphs into the
  /// atlas. `max_width` is accepted for interface parity and unused.
  pub fn fill_text(&mut self, text: &str, _x: f32, _y: f32, _max_width: Option<f32>) { self.lookup_font_for(text); }

  pub fn stroke_text(&mut self, text: &str, _x: f32, _y: f32, _max_width: Option<f32>) { self.lookup_font_for(text); }

  fn lookup_font_for(&self, text: &str) {
    if text.is_empty() {
      return;
    }
    let Some(font) = self.state.current().font.as_ref() else {
      tracing::warn!("fillText/strokeText called with no font set; no-op");
      return;
    };
    let Some(repo) = self.fonts.as_ref() else {
      tracing::warn!("no font repository loaded; text commands no-op");
      return;
    };
    if repo.lookup(&font.family, font.weight, font.italic).is_none() {
      tracing::warn!(family = %font.family, weight = font.weight, "no matching font; text commands no-op");
    }
  }

  // -- property setters (SPEC_FULL.md §6) -------------------------------

  pub fn set_fill_style(&mut self, paint: Paint) { self.state.current_mut().fill_style = paint; }

  pub fn set_stroke_style(&mut self, paint: Paint) { self.state.current_mut().stroke_style = paint; }

  pub fn set_line_width(&mut self, width: f32) { self.state.current_mut().line_width = width; }

  pub fn set_line_cap(&mut self, cap: LineCap) { self.state.current_mut().line_cap = cap; }

  pub fn set_line_join(&mut self, join: LineJoin) { self.state.current_mut().line_join = join; }

  pub fn set_miter_limit(&mut self, limit: f32) { self.state.current_mut().miter_limit = limit; }

  pub fn set_line_dash_offset(&mut self, offset: f32) { self.state.current_mut().line_dash_offset = offset; }

  /// The raw dash sequence, stored as given; an odd-length sequence is
  /// doubled by the stroke expander itself (§4.C Step 2), not here.
  pub fn set_line_dash(&mut self, dashes: &[f32]) { self.state.current_mut().line_dashes = dashes.to_vec(); }

  pub fn set_global_alpha(&mut self, alpha: f32) { self.state.current_mut().global_alpha = alpha.clamp(0.0, 1.0); }

  pub fn set_shadow_color(&mut self, color: Color) { self.state.current_mut().shadow_color = color; }

  pub fn set_shadow_offset(&mut self, x: f32, y: f32) {
    self.state.current_mut().shadow_offset_x = x;
    self.state.current_mut().shadow_offset_y = y;
  }

  pub fn set_font(&mut self, font: FontDescriptor) { self.state.current_mut().font = Some(font); }

  pub fn state(&self) -> &tunis_painter::ContextState { self.state.current() }

  // -- paint constructors (SPEC_FULL.md §6) -----------------------------

  pub fn create_linear_gradient(
    &self,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    stops: impl IntoIterator<Item = GradientStop>,
  ) -> Paint {
    Paint::linear_gradient(Point::new(x0, y0), Point::new(x1, y1), stops)
  }

  #[allow(clippy::too_many_arguments)]
  pub fn create_radial_gradient(
    &self,
    x0: f32,
    y0: f32,
    r0: f32,
    x1: f32,
    y1: f32,
    r1: f32,
    stops: impl IntoIterator<Item = GradientStop>,
  ) -> Paint {
    Paint::radial_gradient(Point::new(x0, y0), Point::new(x1, y1), r0, r1, stops)
  }

  pub fn create_pattern(&self, image: ImageHandle, repeat: RepeatMode) -> Paint { Paint::Image { image, repeat } }
}

/// Convenience for building a 4-stop-capped gradient stop list inline.
pub fn stops(pairs: impl IntoIterator<Item = (f32, Color)>) -> SmallVec<[GradientStop; 4]> {
  pairs.into_iter().take(4).map(|(offset, color)| GradientStop { offset, color }).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use tunis_gpu::{BatchPaint, ShaderKind};

  struct NullBackend;
  impl GpuBackend for NullBackend {
    fn upload_vertices(&mut self, _shader: ShaderKind, _bytes: &[u8]) {}
    fn upload_indices(&mut self, _shader: ShaderKind, _indices: &[u16]) {}
    fn bind_shader(&mut self, _shader: ShaderKind) {}
    fn bind_texture(&mut self, _atlas: &mut TextureAtlas) {}
    fn set_uniforms(&mut self, _viewport: (f32, f32), _paint: &BatchPaint) {}
    fn draw_indexed(&mut self, _offset: u32, _count: u32) {}
  }

  #[test]
  fn begin_path_then_fill_produces_no_draw_calls() {
    let mut ctx = Context::new(Config::from_defaults());
    ctx.begin_frame(800.0, 600.0, 1.0);
    ctx.begin_path();
    ctx.fill(FillRule::NonZero);
    let dropped = ctx.end_frame(&mut NullBackend);
    assert_eq!(dropped, 0);
  }

  #[test]
  fn save_restore_round_trips_through_the_context() {
    let mut ctx = Context::new(Config::from_defaults());
    let before = ctx.state().clone();
    ctx.save();
    ctx.set_line_width(99.0);
    ctx.restore();
    assert_eq!(ctx.state(), &before);
  }

  #[test]
  fn fill_rect_enqueues_without_touching_the_live_path() {
    let mut ctx = Context::new(Config::from_defaults());
    ctx.move_to(0.0, 0.0);
    ctx.fill_rect(0.0, 0.0, 10.0, 10.0);
    assert!(!ctx.path.is_empty());
  }

  #[test]
  fn fill_clones_and_resets_the_live_path() {
    let mut ctx = Context::new(Config::from_defaults());
    ctx.move_to(0.0, 0.0);
    ctx.line_to(10.0, 10.0);
    ctx.fill(FillRule::NonZero);
    assert!(ctx.path.is_empty());
    assert_eq!(ctx.queue.len(), 1);
  }
}
