//! Triangulation, batching, and the GPU submission contract (SPEC_FULL.md
//! §4.D, §4.F, §4.H). Ties `tunis_painter`'s path/stroke/paint model to an
//! indexed-triangle-batch output a generic hardware rasterizer can consume.

pub mod atlas;
pub mod error;
pub mod triangulator;

#[cfg(feature = "wgpu_backend")]
pub mod wgpu_backend;

use rayon::prelude::*;
use tunis_geom::{Point, Transform};
use tunis_painter::{Color, ContextState, DrawOp, ImageHandle, Paint, RenderQueueEntry, RepeatMode, StrokeStyle};

pub use atlas::TextureAtlas;
use error::GpuError;
use triangulator::Triangulation;

/// `pixelWidth` (SPEC_FULL.md §4.F / GLOSSARY): the 16-bit fixed-point
/// quantum of atlas coordinates, `0xFFFF / maxTextureSize`.
pub fn pixel_width(max_texture_size: u32) -> f32 { 65535.0 / max_texture_size as f32 }

/// Each `u16` index buffer can only address this many distinct vertices
/// per vertex stream (SPEC_FULL.md §7, §9). A polygon that would push
/// either stream past it is dropped like any other degenerate geometry.
const MAX_BATCH_VERTICES: usize = u16::MAX as usize + 1;

/// Which fragment program a batch is drawn with. The batcher selects by
/// paint variant; solid colors ride along with `Textured` over the atlas's
/// always-resident white texel (SPEC_FULL.md §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
  Textured,
  LinearGradient,
  RadialGradient,
}

/// The textured vertex layout (SPEC_FULL.md §4.F): position in logic
/// pixels, a 16-bit atlas texcoord, the sub-image's atlas offset/size (so
/// the fragment shader can wrap/clamp for pattern repeat), and a straight
/// rgba8 color multiplier.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, zerocopy::IntoBytes, zerocopy::FromBytes, zerocopy::Immutable)]
pub struct TexturedVertex {
  pub pos: [f32; 2],
  pub texcoord: [u16; 2],
  pub texoffset: [u16; 2],
  pub texsize: [u16; 2],
  pub color: [u8; 4],
}

/// The gradient vertex layout: position only. Gradient parameters are
/// per-batch uniforms, not per-vertex attributes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, zerocopy::IntoBytes, zerocopy::FromBytes, zerocopy::Immutable)]
pub struct GradientVertex {
  pub pos: [f32; 2],
}

const MAX_GRADIENT_STOPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedStop {
  pub offset: f32,
  pub color: [f32; 4],
}

/// Per-batch uniforms for the linear-gradient shader (SPEC_FULL.md §4.F).
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradientUniforms {
  pub start: [f32; 2],
  pub dt: [f32; 2],
  pub len_sq: f32,
  pub stops: smallvec::SmallVec<[PackedStop; MAX_GRADIENT_STOPS]>,
}

/// Per-batch uniforms for the radial-gradient shader.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradientUniforms {
  pub dt: [f32; 2],
  pub focal: [f32; 2],
  pub r0: f32,
  pub dr: f32,
  pub a: f32,
  pub stops: smallvec::SmallVec<[PackedStop; MAX_GRADIENT_STOPS]>,
}

/// The paint-derived half of a batch's identity: what a `Textured` batch
/// additionally needs (the atlas allocation and whether it's a shadow
/// pass), or the uniform block a gradient batch carries. Two batches merge
/// only when `shader`, texture, and this value are all equal.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchPaint {
  Textured { atlas_alloc: guillotiere::AllocId },
  Linear(LinearGradientUniforms),
  Radial(RadialGradientUniforms),
}

/// The smallest unit of GPU submission (SPEC_FULL.md §3 Batch / §4.F).
/// Invariant: `index_offset + index_count <= index_buffer.len()` for
/// whichever of `Batcher`'s two index buffers `shader` selects.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
  pub shader: ShaderKind,
  pub index_offset: u32,
  pub index_count: u32,
  pub paint: BatchPaint,
}

/// The GPU submission contract (SPEC_FULL.md §4.H / §1): everything the
/// batcher assumes a hardware rasterizer backend provides. The backend is
/// expected to pre-set blend state to `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`,
/// back-face culling with CCW-front winding, and disabled depth/scissor.
pub trait GpuBackend {
  fn upload_vertices(&mut self, shader: ShaderKind, bytes: &[u8]);
  fn upload_indices(&mut self, shader: ShaderKind, indices: &[u16]);
  fn bind_shader(&mut self, shader: ShaderKind);
  fn bind_texture(&mut self, atlas: &mut TextureAtlas);
  fn set_uniforms(&mut self, viewport: (f32, f32), paint: &BatchPaint);
  fn draw_indexed(&mut self, offset: u32, count: u32);
}

/// One queue entry's geometry, produced by Pass 1 and consumed by Pass 2.
/// `sub_polygons` holds one triangulation per flattened subpath (a path may
/// contain several, e.g. two disjoint `rect`s drawn between one
/// `beginPath`/`fill`).
struct EntryGeometry {
  op: DrawOp,
  state: ContextState,
  sub_polygons: Vec<Triangulation>,
}

/// Accumulates per-frame draw operations, triangulates them (Pass 1, in
/// parallel), and merges them into draw-ordered batches (Pass 2), per
/// SPEC_FULL.md §4.F. Owns the two vertex buffers and the shared index
/// buffer Pass 3 uploads.
pub struct Batcher {
  textured_vertices: Vec<TexturedVertex>,
  gradient_vertices: Vec<GradientVertex>,
  index_buffer: Vec<u16>,
  batches: Vec<Batch>,
  max_texture_size: u32,
  flatten_cfg: tunis_painter::FlattenConfig,
}

impl Default for Batcher {
  fn default() -> Self {
    Self {
      textured_vertices: Vec::new(),
      gradient_vertices: Vec::new(),
      index_buffer: Vec::new(),
      batches: Vec::new(),
      max_texture_size: 0,
      flatten_cfg: tunis_painter::FlattenConfig::default(),
    }
  }
}

impl Batcher {
  pub fn new(max_texture_size: u32) -> Self { Self { max_texture_size, ..Default::default() } }

  /// Overrides the flattening tolerances Pass 1 uses (SPEC_FULL.md §10.C);
  /// defaults to `FlattenConfig::default()` (device pixel ratio 1.0, the
  /// documented 32-deep recursion limit).
  pub fn set_flatten_config(&mut self, cfg: tunis_painter::FlattenConfig) { self.flatten_cfg = cfg; }

  pub fn textured_vertices(&self) -> &[TexturedVertex] { &self.textured_vertices }

  pub fn gradient_vertices(&self) -> &[GradientVertex] { &self.gradient_vertices }

  pub fn index_buffer(&self) -> &[u16] { &self.index_buffer }

  pub fn batches(&self) -> &[Batch] { &self.batches }

  fn clear(&mut self) {
    self.textured_vertices.clear();
    self.gradient_vertices.clear();
    self.index_buffer.clear();
    self.batches.clear();
  }

  /// Runs the full `endFrame` pipeline over one frame's queue: Pass 1
  /// (parallel geometry), Pass 2 (sequential batching), Pass 3 (submission
  /// through `backend`). Returns the number of entries whose geometry was
  /// dropped as degenerate (SPEC_FULL.md §7) — zero in the common case, a
  /// caller may log it with `tracing::debug!` if non-zero.
  pub fn end_frame<B: GpuBackend>(
    &mut self,
    entries: Vec<RenderQueueEntry>,
    viewport: (f32, f32),
    atlas: &mut TextureAtlas,
    backend: &mut B,
  ) -> usize {
    self.clear();

    let geometries: Vec<EntryGeometry> = entries
      .into_par_iter()
      .map(|entry| geometrize(entry, &self.flatten_cfg))
      .collect();

    let mut dropped = 0usize;
    for geometry in geometries {
      self.batch_entry(geometry, viewport.1, atlas, &mut dropped);
    }

    backend.upload_vertices(ShaderKind::Textured, zerocopy::IntoBytes::as_bytes(self.textured_vertices.as_slice()));
    backend.upload_vertices(ShaderKind::LinearGradient, zerocopy::IntoBytes::as_bytes(self.gradient_vertices.as_slice()));
    backend.upload_indices(ShaderKind::Textured, &self.index_buffer);
    backend.upload_indices(ShaderKind::LinearGradient, &self.index_buffer);

    for batch in &self.batches {
      backend.bind_shader(batch.shader);
      backend.set_uniforms(viewport, &batch.paint);
      backend.bind_texture(atlas);
      backend.draw_indexed(batch.index_offset, batch.index_count);
    }

    dropped
  }

  fn batch_entry(&mut self, geometry: EntryGeometry, view_height: f32, atlas: &mut TextureAtlas, dropped: &mut usize) {
    let EntryGeometry { op, state, sub_polygons } = geometry;
    let paint = match op {
      DrawOp::Fill(_) | DrawOp::TextFill => &state.fill_style,
      DrawOp::Stroke | DrawOp::TextStroke => &state.stroke_style,
    };

    for polygon in &sub_polygons {
      if polygon.points.len() < 3 || polygon.triangles.is_empty() {
        *dropped += 1;
        continue;
      }

      let textured = matches!(paint, Paint::Solid(_) | Paint::Image { .. });
      let needed = polygon.points.len();
      let budget_ok = if textured {
        Self::vertex_budget_ok(self.textured_vertices.len(), needed)
      } else {
        Self::vertex_budget_ok(self.gradient_vertices.len(), needed)
      };
      if !budget_ok {
        let err = GpuError::VertexBudgetExceeded { limit: MAX_BATCH_VERTICES as u32 };
        tracing::debug!(?err, "dropping polygon");
        *dropped += 1;
        continue;
      }

      let shadow_active = state.shadow_color.a != 0 && (state.shadow_offset_x != 0.0 || state.shadow_offset_y != 0.0);
      if shadow_active && textured {
        let alpha_color = match paint {
          Paint::Solid(c) => *c,
          _ => Color::new(255, 255, 255, 255),
        };
        let shadow_alpha = (state.shadow_color.a as u32 * alpha_color.a as u32 / 255) as u8;
        let shadow_color = Color::new(state.shadow_color.r, state.shadow_color.g, state.shadow_color.b, shadow_alpha);
        if Self::vertex_budget_ok(self.textured_vertices.len(), needed) {
          self.push_textured(
            polygon,
            &state.transform,
            Point::new(state.shadow_offset_x, state.shadow_offset_y),
            shadow_color,
            atlas.white_texel(),
            self.max_texture_size,
          );
        }
      }

      match paint {
        Paint::Solid(color) => {
          self.push_textured(polygon, &state.transform, Point::origin(), *color, atlas.white_texel(), self.max_texture_size);
        }
        Paint::Image { image, repeat } => {
          self.push_image(polygon, &state.transform, *image, *repeat, state.global_alpha, atlas);
        }
        Paint::LinearGradient { gradient, stops } => {
          let uniforms = pack_linear_gradient(gradient.start, gradient.end, stops, view_height);
          self.push_gradient(polygon, &state.transform, ShaderKind::LinearGradient, BatchPaint::Linear(uniforms));
        }
        Paint::RadialGradient { gradient, stops } => {
          let uniforms = pack_radial_gradient(
            gradient.center,
            gradient.focal,
            gradient.inner_radius,
            gradient.outer_radius,
            stops,
            view_height,
          );
          self.push_gradient(polygon, &state.transform, ShaderKind::RadialGradient, BatchPaint::Radial(uniforms));
        }
      }
    }
  }

  fn vertex_budget_ok(current_len: usize, additional: usize) -> bool { current_len + additional <= MAX_BATCH_VERTICES }

  #[allow(clippy::too_many_arguments)]
  fn push_textured(
    &mut self,
    polygon: &Triangulation,
    transform: &Transform,
    translate: Point,
    color: Color,
    atlas_alloc: guillotiere::Allocation,
    max_texture_size: u32,
  ) {
    let pw = pixel_width(max_texture_size);
    let base = self.textured_vertices.len() as u32;

    self.maybe_start_batch(ShaderKind::Textured, BatchPaint::Textured { atlas_alloc: atlas_alloc.id });

    for p in &polygon.points {
      let pos = transform.transform_point(*p) + translate.to_vector();
      self.textured_vertices.push(TexturedVertex {
        pos: [pos.x, pos.y],
        texcoord: [(pos.x * pw) as u16, (pos.y * pw) as u16],
        texoffset: [0, 0],
        texsize: [1, 1],
        color: [color.r, color.g, color.b, color.a],
      });
    }
    self.push_triangle_indices(base, polygon);
  }

  fn push_image(
    &mut self,
    polygon: &Triangulation,
    transform: &Transform,
    image: ImageHandle,
    repeat: RepeatMode,
    global_alpha: f32,
    atlas: &mut TextureAtlas,
  ) {
    let Some(alloc) = atlas.lookup(&image) else {
      tracing::warn!("image not resolved in any atlas; skipping draw");
      return;
    };

    let pw = pixel_width(self.max_texture_size);
    let base = self.textured_vertices.len() as u32;
    self.maybe_start_batch(ShaderKind::Textured, BatchPaint::Textured { atlas_alloc: alloc.id });

    let rect = alloc.rectangle;
    let (tex_w, tex_h) = (rect.width() as u16, rect.height() as u16);
    let alpha = (global_alpha.clamp(0.0, 1.0) * 255.0).round() as u8;

    for p in &polygon.points {
      let pos = transform.transform_point(*p);
      let (u, v) = match repeat {
        RepeatMode::Repeat => (p.x * pw, p.y * pw),
        RepeatMode::RepeatX => (p.x * pw, 0.0),
        RepeatMode::RepeatY => (0.0, p.y * pw),
        RepeatMode::NoRepeat => (0.0, 0.0),
      };
      self.textured_vertices.push(TexturedVertex {
        pos: [pos.x, pos.y],
        texcoord: [u as u16, v as u16],
        texoffset: [rect.min.x as u16, rect.min.y as u16],
        texsize: [tex_w, tex_h],
        color: [255, 255, 255, alpha],
      });
    }
    self.push_triangle_indices(base, polygon);
  }

  fn push_gradient(&mut self, polygon: &Triangulation, transform: &Transform, shader: ShaderKind, paint: BatchPaint) {
    let base = self.gradient_vertices.len() as u32;
    self.maybe_start_batch(shader, paint);
    for p in &polygon.points {
      let pos = transform.transform_point(*p);
      self.gradient_vertices.push(GradientVertex { pos: [pos.x, pos.y] });
    }
    self.push_triangle_indices(base, polygon);
  }

  /// Batch merging (SPEC_FULL.md §4.F): extends the last batch if it
  /// shares this draw's `(shader, paint)`, otherwise starts a new one at
  /// the current end of the index buffer.
  fn maybe_start_batch(&mut self, shader: ShaderKind, paint: BatchPaint) {
    let merges = matches!(
      self.batches.last(),
      Some(b) if b.shader == shader && b.paint == paint
    );
    if !merges {
      self.batches.push(Batch { shader, index_offset: self.index_buffer.len() as u32, index_count: 0, paint });
    }
  }

  /// Appends this polygon's triangle indices, reversing winding to CW
  /// (front-face culling is configured CCW=front, so fill/stroke geometry —
  /// produced in a CCW-ish convention upstream — must flip per SPEC_FULL.md
  /// §4.F) and extends the current batch's `index_count`.
  fn push_triangle_indices(&mut self, base: u32, polygon: &Triangulation) {
    for tri in &polygon.triangles {
      self.index_buffer.push((base + tri[2]) as u16);
      self.index_buffer.push((base + tri[1]) as u16);
      self.index_buffer.push((base + tri[0]) as u16);
    }
    if let Some(last) = self.batches.last_mut() {
      last.index_count += polygon.triangles.len() as u32 * 3;
    }
  }
}

fn pack_stops(stops: &[tunis_painter::GradientStop]) -> smallvec::SmallVec<[PackedStop; MAX_GRADIENT_STOPS]> {
  stops
    .iter()
    .take(MAX_GRADIENT_STOPS)
    .map(|s| PackedStop {
      offset: s.offset,
      color: [
        s.color.r as f32 / 255.0,
        s.color.g as f32 / 255.0,
        s.color.b as f32 / 255.0,
        s.color.a as f32 / 255.0,
      ],
    })
    .collect()
}

fn pack_linear_gradient(
  start: Point,
  end: Point,
  stops: &[tunis_painter::GradientStop],
  view_height: f32,
) -> LinearGradientUniforms {
  let start = Point::new(start.x, view_height - start.y);
  let dt = end - start;
  LinearGradientUniforms { start: [start.x, start.y], dt: [dt.x, dt.y], len_sq: dt.dot(dt), stops: pack_stops(stops) }
}

fn pack_radial_gradient(
  center: Point,
  focal: Point,
  inner_radius: f32,
  outer_radius: f32,
  stops: &[tunis_painter::GradientStop],
  view_height: f32,
) -> RadialGradientUniforms {
  let center = Point::new(center.x, view_height - center.y);
  let focal = Point::new(focal.x, view_height - focal.y);
  let dt = focal - center;
  let dr = outer_radius - inner_radius;
  RadialGradientUniforms {
    dt: [dt.x, dt.y],
    focal: [focal.x, focal.y],
    r0: inner_radius,
    dr,
    a: dt.dot(dt) - dr * dr,
    stops: pack_stops(stops),
  }
}

/// Pass 1 (SPEC_FULL.md §4.F): flatten, optionally stroke-expand, then
/// triangulate every subpath of one queue entry. Degenerate sub-polygons
/// (fewer than 3 vertices, or triangulation failure) are dropped here and
/// simply absent from `sub_polygons` — Pass 2 counts and logs them.
fn geometrize(entry: RenderQueueEntry, flatten_cfg: &tunis_painter::FlattenConfig) -> EntryGeometry {
  let RenderQueueEntry { op, path, state } = entry;
  let subpaths = tunis_painter::Flattener::new(flatten_cfg).flatten(&path);

  let mut sub_polygons = Vec::new();
  match op {
    DrawOp::Fill(_rule) | DrawOp::TextFill => {
      for sp in &subpaths {
        if sp.points.len() < 3 {
          continue;
        }
        let points: Vec<Point> = sp.points.iter().map(|p| p.pos).collect();
        match triangulator::triangulate(&points, &[]) {
          Ok(t) => sub_polygons.push(t),
          Err(err) => tracing::debug!(?err, "dropping degenerate fill polygon"),
        }
      }
    }
    DrawOp::Stroke | DrawOp::TextStroke => {
      let style = StrokeStyle {
        line_width: state.line_width,
        line_cap: state.line_cap,
        line_join: state.line_join,
        miter_limit: state.miter_limit,
        dashes: state.line_dashes.clone(),
        dash_offset: state.line_dash_offset,
      };
      for sp in &subpaths {
        for contour in tunis_painter::expand_stroke(sp, &style, flatten_cfg.dist_tol) {
          match triangulator::triangulate(&contour.outer_points, &contour.inner_points) {
            Ok(t) => sub_polygons.push(t),
            Err(err) => tracing::debug!(?err, "dropping degenerate stroke polygon"),
          }
        }
      }
    }
  }

  EntryGeometry { op, state, sub_polygons }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tunis_painter::{Color, ContextState, DrawOp, FillRule, Path, RenderQueueEntry};

  struct RecordingBackend {
    draws: Vec<(ShaderKind, u32, u32)>,
  }

  impl GpuBackend for RecordingBackend {
    fn upload_vertices(&mut self, _shader: ShaderKind, _bytes: &[u8]) {}
    fn upload_indices(&mut self, _shader: ShaderKind, _indices: &[u16]) {}
    fn bind_shader(&mut self, _shader: ShaderKind) {}
    fn bind_texture(&mut self, _atlas: &mut TextureAtlas) {}
    fn set_uniforms(&mut self, _viewport: (f32, f32), _paint: &BatchPaint) {}
    fn draw_indexed(&mut self, offset: u32, count: u32) {
      self.draws.push((ShaderKind::Textured, offset, count));
    }
  }

  fn fill_rect_entry(x: f32, y: f32, w: f32, h: f32, color: Color) -> RenderQueueEntry {
    let mut path = Path::new();
    path.rect(x, y, w, h);
    let mut state = ContextState::default();
    state.fill_style = Paint::Solid(color);
    RenderQueueEntry { op: DrawOp::Fill(FillRule::NonZero), path, state }
  }

  #[test]
  fn red_square_produces_one_batch_with_four_vertices() {
    let mut batcher = Batcher::new(2048);
    let mut atlas = TextureAtlas::new(256, 2048);
    let mut backend = RecordingBackend { draws: Vec::new() };
    let entries = vec![fill_rect_entry(10.0, 10.0, 50.0, 50.0, Color::new(255, 0, 0, 255))];

    batcher.end_frame(entries, (800.0, 600.0), &mut atlas, &mut backend);

    assert_eq!(batcher.batches().len(), 1);
    assert_eq!(batcher.textured_vertices().len(), 4);
    assert_eq!(batcher.index_buffer().len(), 6);
    for v in batcher.textured_vertices() {
      assert_eq!(v.color, [255, 0, 0, 255]);
    }
  }

  #[test]
  fn two_identical_fills_merge_into_one_batch() {
    let mut batcher = Batcher::new(2048);
    let mut atlas = TextureAtlas::new(256, 2048);
    let mut backend = RecordingBackend { draws: Vec::new() };
    let color = Color::new(0, 255, 0, 255);
    let entries =
      vec![fill_rect_entry(0.0, 0.0, 10.0, 10.0, color), fill_rect_entry(20.0, 20.0, 10.0, 10.0, color)];

    batcher.end_frame(entries, (800.0, 600.0), &mut atlas, &mut backend);

    assert_eq!(batcher.batches().len(), 1);
    assert_eq!(batcher.textured_vertices().len(), 8);
    assert_eq!(batcher.index_buffer().len(), 12);
  }

  #[test]
  fn differing_fill_colors_produce_two_batches() {
    let mut batcher = Batcher::new(2048);
    let mut atlas = TextureAtlas::new(256, 2048);
    let mut backend = RecordingBackend { draws: Vec::new() };
    let entries = vec![
      fill_rect_entry(0.0, 0.0, 10.0, 10.0, Color::new(255, 0, 0, 255)),
      fill_rect_entry(20.0, 20.0, 10.0, 10.0, Color::new(0, 0, 255, 255)),
    ];

    batcher.end_frame(entries, (800.0, 600.0), &mut atlas, &mut backend);

    assert_eq!(batcher.batches().len(), 2);
  }

  #[test]
  fn every_batch_index_range_is_in_bounds_and_multiple_of_three() {
    let mut batcher = Batcher::new(2048);
    let mut atlas = TextureAtlas::new(256, 2048);
    let mut backend = RecordingBackend { draws: Vec::new() };
    let entries = vec![
      fill_rect_entry(0.0, 0.0, 10.0, 10.0, Color::new(255, 0, 0, 255)),
      fill_rect_entry(20.0, 20.0, 10.0, 10.0, Color::new(0, 0, 255, 255)),
    ];
    batcher.end_frame(entries, (800.0, 600.0), &mut atlas, &mut backend);

    for b in batcher.batches() {
      assert_eq!(b.index_count % 3, 0);
      assert!((b.index_offset + b.index_count) as usize <= batcher.index_buffer().len());
    }
  }

  #[test]
  fn empty_path_fill_produces_no_batches() {
    let mut batcher = Batcher::new(2048);
    let mut atlas = TextureAtlas::new(256, 2048);
    let mut backend = RecordingBackend { draws: Vec::new() };
    let entries = vec![RenderQueueEntry { op: DrawOp::Fill(FillRule::NonZero), path: Path::new(), state: ContextState::default() }];

    batcher.end_frame(entries, (800.0, 600.0), &mut atlas, &mut backend);
    assert!(batcher.batches().is_empty());
  }

  #[test]
  fn radial_gradient_uniforms_match_the_coincident_focal_scenario() {
    let stops = smallvec::smallvec![
      tunis_painter::GradientStop { offset: 0.0, color: Color::new(255, 255, 255, 255) },
      tunis_painter::GradientStop { offset: 1.0, color: Color::TRANSPARENT },
    ];
    let uniforms = pack_radial_gradient(Point::new(50.0, 50.0), Point::new(50.0, 50.0), 0.0, 50.0, &stops, 0.0);
    assert_eq!(uniforms.r0, 0.0);
    assert_eq!(uniforms.dr, 50.0);
    assert_eq!(uniforms.a, -2500.0);
    // focal and center coincide, so the Y-flipped focal-minus-center vector is zero.
    assert_eq!(uniforms.dt, [0.0, 0.0]);
    assert_eq!(uniforms.focal, [50.0, 50.0]);
  }

  #[test]
  fn vertex_budget_rejects_only_once_a_stream_would_overflow_u16_indices() {
    assert!(Batcher::vertex_budget_ok(u16::MAX as usize - 1, 2));
    assert!(!Batcher::vertex_budget_ok(u16::MAX as usize, 2));
  }
}
