use tunis_geom::Point;

/// One entry in a path's command stream. Mirrors the Canvas2D-style drawing
/// calls 1:1 — no geometric work happens when a command is appended, only
/// when the path is flattened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
  MoveTo { x: f32, y: f32 },
  LineTo { x: f32, y: f32 },
  BezierTo { c1x: f32, c1y: f32, c2x: f32, c2y: f32, x: f32, y: f32 },
  QuadTo { cx: f32, cy: f32, x: f32, y: f32 },
  Arc { cx: f32, cy: f32, r: f32, a0: f32, a1: f32, ccw: bool },
  ArcTo { x1: f32, y1: f32, x2: f32, y2: f32, r: f32 },
  Ellipse { cx: f32, cy: f32, rx: f32, ry: f32, rotation: f32, a0: f32, a1: f32, ccw: bool },
  Rect { x: f32, y: f32, w: f32, h: f32 },
  Close,
}

/// A path: an ordered command stream plus a cache of the geometry derived
/// from it. Cheap to clone (plain `Vec` of small commands) so queuing a
/// snapshot onto the render queue is just `path.clone()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
  commands: Vec<PathCommand>,
  dirty: bool,
}

impl Path {
  pub fn new() -> Self { Self { commands: Vec::new(), dirty: false } }

  pub fn commands(&self) -> &[PathCommand] { &self.commands }

  /// Whether the derived flattened geometry is stale relative to the
  /// command stream and must be recomputed before use.
  pub fn is_dirty(&self) -> bool { self.dirty }

  pub fn clear_dirty(&mut self) { self.dirty = false; }

  fn push(&mut self, cmd: PathCommand) {
    self.commands.push(cmd);
    self.dirty = true;
  }

  pub fn move_to(&mut self, x: f32, y: f32) { self.push(PathCommand::MoveTo { x, y }); }

  pub fn line_to(&mut self, x: f32, y: f32) { self.push(PathCommand::LineTo { x, y }); }

  pub fn bezier_curve_to(&mut self, c1: Point, c2: Point, p: Point) {
    self.push(PathCommand::BezierTo { c1x: c1.x, c1y: c1.y, c2x: c2.x, c2y: c2.y, x: p.x, y: p.y });
  }

  pub fn quadratic_curve_to(&mut self, cp: Point, p: Point) {
    self.push(PathCommand::QuadTo { cx: cp.x, cy: cp.y, x: p.x, y: p.y });
  }

  pub fn arc(&mut self, cx: f32, cy: f32, r: f32, a0: f32, a1: f32, ccw: bool) {
    self.push(PathCommand::Arc { cx, cy, r, a0, a1, ccw });
  }

  pub fn arc_to(&mut self, p1: Point, p2: Point, r: f32) {
    self.push(PathCommand::ArcTo { x1: p1.x, y1: p1.y, x2: p2.x, y2: p2.y, r });
  }

  pub fn ellipse(
    &mut self,
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    rotation: f32,
    a0: f32,
    a1: f32,
    ccw: bool,
  ) {
    self.push(PathCommand::Ellipse { cx, cy, rx, ry, rotation, a0, a1, ccw });
  }

  pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32) { self.push(PathCommand::Rect { x, y, w, h }); }

  pub fn close_path(&mut self) { self.push(PathCommand::Close); }

  /// Discard every command, returning the path to its just-constructed
  /// state. Does not touch `dirty`-tracked geometry caches held elsewhere
  /// (those belong to whoever flattened this path).
  pub fn reset(&mut self) {
    self.commands.clear();
    self.dirty = false;
  }

  pub fn is_empty(&self) -> bool { self.commands.is_empty() }
}
