use bitflags::bitflags;
use tunis_geom::{Point, Vector};

use crate::path::{Path, PathCommand};

bitflags! {
  /// Per-vertex classification produced while flattening and, later,
  /// consumed by the stroke expander's join logic.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
  pub struct PointProperties: u8 {
    /// A vertex that came from an explicit command boundary (as opposed to
    /// an interior point emitted by curve subdivision).
    const CORNER     = 0b0000_0001;
    const LEFT_TURN  = 0b0000_0010;
    const RIGHT_TURN = 0b0000_0100;
    const SHARP      = 0b0000_1000;
    const BEVEL      = 0b0001_0000;
  }
}

/// A single flattened vertex plus the per-vertex derived quantities the
/// stroke expander needs: direction to the next point, averaged normal, and
/// segment length to the next point.
#[derive(Debug, Clone, Copy)]
pub struct FlatPoint {
  pub pos: Point,
  pub dir: Vector,
  pub norm: Vector,
  pub len: f32,
  pub properties: PointProperties,
}

impl FlatPoint {
  pub(crate) fn corner(pos: Point) -> Self {
    Self {
      pos,
      dir: Vector::zero(),
      norm: Vector::zero(),
      len: 0.0,
      properties: PointProperties::CORNER,
    }
  }

  fn interior(pos: Point) -> Self {
    Self { pos, dir: Vector::zero(), norm: Vector::zero(), len: 0.0, properties: PointProperties::empty() }
  }
}

/// A maximal flattened polyline derived from a run of path commands between
/// `moveTo`/`close` boundaries.
#[derive(Debug, Clone, Default)]
pub struct SubPath {
  pub points: Vec<FlatPoint>,
  pub inner_points: Vec<Point>,
  pub outer_points: Vec<Point>,
  pub closed: bool,
}

impl SubPath {
  fn new(start: Point) -> Self { Self { points: vec![FlatPoint::corner(start)], ..Default::default() } }
}

/// Tunable thresholds driving adaptive subdivision, derived once per frame
/// from `devicePixelRatio` (see `tunis::Config`).
#[derive(Debug, Clone, Copy)]
pub struct FlattenConfig {
  pub tess_tol: f32,
  pub dist_tol: f32,
  pub curve_recursion_limit: u32,
}

impl FlattenConfig {
  pub fn for_device_pixel_ratio(dpr: f32, curve_recursion_limit: u32) -> Self {
    Self { tess_tol: 0.25 / dpr, dist_tol: 0.01 / dpr, curve_recursion_limit }
  }
}

impl Default for FlattenConfig {
  fn default() -> Self { Self::for_device_pixel_ratio(1.0, 32) }
}

/// Flattens a [`Path`]'s command stream into one or more [`SubPath`]s of
/// corner/interior points, per SPEC_FULL.md §4.B.
pub struct Flattener<'a> {
  cfg: &'a FlattenConfig,
  subpaths: Vec<SubPath>,
}

impl<'a> Flattener<'a> {
  pub fn new(cfg: &'a FlattenConfig) -> Self { Self { cfg, subpaths: Vec::new() } }

  pub fn flatten(mut self, path: &Path) -> Vec<SubPath> {
    let mut cursor = Point::new(0.0, 0.0);
    for cmd in path.commands() {
      match *cmd {
        PathCommand::MoveTo { x, y } => {
          cursor = Point::new(x, y);
          self.subpaths.push(SubPath::new(cursor));
        }
        PathCommand::LineTo { x, y } => {
          cursor = Point::new(x, y);
          self.current().push_corner(cursor, self.cfg.dist_tol);
        }
        PathCommand::Close => {
          if let Some(sp) = self.subpaths.last_mut() {
            sp.closed = true;
          }
        }
        PathCommand::BezierTo { c1x, c1y, c2x, c2y, x, y } => {
          let p0 = cursor;
          let p1 = Point::new(c1x, c1y);
          let p2 = Point::new(c2x, c2y);
          let p3 = Point::new(x, y);
          cursor = p3;
          self.bezier_to(p0, p1, p2, p3);
        }
        PathCommand::QuadTo { cx, cy, x, y } => {
          let p0 = cursor;
          let cp = Point::new(cx, cy);
          let p3 = Point::new(x, y);
          // c1 = p0 + 2/3(cp - p0), c2 = p3 + 2/3(cp - p3)
          let c1 = p0 + (cp - p0) * (2.0 / 3.0);
          let c2 = p3 + (cp - p3) * (2.0 / 3.0);
          cursor = p3;
          self.bezier_to(p0, c1, c2, p3);
        }
        PathCommand::Arc { cx, cy, r, a0, a1, ccw } => {
          cursor = self.arc(cx, cy, r, r, 0.0, a0, a1, ccw);
        }
        PathCommand::ArcTo { x1, y1, x2, y2, r } => {
          let p0 = cursor;
          cursor = self.arc_to(p0, Point::new(x1, y1), Point::new(x2, y2), r);
        }
        PathCommand::Ellipse { cx, cy, rx, ry, rotation, a0, a1, ccw } => {
          cursor = self.arc(cx, cy, rx, ry, rotation, a0, a1, ccw);
        }
        PathCommand::Rect { x, y, w, h } => {
          let sp = SubPath {
            points: vec![
              FlatPoint::corner(Point::new(x, y)),
              FlatPoint::corner(Point::new(x, y + h)),
              FlatPoint::corner(Point::new(x + w, y + h)),
              FlatPoint::corner(Point::new(x + w, y)),
            ],
            closed: true,
            ..Default::default()
          };
          self.subpaths.push(sp);
          cursor = Point::new(x, y);
        }
      }
    }

    for sp in &mut self.subpaths {
      sp.close_dedup(self.cfg.dist_tol);
    }
    self.subpaths
  }

  fn current(&mut self) -> &mut SubPath {
    if self.subpaths.is_empty() {
      self.subpaths.push(SubPath::new(Point::new(0.0, 0.0)));
    }
    self.subpaths.last_mut().unwrap()
  }

  fn bezier_to(&mut self, p0: Point, p1: Point, p2: Point, p3: Point) {
    let tess_tol = self.cfg.tess_tol;
    let limit = self.cfg.curve_recursion_limit;
    let mut pts = Vec::new();
    recursive_bezier(p0, p1, p2, p3, 0, limit, tess_tol, &mut pts);
    let sp = self.current();
    for p in pts {
      sp.push_interior(p, self.cfg.dist_tol);
    }
    sp.push_corner(p3, self.cfg.dist_tol);
  }

  /// Decomposes an ellipse arc into cubic bezier segments (one per ≤ 90°
  /// span) and flattens each. `rotation` is accepted for API completeness
  /// but, matching the unresolved upstream behavior this spec documents as
  /// an open question, is not applied (see DESIGN.md).
  fn arc(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, _rotation: f32, a0: f32, a1: f32, ccw: bool) -> Point {
    let mut delta = a1 - a0;
    if ccw {
      if delta > 0.0 {
        delta -= std::f32::consts::TAU;
      }
    } else if delta < 0.0 {
      delta += std::f32::consts::TAU;
    }

    if delta.abs() < 1e-6 {
      let p = Point::new(cx + rx * a0.cos(), cy + ry * a0.sin());
      self.current().push_corner(p, self.cfg.dist_tol);
      return p;
    }

    let segments = (delta.abs() / std::f32::consts::FRAC_PI_2).ceil().max(1.0) as u32;
    let seg_theta = delta / segments as f32;
    let alpha = (4.0 / 3.0 * (1.0 - (seg_theta / 2.0).cos()) / (seg_theta / 2.0).sin()).abs();
    let alpha = if seg_theta < 0.0 { -alpha } else { alpha };

    let mut theta = a0;
    let mut p0 = Point::new(cx + rx * theta.cos(), cy + ry * theta.sin());
    self.current().push_corner(p0, self.cfg.dist_tol);

    for _ in 0..segments {
      let theta1 = theta + seg_theta;
      let (s0, c0) = (theta.sin(), theta.cos());
      let (s1, c1) = (theta1.sin(), theta1.cos());

      let p1 = Point::new(p0.x - alpha * rx * s0, p0.y + alpha * ry * c0);
      let p3 = Point::new(cx + rx * c1, cy + ry * s1);
      let p2 = Point::new(p3.x + alpha * rx * s1, p3.y - alpha * ry * c1);

      self.bezier_to(p0, p1, p2, p3);

      theta = theta1;
      p0 = p3;
    }
    p0
  }

  /// Handles the degenerate cases (collinear points, near-zero radius) by
  /// emitting `p1` as a plain corner, otherwise computes the tangent circle
  /// through `p0, p1, p2` of radius `r` and delegates to `arc`.
  fn arc_to(&mut self, p0: Point, p1: Point, p2: Point, r: f32) -> Point {
    let d0 = p0 - p1;
    let d1 = p2 - p1;

    let len0 = d0.length();
    let len1 = d1.length();
    if len0 < 1e-6 || len1 < 1e-6 || r < 1e-6 {
      self.current().push_corner(p1, self.cfg.dist_tol);
      return p1;
    }

    let a0 = d0 / len0;
    let a1 = d1 / len1;
    let cross = tunis_geom::cross(a0, a1);
    if cross.abs() < 1e-6 {
      // collinear: no tangent circle, just corner to p1.
      self.current().push_corner(p1, self.cfg.dist_tol);
      return p1;
    }

    // Half angle between the two incident segments.
    let cos_theta = a0.dot(a1).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();
    let dist = r / (theta / 2.0).sin();
    if !dist.is_finite() {
      self.current().push_corner(p1, self.cfg.dist_tol);
      return p1;
    }

    let bisector = (a0 + a1).normalize();
    let center = p1 + bisector * dist;

    // project center onto each incident edge to find the tangent points.
    let t0 = r / (theta / 2.0).tan();
    let start = p1 + a0 * t0;
    let end = p1 + a1 * t0;

    let start_angle = (start - center).angle_from_x_axis().radians;
    let end_angle = (end - center).angle_from_x_axis().radians;
    let ccw = cross > 0.0;

    self.current().push_corner(start, self.cfg.dist_tol);
    self.arc(center.x, center.y, r, r, 0.0, start_angle, end_angle, ccw)
  }
}

impl SubPath {
  fn push_corner(&mut self, p: Point, dist_tol: f32) { self.push_point(FlatPoint::corner(p), dist_tol); }

  fn push_interior(&mut self, p: Point, dist_tol: f32) { self.push_point(FlatPoint::interior(p), dist_tol); }

  fn push_point(&mut self, p: FlatPoint, dist_tol: f32) {
    if let Some(last) = self.points.last() {
      if (last.pos - p.pos).length() < dist_tol {
        return;
      }
    }
    self.points.push(p);
  }

  /// If this is a closed subpath and the first/last points coincide, drop
  /// the duplicate — `close_path` after a loop of `lineTo`s back to the
  /// start is the common case this guards against.
  fn close_dedup(&mut self, dist_tol: f32) {
    if self.closed && self.points.len() > 1 {
      let first = self.points[0].pos;
      let last = self.points[self.points.len() - 1].pos;
      if (first - last).length() < dist_tol {
        self.points.pop();
      }
    }
  }
}

/// Adaptive cubic bezier subdivision via de Casteljau, per SPEC_FULL.md
/// §4.B. Emits interior points (not including `p0`/`p3`) into `out`.
#[allow(clippy::too_many_arguments)]
fn recursive_bezier(
  p0: Point,
  p1: Point,
  p2: Point,
  p3: Point,
  depth: u32,
  limit: u32,
  tess_tol: f32,
  out: &mut Vec<Point>,
) {
  if depth >= limit {
    return;
  }

  let dx = p3.x - p0.x;
  let dy = p3.y - p0.y;

  let d2 = ((p1.x - p3.x) * dy - (p1.y - p3.y) * dx).abs();
  let d3 = ((p2.x - p3.x) * dy - (p2.y - p3.y) * dx).abs();

  const EPS: f32 = 1e-6;
  let d_sq = dx * dx + dy * dy;

  let flat_enough = match (d2 > EPS, d3 > EPS) {
    (false, false) => {
      // collinear-ish: use squared-distance tests against the chord instead
      // of the cross-product deviation.
      let dd = (p1.x - p0.x) * dx + (p1.y - p0.y) * dy;
      let dd = if d_sq > EPS { dd * dd / d_sq } else { 0.0 };
      let d2sq = (p1.x - p0.x).powi(2) + (p1.y - p0.y).powi(2) - dd;

      let de = (p2.x - p3.x) * dx + (p2.y - p3.y) * dy;
      let de = if d_sq > EPS { de * de / d_sq } else { 0.0 };
      let d3sq = (p2.x - p3.x).powi(2) + (p2.y - p3.y).powi(2) - de;

      d2sq.max(d3sq) <= tess_tol
    }
    (true, false) => d2 * d2 <= tess_tol * d_sq,
    (false, true) => d3 * d3 <= tess_tol * d_sq,
    (true, true) => (d2 + d3) * (d2 + d3) <= tess_tol * d_sq,
  };

  if flat_enough {
    out.push(midpoint_on_curve(p0, p1, p2, p3));
    return;
  }

  let p01 = p0.lerp(p1, 0.5);
  let p12 = p1.lerp(p2, 0.5);
  let p23 = p2.lerp(p3, 0.5);
  let p012 = p01.lerp(p12, 0.5);
  let p123 = p12.lerp(p23, 0.5);
  let p0123 = p012.lerp(p123, 0.5);

  recursive_bezier(p0, p01, p012, p0123, depth + 1, limit, tess_tol, out);
  out.push(p0123);
  recursive_bezier(p0123, p123, p23, p3, depth + 1, limit, tess_tol, out);
}

fn midpoint_on_curve(p0: Point, p1: Point, p2: Point, p3: Point) -> Point {
  let p01 = p0.lerp(p1, 0.5);
  let p12 = p1.lerp(p2, 0.5);
  let p23 = p2.lerp(p3, 0.5);
  let p012 = p01.lerp(p12, 0.5);
  let p123 = p12.lerp(p23, 0.5);
  p012.lerp(p123, 0.5)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cfg() -> FlattenConfig { FlattenConfig::for_device_pixel_ratio(1.0, 32) }

  #[test]
  fn flattening_is_deterministic() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.bezier_curve_to(Point::new(0.0, 100.0), Point::new(100.0, 100.0), Point::new(100.0, 0.0));

    let cfg = cfg();
    let a = Flattener::new(&cfg).flatten(&path);
    let b = Flattener::new(&cfg).flatten(&path);

    assert_eq!(a.len(), b.len());
    for (sa, sb) in a.iter().zip(b.iter()) {
      assert_eq!(sa.points.len(), sb.points.len());
      for (pa, pb) in sa.points.iter().zip(sb.points.iter()) {
        assert_eq!(pa.pos, pb.pos);
      }
    }
  }

  #[test]
  fn adjacent_points_respect_dist_tol() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.bezier_curve_to(Point::new(10.0, 90.0), Point::new(90.0, 90.0), Point::new(100.0, 0.0));

    let cfg = cfg();
    let subpaths = Flattener::new(&cfg).flatten(&path);
    let pts = &subpaths[0].points;
    for w in pts.windows(2) {
      assert!((w[1].pos - w[0].pos).length() >= cfg.dist_tol);
    }
  }

  #[test]
  fn quad_to_cubic_matches_direct_bezier() {
    let p0 = Point::new(0.0, 0.0);
    let cp = Point::new(50.0, 100.0);
    let p = Point::new(100.0, 0.0);
    let c1 = p0 + (cp - p0) * (2.0 / 3.0);
    let c2 = p + (cp - p) * (2.0 / 3.0);

    let mut quad_path = Path::new();
    quad_path.move_to(p0.x, p0.y);
    quad_path.quadratic_curve_to(cp, p);

    let mut bezier_path = Path::new();
    bezier_path.move_to(p0.x, p0.y);
    bezier_path.bezier_curve_to(c1, c2, p);

    let cfg = cfg();
    let a = Flattener::new(&cfg).flatten(&quad_path);
    let b = Flattener::new(&cfg).flatten(&bezier_path);
    assert_eq!(a[0].points.len(), b[0].points.len());
    for (pa, pb) in a[0].points.iter().zip(b[0].points.iter()) {
      assert_eq!(pa.pos, pb.pos);
    }
  }

  #[test]
  fn rect_produces_four_corners_with_exact_bounds() {
    let mut path = Path::new();
    path.rect(10.0, 10.0, 50.0, 50.0);
    let cfg = cfg();
    let subpaths = Flattener::new(&cfg).flatten(&path);
    assert_eq!(subpaths.len(), 1);
    let sp = &subpaths[0];
    assert!(sp.closed);
    assert_eq!(sp.points.len(), 4);

    let min_x = sp.points.iter().map(|p| p.pos.x).fold(f32::INFINITY, f32::min);
    let min_y = sp.points.iter().map(|p| p.pos.y).fold(f32::INFINITY, f32::min);
    let max_x = sp.points.iter().map(|p| p.pos.x).fold(f32::NEG_INFINITY, f32::max);
    let max_y = sp.points.iter().map(|p| p.pos.y).fold(f32::NEG_INFINITY, f32::max);
    assert_eq!((min_x, min_y), (10.0, 10.0));
    assert_eq!((max_x, max_y), (60.0, 60.0));
  }

  #[test]
  fn arc_to_collinear_points_emits_only_the_corner() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.arc_to(Point::new(50.0, 0.0), Point::new(100.0, 0.0), 10.0);
    let cfg = cfg();
    let subpaths = Flattener::new(&cfg).flatten(&path);
    // collinear arcTo degenerates to a corner at p1, no arc segments.
    assert_eq!(subpaths[0].points.len(), 2);
  }
}
