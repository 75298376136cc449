use tunis_geom::{cross, rotate90_cw, Point};

use crate::{
  flatten::{FlatPoint, PointProperties, SubPath},
  geometry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCap {
  Butt,
  Square,
  Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineJoin {
  Miter,
  Bevel,
  Round,
}

#[derive(Debug, Clone)]
pub struct StrokeStyle {
  pub line_width: f32,
  pub line_cap: LineCap,
  pub line_join: LineJoin,
  pub miter_limit: f32,
  pub dashes: Vec<f32>,
  pub dash_offset: f32,
}

impl Default for StrokeStyle {
  fn default() -> Self {
    Self {
      line_width: 1.0,
      line_cap: LineCap::Butt,
      line_join: LineJoin::Miter,
      miter_limit: 10.0,
      dashes: Vec::new(),
      dash_offset: 0.0,
    }
  }
}

/// The outcome of expanding one flattened subpath into a stroke polygon:
/// `outer_points` is always the single outer ring; `inner_points` is the
/// hole contour, populated only for closed subpaths.
#[derive(Debug, Clone, Default)]
pub struct StrokeContour {
  pub outer_points: Vec<Point>,
  pub inner_points: Vec<Point>,
}

/// Expands one flattened [`SubPath`] into one or more stroke contours, per
/// SPEC_FULL.md §4.C. Dashing (if `style.dashes` is non-empty) can split a
/// single subpath into several independently-capped contours.
pub fn expand_stroke(subpath: &SubPath, style: &StrokeStyle, dist_tol: f32) -> Vec<StrokeContour> {
  let half_width = style.line_width * 0.5;
  if half_width <= 0.0 || subpath.points.len() < 2 {
    return Vec::new();
  }

  let dashed = apply_dashes(subpath, style, dist_tol);

  dashed
    .iter()
    .filter(|sp| sp.points.len() >= 2)
    .map(|sp| extrude(sp, style, half_width))
    .collect()
}

fn compute_directions(points: &mut [FlatPoint], closed: bool) {
  let n = points.len();
  if n < 2 {
    return;
  }
  for i in 0..n {
    if !closed && i == n - 1 {
      points[i].dir = points[i - 1].dir;
      continue;
    }
    let j = if i + 1 < n { i + 1 } else { 0 };
    let d = points[j].pos - points[i].pos;
    let len = d.length();
    points[i].len = len;
    points[i].dir = if len > 1e-6 { d / len } else { points.get(i.wrapping_sub(1)).map(|p| p.dir).unwrap_or_default() };
  }
}

/// Walks the dash pattern (with `dash_offset`, which may be negative —
/// fast-forwarded modulo the pattern length so a starting dash can be
/// truncated) and splits `subpath` into a run of open subpaths, one per
/// drawn dash. Odd indices in `style.dashes` are gaps.
fn apply_dashes(subpath: &SubPath, style: &StrokeStyle, dist_tol: f32) -> Vec<SubPath> {
  if style.dashes.is_empty() || subpath.points.len() < 2 {
    let mut sp = subpath.clone();
    compute_directions(&mut sp.points, sp.closed);
    return vec![sp];
  }

  // Canvas2D doubles an odd-length dash array so it alternates evenly.
  let mut dashes = style.dashes.clone();
  if dashes.len() % 2 == 1 {
    dashes.extend_from_slice(&style.dashes);
  }
  let pattern_len: f32 = dashes.iter().sum();
  if pattern_len <= 1e-6 {
    let mut sp = subpath.clone();
    compute_directions(&mut sp.points, sp.closed);
    return vec![sp];
  }

  let mut idx = 0usize;
  let mut remaining = dashes[0];
  let mut drawing = true;
  let mut off = style.dash_offset.rem_euclid(pattern_len);
  while off > 0.0 {
    if off < remaining {
      remaining -= off;
      off = 0.0;
    } else {
      off -= remaining;
      idx = (idx + 1) % dashes.len();
      remaining = dashes[idx];
      drawing = !drawing;
    }
  }

  let mut result = Vec::new();
  let mut current: Vec<Point> = Vec::new();

  let pts = &subpath.points;
  let n = pts.len();
  let seg_count = if subpath.closed { n } else { n - 1 };

  let mut push_point = |p: Point, drawing: bool, current: &mut Vec<Point>, result: &mut Vec<SubPath>| {
    if drawing {
      if current.last().map(|last| (*last - p).length() >= dist_tol).unwrap_or(true) {
        current.push(p);
      }
    } else if current.len() >= 2 {
      result.push(SubPath {
        points: std::mem::take(current).into_iter().map(FlatPoint::corner).collect(),
        closed: false,
        ..Default::default()
      });
    } else {
      current.clear();
    }
  };

  push_point(pts[0].pos, drawing, &mut current, &mut result);

  for i in 0..seg_count {
    let j = (i + 1) % n;
    let a = pts[i].pos;
    let b = pts[j].pos;
    let seg_len = (b - a).length();
    if seg_len < 1e-9 {
      continue;
    }
    let mut travelled = 0.0f32;
    while travelled < seg_len - 1e-6 {
      let step = remaining.min(seg_len - travelled);
      travelled += step;
      remaining -= step;
      if remaining <= 1e-6 {
        let t = (travelled / seg_len).min(1.0);
        let p = a.lerp(b, t);
        push_point(p, drawing, &mut current, &mut result);
        drawing = !drawing;
        idx = (idx + 1) % dashes.len();
        remaining = dashes[idx];
        push_point(p, drawing, &mut current, &mut result);
      }
    }
  }
  if current.len() >= 2 {
    result.push(SubPath {
      points: current.into_iter().map(FlatPoint::corner).collect(),
      closed: false,
      ..Default::default()
    });
  }

  for sp in &mut result {
    compute_directions(&mut sp.points, false);
  }
  result
}

/// Normals and corner classification, per SPEC_FULL.md §4.C Step 3. Closed
/// subpaths classify every vertex (wrapping around); open subpaths classify
/// only interior vertices — the first and last are cap anchors with a
/// single-sided normal instead.
fn classify(points: &mut [FlatPoint], closed: bool, half_width: f32, miter_limit_sq: f32, join: LineJoin) {
  let n = points.len();
  if n < 2 {
    return;
  }

  if !closed {
    points[0].norm = rotate90_cw(points[0].dir);
    let last = n - 1;
    points[last].norm = rotate90_cw(points[last].dir);
  }

  let range: Box<dyn Iterator<Item = usize>> =
    if closed { Box::new(0..n) } else { Box::new(1..n.saturating_sub(1)) };

  for p1 in range {
    let p0 = if p1 == 0 { n - 1 } else { p1 - 1 };
    let dir_prev = points[p0].dir;
    let dir_cur = points[p1].dir;
    let n0 = rotate90_cw(dir_prev);
    let n1 = rotate90_cw(dir_cur);
    let mut norm = (n0 + n1) * 0.5;
    let dot = norm.dot(norm);
    if dot > f32::EPSILON {
      norm = norm * (1.0f32 / dot).clamp(0.0, 1000.0);
    }
    points[p1].norm = norm;

    let turn = cross(dir_cur, dir_prev);
    points[p1].properties.set(PointProperties::LEFT_TURN, turn > 0.0);
    points[p1].properties.set(PointProperties::RIGHT_TURN, turn <= 0.0);

    let sharpness_limit = (points[p0].len.min(points[p1].len) / half_width).max(1.0);
    if dot * sharpness_limit * sharpness_limit > 1.0 {
      points[p1].properties.insert(PointProperties::SHARP);
    }

    if points[p1].properties.contains(PointProperties::CORNER)
      && (join == LineJoin::Bevel || join == LineJoin::Round || dot * miter_limit_sq < 1.0)
    {
      points[p1].properties.insert(PointProperties::BEVEL);
    }
  }
}

fn extrude(subpath: &SubPath, style: &StrokeStyle, half_width: f32) -> StrokeContour {
  let mut points = subpath.points.clone();
  compute_directions(&mut points, subpath.closed);
  classify(&mut points, subpath.closed, half_width, style.miter_limit * style.miter_limit, style.line_join);

  let mut outer = Vec::with_capacity(points.len() * 2);
  let mut inner = Vec::with_capacity(points.len() * 2);
  let n = points.len();

  if subpath.closed {
    // Single combined pass: each vertex contributes to both rings, bevel
    // vertices expanding onto whichever ring matches their turn direction.
    for p1 in 0..n {
      let p0 = if p1 == 0 { n - 1 } else { p1 - 1 };
      extrude_vertex(&points, p0, p1, half_width, style, PointProperties::LEFT_TURN, &mut outer, &mut inner);
    }
  } else {
    for p1 in 0..n {
      let prev = p1.saturating_sub(1);
      open_side(&points, p1, prev, true, half_width, style, PointProperties::LEFT_TURN, 1.0, &mut outer);
    }

    append_cap(&mut outer, &points[n - 1], half_width, style.line_cap, true);

    for p1 in (0..n).rev() {
      let next = (p1 + 1).min(n - 1);
      open_side(&points, p1, next, false, half_width, style, PointProperties::RIGHT_TURN, -1.0, &mut outer);
    }

    append_cap(&mut outer, &points[0], half_width, style.line_cap, false);
  }

  StrokeContour { outer_points: outer, inner_points: inner }
}

/// One vertex of the closed-path extrusion: emits the ordinary miter pair,
/// or — when `bevel` is set — two points on the outside (three for a round
/// join, via an arc) and one miter point on the inside, swapping sides when
/// the turn direction is the mirror of `outer_turn`.
fn extrude_vertex(
  points: &[FlatPoint],
  p0: usize,
  p1: usize,
  half_width: f32,
  style: &StrokeStyle,
  outer_turn: PointProperties,
  outer: &mut Vec<Point>,
  inner: &mut Vec<Point>,
) {
  let pos = points[p1].pos;
  let norm = points[p1].norm;

  if !points[p1].properties.contains(PointProperties::BEVEL) {
    outer.push(pos - norm * half_width);
    inner.push(pos + norm * half_width);
    return;
  }

  let is_outer_turn = points[p1].properties.contains(outer_turn);
  let rot_prev = rotate90_cw(points[p0].dir);
  let rot_cur = rotate90_cw(points[p1].dir);

  let (bevel_ring, miter_ring): (&mut Vec<Point>, &mut Vec<Point>) =
    if is_outer_turn { (outer, inner) } else { (inner, outer) };
  let sign = if is_outer_turn { -1.0 } else { 1.0 };

  let miter_point = pos + norm * half_width * sign;

  if style.line_join == LineJoin::Round {
    let v0 = pos + rot_prev * half_width * sign;
    let v2 = pos + rot_cur * half_width * sign;
    bevel_ring.push(v0);
    if let Some((center, start, end, ccw)) = geometry::tangent_circle(v0, pos, v2, half_width) {
      geometry::append_arc(bevel_ring, center, start, end, ccw);
    } else {
      bevel_ring.push(v2);
    }
  } else {
    let (v0, v2) = if points[p1].properties.contains(PointProperties::SHARP) {
      (pos + rot_prev * half_width * sign, pos + rot_cur * half_width * sign)
    } else {
      (pos + points[p0].norm * half_width * sign, pos + points[p1].norm * half_width * sign)
    };
    bevel_ring.push(v0);
    bevel_ring.push(v2);
  }

  miter_ring.push(miter_point);
}

/// One vertex of an open-path ring (forward or reverse pass): emits the
/// single-sided normal extrusion, or — when `bevel` is set and the vertex's
/// turn matches `bevel_turn` — a bevel/round fillet built from the two
/// incident segment directions. `neighbor_is_prev` selects which of `self`'s
/// two incident directions is the "prev" side of the fillet; the forward
/// pass walks prev->self, the reverse pass walks self->next.
#[allow(clippy::too_many_arguments)]
fn open_side(
  points: &[FlatPoint],
  self_idx: usize,
  neighbor_idx: usize,
  neighbor_is_prev: bool,
  half_width: f32,
  style: &StrokeStyle,
  bevel_turn: PointProperties,
  sign: f32,
  out: &mut Vec<Point>,
) {
  let pos = points[self_idx].pos;
  let norm = points[self_idx].norm;

  if !points[self_idx].properties.contains(PointProperties::BEVEL)
    || !points[self_idx].properties.contains(bevel_turn)
  {
    out.push(pos + norm * half_width * sign);
    return;
  }

  let (prev_idx, cur_idx) = if neighbor_is_prev { (neighbor_idx, self_idx) } else { (self_idx, neighbor_idx) };
  let rot_prev = rotate90_cw(points[prev_idx].dir);
  let rot_cur = rotate90_cw(points[cur_idx].dir);

  if style.line_join == LineJoin::Round {
    let v0 = pos + rot_prev * half_width * sign;
    let v2 = pos + rot_cur * half_width * sign;
    out.push(v0);
    if let Some((center, start, end, ccw)) = geometry::tangent_circle(v0, pos, v2, half_width) {
      geometry::append_arc(out, center, start, end, ccw);
    } else {
      out.push(v2);
    }
  } else {
    let (v0, v2) = if points[self_idx].properties.contains(PointProperties::SHARP) {
      (pos + rot_prev * half_width * sign, pos + rot_cur * half_width * sign)
    } else {
      (pos + points[prev_idx].norm * half_width * sign, pos + points[cur_idx].norm * half_width * sign)
    };
    out.push(v0);
    out.push(v2);
  }
}

fn append_cap(outer: &mut Vec<Point>, end: &FlatPoint, half_width: f32, cap: LineCap, front: bool) {
  if cap == LineCap::Butt {
    return;
  }

  let sign = if front { 1.0 } else { -1.0 };
  let dir = end.dir * half_width * sign;
  let ext = end.norm * half_width * -sign;

  let p0 = *outer.last().unwrap();
  let p1 = p0 + dir;
  let p2 = p1 + ext;
  let p3 = p2 + ext;
  let p4 = p3 - dir;

  match cap {
    LineCap::Round => {
      if let Some((center, _, _, ccw)) = geometry::tangent_circle(p0, p1, p2, half_width) {
        geometry::append_arc(outer, center, p0, p2, ccw);
      } else {
        outer.push(p2);
      }
      if let Some((center, _, _, ccw)) = geometry::tangent_circle(p2, p3, p4, half_width) {
        geometry::append_arc(outer, center, p2, p4, ccw);
      } else {
        outer.push(p4);
      }
    }
    LineCap::Square => {
      outer.push(p1);
      outer.push(p2);
      outer.push(p3);
      outer.push(p4);
    }
    LineCap::Butt => unreachable!(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::flatten::FlattenConfig;
  use crate::path::Path;
  use crate::flatten::Flattener;

  fn flatten_one(path: &Path) -> SubPath {
    let cfg = FlattenConfig::default();
    Flattener::new(&cfg).flatten(path).into_iter().next().unwrap()
  }

  #[test]
  fn closed_convex_polygon_miter_join_has_one_point_per_ring_per_vertex() {
    let mut path = Path::new();
    path.rect(0.0, 0.0, 100.0, 100.0);
    let sp = flatten_one(&path);
    assert_eq!(sp.points.len(), 4);

    let style = StrokeStyle { line_width: 10.0, miter_limit: 10.0, ..Default::default() };
    let contours = expand_stroke(&sp, &style, 0.01);
    assert_eq!(contours.len(), 1);
    // no corner exceeds the miter limit here, so every vertex takes the
    // plain (non-bevel) branch: one point per ring per input vertex, i.e.
    // `n` outer and `n` inner, not `2n` (a round/bevel join would add a
    // second point per ring per vertex instead).
    assert_eq!(contours[0].outer_points.len(), 4);
    assert_eq!(contours[0].inner_points.len(), 4);
  }

  #[test]
  fn open_round_capped_line_has_two_arcs() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.line_to(100.0, 0.0);
    let sp = flatten_one(&path);

    let style = StrokeStyle { line_width: 10.0, line_cap: LineCap::Round, ..Default::default() };
    let contours = expand_stroke(&sp, &style, 0.01);
    assert_eq!(contours.len(), 1);

    let pts = &contours[0].outer_points;
    let min_x = pts.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = pts.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = pts.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = pts.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    assert!((min_x - -5.0).abs() < 0.5);
    assert!((max_x - 105.0).abs() < 0.5);
    assert!((min_y - -5.0).abs() < 0.5);
    assert!((max_y - 5.0).abs() < 0.5);
  }

  #[test]
  fn dashed_line_produces_two_sub_strokes() {
    let mut path = Path::new();
    path.move_to(0.0, 0.0);
    path.line_to(40.0, 0.0);
    let sp = flatten_one(&path);

    let style = StrokeStyle { line_width: 2.0, dashes: vec![10.0, 10.0], ..Default::default() };
    let contours = expand_stroke(&sp, &style, 0.01);
    assert_eq!(contours.len(), 2);
  }
}
