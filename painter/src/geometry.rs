use tunis_geom::{cross, Point};

/// Given three points `p0 -> p1 -> p2` and a fillet radius `r`, computes the
/// circle tangent to both segments at `p1`, returning `(center, tangent on
/// the p0 side, tangent on the p2 side, is_ccw)`. Degenerate configurations
/// (near-coincident points, collinear segments, or a radius too large/small
/// to fit) return `None` — callers fall back to using `p1` directly, the
/// same degenerate-case policy the path-level `arcTo` command uses.
pub fn tangent_circle(p0: Point, p1: Point, p2: Point, r: f32) -> Option<(Point, Point, Point, bool)> {
  let d0 = p0 - p1;
  let d1 = p2 - p1;
  let (len0, len1) = (d0.length(), d1.length());
  if len0 < 1e-6 || len1 < 1e-6 || r < 1e-6 {
    return None;
  }

  let a0 = d0 / len0;
  let a1 = d1 / len1;
  let turn = cross(a0, a1);
  if turn.abs() < 1e-6 {
    return None;
  }

  let cos_theta = a0.dot(a1).clamp(-1.0, 1.0);
  let half_theta = cos_theta.acos() / 2.0;
  let dist = r / half_theta.sin();
  if !dist.is_finite() {
    return None;
  }

  let bisector = (a0 + a1).normalize();
  let center = p1 + bisector * dist;
  let t = r / half_theta.tan();
  let start = p1 + a0 * t;
  let end = p1 + a1 * t;
  Some((center, start, end, turn > 0.0))
}

/// Samples a circular arc of fixed resolution from `from` to `to` around
/// `center`, appending the samples (including the endpoint `to`, excluding
/// `from`) to `out`.
pub fn append_arc(out: &mut Vec<Point>, center: Point, from: Point, to: Point, ccw: bool) {
  const SEGMENTS: usize = 8;
  let r = (from - center).length();
  let a0 = (from - center).angle_from_x_axis().radians;
  let mut a1 = (to - center).angle_from_x_axis().radians;
  let tau = std::f32::consts::TAU;
  if ccw {
    if a1 > a0 {
      a1 -= tau;
    }
  } else if a1 < a0 {
    a1 += tau;
  }
  for i in 1..=SEGMENTS {
    let t = i as f32 / SEGMENTS as f32;
    let a = a0 + (a1 - a0) * t;
    out.push(Point::new(center.x + r * a.cos(), center.y + r * a.sin()));
  }
}
