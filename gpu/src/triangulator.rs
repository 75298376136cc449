use std::collections::HashMap;

use lyon_path::{math::point as lyon_point, traits::PathBuilder, Path as LyonPath};
use lyon_tessellation::{BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers};
use tunis_geom::Point;

use crate::error::GpuError;

/// A triangulated polygon: the point array the triangle indices reference
/// by position, plus the accumulated bounding box. Per SPEC_FULL.md §4.D,
/// callers may rely on `triangles[i]` indexing directly into `points`.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
  pub points: Vec<Point>,
  pub triangles: Vec<[u32; 3]>,
  pub bound_min: Point,
  pub bound_max: Point,
}

/// Triangulates a simple polygon, optionally with one hole. A hole is only
/// built when `inner` has at least 3 points — fewer than that and `inner`
/// is ignored entirely, matching the source's hole-vs-no-hole branch.
pub fn triangulate(outer: &[Point], inner: &[Point]) -> Result<Triangulation, GpuError> {
  if outer.len() < 3 {
    return Err(GpuError::DegenerateGeometry);
  }
  let has_hole = inner.len() >= 3;

  let mut points = Vec::with_capacity(outer.len() + if has_hole { inner.len() } else { 0 });
  points.extend_from_slice(outer);
  if has_hole {
    points.extend_from_slice(inner);
  }

  // lyon renumbers vertices during tessellation (sweep-line order, not
  // submission order); map each emitted vertex back to its original index
  // by exact position so the output satisfies the "indices reference the
  // input array by position" contract.
  let mut index_of = HashMap::with_capacity(points.len());
  for (i, p) in points.iter().enumerate() {
    index_of.entry(bit_key(*p)).or_insert(i as u32);
  }

  let mut builder = LyonPath::builder();
  push_polygon(&mut builder, outer);
  if has_hole {
    push_polygon(&mut builder, inner);
  }
  let path = builder.build();

  let mut buffers: VertexBuffers<u32, u32> = VertexBuffers::new();
  let mut tess = FillTessellator::new();
  let options = FillOptions::default().with_fill_rule(FillRule::EvenOdd);
  tess.tessellate_path(
    &path,
    &options,
    &mut BuffersBuilder::new(&mut buffers, |v: FillVertex| {
      let pos = v.position();
      *index_of.get(&(pos.x.to_bits(), pos.y.to_bits())).unwrap_or(&0)
    }),
  )?;

  let triangles = buffers
    .indices
    .chunks_exact(3)
    .map(|c| [buffers.vertices[c[0] as usize], buffers.vertices[c[1] as usize], buffers.vertices[c[2] as usize]])
    .collect();

  let (bound_min, bound_max) = bounds(&points);
  Ok(Triangulation { points, triangles, bound_min, bound_max })
}

fn push_polygon(builder: &mut impl PathBuilder, pts: &[Point]) {
  builder.begin(lyon_point(pts[0].x, pts[0].y));
  for p in &pts[1..] {
    builder.line_to(lyon_point(p.x, p.y));
  }
  builder.end(true);
}

fn bit_key(p: Point) -> (u32, u32) { (p.x.to_bits(), p.y.to_bits()) }

fn bounds(points: &[Point]) -> (Point, Point) {
  let mut min = Point::new(f32::INFINITY, f32::INFINITY);
  let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
  for p in points {
    min.x = min.x.min(p.x);
    min.y = min.y.min(p.y);
    max.x = max.x.max(p.x);
    max.y = max.y.max(p.y);
  }
  (min, max)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn triangulates_a_square_into_two_triangles() {
    let square = vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0)];
    let result = triangulate(&square, &[]).unwrap();
    assert_eq!(result.triangles.len(), 2);
    assert_eq!(result.bound_min, Point::new(0.0, 0.0));
    assert_eq!(result.bound_max, Point::new(10.0, 10.0));
  }

  #[test]
  fn fewer_than_three_points_is_degenerate() {
    let line = vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)];
    assert!(matches!(triangulate(&line, &[]), Err(GpuError::DegenerateGeometry)));
  }

  #[test]
  fn small_inner_ring_is_not_treated_as_a_hole() {
    let outer = vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0)];
    let tiny_inner = vec![Point::new(5.0, 5.0), Point::new(5.0, 6.0)];
    let result = triangulate(&outer, &tiny_inner).unwrap();
    assert_eq!(result.points.len(), 4);
  }

  #[test]
  fn ring_with_a_hole_triangulates_without_crossing_into_it() {
    let outer = vec![Point::new(0.0, 0.0), Point::new(0.0, 10.0), Point::new(10.0, 10.0), Point::new(10.0, 0.0)];
    let hole = vec![Point::new(4.0, 4.0), Point::new(4.0, 6.0), Point::new(6.0, 6.0), Point::new(6.0, 4.0)];
    let result = triangulate(&outer, &hole).unwrap();
    assert!(!result.triangles.is_empty());
    assert_eq!(result.points.len(), 8);
  }
}
