//! Self-intersection checks backing `is_simple`.

use crate::geometry::Point;

use super::segment::{SegmentIntersection, intersect_segments};

fn dedup(points: &[Point], epsilon: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().is_none_or(|q| !q.equals_2d(p, epsilon)) {
            out.push(*p);
        }
    }
    out
}

/// A path is simple when it does not revisit a point, except that a closed
/// path may end where it started.
pub fn is_simple_path(points: &[Point], epsilon: f64) -> bool {
    let pts = dedup(points, epsilon);
    if pts.len() < 3 {
        return true;
    }
    let closed = pts.len() > 3 && pts[0].equals_2d(&pts[pts.len() - 1], epsilon);
    let last = pts.len() - 2;
    for i in 0..=last {
        for j in i + 1..=last {
            let hit = intersect_segments(&pts[i], &pts[i + 1], &pts[j], &pts[j + 1], epsilon);
            let shared = if j == i + 1 {
                Some(pts[j])
            } else if closed && i == 0 && j == last {
                Some(pts[0])
            } else {
                None
            };
            match (hit, shared) {
                (SegmentIntersection::None, _) => {}
                (SegmentIntersection::Point(p), Some(v)) if p.equals_2d(&v, epsilon) => {}
                _ => return false,
            }
        }
    }
    true
}

/// Two rings cross when an edge of one properly crosses or overlaps an
/// edge of the other. Touching at a vertex is allowed.
pub fn rings_cross(a: &[Point], b: &[Point], epsilon: f64) -> bool {
    for ea in a.windows(2) {
        for eb in b.windows(2) {
            match intersect_segments(&ea[0], &ea[1], &eb[0], &eb[1], epsilon) {
                SegmentIntersection::None => {}
                SegmentIntersection::Overlap(..) => return true,
                SegmentIntersection::Point(p) => {
                    let at_vertex = [&ea[0], &ea[1], &eb[0], &eb[1]]
                        .iter()
                        .any(|v| v.equals_2d(&p, epsilon));
                    if !at_vertex {
                        return true;
                    }
                }
            }
        }
    }
    false
}
