//! Exact Segment and Polygon Predicates
//!
//! All predicates work on [`WidePoint`]s (i64 coordinates) and evaluate
//! cross and dot products in i128, so there is no rounding anywhere.
//! Midpoints are handled by doubling every coordinate first, which keeps
//! them on the integer lattice.
//!
//! Coordinates must stay inside the Q16.16 working range for products to
//! be exact; squared quantities saturate instead of wrapping beyond it.

use std::cmp::Ordering;

use crate::core::vec2::FixedVec2;

/// Integer point with headroom for doubling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidePoint {
    /// X (raw fixed-point units, possibly doubled)
    pub x: i64,
    /// Y (raw fixed-point units, possibly doubled)
    pub y: i64,
}

impl WidePoint {
    /// Create a point.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Twice this point.
    #[inline]
    pub const fn doubled(self) -> Self {
        Self { x: self.x * 2, y: self.y * 2 }
    }

    /// Sum of two points (twice their midpoint).
    #[inline]
    pub const fn plus(self, other: Self) -> Self {
        Self { x: self.x + other.x, y: self.y + other.y }
    }
}

impl From<FixedVec2> for WidePoint {
    #[inline]
    fn from(v: FixedVec2) -> Self {
        Self { x: v.x as i64, y: v.y as i64 }
    }
}

/// Cross product of `(a - o)` and `(b - o)`.
///
/// Positive when `o -> a -> b` turns clockwise on screen (+y down).
#[inline]
pub fn cross(o: WidePoint, a: WidePoint, b: WidePoint) -> i128 {
    let (ax, ay) = ((a.x - o.x) as i128, (a.y - o.y) as i128);
    let (bx, by) = ((b.x - o.x) as i128, (b.y - o.y) as i128);
    ax * by - ay * bx
}

/// Dot product of `(a - o)` and `(b - o)`.
#[inline]
pub fn dot(o: WidePoint, a: WidePoint, b: WidePoint) -> i128 {
    let (ax, ay) = ((a.x - o.x) as i128, (a.y - o.y) as i128);
    let (bx, by) = ((b.x - o.x) as i128, (b.y - o.y) as i128);
    ax * bx + ay * by
}

/// Squared distance, saturating.
#[inline]
pub fn distance_squared(a: WidePoint, b: WidePoint) -> i128 {
    let dx = (a.x - b.x) as i128;
    let dy = (a.y - b.y) as i128;
    dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
}

/// True if `p` lies on the closed segment `a..b`.
pub fn on_segment(p: WidePoint, a: WidePoint, b: WidePoint) -> bool {
    cross(a, b, p) == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// True if the closed segments `a..b` and `c..d` share a point.
pub fn segments_intersect(a: WidePoint, b: WidePoint, c: WidePoint, d: WidePoint) -> bool {
    let d1 = cross(c, d, a).signum();
    let d2 = cross(c, d, b).signum();
    let d3 = cross(a, b, c).signum();
    let d4 = cross(a, b, d).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    on_segment(a, c, d) || on_segment(b, c, d) || on_segment(c, a, b) || on_segment(d, a, b)
}

/// True if the segments cross at a single point interior to both.
pub fn segments_cross_properly(a: WidePoint, b: WidePoint, c: WidePoint, d: WidePoint) -> bool {
    let d1 = cross(c, d, a).signum();
    let d2 = cross(c, d, b).signum();
    let d3 = cross(a, b, c).signum();
    let d4 = cross(a, b, d).signum();
    d1 * d2 < 0 && d3 * d4 < 0
}

/// Iterate polygon edges, including the closing one.
pub fn edges(vertices: &[WidePoint]) -> impl Iterator<Item = (WidePoint, WidePoint)> + '_ {
    let n = vertices.len();
    (0..n).map(move |i| (vertices[i], vertices[(i + 1) % n]))
}

/// True if `p` lies on any edge of the polygon.
pub fn on_boundary(p: WidePoint, vertices: &[WidePoint]) -> bool {
    edges(vertices).any(|(a, b)| on_segment(p, a, b))
}

/// Strict point-in-polygon test. Points on the boundary are outside.
///
/// Counts crossings of a horizontal ray from `p` toward negative x, which
/// ends outside the polygon's bounding box. Edges are treated half-open in
/// y so a ray through a vertex is counted once.
pub fn contains_strictly(vertices: &[WidePoint], p: WidePoint) -> bool {
    if vertices.len() < 3 || on_boundary(p, vertices) {
        return false;
    }

    let mut inside = false;
    for (a, b) in edges(vertices) {
        if (a.y > p.y) == (b.y > p.y) {
            continue;
        }
        // x of the edge at height p.y, relative to p.x, is num / den
        let den = (b.y - a.y) as i128;
        let num = (a.x - p.x) as i128 * den + (p.y - a.y) as i128 * (b.x - a.x) as i128;
        if num.signum() * den.signum() < 0 {
            inside = !inside;
        }
    }
    inside
}

/// True if the closed segment `a..b` contains a point strictly inside the
/// polygon.
///
/// A proper crossing with any edge settles it. Otherwise the segment can
/// only touch the boundary at its own endpoints, at polygon vertices, or
/// along collinear stretches, so the pieces between consecutive touch
/// points lie either wholly inside, wholly outside, or on the boundary.
/// Testing each piece's midpoint decides the rest.
pub fn segment_enters(vertices: &[WidePoint], a: WidePoint, b: WidePoint) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    if contains_strictly(vertices, a) || contains_strictly(vertices, b) {
        return true;
    }
    if edges(vertices).any(|(c, d)| segments_cross_properly(a, b, c, d)) {
        return true;
    }

    let mut stops: Vec<WidePoint> = vec![a, b];
    stops.extend(vertices.iter().copied().filter(|v| on_segment(*v, a, b)));
    stops.sort_by(|p, q| dot(a, b, *p).cmp(&dot(a, b, *q)));
    stops.dedup();

    let doubled: Vec<WidePoint> = vertices.iter().map(|v| v.doubled()).collect();
    stops.windows(2).any(|pair| {
        let mid = pair[0].plus(pair[1]);
        contains_strictly(&doubled, mid)
    })
}

/// Polygon interiors intersect.
///
/// Either some edge of one polygon passes through the other's interior,
/// or the polygons coincide (same vertex set).
pub fn polygons_overlap(p: &[WidePoint], q: &[WidePoint]) -> bool {
    if edges(p).any(|(a, b)| segment_enters(q, a, b)) {
        return true;
    }
    if edges(q).any(|(a, b)| segment_enters(p, a, b)) {
        return true;
    }
    same_vertex_set(p, q)
}

fn same_vertex_set(p: &[WidePoint], q: &[WidePoint]) -> bool {
    let mut left: Vec<WidePoint> = p.to_vec();
    let mut right: Vec<WidePoint> = q.to_vec();
    left.sort();
    left.dedup();
    right.sort();
    right.dedup();
    left.len() >= 3 && left == right
}

/// True if the closed segment `a..b` comes strictly closer than `radius`
/// to `center`.
pub fn segment_meets_disc(a: WidePoint, b: WidePoint, center: WidePoint, radius: i64) -> bool {
    let r2 = (radius as i128).saturating_mul(radius as i128);
    let dd = dot(a, b, b);
    if dd == 0 {
        return distance_squared(a, center) < r2;
    }

    let t = dot(a, b, center);
    match (t.cmp(&0), t.cmp(&dd)) {
        (Ordering::Less | Ordering::Equal, _) => distance_squared(a, center) < r2,
        (_, Ordering::Greater | Ordering::Equal) => distance_squared(b, center) < r2,
        _ => {
            // Perpendicular foot lies inside the segment
            let c = cross(a, b, center);
            c.saturating_mul(c) < r2.saturating_mul(dd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: i64, y: i64) -> WidePoint {
        WidePoint::new(x, y)
    }

    fn square() -> Vec<WidePoint> {
        vec![pt(0, 0), pt(10, 0), pt(10, 10), pt(0, 10)]
    }

    #[test]
    fn test_contains_strictly() {
        let sq = square();
        assert!(contains_strictly(&sq, pt(5, 5)));
        assert!(!contains_strictly(&sq, pt(0, 5)), "edge point is outside");
        assert!(!contains_strictly(&sq, pt(10, 10)), "vertex is outside");
        assert!(!contains_strictly(&sq, pt(11, 5)));
        assert!(!contains_strictly(&sq, pt(-1, 5)));
    }

    #[test]
    fn test_contains_concave() {
        // U shape opening upward
        let u = vec![pt(0, 0), pt(3, 0), pt(3, 7), pt(7, 7), pt(7, 0), pt(10, 0), pt(10, 10), pt(0, 10)];
        assert!(contains_strictly(&u, pt(1, 5)));
        assert!(!contains_strictly(&u, pt(5, 5)), "inside the notch is outside");
        assert!(contains_strictly(&u, pt(5, 8)));
        // Ray passes exactly through vertices (3, 7) and (7, 7)
        assert!(!contains_strictly(&u, pt(5, 7)));
        assert!(contains_strictly(&u, pt(9, 7)));
    }

    #[test]
    fn test_segments_intersect_closed() {
        assert!(segments_intersect(pt(0, 0), pt(10, 10), pt(0, 10), pt(10, 0)));
        assert!(segments_intersect(pt(0, 0), pt(5, 0), pt(5, 0), pt(5, 5)), "shared endpoint");
        assert!(segments_intersect(pt(0, 0), pt(5, 0), pt(3, 0), pt(8, 0)), "collinear overlap");
        assert!(!segments_intersect(pt(0, 0), pt(5, 0), pt(6, 0), pt(8, 0)));
        assert!(!segments_cross_properly(pt(0, 0), pt(5, 0), pt(5, 0), pt(5, 5)));
    }

    #[test]
    fn test_segment_enters() {
        let sq = square();
        assert!(segment_enters(&sq, pt(-5, 5), pt(15, 5)), "straight through");
        assert!(!segment_enters(&sq, pt(-5, 0), pt(15, 0)), "along an edge");
        assert!(!segment_enters(&sq, pt(-5, -5), pt(0, 0)), "touches a corner");
        assert!(segment_enters(&sq, pt(0, 0), pt(10, 10)), "diagonal between corners");
        assert!(!segment_enters(&sq, pt(-5, 5), pt(0, 5)), "ends on the boundary");
    }

    #[test]
    fn test_polygons_overlap() {
        let sq = square();
        let shifted: Vec<WidePoint> = sq.iter().map(|p| pt(p.x + 5, p.y + 5)).collect();
        let adjacent: Vec<WidePoint> = sq.iter().map(|p| pt(p.x + 10, p.y)).collect();
        let diamond = vec![pt(5, 0), pt(10, 5), pt(5, 10), pt(0, 5)];

        assert!(polygons_overlap(&sq, &shifted));
        assert!(!polygons_overlap(&sq, &adjacent), "shared edge only");
        assert!(polygons_overlap(&sq, &diamond), "inscribed with vertices on edges");
        assert!(polygons_overlap(&sq, &sq.iter().rev().copied().collect::<Vec<_>>()), "coincident");
    }

    #[test]
    fn test_segment_meets_disc() {
        let c = pt(0, 0);
        assert!(segment_meets_disc(pt(-10, 1), pt(10, 1), c, 2));
        assert!(!segment_meets_disc(pt(-10, 2), pt(10, 2), c, 2), "tangent is not inside the open disc");
        assert!(!segment_meets_disc(pt(3, 0), pt(10, 0), c, 2));
        assert!(segment_meets_disc(pt(1, 0), pt(1, 0), c, 2), "degenerate segment");
    }
}
