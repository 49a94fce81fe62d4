//! Pairwise Overlap
//!
//! Decides whether two placed shapes share an interior point. The fifteen
//! unordered pairings of the five primitive kinds are dispatched from one
//! exhaustive `match` after putting the pair in kind order, so every test
//! is symmetric by construction.
//!
//! ```text
//!             Point  Circle  Line  Polygon  Rectangle
//!  Point        -     in      -      in        in
//!  Circle             dist   disc   disc      clamp
//!  Line                      cross  enters    enters
//!  Polygon                          edges     edges
//!  Rectangle                                  open
//! ```
//!
//! Points have no interior, so they only overlap shapes that contain them
//! strictly. Degenerate polygons fall back to the point or line rules.

use crate::core::vec2::FixedVec2;
use super::bounds::BoundingBox;
use super::polygon::{
    self, WidePoint, contains_strictly, distance_squared, polygons_overlap,
    segment_enters, segment_meets_disc, segments_intersect,
};
use super::shape::Placed;

/// Placed shape normalized for dispatch.
enum Prim<'a> {
    Point(FixedVec2),
    Circle(FixedVec2, i32),
    Line(FixedVec2, FixedVec2),
    Polygon(&'a [FixedVec2]),
    Rectangle(BoundingBox),
}

impl<'a> Prim<'a> {
    /// `None` for shapes that can never overlap anything.
    fn of(placed: &'a Placed) -> Option<Self> {
        Some(match placed {
            Placed::Point(p) => Prim::Point(*p),
            Placed::Circle { center, radius } => Prim::Circle(*center, *radius),
            Placed::Line { start, end } => Prim::Line(*start, *end),
            Placed::Polygon { vertices, .. } => match vertices.len() {
                0 => return None,
                1 => Prim::Point(vertices[0]),
                2 => Prim::Line(vertices[0], vertices[1]),
                _ => Prim::Polygon(vertices),
            },
            Placed::Rectangle(rect) => Prim::Rectangle(*rect),
        })
    }

    fn rank(&self) -> u8 {
        match self {
            Prim::Point(_) => 0,
            Prim::Circle(..) => 1,
            Prim::Line(..) => 2,
            Prim::Polygon(_) => 3,
            Prim::Rectangle(_) => 4,
        }
    }
}

fn wide(points: &[FixedVec2]) -> Vec<WidePoint> {
    points.iter().map(|p| WidePoint::from(*p)).collect()
}

fn rect_vertices(rect: &BoundingBox) -> Vec<WidePoint> {
    rect.corners().iter().map(|p| WidePoint::from(*p)).collect()
}

/// Do two placed shapes share an interior point?
pub fn overlap(a: &Placed, b: &Placed) -> bool {
    if !a.bounds().meets(&b.bounds()) {
        return false;
    }
    let (Some(a), Some(b)) = (Prim::of(a), Prim::of(b)) else {
        return false;
    };
    let (a, b) = if a.rank() <= b.rank() { (a, b) } else { (b, a) };

    match (a, b) {
        (Prim::Point(_), Prim::Point(_)) => false,
        (Prim::Point(p), Prim::Circle(c, r)) => point_in_circle(p, c, r),
        (Prim::Point(_), Prim::Line(..)) => false,
        (Prim::Point(p), Prim::Polygon(vs)) => contains_strictly(&wide(vs), p.into()),
        (Prim::Point(p), Prim::Rectangle(rect)) => rect.contains_point_strictly(p),

        (Prim::Circle(c1, r1), Prim::Circle(c2, r2)) => {
            let reach = r1 as i128 + r2 as i128;
            distance_squared(c1.into(), c2.into()) < reach * reach
        }
        (Prim::Circle(c, r), Prim::Line(s, e)) => {
            segment_meets_disc(s.into(), e.into(), c.into(), r as i64)
        }
        (Prim::Circle(c, r), Prim::Polygon(vs)) => circle_polygon(c, r, &wide(vs)),
        (Prim::Circle(c, r), Prim::Rectangle(rect)) => circle_rectangle(c, r, &rect),

        (Prim::Line(s1, e1), Prim::Line(s2, e2)) => {
            segments_intersect(s1.into(), e1.into(), s2.into(), e2.into())
        }
        (Prim::Line(s, e), Prim::Polygon(vs)) => segment_enters(&wide(vs), s.into(), e.into()),
        (Prim::Line(s, e), Prim::Rectangle(rect)) => line_rectangle(s, e, &rect),

        (Prim::Polygon(p), Prim::Polygon(q)) => polygons_overlap(&wide(p), &wide(q)),
        (Prim::Polygon(vs), Prim::Rectangle(rect)) => polygon_rectangle(vs, &rect),

        (Prim::Rectangle(r1), Prim::Rectangle(r2)) => r1.overlaps(&r2),

        // Kind order rules out the mirrored pairs
        _ => unreachable!("overlap pair not normalized"),
    }
}

fn point_in_circle(p: FixedVec2, center: FixedVec2, radius: i32) -> bool {
    let r = radius as i128;
    distance_squared(p.into(), center.into()) < r * r
}

fn circle_polygon(center: FixedVec2, radius: i32, vertices: &[WidePoint]) -> bool {
    let c = WidePoint::from(center);
    contains_strictly(vertices, c)
        || polygon::edges(vertices).any(|(a, b)| segment_meets_disc(a, b, c, radius as i64))
}

fn circle_rectangle(center: FixedVec2, radius: i32, rect: &BoundingBox) -> bool {
    let nearest = FixedVec2::new(
        center.x.clamp(rect.left, rect.right),
        center.y.clamp(rect.top, rect.bottom),
    );
    point_in_circle(nearest, center, radius)
}

fn line_rectangle(start: FixedVec2, end: FixedVec2, rect: &BoundingBox) -> bool {
    if rect.contains_point_strictly(start) || rect.contains_point_strictly(end) {
        return true;
    }
    if rect.width() == 0 || rect.height() == 0 {
        return false;
    }
    segment_enters(&rect_vertices(rect), start.into(), end.into())
}

fn polygon_rectangle(vertices: &[FixedVec2], rect: &BoundingBox) -> bool {
    if vertices.iter().any(|v| rect.contains_point_strictly(*v)) {
        return true;
    }
    if rect.width() == 0 || rect.height() == 0 {
        return false;
    }
    polygons_overlap(&wide(vertices), &rect_vertices(rect))
}
