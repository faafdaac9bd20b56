//! Collision detection and distance queries based on basic world-frame shapes.
//!
//! All intersection tests are boundary inclusive: touching shapes collide.

use super::Position;

pub trait HasCollision {
    fn has_collision(&self, other: &dyn HasCollision) -> bool {
        self.shape().has_intersection(&other.shape())
    }

    fn min_distance(&self, other: &dyn HasCollision) -> f64 {
        self.shape().min_distance(&other.shape())
    }

    fn shape(&self) -> Shape;
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { center: Position, radius: f64 },
    /// Closed polygon, the last vertex connects back to the first.
    Polygon { vertices: Vec<Position> },
}

impl Shape {
    /// Axis-aligned rectangle as a polygon.
    pub fn rectangle(center: Position, x_length: f64, y_length: f64) -> Self {
        let (dx, dy) = (x_length / 2.0, y_length / 2.0);
        Shape::Polygon {
            vertices: vec![
                center + Position::new(-dx, -dy),
                center + Position::new(dx, -dy),
                center + Position::new(dx, dy),
                center + Position::new(-dx, dy),
            ],
        }
    }

    pub fn has_intersection(&self, other: &Shape) -> bool {
        match (self, other) {
            (
                Shape::Circle { center, radius },
                Shape::Circle {
                    center: other_center,
                    radius: other_radius,
                },
            ) => collision_circle_circle(*center, *radius, *other_center, *other_radius),
            (Shape::Circle { center, radius }, Shape::Polygon { vertices })
            | (Shape::Polygon { vertices }, Shape::Circle { center, radius }) => {
                collision_circle_polygon(*center, *radius, vertices)
            }
            (
                Shape::Polygon { vertices },
                Shape::Polygon {
                    vertices: other_vertices,
                },
            ) => collision_polygon_polygon(vertices, other_vertices),
        }
    }

    /// Minimum distance between the boundaries. Circle pairs report the penetration depth as a
    /// negative distance; overlapping polygons report zero.
    pub fn min_distance(&self, other: &Shape) -> f64 {
        match (self, other) {
            (
                Shape::Circle { center, radius },
                Shape::Circle {
                    center: other_center,
                    radius: other_radius,
                },
            ) => center.distance(*other_center) - (radius + other_radius),
            (Shape::Circle { center, radius }, Shape::Polygon { vertices })
            | (Shape::Polygon { vertices }, Shape::Circle { center, radius }) => {
                let boundary = distance_to_boundary(*center, vertices);
                if polygon_contains(vertices, *center) {
                    -boundary - radius
                } else {
                    boundary - radius
                }
            }
            (
                Shape::Polygon { vertices },
                Shape::Polygon {
                    vertices: other_vertices,
                },
            ) => {
                if collision_polygon_polygon(vertices, other_vertices) {
                    0.0
                } else {
                    vertices
                        .iter()
                        .map(|v| distance_to_boundary(*v, other_vertices))
                        .chain(
                            other_vertices
                                .iter()
                                .map(|v| distance_to_boundary(*v, vertices)),
                        )
                        .fold(f64::INFINITY, f64::min)
                }
            }
        }
    }
}

pub fn collision_circle_circle(
    center: Position,
    radius: f64,
    other_center: Position,
    other_radius: f64,
) -> bool {
    center.distance(other_center) <= radius + other_radius
}

pub fn collision_circle_polygon(center: Position, radius: f64, vertices: &[Position]) -> bool {
    polygon_contains(vertices, center) || distance_to_boundary(center, vertices) <= radius
}

pub fn collision_polygon_polygon(vertices: &[Position], other_vertices: &[Position]) -> bool {
    let crossing = edges(vertices).any(|(a, b)| {
        edges(other_vertices).any(|(c, d)| segments_intersect(a, b, c, d))
    });
    // Without crossing edges one polygon is either disjoint from or nested in the other.
    crossing
        || vertices
            .first()
            .is_some_and(|v| polygon_contains(other_vertices, *v))
        || other_vertices
            .first()
            .is_some_and(|v| polygon_contains(vertices, *v))
}

/// Point-in-polygon test by ray casting; points on the boundary are inside.
pub fn polygon_contains(vertices: &[Position], point: Position) -> bool {
    if vertices.is_empty() {
        return false;
    }
    if distance_to_boundary(point, vertices) <= f64::EPSILON {
        return true;
    }
    edges(vertices)
        .filter(|(a, b)| {
            (a.y() > point.y()) != (b.y() > point.y())
                && point.x()
                    < a.x() + (point.y() - a.y()) * (b.x() - a.x()) / (b.y() - a.y())
        })
        .count()
        % 2
        == 1
}

pub fn distance_to_boundary(point: Position, vertices: &[Position]) -> f64 {
    edges(vertices)
        .map(|(a, b)| point_segment_distance(point, a, b))
        .fold(f64::INFINITY, f64::min)
}

pub fn point_segment_distance(point: Position, a: Position, b: Position) -> f64 {
    let ab = b - a;
    let length_squared = ab.dot(ab);
    if length_squared == 0.0 {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / length_squared).clamp(0.0, 1.0);
    point.distance(a + ab.scale(t))
}

fn edges(vertices: &[Position]) -> impl Iterator<Item = (Position, Position)> + '_ {
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

fn segments_intersect(a: Position, b: Position, c: Position, d: Position) -> bool {
    let d1 = (b - a).cross(c - a);
    let d2 = (b - a).cross(d - a);
    let d3 = (d - c).cross(a - c);
    let d4 = (d - c).cross(b - c);
    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }
    (d1 == 0.0 && on_segment(a, b, c))
        || (d2 == 0.0 && on_segment(a, b, d))
        || (d3 == 0.0 && on_segment(c, d, a))
        || (d4 == 0.0 && on_segment(c, d, b))
}

/// Whether `p`, known to be collinear with `a` and `b`, lies between them.
fn on_segment(a: Position, b: Position, p: Position) -> bool {
    p.x() >= a.x().min(b.x())
        && p.x() <= a.x().max(b.x())
        && p.y() >= a.y().min(b.y())
        && p.y() <= a.y().max(b.y())
}
