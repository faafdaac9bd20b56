//! Environment with obstacles.
//!
//! The environment is the simulation loop's view of the world: it knows the static obstacles and
//! raises the collision flag of robots that touch an obstacle or each other.

use tracing::debug;

use super::{HasCollision, Kinematics, Position, Robot, Shape};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Environment {
    obstacles: Vec<Obstacle>,
}

impl Environment {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn has_collision(&self, object: &dyn HasCollision) -> bool {
        self.obstacles().iter().any(|o| o.has_collision(object))
    }

    /// Distance from `object` to the closest obstacle, `None` without obstacles.
    pub fn min_distance(&self, object: &dyn HasCollision) -> Option<f64> {
        self.obstacles
            .iter()
            .map(|o| o.min_distance(object))
            .min_by(|a, b| a.total_cmp(b))
    }

    /// Raises the collision flag of `robot` if it touches an obstacle. A raised flag is never
    /// lowered here.
    pub fn update_collision_flag<K: Kinematics>(&self, robot: &mut Robot<K>) -> bool {
        let collision = self.has_collision(robot);
        if collision && !robot.collision_flag() {
            debug!(robot = robot.id(), "robot collided with an obstacle");
            robot.set_collision_flag(true);
        }
        collision
    }

    /// Raises the collision flags of all robots touching an obstacle or another robot. Returns
    /// the number of robots in collision.
    pub fn update_collision_flags<K: Kinematics>(&self, robots: &mut [Robot<K>]) -> usize {
        let shapes = robots.iter().map(|r| r.shape()).collect::<Vec<_>>();
        let mut count = 0;
        for (i, robot) in robots.iter_mut().enumerate() {
            let with_robot = shapes
                .iter()
                .enumerate()
                .any(|(j, shape)| i != j && shapes[i].has_intersection(shape));
            if with_robot && !robot.collision_flag() {
                debug!(robot = robot.id(), "robot collided with another robot");
                robot.set_collision_flag(true);
            }
            if self.update_collision_flag(robot) || with_robot {
                count += 1;
            }
        }
        count
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    shape: Shape,
}

impl Obstacle {
    pub fn circle(center: Position, radius: f64) -> Self {
        Self {
            shape: Shape::Circle { center, radius },
        }
    }

    /// Axis-aligned rectangle centered on `center`.
    pub fn rectangle(center: Position, x_length: f64, y_length: f64) -> Self {
        Self {
            shape: Shape::rectangle(center, x_length, y_length),
        }
    }

    /// Polygon given by its world-frame vertices. It does not need to be convex.
    pub fn polygon(vertices: Vec<Position>) -> Self {
        Self {
            shape: Shape::Polygon { vertices },
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.shape, Shape::Circle { .. })
    }

    /// Tests a world-frame point, boundary inclusive.
    pub fn contains(&self, position: Position) -> bool {
        self.shape.has_intersection(&Shape::Circle {
            center: position,
            radius: 0.0,
        })
    }
}

impl HasCollision for Obstacle {
    fn shape(&self) -> Shape {
        self.shape.clone()
    }
}
