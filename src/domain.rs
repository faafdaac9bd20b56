//! The domain module encapsulates the kinematic and collision core. It defines the `Robot` and
//! `Environment` entities, along with the geometry their interactions are computed on.
//!
//! Robot kinds plug in through the `Kinematics` trait, robot outlines through `Appearance`.

mod basis;
mod collision;
mod cone;
mod dynamics;
mod environment;
mod robot;

pub use basis::{get_transform, relative_position, wrap_to_pi, Angle, Position, Transform};
pub use collision::{
    collision_circle_circle, collision_circle_polygon, collision_polygon_polygon,
    distance_to_boundary, point_segment_distance, polygon_contains, HasCollision, Shape,
};
pub use cone::{in_cone, ConeType, Footprint, FootprintError};
pub use dynamics::{Ackermann, DiffDrive, Kinematics, KinematicsError, Omni};
pub use environment::{Environment, Obstacle};
pub use robot::{
    Appearance, ArriveMode, MoveOptions, NoiseConfig, Quantity, Robot, RobotConfig, RobotError,
};
