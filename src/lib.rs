//! Kinematic and collision core of a multi-robot 2D motion simulator.
//!
//! Robots advance under commanded velocities, detect arrival at their goal and test their
//! footprint against points, obstacles and other robots. Rendering, sensing and planning are left
//! to the caller.


pub mod domain;

pub use domain::*;
