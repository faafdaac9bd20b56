//! Mobile robot driven by commanded velocities.
//!
//! A robot owns its kinematic state, velocity limits, goal and flags. Every call to
//! [`Robot::drive`] clamps the commanded velocity, applies the stop policy, integrates the state
//! through the robot's [`Kinematics`], records the previous state and re-evaluates arrival.

use std::{fmt, mem};

use nalgebra::DVector;
use rand::{
    distr::{Distribution, Uniform},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    basis::get_transform, Angle, Footprint, FootprintError, HasCollision, Kinematics, Position,
    Shape,
};

#[derive(Clone, Debug)]
pub struct Robot<K> {
    id: usize,
    kinematics: K,
    appearance: Appearance,
    footprint: Footprint,
    state: DVector<f64>,
    velocity: DVector<f64>,
    goal: DVector<f64>,
    init_state: DVector<f64>,
    init_velocity: DVector<f64>,
    init_goal: DVector<f64>,
    vel_min: DVector<f64>,
    vel_max: DVector<f64>,
    trajectory: Vec<DVector<f64>>,
    noise: Option<ControlNoise>,
    arrive_flag: bool,
    collision_flag: bool,
    config: RobotConfig,
}

impl<K: Kinematics> Robot<K> {
    pub fn new(
        id: usize,
        kinematics: K,
        appearance: Appearance,
        state: DVector<f64>,
        velocity: DVector<f64>,
        goal: DVector<f64>,
        config: RobotConfig,
    ) -> Result<Self, RobotError> {
        let vel_dim = kinematics.vel_dim();
        check_dim(Quantity::State, kinematics.state_dim(), state.len())?;
        check_dim(Quantity::Velocity, vel_dim, velocity.len())?;
        check_dim(Quantity::Goal, kinematics.goal_dim(), goal.len())?;

        let vel_min = config
            .vel_min
            .clone()
            .unwrap_or_else(|| DVector::from_element(vel_dim, f64::NEG_INFINITY));
        let vel_max = config
            .vel_max
            .clone()
            .unwrap_or_else(|| DVector::from_element(vel_dim, f64::INFINITY));
        check_dim(Quantity::VelocityMin, vel_dim, vel_min.len())?;
        check_dim(Quantity::VelocityMax, vel_dim, vel_max.len())?;
        for (index, (min, max)) in vel_min.iter().zip(vel_max.iter()).enumerate() {
            if !(min <= max) {
                return Err(RobotError::InvalidVelocityBounds {
                    index,
                    min: *min,
                    max: *max,
                });
            }
        }

        if !(config.goal_threshold >= 0.0) {
            return Err(RobotError::InvalidGoalThreshold(config.goal_threshold));
        }
        check_step_time(config.step_time)?;

        let noise = config
            .noise
            .as_ref()
            .map(|noise| ControlNoise::new(noise, vel_dim))
            .transpose()?;
        let footprint = appearance.footprint()?;

        Ok(Self {
            id,
            kinematics,
            appearance,
            footprint,
            state: state.clone(),
            velocity: velocity.clone(),
            goal: goal.clone(),
            init_state: state,
            init_velocity: velocity,
            init_goal: goal,
            vel_min,
            vel_max,
            trajectory: Vec::new(),
            noise,
            arrive_flag: false,
            collision_flag: false,
            config,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn kinematics(&self) -> &K {
        &self.kinematics
    }

    pub fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn state(&self) -> &DVector<f64> {
        &self.state
    }

    /// Velocity applied during the last step, or the one set by [`Robot::update_info`].
    pub fn velocity(&self) -> &DVector<f64> {
        &self.velocity
    }

    pub fn goal(&self) -> &DVector<f64> {
        &self.goal
    }

    pub fn vel_min(&self) -> &DVector<f64> {
        &self.vel_min
    }

    pub fn vel_max(&self) -> &DVector<f64> {
        &self.vel_max
    }

    /// States before each accepted step, oldest first.
    pub fn trajectory(&self) -> &[DVector<f64>] {
        &self.trajectory
    }

    pub fn arrive_flag(&self) -> bool {
        self.arrive_flag
    }

    pub fn collision_flag(&self) -> bool {
        self.collision_flag
    }

    /// Sets or clears the collision flag. The environment only ever raises it; [`Robot::reset`]
    /// clears it as well.
    pub fn set_collision_flag(&mut self, collision: bool) {
        self.collision_flag = collision;
    }

    pub fn position(&self) -> Position {
        Position::new(
            self.state.get(0).copied().unwrap_or_default(),
            self.state.get(1).copied().unwrap_or_default(),
        )
    }

    pub fn heading(&self) -> Angle {
        self.kinematics.heading(&self.state)
    }

    /// Advances the robot by one step with the commanded `velocity`.
    ///
    /// Out-of-range components are clipped to the velocity bounds. Once the robot has arrived or
    /// collided and `options.stop` is set, the robot stands still.
    pub fn drive(
        &mut self,
        velocity: &DVector<f64>,
        options: MoveOptions,
    ) -> Result<(), RobotError> {
        let state_dim = self.kinematics.state_dim();
        check_dim(Quantity::Velocity, self.kinematics.vel_dim(), velocity.len())?;
        check_dim(Quantity::State, state_dim, self.state.len())?;
        let step_time = options.step_time.unwrap_or(self.config.step_time);
        check_step_time(step_time)?;
        if let Some((index, &value)) = velocity.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(RobotError::NonFiniteVelocity { index, value });
        }

        let mut velocity = velocity.clone();
        if let Some(noise) = self.noise.as_mut() {
            noise.perturb(&mut velocity);
        }

        if velocity
            .iter()
            .zip(self.vel_min.iter().zip(self.vel_max.iter()))
            .any(|(v, (min, max))| v < min || v > max)
        {
            velocity = velocity.zip_zip_map(&self.vel_min, &self.vel_max, |v, min, max| {
                v.clamp(min, max)
            });
            warn!(
                robot = self.id,
                velocity = ?velocity.as_slice(),
                "the velocity is clipped"
            );
        }

        if options.stop && (self.arrive_flag || self.collision_flag) {
            velocity.fill(0.0);
        }

        let next = self
            .kinematics
            .integrate(&self.state, &velocity, step_time);
        check_dim(Quantity::IntegratedState, state_dim, next.len())?;

        self.trajectory.push(mem::replace(&mut self.state, next));
        self.velocity = velocity;

        let arrived = self.arrive();
        if arrived && !self.arrive_flag {
            debug!(
                robot = self.id,
                kind = self.kinematics.name(),
                state = ?self.state.as_slice(),
                "robot arrived at its goal"
            );
        }
        self.arrive_flag = arrived;
        Ok(())
    }

    /// Overwrites state and velocity with values computed elsewhere, without any validation.
    pub fn update_info(&mut self, state: DVector<f64>, velocity: DVector<f64>) {
        self.state = state;
        self.velocity = velocity;
    }

    /// Whether the robot is within the goal threshold, judged according to the arrive mode.
    pub fn arrive(&self) -> bool {
        let dim = match self.config.arrive_mode {
            ArriveMode::Position => self.kinematics.position_dim(),
            ArriveMode::State => self.kinematics.goal_dim(),
        };
        let distance = self
            .state
            .iter()
            .zip(self.goal.iter())
            .take(dim)
            .map(|(s, g)| (s - g).powi(2))
            .sum::<f64>()
            .sqrt();
        distance <= self.config.goal_threshold
    }

    /// Restores the construction-time state, velocity and goal, and clears flags and trajectory.
    pub fn reset(&mut self) {
        self.state = self.init_state.clone();
        self.velocity = self.init_velocity.clone();
        self.goal = self.init_goal.clone();
        self.trajectory.clear();
        self.arrive_flag = false;
        self.collision_flag = false;
    }

    /// Whether the world-frame `point` lies inside the robot's footprint, boundary inclusive.
    pub fn collision_check_point(&self, point: &DVector<f64>) -> Result<bool, RobotError> {
        check_dim(Quantity::Point, self.kinematics.position_dim(), point.len())?;
        check_dim(
            Quantity::State,
            self.kinematics.state_dim(),
            self.state.len(),
        )?;
        let transform = get_transform(self.position(), self.heading());
        let body_point = transform.to_body(Position::new(point[0], point[1]));
        Ok(self.footprint.contains(body_point))
    }

    pub fn collision_check_obstacle(&self, obstacle: &dyn HasCollision) -> bool {
        self.has_collision(obstacle)
    }
}

impl<K: Kinematics> HasCollision for Robot<K> {
    fn shape(&self) -> Shape {
        let transform = get_transform(self.position(), self.heading());
        match &self.appearance {
            Appearance::Circle { radius } => Shape::Circle {
                center: self.position(),
                radius: *radius,
            },
            Appearance::Rectangle { .. } | Appearance::Polygon { .. } => Shape::Polygon {
                vertices: self
                    .appearance
                    .body_vertices()
                    .into_iter()
                    .map(|v| transform.to_world(v))
                    .collect(),
            },
        }
    }
}

fn check_dim(quantity: Quantity, expected: usize, actual: usize) -> Result<(), RobotError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RobotError::DimensionMismatch {
            quantity,
            expected,
            actual,
        })
    }
}

fn check_step_time(step_time: f64) -> Result<(), RobotError> {
    if step_time > 0.0 && step_time.is_finite() {
        Ok(())
    } else {
        Err(RobotError::InvalidStepTime(step_time))
    }
}

/// Outline of the robot body.
#[derive(Clone, Debug, PartialEq)]
pub enum Appearance {
    Circle { radius: f64 },
    /// Centered on the body origin, `length` along the heading.
    Rectangle { length: f64, width: f64 },
    /// Convex polygon in body coordinates.
    Polygon { vertices: Vec<Position> },
}

impl Appearance {
    pub fn footprint(&self) -> Result<Footprint, FootprintError> {
        match self {
            Appearance::Circle { radius } => Footprint::circle(*radius),
            Appearance::Rectangle { length, width } => Footprint::rectangle(*length, *width),
            Appearance::Polygon { vertices } => Footprint::polygon(vertices),
        }
    }

    fn body_vertices(&self) -> Vec<Position> {
        match self {
            Appearance::Circle { .. } => vec![],
            Appearance::Rectangle { length, width } => {
                let (dx, dy) = (length / 2.0, width / 2.0);
                vec![
                    Position::new(-dx, -dy),
                    Position::new(dx, -dy),
                    Position::new(dx, dy),
                    Position::new(-dx, dy),
                ]
            }
            Appearance::Polygon { vertices } => vertices.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ArriveMode {
    /// Compare the position components only.
    #[default]
    Position,
    /// Compare every component of the goal.
    State,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RobotConfig {
    pub step_time: f64,
    pub arrive_mode: ArriveMode,
    pub goal_threshold: f64,
    /// Lower velocity bounds, unbounded if `None`.
    pub vel_min: Option<DVector<f64>>,
    /// Upper velocity bounds, unbounded if `None`.
    pub vel_max: Option<DVector<f64>>,
    pub noise: Option<NoiseConfig>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            step_time: 0.1,
            arrive_mode: ArriveMode::default(),
            goal_threshold: 0.1,
            vel_min: None,
            vel_max: None,
            noise: None,
        }
    }
}

impl RobotConfig {
    pub fn with_step_time(self, step_time: f64) -> Self {
        Self { step_time, ..self }
    }

    pub fn with_arrive_mode(self, arrive_mode: ArriveMode) -> Self {
        Self {
            arrive_mode,
            ..self
        }
    }

    pub fn with_goal_threshold(self, goal_threshold: f64) -> Self {
        Self {
            goal_threshold,
            ..self
        }
    }

    pub fn with_velocity_bounds(self, vel_min: DVector<f64>, vel_max: DVector<f64>) -> Self {
        Self {
            vel_min: Some(vel_min),
            vel_max: Some(vel_max),
            ..self
        }
    }

    pub fn with_noise(self, noise: NoiseConfig) -> Self {
        Self {
            noise: Some(noise),
            ..self
        }
    }
}

/// Actuation noise: every commanded velocity component is perturbed by a uniform sample from
/// `[-control_std[i], control_std[i]]` before it is clipped.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseConfig {
    pub control_std: Vec<f64>,
    pub seed: u64,
}

#[derive(Clone, Debug)]
struct ControlNoise {
    distributions: Vec<Uniform<f64>>,
    rng: ChaCha8Rng,
}

impl ControlNoise {
    fn new(config: &NoiseConfig, vel_dim: usize) -> Result<Self, RobotError> {
        check_dim(Quantity::ControlNoise, vel_dim, config.control_std.len())?;
        let distributions = config
            .control_std
            .iter()
            .map(|bound| {
                if !(*bound >= 0.0) {
                    return Err(RobotError::InvalidNoise(*bound));
                }
                Uniform::try_from(-bound..=*bound).map_err(|_| RobotError::InvalidNoise(*bound))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            distributions,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
        })
    }

    fn perturb(&mut self, velocity: &mut DVector<f64>) {
        for (v, distribution) in velocity.iter_mut().zip(&self.distributions) {
            *v += distribution.sample(&mut self.rng);
        }
    }
}

/// Per-call options of [`Robot::drive`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOptions {
    /// Stand still once the goal is reached or a collision has been flagged.
    pub stop: bool,
    /// Overrides the configured step time for this call.
    pub step_time: Option<f64>,
}

impl Default for MoveOptions {
    fn default() -> Self {
        Self {
            stop: true,
            step_time: None,
        }
    }
}

impl MoveOptions {
    pub fn with_stop(self, stop: bool) -> Self {
        Self { stop, ..self }
    }

    pub fn with_step_time(self, step_time: f64) -> Self {
        Self {
            step_time: Some(step_time),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quantity {
    State,
    Velocity,
    Goal,
    Point,
    VelocityMin,
    VelocityMax,
    ControlNoise,
    IntegratedState,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Quantity::State => "state",
            Quantity::Velocity => "velocity",
            Quantity::Goal => "goal",
            Quantity::Point => "point",
            Quantity::VelocityMin => "minimum velocity",
            Quantity::VelocityMax => "maximum velocity",
            Quantity::ControlNoise => "control noise",
            Quantity::IntegratedState => "integrated state",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RobotError {
    #[error("{quantity} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        quantity: Quantity,
        expected: usize,
        actual: usize,
    },
    #[error("velocity bounds of component {index} are empty: {min} > {max}")]
    InvalidVelocityBounds { index: usize, min: f64, max: f64 },
    #[error("goal threshold must be non-negative, got {0}")]
    InvalidGoalThreshold(f64),
    #[error("step time must be positive, got {0}")]
    InvalidStepTime(f64),
    #[error("control noise must be finite and non-negative, got {0}")]
    InvalidNoise(f64),
    #[error("velocity component {index} is not finite: {value}")]
    NonFiniteVelocity { index: usize, value: f64 },
    #[error(transparent)]
    Footprint(#[from] FootprintError),
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, f64::consts::PI};

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::super::{Ackermann, DiffDrive, Obstacle, Omni};
    use super::*;
    use crate::tests::{diff_robot, v};

    const EPSILON: f64 = 1e-12;

    /// Diff-drive kinematics that records every velocity it integrates.
    #[derive(Debug, Default)]
    struct Recording {
        velocities: RefCell<Vec<DVector<f64>>>,
    }

    impl Kinematics for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn state_dim(&self) -> usize {
            3
        }

        fn integrate(
            &self,
            state: &DVector<f64>,
            velocity: &DVector<f64>,
            step_time: f64,
        ) -> DVector<f64> {
            self.velocities.borrow_mut().push(velocity.clone());
            DiffDrive.integrate(state, velocity, step_time)
        }
    }

    /// Kinematics violating its own state dimension.
    #[derive(Debug)]
    struct Shrinking;

    impl Kinematics for Shrinking {
        fn name(&self) -> &'static str {
            "shrinking"
        }

        fn state_dim(&self) -> usize {
            3
        }

        fn integrate(&self, state: &DVector<f64>, _: &DVector<f64>, _: f64) -> DVector<f64> {
            state.rows(0, 2).into_owned()
        }
    }

    fn recording_robot(config: RobotConfig) -> Robot<Recording> {
        Robot::new(
            0,
            Recording::default(),
            Appearance::Circle { radius: 0.2 },
            v(&[0.0, 0.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[5.0, 0.0, 0.0]),
            config,
        )
        .unwrap()
    }

    #[rstest]
    #[case::state(v(&[0.0, 0.0]), v(&[0.0, 0.0]), v(&[1.0, 1.0, 0.0]), Quantity::State, 2)]
    #[case::velocity(v(&[0.0, 0.0, 0.0]), v(&[0.0]), v(&[1.0, 1.0, 0.0]), Quantity::Velocity, 1)]
    #[case::goal(v(&[0.0, 0.0, 0.0]), v(&[0.0, 0.0]), v(&[1.0, 1.0]), Quantity::Goal, 2)]
    fn test_robot_new_dimension_mismatch(
        #[case] state: DVector<f64>,
        #[case] velocity: DVector<f64>,
        #[case] goal: DVector<f64>,
        #[case] quantity: Quantity,
        #[case] actual: usize,
    ) {
        let result = Robot::new(
            0,
            DiffDrive,
            Appearance::Circle { radius: 0.2 },
            state,
            velocity,
            goal,
            RobotConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            RobotError::DimensionMismatch {
                quantity,
                expected: if quantity == Quantity::Velocity { 2 } else { 3 },
                actual,
            }
        );
    }

    #[test]
    fn test_robot_new_invalid_config() {
        let new = |config: RobotConfig| {
            Robot::new(
                0,
                DiffDrive,
                Appearance::Circle { radius: 0.2 },
                v(&[0.0, 0.0, 0.0]),
                v(&[0.0, 0.0]),
                v(&[1.0, 0.0, 0.0]),
                config,
            )
            .unwrap_err()
        };
        insta::assert_snapshot!(
            new(RobotConfig::default().with_velocity_bounds(v(&[-1.0, 1.0]), v(&[1.0, -1.0]))),
            @"velocity bounds of component 1 are empty: 1 > -1"
        );
        insta::assert_snapshot!(
            new(RobotConfig::default().with_velocity_bounds(v(&[-1.0]), v(&[1.0, 1.0]))),
            @"minimum velocity has dimension 1, expected 2"
        );
        insta::assert_snapshot!(
            new(RobotConfig::default().with_goal_threshold(-0.5)),
            @"goal threshold must be non-negative, got -0.5"
        );
        insta::assert_snapshot!(
            new(RobotConfig::default().with_step_time(0.0)),
            @"step time must be positive, got 0"
        );
        insta::assert_snapshot!(
            new(RobotConfig::default().with_noise(NoiseConfig {
                control_std: vec![0.1, -0.1],
                seed: 0,
            })),
            @"control noise must be finite and non-negative, got -0.1"
        );
    }

    #[test]
    fn test_robot_new_invalid_footprint() {
        let result = Robot::new(
            0,
            DiffDrive,
            Appearance::Circle { radius: -1.0 },
            v(&[0.0, 0.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[1.0, 0.0, 0.0]),
            RobotConfig::default(),
        );
        assert_eq!(
            result.unwrap_err(),
            RobotError::Footprint(FootprintError::NegativeRadius(-1.0))
        );
    }

    #[rstest]
    #[case::within(&[0.5, -0.5], &[0.5, -0.5])]
    #[case::linear_too_fast(&[3.0, 0.2], &[1.0, 0.2])]
    #[case::reverse_too_fast(&[-3.0, 0.2], &[-0.5, 0.2])]
    #[case::both(&[2.0, -7.0], &[1.0, -2.0])]
    #[case::boundary(&[1.0, 2.0], &[1.0, 2.0])]
    fn test_robot_drive_clamps_velocity(#[case] commanded: &[f64], #[case] applied: &[f64]) {
        let mut robot = recording_robot(
            RobotConfig::default().with_velocity_bounds(v(&[-0.5, -2.0]), v(&[1.0, 2.0])),
        );
        robot
            .drive(&v(commanded), MoveOptions::default())
            .unwrap();
        assert_eq!(robot.velocity(), &v(applied));
        assert_eq!(robot.kinematics().velocities.borrow().as_slice(), &[v(applied)]);
    }

    #[test]
    fn test_robot_drive_clamped_velocity_within_bounds() {
        let (min, max) = (v(&[-0.5, -1.5]), v(&[1.0, 1.5]));
        let mut robot =
            recording_robot(RobotConfig::default().with_velocity_bounds(min.clone(), max.clone()));
        for i in -20..=20 {
            for j in -20..=20 {
                let commanded = v(&[i as f64 * 0.13, j as f64 * 0.21]);
                robot
                    .drive(&commanded, MoveOptions::default().with_stop(false))
                    .unwrap();
                for k in 0..2 {
                    assert!(min[k] <= robot.velocity()[k] && robot.velocity()[k] <= max[k]);
                }
            }
        }
    }

    #[test]
    fn test_robot_drive_stops_after_collision() {
        let mut robot = recording_robot(RobotConfig::default());
        robot.drive(&v(&[1.0, 0.5]), MoveOptions::default()).unwrap();
        robot.set_collision_flag(true);
        let state = robot.state().clone();

        robot.drive(&v(&[1.0, 0.5]), MoveOptions::default()).unwrap();

        assert_eq!(
            robot.kinematics().velocities.borrow().last(),
            Some(&v(&[0.0, 0.0]))
        );
        assert_eq!(robot.state(), &state);
        assert!(robot.collision_flag());
    }

    #[test]
    fn test_robot_drive_without_stop_ignores_flags() {
        let mut robot = recording_robot(RobotConfig::default());
        robot.set_collision_flag(true);

        robot
            .drive(&v(&[1.0, 0.0]), MoveOptions::default().with_stop(false))
            .unwrap();

        assert_eq!(robot.velocity(), &v(&[1.0, 0.0]));
        assert_abs_diff_eq!(robot.position().x(), 0.1, epsilon = EPSILON);
    }

    #[test]
    fn test_robot_drive_records_previous_states() {
        let mut robot = recording_robot(RobotConfig::default());
        let mut expected = vec![];
        for _ in 0..3 {
            expected.push(robot.state().clone());
            robot.drive(&v(&[1.0, 0.1]), MoveOptions::default()).unwrap();
        }
        assert_eq!(robot.trajectory(), expected.as_slice());
    }

    #[test]
    fn test_robot_drive_step_time_override() {
        let mut robot = diff_robot(v(&[0.0, 0.0, 0.0]), v(&[5.0, 0.0, 0.0]));
        robot
            .drive(&v(&[1.0, 0.0]), MoveOptions::default().with_step_time(0.5))
            .unwrap();
        assert_abs_diff_eq!(robot.position().x(), 0.5, epsilon = EPSILON);
        assert_eq!(
            robot.drive(&v(&[1.0, 0.0]), MoveOptions::default().with_step_time(-0.1)),
            Err(RobotError::InvalidStepTime(-0.1))
        );
    }

    #[test]
    fn test_robot_drive_dimension_mismatch_leaves_robot_untouched() {
        let mut robot = diff_robot(v(&[1.0, 2.0, 0.5]), v(&[5.0, 0.0, 0.0]));
        let before = robot.clone();

        let result = robot.drive(&v(&[1.0, 0.0, 0.0]), MoveOptions::default());

        insta::assert_snapshot!(result.unwrap_err(), @"velocity has dimension 3, expected 2");
        assert_eq!(robot.state(), before.state());
        assert_eq!(robot.velocity(), before.velocity());
        assert!(robot.trajectory().is_empty());
    }

    #[rstest]
    #[case::nan(&[f64::NAN, 0.0], "velocity component 0 is not finite: NaN")]
    #[case::infinite(&[0.5, f64::INFINITY], "velocity component 1 is not finite: inf")]
    #[case::negative_infinite(&[f64::NEG_INFINITY, 0.0], "velocity component 0 is not finite: -inf")]
    fn test_robot_drive_rejects_non_finite_velocity(
        #[case] commanded: &[f64],
        #[case] message: &str,
    ) {
        let mut robot = recording_robot(
            RobotConfig::default().with_velocity_bounds(v(&[-1.0, -1.0]), v(&[1.0, 1.0])),
        );
        let (state, velocity) = (robot.state().clone(), robot.velocity().clone());

        let result = robot.drive(&v(commanded), MoveOptions::default());

        assert_eq!(result.unwrap_err().to_string(), message);
        assert_eq!(robot.state(), &state);
        assert_eq!(robot.velocity(), &velocity);
        assert!(robot.trajectory().is_empty());
        assert!(robot.kinematics().velocities.borrow().is_empty());
    }

    #[test]
    fn test_robot_drive_rejects_wrongly_sized_integration() {
        let mut robot = Robot::new(
            0,
            Shrinking,
            Appearance::Circle { radius: 0.2 },
            v(&[0.0, 0.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[1.0, 0.0, 0.0]),
            RobotConfig::default(),
        )
        .unwrap();

        let result = robot.drive(&v(&[1.0, 0.0]), MoveOptions::default());

        insta::assert_snapshot!(
            result.unwrap_err(),
            @"integrated state has dimension 2, expected 3"
        );
        assert_eq!(robot.state(), &v(&[0.0, 0.0, 0.0]));
        assert!(robot.trajectory().is_empty());
    }

    #[test]
    fn test_robot_update_info_bypasses_validation() {
        let mut robot = diff_robot(v(&[0.0, 0.0, 0.0]), v(&[5.0, 0.0, 0.0]));
        robot.drive(&v(&[1.0, 0.0]), MoveOptions::default()).unwrap();

        robot.update_info(v(&[4.0, 0.0]), v(&[0.3, 0.1, 0.0]));

        assert_eq!(robot.state(), &v(&[4.0, 0.0]));
        assert_eq!(robot.velocity(), &v(&[0.3, 0.1, 0.0]));
        assert_eq!(robot.trajectory().len(), 1);
        assert!(!robot.arrive_flag());
        assert_eq!(
            robot.drive(&v(&[1.0, 0.0]), MoveOptions::default()),
            Err(RobotError::DimensionMismatch {
                quantity: Quantity::State,
                expected: 3,
                actual: 2,
            })
        );
    }

    #[rstest]
    #[case::inside(5.0, 2.9, 3.9, true)]
    #[case::boundary(5.0, 3.0, 4.0, true)]
    #[case::just_below(4.999, 3.0, 4.0, false)]
    #[case::just_above(5.001, 3.0, 4.0, true)]
    #[case::outside(1.0, 3.0, 4.0, false)]
    fn test_robot_arrive_position(
        #[case] goal_threshold: f64,
        #[case] goal_x: f64,
        #[case] goal_y: f64,
        #[case] expected: bool,
    ) {
        let robot = Robot::new(
            0,
            DiffDrive,
            Appearance::Circle { radius: 0.2 },
            v(&[0.0, 0.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[goal_x, goal_y, 2.0]),
            RobotConfig::default().with_goal_threshold(goal_threshold),
        )
        .unwrap();
        assert_eq!(robot.arrive(), expected);
        assert!(!robot.arrive_flag());
    }

    #[rstest]
    #[case::position(ArriveMode::Position, true)]
    #[case::state(ArriveMode::State, false)]
    fn test_robot_arrive_mode(#[case] arrive_mode: ArriveMode, #[case] expected: bool) {
        let robot = Robot::new(
            0,
            DiffDrive,
            Appearance::Circle { radius: 0.2 },
            v(&[1.0, 1.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[1.0, 1.0, 1.0]),
            RobotConfig::default()
                .with_goal_threshold(0.5)
                .with_arrive_mode(arrive_mode),
        )
        .unwrap();
        assert_eq!(robot.arrive(), expected);
    }

    #[test]
    fn test_robot_arrive_state_mode_ignores_extra_state() {
        // The steering angle is not part of an ackermann goal.
        let robot = Robot::new(
            0,
            Ackermann::default(),
            Appearance::Rectangle {
                length: 2.0,
                width: 1.0,
            },
            v(&[1.0, 1.0, 0.5, 0.3]),
            v(&[0.0, 0.0]),
            v(&[1.0, 1.0, 0.5]),
            RobotConfig::default().with_arrive_mode(ArriveMode::State),
        )
        .unwrap();
        assert!(robot.arrive());
    }

    #[test]
    fn test_robot_drives_to_goal_and_stops() {
        let mut robot = diff_robot(v(&[0.0, 0.0, 0.0]), v(&[5.0, 0.0, 0.0]));
        let goal = Position::new(5.0, 0.0);

        let mut steps = 0;
        while !robot.arrive_flag() {
            let distance_before = robot.position().distance(goal);
            robot.drive(&v(&[1.0, 0.0]), MoveOptions::default()).unwrap();
            steps += 1;
            assert!(distance_before > 0.1);
            assert!(steps < 100, "the robot never arrived");
        }
        assert!(robot.position().distance(goal) <= 0.1);
        // 49 steps of 0.1 end just short of the threshold in floating point.
        assert_eq!(steps, 50);

        let state = robot.state().clone();
        for _ in 0..10 {
            robot.drive(&v(&[1.0, 0.0]), MoveOptions::default()).unwrap();
            assert_eq!(robot.state(), &state);
        }
        assert_eq!(robot.velocity(), &v(&[0.0, 0.0]));
        assert_eq!(robot.trajectory().len(), 60);
    }

    #[test]
    fn test_robot_reset() {
        let mut robot = diff_robot(v(&[0.0, 0.0, 0.0]), v(&[1.0, 0.0, 0.0]));
        for _ in 0..20 {
            robot.drive(&v(&[1.0, 0.3]), MoveOptions::default()).unwrap();
        }
        robot.set_collision_flag(true);

        robot.reset();

        assert_eq!(robot.state(), &v(&[0.0, 0.0, 0.0]));
        assert_eq!(robot.velocity(), &v(&[0.0, 0.0]));
        assert_eq!(robot.goal(), &v(&[1.0, 0.0, 0.0]));
        assert!(robot.trajectory().is_empty());
        assert!(!robot.arrive_flag());
        assert!(!robot.collision_flag());
    }

    #[test]
    fn test_robot_noise_is_seeded_and_bounded() {
        let config = RobotConfig::default()
            .with_velocity_bounds(v(&[-1.0, -1.0]), v(&[1.0, 1.0]))
            .with_noise(NoiseConfig {
                control_std: vec![0.2, 0.2],
                seed: 7,
            });
        let mut a = recording_robot(config.clone());
        let mut b = recording_robot(config);
        for _ in 0..20 {
            a.drive(&v(&[0.95, 0.0]), MoveOptions::default()).unwrap();
            b.drive(&v(&[0.95, 0.0]), MoveOptions::default()).unwrap();
            assert_eq!(a.state(), b.state());
            assert!(a.velocity()[0] >= 0.75 && a.velocity()[0] <= 1.0);
            assert!(a.velocity()[1].abs() <= 0.2);
        }
    }

    #[test]
    fn test_robot_noise_does_not_move_stopped_robot() {
        let mut robot = recording_robot(RobotConfig::default().with_noise(NoiseConfig {
            control_std: vec![0.5, 0.5],
            seed: 1,
        }));
        robot.set_collision_flag(true);
        robot.drive(&v(&[1.0, 1.0]), MoveOptions::default()).unwrap();
        assert_eq!(robot.state(), &v(&[0.0, 0.0, 0.0]));
    }

    #[rstest]
    #[case::own_position(&[1.0, 1.0], true)]
    #[case::inside(&[1.2, 0.9], true)]
    #[case::boundary(&[1.5, 1.0], true)]
    #[case::outside(&[1.4, 1.4], false)]
    fn test_robot_collision_check_point_circle(#[case] point: &[f64], #[case] expected: bool) {
        let robot = Robot::new(
            0,
            DiffDrive,
            Appearance::Circle { radius: 0.5 },
            v(&[1.0, 1.0, 0.0]),
            v(&[0.0, 0.0]),
            v(&[5.0, 5.0, 0.0]),
            RobotConfig::default(),
        )
        .unwrap();
        assert_eq!(robot.collision_check_point(&v(point)), Ok(expected));
    }

    #[rstest]
    #[case::along_heading(&[0.0, 0.9], true)]
    #[case::across_heading(&[0.9, 0.0], false)]
    #[case::corner(&[-0.45, -0.95], true)]
    fn test_robot_collision_check_point_rotated_rectangle(
        #[case] point: &[f64],
        #[case] expected: bool,
    ) {
        let robot = Robot::new(
            0,
            DiffDrive,
            Appearance::Rectangle {
                length: 2.0,
                width: 1.0,
            },
            v(&[0.0, 0.0, 0.5 * PI]),
            v(&[0.0, 0.0]),
            v(&[5.0, 5.0, 0.0]),
            RobotConfig::default(),
        )
        .unwrap();
        assert_eq!(robot.collision_check_point(&v(point)), Ok(expected));
    }

    #[test]
    fn test_robot_collision_check_point_omni() {
        let robot = Robot::new(
            0,
            Omni,
            Appearance::Polygon {
                vertices: vec![
                    Position::new(-0.5, -0.5),
                    Position::new(0.5, -0.5),
                    Position::new(0.0, 0.5),
                ],
            },
            v(&[2.0, 2.0]),
            v(&[0.0, 0.0]),
            v(&[0.0, 0.0]),
            RobotConfig::default(),
        )
        .unwrap();
        assert_eq!(robot.collision_check_point(&v(&[2.0, 2.4])), Ok(true));
        assert_eq!(robot.collision_check_point(&v(&[2.4, 2.4])), Ok(false));
        assert_eq!(
            robot.collision_check_point(&v(&[2.0, 2.0, 0.0])),
            Err(RobotError::DimensionMismatch {
                quantity: Quantity::Point,
                expected: 2,
                actual: 3,
            })
        );
    }

    #[rstest]
    #[case::circle_hit(Obstacle::circle(Position::new(1.5, 0.0), 1.0), true)]
    #[case::circle_miss(Obstacle::circle(Position::new(2.0, 2.0), 0.5), false)]
    #[case::polygon_hit(
        Obstacle::polygon(vec![
            Position::new(0.4, -1.0),
            Position::new(2.0, -1.0),
            Position::new(0.4, 1.0),
        ]),
        true
    )]
    #[case::rectangle_miss(Obstacle::rectangle(Position::new(-2.0, 0.0), 1.0, 1.0), false)]
    fn test_robot_collision_check_obstacle(#[case] obstacle: Obstacle, #[case] expected: bool) {
        let robot = diff_robot(v(&[0.0, 0.0, 0.0]), v(&[5.0, 0.0, 0.0]));
        assert_eq!(robot.collision_check_obstacle(&obstacle), expected);
    }

    #[test]
    fn test_robot_rectangle_shape_follows_heading() {
        let robot = Robot::new(
            0,
            DiffDrive,
            Appearance::Rectangle {
                length: 2.0,
                width: 0.5,
            },
            v(&[0.0, 0.0, 0.5 * PI]),
            v(&[0.0, 0.0]),
            v(&[5.0, 5.0, 0.0]),
            RobotConfig::default(),
        )
        .unwrap();
        // Long side now points along the y-axis.
        assert!(robot.collision_check_obstacle(&Obstacle::circle(Position::new(0.0, 1.1), 0.2)));
        assert!(!robot.collision_check_obstacle(&Obstacle::circle(Position::new(1.1, 0.0), 0.2)));
    }

    #[test]
    fn test_robot_min_distance() {
        let robot = diff_robot(v(&[1.0, 0.0, 0.0]), v(&[5.0, 0.0, 0.0]));
        let obstacle = Obstacle::circle(Position::new(4.0, 4.0), 1.0);
        assert_abs_diff_eq!(robot.min_distance(&obstacle), 3.5, epsilon = EPSILON);
    }
}
