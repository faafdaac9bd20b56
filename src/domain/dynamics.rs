//! Kinematic models of the supported robot kinds.
//!
//! Each kind declares the dimensions of its state, velocity and goal vectors and integrates a
//! state over one time step. The robot checks the declared dimensions before calling
//! [`Kinematics::integrate`], so implementations may index the vectors directly.

use std::fmt::Debug;

use nalgebra::DVector;
use thiserror::Error;

use super::{basis::wrap_to_pi, Angle};

pub trait Kinematics: Debug {
    fn name(&self) -> &'static str;

    fn state_dim(&self) -> usize;

    fn vel_dim(&self) -> usize {
        2
    }

    fn goal_dim(&self) -> usize {
        self.state_dim()
    }

    fn position_dim(&self) -> usize {
        2
    }

    /// Orientation of the body frame encoded in `state`.
    fn heading(&self, state: &DVector<f64>) -> Angle {
        Angle::new(state.get(2).copied().unwrap_or_default())
    }

    /// Returns the state reached after applying `velocity` for `step_time` seconds.
    fn integrate(
        &self,
        state: &DVector<f64>,
        velocity: &DVector<f64>,
        step_time: f64,
    ) -> DVector<f64>;
}

impl<K: Kinematics + ?Sized> Kinematics for Box<K> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn state_dim(&self) -> usize {
        (**self).state_dim()
    }

    fn vel_dim(&self) -> usize {
        (**self).vel_dim()
    }

    fn goal_dim(&self) -> usize {
        (**self).goal_dim()
    }

    fn position_dim(&self) -> usize {
        (**self).position_dim()
    }

    fn heading(&self, state: &DVector<f64>) -> Angle {
        (**self).heading(state)
    }

    fn integrate(
        &self,
        state: &DVector<f64>,
        velocity: &DVector<f64>,
        step_time: f64,
    ) -> DVector<f64> {
        (**self).integrate(state, velocity, step_time)
    }
}

/// Differential drive with state `[x, y, θ]` and velocity `[v, ω]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DiffDrive;

impl Kinematics for DiffDrive {
    fn name(&self) -> &'static str {
        "diff"
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
        let (x, y, theta) = (state[0], state[1], state[2]);
        let (v, omega) = (velocity[0], velocity[1]);
        DVector::from_column_slice(&[
            x + v * theta.cos() * step_time,
            y + v * theta.sin() * step_time,
            wrap_to_pi(theta + omega * step_time),
        ])
    }
}

/// Omnidirectional robot with state `[x, y]` and velocity `[vx, vy]`. The body frame never
/// rotates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Omni;

impl Kinematics for Omni {
    fn name(&self) -> &'static str {
        "omni"
    }

    fn state_dim(&self) -> usize {
        2
    }

    fn heading(&self, _state: &DVector<f64>) -> Angle {
        Angle::default()
    }

    fn integrate(
        &self,
        state: &DVector<f64>,
        velocity: &DVector<f64>,
        step_time: f64,
    ) -> DVector<f64> {
        state + velocity * step_time
    }
}

/// Car-like robot with state `[x, y, θ, φ]` and velocity `[v, φ̇]`, where `φ` is the steering
/// angle of the front wheels. Goals are `[x, y, θ]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ackermann {
    wheelbase: f64,
    steer_limit: f64,
}

impl Ackermann {
    pub fn new(wheelbase: f64, steer_limit: f64) -> Result<Self, KinematicsError> {
        if !(wheelbase.is_finite() && wheelbase > 0.0) {
            return Err(KinematicsError::InvalidWheelbase(wheelbase));
        }
        if !(steer_limit.is_finite() && steer_limit > 0.0) {
            return Err(KinematicsError::InvalidSteerLimit(steer_limit));
        }
        Ok(Self {
            wheelbase,
            steer_limit,
        })
    }

    pub fn wheelbase(&self) -> f64 {
        self.wheelbase
    }

    pub fn steer_limit(&self) -> f64 {
        self.steer_limit
    }
}

impl Default for Ackermann {
    fn default() -> Self {
        Self {
            wheelbase: 1.0,
            steer_limit: std::f64::consts::FRAC_PI_4,
        }
    }
}

impl Kinematics for Ackermann {
    fn name(&self) -> &'static str {
        "ackermann"
    }

    fn state_dim(&self) -> usize {
        4
    }

    fn goal_dim(&self) -> usize {
        3
    }

    fn integrate(
        &self,
        state: &DVector<f64>,
        velocity: &DVector<f64>,
        step_time: f64,
    ) -> DVector<f64> {
        let (x, y, theta, phi) = (state[0], state[1], state[2], state[3]);
        let (v, steer_rate) = (velocity[0], velocity[1]);
        DVector::from_column_slice(&[
            x + v * theta.cos() * step_time,
            y + v * theta.sin() * step_time,
            wrap_to_pi(theta + v * phi.tan() / self.wheelbase * step_time),
            (phi + steer_rate * step_time).clamp(-self.steer_limit, self.steer_limit),
        ])
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum KinematicsError {
    #[error("wheelbase must be positive and finite, got {0}")]
    InvalidWheelbase(f64),
    #[error("steering limit must be positive and finite, got {0}")]
    InvalidSteerLimit(f64),
}
