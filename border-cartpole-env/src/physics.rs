//! Equations of motion of the cart-pole system.
//!
//! The model is the classic one of Barto, Sutton and Anderson: a cart moving
//! without friction along a horizontal track with a pole hinged on top.
//! [`integrate`] is a pure function of the physical constants, the state,
//! the applied force and the time step.
use crate::CartPoleError;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Numerical scheme used to advance the state by one time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Explicit Euler; positions advance with the velocities of the previous state.
    Euler,

    /// Semi-implicit Euler; velocities are updated first and then used for positions.
    SemiImplicitEuler,
}

impl Default for Integrator {
    fn default() -> Self {
        Self::Euler
    }
}

/// Physical constants of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational acceleration (m/s^2).
    pub gravity: f64,

    /// Mass of the cart (kg).
    pub masscart: f64,

    /// Mass of the pole (kg).
    pub masspole: f64,

    /// Half of the length of the pole (m).
    pub length: f64,

    /// Time between state updates (s).
    pub tau: f64,

    /// Integration scheme.
    pub integrator: Integrator,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            masscart: 1.0,
            masspole: 0.1,
            length: 0.5,
            tau: 0.02,
            integrator: Integrator::Euler,
        }
    }
}

impl PhysicsConfig {
    /// Sets the time step.
    pub fn tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Sets the integration scheme.
    pub fn integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    /// Mass of the cart and the pole.
    pub fn total_mass(&self) -> f64 {
        self.masscart + self.masspole
    }

    /// Mass of the pole times its half length.
    pub fn polemass_length(&self) -> f64 {
        self.masspole * self.length
    }

    /// Checks that all constants are finite and, except gravity, positive.
    pub fn validate(&self) -> Result<(), CartPoleError> {
        let positive = [
            ("masscart", self.masscart),
            ("masspole", self.masspole),
            ("length", self.length),
            ("tau", self.tau),
        ];
        for (name, v) in positive.iter() {
            if !v.is_finite() || *v <= 0.0 {
                return Err(CartPoleError::InvalidConfiguration(format!(
                    "{} must be positive and finite, got {}",
                    name, v
                )));
            }
        }
        if !self.gravity.is_finite() {
            return Err(CartPoleError::InvalidConfiguration(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        Ok(())
    }
}

/// Continuous state of the system.
///
/// `theta` is measured from the upright position and is positive when the
/// pole leans towards positive `x`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartPoleState {
    /// Cart position (m).
    pub x: f64,

    /// Cart velocity (m/s).
    pub x_dot: f64,

    /// Pole angle (rad).
    pub theta: f64,

    /// Pole angular velocity (rad/s).
    pub theta_dot: f64,
}

impl CartPoleState {
    /// Constructs a state.
    pub fn new(x: f64, x_dot: f64, theta: f64, theta_dot: f64) -> Self {
        Self {
            x,
            x_dot,
            theta,
            theta_dot,
        }
    }

    /// Returns `[x, x_dot, theta, theta_dot]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.x_dot, self.theta, self.theta_dot]
    }

    /// Returns `true` if no component is infinite or NaN.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }
}

impl From<[f64; 4]> for CartPoleState {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

/// Converts an angle given by a caller in degrees to radians.
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Wraps an angle into `(-pi, pi]`. Angles already in range are returned as is.
pub fn wrap_angle(theta: f64) -> f64 {
    if theta > -PI && theta <= PI {
        return theta;
    }
    let wrapped = (theta + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Advances `state` by `dt` seconds under the horizontal force `force` (N).
///
/// The pole angle of the returned state is wrapped into `(-pi, pi]`.
pub fn integrate(
    physics: &PhysicsConfig,
    state: &CartPoleState,
    force: f64,
    dt: f64,
) -> CartPoleState {
    let CartPoleState {
        x,
        x_dot,
        theta,
        theta_dot,
    } = *state;
    let total_mass = physics.total_mass();
    let polemass_length = physics.polemass_length();
    let (sintheta, costheta) = theta.sin_cos();

    let temp = (force + polemass_length * theta_dot * theta_dot * sintheta) / total_mass;
    let thetaacc = (physics.gravity * sintheta - costheta * temp)
        / (physics.length * (4.0 / 3.0 - physics.masspole * costheta * costheta / total_mass));
    let xacc = temp - polemass_length * thetaacc * costheta / total_mass;

    let (x, x_dot, theta, theta_dot) = match physics.integrator {
        Integrator::Euler => (
            x + dt * x_dot,
            x_dot + dt * xacc,
            theta + dt * theta_dot,
            theta_dot + dt * thetaacc,
        ),
        Integrator::SemiImplicitEuler => {
            let x_dot = x_dot + dt * xacc;
            let theta_dot = theta_dot + dt * thetaacc;
            (x + dt * x_dot, x_dot, theta + dt * theta_dot, theta_dot)
        }
    };

    CartPoleState::new(x, x_dot, wrap_angle(theta), theta_dot)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tilted() -> CartPoleState {
        CartPoleState::new(0.1, -0.2, 0.1, 0.3)
    }

    #[test]
    fn test_huge_force_diverges() {
        let physics = PhysicsConfig::default();
        let next = integrate(&physics, &CartPoleState::default(), f64::MAX, physics.tau);
        assert!(!next.is_finite());
        assert!(next.x.is_finite() && next.theta.is_finite());
        assert!(CartPoleState::default().is_finite());
    }

    #[test]
    fn test_upright_rest_is_fixed_point() {
        let physics = PhysicsConfig::default();
        let rest = CartPoleState::default();

        for integrator in [Integrator::Euler, Integrator::SemiImplicitEuler] {
            let physics = physics.clone().integrator(integrator);
            let next = integrate(&physics, &rest, 0.0, physics.tau);
            assert_eq!(next, rest);
        }
    }

    #[test]
    fn test_half_steps_differ_from_full_step() {
        let physics = PhysicsConfig::default();
        let dt = physics.tau;

        for force in [-10.0, 0.0, 3.5] {
            let once = integrate(&physics, &tilted(), force, dt);
            let half = integrate(&physics, &tilted(), force, dt / 2.0);
            let twice = integrate(&physics, &half, force, dt / 2.0);
            assert_ne!(once, twice);
        }
    }

    #[test]
    fn test_deterministic() {
        let physics = PhysicsConfig::default();
        let a = integrate(&physics, &tilted(), 1.25, physics.tau);
        let b = integrate(&physics, &tilted(), 1.25, physics.tau);
        assert_eq!(a, b);
    }

    #[test]
    fn test_euler_uses_previous_velocity() {
        let physics = PhysicsConfig::default();
        let s = tilted();
        let next = integrate(&physics, &s, 0.0, physics.tau);

        assert_eq!(next.x, s.x + physics.tau * s.x_dot);
        assert_eq!(next.theta, s.theta + physics.tau * s.theta_dot);
    }

    #[test]
    fn test_force_direction() {
        let physics = PhysicsConfig::default();
        let rest = CartPoleState::default();

        let right = integrate(&physics, &rest, 10.0, physics.tau);
        let left = integrate(&physics, &rest, -10.0, physics.tau);
        assert!(right.x_dot > 0.0);
        assert!(left.x_dot < 0.0);

        // Pushing the cart right makes the pole fall to the left.
        assert!(right.theta_dot < 0.0);
    }

    #[test]
    fn test_tilted_pole_falls() {
        let physics = PhysicsConfig::default();
        let s = CartPoleState::new(0.0, 0.0, 0.1, 0.0);
        let next = integrate(&physics, &s, 0.0, physics.tau);
        assert!(next.theta_dot > 0.0);
    }

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.5), 0.5);
        assert_eq!(wrap_angle(PI), PI);
        assert!((wrap_angle(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert!((wrap_angle(-PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
        assert!((wrap_angle(-PI) - PI).abs() < 1e-12);
        assert!((wrap_angle(5.0 * TAU + 0.25) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_degrees_to_radians() {
        assert_eq!(degrees_to_radians(180.0), PI);
        assert_eq!(degrees_to_radians(-90.0), -PI / 2.0);
        assert_eq!(degrees_to_radians(0.0), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(PhysicsConfig::default().validate().is_ok());
        assert!(PhysicsConfig::default().tau(0.0).validate().is_err());
        assert!(PhysicsConfig::default().tau(f64::NAN).validate().is_err());
    }
}
