// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the 6-axis Cartesian PID controller.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::Vector6D;

/// PID gains of one Cartesian axis.
///
/// `i_clamp` bounds the integral accumulator to ±`i_clamp` to prevent windup;
/// the default leaves the accumulator unbounded.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct PidGains {
    /// Proportional gain.
    pub p: f64,
    /// Integral gain.
    pub i: f64,
    /// Derivative gain.
    pub d: f64,
    /// Bound on the integral accumulator.
    pub i_clamp: f64,
}

impl PidGains {
    /// Creates a gain set with an unbounded integral accumulator.
    pub fn new(p: f64, i: f64, d: f64) -> Self {
        PidGains {
            p,
            i,
            d,
            i_clamp: f64::INFINITY,
        }
    }

    /// Sets the integral accumulator bound.
    pub fn with_i_clamp(mut self, i_clamp: f64) -> Self {
        self.i_clamp = i_clamp;
        self
    }
}

impl Default for PidGains {
    fn default() -> Self {
        PidGains::new(0., 0., 0.)
    }
}

/// A PID controller with six independent axes, mapping a Cartesian error to
/// a Cartesian control input once per control cycle.
///
/// The integral accumulates discretely (`integral += e * dt`) and is clamped
/// per axis; the derivative is the difference quotient of consecutive error
/// samples and is zero on the first call after construction or
/// [`reset()`](`Self::reset`). Gains are fixed at construction.
#[derive(Debug)]
pub struct SpatialPidController {
    gains: [PidGains; 6],
    integral: Vector6D,
    last_error: Option<Vector6D>,
}

impl SpatialPidController {
    /// Creates a new SpatialPidController from per-axis gains, ordered as
    /// three linear axes followed by three angular axes.
    pub fn new(gains: [PidGains; 6]) -> Self {
        SpatialPidController {
            gains,
            integral: Vector6D::zeros(),
            last_error: None,
        }
    }

    /// Performs one controller step.
    ///
    /// A zero-length period contributes no integral growth and no derivative
    /// term; the proportional part still acts.
    pub fn compute(&mut self, error: &Vector6D, period: Duration) -> Vector6D {
        let dt = period.as_secs_f64();
        let mut out = Vector6D::zeros();
        for axis in 0..6 {
            let gains = &self.gains[axis];
            self.integral[axis] =
                (self.integral[axis] + error[axis] * dt).clamp(-gains.i_clamp, gains.i_clamp);
            let derivative = match &self.last_error {
                Some(last) if dt > 0. => (error[axis] - last[axis]) / dt,
                _ => 0.,
            };
            out[axis] = gains.p * error[axis] + gains.i * self.integral[axis] + gains.d * derivative;
        }
        self.last_error = Some(*error);
        out
    }

    /// Zeroes the integral accumulator and discards the previous error sample.
    /// Called on every transition out of the running state.
    pub fn reset(&mut self) {
        self.integral = Vector6D::zeros();
        self.last_error = None;
    }
}
