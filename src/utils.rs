// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! contains useful type definitions and conversion functions.
use nalgebra::{Isometry3, SMatrix, SVector, Vector3};

/// A Cartesian-space vector with 6 entries: 3 linear components followed by
/// 3 angular components.
pub type Vector6D = SVector<f64, 6>;
/// A matrix with 6 rows and 6 columns
pub type Matrix6D = SMatrix<f64, 6, 6>;

/// Re-expresses a wrench in the frame `transform` maps into.
///
/// The force is rotated; the torque is rotated and picks up the lever-arm
/// term from the translation between the two frames:
/// `f' = R f`, `t' = R t + p × f'`.
pub fn transform_wrench(transform: &Isometry3<f64>, wrench: &Vector6D) -> Vector6D {
    let force = transform.rotation * Vector3::new(wrench[0], wrench[1], wrench[2]);
    let torque = transform.rotation * Vector3::new(wrench[3], wrench[4], wrench[5])
        + transform.translation.vector.cross(&force);
    Vector6D::new(force[0], force[1], force[2], torque[0], torque[1], torque[2])
}
