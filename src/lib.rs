// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! # cartesian-control-rs
//! cartesian-control-rs is the shared core of a real-time Cartesian motion
//! controller for serial robot arms. It converts a 6D Cartesian error (pose
//! or wrench deviation, supplied by an outer motion-control strategy) into
//! per-joint position or velocity commands at the control rate of the
//! hardware.
//!
//! ## Design
//! The crate is divided into three main modules:
//! * [kinematics](`crate::kinematics`) - the segment tree, the control chain
//!   extracted from it and the forward kinematics solver.
//! * [controller](`crate::controller`) - the spatial PID controller, the
//!   forward dynamics solver with its simulated joint state, the command
//!   writer and the [`CartesianController`] orchestration.
//! * [exception](`crate::exception`) - the error taxonomy. Everything that
//!   can fail, fails at construction; the per-cycle path recovers numerical
//!   degeneracy locally and never allocates.
//!
//! Model parsing, parameter loading and the hardware abstraction are
//! external collaborators: the controller consumes a prebuilt
//! [`KinematicTree`] and one [`JointHandle`] capability per joint.
//!
//! # Example:
//! ```no_run
//! use std::time::Duration;
//! use cartesian_control::{
//!     CartesianController, CommandInterface, ControlResult, JointHandle, JointType,
//!     KinematicTree, PidGains, Segment, Vector6D,
//! };
//! use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
//!
//! # struct HardwareJoint;
//! # impl JointHandle for HardwareJoint {
//! #     fn position(&self) -> f64 { 0. }
//! #     fn velocity(&self) -> f64 { 0. }
//! #     fn set_command(&mut self, _command: f64) {}
//! # }
//! fn main() -> ControlResult<()> {
//!     let mut tree = KinematicTree::new("base");
//!     tree.add_segment(
//!         "base",
//!         Segment::new(
//!             "upper_arm",
//!             "shoulder",
//!             JointType::Revolute,
//!             Vector3::y_axis(),
//!             Isometry3::from_parts(Translation3::new(0., 0., 0.3), UnitQuaternion::identity()),
//!         ),
//!     )?;
//!
//!     let mut controller = CartesianController::init(
//!         tree,
//!         "base",
//!         "upper_arm",
//!         &["shoulder".to_string()],
//!         vec![Box::new(HardwareJoint)],
//!         [PidGains::new(10., 0., 0.); 6],
//!         CommandInterface::Position,
//!     )?;
//!
//!     controller.start()?;
//!     let period = Duration::from_millis(1);
//!     loop {
//!         let error = Vector6D::zeros(); // supplied by the outer motion controller
//!         controller.update(&error, period)?;
//!     }
//! }
//! ```
//!
//! The `update` call runs one control cycle: the PID maps the error to a
//! Cartesian control input, the forward dynamics solver resolves it into
//! simulated joint motion through a damped least-squares Jacobian inverse,
//! and the command writer pushes the result to the joint handles. The real
//! robot chases the simulated state, which stays smooth through kinematic
//! singularities.
pub mod controller;
pub mod exception;
pub mod kinematics;
pub mod utils;

pub use controller::{
    CartesianController, CommandInterface, ForwardDynamicsSolver, JointCommandWriter,
    JointControlCmd, JointHandle, PidGains, SpatialPidController, DEFAULT_DAMPING,
};
pub use exception::{ControlException, ControlResult};
pub use kinematics::{
    ForwardKinematicsSolver, JointType, KinematicChain, KinematicTree, Segment,
};
pub use utils::{transform_wrench, Matrix6D, Vector6D};
