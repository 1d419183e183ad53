// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the kinematic model of the robot: the parsed segment tree, the
//! control chain extracted from it and the forward kinematics solver.
mod chain;
mod fk;
mod tree;

pub use chain::KinematicChain;
pub use fk::ForwardKinematicsSolver;
pub use tree::{JointType, KinematicTree, Segment};
