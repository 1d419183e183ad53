// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the immutable kinematic chain the controller is built around.

use nalgebra::Isometry3;

use crate::exception::{ControlException, ControlResult};
use crate::kinematics::tree::{KinematicTree, Segment};

/// The serial kinematic chain from the robot base link to the end-effector
/// link, extracted from a [`KinematicTree`] once at controller construction.
///
/// Fixed segments between actuated joints are kept in the chain so that the
/// segment walk matches the tree geometry; they contribute their origin
/// transform and no degree of freedom. The chain is immutable after
/// construction.
#[derive(Debug, Clone)]
pub struct KinematicChain {
    base_link: String,
    tip_link: String,
    segments: Vec<Segment>,
    joint_names: Vec<String>,
}

impl KinematicChain {
    /// Extracts and validates the chain from `base_link` to `tip_link`.
    ///
    /// `joint_names` is the ordered list of controllable joints the hardware
    /// exposes; it must match the chain's actuated joints one to one, in
    /// chain order.
    ///
    /// # Errors
    /// * [`ControlException::LinkNotFound`] - base or tip link is not in the tree.
    /// * [`ControlException::NoChainPath`] - the links are not connected root-to-tip.
    /// * [`ControlException::NoActuatedJoints`] - the chain has no degree of freedom.
    /// * [`ControlException::JointCountMismatch`] - `joint_names` length differs
    ///   from the number of actuated joints.
    /// * [`ControlException::JointNameMismatch`] - a configured name differs from
    ///   the chain joint at the same index.
    pub fn new(
        tree: &KinematicTree,
        base_link: &str,
        tip_link: &str,
        joint_names: &[String],
    ) -> ControlResult<Self> {
        let segments = tree.chain_segments(base_link, tip_link)?;
        let actuated: Vec<&Segment> = segments
            .iter()
            .filter(|s| s.joint_type().is_actuated())
            .collect();
        if actuated.is_empty() {
            return Err(ControlException::NoActuatedJoints {
                base: base_link.to_string(),
                tip: tip_link.to_string(),
            });
        }
        if actuated.len() != joint_names.len() {
            return Err(ControlException::JointCountMismatch {
                expected: actuated.len(),
                actual: joint_names.len(),
            });
        }
        for (index, (segment, configured)) in actuated.iter().zip(joint_names.iter()).enumerate() {
            if segment.joint_name() != configured {
                return Err(ControlException::JointNameMismatch {
                    index,
                    configured: configured.clone(),
                    in_chain: segment.joint_name().to_string(),
                });
            }
        }
        Ok(KinematicChain {
            base_link: base_link.to_string(),
            tip_link: tip_link.to_string(),
            segments,
            joint_names: joint_names.to_vec(),
        })
    }

    /// Number of controllable degrees of freedom.
    pub fn dof(&self) -> usize {
        self.joint_names.len()
    }

    /// Ordered segments from base to tip, fixed segments included.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the actuated joints in chain order.
    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    /// Name of the base link.
    pub fn base_link(&self) -> &str {
        &self.base_link
    }

    /// Name of the end-effector link.
    pub fn tip_link(&self) -> &str {
        &self.tip_link
    }

    /// Pose of the end-effector link relative to the base link at joint
    /// positions `q` (one entry per actuated joint, chain order).
    ///
    /// # Panics
    /// Panics if `q.len()` differs from [`dof()`](`Self::dof`).
    pub fn tip_frame(&self, q: &[f64]) -> Isometry3<f64> {
        assert_eq!(q.len(), self.dof());
        let mut transform = Isometry3::identity();
        let mut joint = 0;
        for segment in &self.segments {
            if segment.joint_type().is_actuated() {
                transform *= segment.local_transform(q[joint]);
                joint += 1;
            } else {
                transform *= segment.local_transform(0.);
            }
        }
        transform
    }
}
