// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the recursive forward kinematics solver over the full segment tree.

use std::collections::HashMap;

use nalgebra::Isometry3;

use crate::exception::{ControlException, ControlResult};
use crate::kinematics::chain::KinematicChain;
use crate::kinematics::tree::{KinematicTree, Segment};

/// Computes link poses relative to the chain base by recursive composition
/// through the full segment tree.
///
/// Joint positions are indexed in chain order. Links outside the control
/// chain are reachable as long as they are part of the tree; actuated joints
/// on their path that are not controllable chain joints are evaluated at
/// zero position, since no state is retained for them.
#[derive(Debug)]
pub struct ForwardKinematicsSolver {
    tree: KinematicTree,
    base_link: String,
    // joint name -> index into the chain-ordered position vector
    joint_index: HashMap<String, usize>,
}

impl ForwardKinematicsSolver {
    /// Creates a solver for `tree`, with joint positions indexed by `chain`.
    pub fn new(tree: KinematicTree, chain: &KinematicChain) -> Self {
        let joint_index = chain
            .joint_names()
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        ForwardKinematicsSolver {
            tree,
            base_link: chain.base_link().to_string(),
            joint_index,
        }
    }

    /// Pose of `link` relative to the chain base at joint positions `q`.
    ///
    /// # Errors
    /// [`ControlException::UnknownLink`] if `link` is not part of the tree.
    pub fn pose(&self, q: &[f64], link: &str) -> ControlResult<Isometry3<f64>> {
        let base = self.pose_from_root(q, &self.base_link)?;
        let target = self.pose_from_root(q, link)?;
        Ok(base.inverse() * target)
    }

    fn pose_from_root(&self, q: &[f64], link: &str) -> ControlResult<Isometry3<f64>> {
        let path = self
            .tree
            .path_from_root(link)
            .ok_or_else(|| ControlException::UnknownLink {
                link: link.to_string(),
            })?;
        let mut transform = Isometry3::identity();
        for segment in path {
            transform *= segment.local_transform(self.joint_position(segment, q));
        }
        Ok(transform)
    }

    fn joint_position(&self, segment: &Segment, q: &[f64]) -> f64 {
        if !segment.joint_type().is_actuated() {
            return 0.;
        }
        match self.joint_index.get(segment.joint_name()) {
            Some(&index) => q[index],
            None => 0.,
        }
    }
}
