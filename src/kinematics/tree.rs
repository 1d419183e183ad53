// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the segment tree an external robot-description parser hands to
//! the controller.

use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::exception::{ControlException, ControlResult};

/// How a segment moves relative to its parent link.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum JointType {
    /// Rigid connection, no degree of freedom.
    Fixed,
    /// Rotation about the joint axis.
    Revolute,
    /// Translation along the joint axis.
    Prismatic,
}

impl JointType {
    /// Whether this joint type carries a controllable degree of freedom.
    pub fn is_actuated(&self) -> bool {
        !matches!(self, JointType::Fixed)
    }
}

/// One rigid link together with the joint that connects it to its parent.
#[derive(Debug, Clone)]
pub struct Segment {
    link_name: String,
    joint_name: String,
    joint_type: JointType,
    axis: Unit<Vector3<f64>>,
    origin: Isometry3<f64>,
}

impl Segment {
    /// Creates a new Segment.
    ///
    /// # Arguments
    /// * `link_name` - Name of the child link this segment attaches.
    /// * `joint_name` - Name of the connecting joint.
    /// * `joint_type` - Degree of freedom of the connecting joint.
    /// * `axis` - Joint axis in the joint's local frame.
    /// * `origin` - Fixed transform from the parent link frame to the joint frame.
    pub fn new(
        link_name: &str,
        joint_name: &str,
        joint_type: JointType,
        axis: Unit<Vector3<f64>>,
        origin: Isometry3<f64>,
    ) -> Self {
        Segment {
            link_name: link_name.to_string(),
            joint_name: joint_name.to_string(),
            joint_type,
            axis,
            origin,
        }
    }

    /// Creates a fixed Segment with a synthesized joint name.
    pub fn fixed(link_name: &str, origin: Isometry3<f64>) -> Self {
        Segment::new(
            link_name,
            &format!("{}_fixed", link_name),
            JointType::Fixed,
            Vector3::z_axis(),
            origin,
        )
    }

    /// Name of the link this segment attaches.
    pub fn link_name(&self) -> &str {
        &self.link_name
    }

    /// Name of the connecting joint.
    pub fn joint_name(&self) -> &str {
        &self.joint_name
    }

    /// Degree of freedom of the connecting joint.
    pub fn joint_type(&self) -> JointType {
        self.joint_type
    }

    /// Fixed transform from the parent link frame to the joint frame.
    pub fn origin(&self) -> &Isometry3<f64> {
        &self.origin
    }

    /// Joint axis in the joint's local frame.
    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    /// Motion of the joint itself at position `q`, without the fixed origin.
    pub(crate) fn joint_motion(&self, q: f64) -> Isometry3<f64> {
        match self.joint_type {
            JointType::Fixed => Isometry3::identity(),
            JointType::Revolute => Isometry3::from_parts(
                Translation3::identity(),
                UnitQuaternion::from_axis_angle(&self.axis, q),
            ),
            JointType::Prismatic => Isometry3::from_parts(
                Translation3::from(self.axis.into_inner() * q),
                UnitQuaternion::identity(),
            ),
        }
    }

    /// Full transform from the parent link frame to this link's frame at
    /// joint position `q`.
    pub(crate) fn local_transform(&self, q: f64) -> Isometry3<f64> {
        self.origin * self.joint_motion(q)
    }
}

/// A tree of named links connected by [`Segment`]s, rooted at a designated
/// root link.
///
/// This is the structure an external robot-description parser produces. The
/// controller extracts its serial control chain from it and keeps the full
/// tree around for frame-transform queries against links outside the chain.
#[derive(Debug, Clone)]
pub struct KinematicTree {
    root_link: String,
    // child link name -> (parent link name, connecting segment)
    segments: HashMap<String, (String, Segment)>,
}

impl KinematicTree {
    /// Creates an empty tree consisting only of the root link.
    pub fn new(root_link: &str) -> Self {
        KinematicTree {
            root_link: root_link.to_string(),
            segments: HashMap::new(),
        }
    }

    /// Name of the root link.
    pub fn root_link(&self) -> &str {
        &self.root_link
    }

    /// Whether `link` is the root or attached by any segment.
    pub fn contains_link(&self, link: &str) -> bool {
        link == self.root_link || self.segments.contains_key(link)
    }

    /// Attaches `segment` below `parent_link`.
    ///
    /// # Errors
    /// [`ControlException::InvalidTreeEdge`] if the parent link is not part of
    /// the tree yet or a link of that name is already attached.
    pub fn add_segment(&mut self, parent_link: &str, segment: Segment) -> ControlResult<()> {
        if !self.contains_link(parent_link) {
            return Err(ControlException::InvalidTreeEdge {
                link: segment.link_name().to_string(),
                reason: format!("parent link '{}' is not part of the tree", parent_link),
            });
        }
        if self.contains_link(segment.link_name()) {
            return Err(ControlException::InvalidTreeEdge {
                link: segment.link_name().to_string(),
                reason: "a link of that name already exists".to_string(),
            });
        }
        self.segments
            .insert(segment.link_name().to_string(), (parent_link.to_string(), segment));
        Ok(())
    }

    /// Ordered segments from the root link down to `link`, or `None` if the
    /// link is unknown.
    pub(crate) fn path_from_root(&self, link: &str) -> Option<Vec<&Segment>> {
        if link == self.root_link {
            return Some(Vec::new());
        }
        let mut path = Vec::new();
        let mut current = link;
        loop {
            let (parent, segment) = self.segments.get(current)?;
            path.push(segment);
            if parent == &self.root_link {
                break;
            }
            current = parent;
        }
        path.reverse();
        Some(path)
    }

    /// Ordered segments of the serial chain from `base_link` to `tip_link`.
    ///
    /// `base_link` must be an ancestor of `tip_link` (or the tip itself, which
    /// yields an empty chain and is rejected later by the chain model).
    ///
    /// # Errors
    /// * [`ControlException::LinkNotFound`] - either link is unknown.
    /// * [`ControlException::NoChainPath`] - `base_link` is not an ancestor of `tip_link`.
    pub(crate) fn chain_segments(
        &self,
        base_link: &str,
        tip_link: &str,
    ) -> ControlResult<Vec<Segment>> {
        for link in [base_link, tip_link] {
            if !self.contains_link(link) {
                return Err(ControlException::LinkNotFound {
                    link: link.to_string(),
                });
            }
        }
        let mut chain = Vec::new();
        let mut current = tip_link;
        while current != base_link {
            match self.segments.get(current) {
                Some((parent, segment)) => {
                    chain.push(segment.clone());
                    current = parent;
                }
                // Walked past the root without meeting the base link.
                None => {
                    return Err(ControlException::NoChainPath {
                        base: base_link.to_string(),
                        tip: tip_link.to_string(),
                    })
                }
            }
        }
        chain.reverse();
        Ok(chain)
    }
}

#[cfg(test)]
mod test {
    use super::{JointType, KinematicTree, Segment};
    use crate::exception::ControlException;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

    fn z_offset(z: f64) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::new(0., 0., z), UnitQuaternion::identity())
    }

    fn revolute(link: &str, joint: &str, z: f64) -> Segment {
        Segment::new(link, joint, JointType::Revolute, Vector3::z_axis(), z_offset(z))
    }

    fn two_link_tree() -> KinematicTree {
        let mut tree = KinematicTree::new("base");
        tree.add_segment("base", revolute("upper_arm", "shoulder", 0.05))
            .unwrap();
        tree.add_segment("upper_arm", revolute("forearm", "elbow", 0.3))
            .unwrap();
        tree.add_segment("forearm", Segment::fixed("end_effector", z_offset(0.25)))
            .unwrap();
        tree
    }

    #[test]
    fn contains_root_and_attached_links() {
        let tree = two_link_tree();
        assert!(tree.contains_link("base"));
        assert!(tree.contains_link("end_effector"));
        assert!(!tree.contains_link("gripper"));
    }

    #[test]
    fn duplicate_link_is_rejected() {
        let mut tree = two_link_tree();
        let result = tree.add_segment("base", revolute("forearm", "elbow2", 0.1));
        assert!(matches!(
            result,
            Err(ControlException::InvalidTreeEdge { .. })
        ));
    }

    #[test]
    fn unknown_parent_is_rejected() {
        let mut tree = two_link_tree();
        let result = tree.add_segment("gripper", revolute("finger", "knuckle", 0.01));
        assert!(matches!(
            result,
            Err(ControlException::InvalidTreeEdge { .. })
        ));
    }

    #[test]
    fn chain_is_ordered_base_to_tip() {
        let tree = two_link_tree();
        let chain = tree.chain_segments("base", "end_effector").unwrap();
        let links: Vec<&str> = chain.iter().map(|s| s.link_name()).collect();
        assert_eq!(links, ["upper_arm", "forearm", "end_effector"]);
    }

    #[test]
    fn chain_from_unknown_link_fails() {
        let tree = two_link_tree();
        assert!(matches!(
            tree.chain_segments("base", "gripper"),
            Err(ControlException::LinkNotFound { .. })
        ));
    }

    #[test]
    fn chain_against_tree_direction_fails() {
        let tree = two_link_tree();
        assert!(matches!(
            tree.chain_segments("end_effector", "base"),
            Err(ControlException::NoChainPath { .. })
        ));
    }

    #[test]
    fn path_from_root_covers_all_ancestors() {
        let tree = two_link_tree();
        let path = tree.path_from_root("forearm").unwrap();
        let links: Vec<&str> = path.iter().map(|s| s.link_name()).collect();
        assert_eq!(links, ["upper_arm", "forearm"]);
        assert!(tree.path_from_root("base").unwrap().is_empty());
        assert!(tree.path_from_root("gripper").is_none());
    }

    #[test]
    fn prismatic_joint_translates_along_axis() {
        let segment = Segment::new(
            "slider",
            "rail",
            JointType::Prismatic,
            Vector3::x_axis(),
            Isometry3::identity(),
        );
        let transform = segment.local_transform(0.75);
        assert!((transform.translation.x - 0.75).abs() < 1e-12);
        assert!((transform.rotation.angle()).abs() < 1e-12);
    }

    #[test]
    fn revolute_joint_rotates_about_axis() {
        let segment = revolute("upper_arm", "shoulder", 0.0);
        let transform = segment.local_transform(std::f64::consts::FRAC_PI_2);
        assert!((transform.rotation.angle() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }
}
