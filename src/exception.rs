// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use thiserror::Error;

/// Represents all kinds of errors the controller core can report.
///
/// Every variant except [`UnknownLink`](`ControlException::UnknownLink`) and
/// [`InvalidLifecycleTransition`](`ControlException::InvalidLifecycleTransition`)
/// can only occur while building the controller. A controller that constructed
/// successfully never fails inside the control cycle; numerical degeneracy
/// (singular Jacobians, zero-length periods) is recovered locally instead.
#[derive(Error, Debug)]
pub enum ControlException {
    /// A link named in the chain configuration does not exist in the kinematic tree.
    #[error("link '{link}' does not exist in the kinematic tree")]
    LinkNotFound {
        /// Name of the missing link.
        link: String,
    },

    /// A segment was added twice, or under a parent that is not part of the tree yet.
    #[error("cannot attach link '{link}' to the kinematic tree: {reason}")]
    InvalidTreeEdge { link: String, reason: String },

    /// Both links exist, but no serial chain connects them root-to-tip.
    #[error("no serial chain connects '{base}' to '{tip}'")]
    NoChainPath { base: String, tip: String },

    /// The extracted chain contains only fixed segments.
    #[error("kinematic chain from '{base}' to '{tip}' contains no actuated joints")]
    NoActuatedJoints { base: String, tip: String },

    /// The joint configuration does not list one entry per actuated chain joint.
    #[error("joint configuration lists {actual} joints but the chain has {expected} actuated joints")]
    JointCountMismatch { expected: usize, actual: usize },

    /// The joint configuration names a joint that does not match the chain at that index.
    #[error("configured joint '{configured}' at index {index} does not match chain joint '{in_chain}'")]
    JointNameMismatch {
        index: usize,
        configured: String,
        in_chain: String,
    },

    /// A lifecycle method was called in a state that does not allow it. Calling
    /// `update` outside the running state is a contract violation of the
    /// orchestrating caller and must be treated as fatal.
    #[error("cannot {operation} while the controller is {state}")]
    InvalidLifecycleTransition {
        /// Lifecycle state the controller was in.
        state: &'static str,
        /// The rejected operation.
        operation: &'static str,
    },

    /// A frame-transform query named a link that is not part of the kinematic tree.
    /// Reported to the caller of the query; the control loop itself is unaffected.
    #[error("unknown link '{link}' in frame transform query")]
    UnknownLink { link: String },
}

/// Result type which can have ControlException as Error
pub type ControlResult<T> = Result<T, ControlException>;
