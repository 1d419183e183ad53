// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the forward dynamics solver which resolves a Cartesian control
//! input into simulated joint motion.

use std::time::Duration;

use nalgebra::{DMatrix, DVector, Isometry3, Vector3};

use crate::controller::command_writer::JointHandle;
use crate::kinematics::KinematicChain;
use crate::utils::{Matrix6D, Vector6D};

/// Default Tikhonov damping factor of the least-squares resolution.
pub static DEFAULT_DAMPING: f64 = 0.05;

/// Per-joint command of one control cycle, read by the
/// [`JointCommandWriter`](`crate::controller::JointCommandWriter`).
#[derive(Debug, Clone, PartialEq)]
pub struct JointControlCmd {
    /// Simulated joint positions.
    pub positions: DVector<f64>,
    /// Simulated joint velocities.
    pub velocities: DVector<f64>,
}

/// Resolves a 6D Cartesian control input into joint motion on a simulated
/// duplicate of the joint state.
///
/// The simulated state is seeded from the hardware once per
/// [`set_start_state`](`Self::set_start_state`) and afterwards evolves only
/// through the solver's own integration, which decouples the command stream
/// from sensor noise within a control cycle. The Cartesian input is mapped
/// to joint velocity through a damped least-squares inverse of the chain's
/// geometric Jacobian, `q̇ = Jᵀ (J Jᵀ + λ²I)⁻¹ u`; the always-on damping
/// keeps joint velocities bounded at rank-deficient configurations.
///
/// All buffers are allocated at construction. The per-cycle call
/// [`get_joint_control_cmds`](`Self::get_joint_control_cmds`) does not touch
/// the heap.
#[derive(Debug)]
pub struct ForwardDynamicsSolver {
    chain: KinematicChain,
    positions: DVector<f64>,
    velocities: DVector<f64>,
    damping: f64,
    prismatic: Vec<bool>,
    // per-cycle workspace
    jacobian: DMatrix<f64>,
    joint_origins: Vec<Vector3<f64>>,
    joint_axes: Vec<Vector3<f64>>,
    joint_velocity: DVector<f64>,
    command: JointControlCmd,
}

impl ForwardDynamicsSolver {
    /// Creates a solver for `chain` with the default damping factor.
    pub fn new(chain: KinematicChain) -> Self {
        let dof = chain.dof();
        let prismatic = chain
            .segments()
            .iter()
            .filter(|s| s.joint_type().is_actuated())
            .map(|s| s.joint_type() == crate::kinematics::JointType::Prismatic)
            .collect();
        ForwardDynamicsSolver {
            chain,
            positions: DVector::zeros(dof),
            velocities: DVector::zeros(dof),
            damping: DEFAULT_DAMPING,
            prismatic,
            jacobian: DMatrix::zeros(6, dof),
            joint_origins: vec![Vector3::zeros(); dof],
            joint_axes: vec![Vector3::zeros(); dof],
            joint_velocity: DVector::zeros(dof),
            command: JointControlCmd {
                positions: DVector::zeros(dof),
                velocities: DVector::zeros(dof),
            },
        }
    }

    /// Overrides the Tikhonov damping factor. Must be positive.
    pub fn with_damping(mut self, damping: f64) -> Self {
        assert!(damping > 0. && damping.is_finite());
        self.damping = damping;
        self
    }

    /// Copies the measured joint state into the internal simulation.
    ///
    /// Called once per controller start; seeding from the hardware makes the
    /// first cycle's command continuous with the real joint state.
    pub fn set_start_state(&mut self, handles: &[Box<dyn JointHandle>]) {
        for (index, handle) in handles.iter().enumerate() {
            self.positions[index] = handle.position();
            self.velocities[index] = handle.velocity();
        }
        self.command.positions.copy_from(&self.positions);
        self.command.velocities.copy_from(&self.velocities);
    }

    /// Performs one cycle of Cartesian-to-joint resolution and integration.
    ///
    /// A zero-length period is a no-op: the simulated state stays untouched
    /// and the previous command is returned. A rank-deficient Jacobian takes
    /// the damped path and yields bounded velocities; neither condition is an
    /// error.
    pub fn get_joint_control_cmds(
        &mut self,
        period: Duration,
        cartesian_input: &Vector6D,
    ) -> &JointControlCmd {
        let dt = period.as_secs_f64();
        if dt <= 0. {
            return &self.command;
        }

        self.update_jacobian();

        // J Jᵀ + λ²I, accumulated into a stack-allocated 6x6.
        let mut jjt = Matrix6D::zeros();
        for row in 0..6 {
            for col in 0..6 {
                let mut sum = 0.;
                for joint in 0..self.jacobian.ncols() {
                    sum += self.jacobian[(row, joint)] * self.jacobian[(col, joint)];
                }
                jjt[(row, col)] = sum;
            }
        }
        let lambda_sq = self.damping * self.damping;
        for diag in 0..6 {
            jjt[(diag, diag)] += lambda_sq;
        }

        let weights = match jjt.try_inverse() {
            Some(inverse) => inverse * cartesian_input,
            // Unreachable for positive damping; resolve to standstill.
            None => Vector6D::zeros(),
        };
        // q̇ = Jᵀ w, in place.
        self.joint_velocity.gemv_tr(1., &self.jacobian, &weights, 0.);

        // Explicit first-order integration.
        self.positions.axpy(dt, &self.joint_velocity, 1.);
        self.velocities.copy_from(&self.joint_velocity);

        self.command.positions.copy_from(&self.positions);
        self.command.velocities.copy_from(&self.velocities);
        &self.command
    }

    /// Simulated joint positions the last command was derived from.
    pub fn positions(&self) -> &DVector<f64> {
        &self.positions
    }

    /// Simulated joint velocities.
    pub fn velocities(&self) -> &DVector<f64> {
        &self.velocities
    }

    /// The chain this solver resolves against.
    pub fn chain(&self) -> &KinematicChain {
        &self.chain
    }

    /// Recomputes the geometric Jacobian at the current simulated positions.
    ///
    /// Column `i` holds `[zᵢ × (p_tip − pᵢ); zᵢ]` for revolute joints and
    /// `[zᵢ; 0]` for prismatic joints, all expressed in the base frame.
    fn update_jacobian(&mut self) {
        let mut transform = Isometry3::identity();
        let mut joint = 0;
        for segment in self.chain.segments() {
            if segment.joint_type().is_actuated() {
                transform *= *segment.origin();
                self.joint_origins[joint] = transform.translation.vector;
                self.joint_axes[joint] = transform.rotation * segment.axis().into_inner();
                transform *= segment.joint_motion(self.positions[joint]);
                joint += 1;
            } else {
                transform *= segment.local_transform(0.);
            }
        }
        let tip = transform.translation.vector;

        for joint in 0..self.jacobian.ncols() {
            let axis = self.joint_axes[joint];
            let (linear, angular) = if self.prismatic[joint] {
                (axis, Vector3::zeros())
            } else {
                (axis.cross(&(tip - self.joint_origins[joint])), axis)
            };
            for row in 0..3 {
                self.jacobian[(row, joint)] = linear[row];
                self.jacobian[(row + 3, joint)] = angular[row];
            }
        }
    }
}
