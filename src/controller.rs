// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the Cartesian controller core: lifecycle orchestration of the
//! PID controller, the forward dynamics solver and the command dispatch.

mod command_writer;
mod forward_dynamics;
mod pid;

pub use command_writer::{CommandInterface, JointCommandWriter, JointHandle};
pub use forward_dynamics::{ForwardDynamicsSolver, JointControlCmd, DEFAULT_DAMPING};
pub use pid::{PidGains, SpatialPidController};

use std::time::Duration;

use crate::exception::{ControlException, ControlResult};
use crate::kinematics::{ForwardKinematicsSolver, KinematicChain, KinematicTree};
use crate::utils::{transform_wrench, Vector6D};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Lifecycle {
    Initialized,
    Running,
    Stopped,
}

impl Lifecycle {
    fn name(&self) -> &'static str {
        match self {
            Lifecycle::Initialized => "initialized",
            Lifecycle::Running => "running",
            Lifecycle::Stopped => "stopped",
        }
    }
}

/// The shared core of a Cartesian robot-arm controller.
///
/// Converts a 6D Cartesian error into per-joint commands once per control
/// period: the spatial PID turns the error into a Cartesian control input,
/// the forward dynamics solver resolves it into simulated joint motion, and
/// the command writer dispatches the result to the hardware handles.
///
/// A controller only exists in a fully initialized form;
/// [`init`](`Self::init`) fails with a typed error on any configuration
/// problem. Afterwards the lifecycle is `start` → `update`* → `stop`, with
/// restart allowed from the stopped state. [`update`](`Self::update`)
/// performs no blocking work and no heap allocation.
pub struct CartesianController {
    fk_solver: ForwardKinematicsSolver,
    dynamics: ForwardDynamicsSolver,
    pid: SpatialPidController,
    writer: JointCommandWriter,
    handles: Vec<Box<dyn JointHandle>>,
    cartesian_input: Vector6D,
    state: Lifecycle,
}

impl CartesianController {
    /// Builds the controller from an externally parsed robot description.
    ///
    /// # Arguments
    /// * `tree` - Segment tree of the robot.
    /// * `base_link` - Root of the control chain.
    /// * `tip_link` - End-effector link.
    /// * `joint_names` - Controllable joints, ordered base to tip.
    /// * `handles` - Hardware capability per joint, index-aligned with `joint_names`.
    /// * `gains` - Per-axis Cartesian PID gains.
    /// * `interface` - Whether the hardware consumes positions or velocities.
    ///
    /// # Errors
    /// Any chain or joint-configuration problem from
    /// [`KinematicChain::new`], plus
    /// [`ControlException::JointCountMismatch`] when the number of handles
    /// differs from the chain's degrees of freedom. On error no controller
    /// exists; there is no partially initialized state.
    pub fn init(
        tree: KinematicTree,
        base_link: &str,
        tip_link: &str,
        joint_names: &[String],
        handles: Vec<Box<dyn JointHandle>>,
        gains: [PidGains; 6],
        interface: CommandInterface,
    ) -> ControlResult<Self> {
        let chain = KinematicChain::new(&tree, base_link, tip_link, joint_names)?;
        if handles.len() != chain.dof() {
            return Err(ControlException::JointCountMismatch {
                expected: chain.dof(),
                actual: handles.len(),
            });
        }
        let fk_solver = ForwardKinematicsSolver::new(tree, &chain);
        tracing::info!(
            base_link,
            tip_link,
            dof = chain.dof(),
            ?interface,
            "cartesian controller initialized"
        );
        Ok(CartesianController {
            fk_solver,
            dynamics: ForwardDynamicsSolver::new(chain),
            pid: SpatialPidController::new(gains),
            writer: JointCommandWriter::new(interface),
            handles,
            cartesian_input: Vector6D::zeros(),
            state: Lifecycle::Initialized,
        })
    }

    /// Transitions into the running state.
    ///
    /// Seeds the simulated joint state from the hardware and resets the PID,
    /// so the first cycle is continuous with the real robot state.
    ///
    /// # Errors
    /// [`ControlException::InvalidLifecycleTransition`] if already running.
    pub fn start(&mut self) -> ControlResult<()> {
        match self.state {
            Lifecycle::Initialized | Lifecycle::Stopped => {
                self.dynamics.set_start_state(&self.handles);
                self.pid.reset();
                self.state = Lifecycle::Running;
                tracing::debug!("cartesian controller started");
                Ok(())
            }
            Lifecycle::Running => Err(ControlException::InvalidLifecycleTransition {
                state: self.state.name(),
                operation: "start",
            }),
        }
    }

    /// Transitions out of the running state. No command is issued; the last
    /// written command stays in effect at the hardware layer.
    ///
    /// # Errors
    /// [`ControlException::InvalidLifecycleTransition`] if not running.
    pub fn stop(&mut self) -> ControlResult<()> {
        match self.state {
            Lifecycle::Running => {
                self.state = Lifecycle::Stopped;
                tracing::debug!("cartesian controller stopped");
                Ok(())
            }
            _ => Err(ControlException::InvalidLifecycleTransition {
                state: self.state.name(),
                operation: "stop",
            }),
        }
    }

    /// Performs one control cycle: PID, then dynamics resolution, then the
    /// hardware write, in that order. State mutations become visible to the
    /// next cycle only.
    ///
    /// # Errors
    /// [`ControlException::InvalidLifecycleTransition`] when not running;
    /// this signals a defect in the orchestrating caller and must be treated
    /// as fatal.
    pub fn update(&mut self, error: &Vector6D, period: Duration) -> ControlResult<()> {
        if self.state != Lifecycle::Running {
            return Err(ControlException::InvalidLifecycleTransition {
                state: self.state.name(),
                operation: "update",
            });
        }
        self.cartesian_input = self.pid.compute(error, period);
        let command = self
            .dynamics
            .get_joint_control_cmds(period, &self.cartesian_input);
        self.writer.write(command, &mut self.handles);
        Ok(())
    }

    /// Re-expresses a wrench measured in the `from` link's frame in the base
    /// link frame, evaluated at the current simulated joint state so the
    /// result is kinematically consistent with the command just issued.
    ///
    /// # Errors
    /// [`ControlException::UnknownLink`] if `from` is not part of the tree.
    /// The control loop's own state is unaffected.
    pub fn display_in_base_link(&self, wrench: &Vector6D, from: &str) -> ControlResult<Vector6D> {
        let transform = self
            .fk_solver
            .pose(self.dynamics.positions().as_slice(), from)?;
        Ok(transform_wrench(&transform, wrench))
    }

    /// The Cartesian control input of the most recent cycle.
    pub fn cartesian_input(&self) -> &Vector6D {
        &self.cartesian_input
    }

    /// Whether the controller is currently running.
    pub fn is_running(&self) -> bool {
        self.state == Lifecycle::Running
    }

    /// The forward dynamics solver, for read access to the simulated state.
    pub fn dynamics(&self) -> &ForwardDynamicsSolver {
        &self.dynamics
    }
}

#[cfg(test)]
mod test {
    use super::command_writer::MockJointHandle;
    use super::{CartesianController, CommandInterface, JointHandle, PidGains};
    use crate::exception::ControlException;
    use crate::kinematics::{JointType, KinematicTree, Segment};
    use crate::utils::Vector6D;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
    use std::time::Duration;

    fn z_offset(z: f64) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::new(0., 0., z), UnitQuaternion::identity())
    }

    fn arm_tree() -> KinematicTree {
        let axes = [
            Vector3::z_axis(),
            Vector3::y_axis(),
            Vector3::y_axis(),
            Vector3::z_axis(),
            Vector3::y_axis(),
            Vector3::z_axis(),
        ];
        let offsets = [0.05, 0.2, 0.3, 0.1, 0.2, 0.06];
        let mut tree = KinematicTree::new("base");
        let mut parent = "base".to_string();
        for (index, (axis, offset)) in axes.iter().zip(offsets.iter()).enumerate() {
            let link = format!("link_{}", index + 1);
            let joint = format!("joint_{}", index + 1);
            tree.add_segment(
                &parent,
                Segment::new(&link, &joint, JointType::Revolute, *axis, z_offset(*offset)),
            )
            .unwrap();
            parent = link;
        }
        tree
    }

    fn joint_names() -> Vec<String> {
        (1..=6).map(|i| format!("joint_{}", i)).collect()
    }

    fn resting_handles(count: usize) -> Vec<Box<dyn JointHandle>> {
        (0..count)
            .map(|_| {
                let mut handle = MockJointHandle::new();
                handle.expect_position().return_const(0.);
                handle.expect_velocity().return_const(0.);
                handle.expect_set_command().return_const(());
                Box::new(handle) as Box<dyn JointHandle>
            })
            .collect()
    }

    fn controller() -> CartesianController {
        CartesianController::init(
            arm_tree(),
            "base",
            "link_6",
            &joint_names(),
            resting_handles(6),
            [PidGains::new(1., 0., 0.); 6],
            CommandInterface::Position,
        )
        .unwrap()
    }

    #[test]
    fn init_rejects_unknown_tip_link() {
        let result = CartesianController::init(
            arm_tree(),
            "base",
            "link_7",
            &joint_names(),
            resting_handles(6),
            [PidGains::default(); 6],
            CommandInterface::Position,
        );
        assert!(matches!(result, Err(ControlException::LinkNotFound { .. })));
    }

    #[test]
    fn init_rejects_handle_count_mismatch() {
        let result = CartesianController::init(
            arm_tree(),
            "base",
            "link_6",
            &joint_names(),
            resting_handles(5),
            [PidGains::default(); 6],
            CommandInterface::Position,
        );
        assert!(matches!(
            result,
            Err(ControlException::JointCountMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn double_start_is_rejected() {
        let mut controller = controller();
        controller.start().unwrap();
        assert!(matches!(
            controller.start(),
            Err(ControlException::InvalidLifecycleTransition {
                state: "running",
                operation: "start"
            })
        ));
    }

    #[test]
    fn update_before_start_is_rejected() {
        let mut controller = controller();
        let result = controller.update(&Vector6D::zeros(), Duration::from_millis(1));
        assert!(matches!(
            result,
            Err(ControlException::InvalidLifecycleTransition {
                state: "initialized",
                operation: "update"
            })
        ));
    }

    #[test]
    fn stop_requires_running() {
        let mut controller = controller();
        assert!(controller.stop().is_err());
        controller.start().unwrap();
        controller.stop().unwrap();
        assert!(!controller.is_running());
        // Restart from stopped is a valid transition.
        controller.start().unwrap();
        assert!(controller.is_running());
    }

    #[test]
    fn update_retains_cartesian_input() {
        let mut controller = controller();
        controller.start().unwrap();
        let error = Vector6D::new(0.5, 0., 0., 0., 0., 0.);
        controller
            .update(&error, Duration::from_millis(1))
            .unwrap();
        // Pure proportional gain of 1: input equals error.
        assert_eq!(controller.cartesian_input(), &error);
    }

    #[test]
    fn update_writes_position_commands() {
        let names = joint_names();
        let handles: Vec<Box<dyn JointHandle>> = (0..6)
            .map(|_| {
                let mut handle = MockJointHandle::new();
                handle.expect_position().return_const(0.);
                handle.expect_velocity().return_const(0.);
                // One write per update cycle, finite position command.
                handle
                    .expect_set_command()
                    .withf(|&cmd| cmd.is_finite())
                    .times(2)
                    .return_const(());
                Box::new(handle) as Box<dyn JointHandle>
            })
            .collect();
        let mut controller = CartesianController::init(
            arm_tree(),
            "base",
            "link_6",
            &names,
            handles,
            [PidGains::new(1., 0., 0.); 6],
            CommandInterface::Position,
        )
        .unwrap();
        controller.start().unwrap();
        let error = Vector6D::new(0.1, 0., 0., 0., 0., 0.);
        controller.update(&error, Duration::from_millis(10)).unwrap();
        controller.update(&error, Duration::from_millis(10)).unwrap();
    }

    #[test]
    fn wrench_from_base_link_is_unchanged() {
        let mut controller = controller();
        controller.start().unwrap();
        let wrench = Vector6D::new(1., 0., 0., 0., 0., 0.);
        let out = controller.display_in_base_link(&wrench, "base").unwrap();
        for axis in 0..6 {
            assert!((out[axis] - wrench[axis]).abs() < 1e-12);
        }
    }

    #[test]
    fn wrench_from_unknown_link_is_reported() {
        let controller = controller();
        assert!(matches!(
            controller.display_in_base_link(&Vector6D::zeros(), "gripper"),
            Err(ControlException::UnknownLink { .. })
        ));
    }

    #[test]
    fn wrench_from_elevated_link_picks_up_lever_arm() {
        let controller = controller();
        // link_1 sits 0.05 above the base; the lever arm of a unit x force
        // is p x f = (0,0,0.05) x (1,0,0) = (0,0.05,0).
        let wrench = Vector6D::new(1., 0., 0., 0., 0., 0.);
        let out = controller.display_in_base_link(&wrench, "link_1").unwrap();
        assert!((out[0] - 1.).abs() < 1e-12);
        assert!((out[4] - 0.05).abs() < 1e-12);
    }
}
