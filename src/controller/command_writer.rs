// Copyright (c) 2025 cartesian-control-rs contributors
// Licensed under the EUPL-1.2-or-later

//! Contains the hardware-facing joint capability and the per-cycle command
//! dispatch.

use serde::{Deserialize, Serialize};

use crate::controller::forward_dynamics::JointControlCmd;

/// Capability handle of one actuated joint, implemented by the hardware
/// abstraction outside this crate.
///
/// Handles are ordered; index `i` corresponds to the i-th actuated joint of
/// the kinematic chain. All three operations must be non-blocking.
#[cfg_attr(test, mockall::automock)]
pub trait JointHandle {
    /// Current measured joint position.
    fn position(&self) -> f64;
    /// Current measured joint velocity.
    fn velocity(&self) -> f64;
    /// Writes the command for the current control cycle.
    fn set_command(&mut self, command: f64);
}

/// Which per-joint quantity the hardware interface consumes.
///
/// Selected once when the controller is built; position-mode and
/// velocity-mode hardware are mutually exclusive for the controller's
/// lifetime.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CommandInterface {
    /// The hardware expects joint positions.
    Position,
    /// The hardware expects joint velocities.
    Velocity,
}

/// Dispatches the simulated joint motion to the hardware handles, taking
/// either the position or the velocity track depending on the interface
/// fixed at construction.
#[derive(Debug)]
pub struct JointCommandWriter {
    interface: CommandInterface,
}

impl JointCommandWriter {
    /// Creates a writer for the given hardware interface.
    pub fn new(interface: CommandInterface) -> Self {
        JointCommandWriter { interface }
    }

    /// The interface this writer was built for.
    pub fn interface(&self) -> CommandInterface {
        self.interface
    }

    /// Writes one command per joint, in handle order.
    pub fn write(&self, command: &JointControlCmd, handles: &mut [Box<dyn JointHandle>]) {
        match self.interface {
            CommandInterface::Position => {
                for (handle, &position) in handles.iter_mut().zip(command.positions.iter()) {
                    handle.set_command(position);
                }
            }
            CommandInterface::Velocity => {
                for (handle, &velocity) in handles.iter_mut().zip(command.velocities.iter()) {
                    handle.set_command(velocity);
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CommandInterface, JointCommandWriter, JointHandle, MockJointHandle};
    use crate::controller::forward_dynamics::JointControlCmd;
    use nalgebra::DVector;

    fn command() -> JointControlCmd {
        JointControlCmd {
            positions: DVector::from_vec(vec![0.1, 0.2, 0.3]),
            velocities: DVector::from_vec(vec![-1., -2., -3.]),
        }
    }

    fn expecting_handles(expected: [f64; 3]) -> Vec<Box<dyn JointHandle>> {
        expected
            .iter()
            .map(|&value| {
                let mut handle = MockJointHandle::new();
                handle
                    .expect_set_command()
                    .withf(move |&cmd| (cmd - value).abs() < 1e-12)
                    .times(1)
                    .return_const(());
                Box::new(handle) as Box<dyn JointHandle>
            })
            .collect()
    }

    #[test]
    fn position_mode_writes_simulated_positions() {
        let mut handles = expecting_handles([0.1, 0.2, 0.3]);
        JointCommandWriter::new(CommandInterface::Position).write(&command(), &mut handles);
    }

    #[test]
    fn velocity_mode_writes_simulated_velocities() {
        let mut handles = expecting_handles([-1., -2., -3.]);
        JointCommandWriter::new(CommandInterface::Velocity).write(&command(), &mut handles);
    }
}
