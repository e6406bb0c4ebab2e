//! 仿真硬件
//!
//! 用动力学模型正向积分（半隐式欧拉）代替真实机械臂，供 CLI 和测试使用。
//! 每次 `write_effort` 推进一个时间步。

use crate::loop_runner::Hardware;
use ctc_dynamics::{DynamicsModel, DynamicsSnapshot, ModelError, Requirements};
use ctc_types::{EffortCommand, JointState, JointVector};
use std::time::Duration;
use thiserror::Error;

/// 仿真错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Dynamics model error: {0}")]
    Model(#[from] ModelError),

    #[error("Mass matrix is singular at the current state")]
    Singular,

    #[error("Effort has {actual} joints, arm has {expected}")]
    Dimension { expected: usize, actual: usize },
}

/// 仿真机械臂
#[derive(Debug)]
pub struct SimulatedArm<D: DynamicsModel> {
    model: D,
    state: JointState,
    snapshot: DynamicsSnapshot,
    /// 驱动力矩减去粘滞摩擦后的净力矩
    net_effort: JointVector,
    dt: f64,
    viscous_friction: f64,
    last_effort: EffortCommand,
    commands_written: u64,
}

impl<D: DynamicsModel> SimulatedArm<D> {
    pub fn new(model: D, initial: JointState, step: Duration) -> Result<Self, SimulationError> {
        let n = model.dof();
        if initial.len() != n || initial.velocities.len() != n {
            return Err(SimulationError::Dimension {
                expected: n,
                actual: initial.len(),
            });
        }
        Ok(Self {
            model,
            state: initial,
            snapshot: DynamicsSnapshot::new(n, Requirements::JOINT_SPACE),
            net_effort: JointVector::zeros(n),
            dt: step.as_secs_f64(),
            viscous_friction: 0.0,
            last_effort: EffortCommand::zeros(n),
            commands_written: 0,
        })
    }

    /// 关节粘滞摩擦系数（N·m·s/rad）
    pub fn with_viscous_friction(mut self, coefficient: f64) -> Self {
        self.viscous_friction = coefficient;
        self
    }

    pub fn state(&self) -> &JointState {
        &self.state
    }

    pub fn model(&self) -> &D {
        &self.model
    }

    /// 最近一次收到的力矩命令
    pub fn last_effort(&self) -> &EffortCommand {
        &self.last_effort
    }

    pub fn commands_written(&self) -> u64 {
        self.commands_written
    }

    /// 施加力矩并推进一个时间步
    pub fn step(&mut self, effort: &EffortCommand) -> Result<(), SimulationError> {
        let n = self.state.len();
        if effort.len() != n {
            return Err(SimulationError::Dimension {
                expected: n,
                actual: effort.len(),
            });
        }

        self.model.evaluate(&self.state, &mut self.snapshot)?;
        for i in 0..n {
            self.net_effort[i] =
                effort.efforts()[i] - self.viscous_friction * self.state.velocities[i];
        }
        let acceleration = self
            .snapshot
            .forward_acceleration(&self.net_effort)
            .ok_or(SimulationError::Singular)?;

        for i in 0..n {
            self.state.velocities[i] += acceleration[i] * self.dt;
            self.state.positions[i] += self.state.velocities[i] * self.dt;
        }
        Ok(())
    }
}

impl<D: DynamicsModel> Hardware for SimulatedArm<D> {
    type Error = SimulationError;

    fn read_state(&mut self, state: &mut JointState) -> Result<(), SimulationError> {
        if state.len() != self.state.len() {
            return Err(SimulationError::Dimension {
                expected: self.state.len(),
                actual: state.len(),
            });
        }
        state.copy_from(&self.state);
        Ok(())
    }

    fn write_effort(&mut self, effort: &EffortCommand) -> Result<(), SimulationError> {
        self.last_effort.clone_from(effort);
        self.commands_written += 1;
        self.step(effort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctc_dynamics::PlanarChain;

    #[test]
    fn test_gravity_compensation_holds_still() {
        let mut chain = PlanarChain::uniform(2, 0.5, 1.0).unwrap();
        let initial = JointState::new([0.3, 0.2], [0.0, 0.0]).unwrap();

        // 纯重力补偿力矩
        let mut snapshot = DynamicsSnapshot::new(2, Requirements::JOINT_SPACE);
        chain.evaluate(&initial, &mut snapshot).unwrap();
        let effort = EffortCommand::from_efforts(snapshot.gravity.clone());

        let mut arm = SimulatedArm::new(chain, initial, Duration::from_millis(1)).unwrap();
        for _ in 0..10 {
            arm.write_effort(&effort).unwrap();
        }
        assert!((arm.state().positions[0] - 0.3).abs() < 1e-9);
        assert!((arm.state().positions[1] - 0.2).abs() < 1e-9);
        assert_eq!(arm.commands_written(), 10);
    }

    #[test]
    fn test_zero_effort_falls() {
        let chain = PlanarChain::uniform(1, 0.5, 1.0).unwrap();
        let mut arm = SimulatedArm::new(chain, JointState::zeros(1), Duration::from_millis(1))
            .unwrap()
            .with_viscous_friction(0.1);
        for _ in 0..100 {
            arm.write_effort(&EffortCommand::zeros(1)).unwrap();
        }
        // 水平单摆在重力作用下向下转动
        assert!(arm.state().positions[0] < 0.0);
        assert!(arm.state().velocities[0] < 0.0);
    }

    #[test]
    fn test_dimension_checks() {
        let chain = PlanarChain::uniform(2, 0.5, 1.0).unwrap();
        let step = Duration::from_millis(1);
        assert!(SimulatedArm::new(chain.clone(), JointState::zeros(3), step).is_err());

        let mut arm = SimulatedArm::new(chain, JointState::zeros(2), step).unwrap();
        assert_eq!(
            arm.write_effort(&EffortCommand::zeros(1)),
            Err(SimulationError::Dimension {
                expected: 2,
                actual: 1
            })
        );
        let mut state = JointState::zeros(1);
        assert!(arm.read_state(&mut state).is_err());
    }
}
