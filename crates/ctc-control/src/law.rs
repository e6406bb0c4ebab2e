//! 关节空间计算力矩控制律
//!
//! τ = M(q)·(Kp⊙e + Kd⊙ė) + C(q, qd)·qd + G(q)
//!
//! 其中 e = q_des − q，ė = qd_des − qd。M· 项把期望的关节加速度修正
//! 通过机构的真实惯量换算为力矩；C·qd 和 G 抵消速度耦合与重力偏置。

use crate::error::CycleFault;
use ctc_dynamics::DynamicsSnapshot;
use ctc_types::nalgebra::DVector;
use ctc_types::{ControlGains, EffortCommand, JointState, JointVector};

/// 控制律的参考输入
///
/// 位置和速度参考由各控制器变体从各自唯一的设定值类型填充。
#[derive(Debug, Clone, PartialEq)]
pub struct JointReference {
    /// 期望位置 q_des
    pub position: JointVector,
    /// 期望速度 qd_des
    pub velocity: JointVector,
}

impl JointReference {
    pub fn zeros(len: usize) -> Self {
        Self {
            position: JointVector::zeros(len),
            velocity: JointVector::zeros(len),
        }
    }

    /// 保持当前位置、期望速度为零
    pub fn hold(&mut self, state: &JointState) {
        self.position.clone_from(&state.positions);
        self.velocity.set_zero();
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }
}

/// 计算力矩控制律
///
/// 内部的修正向量在构造时分配，`compute` 不分配内存。
#[derive(Debug, Clone)]
pub struct ComputedTorqueLaw {
    gains: ControlGains,
    /// Kp⊙e + Kd⊙ė
    correction: DVector<f64>,
}

impl ComputedTorqueLaw {
    pub fn new(gains: ControlGains) -> Self {
        let n = gains.len();
        Self {
            gains,
            correction: DVector::zeros(n),
        }
    }

    pub fn gains(&self) -> &ControlGains {
        &self.gains
    }

    pub fn dof(&self) -> usize {
        self.gains.len()
    }

    /// 最近一次计算的加速度修正 Kp⊙e + Kd⊙ė
    pub fn correction(&self) -> &DVector<f64> {
        &self.correction
    }

    /// 计算一个周期的力矩
    ///
    /// 调用方保证所有输入维度与增益一致、快照已通过校验。
    /// 结果非有限时返回 [`CycleFault::NonFiniteEffort`]，`effort` 内容此时无意义。
    pub fn compute(
        &mut self,
        reference: &JointReference,
        state: &JointState,
        dynamics: &DynamicsSnapshot,
        effort: &mut EffortCommand,
    ) -> Result<(), CycleFault> {
        let kp = &self.gains.kp;
        let kd = &self.gains.kd;
        for i in 0..self.correction.len() {
            let e = reference.position[i] - state.positions[i];
            let e_dot = reference.velocity[i] - state.velocities[i];
            self.correction[i] = kp[i] * e + kd[i] * e_dot;
        }

        let tau: &mut DVector<f64> = effort.efforts_mut();
        tau.copy_from(&*dynamics.coriolis);
        *tau += &*dynamics.gravity;
        tau.gemv(1.0, &dynamics.mass_matrix, &self.correction, 1.0);

        if !effort.is_finite() {
            return Err(CycleFault::NonFiniteEffort);
        }
        Ok(())
    }
}
