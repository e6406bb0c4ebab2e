//! 预分配的动力学快照

use crate::linalg::{is_positive_definite, is_symmetric};
use ctc_types::nalgebra::{DMatrix, DVector, Matrix6xX};
use ctc_types::{JointVector, Pose, TASK_DOF};
use thiserror::Error;

/// 质量矩阵对称性的相对容差
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// 控制器需要模型提供的量
///
/// 质量矩阵、科氏项和重力项总是必需的；Jacobian 和位姿只有任务空间变体需要。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirements {
    pub jacobian: bool,
    pub pose: bool,
}

impl Requirements {
    /// 关节空间变体
    pub const JOINT_SPACE: Requirements = Requirements {
        jacobian: false,
        pose: false,
    };

    /// 任务空间速度变体
    pub const TASK_VELOCITY: Requirements = Requirements {
        jacobian: true,
        pose: false,
    };

    /// 任务空间位姿变体
    pub const TASK_POSE: Requirements = Requirements {
        jacobian: true,
        pose: true,
    };

    /// `capabilities` 是否覆盖了本需求
    pub fn is_satisfied_by(self, capabilities: Requirements) -> bool {
        (!self.jacobian || capabilities.jacobian) && (!self.pose || capabilities.pose)
    }
}

/// 快照校验失败的原因
///
/// 全部是 `Copy` 的无负载变体，实时路径上构造和记录都不分配内存。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFault {
    #[error("snapshot dimensions do not match the joint count")]
    DimensionMismatch,
    #[error("mass matrix contains non-finite values")]
    NonFiniteMassMatrix,
    #[error("Coriolis term contains non-finite values")]
    NonFiniteCoriolis,
    #[error("gravity term contains non-finite values")]
    NonFiniteGravity,
    #[error("Jacobian contains non-finite values")]
    NonFiniteJacobian,
    #[error("end-effector pose contains non-finite values")]
    NonFinitePose,
    #[error("Jacobian was required but not provided")]
    MissingJacobian,
    #[error("end-effector pose was required but not provided")]
    MissingPose,
    #[error("mass matrix is not symmetric")]
    AsymmetricMassMatrix,
    #[error("mass matrix is not positive definite")]
    NotPositiveDefinite,
}

/// 一次模型求值的输出
///
/// 在初始化时按关节数预分配，之后每个控制周期由模型原地覆盖。
#[derive(Debug, Clone)]
pub struct DynamicsSnapshot {
    /// 质量矩阵 M(q)，n×n
    pub mass_matrix: DMatrix<f64>,
    /// 科氏力/离心力力矩 C(q, qd)·qd
    pub coriolis: JointVector,
    /// 重力力矩 G(q)
    pub gravity: JointVector,
    /// 末端 6×n Jacobian（线速度在前，角速度在后）
    pub jacobian: Option<Matrix6xX<f64>>,
    /// 末端位姿
    pub pose: Option<Pose>,
    requirements: Requirements,
    /// 正定性检查用的 Cholesky 工作区
    scratch: DMatrix<f64>,
}

impl DynamicsSnapshot {
    pub fn new(dof: usize, requirements: Requirements) -> Self {
        Self {
            mass_matrix: DMatrix::zeros(dof, dof),
            coriolis: JointVector::zeros(dof),
            gravity: JointVector::zeros(dof),
            jacobian: requirements.jacobian.then(|| Matrix6xX::zeros(dof)),
            pose: requirements.pose.then(Pose::identity),
            requirements,
            scratch: DMatrix::zeros(dof, dof),
        }
    }

    /// 关节数
    pub fn dof(&self) -> usize {
        self.coriolis.len()
    }

    pub fn requirements(&self) -> Requirements {
        self.requirements
    }

    /// 校验模型输出
    ///
    /// 依次检查维度、有限性、对称性和正定性。不分配内存。
    pub fn validate(&mut self) -> Result<(), SnapshotFault> {
        let n = self.dof();
        if self.mass_matrix.shape() != (n, n) || self.gravity.len() != n {
            return Err(SnapshotFault::DimensionMismatch);
        }

        if !self.mass_matrix.iter().all(|v| v.is_finite()) {
            return Err(SnapshotFault::NonFiniteMassMatrix);
        }
        if !self.coriolis.is_finite() {
            return Err(SnapshotFault::NonFiniteCoriolis);
        }
        if !self.gravity.is_finite() {
            return Err(SnapshotFault::NonFiniteGravity);
        }

        if self.requirements.jacobian {
            let jacobian = self.jacobian.as_ref().ok_or(SnapshotFault::MissingJacobian)?;
            if jacobian.shape() != (TASK_DOF, n) {
                return Err(SnapshotFault::DimensionMismatch);
            }
            if !jacobian.iter().all(|v| v.is_finite()) {
                return Err(SnapshotFault::NonFiniteJacobian);
            }
        }

        if self.requirements.pose {
            let pose = self.pose.as_ref().ok_or(SnapshotFault::MissingPose)?;
            let finite = pose.translation.vector.iter().all(|v| v.is_finite())
                && pose.rotation.coords.iter().all(|v| v.is_finite());
            if !finite {
                return Err(SnapshotFault::NonFinitePose);
            }
        }

        if !is_symmetric(&self.mass_matrix, SYMMETRY_TOLERANCE) {
            return Err(SnapshotFault::AsymmetricMassMatrix);
        }
        if !is_positive_definite(&self.mass_matrix, &mut self.scratch) {
            return Err(SnapshotFault::NotPositiveDefinite);
        }
        Ok(())
    }

    /// 正向动力学：求解 M·qdd = τ - C·qd - G
    ///
    /// 仅用于仿真，会分配内存。质量矩阵不正定或维度不符时返回 `None`。
    pub fn forward_acceleration(&self, effort: &JointVector) -> Option<DVector<f64>> {
        if effort.len() != self.dof() {
            return None;
        }
        let rhs: DVector<f64> = &**effort - &*self.coriolis - &*self.gravity;
        let cholesky = self.mass_matrix.clone().cholesky()?;
        Some(cholesky.solve(&rhs))
    }
}
