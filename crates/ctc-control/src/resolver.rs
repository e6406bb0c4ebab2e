//! 任务空间速度解析
//!
//! 阻尼最小二乘伪逆：qd_des = Jᵀ·(J·Jᵀ + λ²·I)⁻¹·v
//!
//! 对 J 的每个奇异值 σ，伪逆的增益为 σ / (σ² + λ²) ≤ 1 / (2λ)，
//! 因此无论 J 多接近奇异，‖qd_des‖ ≤ ‖v‖ / (2λ)。

use crate::error::CycleFault;
use ctc_types::nalgebra::{Matrix6, Matrix6xX, Vector6};
use ctc_types::{JointVector, Pose, TASK_DOF, Twist};

/// 阻尼伪逆解析器
///
/// 6×6 的 J·Jᵀ 在栈上构造并做 Cholesky 分解，不分配堆内存。
#[derive(Debug, Clone)]
pub struct DampedResolver {
    damping: f64,
    gram: Matrix6<f64>,
}

impl DampedResolver {
    /// `damping` 必须为正（由配置校验保证）
    pub fn new(damping: f64) -> Self {
        Self {
            damping,
            gram: Matrix6::zeros(),
        }
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// 任意 Jacobian 下输出速度范数的上界
    pub fn velocity_bound(&self, twist: &Twist) -> f64 {
        twist.to_vector().norm() / (2.0 * self.damping)
    }

    /// 把任务空间速度映射为关节速度，写入 `joint_velocity`
    pub fn resolve(
        &mut self,
        jacobian: &Matrix6xX<f64>,
        twist: &Twist,
        joint_velocity: &mut JointVector,
    ) -> Result<(), CycleFault> {
        let lambda_sq = self.damping * self.damping;
        for r in 0..TASK_DOF {
            for c in r..TASK_DOF {
                let value = jacobian.row(r).dot(&jacobian.row(c));
                self.gram[(r, c)] = value;
                self.gram[(c, r)] = value;
            }
            self.gram[(r, r)] += lambda_sq;
        }

        let v: Vector6<f64> = twist.to_vector();
        let y = self
            .gram
            .cholesky()
            .ok_or(CycleFault::NonFiniteResolvedVelocity)?
            .solve(&v);

        joint_velocity.gemv_tr(1.0, jacobian, &y, 0.0);
        if !joint_velocity.is_finite() {
            return Err(CycleFault::NonFiniteResolvedVelocity);
        }
        Ok(())
    }
}

/// 位姿误差（世界坐标系）
///
/// 线性部分为位置差；角度部分为把 `current` 转到 `desired` 的旋转向量。
pub fn pose_error(current: &Pose, desired: &Pose) -> Twist {
    let linear = desired.translation.vector - current.translation.vector;
    let angular = (desired.rotation * current.rotation.inverse()).scaled_axis();
    Twist::new(linear, angular)
}
