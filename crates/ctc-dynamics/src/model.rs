//! 动力学模型端口

use crate::error::ModelError;
use crate::snapshot::{DynamicsSnapshot, Requirements};
use ctc_types::JointState;

/// 动力学模型
///
/// 控制器在实时线程上每个周期调用一次 [`evaluate`](Self::evaluate)。
/// 实现必须把结果写进传入的预分配快照，不得在调用中分配内存或阻塞。
/// 输出只取决于输入状态；`&mut self` 仅用于复用模型内部的工作区。
pub trait DynamicsModel: Send {
    /// 模型的关节名，顺序即模型的自由度顺序
    fn joint_names(&self) -> &[String];

    /// 自由度
    fn dof(&self) -> usize {
        self.joint_names().len()
    }

    /// 模型能提供的可选量（Jacobian / 末端位姿）
    fn capabilities(&self) -> Requirements {
        Requirements::JOINT_SPACE
    }

    /// 在给定状态下求值，覆盖 `snapshot` 的内容
    ///
    /// 只需要填充 `snapshot.requirements()` 要求的量。
    fn evaluate(
        &mut self,
        state: &JointState,
        snapshot: &mut DynamicsSnapshot,
    ) -> Result<(), ModelError>;
}

impl<M: DynamicsModel + ?Sized> DynamicsModel for Box<M> {
    fn joint_names(&self) -> &[String] {
        (**self).joint_names()
    }

    fn dof(&self) -> usize {
        (**self).dof()
    }

    fn capabilities(&self) -> Requirements {
        (**self).capabilities()
    }

    fn evaluate(
        &mut self,
        state: &JointState,
        snapshot: &mut DynamicsSnapshot,
    ) -> Result<(), ModelError> {
        (**self).evaluate(state, snapshot)
    }
}
