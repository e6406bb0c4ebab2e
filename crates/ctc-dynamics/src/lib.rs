//! 动力学模型端口
//!
//! 控制律通过 [`DynamicsModel`] 获取当前关节状态下的：
//! - 质量矩阵 M(q)
//! - 科氏力/离心力力矩 C(q, qd)·qd
//! - 重力力矩 G(q)
//! - （任务空间变体）6×n Jacobian 和末端位姿
//!
//! 模型本身是外部协作者；本 crate 只定义契约、预分配的 [`DynamicsSnapshot`]
//! 及其校验，外加一个用于测试和仿真的参考实现 [`PlanarChain`]。

mod error;
mod linalg;
mod model;
mod planar;
mod snapshot;

pub use error::ModelError;
pub use linalg::{is_positive_definite, is_symmetric};
pub use model::DynamicsModel;
pub use planar::{ChainDescription, LinkDescription, PlanarChain, PlanarChainBuilder};
pub use snapshot::{DynamicsSnapshot, Requirements, SnapshotFault};
