//! 计算力矩控制的基础数据类型
//!
//! 本 crate 只包含无状态的数据结构，不依赖任何线程或硬件：
//! - [`JointSet`]：受控关节集合（有序、无重复，生命周期内固定）
//! - [`JointVector`]：按 `JointSet` 顺序排列的关节标量向量
//! - [`JointState`] / [`EffortCommand`]：每个周期的输入与输出
//! - [`Twist`] / [`Pose`]：任务空间设定值
//! - [`ControlGains`]：每关节 Kp / Kd 增益
//!
//! 所有向量都在初始化时按关节数分配，之后的周期内只做原地拷贝。

mod gains;
mod joint;
mod state;
mod task;
mod vector;

pub use gains::ControlGains;
pub use joint::{JointSet, JointSetError};
pub use state::{EffortCommand, JointState};
pub use task::{Pose, TASK_DOF, TaskAxis, Twist};
pub use vector::JointVector;

// 重新导出 nalgebra，保证下游 crate 使用同一版本
pub use nalgebra;
