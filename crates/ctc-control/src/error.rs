//! 控制层错误类型
//!
//! - [`ConfigError`]：配置解析与校验（初始化期）
//! - [`InitError`]：Uninitialized → Ready 转换失败，控制器不会进入 Running
//! - [`ControlError`]：生命周期调用错误
//! - [`SetpointError`]：生产者线程写入设定值时的校验错误
//! - [`CycleFault`]：单个控制周期的运行期故障，不改变生命周期状态

use crate::lifecycle::LifecycleState;
use ctc_dynamics::{ModelError, SnapshotFault};
use ctc_types::JointSetError;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// 关节集合无效（空、重名、空名）
    #[error("Invalid joint list: {0}")]
    Joints(#[from] JointSetError),

    /// 增益为负或非有限值
    #[error("Invalid {field} for joint '{joint}': {value} (must be finite and >= 0)")]
    InvalidGain {
        joint: String,
        field: &'static str,
        value: f64,
    },

    /// 位置限位无效
    #[error("Invalid position limits for joint '{joint}': min {min}, max {max}")]
    InvalidLimits { joint: String, min: f64, max: f64 },

    /// 只给出了一侧限位
    #[error("Position limits for joint '{joint}' must specify both min_position and max_position")]
    IncompleteLimits { joint: String },

    /// 控制频率无效
    #[error("Invalid control_rate: {0} Hz (must be finite and > 0)")]
    InvalidRate(f64),

    /// 阻尼系数无效
    #[error("Invalid task_space.damping: {0} (must be finite and > 0)")]
    InvalidDamping(f64),

    /// 任务空间参数无效
    #[error("Invalid task_space.{field}: {value}")]
    InvalidTaskSpace { field: &'static str, value: f64 },
}

/// 初始化错误（致命，控制器停留在 Uninitialized）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    /// 已经初始化过
    #[error("Controller already initialized (state: {0})")]
    AlreadyInitialized(LifecycleState),

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// 配置中的关节在模型中不存在
    #[error("Joint '{name}' is not known to the dynamics model")]
    UnknownJoint { name: String },

    /// 模型的关节没有出现在配置中
    #[error("Model joint '{name}' has no configuration")]
    MissingJoint { name: String },

    /// 模型自身无效（例如关节名重复）
    #[error("Dynamics model error: {0}")]
    Model(#[from] ModelError),

    /// 模型不能提供该变体需要的量
    #[error("Dynamics model does not provide {0}")]
    ModelCapability(&'static str),
}

/// 生命周期调用错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    /// 当前状态下不允许该生命周期调用
    #[error("Cannot {operation} in state {state}")]
    InvalidTransition {
        operation: &'static str,
        state: LifecycleState,
    },

    /// 在 Running 之外调用 update
    #[error("Controller is not running (state: {0})")]
    NotRunning(LifecycleState),

    /// 关节状态维度与控制器不一致
    #[error("Joint state has {actual} joints, controller expects {expected}")]
    StateDimension { expected: usize, actual: usize },

    /// 激活时测量状态非有限
    #[error("Cannot activate from a non-finite joint state")]
    NonFiniteState,

    /// 激活时需要的模型求值失败（例如任务空间位姿）
    #[error("Activation failed: {0}")]
    Activation(CycleFault),
}

impl ControlError {
    /// 是否为生命周期顺序错误（调用方逻辑问题，而非数据问题）
    pub fn is_lifecycle_error(&self) -> bool {
        matches!(
            self,
            ControlError::InvalidTransition { .. } | ControlError::NotRunning(_)
        )
    }
}

/// 设定值写入错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetpointError {
    /// 未知关节名
    #[error("Unknown joint '{name}'")]
    UnknownJoint { name: String },

    /// 数组长度不符
    #[error("Setpoint has {actual} values, controller has {expected} joints")]
    LengthMismatch { expected: usize, actual: usize },

    /// 非有限值
    #[error("Non-finite setpoint for '{target}'")]
    NonFinite { target: String },
}

/// 单周期运行期故障
///
/// 出现故障的周期输出全零力矩，下一周期照常重试。
/// 所有变体都是 `Copy` 且无负载（除包装的 [`SnapshotFault`]），实时路径上不分配。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleFault {
    #[error("measured joint state contains non-finite values")]
    NonFiniteState,

    #[error("dynamics model evaluation failed")]
    ModelFailure,

    #[error("invalid dynamics snapshot: {0}")]
    Snapshot(SnapshotFault),

    #[error("resolved joint velocity is non-finite")]
    NonFiniteResolvedVelocity,

    #[error("computed effort is non-finite")]
    NonFiniteEffort,
}

impl CycleFault {
    /// 用于指标的数字编码，0 保留给"无故障"
    pub fn code(self) -> u8 {
        match self {
            CycleFault::NonFiniteState => 1,
            CycleFault::ModelFailure => 2,
            CycleFault::Snapshot(SnapshotFault::DimensionMismatch) => 10,
            CycleFault::Snapshot(SnapshotFault::NonFiniteMassMatrix) => 11,
            CycleFault::Snapshot(SnapshotFault::NonFiniteCoriolis) => 12,
            CycleFault::Snapshot(SnapshotFault::NonFiniteGravity) => 13,
            CycleFault::Snapshot(SnapshotFault::NonFiniteJacobian) => 14,
            CycleFault::Snapshot(SnapshotFault::NonFinitePose) => 15,
            CycleFault::Snapshot(SnapshotFault::MissingJacobian) => 16,
            CycleFault::Snapshot(SnapshotFault::MissingPose) => 17,
            CycleFault::Snapshot(SnapshotFault::AsymmetricMassMatrix) => 18,
            CycleFault::Snapshot(SnapshotFault::NotPositiveDefinite) => 19,
            CycleFault::NonFiniteResolvedVelocity => 30,
            CycleFault::NonFiniteEffort => 31,
        }
    }

    /// 是否来自动力学模型（求值失败或快照无效）
    pub fn is_model_fault(self) -> bool {
        matches!(self, CycleFault::ModelFailure | CycleFault::Snapshot(_))
    }
}

impl From<SnapshotFault> for CycleFault {
    fn from(fault: SnapshotFault) -> Self {
        CycleFault::Snapshot(fault)
    }
}
