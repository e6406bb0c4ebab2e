//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use ctc_sdk::prelude::*;
//! ```

// 控制器（推荐使用）
pub use ctc_control::{
    Controller, ControllerConfig, JointPositionController, JointVelocityController,
    LifecycleState, SetpointWriter, TaskPoseController, TaskVelocityController,
};

// 宿主循环
pub use ctc_control::{ControlLoop, Hardware, LoopConfig, Pacing, SimulatedArm};

// 动力学
pub use ctc_dynamics::{
    ChainDescription, DynamicsModel, DynamicsSnapshot, PlanarChain, Requirements,
};

// 数据类型
pub use ctc_types::{
    ControlGains, EffortCommand, JointSet, JointState, JointVector, Pose, TaskAxis, Twist,
};

// 错误类型
pub use ctc_control::{ConfigError, ControlError, CycleFault, InitError, SetpointError};
pub use ctc_dynamics::ModelError;
