//! 计算力矩控制器
//!
//! - [`ComputedTorqueLaw`]：τ = M·(Kp⊙e + Kd⊙ė) + C·qd + G
//! - [`DampedResolver`]：任务空间速度 → 关节速度（阻尼最小二乘伪逆）
//! - [`ComputedTorqueController`]：三态生命周期 + 四种设定值变体
//! - [`ControlLoop`]：宿主控制循环，保证以零力矩结束
//!
//! # 示例
//!
//! ```rust
//! use ctc_control::{Controller, ControllerConfig, JointPositionController};
//! use ctc_dynamics::PlanarChain;
//! use ctc_types::JointState;
//! use std::time::Duration;
//!
//! let config = ControllerConfig::from_toml_str(r#"
//!     control_rate = 1000.0
//!     [[joints]]
//!     name = "joint_1"
//!     kp = 100.0
//!     kd = 20.0
//! "#).unwrap();
//! let model = PlanarChain::uniform(1, 0.5, 1.0).unwrap();
//!
//! let mut controller = JointPositionController::new();
//! controller.init(&config, Box::new(model)).unwrap();
//! let writer = controller.setpoint_writer().unwrap();
//!
//! let state = JointState::zeros(1);
//! controller.activate(&state).unwrap();
//! writer.write_joint("joint_1", 0.5).unwrap();
//!
//! let effort = controller.update(&state, Duration::from_millis(1)).unwrap();
//! assert!(effort.efforts()[0] > 0.0);
//!
//! let last = controller.deactivate().unwrap();
//! assert!(last.is_zero());
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod law;
pub mod lifecycle;
pub mod loop_runner;
pub mod metrics;
pub mod resolver;
pub mod saturation;
pub mod setpoint;
pub mod sim;

pub use config::{
    AxisGroupConfig, ControllerConfig, DEFAULT_DAMPING, JointConfig, ResolvedJoints,
    TaskSpaceConfig,
};
pub use controller::{
    ComputedTorqueController, Controller, JointPositionController, JointPositionMode,
    JointVelocityController, JointVelocityMode, SetpointMode, TaskPoseController, TaskPoseMode,
    TaskVelocityController, TaskVelocityMode,
};
pub use error::{ConfigError, ControlError, CycleFault, InitError, SetpointError};
pub use law::{ComputedTorqueLaw, JointReference};
pub use lifecycle::{AtomicLifecycle, LifecycleState};
pub use loop_runner::{ControlLoop, Hardware, LoopConfig, LoopError, LoopReport, Pacing};
pub use metrics::{ControllerMetrics, ControllerMetricsSnapshot};
pub use resolver::{DampedResolver, pose_error};
pub use saturation::{PositionLimits, TwistLimits};
pub use setpoint::SetpointWriter;
pub use sim::{SimulatedArm, SimulationError};
