//! CTC SDK - 计算力矩控制器
//!
//! 各层 crate 的统一入口，从底层到高层：
//!
//! - **类型层** (`types`): 关节集合、关节向量、状态、力矩命令、任务空间类型
//! - **实时层** (`realtime`): 非实时线程到控制线程的无锁三槽缓冲区
//! - **动力学层** (`dynamics`): 动力学模型接口、快照校验、平面连杆参考模型
//! - **控制层** (`control`): 配置、控制律、阻尼伪逆、生命周期、控制循环
//!
//! # 快速开始
//!
//! ```rust
//! use ctc_sdk::prelude::*;
//!
//! let config = ControllerConfig::from_toml_str(
//!     r#"
//!     control_rate = 500.0
//!     [[joints]]
//!     name = "joint_1"
//!     kp = 50.0
//!     kd = 10.0
//!     "#,
//! )
//! .unwrap();
//! let model = PlanarChain::uniform(1, 0.5, 1.0).unwrap();
//! let mut controller = JointVelocityController::new();
//! controller.init(&config, Box::new(model)).unwrap();
//! assert_eq!(controller.state(), LifecycleState::Ready);
//! ```

mod logging;
pub mod prelude;

pub use ctc_control as control;
pub use ctc_dynamics as dynamics;
pub use ctc_realtime as realtime;
pub use ctc_types as types;

pub use logging::{LoggerError, init_logger, init_logger_with_filter};

// 控制层常用类型
pub use ctc_control::{
    ControlError, ControlLoop, Controller, ControllerConfig, CycleFault, Hardware, InitError,
    JointPositionController, JointVelocityController, LifecycleState, LoopConfig,
    SetpointWriter, SimulatedArm, TaskPoseController, TaskVelocityController,
};

// 动力学层
pub use ctc_dynamics::{DynamicsModel, DynamicsSnapshot, ModelError, PlanarChain};

// 类型层
pub use ctc_types::{EffortCommand, JointSet, JointState, JointVector, Pose, Twist};
