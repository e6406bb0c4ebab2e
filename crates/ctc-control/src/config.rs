//! 控制器配置（TOML）
//!
//! 初始化时加载一次，之后只读。
//!
//! ```toml
//! control_rate = 1000.0
//!
//! [[joints]]
//! name = "shoulder"
//! kp = 100.0
//! kd = 20.0
//! min_position = -3.0
//! max_position = 3.0
//!
//! [task_space]
//! damping = 0.05
//! [task_space.linear]
//! kp = 4.0
//! max_velocity = 0.5
//! ```

use crate::error::{ConfigError, InitError};
use crate::saturation::{PositionLimits, TwistLimits};
use ctc_types::{ControlGains, JointSet, JointVector, Twist};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 阻尼最小二乘的默认阻尼系数 λ（λ² = 0.0025）
pub const DEFAULT_DAMPING: f64 = 0.05;

/// 控制器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// 控制频率（Hz）
    pub control_rate: f64,

    /// 受控关节
    pub joints: Vec<JointConfig>,

    /// 任务空间参数（仅任务空间变体使用）
    #[serde(default)]
    pub task_space: TaskSpaceConfig,
}

/// 单关节配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointConfig {
    pub name: String,
    pub kp: f64,
    pub kd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_position: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position: Option<f64>,
}

/// 任务空间配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskSpaceConfig {
    /// 阻尼系数 λ
    #[serde(default = "default_damping")]
    pub damping: f64,

    #[serde(default)]
    pub linear: AxisGroupConfig,

    #[serde(default)]
    pub angular: AxisGroupConfig,
}

fn default_damping() -> f64 {
    DEFAULT_DAMPING
}

impl Default for TaskSpaceConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            linear: AxisGroupConfig::default(),
            angular: AxisGroupConfig::default(),
        }
    }
}

/// 线速度或角速度三个轴共用的参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AxisGroupConfig {
    /// 位姿误差增益（位姿变体）
    #[serde(default)]
    pub kp: f64,

    /// 各轴速度限幅
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_velocity: Option<f64>,
}

/// 按模型关节顺序解析后的配置
#[derive(Debug, Clone)]
pub struct ResolvedJoints {
    pub joints: JointSet,
    pub gains: ControlGains,
    pub limits: PositionLimits,
}

impl ControllerConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: ControllerConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载并校验
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 校验所有字段
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.control_rate.is_finite() && self.control_rate > 0.0) {
            return Err(ConfigError::InvalidRate(self.control_rate));
        }

        JointSet::new(self.joints.iter().map(|j| j.name.as_str()))?;

        for joint in &self.joints {
            for (field, value) in [("kp", joint.kp), ("kd", joint.kd)] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(ConfigError::InvalidGain {
                        joint: joint.name.clone(),
                        field,
                        value,
                    });
                }
            }
            match (joint.min_position, joint.max_position) {
                (None, None) => {},
                (Some(min), Some(max)) => {
                    if !(min.is_finite() && max.is_finite() && min < max) {
                        return Err(ConfigError::InvalidLimits {
                            joint: joint.name.clone(),
                            min,
                            max,
                        });
                    }
                },
                _ => {
                    return Err(ConfigError::IncompleteLimits {
                        joint: joint.name.clone(),
                    });
                },
            }
        }

        let task = &self.task_space;
        if !(task.damping.is_finite() && task.damping > 0.0) {
            return Err(ConfigError::InvalidDamping(task.damping));
        }
        let groups = [
            ("linear.kp", "linear.max_velocity", &task.linear),
            ("angular.kp", "angular.max_velocity", &task.angular),
        ];
        for (kp_field, limit_field, group) in groups {
            if !(group.kp.is_finite() && group.kp >= 0.0) {
                return Err(ConfigError::InvalidTaskSpace {
                    field: kp_field,
                    value: group.kp,
                });
            }
            if let Some(limit) = group.max_velocity
                && !(limit.is_finite() && limit > 0.0)
            {
                return Err(ConfigError::InvalidTaskSpace {
                    field: limit_field,
                    value: limit,
                });
            }
        }
        Ok(())
    }

    /// 控制周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.control_rate)
    }

    /// 按名称查找关节配置
    pub fn joint(&self, name: &str) -> Option<&JointConfig> {
        self.joints.iter().find(|j| j.name == name)
    }

    /// 把配置解析为模型关节顺序
    ///
    /// 配置中多出的关节和模型中缺失配置的关节都是初始化错误。
    pub fn resolve(&self, model_joints: &[String]) -> Result<ResolvedJoints, InitError> {
        self.validate()?;
        let joints = JointSet::new(model_joints.iter().map(String::as_str))
            .map_err(|e| InitError::Config(ConfigError::Joints(e)))?;

        if let Some(unknown) = self.joints.iter().find(|j| !joints.contains(&j.name)) {
            return Err(InitError::UnknownJoint {
                name: unknown.name.clone(),
            });
        }

        let n = joints.len();
        let mut kp = JointVector::zeros(n);
        let mut kd = JointVector::zeros(n);
        let mut limits = Vec::with_capacity(n);
        for (i, name) in joints.names().enumerate() {
            let joint = self.joint(name).ok_or_else(|| InitError::MissingJoint {
                name: name.to_string(),
            })?;
            kp[i] = joint.kp;
            kd[i] = joint.kd;
            limits.push(joint.min_position.zip(joint.max_position));
        }

        let gains = ControlGains::new(kp, kd).map_err(ConfigError::Joints)?;
        Ok(ResolvedJoints {
            joints,
            gains,
            limits: PositionLimits::new(limits),
        })
    }

    /// 位姿误差增益（线性三轴 + 角度三轴）
    pub fn task_gains(&self) -> Twist {
        let linear = self.task_space.linear.kp;
        let angular = self.task_space.angular.kp;
        Twist::new(
            nalgebra::Vector3::repeat(linear),
            nalgebra::Vector3::repeat(angular),
        )
    }

    /// 任务空间速度限幅
    pub fn twist_limits(&self) -> TwistLimits {
        TwistLimits::new(
            self.task_space.linear.max_velocity,
            self.task_space.angular.max_velocity,
        )
    }
}
