//! 任务空间（笛卡尔空间）类型
//!
//! 轴顺序固定为 linear x/y/z、angular x/y/z，Jacobian 的行与之一一对应。

use nalgebra::{Isometry3, Vector3, Vector6};
use std::fmt;

/// 任务空间自由度
pub const TASK_DOF: usize = 6;

/// 末端位姿（世界坐标系）
pub type Pose = Isometry3<f64>;

/// 任务空间轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TaskAxis {
    LinearX = 0,
    LinearY = 1,
    LinearZ = 2,
    AngularX = 3,
    AngularY = 4,
    AngularZ = 5,
}

impl TaskAxis {
    /// 所有轴（按 Jacobian 行顺序）
    pub const ALL: [TaskAxis; TASK_DOF] = [
        TaskAxis::LinearX,
        TaskAxis::LinearY,
        TaskAxis::LinearZ,
        TaskAxis::AngularX,
        TaskAxis::AngularY,
        TaskAxis::AngularZ,
    ];

    /// 轴索引（0-5）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 是否为平移轴
    #[inline]
    pub const fn is_linear(self) -> bool {
        (self as usize) < 3
    }

    /// 轴名称（与消息字段名一致）
    pub const fn name(self) -> &'static str {
        match self {
            TaskAxis::LinearX => "linear_x",
            TaskAxis::LinearY => "linear_y",
            TaskAxis::LinearZ => "linear_z",
            TaskAxis::AngularX => "angular_x",
            TaskAxis::AngularY => "angular_y",
            TaskAxis::AngularZ => "angular_z",
        }
    }

    /// 从名称解析
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|axis| axis.name() == name)
    }
}

impl fmt::Display for TaskAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 笛卡尔速度（旋量）
///
/// `Copy` 类型，实时缓冲区中的拷贝就是一次 memcpy。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Twist {
    /// 线速度（m/s）
    pub linear: Vector3<f64>,
    /// 角速度（rad/s）
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// 零速度
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// 从线速度和角速度创建
    #[inline]
    pub fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// 从 6 维向量创建（linear 在前）
    #[inline]
    pub fn from_vector(v: &Vector6<f64>) -> Self {
        Self {
            linear: v.fixed_rows::<3>(0).into_owned(),
            angular: v.fixed_rows::<3>(3).into_owned(),
        }
    }

    /// 转换为 6 维向量（linear 在前）
    #[inline]
    pub fn to_vector(&self) -> Vector6<f64> {
        let mut v = Vector6::zeros();
        v.fixed_rows_mut::<3>(0).copy_from(&self.linear);
        v.fixed_rows_mut::<3>(3).copy_from(&self.angular);
        v
    }

    /// 读取某个轴的分量
    #[inline]
    pub fn axis(&self, axis: TaskAxis) -> f64 {
        match axis {
            TaskAxis::LinearX => self.linear.x,
            TaskAxis::LinearY => self.linear.y,
            TaskAxis::LinearZ => self.linear.z,
            TaskAxis::AngularX => self.angular.x,
            TaskAxis::AngularY => self.angular.y,
            TaskAxis::AngularZ => self.angular.z,
        }
    }

    /// 设置某个轴的分量
    #[inline]
    pub fn set_axis(&mut self, axis: TaskAxis, value: f64) {
        match axis {
            TaskAxis::LinearX => self.linear.x = value,
            TaskAxis::LinearY => self.linear.y = value,
            TaskAxis::LinearZ => self.linear.z = value,
            TaskAxis::AngularX => self.angular.x = value,
            TaskAxis::AngularY => self.angular.y = value,
            TaskAxis::AngularZ => self.angular.z = value,
        }
    }

    /// 所有分量是否都是有限值
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().chain(self.angular.iter()).all(|v| v.is_finite())
    }
}
