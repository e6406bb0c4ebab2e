//! 配置与模型加载

use anyhow::{Context, Result};
use clap::ValueEnum;
use ctc_sdk::prelude::*;
use std::fmt;
use std::path::Path;

/// 未指定模型文件时每个连杆的长度（m）和质量（kg）
const DEFAULT_LINK_LENGTH: f64 = 0.3;
const DEFAULT_LINK_MASS: f64 = 1.0;

/// 控制器变体
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    JointPosition,
    JointVelocity,
    TaskVelocity,
    TaskPose,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::JointPosition => "joint-position",
            Mode::JointVelocity => "joint-velocity",
            Mode::TaskVelocity => "task-velocity",
            Mode::TaskPose => "task-pose",
        };
        f.write_str(name)
    }
}

/// 控制器配置 + 参考模型
pub struct Scenario {
    pub config: ControllerConfig,
    pub model: PlanarChain,
}

impl Scenario {
    /// 加载配置；没有模型文件时按配置的关节名生成一条均匀连杆
    pub fn load(config_path: &Path, model_path: Option<&Path>) -> Result<Self> {
        let config = ControllerConfig::load(config_path)
            .with_context(|| format!("加载控制器配置失败: {}", config_path.display()))?;

        let model = match model_path {
            Some(path) => {
                let description = ChainDescription::load(path)
                    .with_context(|| format!("加载连杆模型失败: {}", path.display()))?;
                PlanarChain::from_description(description)?
            },
            None => config
                .joints
                .iter()
                .fold(PlanarChain::builder(), |builder, joint| {
                    builder.link(joint.name.as_str(), DEFAULT_LINK_LENGTH, DEFAULT_LINK_MASS)
                })
                .build()?,
        };
        Ok(Self { config, model })
    }

    pub fn dof(&self) -> usize {
        self.model.joint_names().len()
    }
}

/// 解析逗号分隔的数值
pub fn parse_values(text: &str, expected: usize, what: &str) -> Result<Vec<f64>> {
    let values: Vec<f64> = text
        .split(',')
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("解析 {what} 失败: '{text}'"))?;

    if values.len() != expected {
        anyhow::bail!("{what} 需要 {expected} 个值，实际 {} 个", values.len());
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        anyhow::bail!("{what} 含有非有限值: {bad}");
    }
    Ok(values)
}
