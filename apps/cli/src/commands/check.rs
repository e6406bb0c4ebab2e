//! 配置校验命令
//!
//! 解析并校验配置，再用参考模型走一遍 init，确认关节名和模型能力都匹配。

use crate::scenario::{Mode, Scenario};
use anyhow::Result;
use clap::Args;
use ctc_sdk::prelude::*;
use std::path::PathBuf;

/// 校验命令参数
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// 控制器配置文件（TOML）
    pub config: PathBuf,

    /// 连杆模型文件（TOML），默认按配置生成
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// 用哪个控制器变体做 init 检查
    #[arg(long, value_enum, default_value_t = Mode::JointPosition)]
    pub mode: Mode,
}

impl CheckCommand {
    pub fn execute(&self) -> Result<()> {
        let scenario = Scenario::load(&self.config, self.model.as_deref())?;
        let config = &scenario.config;

        println!("控制频率: {} Hz", config.control_rate);
        for joint in &config.joints {
            let limits = match (joint.min_position, joint.max_position) {
                (Some(min), Some(max)) => format!("[{min:.3}, {max:.3}] rad"),
                _ => "无".to_string(),
            };
            println!(
                "  {:<16} kp = {:<8} kd = {:<8} 限位: {}",
                joint.name, joint.kp, joint.kd, limits
            );
        }
        println!(
            "任务空间: damping = {}, linear kp = {}, angular kp = {}",
            config.task_space.damping,
            config.task_space.linear.kp,
            config.task_space.angular.kp
        );

        let model = Box::new(scenario.model.clone());
        match self.mode {
            Mode::JointPosition => JointPositionController::new().init(config, model)?,
            Mode::JointVelocity => JointVelocityController::new().init(config, model)?,
            Mode::TaskVelocity => TaskVelocityController::new().init(config, model)?,
            Mode::TaskPose => TaskPoseController::new().init(config, model)?,
        }

        println!("✅ 配置有效（{} 个关节，{} 变体）", scenario.dof(), self.mode);
        Ok(())
    }
}
