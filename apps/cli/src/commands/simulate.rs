//! 闭环仿真命令
//!
//! 控制器、仿真机械臂和控制循环跑在主线程；一个生产者线程按固定频率
//! 通过设定值通道发布目标，模拟上游的非实时发布者。Ctrl-C 会停止循环，
//! 控制器仍然正常停用并发出最后一条零力矩命令。

use crate::scenario::{Mode, Scenario, parse_values};
use anyhow::{Context, Result, anyhow};
use clap::Args;
use ctc_sdk::control::{ComputedTorqueController, SetpointMode};
use ctc_sdk::prelude::*;
use ctc_sdk::types::nalgebra as na;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::info;

/// 未指定 --initial 时每个关节的初始角度（rad）
const DEFAULT_INITIAL_POSITION: f64 = 0.3;

/// 仿真命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 控制器配置文件（TOML）
    #[arg(short, long)]
    pub config: PathBuf,

    /// 连杆模型文件（TOML），默认按配置生成
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// 控制器变体
    #[arg(long, value_enum, default_value_t = Mode::JointPosition)]
    pub mode: Mode,

    /// 控制周期数
    #[arg(long, default_value_t = 2000)]
    pub cycles: usize,

    /// 初始关节位置（弧度），逗号分隔
    #[arg(long)]
    pub initial: Option<String>,

    /// 目标，逗号分隔：
    /// joint-position 为各关节位置，joint-velocity 为各关节速度，
    /// task-velocity 为 vx,vy,vz,wx,wy,wz，task-pose 为 x,y,yaw
    #[arg(long)]
    pub target: Option<String>,

    /// 设定值发布频率（Hz）
    #[arg(long, default_value_t = 100.0)]
    pub publish_rate: f64,

    /// 关节粘滞摩擦系数（仿真模型与控制器模型之间的失配）
    #[arg(long, default_value_t = 0.0)]
    pub friction: f64,

    /// 不按实时节拍运行（设定值到达的周期取决于线程调度）
    #[arg(long)]
    pub fast: bool,
}

impl SimulateCommand {
    pub fn execute(&self) -> Result<()> {
        if !(self.publish_rate.is_finite() && self.publish_rate > 0.0) {
            anyhow::bail!("--publish-rate 必须为正数，实际 {}", self.publish_rate);
        }

        let scenario = Scenario::load(&self.config, self.model.as_deref())?;
        let n = scenario.dof();
        let positions = match &self.initial {
            Some(text) => parse_values(text, n, "--initial")?,
            None => vec![DEFAULT_INITIAL_POSITION; n],
        };
        let initial = JointState::new(positions, vec![0.0; n])?;
        let start_pose = scenario.model.pose(initial.positions.as_slice());

        println!(
            "仿真: {} 变体，{} 个关节，{} 个周期 @ {} Hz",
            self.mode, n, self.cycles, scenario.config.control_rate
        );

        match self.mode {
            Mode::JointPosition => {
                let target = match &self.target {
                    Some(text) => parse_values(text, n, "--target")?,
                    None => initial.positions.iter().map(|q| q + 0.2).collect(),
                };
                let published = target.clone();
                let arm = self.run(&scenario, &initial, JointPositionController::new(), move |w| {
                    w.write_all(&published)
                })?;
                let error = max_abs_error(arm.state().positions.as_slice(), &target);
                println!("最终关节位置误差: {error:.6} rad");
            },
            Mode::JointVelocity => {
                let target = match &self.target {
                    Some(text) => parse_values(text, n, "--target")?,
                    None => vec![0.1; n],
                };
                let published = target.clone();
                let arm = self.run(&scenario, &initial, JointVelocityController::new(), move |w| {
                    w.write_all(&published)
                })?;
                let error = max_abs_error(arm.state().velocities.as_slice(), &target);
                println!("最终关节速度误差: {error:.6} rad/s");
            },
            Mode::TaskVelocity => {
                let values = match &self.target {
                    Some(text) => parse_values(text, 6, "--target")?,
                    None => vec![0.05, 0.0, 0.0, 0.0, 0.0, 0.0],
                };
                let twist = Twist::new(
                    na::Vector3::new(values[0], values[1], values[2]),
                    na::Vector3::new(values[3], values[4], values[5]),
                );
                let arm = self.run(&scenario, &initial, TaskVelocityController::new(), move |w| {
                    w.write_twist(twist)
                })?;

                let mut model = scenario.model.clone();
                let mut snapshot = DynamicsSnapshot::new(n, Requirements::TASK_VELOCITY);
                model.evaluate(arm.state(), &mut snapshot)?;
                let jacobian = snapshot
                    .jacobian
                    .as_ref()
                    .ok_or_else(|| anyhow!("模型没有提供 Jacobian"))?;
                let achieved = jacobian * &*arm.state().velocities;
                let error = (&achieved - twist.to_vector()).norm();
                println!("末端速度: {}", format_vector(achieved.as_slice()));
                println!("末端速度误差: {error:.6}");
            },
            Mode::TaskPose => {
                let target = match &self.target {
                    Some(text) => {
                        let values = parse_values(text, 3, "--target")?;
                        Pose::new(
                            na::Vector3::new(values[0], values[1], 0.0),
                            na::Vector3::z() * values[2],
                        )
                    },
                    None => Pose::from_parts(
                        (start_pose.translation.vector + na::Vector3::new(-0.05, 0.05, 0.0))
                            .into(),
                        start_pose.rotation,
                    ),
                };
                let arm = self.run(&scenario, &initial, TaskPoseController::new(), move |w| {
                    w.write_pose(target)
                })?;

                let reached = scenario.model.pose(arm.state().positions.as_slice());
                let offset = reached.translation.vector - target.translation.vector;
                println!(
                    "末端位置误差: {:.6} m，姿态误差: {:.6} rad",
                    offset.norm(),
                    reached.rotation.angle_to(&target.rotation)
                );
            },
        }
        Ok(())
    }

    /// 初始化控制器、启动生产者线程、运行控制循环，返回仿真机械臂
    fn run<M, F>(
        &self,
        scenario: &Scenario,
        initial: &JointState,
        mut controller: ComputedTorqueController<M>,
        publish: F,
    ) -> Result<SimulatedArm<PlanarChain>>
    where
        M: SetpointMode,
        F: Fn(&SetpointWriter<M::Setpoint>) -> Result<(), SetpointError> + Send + 'static,
    {
        let period = Duration::from_secs_f64(1.0 / scenario.config.control_rate);
        let mut arm = SimulatedArm::new(scenario.model.clone(), initial.clone(), period)?
            .with_viscous_friction(self.friction);

        controller.init(&scenario.config, Box::new(scenario.model.clone()))?;
        let writer = controller
            .setpoint_writer()
            .context("控制器初始化后没有设定值通道")?;

        let control_loop = ControlLoop::new(LoopConfig {
            max_iterations: Some(self.cycles),
            pacing: if self.fast {
                Pacing::Simulated
            } else {
                Pacing::SpinSleep
            },
            ..LoopConfig::from_controller_config(&scenario.config)
        });

        let producer_stop = Arc::new(AtomicBool::new(false));
        {
            let loop_stop = control_loop.stop_handle();
            let producer_stop = producer_stop.clone();
            ctrlc::set_handler(move || {
                loop_stop.store(true, Ordering::Release);
                producer_stop.store(true, Ordering::Release);
            })
            .context("安装 Ctrl-C 处理器失败")?;
        }

        // 激活会用测量状态覆盖通道，所以生产者等到 Running 之后才发布
        let lifecycle = controller.lifecycle().clone();
        let publish_period = Duration::from_secs_f64(1.0 / self.publish_rate);
        let producer = {
            let producer_stop = producer_stop.clone();
            thread::Builder::new()
                .name("ctc-setpoint".to_string())
                .spawn(move || -> Result<u64, SetpointError> {
                    let mut published = 0;
                    while !producer_stop.load(Ordering::Acquire) {
                        if lifecycle.get(Ordering::Acquire).is_running() {
                            publish(&writer)?;
                            published += 1;
                            thread::sleep(publish_period);
                        } else {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                    Ok(published)
                })
                .context("启动设定值线程失败")?
        };

        let result = control_loop.run(&mut controller, &mut arm);
        producer_stop.store(true, Ordering::Release);
        let published = producer
            .join()
            .map_err(|_| anyhow!("设定值线程异常退出"))??;
        let report = result?;
        info!(published, "setpoint producer stopped");

        let metrics = controller.metrics().snapshot();
        println!(
            "迭代: {}，时间跳变: {}，中断: {}，耗时: {:?}",
            report.iterations, report.time_jumps, report.stopped, report.elapsed
        );
        println!(
            "故障周期: {} ({:.2}%)，限幅周期: {}，发布设定值: {}",
            metrics.faulted_cycles,
            metrics.fault_rate(),
            metrics.saturated_cycles,
            published
        );
        if let Some(channel) = controller.channel_metrics() {
            let channel = channel.snapshot();
            println!(
                "设定值通道: 写入 {}，新值读取 {}，重复读取 {}",
                channel.writes, channel.fresh_reads, channel.stale_reads
            );
        }
        println!(
            "最后一条命令: {}",
            if arm.last_effort().is_zero() {
                "零力矩"
            } else {
                "非零力矩"
            }
        );
        println!("最终关节位置: {}", format_vector(arm.state().positions.as_slice()));
        Ok(arm)
    }
}

fn max_abs_error(actual: &[f64], target: &[f64]) -> f64 {
    actual
        .iter()
        .zip(target)
        .map(|(a, t)| (a - t).abs())
        .fold(0.0, f64::max)
}

fn format_vector(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_abs_error() {
        assert_eq!(max_abs_error(&[1.0, 2.0, 3.0], &[1.5, 2.0, 2.0]), 1.0);
        assert_eq!(max_abs_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_format_vector() {
        assert_eq!(format_vector(&[0.1, -2.0]), "[0.1000, -2.0000]");
    }
}
