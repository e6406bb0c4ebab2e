//! 控制循环
//!
//! 宿主运行时的最小实现：读取状态 → `update` → 下发力矩，按控制频率定时。
//! 无论循环因何结束（达到次数、外部停止、硬件错误），都会调用 `deactivate`
//! 并把最后一条零力矩命令写给硬件。
//!
//! ```rust,ignore
//! let control_loop = ControlLoop::new(LoopConfig::from_controller_config(&config));
//! let stop = control_loop.stop_handle();
//! ctrlc::set_handler(move || stop.store(true, Ordering::Release))?;
//! let report = control_loop.run(&mut controller, &mut hardware)?;
//! ```

use crate::config::ControllerConfig;
use crate::controller::Controller;
use crate::error::ControlError;
use ctc_types::{EffortCommand, JointState};
use spin_sleep::SpinSleeper;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};

/// 硬件端口
///
/// 实时线程每周期调用一次 `read_state` 和一次 `write_effort`。
pub trait Hardware {
    type Error: std::error::Error + Send + Sync + 'static;

    /// 把测量状态写入 `state`（按控制器关节顺序）
    fn read_state(&mut self, state: &mut JointState) -> Result<(), Self::Error>;

    /// 下发力矩命令
    fn write_effort(&mut self, effort: &EffortCommand) -> Result<(), Self::Error>;
}

/// 定时方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// 用 `spin_sleep` 对齐到周期边界，dt 为实测值
    #[default]
    SpinSleep,

    /// 不睡眠，dt 固定为标称周期（仿真和测试）
    Simulated,
}

/// 控制循环配置
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// 控制频率（Hz）
    pub frequency_hz: f64,

    /// dt 钳位倍数
    ///
    /// 实测 dt 超过标称周期的此倍数时记为一次时间跳变，并钳位 dt。
    pub dt_clamp_multiplier: f64,

    /// 最大迭代次数（None 表示直到外部停止）
    pub max_iterations: Option<usize>,

    pub pacing: Pacing,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            frequency_hz: 1000.0,
            dt_clamp_multiplier: 2.0,
            max_iterations: None,
            pacing: Pacing::SpinSleep,
        }
    }
}

impl LoopConfig {
    /// 使用控制器配置中的控制频率
    pub fn from_controller_config(config: &ControllerConfig) -> Self {
        Self {
            frequency_hz: config.control_rate,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(self.frequency_hz.is_finite() && self.frequency_hz > 0.0) {
            return Err(format!(
                "Invalid frequency_hz: {} (must be > 0)",
                self.frequency_hz
            ));
        }
        if !(self.dt_clamp_multiplier.is_finite() && self.dt_clamp_multiplier >= 1.0) {
            return Err(format!(
                "Invalid dt_clamp_multiplier: {} (must be >= 1)",
                self.dt_clamp_multiplier
            ));
        }
        if self.frequency_hz > 10_000.0 {
            warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                self.frequency_hz
            );
        }
        Ok(())
    }
}

/// 控制循环错误
#[derive(Error, Debug)]
pub enum LoopError<E: std::error::Error + 'static> {
    #[error("Invalid loop configuration: {0}")]
    Config(String),

    /// 控制器尚未初始化，无法确定关节数
    #[error("Controller is not initialized")]
    NotInitialized,

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Hardware error: {0}")]
    Hardware(#[source] E),
}

/// 一次运行的统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopReport {
    /// 执行的 update 次数
    pub iterations: u64,
    /// 实测 dt 被钳位的次数
    pub time_jumps: u64,
    /// 是否由停止标志结束
    pub stopped: bool,
    pub elapsed: Duration,
}

/// 控制循环
#[derive(Debug)]
pub struct ControlLoop {
    config: LoopConfig,
    stop: Arc<AtomicBool>,
}

impl ControlLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// 停止标志；置位后循环在下一个周期开始前结束
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    /// 激活控制器、运行循环、停用控制器
    pub fn run<C, H>(
        &self,
        controller: &mut C,
        hardware: &mut H,
    ) -> Result<LoopReport, LoopError<H::Error>>
    where
        C: Controller,
        H: Hardware,
    {
        self.config.validate().map_err(LoopError::Config)?;
        let n = controller.joints().ok_or(LoopError::NotInitialized)?.len();

        let mut state = JointState::zeros(n);
        hardware
            .read_state(&mut state)
            .map_err(LoopError::Hardware)?;
        controller.activate(&state)?;

        let result = self.run_cycles(controller, hardware, &mut state);

        // 无论循环如何结束，最后一条命令都是零力矩
        let finish = match controller.deactivate() {
            Ok(zero) => hardware.write_effort(zero).map_err(LoopError::Hardware),
            Err(err) => Err(LoopError::Control(err)),
        };

        let report = result?;
        finish?;
        info!(
            iterations = report.iterations,
            time_jumps = report.time_jumps,
            stopped = report.stopped,
            "control loop finished"
        );
        Ok(report)
    }

    fn run_cycles<C, H>(
        &self,
        controller: &mut C,
        hardware: &mut H,
        state: &mut JointState,
    ) -> Result<LoopReport, LoopError<H::Error>>
    where
        C: Controller,
        H: Hardware,
    {
        let nominal_period = Duration::from_secs_f64(1.0 / self.config.frequency_hz);
        let max_dt = nominal_period.mul_f64(self.config.dt_clamp_multiplier);
        let sleeper = SpinSleeper::default();

        let start = Instant::now();
        let mut last_time = start;
        let mut deadline = start + nominal_period;
        let mut report = LoopReport::default();

        loop {
            if self.stop.load(Ordering::Acquire) {
                report.stopped = true;
                break;
            }
            if let Some(max_iter) = self.config.max_iterations
                && report.iterations >= max_iter as u64
            {
                break;
            }

            let dt = match self.config.pacing {
                Pacing::Simulated => nominal_period,
                Pacing::SpinSleep => {
                    let now = Instant::now();
                    let real_dt = if report.iterations == 0 {
                        nominal_period
                    } else {
                        now - last_time
                    };
                    last_time = now;
                    if real_dt > max_dt {
                        report.time_jumps += 1;
                        warn!(?real_dt, ?max_dt, "control period overrun, clamping dt");
                        max_dt
                    } else {
                        real_dt
                    }
                },
            };

            hardware.read_state(state).map_err(LoopError::Hardware)?;
            let effort = controller.update(state, dt)?;
            hardware.write_effort(effort).map_err(LoopError::Hardware)?;
            report.iterations += 1;

            if self.config.pacing == Pacing::SpinSleep {
                let now = Instant::now();
                if deadline > now {
                    sleeper.sleep(deadline - now);
                    deadline += nominal_period;
                } else {
                    // 已经错过截止时间，从当前时刻重新对齐
                    deadline = now + nominal_period;
                }
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }
}
