//! 控制器运行指标
//!
//! 原子计数器，实时线程以 `Relaxed` 更新，任意线程读取快照，不引入锁。

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

/// 控制器实时指标
///
/// ```rust
/// use ctc_control::ControllerMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = ControllerMetrics::new();
/// metrics.cycles.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(metrics.snapshot().cycles, 1);
/// ```
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    /// 执行过的控制周期总数（含故障周期）
    pub cycles: AtomicU64,

    /// 输出零力矩回退命令的故障周期数
    pub faulted_cycles: AtomicU64,

    /// 当前连续故障周期数（恢复正常后归零）
    pub consecutive_faults: AtomicU64,

    /// 最近一次故障的编码（`CycleFault::code`），0 表示从未发生
    pub last_fault_code: AtomicU8,

    /// 激活次数
    pub activations: AtomicU64,

    /// 停用次数（每次都伴随一条零力矩命令）
    pub deactivations: AtomicU64,

    /// 被位置限位或任务空间速度限幅修改过的设定值周期数
    pub saturated_cycles: AtomicU64,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> ControllerMetricsSnapshot {
        ControllerMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            faulted_cycles: self.faulted_cycles.load(Ordering::Relaxed),
            consecutive_faults: self.consecutive_faults.load(Ordering::Relaxed),
            last_fault_code: self.last_fault_code.load(Ordering::Relaxed),
            activations: self.activations.load(Ordering::Relaxed),
            deactivations: self.deactivations.load(Ordering::Relaxed),
            saturated_cycles: self.saturated_cycles.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器（用于基准测试）
    pub fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.faulted_cycles.store(0, Ordering::Relaxed);
        self.consecutive_faults.store(0, Ordering::Relaxed);
        self.last_fault_code.store(0, Ordering::Relaxed);
        self.activations.store(0, Ordering::Relaxed);
        self.deactivations.store(0, Ordering::Relaxed);
        self.saturated_cycles.store(0, Ordering::Relaxed);
    }

    /// 记录一个正常周期，返回此前的连续故障数
    pub(crate) fn record_ok(&self) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.swap(0, Ordering::Relaxed)
    }

    /// 记录一个故障周期，返回此前的连续故障数
    pub(crate) fn record_fault(&self, code: u8) -> u64 {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.faulted_cycles.fetch_add(1, Ordering::Relaxed);
        self.last_fault_code.store(code, Ordering::Relaxed);
        self.consecutive_faults.fetch_add(1, Ordering::Relaxed)
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControllerMetricsSnapshot {
    pub cycles: u64,
    pub faulted_cycles: u64,
    pub consecutive_faults: u64,
    pub last_fault_code: u8,
    pub activations: u64,
    pub deactivations: u64,
    pub saturated_cycles: u64,
}

impl ControllerMetricsSnapshot {
    /// 故障周期占比（百分比）
    ///
    /// 没有执行过周期时返回 0.0。
    pub fn fault_rate(&self) -> f64 {
        if self.cycles == 0 {
            return 0.0;
        }
        (self.faulted_cycles as f64 / self.cycles as f64) * 100.0
    }
}
