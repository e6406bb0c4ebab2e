//! 通道指标
//!
//! 原子计数器，任意线程都可以读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 实时通道指标
///
/// # 使用示例
///
/// ```rust
/// use ctc_realtime::realtime_buffer;
///
/// let (writer, mut reader) = realtime_buffer(0u32);
/// writer.write(&7);
/// reader.read();
/// reader.read();
///
/// let snapshot = writer.metrics().snapshot();
/// assert_eq!(snapshot.writes, 1);
/// assert_eq!(snapshot.fresh_reads, 1);
/// assert_eq!(snapshot.stale_reads, 1);
/// ```
#[derive(Debug, Default)]
pub struct ChannelMetrics {
    /// 完成的写入次数
    pub writes: AtomicU64,

    /// 读到新值的次数
    pub fresh_reads: AtomicU64,

    /// 重复读取旧值的次数（两次读取之间没有写入）
    ///
    /// 这是正常现象：生产者频率低于控制频率时，控制周期会反复使用同一个设定值。
    pub stale_reads: AtomicU64,
}

impl ChannelMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> ChannelMetricsSnapshot {
        ChannelMetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            fresh_reads: self.fresh_reads.load(Ordering::Relaxed),
            stale_reads: self.stale_reads.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.writes.store(0, Ordering::Relaxed);
        self.fresh_reads.store(0, Ordering::Relaxed);
        self.stale_reads.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelMetricsSnapshot {
    /// 写入次数
    pub writes: u64,
    /// 新值读取次数
    pub fresh_reads: u64,
    /// 旧值读取次数
    pub stale_reads: u64,
}

impl ChannelMetricsSnapshot {
    /// 总读取次数
    pub fn total_reads(&self) -> u64 {
        self.fresh_reads + self.stale_reads
    }

    /// 被覆盖（从未被读端看到）的写入次数
    ///
    /// 生产者频率高于控制频率时，中间的写入会被后续写入覆盖。
    pub fn overwritten(&self) -> u64 {
        self.writes.saturating_sub(self.fresh_reads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_snapshot_and_reset() {
        let metrics = ChannelMetrics::new();
        metrics.writes.fetch_add(5, Ordering::Relaxed);
        metrics.fresh_reads.fetch_add(2, Ordering::Relaxed);
        metrics.stale_reads.fetch_add(7, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_reads(), 9);
        assert_eq!(snapshot.overwritten(), 3);

        metrics.reset();
        assert_eq!(metrics.snapshot(), ChannelMetricsSnapshot::default());
    }
}
