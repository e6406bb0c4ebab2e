//! 三槽实时缓冲区
//!
//! 三个预分配槽位在任意时刻分别归属于：写端（back）、中转（middle）、读端（front）。
//! 写端写完 back 后与 middle 原子交换并置 FRESH 标志；读端发现 FRESH 时
//! 用 front 与 middle 原子交换。每个槽位同一时刻只属于一方，因此读端永远
//! 不会观察到写了一半的值，双方也都不需要等待对方。

use crate::metrics::ChannelMetrics;
use parking_lot::Mutex;
use std::cell::UnsafeCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

const INDEX_MASK: u8 = 0b011;
const FRESH_BIT: u8 = 0b100;

struct Shared<T> {
    slots: [UnsafeCell<T>; 3],
    /// middle 槽位索引 | FRESH 标志
    middle: AtomicU8,
    metrics: Arc<ChannelMetrics>,
}

// SAFETY: 槽位通过 middle 上的原子交换在写端和读端之间转移所有权，
// 任何时刻每个槽位只被一方访问，因此跨线程共享 Shared<T> 只要求 T: Send。
unsafe impl<T: Send> Sync for Shared<T> {}

struct WriterSide<T> {
    /// 写端独占的槽位索引
    back: u8,
    /// 最近一次写入的完整值，供 `write_with` 做读-改-写
    latest: T,
}

/// 实时缓冲区写端（非实时线程使用）
///
/// `Clone` 只复制句柄，所有克隆共享同一把写端锁，多个生产者之间互斥。
pub struct RealtimeWriter<T> {
    shared: Arc<Shared<T>>,
    side: Arc<Mutex<WriterSide<T>>>,
}

/// 实时缓冲区读端（唯一的实时线程使用）
///
/// 不实现 `Clone`：读端角色在类型层面保证唯一。
pub struct RealtimeReader<T> {
    shared: Arc<Shared<T>>,
    /// 读端独占的槽位索引
    front: u8,
}

/// 创建实时缓冲区
///
/// `initial` 是首次写入之前读端看到的值（初始化默认值）。
/// 三个槽位在这里一次性分配完毕。
pub fn realtime_buffer<T: Clone>(initial: T) -> (RealtimeWriter<T>, RealtimeReader<T>) {
    let shared = Arc::new(Shared {
        slots: [
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial.clone()),
            UnsafeCell::new(initial.clone()),
        ],
        middle: AtomicU8::new(1),
        metrics: Arc::new(ChannelMetrics::new()),
    });

    let writer = RealtimeWriter {
        shared: shared.clone(),
        side: Arc::new(Mutex::new(WriterSide {
            back: 0,
            latest: initial,
        })),
    };
    let reader = RealtimeReader { shared, front: 2 };
    (writer, reader)
}

impl<T: Clone> RealtimeWriter<T> {
    /// 写入新快照
    ///
    /// 不阻塞读端；只会与其他写端竞争写端锁。
    pub fn write(&self, value: &T) {
        self.write_with(|latest| latest.clone_from(value));
    }

    /// 在最近一次写入的值上原地修改后发布
    ///
    /// 用于只更新快照中的一部分（例如单个关节的设定值）。
    /// 闭包执行期间持有写端锁。
    pub fn write_with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut side = self.side.lock();
        let result = f(&mut side.latest);

        let back = side.back;
        // SAFETY: back 槽位只属于持有写端锁的一方，读端不会访问它
        unsafe {
            (*self.shared.slots[back as usize].get()).clone_from(&side.latest);
        }

        // Release: 发布 back 槽位的内容；Acquire: 接管读端之前释放的槽位
        let previous = self.shared.middle.swap(back | FRESH_BIT, Ordering::AcqRel);
        side.back = previous & INDEX_MASK;

        self.shared.metrics.writes.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// 最近一次写入的值（拷贝）
    pub fn latest(&self) -> T {
        self.side.lock().latest.clone()
    }
}

impl<T> RealtimeWriter<T> {
    /// 通道指标
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        &self.shared.metrics
    }
}

impl<T> Clone for RealtimeWriter<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            side: self.side.clone(),
        }
    }
}

impl<T> fmt::Debug for RealtimeWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeWriter")
            .field("metrics", &self.shared.metrics.snapshot())
            .finish()
    }
}

impl<T> RealtimeReader<T> {
    /// 读取最新的完整快照
    ///
    /// 无锁、无等待、无分配。没有新写入时返回上一次读到的值。
    pub fn read(&mut self) -> &T {
        if self.shared.middle.load(Ordering::Relaxed) & FRESH_BIT != 0 {
            // Acquire: 与写端的 Release 配对，保证看到完整写入的槽位
            let previous = self.shared.middle.swap(self.front, Ordering::AcqRel);
            self.front = previous & INDEX_MASK;
            self.shared.metrics.fresh_reads.fetch_add(1, Ordering::Relaxed);
        } else {
            self.shared.metrics.stale_reads.fetch_add(1, Ordering::Relaxed);
        }

        // SAFETY: front 槽位只属于读端；返回的引用借用 &mut self，
        // 在下一次 read() 交换槽位之前一定已经失效
        unsafe { &*self.shared.slots[self.front as usize].get() }
    }

    /// 自上次 `read()` 以来是否有新写入
    pub fn has_update(&self) -> bool {
        self.shared.middle.load(Ordering::Acquire) & FRESH_BIT != 0
    }

    /// 通道指标
    pub fn metrics(&self) -> &Arc<ChannelMetrics> {
        &self.shared.metrics
    }
}

impl<T> fmt::Debug for RealtimeReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeReader")
            .field("front", &self.front)
            .field("metrics", &self.shared.metrics.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_read_before_write_returns_initial() {
        let (_writer, mut reader) = realtime_buffer(42i32);
        assert_eq!(*reader.read(), 42);
        assert_eq!(*reader.read(), 42);
    }

    #[test]
    fn test_read_returns_last_write() {
        let (writer, mut reader) = realtime_buffer(0i32);
        writer.write(&1);
        writer.write(&2);
        writer.write(&3);
        assert!(reader.has_update());
        assert_eq!(*reader.read(), 3);
        assert!(!reader.has_update());
        // 没有新写入：重复读取旧值
        assert_eq!(*reader.read(), 3);
    }

    #[test]
    fn test_interleaved_write_read() {
        let (writer, mut reader) = realtime_buffer(0u64);
        for i in 1..100u64 {
            writer.write(&i);
            assert_eq!(*reader.read(), i);
        }
    }

    #[test]
    fn test_write_with_partial_update() {
        let (writer, mut reader) = realtime_buffer(vec![0.0; 4]);
        writer.write_with(|v| v[1] = 1.5);
        writer.write_with(|v| v[3] = -2.0);
        assert_eq!(reader.read(), &vec![0.0, 1.5, 0.0, -2.0]);
        assert_eq!(writer.latest(), vec![0.0, 1.5, 0.0, -2.0]);
    }

    #[test]
    fn test_cloned_writers_share_state() {
        let (writer, mut reader) = realtime_buffer(vec![0u8; 2]);
        let other = writer.clone();
        writer.write_with(|v| v[0] = 1);
        other.write_with(|v| v[1] = 2);
        assert_eq!(reader.read(), &vec![1, 2]);
    }

    #[test]
    fn test_same_shape_writes_reuse_slots() {
        let (writer, mut reader) = realtime_buffer(vec![0u32; 16]);
        let mut buffers = HashSet::new();
        for i in 0..1000u32 {
            writer.write(&vec![i; 16]);
            let value = reader.read();
            assert_eq!(value[0], i);
            buffers.insert(value.as_ptr() as usize);
        }
        // 只在三个预分配槽位之间轮转
        assert!(buffers.len() <= 3, "slots reallocated: {}", buffers.len());
    }

    #[test]
    fn test_metrics_fresh_and_stale() {
        let (writer, mut reader) = realtime_buffer(0i32);
        writer.write(&1);
        writer.write(&2);
        reader.read();
        reader.read();
        reader.read();

        let snapshot = reader.metrics().snapshot();
        assert_eq!(snapshot.writes, 2);
        assert_eq!(snapshot.fresh_reads, 1);
        assert_eq!(snapshot.stale_reads, 2);
        assert_eq!(snapshot.overwritten(), 1);
    }
}
