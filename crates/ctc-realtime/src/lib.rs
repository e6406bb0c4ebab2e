//! 实时命令通道
//!
//! 把任意时序的生产者线程写入的最新快照，交给唯一的实时消费者线程。
//!
//! # 设计目标
//!
//! - **读端无锁、无等待、无分配**：`read()` 只做一次原子交换
//! - **永不撕裂**：读端只会看到某次写入完整写完的值
//! - **写端零分配**：首次写入之后，同形状的值通过 `Clone::clone_from` 原地拷贝
//! - **写端互斥显式化**：多个生产者通过写端内部的 `parking_lot::Mutex` 串行化，
//!   该锁只在非实时线程之间竞争，读端从不触碰
//!
//! # 示例
//!
//! ```rust
//! use ctc_realtime::realtime_buffer;
//!
//! let (writer, mut reader) = realtime_buffer([0.0f64; 3]);
//!
//! // 生产者线程
//! let producer = {
//!     let writer = writer.clone();
//!     std::thread::spawn(move || writer.write(&[1.0, 2.0, 3.0]))
//! };
//! producer.join().unwrap();
//!
//! // 实时线程
//! assert_eq!(reader.read(), &[1.0, 2.0, 3.0]);
//! ```

mod buffer;
mod metrics;

pub use buffer::{RealtimeReader, RealtimeWriter, realtime_buffer};
pub use metrics::{ChannelMetrics, ChannelMetricsSnapshot};
