//! 实时缓冲区并发测试
//!
//! 验证：
//! 1. 任意交错下读端不会读到撕裂的值
//! 2. 单写端时读到的序号单调不减
//! 3. 最后一次写入之后的读取一定返回最后写入的值

use ctc_realtime::realtime_buffer;
use proptest::prelude::*;
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const PAYLOAD: usize = 64;

/// 所有元素都相同的快照：只要有一个元素不同就说明发生了撕裂
fn payload(tag: u64) -> Vec<u64> {
    vec![tag; PAYLOAD]
}

fn assert_untorn(value: &[u64]) {
    let first = value[0];
    assert!(
        value.iter().all(|v| *v == first),
        "torn read detected: {:?}",
        &value[..8]
    );
}

#[test]
fn test_multi_writer_never_torn() {
    let (writer, mut reader) = realtime_buffer(payload(0));
    let done = Arc::new(AtomicBool::new(false));

    let producers: Vec<_> = (0..4u64)
        .map(|id| {
            let writer = writer.clone();
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for i in 0..2_000u64 {
                    writer.write(&payload(id * 1_000_000 + i + 1));
                    if rng.gen_bool(0.05) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let consumer = {
        let done = done.clone();
        thread::spawn(move || {
            let mut reads = 0u64;
            while !done.load(Ordering::Acquire) {
                assert_untorn(reader.read());
                reads += 1;
            }
            // 生产者全部结束后再读一次
            let last = reader.read().clone();
            assert_untorn(&last);
            (reads, last, reader)
        })
    };

    for p in producers {
        p.join().unwrap();
    }
    done.store(true, Ordering::Release);
    let (reads, last, _reader) = consumer.join().unwrap();

    assert!(reads > 0);
    // 最后的值必须是某个生产者的最后一次写入
    assert_eq!(last, writer.latest());
    assert_eq!(writer.metrics().snapshot().writes, 8_000);
}

#[test]
fn test_single_writer_monotonic() {
    let (writer, mut reader) = realtime_buffer(payload(0));

    let producer = thread::spawn(move || {
        for i in 1..=5_000u64 {
            writer.write(&payload(i));
            if i % 500 == 0 {
                thread::sleep(Duration::from_micros(50));
            }
        }
        writer
    });

    let mut last_seen = 0u64;
    loop {
        let value = reader.read();
        assert_untorn(value);
        assert!(value[0] >= last_seen, "went backwards: {} < {}", value[0], last_seen);
        last_seen = value[0];
        // 最后一次写入完成后，下一次读取必然拿到 5000，循环一定会结束
        if last_seen == 5_000 {
            break;
        }
    }
    let writer = producer.join().unwrap();
    assert_eq!(reader.read()[0], 5_000);
    assert_eq!(writer.latest()[0], 5_000);
}

#[derive(Debug, Clone)]
enum Op {
    Write(i64),
    Read,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<i64>().prop_map(Op::Write), Just(Op::Read)]
}

proptest! {
    /// 单线程下，读取总是返回最近一次写入（或初始值）
    #[test]
    fn read_returns_most_recent_write(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let (writer, mut reader) = realtime_buffer(-1i64);
        let mut expected = -1i64;
        for op in ops {
            match op {
                Op::Write(v) => {
                    writer.write(&v);
                    expected = v;
                },
                Op::Read => prop_assert_eq!(*reader.read(), expected),
            }
        }
        prop_assert_eq!(*reader.read(), expected);
    }
}
