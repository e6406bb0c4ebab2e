//! 控制器生命周期状态
//!
//! Uninitialized → Ready（init）→ Running（activate）→ Ready（deactivate）。
//! 只有 Running 状态下才会计算力矩。

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// 生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// 尚未初始化
    #[default]
    Uninitialized = 0,

    /// 增益已加载、关节集合已固定、模型已绑定
    Ready = 1,

    /// 设定值已播种，控制律每周期执行
    Running = 2,
}

impl LifecycleState {
    /// 从 u8 转换
    ///
    /// 无效值返回 Uninitialized。
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Running,
            _ => Self::Uninitialized,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    pub fn is_initialized(self) -> bool {
        self != Self::Uninitialized
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "Uninitialized",
            Self::Ready => "Ready",
            Self::Running => "Running",
        };
        f.write_str(name)
    }
}

/// 生命周期状态（原子版本，供非实时线程观察）
///
/// 控制器是唯一的写者；监控线程通过共享的 `Arc<AtomicLifecycle>` 读取。
#[derive(Debug, Default)]
pub struct AtomicLifecycle {
    inner: AtomicU8,
}

impl AtomicLifecycle {
    pub fn new(state: LifecycleState) -> Self {
        Self {
            inner: AtomicU8::new(state.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> LifecycleState {
        LifecycleState::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, state: LifecycleState, ordering: Ordering) {
        self.inner.store(state.as_u8(), ordering);
    }

    /// 比较并交换
    ///
    /// 当前值等于 `current` 时设置为 `new` 并返回 true。
    pub fn compare_exchange(
        &self,
        current: LifecycleState,
        new: LifecycleState,
        success: Ordering,
        failure: Ordering,
    ) -> bool {
        self.inner
            .compare_exchange(current.as_u8(), new.as_u8(), success, failure)
            .is_ok()
    }
}
