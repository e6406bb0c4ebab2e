//! 控制增益

use crate::joint::JointSetError;
use crate::vector::JointVector;

/// 每关节 PD 增益
///
/// 初始化时加载，之后只读。非负、有限。
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGains {
    /// 比例增益 Kp（1/s²，作用于 M(q) 之前）
    pub kp: JointVector,
    /// 微分增益 Kd（1/s，作用于 M(q) 之前）
    pub kd: JointVector,
}

impl ControlGains {
    /// 创建增益
    ///
    /// # 错误
    ///
    /// `kp` 与 `kd` 长度不一致时返回 `JointSetError::LengthMismatch`。
    pub fn new(
        kp: impl Into<JointVector>,
        kd: impl Into<JointVector>,
    ) -> Result<Self, JointSetError> {
        let kp = kp.into();
        let kd = kd.into();
        if kp.len() != kd.len() {
            return Err(JointSetError::LengthMismatch {
                expected: kp.len(),
                actual: kd.len(),
            });
        }
        Ok(Self { kp, kd })
    }

    /// 所有关节使用相同增益
    pub fn uniform(len: usize, kp: f64, kd: f64) -> Self {
        Self {
            kp: JointVector::splat(len, kp),
            kd: JointVector::splat(len, kd),
        }
    }

    /// 关节数量
    #[inline]
    pub fn len(&self) -> usize {
        self.kp.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kp.is_empty()
    }

    /// 所有增益是否非负且有限
    pub fn is_valid(&self) -> bool {
        self.kp.iter().chain(self.kd.iter()).all(|g| g.is_finite() && *g >= 0.0)
    }
}
