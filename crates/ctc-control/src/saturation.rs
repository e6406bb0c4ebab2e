//! 设定值限幅
//!
//! 位置设定值按关节限位钳位，任务空间速度按轴钳位。
//! 两者都原地修改，不分配内存，返回是否发生了钳位。

use ctc_types::{JointVector, TaskAxis, Twist};

/// 关节位置限位
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionLimits {
    limits: Vec<Option<(f64, f64)>>,
}

impl PositionLimits {
    pub fn new(limits: Vec<Option<(f64, f64)>>) -> Self {
        Self { limits }
    }

    /// 无限位
    pub fn unbounded(len: usize) -> Self {
        Self {
            limits: vec![None; len],
        }
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        self.limits.get(index).copied().flatten()
    }

    /// 是否有任何关节配置了限位
    pub fn is_bounded(&self) -> bool {
        self.limits.iter().any(Option::is_some)
    }

    /// 以 `base` 为基础、放宽到包含 `positions` 的限位（原地写入，不分配）
    ///
    /// 已经越限的关节可以停在原处或朝限位范围内移动，但不会被拉回边界。
    /// 无限位的关节保持无限位。
    pub fn widen_from(&mut self, base: &PositionLimits, positions: &JointVector) {
        for ((limit, base), position) in self
            .limits
            .iter_mut()
            .zip(&base.limits)
            .zip(positions.iter())
        {
            *limit = base.map(|(min, max)| (min.min(*position), max.max(*position)));
        }
    }

    /// 钳位到限位范围内
    pub fn clamp(&self, positions: &mut JointVector) -> bool {
        let mut clamped = false;
        for (value, limit) in positions.iter_mut().zip(&self.limits) {
            if let Some((min, max)) = *limit {
                let bounded = value.clamp(min, max);
                if bounded != *value {
                    *value = bounded;
                    clamped = true;
                }
            }
        }
        clamped
    }
}

/// 任务空间速度限幅（线速度三轴共用一个上限，角速度三轴共用一个上限）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TwistLimits {
    pub linear: Option<f64>,
    pub angular: Option<f64>,
}

impl TwistLimits {
    pub fn new(linear: Option<f64>, angular: Option<f64>) -> Self {
        Self { linear, angular }
    }

    /// 按轴钳位到 [-max, max]
    pub fn clamp(&self, twist: &mut Twist) -> bool {
        let mut clamped = false;
        for axis in TaskAxis::ALL {
            let limit = if axis.is_linear() {
                self.linear
            } else {
                self.angular
            };
            if let Some(max) = limit {
                let value = twist.axis(axis);
                let bounded = value.clamp(-max, max);
                if bounded != value {
                    twist.set_axis(axis, bounded);
                    clamped = true;
                }
            }
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_position_clamp() {
        let limits = PositionLimits::new(vec![Some((-1.0, 1.0)), None, Some((0.0, 0.5))]);
        assert!(limits.is_bounded());

        let mut q = JointVector::from([2.0, 100.0, 0.25]);
        assert!(limits.clamp(&mut q));
        assert_eq!(q.as_slice(), &[1.0, 100.0, 0.25]);

        // 已在范围内
        assert!(!limits.clamp(&mut q));
    }

    #[test]
    fn test_unbounded() {
        let limits = PositionLimits::unbounded(2);
        assert!(!limits.is_bounded());
        assert_eq!(limits.get(0), None);
        assert_eq!(limits.get(5), None);
        let mut q = JointVector::from([1e6, -1e6]);
        assert!(!limits.clamp(&mut q));
    }

    #[test]
    fn test_widen_keeps_out_of_range_position() {
        let base = PositionLimits::new(vec![Some((-0.5, 0.5)), None, Some((-0.5, 0.5))]);
        let mut envelope = base.clone();
        envelope.widen_from(&base, &JointVector::from([0.8, 3.0, 0.1]));
        assert_eq!(envelope.get(0), Some((-0.5, 0.8)));
        assert_eq!(envelope.get(1), None);
        assert_eq!(envelope.get(2), Some((-0.5, 0.5)));

        // 停在原处不算限幅
        let mut q = JointVector::from([0.8, 3.0, 0.1]);
        assert!(!envelope.clamp(&mut q));

        // 继续向外被钳位，向内移动后范围收回
        let mut q = JointVector::from([0.9, 3.0, 0.1]);
        assert!(envelope.clamp(&mut q));
        assert_eq!(q[0], 0.8);
        envelope.widen_from(&base, &JointVector::from([0.3, 0.0, 0.0]));
        assert_eq!(envelope, base);
    }

    #[test]
    fn test_twist_clamp() {
        let limits = TwistLimits::new(Some(0.5), None);
        let mut twist = Twist::new(Vector3::new(1.0, -0.2, -3.0), Vector3::new(10.0, 0.0, 0.0));
        assert!(limits.clamp(&mut twist));
        assert_eq!(twist.linear, Vector3::new(0.5, -0.2, -0.5));
        assert_eq!(twist.angular, Vector3::new(10.0, 0.0, 0.0));
        assert!(!limits.clamp(&mut twist));
    }
}
