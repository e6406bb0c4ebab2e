//! 每个控制周期的输入（关节状态）与输出（力矩命令）

use crate::joint::{JointSet, JointSetError};
use crate::vector::JointVector;

/// 关节状态（测量值）
///
/// 由外部硬件适配器每周期生成一次，周期内不可变。
/// 位置单位：rad（转动关节）或 m（移动关节）；速度单位对应为 rad/s 或 m/s。
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    /// 关节位置 q
    pub positions: JointVector,
    /// 关节速度 qd
    pub velocities: JointVector,
}

impl JointState {
    /// 创建全零状态
    pub fn zeros(len: usize) -> Self {
        Self {
            positions: JointVector::zeros(len),
            velocities: JointVector::zeros(len),
        }
    }

    /// 从位置和速度向量创建
    ///
    /// # 错误
    ///
    /// 两个向量长度不一致时返回 `JointSetError::LengthMismatch`。
    pub fn new(
        positions: impl Into<JointVector>,
        velocities: impl Into<JointVector>,
    ) -> Result<Self, JointSetError> {
        let positions = positions.into();
        let velocities = velocities.into();
        if positions.len() != velocities.len() {
            return Err(JointSetError::LengthMismatch {
                expected: positions.len(),
                actual: velocities.len(),
            });
        }
        Ok(Self {
            positions,
            velocities,
        })
    }

    /// 从 `name -> (position, velocity)` 映射构造，按 `joints` 的顺序排列
    ///
    /// 每个关节必须且只能出现一次。用于非实时侧（适配器初始化、测试）。
    pub fn from_named<'a, I>(joints: &JointSet, entries: I) -> Result<Self, JointSetError>
    where
        I: IntoIterator<Item = (&'a str, f64, f64)>,
    {
        let mut state = Self::zeros(joints.len());
        let mut seen = vec![false; joints.len()];
        for (name, position, velocity) in entries {
            let index = joints.index_of(name).ok_or_else(|| JointSetError::UnknownJoint {
                name: name.to_string(),
            })?;
            if seen[index] {
                return Err(JointSetError::Duplicate {
                    name: name.to_string(),
                });
            }
            seen[index] = true;
            state.positions[index] = position;
            state.velocities[index] = velocity;
        }

        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(JointSetError::MissingJoint {
                name: joints.name(missing).unwrap_or_default().to_string(),
            });
        }
        Ok(state)
    }

    /// 关节数量
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 位置和速度是否都是有限值
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.positions.is_finite() && self.velocities.is_finite()
    }

    /// 原地拷贝另一个状态（不分配）
    #[inline]
    pub fn copy_from(&mut self, other: &JointState) {
        self.positions.clone_from(&other.positions);
        self.velocities.clone_from(&other.velocities);
    }
}

/// 力矩命令
///
/// 控制器唯一的输出，每周期交给外部硬件适配器一次。
/// 单位：Nm（转动关节）或 N（移动关节）。
#[derive(Debug, Clone, PartialEq)]
pub struct EffortCommand {
    efforts: JointVector,
}

impl EffortCommand {
    /// 创建零力矩命令
    pub fn zeros(len: usize) -> Self {
        Self {
            efforts: JointVector::zeros(len),
        }
    }

    /// 从力矩向量创建
    pub fn from_efforts(efforts: impl Into<JointVector>) -> Self {
        Self {
            efforts: efforts.into(),
        }
    }

    /// 力矩向量
    #[inline]
    pub fn efforts(&self) -> &JointVector {
        &self.efforts
    }

    /// 力矩向量（可变）
    #[inline]
    pub fn efforts_mut(&mut self) -> &mut JointVector {
        &mut self.efforts
    }

    /// 关节数量
    #[inline]
    pub fn len(&self) -> usize {
        self.efforts.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.efforts.is_empty()
    }

    /// 置为零力矩（故障回退 / 失能）
    #[inline]
    pub fn set_zero(&mut self) {
        self.efforts.set_zero();
    }

    /// 是否所有关节都是零力矩
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.efforts.iter().all(|e| *e == 0.0)
    }

    /// 是否所有关节力矩都是有限值
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.efforts.is_finite()
    }

    /// 按名字读取某个关节的力矩
    pub fn get(&self, joints: &JointSet, name: &str) -> Option<f64> {
        joints.index_of(name).and_then(|i| self.efforts.get(i).copied())
    }

    /// 按 `(name, effort)` 迭代
    pub fn iter_named<'a>(&'a self, joints: &'a JointSet) -> impl Iterator<Item = (&'a str, f64)> {
        joints.names().zip(self.efforts.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joints() -> JointSet {
        JointSet::new(["j1", "j2", "j3"]).unwrap()
    }

    #[test]
    fn test_state_from_named_reorders() {
        let joints = joints();
        let state = JointState::from_named(
            &joints,
            [("j3", 3.0, 0.3), ("j1", 1.0, 0.1), ("j2", 2.0, 0.2)],
        )
        .unwrap();
        assert_eq!(state.positions.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(state.velocities.as_slice(), &[0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_state_from_named_errors() {
        let joints = joints();
        let unknown = JointState::from_named(&joints, [("j9", 0.0, 0.0)]);
        assert!(matches!(unknown, Err(JointSetError::UnknownJoint { .. })));

        let missing = JointState::from_named(&joints, [("j1", 0.0, 0.0), ("j2", 0.0, 0.0)]);
        assert_eq!(
            missing.unwrap_err(),
            JointSetError::MissingJoint {
                name: "j3".to_string()
            }
        );

        let dup = JointState::from_named(
            &joints,
            [("j1", 0.0, 0.0), ("j1", 0.0, 0.0), ("j2", 0.0, 0.0)],
        );
        assert!(matches!(dup, Err(JointSetError::Duplicate { .. })));
    }

    #[test]
    fn test_state_new_length_mismatch() {
        let result = JointState::new(vec![0.0, 1.0], vec![0.0]);
        assert_eq!(
            result.unwrap_err(),
            JointSetError::LengthMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_effort_command_named_access() {
        let joints = joints();
        let mut cmd = EffortCommand::from_efforts([1.5, -2.0, 0.0]);
        assert_eq!(cmd.get(&joints, "j2"), Some(-2.0));
        assert_eq!(cmd.get(&joints, "nope"), None);
        let named: Vec<_> = cmd.iter_named(&joints).collect();
        assert_eq!(named, vec![("j1", 1.5), ("j2", -2.0), ("j3", 0.0)]);

        assert!(!cmd.is_zero());
        cmd.set_zero();
        assert!(cmd.is_zero());
        assert!(cmd.is_finite());
    }
}
