//! 关节集合
//!
//! 受控关节的名称列表在初始化时确定，之后整个控制器生命周期内不再变化。
//! 所有按关节排列的向量（状态、增益、力矩）都使用同一个 `JointSet` 的顺序。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// 关节集合构造错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JointSetError {
    /// 关节列表为空
    #[error("Joint set is empty")]
    Empty,

    /// 关节名为空字符串
    #[error("Joint name at index {index} is empty")]
    EmptyName { index: usize },

    /// 关节名重复
    #[error("Duplicate joint name '{name}'")]
    Duplicate { name: String },

    /// 关节名无法解析
    #[error("Unknown joint '{name}'")]
    UnknownJoint { name: String },

    /// 缺少某个关节的数据
    #[error("Missing value for joint '{name}'")]
    MissingJoint { name: String },

    /// 向量长度与关节数不一致
    #[error("Length mismatch: expected {expected} joints, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, PartialEq, Eq)]
struct Inner {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

/// 有序、无重复的关节集合
///
/// 内部使用 `Arc` 共享，`clone()` 只增加引用计数，可以放心地
/// 分发给 setpoint 写入端、监控线程等非实时组件。
#[derive(Clone, PartialEq, Eq)]
pub struct JointSet {
    inner: Arc<Inner>,
}

impl JointSet {
    /// 从关节名列表创建集合
    ///
    /// # 错误
    ///
    /// - `JointSetError::Empty`: 列表为空
    /// - `JointSetError::EmptyName`: 存在空名字
    /// - `JointSetError::Duplicate`: 存在重复名字
    pub fn new<I, S>(names: I) -> Result<Self, JointSetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(JointSetError::Empty);
        }

        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(JointSetError::EmptyName { index: i });
            }
            if index.insert(name.clone(), i).is_some() {
                return Err(JointSetError::Duplicate { name: name.clone() });
            }
        }

        Ok(Self {
            inner: Arc::new(Inner { names, index }),
        })
    }

    /// 关节数量
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.names.len()
    }

    /// 是否为空（构造保证非空，始终返回 `false`）
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.names.is_empty()
    }

    /// 按名字查找索引
    #[inline]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.inner.index.get(name).copied()
    }

    /// 按索引获取名字
    #[inline]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.inner.names.get(index).map(String::as_str)
    }

    /// 是否包含某个关节
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.index.contains_key(name)
    }

    /// 按顺序迭代关节名
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.names.iter().map(String::as_str)
    }
}

impl fmt::Debug for JointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.names.iter()).finish()
    }
}

impl fmt::Display for JointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.inner.names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_set_lookup() {
        let joints = JointSet::new(["shoulder", "elbow", "wrist"]).unwrap();
        assert_eq!(joints.len(), 3);
        assert_eq!(joints.index_of("elbow"), Some(1));
        assert_eq!(joints.name(2), Some("wrist"));
        assert_eq!(joints.index_of("gripper"), None);
        assert!(joints.contains("shoulder"));
        assert_eq!(joints.names().collect::<Vec<_>>(), ["shoulder", "elbow", "wrist"]);
    }

    #[test]
    fn test_joint_set_rejects_empty() {
        let result = JointSet::new(Vec::<String>::new());
        assert_eq!(result.unwrap_err(), JointSetError::Empty);
    }

    #[test]
    fn test_joint_set_rejects_duplicate() {
        let result = JointSet::new(["a", "b", "a"]);
        assert_eq!(
            result.unwrap_err(),
            JointSetError::Duplicate {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_joint_set_rejects_empty_name() {
        let result = JointSet::new(["a", ""]);
        assert_eq!(result.unwrap_err(), JointSetError::EmptyName { index: 1 });
    }

    #[test]
    fn test_joint_set_display() {
        let joints = JointSet::new(["j1", "j2"]).unwrap();
        assert_eq!(format!("{}", joints), "[j1, j2]");
        // Clone 共享同一份数据
        let clone = joints.clone();
        assert_eq!(clone, joints);
    }
}
