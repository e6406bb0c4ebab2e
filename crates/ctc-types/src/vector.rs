//! 关节标量向量
//!
//! `DVector<f64>` 的 NewType 包装。与直接使用 `DVector` 的区别在于
//! `clone_from()`：形状相同时原地拷贝，不会重新分配堆内存。
//! 实时缓冲区依赖这一点保证首次写入之后的写操作零分配。

use nalgebra::DVector;
use std::ops::{Deref, DerefMut};

/// 按 `JointSet` 顺序排列的关节向量
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct JointVector(DVector<f64>);

impl JointVector {
    /// 创建全零向量
    #[inline]
    pub fn zeros(len: usize) -> Self {
        JointVector(DVector::zeros(len))
    }

    /// 创建所有元素相同的向量
    #[inline]
    pub fn splat(len: usize, value: f64) -> Self {
        JointVector(DVector::from_element(len, value))
    }

    /// 从切片创建
    #[inline]
    pub fn from_slice(values: &[f64]) -> Self {
        JointVector(DVector::from_column_slice(values))
    }

    /// 包装已有的 `DVector`
    #[inline]
    pub fn from_dvector(values: DVector<f64>) -> Self {
        JointVector(values)
    }

    /// 取出内部的 `DVector`
    #[inline]
    pub fn into_inner(self) -> DVector<f64> {
        self.0
    }

    /// 所有元素是否都是有限值（无 NaN / Inf）
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// 所有元素置零（不重新分配）
    #[inline]
    pub fn set_zero(&mut self) {
        self.0.fill(0.0);
    }
}

impl Clone for JointVector {
    fn clone(&self) -> Self {
        JointVector(self.0.clone())
    }

    /// 形状相同时原地拷贝，否则退化为重新分配
    fn clone_from(&mut self, source: &Self) {
        if self.0.len() == source.0.len() {
            self.0.copy_from(&source.0);
        } else {
            self.0 = source.0.clone();
        }
    }
}

impl Deref for JointVector {
    type Target = DVector<f64>;

    #[inline]
    fn deref(&self) -> &DVector<f64> {
        &self.0
    }
}

impl DerefMut for JointVector {
    #[inline]
    fn deref_mut(&mut self) -> &mut DVector<f64> {
        &mut self.0
    }
}

impl From<DVector<f64>> for JointVector {
    fn from(values: DVector<f64>) -> Self {
        JointVector(values)
    }
}

impl From<Vec<f64>> for JointVector {
    fn from(values: Vec<f64>) -> Self {
        JointVector(DVector::from_vec(values))
    }
}

impl<const N: usize> From<[f64; N]> for JointVector {
    fn from(values: [f64; N]) -> Self {
        JointVector::from_slice(&values)
    }
}
