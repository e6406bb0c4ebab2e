//! 动力学模型错误类型

use thiserror::Error;

/// 动力学模型错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// 输入或输出维度与模型自由度不一致
    #[error("Dimension mismatch: model has {expected} DoF, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// 模型参数无效（构造时）
    #[error("Invalid parameter for link '{link}': {reason}")]
    InvalidParameter { link: String, reason: String },

    /// 模型不支持请求的量（如 Jacobian）
    #[error("Unsupported model quantity: {0}")]
    Unsupported(&'static str),

    /// 机构描述解析失败
    #[error("Failed to parse mechanism description: {0}")]
    Description(String),

    /// 模型求值失败
    #[error("Model evaluation failed: {0}")]
    Evaluation(String),
}
