// crates/am_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `AmError` 枚举和 `AmResult` 类型别名，用于整个项目的错误处理。
//!
//! # 错误分类
//!
//! 1. **配置错误**（致命）：离散化非法、缺少系数、子模型选择器无法解析、
//!    协作对象未挂载。构造期或首次使用时立即报出，终止运行。
//! 2. **越界错误**（调用方可恢复）：尺寸查询超出分布有效域且未启用软钳位。
//!    调用方可捕获后钳位替代，或升级为配置错误。
//! 3. **重入错误**（致命）：`correct()` 在执行期间被再次调用。
//!
//! 数值退化（近零分母等）不属于错误，由 [`crate::float`] 的正则化处理。

use thiserror::Error;

/// 统一结果类型
pub type AmResult<T> = Result<T, AmError>;

/// aeroMist 错误类型
///
/// 核心错误类型，用于整个项目。物理计算相关的局部错误可在 `am_physics`
/// 中扩展并转换到本类型。
#[derive(Error, Debug)]
pub enum AmError {
    // ========================================================================
    // IO 相关错误
    // ========================================================================

    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    // ========================================================================
    // 配置错误（致命）
    // ========================================================================

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 缺少配置项
    #[error("缺少必需的配置项: {key}")]
    MissingConfig {
        /// 配置键名
        key: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    /// 协作对象未挂载
    ///
    /// 载流相耦合、诊断输出等必须在使用前显式挂载。
    #[error("协作对象未挂载: {resource}, 请先调用 {hint}")]
    NotAttached {
        /// 未挂载的资源名
        resource: &'static str,
        /// 挂载方法提示
        hint: &'static str,
    },

    // ========================================================================
    // 调用方可恢复错误
    // ========================================================================

    /// 数据超出范围
    #[error("数据超出范围: {field}={value:e}, 期望范围=[{min:e}, {max:e}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    // ========================================================================
    // 运行时错误（致命）
    // ========================================================================

    /// 非法重入
    #[error("非法重入: {context} 正在执行中被再次调用")]
    Reentrancy {
        /// 被重入的调用描述
        context: &'static str,
    },

    /// 验证失败
    #[error("验证失败: {0}")]
    Validation(String),

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl AmError {
    /// IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 缺少配置
    pub fn missing_config(key: impl Into<String>) -> Self {
        Self::MissingConfig { key: key.into() }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 协作对象未挂载
    pub fn not_attached(resource: &'static str, hint: &'static str) -> Self {
        Self::NotAttached { resource, hint }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 非法重入
    pub fn reentrancy(context: &'static str) -> Self {
        Self::Reentrancy { context }
    }

    /// 验证失败
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否为致命错误（不允许继续运行）
    ///
    /// 越界与大小不匹配由调用方决定如何处理，其余均视为致命。
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::OutOfRange { .. } | Self::SizeMismatch { .. } | Self::IndexOutOfBounds { .. }
        )
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl AmError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> AmResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> AmResult<()> {
        if value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> AmResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for AmError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 断言宏
// ========================================================================

/// 条件不满足时返回给定错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// 解包 `Option`，为 `None` 时返回给定错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 测试
// ========================================================================
