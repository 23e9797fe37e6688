// crates/am_foundation/src/lib.rs

//! aeroMist Foundation Layer
//!
//! 零依赖基础层，提供整个项目的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型
//! - [`float`]: 数值安全辅助（正则化除法、有限性检查）
//!
//! # 设计原则
//!
//! 1. **零外部依赖**: 仅依赖 thiserror
//! 2. **错误即分类**: 致命（配置/重入）与可恢复（越界）在类型层面区分
//! 3. **退化即正则化**: 近零分母不报错，由 float 模块兜底

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;

// 重导出常用类型
pub use error::{AmError, AmResult};
pub use float::{approx_eq, clamp01, residual_div, safe_div};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{AmError, AmResult};
    pub use crate::float::{approx_eq, clamp01, residual_div, safe_div};
    pub use crate::{ensure, require};
}
