// crates/am_config/src/lib.rs

//! aeroMist Config Layer
//!
//! 配置层，提供气溶胶模型的全 f64 配置树。
//!
//! # 模块概览
//!
//! - [`aerosol_config`]: AerosolConfig 气溶胶模型配置
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: am_cli        ─> uses AerosolConfig
//! Layer 4: am_config     ─> AerosolConfig, ConfigError (本层)
//! Layer 3: am_physics    ─> 按配置构建模型与子模型
//! Layer 1: am_foundation
//! ```
//!
//! # 设计原则
//!
//! 1. **无泛型**: 本层所有类型都不包含泛型参数
//! 2. **全 f64 配置**: 所有数值使用 f64，便于 JSON 序列化
//! 3. **加载即验证**: `from_file` 在返回前调用 `validate()`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aerosol_config;
pub mod error;

// 重导出核心类型
pub use aerosol_config::{
    AerosolConfig, AerosolModelKind, CoalescenceConfig, CondensationConfig,
    ConvectionSchemeKind, DriftConfig, InertialClosureKind, LogNormalConfig, NucleationConfig,
    SectionSpacing, SectionalConfig, TimeScaleConfig, TransportConfig,
};
pub use error::ConfigError;
