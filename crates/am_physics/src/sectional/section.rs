// crates/am_physics/src/sectional/section.rs

//! 单个尺寸分区
//!
//! 一个分区由代表尺寸与上下边界描述，构造后不可变。

use am_foundation::{AmError, AmResult};

/// 尺寸分区
///
/// 不变式：`y_low < y_high` 且 `y_low < x < y_high`。
/// 相邻分区边界首尾相接由 [`super::SectionalDistribution`] 保证。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Section {
    /// 代表尺寸 [m]
    x: f64,
    /// 下边界 [m]
    y_low: f64,
    /// 上边界 [m]
    y_high: f64,
}

impl Section {
    /// 创建分区，校验不变式
    pub fn new(x: f64, y_low: f64, y_high: f64) -> AmResult<Self> {
        if !(y_low < y_high) {
            return Err(AmError::config(format!(
                "分区边界非法: y_low={:e} >= y_high={:e}",
                y_low, y_high
            )));
        }
        if !(y_low < x && x < y_high) {
            return Err(AmError::config(format!(
                "代表尺寸 {:e} 不在分区 ({:e}, {:e}) 内",
                x, y_low, y_high
            )));
        }
        Ok(Self { x, y_low, y_high })
    }

    /// 代表尺寸
    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    /// 下边界
    #[inline]
    pub fn y_low(&self) -> f64 {
        self.y_low
    }

    /// 上边界
    #[inline]
    pub fn y_high(&self) -> f64 {
        self.y_high
    }

    /// 分区宽度
    #[inline]
    pub fn width(&self) -> f64 {
        self.y_high - self.y_low
    }

    /// 尺寸是否落入本分区 [y_low, y_high)
    #[inline]
    pub fn contains(&self, s: f64) -> bool {
        self.y_low <= s && s < self.y_high
    }
}
