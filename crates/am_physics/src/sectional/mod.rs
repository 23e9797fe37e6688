// crates/am_physics/src/sectional/mod.rs

//! 分区法尺寸离散
//!
//! - [`Section`]: 单个尺寸分区（代表尺寸 + 上下边界）
//! - [`SectionalDistribution`]: 有序分区集合与搜索/矩运算

mod distribution;
mod section;

pub use distribution::{SectionalDistribution, SizeDimension};
pub use section::Section;
