// crates/am_physics/src/submodels/coalescence.rs

//! 布朗聚并模型
//!
//! 连续区 Fuchs 核：
//!
//! $$ K(d_i, d_j) = \eta\,\frac{2 k_B T}{3\mu}\,
//!    \frac{(d_i + d_j)^2}{d_i\, d_j} $$
//!
//! η 为碰撞效率。同尺寸碰撞 K = η·8kT/(3μ)。

use super::{CoalescenceModel, BOLTZMANN};

/// 布朗聚并模型
#[derive(Debug, Clone)]
pub struct BrownianCoalescence {
    /// 碰撞效率（0-1）
    efficiency: f64,
}

impl BrownianCoalescence {
    /// 创建模型
    pub fn new(efficiency: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&efficiency));
        Self { efficiency }
    }
}

impl CoalescenceModel for BrownianCoalescence {
    fn name(&self) -> &'static str {
        "brownian"
    }

    fn kernel(&self, di: f64, dj: f64, temperature: f64, mu: f64) -> f64 {
        let sum = di + dj;
        self.efficiency * 2.0 * BOLTZMANN * temperature / (3.0 * mu) * sum * sum / (di * dj)
    }
}

// ============================================================
// 测试
// ============================================================
