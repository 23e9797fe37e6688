// crates/am_physics/src/submodels/nucleation.rs

//! 阈值型成核模型
//!
//! 蒸气分数越过临界值后，以超临界比例线性产生新粒子质量，
//! 新粒子进入最小分区（由具体气溶胶模型负责落位）：
//!
//! $$ J = J_0 \max\!\left(0,\ \frac{Y_v}{Y_{crit}} - 1\right) $$

use super::NucleationModel;
use crate::thermo::AerosolThermo;

/// 阈值型成核模型
#[derive(Debug, Clone)]
pub struct ThresholdNucleation {
    /// 成核速率系数 [1/s]
    rate_coefficient: f64,
    /// 临界蒸气质量分数
    y_crit: f64,
}

impl ThresholdNucleation {
    /// 创建模型
    pub fn new(rate_coefficient: f64, y_crit: f64) -> Self {
        debug_assert!(y_crit > 0.0);
        Self {
            rate_coefficient,
            y_crit,
        }
    }
}

impl NucleationModel for ThresholdNucleation {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn nucleation_rate(&self, y_vapor: &[f64], _thermo: &AerosolThermo) -> Vec<f64> {
        y_vapor
            .iter()
            .map(|&yv| self.rate_coefficient * (yv / self.y_crit - 1.0).max(0.0))
            .collect()
    }
}

// ============================================================
// 测试
// ============================================================
