// crates/am_physics/src/submodels/condensation.rs

//! 弛豫型冷凝模型
//!
//! 对蒸气质量分数线性化的一阶弛豫：
//!
//! $$ \frac{dY_v}{dt} = -k\,(Y_v - Y_{eq}) $$
//!
//! 迁移出的蒸气质量进入分散相（按表面积权重分配到各分区，
//! 由具体气溶胶模型负责）。弛豫速率 k 同时是冷凝特征速率，
//! 供局部时间尺度计算使用。

use am_config::CondensationConfig;

use super::CondensationModel;
use crate::thermo::AerosolThermo;

/// 弛豫型冷凝模型
#[derive(Debug, Clone)]
pub struct RelaxationCondensation {
    /// 弛豫速率系数 [1/s]
    rate_coefficient: f64,
    /// 平衡蒸气质量分数
    equilibrium_fraction: f64,
    /// 比潜热 [J/kg]
    latent_heat: f64,
}

impl RelaxationCondensation {
    /// 创建模型
    pub fn new(rate_coefficient: f64, equilibrium_fraction: f64, latent_heat: f64) -> Self {
        Self {
            rate_coefficient,
            equilibrium_fraction,
            latent_heat,
        }
    }

    /// 从配置创建
    pub fn from_config(config: &CondensationConfig) -> Self {
        Self::new(
            config.rate_coefficient,
            config.equilibrium_fraction,
            config.latent_heat,
        )
    }
}

impl CondensationModel for RelaxationCondensation {
    fn name(&self) -> &'static str {
        "relaxation"
    }

    fn transfer_rate(&self, y_vapor: &[f64], _thermo: &AerosolThermo) -> Vec<f64> {
        y_vapor
            .iter()
            .map(|&yv| self.rate_coefficient * (yv - self.equilibrium_fraction))
            .collect()
    }

    fn characteristic_rate(&self) -> f64 {
        self.rate_coefficient
    }

    fn latent_heat(&self) -> f64 {
        self.latent_heat
    }

    fn equilibrium_fraction(&self) -> f64 {
        self.equilibrium_fraction
    }
}

// ============================================================
// 测试
// ============================================================
