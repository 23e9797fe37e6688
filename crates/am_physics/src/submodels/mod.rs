// crates/am_physics/src/submodels/mod.rs

//! 物理子模型
//!
//! 气溶胶模型的可插拔物理闭合：漂移（惯性滑移 + 布朗扩散）、
//! 冷凝、成核、聚并。每个子模型以能力 trait 描述最小接口，
//! 由配置驱动的工厂函数按名构造；缺省（None）即该物理关闭。
//!
//! # 设计原则
//!
//! 1. **无状态调用**: 闭合仅持有配置系数，同一时间步内可带不同
//!    尺寸输入重复调用
//! 2. **显式工厂**: 名称到构造函数的封闭映射，不做运行时类型发现
//! 3. **独占所有权**: 模型以 `Option<Box<dyn Trait>>` 持有子模型

mod brownian;
mod coalescence;
mod condensation;
mod manninen;
mod nucleation;

pub use brownian::StokesEinstein;
pub use coalescence::BrownianCoalescence;
pub use condensation::RelaxationCondensation;
pub use manninen::Manninen;
pub use nucleation::ThresholdNucleation;

use am_config::{
    CoalescenceConfig, CondensationConfig, DriftConfig, InertialClosureKind, NucleationConfig,
};
use am_foundation::AmResult;
use glam::DVec3;

use crate::thermo::AerosolThermo;

/// 玻尔兹曼常数 [J/K]
pub const BOLTZMANN: f64 = 1.380649e-23;

// ============================================================
// 能力 trait
// ============================================================

/// 惯性漂移闭合
///
/// 给定粒径计算分散相相对连续相的滑移速度。纯函数：不修改共享场，
/// 同一步内可对不同尺寸矩重复调用。
pub trait DriftClosure: Send + Sync {
    /// 闭合名称
    fn name(&self) -> &'static str;

    /// 计算滑移速度场
    ///
    /// # 参数
    /// - `d`: 逐单元粒径 [m]
    /// - `size_name`: 尺寸场标识（区分同时存在的多个尺寸矩）
    /// - `thermo`: 两相热力学状态（只读）
    fn drift_velocity(
        &self,
        d: &[f64],
        size_name: &str,
        thermo: &AerosolThermo,
    ) -> AmResult<Vec<DVec3>>;
}

/// 布朗扩散闭合
pub trait DiffusivityClosure: Send + Sync {
    /// 闭合名称
    fn name(&self) -> &'static str;

    /// 逐单元分散相扩散系数 [m²/s]
    fn diffusivity(&self, d: &[f64], thermo: &AerosolThermo) -> AmResult<Vec<f64>>;
}

/// 冷凝模型
pub trait CondensationModel: Send + Sync {
    /// 模型名称
    fn name(&self) -> &'static str;

    /// 逐单元蒸气→液相质量迁移速率 [1/s]
    ///
    /// 正值冷凝，负值蒸发；对蒸气分数线性化。
    fn transfer_rate(&self, y_vapor: &[f64], thermo: &AerosolThermo) -> Vec<f64>;

    /// 特征弛豫速率 [1/s]，供局部时间尺度使用
    fn characteristic_rate(&self) -> f64;

    /// 比潜热 [J/kg]
    fn latent_heat(&self) -> f64;

    /// 平衡蒸气质量分数
    fn equilibrium_fraction(&self) -> f64;
}

/// 成核模型
pub trait NucleationModel: Send + Sync {
    /// 模型名称
    fn name(&self) -> &'static str;

    /// 逐单元新粒子质量分数生成速率 [1/s]
    fn nucleation_rate(&self, y_vapor: &[f64], thermo: &AerosolThermo) -> Vec<f64>;
}

/// 聚并模型
pub trait CoalescenceModel: Send + Sync {
    /// 模型名称
    fn name(&self) -> &'static str;

    /// 聚并核 K(d_i, d_j) [m³/s]
    fn kernel(&self, di: f64, dj: f64, temperature: f64, mu: f64) -> f64;

    /// 单分散近似下的碰撞速率 [1/s]
    fn collision_rate(&self, d: f64, number_density: f64, temperature: f64, mu: f64) -> f64 {
        0.5 * self.kernel(d, d, temperature, mu) * number_density
    }
}

// ============================================================
// 工厂
// ============================================================

/// 按配置构造惯性漂移闭合
pub fn new_drift_closure(config: &DriftConfig) -> AmResult<Option<Box<dyn DriftClosure>>> {
    if !config.enabled {
        return Ok(None);
    }
    match config.inertial {
        InertialClosureKind::Manninen => Ok(Some(Box::new(Manninen::from_config(config)))),
        InertialClosureKind::None => Ok(None),
    }
}

/// 按配置构造布朗扩散闭合
pub fn new_diffusivity_closure(config: &DriftConfig) -> Option<Box<dyn DiffusivityClosure>> {
    if config.enabled && config.brownian {
        Some(Box::new(StokesEinstein::new(config.mean_free_path)))
    } else {
        None
    }
}

/// 按配置构造冷凝模型
pub fn new_condensation_model(
    config: &CondensationConfig,
) -> Option<Box<dyn CondensationModel>> {
    if config.enabled {
        Some(Box::new(RelaxationCondensation::from_config(config)))
    } else {
        None
    }
}

/// 按配置构造成核模型
///
/// 临界蒸气分数由临界过饱和度与冷凝平衡分数组合得到。
pub fn new_nucleation_model(
    config: &NucleationConfig,
    condensation: &CondensationConfig,
) -> Option<Box<dyn NucleationModel>> {
    if config.enabled {
        let y_crit = config.critical_saturation * condensation.equilibrium_fraction;
        Some(Box::new(ThresholdNucleation::new(
            config.rate_coefficient,
            y_crit,
        )))
    } else {
        None
    }
}

/// 按配置构造聚并模型
pub fn new_coalescence_model(config: &CoalescenceConfig) -> Option<Box<dyn CoalescenceModel>> {
    if config.enabled {
        Some(Box::new(BrownianCoalescence::new(config.efficiency)))
    } else {
        None
    }
}

// ============================================================
// 测试
// ============================================================
