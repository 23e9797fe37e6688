// crates/am_config/src/aerosol_config.rs

//! AerosolConfig - 气溶胶模型配置（全 f64）
//!
//! 定义气溶胶求解所需的全部配置参数，使用纯 f64 类型存储，
//! 便于 JSON 序列化与跨层传递。
//!
//! 配置树对应关系：
//! - 模型选择器（分区法 / 两矩对数正态法）
//! - 分区离散（显式边界或对数等比间隔）
//! - 允许粒径范围 d_min/d_max 与残余相分数
//! - 各物理子模型（漂移、冷凝、成核、聚并）的开关与系数
//! - 局部时间尺度的平滑参数

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// 气溶胶模型类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AerosolModelKind {
    /// 固定分区法：按尺寸区间离散求解 PBE
    #[default]
    FixedSectional,
    /// 两矩对数正态法：只跟踪数密度与质量两个矩
    TwoMomentLogNormal,
}

impl AerosolModelKind {
    /// 获取模型名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::FixedSectional => "fixed_sectional",
            Self::TwoMomentLogNormal => "two_moment_log_normal",
        }
    }
}

/// 分区间隔方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SectionSpacing {
    /// 对数等比间隔（气溶胶粒径跨多个量级时的常规选择）
    #[default]
    Logarithmic,
    /// 线性等距间隔
    Linear,
    /// 显式给定全部边界
    Explicit,
}

/// 分区离散配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionalConfig {
    /// 间隔方式
    #[serde(default)]
    pub spacing: SectionSpacing,

    /// 分区数量（Explicit 模式下忽略）
    #[serde(default = "default_n_sections")]
    pub n_sections: usize,

    /// 尺寸域下界 [m]（Explicit 模式下忽略）
    #[serde(default = "default_y_min")]
    pub y_min: f64,

    /// 尺寸域上界 [m]（Explicit 模式下忽略）
    #[serde(default = "default_y_max")]
    pub y_max: f64,

    /// 显式边界列表（严格递增，长度 = 分区数 + 1）
    #[serde(default)]
    pub edges: Vec<f64>,
}

fn default_n_sections() -> usize { 30 }
fn default_y_min() -> f64 { 1e-9 }
fn default_y_max() -> f64 { 1e-5 }

impl Default for SectionalConfig {
    fn default() -> Self {
        Self {
            spacing: SectionSpacing::default(),
            n_sections: default_n_sections(),
            y_min: default_y_min(),
            y_max: default_y_max(),
            edges: Vec::new(),
        }
    }
}

/// 惯性漂移闭合模型类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InertialClosureKind {
    /// Manninen 型滑移速度（Stokes 阻力平衡）
    #[default]
    Manninen,
    /// 关闭惯性漂移
    None,
}

/// 漂移通量配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftConfig {
    /// 是否启用漂移修正
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 惯性闭合模型
    #[serde(default)]
    pub inertial: InertialClosureKind,

    /// 重力/体积力加速度 [m/s²]
    #[serde(default = "default_gravity")]
    pub gravity: [f64; 3],

    /// 非 Stokes 区阻力修正系数（1.0 = 纯 Stokes）
    #[serde(default = "default_drag_correction")]
    pub drag_correction: f64,

    /// 是否启用布朗扩散贡献
    #[serde(default = "default_true")]
    pub brownian: bool,

    /// 气体分子平均自由程 [m]（Cunningham 滑移修正用）
    #[serde(default = "default_mean_free_path")]
    pub mean_free_path: f64,
}

fn default_true() -> bool { true }
fn default_gravity() -> [f64; 3] { [0.0, 0.0, -9.81] }
fn default_drag_correction() -> f64 { 1.0 }
fn default_mean_free_path() -> f64 { 6.8e-8 }

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inertial: InertialClosureKind::default(),
            gravity: default_gravity(),
            drag_correction: default_drag_correction(),
            brownian: true,
            mean_free_path: default_mean_free_path(),
        }
    }
}

/// 冷凝模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondensationConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,

    /// 质量迁移速率系数 [1/s]
    ///
    /// 线性化弛豫模型 dY/dt = k (Y_eq - Y) 的系数 k。
    #[serde(default = "default_rate_coefficient")]
    pub rate_coefficient: f64,

    /// 平衡蒸气质量分数
    #[serde(default = "default_y_eq")]
    pub equilibrium_fraction: f64,

    /// 比潜热 [J/kg]
    #[serde(default = "default_latent_heat")]
    pub latent_heat: f64,
}

fn default_rate_coefficient() -> f64 { 10.0 }
fn default_y_eq() -> f64 { 0.01 }
fn default_latent_heat() -> f64 { 2.45e6 }

impl Default for CondensationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_coefficient: default_rate_coefficient(),
            equilibrium_fraction: default_y_eq(),
            latent_heat: default_latent_heat(),
        }
    }
}

/// 成核模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NucleationConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,

    /// 成核速率系数 [kg/(m³·s)]
    #[serde(default = "default_nucleation_rate")]
    pub rate_coefficient: f64,

    /// 临界过饱和度（低于此值不成核）
    #[serde(default = "default_critical_saturation")]
    pub critical_saturation: f64,
}

fn default_nucleation_rate() -> f64 { 1e-6 }
fn default_critical_saturation() -> f64 { 1.0 }

impl Default for NucleationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate_coefficient: default_nucleation_rate(),
            critical_saturation: default_critical_saturation(),
        }
    }
}

/// 聚并模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoalescenceConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,

    /// 碰撞效率（0-1）
    #[serde(default = "default_efficiency")]
    pub efficiency: f64,
}

fn default_efficiency() -> f64 { 1.0 }

impl Default for CoalescenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            efficiency: default_efficiency(),
        }
    }
}

/// 多变量对流格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConvectionSchemeKind {
    /// 一阶迎风格式：简单稳定，数值扩散较大
    #[default]
    FirstOrderUpwind,
    /// 迎风/中心混合格式
    BlendedCentral,
}

/// 多变量输运配置
///
/// 整组质量分数场共用同一插值/限制格式，保持代数关系（和为 1）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// 对流格式
    #[serde(default)]
    pub scheme: ConvectionSchemeKind,

    /// 中心格式混合比（0 = 纯迎风，1 = 纯中心）
    #[serde(default = "default_blend")]
    pub blend: f64,

    /// 是否钳位并归一化分数场
    #[serde(default = "default_true")]
    pub clip: bool,
}

fn default_blend() -> f64 { 0.5 }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            scheme: ConvectionSchemeKind::default(),
            blend: default_blend(),
            clip: true,
        }
    }
}

/// 两矩对数正态模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogNormalConfig {
    /// 几何标准差 σ_g（> 1，两矩方法下固定）
    #[serde(default = "default_sigma_g")]
    pub sigma_g: f64,
}

fn default_sigma_g() -> f64 { 1.5 }

impl Default for LogNormalConfig {
    fn default() -> Self {
        Self {
            sigma_g: default_sigma_g(),
        }
    }
}

/// 局部时间尺度配置
///
/// 气溶胶子物理的特征速率可能远快于（或慢于）主流场时间步，
/// 通过逐单元倒数时间步局部子循环求解。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeScaleConfig {
    /// 速率上限 [1/s]（用户给定的天花板）
    #[serde(default = "default_rate_max")]
    pub rate_max: f64,

    /// 相邻单元速率的有界增长因子（> 1）
    ///
    /// 平滑系数是可调参数，并无普适默认值；取值越接近 1 场越平滑。
    #[serde(default = "default_smoothing_factor")]
    pub smoothing_factor: f64,

    /// 平滑扫描次数
    #[serde(default = "default_smoothing_sweeps")]
    pub smoothing_sweeps: usize,
}

fn default_rate_max() -> f64 { 1e4 }
fn default_smoothing_factor() -> f64 { 1.2 }
fn default_smoothing_sweeps() -> usize { 2 }

impl Default for TimeScaleConfig {
    fn default() -> Self {
        Self {
            rate_max: default_rate_max(),
            smoothing_factor: default_smoothing_factor(),
            smoothing_sweeps: default_smoothing_sweeps(),
        }
    }
}

/// 气溶胶模型配置（全 f64）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AerosolConfig {
    /// 模型类型
    #[serde(default)]
    pub model: AerosolModelKind,

    /// 最小允许粒径 [m]
    #[serde(default = "default_d_min")]
    pub d_min: f64,

    /// 最大允许粒径 [m]
    #[serde(default = "default_d_max")]
    pub d_max: f64,

    /// 残余相分数（近零分散相分数的正则化下限）
    #[serde(default = "default_residual_alpha")]
    pub residual_alpha: f64,

    /// 分区离散
    #[serde(default)]
    pub sections: SectionalConfig,

    /// 漂移通量
    #[serde(default)]
    pub drift: DriftConfig,

    /// 冷凝
    #[serde(default)]
    pub condensation: CondensationConfig,

    /// 成核
    #[serde(default)]
    pub nucleation: NucleationConfig,

    /// 聚并
    #[serde(default)]
    pub coalescence: CoalescenceConfig,

    /// 局部时间尺度
    #[serde(default)]
    pub time_scale: TimeScaleConfig,

    /// 多变量输运
    #[serde(default)]
    pub transport: TransportConfig,

    /// 两矩对数正态模型参数
    #[serde(default)]
    pub log_normal: LogNormalConfig,
}

fn default_d_min() -> f64 { 1e-9 }
fn default_d_max() -> f64 { 1e-5 }
fn default_residual_alpha() -> f64 { 1e-10 }

impl Default for AerosolConfig {
    fn default() -> Self {
        Self {
            model: AerosolModelKind::default(),
            d_min: default_d_min(),
            d_max: default_d_max(),
            residual_alpha: default_residual_alpha(),
            sections: SectionalConfig::default(),
            drift: DriftConfig::default(),
            condensation: CondensationConfig::default(),
            nucleation: NucleationConfig::default(),
            coalescence: CoalescenceConfig::default(),
            time_scale: TimeScaleConfig::default(),
            transport: TransportConfig::default(),
            log_normal: LogNormalConfig::default(),
        }
    }
}

impl AerosolConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;

        let config: AerosolConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 粒径范围
        if self.d_min <= 0.0 {
            return Err(ConfigError::invalid("d_min", self.d_min, "必须为正"));
        }
        if self.d_max <= self.d_min {
            return Err(ConfigError::invalid(
                "d_max",
                self.d_max,
                "必须大于 d_min",
            ));
        }

        // 残余相分数
        if self.residual_alpha <= 0.0 {
            return Err(ConfigError::invalid(
                "residual_alpha",
                self.residual_alpha,
                "必须为正",
            ));
        }

        // 分区离散
        match self.sections.spacing {
            SectionSpacing::Explicit => {
                if self.sections.edges.len() < 2 {
                    return Err(ConfigError::invalid(
                        "sections.edges",
                        self.sections.edges.len(),
                        "显式边界至少需要 2 个值",
                    ));
                }
                for w in self.sections.edges.windows(2) {
                    if w[1] <= w[0] {
                        return Err(ConfigError::invalid(
                            "sections.edges",
                            format!("{:e} -> {:e}", w[0], w[1]),
                            "边界必须严格递增",
                        ));
                    }
                }
            }
            SectionSpacing::Logarithmic | SectionSpacing::Linear => {
                if self.sections.n_sections == 0 {
                    return Err(ConfigError::invalid(
                        "sections.n_sections",
                        self.sections.n_sections,
                        "分区数必须为正",
                    ));
                }
                if self.sections.y_min <= 0.0 || self.sections.y_max <= self.sections.y_min {
                    return Err(ConfigError::invalid(
                        "sections.y_min/y_max",
                        format!("[{:e}, {:e}]", self.sections.y_min, self.sections.y_max),
                        "需要 0 < y_min < y_max",
                    ));
                }
            }
        }

        // 漂移系数
        if self.drift.drag_correction <= 0.0 {
            return Err(ConfigError::invalid(
                "drift.drag_correction",
                self.drift.drag_correction,
                "必须为正",
            ));
        }
        if self.drift.mean_free_path <= 0.0 {
            return Err(ConfigError::invalid(
                "drift.mean_free_path",
                self.drift.mean_free_path,
                "必须为正",
            ));
        }

        // 聚并效率
        if !(0.0..=1.0).contains(&self.coalescence.efficiency) {
            return Err(ConfigError::invalid(
                "coalescence.efficiency",
                self.coalescence.efficiency,
                "必须在 [0, 1] 内",
            ));
        }

        // 时间尺度平滑
        if self.time_scale.smoothing_factor <= 1.0 {
            return Err(ConfigError::invalid(
                "time_scale.smoothing_factor",
                self.time_scale.smoothing_factor,
                "增长因子必须大于 1",
            ));
        }
        if self.time_scale.rate_max <= 0.0 {
            return Err(ConfigError::invalid(
                "time_scale.rate_max",
                self.time_scale.rate_max,
                "必须为正",
            ));
        }

        // 输运混合比
        if !(0.0..=1.0).contains(&self.transport.blend) {
            return Err(ConfigError::invalid(
                "transport.blend",
                self.transport.blend,
                "必须在 [0, 1] 内",
            ));
        }

        // 对数正态几何标准差
        if self.log_normal.sigma_g <= 1.0 {
            return Err(ConfigError::invalid(
                "log_normal.sigma_g",
                self.log_normal.sigma_g,
                "几何标准差必须大于 1",
            ));
        }

        Ok(())
    }
}
