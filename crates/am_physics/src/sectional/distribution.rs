// crates/am_physics/src/sectional/distribution.rs

//! 分区分布
//!
//! 把连续尺寸空间离散为有序分区序列，提供区间搜索、代表尺寸
//! 插值定位与矩统计。
//!
//! # 不变式
//!
//! - 边界数组 `y` 严格递增，`y.len() = x.len() + 1`
//! - 相邻分区无缝拼接：分区 i 的上边界即分区 i+1 的下边界
//! - 代表尺寸 `x[i] ∈ (y[i], y[i+1])`
//!
//! 分区数量级为几十而非百万，搜索用有序数组二分，正确性与
//! 可读性优先。构造后只读，可跨线程共享。

use am_config::{SectionSpacing, SectionalConfig};
use am_foundation::{AmError, AmResult};

use super::section::Section;

/// 尺寸坐标量纲
///
/// 分区离散可建立在不同的内部坐标上；消费方用
/// [`SectionalDistribution::check_dimension`] 做一致性校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDimension {
    /// 直径 [m]
    Diameter,
    /// 体积 [m³]
    Volume,
}

impl SizeDimension {
    /// 量纲名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Diameter => "diameter",
            Self::Volume => "volume",
        }
    }
}

/// 分区分布
#[derive(Debug, Clone)]
pub struct SectionalDistribution {
    /// 分区序列（独占所有权，构造后只读）
    sections: Vec<Section>,
    /// 代表尺寸缓存
    x: Vec<f64>,
    /// 边界缓存（比 x 多一个元素）
    y: Vec<f64>,
    /// 尺寸坐标量纲
    dimension: SizeDimension,
}

impl SectionalDistribution {
    // =========================================================================
    // 构造
    // =========================================================================

    /// 从边界数组构造，代表尺寸取区间中点
    pub fn from_edges(edges: &[f64]) -> AmResult<Self> {
        if edges.len() < 2 {
            return Err(AmError::config(format!(
                "分区边界至少需要 2 个值，实际 {}",
                edges.len()
            )));
        }
        for w in edges.windows(2) {
            if !(w[1] > w[0]) {
                return Err(AmError::config(format!(
                    "分区边界必须严格递增: {:e} -> {:e}",
                    w[0], w[1]
                )));
            }
        }

        let sections: Vec<Section> = edges
            .windows(2)
            .map(|w| Section::new(0.5 * (w[0] + w[1]), w[0], w[1]))
            .collect::<AmResult<_>>()?;

        Ok(Self::from_parts(sections, edges.to_vec()))
    }

    /// 从配置构造
    pub fn from_config(config: &SectionalConfig) -> AmResult<Self> {
        match config.spacing {
            SectionSpacing::Explicit => Self::from_edges(&config.edges),
            SectionSpacing::Linear => {
                let n = config.n_sections;
                let dy = (config.y_max - config.y_min) / n as f64;
                let edges: Vec<f64> = (0..=n).map(|i| config.y_min + i as f64 * dy).collect();
                Self::from_edges(&edges)
            }
            SectionSpacing::Logarithmic => {
                if config.y_min <= 0.0 {
                    return Err(AmError::config("对数间隔要求 y_min > 0"));
                }
                let n = config.n_sections;
                let ratio = (config.y_max / config.y_min).ln() / n as f64;
                let edges: Vec<f64> = (0..=n)
                    .map(|i| config.y_min * (ratio * i as f64).exp())
                    .collect();
                Self::from_edges(&edges)
            }
        }
    }

    fn from_parts(sections: Vec<Section>, y: Vec<f64>) -> Self {
        let x = sections.iter().map(|s| s.x()).collect();
        Self {
            sections,
            x,
            y,
            dimension: SizeDimension::Diameter,
        }
    }

    /// 改用指定尺寸量纲
    pub fn with_dimension(mut self, dimension: SizeDimension) -> Self {
        self.dimension = dimension;
        self
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 分区数量
    #[inline]
    pub fn n_sections(&self) -> usize {
        self.sections.len()
    }

    /// 分区序列
    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// 代表尺寸数组
    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// 边界数组
    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// 尺寸域下界
    #[inline]
    pub fn y_min(&self) -> f64 {
        self.y[0]
    }

    /// 尺寸域上界
    #[inline]
    pub fn y_max(&self) -> f64 {
        self.y[self.y.len() - 1]
    }

    /// 最小代表尺寸
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    /// 最大代表尺寸
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// 尺寸坐标量纲
    #[inline]
    pub fn dimension(&self) -> SizeDimension {
        self.dimension
    }

    /// 量纲一致性校验
    pub fn check_dimension(&self, expected: SizeDimension) -> AmResult<()> {
        if self.dimension != expected {
            return Err(AmError::config(format!(
                "分区尺寸量纲不匹配: 期望 {}, 实际 {}",
                expected.name(),
                self.dimension.name()
            )));
        }
        Ok(())
    }

    /// 分区对应的输运场名称
    pub fn section_field_name(&self, i: usize) -> String {
        format!("z_{}", i)
    }

    // =========================================================================
    // 搜索
    // =========================================================================

    /// 搜索包含给定尺寸的分区编号
    ///
    /// 有效域为 `[y_min, y_max]`；`s == y_max` 归入最后一个分区。
    /// 域外为调用方错误，返回 OutOfRange。
    pub fn search(&self, s: f64) -> AmResult<usize> {
        if s < self.y_min() || s > self.y_max() {
            return Err(AmError::out_of_range("size", s, self.y_min(), self.y_max()));
        }
        // 边界数组中 <= s 的个数减一即分区号
        let idx = self.y.partition_point(|&e| e <= s);
        Ok(idx.saturating_sub(1).min(self.n_sections() - 1))
    }

    /// 搜索代表尺寸不超过 s 的最大分区编号
    ///
    /// 用于代表尺寸间插值的左锚点定位。`s < x_min` 时无左锚点，
    /// 返回 OutOfRange。
    pub fn search_lower(&self, s: f64) -> AmResult<usize> {
        if s < self.x_min() {
            return Err(AmError::out_of_range("size", s, self.x_min(), self.x_max()));
        }
        let idx = self.x.partition_point(|&xi| xi <= s);
        Ok((idx - 1).min(self.n_sections() - 1))
    }

    /// 查找代表尺寸最接近 s 的分区
    ///
    /// `soft = false` 时 s 超出 `[x_min, x_max]` 报 OutOfRange；
    /// `soft = true` 时钳位到边界分区。
    pub fn find_nearest(&self, s: f64, soft: bool) -> AmResult<usize> {
        if s < self.x_min() {
            return self.clamp_or_fail(s, 0, soft);
        }
        if s > self.x_max() {
            return self.clamp_or_fail(s, self.n_sections() - 1, soft);
        }

        let lower = self.search_lower(s)?;
        if lower + 1 >= self.n_sections() {
            return Ok(lower);
        }
        if s - self.x[lower] <= self.x[lower + 1] - s {
            Ok(lower)
        } else {
            Ok(lower + 1)
        }
    }

    /// 查找代表尺寸紧邻 s 下方（含相等）的分区
    pub fn find_lower(&self, s: f64, soft: bool) -> AmResult<usize> {
        if s < self.x_min() {
            return self.clamp_or_fail(s, 0, soft);
        }
        self.search_lower(s)
    }

    /// 查找代表尺寸紧邻 s 上方（含相等）的分区
    pub fn find_upper(&self, s: f64, soft: bool) -> AmResult<usize> {
        if s > self.x_max() {
            return self.clamp_or_fail(s, self.n_sections() - 1, soft);
        }
        if s <= self.x_min() {
            return Ok(0);
        }
        // 第一个代表尺寸 >= s 的分区
        Ok(self.x.partition_point(|&xi| xi < s))
    }

    fn clamp_or_fail(&self, s: f64, clamp_to: usize, soft: bool) -> AmResult<usize> {
        if soft {
            Ok(clamp_to)
        } else {
            Err(AmError::out_of_range("size", s, self.x_min(), self.x_max()))
        }
    }

    // =========================================================================
    // 矩统计
    // =========================================================================

    /// p 阶矩：Σ w_i · x_i^p
    pub fn moment(&self, weights: &[f64], p: f64) -> f64 {
        debug_assert_eq!(weights.len(), self.n_sections());
        self.x
            .iter()
            .zip(weights)
            .map(|(&xi, &wi)| wi * xi.powf(p))
            .sum()
    }

    /// p 阶矩中位尺寸
    ///
    /// 给定逐分区权重（质量或数量），求累计 p 阶矩达到总量一半处的
    /// 尺寸。每个分区的矩视为集中在其代表尺寸处的点质量，累计函数
    /// 在代表尺寸处取到"此前全部 + 本分区一半"，随后在相邻代表
    /// 尺寸间线性插值，因此单分区点质量分布的中位数严格等于该
    /// 分区的代表尺寸。
    ///
    /// 退化情形（总矩为零）返回 `x_min` 哨兵值而非失败。
    pub fn median(&self, weights: &[f64], p: f64) -> f64 {
        debug_assert_eq!(weights.len(), self.n_sections());

        let n = self.n_sections();
        let m: Vec<f64> = (0..n).map(|i| weights[i] * self.x[i].powf(p)).collect();
        let total: f64 = m.iter().sum();

        if !(total > 0.0) {
            return self.x_min();
        }
        let half = 0.5 * total;

        // 累计到各代表尺寸处的矩（含本分区一半）
        let mut cum_mid = Vec::with_capacity(n);
        let mut cum = 0.0;
        for &mi in &m {
            cum_mid.push(cum + 0.5 * mi);
            cum += mi;
        }

        if half <= cum_mid[0] {
            return self.x[0];
        }
        if half >= cum_mid[n - 1] {
            return self.x[n - 1];
        }

        // 定位包夹区间 (k, k+1) 并线性插值
        let k = cum_mid.partition_point(|&c| c <= half) - 1;
        let span = cum_mid[k + 1] - cum_mid[k];
        let t = if span > 0.0 { (half - cum_mid[k]) / span } else { 0.0 };
        self.x[k] + t * (self.x[k + 1] - self.x[k])
    }
}

// ============================================================================
// 测试
// ============================================================================
