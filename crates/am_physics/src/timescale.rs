// crates/am_physics/src/timescale.rs

//! 局部时间尺度
//!
//! 冷凝/聚并的特征速率可能比主流场时间步快几个量级，强行统一
//! 步长会把整个模拟拖到最快的局部速率。此处为每个单元计算倒数
//! 时间步 rΔt（活跃子模型最大特征速率，带用户上限），并做相邻
//! 单元有界增长的空间平滑，避免尖锐间断破坏耦合求解稳定性。
//!
//! 平滑只抬升、从不压低：保证刚性区域的速率不被平均掉，
//! 同时周边单元逐渐过渡。

use am_config::TimeScaleConfig;
use rayon::prelude::*;

use crate::mesh::AerosolMesh;

/// 局部时间尺度计算器
#[derive(Debug, Clone)]
pub struct LocalTimeScale {
    /// 速率上限 [1/s]
    rate_max: f64,
    /// 相邻单元有界增长因子（> 1）
    smoothing_factor: f64,
    /// 平滑扫描次数
    sweeps: usize,
}

impl LocalTimeScale {
    /// 从配置创建
    pub fn from_config(config: &TimeScaleConfig) -> Self {
        Self {
            rate_max: config.rate_max,
            smoothing_factor: config.smoothing_factor,
            sweeps: config.smoothing_sweeps,
        }
    }

    /// 合并多个子模型的逐单元速率（取最大）
    pub fn combine_rates(n_cells: usize, contributions: &[&[f64]]) -> Vec<f64> {
        (0..n_cells)
            .into_par_iter()
            .map(|i| {
                contributions
                    .iter()
                    .map(|c| c[i].abs())
                    .fold(0.0f64, f64::max)
            })
            .collect()
    }

    /// 计算平滑后的倒数时间步场
    ///
    /// 原始速率先钳位到 `[0, rate_max]`，随后逐面扫描：任一面两侧
    /// 单元的速率比不超过平滑因子。
    pub fn rdelta_t(&self, mesh: &AerosolMesh, raw_rates: &[f64]) -> Vec<f64> {
        debug_assert_eq!(raw_rates.len(), mesh.n_cells());

        let mut r: Vec<f64> = raw_rates
            .iter()
            .map(|&v| v.clamp(0.0, self.rate_max))
            .collect();

        // 面扫描有数据依赖，串行执行；单元数几万以内代价可忽略
        for _ in 0..self.sweeps {
            for f in mesh.interior_faces() {
                let o = mesh.owner(f);
                let n = mesh.neighbor(f).expect("内部面必有 neighbour");

                let hi = r[o].max(r[n]);
                let lo = hi / self.smoothing_factor;
                if r[o] < lo {
                    r[o] = lo;
                }
                if r[n] < lo {
                    r[n] = lo;
                }
            }
        }

        r
    }

    /// 给定全局步长与局部速率，建议的子循环数
    pub fn subcycles(dt: f64, rate: f64) -> usize {
        ((dt * rate).ceil() as usize).max(1)
    }

    /// 速率上限
    pub fn rate_max(&self) -> f64 {
        self.rate_max
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn timescale(factor: f64, sweeps: usize) -> LocalTimeScale {
        LocalTimeScale {
            rate_max: 1e4,
            smoothing_factor: factor,
            sweeps,
        }
    }

    #[test]
    fn test_rate_ceiling_applied() {
        let mesh = AerosolMesh::uniform_line(3, 0.1, 0.01);
        let ts = timescale(2.0, 2);
        let r = ts.rdelta_t(&mesh, &[1e9, 0.0, 5.0]);
        assert!(r[0] <= 1e4 + 1e-9);
        assert!(r.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_spike_spreads_with_bounded_decay() {
        let mesh = AerosolMesh::uniform_line(5, 0.1, 0.01);
        let ts = timescale(2.0, 4);

        let mut raw = vec![0.0; 5];
        raw[2] = 800.0;
        let r = ts.rdelta_t(&mesh, &raw);

        // 尖峰保持
        assert!((r[2] - 800.0).abs() < 1e-9);
        // 相邻单元被抬升到 1/factor
        assert!((r[1] - 400.0).abs() < 1e-9);
        assert!((r[3] - 400.0).abs() < 1e-9);
        assert!((r[0] - 200.0).abs() < 1e-9);
        assert!((r[4] - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_neighbor_ratio_bounded() {
        let mesh = AerosolMesh::uniform_line(8, 0.1, 0.01);
        let ts = timescale(1.5, 8);

        let raw: Vec<f64> = (0..8).map(|i| if i == 5 { 1000.0 } else { 1.0 }).collect();
        let r = ts.rdelta_t(&mesh, &raw);

        for f in mesh.interior_faces() {
            let o = mesh.owner(f);
            let n = mesh.neighbor(f).unwrap();
            let ratio = r[o].max(r[n]) / r[o].min(r[n]).max(1e-30);
            assert!(
                ratio <= 1.5 + 1e-9,
                "面 {} 两侧速率比 {} 超过平滑因子",
                f,
                ratio
            );
        }
    }

    #[test]
    fn test_smoothing_never_reduces() {
        let mesh = AerosolMesh::uniform_line(5, 0.1, 0.01);
        let ts = timescale(1.2, 3);
        let raw = vec![3.0, 100.0, 7.0, 50.0, 1.0];
        let r = ts.rdelta_t(&mesh, &raw);
        for i in 0..5 {
            assert!(r[i] >= raw[i] - 1e-12, "平滑压低了单元 {} 的速率", i);
        }
    }

    #[test]
    fn test_combine_rates() {
        let a = vec![1.0, 5.0, 0.0];
        let b = vec![2.0, 1.0, -7.0];
        let r = LocalTimeScale::combine_rates(3, &[&a, &b]);
        assert_eq!(r, vec![2.0, 5.0, 7.0]);
    }

    #[test]
    fn test_subcycles() {
        assert_eq!(LocalTimeScale::subcycles(0.1, 0.0), 1);
        assert_eq!(LocalTimeScale::subcycles(0.1, 35.0), 4);
    }
}
