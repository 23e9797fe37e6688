// crates/am_physics/src/submodels/brownian.rs

//! Stokes–Einstein 布朗扩散闭合
//!
//! $$ D = \frac{k_B T\, C_c(d)}{3 \pi \mu d} $$
//!
//! 其中 Cunningham 滑移修正
//! $C_c = 1 + Kn\,(1.257 + 0.4\,e^{-1.1/Kn})$，$Kn = 2\lambda/d$。
//! 亚微米粒子的 Kn 修正可达一个量级以上，不可省略。

use am_foundation::{AmError, AmResult};

use super::{DiffusivityClosure, BOLTZMANN};
use crate::thermo::AerosolThermo;

/// Stokes–Einstein 扩散闭合
#[derive(Debug, Clone)]
pub struct StokesEinstein {
    /// 气体分子平均自由程 [m]
    mean_free_path: f64,
}

impl StokesEinstein {
    /// 创建闭合
    pub fn new(mean_free_path: f64) -> Self {
        debug_assert!(mean_free_path > 0.0);
        Self { mean_free_path }
    }

    /// Cunningham 滑移修正系数
    #[inline]
    pub fn cunningham(&self, d: f64) -> f64 {
        let kn = 2.0 * self.mean_free_path / d;
        1.0 + kn * (1.257 + 0.4 * (-1.1 / kn).exp())
    }
}

impl DiffusivityClosure for StokesEinstein {
    fn name(&self) -> &'static str {
        "stokes_einstein"
    }

    fn diffusivity(&self, d: &[f64], thermo: &AerosolThermo) -> AmResult<Vec<f64>> {
        AmError::check_size("diameter", thermo.n_cells(), d.len())?;

        let diff = (0..thermo.n_cells())
            .map(|i| {
                let di = d[i];
                let cc = self.cunningham(di);
                BOLTZMANN * thermo.temperature[i] * cc
                    / (3.0 * std::f64::consts::PI * thermo.mu[i] * di)
            })
            .collect();

        Ok(diff)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cunningham_limits() {
        let se = StokesEinstein::new(6.8e-8);
        // 大粒子: Kn → 0, Cc → 1
        assert!((se.cunningham(1e-4) - 1.0).abs() < 1e-2);
        // 小粒子: 修正显著大于 1
        assert!(se.cunningham(1e-8) > 10.0);
    }

    #[test]
    fn test_diffusivity_decreases_with_size() {
        let se = StokesEinstein::new(6.8e-8);
        let thermo = AerosolThermo::uniform(3, 1.2, 1000.0, 1.8e-5, 293.15);

        let d = se
            .diffusivity(&[1e-8, 1e-7, 1e-6], &thermo)
            .unwrap();
        assert!(d[0] > d[1]);
        assert!(d[1] > d[2]);
        assert!(d.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn test_diffusivity_magnitude() {
        // 0.1 µm 粒子在常温空气中 D ~ 1e-9 m²/s 量级
        let se = StokesEinstein::new(6.8e-8);
        let thermo = AerosolThermo::uniform(1, 1.2, 1000.0, 1.8e-5, 293.15);
        let d = se.diffusivity(&[1e-7], &thermo).unwrap();
        assert!(d[0] > 1e-10 && d[0] < 1e-8, "D={:e}", d[0]);
    }
}
