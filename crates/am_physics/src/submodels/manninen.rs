// crates/am_physics/src/submodels/manninen.rs

//! Manninen 型惯性滑移闭合
//!
//! Stokes 阻力平衡下的相对速度：
//!
//! $$ \vec{V} = \frac{(\rho_d - \rho_c)\, d^2}{18\, \mu_c\, f_D}\, \vec{g} $$
//!
//! 滑移速度随粒径平方增长，随相密度差线性增长，随连续相粘度
//! 反比减小。`f_D` 为非 Stokes 区阻力修正系数（1 = 纯 Stokes）。

use am_config::DriftConfig;
use am_foundation::{AmError, AmResult};
use glam::DVec3;

use super::DriftClosure;
use crate::thermo::AerosolThermo;

/// Manninen 型惯性闭合
#[derive(Debug, Clone)]
pub struct Manninen {
    /// 重力/体积力加速度
    gravity: DVec3,
    /// 阻力修正系数
    drag_correction: f64,
}

impl Manninen {
    /// 创建闭合
    pub fn new(gravity: DVec3, drag_correction: f64) -> Self {
        debug_assert!(drag_correction > 0.0);
        Self {
            gravity,
            drag_correction,
        }
    }

    /// 从漂移配置创建
    pub fn from_config(config: &DriftConfig) -> Self {
        Self::new(DVec3::from_array(config.gravity), config.drag_correction)
    }
}

impl DriftClosure for Manninen {
    fn name(&self) -> &'static str {
        "manninen"
    }

    fn drift_velocity(
        &self,
        d: &[f64],
        size_name: &str,
        thermo: &AerosolThermo,
    ) -> AmResult<Vec<DVec3>> {
        AmError::check_size("diameter", thermo.n_cells(), d.len())?;

        tracing::trace!(size = size_name, "计算惯性滑移速度");

        let v = (0..thermo.n_cells())
            .map(|i| {
                let rho_c = thermo.rho_cont[i];
                let rho_d = thermo.rho_disp[i];
                let mu = thermo.mu[i];
                let di = d[i];

                let tau = (rho_d - rho_c) * di * di / (18.0 * mu * self.drag_correction);
                self.gravity * tau
            })
            .collect();

        Ok(v)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn thermo(n: usize) -> AerosolThermo {
        AerosolThermo::uniform(n, 1.2, 1000.0, 1.8e-5, 293.15)
    }

    #[test]
    fn test_drift_velocity_direction() {
        let m = Manninen::new(DVec3::new(0.0, 0.0, -9.81), 1.0);
        let thermo = thermo(3);
        let v = m.drift_velocity(&[1e-6; 3], "d_mean", &thermo).unwrap();

        // 液滴比载气重：沿重力方向沉降
        assert!(v[0].z < 0.0);
        assert!((v[0].x).abs() < 1e-18);
    }

    #[test]
    fn test_quadratic_size_scaling() {
        // 粒径加倍，其余不变：滑移速度放大 4 倍（Stokes 平方律）
        let m = Manninen::new(DVec3::new(0.0, 0.0, -9.81), 1.0);
        let thermo = thermo(2);

        let v = m
            .drift_velocity(&[1e-6, 2e-6], "d_mean", &thermo)
            .unwrap();

        let ratio = v[1].length() / v[0].length();
        assert!(
            (ratio - 4.0).abs() < 1e-10,
            "平方律失效: ratio={}",
            ratio
        );
    }

    #[test]
    fn test_stokes_magnitude() {
        // 1 µm 水滴在空气中的 Stokes 沉降速度量级 ~ 3e-5 m/s
        let m = Manninen::new(DVec3::new(0.0, 0.0, -9.81), 1.0);
        let thermo = thermo(1);
        let v = m.drift_velocity(&[1e-6], "d_mean", &thermo).unwrap();

        let expect = (1000.0 - 1.2) * 1e-12 * 9.81 / (18.0 * 1.8e-5);
        assert!((v[0].length() - expect).abs() / expect < 1e-12);
    }

    #[test]
    fn test_drag_correction_reduces_slip() {
        let thermo = thermo(1);
        let stokes = Manninen::new(DVec3::new(0.0, 0.0, -9.81), 1.0);
        let corrected = Manninen::new(DVec3::new(0.0, 0.0, -9.81), 2.0);

        let v0 = stokes.drift_velocity(&[1e-6], "d", &thermo).unwrap();
        let v1 = corrected.drift_velocity(&[1e-6], "d", &thermo).unwrap();
        assert!((v1[0].length() - 0.5 * v0[0].length()).abs() < 1e-18);
    }

    #[test]
    fn test_size_mismatch() {
        let m = Manninen::new(DVec3::Z, 1.0);
        let thermo = thermo(3);
        assert!(m.drift_velocity(&[1e-6; 2], "d", &thermo).is_err());
    }
}
