// crates/am_physics/src/model/log_normal.rs

//! 两矩对数正态气溶胶模型
//!
//! 不离散尺寸空间，只输运分散相的两个矩：质量分数 z_disp 与
//! 数混合比 n_disp [1/kg]，假定粒径服从几何标准差固定的对数
//! 正态分布。k 阶矩满足
//!
//! $$ M_k = N\, d_g^k \exp\!\big(\tfrac{k^2}{2}\ln^2\sigma_g\big) $$
//!
//! 由 (z, n) 反解几何中值直径 d_g，各直径统计量解析可得：
//! - 矩比平均  d_{pq} = d_g · exp((p+q)·ln²σ_g / 2)
//! - p 矩中位数 d_med(p) = d_g · exp(p·ln²σ_g)

use std::sync::Arc;

use am_config::{AerosolConfig, AerosolModelKind};
use am_foundation::{AmError, AmResult};

use crate::fields::FieldMeta;
use crate::mesh::AerosolMesh;
use crate::model::{AerosolCore, AerosolModel, ImplicitSource};
use crate::thermo::AerosolThermo;

/// 两矩对数正态模型
pub struct TwoMomentLogNormalModel {
    core: AerosolCore,
    /// 分散相质量分数槽位
    z_slot: usize,
    /// 数混合比槽位
    n_slot: usize,
    /// ln²σ_g
    ln2_sigma: f64,
}

impl TwoMomentLogNormalModel {
    /// 从配置构造
    pub fn new(
        mesh: Arc<AerosolMesh>,
        thermo: AerosolThermo,
        config: AerosolConfig,
    ) -> AmResult<Self> {
        let sigma_g = config.log_normal.sigma_g;
        let ln2_sigma = sigma_g.ln() * sigma_g.ln();

        let metas = vec![
            FieldMeta::dispersed("z_disp"),
            FieldMeta::number("n_disp"),
        ];
        let core = AerosolCore::new(mesh, thermo, config, metas)?;

        let z_slot = core.table.slot("z_disp").expect("z_disp 必已登记");
        let n_slot = core.table.slot("n_disp").expect("n_disp 必已登记");

        Ok(Self {
            core,
            z_slot,
            n_slot,
            ln2_sigma,
        })
    }

    /// 设置均匀初始组成
    pub fn set_uniform_composition(
        &mut self,
        vapor: f64,
        z_disp: f64,
        n_disp: f64,
    ) -> AmResult<()> {
        AmError::check_range("vapor + z_disp", vapor + z_disp, 0.0, 1.0)?;

        let gas_slot = self.core.gas_slot();
        let vapor_slot = self.core.vapor_slot();
        self.core.state.field_mut(gas_slot).fill(1.0 - vapor - z_disp);
        self.core.state.field_mut(vapor_slot).fill(vapor);
        self.core.state.field_mut(self.z_slot).fill(z_disp);
        self.core.state.field_mut(self.n_slot).fill(n_disp);
        Ok(())
    }

    /// 逐单元几何中值直径 d_g
    ///
    /// 由体积平均直径 d_v³ = 6 z /(π ρ_d n) 与对数正态关系
    /// d_v³ = d_g³ exp(4.5 ln²σ) 反解。粒子数或质量退化为零时
    /// 返回 d_min 哨兵。
    pub fn geometric_diameter(&self) -> Vec<f64> {
        let n_cells = self.core.mesh.n_cells();
        let z = self.core.state.field(self.z_slot);
        let n = self.core.state.field(self.n_slot);
        let d_min = self.core.d_min();
        let d_max = self.core.d_max();

        (0..n_cells)
            .map(|i| {
                if z[i] <= 0.0 || n[i] <= 0.0 {
                    return d_min;
                }
                let rho_d = self.core.thermo.rho_disp[i];
                let v_mean = z[i] / (n[i] * rho_d);
                let d_v = (6.0 * v_mean / std::f64::consts::PI).cbrt();
                let d_g = d_v * (-1.5 * self.ln2_sigma).exp();
                d_g.clamp(d_min, d_max)
            })
            .collect()
    }

    /// 最小粒径处的单粒子质量
    fn nucleus_mass(&self, cell: usize) -> f64 {
        let d = self.core.d_min();
        self.core.thermo.rho_disp[cell] * std::f64::consts::FRAC_PI_6 * d * d * d
    }
}

impl AerosolModel for TwoMomentLogNormalModel {
    fn core(&self) -> &AerosolCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AerosolCore {
        &mut self.core
    }

    fn kind(&self) -> AerosolModelKind {
        AerosolModelKind::TwoMomentLogNormal
    }

    fn dispersed_diameters(&self) -> AmResult<Vec<(usize, Vec<f64>)>> {
        let d_g = self.geometric_diameter();

        // 质量场用体积平均直径，数场用数平均直径
        let d_volume: Vec<f64> = d_g.iter().map(|d| d * (1.5 * self.ln2_sigma).exp()).collect();
        let d_number: Vec<f64> = d_g.iter().map(|d| d * (0.5 * self.ln2_sigma).exp()).collect();

        Ok(vec![(self.z_slot, d_volume), (self.n_slot, d_number)])
    }

    fn solve_pre(&mut self, _dt: f64) -> AmResult<()> {
        let n_cells = self.core.mesh.n_cells();

        let cond_rate = self
            .core
            .condensation
            .as_ref()
            .map(|c| vec![c.characteristic_rate(); n_cells]);

        let coal_rate = if let Some(coal) = &self.core.coalescence {
            let rho = self.core.thermo.rho()?;
            let d_g = self.geometric_diameter();
            let n = self.core.state.field(self.n_slot);
            let rates: Vec<f64> = (0..n_cells)
                .map(|i| {
                    coal.collision_rate(
                        d_g[i],
                        rho[i] * n[i],
                        self.core.thermo.temperature[i],
                        self.core.thermo.mu[i],
                    )
                })
                .collect();
            Some(rates)
        } else {
            None
        };

        let mut contributions: Vec<&[f64]> = Vec::new();
        if let Some(r) = &cond_rate {
            contributions.push(r);
        }
        if let Some(r) = &coal_rate {
            contributions.push(r);
        }
        self.core.update_rdelta_t(&contributions);
        Ok(())
    }

    fn correct_model(&mut self, dt: f64) -> AmResult<()> {
        let n_cells = self.core.mesh.n_cells();
        let vapor_slot = self.core.vapor_slot();

        // 冷凝：质量迁移改变 z，不改变数目
        if let Some(cond) = &self.core.condensation {
            let rates = {
                let y_vapor = self.core.state.field(vapor_slot);
                cond.transfer_rate(y_vapor, &self.core.thermo)
            };
            for cell in 0..n_cells {
                let mut dm = rates[cell] * dt;
                if dm > 0.0 {
                    // 无粒子时冷凝无处落位
                    if self.core.state.field(self.n_slot)[cell] <= 0.0 {
                        continue;
                    }
                    dm = dm.min(self.core.state.field(vapor_slot)[cell]);
                } else {
                    dm = dm.max(-self.core.state.field(self.z_slot)[cell]);
                }
                self.core.state.field_mut(self.z_slot)[cell] += dm;
                self.core.state.field_mut(vapor_slot)[cell] -= dm;
            }
        }

        // 成核：质量与数目同时产生，新粒子取最小粒径
        if let Some(nuc) = &self.core.nucleation {
            let rates = {
                let y_vapor = self.core.state.field(vapor_slot);
                nuc.nucleation_rate(y_vapor, &self.core.thermo)
            };
            let rho = self.core.thermo.rho()?.to_vec();
            let mut nucleated_mass = 0.0;
            for cell in 0..n_cells {
                let dm = (rates[cell] * dt).min(self.core.state.field(vapor_slot)[cell]);
                if dm <= 0.0 {
                    continue;
                }
                let dn = dm / self.nucleus_mass(cell);
                self.core.state.field_mut(self.z_slot)[cell] += dm;
                self.core.state.field_mut(self.n_slot)[cell] += dn;
                self.core.state.field_mut(vapor_slot)[cell] -= dm;
                nucleated_mass += dm * rho[cell] * self.core.mesh.volume(cell);
            }
            if nucleated_mass > 0.0 {
                self.core
                    .output_properties_mut()
                    .increment("nucleation/total_mass", nucleated_mass);
            }
        }

        // 聚并：数目衰减，质量不变
        if let Some(coal) = &self.core.coalescence {
            let rho = self.core.thermo.rho()?.to_vec();
            let d_g = self.geometric_diameter();
            for cell in 0..n_cells {
                let n = self.core.state.field(self.n_slot)[cell];
                if n <= 0.0 {
                    continue;
                }
                let k = coal.kernel(
                    d_g[cell],
                    d_g[cell],
                    self.core.thermo.temperature[cell],
                    self.core.thermo.mu[cell],
                );
                // dn/dt = -0.5 K ρ n²（n 为单位质量数目）
                let dn = (0.5 * k * rho[cell] * n * n * dt).min(0.5 * n);
                self.core.state.field_mut(self.n_slot)[cell] = n - dn;
            }
        }

        let gas_slot = self.core.gas_slot();
        let core = &mut self.core;
        core.state.enforce_closure(&core.table, gas_slot);
        Ok(())
    }

    fn solve_post(&mut self, _dt: f64) -> AmResult<()> {
        let d_g = self.geometric_diameter();
        let (mut d_lo, mut d_hi) = (f64::MAX, 0.0f64);
        for &d in &d_g {
            d_lo = d_lo.min(d);
            d_hi = d_hi.max(d);
        }
        let mut props = self.core.output_properties_mut();
        props.set("diagnostics/dg_min", d_lo);
        props.set("diagnostics/dg_max", d_hi);
        Ok(())
    }

    fn source(&self, field: &str) -> AmResult<ImplicitSource> {
        let slot = self
            .core
            .table
            .slot(field)
            .ok_or_else(|| AmError::config(format!("未登记的输运场: {}", field)))?;

        if slot == self.core.vapor_slot() {
            Ok(self.core.vapor_source())
        } else {
            Ok(ImplicitSource::zero(self.core.mesh.n_cells()))
        }
    }

    fn mean_diameter(&self, p: f64, q: f64) -> AmResult<Vec<f64>> {
        if p == q {
            return Err(AmError::config("矩比平均直径要求 p != q"));
        }
        let factor = (0.5 * (p + q) * self.ln2_sigma).exp();
        let d_min = self.core.d_min();
        let d_max = self.core.d_max();
        Ok(self
            .geometric_diameter()
            .iter()
            .map(|d| (d * factor).clamp(d_min, d_max))
            .collect())
    }

    fn median_diameter(&self, p: f64) -> AmResult<Vec<f64>> {
        let factor = (p * self.ln2_sigma).exp();
        Ok(self
            .geometric_diameter()
            .iter()
            .map(|d| d * factor)
            .collect())
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thermo::CarrierFlow;
    use am_config::AerosolModelKind;

    fn build(n_cells: usize) -> TwoMomentLogNormalModel {
        let mesh = Arc::new(AerosolMesh::uniform_line(n_cells, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(n_cells, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.model = AerosolModelKind::TwoMomentLogNormal;
        TwoMomentLogNormalModel::new(mesh, thermo, config).unwrap()
    }

    #[test]
    fn test_registers_moment_fields() {
        let model = build(3);
        assert!(model.core().table.slot("z_disp").is_some());
        assert!(model.core().table.slot("n_disp").is_some());
        assert_eq!(model.core().table.len(), 4);
    }

    #[test]
    fn test_geometric_diameter_roundtrip() {
        let mut model = build(2);

        // 由已知 d_g 正向构造 (z, n)，反解应还原
        let d_g = 1e-6;
        let sigma = 1.5f64;
        let ln2s = sigma.ln() * sigma.ln();
        let d_v = d_g * (1.5 * ln2s).exp();
        let v_mean = std::f64::consts::PI / 6.0 * d_v.powi(3);
        let n_disp = 1e8; // [1/kg]
        let z = n_disp * 1000.0 * v_mean;

        model.set_uniform_composition(0.0, z, n_disp).unwrap();
        let back = model.geometric_diameter();
        assert!((back[0] - d_g).abs() / d_g < 1e-10, "d_g={:e}", back[0]);
    }

    #[test]
    fn test_empty_population_sentinel() {
        let model = build(2);
        let d = model.geometric_diameter();
        assert!((d[0] - model.core().d_min()).abs() < 1e-21);
    }

    #[test]
    fn test_mean_median_relations() {
        let mut model = build(1);
        let d_g = 5e-7;
        let sigma = 1.5f64;
        let ln2s = sigma.ln() * sigma.ln();
        let d_v = d_g * (1.5 * ln2s).exp();
        let v_mean = std::f64::consts::PI / 6.0 * d_v.powi(3);
        let n_disp = 1e8;
        let z = n_disp * 1000.0 * v_mean;
        model.set_uniform_composition(0.0, z, n_disp).unwrap();

        // 数中位数 (p=0) 即几何中值
        let med0 = model.median_diameter(0.0).unwrap();
        assert!((med0[0] - d_g).abs() / d_g < 1e-9);

        // 高阶矩中位数更大
        let med3 = model.median_diameter(3.0).unwrap();
        assert!(med3[0] > med0[0]);

        // Sauter 直径解析式 d_32 = d_g exp(2.5 ln²σ)
        let d32 = model.mean_diameter(3.0, 2.0).unwrap();
        let expect = d_g * (2.5 * ln2s).exp();
        assert!((d32[0] - expect).abs() / expect < 1e-9);
    }

    #[test]
    fn test_coalescence_reduces_number_conserves_mass() {
        let mesh = Arc::new(AerosolMesh::uniform_line(2, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(2, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.model = AerosolModelKind::TwoMomentLogNormal;
        config.coalescence.enabled = true;
        config.drift.enabled = false;

        let mut model = TwoMomentLogNormalModel::new(mesh, thermo, config).unwrap();
        model.set_uniform_composition(0.0, 0.01, 1e12).unwrap();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        let n_before = model.core().state.field(model.n_slot)[0];
        let z_before = model.core().state.field(model.z_slot)[0];

        model.correct(10.0).unwrap();

        let n_after = model.core().state.field(model.n_slot)[0];
        let z_after = model.core().state.field(model.z_slot)[0];

        assert!(n_after < n_before, "聚并应减少粒子数");
        assert!((z_after - z_before).abs() < 1e-12, "聚并不改变质量");
    }

    #[test]
    fn test_factory_selects_log_normal() {
        let mesh = Arc::new(AerosolMesh::uniform_line(2, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(2, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.model = AerosolModelKind::TwoMomentLogNormal;

        let model = crate::model::new_aerosol_model(mesh, thermo, config).unwrap();
        assert_eq!(model.kind(), AerosolModelKind::TwoMomentLogNormal);
    }
}
