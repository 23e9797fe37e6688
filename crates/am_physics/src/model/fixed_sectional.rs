// crates/am_physics/src/model/fixed_sectional.rs

//! 固定分区气溶胶模型
//!
//! 以固定的尺寸分区离散求解 PBE：每个分区对应一个被输运的
//! 分散相质量分数场 z_i。冷凝按表面积权重在分区间分配蒸气
//! 迁移质量，成核进入最小分区，聚并做逐单元逐分区对的
//! 守恒再分配。
//!
//! 直径统计（矩比平均、矩中位数）以逐分区数量权重
//! n_i ∝ z_i / x_i³ 计算。

use std::sync::Arc;

use am_config::{AerosolConfig, AerosolModelKind};
use am_foundation::{residual_div, AmError, AmResult};

use crate::fields::FieldMeta;
use crate::mesh::AerosolMesh;
use crate::model::{AerosolCore, AerosolModel, ImplicitSource};
use crate::sectional::{SectionalDistribution, SizeDimension};
use crate::thermo::AerosolThermo;

/// 固定分区模型
pub struct FixedSectionalModel {
    core: AerosolCore,
    /// 分区分布（构造后只读）
    distribution: SectionalDistribution,
    /// 各分区的场槽位
    section_slots: Vec<usize>,
}

impl FixedSectionalModel {
    /// 从配置构造
    pub fn new(
        mesh: Arc<AerosolMesh>,
        thermo: AerosolThermo,
        config: AerosolConfig,
    ) -> AmResult<Self> {
        let distribution = SectionalDistribution::from_config(&config.sections)?;
        // 漂移闭合与直径统计均以直径为内部坐标
        distribution.check_dimension(SizeDimension::Diameter)?;

        // 分区域必须落在允许粒径范围内
        if distribution.y_min() < config.d_min || distribution.y_max() > config.d_max {
            return Err(AmError::config(format!(
                "分区域 [{:e}, {:e}] 超出允许粒径范围 [{:e}, {:e}]",
                distribution.y_min(),
                distribution.y_max(),
                config.d_min,
                config.d_max
            )));
        }

        let metas: Vec<FieldMeta> = (0..distribution.n_sections())
            .map(|i| FieldMeta::dispersed(distribution.section_field_name(i)))
            .collect();

        let core = AerosolCore::new(mesh, thermo, config, metas)?;

        let section_slots = (0..distribution.n_sections())
            .map(|i| {
                core.table
                    .slot(&distribution.section_field_name(i))
                    .expect("分区场必已登记")
            })
            .collect();

        Ok(Self {
            core,
            distribution,
            section_slots,
        })
    }

    /// 分区分布
    pub fn distribution(&self) -> &SectionalDistribution {
        &self.distribution
    }

    /// 设置均匀初始组成
    ///
    /// `vapor` 为蒸气分数，`sections` 为各分区分散相分数；
    /// 余量归于载气。
    pub fn set_uniform_composition(&mut self, vapor: f64, sections: &[f64]) -> AmResult<()> {
        AmError::check_size("sections", self.distribution.n_sections(), sections.len())?;
        let z_total: f64 = sections.iter().sum();
        AmError::check_range("vapor + sections", vapor + z_total, 0.0, 1.0)?;

        let gas = 1.0 - vapor - z_total;

        let gas_slot = self.core.gas_slot();
        let vapor_slot = self.core.vapor_slot();
        self.core.state.field_mut(gas_slot).fill(gas);
        self.core.state.field_mut(vapor_slot).fill(vapor);
        for (k, &slot) in self.section_slots.iter().enumerate() {
            self.core.state.field_mut(slot).fill(sections[k]);
        }
        Ok(())
    }

    /// 给定单元的逐分区数量权重 n_i ∝ z_i / x_i³
    fn number_weights(&self, cell: usize) -> Vec<f64> {
        self.section_slots
            .iter()
            .enumerate()
            .map(|(k, &slot)| {
                let x = self.distribution.x()[k];
                self.core.state.field(slot)[cell] / (x * x * x)
            })
            .collect()
    }

    /// 逐分区粒子质量 [kg]
    fn particle_mass(&self, k: usize, cell: usize) -> f64 {
        let x = self.distribution.x()[k];
        self.core.thermo.rho_disp[cell] * std::f64::consts::FRAC_PI_6 * x * x * x
    }

    // =========================================================================
    // PBE 子步
    // =========================================================================

    /// 冷凝/蒸发：蒸气与分区间的质量交换
    fn apply_condensation(&mut self, dt: f64) {
        let Some(cond) = &self.core.condensation else {
            return;
        };

        let n_cells = self.core.mesh.n_cells();
        let vapor_slot = self.core.vapor_slot();
        let n_sections = self.distribution.n_sections();
        let residual = self.core.residual_alpha();

        let rates = {
            let y_vapor = self.core.state.field(vapor_slot);
            cond.transfer_rate(y_vapor, &self.core.thermo)
        };

        for cell in 0..n_cells {
            let mut dm = rates[cell] * dt;
            if dm == 0.0 {
                continue;
            }

            // 表面积权重 s_i = z_i x_i²
            let weights: Vec<f64> = (0..n_sections)
                .map(|k| {
                    let x = self.distribution.x()[k];
                    self.core.state.field(self.section_slots[k])[cell] * x * x
                })
                .collect();
            let w_total: f64 = weights.iter().sum();

            if dm > 0.0 {
                // 冷凝：无既有粒子时质量无处落位（需先成核）
                if w_total <= 0.0 {
                    continue;
                }
                dm = dm.min(self.core.state.field(vapor_slot)[cell]);
                for k in 0..n_sections {
                    let share = dm * weights[k] / w_total;
                    self.core.state.field_mut(self.section_slots[k])[cell] += share;
                }
                self.core.state.field_mut(vapor_slot)[cell] -= dm;
            } else {
                // 蒸发：按质量比例移出，不超过分散相存量
                let z_total: f64 = (0..n_sections)
                    .map(|k| self.core.state.field(self.section_slots[k])[cell])
                    .sum();
                let dm_evap = (-dm).min(z_total);
                if dm_evap <= 0.0 {
                    continue;
                }
                for k in 0..n_sections {
                    let z = self.core.state.field(self.section_slots[k])[cell];
                    let share = dm_evap * residual_div(z, z_total, residual);
                    self.core.state.field_mut(self.section_slots[k])[cell] =
                        (z - share).max(0.0);
                }
                self.core.state.field_mut(vapor_slot)[cell] += dm_evap;
            }
        }
    }

    /// 成核：超临界蒸气进入最小分区
    fn apply_nucleation(&mut self, dt: f64) -> AmResult<()> {
        let Some(nuc) = &self.core.nucleation else {
            return Ok(());
        };

        let n_cells = self.core.mesh.n_cells();
        let vapor_slot = self.core.vapor_slot();
        let z0_slot = self.section_slots[0];

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
            self.core.state.field_mut(z0_slot)[cell] += dm;
            self.core.state.field_mut(vapor_slot)[cell] -= dm;
            nucleated_mass += dm * rho[cell] * self.core.mesh.volume(cell);
        }

        if nucleated_mass > 0.0 {
            // 成核账目跨重启续算
            self.core
                .output_properties_mut()
                .increment("nucleation/total_mass", nucleated_mass);
        }
        Ok(())
    }

    /// 聚并：逐单元逐分区对的守恒再分配
    fn apply_coalescence(&mut self, dt: f64) -> AmResult<()> {
        let Some(coal) = &self.core.coalescence else {
            return Ok(());
        };

        let n_cells = self.core.mesh.n_cells();
        let n_sections = self.distribution.n_sections();
        let rho = self.core.thermo.rho()?.to_vec();

        // 预求聚并目标分区：合并粒子体积对应的尺寸所在分区，
        // 越过上边界时钳位到最后一个分区
        let x = self.distribution.x().to_vec();
        let mut targets = vec![vec![0usize; n_sections]; n_sections];
        for i in 0..n_sections {
            for j in 0..n_sections {
                let x_new = (x[i].powi(3) + x[j].powi(3)).cbrt();
                targets[i][j] = if x_new >= self.distribution.y_max() {
                    n_sections - 1
                } else {
                    self.distribution.search(x_new).expect("合并尺寸必在域内")
                };
            }
        }

        for cell in 0..n_cells {
            let t_cell = self.core.thermo.temperature[cell];
            let mu = self.core.thermo.mu[cell];

            // 逐分区数浓度 [1/m³]
            let number: Vec<f64> = (0..n_sections)
                .map(|k| {
                    let m_k = self.particle_mass(k, cell);
                    let z = self.core.state.field(self.section_slots[k])[cell];
                    rho[cell] * z / m_k
                })
                .collect();

            for i in 0..n_sections {
                if number[i] <= 0.0 {
                    continue;
                }
                for j in i..n_sections {
                    if number[j] <= 0.0 {
                        continue;
                    }
                    let sym = if i == j { 0.5 } else { 1.0 };
                    let rate = sym * coal.kernel(x[i], x[j], t_cell, mu) * number[i] * number[j];
                    if rate <= 0.0 {
                        continue;
                    }

                    let t = targets[i][j];
                    if t == i && t == j {
                        continue; // 目标仍在原分区，无净迁移
                    }

                    // 本步移除的碰撞数密度，限幅防止移空
                    let dn = (rate * dt).min(number[i].min(number[j]) * 0.5);
                    let m_i = self.particle_mass(i, cell);
                    let m_j = self.particle_mass(j, cell);

                    let dz_i = dn * m_i / rho[cell];
                    let dz_j = dn * m_j / rho[cell];

                    let z_i = self.core.state.field(self.section_slots[i])[cell];
                    let z_j = self.core.state.field(self.section_slots[j])[cell];
                    let dz_i = dz_i.min(z_i);
                    let dz_j = dz_j.min(z_j);

                    self.core.state.field_mut(self.section_slots[i])[cell] -= dz_i;
                    self.core.state.field_mut(self.section_slots[j])[cell] -= dz_j;
                    self.core.state.field_mut(self.section_slots[t])[cell] += dz_i + dz_j;
                }
            }
        }
        Ok(())
    }
}

impl AerosolModel for FixedSectionalModel {
    fn core(&self) -> &AerosolCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AerosolCore {
        &mut self.core
    }

    fn kind(&self) -> AerosolModelKind {
        AerosolModelKind::FixedSectional
    }

    fn dispersed_diameters(&self) -> AmResult<Vec<(usize, Vec<f64>)>> {
        let n = self.core.mesh.n_cells();
        Ok(self
            .section_slots
            .iter()
            .enumerate()
            .map(|(k, &slot)| (slot, vec![self.distribution.x()[k]; n]))
            .collect())
    }

    fn solve_pre(&mut self, _dt: f64) -> AmResult<()> {
        let n_cells = self.core.mesh.n_cells();

        // 冷凝弛豫速率（全场常数）
        let cond_rate = self
            .core
            .condensation
            .as_ref()
            .map(|c| vec![c.characteristic_rate(); n_cells]);

        // 聚并碰撞速率：体积平均直径的单分散估计
        let coal_rate = if let Some(coal) = &self.core.coalescence {
            let rho = self.core.thermo.rho()?;
            let mut rates = vec![0.0; n_cells];
            for cell in 0..n_cells {
                let weights = self.number_weights(cell);
                let m0 = self.distribution.moment(&weights, 0.0);
                if m0 <= 0.0 {
                    continue;
                }
                let d_mean = (self.distribution.moment(&weights, 3.0) / m0).cbrt();
                let n_total: f64 = (0..self.distribution.n_sections())
                    .map(|k| {
                        let z = self.core.state.field(self.section_slots[k])[cell];
                        rho[cell] * z / self.particle_mass(k, cell)
                    })
                    .sum();
                rates[cell] = coal.collision_rate(
                    d_mean,
                    n_total,
                    self.core.thermo.temperature[cell],
                    self.core.thermo.mu[cell],
                );
            }
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
        self.apply_condensation(dt);
        self.apply_nucleation(dt)?;
        self.apply_coalescence(dt)?;

        let gas_slot = self.core.gas_slot();
        let core = &mut self.core;
        core.state.enforce_closure(&core.table, gas_slot);
        Ok(())
    }

    fn solve_post(&mut self, _dt: f64) -> AmResult<()> {
        // 诊断：记录 Sauter 直径范围，供输出协作方查询
        let d32 = self.mean_diameter(3.0, 2.0)?;
        let (mut d_lo, mut d_hi) = (f64::MAX, 0.0f64);
        for &d in &d32 {
            d_lo = d_lo.min(d);
            d_hi = d_hi.max(d);
        }
        let mut props = self.core.output_properties_mut();
        props.set("diagnostics/d32_min", d_lo);
        props.set("diagnostics/d32_max", d_hi);
        drop(props);

        tracing::debug!(d32_min = d_lo, d32_max = d_hi, "分区模型后处理完成");
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

        let n_cells = self.core.mesh.n_cells();
        let d_min = self.core.d_min();
        let d_max = self.core.d_max();
        let inv_pq = 1.0 / (p - q);

        Ok((0..n_cells)
            .map(|cell| {
                let weights = self.number_weights(cell);
                let num = self.distribution.moment(&weights, p);
                let den = self.distribution.moment(&weights, q);
                if num <= 0.0 || den <= 0.0 {
                    d_min
                } else {
                    (num / den).powf(inv_pq).clamp(d_min, d_max)
                }
            })
            .collect())
    }

    fn median_diameter(&self, p: f64) -> AmResult<Vec<f64>> {
        let n_cells = self.core.mesh.n_cells();
        Ok((0..n_cells)
            .map(|cell| {
                let weights = self.number_weights(cell);
                self.distribution.median(&weights, p)
            })
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
    use am_config::SectionSpacing;

    fn micron_config(n_cells: usize) -> (Arc<AerosolMesh>, AerosolThermo, AerosolConfig) {
        let mesh = Arc::new(AerosolMesh::uniform_line(n_cells, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(n_cells, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.d_min = 1e-9;
        config.d_max = 1e-5;
        config.sections.spacing = SectionSpacing::Explicit;
        config.sections.edges = vec![1e-9, 1e-6, 2e-6, 3e-6];
        (mesh, thermo, config)
    }

    #[test]
    fn test_construction_registers_section_fields() {
        let (mesh, thermo, config) = micron_config(4);
        let model = FixedSectionalModel::new(mesh, thermo, config).unwrap();

        assert_eq!(model.distribution().n_sections(), 3);
        assert!(model.core().table.slot("z_0").is_some());
        assert!(model.core().table.slot("z_2").is_some());
        assert!(model.core().table.slot("y_vapor").is_some());
        // 连续 2 + 分区 3
        assert_eq!(model.core().table.len(), 5);
    }

    #[test]
    fn test_sections_must_lie_within_diameter_bounds() {
        let (mesh, thermo, mut config) = micron_config(4);
        config.d_max = 1.5e-6; // 小于分区上界
        assert!(FixedSectionalModel::new(mesh, thermo, config).is_err());
    }

    #[test]
    fn test_mean_diameter_single_section() {
        let (mesh, thermo, config) = micron_config(4);
        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        model
            .set_uniform_composition(0.0, &[0.0, 0.01, 0.0])
            .unwrap();

        // 全部粒子同尺寸：任意矩比平均都等于该尺寸
        let d = model.mean_diameter(3.0, 2.0).unwrap();
        let x1 = model.distribution().x()[1];
        for &di in &d {
            assert!((di - x1).abs() / x1 < 1e-12);
        }

        let d10 = model.mean_diameter(1.0, 0.0).unwrap();
        assert!((d10[0] - x1).abs() / x1 < 1e-12);
    }

    #[test]
    fn test_mean_diameter_empty_population_sentinel() {
        let (mesh, thermo, config) = micron_config(2);
        let model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        let d = model.mean_diameter(3.0, 2.0).unwrap();
        assert!((d[0] - 1e-9).abs() < 1e-21); // d_min 哨兵
    }

    #[test]
    fn test_mean_diameter_rejects_equal_moments() {
        let (mesh, thermo, config) = micron_config(2);
        let model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        assert!(model.mean_diameter(2.0, 2.0).is_err());
    }

    #[test]
    fn test_median_diameter_delegates_to_distribution() {
        let (mesh, thermo, config) = micron_config(3);
        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        model
            .set_uniform_composition(0.0, &[0.0, 0.0, 0.02])
            .unwrap();

        let med = model.median_diameter(2.0).unwrap();
        let x2 = model.distribution().x()[2];
        assert!((med[0] - x2).abs() / x2 < 1e-12);
    }

    #[test]
    fn test_condensation_transfers_vapor_to_sections() {
        let (mesh, thermo, mut config) = micron_config(3);
        config.condensation.enabled = true;
        config.condensation.rate_coefficient = 100.0;
        config.condensation.equilibrium_fraction = 0.001;

        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        model
            .set_uniform_composition(0.01, &[0.001, 0.001, 0.0])
            .unwrap();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        let vapor_before = model.core().state.field(model.core().vapor_slot())[0];
        let z_before: f64 = model.core().state.field(model.core().table.slot("z_0").unwrap())[0]
            + model.core().state.field(model.core().table.slot("z_1").unwrap())[0];

        model.correct(1e-3).unwrap();

        let vapor_after = model.core().state.field(model.core().vapor_slot())[0];
        let z_after: f64 = model.core().state.field(model.core().table.slot("z_0").unwrap())[0]
            + model.core().state.field(model.core().table.slot("z_1").unwrap())[0];

        assert!(vapor_after < vapor_before, "过饱和蒸气应冷凝");
        assert!(z_after > z_before, "分散相应增加");
        // 闭合保持
        assert!(model.core().state.closure_error(&model.core().table) < 1e-10);
    }

    #[test]
    fn test_nucleation_checkpoints_total_mass() {
        let (mesh, thermo, mut config) = micron_config(3);
        config.condensation.enabled = true;
        config.condensation.equilibrium_fraction = 0.001;
        config.nucleation.enabled = true;
        config.nucleation.rate_coefficient = 1.0;
        config.nucleation.critical_saturation = 1.0;

        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        model.set_uniform_composition(0.01, &[0.0, 0.0, 0.0]).unwrap();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        model.correct(1e-3).unwrap();

        let total = model
            .core()
            .output_properties()
            .get("nucleation/total_mass")
            .expect("成核账目应已写入");
        assert!(total > 0.0);

        // 新粒子进入最小分区
        let z0 = model.core().state.field(model.core().table.slot("z_0").unwrap())[0];
        assert!(z0 > 0.0);
    }

    #[test]
    fn test_coalescence_moves_mass_upward() {
        let (mesh, thermo, mut config) = micron_config(2);
        config.coalescence.enabled = true;
        config.coalescence.efficiency = 1.0;
        // 只开聚并
        config.drift.enabled = false;

        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        // 质量分布在中间与最大分区：(1,2) 对的合并体积落入分区 2
        model
            .set_uniform_composition(0.0, &[0.0, 0.01, 0.01])
            .unwrap();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        let z_total_before: f64 = (0..3)
            .map(|k| {
                model.core().state.field(model.core().table.slot(&format!("z_{}", k)).unwrap())[0]
            })
            .sum();

        // 长时间步放大聚并效果
        model.correct(1e5).unwrap();

        let z: Vec<f64> = (0..3)
            .map(|k| {
                model.core().state.field(model.core().table.slot(&format!("z_{}", k)).unwrap())[0]
            })
            .collect();

        assert!(z[1] < 0.01, "中间分区质量应被聚并移出");
        assert!(z[2] > 0.01, "最大分区质量应增加");
        let z_total_after: f64 = z.iter().sum();
        assert!(
            (z_total_after - z_total_before).abs() < 1e-10,
            "聚并应守恒分散相总质量"
        );
    }

    #[test]
    fn test_rdelta_t_reflects_condensation_rate() {
        let (mesh, thermo, mut config) = micron_config(3);
        config.condensation.enabled = true;
        config.condensation.rate_coefficient = 50.0;
        config.time_scale.rate_max = 1e4;

        let mut model = FixedSectionalModel::new(mesh, thermo, config).unwrap();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        model.correct(1e-3).unwrap();

        for &r in model.rdelta_t() {
            assert!((r - 50.0).abs() < 1e-9, "rΔt 应等于冷凝弛豫速率");
        }
    }
}
