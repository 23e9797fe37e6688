// crates/am_physics/src/model/mod.rs

//! 气溶胶模型
//!
//! 本模块是求解编排层：持有两相热力学状态与全部物理子模型，
//! 组装漂移修正通量，并驱动每个外层迭代的求解序列。
//!
//! # correct() 驱动序列
//!
//! 1. `solve_pre`：子类型前处理（更新局部时间尺度等）
//! 2. 漂移通量组装 + 多变量对流推进质量分数场
//! 3. `correct_model`：子类型求解 PBE 本体（分区再分配或矩更新，
//!    含冷凝/成核/聚并修正）
//! 4. `solve_post`：子类型后处理（诊断直径等）
//!
//! # 状态机
//!
//! Uninitialized（子模型已解析、载流未挂载）→ Ready（可求解）→
//! Correcting（correct() 执行中）。Correcting 状态下再次进入
//! correct() 为致命重入错误。
//!
//! # 漂移修正的守恒性
//!
//! 每个分散场的原始漂移通量 = 惯性滑移 + 布朗扩散两部分之和；
//! 从每个场的通量中减去混合物平均修正，使按分数加权的修正通量
//! 在每个面上严格抵消，总质量方程不被漂移修正污染。

mod fixed_sectional;
mod log_normal;

pub use fixed_sectional::FixedSectionalModel;
pub use log_normal::TwoMomentLogNormalModel;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use am_config::{AerosolConfig, AerosolModelKind};
use am_foundation::{AmError, AmResult};
use glam::{DMat3, DVec3};
use parking_lot::RwLock;

use crate::fields::{FieldKind, FieldMeta, FieldTable};
use crate::mesh::AerosolMesh;
use crate::state::AerosolState;
use crate::submodels::{
    new_coalescence_model, new_condensation_model, new_diffusivity_closure, new_drift_closure,
    new_nucleation_model, CoalescenceModel, CondensationModel, DiffusivityClosure, DriftClosure,
    NucleationModel,
};
use crate::thermo::{AerosolThermo, CarrierFlow};
use crate::timescale::LocalTimeScale;
use crate::transport::MultivariateConvection;

/// 模型状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// 已构造，载流未挂载
    Uninitialized,
    /// 可求解
    Ready,
    /// correct() 执行中
    Correcting,
}

/// 线性化源项
///
/// 场方程的源项拆为显式部分与隐式系数：S = su + sp·Y。
#[derive(Debug, Clone)]
pub struct ImplicitSource {
    /// 显式部分 [1/s]
    pub su: Vec<f64>,
    /// 隐式系数 [1/s]
    pub sp: Vec<f64>,
}

impl ImplicitSource {
    /// 零源项
    pub fn zero(n_cells: usize) -> Self {
        Self {
            su: vec![0.0; n_cells],
            sp: vec![0.0; n_cells],
        }
    }
}

/// 输出属性存储
///
/// 子模型需要跨重启续算的派生量（如成核质量累计）的键值存储，
/// JSON 持久化。
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct OutputProperties {
    values: BTreeMap<String, f64>,
}

impl OutputProperties {
    /// 读取键值
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// 写入键值
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// 累加键值（缺省从零开始）
    pub fn increment(&mut self, key: &str, delta: f64) -> f64 {
        let v = self.values.entry(key.to_string()).or_insert(0.0);
        *v += delta;
        *v
    }

    /// 键数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 保存到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> AmResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AmError::serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 从 JSON 文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> AmResult<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| AmError::serialization(e.to_string()))
    }
}

/// 漂移通量组装结果（内部中间量）
struct DriftFluxes {
    inertial: Vec<Vec<f64>>,
    brownian: Vec<Vec<f64>>,
    corrective: Vec<Vec<f64>>,
    tau_drift: Vec<DMat3>,
    phi_eff: Vec<Vec<f64>>,
    d_disp: Vec<f64>,
}

/// 气溶胶模型共享核心
///
/// 具体模型子类型（分区法/矩方法）组合本结构，通过
/// [`AerosolModel`] trait 的模板方法驱动。
pub struct AerosolCore {
    /// 网格（只读共享）
    pub mesh: Arc<AerosolMesh>,
    /// 两相热力学状态
    pub thermo: AerosolThermo,
    config: AerosolConfig,
    /// 输运场表
    pub table: FieldTable,
    /// 标量场状态
    pub state: AerosolState,
    gas_slot: usize,
    vapor_slot: usize,

    // 子模型（None = 该物理关闭）
    drift: Option<Box<dyn DriftClosure>>,
    diffusivity: Option<Box<dyn DiffusivityClosure>>,
    /// 冷凝模型
    pub condensation: Option<Box<dyn CondensationModel>>,
    /// 成核模型
    pub nucleation: Option<Box<dyn NucleationModel>>,
    /// 聚并模型
    pub coalescence: Option<Box<dyn CoalescenceModel>>,

    convection: MultivariateConvection,
    timescale: LocalTimeScale,

    // 派生场
    phi_inertial: Vec<Vec<f64>>,
    phi_brownian: Vec<Vec<f64>>,
    phi_drift: Vec<Vec<f64>>,
    tau_drift: Vec<DMat3>,
    phi_eff: Vec<Vec<f64>>,
    d_disp: Vec<f64>,
    rdelta_t: Vec<f64>,

    model_state: ModelState,
    output_properties: RwLock<OutputProperties>,
}

impl AerosolCore {
    /// 创建共享核心
    ///
    /// `dispersed_metas` 为子类型的分散相/数浓度场，连续相场
    /// （载气 + 蒸气）由核心统一登记。初始全部质量归于载气。
    pub fn new(
        mesh: Arc<AerosolMesh>,
        thermo: AerosolThermo,
        config: AerosolConfig,
        dispersed_metas: Vec<FieldMeta>,
    ) -> AmResult<Self> {
        config
            .validate()
            .map_err(|e| AmError::config(e.to_string()))?;
        mesh.validate()?;
        AmError::check_size("thermo", mesh.n_cells(), thermo.n_cells())?;

        let mut table = FieldTable::new();
        let gas_slot = table.register(FieldMeta::continuous("y_gas"))?;
        let vapor_slot = table.register(FieldMeta::continuous("y_vapor"))?;
        for meta in dispersed_metas {
            table.register(meta)?;
        }

        let mut state = AerosolState::new(&table, mesh.n_cells());
        state.field_mut(gas_slot).fill(1.0);

        let n_fields = table.len();
        let n_faces = mesh.n_faces();
        let n_cells = mesh.n_cells();

        let drift = new_drift_closure(&config.drift)?;
        let diffusivity = new_diffusivity_closure(&config.drift);
        let condensation = new_condensation_model(&config.condensation);
        let nucleation = new_nucleation_model(&config.nucleation, &config.condensation);
        let coalescence = new_coalescence_model(&config.coalescence);

        tracing::info!(
            model = config.model.name(),
            n_cells,
            n_fields,
            drift = drift.is_some(),
            condensation = condensation.is_some(),
            nucleation = nucleation.is_some(),
            coalescence = coalescence.is_some(),
            "气溶胶模型构造完成"
        );

        Ok(Self {
            convection: MultivariateConvection::from_config(&config.transport),
            timescale: LocalTimeScale::from_config(&config.time_scale),
            mesh,
            thermo,
            table,
            state,
            gas_slot,
            vapor_slot,
            drift,
            diffusivity,
            condensation,
            nucleation,
            coalescence,
            phi_inertial: vec![vec![0.0; n_faces]; n_fields],
            phi_brownian: vec![vec![0.0; n_faces]; n_fields],
            phi_drift: vec![vec![0.0; n_faces]; n_fields],
            tau_drift: vec![DMat3::ZERO; n_cells],
            phi_eff: vec![vec![0.0; n_faces]; n_fields],
            d_disp: vec![0.0; n_cells],
            rdelta_t: vec![0.0; n_cells],
            model_state: ModelState::Uninitialized,
            output_properties: RwLock::new(OutputProperties::default()),
            config,
        })
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 配置
    pub fn config(&self) -> &AerosolConfig {
        &self.config
    }

    /// 最小允许粒径
    #[inline]
    pub fn d_min(&self) -> f64 {
        self.config.d_min
    }

    /// 最大允许粒径
    #[inline]
    pub fn d_max(&self) -> f64 {
        self.config.d_max
    }

    /// 残余相分数
    #[inline]
    pub fn residual_alpha(&self) -> f64 {
        self.config.residual_alpha
    }

    /// 载气场槽位
    #[inline]
    pub fn gas_slot(&self) -> usize {
        self.gas_slot
    }

    /// 蒸气场槽位
    #[inline]
    pub fn vapor_slot(&self) -> usize {
        self.vapor_slot
    }

    /// 当前状态机状态
    #[inline]
    pub fn model_state(&self) -> ModelState {
        self.model_state
    }

    pub(crate) fn set_model_state(&mut self, s: ModelState) {
        self.model_state = s;
    }

    /// 修正质量分数漂移通量（逐场逐面）
    pub fn phi_drift(&self) -> &[Vec<f64>] {
        &self.phi_drift
    }

    /// 惯性漂移通量（逐场逐面）
    pub fn phi_inertial(&self) -> &[Vec<f64>] {
        &self.phi_inertial
    }

    /// 布朗漂移通量（逐场逐面）
    pub fn phi_brownian(&self) -> &[Vec<f64>] {
        &self.phi_brownian
    }

    /// 有效粒子数通量监视场（逐场逐面）
    pub fn phi_eff(&self) -> &[Vec<f64>] {
        &self.phi_eff
    }

    /// 混合物漂移应力张量（逐单元）
    pub fn tau_drift(&self) -> &[DMat3] {
        &self.tau_drift
    }

    /// 分散相扩散系数诊断场（逐单元）
    pub fn d_disp(&self) -> &[f64] {
        &self.d_disp
    }

    /// 局部倒数时间步场
    pub fn rdelta_t(&self) -> &[f64] {
        &self.rdelta_t
    }

    /// 读访问输出属性存储
    pub fn output_properties(&self) -> parking_lot::RwLockReadGuard<'_, OutputProperties> {
        self.output_properties.read()
    }

    /// 写访问输出属性存储
    pub fn output_properties_mut(&self) -> parking_lot::RwLockWriteGuard<'_, OutputProperties> {
        self.output_properties.write()
    }

    // =========================================================================
    // 载流挂载
    // =========================================================================

    /// 挂载载流耦合场，状态机进入 Ready
    pub fn attach_flow(&mut self, flow: CarrierFlow) -> AmResult<()> {
        self.thermo.attach_flow(flow, &self.mesh)?;
        if self.model_state == ModelState::Uninitialized {
            self.model_state = ModelState::Ready;
        }
        Ok(())
    }

    // =========================================================================
    // 漂移通量组装
    // =========================================================================

    /// 更新漂移修正通量
    ///
    /// `diameters`: 子类型给出的 (场槽位, 逐单元粒径) 列表，
    /// 覆盖全部分散相与数浓度场。
    pub fn update_drift_flux(&mut self, diameters: &[(usize, Vec<f64>)]) -> AmResult<()> {
        let fluxes = self.compute_drift_fluxes(diameters)?;
        self.phi_inertial = fluxes.inertial;
        self.phi_brownian = fluxes.brownian;
        self.phi_drift = fluxes.corrective;
        self.tau_drift = fluxes.tau_drift;
        self.phi_eff = fluxes.phi_eff;
        self.d_disp = fluxes.d_disp;
        Ok(())
    }

    fn compute_drift_fluxes(&self, diameters: &[(usize, Vec<f64>)]) -> AmResult<DriftFluxes> {
        let n_fields = self.table.len();
        let n_faces = self.mesh.n_faces();
        let n_cells = self.mesh.n_cells();

        let mut inertial = vec![vec![0.0; n_faces]; n_fields];
        let mut brownian = vec![vec![0.0; n_faces]; n_fields];
        let mut corrective = vec![vec![0.0; n_faces]; n_fields];
        let mut tau_drift = vec![DMat3::ZERO; n_cells];
        let mut phi_eff = vec![vec![0.0; n_faces]; n_fields];
        let mut d_disp = vec![0.0; n_cells];

        if self.drift.is_none() && self.diffusivity.is_none() {
            return Ok(DriftFluxes {
                inertial,
                brownian,
                corrective,
                tau_drift,
                phi_eff,
                d_disp,
            });
        }

        let rho = self.thermo.rho()?;
        let phi_mix = self.thermo.phi()?;

        // 逐场滑移速度与扩散系数
        let mut velocities: Vec<Option<Vec<DVec3>>> = (0..n_fields).map(|_| None).collect();
        let mut diffusivities: Vec<Option<Vec<f64>>> = (0..n_fields).map(|_| None).collect();

        for (slot, d) in diameters {
            AmError::check_index("field_slot", *slot, n_fields)?;
            AmError::check_size("diameter", n_cells, d.len())?;

            if let Some(drift) = &self.drift {
                let name = self.table.meta(*slot).name.clone();
                velocities[*slot] = Some(drift.drift_velocity(d, &name, &self.thermo)?);
            }
            if let Some(diff) = &self.diffusivity {
                diffusivities[*slot] = Some(diff.diffusivity(d, &self.thermo)?);
            }
        }

        // 原始通量：惯性 + 布朗，边界面保持为零
        for (slot, d) in diameters {
            let slot = *slot;
            let field = self.state.field(slot);

            for f in self.mesh.interior_faces() {
                let o = self.mesh.owner(f);
                let n = self.mesh.neighbor(f).expect("内部面必有 neighbour");
                let area = self.mesh.area(f);
                let normal = self.mesh.normal(f);
                let rho_f = 0.5 * (rho[o] + rho[n]);

                if let Some(v) = &velocities[slot] {
                    let v_f = 0.5 * (v[o] + v[n]);
                    inertial[slot][f] = rho_f * v_f.dot(normal) * area;
                }

                if let Some(dc) = &diffusivities[slot] {
                    if let Some(dist) = self.mesh.distance(f) {
                        let d_f = 0.5 * (dc[o] + dc[n]);
                        let grad = (field[n] - field[o]) / dist;
                        brownian[slot][f] = -rho_f * d_f * grad * area;
                    }
                }
            }

            // 漂移应力与扩散系数诊断（逐单元）
            if let Some(v) = &velocities[slot] {
                if self.table.kind(slot) == FieldKind::Dispersed {
                    for i in 0..n_cells {
                        let vi = v[i];
                        let outer = DMat3::from_cols(vi * vi.x, vi * vi.y, vi * vi.z);
                        tau_drift[i] += outer * (rho[i] * field[i]);
                    }
                }
            }
            if let Some(dc) = &diffusivities[slot] {
                if self.table.kind(slot) == FieldKind::Dispersed {
                    for i in 0..n_cells {
                        d_disp[i] = d_disp[i].max(dc[i]);
                    }
                }
            }

            // 有效粒子数通量监视: (phi + phi_raw) * Z̄ / m̄
            if self.table.kind(slot) == FieldKind::Dispersed {
                let rho_d = &self.thermo.rho_disp;
                for f in self.mesh.interior_faces() {
                    let o = self.mesh.owner(f);
                    let n = self.mesh.neighbor(f).expect("内部面必有 neighbour");
                    let z_f = 0.5 * (field[o] + field[n]);
                    let d_f = 0.5 * (d[o] + d[n]);
                    let m_f = 0.5 * (rho_d[o] + rho_d[n]) * std::f64::consts::FRAC_PI_6
                        * d_f
                        * d_f
                        * d_f;
                    if m_f > 0.0 {
                        let total = phi_mix[f] + inertial[slot][f] + brownian[slot][f];
                        phi_eff[slot][f] = total * z_f / m_f;
                    }
                }
            }
        }

        // 混合物平均修正：按面插值分数加权的原始通量之和。
        // 每个闭合场减去同一平均值，使加权修正通量逐面抵消。
        let closure_slots = self.table.closure_slots();
        for f in self.mesh.interior_faces() {
            let o = self.mesh.owner(f);
            let n = self.mesh.neighbor(f).expect("内部面必有 neighbour");

            let mut mean = 0.0;
            for &slot in &closure_slots {
                let field = self.state.field(slot);
                let y_f = 0.5 * (field[o] + field[n]);
                mean += y_f * (inertial[slot][f] + brownian[slot][f]);
            }

            for slot in 0..n_fields {
                let raw = inertial[slot][f] + brownian[slot][f];
                if self.table.kind(slot).in_mass_closure() {
                    corrective[slot][f] = raw - mean;
                } else {
                    corrective[slot][f] = raw;
                }
            }
        }

        Ok(DriftFluxes {
            inertial,
            brownian,
            corrective,
            tau_drift,
            phi_eff,
            d_disp,
        })
    }

    // =========================================================================
    // 输运与时间尺度
    // =========================================================================

    /// 以混合通量 + 漂移修正推进全部输运场
    pub fn advance_transport(&mut self, dt: f64) -> AmResult<()> {
        let rho = self.thermo.rho()?;
        let phi = self.thermo.phi()?;
        self.convection.advance(
            &self.mesh,
            rho,
            &mut self.state,
            &self.table,
            phi,
            &self.phi_drift,
            dt,
            self.gas_slot,
        )
    }

    /// 以给定子模型速率场更新局部倒数时间步
    pub fn update_rdelta_t(&mut self, rates: &[&[f64]]) {
        let raw = if rates.is_empty() {
            vec![0.0; self.mesh.n_cells()]
        } else {
            LocalTimeScale::combine_rates(self.mesh.n_cells(), rates)
        };
        self.rdelta_t = self.timescale.rdelta_t(&self.mesh, &raw);
    }

    // =========================================================================
    // 公共源项
    // =========================================================================

    /// 蒸气场的线性化冷凝源项
    pub fn vapor_source(&self) -> ImplicitSource {
        let n = self.mesh.n_cells();
        match &self.condensation {
            Some(cond) => {
                let k = cond.characteristic_rate();
                let y_eq = cond.equilibrium_fraction();
                ImplicitSource {
                    su: vec![k * y_eq; n],
                    sp: vec![-k; n],
                }
            }
            None => ImplicitSource::zero(n),
        }
    }

    /// 冷凝/蒸发潜热释放率 [W/m³]
    pub fn qdot(&self) -> AmResult<Vec<f64>> {
        let n = self.mesh.n_cells();
        let Some(cond) = &self.condensation else {
            return Ok(vec![0.0; n]);
        };

        let rho = self.thermo.rho()?;
        let y_vapor = self.state.field(self.vapor_slot);
        let rate = cond.transfer_rate(y_vapor, &self.thermo);
        let latent = cond.latent_heat();

        Ok((0..n).map(|i| rho[i] * latent * rate[i]).collect())
    }
}

// ============================================================
// 模型 trait
// ============================================================

/// 气溶胶模型抽象基
///
/// `correct()` 为模板驱动，子类型实现 solve_pre / correct_model /
/// solve_post 与直径统计。
pub trait AerosolModel: Send {
    /// 共享核心
    fn core(&self) -> &AerosolCore;
    /// 共享核心（可变）
    fn core_mut(&mut self) -> &mut AerosolCore;
    /// 模型类型
    fn kind(&self) -> AerosolModelKind;

    /// 分散相/数浓度输运场的逐单元粒径（槽位对齐）
    fn dispersed_diameters(&self) -> AmResult<Vec<(usize, Vec<f64>)>>;

    /// 质量分数求解前的子类型处理
    fn solve_pre(&mut self, dt: f64) -> AmResult<()>;
    /// PBE 本体求解（分区再分配或矩更新）
    fn correct_model(&mut self, dt: f64) -> AmResult<()>;
    /// 质量分数求解后的子类型处理
    fn solve_post(&mut self, dt: f64) -> AmResult<()>;

    /// 命名输运场的线性化源项
    fn source(&self, field: &str) -> AmResult<ImplicitSource>;

    /// 潜热释放率 [W/m³]
    fn qdot(&self) -> AmResult<Vec<f64>> {
        self.core().qdot()
    }

    /// p,q 矩比平均直径（逐单元）
    fn mean_diameter(&self, p: f64, q: f64) -> AmResult<Vec<f64>>;

    /// p 矩中位直径（逐单元）
    fn median_diameter(&self, p: f64) -> AmResult<Vec<f64>>;

    /// 局部倒数时间步场
    fn rdelta_t(&self) -> &[f64] {
        self.core().rdelta_t()
    }

    /// 驱动一次外层迭代求解
    ///
    /// 不可重入；载流未挂载时为配置错误。
    fn correct(&mut self, dt: f64) -> AmResult<()> {
        match self.core().model_state() {
            ModelState::Correcting => {
                return Err(AmError::reentrancy("AerosolModel::correct()"));
            }
            ModelState::Uninitialized => {
                return Err(AmError::not_attached(
                    "carrier_flow",
                    "AerosolCore::attach_flow()",
                ));
            }
            ModelState::Ready => {}
        }

        self.core_mut().set_model_state(ModelState::Correcting);
        let result = self.correct_sequence(dt);
        self.core_mut().set_model_state(ModelState::Ready);
        result
    }

    /// correct() 的内部序列（勿直接调用）
    #[doc(hidden)]
    fn correct_sequence(&mut self, dt: f64) -> AmResult<()> {
        self.solve_pre(dt)?;

        let diameters = self.dispersed_diameters()?;
        self.core_mut().update_drift_flux(&diameters)?;
        self.core_mut().advance_transport(dt)?;

        self.correct_model(dt)?;
        self.solve_post(dt)?;
        Ok(())
    }
}

/// 按配置构造具体气溶胶模型
pub fn new_aerosol_model(
    mesh: Arc<AerosolMesh>,
    thermo: AerosolThermo,
    config: AerosolConfig,
) -> AmResult<Box<dyn AerosolModel>> {
    match config.model {
        AerosolModelKind::FixedSectional => {
            Ok(Box::new(FixedSectionalModel::new(mesh, thermo, config)?))
        }
        AerosolModelKind::TwoMomentLogNormal => {
            Ok(Box::new(TwoMomentLogNormalModel::new(mesh, thermo, config)?))
        }
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn build_model() -> Box<dyn AerosolModel> {
        let mesh = Arc::new(AerosolMesh::uniform_line(4, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(4, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.sections.n_sections = 5;
        new_aerosol_model(mesh, thermo, config).unwrap()
    }

    #[test]
    fn test_correct_before_attach_is_config_error() {
        let mut model = build_model();
        assert_eq!(model.core().model_state(), ModelState::Uninitialized);

        let err = model.correct(1e-3).unwrap_err();
        assert!(matches!(err, AmError::NotAttached { .. }));
    }

    #[test]
    fn test_reentrancy_is_fatal() {
        let mut model = build_model();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();

        // 人为置于 Correcting 态模拟协作方误用
        model.core_mut().set_model_state(ModelState::Correcting);
        let err = model.correct(1e-3).unwrap_err();
        assert!(matches!(err, AmError::Reentrancy { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut model = build_model();
        let flow = CarrierFlow::quiescent(&model.core().mesh, 1.2);
        model.core_mut().attach_flow(flow).unwrap();
        assert_eq!(model.core().model_state(), ModelState::Ready);

        model.correct(1e-3).unwrap();
        // 正常完成后回到 Ready
        assert_eq!(model.core().model_state(), ModelState::Ready);
    }

    #[test]
    fn test_output_properties_roundtrip() {
        let mut props = OutputProperties::default();
        props.set("nucleation/total_mass", 1.5e-9);
        props.increment("nucleation/total_mass", 0.5e-9);
        assert!((props.get("nucleation/total_mass").unwrap() - 2.0e-9).abs() < 1e-21);

        let dir = std::env::temp_dir().join("am_output_props_test.json");
        props.save_to_file(&dir).unwrap();
        let loaded = OutputProperties::load_from_file(&dir).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!((loaded.get("nucleation/total_mass").unwrap() - 2.0e-9).abs() < 1e-21);
        let _ = std::fs::remove_file(dir);
    }

    #[test]
    fn test_vapor_source_linearization() {
        let mesh = Arc::new(AerosolMesh::uniform_line(3, 0.1, 0.01));
        let thermo = AerosolThermo::uniform(3, 1.2, 1000.0, 1.8e-5, 293.15);
        let mut config = AerosolConfig::default();
        config.sections.n_sections = 3;
        config.condensation.enabled = true;
        config.condensation.rate_coefficient = 5.0;
        config.condensation.equilibrium_fraction = 0.02;

        let model = new_aerosol_model(mesh, thermo, config).unwrap();
        let src = model.core().vapor_source();
        assert!((src.sp[0] + 5.0).abs() < 1e-12);
        assert!((src.su[0] - 0.1).abs() < 1e-12);
    }
}
