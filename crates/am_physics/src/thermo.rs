// crates/am_physics/src/thermo.rs

//! 两相混合物热力学状态
//!
//! 描述连续相（载气）与分散相（液滴）混合物的热力学场，
//! 以及与外部载流求解器的耦合。
//!
//! # 挂载语义
//!
//! 载流耦合（密度、速度、面质量通量）在构造后显式挂载。
//! 未挂载时所有流场访问返回配置错误，而非空指针式崩溃：
//! "未挂载"是类型层面可测试的正常分支。

use am_foundation::{AmError, AmResult};
use glam::DVec3;

use crate::mesh::AerosolMesh;

/// 载流耦合场
///
/// 由外部整体输运求解器（动量/压力/能量）每步提供，只读消费。
#[derive(Debug, Clone)]
pub struct CarrierFlow {
    /// 混合物密度（逐单元）[kg/m³]
    pub rho: Vec<f64>,
    /// 混合物速度（逐单元）[m/s]
    pub velocity: Vec<DVec3>,
    /// 混合物面质量通量（逐面）[kg/s]
    pub phi: Vec<f64>,
}

impl CarrierFlow {
    /// 均匀流场（演示与测试用）
    pub fn uniform(mesh: &AerosolMesh, rho: f64, velocity: DVec3) -> Self {
        let phi = (0..mesh.n_faces())
            .map(|f| rho * velocity.dot(mesh.normal(f)) * mesh.area(f))
            .collect();
        Self {
            rho: vec![rho; mesh.n_cells()],
            velocity: vec![velocity; mesh.n_cells()],
            phi,
        }
    }

    /// 静止流场
    pub fn quiescent(mesh: &AerosolMesh, rho: f64) -> Self {
        Self::uniform(mesh, rho, DVec3::ZERO)
    }
}

/// 两相混合物热力学状态
///
/// 连续相物性（密度、粘度、温度）在构造时注入；载流场后挂载。
#[derive(Debug)]
pub struct AerosolThermo {
    /// 单元数量
    n_cells: usize,
    /// 连续相密度 [kg/m³]
    pub rho_cont: Vec<f64>,
    /// 分散相（液滴）密度 [kg/m³]
    pub rho_disp: Vec<f64>,
    /// 连续相动力粘度 [Pa·s]
    pub mu: Vec<f64>,
    /// 温度 [K]
    pub temperature: Vec<f64>,
    /// 载流耦合（挂载前为 None）
    flow: Option<CarrierFlow>,
}

impl AerosolThermo {
    /// 以均匀物性构造
    pub fn uniform(n_cells: usize, rho_cont: f64, rho_disp: f64, mu: f64, temperature: f64) -> Self {
        Self {
            n_cells,
            rho_cont: vec![rho_cont; n_cells],
            rho_disp: vec![rho_disp; n_cells],
            mu: vec![mu; n_cells],
            temperature: vec![temperature; n_cells],
            flow: None,
        }
    }

    /// 以逐单元物性构造
    pub fn from_fields(
        rho_cont: Vec<f64>,
        rho_disp: Vec<f64>,
        mu: Vec<f64>,
        temperature: Vec<f64>,
    ) -> AmResult<Self> {
        let n_cells = rho_cont.len();
        AmError::check_size("rho_disp", n_cells, rho_disp.len())?;
        AmError::check_size("mu", n_cells, mu.len())?;
        AmError::check_size("temperature", n_cells, temperature.len())?;

        for (name, field) in [
            ("rho_cont", &rho_cont),
            ("rho_disp", &rho_disp),
            ("mu", &mu),
            ("temperature", &temperature),
        ] {
            if field.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
                return Err(AmError::config(format!("热力学场 {} 含非正或非有限值", name)));
            }
        }

        Ok(Self {
            n_cells,
            rho_cont,
            rho_disp,
            mu,
            temperature,
            flow: None,
        })
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 挂载载流耦合场
    ///
    /// 大小校验失败或重复挂载均为配置错误。
    pub fn attach_flow(&mut self, flow: CarrierFlow, mesh: &AerosolMesh) -> AmResult<()> {
        AmError::check_size("flow.rho", mesh.n_cells(), flow.rho.len())?;
        AmError::check_size("flow.velocity", mesh.n_cells(), flow.velocity.len())?;
        AmError::check_size("flow.phi", mesh.n_faces(), flow.phi.len())?;
        self.flow = Some(flow);
        Ok(())
    }

    /// 是否已挂载载流
    #[inline]
    pub fn has_flow(&self) -> bool {
        self.flow.is_some()
    }

    /// 访问载流耦合场
    pub fn flow(&self) -> AmResult<&CarrierFlow> {
        self.flow
            .as_ref()
            .ok_or_else(|| AmError::not_attached("carrier_flow", "AerosolThermo::attach_flow()"))
    }

    /// 可变访问载流耦合场（步间更新用）
    pub fn flow_mut(&mut self) -> AmResult<&mut CarrierFlow> {
        self.flow
            .as_mut()
            .ok_or_else(|| AmError::not_attached("carrier_flow", "AerosolThermo::attach_flow()"))
    }

    /// 混合物密度（需已挂载）
    pub fn rho(&self) -> AmResult<&[f64]> {
        Ok(&self.flow()?.rho)
    }

    /// 混合物面质量通量（需已挂载）
    pub fn phi(&self) -> AmResult<&[f64]> {
        Ok(&self.flow()?.phi)
    }

    /// 混合物速度（需已挂载）
    pub fn velocity(&self) -> AmResult<&[DVec3]> {
        Ok(&self.flow()?.velocity)
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_thermo() {
        let thermo = AerosolThermo::uniform(10, 1.2, 1000.0, 1.8e-5, 293.15);
        assert_eq!(thermo.n_cells(), 10);
        assert!((thermo.rho_cont[3] - 1.2).abs() < 1e-12);
        assert!(!thermo.has_flow());
    }

    #[test]
    fn test_flow_access_before_attach_fails() {
        let thermo = AerosolThermo::uniform(4, 1.2, 1000.0, 1.8e-5, 293.15);
        let err = thermo.flow().unwrap_err();
        assert!(matches!(err, AmError::NotAttached { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_attach_flow() {
        let mesh = AerosolMesh::uniform_line(4, 0.1, 0.01);
        let mut thermo = AerosolThermo::uniform(4, 1.2, 1000.0, 1.8e-5, 293.15);

        let flow = CarrierFlow::uniform(&mesh, 1.2, DVec3::new(1.0, 0.0, 0.0));
        thermo.attach_flow(flow, &mesh).unwrap();

        assert!(thermo.has_flow());
        let phi = thermo.phi().unwrap();
        assert_eq!(phi.len(), mesh.n_faces());
        // 内部面通量 = rho * u * A
        assert!((phi[0] - 1.2 * 1.0 * 0.01).abs() < 1e-12);
        // 入口边界面法向指向域外 (-x)，通量为负
        assert!(phi[mesh.n_interior_faces] < 0.0);
    }

    #[test]
    fn test_attach_flow_size_mismatch() {
        let mesh = AerosolMesh::uniform_line(4, 0.1, 0.01);
        let mut thermo = AerosolThermo::uniform(4, 1.2, 1000.0, 1.8e-5, 293.15);

        let mut flow = CarrierFlow::quiescent(&mesh, 1.2);
        flow.rho.pop();
        assert!(thermo.attach_flow(flow, &mesh).is_err());
    }

    #[test]
    fn test_from_fields_rejects_nonphysical() {
        let res = AerosolThermo::from_fields(
            vec![1.2, -0.5],
            vec![1000.0, 1000.0],
            vec![1.8e-5, 1.8e-5],
            vec![293.0, 293.0],
        );
        assert!(res.is_err());
    }
}
