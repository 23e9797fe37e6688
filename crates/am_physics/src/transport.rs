// crates/am_physics/src/transport.rs

//! 多变量对流输运
//!
//! 以共享格式推进整组被输运标量场。每个场的面通量由混合物质量
//! 通量加上该场自己的漂移修正通量组成：
//!
//! $$ \frac{\partial (\rho Y_j)}{\partial t}
//!    + \nabla \cdot \big[(\phi + \phi_{corr,j})\, Y_j\big] = S_j $$
//!
//! 整组场共用同一插值与钳位策略，保证推进后质量分数仍落在
//! [0,1] 且和为 1（多变量一致性）。边界面取零梯度（owner 值）。

use am_config::{ConvectionSchemeKind, TransportConfig};
use am_foundation::{AmError, AmResult};

use crate::fields::{FieldKind, FieldTable};
use crate::mesh::AerosolMesh;
use crate::state::AerosolState;

/// 多变量对流格式
#[derive(Debug, Clone)]
pub struct MultivariateConvection {
    scheme: ConvectionSchemeKind,
    blend: f64,
    clip: bool,
}

impl MultivariateConvection {
    /// 从配置创建
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            scheme: config.scheme,
            blend: config.blend,
            clip: config.clip,
        }
    }

    /// 格式名称
    pub fn scheme_name(&self) -> &'static str {
        match self.scheme {
            ConvectionSchemeKind::FirstOrderUpwind => "first_order_upwind",
            ConvectionSchemeKind::BlendedCentral => "blended_central",
        }
    }

    /// 面值插值
    #[inline]
    fn face_value(&self, flux: f64, y_owner: f64, y_neighbor: f64) -> f64 {
        let upwind = if flux >= 0.0 { y_owner } else { y_neighbor };
        match self.scheme {
            ConvectionSchemeKind::FirstOrderUpwind => upwind,
            ConvectionSchemeKind::BlendedCentral => {
                let central = 0.5 * (y_owner + y_neighbor);
                (1.0 - self.blend) * upwind + self.blend * central
            }
        }
    }

    /// 推进整组场一个时间步
    ///
    /// # 参数
    /// - `rho`: 逐单元混合物密度
    /// - `phi`: 逐面混合物质量通量 [kg/s]
    /// - `phi_corr`: 每场逐面漂移修正通量 [kg/s]（与场槽位对齐）
    /// - `fallback_slot`: 闭合退化时的质量归属场（载气）
    pub fn advance(
        &self,
        mesh: &AerosolMesh,
        rho: &[f64],
        state: &mut AerosolState,
        table: &FieldTable,
        phi: &[f64],
        phi_corr: &[Vec<f64>],
        dt: f64,
        fallback_slot: usize,
    ) -> AmResult<()> {
        let n_cells = mesh.n_cells();
        let n_fields = state.n_fields();

        AmError::check_size("rho", n_cells, rho.len())?;
        AmError::check_size("phi", mesh.n_faces(), phi.len())?;
        AmError::check_size("phi_corr", n_fields, phi_corr.len())?;
        for corr in phi_corr {
            AmError::check_size("phi_corr[field]", mesh.n_faces(), corr.len())?;
        }

        let mut rhs = vec![0.0; n_cells];

        for slot in 0..n_fields {
            rhs.fill(0.0);
            let field = state.field(slot);

            // 内部面
            for f in mesh.interior_faces() {
                let o = mesh.owner(f);
                let n = mesh.neighbor(f).expect("内部面必有 neighbour");

                let flux_total = phi[f] + phi_corr[slot][f];
                let y_f = self.face_value(flux_total, field[o], field[n]);
                let flux = flux_total * y_f;

                rhs[o] -= flux;
                rhs[n] += flux;
            }

            // 边界面：零梯度，出流带走 owner 值，入流带入 owner 值组成
            for f in mesh.boundary_faces() {
                let o = mesh.owner(f);
                let flux = (phi[f] + phi_corr[slot][f]) * field[o];
                rhs[o] -= flux;
            }

            let field = state.field_mut(slot);
            for i in 0..n_cells {
                field[i] += dt * rhs[i] / (rho[i] * mesh.volume(i));
            }
        }

        if self.clip {
            // 数浓度类场仅保证非负
            for (slot, meta) in table.iter() {
                if meta.kind == FieldKind::Number {
                    for v in state.field_mut(slot) {
                        *v = v.max(0.0);
                    }
                }
            }
            state.enforce_closure(table, fallback_slot);
        }

        Ok(())
    }
}

// ============================================================
// 测试
// ============================================================
