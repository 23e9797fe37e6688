// tests/mass_closure.rs

//! 质量闭合验证
//!
//! 任意 correct() 调用后，每个单元上全部质量分数场之和必须为 1
//! （固定容差内）。覆盖：纯对流、漂移修正激活、冷凝/成核/聚并
//! 激活、多步长时间推进。

use std::sync::Arc;

use am_config::{AerosolConfig, AerosolModelKind, SectionSpacing};
use am_physics::model::{new_aerosol_model, AerosolModel};
use am_physics::thermo::{AerosolThermo, CarrierFlow};
use am_physics::AerosolMesh;
use glam::DVec3;

const CLOSURE_TOL: f64 = 1e-10;

fn base_config() -> AerosolConfig {
    let mut config = AerosolConfig::default();
    config.sections.spacing = SectionSpacing::Explicit;
    config.sections.edges = vec![1e-9, 1e-6, 2e-6, 3e-6];
    config
}

fn assert_closure(model: &dyn AerosolModel, context: &str) {
    let core = model.core();
    let err = core.state.closure_error(&core.table);
    assert!(
        err < CLOSURE_TOL,
        "{}: 质量闭合误差 {:e} 超过容差",
        context,
        err
    );
}

fn run_steps(model: &mut Box<dyn AerosolModel>, dt: f64, n_steps: usize, context: &str) {
    for step in 0..n_steps {
        model.correct(dt).unwrap();
        assert_closure(model.as_ref(), &format!("{} 第 {} 步", context, step));
    }
}

fn setup(
    config: AerosolConfig,
    n_cells: usize,
    velocity: DVec3,
) -> Box<dyn AerosolModel> {
    let mesh = Arc::new(AerosolMesh::uniform_line(n_cells, 0.1, 0.01));
    let thermo = AerosolThermo::uniform(n_cells, 1.2, 1000.0, 1.8e-5, 293.15);
    let mut model = new_aerosol_model(mesh, thermo, config).unwrap();

    // 非均匀初始组成（通过场直接写入，再归一）
    {
        let core = model.core_mut();
        let n = core.mesh.n_cells();
        let vapor_slot = core.vapor_slot();
        let gas_slot = core.gas_slot();
        let z0 = core.table.slot("z_0").or_else(|| core.table.slot("z_disp"));

        for cell in 0..n {
            let vapor = 0.01 + 0.005 * (cell as f64 / n as f64);
            core.state.field_mut(vapor_slot)[cell] = vapor;
            if let Some(z0) = z0 {
                core.state.field_mut(z0)[cell] = 0.004;
            }
            core.state.field_mut(gas_slot)[cell] = 1.0 - vapor - 0.004;
        }
    }

    let flow = CarrierFlow::uniform(&model.core().mesh, 1.2, velocity);
    model.core_mut().attach_flow(flow).unwrap();
    model
}

// ============================================================================
// 场景
// ============================================================================

#[test]
fn closure_pure_advection() {
    let mut config = base_config();
    config.drift.enabled = false;

    let mut model = setup(config, 8, DVec3::new(1.0, 0.0, 0.0));
    assert_closure(model.as_ref(), "初始");
    run_steps(&mut model, 1e-3, 50, "纯对流");
}

#[test]
fn closure_with_drift_correction() {
    let mut config = base_config();
    // 重力沿 -x 使漂移通量作用在管道面上
    config.drift.gravity = [-9.81, 0.0, 0.0];

    let mut model = setup(config, 8, DVec3::new(0.5, 0.0, 0.0));
    run_steps(&mut model, 1e-3, 50, "漂移修正");
}

#[test]
fn closure_with_all_physics_active() {
    let mut config = base_config();
    config.drift.gravity = [-9.81, 0.0, 0.0];
    config.condensation.enabled = true;
    config.condensation.rate_coefficient = 20.0;
    config.condensation.equilibrium_fraction = 0.005;
    config.nucleation.enabled = true;
    config.nucleation.rate_coefficient = 0.1;
    config.coalescence.enabled = true;

    let mut model = setup(config, 6, DVec3::new(0.5, 0.0, 0.0));
    run_steps(&mut model, 1e-3, 30, "全物理");
}

#[test]
fn closure_log_normal_model() {
    let mut config = base_config();
    config.model = AerosolModelKind::TwoMomentLogNormal;
    config.condensation.enabled = true;

    let mut model = setup(config, 6, DVec3::new(0.5, 0.0, 0.0));
    run_steps(&mut model, 1e-3, 30, "对数正态模型");
}

#[test]
fn closure_quiescent_long_run() {
    let mut config = base_config();
    config.condensation.enabled = true;
    config.condensation.rate_coefficient = 100.0;

    let mut model = setup(config, 4, DVec3::ZERO);
    run_steps(&mut model, 1e-2, 100, "静止长时间");
}

// ============================================================================
// 漂移不产生净质量
// ============================================================================

#[test]
fn drift_does_not_create_dispersed_mass_in_closed_box() {
    // 静止载流 + 仅漂移：总分散相质量只能通过边界流出，
    // 封闭（零通量边界）时应严格守恒
    let mut config = base_config();
    config.drift.gravity = [-9.81, 0.0, 0.0];

    let mut model = setup(config, 6, DVec3::ZERO);

    let dispersed_total = |model: &Box<dyn AerosolModel>| -> f64 {
        let core = model.core();
        let mut total = 0.0;
        for &slot in &core.table.dispersed_slots() {
            let field = core.state.field(slot);
            for cell in core.mesh.cells() {
                total += field[cell] * core.mesh.volume(cell);
            }
        }
        total
    };

    let before = dispersed_total(&model);
    for _ in 0..20 {
        model.correct(1e-3).unwrap();
    }
    let after = dispersed_total(&model);

    // 漂移把质量推向下游单元，但边界修正通量为零，总量不变
    assert!(
        (after - before).abs() / before < 1e-8,
        "封闭域漂移改变了分散相总质量: {:e} -> {:e}",
        before,
        after
    );
}
