// apps/am_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 在一维演示管道上执行气溶胶群体平衡模拟：载气携带过饱和
//! 蒸气流经管道，冷凝/成核/聚并与重力漂移共同演化粒径分布。

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use am_config::AerosolConfig;
use am_physics::model::{new_aerosol_model, AerosolModel};
use am_physics::thermo::{AerosolThermo, CarrierFlow};
use am_physics::AerosolMesh;
use glam::DVec3;

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（缺省使用内置默认配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出属性文件路径
    #[arg(short, long, default_value = "output/aerosol_properties.json")]
    pub output: PathBuf,

    /// 模拟步数
    #[arg(short = 'n', long, default_value = "100")]
    pub steps: usize,

    /// 时间步长 [秒]
    #[arg(long, default_value = "1e-3")]
    pub dt: f64,

    /// 网格单元数量
    #[arg(long, default_value = "100")]
    pub cells: usize,

    /// 入口流速 [m/s]
    #[arg(long, default_value = "1.0")]
    pub velocity: f64,

    /// 初始蒸气质量分数
    #[arg(long, default_value = "0.02")]
    pub vapor: f64,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== aeroMist 模拟启动 ===");

    let config = match &args.config {
        Some(path) => AerosolConfig::from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => {
            // 内置演示配置：全部物理打开
            let mut c = AerosolConfig::default();
            c.condensation.enabled = true;
            c.nucleation.enabled = true;
            c.coalescence.enabled = true;
            c
        }
    };

    info!(
        "模型: {}, 分区: {}, 粒径范围: [{:e}, {:e}] m",
        config.model.name(),
        config.sections.n_sections,
        config.d_min,
        config.d_max
    );

    // 一维演示管道
    let mesh = Arc::new(AerosolMesh::uniform_line(args.cells, 0.01, 1e-4));
    let thermo = AerosolThermo::uniform(args.cells, 1.2, 1000.0, 1.8e-5, 293.15);

    let mut model =
        new_aerosol_model(mesh.clone(), thermo, config).context("构建气溶胶模型失败")?;

    // 初始蒸气（其余为载气），挂载均匀载流
    {
        let core = model.core_mut();
        let vapor_slot = core.vapor_slot();
        let gas_slot = core.gas_slot();
        core.state.field_mut(vapor_slot).fill(args.vapor);
        core.state.field_mut(gas_slot).fill(1.0 - args.vapor);
    }
    let flow = CarrierFlow::uniform(&mesh, 1.2, DVec3::new(args.velocity, 0.0, 0.0));
    model.core_mut().attach_flow(flow).context("挂载载流失败")?;

    info!("网格: {} 单元, {} 面", mesh.n_cells(), mesh.n_faces());

    // 时间推进
    let start = Instant::now();
    let report_every = (args.steps / 10).max(1);

    for step in 0..args.steps {
        model
            .correct(args.dt)
            .with_context(|| format!("第 {} 步求解失败", step))?;

        if step % report_every == 0 {
            let d32 = model.mean_diameter(3.0, 2.0).unwrap_or_default();
            let d_max = d32.iter().cloned().fold(0.0f64, f64::max);
            let r_max = model.rdelta_t().iter().cloned().fold(0.0f64, f64::max);
            info!(
                "步 {:>6}: t={:.4e} s, max d32={:.3e} m, max rΔt={:.3e} 1/s",
                step,
                step as f64 * args.dt,
                d_max,
                r_max
            );
        }
    }

    let elapsed = start.elapsed();
    info!(
        "模拟完成: {} 步, 耗时 {:.2} s ({:.1} 步/s)",
        args.steps,
        elapsed.as_secs_f64(),
        args.steps as f64 / elapsed.as_secs_f64()
    );

    // 闭合校验
    let closure_err = model.core().state.closure_error(&model.core().table);
    if closure_err > 1e-10 {
        warn!("质量闭合误差偏大: {:e}", closure_err);
    } else {
        info!("质量闭合误差: {:e}", closure_err);
    }

    // 持久化输出属性
    if let Some(dir) = args.output.parent() {
        std::fs::create_dir_all(dir)?;
    }
    model
        .core()
        .output_properties()
        .save_to_file(&args.output)
        .context("保存输出属性失败")?;
    info!("输出属性已写入 {}", args.output.display());

    Ok(())
}
