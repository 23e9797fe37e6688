// apps/am_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示配置与分区离散信息。

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use am_config::AerosolConfig;
use am_physics::sectional::SectionalDistribution;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径（缺省显示默认配置）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 显示分区表
    #[arg(long)]
    pub sections: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== aeroMist 信息 ===");

    let config = match &args.config {
        Some(path) => AerosolConfig::from_file(path)
            .with_context(|| format!("加载配置失败: {}", path.display()))?,
        None => AerosolConfig::default(),
    };

    println!("模型:            {}", config.model.name());
    println!("粒径范围:        [{:e}, {:e}] m", config.d_min, config.d_max);
    println!("残余相分数:      {:e}", config.residual_alpha);
    println!("漂移修正:        {}", onoff(config.drift.enabled));
    println!("  布朗扩散:      {}", onoff(config.drift.brownian));
    println!("冷凝:            {}", onoff(config.condensation.enabled));
    println!("成核:            {}", onoff(config.nucleation.enabled));
    println!("聚并:            {}", onoff(config.coalescence.enabled));
    println!(
        "时间尺度:        rate_max={:e} 1/s, 平滑因子={}, 扫描={}",
        config.time_scale.rate_max,
        config.time_scale.smoothing_factor,
        config.time_scale.smoothing_sweeps
    );

    if args.sections {
        let dist = SectionalDistribution::from_config(&config.sections)
            .context("构建分区分布失败")?;
        println!();
        println!("分区离散 ({} 个分区):", dist.n_sections());
        println!("{:>4}  {:>12}  {:>12}  {:>12}", "i", "y_low", "x", "y_high");
        for (i, sec) in dist.sections().iter().enumerate() {
            println!(
                "{:>4}  {:>12.4e}  {:>12.4e}  {:>12.4e}",
                i,
                sec.y_low(),
                sec.x(),
                sec.y_high()
            );
        }
    }

    Ok(())
}

fn onoff(b: bool) -> &'static str {
    if b {
        "开"
    } else {
        "关"
    }
}
