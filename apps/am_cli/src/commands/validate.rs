// apps/am_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 验证气溶胶配置文件的正确性，并对可疑取值给出警告。

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info, warn};

use am_config::{AerosolConfig, AerosolModelKind, SectionSpacing};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== aeroMist 配置验证 ===");

    let config = AerosolConfig::from_file(&args.config)
        .with_context(|| format!("配置无效: {}", args.config.display()))?;

    info!("配置加载成功: {}", args.config.display());
    info!("模型: {}", config.model.name());

    let mut warnings: Vec<String> = Vec::new();

    // 可疑取值检查
    if config.sections.spacing != SectionSpacing::Explicit && config.sections.n_sections < 5 {
        warnings.push(format!(
            "分区数较少 ({})，尺寸分辨率可能不足",
            config.sections.n_sections
        ));
    }
    if config.sections.n_sections > 200 {
        warnings.push(format!(
            "分区数较多 ({})，聚并为逐分区对运算，代价为 O(N²)",
            config.sections.n_sections
        ));
    }
    if config.d_max / config.d_min > 1e6 {
        warnings.push("粒径范围跨越超过 6 个量级，建议对数间隔".to_string());
    }
    if config.time_scale.smoothing_factor > 3.0 {
        warnings.push(format!(
            "时间尺度平滑因子偏大 ({})，相邻单元速率跳变可能破坏耦合稳定性",
            config.time_scale.smoothing_factor
        ));
    }
    if !config.drift.enabled && config.model == AerosolModelKind::FixedSectional {
        warnings.push("漂移修正已关闭，分区输运退化为纯被动标量".to_string());
    }

    for w in &warnings {
        warn!("{}", w);
    }

    if args.strict && !warnings.is_empty() {
        error!("严格模式: {} 条警告视为错误", warnings.len());
        bail!("验证未通过（严格模式）");
    }

    info!("验证通过 ({} 条警告)", warnings.len());
    Ok(())
}
