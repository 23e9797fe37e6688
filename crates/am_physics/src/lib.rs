// crates/am_physics/src/lib.rs

//! 气溶胶物理求解层
//!
//! 求解分散相群体平衡方程（PBE）及其与整体标量输运的耦合，包括：
//! - 网格协作接口 (mesh)
//! - 两相热力学状态 (thermo)
//! - 输运场表与标量状态 (fields / state)
//! - 分区法尺寸离散 (sectional)
//! - 物理子模型：漂移/冷凝/成核/聚并 (submodels)
//! - 多变量对流输运 (transport)
//! - 局部时间尺度 (timescale)
//! - 模型编排层 (model) - correct() 驱动、漂移通量组装、直径统计
//!
//! # 每步数据流
//!
//! 漂移闭合按当前尺寸信息给出滑移速度 → 折算为各输运场的修正
//! 质量通量 → 多变量对流以混合通量 + 修正通量推进质量分数 →
//! PBE 本体修正（分区再分配/矩更新）→ 聚合直径统计反馈给下一步
//! 的漂移评估与其它子物理。

pub mod fields;
pub mod mesh;
pub mod model;
pub mod sectional;
pub mod state;
pub mod submodels;
pub mod thermo;
pub mod timescale;
pub mod transport;

// 重导出常用类型
pub use fields::{FieldKind, FieldMeta, FieldTable};
pub use mesh::{AerosolMesh, INVALID_CELL};
pub use model::{
    new_aerosol_model, AerosolCore, AerosolModel, FixedSectionalModel, ImplicitSource,
    ModelState, OutputProperties, TwoMomentLogNormalModel,
};
pub use sectional::{Section, SectionalDistribution, SizeDimension};
pub use state::AerosolState;
pub use submodels::{
    new_coalescence_model, new_condensation_model, new_diffusivity_closure, new_drift_closure,
    new_nucleation_model, BrownianCoalescence, CoalescenceModel, CondensationModel,
    DiffusivityClosure, DriftClosure, Manninen, NucleationModel, RelaxationCondensation,
    StokesEinstein, ThresholdNucleation, BOLTZMANN,
};
pub use thermo::{AerosolThermo, CarrierFlow};
pub use timescale::LocalTimeScale;
pub use transport::MultivariateConvection;
