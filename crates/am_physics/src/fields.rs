// crates/am_physics/src/fields.rs

//! 输运场表
//!
//! 多变量对流格式共享的场登记表。每个被输运的标量场（质量分数或
//! 数浓度）按名称登记且仅登记一次，重复登记视为配置错误。
//!
//! # 场类别
//!
//! - `Continuous`: 连续相质量分数（载气、蒸气组分）
//! - `Dispersed`: 分散相质量分数（分区或矩模型的液相质量）
//! - `Number`: 数浓度类标量（随流输运但不参与质量闭合）

use am_foundation::{AmError, AmResult};
use std::collections::HashMap;

/// 场类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 连续相质量分数
    Continuous,
    /// 分散相质量分数
    Dispersed,
    /// 数浓度类标量（不参与质量闭合）
    Number,
}

impl FieldKind {
    /// 是否参与质量闭合（所有质量分数之和为 1）
    #[inline]
    pub fn in_mass_closure(&self) -> bool {
        !matches!(self, Self::Number)
    }
}

/// 场元数据
#[derive(Debug, Clone)]
pub struct FieldMeta {
    /// 场名称（唯一键）
    pub name: String,
    /// 场类别
    pub kind: FieldKind,
}

impl FieldMeta {
    /// 创建连续相场
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Continuous,
        }
    }

    /// 创建分散相场
    pub fn dispersed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Dispersed,
        }
    }

    /// 创建数浓度场
    pub fn number(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Number,
        }
    }
}

/// 输运场表
///
/// 保序存储场元数据，名称到槽位的映射用于按名访问。
#[derive(Debug, Default)]
pub struct FieldTable {
    metas: Vec<FieldMeta>,
    index: HashMap<String, usize>,
}

impl FieldTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新场，返回槽位
    ///
    /// 名称必须非空、不含空白字符，且未被登记过。
    pub fn register(&mut self, meta: FieldMeta) -> AmResult<usize> {
        if meta.name.is_empty() || meta.name.chars().any(char::is_whitespace) {
            return Err(AmError::config(format!("非法场名称: {:?}", meta.name)));
        }
        if self.index.contains_key(&meta.name) {
            return Err(AmError::config(format!("场 {} 重复登记", meta.name)));
        }

        let slot = self.metas.len();
        self.index.insert(meta.name.clone(), slot);
        self.metas.push(meta);
        Ok(slot)
    }

    /// 场数量
    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }

    /// 按名称查找槽位
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// 按槽位取元数据
    pub fn meta(&self, slot: usize) -> &FieldMeta {
        &self.metas[slot]
    }

    /// 按槽位取类别
    #[inline]
    pub fn kind(&self, slot: usize) -> FieldKind {
        self.metas[slot].kind
    }

    /// 全部场名称
    pub fn names(&self) -> Vec<&str> {
        self.metas.iter().map(|m| m.name.as_str()).collect()
    }

    /// 遍历元数据
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FieldMeta)> {
        self.metas.iter().enumerate()
    }

    /// 分散相场槽位列表
    pub fn dispersed_slots(&self) -> Vec<usize> {
        self.metas
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind == FieldKind::Dispersed)
            .map(|(i, _)| i)
            .collect()
    }

    /// 参与质量闭合的槽位列表
    pub fn closure_slots(&self) -> Vec<usize> {
        self.metas
            .iter()
            .enumerate()
            .filter(|(_, m)| m.kind.in_mass_closure())
            .map(|(i, _)| i)
            .collect()
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut table = FieldTable::new();
        let a = table.register(FieldMeta::continuous("y_gas")).unwrap();
        let b = table.register(FieldMeta::dispersed("z_0")).unwrap();

        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(table.slot("y_gas"), Some(0));
        assert_eq!(table.slot("z_0"), Some(1));
        assert_eq!(table.slot("missing"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut table = FieldTable::new();
        table.register(FieldMeta::continuous("y_vapor")).unwrap();
        let err = table.register(FieldMeta::dispersed("y_vapor")).unwrap_err();
        assert!(matches!(err, AmError::Config { .. }));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut table = FieldTable::new();
        assert!(table.register(FieldMeta::continuous("")).is_err());
        assert!(table.register(FieldMeta::continuous("bad name")).is_err());
    }

    #[test]
    fn test_kind_filters() {
        let mut table = FieldTable::new();
        table.register(FieldMeta::continuous("y_gas")).unwrap();
        table.register(FieldMeta::dispersed("z_0")).unwrap();
        table.register(FieldMeta::dispersed("z_1")).unwrap();
        table.register(FieldMeta::number("n_disp")).unwrap();

        assert_eq!(table.dispersed_slots(), vec![1, 2]);
        assert_eq!(table.closure_slots(), vec![0, 1, 2]);
        assert!(!FieldKind::Number.in_mass_closure());
    }
}
