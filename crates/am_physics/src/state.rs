// crates/am_physics/src/state.rs

//! 气溶胶标量场状态
//!
//! 存储全部被输运标量场的逐单元数据，槽位与 [`crate::fields::FieldTable`]
//! 一一对应。质量闭合（质量分数之和为 1）的校验与强制在此处实现。

use am_foundation::{clamp01, AmError, AmResult};

use crate::fields::FieldTable;

/// 气溶胶标量场状态
#[derive(Debug, Clone)]
pub struct AerosolState {
    n_cells: usize,
    /// 场数据：`data[slot][cell]`
    data: Vec<Vec<f64>>,
}

impl AerosolState {
    /// 按场表创建，初值全零
    pub fn new(table: &FieldTable, n_cells: usize) -> Self {
        Self {
            n_cells,
            data: vec![vec![0.0; n_cells]; table.len()],
        }
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 场数量
    #[inline]
    pub fn n_fields(&self) -> usize {
        self.data.len()
    }

    /// 只读访问场
    #[inline]
    pub fn field(&self, slot: usize) -> &[f64] {
        &self.data[slot]
    }

    /// 可变访问场
    #[inline]
    pub fn field_mut(&mut self, slot: usize) -> &mut [f64] {
        &mut self.data[slot]
    }

    /// 同时可变访问全部场（多变量对流推进用）
    #[inline]
    pub fn fields_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.data
    }

    /// 设置场为给定切片
    pub fn set_field(&mut self, slot: usize, values: &[f64]) -> AmResult<()> {
        AmError::check_size("field", self.n_cells, values.len())?;
        self.data[slot].copy_from_slice(values);
        Ok(())
    }

    /// 给定单元处参与质量闭合的分数之和
    pub fn closure_sum(&self, table: &FieldTable, cell: usize) -> f64 {
        table
            .closure_slots()
            .iter()
            .map(|&s| self.data[s][cell])
            .sum()
    }

    /// 全域最大质量闭合误差 |sum - 1|
    pub fn closure_error(&self, table: &FieldTable) -> f64 {
        let slots = table.closure_slots();
        let mut max_err = 0.0f64;
        for cell in 0..self.n_cells {
            let sum: f64 = slots.iter().map(|&s| self.data[s][cell]).sum();
            max_err = max_err.max((sum - 1.0).abs());
        }
        max_err
    }

    /// 强制质量闭合
    ///
    /// 逐单元将闭合场钳位到 [0,1] 后按总和归一。总和退化为零时
    /// 将全部质量归入给定的回退场（通常为载气）。
    pub fn enforce_closure(&mut self, table: &FieldTable, fallback_slot: usize) {
        let slots = table.closure_slots();
        for cell in 0..self.n_cells {
            let mut sum = 0.0;
            for &s in &slots {
                let v = clamp01(self.data[s][cell]);
                self.data[s][cell] = v;
                sum += v;
            }
            if sum > 1e-12 {
                let inv = 1.0 / sum;
                for &s in &slots {
                    self.data[s][cell] *= inv;
                }
            } else {
                for &s in &slots {
                    self.data[s][cell] = 0.0;
                }
                self.data[fallback_slot][cell] = 1.0;
            }
        }
    }
}

// ============================================================================
// 测试
// ============================================================================
