// crates/am_physics/src/mesh.rs

//! 网格协作层
//!
//! 气溶胶求解所需的最小面寻址网格接口。本模块不做网格生成，
//! 只定义扁平数组形式的只读几何与拓扑，由外部网格基础设施填充。
//!
//! # 约定
//!
//! 1. **面寻址**: 面按 [内部面..][边界面..] 排列，owner 恒有效，
//!    边界面的 neighbour 为 `u32::MAX` 哨兵
//! 2. **法向**: 单位法向由 owner 指向 neighbour（边界面指向域外）
//! 3. **只读共享**: 构建后不可变，可安全跨线程共享

use am_foundation::{AmError, AmResult};
use glam::DVec3;

/// 无效单元索引哨兵（边界面的 neighbour）
pub const INVALID_CELL: u32 = u32::MAX;

/// 面寻址网格
///
/// 扁平数组存储，所有索引为 `usize` 接口、`u32` 内部存储。
#[derive(Debug, Clone)]
pub struct AerosolMesh {
    /// 单元数量
    pub n_cells: usize,
    /// 面数量（内部面 + 边界面）
    pub n_faces: usize,
    /// 内部面数量
    pub n_interior_faces: usize,
    /// 单元体积 [m³]
    pub cell_volume: Vec<f64>,
    /// 单元中心
    pub cell_center: Vec<DVec3>,
    /// 面面积 [m²]
    pub face_area: Vec<f64>,
    /// 面单位法向（owner → neighbour）
    pub face_normal: Vec<DVec3>,
    /// 面 owner 单元
    pub face_owner: Vec<u32>,
    /// 面 neighbour 单元（边界面为 INVALID_CELL）
    pub face_neighbor: Vec<u32>,
    /// owner 与 neighbour 单元中心距离 [m]
    pub face_dist: Vec<f64>,
}

impl AerosolMesh {
    /// 校验数组大小与拓扑一致性
    pub fn validate(&self) -> AmResult<()> {
        AmError::check_size("cell_volume", self.n_cells, self.cell_volume.len())?;
        AmError::check_size("cell_center", self.n_cells, self.cell_center.len())?;
        AmError::check_size("face_area", self.n_faces, self.face_area.len())?;
        AmError::check_size("face_normal", self.n_faces, self.face_normal.len())?;
        AmError::check_size("face_owner", self.n_faces, self.face_owner.len())?;
        AmError::check_size("face_neighbor", self.n_faces, self.face_neighbor.len())?;
        AmError::check_size("face_dist", self.n_faces, self.face_dist.len())?;

        if self.n_interior_faces > self.n_faces {
            return Err(AmError::validation(format!(
                "内部面数 {} 超过总面数 {}",
                self.n_interior_faces, self.n_faces
            )));
        }

        for f in 0..self.n_faces {
            let o = self.face_owner[f] as usize;
            if o >= self.n_cells {
                return Err(AmError::index_out_of_bounds("face_owner", o, self.n_cells));
            }
            let n = self.face_neighbor[f];
            if f < self.n_interior_faces {
                if n == INVALID_CELL || n as usize >= self.n_cells {
                    return Err(AmError::validation(format!("内部面 {} 的 neighbour 无效", f)));
                }
            } else if n != INVALID_CELL {
                return Err(AmError::validation(format!(
                    "边界面 {} 的 neighbour 应为哨兵值",
                    f
                )));
            }
        }

        for (i, &v) in self.cell_volume.iter().enumerate() {
            if !(v.is_finite() && v > 0.0) {
                return Err(AmError::validation(format!("单元 {} 体积非正: {}", i, v)));
            }
        }

        Ok(())
    }

    // =========================================================================
    // 基本统计与访问
    // =========================================================================

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 面数量
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.n_faces
    }

    /// 边界面数量
    #[inline]
    pub fn n_boundary_faces(&self) -> usize {
        self.n_faces - self.n_interior_faces
    }

    /// 单元索引范围
    #[inline]
    pub fn cells(&self) -> std::ops::Range<usize> {
        0..self.n_cells
    }

    /// 内部面索引范围
    #[inline]
    pub fn interior_faces(&self) -> std::ops::Range<usize> {
        0..self.n_interior_faces
    }

    /// 边界面索引范围
    #[inline]
    pub fn boundary_faces(&self) -> std::ops::Range<usize> {
        self.n_interior_faces..self.n_faces
    }

    /// 判断是否为边界面
    #[inline]
    pub fn is_boundary_face(&self, face: usize) -> bool {
        face >= self.n_interior_faces
    }

    /// 获取面 owner 单元索引
    #[inline]
    pub fn owner(&self, face: usize) -> usize {
        self.face_owner[face] as usize
    }

    /// 获取面 neighbour 单元索引（边界面为 None）
    #[inline]
    pub fn neighbor(&self, face: usize) -> Option<usize> {
        let n = self.face_neighbor[face];
        if n == INVALID_CELL {
            None
        } else {
            Some(n as usize)
        }
    }

    /// 单元体积
    #[inline]
    pub fn volume(&self, cell: usize) -> f64 {
        self.cell_volume[cell]
    }

    /// 面面积
    #[inline]
    pub fn area(&self, face: usize) -> f64 {
        self.face_area[face]
    }

    /// 面单位法向
    #[inline]
    pub fn normal(&self, face: usize) -> DVec3 {
        self.face_normal[face]
    }

    /// owner 到 neighbour 的中心距离（过小视为退化，返回 None）
    #[inline]
    pub fn distance(&self, face: usize) -> Option<f64> {
        let d = self.face_dist[face];
        if d > 1e-14 {
            Some(d)
        } else {
            None
        }
    }

    /// 域总体积
    pub fn total_volume(&self) -> f64 {
        self.cell_volume.iter().sum()
    }

    // =========================================================================
    // 结构化构造（测试与演示用）
    // =========================================================================

    /// 构造一维等距管道网格
    ///
    /// `n` 个单元沿 x 方向排列，单元间距 `dx`，横截面积 `area`。
    /// 面排列：n-1 个内部面，随后入口/出口两个边界面。
    pub fn uniform_line(n: usize, dx: f64, area: f64) -> Self {
        assert!(n >= 1);
        assert!(dx > 0.0 && area > 0.0);

        let n_interior = n - 1;
        let n_faces = n_interior + 2;

        let cell_volume = vec![dx * area; n];
        let cell_center = (0..n)
            .map(|i| DVec3::new((i as f64 + 0.5) * dx, 0.0, 0.0))
            .collect();

        let mut face_area = vec![area; n_faces];
        let mut face_normal = vec![DVec3::X; n_faces];
        let mut face_owner = Vec::with_capacity(n_faces);
        let mut face_neighbor = Vec::with_capacity(n_faces);
        let mut face_dist = vec![dx; n_faces];

        // 内部面: i | i+1
        for i in 0..n_interior {
            face_owner.push(i as u32);
            face_neighbor.push((i + 1) as u32);
        }

        // 入口边界面（法向指向域外，即 -x）
        face_owner.push(0);
        face_neighbor.push(INVALID_CELL);
        face_normal[n_interior] = -DVec3::X;
        face_area[n_interior] = area;
        face_dist[n_interior] = 0.5 * dx;

        // 出口边界面
        face_owner.push((n - 1) as u32);
        face_neighbor.push(INVALID_CELL);
        face_dist[n_interior + 1] = 0.5 * dx;

        let mesh = Self {
            n_cells: n,
            n_faces,
            n_interior_faces: n_interior,
            cell_volume,
            cell_center,
            face_area,
            face_normal,
            face_owner,
            face_neighbor,
            face_dist,
        };
        debug_assert!(mesh.validate().is_ok());
        mesh
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_line_topology() {
        let mesh = AerosolMesh::uniform_line(4, 0.1, 0.01);

        assert_eq!(mesh.n_cells(), 4);
        assert_eq!(mesh.n_faces(), 5);
        assert_eq!(mesh.n_interior_faces, 3);
        assert_eq!(mesh.n_boundary_faces(), 2);
        assert!(mesh.validate().is_ok());

        // 内部面拓扑
        assert_eq!(mesh.owner(0), 0);
        assert_eq!(mesh.neighbor(0), Some(1));
        assert_eq!(mesh.neighbor(2), Some(3));

        // 边界面
        assert!(mesh.is_boundary_face(3));
        assert_eq!(mesh.neighbor(3), None);
        assert_eq!(mesh.neighbor(4), None);
    }

    #[test]
    fn test_uniform_line_geometry() {
        let mesh = AerosolMesh::uniform_line(3, 0.5, 2.0);

        assert!((mesh.volume(0) - 1.0).abs() < 1e-12);
        assert!((mesh.total_volume() - 3.0).abs() < 1e-12);
        assert!((mesh.cell_center[1].x - 0.75).abs() < 1e-12);
        assert_eq!(mesh.distance(0), Some(0.5));
    }

    #[test]
    fn test_validate_rejects_bad_neighbor() {
        let mut mesh = AerosolMesh::uniform_line(3, 0.5, 1.0);
        mesh.face_neighbor[0] = INVALID_CELL; // 内部面不允许哨兵
        assert!(mesh.validate().is_err());
    }

    #[test]
    fn test_single_cell_mesh() {
        let mesh = AerosolMesh::uniform_line(1, 1.0, 1.0);
        assert_eq!(mesh.n_interior_faces, 0);
        assert_eq!(mesh.n_faces(), 2);
        assert!(mesh.validate().is_ok());
    }
}
