use crate::StrError;
use gemlab::mesh::{Cell, Mesh};
use gemlab::shapes::GeoKind;
use russell_lab::Matrix;
use std::f64::consts::PI;

/// Holds the geometry of an edge (side) of a triangle
#[derive(Clone, Copy, Debug)]
pub struct EdgeTri3 {
    /// Local indices of the two nodes of the edge
    pub nodes: [usize; 2],

    /// Length of the edge
    pub length: f64,

    /// Unit outward normal vector
    pub normal: [f64; 2],

    /// Unit tangent vector (from the first to the second node)
    pub tangent: [f64; 2],
}

/// Implements the geometry of the linear triangle (Tri3)
///
/// The shape functions are the area coordinates; thus, their gradients are constant:
///
/// ```text
///  ∂Nᵢ    yⱼ - yₖ      ∂Nᵢ    xₖ - xⱼ
/// ───── = ───────     ───── = ───────     (i, j, k) cyclic
///  ∂x       2 A        ∂y       2 A
/// ```
///
/// Side `s` connects the local nodes `s` and `(s + 1) % 3`.
#[derive(Clone, Debug)]
pub struct ShapeTri3 {
    /// Coordinates of the nodes
    pub xx: [[f64; 2]; 3],

    /// Area of the triangle
    pub area: f64,

    /// Gradients of the shape functions (3 × 2)
    pub gradient: Matrix,
}

impl ShapeTri3 {
    /// Allocates a new instance from the coordinates of the nodes (counterclockwise)
    pub fn new(xx: [[f64; 2]; 3]) -> Result<Self, StrError> {
        let area = 0.5 * ((xx[1][0] - xx[0][0]) * (xx[2][1] - xx[0][1]) - (xx[2][0] - xx[0][0]) * (xx[1][1] - xx[0][1]));
        if area <= 0.0 {
            return Err("cell has zero or negative area");
        }
        let mut gradient = Matrix::new(3, 2);
        for i in 0..3 {
            let j = (i + 1) % 3;
            let k = (i + 2) % 3;
            gradient.set(i, 0, (xx[j][1] - xx[k][1]) / (2.0 * area));
            gradient.set(i, 1, (xx[k][0] - xx[j][0]) / (2.0 * area));
        }
        Ok(ShapeTri3 { xx, area, gradient })
    }

    /// Allocates a new instance from a mesh cell
    pub fn from_cell(mesh: &Mesh, cell: &Cell) -> Result<Self, StrError> {
        if cell.kind != GeoKind::Tri3 {
            return Err("cell must be a Tri3");
        }
        let mut xx = [[0.0; 2]; 3];
        for m in 0..3 {
            let p = cell.points[m];
            if p >= mesh.points.len() {
                return Err("cell has a point id out of bounds");
            }
            xx[m][0] = mesh.points[p].coords[0];
            xx[m][1] = mesh.points[p].coords[1];
        }
        ShapeTri3::new(xx)
    }

    /// Returns the diameter of the circle with the same area as the triangle
    pub fn size(&self) -> f64 {
        f64::sqrt(4.0 * self.area / PI)
    }

    /// Returns the physical coordinates of a point given its area coordinates
    pub fn position(&self, ksi: &[f64; 3]) -> [f64; 2] {
        let mut x = [0.0; 2];
        for m in 0..3 {
            x[0] += ksi[m] * self.xx[m][0];
            x[1] += ksi[m] * self.xx[m][1];
        }
        x
    }

    /// Returns the geometry of a side
    pub fn edge(&self, side: usize) -> Result<EdgeTri3, StrError> {
        if side > 2 {
            return Err("side index must be 0, 1, or 2");
        }
        let (a, b) = (side, (side + 1) % 3);
        let dx = self.xx[b][0] - self.xx[a][0];
        let dy = self.xx[b][1] - self.xx[a][1];
        let length = f64::sqrt(dx * dx + dy * dy);
        let tangent = [dx / length, dy / length];
        Ok(EdgeTri3 {
            nodes: [a, b],
            length,
            normal: [tangent[1], -tangent[0]],
            tangent,
        })
    }

    /// Returns the consistent mass matrix ∫ Nₐ N_b dA = A (1 + δₐ_b) / 12
    pub fn mass(&self) -> Matrix {
        let mut mm = Matrix::new(3, 3);
        for a in 0..3 {
            for b in 0..3 {
                let delta = if a == b { 2.0 } else { 1.0 };
                mm.set(a, b, self.area * delta / 12.0);
            }
        }
        mm
    }

    /// Returns the critical time step min(L/(2|u|), L²/(2ν)) over the sides
    ///
    /// The advective limit is skipped when the velocity is zero.
    pub fn critical_time_step(&self, velocity: &[f64; 2], nu: f64) -> f64 {
        let norm_u = f64::hypot(velocity[0], velocity[1]);
        let mut dt = f64::INFINITY;
        for side in 0..3 {
            let (a, b) = (side, (side + 1) % 3);
            let l = f64::hypot(self.xx[b][0] - self.xx[a][0], self.xx[b][1] - self.xx[a][1]);
            if norm_u > 0.0 {
                dt = f64::min(dt, 0.5 * l / norm_u);
            }
            dt = f64::min(dt, 0.5 * l * l / nu);
        }
        dt
    }

    /// Returns the radius ratio R/(2r) (circumradius over twice the inradius)
    ///
    /// The ratio is 1 for equilateral triangles and grows without bounds as the triangle degenerates.
    pub fn radius_ratio(xx: &[[f64; 2]; 3]) -> f64 {
        let side = |a: usize, b: usize| f64::hypot(xx[b][0] - xx[a][0], xx[b][1] - xx[a][1]);
        let (la, lb, lc) = (side(0, 1), side(1, 2), side(2, 0));
        let area = 0.5 * f64::abs((xx[1][0] - xx[0][0]) * (xx[2][1] - xx[0][1]) - (xx[2][0] - xx[0][0]) * (xx[1][1] - xx[0][1]));
        if area <= f64::EPSILON * (la * lb + lb * lc + lc * la) {
            return f64::INFINITY;
        }
        let circumradius = la * lb * lc / (4.0 * area);
        let inradius = 2.0 * area / (la + lb + lc);
        circumradius / (2.0 * inradius)
    }
}

impl EdgeTri3 {
    /// Returns the consistent mass matrix of the edge ∫ Nₐ N_b dS = L (1 + δₐ_b) / 6
    pub fn mass(&self) -> [[f64; 2]; 2] {
        let l = self.length;
        [[l / 3.0, l / 6.0], [l / 6.0, l / 3.0]]
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
