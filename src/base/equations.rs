use super::{Attributes, Dof};
use crate::StrError;
use gemlab::mesh::Mesh;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Holds equation numbers (DOF numbers)
///
/// Point DOFs are numbered first, point by point, in the order of [Dof]. Element-internal
/// DOFs (e.g., bubble velocities) are numbered afterwards, cell by cell.
///
/// ```text
///         3------------2
///         |`.      [1] |      point DOFs: (Vx, Vy, Pl)
///         |  `.        |      0: [0, 1, 2]    1: [3, 4, 5]
///         |    `.      |      2: [6, 7, 8]    3: [9, 10, 11]
///         | [0]  `.    |
///         |        `.  |      cell 0: [0, 1, 2, 3, 4, 5, 9, 10, 11]
///         0------------1      cell 1: [6, 7, 8, 9, 10, 11, 3, 4, 5]
/// ```
pub struct Equations {
    /// Holds the DOFs and equation numbers of each point (npoint)
    pub points: Vec<BTreeMap<Dof, usize>>,

    /// Holds the local-to-global maps of each cell (ncell)
    ///
    /// The local numbering is node-major (all DOFs of node 0, then node 1, ...)
    /// followed by the element-internal DOFs.
    pub cells: Vec<Vec<usize>>,

    /// Total number of equations
    pub n_equation: usize,
}

impl Equations {
    /// Allocates a new instance
    pub fn new(mesh: &Mesh, attributes: &Attributes) -> Result<Self, StrError> {
        // collect the DOFs at each point
        let npoint = mesh.points.len();
        let mut point_dofs = vec![BTreeSet::new(); npoint];
        for cell in &mesh.cells {
            let elem = attributes.get(cell)?;
            for p in &cell.points {
                if *p >= npoint {
                    return Err("cell has a point id out of bounds");
                }
                for dof in elem.nodal_dofs() {
                    point_dofs[*p].insert(*dof);
                }
            }
        }

        // number the point DOFs
        let mut n_equation = 0;
        let mut points = vec![BTreeMap::new(); npoint];
        for p in 0..npoint {
            for dof in &point_dofs[p] {
                points[p].insert(*dof, n_equation);
                n_equation += 1;
            }
        }

        // local-to-global maps (and element-internal DOFs)
        let mut cells = Vec::with_capacity(mesh.cells.len());
        for cell in &mesh.cells {
            let elem = attributes.get(cell)?;
            let mut local_to_global = Vec::new();
            for p in &cell.points {
                for dof in elem.nodal_dofs() {
                    local_to_global.push(points[*p][dof]);
                }
            }
            for _ in elem.internal_dofs() {
                local_to_global.push(n_equation);
                n_equation += 1;
            }
            cells.push(local_to_global);
        }
        Ok(Equations {
            points,
            cells,
            n_equation,
        })
    }

    /// Returns the equation number corresponding to a point and DOF
    pub fn eq(&self, point_id: usize, dof: Dof) -> Result<usize, StrError> {
        if point_id >= self.points.len() {
            return Err("cannot find equation number because PointId is out-of-bounds");
        }
        self.points[point_id]
            .get(&dof)
            .copied()
            .ok_or("cannot find equation number corresponding to (PointId, DOF)")
    }

    /// Returns the supremum of the number of nonzero values in the global matrix
    pub fn nnz_sup(&self) -> usize {
        self.n_equation + self.cells.iter().fold(0, |acc, l2g| acc + l2g.len() * l2g.len())
    }
}

impl fmt::Display for Equations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Points: DOFs and global equation numbers\n").unwrap();
        write!(f, "========================================\n").unwrap();
        for (p, dofs) in self.points.iter().enumerate() {
            let pairs: Vec<_> = dofs.iter().map(|(d, e)| (*d, *e)).collect();
            write!(f, "{:?}: {:?}\n", p, pairs).unwrap();
        }
        write!(f, "\nCells: Local-to-Global\n").unwrap();
        write!(f, "======================\n").unwrap();
        for (c, l2g) in self.cells.iter().enumerate() {
            write!(f, "{:?}: {:?}\n", c, l2g).unwrap();
        }
        write!(f, "\nInformation\n").unwrap();
        write!(f, "===========\n").unwrap();
        write!(f, "number of equations = {}\n", self.n_equation).unwrap();
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
