use crate::base::{assemble_matrix, Equations};
use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::{Genie, LinSolver, SparseMatrix, Sym};

/// Holds variables to solve the global linear system
pub struct LinearSystem {
    /// Total number of global equations (total number of DOFs)
    pub n_equation: usize,

    /// Holds the supremum of the number of nonzero values (nnz) in the global matrix
    ///
    /// **Notes:**
    ///
    /// 1. The global matrix is sparse with the number of nonzero values indicated by `nnz`
    /// 2. The local element matrices add only to parts of the global matrix yielding a banded matrix
    /// 3. The least upper bound (supremum) of nnz, indicated here by `nnz_sup`, is equal to the
    ///    sum of all the number of entries in the local matrices plus the number of equations
    ///    since we may put ones on the diagonal of the global matrix; thus
    ///    `nnz_sup = n_equation + Σ (ndof_local × ndof_local)`
    /// 4. The nonlocal coupling adds entries linking the DOFs of neighboring elements;
    ///    thus, the nonlocal analysis must increase `nnz_sup` accordingly
    pub nnz_sup: usize,

    /// Holds the residual vector R
    pub rr: Vector,

    /// Holds the global Jacobian matrix K
    pub kk: SparseMatrix,

    /// Holds the "minus-delta-U" vector (the solution of the linear system)
    pub mdu: Vector,
}

impl LinearSystem {
    /// Allocates a new instance
    pub fn new(n_equation: usize, nnz_sup: usize) -> Result<Self, StrError> {
        let kk = SparseMatrix::new_coo(n_equation, n_equation, nnz_sup, Sym::No)
            .map_err(|_| "cannot create sparse matrix")?;
        Ok(LinearSystem {
            n_equation,
            nnz_sup,
            rr: Vector::new(n_equation),
            kk,
            mdu: Vector::new(n_equation),
        })
    }

    /// Allocates a new instance from the equation numbers
    pub fn from_equations(equations: &Equations) -> Result<Self, StrError> {
        LinearSystem::new(equations.n_equation, equations.nnz_sup())
    }

    /// Resets the global matrix
    ///
    /// The sparsity pattern may change between resets because a new matrix is allocated.
    pub fn zero(&mut self) -> Result<(), StrError> {
        self.kk = SparseMatrix::new_coo(self.n_equation, self.n_equation, self.nnz_sup, Sym::No)
            .map_err(|_| "cannot create sparse matrix")?;
        Ok(())
    }

    /// Assembles a local matrix into the global matrix
    ///
    /// Rows and columns of prescribed equations are skipped.
    pub fn assemble(&mut self, kk_local: &Matrix, rows: &[usize], cols: &[usize], prescribed: &[bool]) -> Result<(), StrError> {
        assemble_matrix(self.kk.get_coo_mut()?, kk_local, rows, cols, prescribed)
    }

    /// Puts ones on the diagonal of the prescribed equations
    pub fn put_prescribed_ones(&mut self, prescribed: &[bool]) -> Result<(), StrError> {
        let coo = self.kk.get_coo_mut()?;
        for eq in 0..self.n_equation {
            if prescribed[eq] {
                coo.put(eq, eq, 1.0)?;
            }
        }
        Ok(())
    }

    /// Factorizes K and solves K mdu = R
    ///
    /// A new solver is allocated at each call because the sparsity pattern may change.
    pub fn solve(&mut self, verbose: bool) -> Result<(), StrError> {
        let mut solver = LinSolver::new(Genie::Umfpack)?;
        solver.actual.factorize(&mut self.kk, None)?;
        solver.actual.solve(&mut self.mdu, &self.kk, &self.rr, verbose)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LinearSystem;
    use crate::base::{Attributes, Elem, Equations, ParamFluid, SampleMeshes};
    use russell_lab::{vec_approx_eq, Matrix, Vector};

    #[test]
    fn new_captures_errors() {
        assert_eq!(LinearSystem::new(0, 1).err(), Some("cannot create sparse matrix"));
        assert_eq!(LinearSystem::new(2, 0).err(), Some("cannot create sparse matrix"));
    }

    #[test]
    fn from_equations_works() {
        let mesh = SampleMeshes::two_tri3();
        let att = Attributes::from([(1, Elem::SupgTri3(ParamFluid::sample_newtonian()))]);
        let equations = Equations::new(&mesh, &att).unwrap();
        let lin_sys = LinearSystem::from_equations(&equations).unwrap();
        assert_eq!(lin_sys.n_equation, 12);
        assert_eq!(lin_sys.nnz_sup, 12 + 2 * 81);
        assert_eq!(lin_sys.rr.dim(), 12);
        assert_eq!(lin_sys.mdu.dim(), 12);
    }

    #[test]
    fn assemble_and_solve_work() {
        // 2 x0 + x1 = 3, x0 + 3 x1 = 4 and x2 prescribed
        let mut lin_sys = LinearSystem::new(3, 10).unwrap();
        let prescribed = vec![false, false, true];
        #[rustfmt::skip]
        let kk_local = Matrix::from(&[
            [2.0, 1.0, 7.0],
            [1.0, 3.0, 7.0],
            [7.0, 7.0, 7.0],
        ]);
        lin_sys.assemble(&kk_local, &[0, 1, 2], &[0, 1, 2], &prescribed).unwrap();
        lin_sys.put_prescribed_ones(&prescribed).unwrap();
        lin_sys.rr = Vector::from(&[3.0, 4.0, 0.0]);
        lin_sys.solve(false).unwrap();
        vec_approx_eq(lin_sys.mdu.as_data(), &[1.0, 1.0, 0.0], 1e-14);

        // a second solution with another pattern
        lin_sys.zero().unwrap();
        let kk_diag = Matrix::from(&[[4.0, 0.0], [0.0, 2.0]]);
        lin_sys.assemble(&kk_diag, &[0, 1], &[0, 1], &prescribed).unwrap();
        lin_sys.put_prescribed_ones(&prescribed).unwrap();
        lin_sys.rr = Vector::from(&[4.0, 1.0, 0.0]);
        lin_sys.solve(false).unwrap();
        vec_approx_eq(lin_sys.mdu.as_data(), &[1.0, 0.5, 0.0], 1e-14);
    }
}
