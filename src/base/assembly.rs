use crate::StrError;
use russell_lab::{Matrix, Vector};
use russell_sparse::CooMatrix;

/// Assembles local vector into global vector
///
/// # Output
///
/// * `rr_global` -- is the global vector R with length = `n_equation`
///
/// # Input
///
/// * `r_local` -- is the local vector r with length = `n_equation_local`
/// * `local_to_global` -- is an array holding all equation numbers
/// * `prescribed` -- tells whether a global equation number has prescribed DOF or not.
///   Its length is equal to the total number of DOFs `n_equation`.
///
/// # Panics
///
/// This function will panic if the indices are out-of-bounds
#[inline]
pub fn assemble_vector(rr_global: &mut Vector, r_local: &Vector, local_to_global: &[usize], prescribed: &[bool]) {
    let n_equation_local = r_local.dim();
    for l in 0..n_equation_local {
        let g = local_to_global[l];
        if !prescribed[g] {
            rr_global[g] += r_local[l];
        }
    }
}

/// Assembles local matrix into global matrix
///
/// The local matrix may be rectangular: `rows` and `cols` hold the global equation
/// numbers of its rows and columns, respectively. Rows or columns of prescribed
/// equations are skipped.
///
/// # Panics
///
/// This function will panic if the indices are out-of-bounds
pub fn assemble_matrix(
    kk_global: &mut CooMatrix,
    kk_local: &Matrix,
    rows: &[usize],
    cols: &[usize],
    prescribed: &[bool],
) -> Result<(), StrError> {
    let (nrow, ncol) = kk_local.dims();
    for l in 0..nrow {
        let g = rows[l];
        if prescribed[g] {
            continue;
        }
        for ll in 0..ncol {
            let gg = cols[ll];
            if !prescribed[gg] {
                kk_global.put(g, gg, kk_local.get(l, ll))?;
            }
        }
    }
    Ok(())
}

/// Adds a block vector into a local vector using a local ordering map
///
/// ```text
/// local[map[i]] += alpha ⋅ block[i]
/// ```
#[inline]
pub fn scatter_block_vector(local: &mut Vector, alpha: f64, block: &Vector, map: &[usize]) {
    for i in 0..block.dim() {
        local[map[i]] += alpha * block[i];
    }
}

/// Adds a block matrix into a local matrix using local ordering maps
///
/// ```text
/// local[row_map[i]][col_map[j]] += alpha ⋅ block[i][j]
/// ```
#[inline]
pub fn scatter_block_matrix(local: &mut Matrix, alpha: f64, block: &Matrix, row_map: &[usize], col_map: &[usize]) {
    let (nrow, ncol) = block.dims();
    for i in 0..nrow {
        for j in 0..ncol {
            local.add(row_map[i], col_map[j], alpha * block.get(i, j));
        }
    }
}

/// Gathers a block of a local vector using a local ordering map
///
/// ```text
/// block[i] = local[map[i]]
/// ```
#[inline]
pub fn gather_block_vector(block: &mut Vector, local: &Vector, map: &[usize]) {
    for i in 0..block.dim() {
        block[i] = local[map[i]];
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{assemble_matrix, assemble_vector, gather_block_vector, scatter_block_matrix, scatter_block_vector};
    use russell_lab::{mat_approx_eq, vec_approx_eq, Matrix, Vector};
    use russell_sparse::{CooMatrix, Sym};

    #[test]
    fn assemble_vector_works() {
        let mut rr = Vector::new(4);
        let r = Vector::from(&[1.0, 2.0, 3.0]);
        assemble_vector(&mut rr, &r, &[3, 0, 1], &[false, true, false, false]);
        vec_approx_eq(rr.as_data(), &[2.0, 0.0, 0.0, 1.0], 1e-15);
        assemble_vector(&mut rr, &r, &[3, 0, 2], &[false, true, false, false]);
        vec_approx_eq(rr.as_data(), &[4.0, 0.0, 3.0, 2.0], 1e-15);
    }

    #[test]
    fn assemble_matrix_works() {
        let mut kk = CooMatrix::new(3, 3, 10, Sym::No).unwrap();
        #[rustfmt::skip]
        let k = Matrix::from(&[
            [1.0, 2.0],
            [3.0, 4.0],
            [5.0, 6.0],
        ]);
        assemble_matrix(&mut kk, &k, &[0, 1, 2], &[2, 0], &[false, true, false]).unwrap();
        let dense = kk.as_dense();
        #[rustfmt::skip]
        let correct = &[
            [2.0, 0.0, 1.0],
            [0.0, 0.0, 0.0],
            [6.0, 0.0, 5.0],
        ];
        mat_approx_eq(&dense, correct, 1e-15);
    }

    #[test]
    fn block_functions_work() {
        let mut local = Vector::new(4);
        scatter_block_vector(&mut local, 2.0, &Vector::from(&[1.0, 2.0]), &[3, 1]);
        vec_approx_eq(local.as_data(), &[0.0, 4.0, 0.0, 2.0], 1e-15);

        let mut block = Vector::new(2);
        gather_block_vector(&mut block, &local, &[1, 3]);
        vec_approx_eq(block.as_data(), &[4.0, 2.0], 1e-15);

        let mut kk = Matrix::new(3, 3);
        scatter_block_matrix(&mut kk, -1.0, &Matrix::from(&[[1.0, 2.0]]), &[2], &[0, 1]);
        #[rustfmt::skip]
        let correct = &[
            [ 0.0,  0.0, 0.0],
            [ 0.0,  0.0, 0.0],
            [-1.0, -2.0, 0.0],
        ];
        mat_approx_eq(&kk, correct, 1e-15);
    }
}
