use crate::StrError;
use russell_lab::{mat_vec_mul, Matrix, Vector};

/// Implements a linear elastic model for bars (1D) and plane-stress (2D) problems
///
/// The strain uses the engineering convention: `[εxx]` in 1D and `[εxx, εyy, γxy]` in 2D.
pub struct LinearElastic {
    /// Young's modulus
    pub young: f64,

    /// Poisson's coefficient
    pub poisson: f64,

    /// Elastic stiffness matrix De
    dd: Matrix,
}

impl LinearElastic {
    /// Allocates a new instance
    pub fn new(young: f64, poisson: f64, ndim: usize) -> Result<Self, StrError> {
        let dd = match ndim {
            1 => Matrix::from(&[[young]]),
            2 => {
                let c = young / (1.0 - poisson * poisson);
                Matrix::from(&[
                    [c, c * poisson, 0.0],
                    [c * poisson, c, 0.0],
                    [0.0, 0.0, c * (1.0 - poisson) / 2.0],
                ])
            }
            _ => return Err("linear elastic model requires ndim = 1 or 2"),
        };
        Ok(LinearElastic { young, poisson, dd })
    }

    /// Returns the number of strain components
    pub fn n_strain(&self) -> usize {
        self.dd.dims().0
    }

    /// Returns the elastic stiffness matrix De
    pub fn modulus(&self) -> &Matrix {
        &self.dd
    }

    /// Computes σ = De ε
    pub fn calc_stress(&self, stress: &mut Vector, strain: &Vector) -> Result<(), StrError> {
        mat_vec_mul(stress, 1.0, &self.dd, strain)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
