use super::{FluidModelTrait, FluidState};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements a power-law (shear-thinning or shear-thickening) fluid
///
/// ```text
/// σ = 2 μ (1 + c ‖ε̇‖^α) [ε̇xx, ε̇yy, γ̇xy/2]
///
/// ‖ε̇‖ = √(ε̇xx² + ε̇yy² + γ̇xy²/2)
/// ```
///
/// **Note:** The tangent stiffness computes the norm from the halved shear component
/// as `√(ε̇xx² + ε̇yy² + 2 (γ̇xy/2)²)`, which equals the norm employed by the stress.
pub struct NonlinearFluid {
    /// Base viscosity μ
    mu: f64,

    /// Coefficient c
    c: f64,

    /// Exponent α
    alpha: f64,
}

impl NonlinearFluid {
    /// Allocates a new instance
    pub fn new(mu: f64, c: f64, alpha: f64) -> Self {
        NonlinearFluid { mu, c, alpha }
    }
}

impl FluidModelTrait for NonlinearFluid {
    fn effective_viscosity(&self) -> f64 {
        self.mu
    }

    fn update_stress(&self, state: &mut FluidState, strain_rate: &Vector) -> Result<(), StrError> {
        for i in 0..3 {
            state.strain_rate[i] = strain_rate[i];
        }
        let (e1, e2, e3) = (strain_rate[0], strain_rate[1], strain_rate[2]);
        let norm = f64::sqrt(e1 * e1 + e2 * e2 + 0.5 * e3 * e3);
        let coef = 2.0 * self.mu * (1.0 + self.c * f64::powf(norm, self.alpha));
        state.stress[0] = coef * e1;
        state.stress[1] = coef * e2;
        state.stress[2] = coef * 0.5 * e3;
        Ok(())
    }

    fn stiffness(&self, dd: &mut Matrix, state: &FluidState) -> Result<(), StrError> {
        let e = [
            state.strain_rate[0],
            state.strain_rate[1],
            0.5 * state.strain_rate[2],
        ];
        let norm = f64::sqrt(e[0] * e[0] + e[1] * e[1] + 2.0 * e[2] * e[2]);

        // dyadic term
        let dyadic = if norm != 0.0 {
            2.0 * self.mu * self.c * self.alpha * f64::powf(norm, self.alpha - 2.0)
        } else {
            0.0
        };
        for i in 0..3 {
            for j in 0..3 {
                dd.set(i, j, dyadic * e[i] * e[j]);
            }
        }

        // isotropic term
        let iso = if norm != 0.0 {
            2.0 * self.mu * (1.0 + self.c * f64::powf(norm, self.alpha))
        } else {
            2.0 * self.mu
        };
        dd.add(0, 0, iso);
        dd.add(1, 1, iso);
        dd.add(2, 2, 0.5 * iso);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::NonlinearFluid;
    use crate::material::{FluidModelTrait, FluidState, NewtonianFluid};
    use russell_lab::{approx_eq, mat_approx_eq, vec_approx_eq, Matrix, Vector};

    #[test]
    fn zero_strain_rate_gives_newtonian_tangent() {
        let model = NonlinearFluid::new(2.0, 0.5, 0.8);
        let mut state = FluidState::new();
        model.update_stress(&mut state, &Vector::new(3)).unwrap();
        assert_eq!(state.stress.as_data(), &[0.0, 0.0, 0.0]);
        let mut dd = Matrix::new(3, 3);
        model.stiffness(&mut dd, &state).unwrap();
        let newtonian = NewtonianFluid::new(2.0);
        let mut dd_newtonian = Matrix::new(3, 3);
        newtonian.stiffness(&mut dd_newtonian, &state).unwrap();
        assert_eq!(dd.as_data(), dd_newtonian.as_data());
        #[rustfmt::skip]
        let correct = &[
            [4.0, 0.0, 0.0],
            [0.0, 4.0, 0.0],
            [0.0, 0.0, 2.0],
        ];
        mat_approx_eq(&dd, correct, 1e-15);
    }

    #[test]
    fn stress_can_be_inverted() {
        let (mu, c, alpha) = (1.5, 0.5, 0.8);
        let model = NonlinearFluid::new(mu, c, alpha);
        let mut state = FluidState::new();
        for eps in [[0.2, -0.2, 0.0], [0.0, 0.0, 0.6], [1.0, 0.3, -2.0]] {
            model.update_stress(&mut state, &Vector::from(&eps)).unwrap();
            let norm = f64::sqrt(eps[0] * eps[0] + eps[1] * eps[1] + 0.5 * eps[2] * eps[2]);
            let den = 2.0 * mu * (1.0 + c * f64::powf(norm, alpha));
            let recovered = [state.stress[0] / den, state.stress[1] / den, state.stress[2] / den];
            vec_approx_eq(&recovered, &[eps[0], eps[1], 0.5 * eps[2]], 1e-15);
        }
    }

    #[test]
    fn stiffness_works() {
        let (mu, c, alpha) = (1.0, 0.5, 0.8);
        let model = NonlinearFluid::new(mu, c, alpha);
        let mut state = FluidState::new();
        model
            .update_stress(&mut state, &Vector::from(&[0.3, 0.4, 0.0]))
            .unwrap();
        let mut dd = Matrix::new(3, 3);
        model.stiffness(&mut dd, &state).unwrap();
        let norm: f64 = 0.5;
        let iso = 2.0 * mu * (1.0 + c * norm.powf(alpha));
        let dya = 2.0 * mu * c * alpha * norm.powf(alpha - 2.0);
        approx_eq(dd.get(0, 0), iso + dya * 0.09, 1e-14);
        approx_eq(dd.get(0, 1), dya * 0.12, 1e-14);
        approx_eq(dd.get(1, 0), dya * 0.12, 1e-14);
        approx_eq(dd.get(1, 1), iso + dya * 0.16, 1e-14);
        approx_eq(dd.get(2, 2), 0.5 * iso, 1e-14);
        approx_eq(dd.get(0, 2), 0.0, 1e-15);

        // pure shear
        model
            .update_stress(&mut state, &Vector::from(&[0.0, 0.0, 1.0]))
            .unwrap();
        model.stiffness(&mut dd, &state).unwrap();
        let norm_stiff = f64::sqrt(2.0 * 0.25);
        let iso = 2.0 * mu * (1.0 + c * f64::powf(norm_stiff, alpha));
        let dya = 2.0 * mu * c * alpha * f64::powf(norm_stiff, alpha - 2.0);
        approx_eq(dd.get(2, 2), dya * 0.25 + 0.5 * iso, 1e-14);
        let norm_stress = f64::sqrt(0.5);
        approx_eq(
            state.stress[2],
            2.0 * mu * (1.0 + c * f64::powf(norm_stress, alpha)) * 0.5,
            1e-14,
        );
    }
}
