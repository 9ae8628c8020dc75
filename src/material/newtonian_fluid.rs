use super::{FluidModelTrait, FluidState};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Implements a Newtonian fluid
///
/// ```text
/// σ = μ [2 ε̇xx, 2 ε̇yy, γ̇xy]
/// ```
pub struct NewtonianFluid {
    /// Dynamic viscosity μ
    mu: f64,
}

impl NewtonianFluid {
    /// Allocates a new instance
    pub fn new(mu: f64) -> Self {
        NewtonianFluid { mu }
    }
}

impl FluidModelTrait for NewtonianFluid {
    fn effective_viscosity(&self) -> f64 {
        self.mu
    }

    fn update_stress(&self, state: &mut FluidState, strain_rate: &Vector) -> Result<(), StrError> {
        for i in 0..3 {
            state.strain_rate[i] = strain_rate[i];
        }
        state.stress[0] = 2.0 * self.mu * strain_rate[0];
        state.stress[1] = 2.0 * self.mu * strain_rate[1];
        state.stress[2] = self.mu * strain_rate[2];
        Ok(())
    }

    fn stiffness(&self, dd: &mut Matrix, _state: &FluidState) -> Result<(), StrError> {
        dd.fill(0.0);
        dd.set(0, 0, 2.0 * self.mu);
        dd.set(1, 1, 2.0 * self.mu);
        dd.set(2, 2, self.mu);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
