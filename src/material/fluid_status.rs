use super::TwoPhase;
use russell_lab::Vector;
use serde::{Deserialize, Serialize};

/// Holds the deviatoric state of a fluid at an integration point
///
/// The strain-rate uses the engineering (Voigt) convention `[ε̇xx, ε̇yy, γ̇xy]` with
/// `γ̇xy = 2 ε̇xy`; the stress is `[σxx, σyy, σxy]`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FluidState {
    /// Deviatoric strain-rate
    pub strain_rate: Vector,

    /// Deviatoric stress
    pub stress: Vector,
}

/// Holds the trial and committed deviatoric states of a fluid
pub type FluidStatus = TwoPhase<FluidState>;

impl FluidState {
    /// Allocates a new (zero) state
    pub fn new() -> Self {
        FluidState {
            strain_rate: Vector::new(3),
            stress: Vector::new(3),
        }
    }
}

impl FluidStatus {
    /// Allocates a new status at rest
    pub fn new_fluid() -> Self {
        TwoPhase::new(FluidState::new())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::FluidStatus;
    use crate::material::{restore_context, save_context};

    #[test]
    fn fluid_status_context_works() {
        let mut status = FluidStatus::new_fluid();
        status.trial_mut().strain_rate[2] = 0.25;
        status.trial_mut().stress[0] = -1.0 / 3.0;
        status.commit();
        status.trial_mut().stress[1] = 7.0;
        let mut buffer = Vec::new();
        save_context(&status, &mut buffer).unwrap();
        let copy: FluidStatus = restore_context(&mut buffer.as_slice()).unwrap();
        assert_eq!(copy.committed().strain_rate.as_data(), &[0.0, 0.0, 0.25]);
        assert_eq!(copy.committed().stress.as_data(), &[-1.0 / 3.0, 0.0, 0.0]);
        assert_eq!(copy.trial().stress.as_data(), &[-1.0 / 3.0, 7.0, 0.0]);
    }
}
