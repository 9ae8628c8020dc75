use super::{FluidState, NewtonianFluid, NonlinearFluid};
use crate::base::{ParamFluid, ParamViscosity};
use crate::StrError;
use russell_lab::{Matrix, Vector};

/// Specifies the essential functions for viscosity models
///
/// The strain-rate and stress use the Voigt convention of [FluidState]. The stress must
/// be updated before the stiffness is requested because the stiffness is computed from
/// the trial strain-rate stored in the state.
pub trait FluidModelTrait: Send {
    /// Returns the viscosity employed by the stabilization terms
    fn effective_viscosity(&self) -> f64;

    /// Computes the deviatoric stress and saves the trial strain-rate and stress
    fn update_stress(&self, state: &mut FluidState, strain_rate: &Vector) -> Result<(), StrError>;

    /// Computes the deviatoric tangent stiffness dσ/dε̇
    fn stiffness(&self, dd: &mut Matrix, state: &FluidState) -> Result<(), StrError>;

    /// Returns the volumetric rate for the mixed (velocity/pressure) formulation
    ///
    /// The default is the incompressible constraint `r_vol = -(ε̇xx + ε̇yy)`
    fn volumetric_rate(&self, strain_rate: &Vector, _pressure: f64) -> f64 {
        -(strain_rate[0] + strain_rate[1])
    }

    /// Computes dσ/dp (zero for incompressible fluids)
    fn deviatoric_pressure_stiffness(&self, ep: &mut Vector) {
        ep.fill(0.0);
    }

    /// Computes d(r_vol)/dε̇ beyond the incompressible constraint (zero for incompressible fluids)
    fn volumetric_deviatoric_stiffness(&self, cd: &mut Vector) {
        cd.fill(0.0);
    }

    /// Returns d(r_vol)/dp (zero for incompressible fluids)
    fn volumetric_pressure_stiffness(&self) -> f64 {
        0.0
    }
}

/// Holds the actual viscosity model implementation and the density
pub struct FluidModel {
    /// Density ρ
    pub density: f64,

    /// Holds the actual model implementation
    pub actual: Box<dyn FluidModelTrait>,
}

impl FluidModel {
    /// Allocates a new instance
    pub fn new(param: &ParamFluid) -> Result<Self, StrError> {
        param.validate()?;
        let actual: Box<dyn FluidModelTrait> = match param.viscosity {
            ParamViscosity::Newtonian { mu } => Box::new(NewtonianFluid::new(mu)),
            ParamViscosity::PowerLaw { mu, c, alpha } => Box::new(NonlinearFluid::new(mu, c, alpha)),
        };
        Ok(FluidModel {
            density: param.density,
            actual,
        })
    }

    /// Returns the kinematic viscosity ν = μ/ρ
    pub fn kinematic_viscosity(&self) -> f64 {
        self.actual.effective_viscosity() / self.density
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
