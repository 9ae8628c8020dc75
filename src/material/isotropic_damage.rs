use super::{DamageStatus, LinearElastic};
use crate::base::{EquivStrain, ParamSolid};
use crate::StrError;
use russell_lab::Vector;

/// Returns the principal values and the angle of the first principal direction of a 2D symmetric tensor
///
/// Returns `(v1, v2, θ)` with `v1 ≥ v2` and `n1 = (cos θ, sin θ)`.
pub fn principal_values_2d(txx: f64, tyy: f64, txy: f64) -> (f64, f64, f64) {
    let c = (txx + tyy) / 2.0;
    let d = (txx - tyy) / 2.0;
    let r = f64::sqrt(d * d + txy * txy);
    let theta = 0.5 * f64::atan2(2.0 * txy, txx - tyy);
    (c + r, c - r, theta)
}

/// Implements the (local) isotropic damage model with exponential softening
///
/// ```text
/// σ = (1 - ω) De ε
///
/// ω(κ) = 1 - (e0/κ) exp(-(κ - e0)/(ef - e0))   if κ > e0
///      = 0                                    otherwise
/// ```
///
/// where κ is the largest equivalent strain reached so far.
pub struct IsotropicDamage {
    /// Linear elastic model (undamaged)
    pub elastic: LinearElastic,

    /// Equivalent strain at the onset of damage
    pub e0: f64,

    /// Ductility parameter of the softening branch
    pub ef: f64,

    /// Definition of the equivalent strain
    pub equiv_strain: EquivStrain,

    /// Stress-independent strain applied to the normal components
    pub eigen_strain: f64,
}

impl IsotropicDamage {
    /// Allocates a new instance
    pub fn new(param: &ParamSolid, ndim: usize) -> Result<Self, StrError> {
        param.validate()?;
        Ok(IsotropicDamage {
            elastic: LinearElastic::new(param.young, param.poisson, ndim)?,
            e0: param.damage.e0,
            ef: param.damage.ef,
            equiv_strain: param.damage.equiv_strain,
            eigen_strain: param.eigen_strain,
        })
    }

    /// Returns the number of strain components
    pub fn n_strain(&self) -> usize {
        self.elastic.n_strain()
    }

    /// Subtracts the eigenstrain from the normal components of the total strain
    pub fn stress_dependent_strain(&self, strain: &Vector) -> Vector {
        let mut res = strain.clone();
        res[0] -= self.eigen_strain;
        if res.dim() == 3 {
            res[1] -= self.eigen_strain;
        }
        res
    }

    /// Computes the local equivalent strain
    pub fn equivalent_strain(&self, strain: &Vector) -> Result<f64, StrError> {
        let young = self.elastic.young;
        let eq = match self.equiv_strain {
            EquivStrain::Mazars => {
                if strain.dim() == 1 {
                    f64::max(strain[0], 0.0)
                } else {
                    let nu = self.elastic.poisson;
                    let (e1, e2, _) = principal_values_2d(strain[0], strain[1], 0.5 * strain[2]);
                    let e3 = -nu / (1.0 - nu) * (strain[0] + strain[1]);
                    let mut sum = 0.0;
                    for e in [e1, e2, e3] {
                        if e > 0.0 {
                            sum += e * e;
                        }
                    }
                    f64::sqrt(sum)
                }
            }
            EquivStrain::Rankine => {
                let mut stress = Vector::new(strain.dim());
                self.elastic.calc_stress(&mut stress, strain)?;
                if strain.dim() == 1 {
                    f64::max(stress[0], 0.0) / young
                } else {
                    let (s1, s2, _) = principal_values_2d(stress[0], stress[1], stress[2]);
                    let mut sum = 0.0;
                    for s in [s1, s2] {
                        if s > 0.0 {
                            sum += s * s;
                        }
                    }
                    f64::sqrt(sum) / young
                }
            }
            EquivStrain::ElasticEnergy => {
                let mut stress = Vector::new(strain.dim());
                self.elastic.calc_stress(&mut stress, strain)?;
                let mut energy = 0.0;
                for i in 0..strain.dim() {
                    energy += strain[i] * stress[i];
                }
                f64::sqrt(energy / young)
            }
        };
        Ok(eq)
    }

    /// Initializes the trial state with a new total strain and returns the local equivalent strain
    ///
    /// The eigenstrain is removed before the strain is stored.
    pub fn init_trial_strain(&self, status: &mut DamageStatus, strain: &Vector) -> Result<f64, StrError> {
        status.state.init_trial();
        let reduced = self.stress_dependent_strain(strain);
        let equiv_strain = self.equivalent_strain(&reduced)?;
        status.state.trial_mut().strain = reduced;
        Ok(equiv_strain)
    }

    /// Computes the damage ω(κ) with exponential softening
    pub fn damage_function(&self, kappa: f64) -> f64 {
        if kappa <= self.e0 {
            0.0
        } else {
            1.0 - (self.e0 / kappa) * f64::exp(-(kappa - self.e0) / (self.ef - self.e0))
        }
    }

    /// Computes the derivative dω/dκ of the softening law (valid for κ > e0)
    pub fn damage_derivative(&self, kappa: f64) -> f64 {
        let e0 = self.e0;
        let ef = self.ef;
        let ex = f64::exp(-(kappa - e0) / (ef - e0));
        (e0 / (kappa * kappa)) * ex + (e0 / kappa) * ex / (ef - e0)
    }

    /// Computes the compliance parameter γ = ω/(1 - ω) for a given equivalent strain
    pub fn compliance_function(&self, equiv_strain: f64) -> f64 {
        let omega = self.damage_function(equiv_strain);
        omega / (1.0 - omega)
    }

    /// Updates the history variable, the damage, and the stress in the trial state
    ///
    /// Damage grows only if `equiv_strain` exceeds the committed κ; then `damage_param(κ)`
    /// gives the new damage. Otherwise, the committed κ and ω are kept (unloading).
    pub fn update_damage<F>(&self, status: &mut DamageStatus, equiv_strain: f64, damage_param: F) -> Result<(), StrError>
    where
        F: Fn(f64) -> f64,
    {
        let kappa_old = status.state.committed().kappa;
        let damage_old = status.state.committed().damage;
        let trial = status.state.trial_mut();
        trial.equiv_strain = equiv_strain;
        if equiv_strain > kappa_old {
            trial.kappa = equiv_strain;
            trial.damage = f64::max(damage_param(equiv_strain), damage_old);
        } else {
            trial.kappa = kappa_old;
            trial.damage = damage_old;
        }
        self.elastic.calc_stress(&mut trial.stress, &trial.strain)?;
        let factor = 1.0 - trial.damage;
        for i in 0..trial.stress.dim() {
            trial.stress[i] *= factor;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{principal_values_2d, IsotropicDamage};
    use crate::base::{EquivStrain, ParamSolid};
    use crate::material::DamageStatus;
    use russell_lab::{approx_eq, deriv1_central5, vec_approx_eq, Vector};

    #[test]
    fn principal_values_2d_works() {
        let (s1, s2, theta) = principal_values_2d(2.0, -1.0, 0.0);
        assert_eq!((s1, s2, theta), (2.0, -1.0, 0.0));
        let (s1, s2, theta) = principal_values_2d(0.0, 0.0, 1.0);
        approx_eq(s1, 1.0, 1e-15);
        approx_eq(s2, -1.0, 1e-15);
        approx_eq(theta, std::f64::consts::PI / 4.0, 1e-15);
    }

    #[test]
    fn equivalent_strains_work() {
        let mut param = ParamSolid::sample_local_damage();
        param.young = 100.0;
        param.poisson = 0.25;

        param.damage.equiv_strain = EquivStrain::Mazars;
        let model = IsotropicDamage::new(&param, 2).unwrap();
        let eq = model.equivalent_strain(&Vector::from(&[0.003, -0.001, 0.0])).unwrap();
        approx_eq(eq, 0.003, 1e-15); // ε_z = -(1/3)(0.002) < 0
        let eq = model.equivalent_strain(&Vector::from(&[-0.003, -0.003, 0.0])).unwrap();
        approx_eq(eq, 0.002, 1e-15); // ε_z = (1/3)(0.006)

        param.damage.equiv_strain = EquivStrain::Rankine;
        let model = IsotropicDamage::new(&param, 1).unwrap();
        approx_eq(model.equivalent_strain(&Vector::from(&[0.002])).unwrap(), 0.002, 1e-15);
        approx_eq(model.equivalent_strain(&Vector::from(&[-0.002])).unwrap(), 0.0, 1e-15);

        param.damage.equiv_strain = EquivStrain::ElasticEnergy;
        let model = IsotropicDamage::new(&param, 1).unwrap();
        approx_eq(model.equivalent_strain(&Vector::from(&[-0.002])).unwrap(), 0.002, 1e-15);
    }

    #[test]
    fn damage_function_and_derivative_work() {
        let param = ParamSolid::sample_local_damage();
        let model = IsotropicDamage::new(&param, 1).unwrap();
        assert_eq!(model.damage_function(0.5e-4), 0.0);
        assert_eq!(model.damage_function(1e-4), 0.0);
        approx_eq(model.damage_function(1.9e-4), 1.0 - (1.0 / 1.9) * f64::exp(-0.1), 1e-14);
        let kappa = 3e-4;
        let num = deriv1_central5(kappa * 1e6, &mut 0, |x, _| Ok(model.damage_function(x * 1e-6))).unwrap();
        approx_eq(model.damage_derivative(kappa), num * 1e6, 1e-4);
        let omega = model.damage_function(kappa);
        approx_eq(model.compliance_function(kappa), omega / (1.0 - omega), 1e-15);
    }

    #[test]
    fn update_damage_works() {
        let param = ParamSolid::sample_local_damage();
        let model = IsotropicDamage::new(&param, 1).unwrap();
        let mut status = DamageStatus::new(1);

        // loading
        status.state.trial_mut().strain[0] = 2e-4;
        model
            .update_damage(&mut status, 2e-4, |k| model.damage_function(k))
            .unwrap();
        let omega = model.damage_function(2e-4);
        assert_eq!(status.state.trial().kappa, 2e-4);
        assert_eq!(status.state.trial().damage, omega);
        vec_approx_eq(status.state.trial().stress.as_data(), &[(1.0 - omega) * 20_000.0 * 2e-4], 1e-14);
        status.state.commit();

        // unloading
        status.state.init_trial();
        status.state.trial_mut().strain[0] = 1e-4;
        model
            .update_damage(&mut status, 1e-4, |k| model.damage_function(k))
            .unwrap();
        assert_eq!(status.state.trial().kappa, 2e-4);
        assert_eq!(status.state.trial().damage, omega);
        vec_approx_eq(status.state.trial().stress.as_data(), &[(1.0 - omega) * 2.0], 1e-14);
    }

    #[test]
    fn eigen_strain_is_subtracted() {
        let mut param = ParamSolid::sample_local_damage();
        param.eigen_strain = 1e-3;
        let model = IsotropicDamage::new(&param, 2).unwrap();
        let res = model.stress_dependent_strain(&Vector::from(&[3e-3, 2e-3, 1e-3]));
        vec_approx_eq(res.as_data(), &[2e-3, 1e-3, 1e-3], 1e-15);
    }
}
