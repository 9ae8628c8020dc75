use super::InputRecord;
use crate::StrError;

/// Holds parameters for the viscosity model of fluids
#[derive(Clone, Copy, Debug)]
pub enum ParamViscosity {
    /// Newtonian fluid
    Newtonian {
        /// Dynamic viscosity μ
        mu: f64,
    },

    /// Power-law (shear-thinning or shear-thickening) fluid
    ///
    /// ```text
    /// σ = 2 μ (1 + c ‖ε̇‖^α) ε̇
    /// ```
    PowerLaw {
        /// Base viscosity μ
        mu: f64,

        /// Coefficient c
        c: f64,

        /// Exponent α
        alpha: f64,
    },
}

/// Holds parameters for fluid elements
#[derive(Clone, Copy, Debug)]
pub struct ParamFluid {
    /// Density ρ
    pub density: f64,

    /// Viscosity model
    pub viscosity: ParamViscosity,
}

/// Defines the scalar measure of strain driving the damage
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EquivStrain {
    /// Norm of the positive principal strains
    Mazars,

    /// Norm of the positive principal effective stresses divided by E
    Rankine,

    /// Square root of the elastic energy density times 2/E
    ElasticEnergy,
}

/// Holds parameters for the isotropic damage model with exponential softening
#[derive(Clone, Copy, Debug)]
pub struct ParamDamage {
    /// Equivalent strain at the onset of damage
    pub e0: f64,

    /// Parameter controlling the ductility of the softening branch (ef > e0)
    pub ef: f64,

    /// Definition of the equivalent strain
    pub equiv_strain: EquivStrain,
}

/// Defines the nonlocal weight function (kernel)
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightFunction {
    /// Truncated quartic polynomial (support = R)
    Bell,

    /// Gauss function (support = 2R)
    Gauss,

    /// Constant weight (support = R)
    Uniform,
}

/// Defines how the weighted sum is normalized by the integration scale
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scaling {
    /// Divide by the integration scale
    Standard,

    /// Keep the weighted sum as it is
    NoScaling,

    /// Divide only if scale > 1, otherwise complement with the local value (boundary correction)
    Borino,
}

/// Defines the variable subject to nonlocal averaging
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AveragedVariable {
    /// The equivalent strain
    EquivalentStrain,

    /// The compliance parameter γ = ω/(1-ω)
    Compliance,
}

/// Defines the damage-dependent modification of distances between integration points
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DistanceModifier {
    /// 1 / (Rf/cl + (1 - Rf/cl) (1 - ω)^exp)
    Rational,

    /// 1 / (1 - (1 - Rf/cl) ω^exp)
    PowerDamage,

    /// 1 / (Rf/cl)^ω
    Exponential,

    /// 2 cl / (cl + Rf + (cl - Rf) cos(π ω))
    Cosine,
}

/// Holds parameters for the nonlocal averaging
#[derive(Clone, Copy, Debug)]
pub struct ParamNonlocal {
    /// Interaction radius (characteristic length) cl
    pub radius: f64,

    /// Weight function
    pub weight: WeightFunction,

    /// Normalization policy
    pub scaling: Scaling,

    /// Over/under-nonlocal mixing parameter (1.0 means purely nonlocal)
    pub mm: f64,

    /// Averaged variable
    pub averaged: AveragedVariable,

    /// Damage-dependent distance modifier (None means geometry-only weights)
    pub modifier: Option<DistanceModifier>,

    /// Reference (final) interaction radius Rf for the distance modifiers
    pub rf: f64,

    /// Exponent of the distance modifiers
    pub exponent: f64,

    /// Stress-based averaging with the given β coefficient
    pub stress_based: Option<f64>,
}

/// Holds parameters for structural elements with isotropic damage
#[derive(Clone, Copy, Debug)]
pub struct ParamSolid {
    /// Young's modulus
    pub young: f64,

    /// Poisson's coefficient
    pub poisson: f64,

    /// Cross-sectional area of bars or thickness of plane-stress elements
    pub area: f64,

    /// Stress-independent (eigen) strain applied to the normal components
    pub eigen_strain: f64,

    /// Damage parameters
    pub damage: ParamDamage,

    /// Nonlocal parameters (None means a purely local model)
    pub nonlocal: Option<ParamNonlocal>,
}

impl ParamFluid {
    /// Returns a sample Newtonian fluid
    pub fn sample_newtonian() -> Self {
        ParamFluid {
            density: 1.0,
            viscosity: ParamViscosity::Newtonian { mu: 1.0 },
        }
    }

    /// Returns a sample power-law fluid
    pub fn sample_power_law() -> Self {
        ParamFluid {
            density: 1.0,
            viscosity: ParamViscosity::PowerLaw {
                mu: 1.0,
                c: 0.5,
                alpha: 0.8,
            },
        }
    }

    /// Reads the parameters from an input record
    ///
    /// Required keys: `mu`; optional keys: `d` (density, default 1.0),
    /// `c` and `alpha` (power-law model when both are given).
    pub fn from_input_record(ir: &InputRecord) -> Result<Self, StrError> {
        let density = ir.optional_f64("d", 1.0)?;
        let mu = ir.get_f64("mu")?;
        let viscosity = if ir.contains("c") || ir.contains("alpha") {
            ParamViscosity::PowerLaw {
                mu,
                c: ir.get_f64("c")?,
                alpha: ir.get_f64("alpha")?,
            }
        } else {
            ParamViscosity::Newtonian { mu }
        };
        let param = ParamFluid { density, viscosity };
        param.validate()?;
        Ok(param)
    }

    /// Checks the values
    pub fn validate(&self) -> Result<(), StrError> {
        if self.density <= 0.0 {
            return Err("density must be > 0.0");
        }
        let mu = match self.viscosity {
            ParamViscosity::Newtonian { mu } => mu,
            ParamViscosity::PowerLaw { mu, .. } => mu,
        };
        if mu <= 0.0 {
            return Err("mu must be > 0.0");
        }
        Ok(())
    }
}

impl ParamNonlocal {
    /// Returns a sample set of parameters (bell-shaped function, standard scaling)
    pub fn sample(radius: f64) -> Self {
        ParamNonlocal {
            radius,
            weight: WeightFunction::Bell,
            scaling: Scaling::Standard,
            mm: 1.0,
            averaged: AveragedVariable::EquivalentStrain,
            modifier: None,
            rf: 0.0,
            exponent: 1.0,
            stress_based: None,
        }
    }

    /// Reads the parameters from an input record
    ///
    /// Keys: `r` (required), `wft` (0 bell, 1 gauss, 2 uniform), `scaling` (0 standard,
    /// 1 none, 2 Borino), `m`, `averagedvar` (0 equivalent strain, 1 compliance),
    /// `averagingtype` (0, 1, or 2 to 5 for the damage-dependent variants), `exp`, `rf`,
    /// `nlvariation` (1 distance-based, 2 stress-based), and `beta`.
    pub fn from_input_record(ir: &InputRecord) -> Result<Self, StrError> {
        let weight = match ir.optional_usize("wft", 0)? {
            0 => WeightFunction::Bell,
            1 => WeightFunction::Gauss,
            2 => WeightFunction::Uniform,
            _ => return Err("wft must be 0, 1, or 2"),
        };
        let scaling = match ir.optional_usize("scaling", 0)? {
            0 => Scaling::Standard,
            1 => Scaling::NoScaling,
            2 => Scaling::Borino,
            _ => return Err("scaling must be 0, 1, or 2"),
        };
        let averaged = match ir.optional_usize("averagedvar", 0)? {
            0 => AveragedVariable::EquivalentStrain,
            1 => AveragedVariable::Compliance,
            _ => return Err("averagedvar must be 0 or 1"),
        };
        let modifier = match ir.optional_usize("averagingtype", 0)? {
            0 | 1 => None,
            2 => Some(DistanceModifier::Rational),
            3 => Some(DistanceModifier::PowerDamage),
            4 => Some(DistanceModifier::Exponential),
            5 => Some(DistanceModifier::Cosine),
            _ => return Err("averagingtype must be in [0, 5]"),
        };
        let default_exponent = match modifier {
            Some(DistanceModifier::Rational) => 0.5,
            _ => 1.0,
        };
        let exponent = match modifier {
            Some(DistanceModifier::Rational) | Some(DistanceModifier::PowerDamage) => {
                ir.optional_f64("exp", default_exponent)?
            }
            _ => default_exponent,
        };
        let rf = match modifier {
            Some(_) => ir.optional_f64("rf", 0.0)?,
            None => 0.0,
        };
        let stress_based = match ir.optional_usize("nlvariation", 1)? {
            1 => None,
            2 => Some(ir.optional_f64("beta", 0.5)?),
            _ => return Err("nlvariation must be 1 or 2"),
        };
        let param = ParamNonlocal {
            radius: ir.get_f64("r")?,
            weight,
            scaling,
            mm: ir.optional_f64("m", 1.0)?,
            averaged,
            modifier,
            rf,
            exponent,
            stress_based,
        };
        param.validate()?;
        Ok(param)
    }

    /// Checks the values
    pub fn validate(&self) -> Result<(), StrError> {
        if self.radius <= 0.0 {
            return Err("nonlocal radius must be > 0.0");
        }
        if self.modifier.is_some() && (self.rf <= 0.0 || self.rf > self.radius) {
            return Err("rf must be in (0, r] for damage-dependent averaging");
        }
        if let Some(beta) = self.stress_based {
            if beta <= 0.0 || beta > 1.0 {
                return Err("beta must be in (0, 1]");
            }
        }
        Ok(())
    }
}

impl ParamSolid {
    /// Returns a sample local damage model
    pub fn sample_local_damage() -> Self {
        ParamSolid {
            young: 20_000.0,
            poisson: 0.2,
            area: 1.0,
            eigen_strain: 0.0,
            damage: ParamDamage {
                e0: 1e-4,
                ef: 1e-3,
                equiv_strain: EquivStrain::ElasticEnergy,
            },
            nonlocal: None,
        }
    }

    /// Returns a sample nonlocal damage model
    pub fn sample_nonlocal_damage(radius: f64) -> Self {
        let mut param = ParamSolid::sample_local_damage();
        param.nonlocal = Some(ParamNonlocal::sample(radius));
        param
    }

    /// Reads the parameters from an input record
    ///
    /// Keys: `e`, `n`, `area` (default 1.0), `eigen` (default 0.0), `e0`, `ef`,
    /// `equivstraintype` (0 Mazars, 1 Rankine, 2 elastic energy), and the nonlocal keys
    /// when `r` is present.
    pub fn from_input_record(ir: &InputRecord) -> Result<Self, StrError> {
        let equiv_strain = match ir.optional_usize("equivstraintype", 0)? {
            0 => EquivStrain::Mazars,
            1 => EquivStrain::Rankine,
            2 => EquivStrain::ElasticEnergy,
            _ => return Err("equivstraintype must be 0, 1, or 2"),
        };
        let nonlocal = if ir.contains("r") {
            Some(ParamNonlocal::from_input_record(ir)?)
        } else {
            None
        };
        let param = ParamSolid {
            young: ir.get_f64("e")?,
            poisson: ir.get_f64("n")?,
            area: ir.optional_f64("area", 1.0)?,
            eigen_strain: ir.optional_f64("eigen", 0.0)?,
            damage: ParamDamage {
                e0: ir.get_f64("e0")?,
                ef: ir.get_f64("ef")?,
                equiv_strain,
            },
            nonlocal,
        };
        param.validate()?;
        Ok(param)
    }

    /// Checks the values
    pub fn validate(&self) -> Result<(), StrError> {
        if self.young <= 0.0 {
            return Err("Young's modulus must be > 0.0");
        }
        if self.poisson < 0.0 || self.poisson >= 0.5 {
            return Err("Poisson's coefficient must be in [0, 0.5)");
        }
        if self.area <= 0.0 {
            return Err("area must be > 0.0");
        }
        if self.damage.e0 <= 0.0 {
            return Err("e0 must be > 0.0");
        }
        if self.damage.ef <= self.damage.e0 {
            return Err("ef must be > e0");
        }
        if let Some(nonlocal) = &self.nonlocal {
            nonlocal.validate()?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{ParamFluid, ParamNonlocal, ParamSolid, ParamViscosity};
    use crate::base::{AveragedVariable, DistanceModifier, EquivStrain, InputRecord, Scaling, WeightFunction};

    #[test]
    fn fluid_from_input_record_works() {
        let ir = InputRecord::from_json(r#"{"mu": 2.0}"#).unwrap();
        let p = ParamFluid::from_input_record(&ir).unwrap();
        assert_eq!(p.density, 1.0);
        assert!(matches!(p.viscosity, ParamViscosity::Newtonian { mu } if mu == 2.0));

        let ir = InputRecord::from_json(r#"{"mu": 2.0, "d": 3.0, "c": 0.1, "alpha": 0.5}"#).unwrap();
        let p = ParamFluid::from_input_record(&ir).unwrap();
        assert_eq!(p.density, 3.0);
        assert!(matches!(p.viscosity, ParamViscosity::PowerLaw { mu, c, alpha } if mu == 2.0 && c == 0.1 && alpha == 0.5));
    }

    #[test]
    fn fluid_from_input_record_captures_errors() {
        let ir = InputRecord::from_json(r#"{"d": 1.0}"#).unwrap();
        assert_eq!(ParamFluid::from_input_record(&ir).err(), Some("required field is missing"));
        let ir = InputRecord::from_json(r#"{"mu": 1.0, "c": 0.1}"#).unwrap();
        assert_eq!(ParamFluid::from_input_record(&ir).err(), Some("required field is missing"));
        let ir = InputRecord::from_json(r#"{"mu": -1.0}"#).unwrap();
        assert_eq!(ParamFluid::from_input_record(&ir).err(), Some("mu must be > 0.0"));
        let ir = InputRecord::from_json(r#"{"mu": 1.0, "d": 0.0}"#).unwrap();
        assert_eq!(ParamFluid::from_input_record(&ir).err(), Some("density must be > 0.0"));
    }

    #[test]
    fn nonlocal_from_input_record_works() {
        let ir = InputRecord::from_json(r#"{"r": 0.5}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.radius, 0.5);
        assert_eq!(p.weight, WeightFunction::Bell);
        assert_eq!(p.scaling, Scaling::Standard);
        assert_eq!(p.averaged, AveragedVariable::EquivalentStrain);
        assert_eq!(p.modifier, None);
        assert_eq!(p.mm, 1.0);
        assert_eq!(p.stress_based, None);

        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 2, "rf": 0.1}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.modifier, Some(DistanceModifier::Rational));
        assert_eq!(p.exponent, 0.5);
        assert_eq!(p.rf, 0.1);

        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 3, "rf": 0.1}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.modifier, Some(DistanceModifier::PowerDamage));
        assert_eq!(p.exponent, 1.0);

        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 3, "rf": 0.1, "exp": 2.0}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.exponent, 2.0);

        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 5, "rf": 0.2, "exp": 3.0}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.modifier, Some(DistanceModifier::Cosine));
        assert_eq!(p.exponent, 1.0); // exp is ignored by the cosine modifier

        let ir = InputRecord::from_json(r#"{"r": 0.5, "nlvariation": 2, "scaling": 2, "m": 1.5}"#).unwrap();
        let p = ParamNonlocal::from_input_record(&ir).unwrap();
        assert_eq!(p.stress_based, Some(0.5));
        assert_eq!(p.scaling, Scaling::Borino);
        assert_eq!(p.mm, 1.5);
    }

    #[test]
    fn nonlocal_from_input_record_captures_errors() {
        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 7}"#).unwrap();
        assert_eq!(
            ParamNonlocal::from_input_record(&ir).err(),
            Some("averagingtype must be in [0, 5]")
        );
        let ir = InputRecord::from_json(r#"{"r": 0.5, "averagingtype": 4}"#).unwrap();
        assert_eq!(
            ParamNonlocal::from_input_record(&ir).err(),
            Some("rf must be in (0, r] for damage-dependent averaging")
        );
        let ir = InputRecord::from_json(r#"{"r": 0.0}"#).unwrap();
        assert_eq!(
            ParamNonlocal::from_input_record(&ir).err(),
            Some("nonlocal radius must be > 0.0")
        );
        let ir = InputRecord::from_json(r#"{"r": 1.0, "nlvariation": 2, "beta": 2.0}"#).unwrap();
        assert_eq!(ParamNonlocal::from_input_record(&ir).err(), Some("beta must be in (0, 1]"));
    }

    #[test]
    fn solid_from_input_record_works() {
        let ir = InputRecord::from_json(r#"{"e": 100.0, "n": 0.25, "e0": 0.01, "ef": 0.1, "equivstraintype": 1}"#)
            .unwrap();
        let p = ParamSolid::from_input_record(&ir).unwrap();
        assert_eq!(p.young, 100.0);
        assert_eq!(p.damage.equiv_strain, EquivStrain::Rankine);
        assert!(p.nonlocal.is_none());

        let ir = InputRecord::from_json(r#"{"e": 100.0, "n": 0.25, "e0": 0.01, "ef": 0.1, "r": 2.0}"#).unwrap();
        let p = ParamSolid::from_input_record(&ir).unwrap();
        assert_eq!(p.damage.equiv_strain, EquivStrain::Mazars);
        assert_eq!(p.nonlocal.unwrap().radius, 2.0);

        let ir = InputRecord::from_json(r#"{"e": 100.0, "n": 0.25, "e0": 0.01, "ef": 0.001}"#).unwrap();
        assert_eq!(ParamSolid::from_input_record(&ir).err(), Some("ef must be > e0"));
    }
}
