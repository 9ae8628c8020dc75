use super::{principal_values_2d, DamageStatus, IsotropicDamage, LocalIntegrationRecord};
use crate::base::{assemble_matrix, AveragedVariable, DistanceModifier, EquivStrain, ParamNonlocal, ParamSolid};
use crate::base::{Scaling, WeightFunction};
use crate::StrError;
use russell_lab::{vec_norm, Matrix, Norm, Vector};
use russell_sparse::CooMatrix;
use std::f64::consts::PI;

/// Holds the geometric data of a structural integration point taking part in the nonlocal averaging
pub struct NonlocalPoint {
    /// Physical coordinates (ndim)
    pub coords: Vec<f64>,

    /// Volume (or length × area) around the point
    pub volume: f64,

    /// Index of the material in the materials array
    pub material: usize,

    /// Strain-displacement matrix (n_strain × n_local_dof)
    pub bb: Matrix,

    /// Local-to-global map of the element containing the point
    pub l2g: Vec<usize>,
}

/// Implements the integral-type nonlocal isotropic damage model (IDNL)
///
/// The damage at a point is driven by the weighted average of a local variable
/// (the equivalent strain or the compliance parameter) over its neighbors:
///
/// ```text
///            1
/// ε̄(x) = ─────── Σ w(|x - ξ|) V(ξ) εeq(ξ)
///         scale  ξ
/// ```
///
/// The weights may be modified by the damage around the point (damage-dependent distances)
/// or by the local stress state (stress-based averaging). The tangent matrix receives a
/// non-symmetric contribution coupling each point to all its neighbors.
pub struct IdnlMaterial {
    /// Local damage model
    pub local: IsotropicDamage,

    /// Nonlocal parameters
    pub param: ParamNonlocal,
}

/// Holds the damage model assigned to a set of integration points
pub enum DamageMaterial {
    /// Local isotropic damage
    Local(IsotropicDamage),

    /// Nonlocal isotropic damage
    Nonlocal(IdnlMaterial),
}

/// Returns the Euclidean distance between two points
fn distance(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for i in 0..a.len() {
        sum += (b[i] - a[i]) * (b[i] - a[i]);
    }
    f64::sqrt(sum)
}

/// Computes v = Bᵀ u
fn bt_times(bb: &Matrix, u: &Vector) -> Vector {
    let (nrow, ncol) = bb.dims();
    let mut v = Vector::new(ncol);
    for j in 0..ncol {
        for i in 0..nrow {
            v[j] += bb.get(i, j) * u[i];
        }
    }
    v
}

impl IdnlMaterial {
    /// Allocates a new instance
    pub fn new(param: &ParamSolid, ndim: usize) -> Result<Self, StrError> {
        let nonlocal = param.nonlocal.ok_or("nonlocal parameters are missing")?;
        nonlocal.validate()?;
        Ok(IdnlMaterial {
            local: IsotropicDamage::new(param, ndim)?,
            param: nonlocal,
        })
    }

    /// Returns the distance beyond which the weight function vanishes
    pub fn support_radius(&self) -> f64 {
        match self.param.weight {
            WeightFunction::Gauss => 2.0 * self.param.radius,
            _ => self.param.radius,
        }
    }

    /// Evaluates the weight function (kernel) at a given distance
    pub fn weight_function(&self, distance: f64) -> f64 {
        let rr = self.param.radius;
        match self.param.weight {
            WeightFunction::Bell => {
                if distance < rr {
                    let help = 1.0 - distance * distance / (rr * rr);
                    help * help
                } else {
                    0.0
                }
            }
            WeightFunction::Gauss => {
                if distance < 2.0 * rr {
                    f64::exp(-distance * distance / (rr * rr))
                } else {
                    0.0
                }
            }
            WeightFunction::Uniform => {
                if distance < rr {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Computes the factor stretching the distances in damaged regions
    pub fn distance_modifier(&self, damage: f64) -> f64 {
        let cl = self.param.radius;
        let rf = self.param.rf;
        let q = rf / cl;
        match self.param.modifier {
            None => 1.0,
            Some(DistanceModifier::Rational) => {
                1.0 / (q + (1.0 - q) * f64::powf(1.0 - damage, self.param.exponent))
            }
            Some(DistanceModifier::PowerDamage) => {
                if damage == 0.0 {
                    1.0
                } else {
                    1.0 / (1.0 - (1.0 - q) * f64::powf(damage, self.param.exponent))
                }
            }
            Some(DistanceModifier::Exponential) => 1.0 / f64::powf(q, damage),
            Some(DistanceModifier::Cosine) => 2.0 * cl / (cl + rf + (cl - rf) * f64::cos(PI * damage)),
        }
    }

    /// Builds the list of neighbors of a point (if not built yet)
    ///
    /// The list holds every point within the support of the weight function (including the
    /// point itself) sorted by the x-coordinate. The integration scale is the sum of weights.
    pub fn build_nonlocal_point_table(&self, p: usize, points: &[NonlocalPoint], statuses: &mut [DamageStatus]) {
        if statuses[p].integration_list.is_some() {
            return;
        }
        let support = self.support_radius();
        let mut list = Vec::new();
        let mut scale = 0.0;
        for (q, neighbor) in points.iter().enumerate() {
            let r = distance(&points[p].coords, &neighbor.coords);
            if r < support {
                let weight = self.weight_function(r) * neighbor.volume;
                list.push(LocalIntegrationRecord { point: q, weight });
                scale += weight;
            }
        }
        list.sort_by(|a, b| points[a.point].coords[0].total_cmp(&points[b.point].coords[0]));
        statuses[p].integration_list = Some(list);
        statuses[p].integration_scale = scale;
    }

    /// Updates the trial state of a point and computes its local variable for the averaging
    ///
    /// Must be called for all points before any nonlocal average is computed.
    pub fn update_before_nonlocal_average(
        &self,
        p: usize,
        strain: &Vector,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
    ) -> Result<(), StrError> {
        let equiv_strain = self.local.init_trial_strain(&mut statuses[p], strain)?;
        statuses[p].local_variable = match self.param.averaged {
            AveragedVariable::EquivalentStrain => equiv_strain,
            AveragedVariable::Compliance => self.local.compliance_function(equiv_strain),
        };
        if self.param.modifier.is_some() {
            self.modify_nonlocal_weight_function_around(p, points, statuses);
        }
        Ok(())
    }

    /// Recomputes the weights of the neighbors of a point using damage-dependent distances
    ///
    /// The distance to each neighbor is integrated along the x-sorted list, forward and
    /// backward from the point, with the average modifier of consecutive points.
    pub fn modify_nonlocal_weight_function_around(
        &self,
        p: usize,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
    ) {
        self.build_nonlocal_point_table(p, points, statuses);
        let mut list = match statuses[p].integration_list.take() {
            Some(list) => list,
            None => return,
        };
        let mut scale = 0.0;
        if let Some(pos) = list.iter().position(|rec| rec.point == p) {
            list[pos].weight = self.weight_function(0.0) * points[p].volume;
            scale += list[pos].weight;
            let n = list.len();
            scale += self.walk_modified_weights(p, &mut list, (pos + 1)..n, points, statuses);
            scale += self.walk_modified_weights(p, &mut list, (0..pos).rev(), points, statuses);
        }
        statuses[p].integration_list = Some(list);
        statuses[p].integration_scale = scale;
    }

    /// Updates the weights along one direction of the x-sorted list and returns their sum
    fn walk_modified_weights<I>(
        &self,
        p: usize,
        list: &mut [LocalIntegrationRecord],
        indices: I,
        points: &[NonlocalPoint],
        statuses: &[DamageStatus],
    ) -> f64
    where
        I: Iterator<Item = usize>,
    {
        let mut sum = 0.0;
        let mut dist = 0.0;
        let mut prev = p;
        let mut m_prev = self.distance_modifier(statuses[p].current_damage());
        for i in indices {
            let q = list[i].point;
            let m = self.distance_modifier(statuses[q].current_damage());
            dist += f64::abs(points[q].coords[0] - points[prev].coords[0]) * 0.5 * (m + m_prev);
            list[i].weight = self.weight_function(dist) * points[q].volume;
            sum += list[i].weight;
            prev = q;
            m_prev = m;
        }
        sum
    }

    /// Computes the direction of the first principal effective stress and the ratio σ2/σ1
    ///
    /// Returns `(angle, ratio)`. If both principal stresses are negative, returns `(0, 1)`;
    /// if only the second one is negative, the ratio is zero.
    pub fn angle_and_sigma_ratio(&self, strain: &Vector) -> Result<(f64, f64), StrError> {
        let mut stress = Vector::new(strain.dim());
        self.local.elastic.calc_stress(&mut stress, strain)?;
        let (s1, s2, theta) = principal_values_2d(stress[0], stress[1], stress[2]);
        let (nx, ny) = (f64::cos(theta), f64::sin(theta));
        let angle = if nx == 0.0 { PI / 2.0 } else { f64::atan(ny / nx) };
        if s1 < 0.0 && s2 < 0.0 {
            Ok((0.0, 1.0))
        } else if s2 < 0.0 {
            Ok((angle, 0.0))
        } else {
            Ok((angle, s2 / s1))
        }
    }

    /// Computes the weight of a neighbor using the stress-based (anisotropic) distance
    ///
    /// The distance vector is rotated to the principal axes and its second component is
    /// divided by γ = β + (1 - β) ratio². Coincident points keep the original weight.
    pub fn stress_based_weight(
        &self,
        original: f64,
        angle: f64,
        ratio: f64,
        beta: f64,
        x_p: &[f64],
        x_q: &[f64],
        volume_q: f64,
    ) -> f64 {
        let dx = x_q[0] - x_p[0];
        let dy = x_q[1] - x_p[1];
        if f64::sqrt(dx * dx + dy * dy) == 0.0 {
            return original;
        }
        let (s, c) = f64::sin_cos(angle);
        let x1 = c * dx + s * dy;
        let gamma = beta + (1.0 - beta) * ratio * ratio;
        let x2 = (-s * dx + c * dy) / gamma;
        self.weight_function(f64::sqrt(x1 * x1 + x2 * x2)) * volume_q
    }

    /// Replaces the weights of the neighbors of a point by the stress-based weights
    fn update_stress_based_weights(
        &self,
        p: usize,
        beta: f64,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
    ) -> Result<(), StrError> {
        if self.local.n_strain() != 3 {
            return Err("stress-based averaging requires a 2D material mode");
        }
        let strain = &statuses[p].state.trial().strain;
        let rotation = if vec_norm(strain, Norm::Euc) == 0.0 {
            None
        } else {
            Some(self.angle_and_sigma_ratio(strain)?)
        };
        let mut scale = 0.0;
        if let Some(list) = statuses[p].integration_list.as_mut() {
            let x_p = &points[p].coords;
            for rec in list.iter_mut() {
                let neighbor = &points[rec.point];
                let plain = self.weight_function(distance(x_p, &neighbor.coords)) * neighbor.volume;
                rec.weight = match rotation {
                    Some((angle, ratio)) => {
                        self.stress_based_weight(plain, angle, ratio, beta, x_p, &neighbor.coords, neighbor.volume)
                    }
                    None => plain,
                };
                scale += rec.weight;
            }
        }
        statuses[p].integration_scale = scale;
        Ok(())
    }

    /// Computes the nonlocal equivalent strain (or nonlocal compliance parameter) at a point
    pub fn compute_equivalent_strain(
        &self,
        p: usize,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
    ) -> Result<f64, StrError> {
        self.build_nonlocal_point_table(p, points, statuses);
        if let Some(beta) = self.param.stress_based {
            self.update_stress_based_weights(p, beta, points, statuses)?;
        }
        let status = &statuses[p];
        let mut sum = 0.0;
        if let Some(list) = &status.integration_list {
            for rec in list {
                sum += rec.weight * statuses[rec.point].local_variable;
            }
        }
        let local = status.local_variable;
        let scale = status.integration_scale;
        let nonlocal = match self.param.scaling {
            Scaling::Standard => sum / scale,
            Scaling::NoScaling => sum,
            Scaling::Borino => {
                if scale > 1.0 {
                    sum / scale
                } else {
                    sum + (1.0 - scale) * local
                }
            }
        };
        let mm = self.param.mm;
        if mm == 1.0 {
            Ok(nonlocal)
        } else if mm >= 0.0 {
            if nonlocal > 0.0 && local > 0.0 {
                Ok(1.0 / (mm / nonlocal + (1.0 - mm) / local))
            } else {
                Ok(0.0)
            }
        } else {
            Ok(-mm * nonlocal + (1.0 + mm) * local)
        }
    }

    /// Converts the (nonlocal) history variable into damage
    pub fn compute_damage_param(&self, kappa: f64) -> f64 {
        match self.param.averaged {
            AveragedVariable::Compliance => kappa / (1.0 + kappa),
            AveragedVariable::EquivalentStrain => self.local.damage_function(kappa),
        }
    }

    /// Computes the local vector Bᵀ (De ε) ω'(ε̄) of the nonlocal tangent
    ///
    /// Returns None if the point is not loading (elastic regime or unloading) or fully damaged.
    pub fn local_stiffness_contribution(
        &self,
        equiv_strain: f64,
        status: &DamageStatus,
        point: &NonlocalPoint,
    ) -> Result<Option<Vector>, StrError> {
        let f = equiv_strain - status.state.trial().kappa;
        if equiv_strain <= self.local.e0 || f < 0.0 {
            return Ok(None);
        }
        if status.state.committed().damage >= 1.0 {
            return Ok(None);
        }
        let strain = &status.state.trial().strain;
        let mut stress = Vector::new(strain.dim());
        self.local.elastic.calc_stress(&mut stress, strain)?;
        let mut lcontrib = bt_times(&point.bb, &stress);
        let df = self.local.damage_derivative(equiv_strain);
        for i in 0..lcontrib.dim() {
            lcontrib[i] *= df;
        }
        Ok(Some(lcontrib))
    }

    /// Computes the remote vector Bᵀ ∂εeq/∂ε of a neighbor
    pub fn remote_stiffness_contribution(&self, status: &DamageStatus, point: &NonlocalPoint) -> Result<Vector, StrError> {
        let strain = &status.state.trial().strain;
        let n = strain.dim();
        let young = self.local.elastic.young;
        let mut nu = Vector::new(n);
        let coeff = match self.local.equiv_strain {
            EquivStrain::Rankine => {
                let mut stress = Vector::new(n);
                self.local.elastic.calc_stress(&mut stress, strain)?;
                let mut help = Vector::new(n);
                let mut sum = 0.0;
                if n == 1 {
                    let s = f64::max(stress[0], 0.0);
                    help[0] = s;
                    sum = s * s;
                } else {
                    let (s1, s2, theta) = principal_values_2d(stress[0], stress[1], stress[2]);
                    let (sin, cos) = f64::sin_cos(theta);
                    let dirs = [(s1, cos, sin), (s2, -sin, cos)];
                    for (s, nx, ny) in dirs {
                        if s > 0.0 {
                            help[0] += s * nx * nx;
                            help[1] += s * ny * ny;
                            help[2] += s * 2.0 * nx * ny;
                            sum += s * s;
                        }
                    }
                }
                self.local.elastic.calc_stress(&mut nu, &help)?;
                if sum > 1e-15 {
                    1.0 / (young * f64::sqrt(sum))
                } else {
                    0.0
                }
            }
            EquivStrain::ElasticEnergy => {
                self.local.elastic.calc_stress(&mut nu, strain)?;
                let equiv_strain = self.local.equivalent_strain(strain)?;
                if equiv_strain > 0.0 {
                    1.0 / (young * equiv_strain)
                } else {
                    0.0
                }
            }
            EquivStrain::Mazars => return Err("equivalent strain type is not supported by the nonlocal stiffness"),
        };
        let mut rcontrib = bt_times(&point.bb, &nu);
        for i in 0..rcontrib.dim() {
            rcontrib[i] *= coeff;
        }
        Ok(rcontrib)
    }

    /// Adds the nonlocal coupling of a point to the global tangent matrix
    ///
    /// ```text
    /// K[loc(p), loc(q)] -= V(p) w(p,q) / scale(p) × l(p) ⊗ r(q)
    /// ```
    ///
    /// for every neighbor q whose material is nonlocal.
    pub fn add_ip_contribution(
        &self,
        kk: &mut CooMatrix,
        p: usize,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
        materials: &[DamageMaterial],
        prescribed: &[bool],
    ) -> Result<(), StrError> {
        let equiv_strain = self.compute_equivalent_strain(p, points, statuses)?;
        let lcontrib = match self.local_stiffness_contribution(equiv_strain, &statuses[p], &points[p])? {
            Some(v) => v,
            None => return Ok(()),
        };
        let status = &statuses[p];
        let list = match &status.integration_list {
            Some(list) => list,
            None => return Ok(()),
        };
        let factor = -points[p].volume / status.integration_scale;
        for rec in list {
            let q = rec.point;
            let remote = match materials[points[q].material].as_nonlocal() {
                Some(m) => m,
                None => continue,
            };
            let rcontrib = remote.remote_stiffness_contribution(&statuses[q], &points[q])?;
            let coeff = factor * rec.weight;
            let mut kk_local = Matrix::new(lcontrib.dim(), rcontrib.dim());
            for i in 0..lcontrib.dim() {
                for j in 0..rcontrib.dim() {
                    kk_local.set(i, j, coeff * lcontrib[i] * rcontrib[j]);
                }
            }
            assemble_matrix(kk, &kk_local, &points[p].l2g, &points[q].l2g, prescribed)?;
        }
        Ok(())
    }
}

impl DamageMaterial {
    /// Allocates a new instance (nonlocal if the nonlocal parameters are given)
    pub fn new(param: &ParamSolid, ndim: usize) -> Result<Self, StrError> {
        match param.nonlocal {
            Some(_) => Ok(DamageMaterial::Nonlocal(IdnlMaterial::new(param, ndim)?)),
            None => Ok(DamageMaterial::Local(IsotropicDamage::new(param, ndim)?)),
        }
    }

    /// Returns the underlying local model
    pub fn local(&self) -> &IsotropicDamage {
        match self {
            DamageMaterial::Local(m) => m,
            DamageMaterial::Nonlocal(m) => &m.local,
        }
    }

    /// Returns the nonlocal model, if this material supports the nonlocal stiffness
    pub fn as_nonlocal(&self) -> Option<&IdnlMaterial> {
        match self {
            DamageMaterial::Local(_) => None,
            DamageMaterial::Nonlocal(m) => Some(m),
        }
    }

    /// Performs the local step of the update (trial strain and local variable)
    pub fn update_before_nonlocal_average(
        &self,
        p: usize,
        strain: &Vector,
        points: &[NonlocalPoint],
        statuses: &mut [DamageStatus],
    ) -> Result<(), StrError> {
        match self {
            DamageMaterial::Local(m) => {
                let equiv_strain = m.init_trial_strain(&mut statuses[p], strain)?;
                statuses[p].local_variable = equiv_strain;
                Ok(())
            }
            DamageMaterial::Nonlocal(m) => m.update_before_nonlocal_average(p, strain, points, statuses),
        }
    }

    /// Updates the damage and the stress of a point
    ///
    /// Nonlocal materials require all points to be prepared by [DamageMaterial::update_before_nonlocal_average].
    pub fn update_stress(&self, p: usize, points: &[NonlocalPoint], statuses: &mut [DamageStatus]) -> Result<(), StrError> {
        match self {
            DamageMaterial::Local(m) => {
                let equiv_strain = statuses[p].local_variable;
                m.update_damage(&mut statuses[p], equiv_strain, |k| m.damage_function(k))
            }
            DamageMaterial::Nonlocal(m) => {
                let equiv_strain = m.compute_equivalent_strain(p, points, statuses)?;
                m.local
                    .update_damage(&mut statuses[p], equiv_strain, |k| m.compute_damage_param(k))
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
